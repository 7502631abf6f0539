pub mod deliveries;
pub mod export;

pub use deliveries::{parse_dispatch_time, read_delivery_rows, read_delivery_rows_from};
pub use export::{write_routes, write_routes_csv};
