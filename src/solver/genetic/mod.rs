pub mod operators;
pub mod population;
pub mod search;

pub use operators::*;
pub use population::*;
pub use search::*;
