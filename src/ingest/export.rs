use std::error::Error;
use std::io::Write;

use csv::Writer;
use tracing::info;

use crate::domain::solution::RouteReport;

const HEADER: [&str; 7] = [
    "Vehicle",
    "Stop",
    "Dest Geo Lat",
    "Dest Geo Lon",
    "Distributor Name",
    "expected_delivery_date",
    "Route Distance",
];

/// One CSV line per stop, vehicles in the order given.
pub fn write_routes<W: Write>(wtr: W, reports: &[RouteReport]) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_writer(wtr);
    wtr.write_record(HEADER)?;

    for report in reports {
        for (stop_index, stop) in report.stops.iter().enumerate() {
            wtr.write_record([
                report.vehicle_id.to_string(),
                stop_index.to_string(),
                stop.coordinate.lat.to_string(),
                stop.coordinate.lon.to_string(),
                stop.distributor_name.clone(),
                report.delivery_date.clone(),
                format!("{:.6}", report.distance),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_routes_csv(filename: &str, reports: &[RouteReport]) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(filename)?;
    write_routes(file, reports)?;
    info!("Wrote {} routes to {}", reports.len(), filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::solution::RouteStop;
    use crate::domain::types::Coordinate;

    #[test]
    fn writes_one_line_per_stop() {
        let stop = |lat, lon, name: &str| RouteStop {
            coordinate: Coordinate::new(lat, lon),
            distributor_name: name.to_string(),
        };
        let reports = vec![RouteReport {
            vehicle_id: 3,
            delivery_date: "2024-01-03".to_string(),
            distance: 10.0,
            stops: vec![
                stop(0.0, 0.0, "Origin/Warehouse"),
                stop(3.0, 4.0, "Alpha"),
                stop(0.0, 0.0, "Origin/Warehouse"),
            ],
        }];

        let mut buf = Vec::new();
        write_routes(&mut buf, &reports).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "Vehicle,Stop,Dest Geo Lat,Dest Geo Lon,Distributor Name,expected_delivery_date,Route Distance"
        );
        assert_eq!(lines[2], "3,1,3,4,Alpha,2024-01-03,10.000000");
    }
}
