use std::error::Error;
use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::types::{Coordinate, DeliveryRow, VehicleId};

const DISPATCH_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M"];

/// Upload format of the delivery sheet. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct DeliveryRecord {
    #[serde(rename = "Vehicle Id", default)]
    vehicle_id: Option<String>,
    #[serde(rename = "Origin Geo Lat", default)]
    origin_lat: Option<f64>,
    #[serde(rename = "Origin Geo Lon", default)]
    origin_lon: Option<f64>,
    #[serde(rename = "Dest Geo Lat", default)]
    dest_lat: Option<f64>,
    #[serde(rename = "Dest Geo Lon", default)]
    dest_lon: Option<f64>,
    #[serde(rename = "dispatch_created_on", default)]
    dispatch_created_on: Option<String>,
    #[serde(rename = "Distributor Name", default)]
    distributor_name: Option<String>,
    #[serde(rename = "expected_delivery_date", default)]
    expected_delivery_date: Option<String>,
}

/// Vehicle ids arrive as `7` or, from spreadsheet exports, `7.0`.
fn parse_vehicle_id(raw: &str) -> Option<VehicleId> {
    let raw = raw.trim();
    raw.parse::<VehicleId>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as VehicleId)
    })
}

pub fn parse_dispatch_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in DISPATCH_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn into_row(record: DeliveryRecord) -> Option<DeliveryRow> {
    let vehicle_id = record.vehicle_id.as_deref().and_then(parse_vehicle_id)?;
    let coordinate = |lat: Option<f64>, lon: Option<f64>| {
        Coordinate::new(lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN))
    };

    Some(DeliveryRow {
        vehicle_id,
        origin: coordinate(record.origin_lat, record.origin_lon),
        destination: coordinate(record.dest_lat, record.dest_lon),
        dispatched_at: record
            .dispatch_created_on
            .as_deref()
            .and_then(parse_dispatch_time),
        distributor_name: non_empty(record.distributor_name),
        expected_delivery_date: non_empty(record.expected_delivery_date),
    })
}

/// Read delivery rows, optionally keeping a single vehicle.
pub fn read_delivery_rows_from<R: Read>(
    rdr: R,
    only_vehicle: Option<VehicleId>,
) -> Result<Vec<DeliveryRow>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(rdr);

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (idx, result) in reader.deserialize::<DeliveryRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed delivery row {}: {}", idx + 1, e);
                skipped += 1;
                continue;
            }
        };

        match into_row(record) {
            Some(row) if only_vehicle.map_or(true, |id| id == row.vehicle_id) => rows.push(row),
            Some(_) => {}
            None => {
                warn!("Skipping delivery row {} without a vehicle id", idx + 1);
                skipped += 1;
            }
        }
    }

    debug!("Skipped {} delivery rows", skipped);
    Ok(rows)
}

pub fn read_delivery_rows(
    path: &str,
    only_vehicle: Option<VehicleId>,
) -> Result<Vec<DeliveryRow>, Box<dyn Error>> {
    let file = std::fs::File::open(path)?;
    let rows = read_delivery_rows_from(file, only_vehicle)?;
    info!("Loaded {} delivery rows from {}", rows.len(), path);
    Ok(rows)
}
