use crate::config::constant::{
    COORDINATE_MATCH_DECIMALS, ORIGIN_LABEL, UNKNOWN_DATE, UNKNOWN_DISTRIBUTOR,
};
use crate::domain::types::{
    ClosedPath, Coordinate, DeliveryRow, Route, RoutingProblem, VehicleId,
};

/// Final result for one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleRoute {
    pub vehicle_id: VehicleId,
    pub path: ClosedPath,
    pub distance: f64,
    pub seeded: bool,
    /// Empty when the genetic search was short-circuited.
    pub best_per_generation: Vec<f64>,
}

/// A labelled stop of an exported route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub coordinate: Coordinate,
    pub distributor_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteReport {
    pub vehicle_id: VehicleId,
    pub delivery_date: String,
    pub distance: f64,
    pub stops: Vec<RouteStop>,
}

/// `[origin, coord(g1), .., coord(gL), origin]`
pub fn closed_path(route: &Route, problem: &RoutingProblem) -> ClosedPath {
    let origin = problem.origin();
    let mut path = Vec::with_capacity(route.len() + 2);
    path.push(origin);
    path.extend(route.genes().iter().map(|&gene| problem.coordinate(gene)));
    path.push(origin);
    path
}

// Halves round away from zero (`f64::round`), not to even.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn same_place(a: Coordinate, b: Coordinate) -> bool {
    round_to(a.lat, COORDINATE_MATCH_DECIMALS) == round_to(b.lat, COORDINATE_MATCH_DECIMALS)
        && round_to(a.lon, COORDINATE_MATCH_DECIMALS) == round_to(b.lon, COORDINATE_MATCH_DECIMALS)
}

/// Label every stop: the path ends are the warehouse, the rest take the
/// distributor of the first row whose destination rounds to the same place.
pub fn attribute_stops(path: &[Coordinate], rows: &[DeliveryRow]) -> Vec<RouteStop> {
    let last = path.len().saturating_sub(1);
    path.iter()
        .enumerate()
        .map(|(index, &coordinate)| {
            let distributor_name = if index == 0 || index == last {
                ORIGIN_LABEL.to_string()
            } else {
                rows.iter()
                    .find(|row| same_place(row.destination, coordinate))
                    .and_then(|row| row.distributor_name.clone())
                    .unwrap_or_else(|| UNKNOWN_DISTRIBUTOR.to_string())
            };
            RouteStop {
                coordinate,
                distributor_name,
            }
        })
        .collect()
}

/// Build the exportable report for one vehicle.
///
/// The date comes from the vehicle's first row. Stops are named from the
/// whole upload, so a destination shared by several vehicles takes the name
/// of its first row overall.
pub fn build_report(route: &VehicleRoute, rows: &[DeliveryRow]) -> RouteReport {
    let delivery_date = rows
        .iter()
        .find(|row| row.vehicle_id == route.vehicle_id)
        .and_then(|row| row.expected_delivery_date.clone())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    RouteReport {
        vehicle_id: route.vehicle_id,
        delivery_date,
        distance: route.distance,
        stops: attribute_stops(&route.path, rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vehicle_id: VehicleId, dest: (f64, f64), name: Option<&str>) -> DeliveryRow {
        DeliveryRow {
            vehicle_id,
            origin: Coordinate::new(0.0, 0.0),
            destination: dest.into(),
            dispatched_at: None,
            distributor_name: name.map(str::to_string),
            expected_delivery_date: None,
        }
    }

    #[test]
    fn closed_path_wraps_genes_with_origin() {
        let problem = RoutingProblem::new(
            Coordinate::new(0.5, 0.5),
            &[Coordinate::new(1.0, 2.0), Coordinate::new(3.0, 4.0)],
        )
        .unwrap();
        let route = Route::new(vec![2, 1], &problem);

        let path = closed_path(&route, &problem);
        assert_eq!(
            path,
            vec![
                Coordinate::new(0.5, 0.5),
                Coordinate::new(3.0, 4.0),
                Coordinate::new(1.0, 2.0),
                Coordinate::new(0.5, 0.5),
            ]
        );
    }

    #[test]
    fn stops_are_attributed_by_rounded_coordinates() {
        let rows = vec![
            row(1, (1.0000001, 2.0), Some("North")),
            row(1, (1.0, 2.0), Some("Duplicate")),
            row(1, (3.0, 4.0), None),
        ];
        let path = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 2.0),
            Coordinate::new(3.0, 4.0),
            Coordinate::new(9.0, 9.0),
            Coordinate::new(0.0, 0.0),
        ];

        let names: Vec<String> = attribute_stops(&path, &rows)
            .into_iter()
            .map(|stop| stop.distributor_name)
            .collect();
        assert_eq!(
            names,
            vec![
                ORIGIN_LABEL,
                "North",
                UNKNOWN_DISTRIBUTOR,
                UNKNOWN_DISTRIBUTOR,
                ORIGIN_LABEL
            ]
        );
    }

    #[test]
    fn report_uses_first_row_date_of_that_vehicle() {
        let mut dated = row(2, (1.0, 1.0), Some("East"));
        dated.expected_delivery_date = Some("2024-03-01".to_string());
        let rows = vec![row(1, (1.0, 1.0), Some("West")), dated];
        let route = VehicleRoute {
            vehicle_id: 2,
            path: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(0.0, 0.0),
            ],
            distance: 2f64.sqrt() * 2.0,
            seeded: false,
            best_per_generation: vec![],
        };

        let report = build_report(&route, &rows);
        assert_eq!(report.delivery_date, "2024-03-01");
        // (1, 1) first appears on vehicle 1's row
        assert_eq!(report.stops[1].distributor_name, "West");

        let undated = build_report(&VehicleRoute { vehicle_id: 1, ..route }, &rows);
        assert_eq!(undated.delivery_date, UNKNOWN_DATE);
    }

    #[test]
    fn rounding_ties_go_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert!(same_place(
            Coordinate::new(-0.0000004, 1.0),
            Coordinate::new(0.0, 1.0)
        ));
    }
}
