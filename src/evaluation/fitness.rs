use crate::domain::types::{Coordinate, RoutingProblem};

/// Planar Euclidean distance over raw coordinate values.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    (a.lat - b.lat).hypot(a.lon - b.lon)
}

/// Closed-tour length: origin -> genes in order -> origin.
pub fn find_distance(genes: &[usize], problem: &RoutingProblem) -> f64 {
    if genes.is_empty() {
        return 0.0;
    }

    let origin = problem.origin();
    let warehouse_to_first_loc = distance(origin, problem.coordinate(genes[0]));
    let last_loc_to_warehouse = distance(problem.coordinate(genes[genes.len() - 1]), origin);

    let total_dist: f64 = genes
        .windows(2)
        .map(|pair| dist_between(pair[0], pair[1], problem))
        .sum();

    warehouse_to_first_loc + total_dist + last_loc_to_warehouse
}

pub fn dist_between(from_loc: usize, to_loc: usize, problem: &RoutingProblem) -> f64 {
    distance(problem.coordinate(from_loc), problem.coordinate(to_loc))
}

/// Length of an explicit coordinate path, consecutive pairs only.
pub fn path_length(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let d = distance(Coordinate::new(0.0, 0.0), Coordinate::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn closed_tour_includes_both_origin_legs() {
        let problem = RoutingProblem::new(
            Coordinate::new(0.0, 0.0),
            &[Coordinate::new(3.0, 4.0), Coordinate::new(3.0, 0.0)],
        )
        .unwrap();

        // 5 + 4 + 3
        assert!((find_distance(&[1, 2], &problem) - 12.0).abs() < 1e-12);
        assert!((find_distance(&[2, 1], &problem) - 12.0).abs() < 1e-12);
        assert!((find_distance(&[1], &problem) - 10.0).abs() < 1e-12);
        assert_eq!(find_distance(&[], &problem), 0.0);
    }

    #[test]
    fn path_length_matches_tour_length() {
        let origin = Coordinate::new(0.0, 0.0);
        let a = Coordinate::new(1.0, 1.0);
        let b = Coordinate::new(5.0, 5.0);
        let problem = RoutingProblem::new(origin, &[a, b]).unwrap();

        let expected = find_distance(&[1, 2], &problem);
        assert!((path_length(&[origin, a, b, origin]) - expected).abs() < 1e-12);
    }
}
