use grid_util::point::Point;
use itertools::Itertools;

use crate::{D, E};

/// Octile distance between two grid coordinates, scaled so that a cardinal step costs [C](crate::C)
/// and a diagonal step costs [D]. Serves both as the A* heuristic and as the cost of a single
/// move between neighbouring cells.
pub fn octile_distance(p1: &Point, p2: &Point) -> i32 {
    let delta_x = (p1.x - p2.x).abs();
    let delta_y = (p1.y - p2.y).abs();
    // Formula from https://github.com/riscy/a_star_on_grids
    // to efficiently compute the cost of a path taking the maximal amount
    // of diagonal steps before going straight
    (E * (delta_x - delta_y).abs() + D * (delta_x + delta_y)) / 2
}

/// Sums the octile cost of every consecutive pair of points.
pub fn path_cost(points: &[Point]) -> i32 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| octile_distance(a, b))
        .sum()
}
