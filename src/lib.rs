//! # grid_astar
//!
//! Incremental [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) pathfinding over a
//! discretized world plane. A [Grid] divides a rectangular region into square cells whose
//! walkability is decided by a caller-supplied probe, and a [SearchEngine] explores it under the
//! octile distance metric, one expansion per [step](SearchEngine::step) so that a real-time host
//! loop can spread a search over several ticks. The [SearchCoordinator] ties both to a moving
//! agent and target.
//!
//! ```
//! use grid_astar::{Grid, GridConfig, SearchEngine, WorldPos};
//!
//! let config = GridConfig::new(WorldPos::new(0.0, 0.0), WorldPos::new(5.0, 5.0), 0.5);
//! // Block the cell at the centre of the grid
//! let grid = Grid::build(config, |p, r| p.x.abs() >= r || p.y.abs() >= r).unwrap();
//! let mut engine = SearchEngine::default();
//! let start = grid.coord_at(WorldPos::new(-2.0, -2.0));
//! let goal = grid.coord_at(WorldPos::new(2.0, 2.0));
//! let outcome = engine.run_to_completion(&grid, start, goal).unwrap();
//! let path = outcome.into_path();
//! assert!(path.cost() > 56);
//! ```
pub mod cell;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod metric;
pub mod search;

pub use cell::{Cell, WorldPos};
pub use config::{GridConfig, SearchConfig};
pub use coordinator::{PathSink, SearchCoordinator};
pub use error::ConfigError;
pub use grid::Grid;
pub use search::{NodeCosts, Path, SearchEngine, SearchOutcome, SearchStatus};

/// Cost of a cardinal (straight) move.
pub const C: i32 = 10;
/// Cost of a diagonal move, 10 * sqrt(2) rounded down.
pub const D: i32 = 14;
/// Cost difference `2 * C - D` used by the octile distance, see [metric::octile_distance].
pub const E: i32 = 2 * C - D;

/// Inline capacity of neighbourhood buffers, one slot per Moore neighbour.
pub const N_SMALLVEC_SIZE: usize = 8;

/// Unit-diameter grid of `width` x `height` cells centred on the world origin with the listed
/// coordinates blocked.
#[cfg(test)]
pub(crate) fn test_grid(width: usize, height: usize, blocked: &[(i32, i32)]) -> Grid {
    let config = GridConfig::new(
        WorldPos::new(0.0, 0.0),
        WorldPos::new(width as f32, height as f32),
        0.5,
    );
    let corner = config.corner();
    Grid::build(config, |p, r| {
        let x = (p.x - corner.x - r).round() as i32;
        let y = (p.y - corner.y - r).round() as i32;
        !blocked.contains(&(x, y))
    })
    .unwrap()
}
