use core::fmt;
use fxhash::FxHashSet;
use grid_util::grid::{Grid as _, SimpleGrid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

use crate::cell::{Cell, WorldPos};
use crate::config::GridConfig;
use crate::error::Result;
use crate::N_SMALLVEC_SIZE;

/// The eight Moore-neighbourhood offsets, dx outer and dy inner. Neighbours enter the open set
/// in this order and equal-cost ties are broken by insertion order, so this order decides which
/// of several equal paths is returned.
const MOORE_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// [Grid] discretizes a rectangular region of the world plane into square cells, each of which
/// is either walkable or blocked. It also maintains the connected components of walkable cells
/// using a [UnionFind] structure so that unreachable goals can be detected without searching.
///
/// The shape and contents are fixed once built. A changed world is handled by building a new
/// grid with [rebuild](Self::rebuild).
#[derive(Clone, Debug)]
pub struct Grid {
    config: GridConfig,
    cells: SimpleGrid<Cell>,
    components: UnionFind<usize>,
    walkable_count: usize,
    component_count: usize,
}

impl Grid {
    /// Builds a grid from `config`, probing `walkable(centre, cell_radius)` once per cell.
    pub fn build<F>(config: GridConfig, mut walkable: F) -> Result<Grid>
    where
        F: FnMut(WorldPos, f32) -> bool,
    {
        config.validate()?;
        let (width, height) = config.dimensions();
        let corner = config.corner();
        let diameter = config.diameter();
        let radius = config.cell_radius;

        let placeholder = Cell::new(corner, Point::new(0, 0), false);
        let mut cells = SimpleGrid::new(width, height, placeholder);
        for x in 0..width {
            for y in 0..height {
                // Offset by the radius so positions sit at cell centres
                let position = WorldPos::new(
                    corner.x + x as f32 * diameter + radius,
                    corner.y + y as f32 * diameter + radius,
                );
                let coord = Point::new(x as i32, y as i32);
                cells.set(x, y, Cell::new(position, coord, walkable(position, radius)));
            }
        }
        let mut grid = Grid {
            config,
            cells,
            components: UnionFind::new(width * height),
            walkable_count: 0,
            component_count: 0,
        };
        grid.generate_components();
        info!(
            "Built {}x{} grid: {} walkable cells in {} components",
            width, height, grid.walkable_count, grid.component_count
        );
        Ok(grid)
    }

    /// Builds a replacement grid with the same placement, re-probing every cell.
    pub fn rebuild<F>(&self, walkable: F) -> Result<Grid>
    where
        F: FnMut(WorldPos, f32) -> bool,
    {
        Grid::build(self.config.clone(), walkable)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }
    pub fn width(&self) -> usize {
        self.cells.width()
    }
    pub fn height(&self) -> usize {
        self.cells.height()
    }
    pub fn walkable_count(&self) -> usize {
        self.walkable_count
    }
    pub fn component_count(&self) -> usize {
        self.component_count
    }
    /// All cells in row-major order (`y * width + x`).
    pub fn cells(&self) -> &[Cell] {
        &self.cells.values
    }

    pub fn point_in_bounds(&self, point: &Point) -> bool {
        self.cells.point_in_bounds(*point)
    }

    pub fn cell(&self, point: &Point) -> Option<Cell> {
        self.point_in_bounds(point)
            .then(|| self.cells.get_point(*point))
    }

    /// Whether `point` is an in-bounds, walkable cell.
    pub fn walkable(&self, point: &Point) -> bool {
        self.cell(point).is_some_and(|c| c.walkable())
    }

    /// Maps a world position to the closest cell. Positions outside the grid snap to the nearest
    /// edge cell, so this never fails.
    pub fn coord_at(&self, position: WorldPos) -> Point {
        let corner = self.config.corner();
        let size = self.config.size;
        let percent_x = ((position.x - corner.x) / size.x).clamp(0.0, 1.0);
        let percent_y = ((position.y - corner.y) / size.y).clamp(0.0, 1.0);
        let snap = |count: usize, percent: f32| {
            // NaN saturates to 0 when cast
            let ix = ((count - 1) as f32 * percent).round_ties_even() as usize;
            ix.min(count - 1) as i32
        };
        Point::new(snap(self.width(), percent_x), snap(self.height(), percent_y))
    }

    /// The cell closest to a world position, see [coord_at](Self::coord_at).
    pub fn cell_at(&self, position: WorldPos) -> Cell {
        self.cells.get_point(self.coord_at(position))
    }

    /// In-bounds cells of the 8-neighbourhood of `point`, walkable or not.
    pub fn neighbours(&self, point: &Point) -> SmallVec<[Cell; N_SMALLVEC_SIZE]> {
        MOORE_OFFSETS
            .iter()
            .map(|(dx, dy)| Point::new(point.x + dx, point.y + dy))
            .filter_map(|p| self.cell(&p))
            .collect()
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> Option<usize> {
        self.point_in_bounds(point)
            .then(|| self.components.find(self.cells.get_ix_point(point)))
    }

    /// Checks if `goal` can be reached from `start` moving only across walkable cells.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        if !(self.point_in_bounds(start) && self.point_in_bounds(goal)) {
            return false;
        }
        if start == goal {
            return true;
        }
        self.walkable(start)
            && self.walkable(goal)
            && self.components.equiv(
                self.cells.get_ix_point(start),
                self.cells.get_ix_point(goal),
            )
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        !self.reachable(start, goal)
    }

    /// Generates a new [UnionFind] structure and links up walkable neighbours to the same
    /// components.
    fn generate_components(&mut self) {
        let (width, height) = (self.width(), self.height());
        self.components = UnionFind::new(width * height);
        for x in 0..width as i32 {
            for y in 0..height as i32 {
                let point = Point::new(x, y);
                if !self.walkable(&point) {
                    continue;
                }
                let parent_ix = self.cells.get_ix_point(&point);
                // The remaining four directions are covered from the other side
                for p in [
                    Point::new(x, y + 1),
                    Point::new(x + 1, y - 1),
                    Point::new(x + 1, y),
                    Point::new(x + 1, y + 1),
                ] {
                    if self.walkable(&p) {
                        let ix = self.cells.get_ix_point(&p);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
        let roots = self
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.walkable())
            .map(|(ix, _)| self.components.find(ix))
            .collect::<FxHashSet<usize>>();
        self.walkable_count = self.cells().iter().filter(|c| c.walkable()).count();
        self.component_count = roots.len();
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells().chunks(self.width()).rev() {
            let row = row
                .iter()
                .map(|c| if c.walkable() { '.' } else { '#' })
                .collect::<String>();
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn unit_grid(n: usize, blocked: &[(i32, i32)]) -> Grid {
        crate::test_grid(n, n, blocked)
    }

    #[test]
    fn cell_centres() {
        let config = GridConfig::new(WorldPos::new(10.0, -4.0), WorldPos::new(4.0, 2.0), 0.5);
        let grid = Grid::build(config, |_, _| true).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 2));
        let first = grid.cell(&Point::new(0, 0)).unwrap();
        assert_eq!(first.position(), WorldPos::new(8.5, -4.5));
        let last = grid.cell(&Point::new(3, 1)).unwrap();
        assert_eq!(last.position(), WorldPos::new(11.5, -3.5));
        assert_eq!(last.coord(), Point::new(3, 1));
    }

    #[test]
    fn probes_once_per_cell_with_radius() {
        let config = GridConfig::new(WorldPos::new(0.0, 0.0), WorldPos::new(6.0, 3.0), 1.0);
        let mut probes = Vec::new();
        let grid = Grid::build(config, |p, r| {
            probes.push((p, r));
            p.x < 0.0
        })
        .unwrap();
        assert_eq!(probes.len(), 3);
        assert!(probes.iter().all(|(_, r)| *r == 1.0));
        assert_eq!(grid.walkable_count(), 1);
        assert!(grid.walkable(&Point::new(0, 0)));
        assert!(!grid.walkable(&Point::new(1, 0)));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = GridConfig::new(WorldPos::new(0.0, 0.0), WorldPos::new(5.0, 5.0), 0.0);
        assert_eq!(
            Grid::build(config, |_, _| true).unwrap_err(),
            ConfigError::NonPositiveRadius(0.0)
        );

        let config = GridConfig::new(WorldPos::new(0.0, 0.0), WorldPos::new(1e12, 1e12), 0.5);
        let mut probes = 0;
        let result = Grid::build(config, |_, _| {
            probes += 1;
            true
        });
        assert!(matches!(result, Err(ConfigError::TooLarge { .. })));
        assert_eq!(probes, 0);
    }

    #[test]
    fn cells_are_row_major() {
        let grid = crate::test_grid(3, 2, &[(2, 0)]);
        let coords = grid.cells().iter().map(|c| c.coord()).collect::<Vec<_>>();
        assert_eq!(
            coords,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(2, 0),
                Point::new(0, 1),
                Point::new(1, 1),
                Point::new(2, 1)
            ]
        );
        assert_eq!(grid.cells()[2], grid.cell(&Point::new(2, 0)).unwrap());
        assert!(!grid.cells()[2].walkable());
    }

    #[test]
    fn out_of_bounds_cells() {
        let grid = crate::test_grid(3, 2, &[]);
        for p in [
            Point::new(-1, 0),
            Point::new(0, -1),
            Point::new(3, 0),
            Point::new(0, 2),
        ] {
            assert!(!grid.point_in_bounds(&p));
            assert_eq!(grid.cell(&p), None);
            assert!(!grid.walkable(&p));
        }
        assert!(grid.point_in_bounds(&Point::new(2, 1)));
    }

    #[test]
    fn cell_at_rounds_to_nearest() {
        let grid = unit_grid(5, &[]);
        // Cell (i, j) is centred on (i - 2, j - 2)
        assert_eq!(grid.coord_at(WorldPos::new(0.0, 0.0)), Point::new(2, 2));
        assert_eq!(grid.coord_at(WorldPos::new(-2.0, 2.0)), Point::new(0, 4));
        assert_eq!(grid.coord_at(WorldPos::new(1.2, -0.8)), Point::new(3, 1));
        assert_eq!(grid.cell_at(WorldPos::new(1.0, 1.0)).coord(), Point::new(3, 3));
    }

    #[test]
    fn cell_at_rounds_half_to_even() {
        let config = GridConfig::new(WorldPos::new(0.0, 0.0), WorldPos::new(10.0, 10.0), 0.5);
        let grid = Grid::build(config, |_, _| true).unwrap();
        // The centre of the extent maps to 9 * 0.5 = 4.5, which rounds to 4
        assert_eq!(grid.coord_at(WorldPos::new(0.0, 0.0)), Point::new(4, 4));
        // 9 * 0.25 = 2.25 -> 2 and 9 * 0.75 = 6.75 -> 7
        assert_eq!(grid.coord_at(WorldPos::new(-2.5, 2.5)), Point::new(2, 7));
    }

    #[test]
    fn cell_at_clamps_outside_positions() {
        let grid = unit_grid(5, &[]);
        assert_eq!(grid.coord_at(WorldPos::new(-1e6, -1e6)), Point::new(0, 0));
        assert_eq!(grid.coord_at(WorldPos::new(1e6, 1e6)), Point::new(4, 4));
        assert_eq!(grid.coord_at(WorldPos::new(1e6, -3.0)), Point::new(4, 0));
        assert_eq!(
            grid.coord_at(WorldPos::new(f32::NAN, f32::INFINITY)),
            Point::new(0, 4)
        );
    }

    #[test]
    fn cell_at_on_single_cell_grid() {
        let grid = unit_grid(1, &[]);
        assert_eq!(grid.coord_at(WorldPos::new(7.0, -7.0)), Point::new(0, 0));
    }

    #[test]
    fn interior_cell_has_eight_neighbours() {
        let grid = unit_grid(5, &[(1, 1)]);
        let neighbours = grid.neighbours(&Point::new(2, 2));
        assert_eq!(neighbours.len(), 8);
        // Blocked cells are still reported
        assert!(neighbours.iter().any(|c| c.coord() == Point::new(1, 1)));
        assert!(neighbours.iter().all(|c| c.coord() != Point::new(2, 2)));
    }

    #[test]
    fn edge_cells_include_index_zero() {
        let grid = unit_grid(5, &[]);
        let corner = grid.neighbours(&Point::new(0, 0));
        let coords = corner.iter().map(|c| c.coord()).collect::<Vec<_>>();
        assert_eq!(
            coords,
            vec![Point::new(0, 1), Point::new(1, 0), Point::new(1, 1)]
        );

        let edge = grid.neighbours(&Point::new(1, 0));
        assert_eq!(edge.len(), 5);
        assert!(edge.iter().any(|c| c.coord() == Point::new(0, 0)));
        assert!(edge.iter().any(|c| c.coord() == Point::new(0, 1)));

        let far_corner = grid.neighbours(&Point::new(4, 4));
        assert_eq!(far_corner.len(), 3);
        assert!(far_corner.iter().any(|c| c.coord() == Point::new(3, 3)));
    }

    #[test]
    fn components() {
        //  ___
        // |.#.|
        // |.#.|
        //  ___
        let grid = crate::test_grid(3, 2, &[(1, 0), (1, 1)]);
        assert_eq!(grid.component_count(), 2);
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(0, 1)));
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(1, 0)));
        assert!(grid.unreachable(&Point::new(0, 0), &Point::new(5, 0)));
        assert!(grid.reachable(&Point::new(1, 0), &Point::new(1, 0)));
        assert_ne!(
            grid.get_component(&Point::new(0, 0)),
            grid.get_component(&Point::new(2, 1))
        );
        assert_eq!(grid.get_component(&Point::new(-1, 0)), None);
    }

    #[test]
    fn diagonal_connects_components() {
        //  __
        // |#.|
        // |.#|
        //  __
        let grid = crate::test_grid(2, 2, &[(1, 0), (0, 1)]);
        assert_eq!(grid.component_count(), 1);
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(1, 1)));
    }

    #[test]
    fn rebuild_keeps_placement() {
        let grid = unit_grid(4, &[]);
        let rebuilt = grid.rebuild(|p, _| p.x > 0.0).unwrap();
        assert_eq!(rebuilt.config(), grid.config());
        assert_eq!((rebuilt.width(), rebuilt.height()), (4, 4));
        assert!(rebuilt.walkable_count() < grid.walkable_count());
    }

    #[test]
    fn display() {
        let grid = crate::test_grid(3, 2, &[(0, 0), (2, 1)]);
        assert_eq!(grid.to_string(), "..#\n#..\n");
    }
}
