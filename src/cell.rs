use core::fmt;
use grid_util::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point in the world plane the grid is laid on.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> WorldPos {
        WorldPos { x, y }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single grid cell. All fields are fixed when the [Grid](crate::grid::Grid) is built; search
/// bookkeeping lives with the search episode instead, see
/// [NodeCosts](crate::search::NodeCosts).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    position: WorldPos,
    coord: Point,
    walkable: bool,
}

impl Cell {
    pub(crate) fn new(position: WorldPos, coord: Point, walkable: bool) -> Cell {
        Cell {
            position,
            coord,
            walkable,
        }
    }
    /// World-space centre of the cell.
    pub fn position(&self) -> WorldPos {
        self.position
    }
    pub fn coord(&self) -> Point {
        self.coord
    }
    pub fn walkable(&self) -> bool {
        self.walkable
    }
}
