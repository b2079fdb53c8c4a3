//! Construction and search settings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, WorldPos};
use crate::error::{ConfigError, Result};

/// World-space placement of a [Grid](crate::grid::Grid). The grid is centred on `origin` and
/// covers `size.x` by `size.y` world units with square cells of diameter `2 * cell_radius`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridConfig {
    pub origin: WorldPos,
    pub size: WorldPos,
    pub cell_radius: f32,
}

impl Default for GridConfig {
    fn default() -> GridConfig {
        GridConfig {
            origin: WorldPos::new(0.0, 0.0),
            size: WorldPos::new(10.0, 10.0),
            cell_radius: 0.5,
        }
    }
}

impl GridConfig {
    pub fn new(origin: WorldPos, size: WorldPos, cell_radius: f32) -> GridConfig {
        GridConfig {
            origin,
            size,
            cell_radius,
        }
    }

    pub fn diameter(&self) -> f32 {
        self.cell_radius * 2.0
    }

    /// Cell counts per axis, `floor(size / diameter)`. Only meaningful for a validated config.
    pub fn dimensions(&self) -> (usize, usize) {
        let diameter = self.diameter();
        (
            (self.size.x / diameter).floor() as usize,
            (self.size.y / diameter).floor() as usize,
        )
    }

    /// World position of the grid corner that cell (0, 0) is anchored to.
    pub fn corner(&self) -> WorldPos {
        WorldPos::new(
            self.origin.x - self.size.x / 2.0,
            self.origin.y - self.size.y / 2.0,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cell_radius.is_finite() && self.cell_radius > 0.0) {
            return Err(ConfigError::NonPositiveRadius(self.cell_radius));
        }
        let (width, height) = (self.size.x, self.size.y);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::NonPositiveExtent { width, height });
        }
        let (w, h) = self.dimensions();
        if w == 0 || h == 0 {
            return Err(ConfigError::EmptyGrid {
                width,
                height,
                diameter: self.diameter(),
            });
        }
        // Cell coordinates are i32 and the cell storage must be addressable
        let bytes = w
            .checked_mul(h)
            .and_then(|count| count.checked_mul(std::mem::size_of::<Cell>()));
        let fits = bytes.is_some_and(|bytes| bytes <= isize::MAX as usize);
        if w > i32::MAX as usize || h > i32::MAX as usize || !fits {
            return Err(ConfigError::TooLarge {
                width: w,
                height: h,
            });
        }
        Ok(())
    }
}

/// Settings of a [SearchEngine](crate::search::SearchEngine) and the
/// [SearchCoordinator](crate::coordinator::SearchCoordinator) driving it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchConfig {
    /// Number of search steps issued per host tick. Zero is treated as one.
    pub steps_per_tick: usize,
    /// Resolve episodes between disconnected cells immediately using the grid's components.
    pub component_check: bool,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            steps_per_tick: 1,
            component_check: false,
        }
    }
}

impl SearchConfig {
    pub fn with_steps_per_tick(mut self, steps_per_tick: usize) -> SearchConfig {
        self.steps_per_tick = steps_per_tick;
        self
    }

    pub fn with_component_check(mut self, component_check: bool) -> SearchConfig {
        self.component_check = component_check;
        self
    }

    pub(crate) fn step_budget(&self) -> usize {
        self.steps_per_tick.max(1)
    }
}
