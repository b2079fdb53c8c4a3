//! Glue between a host loop and the [SearchEngine].

use log::debug;

use crate::cell::WorldPos;
use crate::config::SearchConfig;
use crate::grid::Grid;
use crate::search::{Path, SearchEngine, SearchStatus};

/// Receives the result of every finished search. A failed search is published as an empty path.
pub trait PathSink {
    fn publish(&mut self, grid: &Grid, path: &Path);
}

impl<F> PathSink for F
where
    F: FnMut(&Grid, &Path),
{
    fn publish(&mut self, grid: &Grid, path: &Path) {
        self(grid, path)
    }
}

/// Watches an agent and its target, and keeps a path between them up to date by running
/// incremental searches over a few steps per host tick. At most one search runs at a time.
///
/// A change of either position sets a `pending` flag. Unlike a trigger that only fires when the
/// change is seen while idle, a move observed while a search is running is not dropped: the
/// running search finishes against the old positions and one fresh search for the latest
/// positions starts on the next tick.
#[derive(Debug)]
pub struct SearchCoordinator {
    grid: Grid,
    engine: SearchEngine,
    previous: Option<(WorldPos, WorldPos)>,
    pending: bool,
    last_path: Path,
}

impl SearchCoordinator {
    pub fn new(grid: Grid, config: SearchConfig) -> SearchCoordinator {
        SearchCoordinator {
            grid,
            engine: SearchEngine::new(config),
            previous: None,
            pending: false,
            last_path: Path::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }
    /// The most recently published path.
    pub fn last_path(&self) -> &Path {
        &self.last_path
    }
    pub fn status(&self) -> SearchStatus {
        self.engine.status()
    }

    /// Advances the coordinator by one host tick.
    pub fn tick<S: PathSink>(
        &mut self,
        agent: WorldPos,
        target: WorldPos,
        sink: &mut S,
    ) -> SearchStatus {
        if self.previous != Some((agent, target)) {
            self.pending = true;
        }
        self.previous = Some((agent, target));

        if self.pending && !self.engine.is_running() {
            let start = self.grid.coord_at(agent);
            let goal = self.grid.coord_at(target);
            if self.engine.start_search(&self.grid, start, goal) {
                self.pending = false;
            }
        }

        for _ in 0..self.engine.config().step_budget() {
            if self.engine.step(&self.grid) != SearchStatus::Running {
                break;
            }
        }

        let status = self.engine.status();
        if status.is_finished() {
            if let Some(outcome) = self.engine.take_outcome() {
                self.last_path = outcome.into_path();
                debug!("Publishing path of {} cells", self.last_path.len());
                sink.publish(&self.grid, &self.last_path);
            }
        }
        status
    }

    /// Cancels the running search, if any. The current positions are searched again on the next
    /// tick.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.engine.cancel();
        if cancelled {
            self.pending = true;
        }
        cancelled
    }

    /// Swaps in a rebuilt grid. Any running search is cancelled, the published path is cleared
    /// and a new search starts on the next tick.
    pub fn replace_grid(&mut self, grid: Grid) -> Grid {
        self.engine.cancel();
        self.engine.take_outcome();
        self.last_path = Path::default();
        self.pending = true;
        std::mem::replace(&mut self.grid, grid)
    }
}
