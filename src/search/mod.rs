//! Incremental A* search over a [Grid].
//!
//! A [SearchEngine] runs one search episode at a time. An episode is started with
//! [start_search](SearchEngine::start_search) and advanced one expansion at a time with
//! [step](SearchEngine::step), so a host loop can spread a long search over many ticks and
//! [cancel](SearchEngine::cancel) it between any two steps.
//! [run_to_completion](SearchEngine::run_to_completion) drives the same state machine in a
//! single call.
//!
//! All per-cell bookkeeping (costs, predecessors, open/closed membership) is owned by the
//! episode and dropped with it, so nothing leaks from one episode into the next.
mod open_set;

use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::cell::WorldPos;
use crate::config::SearchConfig;
use crate::grid::Grid;
use crate::metric::octile_distance;
use open_set::{OpenSet, SmallestCostHolder};

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// The start cell is always the first entry of an episode's node map.
const START_INDEX: usize = 0;
const NO_PARENT: usize = usize::MAX;

/// Where the engine is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl SearchStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, SearchStatus::Succeeded | SearchStatus::Failed)
    }
}

/// A path produced by a successful search. Cells are ordered from the goal back towards the
/// start; the start cell itself is not included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    cells: Vec<Point>,
    cost: i32,
}

impl Path {
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    /// Accumulated cost from the start to the goal.
    pub fn cost(&self) -> i32 {
        self.cost
    }
    /// Cells from the goal back towards the start.
    pub fn cells(&self) -> &[Point] {
        &self.cells
    }
    pub fn contains(&self, point: &Point) -> bool {
        self.cells.contains(point)
    }
    /// World-space centres of the path cells, in the same goal-first order.
    pub fn positions(&self, grid: &Grid) -> Vec<WorldPos> {
        self.cells
            .iter()
            .filter_map(|p| grid.cell(p))
            .map(|c| c.position())
            .collect()
    }
    /// Cells in walking order, from the first step after the start up to the goal.
    pub fn into_start_to_goal(self) -> Vec<Point> {
        let mut cells = self.cells;
        cells.reverse();
        cells
    }
}

/// Result of a finished search episode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Path),
    NoPathFound,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NoPathFound => None,
        }
    }
    /// The found path, or an empty one if the search failed.
    pub fn into_path(self) -> Path {
        match self {
            SearchOutcome::Found(path) => path,
            SearchOutcome::NoPathFound => Path::default(),
        }
    }
}

/// Search bookkeeping for a single cell in the running episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeCosts {
    pub g: i32,
    pub h: i32,
    pub parent: Option<Point>,
}

impl NodeCosts {
    pub fn f(&self) -> i32 {
        self.g + self.h
    }
}

#[derive(Clone, Copy, Debug)]
struct NodeRecord {
    parent: usize,
    g: i32,
    h: i32,
    closed: bool,
}

/// One search from `start` to `goal`. Every cell the episode has discovered has an entry in
/// `nodes`; an entry's index is its discovery order.
#[derive(Debug)]
struct Episode {
    start: Point,
    goal: Point,
    shape: (usize, usize),
    nodes: FxIndexMap<Point, NodeRecord>,
    open: OpenSet,
    open_len: usize,
    expanded: usize,
}

impl Episode {
    fn new(grid: &Grid, start: Point, goal: Point) -> Episode {
        let h = octile_distance(&start, &goal);
        let mut nodes = FxIndexMap::default();
        nodes.insert(
            start,
            NodeRecord {
                parent: NO_PARENT,
                g: 0,
                h,
                closed: false,
            },
        );
        let mut open = OpenSet::new();
        open.push(SmallestCostHolder {
            estimated_cost: h,
            heuristic: h,
            cost: 0,
            index: START_INDEX,
        });
        Episode {
            start,
            goal,
            shape: (grid.width(), grid.height()),
            nodes,
            open,
            open_len: 1,
            expanded: 0,
        }
    }

    /// Expands the best open cell. Returns the outcome once the episode is over.
    fn advance(&mut self, grid: &Grid) -> Option<SearchOutcome> {
        let (current_ix, current, g) = loop {
            let Some(SmallestCostHolder { cost, index, .. }) = self.open.pop() else {
                return Some(SearchOutcome::NoPathFound);
            };
            let Some((point, record)) = self.nodes.get_index_mut(index) else {
                continue;
            };
            // A cell is pushed again whenever a cheaper route to it is found, skip the
            // outdated entries.
            if record.closed || cost != record.g {
                continue;
            }
            record.closed = true;
            break (index, *point, record.g);
        };
        self.open_len -= 1;
        self.expanded += 1;
        trace!("Expanding {} (g = {})", current, g);

        if current == self.goal {
            return Some(SearchOutcome::Found(self.reconstruct_path(current_ix)));
        }

        let goal = self.goal;
        for cell in grid.neighbours(&current) {
            if !cell.walkable() {
                continue;
            }
            let neighbour = cell.coord();
            let new_cost = g + octile_distance(&current, &neighbour);
            let (index, h) = match self.nodes.entry(neighbour) {
                Vacant(e) => {
                    let h = octile_distance(&neighbour, &goal);
                    let index = e.index();
                    e.insert(NodeRecord {
                        parent: current_ix,
                        g: new_cost,
                        h,
                        closed: false,
                    });
                    self.open_len += 1;
                    (index, h)
                }
                Occupied(mut e) => {
                    let record = e.get_mut();
                    if record.closed || new_cost >= record.g {
                        continue;
                    }
                    record.g = new_cost;
                    record.parent = current_ix;
                    let h = record.h;
                    (e.index(), h)
                }
            };
            self.open.push(SmallestCostHolder {
                estimated_cost: new_cost + h,
                heuristic: h,
                cost: new_cost,
                index,
            });
        }

        if self.open_len == 0 {
            return Some(SearchOutcome::NoPathFound);
        }
        None
    }

    fn reconstruct_path(&self, goal_ix: usize) -> Path {
        let mut ix = goal_ix;
        let cells = std::iter::from_fn(|| {
            if ix == START_INDEX {
                return None;
            }
            let (point, record) = self.nodes.get_index(ix)?;
            ix = record.parent;
            Some(*point)
        })
        .collect();
        let cost = self
            .nodes
            .get_index(goal_ix)
            .map_or(0, |(_, record)| record.g);
        Path { cells, cost }
    }

    fn costs(&self, point: &Point) -> Option<NodeCosts> {
        self.nodes.get(point).map(|record| NodeCosts {
            g: record.g,
            h: record.h,
            parent: self.nodes.get_index(record.parent).map(|(p, _)| *p),
        })
    }
}

#[derive(Debug, Default)]
enum EngineState {
    #[default]
    Idle,
    Running(Episode),
    Finished(SearchOutcome),
}

/// Runs A* search episodes over a [Grid] with the octile metric, one at a time.
///
/// The engine does not hold on to the grid; the same grid has to be passed to every call made
/// for an episode. Stepping with a grid of a different shape cancels the episode.
#[derive(Debug, Default)]
pub struct SearchEngine {
    config: SearchConfig,
    state: EngineState,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> SearchEngine {
        SearchEngine {
            config,
            state: EngineState::Idle,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn status(&self) -> SearchStatus {
        match &self.state {
            EngineState::Idle => SearchStatus::Idle,
            EngineState::Running(_) => SearchStatus::Running,
            EngineState::Finished(SearchOutcome::Found(_)) => SearchStatus::Succeeded,
            EngineState::Finished(SearchOutcome::NoPathFound) => SearchStatus::Failed,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    /// Starts a new episode from `start` to `goal`. Ignored, returning `false`, while another
    /// episode is running. A finished outcome that was not taken yet is dropped.
    pub fn start_search(&mut self, grid: &Grid, start: Point, goal: Point) -> bool {
        if self.is_running() {
            debug!(
                "Search from {} to {} ignored, an episode is already running",
                start, goal
            );
            return false;
        }
        if !(grid.point_in_bounds(&start) && grid.point_in_bounds(&goal)) {
            warn!("Search from {} to {} lies outside the grid", start, goal);
            self.state = EngineState::Finished(SearchOutcome::NoPathFound);
            return true;
        }
        if self.config.component_check
            && start != goal
            && grid.walkable(&start)
            && grid.unreachable(&start, &goal)
        {
            debug!("{} is not reachable from {}", goal, start);
            self.state = EngineState::Finished(SearchOutcome::NoPathFound);
            return true;
        }
        debug!("Starting search from {} to {}", start, goal);
        self.state = EngineState::Running(Episode::new(grid, start, goal));
        true
    }

    /// Like [start_search](Self::start_search), resolving both positions with
    /// [Grid::coord_at].
    pub fn start_search_at(&mut self, grid: &Grid, start: WorldPos, goal: WorldPos) -> bool {
        self.start_search(grid, grid.coord_at(start), grid.coord_at(goal))
    }

    /// Performs one iteration of the search loop if an episode is running and returns the
    /// resulting status.
    pub fn step(&mut self, grid: &Grid) -> SearchStatus {
        let EngineState::Running(episode) = &mut self.state else {
            return self.status();
        };
        if episode.shape != (grid.width(), grid.height()) {
            warn!(
                "Search from {} to {} stepped on a {}x{} grid but was started on a {}x{} grid, cancelling",
                episode.start,
                episode.goal,
                grid.width(),
                grid.height(),
                episode.shape.0,
                episode.shape.1
            );
            self.state = EngineState::Idle;
            return SearchStatus::Idle;
        }
        if let Some(outcome) = episode.advance(grid) {
            match &outcome {
                SearchOutcome::Found(path) => debug!(
                    "Found path from {} to {} with cost {} after {} expansions",
                    episode.start,
                    episode.goal,
                    path.cost(),
                    episode.expanded
                ),
                SearchOutcome::NoPathFound => debug!(
                    "No path from {} to {} after {} expansions",
                    episode.start, episode.goal, episode.expanded
                ),
            }
            self.state = EngineState::Finished(outcome);
        }
        self.status()
    }

    /// Abandons the running episode, if any, without producing a path.
    pub fn cancel(&mut self) -> bool {
        if let EngineState::Running(episode) = &self.state {
            debug!(
                "Cancelled search from {} to {} after {} expansions",
                episode.start, episode.goal, episode.expanded
            );
            self.state = EngineState::Idle;
            true
        } else {
            false
        }
    }

    /// Hands out the outcome of a finished episode and returns the engine to idle.
    pub fn take_outcome(&mut self) -> Option<SearchOutcome> {
        match std::mem::take(&mut self.state) {
            EngineState::Finished(outcome) => Some(outcome),
            state => {
                self.state = state;
                None
            }
        }
    }

    /// Runs a whole episode in one call. Returns `None` without doing anything if an episode is
    /// already running.
    pub fn run_to_completion(
        &mut self,
        grid: &Grid,
        start: Point,
        goal: Point,
    ) -> Option<SearchOutcome> {
        if !self.start_search(grid, start, goal) {
            return None;
        }
        while self.step(grid) == SearchStatus::Running {}
        self.take_outcome()
    }

    fn episode(&self) -> Option<&Episode> {
        match &self.state {
            EngineState::Running(episode) => Some(episode),
            _ => None,
        }
    }

    /// Costs recorded for `point` by the running episode, `None` if the episode has not
    /// discovered it or no episode is running.
    pub fn node_costs(&self, point: &Point) -> Option<NodeCosts> {
        self.episode().and_then(|e| e.costs(point))
    }

    /// Cells discovered but not yet expanded by the running episode, in discovery order.
    pub fn open_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.episode()
            .into_iter()
            .flat_map(|e| e.nodes.iter())
            .filter(|(_, record)| !record.closed)
            .map(|(p, _)| *p)
    }

    /// Cells expanded by the running episode, in discovery order.
    pub fn closed_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.episode()
            .into_iter()
            .flat_map(|e| e.nodes.iter())
            .filter(|(_, record)| record.closed)
            .map(|(p, _)| *p)
    }

    /// Number of cells expanded so far by the running episode.
    pub fn expanded(&self) -> usize {
        self.episode().map_or(0, |e| e.expanded)
    }
}
