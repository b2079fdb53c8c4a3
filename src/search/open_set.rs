use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry for a cell on the open set. `index` is the cell's slot in the episode's node map,
/// which doubles as its insertion order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SmallestCostHolder {
    pub estimated_cost: i32,
    pub heuristic: i32,
    pub cost: i32,
    pub index: usize,
}

impl Eq for SmallestCostHolder {}

impl PartialEq for SmallestCostHolder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for SmallestCostHolder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmallestCostHolder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the smallest estimated cost, then the smallest
        // heuristic, then the entry inserted first
        other
            .estimated_cost
            .cmp(&self.estimated_cost)
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.index.cmp(&self.index))
            .then_with(|| other.cost.cmp(&self.cost))
    }
}

/// Frontier of a search episode. Improving a cell pushes a fresh entry rather than updating the
/// old one in place, so popped entries have to be checked against the episode's node map.
#[derive(Debug, Default)]
pub(crate) struct OpenSet {
    heap: BinaryHeap<SmallestCostHolder>,
}

impl OpenSet {
    pub fn new() -> OpenSet {
        OpenSet::default()
    }
    pub fn push(&mut self, entry: SmallestCostHolder) {
        self.heap.push(entry);
    }
    pub fn pop(&mut self) -> Option<SmallestCostHolder> {
        self.heap.pop()
    }
}
