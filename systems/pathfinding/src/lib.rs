#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Incremental A* planner that remembers its last path between turns.
//!
//! Each agent owns one [`PathPlanner`]. Every call to [`PathPlanner::find_path`]
//! assumes the agent advanced one node along the remembered path since the
//! previous call. As long as the agent is where the memo expects and no
//! [`Interruption`] fires, the remaining suffix is handed back without
//! searching. Otherwise the memo is dropped and a fresh search runs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use pursuit_core::{distance, next_pos, Grid, Position};

/// Node of a planned path together with its search costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathNode {
    /// Cell occupied by the node.
    pub position: Position,
    /// Accumulated move cost from the search start.
    pub g: u32,
    /// Estimated move cost to the search target.
    pub h: u32,
}

impl PathNode {
    /// Creates a node with the provided costs.
    #[must_use]
    pub const fn new(position: Position, g: u32, h: u32) -> Self {
        Self { position, g, h }
    }

    /// Total estimated cost through this node.
    #[must_use]
    pub const fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// Non-empty sequence of nodes leading from a start cell to a destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<PathNode>,
}

impl Path {
    /// Path that keeps the agent on `position`.
    #[must_use]
    pub fn stay(position: Position) -> Self {
        Self {
            nodes: vec![PathNode::new(position, 0, 0)],
        }
    }

    /// Nodes of the path, starting with the agent's own cell.
    #[must_use]
    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    /// Number of nodes in the path. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the path only holds the start cell.
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Cell the path starts from.
    #[must_use]
    pub fn start(&self) -> Position {
        self.nodes[0].position
    }

    /// Cell the path ends at.
    #[must_use]
    pub fn destination(&self) -> Position {
        self.nodes[self.nodes.len() - 1].position
    }

    /// Cell the agent should occupy after its next move.
    ///
    /// This is the second node, or the start itself for a single node path.
    #[must_use]
    pub fn next_position(&self) -> Position {
        self.nodes
            .get(1)
            .map_or_else(|| self.start(), |node| node.position)
    }

    /// Iterates over the cells of the path in travel order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.nodes.iter().map(|node| node.position)
    }

    fn suffix(&self, from: usize) -> Self {
        Self {
            nodes: self.nodes[from..].to_vec(),
        }
    }
}

/// Inputs for a single planning call.
#[derive(Clone, Copy, Debug)]
pub struct PathRequest<'a> {
    /// Grid being navigated.
    pub grid: &'a Grid,
    /// Cell the agent currently occupies.
    pub start: Position,
    /// Cell the agent wants to reach.
    pub target: Position,
    /// Longest straight move the agent may make in one turn.
    pub step_budget: u32,
    /// Cells the search must not expand into.
    pub avoid: &'a HashSet<Position>,
}

/// Condition that invalidates a remembered path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interruption {
    /// The remembered path no longer ends at the current target.
    TargetMoved {
        /// Target the agent is heading for this turn.
        current: Position,
    },
    /// A threat came close enough that the old route is unsafe.
    DangerZone {
        /// Cell of the agent that owns the planner.
        requester: Position,
        /// Cell of the threatening agent.
        threat: Position,
        /// Distance at or below which the interruption fires.
        radius: u32,
    },
}

impl Interruption {
    /// Reports whether the interruption invalidates `path`.
    #[must_use]
    pub fn fires(&self, path: &Path) -> bool {
        match *self {
            Self::TargetMoved { current } => path.destination() != current,
            Self::DangerZone {
                requester,
                threat,
                radius,
            } => distance(requester, threat, 1) <= radius,
        }
    }
}

/// Path remembered from the last successful search and how far the agent
/// has travelled along it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerMemo {
    path: Path,
    progress: usize,
}

impl PlannerMemo {
    /// Remembered path as it was planned.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the node the agent is expected to occupy.
    #[must_use]
    pub const fn progress(&self) -> usize {
        self.progress
    }
}

/// Read-only view over the search frontier handed to observers.
#[derive(Debug)]
pub struct SearchSnapshot<'a> {
    open: &'a HashMap<Position, OpenEntry>,
    closed: &'a HashMap<Position, PathNode>,
    /// Cell the search started from.
    pub start: Position,
    /// Cell the search is heading for.
    pub target: Position,
}

impl SearchSnapshot<'_> {
    /// Nodes waiting to be expanded.
    pub fn open(&self) -> impl Iterator<Item = &PathNode> + '_ {
        self.open.values().map(|entry| &entry.node)
    }

    /// Nodes that were already expanded.
    pub fn closed(&self) -> impl Iterator<Item = &PathNode> + '_ {
        self.closed.values()
    }
}

/// Hooks invoked while the planner searches. Defaults do nothing.
pub trait SearchObserver {
    /// Called once for every path produced by a fresh search.
    fn path_found(&mut self, _path: &Path) {}

    /// Called after each expanded node has had its successors evaluated.
    fn successors_evaluated(&mut self, _snapshot: &SearchSnapshot<'_>) {}
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// Open and closed nodes left behind by the most recent search, sorted by
/// position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchTrace {
    /// Nodes still open when the search stopped.
    pub open: Vec<PathNode>,
    /// Nodes expanded during the search.
    pub closed: Vec<PathNode>,
}

/// Per-agent planner combining A* search with path reuse.
#[derive(Clone, Debug, Default)]
pub struct PathPlanner {
    memo: Option<PlannerMemo>,
    searches: u64,
    trace: SearchTrace,
}

impl PathPlanner {
    /// Creates a planner with an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces a path from `request.start` towards `request.target`.
    ///
    /// The remembered path is reused when the agent sits on its next node and
    /// none of `interruptions` fire. When the target cannot be reached the
    /// single node path [`Path::stay`] is returned and the memo stays empty.
    pub fn find_path(
        &mut self,
        request: &PathRequest<'_>,
        interruptions: &[Interruption],
        observer: &mut dyn SearchObserver,
    ) -> Path {
        if let Some(path) = self.reuse(request, interruptions) {
            return path;
        }
        self.memo = None;

        if request.start == request.target {
            return Path::stay(request.start);
        }

        self.searches += 1;
        match self.search(request, observer) {
            Some(path) => {
                tracing::trace!(
                    start = %request.start,
                    target = %request.target,
                    nodes = path.len(),
                    "planned new path"
                );
                observer.path_found(&path);
                self.memo = Some(PlannerMemo {
                    path: path.clone(),
                    progress: 0,
                });
                path
            }
            None => {
                tracing::trace!(
                    start = %request.start,
                    target = %request.target,
                    "target unreachable"
                );
                Path::stay(request.start)
            }
        }
    }

    /// Forgets the remembered path.
    pub fn reset(&mut self) {
        self.memo = None;
    }

    /// Remembered path, if any.
    #[must_use]
    pub fn memo(&self) -> Option<&PlannerMemo> {
        self.memo.as_ref()
    }

    /// Number of fresh searches performed so far.
    #[must_use]
    pub const fn searches(&self) -> u64 {
        self.searches
    }

    /// Frontier left behind by the latest search.
    #[must_use]
    pub fn trace(&self) -> &SearchTrace {
        &self.trace
    }

    fn reuse(&mut self, request: &PathRequest<'_>, interruptions: &[Interruption]) -> Option<Path> {
        let memo = self.memo.as_mut()?;
        memo.progress += 1;

        let expected = memo.path.nodes.get(memo.progress)?;
        if expected.position != request.start {
            return None;
        }
        if interruptions
            .iter()
            .any(|interruption| interruption.fires(&memo.path))
        {
            return None;
        }

        Some(memo.path.suffix(memo.progress))
    }

    fn search(
        &mut self,
        request: &PathRequest<'_>,
        observer: &mut dyn SearchObserver,
    ) -> Option<Path> {
        let budget = request.step_budget.max(1);
        let target = request.target;

        let mut open: HashMap<Position, OpenEntry> = HashMap::new();
        let mut closed: HashMap<Position, PathNode> = HashMap::new();
        let mut came_from: HashMap<Position, PathNode> = HashMap::new();
        let mut frontier = BinaryHeap::new();
        let mut sequence: u64 = 0;

        let origin = PathNode::new(
            request.start,
            0,
            heuristic(request.start, target, budget),
        );
        let _ = open.insert(
            origin.position,
            OpenEntry {
                node: origin,
                sequence,
            },
        );
        frontier.push(Reverse((origin.f(), sequence, origin.position)));

        while let Some(Reverse((_, popped, position))) = frontier.pop() {
            let current = match open.get(&position) {
                Some(entry) if entry.sequence == popped => entry.node,
                _ => continue,
            };
            let _ = open.remove(&position);
            let _ = closed.insert(position, current);

            for successor in request.grid.neighbors(position, budget, request.avoid) {
                let g = current.g + distance(position, successor, budget);
                if closed.get(&successor).is_some_and(|node| g >= node.g) {
                    continue;
                }
                if open.get(&successor).is_some_and(|entry| g >= entry.node.g) {
                    continue;
                }

                let _ = closed.remove(&successor);
                let node = PathNode::new(successor, g, heuristic(successor, target, budget));
                let _ = came_from.insert(successor, current);

                if successor == target {
                    self.record_trace(&open, &closed);
                    return Some(reconstruct(&came_from, node));
                }

                sequence += 1;
                let _ = open.insert(successor, OpenEntry { node, sequence });
                frontier.push(Reverse((node.f(), sequence, successor)));
            }

            observer.successors_evaluated(&SearchSnapshot {
                open: &open,
                closed: &closed,
                start: request.start,
                target,
            });
        }

        self.record_trace(&open, &closed);
        None
    }

    fn record_trace(
        &mut self,
        open: &HashMap<Position, OpenEntry>,
        closed: &HashMap<Position, PathNode>,
    ) {
        let mut open_nodes: Vec<PathNode> = open.values().map(|entry| entry.node).collect();
        let mut closed_nodes: Vec<PathNode> = closed.values().copied().collect();
        open_nodes.sort_by_key(|node| node.position);
        closed_nodes.sort_by_key(|node| node.position);
        self.trace = SearchTrace {
            open: open_nodes,
            closed: closed_nodes,
        };
    }
}

/// Number of greedy [`next_pos`] moves needed to walk from `from` to `target`.
#[must_use]
pub fn heuristic(from: Position, target: Position, step_budget: u32) -> u32 {
    let budget = step_budget.max(1);
    let mut cursor = from;
    let mut moves = 0;
    while cursor != target {
        cursor = next_pos(cursor, target, budget);
        moves += 1;
    }
    moves
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: PathNode,
    sequence: u64,
}

fn reconstruct(came_from: &HashMap<Position, PathNode>, goal: PathNode) -> Path {
    let mut nodes = vec![goal];
    let mut cursor = goal.position;

    // Each predecessor link is followed at most once.
    for _ in 0..came_from.len() {
        let Some(previous) = came_from.get(&cursor) else {
            break;
        };
        nodes.push(*previous);
        cursor = previous.position;
    }

    nodes.reverse();
    Path { nodes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: u32, height: u32) -> Grid {
        Grid::new(width, height, Vec::new())
    }

    #[test]
    fn heuristic_counts_greedy_moves() {
        assert_eq!(heuristic(Position::new(0, 0), Position::new(0, 0), 3), 0);
        assert_eq!(heuristic(Position::new(0, 0), Position::new(3, 0), 1), 3);
        assert_eq!(heuristic(Position::new(0, 0), Position::new(3, 2), 2), 3);
        assert_eq!(heuristic(Position::new(0, 0), Position::new(4, 0), 0), 4);
    }

    #[test]
    fn single_node_path_stays_put() {
        let path = Path::stay(Position::new(2, 3));
        assert!(path.is_stationary());
        assert_eq!(path.next_position(), Position::new(2, 3));
        assert_eq!(path.destination(), Position::new(2, 3));
    }

    #[test]
    fn interruption_predicates() {
        let path = Path {
            nodes: vec![
                PathNode::new(Position::new(0, 0), 0, 2),
                PathNode::new(Position::new(1, 0), 1, 1),
                PathNode::new(Position::new(2, 0), 2, 0),
            ],
        };

        assert!(!Interruption::TargetMoved {
            current: Position::new(2, 0)
        }
        .fires(&path));
        assert!(Interruption::TargetMoved {
            current: Position::new(3, 0)
        }
        .fires(&path));

        let close = Interruption::DangerZone {
            requester: Position::new(0, 0),
            threat: Position::new(1, 1),
            radius: 2,
        };
        let far = Interruption::DangerZone {
            requester: Position::new(0, 0),
            threat: Position::new(3, 0),
            radius: 2,
        };
        assert!(close.fires(&path));
        assert!(!far.fires(&path));
    }

    #[test]
    fn planning_onto_own_cell_skips_search() {
        let grid = open_grid(3, 3);
        let avoid = HashSet::new();
        let mut planner = PathPlanner::new();
        let request = PathRequest {
            grid: &grid,
            start: Position::new(1, 1),
            target: Position::new(1, 1),
            step_budget: 1,
            avoid: &avoid,
        };

        let path = planner.find_path(&request, &[], &mut NoopObserver);

        assert_eq!(path, Path::stay(Position::new(1, 1)));
        assert_eq!(planner.searches(), 0);
        assert!(planner.memo().is_none());
    }

    #[test]
    fn reconstruct_orders_from_start() {
        let start = PathNode::new(Position::new(0, 0), 0, 2);
        let middle = PathNode::new(Position::new(0, 1), 1, 1);
        let goal = PathNode::new(Position::new(0, 2), 2, 0);
        let came_from: HashMap<Position, PathNode> =
            [(middle.position, start), (goal.position, middle)]
                .into_iter()
                .collect();

        let path = reconstruct(&came_from, goal);

        assert_eq!(path.nodes(), &[start, middle, goal]);
    }
}
