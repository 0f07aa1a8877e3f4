//! Multi-turn planner.
//!
//! [`TurnPlanner`] owns the committed board and the unit's position between
//! real turns. [`TurnPlanner::plan`] grows an arena of hypothetical paths,
//! one layer per turn of the horizon, and [`best_chain`] searches it for the
//! highest scoring chain. Every path carries the cumulative depletion of its
//! lineage; the committed board is only touched by [`TurnPlanner::commit`].

use std::collections::{btree_map::Entry, BTreeMap};
use std::sync::Arc;

use plan_runtime::{Command, OrderImpulse, IMPULSES_PER_TURN};
use serde::Serialize;
use thiserror::Error;

use crate::{
    board::{Board, BoardError, Coord, Grid},
    economy::{price, CandidateBoard, Depletion, EconomyError},
    orders::{self, OrderTraceError},
    planner_config::PlannerConfig,
    region::OwnershipRegion,
    search::{breadth_first, SearchError, SearchTree},
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Economy(#[from] EconomyError),
    #[error(transparent)]
    Orders(#[from] OrderTraceError),
    #[error("home {0} is not on the board graph")]
    HomeNotOnGraph(Coord),
    #[error("turn {turn} path was planned against an older committed board")]
    StalePath { turn: u32 },
}

/// One priced candidate for a single turn. Immutable once built.
#[derive(Debug, Clone)]
pub struct PlannedPath {
    turn: u32,
    points: u64,
    start: Coord,
    finish: Coord,
    command: Command,
    through: Option<Coord>,
    route: Vec<Coord>,
    parent: Option<usize>,
    depletion: Depletion,
    committed: Arc<Board>,
}

impl PlannedPath {
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn finish(&self) -> Coord {
        self.finish
    }

    pub fn command(&self) -> Command {
        self.command
    }

    /// Corner or midpoint dug by `SDS`.
    pub fn through(&self) -> Option<Coord> {
        self.through
    }

    /// Cells walked from start to finish, inclusive.
    pub fn route(&self) -> &[Coord] {
        &self.route
    }

    /// Index of the previous turn's path in the arena.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Digs of this path and all of its ancestors.
    pub fn depletion(&self) -> &Depletion {
        &self.depletion
    }

    /// The committed snapshot this path was priced against.
    pub fn committed(&self) -> &Board {
        &self.committed
    }

    pub fn candidate_board(&self) -> CandidateBoard<'_> {
        CandidateBoard::with_depletion(&self.committed, self.depletion.clone())
    }

    pub fn record(&self) -> PathRecord {
        PathRecord {
            turn: self.turn,
            points: self.points,
            start: self.start,
            finish: self.finish,
            command: self.command,
            through: self.through,
        }
    }

    /// Order letters that carry out this path.
    pub fn order_impulses(&self) -> Result<Vec<OrderImpulse>, OrderTraceError> {
        orders::order_impulses(self.command, &self.route)
    }
}

/// Serializable summary of one planned turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRecord {
    pub turn: u32,
    pub points: u64,
    pub start: Coord,
    pub finish: Coord,
    pub command: Command,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through: Option<Coord>,
}

/// Candidates of every planned turn, indexed by turn then branch.
#[derive(Debug, Clone, Default)]
pub struct PlanArena {
    first_turn: u32,
    turns: Vec<Vec<PlannedPath>>,
    /// `children[d][p]`: branches of layer `d + 1` whose parent is `p`.
    children: Vec<Vec<Vec<usize>>>,
}

impl PlanArena {
    fn new(first_turn: u32, capacity: usize) -> Self {
        Self {
            first_turn,
            turns: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity),
        }
    }

    fn push_turn(&mut self, paths: Vec<PlannedPath>) {
        if let Some(previous) = self.turns.last() {
            let mut links = vec![Vec::new(); previous.len()];
            for (idx, path) in paths.iter().enumerate() {
                if let Some(slot) = path.parent.and_then(|parent| links.get_mut(parent)) {
                    slot.push(idx);
                }
            }
            self.children.push(links);
        }
        self.turns.push(paths);
    }

    pub fn first_turn(&self) -> u32 {
        self.first_turn
    }

    /// Number of turns that produced at least one candidate.
    pub fn depth(&self) -> usize {
        self.turns.len()
    }

    pub fn turns(&self) -> &[Vec<PlannedPath>] {
        &self.turns
    }

    /// Candidates of the absolute turn `turn`.
    pub fn turn(&self, turn: u32) -> &[PlannedPath] {
        turn.checked_sub(self.first_turn)
            .and_then(|offset| self.turns.get(offset as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Branch indices in the next turn that continue `branch` of `turn`.
    pub fn children(&self, turn: u32, branch: usize) -> &[usize] {
        turn.checked_sub(self.first_turn)
            .and_then(|offset| self.children.get(offset as usize))
            .and_then(|links| links.get(branch))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.turns.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.iter().all(Vec::is_empty)
    }

    pub fn records(&self) -> Vec<PathRecord> {
        self.turns.iter().flatten().map(PlannedPath::record).collect()
    }
}

#[derive(Debug, Clone)]
pub struct BestChain {
    pub total: u64,
    pub paths: Vec<PlannedPath>,
}

impl BestChain {
    pub fn report(&self) -> ChainReport {
        ChainReport {
            total: self.total,
            turns: self.paths.iter().map(PlannedPath::record).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub total: u64,
    pub turns: Vec<PathRecord>,
}

impl ChainReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub arena: PlanArena,
    pub best: Option<BestChain>,
}

/// Exhaustive search for the highest scoring chain of exactly `horizon`
/// turns. Ties keep the chain found first; `None` if no chain is long enough.
pub fn best_chain(arena: &PlanArena, horizon: u32) -> Option<BestChain> {
    let horizon = horizon as usize;
    if horizon == 0 || arena.turns.len() < horizon {
        return None;
    }

    let mut best: Option<(u64, Vec<usize>)> = None;
    let mut stack = Vec::with_capacity(horizon);
    for (idx, path) in arena.turns[0].iter().enumerate() {
        stack.push(idx);
        extend_chain(arena, horizon, path.points, &mut stack, &mut best);
        stack.pop();
    }

    best.map(|(total, indices)| BestChain {
        total,
        paths: indices
            .iter()
            .enumerate()
            .map(|(depth, idx)| arena.turns[depth][*idx].clone())
            .collect(),
    })
}

fn extend_chain(
    arena: &PlanArena,
    horizon: usize,
    total: u64,
    stack: &mut Vec<usize>,
    best: &mut Option<(u64, Vec<usize>)>,
) {
    let depth = stack.len();
    if depth == horizon {
        if best.as_ref().map_or(true, |(score, _)| total > *score) {
            *best = Some((total, stack.clone()));
        }
        return;
    }

    let Some(&parent_idx) = stack.last() else {
        return;
    };
    let links = arena
        .children
        .get(depth - 1)
        .and_then(|layer| layer.get(parent_idx));
    for &idx in links.into_iter().flatten() {
        stack.push(idx);
        let points = arena.turns[depth][idx].points;
        extend_chain(arena, horizon, total.saturating_add(points), stack, best);
        stack.pop();
    }
}

/// Stateful planner across real turns.
#[derive(Debug, Clone)]
pub struct TurnPlanner {
    config: Arc<PlannerConfig>,
    board: Arc<Board>,
    region: OwnershipRegion,
    start: Coord,
    turn: u32,
}

impl TurnPlanner {
    pub fn new(config: Arc<PlannerConfig>, board: Board) -> Result<Self, PlanError> {
        if !board.contains(config.home) {
            return Err(PlanError::HomeNotOnGraph(config.home));
        }
        let region = config.region(board.extent());
        Ok(Self {
            start: config.home,
            turn: 1,
            region,
            board: Arc::new(board),
            config,
        })
    }

    pub fn from_grid(config: Arc<PlannerConfig>, grid: &Grid) -> Result<Self, PlanError> {
        Self::new(config, Board::from_grid(grid)?)
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn region(&self) -> &OwnershipRegion {
        &self.region
    }

    /// Where the unit stands entering the current turn.
    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Plan `config.horizon` turns ahead of the current one.
    pub fn plan(&self) -> Result<PlanOutcome, PlanError> {
        let horizon = self.config.horizon;
        let mut arena = PlanArena::new(self.turn, horizon as usize);
        let mut trees = BTreeMap::new();

        for offset in 0..horizon {
            let turn = self.turn + offset;
            let mut candidates = Vec::new();
            match arena.turns.last() {
                None => self.expand(turn, None, &mut trees, &mut candidates)?,
                Some(previous) => {
                    for (idx, parent) in previous.iter().enumerate() {
                        self.expand(turn, Some((idx, parent)), &mut trees, &mut candidates)?;
                    }
                }
            }

            tracing::debug!(
                target: "realm_planner::planner",
                turn,
                parents = arena.turns.last().map_or(1, Vec::len),
                candidates = candidates.len(),
                "planner.turn.candidates"
            );
            if candidates.is_empty() {
                break;
            }
            arena.push_turn(candidates);
        }

        let best = best_chain(&arena, horizon);
        match &best {
            Some(chain) => tracing::info!(
                target: "realm_planner::planner",
                turn = self.turn,
                horizon,
                paths = arena.len(),
                total = chain.total,
                "planner.best_chain"
            ),
            None => tracing::info!(
                target: "realm_planner::planner",
                turn = self.turn,
                horizon,
                depth = arena.depth(),
                "planner.best_chain=none"
            ),
        }
        Ok(PlanOutcome { arena, best })
    }

    fn expand(
        &self,
        turn: u32,
        parent: Option<(usize, &PlannedPath)>,
        trees: &mut BTreeMap<Coord, SearchTree>,
        out: &mut Vec<PlannedPath>,
    ) -> Result<(), PlanError> {
        let start = parent.map_or(self.start, |(_, path)| path.finish);
        let lineage = parent
            .map(|(_, path)| path.depletion.clone())
            .unwrap_or_default();
        let region = (turn > 1).then_some(&self.region);

        let tree = match trees.entry(start) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(breadth_first(&self.board, start)?),
        };
        let candidate = CandidateBoard::with_depletion(&self.board, lineage);

        for (finish, distance) in tree.within(IMPULSES_PER_TURN) {
            if finish == self.config.home {
                continue;
            }
            if region.is_some_and(|region| !region.contains(finish)) {
                continue;
            }
            for command in Command::for_distance(distance) {
                for pricing in price(start, finish, command, &candidate, region)? {
                    if pricing.points <= u64::from(self.config.min_points) {
                        continue;
                    }
                    let route = match pricing.through {
                        Some(through) => vec![start, through, finish],
                        None => tree.route(finish).unwrap_or_default(),
                    };
                    out.push(PlannedPath {
                        turn,
                        points: pricing.points,
                        start,
                        finish,
                        command,
                        through: pricing.through,
                        route,
                        parent: parent.map(|(idx, _)| idx),
                        depletion: pricing.depletion,
                        committed: Arc::clone(&self.board),
                    });
                }
            }
        }
        Ok(())
    }

    /// Accept `path` as the real move: fold its lineage depletion into the
    /// committed board, move the unit to its finish and advance the turn.
    pub fn commit(&mut self, path: &PlannedPath) -> Result<(), PlanError> {
        if !Arc::ptr_eq(&path.committed, &self.board) {
            return Err(PlanError::StalePath { turn: path.turn });
        }
        self.board = Arc::new(self.board.commit(&path.depletion));
        self.start = path.finish;
        self.turn = path.turn + 1;
        tracing::info!(
            target: "realm_planner::planner",
            turn = path.turn,
            command = %path.command,
            finish = %path.finish,
            points = path.points,
            "planner.commit"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(home: Coord, horizon: u32) -> Arc<PlannerConfig> {
        Arc::new(PlannerConfig {
            home,
            horizon,
            ..PlannerConfig::default()
        })
    }

    fn line(weights: &[u32]) -> Board {
        Board::from_grid(&Grid::from_weights(&[weights]).expect("grid")).expect("board")
    }

    fn planner(weights: &[u32], home: u32, horizon: u32) -> TurnPlanner {
        TurnPlanner::new(config(Coord::new(home, 0), horizon), line(weights)).expect("planner")
    }

    #[test]
    fn three_turn_chain_matches_hand_computation() {
        let planner = planner(&[1, 20, 1], 0, 3);
        let outcome = planner.plan().expect("plan");

        let first: Vec<(Command, u64)> = outcome
            .arena
            .turn(1)
            .iter()
            .map(|path| (path.command(), path.points()))
            .collect();
        assert_eq!(
            first,
            vec![(Command::Sdd, 39), (Command::Dsd, 21), (Command::Sds, 20)]
        );
        assert_eq!(outcome.arena.turn(2).len(), 8);

        let best = outcome.best.expect("best chain");
        assert_eq!(best.total, 39 + 51 + 42);
        let commands: Vec<Command> = best.paths.iter().map(PlannedPath::command).collect();
        assert_eq!(commands, vec![Command::Sdd, Command::Ddd, Command::Ddd]);
        for pair in best.paths.windows(2) {
            assert_eq!(pair[0].finish(), pair[1].start());
        }
        assert_eq!(planner.board().weight(Coord::new(1, 0)), Some(20));
    }

    #[test]
    fn arena_indexes_children_by_parent() {
        let outcome = planner(&[1, 20, 1], 0, 2).plan().expect("plan");
        let arena = &outcome.arena;
        assert_eq!(arena.children(1, 0), &[0, 1, 2]);
        assert_eq!(arena.children(1, 1), &[3, 4, 5]);
        assert_eq!(arena.children(1, 2), &[6, 7]);
        assert!(arena.children(2, 0).is_empty());
        for (branch, parent) in arena.turn(1).iter().enumerate() {
            for &idx in arena.children(1, branch) {
                let child = &arena.turn(2)[idx];
                assert_eq!(child.parent(), Some(branch));
                assert_eq!(child.start(), parent.finish());
            }
        }
    }

    #[test]
    fn chain_report_lists_each_turn() {
        let report = planner(&[1, 20, 1], 0, 3)
            .plan()
            .expect("plan")
            .best
            .expect("best chain")
            .report();
        let lines: Vec<String> = report
            .turns
            .iter()
            .map(|r| format!("{} {} {}->{} {}", r.turn, r.command, r.start, r.finish, r.points))
            .collect();
        insta::assert_snapshot!(lines.join("\n"), @r"
        1 SDD x0y0->x1y0 39
        2 DDD x1y0->x1y0 51
        3 DDD x1y0->x1y0 42
        ");

        let json = report.to_json().expect("json");
        assert!(json.contains("\"command\": \"SDD\""));
        assert!(!json.contains("through"));
    }

    #[test]
    fn siblings_never_see_each_other() {
        let planner = planner(&[1, 20, 1], 0, 2);
        let outcome = planner.plan().expect("plan");
        let second = outcome.arena.turn(2);

        let of_first: Vec<&PlannedPath> =
            second.iter().filter(|path| path.parent() == Some(0)).collect();
        let ddd = of_first
            .iter()
            .find(|path| path.command() == Command::Ddd)
            .expect("ddd child");
        let dsd = of_first
            .iter()
            .find(|path| path.command() == Command::Dsd)
            .expect("dsd child");
        assert_eq!(ddd.points(), 51);
        assert_eq!(ddd.depletion().digs_at(Coord::new(1, 0)), 5);
        assert_eq!(ddd.depletion().digs_at(Coord::new(2, 0)), 0);
        assert_eq!(dsd.depletion().digs_at(Coord::new(1, 0)), 3);
        assert_eq!(dsd.depletion().digs_at(Coord::new(2, 0)), 1);

        let cousin = second
            .iter()
            .find(|path| path.parent() == Some(1) && path.command() == Command::Ddd)
            .expect("ddd under dsd");
        assert_eq!(cousin.points(), 54, "lineage depletion differs per parent");
    }

    #[test]
    fn ties_keep_the_first_chain() {
        let planner = planner(&[9, 1, 9], 1, 1);
        let best = planner.plan().expect("plan").best.expect("best");
        assert_eq!(best.total, 17);
        assert_eq!(best.paths[0].finish(), Coord::new(0, 0));
    }

    #[test]
    fn home_is_never_a_destination() {
        let planner = planner(&[1, 20, 1], 0, 3);
        let outcome = planner.plan().expect("plan");
        for path in outcome.arena.turns().iter().flatten() {
            assert_ne!(path.finish(), Coord::new(0, 0));
            assert!(path.points() > 5);
        }
    }

    #[test]
    fn later_turns_stay_inside_the_region() {
        let config = Arc::new(PlannerConfig {
            home: Coord::new(0, 0),
            horizon: 2,
            ownership_region: vec![Coord::new(0, 0), Coord::new(1, 0)],
            ..PlannerConfig::default()
        });
        let planner = TurnPlanner::new(config, line(&[1, 20, 1])).expect("planner");
        let outcome = planner.plan().expect("plan");

        assert!(outcome
            .arena
            .turn(1)
            .iter()
            .any(|path| path.finish() == Coord::new(2, 0)));
        assert!(outcome
            .arena
            .turn(2)
            .iter()
            .all(|path| path.finish() == Coord::new(1, 0)));
    }

    #[test]
    fn short_arena_has_no_best_chain() {
        let planner = planner(&[1, 1], 0, 3);
        let outcome = planner.plan().expect("plan");
        assert!(outcome.arena.is_empty());
        assert!(outcome.best.is_none());
        assert!(best_chain(&outcome.arena, 0).is_none());
    }

    #[test]
    fn commit_advances_state_and_rejects_stale_paths() {
        let mut planner = planner(&[1, 20, 1], 0, 3);
        let outcome = planner.plan().expect("plan");
        let best = outcome.best.expect("best");

        planner.commit(&best.paths[0]).expect("commit");
        assert_eq!(planner.turn(), 2);
        assert_eq!(planner.start(), Coord::new(1, 0));
        assert_eq!(planner.board().weight(Coord::new(1, 0)), Some(18));

        let err = planner.commit(&best.paths[1]).expect_err("stale");
        assert!(matches!(err, PlanError::StalePath { turn: 2 }));

        let next = planner.plan().expect("plan");
        assert_eq!(next.arena.first_turn(), 2);
        assert!(next
            .arena
            .turn(2)
            .iter()
            .all(|path| path.start() == Coord::new(1, 0)));
    }

    #[test]
    fn home_off_the_graph_is_rejected() {
        let err = TurnPlanner::new(config(Coord::new(1, 0), 1), line(&[3, 0, 3]))
            .expect_err("wall home");
        assert!(matches!(err, PlanError::HomeNotOnGraph(_)));
    }

    #[test]
    fn planned_orders_replay_to_the_finish() {
        let planner = planner(&[1, 20, 1], 0, 1);
        let outcome = planner.plan().expect("plan");
        let extent = planner.board().extent();
        for path in outcome.arena.turn(1) {
            let letters = path.order_impulses().expect("orders");
            assert_eq!(letters.len(), 3);
            let trace =
                orders::trace_impulses(path.start(), &letters, &extent, &Default::default())
                    .expect("trace");
            assert_eq!(trace.last(), Some(&path.finish()));
        }
    }
}
