//! Core planning crate for the realm turn planner.
//!
//! Builds a board graph from an ingested report table, prices the per-turn
//! command alphabet against private board forks and searches a multi-turn
//! arena for the highest scoring chain when [`TurnPlanner::plan`] is invoked.

pub mod board;
pub mod economy;
pub mod orders;
pub mod planner;
pub mod planner_config;
pub mod region;
pub mod search;

pub use board::{Board, BoardError, CellRecord, Coord, Extent, Grid, Vertex};
pub use economy::{price, CandidateBoard, Depletion, EconomyError, Pricing, MIN_DIG_YIELD};
pub use orders::{move_cost, order_impulses, trace_impulses, OrderTraceError};
pub use planner::{
    best_chain, BestChain, ChainReport, PathRecord, PlanArena, PlanError, PlanOutcome,
    PlannedPath, TurnPlanner,
};
pub use planner_config::{
    load_planner_config_from_env, PlannerConfig, PlannerConfigError, PlannerConfigMetadata,
    TeleportTable, BUILTIN_PLANNER_CONFIG,
};
pub use region::OwnershipRegion;
pub use search::{breadth_first, SearchColour, SearchError, SearchMark, SearchTree};

pub use plan_runtime::{Command, OrderImpulse};

/// Plan the next turns for a freshly ingested report table.
pub fn plan_report(
    config: std::sync::Arc<PlannerConfig>,
    table: Vec<Vec<CellRecord>>,
) -> Result<PlanOutcome, PlanError> {
    let grid = Grid::from_report_table(table)?;
    TurnPlanner::from_grid(config, &grid)?.plan()
}
