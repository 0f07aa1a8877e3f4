//! Dig economy: prices one command on a private fork of the board.
//!
//! Candidate snapshots never touch the committed [`Board`]. A
//! [`CandidateBoard`] layers a [`Depletion`] ledger over a shared committed
//! board, and forking copies only the ledger, so siblings priced from the
//! same parent can never see each other's digs.

use std::collections::BTreeMap;

use plan_runtime::{Command, Impulse};
use thiserror::Error;

use crate::{
    board::{Board, Coord},
    region::OwnershipRegion,
};

/// Smallest yield of a single dig, even on an exhausted cell.
pub const MIN_DIG_YIELD: i64 = 1;

/// Digs applied per cell on top of a committed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Depletion {
    digs: BTreeMap<Coord, u32>,
}

impl Depletion {
    pub fn record(&mut self, coord: Coord) {
        *self.digs.entry(coord).or_insert(0) += 1;
    }

    pub fn digs_at(&self, coord: Coord) -> u32 {
        self.digs.get(&coord).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, u32)> + '_ {
        self.digs.iter().map(|(coord, digs)| (*coord, *digs))
    }

    pub fn total(&self) -> u32 {
        self.digs.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.digs.is_empty()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EconomyError {
    #[error("command {command} cannot move from {start} to {finish}")]
    InvalidCommand {
        command: Command,
        start: Coord,
        finish: Coord,
    },
    #[error("cell {0} is not on the board graph")]
    NotDiggable(Coord),
}

/// Private, disposable fork of a committed board.
#[derive(Debug, Clone)]
pub struct CandidateBoard<'a> {
    base: &'a Board,
    depletion: Depletion,
}

impl<'a> CandidateBoard<'a> {
    pub fn fork(base: &'a Board) -> Self {
        Self::with_depletion(base, Depletion::default())
    }

    /// Fork that already carries the digs of an earlier hypothetical lineage.
    pub fn with_depletion(base: &'a Board, depletion: Depletion) -> Self {
        Self { base, depletion }
    }

    pub fn base(&self) -> &'a Board {
        self.base
    }

    pub fn weight(&self, coord: Coord) -> Option<i64> {
        self.base
            .weight(coord)
            .map(|weight| weight - i64::from(self.depletion.digs_at(coord)))
    }

    /// Extract points from `coord`.
    ///
    /// Returns the current weight floored at [`MIN_DIG_YIELD`] and lowers the
    /// stored weight by exactly one, so a cell keeps yielding 1 forever while
    /// its stored weight goes non-positive.
    pub fn dig(&mut self, coord: Coord) -> Result<u64, EconomyError> {
        let weight = self
            .weight(coord)
            .ok_or(EconomyError::NotDiggable(coord))?;
        self.depletion.record(coord);
        Ok(weight.max(MIN_DIG_YIELD).unsigned_abs())
    }

    pub fn depletion(&self) -> &Depletion {
        &self.depletion
    }

    pub fn into_depletion(self) -> Depletion {
        self.depletion
    }

    /// Materialize the fork as a standalone snapshot.
    pub fn snapshot(&self) -> Board {
        self.base.commit(&self.depletion)
    }
}

/// One priced outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    pub points: u64,
    /// Cell stepped through and dug mid-turn by `SDS`.
    pub through: Option<Coord>,
    /// Lineage depletion plus the digs of this command.
    pub depletion: Depletion,
}

/// Price `command` moving from `start` to `finish` on forks of `candidate`.
///
/// Digs land on the cell the unit stands on when the Dig impulse runs:
///
/// | command | dug cells                     |
/// |---------|-------------------------------|
/// | `DDD`   | start ×3                      |
/// | `SDD`   | finish ×2                     |
/// | `DSD`   | start, finish                 |
/// | `DDS`   | start ×2                      |
/// | `DSS`   | start                         |
/// | `SSD`   | finish                        |
/// | `SSS`   | nothing                       |
/// | `SDS`   | the cell between start/finish |
///
/// `SDS` between diagonal neighbours yields one outcome per usable corner;
/// a corner is usable when it is on the graph and inside `region`. An
/// axis-aligned `SDS` always digs its midpoint, whatever the region.
pub fn price(
    start: Coord,
    finish: Coord,
    command: Command,
    candidate: &CandidateBoard<'_>,
    region: Option<&OwnershipRegion>,
) -> Result<Vec<Pricing>, EconomyError> {
    let board = candidate.base();
    for coord in [start, finish] {
        if !board.contains(coord) {
            return Err(EconomyError::NotDiggable(coord));
        }
    }

    let steps = command.steps();
    let distance = start.manhattan(finish);
    let invalid = || EconomyError::InvalidCommand {
        command,
        start,
        finish,
    };
    if distance > steps || (steps - distance) % 2 != 0 {
        return Err(invalid());
    }

    if command != Command::Sds {
        let mut fork = candidate.clone();
        let points = execute(command, start, finish, None, &mut fork)?;
        return Ok(vec![Pricing {
            points,
            through: None,
            depletion: fork.into_depletion(),
        }]);
    }

    if distance != 2 {
        return Err(invalid());
    }
    let corners: Vec<Coord> = if start.x == finish.x || start.y == finish.y {
        vec![Coord::new((start.x + finish.x) / 2, (start.y + finish.y) / 2)]
    } else {
        [Coord::new(finish.x, start.y), Coord::new(start.x, finish.y)]
            .into_iter()
            .filter(|corner| region.map_or(true, |region| region.contains(*corner)))
            .collect()
    };

    let mut outcomes = Vec::with_capacity(corners.len());
    for corner in corners {
        if !board.contains(corner) {
            continue;
        }
        let mut fork = candidate.clone();
        let points = execute(command, start, finish, Some(corner), &mut fork)?;
        outcomes.push(Pricing {
            points,
            through: Some(corner),
            depletion: fork.into_depletion(),
        });
    }
    Ok(outcomes)
}

fn execute(
    command: Command,
    start: Coord,
    finish: Coord,
    through: Option<Coord>,
    fork: &mut CandidateBoard<'_>,
) -> Result<u64, EconomyError> {
    let steps = command.steps();
    let mut taken = 0;
    let mut points = 0;
    for impulse in command.impulses() {
        match impulse {
            Impulse::Step => taken += 1,
            Impulse::Dig => {
                let site = if taken == 0 {
                    start
                } else if taken == steps {
                    finish
                } else {
                    through.ok_or(EconomyError::InvalidCommand {
                        command,
                        start,
                        finish,
                    })?
                };
                points += fork.dig(site)?;
            }
        }
    }
    Ok(points)
}
