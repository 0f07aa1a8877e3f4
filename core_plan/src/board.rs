//! Board snapshot and the graph builder that produces it.
//!
//! A [`Grid`] is the rectangular table of cell records handed over by board
//! ingestion. [`Board::from_grid`] turns it into a coordinate-indexed graph:
//! every non-wall cell becomes a vertex with its orthogonal non-wall
//! neighbours. The topology never changes after ingestion; only weights do.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::economy::Depletion;

/// Cell coordinate: `x` is the column, `y` is the row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Shift by a column/row delta, or `None` if it would underflow.
    pub fn offset(self, dx: i64, dy: i64) -> Option<Coord> {
        let x = u32::try_from(i64::from(self.x) + dx).ok()?;
        let y = u32::try_from(i64::from(self.y) + dy).ok()?;
        Some(Coord { x, y })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}y{}", self.x, self.y)
    }
}

/// Rectangular board bounds anchored at the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    pub origin: Coord,
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= self.origin.x
            && coord.y >= self.origin.y
            && coord.x - self.origin.x < self.width
            && coord.y - self.origin.y < self.height
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |row| {
            (0..self.width).map(move |col| Coord::new(self.origin.x + col, self.origin.y + row))
        })
    }
}

/// One cell of an ingested report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub text: String,
    #[serde(default)]
    pub colour: Option<String>,
}

impl CellRecord {
    pub fn new(text: impl Into<String>, colour: Option<&str>) -> Self {
        Self {
            text: text.into(),
            colour: colour.map(str::to_string),
        }
    }

    /// Leading point value of the cell text.
    ///
    /// The first whitespace-delimited token carries the value; anything after
    /// a `-` in that token and any later tokens are unit markers.
    pub fn point_value(&self) -> Option<u32> {
        let token = self.text.split_whitespace().next()?;
        let value = token.split('-').next()?;
        value.parse::<u32>().ok()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board grid has no cells")]
    EmptyGrid,
    #[error("row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("cell {coord} has no valid point value in '{text}'")]
    Parse { coord: Coord, text: String },
}

/// Rectangular, ordered table of cell records for one turn snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    extent: Extent,
    rows: Vec<Vec<CellRecord>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellRecord>>) -> Result<Self, BoardError> {
        Self::with_origin(rows, Coord::new(0, 0))
    }

    /// Build from a published report table, dropping its label row and
    /// label column so that coordinates match the game's own numbering.
    pub fn from_report_table(rows: Vec<Vec<CellRecord>>) -> Result<Self, BoardError> {
        let body: Vec<Vec<CellRecord>> = rows
            .into_iter()
            .skip(1)
            .map(|row| row.into_iter().skip(1).collect())
            .collect();
        Self::with_origin(body, Coord::new(1, 1))
    }

    /// Plain numeric grid, mostly for fixtures and synthetic boards.
    pub fn from_weights<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, BoardError> {
        let rows = rows
            .iter()
            .map(|row| {
                row.as_ref()
                    .iter()
                    .map(|weight| CellRecord::new(weight.to_string(), None))
                    .collect()
            })
            .collect();
        Self::new(rows)
    }

    fn with_origin(rows: Vec<Vec<CellRecord>>, origin: Coord) -> Result<Self, BoardError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(BoardError::EmptyGrid);
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: width,
                    got: cells.len(),
                });
            }
        }
        Ok(Self {
            extent: Extent {
                origin,
                width: width as u32,
                height: rows.len() as u32,
            },
            rows,
        })
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn cell(&self, coord: Coord) -> Option<&CellRecord> {
        if !self.extent.contains(coord) {
            return None;
        }
        let row = (coord.y - self.extent.origin.y) as usize;
        let col = (coord.x - self.extent.origin.x) as usize;
        self.rows.get(row).and_then(|cells| cells.get(col))
    }
}

const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Read-only view of one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex<'a> {
    pub coord: Coord,
    pub weight: i64,
    pub neighbours: &'a [Coord],
}

#[derive(Debug)]
struct Topology {
    extent: Extent,
    adjacency: BTreeMap<Coord, Vec<Coord>>,
}

/// Committed board snapshot: shared topology plus current cell weights.
#[derive(Debug, Clone)]
pub struct Board {
    topology: Arc<Topology>,
    weights: BTreeMap<Coord, i64>,
}

impl Board {
    pub fn from_grid(grid: &Grid) -> Result<Self, BoardError> {
        let extent = grid.extent();
        let mut weights = BTreeMap::new();
        for coord in extent.coords() {
            let Some(cell) = grid.cell(coord) else {
                continue;
            };
            let value = cell.point_value().ok_or_else(|| BoardError::Parse {
                coord,
                text: cell.text.clone(),
            })?;
            if value > 0 {
                weights.insert(coord, i64::from(value));
            }
        }

        let mut adjacency = BTreeMap::new();
        for &coord in weights.keys() {
            let neighbours: Vec<Coord> = NEIGHBOURS
                .iter()
                .filter_map(|&(dx, dy)| coord.offset(dx, dy))
                .filter(|next| extent.contains(*next) && weights.contains_key(next))
                .collect();
            adjacency.insert(coord, neighbours);
        }

        let cells = (extent.width * extent.height) as usize;
        tracing::debug!(
            target: "realm_planner::board",
            width = extent.width,
            height = extent.height,
            vertices = weights.len(),
            walls = cells - weights.len(),
            "board.built"
        );

        Ok(Self {
            topology: Arc::new(Topology { extent, adjacency }),
            weights,
        })
    }

    pub fn extent(&self) -> Extent {
        self.topology.extent
    }

    /// Whether `coord` is a vertex (on the board and not a wall).
    pub fn contains(&self, coord: Coord) -> bool {
        self.weights.contains_key(&coord)
    }

    pub fn weight(&self, coord: Coord) -> Option<i64> {
        self.weights.get(&coord).copied()
    }

    pub fn neighbours(&self, coord: Coord) -> &[Coord] {
        self.topology
            .adjacency
            .get(&coord)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn vertex(&self, coord: Coord) -> Option<Vertex<'_>> {
        let weight = self.weight(coord)?;
        Some(Vertex {
            coord,
            weight,
            neighbours: self.neighbours(coord),
        })
    }

    /// Vertex coordinates in ascending order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.weights.keys().copied()
    }

    pub fn vertex_count(&self) -> usize {
        self.weights.len()
    }

    /// New committed snapshot with `depletion` folded into the weights.
    ///
    /// The topology is shared with `self`; depleted cells stay traversable.
    pub fn commit(&self, depletion: &Depletion) -> Board {
        let mut weights = self.weights.clone();
        for (coord, digs) in depletion.iter() {
            if let Some(weight) = weights.get_mut(&coord) {
                *weight -= i64::from(digs);
            }
        }
        Board {
            topology: Arc::clone(&self.topology),
            weights,
        }
    }

    /// Whether two snapshots share the same ingested topology.
    pub fn same_topology(&self, other: &Board) -> bool {
        Arc::ptr_eq(&self.topology, &other.topology)
    }
}
