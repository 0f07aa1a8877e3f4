//! Breadth-first reachability over the board graph.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

use crate::board::{Board, Coord};

/// Visit state of a vertex during one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchColour {
    /// Not yet discovered.
    #[default]
    White,
    /// Discovered and waiting in the frontier.
    Grey,
    /// Dequeued and expanded.
    Black,
}

/// Per-vertex metadata produced by one search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchMark {
    pub colour: SearchColour,
    pub distance: Option<u32>,
    pub predecessor: Option<Coord>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("start {0} is outside the board")]
    OutOfBounds(Coord),
    #[error("start {0} is a wall")]
    Wall(Coord),
}

/// Result of a breadth-first search: every vertex of the board annotated
/// with its colour, distance and predecessor.
#[derive(Debug, Clone)]
pub struct SearchTree {
    marks: BTreeMap<Coord, SearchMark>,
}

/// Run a breadth-first search from `start` across `board`.
pub fn breadth_first(board: &Board, start: Coord) -> Result<SearchTree, SearchError> {
    if !board.extent().contains(start) {
        return Err(SearchError::OutOfBounds(start));
    }
    if !board.contains(start) {
        return Err(SearchError::Wall(start));
    }

    let mut marks: BTreeMap<Coord, SearchMark> = board
        .coords()
        .map(|coord| (coord, SearchMark::default()))
        .collect();
    marks.insert(
        start,
        SearchMark {
            colour: SearchColour::Grey,
            distance: Some(0),
            predecessor: None,
        },
    );

    let mut frontier = VecDeque::new();
    frontier.push_back(start);
    while let Some(current) = frontier.pop_front() {
        let distance = marks
            .get(&current)
            .and_then(|mark| mark.distance)
            .unwrap_or(0);
        for &next in board.neighbours(current) {
            let Some(mark) = marks.get_mut(&next) else {
                continue;
            };
            if mark.colour != SearchColour::White {
                continue;
            }
            *mark = SearchMark {
                colour: SearchColour::Grey,
                distance: Some(distance + 1),
                predecessor: Some(current),
            };
            frontier.push_back(next);
        }
        if let Some(mark) = marks.get_mut(&current) {
            mark.colour = SearchColour::Black;
        }
    }

    Ok(SearchTree { marks })
}

impl SearchTree {
    pub fn mark(&self, coord: Coord) -> Option<&SearchMark> {
        self.marks.get(&coord)
    }

    pub fn distance(&self, coord: Coord) -> Option<u32> {
        self.mark(coord).and_then(|mark| mark.distance)
    }

    pub fn predecessor(&self, coord: Coord) -> Option<Coord> {
        self.mark(coord).and_then(|mark| mark.predecessor)
    }

    /// Coordinates from the start to `target`, inclusive, following
    /// predecessors. `None` if `target` was not reached.
    pub fn route(&self, target: Coord) -> Option<Vec<Coord>> {
        self.distance(target)?;
        let mut route = vec![target];
        let mut current = target;
        while let Some(previous) = self.predecessor(current) {
            route.push(previous);
            current = previous;
        }
        route.reverse();
        Some(route)
    }

    /// Reached vertices at distance `<= limit`, ordered by distance then
    /// coordinate.
    pub fn within(&self, limit: u32) -> Vec<(Coord, u32)> {
        let mut reached: Vec<(Coord, u32)> = self
            .marks
            .iter()
            .filter_map(|(coord, mark)| mark.distance.map(|distance| (*coord, distance)))
            .filter(|(_, distance)| *distance <= limit)
            .collect();
        reached.sort_by_key(|(coord, distance)| (*distance, *coord));
        reached
    }
}
