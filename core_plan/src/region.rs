//! Ownership region: the cells a unit may use as waypoints after its first
//! turn.
//!
//! The region is configured as a hand-drawn polygon over cell coordinates and
//! rasterized once into a per-cell mask over the board extent.

use crate::board::{Coord, Extent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRegion {
    extent: Extent,
    mask: Option<Vec<bool>>,
}

impl OwnershipRegion {
    /// Region covering the entire board.
    pub fn whole_board(extent: Extent) -> Self {
        Self { extent, mask: None }
    }

    /// Rasterize a polygon given by its corner cells.
    ///
    /// A cell belongs to the region when it lies on an edge or inside by
    /// even-odd crossing. An empty polygon means the whole board.
    pub fn from_polygon(vertices: &[Coord], extent: Extent) -> Self {
        if vertices.is_empty() {
            return Self::whole_board(extent);
        }
        let mask = extent
            .coords()
            .map(|cell| on_boundary(vertices, cell) || crosses_odd(vertices, cell))
            .collect();
        Self {
            extent,
            mask: Some(mask),
        }
    }

    /// Region made of an explicit cell list.
    pub fn from_cells(extent: Extent, cells: impl IntoIterator<Item = Coord>) -> Self {
        let mut mask = vec![false; (extent.width * extent.height) as usize];
        for cell in cells {
            if let Some(idx) = index(&extent, cell) {
                mask[idx] = true;
            }
        }
        Self {
            extent,
            mask: Some(mask),
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        let Some(idx) = index(&self.extent, coord) else {
            return false;
        };
        match &self.mask {
            Some(mask) => mask.get(idx).copied().unwrap_or(false),
            None => true,
        }
    }

    pub fn is_whole_board(&self) -> bool {
        self.mask.is_none()
    }

    pub fn cell_count(&self) -> usize {
        match &self.mask {
            Some(mask) => mask.iter().filter(|inside| **inside).count(),
            None => (self.extent.width * self.extent.height) as usize,
        }
    }
}

#[inline]
fn index(extent: &Extent, coord: Coord) -> Option<usize> {
    if !extent.contains(coord) {
        return None;
    }
    let col = coord.x - extent.origin.x;
    let row = coord.y - extent.origin.y;
    Some((row * extent.width + col) as usize)
}

fn edges(vertices: &[Coord]) -> impl Iterator<Item = ((i64, i64), (i64, i64))> + '_ {
    let point = |c: &Coord| (i64::from(c.x), i64::from(c.y));
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(move |(a, b)| (point(a), point(b)))
}

fn on_boundary(vertices: &[Coord], cell: Coord) -> bool {
    let (px, py) = (i64::from(cell.x), i64::from(cell.y));
    edges(vertices).any(|((ax, ay), (bx, by))| {
        let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
        cross == 0
            && px >= ax.min(bx)
            && px <= ax.max(bx)
            && py >= ay.min(by)
            && py <= ay.max(by)
    })
}

fn crosses_odd(vertices: &[Coord], cell: Coord) -> bool {
    let (px, py) = (i64::from(cell.x), i64::from(cell.y));
    let mut inside = false;
    for ((ax, ay), (bx, by)) in edges(vertices) {
        if (ay > py) == (by > py) {
            continue;
        }
        // px < ax + (py - ay) * (bx - ax) / (by - ay), without division
        let lhs = (px - ax) * (by - ay);
        let rhs = (py - ay) * (bx - ax);
        let left_of_edge = if by > ay { lhs < rhs } else { lhs > rhs };
        if left_of_edge {
            inside = !inside;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> Extent {
        Extent {
            origin: Coord::new(0, 0),
            width,
            height,
        }
    }

    #[test]
    fn rectangle_includes_its_border_and_interior() {
        let square = [
            Coord::new(1, 1),
            Coord::new(3, 1),
            Coord::new(3, 3),
            Coord::new(1, 3),
        ];
        let region = OwnershipRegion::from_polygon(&square, extent(5, 5));
        assert_eq!(region.cell_count(), 9);
        assert!(region.contains(Coord::new(2, 2)));
        assert!(region.contains(Coord::new(3, 1)));
        assert!(region.contains(Coord::new(1, 2)));
        assert!(!region.contains(Coord::new(0, 0)));
        assert!(!region.contains(Coord::new(4, 2)));
    }

    #[test]
    fn triangle_follows_its_diagonal() {
        let triangle = [Coord::new(0, 0), Coord::new(4, 0), Coord::new(0, 4)];
        let region = OwnershipRegion::from_polygon(&triangle, extent(5, 5));
        assert!(region.contains(Coord::new(2, 2)), "on the hypotenuse");
        assert!(region.contains(Coord::new(1, 1)));
        assert!(!region.contains(Coord::new(3, 2)));
        assert!(!region.contains(Coord::new(4, 4)));
        assert_eq!(region.cell_count(), 15);
    }

    #[test]
    fn empty_polygon_is_whole_board_and_bounds_still_apply() {
        let region = OwnershipRegion::from_polygon(&[], extent(3, 2));
        assert!(region.is_whole_board());
        assert!(region.contains(Coord::new(2, 1)));
        assert!(!region.contains(Coord::new(3, 0)));
        assert_eq!(region.cell_count(), 6);
    }

    #[test]
    fn explicit_cells_ignore_out_of_bounds_entries() {
        let region =
            OwnershipRegion::from_cells(extent(2, 2), [Coord::new(1, 1), Coord::new(7, 7)]);
        assert_eq!(region.cell_count(), 1);
        assert!(region.contains(Coord::new(1, 1)));
        assert!(!region.contains(Coord::new(0, 0)));
    }
}
