//! Greedy row packing
//!
//! Boxes are placed in arrival order into the first row where they do not
//! intersect anything already there. Touching edges do not count as overlap.

use serde::Serialize;

/// Horizontal extent of a placed item, in pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RowBox {
    pub x: f64,
    pub width: f64,
}

impl RowBox {
    pub fn new(x: f64, width: f64) -> Self {
        Self { x, width }
    }

    pub fn end(&self) -> f64 {
        self.x + self.width
    }

    pub fn overlaps(&self, other: &RowBox) -> bool {
        self.x < other.end() && self.end() > other.x
    }
}

/// Row assignment for one swimlane
#[derive(Clone, Debug, Default)]
pub struct RowMapper {
    rows: Vec<Vec<RowBox>>,
}

impl RowMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `item` and return its zero-based row
    pub fn place(&mut self, item: RowBox) -> usize {
        let free = self
            .rows
            .iter()
            .position(|row| !row.iter().any(|placed| placed.overlaps(&item)));
        match free {
            Some(index) => {
                self.rows[index].push(item);
                index
            }
            None => {
                self.rows.push(vec![item]);
                self.rows.len() - 1
            }
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<RowBox>] {
        &self.rows
    }
}
