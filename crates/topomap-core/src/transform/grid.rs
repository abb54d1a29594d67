//! Grid snapping and cell labels
//!
//! The visual grid uses 5-unit cells. Columns are labelled `A..Z` then
//! `AA..AZ`, rows `1..=50`, and the label table spans the whole world canvas
//! rather than just the `[0, 100]` normalized band.

use super::NormalizedPoint;
use crate::error::TopologyError;
use serde::{Serialize, Serializer};
use std::fmt;

/// Cell edge length, in normalized units
pub const GRID_STEP: f64 = 5.0;
/// Number of labelled columns
pub const GRID_COLUMNS: usize = 52;
/// Number of labelled rows
pub const GRID_ROWS: u32 = 50;

const CELL_CENTER: f64 = GRID_STEP / 2.0;
const SNAP_MIN: f64 = 2.5;
const SNAP_MAX: f64 = 97.5;
// Pulls values sitting exactly on a boundary into the lower cell
const EDGE_EPSILON: f64 = 0.01;

/// Quantize to the nearest cell center
///
/// With `enabled == false` the point is returned unchanged. Either way a
/// non-finite component is an `InvalidCoordinate`.
pub fn snap_to_grid(p: NormalizedPoint, enabled: bool) -> Result<NormalizedPoint, TopologyError> {
    let p = p.checked()?;
    if !enabled {
        return Ok(p);
    }
    Ok(NormalizedPoint::new(snap_axis(p.x), snap_axis(p.y)))
}

fn snap_axis(v: f64) -> f64 {
    let snapped = ((v - CELL_CENTER) / GRID_STEP).round() * GRID_STEP + CELL_CENTER;
    snapped.clamp(SNAP_MIN, SNAP_MAX)
}

/// Label for a zero-based column index, `None` past the last column
#[must_use]
pub fn column_label(index: usize) -> Option<String> {
    const LETTERS: usize = 26;
    if index >= GRID_COLUMNS {
        return None;
    }
    // index < 52, so the narrowing is lossless
    let letter = |i: usize| char::from(b'A' + u8::try_from(i).unwrap_or(0));
    if index < LETTERS {
        Some(letter(index).to_string())
    } else {
        Some(format!("A{}", letter(index - LETTERS)))
    }
}

/// A labelled grid cell; either axis may be unknown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub column: Option<String>,
    pub row: Option<u32>,
}

impl GridCell {
    /// The sentinel for a point outside the labelled grid
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            column: None,
            row: None,
        }
    }

    /// Both axes landed inside the label table
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.column.is_some() && self.row.is_some()
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => f.write_str(column)?,
            None => f.write_str("?")?,
        }
        match self.row {
            Some(row) => write!(f, "{row}"),
            None => f.write_str("?"),
        }
    }
}

impl Serialize for GridCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Find the labelled cell containing `(x, y)`
///
/// Never fails: out-of-range or non-finite input maps the affected axis to
/// the unknown sentinel.
#[must_use]
pub fn grid_cell(x: f64, y: f64) -> GridCell {
    GridCell {
        column: cell_index(x).and_then(column_label),
        row: cell_index(y)
            .and_then(|i| u32::try_from(i + 1).ok())
            .filter(|row| *row <= GRID_ROWS),
    }
}

fn cell_index(v: f64) -> Option<usize> {
    if !v.is_finite() {
        return None;
    }
    let index = ((v - EDGE_EPSILON) / GRID_STEP).floor();
    if index < 0.0 || index >= GRID_COLUMNS.max(GRID_ROWS as usize) as f64 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(index as usize)
}
