//! Assembles flattened `(x, y, z)` samples into a 2-D matrix.
//!
//! Rows follow the sorted unique x values and columns the sorted unique y
//! values. Cells with no sample hold `NaN`.

use std::cmp::Ordering;

use itertools::Itertools;
use log::debug;
use nalgebra::DMatrix;

/// How the z series lines up with the x and y series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    /// z holds one value per grid cell, filled row by row (x outer, y
    /// inner). This is the order a full grid sweep produces.
    Flattened,
    /// `z[i]` belongs to `(x[i], y[i])`. Repeated pairs overwrite each
    /// other, so the last occurrence wins.
    Paired,
}

/// A z matrix together with its row and column coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ZMatrix {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: DMatrix<f64>,
}

impl ZMatrix {
    pub fn assemble(x: &[f64], y: &[f64], z: &[Option<f64>], layout: GridLayout) -> Self {
        let rows = unique_sorted(x);
        let columns = unique_sorted(y);
        let mut values = DMatrix::from_element(rows.len(), columns.len(), f64::NAN);

        match layout {
            GridLayout::Flattened => {
                let cells = (0..rows.len()).cartesian_product(0..columns.len());
                for ((i, j), z) in cells.zip(z) {
                    values[(i, j)] = z.unwrap_or(f64::NAN);
                }
            }
            GridLayout::Paired => {
                for ((x, y), z) in x.iter().zip(y).zip(z) {
                    if let (Some(i), Some(j)) = (position(&rows, *x), position(&columns, *y)) {
                        values[(i, j)] = z.unwrap_or(f64::NAN);
                    }
                }
            }
        }

        debug!(
            "Assembled {}x{} z matrix from {} samples ({:?})",
            rows.len(),
            columns.len(),
            z.len(),
            layout
        );
        Self {
            x: rows,
            y: columns,
            values,
        }
    }

    /// The value at the given coordinates, if that cell was filled.
    pub fn get(&self, x: f64, y: f64) -> Option<f64> {
        let i = position(&self.x, x)?;
        let j = position(&self.y, y)?;
        Some(self.values[(i, j)]).filter(|v| !v.is_nan())
    }

    /// Row-major copy with unfilled cells as `None`.
    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        self.values
            .row_iter()
            .map(|row| row.iter().map(|v| Some(*v).filter(|v| !v.is_nan())).collect())
            .collect()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }
}

fn unique_sorted(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .sorted_by(f64::total_cmp)
        .dedup()
        .collect()
}

fn position(axis: &[f64], value: f64) -> Option<usize> {
    axis.binary_search_by(|probe| probe.partial_cmp(&value).unwrap_or(Ordering::Less))
        .ok()
}
