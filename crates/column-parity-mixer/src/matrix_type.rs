// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Dense bit-packed matrices over GF(2) with dimension validation.

use crate::errors::{CpmError, CpmResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const WORD_BITS: usize = 64;

fn words_for(cols: usize) -> usize {
    cols.div_ceil(WORD_BITS)
}

/// A binary matrix with runtime-determined dimensions.
///
/// Rows are packed into `u64` words, least significant bit first. Bits past
/// `cols` in the last word of a row are always zero, so derived equality and
/// hashing are structural.
///
/// A matrix is immutable once built: arithmetic returns fresh matrices.
///
/// # Example
///
/// ```
/// use column_parity_mixer::BitMatrix;
///
/// let matrix = BitMatrix::new(vec![vec![1, 0], vec![1, 1]]).unwrap();
/// assert_eq!(matrix.rows(), 2);
/// assert_eq!(matrix.cols(), 2);
/// assert!(matrix.get(1, 0));
/// assert!(!matrix.get(0, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u64>,
}

impl BitMatrix {
    /// Creates a matrix from row-major binary data, validating dimensions and entries.
    ///
    /// # Errors
    ///
    /// - [`CpmError::InvalidDimension`] if there are no rows or no columns.
    /// - [`CpmError::DimensionMismatch`] if rows have inconsistent lengths.
    /// - [`CpmError::InvalidField`] if an entry is neither 0 nor 1.
    pub fn new(data: Vec<Vec<u8>>) -> CpmResult<Self> {
        if data.is_empty() {
            return Err(CpmError::invalid_dimension("matrix must have at least one row"));
        }

        let cols = data[0].len();
        if cols == 0 {
            return Err(CpmError::invalid_dimension(
                "matrix must have at least one column",
            ));
        }

        let mut matrix = Self::zeros(data.len(), cols);
        for (i, row) in data.iter().enumerate() {
            if row.len() != cols {
                return Err(CpmError::dimension_mismatch(
                    cols,
                    row.len(),
                    format!("columns in row {}", i),
                ));
            }
            for (j, &value) in row.iter().enumerate() {
                match value {
                    0 => {}
                    1 => matrix.set(i, j, true),
                    _ => return Err(CpmError::InvalidField { row: i, col: j, value }),
                }
            }
        }

        Ok(matrix)
    }

    /// Creates a matrix whose entry `(i, j)` is `f(i, j)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut matrix = Self::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                if f(i, j) {
                    matrix.set(i, j, true);
                }
            }
        }
        matrix
    }

    /// Creates a zero matrix of the specified dimensions.
    ///
    /// Unlike [`BitMatrix::new`], zero rows are allowed here so that empty
    /// states can be represented.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * words_for(cols)],
        }
    }

    /// Creates the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut matrix = Self::zeros(n, n);
        for i in 0..n {
            matrix.set(i, i, true);
        }
        matrix
    }

    /// Creates a `rows x vector.cols()` matrix with every row equal to `vector`.
    ///
    /// # Errors
    ///
    /// Returns [`CpmError::DimensionMismatch`] if `vector` is not a single row.
    pub fn broadcast(vector: &BitMatrix, rows: usize) -> CpmResult<Self> {
        if vector.rows != 1 {
            return Err(CpmError::dimension_mismatch(1, vector.rows, "rows of broadcast vector"));
        }
        Ok(Self {
            rows,
            cols: vector.cols,
            data: vector.data.repeat(rows),
        })
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Returns `true` if every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Gets a specific element.
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn get(&self, row: usize, col: usize) -> bool {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of bounds");
        let word = self.data[row * self.words_per_row() + col / WORD_BITS];
        (word >> (col % WORD_BITS)) & 1 == 1
    }

    /// Ascending column indices of the set bits in `row`.
    pub fn nonzero_positions_in_row(&self, row: usize) -> Vec<usize> {
        let mut positions = Vec::new();
        for (w, &word) in self.row_words(row).iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                positions.push(w * WORD_BITS + bits.trailing_zeros() as usize);
                bits &= bits - 1;
            }
        }
        positions
    }

    /// Returns the matrix as row-major `0`/`1` data.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.rows)
            .map(|i| (0..self.cols).map(|j| self.get(i, j) as u8).collect())
            .collect()
    }

    pub(crate) fn words_per_row(&self) -> usize {
        words_for(self.cols)
    }

    pub(crate) fn row_words(&self, row: usize) -> &[u64] {
        let wpr = self.words_per_row();
        &self.data[row * wpr..(row + 1) * wpr]
    }

    pub(crate) fn data(&self) -> &[u64] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u64] {
        &mut self.data
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, value: bool) {
        let idx = row * self.words_per_row() + col / WORD_BITS;
        let mask = 1u64 << (col % WORD_BITS);
        if value {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let wpr = self.words_per_row();
        for w in 0..wpr {
            self.data.swap(a * wpr + w, b * wpr + w);
        }
    }

    /// `row[dst] ^= row[src]`
    pub(crate) fn xor_row(&mut self, dst: usize, src: usize) {
        let wpr = self.words_per_row();
        for w in 0..wpr {
            let v = self.data[src * wpr + w];
            self.data[dst * wpr + w] ^= v;
        }
    }
}

impl TryFrom<Vec<Vec<u8>>> for BitMatrix {
    type Error = CpmError;

    fn try_from(data: Vec<Vec<u8>>) -> CpmResult<Self> {
        Self::new(data)
    }
}

impl From<BitMatrix> for Vec<Vec<u8>> {
    fn from(matrix: BitMatrix) -> Self {
        matrix.to_rows()
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(i, j) as u8)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
