// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Column parity of arbitrary binary matrices.

use crate::matrix_type::BitMatrix;

/// Column parity of `a`: the XOR of all of its rows, as a `1 x a.cols()` vector.
///
/// A matrix with no rows has the all-zero parity.
pub fn column_parity(a: &BitMatrix) -> BitMatrix {
    let mut parity = BitMatrix::zeros(1, a.cols());
    let wpr = a.words_per_row();
    for row in a.data().chunks_exact(wpr.max(1)).take(a.rows()) {
        for (p, w) in parity.data_mut().iter_mut().zip(row) {
            *p ^= w;
        }
    }
    parity
}

/// The column parity of `a` repeated in each of its rows.
pub fn expanded_column_parity(a: &BitMatrix) -> BitMatrix {
    let parity = column_parity(a);
    let mut expanded = BitMatrix::zeros(a.rows(), a.cols());
    let wpr = expanded.words_per_row();
    for row in expanded.data_mut().chunks_exact_mut(wpr.max(1)) {
        row.copy_from_slice(parity.data());
    }
    expanded
}

/// Indices of the columns of `a` with odd parity, ascending.
pub fn odd_columns(a: &BitMatrix) -> Vec<usize> {
    column_parity(a).nonzero_positions_in_row(0)
}

/// Indices of the columns of `a` with even parity, ascending.
pub fn even_columns(a: &BitMatrix) -> Vec<usize> {
    let parity = column_parity(a);
    (0..a.cols()).filter(|&j| !parity.get(0, j)).collect()
}
