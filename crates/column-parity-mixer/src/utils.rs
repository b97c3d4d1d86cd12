// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::{CpmError, CpmResult};
use crate::matrix_type::BitMatrix;

pub fn print_matrix(name: &str, matrix: &BitMatrix) {
    println!("{} ({}x{}):", name, matrix.rows(), matrix.cols());
    for line in matrix.to_string().lines() {
        println!("  {}", line);
    }
    println!();
}

/// Renders column indices as `[0, 1, 5]`.
pub fn format_indices(indices: &[usize]) -> String {
    let items: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Parses a matrix written as comma-separated rows of binary digits,
/// e.g. `"110,011,101"`. Whitespace is ignored.
pub fn parse_matrix(text: &str) -> CpmResult<BitMatrix> {
    let rows = text
        .split(',')
        .enumerate()
        .map(|(i, row)| {
            row.chars()
                .filter(|c| !c.is_whitespace())
                .enumerate()
                .map(|(j, c)| match c.to_digit(10) {
                    Some(d @ 0..=1) => Ok(d as u8),
                    Some(d) => Err(CpmError::InvalidField {
                        row: i,
                        col: j,
                        value: d as u8,
                    }),
                    None => Err(CpmError::invalid_dimension(format!(
                        "unexpected character {c:?} in row {i}"
                    ))),
                })
                .collect::<CpmResult<Vec<u8>>>()
        })
        .collect::<CpmResult<Vec<Vec<u8>>>>()?;
    BitMatrix::new(rows)
}
