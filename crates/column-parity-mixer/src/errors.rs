// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Error types for column parity mixer operations
//!
//! This module defines the error type shared by the GF(2) matrix primitives,
//! the column parity utilities and the mixer itself.

use thiserror::Error;

/// Main error type for column parity mixer operations
///
/// Every variant is a validation failure on the inputs of an operation. Once
/// the inputs are accepted, all operations are total.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpmError {
    /// Non-positive row count or empty matrix data
    #[error("Invalid dimension: {message}")]
    InvalidDimension { message: String },

    /// Matrix entry outside of {0, 1}
    #[error("Invalid field element {value} at ({row}, {col}): entries must be defined over GF(2)")]
    InvalidField { row: usize, col: usize, value: u8 },

    /// Parity folding matrix is not square
    #[error("Parity folding matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// Shapes of two operands do not agree
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Inverse (or a finite order) requested for a singular mixer or matrix
    #[error("Not invertible: {message}")]
    NotInvertible { message: String },

    /// Exponent passed to `power` is below 1
    #[error("Invalid exponent {exponent}: e must be >= 1")]
    InvalidExponent { exponent: u64 },

    /// Order search gave up before reaching the identity
    #[error("Computation limit exceeded: no identity within {limit} iterations")]
    ComputationLimitExceeded { limit: u64 },
}

/// Result type alias for column parity mixer operations
pub type CpmResult<T> = Result<T, CpmError>;

// Helper functions for creating errors with context
impl CpmError {
    /// Create an invalid dimension error with a message
    pub fn invalid_dimension(message: impl Into<String>) -> Self {
        CpmError::InvalidDimension {
            message: message.into(),
        }
    }

    /// Create a not invertible error with a message
    pub fn not_invertible(message: impl Into<String>) -> Self {
        CpmError::NotInvertible {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        expected: impl ToString,
        actual: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        CpmError::DimensionMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a dimension mismatch error from two `rows x cols` shapes
    pub fn shape_mismatch(
        expected: (usize, usize),
        actual: (usize, usize),
        context: impl Into<String>,
    ) -> Self {
        Self::dimension_mismatch(
            format!("{}x{}", expected.0, expected.1),
            format!("{}x{}", actual.0, actual.1),
            context,
        )
    }
}
