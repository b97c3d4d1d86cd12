// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Column parity mixers over GF(2).
//!
//! A column parity mixer (CPM) is the linear diffusion layer found in
//! Keccak-style permutations. It acts on an `m x n` binary state `A` by
//! computing the column parity `p` (the XOR of all rows), folding it through
//! a fixed `n x n` matrix `Z`, and adding `p·Z` to every row:
//!
//! `θ(A) = A + 1_m · (p · Z)`
//!
//! ## Mathematical Background
//!
//! The behaviour of CPMs under composition depends on the parity of `m`:
//!
//! - `m` even: the parity of `θ(A)` equals the parity of `A`, so
//!   `θ' ∘ θ` has folding matrix `Z + Z'` and every CPM is an involution.
//! - `m` odd: the parity is multiplied by the associated matrix `Z + I`, so
//!   `θ' ∘ θ` has associated matrix `(Z + I)(Z' + I)`. Invertibility and order
//!   are those of `Z + I` in `GL(n, 2)`.
//!
//! All types are immutable values and can be shared freely across threads.

pub mod errors;
pub mod math;
pub mod matrix_type;
pub mod mixer;
pub mod parity;
pub mod utils;

// Re-export commonly used types for convenience
pub use errors::{CpmError, CpmResult};
pub use matrix_type::BitMatrix;
pub use mixer::{ColumnParityMixer, OrderConfig, DEFAULT_MAX_ORDER_ITERATIONS};
pub use parity::{column_parity, even_columns, expanded_column_parity, odd_columns};
