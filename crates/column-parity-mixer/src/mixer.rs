// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::errors::{CpmError, CpmResult};
use crate::matrix_type::BitMatrix;
use crate::parity::{column_parity, expanded_column_parity};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Default cap on the matrix products spent by [`ColumnParityMixer::order`].
pub const DEFAULT_MAX_ORDER_ITERATIONS: u64 = 1 << 20;

/// Configuration for order computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderConfig {
    /// Maximum number of matrix products spent on the associated matrix
    pub max_iterations: u64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ORDER_ITERATIONS,
        }
    }
}

/// Parity of the row count `m`.
///
/// Applying a mixer adds the same row `e` to all `m` rows of the state, which
/// changes the column parity by `m·e`. For even `m` that term vanishes: the
/// parity is invariant, effects of successive mixers simply add, and every
/// mixer is an involution. For odd `m` the parity `p` becomes `p·(Z + I)`, so
/// mixers compose through their associated matrices, which multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowParity {
    Even,
    Odd,
}

impl RowParity {
    fn of(m: usize) -> Self {
        if m % 2 == 0 {
            RowParity::Even
        } else {
            RowParity::Odd
        }
    }
}

/// A column parity mixer acting on `m x n` states.
///
/// The mixer computes the column parity `p` of a state `A`, folds it through
/// the `n x n` matrix `Z` and adds `p·Z` to every row of `A`.
///
/// # Example
///
/// ```
/// use column_parity_mixer::ColumnParityMixer;
///
/// let theta = ColumnParityMixer::from_rows(5, vec![
///     vec![1, 1, 0],
///     vec![1, 0, 1],
///     vec![0, 1, 0],
/// ]).unwrap();
/// assert_eq!(theta.to_string(), "Column Parity Mixer with 5 rows and 3 columns");
/// assert_eq!(theta.order().unwrap(), 7);
/// assert!(theta.power(7).unwrap().is_identity());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MixerParts", into = "MixerParts")]
pub struct ColumnParityMixer {
    nrows: usize,
    ncols: usize,
    z: BitMatrix,
}

/// Serialized form; deserialization goes back through [`ColumnParityMixer::new`].
#[derive(Serialize, Deserialize)]
struct MixerParts {
    rows: usize,
    folding: BitMatrix,
}

impl TryFrom<MixerParts> for ColumnParityMixer {
    type Error = CpmError;

    fn try_from(parts: MixerParts) -> CpmResult<Self> {
        Self::new(parts.rows, parts.folding)
    }
}

impl From<ColumnParityMixer> for MixerParts {
    fn from(mixer: ColumnParityMixer) -> Self {
        MixerParts {
            rows: mixer.nrows,
            folding: mixer.z,
        }
    }
}

impl ColumnParityMixer {
    /// Creates a mixer for `m`-row states with parity folding matrix `z`.
    ///
    /// # Errors
    ///
    /// - [`CpmError::InvalidDimension`] if `m < 1` or `z` has no columns.
    /// - [`CpmError::NotSquare`] if `z` is not square.
    pub fn new(m: usize, z: BitMatrix) -> CpmResult<Self> {
        if m < 1 {
            return Err(CpmError::invalid_dimension("m must be >= 1"));
        }
        if z.cols() == 0 {
            return Err(CpmError::invalid_dimension("n must be >= 1"));
        }
        if !z.is_square() {
            return Err(CpmError::NotSquare {
                rows: z.rows(),
                cols: z.cols(),
            });
        }
        Ok(Self {
            nrows: m,
            ncols: z.cols(),
            z,
        })
    }

    /// Creates a mixer from row-major `0`/`1` folding matrix data.
    ///
    /// # Errors
    ///
    /// As [`ColumnParityMixer::new`], plus [`CpmError::InvalidField`] for
    /// entries other than 0 and 1.
    pub fn from_rows(m: usize, z: Vec<Vec<u8>>) -> CpmResult<Self> {
        if m < 1 {
            return Err(CpmError::invalid_dimension("m must be >= 1"));
        }
        Self::new(m, BitMatrix::new(z)?)
    }

    /// The identity mixer (zero folding matrix).
    ///
    /// # Errors
    ///
    /// [`CpmError::InvalidDimension`] if `m < 1` or `n < 1`.
    pub fn identity(m: usize, n: usize) -> CpmResult<Self> {
        Self::new(m, BitMatrix::zeros(n, n))
    }

    /// Number of rows of the states this mixer acts on.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// The parity folding matrix `Z`.
    pub fn parity_folding_matrix(&self) -> &BitMatrix {
        &self.z
    }

    fn row_parity(&self) -> RowParity {
        RowParity::of(self.nrows)
    }

    fn check_state(&self, a: &BitMatrix) -> CpmResult<()> {
        if a.cols() != self.ncols {
            return Err(CpmError::dimension_mismatch(
                self.ncols,
                a.cols(),
                "columns of state matrix",
            ));
        }
        Ok(())
    }

    fn check_compatible(&self, other: &ColumnParityMixer) -> CpmResult<()> {
        if self.nrows != other.nrows || self.ncols != other.ncols {
            return Err(CpmError::shape_mismatch(
                (self.nrows, self.ncols),
                (other.nrows, other.ncols),
                "column parity mixers",
            ));
        }
        Ok(())
    }

    /// The folded parity `column_parity(a) · Z`, a `1 x n` vector.
    pub fn effect(&self, a: &BitMatrix) -> CpmResult<BitMatrix> {
        self.check_state(a)?;
        column_parity(a).mul(&self.z)
    }

    /// The folded parity repeated in each row of `a`.
    pub fn expanded_effect(&self, a: &BitMatrix) -> CpmResult<BitMatrix> {
        self.check_state(a)?;
        expanded_column_parity(a).mul(&self.z)
    }

    /// Applies the mixer: `a + expanded_effect(a)`.
    pub fn apply(&self, a: &BitMatrix) -> CpmResult<BitMatrix> {
        a.add(&self.expanded_effect(a)?)
    }

    /// Columns flipped by the mixer, ascending.
    pub fn affected_columns(&self, a: &BitMatrix) -> CpmResult<Vec<usize>> {
        Ok(self.effect(a)?.nonzero_positions_in_row(0))
    }

    /// Columns in `[0, n)` left untouched by the mixer, ascending.
    pub fn unaffected_columns(&self, a: &BitMatrix) -> CpmResult<Vec<usize>> {
        let effect = self.effect(a)?;
        Ok((0..self.ncols).filter(|&j| !effect.get(0, j)).collect())
    }

    /// The mixer equivalent to applying `self` first and `other` second.
    ///
    /// # Errors
    ///
    /// Returns [`CpmError::DimensionMismatch`] if the mixers differ in `m` or `n`.
    pub fn compose(&self, other: &ColumnParityMixer) -> CpmResult<ColumnParityMixer> {
        self.check_compatible(other)?;
        let z = self.compose_folding(other);
        debug!(m = self.nrows, n = self.ncols, parity = ?self.row_parity(), "composed mixers");

        Ok(ColumnParityMixer {
            nrows: self.nrows,
            ncols: self.ncols,
            z,
        })
    }

    /// Folding matrix of `self` then `other`; both must have the same `m` and `n`.
    fn compose_folding(&self, other: &ColumnParityMixer) -> BitMatrix {
        match self.row_parity() {
            // parity is left unchanged, so the two effects just add up
            RowParity::Even => self.z.xor(&other.z),
            // associated matrices multiply: Z = (Z1 + I)(Z2 + I) + I
            RowParity::Odd => self
                .associated_matrix()
                .product(&other.associated_matrix())
                .add_identity(),
        }
    }

    /// The associated matrix `Z + I`.
    pub fn associated_matrix(&self) -> BitMatrix {
        self.z.add_identity()
    }

    /// Whether the mixer is a bijection on `m x n` states.
    pub fn is_invertible(&self) -> bool {
        match self.row_parity() {
            RowParity::Even => true,
            RowParity::Odd => !self.associated_matrix().is_singular(),
        }
    }

    /// The inverse mixer.
    ///
    /// # Errors
    ///
    /// Returns [`CpmError::NotInvertible`] when [`Self::is_invertible`] is false.
    pub fn inverse(&self) -> CpmResult<ColumnParityMixer> {
        if !self.is_invertible() {
            return Err(CpmError::not_invertible(format!(
                "{self}: associated matrix is singular"
            )));
        }

        match self.row_parity() {
            // even row count: every mixer is an involution
            RowParity::Even => {
                debug!(m = self.nrows, "even row count, mixer is its own inverse");
                Ok(self.clone())
            }
            RowParity::Odd => {
                let z = self.associated_matrix().inverse()?.add_identity();
                ColumnParityMixer::new(self.nrows, z)
            }
        }
    }

    /// Order of the mixer under composition, searching with the default cap.
    pub fn order(&self) -> CpmResult<u64> {
        self.order_with(&OrderConfig::default())
    }

    /// Order of the mixer under composition.
    ///
    /// For even `m` this is always 2, also for the identity mixer. For odd `m`
    /// it is the multiplicative order of the associated matrix, at most
    /// `2^n - 1`, computed with `config.max_iterations` matrix products at most.
    ///
    /// # Errors
    ///
    /// - [`CpmError::NotInvertible`] for odd `m` and a singular associated matrix.
    /// - [`CpmError::ComputationLimitExceeded`] when `config.max_iterations` is reached.
    pub fn order_with(&self, config: &OrderConfig) -> CpmResult<u64> {
        match self.row_parity() {
            RowParity::Even => Ok(2),
            RowParity::Odd => {
                let order = self
                    .associated_matrix()
                    .multiplicative_order(config.max_iterations)?;
                debug!(m = self.nrows, n = self.ncols, order, "computed mixer order");
                Ok(order)
            }
        }
    }

    /// `true` iff the folding matrix is zero, i.e. the mixer changes nothing.
    pub fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    /// Whether the mixer is its own inverse.
    pub fn is_involution(&self) -> bool {
        match self.row_parity() {
            RowParity::Even => true,
            RowParity::Odd => self.compose_folding(self).is_zero(),
        }
    }

    /// Structural equality: same `m` and same `Z`.
    ///
    /// Two mixers with different `Z` are never equal, even if they act the
    /// same on every state.
    pub fn is_equal(&self, other: &ColumnParityMixer) -> bool {
        self == other
    }

    /// `self` composed with itself `e` times.
    ///
    /// # Errors
    ///
    /// Returns [`CpmError::InvalidExponent`] if `e < 1`.
    pub fn power(&self, e: u64) -> CpmResult<ColumnParityMixer> {
        if e < 1 {
            return Err(CpmError::InvalidExponent { exponent: e });
        }
        let mut result = self.clone();
        for _ in 1..e {
            result = result.compose(self)?;
        }
        Ok(result)
    }
}

impl fmt::Display for ColumnParityMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column Parity Mixer with {} rows and {} columns",
            self.nrows, self.ncols
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn z8() -> Vec<Vec<u8>> {
        vec![
            vec![1, 0, 0, 0, 0, 0, 0, 1],
            vec![1, 1, 0, 0, 0, 0, 0, 0],
            vec![0, 1, 1, 0, 0, 0, 0, 0],
            vec![0, 0, 1, 1, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 1, 0, 0, 0],
            vec![0, 0, 0, 0, 1, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 1, 1, 0],
            vec![0, 0, 0, 0, 0, 0, 1, 1],
        ]
    }

    fn z3() -> Vec<Vec<u8>> {
        vec![vec![1, 1, 0], vec![0, 1, 1], vec![1, 0, 1]]
    }

    fn z3_order7() -> Vec<Vec<u8>> {
        vec![vec![1, 1, 0], vec![1, 0, 1], vec![0, 1, 0]]
    }

    fn state8() -> BitMatrix {
        BitMatrix::new(vec![
            vec![0, 0, 0, 0, 0, 1, 0, 0],
            vec![1, 0, 0, 0, 0, 1, 0, 0],
            vec![0, 0, 0, 0, 0, 1, 0, 0],
            vec![0, 0, 1, 0, 0, 1, 0, 0],
            vec![0, 1, 1, 0, 0, 1, 0, 0],
        ])
        .unwrap()
    }

    fn state3() -> BitMatrix {
        BitMatrix::new(vec![vec![1, 1, 1], vec![0, 1, 0], vec![1, 0, 1], vec![0, 1, 1]]).unwrap()
    }

    // ==================== Construction ====================

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            ColumnParityMixer::from_rows(0, z3()),
            Err(CpmError::InvalidDimension { .. })
        ));
        assert!(matches!(
            ColumnParityMixer::from_rows(4, vec![vec![1, 0, 1], vec![0, 1, 0]]),
            Err(CpmError::NotSquare { rows: 2, cols: 3 })
        ));
        assert!(matches!(
            ColumnParityMixer::from_rows(4, vec![vec![1, 0], vec![0, 5]]),
            Err(CpmError::InvalidField { row: 1, col: 1, value: 5 })
        ));
        assert!(matches!(
            ColumnParityMixer::identity(5, 0),
            Err(CpmError::InvalidDimension { .. })
        ));
        assert!(matches!(
            ColumnParityMixer::new(3, BitMatrix::zeros(0, 0)),
            Err(CpmError::InvalidDimension { .. })
        ));
        assert!(serde_json::from_str::<ColumnParityMixer>(r#"{"rows":3,"folding":[]}"#).is_err());
    }

    #[test]
    fn test_accessors_and_display() {
        let theta = ColumnParityMixer::from_rows(4, z3()).unwrap();
        assert_eq!(theta.nrows(), 4);
        assert_eq!(theta.ncols(), 3);
        assert_eq!(theta.parity_folding_matrix().to_rows(), z3());

        let theta = ColumnParityMixer::from_rows(5, z8()).unwrap();
        assert_eq!(
            theta.to_string(),
            "Column Parity Mixer with 5 rows and 8 columns"
        );
    }

    // ==================== Evaluation ====================

    #[test]
    fn test_effect_and_columns() {
        let theta = ColumnParityMixer::from_rows(4, z3()).unwrap();
        let a = state3();
        assert_eq!(theta.effect(&a).unwrap().to_rows(), vec![vec![1, 1, 0]]);
        assert_eq!(
            theta.expanded_effect(&a).unwrap().to_rows(),
            vec![vec![1, 1, 0]; 4]
        );
        assert_eq!(theta.affected_columns(&a).unwrap(), vec![0, 1]);
        assert_eq!(theta.unaffected_columns(&a).unwrap(), vec![2]);
    }

    #[test]
    fn test_apply() {
        let theta = ColumnParityMixer::from_rows(5, z8()).unwrap();
        let a = state8();
        let before = a.clone();
        assert_eq!(
            theta.apply(&a).unwrap().to_rows(),
            vec![
                vec![0, 1, 0, 0, 1, 0, 0, 1],
                vec![1, 1, 0, 0, 1, 0, 0, 1],
                vec![0, 1, 0, 0, 1, 0, 0, 1],
                vec![0, 1, 1, 0, 1, 0, 0, 1],
                vec![0, 0, 1, 0, 1, 0, 0, 1],
            ]
        );
        assert_eq!(a, before);
    }

    #[test]
    fn test_state_with_wrong_width_is_rejected() {
        let theta = ColumnParityMixer::from_rows(4, z3()).unwrap();
        let a = BitMatrix::zeros(4, 5);
        assert!(matches!(
            theta.apply(&a),
            Err(CpmError::DimensionMismatch { .. })
        ));
        assert!(theta.unaffected_columns(&a).is_err());
    }

    // ==================== Composition ====================

    #[test]
    fn test_compose_matches_sequential_application() {
        for m in [4usize, 5] {
            let theta_p = ColumnParityMixer::from_rows(m, z3()).unwrap();
            let theta = ColumnParityMixer::from_rows(m, z3_order7()).unwrap();
            let alpha = theta_p.compose(&theta).unwrap();
            let a = BitMatrix::from_fn(m, 3, |i, j| (i * 3 + j) % 4 == 1);
            assert_eq!(
                alpha.apply(&a).unwrap(),
                theta.apply(&theta_p.apply(&a).unwrap()).unwrap(),
                "m = {m}"
            );
        }
    }

    #[test]
    fn test_compose_branches_on_row_parity() {
        let even_a = ColumnParityMixer::from_rows(4, z3()).unwrap();
        let even_b = ColumnParityMixer::from_rows(4, z3_order7()).unwrap();
        let sum = z3_order7()
            .iter()
            .zip(z3())
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x ^ y).collect())
            .collect::<Vec<Vec<u8>>>();
        assert_eq!(
            even_a.compose(&even_b).unwrap().parity_folding_matrix().to_rows(),
            sum
        );

        let odd_a = ColumnParityMixer::from_rows(5, z3()).unwrap();
        let odd_b = ColumnParityMixer::from_rows(5, z3_order7()).unwrap();
        let expected = odd_a
            .associated_matrix()
            .mul(&odd_b.associated_matrix())
            .unwrap()
            .add(&BitMatrix::identity(3))
            .unwrap();
        assert_eq!(
            odd_a.compose(&odd_b).unwrap().parity_folding_matrix(),
            &expected
        );
    }

    #[test]
    fn test_compose_dimension_mismatch() {
        let a = ColumnParityMixer::from_rows(4, z3()).unwrap();
        let b = ColumnParityMixer::from_rows(5, z3()).unwrap();
        let c = ColumnParityMixer::from_rows(4, z8()).unwrap();
        assert!(matches!(a.compose(&b), Err(CpmError::DimensionMismatch { .. })));
        assert!(matches!(a.compose(&c), Err(CpmError::DimensionMismatch { .. })));
    }

    // ==================== Order, inverse, involution ====================

    #[test]
    fn test_worked_example_8x8() {
        let theta = ColumnParityMixer::from_rows(5, z8()).unwrap();
        assert!(theta.is_invertible());
        assert_eq!(theta.order().unwrap(), 8);
        let shift = BitMatrix::from_fn(8, 8, |i, j| (j + 1) % 8 == i);
        assert_eq!(theta.associated_matrix(), shift);

        let inv = theta.inverse().unwrap();
        let identity = theta.compose(&inv).unwrap();
        assert!(identity.is_identity());
        assert_eq!(identity.associated_matrix(), BitMatrix::identity(8));
    }

    #[test]
    fn test_order_seven() {
        let theta = ColumnParityMixer::from_rows(5, z3_order7()).unwrap();
        assert_eq!(
            theta.associated_matrix().to_rows(),
            vec![vec![0, 1, 0], vec![1, 1, 1], vec![0, 1, 1]]
        );
        assert_eq!(theta.order().unwrap(), 7);
        assert!(theta.power(7).unwrap().is_identity());
        assert_eq!(theta.power(8).unwrap(), theta);
        for k in 1..7 {
            assert!(!theta.power(k).unwrap().is_identity(), "k = {k}");
        }
        assert!(!theta.is_identity());
        assert!(!theta.is_involution());
    }

    #[test]
    fn test_even_rows_are_involutions() {
        let theta = ColumnParityMixer::from_rows(4, z3()).unwrap();
        assert!(theta.is_involution());
        assert!(theta.is_invertible());
        assert_eq!(theta.order().unwrap(), 2);
        assert_eq!(theta.inverse().unwrap(), theta);
        assert!(theta.compose(&theta).unwrap().is_identity());

        let thetap = ColumnParityMixer::from_rows(4, z3_order7()).unwrap();
        assert!(thetap.is_involution());
        assert!(thetap.compose(&thetap).unwrap().is_identity());

        let c = ColumnParityMixer::from_rows(2, vec![vec![1, 0, 1], vec![1, 1, 1], vec![0, 1, 0]])
            .unwrap();
        assert!(c.is_invertible());
    }

    #[test]
    fn test_even_identity_order_is_two() {
        let identity = ColumnParityMixer::identity(6, 4).unwrap();
        assert!(identity.is_identity());
        assert_eq!(identity.order().unwrap(), 2);
    }

    #[test]
    fn test_odd_identity_order_is_one() {
        let identity = ColumnParityMixer::identity(3, 4).unwrap();
        assert_eq!(identity.order().unwrap(), 1);
        assert!(identity.is_involution());
    }

    #[test]
    fn test_non_invertible_odd_mixer() {
        // associated matrix is z3, whose rows sum to zero
        let z = BitMatrix::identity(3)
            .add(&BitMatrix::new(z3()).unwrap())
            .unwrap();
        let theta = ColumnParityMixer::new(5, z).unwrap();
        assert!(!theta.is_invertible());
        assert!(matches!(theta.inverse(), Err(CpmError::NotInvertible { .. })));
        assert!(matches!(theta.order(), Err(CpmError::NotInvertible { .. })));
    }

    #[test]
    fn test_order_limit() {
        let theta = ColumnParityMixer::from_rows(5, z8()).unwrap();
        let config = OrderConfig { max_iterations: 4 };
        assert_eq!(
            theta.order_with(&config),
            Err(CpmError::ComputationLimitExceeded { limit: 4 })
        );
    }

    #[test]
    fn test_order_of_primitive_mixer() {
        // Z + I is the companion matrix of the primitive trinomial x^21 + x^2 + 1
        let companion =
            BitMatrix::from_fn(21, 21, |i, j| i == j + 1 || (j == 20 && (i == 0 || i == 2)));
        let theta = ColumnParityMixer::new(5, companion.add_identity()).unwrap();
        assert_eq!(theta.associated_matrix(), companion);
        assert_eq!(theta.order().unwrap(), (1 << 21) - 1);
        assert!(!theta.is_involution());
        assert!(theta.is_invertible());
    }

    #[test]
    fn test_odd_involution() {
        // (Z + I)^2 = I for Z = e_0 e_1^T
        let z = BitMatrix::from_fn(3, 3, |i, j| i == 0 && j == 1);
        let theta = ColumnParityMixer::new(3, z).unwrap();
        assert!(theta.is_involution());
        assert_eq!(theta.order().unwrap(), 2);
        assert!(theta.compose(&theta).unwrap().is_identity());
    }

    #[test]
    fn test_double_inverse() {
        let theta = ColumnParityMixer::from_rows(7, z3_order7()).unwrap();
        assert_eq!(theta.inverse().unwrap().inverse().unwrap(), theta);
    }

    #[test]
    fn test_power_and_equality() {
        let theta = ColumnParityMixer::from_rows(5, z3_order7()).unwrap();
        assert_eq!(theta.power(0), Err(CpmError::InvalidExponent { exponent: 0 }));
        assert_eq!(theta.power(1).unwrap(), theta);

        let thetap =
            ColumnParityMixer::from_rows(5, vec![vec![1, 1, 1], vec![1, 0, 1], vec![0, 1, 0]])
                .unwrap();
        assert!(!theta.is_equal(&thetap));
        assert!(theta.is_equal(&theta));
        assert_ne!(
            theta,
            ColumnParityMixer::from_rows(3, z3_order7()).unwrap()
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let theta = ColumnParityMixer::from_rows(5, z3_order7()).unwrap();
        let json = serde_json::to_string(&theta).unwrap();
        assert_eq!(json, r#"{"rows":5,"folding":[[1,1,0],[1,0,1],[0,1,0]]}"#);
        let back: ColumnParityMixer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, theta);

        assert!(
            serde_json::from_str::<ColumnParityMixer>(r#"{"rows":0,"folding":[[1]]}"#).is_err()
        );
        assert!(
            serde_json::from_str::<ColumnParityMixer>(r#"{"rows":3,"folding":[[1,0]]}"#).is_err()
        );
    }
}
