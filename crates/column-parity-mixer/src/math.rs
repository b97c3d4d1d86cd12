// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Arithmetic over GF(2): addition is XOR, multiplication is AND.

use crate::errors::{CpmError, CpmResult};
use crate::matrix_type::BitMatrix;
use std::collections::BTreeMap;
use tracing::{trace, warn};

impl BitMatrix {
    /// Elementwise sum `self + other` (XOR).
    pub fn add(&self, other: &BitMatrix) -> CpmResult<BitMatrix> {
        if self.shape() != other.shape() {
            return Err(CpmError::shape_mismatch(
                self.shape(),
                other.shape(),
                "matrix addition",
            ));
        }
        Ok(self.xor(other))
    }

    /// Matrix product `self · other`.
    pub fn mul(&self, other: &BitMatrix) -> CpmResult<BitMatrix> {
        if self.cols() != other.rows() {
            return Err(CpmError::dimension_mismatch(
                self.cols(),
                other.rows(),
                "matrix multiplication (lhs.cols vs rhs.rows)",
            ));
        }
        Ok(self.product(other))
    }

    /// `self + I`, flipping the main diagonal.
    pub fn add_identity(&self) -> BitMatrix {
        let mut sum = self.clone();
        for i in 0..self.rows().min(self.cols()) {
            sum.set(i, i, !self.get(i, i));
        }
        sum
    }

    /// `true` for a square matrix equal to the identity.
    pub fn is_identity(&self) -> bool {
        self.is_square() && self.add_identity().is_zero()
    }

    /// XOR of two matrices of the same shape.
    pub(crate) fn xor(&self, other: &BitMatrix) -> BitMatrix {
        debug_assert_eq!(self.shape(), other.shape());
        let mut sum = self.clone();
        for (w, o) in sum.data_mut().iter_mut().zip(other.data()) {
            *w ^= o;
        }
        sum
    }

    /// Product of two matrices with `self.cols() == other.rows()`.
    ///
    /// Row `i` of the product is the XOR of the rows of `other` selected by
    /// the set bits of row `i` of `self`.
    pub(crate) fn product(&self, other: &BitMatrix) -> BitMatrix {
        debug_assert_eq!(self.cols(), other.rows());
        let mut product = BitMatrix::zeros(self.rows(), other.cols());
        let wpr = product.words_per_row();
        for i in 0..self.rows() {
            for k in self.nonzero_positions_in_row(i) {
                let src = other.row_words(k);
                let dst = &mut product.data_mut()[i * wpr..(i + 1) * wpr];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d ^= s;
                }
            }
        }
        product
    }

    /// Rank over GF(2), by forward elimination on a copy.
    pub fn rank(&self) -> usize {
        let mut work = self.clone();
        let mut pivot_row = 0;
        for col in 0..work.cols() {
            if pivot_row == work.rows() {
                break;
            }
            let Some(pivot) = (pivot_row..work.rows()).find(|&r| work.get(r, col)) else {
                continue;
            };
            work.swap_rows(pivot_row, pivot);
            for row in pivot_row + 1..work.rows() {
                if work.get(row, col) {
                    work.xor_row(row, pivot_row);
                }
            }
            pivot_row += 1;
        }
        pivot_row
    }

    /// A square matrix is singular when its rank is below its size.
    /// Non-square matrices are always reported as singular.
    pub fn is_singular(&self) -> bool {
        !self.is_square() || self.rank() < self.rows()
    }

    /// Inverse over GF(2) by Gauss-Jordan elimination on `[self | I]`.
    ///
    /// # Errors
    ///
    /// - [`CpmError::NotSquare`] for non-square input.
    /// - [`CpmError::NotInvertible`] when no pivot exists for some column.
    pub fn inverse(&self) -> CpmResult<BitMatrix> {
        if !self.is_square() {
            return Err(CpmError::NotSquare {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let n = self.rows();
        let mut left = self.clone();
        let mut right = BitMatrix::identity(n);

        for col in 0..n {
            let pivot = (col..n).find(|&r| left.get(r, col)).ok_or_else(|| {
                CpmError::not_invertible(format!("matrix is singular (no pivot in column {col})"))
            })?;
            left.swap_rows(col, pivot);
            right.swap_rows(col, pivot);

            // Eliminate other entries in this column
            for row in 0..n {
                if row != col && left.get(row, col) {
                    left.xor_row(row, col);
                    right.xor_row(row, col);
                }
            }
        }

        Ok(right)
    }

    /// Smallest `k >= 1` with `self^k = I`, using at most `max_products` matrix products.
    ///
    /// For `n <= 64` the order is computed exactly from a known multiple:
    /// it divides `N = 2^e · lcm(2^d - 1 : d <= n)` with `2^e >= n`, and for
    /// each prime `p | N` the `p`-part of the order is the order of
    /// `self^(N / p^k)`, found by square-and-multiply. Larger matrices fall
    /// back to multiplying one power at a time.
    ///
    /// # Errors
    ///
    /// - [`CpmError::NotSquare`] for non-square input.
    /// - [`CpmError::NotInvertible`] for singular input (no power is the identity).
    /// - [`CpmError::ComputationLimitExceeded`] when the product budget runs out.
    pub fn multiplicative_order(&self, max_products: u64) -> CpmResult<u64> {
        if !self.is_square() {
            return Err(CpmError::NotSquare {
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        if self.is_singular() {
            return Err(CpmError::not_invertible(
                "singular matrix has no multiplicative order",
            ));
        }
        if self.is_identity() {
            return Ok(1);
        }

        let mut budget = ProductBudget::new(max_products);
        let n = self.rows();
        if n > MAX_FACTORED_DIMENSION {
            return self.order_by_search(&mut budget);
        }

        let multiple = order_multiple(n);
        let mut order: u64 = 1;
        for (&p, &k) in &multiple {
            let mut power = self.clone();
            for (&q, &j) in &multiple {
                if q != p {
                    power = power.pow(q.pow(j), &mut budget)?;
                }
            }
            let mut i = 0;
            while i < k && !power.is_identity() {
                power = power.pow(p, &mut budget)?;
                i += 1;
            }
            order *= p.pow(i);
        }
        trace!(n, order, products = budget.used, "order from factored multiple");
        Ok(order)
    }

    /// `self^e` by square-and-multiply, charging every product to `budget`.
    fn pow(&self, mut e: u64, budget: &mut ProductBudget) -> CpmResult<BitMatrix> {
        let mut result = BitMatrix::identity(self.rows());
        let mut base = self.clone();
        while e > 0 {
            if e & 1 == 1 {
                budget.spend()?;
                result = result.product(&base);
            }
            e >>= 1;
            if e > 0 {
                budget.spend()?;
                base = base.product(&base);
            }
        }
        Ok(result)
    }

    fn order_by_search(&self, budget: &mut ProductBudget) -> CpmResult<u64> {
        let mut power = self.clone();
        let mut k: u64 = 1;
        while !power.is_identity() {
            budget.spend()?;
            power = power.product(self);
            k += 1;
            if k % (1 << 16) == 0 {
                trace!(k, "order search in progress");
            }
        }
        Ok(k)
    }
}

/// Largest size handled by the factored order computation; `2^64 - 1` is the
/// last Mersenne number that fits in a `u64`.
const MAX_FACTORED_DIMENSION: usize = 64;

struct ProductBudget {
    limit: u64,
    used: u64,
}

impl ProductBudget {
    fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    fn spend(&mut self) -> CpmResult<()> {
        if self.used >= self.limit {
            warn!(limit = self.limit, "order computation hit its cap");
            return Err(CpmError::ComputationLimitExceeded { limit: self.limit });
        }
        self.used += 1;
        Ok(())
    }
}

/// Prime factorization of a multiple of the order of every element of `GL(n, 2)`.
fn order_multiple(n: usize) -> BTreeMap<u64, u32> {
    let mut multiple = BTreeMap::new();
    // unipotent part: (U - I)^n = 0, so U^(2^e) = I once 2^e >= n
    let e = usize::BITS - n.saturating_sub(1).leading_zeros();
    if n > 1 {
        multiple.insert(2, e);
    }
    // semisimple part: eigenvalues live in GF(2^d)* for d <= n
    for d in 1..=n as u32 {
        let mersenne = if d == 64 { u64::MAX } else { (1u64 << d) - 1 };
        for (p, k) in factorize(mersenne) {
            let entry = multiple.entry(p).or_insert(0);
            *entry = (*entry).max(k);
        }
    }
    multiple
}

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut result = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    result
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic Miller-Rabin for 64-bit integers.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// A non-trivial divisor of the odd composite `n` (Pollard's rho).
fn pollard_rho(n: u64) -> u64 {
    let mut c: u64 = 1;
    loop {
        let step = |x: u64| ((mul_mod(x, x, n) as u128 + c as u128) % n as u128) as u64;
        let (mut x, mut y, mut d) = (2u64, 2u64, 1u64);
        while d == 1 {
            x = step(x);
            y = step(step(y));
            d = gcd(x.abs_diff(y), n);
        }
        if d != n {
            return d;
        }
        c += 1;
    }
}

/// Prime factorization as `prime -> exponent`.
fn factorize(mut n: u64) -> BTreeMap<u64, u32> {
    let mut factors = BTreeMap::new();
    for p in 2..1000u64 {
        while n % p == 0 {
            *factors.entry(p).or_insert(0) += 1;
            n /= p;
        }
    }
    let mut pending = if n > 1 { vec![n] } else { vec![] };
    while let Some(x) = pending.pop() {
        if is_prime(x) {
            *factors.entry(x).or_insert(0) += 1;
        } else {
            let d = pollard_rho(x);
            pending.push(d);
            pending.push(x / d);
        }
    }
    factors
}
