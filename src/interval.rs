//! Interval value types.
//!
//! This module provides the small set-algebra the network needs from its
//! values: intersection, hull, inclusion, emptiness and volume. It also
//! provides the few arithmetic operations used by the built-in contractors.
//! Bounds are plain `f64` without outward rounding.
//!
//! # Examples
//!
//! ```
//! use cn_rs::interval::Interval;
//!
//! let a = Interval::new(0.0, 1.0);
//! let b = Interval::new(0.5, 3.0);
//! assert_eq!(a & b, Interval::new(0.5, 1.0));
//! assert_eq!(a | b, Interval::new(0.0, 3.0));
//! assert!(Interval::new(0.2, 0.4).is_subset(&a));
//! ```

use std::fmt::{Display, Formatter};
use std::ops::{Add, BitAnd, BitOr, Index, IndexMut, Neg, Sub};

/// Closed interval `[lb, ub]` over the extended reals.
///
/// The empty set has the canonical representation `[+∞, -∞]`, so the derived
/// equality treats all empty intervals as equal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Interval {
    lb: f64,
    ub: f64,
}

impl Interval {
    /// Create `[lb, ub]`. Returns the empty interval when `lb > ub` or when a bound is NaN.
    pub fn new(lb: f64, ub: f64) -> Self {
        if lb.is_nan() || ub.is_nan() || lb > ub || lb == f64::INFINITY || ub == f64::NEG_INFINITY {
            Self::empty()
        } else {
            Self { lb, ub }
        }
    }

    /// Degenerate interval `[x, x]`.
    pub fn point(x: f64) -> Self {
        Self::new(x, x)
    }

    /// The unconstrained interval `(-∞, +∞)`.
    pub const fn all_reals() -> Self {
        Self {
            lb: f64::NEG_INFINITY,
            ub: f64::INFINITY,
        }
    }

    pub const fn empty() -> Self {
        Self {
            lb: f64::INFINITY,
            ub: f64::NEG_INFINITY,
        }
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }
    pub fn ub(&self) -> f64 {
        self.ub
    }

    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }

    pub fn is_unbounded(&self) -> bool {
        !self.is_empty() && (self.lb.is_infinite() || self.ub.is_infinite())
    }

    pub fn is_degenerate(&self) -> bool {
        !self.is_empty() && self.lb == self.ub
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lb <= x && x <= self.ub
    }

    /// Inclusion test: `self ⊆ other`. The empty set is a subset of everything.
    pub fn is_subset(&self, other: &Interval) -> bool {
        self.is_empty() || (other.lb <= self.lb && self.ub <= other.ub)
    }

    /// Diameter of the interval; `0` for the empty set.
    pub fn diam(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.ub - self.lb
        }
    }

    /// Midpoint; NaN for the empty set.
    pub fn mid(&self) -> f64 {
        if self.is_empty() {
            f64::NAN
        } else if self.lb.is_infinite() && self.ub.is_infinite() {
            0.0
        } else {
            0.5 * (self.lb + self.ub)
        }
    }

    /// Volume used by the fixpoint heuristics (the diameter).
    pub fn volume(&self) -> f64 {
        self.diam()
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.lb.max(other.lb), self.ub.min(other.ub))
    }

    /// Interval hull of the union.
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            lb: self.lb.min(other.lb),
            ub: self.ub.max(other.ub),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::all_reals()
    }
}

impl From<f64> for Interval {
    fn from(x: f64) -> Self {
        Interval::point(x)
    }
}

impl From<(f64, f64)> for Interval {
    fn from((lb, ub): (f64, f64)) -> Self {
        Interval::new(lb, ub)
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "[ empty ]")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}

impl BitAnd for Interval {
    type Output = Interval;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersect(&rhs)
    }
}

impl BitOr for Interval {
    type Output = Interval;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.hull(&rhs)
    }
}

impl Add for Interval {
    type Output = Interval;

    fn add(self, rhs: Self) -> Self::Output {
        if self.is_empty() || rhs.is_empty() {
            return Interval::empty();
        }
        Interval::new(self.lb + rhs.lb, self.ub + rhs.ub)
    }
}

impl Sub for Interval {
    type Output = Interval;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for Interval {
    type Output = Interval;

    fn neg(self) -> Self::Output {
        if self.is_empty() {
            return self;
        }
        Interval {
            lb: -self.ub,
            ub: -self.lb,
        }
    }
}

/// Box: an ordered list of intervals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntervalVector(Vec<Interval>);

impl IntervalVector {
    /// Vector of `n` copies of `x`.
    pub fn new(n: usize, x: Interval) -> Self {
        Self(vec![x; n])
    }

    /// Unconstrained box of dimension `n`.
    pub fn all_reals(n: usize) -> Self {
        Self::new(n, Interval::all_reals())
    }

    /// Degenerate box around a point.
    pub fn point(v: &[f64]) -> Self {
        v.iter().copied().map(Interval::point).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_zero_dim(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.0.iter()
    }
    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }
    pub fn into_inner(self) -> Vec<Interval> {
        self.0
    }

    /// Components `i..=j`.
    pub fn subvector(&self, i: usize, j: usize) -> IntervalVector {
        Self(self.0[i..=j].to_vec())
    }

    /// A box is empty as soon as one of its components is.
    pub fn is_empty(&self) -> bool {
        self.0.iter().any(|x| x.is_empty())
    }

    pub fn is_subset(&self, other: &IntervalVector) -> bool {
        self.is_empty() || (self.len() == other.len() && self.0.iter().zip(&other.0).all(|(a, b)| a.is_subset(b)))
    }

    /// Product of the component diameters.
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        // Skip the product when a zero diameter would turn `0 * ∞` into NaN.
        if self.0.iter().any(|x| x.diam() == 0.0) {
            return 0.0;
        }
        self.0.iter().map(|x| x.diam()).product()
    }

    pub fn intersect(&self, other: &IntervalVector) -> IntervalVector {
        assert_eq!(self.len(), other.len(), "Dimension mismatch");
        self.0.iter().zip(&other.0).map(|(a, b)| a.intersect(b)).collect()
    }

    pub fn hull(&self, other: &IntervalVector) -> IntervalVector {
        assert_eq!(self.len(), other.len(), "Dimension mismatch");
        self.0.iter().zip(&other.0).map(|(a, b)| a.hull(b)).collect()
    }
}

impl From<Vec<Interval>> for IntervalVector {
    fn from(v: Vec<Interval>) -> Self {
        Self(v)
    }
}

impl FromIterator<Interval> for IntervalVector {
    fn from_iter<T: IntoIterator<Item = Interval>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Index<usize> for IntervalVector {
    type Output = Interval;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for IntervalVector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl Display for IntervalVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ; ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, ")")
    }
}

/// Row-major matrix of intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Interval>,
}

impl IntervalMatrix {
    pub fn new(rows: usize, cols: usize, x: Interval) -> Self {
        Self {
            rows,
            cols,
            data: vec![x; rows * cols],
        }
    }

    pub fn all_reals(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols, Interval::all_reals())
    }

    /// Build a matrix from row-major cells.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<Interval>) -> Self {
        assert_eq!(data.len(), rows * cols, "Matrix data does not match {}x{}", rows, cols);
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> Interval {
        self.data[i * self.cols + j]
    }
    pub fn set(&mut self, i: usize, j: usize, x: Interval) {
        self.data[i * self.cols + j] = x;
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.iter().any(|x| x.is_empty())
    }

    pub fn is_subset(&self, other: &IntervalMatrix) -> bool {
        self.is_empty()
            || (self.rows == other.rows
                && self.cols == other.cols
                && self.data.iter().zip(&other.data).all(|(a, b)| a.is_subset(b)))
    }

    pub fn volume(&self) -> f64 {
        IntervalVector::from(self.data.clone()).volume()
    }

    pub fn intersect(&self, other: &IntervalMatrix) -> IntervalMatrix {
        assert_eq!((self.rows, self.cols), (other.rows, other.cols), "Dimension mismatch");
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a.intersect(b)).collect(),
        }
    }
}

impl Display for IntervalMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, " ; ")?;
            }
            write!(f, "(")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, " ; ")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            write!(f, ")")?;
        }
        write!(f, ")")
    }
}
