//! The contractor interface.
//!
//! A contractor is a narrowing operator over an ordered tuple of values. It is
//! given the current values of its arguments and narrows them in place. The
//! result must be a subset of the input. The network intersects the output
//! with the input anyway, so a contractor returning wider values cannot break
//! monotonicity.
//!
//! Narrowing an argument to the empty set is a valid outcome that proves
//! infeasibility. Returning an error is reserved for genuine failures and
//! aborts the running propagation.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::value::{Kind, Value};

/// Expected kind (and optional dimension) of one contractor argument.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Slot {
    Scalar,
    /// Vector, with a required size if `Some`.
    Vector(Option<usize>),
    Matrix(Option<(usize, usize)>),
    Tube,
    TubeVector(Option<usize>),
    /// Any kind of domain.
    Any,
}

impl Slot {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Slot::Any, _) => true,
            (Slot::Scalar, Value::Scalar(_)) => true,
            (Slot::Vector(n), Value::Vector(v)) => n.map_or(true, |n| n == v.len()),
            (Slot::Matrix(d), Value::Matrix(m)) => d.map_or(true, |d| d == (m.rows(), m.cols())),
            (Slot::Tube, Value::Tube(_)) => true,
            (Slot::TubeVector(n), Value::TubeVector(x)) => n.map_or(true, |n| n == x.size()),
            _ => false,
        }
    }

    pub fn kind(&self) -> Option<Kind> {
        match self {
            Slot::Scalar => Some(Kind::Scalar),
            Slot::Vector(_) => Some(Kind::Vector),
            Slot::Matrix(_) => Some(Kind::Matrix),
            Slot::Tube => Some(Kind::Tube),
            Slot::TubeVector(_) => Some(Kind::TubeVector),
            Slot::Any => None,
        }
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Scalar => write!(f, "scalar"),
            Slot::Vector(None) => write!(f, "vector"),
            Slot::Vector(Some(n)) => write!(f, "vector({})", n),
            Slot::Matrix(None) => write!(f, "matrix"),
            Slot::Matrix(Some((r, c))) => write!(f, "matrix({}x{})", r, c),
            Slot::Tube => write!(f, "tube"),
            Slot::TubeVector(None) => write!(f, "tube vector"),
            Slot::TubeVector(Some(n)) => write!(f, "tube vector({})", n),
            Slot::Any => write!(f, "any"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractorError {
    #[error("{0}")]
    Failed(String),

    #[error("argument {index}: expected {expected}, got {actual}")]
    InvalidArgument { index: usize, expected: Slot, actual: Kind },

    /// The contractor replaced an argument by a value of another structure.
    #[error("argument {index} changed structure")]
    StructureChanged { index: usize },
}

/// Narrowing operator over an ordered tuple of domain values.
///
/// The identity of a contractor is the identity of its shared instance: the
/// same `Rc` added twice on the same arguments yields a single binding.
pub trait Contractor {
    /// Diagnostic name, used in logs and DOT output.
    fn name(&self) -> &str;

    /// Expected argument kinds, one per argument.
    fn signature(&self) -> Vec<Slot>;

    /// Narrow `values` in place.
    fn contract(&self, values: &mut [Value]) -> Result<(), ContractorError>;
}

/// Check `values` against `signature`, reporting the first mismatch.
pub fn check_signature(signature: &[Slot], values: &[Value]) -> Result<(), ContractorError> {
    for (index, (slot, value)) in signature.iter().zip(values).enumerate() {
        if !slot.accepts(value) {
            return Err(ContractorError::InvalidArgument {
                index,
                expected: *slot,
                actual: value.kind(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::interval::{Interval, IntervalVector};

    #[test]
    fn test_slot_accepts() {
        let x = Value::from(Interval::new(0.0, 1.0));
        let v = Value::from(IntervalVector::all_reals(3));
        assert!(Slot::Scalar.accepts(&x));
        assert!(!Slot::Scalar.accepts(&v));
        assert!(Slot::Vector(None).accepts(&v));
        assert!(Slot::Vector(Some(3)).accepts(&v));
        assert!(!Slot::Vector(Some(2)).accepts(&v));
        assert!(Slot::Any.accepts(&v));
    }

    #[test]
    fn test_check_signature() {
        let values = vec![Value::from(1.0), Value::from(IntervalVector::all_reals(2))];
        assert!(check_signature(&[Slot::Scalar, Slot::Vector(Some(2))], &values).is_ok());
        let err = check_signature(&[Slot::Scalar, Slot::Scalar], &values).unwrap_err();
        assert_eq!(
            err,
            ContractorError::InvalidArgument {
                index: 1,
                expected: Slot::Scalar,
                actual: Kind::Vector
            }
        );
        assert_eq!(err.to_string(), "argument 1: expected scalar, got vector");
    }
}
