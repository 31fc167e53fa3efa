//! Tagged variant over the five domain kinds.
//!
//! Every domain of a network holds one [`Value`]. All kinds share the same
//! capability set: emptiness, inclusion, intersection and volume. The engine
//! dispatches on these by pattern matching.

use std::fmt::{Display, Formatter};

use crate::interval::{Interval, IntervalMatrix, IntervalVector};
use crate::tube::{Tube, TubeVector};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Kind {
    Scalar,
    Vector,
    Matrix,
    Tube,
    TubeVector,
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Kind::Scalar => "scalar",
            Kind::Vector => "vector",
            Kind::Matrix => "matrix",
            Kind::Tube => "tube",
            Kind::TubeVector => "tube vector",
        };
        write!(f, "{}", s)
    }
}

/// Shape of a domain, used to create intermediate domains.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape {
    Scalar,
    Vector(usize),
    Matrix { rows: usize, cols: usize },
    Tube { tdomain: Interval, dt: f64 },
    TubeVector { size: usize, tdomain: Interval, dt: f64 },
}

impl Shape {
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Scalar => Kind::Scalar,
            Shape::Vector(_) => Kind::Vector,
            Shape::Matrix { .. } => Kind::Matrix,
            Shape::Tube { .. } => Kind::Tube,
            Shape::TubeVector { .. } => Kind::TubeVector,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Interval),
    Vector(IntervalVector),
    Matrix(IntervalMatrix),
    Tube(Tube),
    TubeVector(TubeVector),
}

impl Value {
    /// The full (unconstrained) enclosure of the given shape.
    pub fn full(shape: &Shape) -> Value {
        match *shape {
            Shape::Scalar => Value::Scalar(Interval::all_reals()),
            Shape::Vector(n) => Value::Vector(IntervalVector::all_reals(n)),
            Shape::Matrix { rows, cols } => Value::Matrix(IntervalMatrix::all_reals(rows, cols)),
            Shape::Tube { tdomain, dt } => Value::Tube(Tube::new(tdomain, dt, Interval::all_reals())),
            Shape::TubeVector { size, tdomain, dt } => {
                Value::TubeVector(TubeVector::new(size, tdomain, dt, Interval::all_reals()))
            }
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Scalar(_) => Kind::Scalar,
            Value::Vector(_) => Kind::Vector,
            Value::Matrix(_) => Kind::Matrix,
            Value::Tube(_) => Kind::Tube,
            Value::TubeVector(_) => Kind::TubeVector,
        }
    }

    /// Number of components: vector size, slice count or tube vector size.
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Vector(v) => v.len(),
            Value::Matrix(m) => m.rows() * m.cols(),
            Value::Tube(x) => x.nb_slices(),
            Value::TubeVector(x) => x.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Scalar(x) => x.is_empty(),
            Value::Vector(v) => v.is_empty(),
            Value::Matrix(m) => m.is_empty(),
            Value::Tube(x) => x.is_empty(),
            Value::TubeVector(x) => x.is_empty(),
        }
    }

    /// Inclusion test. Values of different structure are never subsets of each other.
    pub fn is_subset(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.is_subset(b),
            (Value::Vector(a), Value::Vector(b)) => a.len() == b.len() && a.is_subset(b),
            (Value::Matrix(a), Value::Matrix(b)) => a.is_subset(b),
            (Value::Tube(a), Value::Tube(b)) => a.is_subset(b),
            (Value::TubeVector(a), Value::TubeVector(b)) => a.is_subset(b),
            _ => false,
        }
    }

    /// Intersection, or `None` when the structures differ.
    pub fn intersect(&self, other: &Value) -> Option<Value> {
        if !self.same_structure(other) {
            return None;
        }
        let v = match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a.intersect(b)),
            (Value::Vector(a), Value::Vector(b)) => Value::Vector(a.intersect(b)),
            (Value::Matrix(a), Value::Matrix(b)) => Value::Matrix(a.intersect(b)),
            (Value::Tube(a), Value::Tube(b)) => Value::Tube(a.intersect(b)),
            (Value::TubeVector(a), Value::TubeVector(b)) => Value::TubeVector(a.intersect(b)),
            _ => unreachable!(),
        };
        Some(v)
    }

    pub fn volume(&self) -> f64 {
        match self {
            Value::Scalar(x) => x.volume(),
            Value::Vector(v) => v.volume(),
            Value::Matrix(m) => m.volume(),
            Value::Tube(x) => x.volume(),
            Value::TubeVector(x) => x.volume(),
        }
    }

    /// Replace every leaf by the empty interval, keeping the structure.
    pub fn set_empty(&mut self) {
        match self {
            Value::Scalar(x) => *x = Interval::empty(),
            Value::Vector(v) => (0..v.len()).for_each(|i| v[i] = Interval::empty()),
            Value::Matrix(m) => {
                for i in 0..m.rows() {
                    for j in 0..m.cols() {
                        m.set(i, j, Interval::empty());
                    }
                }
            }
            Value::Tube(x) => (0..x.nb_slices()).for_each(|k| x.slice_mut(k).codomain = Interval::empty()),
            Value::TubeVector(x) => {
                for i in 0..x.size() {
                    let c = x.component_mut(i);
                    (0..c.nb_slices()).for_each(|k| c.slice_mut(k).codomain = Interval::empty());
                }
            }
        }
    }

    /// Same kind, same dimensions and, for tubes, same slicing.
    pub fn same_structure(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(_), Value::Scalar(_)) => true,
            (Value::Vector(a), Value::Vector(b)) => a.len() == b.len(),
            (Value::Matrix(a), Value::Matrix(b)) => a.rows() == b.rows() && a.cols() == b.cols(),
            (Value::Tube(a), Value::Tube(b)) => a.same_slicing(b),
            (Value::TubeVector(a), Value::TubeVector(b)) => a.same_slicing(b),
            _ => false,
        }
    }

    /// The scalar leaves of the value in storage order.
    ///
    /// Vectors and matrices list their cells (row-major), tubes their slice
    /// codomains, tube vectors the slices of each component in turn.
    pub fn leaves(&self) -> Vec<Interval> {
        match self {
            Value::Scalar(x) => vec![*x],
            Value::Vector(v) => v.as_slice().to_vec(),
            Value::Matrix(m) => m.as_slice().to_vec(),
            Value::Tube(x) => x.slices().iter().map(|s| s.codomain).collect(),
            Value::TubeVector(x) => x
                .components()
                .iter()
                .flat_map(|c| c.slices().iter().map(|s| s.codomain))
                .collect(),
        }
    }

    pub fn as_scalar(&self) -> Option<Interval> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }
    pub fn as_vector(&self) -> Option<&IntervalVector> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_matrix(&self) -> Option<&IntervalMatrix> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_tube(&self) -> Option<&Tube> {
        match self {
            Value::Tube(x) => Some(x),
            _ => None,
        }
    }
    pub fn as_tube_vector(&self) -> Option<&TubeVector> {
        match self {
            Value::TubeVector(x) => Some(x),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Interval::point(x))
    }
}

impl From<Interval> for Value {
    fn from(x: Interval) -> Self {
        Value::Scalar(x)
    }
}

impl From<IntervalVector> for Value {
    fn from(v: IntervalVector) -> Self {
        Value::Vector(v)
    }
}

impl From<IntervalMatrix> for Value {
    fn from(m: IntervalMatrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<Tube> for Value {
    fn from(x: Tube) -> Self {
        Value::Tube(x)
    }
}

impl From<TubeVector> for Value {
    fn from(x: TubeVector) -> Self {
        Value::TubeVector(x)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(x) => write!(f, "{}", x),
            Value::Vector(v) => write!(f, "{}", v),
            Value::Matrix(m) => write!(f, "{}", m),
            Value::Tube(x) => write!(f, "{}", x),
            Value::TubeVector(x) => write!(f, "TubeVector({}) over {}", x.size(), x.tdomain()),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_full_is_never_empty() {
        let shapes = [
            Shape::Scalar,
            Shape::Vector(3),
            Shape::Matrix { rows: 2, cols: 2 },
            Shape::Tube {
                tdomain: Interval::new(0.0, 1.0),
                dt: 0.5,
            },
            Shape::TubeVector {
                size: 2,
                tdomain: Interval::new(0.0, 1.0),
                dt: 0.5,
            },
        ];
        for shape in shapes {
            let v = Value::full(&shape);
            assert_eq!(v.kind(), shape.kind());
            assert!(!v.is_empty());
            assert!(v.leaves().iter().all(|x| *x == Interval::all_reals()));
        }
    }

    #[test]
    fn test_intersect_requires_same_structure() {
        let a = Value::from(IntervalVector::new(2, Interval::new(0.0, 1.0)));
        let b = Value::from(IntervalVector::new(3, Interval::new(0.0, 1.0)));
        assert!(a.intersect(&b).is_none());
        assert!(a.intersect(&Value::from(1.0)).is_none());

        let c = Value::from(IntervalVector::new(2, Interval::new(0.5, 2.0)));
        let r = a.intersect(&c).unwrap();
        assert_eq!(r, Value::from(IntervalVector::new(2, Interval::new(0.5, 1.0))));
        assert!(r.is_subset(&a));
        assert!(r.is_subset(&c));
    }

    #[test]
    fn test_leaves_order() {
        let mut x = TubeVector::new(2, Interval::new(0.0, 2.0), 1.0, Interval::all_reals());
        x.component_mut(1).slice_mut(0).codomain = Interval::point(7.0);
        let leaves = Value::from(x).leaves();
        assert_eq!(leaves.len(), 4);
        assert_eq!(leaves[2], Interval::point(7.0));
    }

    #[test]
    fn test_subset_across_kinds() {
        assert!(!Value::from(1.0).is_subset(&Value::from(IntervalVector::all_reals(1))));
    }
}
