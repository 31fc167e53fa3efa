//! Tubes: interval enclosures of trajectories over a time domain.
//!
//! A [`Tube`] is a sequence of contiguous [`Slice`]s. Each slice holds a time
//! sub-domain and the interval codomain enclosing the trajectory over it.
//! A [`TubeVector`] groups several tubes that share the same slicing.

use std::fmt::{Display, Formatter};

use crate::interval::{Interval, IntervalVector};

/// One time-slice of a tube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Slice {
    pub tdomain: Interval,
    pub codomain: Interval,
}

impl Slice {
    pub fn new(tdomain: Interval, codomain: Interval) -> Self {
        Self { tdomain, codomain }
    }

    /// Area of the slice, `diam(t) * diam(y)`.
    pub fn volume(&self) -> f64 {
        if self.codomain.is_empty() {
            0.0
        } else {
            self.tdomain.diam() * self.codomain.diam()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    slices: Vec<Slice>,
}

impl Tube {
    /// Slice `tdomain` into steps of width `dt`, the last slice possibly shorter,
    /// every slice holding `codomain`.
    pub fn new(tdomain: Interval, dt: f64, codomain: Interval) -> Self {
        assert!(dt > 0.0, "Time step should be positive");
        assert!(
            !tdomain.is_empty() && !tdomain.is_unbounded(),
            "Time domain should be bounded and non-empty"
        );

        let (t0, tf) = (tdomain.lb(), tdomain.ub());
        let mut slices = Vec::new();
        let mut k = 0;
        loop {
            let lb = t0 + k as f64 * dt;
            let ub = (t0 + (k + 1) as f64 * dt).min(tf);
            slices.push(Slice::new(Interval::new(lb, ub), codomain));
            if ub >= tf {
                break;
            }
            k += 1;
        }
        Self { slices }
    }

    /// Build a tube from explicit slices. Slices must be contiguous.
    pub fn from_slices(slices: Vec<Slice>) -> Self {
        assert!(!slices.is_empty(), "Tube should have at least one slice");
        for w in slices.windows(2) {
            assert_eq!(w[0].tdomain.ub(), w[1].tdomain.lb(), "Slices should be contiguous");
        }
        Self { slices }
    }

    pub fn tdomain(&self) -> Interval {
        let first = self.slices[0].tdomain;
        let last = self.slices[self.slices.len() - 1].tdomain;
        first | last
    }

    pub fn nb_slices(&self) -> usize {
        self.slices.len()
    }

    pub fn slice(&self, k: usize) -> &Slice {
        &self.slices[k]
    }
    pub fn slice_mut(&mut self, k: usize) -> &mut Slice {
        &mut self.slices[k]
    }
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Index of the slice whose time domain contains `t`.
    ///
    /// A time shared by two slices belongs to the later one, except for the upper
    /// bound of the tube which belongs to the last slice.
    pub fn slice_index(&self, t: f64) -> Option<usize> {
        if !self.tdomain().contains(t) {
            return None;
        }
        let k = self.slices.partition_point(|s| s.tdomain.ub() <= t);
        Some(k.min(self.slices.len() - 1))
    }

    /// Enclosure of the tube at time `t`: the hull of the slices containing `t`.
    pub fn eval(&self, t: f64) -> Interval {
        self.slices
            .iter()
            .filter(|s| s.tdomain.contains(t))
            .fold(Interval::empty(), |acc, s| acc | s.codomain)
    }

    /// Hull of all slice codomains.
    pub fn codomain(&self) -> Interval {
        self.slices.iter().fold(Interval::empty(), |acc, s| acc | s.codomain)
    }

    /// Two tubes have the same slicing when their slice time domains coincide.
    pub fn same_slicing(&self, other: &Tube) -> bool {
        self.slices.len() == other.slices.len()
            && self.slices.iter().zip(&other.slices).all(|(a, b)| a.tdomain == b.tdomain)
    }

    /// A tube is empty as soon as one of its slices is.
    pub fn is_empty(&self) -> bool {
        self.slices.iter().any(|s| s.codomain.is_empty())
    }

    pub fn is_subset(&self, other: &Tube) -> bool {
        self.same_slicing(other)
            && self
                .slices
                .iter()
                .zip(&other.slices)
                .all(|(a, b)| a.codomain.is_subset(&b.codomain))
    }

    pub fn volume(&self) -> f64 {
        self.slices.iter().map(|s| s.volume()).sum()
    }

    pub fn intersect(&self, other: &Tube) -> Tube {
        assert!(self.same_slicing(other), "Tubes should share the same slicing");
        Tube {
            slices: self
                .slices
                .iter()
                .zip(&other.slices)
                .map(|(a, b)| Slice::new(a.tdomain, a.codomain & b.codomain))
                .collect(),
        }
    }
}

impl Display for Tube {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tube {}↦{}, {} slices",
            self.tdomain(),
            self.codomain(),
            self.slices.len()
        )
    }
}

/// Vector of tubes sharing the same slicing.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeVector {
    components: Vec<Tube>,
}

impl TubeVector {
    pub fn new(size: usize, tdomain: Interval, dt: f64, codomain: Interval) -> Self {
        assert!(size > 0, "Tube vector should have at least one component");
        Self {
            components: vec![Tube::new(tdomain, dt, codomain); size],
        }
    }

    pub fn from_tubes(components: Vec<Tube>) -> Self {
        assert!(!components.is_empty(), "Tube vector should have at least one component");
        for c in &components[1..] {
            assert!(components[0].same_slicing(c), "Components should share the same slicing");
        }
        Self { components }
    }

    pub fn size(&self) -> usize {
        self.components.len()
    }
    pub fn tdomain(&self) -> Interval {
        self.components[0].tdomain()
    }
    pub fn nb_slices(&self) -> usize {
        self.components[0].nb_slices()
    }

    pub fn component(&self, i: usize) -> &Tube {
        &self.components[i]
    }
    pub fn component_mut(&mut self, i: usize) -> &mut Tube {
        &mut self.components[i]
    }
    pub fn components(&self) -> &[Tube] {
        &self.components
    }

    pub fn eval(&self, t: f64) -> IntervalVector {
        self.components.iter().map(|c| c.eval(t)).collect()
    }

    pub fn same_slicing(&self, other: &TubeVector) -> bool {
        self.size() == other.size() && self.components[0].same_slicing(&other.components[0])
    }

    pub fn is_empty(&self) -> bool {
        self.components.iter().any(|c| c.is_empty())
    }

    pub fn is_subset(&self, other: &TubeVector) -> bool {
        self.size() == other.size() && self.components.iter().zip(&other.components).all(|(a, b)| a.is_subset(b))
    }

    pub fn volume(&self) -> f64 {
        self.components.iter().map(|c| c.volume()).sum()
    }

    pub fn intersect(&self, other: &TubeVector) -> TubeVector {
        assert_eq!(self.size(), other.size(), "Dimension mismatch");
        TubeVector {
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(a, b)| a.intersect(b))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_uniform_slicing() {
        let x = Tube::new(Interval::new(0.0, 5.0), 1.0, Interval::all_reals());
        assert_eq!(x.nb_slices(), 5);
        assert_eq!(x.slice(0).tdomain, Interval::new(0.0, 1.0));
        assert_eq!(x.slice(4).tdomain, Interval::new(4.0, 5.0));
        assert_eq!(x.tdomain(), Interval::new(0.0, 5.0));
    }

    #[test]
    fn test_last_slice_is_shorter() {
        let x = Tube::new(Interval::new(0.0, 2.5), 1.0, Interval::all_reals());
        assert_eq!(x.nb_slices(), 3);
        assert_eq!(x.slice(2).tdomain, Interval::new(2.0, 2.5));
    }

    #[test]
    fn test_slice_index() {
        let x = Tube::new(Interval::new(0.0, 5.0), 1.0, Interval::all_reals());
        assert_eq!(x.slice_index(0.0), Some(0));
        assert_eq!(x.slice_index(0.5), Some(0));
        assert_eq!(x.slice_index(1.0), Some(1));
        assert_eq!(x.slice_index(5.0), Some(4));
        assert_eq!(x.slice_index(5.5), None);
        assert_eq!(x.slice_index(-0.1), None);
    }

    #[test]
    fn test_eval_at_gate() {
        let mut x = Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::all_reals());
        x.slice_mut(0).codomain = Interval::new(0.0, 1.0);
        x.slice_mut(1).codomain = Interval::new(2.0, 3.0);
        assert_eq!(x.eval(0.5), Interval::new(0.0, 1.0));
        assert_eq!(x.eval(1.0), Interval::new(0.0, 3.0));
        assert_eq!(x.codomain(), Interval::new(0.0, 3.0));
    }

    #[test]
    fn test_intersect_keeps_slicing() {
        let a = Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::new(0.0, 2.0));
        let b = Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::new(1.0, 3.0));
        let c = a.intersect(&b);
        assert!(c.same_slicing(&a));
        assert_eq!(c.codomain(), Interval::new(1.0, 2.0));
        assert!(c.is_subset(&a));
        assert_eq!(c.volume(), 2.0);
    }

    #[test]
    fn test_tube_vector() {
        let x = TubeVector::new(2, Interval::new(0.0, 3.0), 1.0, Interval::new(-1.0, 1.0));
        assert_eq!(x.size(), 2);
        assert_eq!(x.nb_slices(), 3);
        assert_eq!(x.eval(0.5).len(), 2);
        assert_eq!(x.volume(), 12.0);
    }
}
