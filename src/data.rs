//! Incremental data injection on tubes.
//!
//! Samples `(t, y)` are recorded per tube, with strictly increasing `t`.
//! Between two samples the lower and upper bounds are linearly interpolated.
//! Once a slice lies inside the time range covered by the samples, its
//! codomain is constrained by the hull of the interpolated bounds over the
//! slice. That constraint is an observation binding on the slice domain.
//! Since times increase, the envelope of a slice is final once the slice is
//! covered: each slice gets exactly one observation, and each new sample only
//! visits the slices it completes.

use log::debug;

use crate::binding::{BindingKind, OBSERVATION};
use crate::error::{CnError, Result};
use crate::interval::Interval;
use crate::network::ContractorNetwork;
use crate::reference::DomainId;
use crate::value::{Kind, Value};

/// Samples recorded for one tube.
#[derive(Debug, Clone, Default)]
pub(crate) struct DataFeed {
    samples: Vec<(f64, Interval)>,
}

impl DataFeed {
    fn last_time(&self) -> Option<f64> {
        self.samples.last().map(|&(t, _)| t)
    }

    /// Time range covered by the samples.
    fn covered(&self) -> Option<Interval> {
        match (self.samples.first(), self.samples.last()) {
            (Some(&(t0, _)), Some(&(t1, _))) if self.samples.len() >= 2 => Some(Interval::new(t0, t1)),
            _ => None,
        }
    }

    /// Interpolated enclosure at time `t`, inside the covered range.
    fn interpolate(&self, t: f64) -> Interval {
        let i = self.samples.partition_point(|&(ti, _)| ti <= t);
        if i == 0 {
            return self.samples[0].1;
        }
        if i == self.samples.len() {
            return self.samples[i - 1].1;
        }
        let (t0, y0) = self.samples[i - 1];
        let (t1, y1) = self.samples[i];
        let lerp = |a: f64, b: f64, unbounded: f64| {
            if a == b {
                a
            } else if a.is_infinite() || b.is_infinite() {
                unbounded
            } else {
                (a * (t1 - t) + b * (t - t0)) / (t1 - t0)
            }
        };
        Interval::new(
            lerp(y0.lb(), y1.lb(), f64::NEG_INFINITY),
            lerp(y0.ub(), y1.ub(), f64::INFINITY),
        )
    }

    /// Hull of the interpolated enclosure over `tdomain`.
    fn envelope(&self, tdomain: Interval) -> Interval {
        let lo = self.samples.partition_point(|&(t, _)| t <= tdomain.lb());
        let hi = self.samples.partition_point(|&(t, _)| t < tdomain.ub()).max(lo);
        self.samples[lo..hi].iter().fold(
            self.interpolate(tdomain.lb()) | self.interpolate(tdomain.ub()),
            |acc, &(_, y)| acc | y,
        )
    }
}

impl ContractorNetwork {
    /// Add a measurement of `tube` at time `t`.
    ///
    /// `y` is an interval for a tube and an interval vector for a tube vector.
    /// Times must be strictly increasing for a given tube.
    pub fn add_data(&mut self, tube: DomainId, t: f64, y: impl Into<Value>) -> Result<()> {
        let y = y.into();
        if !t.is_finite() {
            return Err(CnError::construction(format!("invalid data time {}", t)));
        }

        match (self.store.kind(tube)?, &y) {
            (Kind::Tube, Value::Scalar(x)) => {
                self.check_time(tube, t)?;
                self.feed(tube, t, *x)
            }
            (Kind::TubeVector, Value::Vector(v)) => {
                let n = self.store.size(tube)?;
                if v.len() != n {
                    return Err(CnError::DimensionMismatch {
                        start: 0,
                        end: v.len().saturating_sub(1),
                        size: n,
                    });
                }
                let components = (0..n)
                    .map(|i| self.store.component(tube, i))
                    .collect::<Result<Vec<_>>>()?;
                for &c in &components {
                    self.check_time(c, t)?;
                }
                for (i, c) in components.into_iter().enumerate() {
                    self.feed(c, t, v[i])?;
                }
                Ok(())
            }
            (kind, y) => Err(CnError::construction(format!(
                "cannot add {} data to a {} domain",
                y.kind(),
                kind
            ))),
        }
    }

    fn check_time(&self, tube: DomainId, t: f64) -> Result<()> {
        match self.feeds.get(&tube).and_then(DataFeed::last_time) {
            Some(last) if t <= last => Err(CnError::construction(format!(
                "data on {} must have increasing times, got {} after {}",
                tube, t, last
            ))),
            _ => Ok(()),
        }
    }

    fn feed(&mut self, tube: DomainId, t: f64, y: Interval) -> Result<()> {
        let feed = self.feeds.entry(tube).or_default();
        let previous = feed.last_time();
        feed.samples.push((t, y));
        let (Some(previous), Some(covered)) = (previous, feed.covered()) else {
            return Ok(());
        };

        // Slices ending before the previous sample were complete already, so only
        // the slices ending in `(previous, t]` get a new observation.
        let store = &self.store;
        let slice_tdomain = |s: DomainId| store.slice_tdomain(s).unwrap_or_else(Interval::empty);
        let slices = store.node(tube).node.children();
        let start = slices.partition_point(|&s| slice_tdomain(s).ub() <= previous);
        let observed: Vec<(DomainId, Interval)> = slices[start..]
            .iter()
            .map(|&s| (s, slice_tdomain(s)))
            .take_while(|(_, tdomain)| tdomain.ub() <= t)
            .filter(|(_, tdomain)| tdomain.is_subset(&covered))
            .map(|(s, tdomain)| (s, feed.envelope(tdomain)))
            .collect();

        for (slice, envelope) in observed {
            self.observe(slice, envelope)?;
        }
        Ok(())
    }

    /// Constrain a newly completed `slice` by `envelope`.
    fn observe(&mut self, slice: DomainId, envelope: Interval) -> Result<()> {
        let b = self.register(BindingKind::Observation { envelope }, OBSERVATION, vec![slice])?;
        debug!("observation {} on slice {}: {}", b, slice, envelope);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::interval::IntervalVector;
    use crate::tube::{Tube, TubeVector};

    fn feed(samples: &[(f64, f64)]) -> DataFeed {
        DataFeed {
            samples: samples.iter().map(|&(t, y)| (t, Interval::point(y))).collect(),
        }
    }

    #[test]
    fn test_interpolate() {
        let f = feed(&[(1.5, 0.0), (4.5, -3.0)]);
        assert_eq!(f.interpolate(2.0), Interval::point(-0.5));
        assert_eq!(f.interpolate(1.5), Interval::point(0.0));
        assert_eq!(f.interpolate(4.5), Interval::point(-3.0));
        assert_eq!(f.envelope(Interval::new(2.0, 3.0)), Interval::new(-1.5, -0.5));
    }

    #[test]
    fn test_envelope_includes_inner_samples() {
        let f = feed(&[(4.0, 0.0), (4.5, -3.0), (5.5, 1.0)]);
        assert_eq!(f.envelope(Interval::new(4.0, 5.0)), Interval::new(-3.0, 0.0));
    }

    #[test]
    fn test_unbounded_samples() {
        let f = DataFeed {
            samples: vec![(0.0, Interval::new(0.0, 1.0)), (1.0, Interval::new(f64::NEG_INFINITY, 3.0))],
        };
        assert_eq!(f.interpolate(0.5), Interval::new(f64::NEG_INFINITY, 2.0));
    }

    #[test]
    fn test_add_data_slices_and_stack() {
        let mut cn = ContractorNetwork::new();
        let v = cn.create(Tube::new(Interval::new(0.0, 5.0), 1.0, Interval::all_reals()));

        for t in [0.0, 0.3, 0.4, 0.5, 0.99] {
            cn.add_data(v, t, Interval::point(0.0)).unwrap();
            assert_eq!(cn.nb_ctc_in_stack(), 0);
        }
        cn.add_data(v, 1.3, Interval::point(0.0)).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 1);
        cn.add_data(v, 1.5, Interval::point(0.0)).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 1);
        cn.add_data(v, 4.5, Interval::point(-3.0)).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 4);
        cn.add_data(v, 5.5, Interval::point(1.0)).unwrap();
        assert_eq!(cn.nb_ctc_in_stack(), 5);
        assert_eq!(cn.nb_ctc(), 5);

        cn.contract().unwrap();
        let x = cn.tube(v).unwrap();
        assert_eq!(x.slice(0).codomain, Interval::point(0.0));
        assert_eq!(x.slice(1).codomain, Interval::new(-0.5, 0.0));
        assert_eq!(x.slice(2).codomain, Interval::new(-1.5, -0.5));
        assert_eq!(x.slice(3).codomain, Interval::new(-2.5, -1.5));
        assert_eq!(x.slice(4).codomain, Interval::new(-3.0, -1.0));
    }

    #[test]
    fn test_one_observation_per_slice() {
        let mut cn = ContractorNetwork::new();
        let v = cn.create(Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::all_reals()));
        cn.add_data(v, 0.0, Interval::new(-1.0, 1.0)).unwrap();
        cn.add_data(v, 1.0, Interval::new(-1.0, 1.0)).unwrap();
        assert_eq!(cn.nb_ctc(), 1);
        cn.contract().unwrap();

        cn.add_data(v, 1.5, Interval::new(-1.0, 0.0)).unwrap();
        cn.add_data(v, 2.0, Interval::new(-1.0, 0.0)).unwrap();
        assert_eq!(cn.nb_ctc(), 2);
        cn.contract().unwrap();
        assert_eq!(cn.tube(v).unwrap().slice(1).codomain, Interval::new(-1.0, 1.0));
    }

    #[test]
    fn test_dense_data_on_long_tube() {
        let n = 1000;
        let mut cn = ContractorNetwork::new();
        let v = cn.create(Tube::new(Interval::new(0.0, n as f64), 1.0, Interval::all_reals()));

        // Four samples per slice, each one completes at most one slice.
        for i in 0..=4 * n {
            let t = i as f64 * 0.25;
            let before = cn.nb_ctc();
            cn.add_data(v, t, Interval::point(t)).unwrap();
            assert!(cn.nb_ctc() - before <= 1);
        }
        assert_eq!(cn.nb_ctc(), n);
        assert_eq!(cn.nb_ctc_in_stack(), n);

        cn.contract().unwrap();
        let x = cn.tube(v).unwrap();
        for k in [0, 1, n / 2, n - 1] {
            let k_f = k as f64;
            assert_eq!(x.slice(k).codomain, Interval::new(k_f, k_f + 1.0));
        }
    }

    #[test]
    fn test_envelope_of_degenerate_range() {
        let f = feed(&[(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
        assert_eq!(f.envelope(Interval::point(1.0)), Interval::point(2.0));
        assert_eq!(f.envelope(Interval::new(0.5, 1.5)), Interval::new(1.0, 2.0));
    }

    #[test]
    fn test_non_increasing_times() {
        let mut cn = ContractorNetwork::new();
        let v = cn.create(Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::all_reals()));
        cn.add_data(v, 1.0, 0.0).unwrap();
        assert!(matches!(cn.add_data(v, 1.0, 0.0), Err(CnError::Construction(_))));
        assert!(matches!(cn.add_data(v, 0.5, 0.0), Err(CnError::Construction(_))));
    }

    #[test]
    fn test_tube_vector_data() {
        let mut cn = ContractorNetwork::new();
        let x = cn.create(TubeVector::new(2, Interval::new(0.0, 1.0), 1.0, Interval::all_reals()));
        cn.add_data(x, 0.0, IntervalVector::point(&[0.0, 1.0])).unwrap();
        cn.add_data(x, 1.0, IntervalVector::point(&[1.0, 1.0])).unwrap();
        assert_eq!(cn.nb_ctc(), 2);
        cn.contract().unwrap();
        let value = cn.tube_vector(x).unwrap();
        assert_eq!(value.component(0).codomain(), Interval::new(0.0, 1.0));
        assert_eq!(value.component(1).codomain(), Interval::point(1.0));

        assert!(matches!(
            cn.add_data(x, 2.0, IntervalVector::point(&[0.0])),
            Err(CnError::DimensionMismatch { size: 2, .. })
        ));
    }

    #[test]
    fn test_data_on_scalar_fails() {
        let mut cn = ContractorNetwork::new();
        let x = cn.create(Interval::all_reals());
        assert!(matches!(cn.add_data(x, 0.0, 1.0), Err(CnError::Construction(_))));
    }
}
