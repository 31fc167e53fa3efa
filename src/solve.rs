//! Propagation: the worklist fixpoint loop.
//!
//! Pending bindings are popped in FIFO order. Each one is invoked on the
//! current values of its arguments and its output is intersected into the
//! domain store. Every leaf that changed enqueues the bindings registered on
//! it and on every composite containing it, except the binding that produced
//! the change. The loop ends when the queue is empty, or when the time budget
//! runs out. In that case the remaining queue is kept and the next call
//! resumes from it.
//!
//! # Fixpoint ratio
//!
//! With a ratio `r > 0`, a narrowed leaf only triggers its dependents when its
//! width dropped below `(1 - r)` times its width at the time it last
//! triggered them. A leaf that becomes empty, or whose reference width is
//! infinite, always triggers. With `r = 0` every change triggers and the loop
//! reaches the exact fixpoint.
//!
//! # Failures
//!
//! Each invocation is atomic: a contractor returning an error commits nothing.
//! The session stops and returns [`CnError::ContractorFailure`]. Narrowings
//! committed earlier in the session remain, and the failing binding is not
//! enqueued again.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use log::{info, trace, warn};

use crate::binding::BindingKind;
use crate::contractor::ContractorError;
use crate::domain::Assign;
use crate::error::{CnError, Result};
use crate::network::{ContractorNetwork, Stop};
use crate::reference::{BindingId, DomainId};
use crate::value::Value;

/// Report of one propagation session.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Contraction {
    /// Some domain was narrowed.
    pub changed: bool,
    /// Some domain became empty during the session.
    pub empty: bool,
    pub elapsed: Duration,
    /// Number of binding invocations.
    pub invocations: usize,
    /// Bindings still pending when the session ended.
    pub pending: usize,
}

impl Contraction {
    /// Whether the session stopped on its time budget before the fixpoint.
    pub fn suspended(&self) -> bool {
        self.pending > 0
    }
}

impl ContractorNetwork {
    /// Propagate until the fixpoint. Return whether some domain was narrowed.
    ///
    /// The configured [`max_duration`][crate::network::NetworkConfig::max_duration],
    /// if any, bounds the session.
    pub fn contract(&mut self) -> Result<bool> {
        let budget = self.config.max_duration;
        Ok(self.run(budget)?.changed)
    }

    /// Propagate for at most `budget`, then suspend.
    ///
    /// At least one pending binding is invoked per call, so repeated calls always
    /// make progress. The budget is checked between invocations only.
    pub fn contract_during(&mut self, budget: Duration) -> Result<Contraction> {
        self.run(Some(budget))
    }

    /// Replace the values of the seeded domains, then propagate.
    ///
    /// All seeds are checked before any is applied. Intermediate domains are left
    /// as they are; see [`reset_interm_vars`][Self::reset_interm_vars].
    pub fn contract_with<I, V>(&mut self, seed: I) -> Result<bool>
    where
        I: IntoIterator<Item = (DomainId, V)>,
        V: Into<Value>,
    {
        let seed: Vec<(DomainId, Value)> = seed.into_iter().map(|(id, v)| (id, v.into())).collect();
        for (id, v) in &seed {
            self.store.check_structure(*id, v)?;
        }
        for (id, v) in seed {
            self.set_value(id, v)?;
        }
        self.contract()
    }

    fn run(&mut self, budget: Option<Duration>) -> Result<Contraction> {
        let start = Instant::now();
        let mut report = Contraction::default();
        self.stop = Stop::Done;

        info!(
            "contracting: {} bindings, {} domains, {} pending",
            self.nb_ctc(),
            self.nb_dom(),
            self.queue.len()
        );

        while let Some(b) = self.queue.pop() {
            report.invocations += 1;
            let changed = match self.invoke(b) {
                Ok(changed) => changed,
                Err(e) => {
                    self.stop = Stop::Aborted(b);
                    warn!("propagation aborted after {} invocations: {}", report.invocations, e);
                    return Err(e);
                }
            };

            for leaf in changed {
                report.changed = true;
                if self.store.leaf_value(leaf).is_empty() {
                    report.empty = true;
                }
                if self.is_significant(leaf) {
                    self.enqueue_dependents(leaf, Some(b));
                }
            }

            if let Some(budget) = budget {
                if start.elapsed() >= budget && !self.queue.is_empty() {
                    self.stop = Stop::Suspended;
                    warn!("time budget of {:?} exhausted, {} bindings pending", budget, self.queue.len());
                    break;
                }
            }
        }

        report.elapsed = start.elapsed();
        report.pending = self.queue.len();
        if report.empty {
            warn!("propagation produced an empty domain");
        }
        info!(
            "contraction done: {} invocations, changed={}, {} pending, {:?}",
            report.invocations, report.changed, report.pending, report.elapsed
        );
        Ok(report)
    }

    /// Invoke one binding and commit its output. Return the leaves that changed.
    fn invoke(&mut self, b: BindingId) -> Result<Vec<DomainId>> {
        let binding = self.bindings.get(b.index()).ok_or(CnError::UnknownBinding(b))?;
        let kind = binding.kind.clone();
        let args = binding.args.clone();

        let mut values = args.iter().map(|&a| self.store.value(a)).collect::<Result<Vec<_>>>()?;
        trace!("invoking {} '{}' on {:?}", b, kind.name(), args);

        let failure = |source| CnError::ContractorFailure {
            binding: b,
            name: kind.name().to_string(),
            source,
        };

        match &kind {
            BindingKind::Contractor(ctc) => ctc.contract(&mut values).map_err(failure)?,
            BindingKind::Observation { envelope } => {
                for v in values.iter_mut() {
                    if let Value::Scalar(x) = v {
                        *x = *x & *envelope;
                    }
                }
            }
        }

        // Check every output before committing any of them.
        for (index, (&a, v)) in args.iter().zip(&values).enumerate() {
            if self.store.check_structure(a, v).is_err() {
                return Err(failure(ContractorError::StructureChanged { index }));
            }
        }

        let mut seen = HashSet::new();
        let mut changed = Vec::new();
        for (&a, v) in args.iter().zip(&values) {
            for leaf in self.store.assign(a, v, Assign::Narrow)? {
                if seen.insert(leaf) {
                    changed.push(leaf);
                }
            }
        }
        Ok(changed)
    }

    /// Whether the change of `leaf` since its last trigger is worth propagating.
    /// Updates the reference value when it is.
    fn is_significant(&mut self, leaf: DomainId) -> bool {
        let r = self.config.fixedpoint_ratio;
        let Some(l) = self.store.leaf_mut(leaf) else {
            return false;
        };
        let (old, new) = (l.reference, l.value);
        if old == new {
            return false;
        }
        let significant =
            r == 0.0 || new.is_empty() || old.volume().is_infinite() || new.volume() < (1.0 - r) * old.volume();
        if significant {
            l.reference = new;
        }
        significant
    }

    /// Enqueue the bindings on `leaf` and on all composites containing it.
    pub(crate) fn enqueue_dependents(&mut self, leaf: DomainId, except: Option<BindingId>) {
        let store = &self.store;
        let queue = &mut self.queue;
        for d in store.ancestors(leaf) {
            for &b in &store.node(d).bindings {
                if Some(b) != except {
                    queue.push(b);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use test_log::test;

    use super::*;
    use crate::contractor::Slot;
    use crate::ctc::{CtcAdd, CtcFn};
    use crate::interval::{Interval, IntervalVector};
    use crate::network::State;

    fn scenario_a() -> (ContractorNetwork, [DomainId; 3]) {
        let mut cn = ContractorNetwork::new();
        let a = cn.create(Interval::new(0.0, 1.0));
        let b = cn.create(Interval::new(-1.0, 1.0));
        let c = cn.create(Interval::new(1.5, 2.0));
        (cn, [a, b, c])
    }

    #[test]
    fn test_contract_sum() {
        let (mut cn, [a, b, c]) = scenario_a();
        let add = Rc::new(CtcAdd::new());
        cn.add(&add, [a, b, c]).unwrap();

        assert!(cn.contract().unwrap());
        assert_eq!(cn.scalar(a).unwrap(), Interval::new(0.5, 1.0));
        assert_eq!(cn.scalar(b).unwrap(), Interval::new(0.5, 1.0));
        assert_eq!(cn.scalar(c).unwrap(), Interval::new(1.5, 2.0));
        assert_eq!(cn.state(), State::Idle);

        assert!(!cn.contract().unwrap());
    }

    #[test]
    fn test_changes_trigger_other_bindings() {
        let mut cn = ContractorNetwork::new();
        // x + y = z, z + w = t
        let x = cn.create(Interval::new(0.0, 1.0));
        let y = cn.create(Interval::new(0.0, 1.0));
        let z = cn.create(Interval::all_reals());
        let w = cn.create(Interval::new(1.0, 1.0));
        let t = cn.create(Interval::all_reals());
        let add = Rc::new(CtcAdd::new());
        cn.add(&add, [z, w, t]).unwrap();
        cn.add(&add, [x, y, z]).unwrap();

        cn.contract().unwrap();
        assert_eq!(cn.scalar(z).unwrap(), Interval::new(0.0, 2.0));
        assert_eq!(cn.scalar(t).unwrap(), Interval::new(1.0, 3.0));
    }

    #[test]
    fn test_producer_is_not_requeued() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let halve = Rc::new(CtcFn::new("halve", vec![Slot::Scalar], move |values| {
            counter.set(counter.get() + 1);
            if let Value::Scalar(x) = &mut values[0] {
                *x = Interval::new(x.lb(), x.mid());
            }
            Ok(())
        }));

        let mut cn = ContractorNetwork::new();
        let x = cn.create(Interval::new(0.0, 8.0));
        cn.add(&halve, [x]).unwrap();
        cn.contract().unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(cn.scalar(x).unwrap(), Interval::new(0.0, 4.0));
    }

    #[test]
    fn test_contract_during_resumes() {
        let mut cn = ContractorNetwork::new();
        let add = Rc::new(CtcAdd::new());
        // Chain x[i] + 1 = x[i+1], x[0] = [0, 1].
        let one = cn.create(Interval::point(1.0));
        let mut xs = vec![cn.create(Interval::new(0.0, 1.0))];
        for _ in 0..50 {
            let next = cn.create(Interval::all_reals());
            cn.add(&add, [*xs.last().unwrap(), one, next]).unwrap();
            xs.push(next);
        }

        let report = cn.contract_during(Duration::ZERO).unwrap();
        assert_eq!(report.invocations, 1);
        assert!(report.changed);
        assert!(report.suspended());
        assert_eq!(cn.state(), State::Suspended);

        while cn.contract_during(Duration::ZERO).unwrap().suspended() {}
        assert_eq!(cn.state(), State::Idle);
        assert_eq!(cn.scalar(xs[50]).unwrap(), Interval::new(50.0, 51.0));
    }

    #[test]
    fn test_failure_is_atomic() {
        let fail = Rc::new(CtcFn::new("fail", vec![Slot::Scalar, Slot::Scalar], |values| {
            values[0] = Value::from(Interval::point(0.0));
            Err(ContractorError::Failed("boom".to_string()))
        }));

        let mut cn = ContractorNetwork::new();
        let x = cn.create(Interval::new(-1.0, 1.0));
        let y = cn.create(Interval::new(-1.0, 1.0));
        let b = cn.add(&fail, [x, y]).unwrap()[0];

        let err = cn.contract().unwrap_err();
        assert!(matches!(err, CnError::ContractorFailure { binding, .. } if binding == b));
        assert_eq!(cn.scalar(x).unwrap(), Interval::new(-1.0, 1.0));
        assert_eq!(cn.state(), State::Aborted(b));

        // Not retried automatically.
        assert!(!cn.contract().unwrap());
        assert_eq!(cn.state(), State::Idle);
    }

    #[test]
    fn test_structure_change_is_a_failure() {
        let bad = Rc::new(CtcFn::new("bad", vec![Slot::Any], |values| {
            values[0] = Value::from(IntervalVector::all_reals(2));
            Ok(())
        }));
        let mut cn = ContractorNetwork::new();
        let x = cn.create(Interval::new(-1.0, 1.0));
        cn.add(&bad, [x]).unwrap();
        assert!(matches!(
            cn.contract(),
            Err(CnError::ContractorFailure {
                source: ContractorError::StructureChanged { index: 0 },
                ..
            })
        ));
    }

    #[test]
    fn test_output_is_intersected() {
        let widen = Rc::new(CtcFn::new("widen", vec![Slot::Scalar], |values| {
            values[0] = Value::from(Interval::new(-10.0, 0.5));
            Ok(())
        }));
        let mut cn = ContractorNetwork::new();
        let x = cn.create(Interval::new(0.0, 1.0));
        cn.add(&widen, [x]).unwrap();
        cn.contract().unwrap();
        assert_eq!(cn.scalar(x).unwrap(), Interval::new(0.0, 0.5));
    }

    #[test]
    fn test_contract_with_seed() {
        let (mut cn, [a, b, c]) = scenario_a();
        let add = Rc::new(CtcAdd::new());
        cn.add(&add, [a, b, c]).unwrap();
        cn.contract().unwrap();

        let changed = cn
            .contract_with([
                (a, Interval::new(0.0, 1.0)),
                (b, Interval::new(0.0, 1.0)),
                (c, Interval::new(0.0, 0.5)),
            ])
            .unwrap();
        assert!(changed);
        assert_eq!(cn.scalar(a).unwrap(), Interval::new(0.0, 0.5));
        assert_eq!(cn.scalar(b).unwrap(), Interval::new(0.0, 0.5));
    }

    #[test]
    fn test_contract_with_bad_seed_applies_nothing() {
        let (mut cn, [a, b, c]) = scenario_a();
        let add = Rc::new(CtcAdd::new());
        cn.add(&add, [a, b, c]).unwrap();
        let seed = vec![
            (a, Value::from(Interval::new(0.0, 0.1))),
            (b, Value::from(IntervalVector::all_reals(2))),
        ];
        assert!(matches!(cn.contract_with(seed), Err(CnError::Construction(_))));
        assert_eq!(cn.scalar(a).unwrap(), Interval::new(0.0, 1.0));
    }

    #[test]
    fn test_ratio_skips_small_reductions() {
        let shrink = Rc::new(CtcFn::new("shrink", vec![Slot::Scalar], |values| {
            if let Value::Scalar(x) = &mut values[0] {
                *x = Interval::new(x.lb() + 0.01 * x.diam(), x.ub());
            }
            Ok(())
        }));
        let copy = Rc::new(crate::ctc::CtcEqual::new());

        let mut cn = ContractorNetwork::new();
        cn.set_fixedpoint_ratio(0.1);
        let x = cn.create(Interval::new(0.0, 1.0));
        let y = cn.create(Interval::new(0.0, 1.0));
        cn.add(&copy, [x, y]).unwrap();
        cn.add(&shrink, [x]).unwrap();

        cn.contract().unwrap();
        // The 1% reduction of x did not trigger the copy again.
        assert_eq!(cn.scalar(x).unwrap(), Interval::new(0.01, 1.0));
        assert_eq!(cn.scalar(y).unwrap(), Interval::new(0.0, 1.0));

        // At the exact fixpoint it does.
        cn.set_fixedpoint_ratio(0.0);
        cn.set_value(x, Interval::new(0.0, 1.0)).unwrap();
        cn.contract().unwrap();
        assert_eq!(cn.scalar(y).unwrap(), cn.scalar(x).unwrap());
    }
}
