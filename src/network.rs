//! The contractor network manager.
//!
//! [`ContractorNetwork`] owns every domain and every binding. Callers create
//! domains from values, register contractors on domain handles, then run the
//! propagation with [`contract`][ContractorNetwork::contract] and its variants
//! (see the [`solve`][crate::solve] module). Values are read back through
//! [`value`][ContractorNetwork::value].
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use cn_rs::ctc::CtcAdd;
//! use cn_rs::interval::Interval;
//! use cn_rs::network::ContractorNetwork;
//!
//! let mut cn = ContractorNetwork::default();
//! let a = cn.create(Interval::new(0.0, 1.0));
//! let b = cn.create(Interval::new(-1.0, 1.0));
//! let c = cn.create(Interval::new(1.5, 2.0));
//!
//! let add = Rc::new(CtcAdd::new());
//! cn.add(&add, [a, b, c]).unwrap();
//! cn.contract().unwrap();
//!
//! assert_eq!(cn.scalar(a).unwrap(), Interval::new(0.5, 1.0));
//! ```

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::debug;

use crate::binding::{contractor_identity, Binding, BindingKey, BindingKind};
use crate::contractor::{Contractor, Slot};
use crate::data::DataFeed;
use crate::domain::{Assign, DomainStore, Origin};
use crate::error::{CnError, Result};
use crate::interval::{Interval, IntervalMatrix, IntervalVector};
use crate::queue::WorkQueue;
use crate::reference::{BindingId, DomainId, NodeRef};
use crate::table::Table;
use crate::tube::{Tube, TubeVector};
use crate::value::{Kind, Shape, Value};

/// Configuration of a [`ContractorNetwork`].
///
/// ```
/// use std::time::Duration;
///
/// use cn_rs::network::{ContractorNetwork, NetworkConfig};
///
/// let config = NetworkConfig::default()
///     .with_fixedpoint_ratio(0.01)
///     .with_max_duration(Some(Duration::from_millis(50)));
/// let cn = ContractorNetwork::with_config(config);
/// assert_eq!(cn.fixedpoint_ratio(), 0.01);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Relative volume reduction below which a narrowed leaf does not trigger
    /// its dependents. `0` runs to the exact fixpoint.
    pub fixedpoint_ratio: f64,
    /// Default time budget of [`ContractorNetwork::contract`].
    pub max_duration: Option<Duration>,
    /// Initial number of buckets (log2) of the binding dedup table.
    pub table_bits: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fixedpoint_ratio: 0.0,
            max_duration: None,
            table_bits: 10,
        }
    }
}

impl NetworkConfig {
    pub fn with_fixedpoint_ratio(mut self, r: f64) -> Self {
        assert!((0.0..=1.0).contains(&r), "Fixpoint ratio should be in the range [0, 1]");
        self.fixedpoint_ratio = r;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_table_bits(mut self, bits: usize) -> Self {
        assert!(bits <= 31, "Table bits should be in the range 0..=31");
        self.table_bits = bits;
        self
    }
}

/// Argument of [`ContractorNetwork::add`]: an existing domain or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Domain(DomainId),
    /// Degenerate scalar. Equal literals share one constant domain.
    Point(f64),
    /// Degenerate vector. Equal literals share one constant domain.
    Points(Vec<f64>),
    /// Arbitrary value, always wrapped into a fresh domain.
    Value(Value),
}

impl From<DomainId> for Arg {
    fn from(id: DomainId) -> Self {
        Arg::Domain(id)
    }
}

impl From<&DomainId> for Arg {
    fn from(id: &DomainId) -> Self {
        Arg::Domain(*id)
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Arg::Point(x)
    }
}

impl From<Vec<f64>> for Arg {
    fn from(v: Vec<f64>) -> Self {
        Arg::Points(v)
    }
}

impl From<Interval> for Arg {
    fn from(x: Interval) -> Self {
        Arg::Value(Value::Scalar(x))
    }
}

impl From<IntervalVector> for Arg {
    fn from(v: IntervalVector) -> Self {
        Arg::Value(Value::Vector(v))
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum ConstKey {
    Point(u64),
    Points(Vec<u64>),
}

fn float_key(x: f64) -> u64 {
    // `-0.0 + 0.0` is `+0.0`, so both zeros share a key.
    (x + 0.0).to_bits()
}

/// How the arguments of one `add` call map to bindings.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Expansion {
    Direct,
    /// One binding per vector component and per tube slice, components outermost.
    Grid { components: usize, slices: usize },
}

/// Outcome of the last propagation session.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub(crate) enum Stop {
    #[default]
    Done,
    Suspended,
    Aborted(BindingId),
}

/// Scheduler state as seen between calls.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum State {
    /// Nothing pending.
    Idle,
    /// Bindings pending, no session interrupted.
    Queued,
    /// The last session ran out of time with bindings pending.
    Suspended,
    /// The last session stopped on a contractor failure.
    Aborted(BindingId),
}

#[derive(Debug)]
pub struct ContractorNetwork {
    pub(crate) config: NetworkConfig,
    pub(crate) store: DomainStore,
    pub(crate) bindings: Vec<Binding>,
    keys: Table<BindingKey>,
    pub(crate) queue: WorkQueue,
    constants: HashMap<ConstKey, DomainId>,
    pub(crate) feeds: HashMap<DomainId, DataFeed>,
    pub(crate) stop: Stop,
}

impl Default for ContractorNetwork {
    fn default() -> Self {
        Self::with_config(NetworkConfig::default())
    }
}

impl ContractorNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NetworkConfig) -> Self {
        let keys = Table::new(config.table_bits);
        Self {
            config,
            store: DomainStore::new(),
            bindings: Vec::new(),
            keys,
            queue: WorkQueue::new(),
            constants: HashMap::new(),
            feeds: HashMap::new(),
            stop: Stop::Done,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn fixedpoint_ratio(&self) -> f64 {
        self.config.fixedpoint_ratio
    }

    /// Set the fixpoint ratio: `0` for the exact fixpoint, larger values stop earlier.
    pub fn set_fixedpoint_ratio(&mut self, r: f64) {
        assert!((0.0..=1.0).contains(&r), "Fixpoint ratio should be in the range [0, 1]");
        self.config.fixedpoint_ratio = r;
    }

    pub fn store(&self) -> &DomainStore {
        &self.store
    }

    /// Number of domains, components and views included.
    pub fn nb_dom(&self) -> usize {
        self.store.len()
    }

    /// Number of bindings.
    pub fn nb_ctc(&self) -> usize {
        self.bindings.len()
    }

    /// Number of bindings waiting to be invoked.
    pub fn nb_ctc_in_stack(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self) -> State {
        match (self.stop, self.queue.is_empty()) {
            (Stop::Aborted(b), _) => State::Aborted(b),
            (_, true) => State::Idle,
            (Stop::Suspended, false) => State::Suspended,
            (Stop::Done, false) => State::Queued,
        }
    }

    // ─── Domains ───

    /// Create a domain holding `value`.
    pub fn create(&mut self, value: impl Into<Value>) -> DomainId {
        self.store.create(&value.into(), Origin::External)
    }

    /// Create an intermediate domain holding the full enclosure of `shape`.
    pub fn create_intermediate(&mut self, shape: Shape) -> DomainId {
        self.create_intermediate_with(Value::full(&shape))
    }

    /// Create an intermediate domain with a chosen initial value.
    ///
    /// [`reset_interm_vars`][Self::reset_interm_vars] restores that value.
    pub fn create_intermediate_with(&mut self, value: impl Into<Value>) -> DomainId {
        let value = value.into();
        self.store.create(&value, Origin::Intermediate(value.clone()))
    }

    /// Domain aliasing components `start..=end` of a vector domain.
    pub fn subvector(&mut self, id: DomainId, start: usize, end: usize) -> Result<DomainId> {
        if self.store.kind(id)? != Kind::Vector {
            return Err(CnError::construction(format!("subvector of a non-vector domain {}", id)));
        }
        self.store.view_subrange(id, start, end)
    }

    /// Domain aliasing components `start..=end` of a vector, tube or tube vector domain.
    pub fn view_subrange(&mut self, id: DomainId, start: usize, end: usize) -> Result<DomainId> {
        self.store.view_subrange(id, start, end)
    }

    /// Component `index` of a composite domain (vector item, matrix cell, tube slice, tube).
    pub fn component(&self, id: DomainId, index: usize) -> Result<DomainId> {
        self.store.component(id, index)
    }

    /// Slice `k` of a tube domain.
    pub fn slice(&self, tube: DomainId, k: usize) -> Result<DomainId> {
        if self.store.kind(tube)? != Kind::Tube {
            return Err(CnError::construction(format!("domain {} is not a tube", tube)));
        }
        self.store.component(tube, k)
    }

    pub fn kind(&self, id: DomainId) -> Result<Kind> {
        self.store.kind(id)
    }

    pub fn value(&self, id: DomainId) -> Result<Value> {
        self.store.value(id)
    }

    pub fn scalar(&self, id: DomainId) -> Result<Interval> {
        self.expect_kind(id, Kind::Scalar)?;
        Ok(self.store.leaf_value(id))
    }

    pub fn vector(&self, id: DomainId) -> Result<IntervalVector> {
        self.expect_kind(id, Kind::Vector)?;
        match self.store.value(id)? {
            Value::Vector(v) => Ok(v),
            _ => unreachable!(),
        }
    }

    pub fn matrix(&self, id: DomainId) -> Result<IntervalMatrix> {
        self.expect_kind(id, Kind::Matrix)?;
        match self.store.value(id)? {
            Value::Matrix(m) => Ok(m),
            _ => unreachable!(),
        }
    }

    pub fn tube(&self, id: DomainId) -> Result<Tube> {
        self.expect_kind(id, Kind::Tube)?;
        match self.store.value(id)? {
            Value::Tube(x) => Ok(x),
            _ => unreachable!(),
        }
    }

    pub fn tube_vector(&self, id: DomainId) -> Result<TubeVector> {
        self.expect_kind(id, Kind::TubeVector)?;
        match self.store.value(id)? {
            Value::TubeVector(x) => Ok(x),
            _ => unreachable!(),
        }
    }

    fn expect_kind(&self, id: DomainId, kind: Kind) -> Result<()> {
        let actual = self.store.kind(id)?;
        if actual != kind {
            return Err(CnError::construction(format!("domain {} is a {}, not a {}", id, actual, kind)));
        }
        Ok(())
    }

    /// Replace the value of a domain from outside the engine. The new value may be wider.
    ///
    /// Bindings depending on the changed components are enqueued.
    pub fn set_value(&mut self, id: DomainId, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let changed = self.store.assign(id, &value, Assign::Replace)?;
        for &leaf in &changed {
            if let Some(l) = self.store.leaf_mut(leaf) {
                l.reference = l.value;
            }
            self.enqueue_dependents(leaf, None);
        }
        Ok(!changed.is_empty())
    }

    /// Restore every intermediate domain to its initial value and enqueue all bindings.
    pub fn reset_interm_vars(&mut self) -> Result<()> {
        let initial: Vec<(DomainId, Value)> = self
            .store
            .ids()
            .filter_map(|id| match &self.store.node(id).origin {
                Origin::Intermediate(v) => Some((id, v.clone())),
                _ => None,
            })
            .collect();
        debug!("resetting {} intermediate domains", initial.len());
        for (id, v) in initial {
            self.set_value(id, v)?;
        }
        self.trigger_all_contractors();
        Ok(())
    }

    /// Enqueue every binding.
    pub fn trigger_all_contractors(&mut self) {
        for i in 0..self.bindings.len() {
            self.queue.push(BindingId::new(i as u32));
        }
    }

    /// Whether some domain is empty, i.e. the network is proven infeasible.
    pub fn emptiness(&self) -> bool {
        self.store
            .ids()
            .any(|id| self.store.node(id).node.leaf().is_some_and(|l| l.value.is_empty()))
    }

    // ─── Names ───

    /// Attach a diagnostic name to a domain or a binding.
    pub fn set_name(&mut self, node: impl Into<NodeRef>, name: impl Into<String>) -> Result<()> {
        match node.into() {
            NodeRef::Domain(id) => self.store.get_mut(id)?.name = Some(name.into()),
            NodeRef::Binding(b) => {
                self.bindings.get_mut(b.index()).ok_or(CnError::UnknownBinding(b))?.name = Some(name.into())
            }
        }
        Ok(())
    }

    pub fn name(&self, node: impl Into<NodeRef>) -> Option<&str> {
        match node.into() {
            NodeRef::Domain(id) => self.store.get(id).ok()?.name.as_deref(),
            NodeRef::Binding(b) => self.bindings.get(b.index())?.name.as_deref(),
        }
    }

    // ─── Bindings ───

    /// Register `ctc` on `args` and return the resulting bindings.
    ///
    /// Arguments are checked against the contractor signature. A contractor over
    /// scalars also accepts:
    /// - scalars and tubes with the same slicing, giving one binding per slice;
    /// - vectors of the same size, giving one binding per component.
    ///
    /// Registering the same contractor instance on the same arguments again returns
    /// the existing binding and leaves the network untouched.
    pub fn add<C, I>(&mut self, ctc: &Rc<C>, args: I) -> Result<Vec<BindingId>>
    where
        C: Contractor + 'static,
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let identity = contractor_identity(ctc);
        let ctc: Rc<dyn Contractor> = ctc.clone();
        let args: Vec<Arg> = args.into_iter().map(Into::into).collect();

        if args.is_empty() {
            return Err(CnError::construction(format!(
                "contractor '{}' added without domains",
                ctc.name()
            )));
        }
        let signature = ctc.signature();
        if signature.len() != args.len() {
            return Err(CnError::construction(format!(
                "contractor '{}' expects {} arguments, got {}",
                ctc.name(),
                signature.len(),
                args.len()
            )));
        }

        let values = args.iter().map(|a| self.arg_value(a)).collect::<Result<Vec<_>>>()?;
        let expansion = self.expansion(ctc.as_ref(), &values)?;
        let ids: Vec<DomainId> = args.into_iter().map(|a| self.resolve(a)).collect();

        let tuples = match expansion {
            Expansion::Direct => vec![ids],
            Expansion::Grid { components, slices } => {
                let mut tuples = Vec::with_capacity(components * slices);
                for i in 0..components {
                    for k in 0..slices {
                        let tuple = ids
                            .iter()
                            .map(|&id| self.grid_cell(id, i, k))
                            .collect::<Result<Vec<_>>>()?;
                        tuples.push(tuple);
                    }
                }
                debug!(
                    "contractor '{}' expanded into {} bindings ({} components, {} slices)",
                    ctc.name(),
                    tuples.len(),
                    components,
                    slices
                );
                tuples
            }
        };

        tuples
            .into_iter()
            .map(|args| self.register(BindingKind::Contractor(ctc.clone()), identity, args))
            .collect()
    }

    fn arg_value(&self, arg: &Arg) -> Result<Value> {
        Ok(match arg {
            Arg::Domain(id) => self.store.value(*id)?,
            Arg::Point(x) => Value::from(*x),
            Arg::Points(v) => Value::from(IntervalVector::point(v)),
            Arg::Value(v) => v.clone(),
        })
    }

    /// Scalar domain standing for argument `id` in component `i`, slice `k`.
    fn grid_cell(&self, id: DomainId, i: usize, k: usize) -> Result<DomainId> {
        match self.store.kind(id)? {
            Kind::Tube => self.store.component(id, k),
            Kind::Vector => self.store.component(id, i),
            Kind::TubeVector => self.store.component(self.store.component(id, i)?, k),
            _ => Ok(id),
        }
    }

    fn expansion(&self, ctc: &dyn Contractor, values: &[Value]) -> Result<Expansion> {
        let signature = ctc.signature();
        if signature.iter().zip(values).all(|(s, v)| s.accepts(v)) {
            return Ok(Expansion::Direct);
        }
        let fail = |msg: String| Err(CnError::construction(format!("contractor '{}' {}", ctc.name(), msg)));

        let expandable = signature.iter().all(|s| *s == Slot::Scalar)
            && values
                .iter()
                .all(|v| matches!(v.kind(), Kind::Scalar | Kind::Vector | Kind::Tube | Kind::TubeVector));
        if !expandable {
            return self.signature_mismatch(ctc, values);
        }

        // Vectors and tube vectors are split per component and must agree on the size.
        let arrays: Vec<&Value> = values
            .iter()
            .filter(|v| matches!(v.kind(), Kind::Vector | Kind::TubeVector))
            .collect();
        let components = match arrays.first() {
            None => 1,
            Some(first) => {
                let n = first.len();
                if arrays.iter().any(|v| v.len() != n) {
                    return fail("applied on vectors of different sizes".to_string());
                }
                if values.iter().any(|v| matches!(v.kind(), Kind::Scalar | Kind::Tube)) {
                    return fail("applied on vectors mixed with scalars or tubes".to_string());
                }
                if n == 0 {
                    return fail("applied on vectors of size 0".to_string());
                }
                n
            }
        };

        // Tubes and tube vector components are split per slice and must share the slicing.
        let tubes: Vec<&Tube> = values
            .iter()
            .flat_map(|v| match v {
                Value::Tube(x) => std::slice::from_ref(x),
                Value::TubeVector(x) => x.components(),
                _ => &[],
            })
            .collect();
        let slices = match tubes.first() {
            None => 1,
            Some(first) => {
                if tubes.iter().any(|t| !t.same_slicing(first)) {
                    return fail("applied on tubes with different slicing".to_string());
                }
                first.nb_slices()
            }
        };

        Ok(Expansion::Grid { components, slices })
    }

    fn signature_mismatch(&self, ctc: &dyn Contractor, values: &[Value]) -> Result<Expansion> {
        let signature = ctc.signature();
        let (index, slot, value) = signature
            .iter()
            .zip(values)
            .enumerate()
            .find(|(_, (s, v))| !s.accepts(v))
            .map(|(i, (s, v))| (i, *s, v))
            .unwrap_or((0, signature[0], &values[0]));
        Err(CnError::construction(format!(
            "argument {} of contractor '{}': expected {}, got {} of size {}",
            index,
            ctc.name(),
            slot,
            value.kind(),
            value.len()
        )))
    }

    fn resolve(&mut self, arg: Arg) -> DomainId {
        match arg {
            Arg::Domain(id) => id,
            Arg::Point(x) => self.constant(ConstKey::Point(float_key(x)), Value::from(x)),
            Arg::Points(v) => {
                let key = ConstKey::Points(v.iter().copied().map(float_key).collect());
                self.constant(key, Value::from(IntervalVector::point(&v)))
            }
            Arg::Value(v) => self.store.create(&v, Origin::External),
        }
    }

    fn constant(&mut self, key: ConstKey, value: Value) -> DomainId {
        if let Some(&id) = self.constants.get(&key) {
            return id;
        }
        let id = self.store.create(&value, Origin::Constant);
        self.constants.insert(key, id);
        id
    }

    /// Insert a binding unless an identical one exists; new bindings are enqueued.
    pub(crate) fn register(&mut self, kind: BindingKind, identity: usize, args: Vec<DomainId>) -> Result<BindingId> {
        let key = BindingKey {
            ctc: identity,
            args: args.clone(),
        };
        if let Some(index) = self.keys.find(&key) {
            let id = BindingId::from_table_index(index);
            debug!("binding {} '{}' already registered", id, kind.name());
            return Ok(id);
        }
        for &a in &args {
            self.store.get(a)?;
        }

        let id = BindingId::from_table_index(self.keys.put(key));
        assert_eq!(id.index(), self.bindings.len());
        for &a in &args {
            let d = self.store.get_mut(a)?;
            if !d.bindings.contains(&id) {
                d.bindings.push(id);
            }
        }
        debug!("new binding {} '{}' on {:?}", id, kind.name(), args);
        self.bindings.push(Binding { kind, args, name: None });
        self.queue.push(id);
        Ok(id)
    }

    /// Arguments of a binding.
    pub fn binding_args(&self, b: BindingId) -> Result<&[DomainId]> {
        Ok(&self.bindings.get(b.index()).ok_or(CnError::UnknownBinding(b))?.args)
    }

    /// Bindings registered directly on a domain.
    pub fn bindings_of(&self, id: DomainId) -> Result<&[BindingId]> {
        Ok(&self.store.get(id)?.bindings)
    }
}
