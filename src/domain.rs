//! The domain store.
//!
//! All domains of a network live in one arena and are addressed by
//! [`DomainId`] handles. Scalar domains and tube slices are *leaves* holding an
//! [`Interval`]. Composite domains (vectors, matrices, tubes, tube vectors) hold
//! the ordered handles of their components. A composite value is therefore
//! always assembled from its leaves, and a write through any alias (the
//! composite, one of its components, or a sub-range view) is a write to the
//! same leaves.
//!
//! Every domain records its parents, so a change to a leaf can be traced to
//! every composite containing it.

use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::error::{CnError, Result};
use crate::interval::{Interval, IntervalMatrix, IntervalVector};
use crate::reference::{BindingId, DomainId};
use crate::tube::{Slice, Tube, TubeVector};
use crate::value::{Kind, Value};

/// Scalar storage cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Leaf {
    pub(crate) value: Interval,
    /// Value at the time the leaf last triggered its dependents.
    pub(crate) reference: Interval,
}

impl Leaf {
    fn new(value: Interval) -> Self {
        Self { value, reference: value }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Scalar(Leaf),
    Slice { tdomain: Interval, leaf: Leaf },
    Vector(Vec<DomainId>),
    Matrix { rows: usize, cols: usize, cells: Vec<DomainId> },
    Tube(Vec<DomainId>),
    TubeVector(Vec<DomainId>),
}

impl Node {
    pub(crate) fn kind(&self) -> Kind {
        match self {
            Node::Scalar(_) | Node::Slice { .. } => Kind::Scalar,
            Node::Vector(_) => Kind::Vector,
            Node::Matrix { .. } => Kind::Matrix,
            Node::Tube(_) => Kind::Tube,
            Node::TubeVector(_) => Kind::TubeVector,
        }
    }

    pub(crate) fn leaf(&self) -> Option<&Leaf> {
        match self {
            Node::Scalar(leaf) | Node::Slice { leaf, .. } => Some(leaf),
            _ => None,
        }
    }

    pub(crate) fn leaf_mut(&mut self) -> Option<&mut Leaf> {
        match self {
            Node::Scalar(leaf) | Node::Slice { leaf, .. } => Some(leaf),
            _ => None,
        }
    }

    /// Ordered component handles (empty for leaves).
    pub(crate) fn children(&self) -> &[DomainId] {
        match self {
            Node::Scalar(_) | Node::Slice { .. } => &[],
            Node::Vector(c) | Node::Tube(c) | Node::TubeVector(c) => c,
            Node::Matrix { cells, .. } => cells,
        }
    }
}

/// How a domain came to exist.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// Created from a caller value.
    External,
    /// Created by the intermediate-variable factory, with its initial value.
    Intermediate(Value),
    /// Interned literal.
    Constant,
    /// Component `index` of a composite domain.
    Component { parent: DomainId, index: usize },
    /// Sub-range `start..=end` of a composite domain.
    View { parent: DomainId, start: usize, end: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct Domain {
    pub(crate) node: Node,
    pub(crate) origin: Origin,
    pub(crate) name: Option<String>,
    pub(crate) parents: Vec<DomainId>,
    pub(crate) views: Vec<DomainId>,
    pub(crate) bindings: Vec<BindingId>,
}

impl Domain {
    fn new(node: Node, origin: Origin) -> Self {
        Self {
            node,
            origin,
            name: None,
            parents: Vec::new(),
            views: Vec::new(),
            bindings: Vec::new(),
        }
    }
}

/// Replacement policy for [`DomainStore::assign`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Assign {
    /// Intersect the current value with the new one. Never widens.
    Narrow,
    /// Overwrite the current value. May widen.
    Replace,
}

#[derive(Debug, Clone, Default)]
pub struct DomainStore {
    domains: Vec<Domain>,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of domains, components and views included.
    pub fn len(&self) -> usize {
        self.domains.len()
    }
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn contains(&self, id: DomainId) -> bool {
        id.index() < self.domains.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = DomainId> {
        (0..self.domains.len() as u32).map(DomainId::new)
    }

    pub(crate) fn get(&self, id: DomainId) -> Result<&Domain> {
        self.domains.get(id.index()).ok_or(CnError::UnknownDomain(id))
    }

    pub(crate) fn get_mut(&mut self, id: DomainId) -> Result<&mut Domain> {
        self.domains.get_mut(id.index()).ok_or(CnError::UnknownDomain(id))
    }

    /// Access a domain known to exist (internal links only).
    pub(crate) fn node(&self, id: DomainId) -> &Domain {
        &self.domains[id.index()]
    }

    fn node_mut(&mut self, id: DomainId) -> &mut Domain {
        &mut self.domains[id.index()]
    }

    fn push(&mut self, node: Node, origin: Origin) -> DomainId {
        let id = DomainId::new(self.domains.len() as u32);
        self.domains.push(Domain::new(node, origin));
        id
    }

    /// Create a composite from already created children and link them to it.
    fn adopt(&mut self, node: Node, origin: Origin) -> DomainId {
        let children = node.children().to_vec();
        let id = self.push(node, origin);
        for (index, child) in children.into_iter().enumerate() {
            let c = self.node_mut(child);
            c.parents.push(id);
            if c.origin == Origin::External {
                c.origin = Origin::Component { parent: id, index };
            }
        }
        id
    }

    fn create_tube(&mut self, tube: &Tube, origin: Origin) -> DomainId {
        let slices: Vec<DomainId> = tube
            .slices()
            .iter()
            .map(|s| {
                self.push(
                    Node::Slice {
                        tdomain: s.tdomain,
                        leaf: Leaf::new(s.codomain),
                    },
                    Origin::External,
                )
            })
            .collect();
        self.adopt(Node::Tube(slices), origin)
    }

    fn create_scalars(&mut self, xs: &[Interval]) -> Vec<DomainId> {
        xs.iter()
            .map(|&x| self.push(Node::Scalar(Leaf::new(x)), Origin::External))
            .collect()
    }

    /// Create a domain holding `value`, with one domain per component.
    pub fn create(&mut self, value: &Value, origin: Origin) -> DomainId {
        let id = match value {
            Value::Scalar(x) => self.push(Node::Scalar(Leaf::new(*x)), origin),
            Value::Vector(v) => {
                let children = self.create_scalars(v.as_slice());
                self.adopt(Node::Vector(children), origin)
            }
            Value::Matrix(m) => {
                let cells = self.create_scalars(m.as_slice());
                self.adopt(
                    Node::Matrix {
                        rows: m.rows(),
                        cols: m.cols(),
                        cells,
                    },
                    origin,
                )
            }
            Value::Tube(x) => self.create_tube(x, origin),
            Value::TubeVector(x) => {
                let tubes: Vec<DomainId> = x
                    .components()
                    .iter()
                    .map(|c| self.create_tube(c, Origin::External))
                    .collect();
                self.adopt(Node::TubeVector(tubes), origin)
            }
        };
        debug!("created {} domain {} ({} domains)", value.kind(), id, self.len());
        id
    }

    pub fn kind(&self, id: DomainId) -> Result<Kind> {
        Ok(self.get(id)?.node.kind())
    }

    /// Number of components of a composite domain (`1` for scalars).
    pub fn size(&self, id: DomainId) -> Result<usize> {
        let d = self.get(id)?;
        Ok(match &d.node {
            Node::Scalar(_) | Node::Slice { .. } => 1,
            node => node.children().len(),
        })
    }

    /// Time domain of a tube slice.
    pub fn slice_tdomain(&self, id: DomainId) -> Option<Interval> {
        match &self.get(id).ok()?.node {
            Node::Slice { tdomain, .. } => Some(*tdomain),
            _ => None,
        }
    }

    /// Component `index` of a composite: vector item, matrix cell (row-major),
    /// tube slice or tube vector component.
    pub fn component(&self, id: DomainId, index: usize) -> Result<DomainId> {
        let d = self.get(id)?;
        if d.node.leaf().is_some() {
            return Err(CnError::construction(format!("scalar domain {} has no components", id)));
        }
        let children = d.node.children();
        children.get(index).copied().ok_or(CnError::DimensionMismatch {
            start: index,
            end: index,
            size: children.len(),
        })
    }

    /// Create (or reuse) a domain aliasing components `start..=end` of a vector,
    /// tube or tube vector.
    pub fn view_subrange(&mut self, id: DomainId, start: usize, end: usize) -> Result<DomainId> {
        let d = self.get(id)?;
        let children = match &d.node {
            Node::Vector(c) | Node::Tube(c) | Node::TubeVector(c) => c,
            node => {
                return Err(CnError::construction(format!(
                    "cannot take a sub-range of a {} domain",
                    node.kind()
                )))
            }
        };
        let size = children.len();
        if start > end || end >= size {
            return Err(CnError::DimensionMismatch { start, end, size });
        }

        let existing = d.views.iter().copied().find(|&v| {
            matches!(self.node(v).origin, Origin::View { start: s, end: e, .. } if s == start && e == end)
        });
        if let Some(v) = existing {
            return Ok(v);
        }

        let range = children[start..=end].to_vec();
        let node = match &d.node {
            Node::Vector(_) => Node::Vector(range),
            Node::Tube(_) => Node::Tube(range),
            _ => Node::TubeVector(range),
        };
        let view = self.adopt(node, Origin::View { parent: id, start, end });
        self.node_mut(id).views.push(view);
        debug!("created view {} of {} on {}..={}", view, id, start, end);
        Ok(view)
    }

    pub(crate) fn leaf_value(&self, id: DomainId) -> Interval {
        self.node(id).node.leaf().map_or(Interval::empty(), |l| l.value)
    }

    pub(crate) fn leaf_mut(&mut self, id: DomainId) -> Option<&mut Leaf> {
        self.node_mut(id).node.leaf_mut()
    }

    fn tube_value(&self, slices: &[DomainId]) -> Tube {
        Tube::from_slices(
            slices
                .iter()
                .map(|&s| match &self.node(s).node {
                    Node::Slice { tdomain, leaf } => Slice::new(*tdomain, leaf.value),
                    _ => unreachable!("tube components are slices"),
                })
                .collect(),
        )
    }

    /// Current value of a domain, assembled from its leaves.
    pub fn value(&self, id: DomainId) -> Result<Value> {
        let d = self.get(id)?;
        let v = match &d.node {
            Node::Scalar(leaf) | Node::Slice { leaf, .. } => Value::Scalar(leaf.value),
            Node::Vector(c) => Value::Vector(c.iter().map(|&x| self.leaf_value(x)).collect::<IntervalVector>()),
            Node::Matrix { rows, cols, cells } => Value::Matrix(IntervalMatrix::from_rows(
                *rows,
                *cols,
                cells.iter().map(|&x| self.leaf_value(x)).collect(),
            )),
            Node::Tube(c) => Value::Tube(self.tube_value(c)),
            Node::TubeVector(c) => Value::TubeVector(TubeVector::from_tubes(
                c.iter().map(|&t| self.tube_value(self.node(t).node.children())).collect(),
            )),
        };
        Ok(v)
    }

    /// Leaf handles of a domain, in the order of [`Value::leaves`].
    pub fn leaves(&self, id: DomainId) -> Result<Vec<DomainId>> {
        let d = self.get(id)?;
        let mut out = Vec::new();
        self.collect_leaves(&d.node, id, &mut out);
        Ok(out)
    }

    fn collect_leaves(&self, node: &Node, id: DomainId, out: &mut Vec<DomainId>) {
        if node.leaf().is_some() {
            out.push(id);
            return;
        }
        for &c in node.children() {
            self.collect_leaves(&self.node(c).node, c, out);
        }
    }

    /// Check that `value` can be written into domain `id`.
    pub fn check_structure(&self, id: DomainId, value: &Value) -> Result<()> {
        let current = self.value(id)?;
        if !current.same_structure(value) {
            return Err(CnError::construction(format!(
                "domain {} is a {} with {} components, got a {} with {} components",
                id,
                current.kind(),
                current.len(),
                value.kind(),
                value.len()
            )));
        }
        Ok(())
    }

    /// Write `value` into domain `id` and return the leaves whose value changed.
    pub fn assign(&mut self, id: DomainId, value: &Value, mode: Assign) -> Result<Vec<DomainId>> {
        self.check_structure(id, value)?;
        let leaves = self.leaves(id)?;
        let mut changed = Vec::new();
        for (leaf_id, x) in leaves.into_iter().zip(value.leaves()) {
            if let Some(leaf) = self.leaf_mut(leaf_id) {
                let y = match mode {
                    Assign::Narrow => leaf.value & x,
                    Assign::Replace => x,
                };
                if y != leaf.value {
                    leaf.value = y;
                    changed.push(leaf_id);
                }
            }
        }
        Ok(changed)
    }

    /// The domain itself followed by all its transitive parents (breadth-first, no duplicates).
    pub fn ancestors(&self, id: DomainId) -> Vec<DomainId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();
        while let Some(x) = queue.pop_front() {
            if !seen.insert(x) {
                continue;
            }
            out.push(x);
            queue.extend(self.node(x).parents.iter().copied());
        }
        out
    }
}
