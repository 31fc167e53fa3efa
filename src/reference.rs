use std::fmt::{Display, Formatter};

/// Handle to a domain stored in a network.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct DomainId(u32);

impl DomainId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Return the index of the domain in the store.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for DomainId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Handle to a contractor binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct BindingId(u32);

impl BindingId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Binding stored at `index` in the dedup table, where `0` is reserved.
    pub(crate) const fn from_table_index(index: usize) -> Self {
        Self((index - 1) as u32)
    }
}

impl Display for BindingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Either a domain or a binding, for operations accepting both (e.g. naming).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeRef {
    Domain(DomainId),
    Binding(BindingId),
}

impl From<DomainId> for NodeRef {
    fn from(id: DomainId) -> Self {
        NodeRef::Domain(id)
    }
}

impl From<BindingId> for NodeRef {
    fn from(id: BindingId) -> Self {
        NodeRef::Binding(id)
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRef::Domain(id) => write!(f, "{}", id),
            NodeRef::Binding(id) => write!(f, "{}", id),
        }
    }
}
