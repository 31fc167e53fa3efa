//! Contractor bindings and their dedup keys.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::contractor::Contractor;
use crate::interval::Interval;
use crate::reference::DomainId;
use crate::utils::{pairing2, pairing_fold, MyHash};

/// What a binding runs when invoked.
#[derive(Clone)]
pub(crate) enum BindingKind {
    Contractor(Rc<dyn Contractor>),
    /// Data observation on one tube slice: intersect the slice with the envelope.
    Observation { envelope: Interval },
}

impl BindingKind {
    pub(crate) fn name(&self) -> &str {
        match self {
            BindingKind::Contractor(c) => c.name(),
            BindingKind::Observation { .. } => "data",
        }
    }
}

impl Debug for BindingKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Contractor(c) => write!(f, "Contractor({})", c.name()),
            BindingKind::Observation { envelope } => write!(f, "Observation({})", envelope),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) kind: BindingKind,
    pub(crate) args: Vec<DomainId>,
    pub(crate) name: Option<String>,
}

/// Identity of a contractor instance: the address of its shared allocation.
pub(crate) fn contractor_identity<C: ?Sized>(ctc: &Rc<C>) -> usize {
    Rc::as_ptr(ctc) as *const () as usize
}

/// Identity reserved for data observations, never a valid allocation address.
pub(crate) const OBSERVATION: usize = 0;

/// Dedup key: contractor identity and ordered argument handles.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub(crate) struct BindingKey {
    pub(crate) ctc: usize,
    pub(crate) args: Vec<DomainId>,
}

impl MyHash for BindingKey {
    fn hash(&self) -> u64 {
        // Allocation addresses are aligned, drop the always-zero low bits.
        let seed = pairing2((self.ctc >> 3) as u64, self.args.len() as u64);
        pairing_fold(seed, self.args.iter().map(|a| a.get() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctc::CtcAdd;

    #[test]
    fn test_identity_follows_instance() {
        let a = Rc::new(CtcAdd::new());
        let b = a.clone();
        let c = Rc::new(CtcAdd::new());
        assert_eq!(contractor_identity(&a), contractor_identity(&b));
        assert_ne!(contractor_identity(&a), contractor_identity(&c));
        assert_ne!(contractor_identity(&a), OBSERVATION);

        let dyn_a: Rc<dyn Contractor> = a.clone();
        assert_eq!(contractor_identity(&dyn_a), contractor_identity(&a));
    }

    #[test]
    fn test_key_hash_depends_on_order() {
        let k1 = BindingKey {
            ctc: 64,
            args: vec![DomainId::new(1), DomainId::new(2)],
        };
        let k2 = BindingKey {
            ctc: 64,
            args: vec![DomainId::new(2), DomainId::new(1)],
        };
        assert_ne!(k1, k2);
        assert_ne!(k1.hash(), k2.hash());
        assert_eq!(k1.hash(), k1.clone().hash());
    }
}
