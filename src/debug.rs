//! Debug utilities for inspecting a contractor network.
//!
//! These helpers expose the structure of domains and bindings in a readable
//! form. They are primarily useful in tests and during development.

use std::fmt::{Display, Formatter};

use crate::domain::Origin;
use crate::error::{CnError, Result};
use crate::network::ContractorNetwork;
use crate::reference::{BindingId, DomainId};
use crate::value::{Kind, Value};

/// Detailed information about a single domain.
#[derive(Debug, Clone)]
pub struct DomainInfo {
    pub id: DomainId,
    pub kind: Kind,
    /// Given or derived name
    pub name: String,
    pub origin: Origin,
    /// Composites holding this domain as a component or sub-range
    pub parents: Vec<DomainId>,
    /// Components, for composite domains
    pub children: Vec<DomainId>,
    /// Bindings having this domain as an argument
    pub bindings: Vec<BindingId>,
    pub value: Value,
}

impl Display for DomainInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} {} = {}", self.id, self.kind, self.name, self.value)?;
        if !self.children.is_empty() {
            write!(f, ", children={}", list(&self.children))?;
        }
        if !self.parents.is_empty() {
            write!(f, ", parents={}", list(&self.parents))?;
        }
        if !self.bindings.is_empty() {
            write!(f, ", bindings={}", list(&self.bindings))?;
        }
        Ok(())
    }
}

/// Detailed information about a single binding.
#[derive(Debug, Clone)]
pub struct BindingInfo {
    pub id: BindingId,
    pub name: String,
    pub args: Vec<DomainId>,
    /// Whether the binding is pending in the work queue
    pub queued: bool,
}

impl Display for BindingInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}{}", self.id, self.name, list(&self.args))?;
        if self.queued {
            write!(f, " (queued)")?;
        }
        Ok(())
    }
}

fn list<T: Display>(items: &[T]) -> String {
    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("({})", items.join(", "))
}

impl ContractorNetwork {
    /// Get detailed information about a single domain.
    pub fn domain_info(&self, id: DomainId) -> Result<DomainInfo> {
        let d = self.store.get(id)?;
        Ok(DomainInfo {
            id,
            kind: d.node.kind(),
            name: self.domain_name(id),
            origin: d.origin.clone(),
            parents: d.parents.clone(),
            children: d.node.children().to_vec(),
            bindings: d.bindings.clone(),
            value: self.store.value(id)?,
        })
    }

    /// Get detailed information about a single binding.
    pub fn binding_info(&self, b: BindingId) -> Result<BindingInfo> {
        let binding = self.bindings.get(b.index()).ok_or(CnError::UnknownBinding(b))?;
        Ok(BindingInfo {
            id: b,
            name: self.binding_name(b),
            args: binding.args.clone(),
            queued: self.queue.contains(b),
        })
    }

    /// Dump the complete network state for debugging.
    pub fn dump_state(&self) -> String {
        let mut lines = vec![
            "=== Contractor network ===".to_string(),
            format!("State: {:?}, fixpoint ratio {}", self.state(), self.fixedpoint_ratio()),
            format!("Queue: {}", list(&self.queue.iter().collect::<Vec<_>>())),
            "Bindings:".to_string(),
        ];
        for i in 0..self.bindings.len() {
            if let Ok(info) = self.binding_info(BindingId::new(i as u32)) {
                lines.push(format!("  {}", info));
            }
        }
        lines.push("Domains:".to_string());
        for id in self.store.ids() {
            if let Ok(info) = self.domain_info(id) {
                lines.push(format!("  {}", info));
            }
        }
        lines.join("\n")
    }
}

impl Display for ContractorNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Contractor network:")?;
        writeln!(f, "  {} contractors", self.nb_ctc())?;
        writeln!(f, "  {} domains:", self.nb_dom())?;
        for id in self.store.ids() {
            writeln!(f, "    {} ({}): {}", self.domain_name(id), id, self.store.kind(id).map_err(|_| std::fmt::Error)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::ctc::CtcAdd;
    use crate::interval::{Interval, IntervalVector};

    #[test]
    fn test_domain_info() {
        let mut cn = ContractorNetwork::new();
        let x = cn.create(IntervalVector::from(vec![Interval::new(0.0, 1.0), Interval::new(2.0, 3.0)]));
        cn.set_name(x, "x").unwrap();
        let x0 = cn.component(x, 0).unwrap();

        let info = cn.domain_info(x).unwrap();
        assert_eq!(info.kind, Kind::Vector);
        assert_eq!(info.name, "x");
        assert_eq!(info.origin, Origin::External);
        assert_eq!(info.children.len(), 2);
        assert!(info.parents.is_empty());

        let info = cn.domain_info(x0).unwrap();
        assert_eq!(info.name, "x1");
        assert_eq!(info.parents, vec![x]);
        assert_eq!(info.value, Value::Scalar(Interval::new(0.0, 1.0)));
        assert!(info.to_string().contains("parents="));
    }

    #[test]
    fn test_binding_info() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create(Interval::new(0.0, 1.0));
        let b = cn.create(Interval::new(0.0, 1.0));
        let c = cn.create(Interval::new(0.0, 1.0));
        let add = Rc::new(CtcAdd::new());
        let bs = cn.add(&add, [a, b, c]).unwrap();

        let info = cn.binding_info(bs[0]).unwrap();
        assert_eq!(info.args, vec![a, b, c]);
        assert!(info.queued);
        assert_eq!(info.to_string(), "c0: add(d0, d1, d2) (queued)");

        cn.contract().unwrap();
        assert!(!cn.binding_info(bs[0]).unwrap().queued);
        assert!(matches!(
            cn.binding_info(BindingId::new(7)),
            Err(CnError::UnknownBinding(_))
        ));
    }

    #[test]
    fn test_display() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create(Interval::new(0.0, 1.0));
        cn.set_name(a, "a").unwrap();
        let s = cn.to_string();
        assert!(s.contains("0 contractors"));
        assert!(s.contains("1 domains:"));
        assert!(s.contains("a (d0): scalar"));
        assert!(cn.dump_state().contains("Domains:"));
    }
}
