//! Contractor network to DOT (Graphviz) conversion.
//!
//! The generated graph is bipartite:
//! - **Domains** are boxes labelled with their diagnostic name.
//! - **Bindings** are circles labelled with the binding or contractor name.
//! - An edge links each binding to each of its argument domains.
//! - Vectors and tubes are drawn as clusters holding their components, with
//!   dashed edges from the composite to each component.
//!
//! Unnamed domains get a name derived from their parent: component `i` of a
//! vector `x` is `x1`, `x2`, ... and slice `k` of a tube `x` is `x^{(k)}`.
//! Domains with no name to derive from are labelled `?`.
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
//! let b = cn.create(Interval::new(0.0, 1.0));
//! let add = Rc::new(CtcAdd::new());
//! cn.add(&add, [a, b, b]).unwrap();
//! cn.set_name(a, "a").unwrap();
//!
//! let dot = cn.to_dot().unwrap();
//! assert!(dot.contains("label=\"a\""));
//! // Render with: dot -Tpng cn.dot -o cn.png
//! ```

use std::fmt::Write as _;
use std::path::Path;

use log::warn;

use crate::domain::{Node, Origin};
use crate::error::{CnError, Result};
use crate::network::ContractorNetwork;
use crate::reference::{BindingId, DomainId};
use crate::value::Kind;

/// Beyond this many domains or bindings, Graphviz struggles to lay out the graph.
const LARGE_GRAPH: usize = 100;

/// Configuration options for DOT output generation.
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for domain nodes (default: "box")
    pub domain_shape: &'static str,
    /// Shape for binding nodes (default: "circle")
    pub binding_shape: &'static str,
    /// Cluster color for vectors (default: "#006680")
    pub vector_color: &'static str,
    /// Cluster color for tubes (default: "#BA4E00")
    pub tube_color: &'static str,
    /// Whether to draw composite-to-component edges (default: true)
    pub show_structure: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            domain_shape: "box",
            binding_shape: "circle",
            vector_color: "#006680",
            tube_color: "#BA4E00",
            show_structure: true,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl ContractorNetwork {
    /// Diagnostic name of a domain, derived from its parent when unnamed.
    pub fn domain_name(&self, id: DomainId) -> String {
        let Ok(d) = self.store.get(id) else {
            return "?".to_string();
        };
        if let Some(name) = &d.name {
            return name.clone();
        }
        match d.origin {
            Origin::Component { parent, index } => {
                let Some(pname) = self.store.node(parent).name.as_deref() else {
                    return "?".to_string();
                };
                match self.store.node(parent).node {
                    Node::Tube(_) => format!("{}^{{({})}}", pname, index),
                    _ => format!("{}{}", pname, index + 1),
                }
            }
            Origin::View { parent, start, end } => match self.store.node(parent).name.as_deref() {
                Some(pname) => format!("{}[{}:{}]", pname, start, end),
                None => "?".to_string(),
            },
            Origin::Constant => self
                .store
                .value(id)
                .map_or_else(|_| "?".to_string(), |v| v.to_string()),
            _ => "?".to_string(),
        }
    }

    /// Diagnostic name of a binding: its own name, or its contractor name.
    pub fn binding_name(&self, b: BindingId) -> String {
        match self.bindings.get(b.index()) {
            Some(binding) => binding
                .name
                .clone()
                .unwrap_or_else(|| binding.kind.name().to_string()),
            None => "?".to_string(),
        }
    }

    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "graph cn {{")?;
        writeln!(dot, "  overlap=\"prism\";")?;
        writeln!(dot, "  splines=\"compound\";")?;

        writeln!(dot)?;
        writeln!(dot, "  // Domains")?;
        for id in self.store.ids() {
            writeln!(
                dot,
                "  dom{} [shape={}, label=\"{}\"];",
                id.get(),
                config.domain_shape,
                escape(&self.domain_name(id))
            )?;
        }

        writeln!(dot)?;
        writeln!(dot, "  // Bindings")?;
        for i in 0..self.bindings.len() {
            let b = BindingId::new(i as u32);
            writeln!(
                dot,
                "  ctc{} [shape={}, label=\"{}\"];",
                i,
                config.binding_shape,
                escape(&self.binding_name(b))
            )?;
        }

        writeln!(dot)?;
        writeln!(dot, "  // Relations")?;
        for (i, binding) in self.bindings.iter().enumerate() {
            let mut args = binding.args.clone();
            args.dedup();
            for a in args {
                writeln!(dot, "  ctc{} -- dom{};", i, a.get())?;
            }
        }
        if config.show_structure {
            for id in self.store.ids() {
                for &c in self.store.node(id).node.children() {
                    writeln!(dot, "  dom{} -- dom{} [style=dashed];", id.get(), c.get())?;
                }
            }
        }

        // Clusters for vectors and tubes with their components.
        for id in self.store.ids() {
            let d = self.store.node(id);
            if matches!(d.origin, Origin::View { .. }) {
                continue;
            }
            let color = match d.node.kind() {
                Kind::Vector => config.vector_color,
                Kind::Tube => config.tube_color,
                _ => continue,
            };
            writeln!(dot)?;
            writeln!(dot, "  subgraph cluster_dom{} {{", id.get())?;
            writeln!(dot, "    color=\"{}\";", color)?;
            write!(dot, "    dom{};", id.get())?;
            for &c in d.node.children() {
                write!(dot, " dom{};", c.get())?;
            }
            writeln!(dot)?;
            writeln!(dot, "  }}")?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Write the DOT graph of the network to `path`.
    pub fn print_dot_graph(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.nb_dom() > LARGE_GRAPH || self.nb_ctc() > LARGE_GRAPH {
            warn!(
                "large network ({} domains, {} bindings), the graph may not render",
                self.nb_dom(),
                self.nb_ctc()
            );
        }
        let dot = self
            .to_dot()
            .map_err(|e| CnError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        std::fs::write(path, dot)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use test_log::test;

    use super::*;
    use crate::ctc::CtcAdd;
    use crate::interval::{Interval, IntervalVector};
    use crate::tube::Tube;

    #[test]
    fn test_to_dot_basic() {
        let mut cn = ContractorNetwork::new();
        let a = cn.create(Interval::new(0.0, 1.0));
        let b = cn.create(Interval::new(-1.0, 1.0));
        let c = cn.create(Interval::new(1.5, 2.0));
        let add = Rc::new(CtcAdd::new());
        let bs = cn.add(&add, [a, b, c]).unwrap();
        cn.set_name(a, "a").unwrap();
        cn.set_name(bs[0], "+").unwrap();

        let dot = cn.to_dot().unwrap();
        assert!(dot.starts_with("graph cn {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("dom0 [shape=box, label=\"a\"];"));
        assert!(dot.contains("dom1 [shape=box, label=\"?\"];"));
        assert!(dot.contains("ctc0 [shape=circle, label=\"+\"];"));
        assert!(dot.contains("ctc0 -- dom2;"));
    }

    #[test]
    fn test_derived_names() {
        let mut cn = ContractorNetwork::new();
        let x = cn.create(IntervalVector::all_reals(2));
        let v = cn.create(Tube::new(Interval::new(0.0, 2.0), 1.0, Interval::all_reals()));
        let w = cn.view_subrange(x, 0, 1).unwrap();
        cn.set_name(x, "x").unwrap();
        cn.set_name(v, "v").unwrap();

        assert_eq!(cn.domain_name(cn.component(x, 1).unwrap()), "x2");
        assert_eq!(cn.domain_name(cn.slice(v, 0).unwrap()), "v^{(0)}");
        assert_eq!(cn.domain_name(w), "x[0:1]");

        let x1 = cn.component(x, 1).unwrap();
        let dot = cn.to_dot().unwrap();
        assert!(dot.contains(&format!("subgraph cluster_dom{} {{", x.get())));
        assert!(dot.contains(&format!("subgraph cluster_dom{} {{", v.get())));
        assert!(!dot.contains(&format!("subgraph cluster_dom{} {{", w.get())));
        assert!(dot.contains("color=\"#BA4E00\";"));
        assert!(dot.contains(&format!("dom{} -- dom{} [style=dashed];", x.get(), x1.get())));
    }

    #[test]
    fn test_to_dot_with_config() {
        let mut cn = ContractorNetwork::new();
        cn.create(IntervalVector::all_reals(2));
        let config = DotConfig {
            domain_shape: "ellipse",
            show_structure: false,
            ..DotConfig::default()
        };
        let dot = cn.to_dot_with_config(&config).unwrap();
        assert!(dot.contains("shape=ellipse"));
        assert!(!dot.contains("style=dashed"));
    }

    #[test]
    fn test_print_dot_graph() {
        let mut cn = ContractorNetwork::new();
        cn.create(Interval::new(0.0, 1.0));
        let path = std::env::temp_dir().join(format!("cn_rs_dot_{}.dot", std::process::id()));
        cn.print_dot_graph(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("graph cn {"));
        std::fs::remove_file(&path).unwrap();
    }
}
