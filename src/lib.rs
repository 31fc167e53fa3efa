//! # cn-rs: Contractor networks in Rust
//!
//! **`cn-rs`** is a constraint propagation engine over interval domains.
//! A *contractor network* links domains (intervals, interval vectors and
//! matrices, tubes and tube vectors) through *contractors*, operators that
//! narrow their arguments without removing any feasible value. The network
//! invokes contractors until no domain changes significantly anymore.
//!
//! ## Key Features
//!
//! - **Network-Centric Architecture**: All operations go through the [`ContractorNetwork`][crate::network::ContractorNetwork].
//!   Domains are referenced through lightweight [`DomainId`][crate::reference::DomainId] handles, bindings through
//!   [`BindingId`][crate::reference::BindingId] handles.
//! - **Shared Structure**: The components of a vector, the slices of a tube and sub-range views all share the
//!   storage of their parent. Narrowing a component wakes up the contractors bound to the whole vector, and vice versa.
//! - **Deduplication**: Adding the same contractor on the same arguments twice registers a single binding.
//! - **Resumable Solving**: Propagation runs under a time budget and resumes where it stopped on the next call.
//! - **Data Feeds**: Measurements added incrementally to a tube constrain the slices they cover.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use cn_rs::ctc::CtcAdd;
//! use cn_rs::interval::Interval;
//! use cn_rs::network::ContractorNetwork;
//!
//! // 1. Initialize the network
//! let mut cn = ContractorNetwork::default();
//!
//! // 2. Create domains
//! let a = cn.create(Interval::new(0.0, 1.0));
//! let b = cn.create(Interval::new(-1.0, 1.0));
//! let c = cn.create(Interval::new(1.5, 2.0));
//!
//! // 3. Bind a contractor for a + b = c
//! let add = Rc::new(CtcAdd::new());
//! cn.add(&add, [a, b, c]).unwrap();
//!
//! // 4. Propagate
//! cn.contract().unwrap();
//! assert_eq!(cn.scalar(a).unwrap(), Interval::new(0.5, 1.0));
//! assert_eq!(cn.scalar(b).unwrap(), Interval::new(0.5, 1.0));
//! ```
//!
//! ## Core Components
//!
//! - **[`network`]**: The [`ContractorNetwork`][crate::network::ContractorNetwork] itself, domain creation and bindings.
//! - **[`solve`]**: The fixpoint scheduler.
//! - **[`contractor`]**: The [`Contractor`][crate::contractor::Contractor] trait to implement custom operators.
//! - **[`ctc`]**: Predefined contractors.
//! - **[`data`]**: Incremental data on tubes.
//! - **[`dot`]**: Visualization of the network using Graphviz.

mod binding;
pub mod contractor;
pub mod ctc;
pub mod data;
pub mod debug;
pub mod domain;
pub mod dot;
pub mod error;
pub mod interval;
pub mod network;
pub mod queue;
pub mod reference;
pub mod solve;
pub mod table;
pub mod tube;
pub mod utils;
pub mod value;
