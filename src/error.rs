//! Error types of the contractor network.
//!
//! Empty enclosures are not errors: a contractor proving infeasibility narrows a
//! domain to the empty set and propagation goes on. See
//! [`Contraction::empty`][crate::solve::Contraction] and
//! [`ContractorNetwork::emptiness`][crate::network::ContractorNetwork::emptiness].

use thiserror::Error;

use crate::contractor::ContractorError;
use crate::reference::{BindingId, DomainId};

#[derive(Error, Debug)]
pub enum CnError {
    /// Arguments do not fit the contractor signature, or a value has the wrong structure.
    #[error("construction error: {0}")]
    Construction(String),

    /// Sub-range bounds or a data dimension outside of the domain size.
    #[error("dimension mismatch: range {start}..={end} is out of bounds for size {size}")]
    DimensionMismatch { start: usize, end: usize, size: usize },

    /// A contractor failed while being invoked. Narrowings committed before stay in place.
    #[error("contractor '{name}' ({binding}) failed")]
    ContractorFailure {
        binding: BindingId,
        name: String,
        #[source]
        source: ContractorError,
    },

    #[error("unknown domain {0}")]
    UnknownDomain(DomainId),

    #[error("unknown binding {0}")]
    UnknownBinding(BindingId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CnError {
    pub(crate) fn construction(msg: impl Into<String>) -> Self {
        CnError::Construction(msg.into())
    }
}

pub type Result<T, E = CnError> = std::result::Result<T, E>;
