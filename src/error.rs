//! Error taxonomy for the scheduling core (spec §7).
//!
//! Data-deficiency and infeasibility variants are *recovered* by callers in
//! this crate (collected into warning/failure lists so a run can continue);
//! they are still represented as proper error values rather than booleans
//! so call sites can match on the taxonomy and so a caller assembling a
//! report gets a real message for free via [`std::error::Error`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("no mold found for component {component_code}")]
    NoMold { component_code: String },

    #[error("invalid mold code {mold_code}")]
    InvalidMoldCode { mold_code: String },

    #[error("missing machine or cavity count for component {component_code}")]
    MissingMachineOrCavity { component_code: String },

    #[error("zero quantity for component {component_code}")]
    ZeroQuantity { component_code: String },

    #[error("no candidates generated for mmo {mmo_id}")]
    NoCandidates { mmo_id: String },

    #[error("all candidates violate constraints for mmo {mmo_id}")]
    AllCandidatesInfeasible { mmo_id: String },

    #[error("duplicate completion number {0}")]
    DuplicateCompletionNo(String),
}

impl SchedulingError {
    /// Whether this is a data-deficiency error recovered during MMO
    /// synthesis (spec §7) rather than an infeasibility found later.
    pub fn is_data_deficiency(&self) -> bool {
        matches!(
            self,
            SchedulingError::NoMold { .. }
                | SchedulingError::InvalidMoldCode { .. }
                | SchedulingError::MissingMachineOrCavity { .. }
                | SchedulingError::ZeroQuantity { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
