// ── Core error types ──
//
// Everything here signals malformed declarative input. None of these are
// transient: the caller fixes the descriptor and recompiles. Violations found
// by the consistency checker travel inside `Rejected` as a full report.

use ipnet::Ipv4Net;
use thiserror::Error;

use crate::check::ViolationReport;
use crate::model::ids::join_ids;
use crate::model::{AttachmentId, RouteTableId, SpokeId, TableRole};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Construction errors ──────────────────────────────────────────
    #[error("Invalid CIDR '{value}' for {subject}: {reason}")]
    InvalidCidr {
        subject: String,
        value: String,
        reason: String,
    },

    #[error("Spoke '{spoke}' ({cidr}) overlaps {conflict} ({conflict_cidr})")]
    DuplicateCidr {
        spoke: SpokeId,
        cidr: Ipv4Net,
        /// The other spoke, or `hub` for the hub's internal addressing.
        conflict: String,
        conflict_cidr: Ipv4Net,
    },

    #[error("Spoke '{spoke}' is a second inspection spoke (already have '{existing}')")]
    DuplicateInspectionSpoke { spoke: SpokeId, existing: SpokeId },

    #[error("Spoke '{spoke}' is declared more than once")]
    DuplicateSpoke { spoke: SpokeId },

    #[error("Attachment '{attachment}' of spoke '{spoke}' is already used by '{existing}'")]
    DuplicateAttachment {
        attachment: AttachmentId,
        spoke: SpokeId,
        existing: SpokeId,
    },

    #[error("Spoke '{spoke}' sets {field}, which only an inspection spoke may carry")]
    InspectionOnlyField { spoke: SpokeId, field: &'static str },

    #[error("Route table '{table}' is used for both the {first} and {second} roles")]
    DuplicateRouteTable {
        table: RouteTableId,
        first: TableRole,
        second: TableRole,
    },

    // ── Derivation errors ────────────────────────────────────────────
    #[error(
        "Inspected spokes [{}] have no inspection spoke to enforce them",
        join_ids(.inspected)
    )]
    MissingInspectionSpoke { inspected: Vec<SpokeId> },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Topology rejected: {0}")]
    Rejected(ViolationReport),
}

impl CoreError {
    /// Spoke identifiers this error is about, for callers that highlight them.
    pub fn spokes(&self) -> Vec<SpokeId> {
        match self {
            Self::DuplicateCidr { spoke, .. }
            | Self::DuplicateSpoke { spoke }
            | Self::InspectionOnlyField { spoke, .. }
            | Self::DuplicateAttachment { spoke, .. } => vec![spoke.clone()],
            Self::DuplicateInspectionSpoke { spoke, existing } => {
                vec![existing.clone(), spoke.clone()]
            }
            Self::MissingInspectionSpoke { inspected } => inspected.clone(),
            Self::Rejected(report) => report.spokes(),
            Self::InvalidCidr { .. } | Self::DuplicateRouteTable { .. } => Vec::new(),
        }
    }
}
