//! Transit routing topology compiler.
//!
//! Takes a declarative hub-and-spoke topology (one hub, spokes tagged with a
//! [`TrafficClass`]) and compiles it into an ordered plan of route-table
//! operations, after proving the plan cannot let inspected traffic bypass the
//! firewall segment.
//!
//! ## Pipeline
//!
//! ```text
//! TopologyDescriptor ─▶ Topology ─▶ derive ─▶ RoutingFacts ─▶ validate ─▶ ValidatedFacts ─▶ emit ─▶ TopologyPlan
//! ```
//!
//! - [`Topology`] enforces addressing and identity invariants on construction.
//! - [`rules::derive`] maps each spoke's class to routing facts.
//! - [`check::validate`] runs every consistency check; it is the only way to
//!   obtain [`ValidatedFacts`].
//! - [`plan::emit`] accepts only [`ValidatedFacts`] and orders operations so
//!   every dependency precedes its dependents.
//!
//! [`compile`] runs the whole pipeline.

pub mod check;
pub mod compile;
pub mod descriptor;
pub mod error;
pub mod facts;
pub mod model;
pub mod plan;
pub mod rules;
pub mod topology;

// ── Primary re-exports ──────────────────────────────────────────────

pub use check::{
    Severity, ValidatedFacts, Violation, ViolationKind, ViolationReport, check, validate,
};
pub use compile::{Compilation, compile, compile_topology};
pub use descriptor::{HubDescriptor, SpokeDescriptor, TopologyDescriptor};
pub use error::CoreError;
pub use facts::RoutingFacts;
pub use model::{
    AttachmentId, EndpointId, Hub, HubId, HubTables, LocalSide, LocalTarget, RouteTableId, Spoke,
    SpokeId, TableRole, TrafficClass,
};
pub use plan::{OpType, Operation, TopologyPlan, emit};
pub use rules::{ClassRule, derive, rule_table};
pub use topology::Topology;
