// ── Compile facade ──
//
// Descriptor in, plan out: model → derive → validate → emit. This is the
// entry point the CLI and library callers use; the individual stages stay
// public for callers that want to inspect intermediate results.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::check::{Violation, validate};
use crate::descriptor::TopologyDescriptor;
use crate::error::CoreError;
use crate::plan::{TopologyPlan, emit};
use crate::rules::derive;
use crate::topology::Topology;

/// Result of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    /// Normalized input; recompiling it yields the same plan.
    pub descriptor: TopologyDescriptor,
    pub plan: TopologyPlan,
    /// Non-fatal findings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Violation>,
}

/// Compile a declarative topology into an ordered plan.
pub fn compile(descriptor: &TopologyDescriptor) -> Result<Compilation, CoreError> {
    let topology = Topology::from_descriptor(descriptor)?;
    compile_topology(&topology)
}

/// Compile an already-built topology.
pub fn compile_topology(topology: &Topology) -> Result<Compilation, CoreError> {
    let facts = derive(topology)?;
    let validated = validate(facts).map_err(CoreError::Rejected)?;
    let plan = emit(&validated);

    let advisories = validated.advisories().to_vec();
    if !advisories.is_empty() {
        warn!(count = advisories.len(), "compiled with advisories");
    }
    info!(
        hub = %topology.hub().id(),
        spokes = topology.len(),
        operations = plan.len(),
        "topology compiled"
    );

    Ok(Compilation {
        descriptor: topology.descriptor(),
        plan,
        advisories,
    })
}
