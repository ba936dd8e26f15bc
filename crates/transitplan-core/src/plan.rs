//! Plan emitter.
//!
//! Turns a [`ValidatedFacts`] into an ordered [`TopologyPlan`]. Operations are
//! grouped in phases (associations first, appliance mode last) and sorted by
//! content inside each phase, so the same facts always produce the same plan.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::info;

use crate::check::ValidatedFacts;
use crate::facts::RoutingFacts;
use crate::model::{
    AttachmentId, HubId, LocalSide, LocalTarget, RouteTableId, SpokeId, TableRole,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum OpType {
    Associate,
    Propagate,
    AddStaticRoute,
    AddLocalRoute,
    EnableApplianceMode,
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub op_type: OpType,
    /// Concrete table id: a hub table, or one of the spoke's own tables for local routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<RouteTableId>,
    /// Hub table role, absent for spoke-local operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<TableRole>,
    pub attachment: AttachmentId,
    pub spoke: SpokeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_cidr: Option<Ipv4Net>,
    /// Attachment for hub routes; hub id or firewall endpoint for local routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyPlan {
    pub hub: HubId,
    pub operations: Vec<Operation>,
}

impl TopologyPlan {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations of one type.
    pub fn count(&self, op_type: OpType) -> usize {
        self.operations
            .iter()
            .filter(|op| op.op_type == op_type)
            .count()
    }
}

/// Emit the plan for a validated fact set.
pub fn emit(validated: &ValidatedFacts) -> TopologyPlan {
    let facts = validated.facts();
    let hub = facts.hub();
    let mut builder = PlanBuilder::new(facts);

    // ── Phase 1: associations ──
    let mut associations: Vec<_> = facts
        .associations()
        .map(|a| (builder.owner(&a.attachment), a))
        .collect();
    associations.sort_by(|(sa, a), (sb, b)| (sa, a.table).cmp(&(sb, b.table)));
    for (spoke, a) in associations {
        builder.push_association(Operation {
            op_type: OpType::Associate,
            table: Some(hub.table_id(a.table).clone()),
            role: Some(a.table),
            attachment: a.attachment.clone(),
            spoke,
            destination_cidr: None,
            next_hop: None,
            depends_on: Vec::new(),
        });
    }

    // ── Phase 2: propagations ──
    let mut propagations: Vec<_> = facts
        .propagations()
        .map(|p| (builder.owner(&p.attachment), p))
        .collect();
    propagations.sort_by(|(sa, a), (sb, b)| (sa, a.table).cmp(&(sb, b.table)));
    for (spoke, p) in propagations {
        builder.push(
            &p.attachment,
            Operation {
                op_type: OpType::Propagate,
                table: Some(hub.table_id(p.table).clone()),
                role: Some(p.table),
                attachment: p.attachment.clone(),
                spoke,
                destination_cidr: None,
                next_hop: None,
                depends_on: Vec::new(),
            },
        );
    }

    // ── Phase 3: hub static routes ──
    let mut routes: Vec<_> = facts
        .static_routes()
        .map(|r| (builder.owner(&r.next_hop), r))
        .collect();
    routes.sort_by(|(sa, a), (sb, b)| {
        (sa, a.table, a.destination).cmp(&(sb, b.table, b.destination))
    });
    for (spoke, r) in routes {
        builder.push(
            &r.next_hop,
            Operation {
                op_type: OpType::AddStaticRoute,
                table: Some(hub.table_id(r.table).clone()),
                role: Some(r.table),
                attachment: r.next_hop.clone(),
                spoke,
                destination_cidr: Some(r.destination),
                next_hop: Some(r.next_hop.to_string()),
                depends_on: Vec::new(),
            },
        );
    }

    // ── Phase 4: spoke-local routes ──
    // Local routes are keyed by spoke already, so set order is phase order.
    for r in facts.local_routes() {
        let Some(spoke) = facts.spoke(&r.spoke) else {
            continue;
        };
        let table = match r.side {
            LocalSide::Spoke => spoke.local_route_table.clone(),
            LocalSide::Attachment => spoke.attachment_side_table(),
        };
        let next_hop = match &r.target {
            LocalTarget::Hub => hub.id().to_string(),
            LocalTarget::FirewallEndpoint(endpoint) => endpoint.to_string(),
        };
        builder.push(
            &spoke.attachment,
            Operation {
                op_type: OpType::AddLocalRoute,
                table: Some(table),
                role: None,
                attachment: spoke.attachment.clone(),
                spoke: spoke.id.clone(),
                destination_cidr: Some(r.destination),
                next_hop: Some(next_hop),
                depends_on: Vec::new(),
            },
        );
    }

    // ── Phase 5: appliance mode ──
    let mut appliance: Vec<_> = facts
        .appliance_mode()
        .map(|a| (builder.owner(a), a))
        .collect();
    appliance.sort();
    for (spoke, attachment) in appliance {
        builder.push(
            attachment,
            Operation {
                op_type: OpType::EnableApplianceMode,
                table: None,
                role: None,
                attachment: attachment.clone(),
                spoke,
                destination_cidr: None,
                next_hop: None,
                depends_on: Vec::new(),
            },
        );
    }

    let plan = builder.finish(hub.id().clone());
    info!(
        hub = %plan.hub,
        operations = plan.len(),
        "plan emitted"
    );
    plan
}

struct PlanBuilder<'a> {
    facts: &'a RoutingFacts,
    operations: Vec<Operation>,
    associated: BTreeMap<AttachmentId, usize>,
}

impl<'a> PlanBuilder<'a> {
    fn new(facts: &'a RoutingFacts) -> Self {
        Self {
            facts,
            operations: Vec::new(),
            associated: BTreeMap::new(),
        }
    }

    /// Spoke owning an attachment; validated facts never reference unknown ones.
    fn owner(&self, attachment: &AttachmentId) -> SpokeId {
        self.facts
            .spoke_by_attachment(attachment)
            .map_or_else(|| SpokeId::new(attachment.as_str()), |s| s.id.clone())
    }

    fn push_association(&mut self, op: Operation) {
        self.associated
            .entry(op.attachment.clone())
            .or_insert(self.operations.len());
        self.operations.push(op);
    }

    fn push(&mut self, depends_on: &AttachmentId, mut op: Operation) {
        op.depends_on = self.associated.get(depends_on).copied().into_iter().collect();
        self.operations.push(op);
    }

    fn finish(self, hub: HubId) -> TopologyPlan {
        TopologyPlan {
            hub,
            operations: self.operations,
        }
    }
}
