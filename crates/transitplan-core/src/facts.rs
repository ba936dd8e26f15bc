// ── Routing fact set ──
//
// Immutable accumulation of everything the rule engine derived, plus a
// snapshot of the declared hub and spokes so the checker and emitter can
// resolve attachments back to spokes. Facts are stored in ordered sets:
// iteration order is a function of content only.

use std::collections::{BTreeMap, BTreeSet};

use ipnet::Ipv4Net;
use serde::Serialize;

use crate::model::{
    AttachmentId, Association, EndpointId, Hub, LocalRoute, Propagation, Spoke, SpokeId,
    StaticRoute, TableRole,
};
use crate::topology::Topology;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingFacts {
    hub: Hub,
    spokes: BTreeMap<SpokeId, Spoke>,
    associations: BTreeSet<Association>,
    propagations: BTreeSet<Propagation>,
    static_routes: BTreeSet<StaticRoute>,
    local_routes: BTreeSet<LocalRoute>,
    appliance_mode: BTreeSet<AttachmentId>,
}

/// Facts contributed by a single spoke's rules, before they are merged.
#[derive(Debug, Default)]
pub(crate) struct SpokeFacts {
    pub associations: Vec<Association>,
    pub propagations: Vec<Propagation>,
    pub static_routes: Vec<StaticRoute>,
    pub local_routes: Vec<LocalRoute>,
    pub appliance_mode: Vec<AttachmentId>,
}

impl RoutingFacts {
    /// A fact set with the topology's hub and spokes but no facts yet.
    pub fn empty(topology: &Topology) -> Self {
        Self {
            hub: topology.hub().clone(),
            spokes: topology.spoke_map().clone(),
            associations: BTreeSet::new(),
            propagations: BTreeSet::new(),
            static_routes: BTreeSet::new(),
            local_routes: BTreeSet::new(),
            appliance_mode: BTreeSet::new(),
        }
    }

    pub(crate) fn absorb(mut self, facts: SpokeFacts) -> Self {
        self.associations.extend(facts.associations);
        self.propagations.extend(facts.propagations);
        self.static_routes.extend(facts.static_routes);
        self.local_routes.extend(facts.local_routes);
        self.appliance_mode.extend(facts.appliance_mode);
        self
    }

    // ── Builder-style additions ──────────────────────────────────────

    pub fn with_association(mut self, attachment: impl Into<AttachmentId>, table: TableRole) -> Self {
        self.associations.insert(Association {
            attachment: attachment.into(),
            table,
        });
        self
    }

    pub fn with_propagation(mut self, attachment: impl Into<AttachmentId>, table: TableRole) -> Self {
        self.propagations.insert(Propagation {
            attachment: attachment.into(),
            table,
        });
        self
    }

    pub fn with_static_route(
        mut self,
        table: TableRole,
        destination: Ipv4Net,
        next_hop: impl Into<AttachmentId>,
    ) -> Self {
        self.static_routes.insert(StaticRoute {
            table,
            destination,
            next_hop: next_hop.into(),
        });
        self
    }

    pub fn with_local_route(mut self, spoke: impl Into<SpokeId>, destination: Ipv4Net) -> Self {
        self.local_routes
            .insert(LocalRoute::to_hub(spoke.into(), destination));
        self
    }

    pub fn with_endpoint_route(
        mut self,
        spoke: impl Into<SpokeId>,
        destination: Ipv4Net,
        endpoint: impl Into<EndpointId>,
    ) -> Self {
        self.local_routes
            .insert(LocalRoute::to_endpoint(spoke.into(), destination, endpoint.into()));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn spokes(&self) -> impl Iterator<Item = &Spoke> {
        self.spokes.values()
    }

    pub fn spoke(&self, id: &SpokeId) -> Option<&Spoke> {
        self.spokes.get(id)
    }

    /// The declared spoke that owns an attachment.
    pub fn spoke_by_attachment(&self, attachment: &AttachmentId) -> Option<&Spoke> {
        self.spokes.values().find(|s| &s.attachment == attachment)
    }

    pub fn associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.iter()
    }

    pub fn propagations(&self) -> impl Iterator<Item = &Propagation> {
        self.propagations.iter()
    }

    pub fn static_routes(&self) -> impl Iterator<Item = &StaticRoute> {
        self.static_routes.iter()
    }

    pub fn local_routes(&self) -> impl Iterator<Item = &LocalRoute> {
        self.local_routes.iter()
    }

    pub fn appliance_mode(&self) -> impl Iterator<Item = &AttachmentId> {
        self.appliance_mode.iter()
    }

    /// Tables an attachment is associated with, in role order.
    pub fn associations_of(&self, attachment: &AttachmentId) -> Vec<TableRole> {
        self.associations
            .iter()
            .filter(|a| &a.attachment == attachment)
            .map(|a| a.table)
            .collect()
    }

    pub fn propagations_into(&self, table: TableRole) -> impl Iterator<Item = &Propagation> {
        self.propagations.iter().filter(move |p| p.table == table)
    }

    pub fn static_routes_in(&self, table: TableRole) -> impl Iterator<Item = &StaticRoute> {
        self.static_routes.iter().filter(move |r| r.table == table)
    }

    /// Whether an attachment's CIDR is advertised into `table`.
    pub fn is_propagated(&self, attachment: &AttachmentId, table: TableRole) -> bool {
        self.propagations.contains(&Propagation {
            attachment: attachment.clone(),
            table,
        })
    }

    pub fn fact_count(&self) -> usize {
        self.associations.len()
            + self.propagations.len()
            + self.static_routes.len()
            + self.local_routes.len()
            + self.appliance_mode.len()
    }
}
