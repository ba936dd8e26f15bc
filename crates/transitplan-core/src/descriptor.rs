// ── Declarative input ──
//
// Wire shape of a topology as the caller writes it. Everything is kept as
// strings here; parsing into model types (and the errors that come with it)
// happens in `Topology::from_descriptor`.

use serde::{Deserialize, Serialize};

use crate::model::TrafficClass;

/// A hub plus the spokes attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    pub hub: HubDescriptor,
    #[serde(default)]
    pub spokes: Vec<SpokeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubDescriptor {
    /// Transit gateway handle.
    #[serde(default = "default_hub_id")]
    pub id: String,
    #[serde(alias = "firewallTable")]
    pub firewall_table: String,
    #[serde(alias = "standardTable")]
    pub standard_table: String,
    #[serde(alias = "inspectionTable")]
    pub inspection_table: String,
    /// Address blocks owned by the hub; spokes must not overlap them.
    #[serde(default, alias = "internalCidrs", skip_serializing_if = "Vec::is_empty")]
    pub internal_cidrs: Vec<String>,
    /// Range the egress spoke routes back to the hub (default `10.0.0.0/8`).
    #[serde(
        default,
        alias = "internalSupernet",
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_supernet: Option<String>,
}

fn default_hub_id() -> String {
    "hub".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpokeDescriptor {
    pub id: String,
    pub cidr: String,
    #[serde(alias = "trafficClass", alias = "class")]
    pub traffic_class: TrafficClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(
        default,
        alias = "localRouteTable",
        skip_serializing_if = "Option::is_none"
    )]
    pub local_route_table: Option<String>,
    /// Inspection spoke only: firewall endpoint for the attachment-side default route.
    #[serde(
        default,
        alias = "firewallEndpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub firewall_endpoint: Option<String>,
    /// Inspection spoke only: route table of the attachment subnets.
    #[serde(
        default,
        alias = "attachmentRouteTable",
        skip_serializing_if = "Option::is_none"
    )]
    pub attachment_route_table: Option<String>,
}

impl SpokeDescriptor {
    pub fn new(id: impl Into<String>, cidr: impl Into<String>, class: TrafficClass) -> Self {
        Self {
            id: id.into(),
            cidr: cidr.into(),
            traffic_class: class,
            attachment: None,
            local_route_table: None,
            firewall_endpoint: None,
            attachment_route_table: None,
        }
    }
}
