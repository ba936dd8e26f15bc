// ── Spokes and their traffic classes ──

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::ids::{AttachmentId, EndpointId, RouteTableId, SpokeId};

/// How a spoke's traffic is treated by the hub.
///
/// This tag is the only input the rule engine dispatches on; see
/// [`crate::rules`] for the table it selects from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TrafficClass {
    /// Internet breakout segment.
    Egress,
    /// Trusted consumer; talks to other standard spokes directly.
    Standard,
    /// Untrusted consumer; every flow must cross the firewall segment.
    Inspected,
    /// The firewall segment itself.
    Inspection,
}

impl TrafficClass {
    /// Whether a default route may terminate at a spoke of this class.
    pub fn is_exit(self) -> bool {
        matches!(self, Self::Egress | Self::Inspection)
    }
}

/// A network segment attached to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spoke {
    pub id: SpokeId,
    pub cidr: Ipv4Net,
    pub class: TrafficClass,
    /// Hub attachment handle. Defaults to the spoke id.
    pub attachment: AttachmentId,
    /// The spoke's own route table, target of spoke-local routes.
    /// Defaults to `<id>-local`.
    pub local_route_table: RouteTableId,
    /// Inspection spokes only: where hub-side traffic is handed to the firewall.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_endpoint: Option<EndpointId>,
    /// Inspection spokes only: table of the attachment subnets.
    /// Defaults to `<id>-attachment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_route_table: Option<RouteTableId>,
}

impl Spoke {
    pub fn new(id: impl Into<SpokeId>, cidr: Ipv4Net, class: TrafficClass) -> Self {
        let id = id.into();
        Self {
            attachment: AttachmentId::new(id.as_str()),
            local_route_table: default_local_route_table(&id),
            firewall_endpoint: None,
            attachment_route_table: None,
            id,
            cidr,
            class,
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<AttachmentId>) -> Self {
        self.attachment = attachment.into();
        self
    }

    pub fn with_local_route_table(mut self, table: impl Into<RouteTableId>) -> Self {
        self.local_route_table = table.into();
        self
    }

    pub fn with_firewall_endpoint(mut self, endpoint: impl Into<EndpointId>) -> Self {
        self.firewall_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_attachment_route_table(mut self, table: impl Into<RouteTableId>) -> Self {
        self.attachment_route_table = Some(table.into());
        self
    }

    /// Effective attachment-side table.
    pub fn attachment_side_table(&self) -> RouteTableId {
        self.attachment_route_table
            .clone()
            .unwrap_or_else(|| RouteTableId::new(format!("{}-attachment", self.id)))
    }

    /// Whether two spokes' address blocks share any address.
    pub fn overlaps(&self, cidr: &Ipv4Net) -> bool {
        cidrs_overlap(&self.cidr, cidr)
    }
}

pub(crate) fn default_local_route_table(id: &SpokeId) -> RouteTableId {
    RouteTableId::new(format!("{id}-local"))
}

/// Two CIDR blocks overlap iff one contains the other.
pub(crate) fn cidrs_overlap(a: &Ipv4Net, b: &Ipv4Net) -> bool {
    a.contains(b) || b.contains(a)
}
