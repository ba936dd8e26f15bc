// ── Routing facts ──
//
// The individual statements the rule engine derives. All of them are plain
// ordered values so a fact set can live in a `BTreeSet`: identical facts
// collapse, conflicting ones stay side by side for the checker to find.

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use super::hub::TableRole;
use super::ids::{AttachmentId, EndpointId, SpokeId};

/// `0.0.0.0/0`.
pub fn default_route() -> Ipv4Net {
    Ipv4Net::default()
}

/// Attachment is a member of a hub route table. Exclusive per attachment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Association {
    pub attachment: AttachmentId,
    pub table: TableRole,
}

/// Attachment's CIDR is advertised into a hub route table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Propagation {
    pub attachment: AttachmentId,
    pub table: TableRole,
}

/// Explicit destination → next-hop entry in a hub route table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaticRoute {
    pub table: TableRole,
    pub destination: Ipv4Net,
    pub next_hop: AttachmentId,
}

/// Which of a spoke's own route tables a local route lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalSide {
    /// The spoke's workload table (`local_route_table`).
    Spoke,
    /// The table of the subnets holding the hub attachment.
    Attachment,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalTarget {
    Hub,
    FirewallEndpoint(EndpointId),
}

/// Route in one of a spoke's own route tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalRoute {
    pub spoke: SpokeId,
    pub side: LocalSide,
    pub destination: Ipv4Net,
    pub target: LocalTarget,
}

impl LocalRoute {
    /// Spoke-side route towards the hub.
    pub fn to_hub(spoke: SpokeId, destination: Ipv4Net) -> Self {
        Self {
            spoke,
            side: LocalSide::Spoke,
            destination,
            target: LocalTarget::Hub,
        }
    }

    /// Attachment-side route into the firewall endpoint.
    pub fn to_endpoint(spoke: SpokeId, destination: Ipv4Net, endpoint: EndpointId) -> Self {
        Self {
            spoke,
            side: LocalSide::Attachment,
            destination,
            target: LocalTarget::FirewallEndpoint(endpoint),
        }
    }
}
