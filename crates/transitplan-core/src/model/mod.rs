// ── Topology domain model ──
//
// Hub, route-table roles, spokes and the routing facts derived for them.
// Identifiers are opaque handles owned by the provisioning layer.

pub mod hub;
pub mod ids;
pub mod route;
pub mod spoke;

pub use hub::{DEFAULT_INTERNAL_SUPERNET, Hub, HubTables, TableRole};
pub use ids::{AttachmentId, EndpointId, HubId, RouteTableId, SpokeId};
pub use route::{
    Association, LocalRoute, LocalSide, LocalTarget, Propagation, StaticRoute, default_route,
};
pub use spoke::{Spoke, TrafficClass};
