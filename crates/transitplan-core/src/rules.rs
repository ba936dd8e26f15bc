//! Rule engine: traffic class → routing facts.
//!
//! All routing policy lives in [`spoke_rules`], one match arm per
//! [`TrafficClass`]:
//!
//! | Class        | Associate    | Propagate               | Hub static routes                                  | Local routes           |
//! |--------------|--------------|-------------------------|----------------------------------------------------|------------------------|
//! | `egress`     | `standard`   | `standard`              | `firewall`, `standard`: `0.0.0.0/0 → self`         | supernet `→ hub`       |
//! | `standard`   | `standard`   | `standard`, `firewall`  | —                                                  | `0.0.0.0/0 → hub`      |
//! | `inspected`  | `inspection` | `firewall`              | `standard`: `<own cidr> → inspection`              | `0.0.0.0/0 → hub`      |
//! | `inspection` | `firewall`   | —                       | `inspection`: `0.0.0.0/0 → self`                   | `0.0.0.0/0 → hub`      |
//!
//! The inspection spoke's attachment additionally gets appliance mode so
//! both directions of a flow hit the same firewall endpoint. When the spoke
//! names its `firewall_endpoint`, its attachment-side table also gets
//! `0.0.0.0/0 → endpoint`: traffic arriving from the hub enters the firewall.
//!
//! Each spoke is evaluated in isolation against a read-only [`RuleContext`];
//! the per-spoke results are folded into one [`RoutingFacts`] afterwards.

use ipnet::Ipv4Net;
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::facts::{RoutingFacts, SpokeFacts};
use crate::model::{
    AttachmentId, Association, Hub, LocalRoute, LocalSide, LocalTarget, Propagation, Spoke,
    SpokeId, StaticRoute, TableRole, TrafficClass, default_route,
};
use crate::topology::Topology;

/// Cross-spoke inputs a spoke's rules may read.
struct RuleContext<'a> {
    internal_supernet: Ipv4Net,
    inspection_attachment: Option<&'a AttachmentId>,
}

/// Derive the complete fact set for a topology.
pub fn derive(topology: &Topology) -> Result<RoutingFacts, CoreError> {
    let inspection = topology.inspection_spoke();
    let inspected: Vec<SpokeId> = topology
        .spokes_of(TrafficClass::Inspected)
        .map(|s| s.id.clone())
        .collect();

    if inspection.is_none() && !inspected.is_empty() {
        return Err(CoreError::MissingInspectionSpoke { inspected });
    }

    let ctx = RuleContext {
        internal_supernet: topology.hub().internal_supernet(),
        inspection_attachment: inspection.map(|s| &s.attachment),
    };

    let facts = topology
        .spokes()
        .map(|spoke| spoke_rules(spoke, &ctx))
        .fold(RoutingFacts::empty(topology), RoutingFacts::absorb);

    info!(
        spokes = topology.len(),
        facts = facts.fact_count(),
        "routing facts derived"
    );
    Ok(facts)
}

fn spoke_rules(spoke: &Spoke, ctx: &RuleContext<'_>) -> SpokeFacts {
    let own = &spoke.attachment;
    let mut facts = SpokeFacts::default();

    match spoke.class {
        TrafficClass::Egress => {
            facts.associations.push(associate(own, TableRole::Standard));
            facts.propagations.push(propagate(own, TableRole::Standard));
            for table in [TableRole::Firewall, TableRole::Standard] {
                facts.static_routes.push(StaticRoute {
                    table,
                    destination: default_route(),
                    next_hop: own.clone(),
                });
            }
            facts
                .local_routes
                .push(local(&spoke.id, ctx.internal_supernet));
        }
        TrafficClass::Standard => {
            facts.associations.push(associate(own, TableRole::Standard));
            facts.propagations.push(propagate(own, TableRole::Standard));
            facts.propagations.push(propagate(own, TableRole::Firewall));
            facts.local_routes.push(local(&spoke.id, default_route()));
        }
        TrafficClass::Inspected => {
            facts.associations.push(associate(own, TableRole::Inspection));
            facts.propagations.push(propagate(own, TableRole::Firewall));
            if let Some(inspection) = ctx.inspection_attachment {
                // Return traffic from the standard side re-enters through the firewall.
                facts.static_routes.push(StaticRoute {
                    table: TableRole::Standard,
                    destination: spoke.cidr,
                    next_hop: inspection.clone(),
                });
            }
            facts.local_routes.push(local(&spoke.id, default_route()));
        }
        TrafficClass::Inspection => {
            facts.associations.push(associate(own, TableRole::Firewall));
            facts.static_routes.push(StaticRoute {
                table: TableRole::Inspection,
                destination: default_route(),
                next_hop: own.clone(),
            });
            facts.local_routes.push(local(&spoke.id, default_route()));
            if let Some(endpoint) = &spoke.firewall_endpoint {
                facts.local_routes.push(LocalRoute::to_endpoint(
                    spoke.id.clone(),
                    default_route(),
                    endpoint.clone(),
                ));
            }
            facts.appliance_mode.push(own.clone());
        }
    }

    debug!(
        spoke = %spoke.id,
        class = %spoke.class,
        associations = facts.associations.len(),
        propagations = facts.propagations.len(),
        static_routes = facts.static_routes.len(),
        "spoke rules evaluated"
    );
    facts
}

fn associate(attachment: &AttachmentId, table: TableRole) -> Association {
    Association {
        attachment: attachment.clone(),
        table,
    }
}

fn propagate(attachment: &AttachmentId, table: TableRole) -> Propagation {
    Propagation {
        attachment: attachment.clone(),
        table,
    }
}

fn local(spoke: &SpokeId, destination: Ipv4Net) -> LocalRoute {
    LocalRoute::to_hub(spoke.clone(), destination)
}

// ── Rule table rendering ────────────────────────────────────────────

/// One row of the class rule table, rendered symbolically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRule {
    pub class: TrafficClass,
    pub associations: Vec<TableRole>,
    pub propagations: Vec<TableRole>,
    pub static_routes: Vec<String>,
    pub local_routes: Vec<String>,
    pub appliance_mode: bool,
}

/// Render the rule table by running each class's rules on a placeholder spoke.
///
/// Uses the same code path as [`derive`], so the output cannot drift from
/// what the engine actually does.
pub fn rule_table(hub: &Hub) -> Vec<ClassRule> {
    let placeholder: Ipv4Net = Ipv4Net::new_assert(std::net::Ipv4Addr::new(192, 0, 2, 0), 24);
    let inspection = AttachmentId::new("<inspection>");
    let ctx = RuleContext {
        internal_supernet: hub.internal_supernet(),
        inspection_attachment: Some(&inspection),
    };

    TrafficClass::iter()
        .map(|class| {
            let mut spoke = Spoke::new("<self>", placeholder, class);
            if class == TrafficClass::Inspection {
                spoke = spoke.with_firewall_endpoint("<endpoint>");
            }
            let facts = spoke_rules(&spoke, &ctx);

            let dest = |d: Ipv4Net| {
                if d == placeholder {
                    "<own cidr>".to_owned()
                } else {
                    d.to_string()
                }
            };
            let hop = |a: &AttachmentId| {
                if a == &spoke.attachment {
                    "self".to_owned()
                } else if a == &inspection {
                    "inspection".to_owned()
                } else {
                    a.to_string()
                }
            };

            ClassRule {
                class,
                associations: facts.associations.iter().map(|a| a.table).collect(),
                propagations: facts.propagations.iter().map(|p| p.table).collect(),
                static_routes: facts
                    .static_routes
                    .iter()
                    .map(|r| format!("{}: {} -> {}", r.table, dest(r.destination), hop(&r.next_hop)))
                    .collect(),
                local_routes: facts
                    .local_routes
                    .iter()
                    .map(|r| {
                        let side = match r.side {
                            LocalSide::Spoke => "",
                            LocalSide::Attachment => "attachment: ",
                        };
                        let target = match r.target {
                            LocalTarget::Hub => "hub",
                            LocalTarget::FirewallEndpoint(_) => "firewall endpoint",
                        };
                        format!("{side}{} -> {target}", dest(r.destination))
                    })
                    .collect(),
                appliance_mode: !facts.appliance_mode.is_empty(),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{HubId, HubTables};

    fn hub() -> Hub {
        Hub::new(
            HubId::default(),
            HubTables {
                firewall: "fw-rtb".into(),
                standard: "std-rtb".into(),
                inspection: "insp-rtb".into(),
            },
        )
        .unwrap()
    }

    fn topology(spokes: &[(&str, &str, TrafficClass)]) -> Topology {
        let mut topo = Topology::new(hub());
        for (id, cidr, class) in spokes {
            topo.add_spoke(Spoke::new(*id, cidr.parse().unwrap(), *class))
                .unwrap();
        }
        topo
    }

    #[test]
    fn inspected_spoke_only_propagates_into_firewall() {
        let topo = topology(&[
            ("fw", "100.64.0.0/16", TrafficClass::Inspection),
            ("a", "10.1.0.0/16", TrafficClass::Inspected),
        ]);
        let facts = derive(&topo).unwrap();
        let a = AttachmentId::from("a");

        assert!(facts.is_propagated(&a, TableRole::Firewall));
        assert!(!facts.is_propagated(&a, TableRole::Standard));
        assert_eq!(facts.associations_of(&a), vec![TableRole::Inspection]);
    }

    #[test]
    fn inspected_spoke_gets_return_route_through_firewall() {
        let topo = topology(&[
            ("fw", "100.64.0.0/16", TrafficClass::Inspection),
            ("a", "10.1.0.0/16", TrafficClass::Inspected),
        ]);
        let facts = derive(&topo).unwrap();
        let route = facts
            .static_routes_in(TableRole::Standard)
            .find(|r| r.destination.to_string() == "10.1.0.0/16")
            .unwrap();
        assert_eq!(route.next_hop.as_str(), "fw");
    }

    #[test]
    fn egress_installs_default_routes_in_two_tables() {
        let topo = topology(&[("egress", "10.10.0.0/16", TrafficClass::Egress)]);
        let facts = derive(&topo).unwrap();
        let tables: Vec<_> = facts
            .static_routes()
            .filter(|r| r.destination == default_route())
            .map(|r| r.table)
            .collect();
        assert_eq!(tables, vec![TableRole::Firewall, TableRole::Standard]);

        let local: Vec<_> = facts.local_routes().collect();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].destination.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn inspection_spoke_enables_appliance_mode() {
        let topo = topology(&[("fw", "100.64.0.0/16", TrafficClass::Inspection)]);
        let facts = derive(&topo).unwrap();
        let attachments: Vec<_> = facts.appliance_mode().map(AttachmentId::as_str).collect();
        assert_eq!(attachments, ["fw"]);
        assert_eq!(facts.propagations().count(), 0);
    }

    #[test]
    fn firewall_endpoint_adds_attachment_side_route() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(
            Spoke::new("fw", "100.64.0.0/16".parse().unwrap(), TrafficClass::Inspection)
                .with_firewall_endpoint("vpce-0fw"),
        )
        .unwrap();
        let facts = derive(&topo).unwrap();

        let routes: Vec<_> = facts.local_routes().collect();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].side, LocalSide::Spoke);
        assert_eq!(routes[1].side, LocalSide::Attachment);
        assert_eq!(routes[1].destination, default_route());
        assert_eq!(
            routes[1].target,
            LocalTarget::FirewallEndpoint("vpce-0fw".into())
        );
    }

    #[test]
    fn inspection_spoke_without_endpoint_has_no_attachment_route() {
        let topo = topology(&[("fw", "100.64.0.0/16", TrafficClass::Inspection)]);
        let facts = derive(&topo).unwrap();
        assert!(facts.local_routes().all(|r| r.side == LocalSide::Spoke));
    }

    #[test]
    fn missing_inspection_spoke_is_fatal() {
        let topo = topology(&[
            ("a", "10.1.0.0/16", TrafficClass::Inspected),
            ("b", "10.2.0.0/16", TrafficClass::Inspected),
            ("c", "10.3.0.0/16", TrafficClass::Standard),
        ]);
        let err = derive(&topo).unwrap_err();
        match err {
            CoreError::MissingInspectionSpoke { inspected } => {
                assert_eq!(inspected, vec![SpokeId::from("a"), SpokeId::from("b")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rule_table_covers_every_class() {
        let table = rule_table(&hub());
        assert_eq!(table.len(), 4);

        let inspected = table
            .iter()
            .find(|r| r.class == TrafficClass::Inspected)
            .unwrap();
        assert_eq!(inspected.associations, vec![TableRole::Inspection]);
        assert_eq!(inspected.propagations, vec![TableRole::Firewall]);
        assert_eq!(
            inspected.static_routes,
            vec!["standard: <own cidr> -> inspection".to_owned()]
        );
        assert_eq!(inspected.local_routes, vec!["0.0.0.0/0 -> hub".to_owned()]);

        let inspection = table
            .iter()
            .find(|r| r.class == TrafficClass::Inspection)
            .unwrap();
        assert_eq!(
            inspection.local_routes,
            vec![
                "0.0.0.0/0 -> hub".to_owned(),
                "attachment: 0.0.0.0/0 -> firewall endpoint".to_owned(),
            ]
        );
    }
}
