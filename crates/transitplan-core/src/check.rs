//! Consistency checker.
//!
//! [`check`] runs every invariant over a fact set and returns all violations
//! at once. [`validate`] is the gate in front of the emitter: it is the only
//! way to obtain [`ValidatedFacts`], and it refuses any fact set with a fatal
//! violation.

use std::collections::BTreeMap;
use std::fmt;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoEnumIterator};
use tracing::{debug, warn};

use crate::facts::RoutingFacts;
use crate::model::ids::join_ids;
use crate::model::{AttachmentId, Spoke, SpokeId, TableRole, TrafficClass, default_route};

// ── Violation types ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationKind {
    Bypass,
    Exclusivity,
    RouteCollision,
    Unreachable,
    UnknownReference,
    Unassociated,
    IdleInspection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// Blocks emission.
    Fatal,
    /// Reported, but the plan is still emitted.
    Advisory,
}

/// Which kind of fact opened an inspection bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BypassPath {
    Propagation,
    Association,
    StaticRoute,
}

/// A competing claim on one destination within a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum RouteClaim {
    Static { next_hop: AttachmentId },
    Propagated { attachment: AttachmentId },
}

impl fmt::Display for RouteClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { next_hop } => write!(f, "static → {next_hop}"),
            Self::Propagated { attachment } => write!(f, "propagated from {attachment}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum UnreachableReason {
    NotAssociated { at: SpokeId },
    NoDefaultRoute { at: SpokeId, table: TableRole },
    UnknownNextHop { table: TableRole, next_hop: AttachmentId },
    Loop { path: Vec<SpokeId> },
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAssociated { at } => write!(f, "'{at}' is not associated with any table"),
            Self::NoDefaultRoute { at, table } => {
                write!(f, "{table} table (used by '{at}') has no 0.0.0.0/0 route")
            }
            Self::UnknownNextHop { table, next_hop } => {
                write!(f, "{table} table default points at unknown attachment '{next_hop}'")
            }
            Self::Loop { path } => write!(f, "routing loop {}", path_string(path)),
        }
    }
}

fn path_string(path: &[SpokeId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Inspected traffic can reach something without crossing the firewall.
    Bypass {
        spoke: SpokeId,
        attachment: AttachmentId,
        table: TableRole,
        path: BypassPath,
    },
    /// Attachment associated with more than one table.
    Exclusivity {
        attachment: AttachmentId,
        tables: Vec<TableRole>,
    },
    /// More than one route claims the same destination in a table.
    RouteCollision {
        table: TableRole,
        destination: Ipv4Net,
        claimants: Vec<RouteClaim>,
    },
    /// A spoke's default route does not end at the egress or inspection spoke.
    Unreachable {
        spoke: SpokeId,
        reason: UnreachableReason,
    },
    /// A fact names an attachment or spoke that was never declared.
    UnknownReference {
        reference: String,
        referenced_by: String,
    },
    /// An egress or inspection spoke whose attachment sits in no hub table.
    Unassociated {
        spoke: SpokeId,
        attachment: AttachmentId,
    },
    /// An inspection spoke with nothing to inspect.
    IdleInspection { spoke: SpokeId },
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::Bypass { .. } => ViolationKind::Bypass,
            Self::Exclusivity { .. } => ViolationKind::Exclusivity,
            Self::RouteCollision { .. } => ViolationKind::RouteCollision,
            Self::Unreachable { .. } => ViolationKind::Unreachable,
            Self::UnknownReference { .. } => ViolationKind::UnknownReference,
            Self::Unassociated { .. } => ViolationKind::Unassociated,
            Self::IdleInspection { .. } => ViolationKind::IdleInspection,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::IdleInspection { .. } => Severity::Advisory,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Spokes this violation is about.
    pub fn spokes(&self) -> Vec<SpokeId> {
        match self {
            Self::Bypass { spoke, .. }
            | Self::Unreachable { spoke, .. }
            | Self::Unassociated { spoke, .. }
            | Self::IdleInspection { spoke } => vec![spoke.clone()],
            Self::Exclusivity { .. }
            | Self::RouteCollision { .. }
            | Self::UnknownReference { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bypass {
                spoke,
                attachment,
                table,
                path,
            } => write!(
                f,
                "'{spoke}' ({attachment}) bypasses inspection via {path} in the {table} table"
            ),
            Self::Exclusivity { attachment, tables } => write!(
                f,
                "attachment '{attachment}' is associated with {} tables: {}",
                tables.len(),
                join_ids(tables)
            ),
            Self::RouteCollision {
                table,
                destination,
                claimants,
            } => write!(
                f,
                "{destination} in the {table} table is claimed by {}",
                join_ids(claimants)
            ),
            Self::Unreachable { spoke, reason } => {
                write!(f, "'{spoke}' has no path to egress or inspection: {reason}")
            }
            Self::UnknownReference {
                reference,
                referenced_by,
            } => write!(f, "{referenced_by} references undeclared '{reference}'"),
            Self::Unassociated { spoke, attachment } => write!(
                f,
                "'{spoke}' ({attachment}) is not associated with any hub table"
            ),
            Self::IdleInspection { spoke } => {
                write!(f, "inspection spoke '{spoke}' has no inspected spokes")
            }
        }
    }
}

// ── Report ──────────────────────────────────────────────────────────

/// Every violation found in one check run, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_fatal())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_fatal())
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal().next().is_some()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind() == kind).count()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn spokes(&self) -> Vec<SpokeId> {
        let mut spokes: Vec<SpokeId> = self.violations.iter().flat_map(Violation::spokes).collect();
        spokes.sort();
        spokes.dedup();
        spokes
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fatal = self.fatal().count();
        let mut kinds: Vec<ViolationKind> = self.fatal().map(Violation::kind).collect();
        kinds.sort();
        kinds.dedup();
        write!(
            f,
            "{fatal} fatal violation{} ({})",
            if fatal == 1 { "" } else { "s" },
            join_ids(&kinds)
        )
    }
}

// ── Validated facts ─────────────────────────────────────────────────

/// A fact set that passed every fatal check. Only [`validate`] builds one.
#[derive(Debug, Clone)]
pub struct ValidatedFacts {
    facts: RoutingFacts,
    advisories: Vec<Violation>,
}

impl ValidatedFacts {
    pub fn facts(&self) -> &RoutingFacts {
        &self.facts
    }

    pub fn advisories(&self) -> &[Violation] {
        &self.advisories
    }
}

/// Check `facts` and hand them back as [`ValidatedFacts`] if nothing fatal was found.
pub fn validate(facts: RoutingFacts) -> Result<ValidatedFacts, ViolationReport> {
    let report = ViolationReport::new(check(&facts));
    if report.has_fatal() {
        return Err(report);
    }
    for advisory in report.advisories() {
        warn!(%advisory, "topology advisory");
    }
    Ok(ValidatedFacts {
        facts,
        advisories: report.into_violations(),
    })
}

// ── Checks ──────────────────────────────────────────────────────────

/// Run every check; never stops at the first problem.
pub fn check(facts: &RoutingFacts) -> Vec<Violation> {
    let mut violations = Vec::new();
    violations.extend(check_bypass(facts));
    violations.extend(check_exclusivity(facts));
    violations.extend(check_route_collisions(facts));
    violations.extend(check_references(facts));
    violations.extend(check_reachability(facts));
    violations.extend(check_exit_associations(facts));
    violations.extend(check_idle_inspection(facts));

    debug!(
        facts = facts.fact_count(),
        violations = violations.len(),
        "consistency check complete"
    );
    violations
}

/// Inspected traffic must enter and leave through the firewall table only.
fn check_bypass(facts: &RoutingFacts) -> Vec<Violation> {
    let mut out = Vec::new();

    for propagation in facts.propagations() {
        let Some(spoke) = facts.spoke_by_attachment(&propagation.attachment) else {
            continue;
        };
        let leaks = match spoke.class {
            TrafficClass::Inspected => propagation.table != TableRole::Firewall,
            TrafficClass::Inspection => false,
            TrafficClass::Egress | TrafficClass::Standard => {
                propagation.table == TableRole::Inspection
            }
        };
        if leaks {
            out.push(bypass(spoke, propagation.table, BypassPath::Propagation));
        }
    }

    for association in facts.associations() {
        let Some(spoke) = facts.spoke_by_attachment(&association.attachment) else {
            continue;
        };
        if spoke.class == TrafficClass::Inspected && association.table != TableRole::Inspection {
            out.push(bypass(spoke, association.table, BypassPath::Association));
        }
    }

    for route in facts.static_routes_in(TableRole::Inspection) {
        let Some(spoke) = facts.spoke_by_attachment(&route.next_hop) else {
            continue;
        };
        if spoke.class != TrafficClass::Inspection {
            out.push(bypass(spoke, route.table, BypassPath::StaticRoute));
        }
    }

    out
}

fn bypass(spoke: &Spoke, table: TableRole, path: BypassPath) -> Violation {
    Violation::Bypass {
        spoke: spoke.id.clone(),
        attachment: spoke.attachment.clone(),
        table,
        path,
    }
}

fn check_exclusivity(facts: &RoutingFacts) -> Vec<Violation> {
    let mut by_attachment: BTreeMap<&AttachmentId, Vec<TableRole>> = BTreeMap::new();
    for association in facts.associations() {
        by_attachment
            .entry(&association.attachment)
            .or_default()
            .push(association.table);
    }

    by_attachment
        .into_iter()
        .filter(|(_, tables)| tables.len() > 1)
        .map(|(attachment, tables)| Violation::Exclusivity {
            attachment: attachment.clone(),
            tables,
        })
        .collect()
}

fn check_route_collisions(facts: &RoutingFacts) -> Vec<Violation> {
    let mut out = Vec::new();

    for table in TableRole::iter() {
        let mut claims: BTreeMap<Ipv4Net, Vec<RouteClaim>> = BTreeMap::new();
        for route in facts.static_routes_in(table) {
            claims
                .entry(route.destination)
                .or_default()
                .push(RouteClaim::Static {
                    next_hop: route.next_hop.clone(),
                });
        }

        for propagation in facts.propagations_into(table) {
            let Some(spoke) = facts.spoke_by_attachment(&propagation.attachment) else {
                continue;
            };
            if let Some(existing) = claims.get_mut(&spoke.cidr) {
                existing.push(RouteClaim::Propagated {
                    attachment: propagation.attachment.clone(),
                });
            }
        }

        out.extend(
            claims
                .into_iter()
                .filter(|(_, claimants)| claimants.len() > 1)
                .map(|(destination, claimants)| Violation::RouteCollision {
                    table,
                    destination,
                    claimants,
                }),
        );
    }

    out
}

fn check_references(facts: &RoutingFacts) -> Vec<Violation> {
    let known = |a: &AttachmentId| facts.spoke_by_attachment(a).is_some();
    let mut out = Vec::new();
    let mut unknown = |reference: &str, referenced_by: String| {
        out.push(Violation::UnknownReference {
            reference: reference.to_owned(),
            referenced_by,
        });
    };

    for a in facts.associations().filter(|a| !known(&a.attachment)) {
        unknown(a.attachment.as_str(), format!("association with the {} table", a.table));
    }
    for p in facts.propagations().filter(|p| !known(&p.attachment)) {
        unknown(p.attachment.as_str(), format!("propagation into the {} table", p.table));
    }
    for r in facts.static_routes().filter(|r| !known(&r.next_hop)) {
        unknown(
            r.next_hop.as_str(),
            format!("static route {} in the {} table", r.destination, r.table),
        );
    }
    for r in facts.local_routes().filter(|r| facts.spoke(&r.spoke).is_none()) {
        unknown(r.spoke.as_str(), format!("local route {}", r.destination));
    }
    for a in facts.appliance_mode().filter(|a| !known(a)) {
        unknown(a.as_str(), "appliance mode".to_owned());
    }

    out
}

fn check_reachability(facts: &RoutingFacts) -> Vec<Violation> {
    facts
        .spokes()
        .filter(|s| s.class != TrafficClass::Inspection)
        .filter_map(|spoke| {
            resolve_default_route(facts, spoke)
                .err()
                .map(|reason| Violation::Unreachable {
                    spoke: spoke.id.clone(),
                    reason,
                })
        })
        .collect()
}

/// Follow associated table → default route → next-hop spoke until an exit.
fn resolve_default_route(facts: &RoutingFacts, start: &Spoke) -> Result<(), UnreachableReason> {
    let mut path = vec![start.id.clone()];
    let mut current = start;

    loop {
        if current.class.is_exit() {
            return Ok(());
        }

        let Some(table) = facts.associations_of(&current.attachment).first().copied() else {
            return Err(UnreachableReason::NotAssociated {
                at: current.id.clone(),
            });
        };

        let Some(route) = facts
            .static_routes_in(table)
            .find(|r| r.destination == default_route())
        else {
            return Err(UnreachableReason::NoDefaultRoute {
                at: current.id.clone(),
                table,
            });
        };

        let Some(next) = facts.spoke_by_attachment(&route.next_hop) else {
            return Err(UnreachableReason::UnknownNextHop {
                table,
                next_hop: route.next_hop.clone(),
            });
        };

        let seen = path.contains(&next.id);
        path.push(next.id.clone());
        if seen {
            return Err(UnreachableReason::Loop { path });
        }
        current = next;
    }
}

/// Exit spokes end the reachability walk before their own association is
/// looked at, so they are checked here. Every other spoke is covered by
/// `check_reachability`.
fn check_exit_associations(facts: &RoutingFacts) -> Vec<Violation> {
    facts
        .spokes()
        .filter(|s| s.class.is_exit())
        .filter(|s| facts.associations_of(&s.attachment).is_empty())
        .map(|s| Violation::Unassociated {
            spoke: s.id.clone(),
            attachment: s.attachment.clone(),
        })
        .collect()
}

fn check_idle_inspection(facts: &RoutingFacts) -> Vec<Violation> {
    let has_inspected = facts.spokes().any(|s| s.class == TrafficClass::Inspected);
    if has_inspected {
        return Vec::new();
    }
    facts
        .spokes()
        .filter(|s| s.class == TrafficClass::Inspection)
        .map(|s| Violation::IdleInspection { spoke: s.id.clone() })
        .collect()
}
