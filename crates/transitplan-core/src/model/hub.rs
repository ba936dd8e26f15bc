// ── Hub and route-table roles ──

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::ids::{HubId, RouteTableId};
use crate::error::CoreError;

/// Symbolic role of a hub route table.
///
/// Declaration order is the order tables are listed in plans and reports.
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
#[strum(serialize_all = "lowercase")]
pub enum TableRole {
    /// Consulted for traffic leaving the firewall segment.
    Firewall,
    /// Shared table for trusted spokes and the egress segment.
    Standard,
    /// Where inspected spokes live; everything defaults to the firewall.
    Inspection,
}

/// Identifiers of the three hub route tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubTables {
    pub firewall: RouteTableId,
    pub standard: RouteTableId,
    pub inspection: RouteTableId,
}

impl HubTables {
    pub fn get(&self, role: TableRole) -> &RouteTableId {
        match role {
            TableRole::Firewall => &self.firewall,
            TableRole::Standard => &self.standard,
            TableRole::Inspection => &self.inspection,
        }
    }
}

/// Address space routed back to the hub from the egress segment.
pub const DEFAULT_INTERNAL_SUPERNET: Ipv4Net = Ipv4Net::new_assert(Ipv4Addr::new(10, 0, 0, 0), 8);

/// The central transit hub. Exactly one per topology, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    id: HubId,
    tables: HubTables,
    internal_cidrs: Vec<Ipv4Net>,
    internal_supernet: Ipv4Net,
}

impl Hub {
    /// Build a hub, rejecting table identifiers that are not pairwise distinct.
    pub fn new(id: HubId, tables: HubTables) -> Result<Self, CoreError> {
        let pairs = [
            (TableRole::Firewall, TableRole::Standard),
            (TableRole::Firewall, TableRole::Inspection),
            (TableRole::Standard, TableRole::Inspection),
        ];
        for (a, b) in pairs {
            if tables.get(a) == tables.get(b) {
                return Err(CoreError::DuplicateRouteTable {
                    table: tables.get(a).clone(),
                    first: a,
                    second: b,
                });
            }
        }

        Ok(Self {
            id,
            tables,
            internal_cidrs: Vec::new(),
            internal_supernet: DEFAULT_INTERNAL_SUPERNET,
        })
    }

    /// Address blocks owned by the hub itself; spokes may not overlap them.
    pub fn with_internal_cidrs(mut self, cidrs: impl IntoIterator<Item = Ipv4Net>) -> Self {
        self.internal_cidrs = cidrs.into_iter().collect();
        self.internal_cidrs.sort();
        self.internal_cidrs.dedup();
        self
    }

    pub fn with_internal_supernet(mut self, supernet: Ipv4Net) -> Self {
        self.internal_supernet = supernet;
        self
    }

    pub fn id(&self) -> &HubId {
        &self.id
    }

    pub fn tables(&self) -> &HubTables {
        &self.tables
    }

    pub fn table_id(&self, role: TableRole) -> &RouteTableId {
        self.tables.get(role)
    }

    pub fn internal_cidrs(&self) -> &[Ipv4Net] {
        &self.internal_cidrs
    }

    pub fn internal_supernet(&self) -> Ipv4Net {
        self.internal_supernet
    }
}
