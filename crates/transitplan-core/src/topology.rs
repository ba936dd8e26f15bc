// ── Topology model ──
//
// The declared state: one hub and the spokes attached to it. Construction
// validates addressing and identity invariants eagerly, so a `Topology`
// value is always well-formed. Nothing is derived here; routing facts come
// from `rules::derive`.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use tracing::debug;

use crate::descriptor::{HubDescriptor, SpokeDescriptor, TopologyDescriptor};
use crate::error::CoreError;
use crate::model::{
    AttachmentId, EndpointId, Hub, HubId, HubTables, RouteTableId, Spoke, SpokeId, TrafficClass,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    hub: Hub,
    /// Keyed by id so iteration order never depends on declaration order.
    spokes: BTreeMap<SpokeId, Spoke>,
}

impl Topology {
    pub fn new(hub: Hub) -> Self {
        Self {
            hub,
            spokes: BTreeMap::new(),
        }
    }

    /// Parse a descriptor and add its spokes in declaration order.
    pub fn from_descriptor(descriptor: &TopologyDescriptor) -> Result<Self, CoreError> {
        let mut topology = Self::new(parse_hub(&descriptor.hub)?);
        for spoke in &descriptor.spokes {
            topology.add_spoke(parse_spoke(spoke)?)?;
        }
        Ok(topology)
    }

    /// Add a spoke, or leave the topology untouched and report why not.
    pub fn add_spoke(&mut self, mut spoke: Spoke) -> Result<(), CoreError> {
        if self.spokes.contains_key(&spoke.id) {
            return Err(CoreError::DuplicateSpoke { spoke: spoke.id });
        }

        if spoke.cidr.trunc() != spoke.cidr {
            return Err(CoreError::InvalidCidr {
                subject: format!("spoke '{}'", spoke.id),
                value: spoke.cidr.to_string(),
                reason: format!("host bits set, expected {}", spoke.cidr.trunc()),
            });
        }

        if let Some(internal) = self
            .hub
            .internal_cidrs()
            .iter()
            .find(|internal| spoke.overlaps(internal))
        {
            return Err(CoreError::DuplicateCidr {
                spoke: spoke.id,
                cidr: spoke.cidr,
                conflict: "hub".into(),
                conflict_cidr: *internal,
            });
        }

        for existing in self.spokes.values() {
            if existing.overlaps(&spoke.cidr) {
                return Err(CoreError::DuplicateCidr {
                    spoke: spoke.id,
                    cidr: spoke.cidr,
                    conflict: format!("spoke '{}'", existing.id),
                    conflict_cidr: existing.cidr,
                });
            }
            if existing.attachment == spoke.attachment {
                return Err(CoreError::DuplicateAttachment {
                    attachment: spoke.attachment,
                    spoke: spoke.id,
                    existing: existing.id.clone(),
                });
            }
        }

        if spoke.class == TrafficClass::Inspection {
            if let Some(existing) = self.inspection_spoke() {
                return Err(CoreError::DuplicateInspectionSpoke {
                    spoke: spoke.id,
                    existing: existing.id.clone(),
                });
            }
            spoke.attachment_route_table = Some(spoke.attachment_side_table());
        } else if let Some(field) = inspection_only_field(&spoke) {
            return Err(CoreError::InspectionOnlyField {
                spoke: spoke.id,
                field,
            });
        }

        debug!(spoke = %spoke.id, cidr = %spoke.cidr, class = %spoke.class, "spoke added");
        self.spokes.insert(spoke.id.clone(), spoke);
        Ok(())
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Spokes in ascending id order.
    pub fn spokes(&self) -> impl Iterator<Item = &Spoke> {
        self.spokes.values()
    }

    pub fn spoke(&self, id: &SpokeId) -> Option<&Spoke> {
        self.spokes.get(id)
    }

    pub fn len(&self) -> usize {
        self.spokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spokes.is_empty()
    }

    /// The firewall segment, if declared.
    pub fn inspection_spoke(&self) -> Option<&Spoke> {
        self.spokes_of(TrafficClass::Inspection).next()
    }

    pub fn spokes_of(&self, class: TrafficClass) -> impl Iterator<Item = &Spoke> {
        self.spokes.values().filter(move |s| s.class == class)
    }

    pub(crate) fn spoke_map(&self) -> &BTreeMap<SpokeId, Spoke> {
        &self.spokes
    }

    /// Normalized descriptor: every default spelled out, spokes sorted by id.
    ///
    /// Recompiling the result yields the same plan as compiling `self`.
    pub fn descriptor(&self) -> TopologyDescriptor {
        let mut internal_cidrs: Vec<String> = self
            .hub
            .internal_cidrs()
            .iter()
            .map(ToString::to_string)
            .collect();
        internal_cidrs.sort();

        TopologyDescriptor {
            hub: HubDescriptor {
                id: self.hub.id().to_string(),
                firewall_table: self.hub.tables().firewall.to_string(),
                standard_table: self.hub.tables().standard.to_string(),
                inspection_table: self.hub.tables().inspection.to_string(),
                internal_cidrs,
                internal_supernet: Some(self.hub.internal_supernet().to_string()),
            },
            spokes: self
                .spokes
                .values()
                .map(|spoke| SpokeDescriptor {
                    id: spoke.id.to_string(),
                    cidr: spoke.cidr.to_string(),
                    traffic_class: spoke.class,
                    attachment: Some(spoke.attachment.to_string()),
                    local_route_table: Some(spoke.local_route_table.to_string()),
                    firewall_endpoint: spoke.firewall_endpoint.as_ref().map(ToString::to_string),
                    attachment_route_table: spoke
                        .attachment_route_table
                        .as_ref()
                        .map(ToString::to_string),
                })
                .collect(),
        }
    }
}

fn inspection_only_field(spoke: &Spoke) -> Option<&'static str> {
    if spoke.firewall_endpoint.is_some() {
        Some("firewall_endpoint")
    } else if spoke.attachment_route_table.is_some() {
        Some("attachment_route_table")
    } else {
        None
    }
}

// ── Descriptor parsing ──────────────────────────────────────────────

fn parse_cidr(subject: &str, raw: &str) -> Result<Ipv4Net, CoreError> {
    raw.trim()
        .parse::<Ipv4Net>()
        .map_err(|e| CoreError::InvalidCidr {
            subject: subject.into(),
            value: raw.into(),
            reason: e.to_string(),
        })
}

fn parse_hub(desc: &HubDescriptor) -> Result<Hub, CoreError> {
    let tables = HubTables {
        firewall: RouteTableId::new(desc.firewall_table.as_str()),
        standard: RouteTableId::new(desc.standard_table.as_str()),
        inspection: RouteTableId::new(desc.inspection_table.as_str()),
    };

    let internal = desc
        .internal_cidrs
        .iter()
        .map(|raw| parse_cidr("hub internal addressing", raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut hub = Hub::new(HubId::new(desc.id.as_str()), tables)?.with_internal_cidrs(internal);
    if let Some(ref raw) = desc.internal_supernet {
        hub = hub.with_internal_supernet(parse_cidr("hub internal supernet", raw)?);
    }
    Ok(hub)
}

fn parse_spoke(desc: &SpokeDescriptor) -> Result<Spoke, CoreError> {
    let cidr = parse_cidr(&format!("spoke '{}'", desc.id), &desc.cidr)?;
    let mut spoke = Spoke::new(desc.id.as_str(), cidr, desc.traffic_class);
    if let Some(ref attachment) = desc.attachment {
        spoke = spoke.with_attachment(AttachmentId::new(attachment.as_str()));
    }
    if let Some(ref table) = desc.local_route_table {
        spoke = spoke.with_local_route_table(RouteTableId::new(table.as_str()));
    }
    if let Some(ref endpoint) = desc.firewall_endpoint {
        spoke = spoke.with_firewall_endpoint(EndpointId::new(endpoint.as_str()));
    }
    if let Some(ref table) = desc.attachment_route_table {
        spoke = spoke.with_attachment_route_table(RouteTableId::new(table.as_str()));
    }
    Ok(spoke)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

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

    fn spoke(id: &str, cidr: &str, class: TrafficClass) -> Spoke {
        Spoke::new(id, cidr.parse().unwrap(), class)
    }

    #[test]
    fn overlapping_cidr_is_rejected() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(spoke("a", "10.1.0.0/16", TrafficClass::Inspected))
            .unwrap();
        let err = topo
            .add_spoke(spoke("b", "10.1.0.0/24", TrafficClass::Standard))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateCidr { ref spoke, .. } if spoke.as_str() == "b"));
        assert_eq!(topo.len(), 1);
    }

    #[test]
    fn hub_internal_addressing_is_reserved() {
        let mut topo = Topology::new(hub().with_internal_cidrs(["100.64.0.0/10".parse().unwrap()]));
        let err = topo
            .add_spoke(spoke("fw", "100.64.0.0/16", TrafficClass::Inspection))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateCidr { ref conflict, .. } if conflict == "hub"));
    }

    #[test]
    fn second_inspection_spoke_is_rejected() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(spoke("fw1", "100.64.0.0/16", TrafficClass::Inspection))
            .unwrap();
        let err = topo
            .add_spoke(spoke("fw2", "100.65.0.0/16", TrafficClass::Inspection))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateInspectionSpoke { .. }));
    }

    #[test]
    fn duplicate_ids_and_attachments_are_rejected() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(spoke("a", "10.1.0.0/16", TrafficClass::Standard))
            .unwrap();

        let err = topo
            .add_spoke(spoke("a", "10.2.0.0/16", TrafficClass::Standard))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSpoke { .. }));

        let err = topo
            .add_spoke(spoke("b", "10.2.0.0/16", TrafficClass::Standard).with_attachment("a"))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateAttachment { .. }));
    }

    #[test]
    fn firewall_endpoint_only_on_inspection_spoke() {
        let mut topo = Topology::new(hub());
        let err = topo
            .add_spoke(
                spoke("c", "10.3.0.0/16", TrafficClass::Standard).with_firewall_endpoint("vpce-0"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InspectionOnlyField { field: "firewall_endpoint", .. }
        ));
        assert!(topo.is_empty());
    }

    #[test]
    fn endpoint_survives_descriptor_round_trip() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(
            spoke("fw", "100.64.0.0/16", TrafficClass::Inspection).with_firewall_endpoint("vpce-0"),
        )
        .unwrap();

        let desc = topo.descriptor();
        assert_eq!(desc.spokes[0].firewall_endpoint.as_deref(), Some("vpce-0"));
        assert_eq!(
            desc.spokes[0].attachment_route_table.as_deref(),
            Some("fw-attachment")
        );
        assert_eq!(Topology::from_descriptor(&desc).unwrap(), topo);
    }

    #[test]
    fn host_bits_are_rejected() {
        let mut topo = Topology::new(hub());
        let err = topo
            .add_spoke(spoke("a", "10.1.2.3/16", TrafficClass::Standard))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCidr { .. }));
    }

    #[test]
    fn unparseable_cidr_names_the_spoke() {
        let desc = TopologyDescriptor {
            hub: HubDescriptor {
                id: "hub".into(),
                firewall_table: "fw".into(),
                standard_table: "std".into(),
                inspection_table: "insp".into(),
                internal_cidrs: Vec::new(),
                internal_supernet: None,
            },
            spokes: vec![SpokeDescriptor::new("a", "10.1.0.0/33", TrafficClass::Standard)],
        };
        let err = Topology::from_descriptor(&desc).unwrap_err();
        assert!(err.to_string().contains("spoke 'a'"));
    }

    #[test]
    fn descriptor_is_sorted_and_explicit() {
        let mut topo = Topology::new(hub());
        topo.add_spoke(spoke("z", "10.9.0.0/16", TrafficClass::Standard))
            .unwrap();
        topo.add_spoke(spoke("b", "10.2.0.0/16", TrafficClass::Egress))
            .unwrap();

        let desc = topo.descriptor();
        let ids: Vec<_> = desc.spokes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b", "z"]);
        assert_eq!(desc.spokes[0].attachment.as_deref(), Some("b"));
        assert_eq!(desc.hub.internal_supernet.as_deref(), Some("10.0.0.0/8"));
        assert_eq!(Topology::from_descriptor(&desc).unwrap(), topo);
    }
}
