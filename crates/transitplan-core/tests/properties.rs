#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use transitplan_core::{
    CoreError, HubDescriptor, OpType, SpokeDescriptor, TableRole, TopologyDescriptor, TrafficClass,
    compile,
};

fn hub() -> HubDescriptor {
    HubDescriptor {
        id: "hub".into(),
        firewall_table: "fw".into(),
        standard_table: "std".into(),
        inspection_table: "insp".into(),
        internal_cidrs: Vec::new(),
        internal_supernet: None,
    }
}

/// A valid topology: one egress, one inspection, and `n` consumers with
/// disjoint `/16`s whose classes are drawn at random.
fn consumers() -> impl Strategy<Value = Vec<SpokeDescriptor>> {
    prop::collection::vec(prop::bool::ANY, 1..12).prop_map(|inspected| {
        let mut spokes = vec![
            SpokeDescriptor::new("egress", "10.200.0.0/16", TrafficClass::Egress),
            SpokeDescriptor::new("fw", "100.64.0.0/16", TrafficClass::Inspection),
        ];
        for (i, inspected) in inspected.into_iter().enumerate() {
            let class = if inspected {
                TrafficClass::Inspected
            } else {
                TrafficClass::Standard
            };
            spokes.push(SpokeDescriptor::new(
                format!("spoke-{i:02}"),
                format!("10.{i}.0.0/16"),
                class,
            ));
        }
        spokes
    })
}

fn shuffled() -> impl Strategy<Value = (Vec<SpokeDescriptor>, Vec<SpokeDescriptor>)> {
    consumers().prop_flat_map(|spokes| (Just(spokes.clone()), Just(spokes).prop_shuffle()))
}

proptest! {
    #[test]
    fn declaration_order_does_not_change_the_plan((original, permuted) in shuffled()) {
        let a = compile(&TopologyDescriptor { hub: hub(), spokes: original }).unwrap();
        let b = compile(&TopologyDescriptor { hub: hub(), spokes: permuted }).unwrap();

        let a = serde_json::to_string(&a.plan).unwrap();
        let b = serde_json::to_string(&b.plan).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn inspected_spokes_never_propagate_into_standard(spokes in consumers()) {
        let inspected: Vec<String> = spokes
            .iter()
            .filter(|s| s.traffic_class == TrafficClass::Inspected)
            .map(|s| s.id.clone())
            .collect();
        let compilation = compile(&TopologyDescriptor { hub: hub(), spokes }).unwrap();

        for op in compilation.plan.iter() {
            if op.op_type == OpType::Propagate && inspected.iter().any(|id| id == op.spoke.as_str()) {
                prop_assert_eq!(op.role, Some(TableRole::Firewall));
            }
        }
    }

    #[test]
    fn inspected_without_inspection_is_always_rejected(spokes in consumers()) {
        let has_inspected = spokes.iter().any(|s| s.traffic_class == TrafficClass::Inspected);
        let without_fw: Vec<_> = spokes.into_iter().filter(|s| s.id != "fw").collect();

        let result = compile(&TopologyDescriptor { hub: hub(), spokes: without_fw });
        if has_inspected {
            let is_missing = matches!(result, Err(CoreError::MissingInspectionSpoke { .. }));
            prop_assert!(is_missing);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
