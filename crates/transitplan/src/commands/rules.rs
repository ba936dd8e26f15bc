//! `rules`: print the traffic-class rule table the engine applies.

use tabled::Tabled;
use transitplan_core::{
    ClassRule, Hub, HubId, HubTables, RouteTableId, TableRole, Topology, TopologyDescriptor,
    rule_table,
};

use crate::cli::GlobalOpts;
use crate::config::{Config, Settings};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Associate")]
    associate: String,
    #[tabled(rename = "Propagate")]
    propagate: String,
    #[tabled(rename = "Hub Static Routes")]
    static_routes: String,
    #[tabled(rename = "Local Routes")]
    local_routes: String,
    #[tabled(rename = "Appliance Mode")]
    appliance_mode: String,
}

fn list<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".into();
    }
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_row(rule: &ClassRule) -> RuleRow {
    RuleRow {
        class: rule.class.to_string(),
        associate: list(&rule.associations),
        propagate: list(&rule.propagations),
        static_routes: list(&rule.static_routes),
        local_routes: list(&rule.local_routes),
        appliance_mode: if rule.appliance_mode { "yes" } else { "-" }.into(),
    }
}

fn plain_line(rule: &ClassRule) -> String {
    let roles = |roles: &[TableRole]| {
        roles
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "{} associate={} propagate={}",
        rule.class,
        roles(&rule.associations),
        roles(&rule.propagations)
    )
}

/// The profile's hub when one is selected, else a hub with role-named tables.
fn hub(global: &GlobalOpts, cfg: &Config) -> Result<Hub, CliError> {
    if let Some((_, profile)) = cfg.profile(global.profile.as_deref())? {
        let descriptor = TopologyDescriptor {
            hub: profile.hub_descriptor(),
            spokes: Vec::new(),
        };
        return Ok(Topology::from_descriptor(&descriptor)?.hub().clone());
    }

    let tables = HubTables {
        firewall: RouteTableId::new(TableRole::Firewall.to_string()),
        standard: RouteTableId::new(TableRole::Standard.to_string()),
        inspection: RouteTableId::new(TableRole::Inspection.to_string()),
    };
    Ok(Hub::new(HubId::default(), tables)?)
}

pub fn handle(global: &GlobalOpts, cfg: &Config, settings: Settings) -> Result<(), CliError> {
    let rules = rule_table(&hub(global, cfg)?);
    let rendered = output::render_list(settings.output, &rules, to_row, plain_line)?;
    output::print_output(&rendered, settings.quiet);
    Ok(())
}
