//! `facts`: print what the rule engine derived, before any checking.

use tabled::Tabled;
use transitplan_core::{LocalSide, LocalTarget, RoutingFacts, Topology, derive};

use crate::cli::{DescriptorArgs, GlobalOpts};
use crate::config::{self, Config, Settings};
use crate::error::CliError;
use crate::output;

/// One derived fact, flattened for display.
#[derive(Tabled)]
struct FactRow {
    #[tabled(rename = "Fact")]
    fact: &'static str,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Next Hop")]
    next_hop: String,
}

fn rows(facts: &RoutingFacts) -> Vec<FactRow> {
    let hub = facts.hub();
    let mut rows = Vec::with_capacity(facts.fact_count());

    rows.extend(facts.associations().map(|a| FactRow {
        fact: "associate",
        table: a.table.to_string(),
        subject: a.attachment.to_string(),
        destination: "-".into(),
        next_hop: "-".into(),
    }));
    rows.extend(facts.propagations().map(|p| FactRow {
        fact: "propagate",
        table: p.table.to_string(),
        subject: p.attachment.to_string(),
        destination: "-".into(),
        next_hop: "-".into(),
    }));
    rows.extend(facts.static_routes().map(|r| FactRow {
        fact: "static-route",
        table: r.table.to_string(),
        subject: r.next_hop.to_string(),
        destination: r.destination.to_string(),
        next_hop: r.next_hop.to_string(),
    }));
    rows.extend(facts.local_routes().map(|r| FactRow {
        fact: "local-route",
        table: facts.spoke(&r.spoke).map_or_else(
            || "-".into(),
            |s| match r.side {
                LocalSide::Spoke => s.local_route_table.to_string(),
                LocalSide::Attachment => s.attachment_side_table().to_string(),
            },
        ),
        subject: r.spoke.to_string(),
        destination: r.destination.to_string(),
        next_hop: match &r.target {
            LocalTarget::Hub => hub.id().to_string(),
            LocalTarget::FirewallEndpoint(endpoint) => endpoint.to_string(),
        },
    }));
    rows.extend(facts.appliance_mode().map(|a| FactRow {
        fact: "appliance-mode",
        table: "-".into(),
        subject: a.to_string(),
        destination: "-".into(),
        next_hop: "-".into(),
    }));
    rows
}

fn plain_line(row: &FactRow) -> String {
    [
        row.fact,
        row.table.as_str(),
        row.subject.as_str(),
        row.destination.as_str(),
        row.next_hop.as_str(),
    ]
    .join(" ")
}

pub fn handle(
    args: &DescriptorArgs,
    global: &GlobalOpts,
    cfg: &Config,
    settings: Settings,
) -> Result<(), CliError> {
    let descriptor = config::load_descriptor(&args.file, global, cfg)?;
    let topology = Topology::from_descriptor(&descriptor)?;
    let facts = derive(&topology)?;

    // Structured formats serialize the fact set itself, not the display rows.
    let rendered = output::render_single(
        settings.output,
        &facts,
        |f| output::render_table(&rows(f)),
        |f| rows(f).iter().map(plain_line).collect::<Vec<_>>().join("\n"),
    )?;
    output::print_output(&rendered, settings.quiet);
    Ok(())
}
