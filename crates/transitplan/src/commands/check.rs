//! `check`: report every consistency violation without emitting a plan.

use tabled::Tabled;
use transitplan_core::{Topology, Violation, ViolationReport, check, derive};

use crate::cli::{DescriptorArgs, GlobalOpts};
use crate::config::{self, Config, Settings};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Spokes")]
    spokes: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn to_row(violation: &Violation, color: bool) -> ViolationRow {
    let spokes = violation.spokes();
    ViolationRow {
        severity: output::severity_label(violation.severity(), color),
        kind: violation.kind().to_string(),
        spokes: if spokes.is_empty() {
            "-".into()
        } else {
            spokes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        },
        detail: violation.to_string(),
    }
}

fn plain_line(violation: &Violation) -> String {
    format!("{} {}: {violation}", violation.severity(), violation.kind())
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
    let report = ViolationReport::new(check(&facts));

    if report.is_empty() {
        if !settings.quiet {
            eprintln!("✓ {} spokes, no violations", topology.len());
        }
        return Ok(());
    }

    let rendered = output::render_list(
        settings.output,
        report.violations(),
        |v| to_row(v, settings.color),
        plain_line,
    )?;
    output::print_output(&rendered, settings.quiet);

    if report.has_fatal() {
        return Err(CliError::Violations {
            summary: report.to_string(),
        });
    }
    Ok(())
}
