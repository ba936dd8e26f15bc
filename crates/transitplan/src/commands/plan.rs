//! `plan`: compile a descriptor and print the ordered operations.

use tabled::Tabled;
use transitplan_core::{Compilation, Operation, RouteTableId, compile};

use crate::cli::{GlobalOpts, OutputFormat, PlanArgs};
use crate::config::{self, Config, Settings};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Operation")]
    op: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Attachment")]
    attachment: String,
    #[tabled(rename = "Spoke")]
    spoke: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Next Hop")]
    next_hop: String,
    #[tabled(rename = "Depends On")]
    depends_on: String,
}

fn dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".into())
}

fn table_cell(op: &Operation) -> String {
    match (&op.table, op.role) {
        (Some(table), Some(role)) => format!("{table} ({role})"),
        (Some(table), None) => table.to_string(),
        (None, _) => "-".into(),
    }
}

fn to_row(index: usize, op: &Operation) -> OperationRow {
    OperationRow {
        index,
        op: op.op_type.to_string(),
        table: table_cell(op),
        attachment: op.attachment.to_string(),
        spoke: op.spoke.to_string(),
        destination: dash(op.destination_cidr.map(|c| c.to_string())),
        next_hop: dash(op.next_hop.clone()),
        depends_on: if op.depends_on.is_empty() {
            "-".into()
        } else {
            op.depends_on
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        },
    }
}

/// `<op> <attachment> <table|-> [<destination> -> <next hop>]`
pub(crate) fn plain_line(op: &Operation) -> String {
    let mut line = format!(
        "{} {} {}",
        op.op_type,
        op.attachment,
        op.table.as_ref().map_or("-", RouteTableId::as_str)
    );
    if let (Some(dest), Some(hop)) = (op.destination_cidr, op.next_hop.as_deref()) {
        line.push_str(&format!(" {dest} -> {hop}"));
    }
    line
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(
    args: &PlanArgs,
    global: &GlobalOpts,
    cfg: &Config,
    settings: Settings,
) -> Result<(), CliError> {
    let descriptor = config::load_descriptor(&args.descriptor.file, global, cfg)?;
    let compilation = compile(&descriptor)?;

    if !settings.quiet {
        for advisory in &compilation.advisories {
            eprintln!(
                "{}: {advisory}",
                output::severity_label(advisory.severity(), settings.color)
            );
        }
    }

    let rendered = render(&compilation, args.full, settings.output)?;
    output::print_output(&rendered, settings.quiet);
    Ok(())
}

fn render(compilation: &Compilation, full: bool, format: OutputFormat) -> Result<String, CliError> {
    let operations = compilation.plan.operations();
    match format {
        OutputFormat::Table => {
            let rows: Vec<OperationRow> = operations
                .iter()
                .enumerate()
                .map(|(i, op)| to_row(i, op))
                .collect();
            Ok(format!(
                "Hub {} · {} operations\n{}",
                compilation.plan.hub,
                operations.len(),
                output::render_table(&rows)
            ))
        }
        OutputFormat::Plain => Ok(operations
            .iter()
            .map(plain_line)
            .collect::<Vec<_>>()
            .join("\n")),
        structured if full => output::render_structured(structured, compilation),
        structured => output::render_structured(structured, &compilation.plan),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use transitplan_core::{OpType, TableRole};

    use super::*;

    fn route() -> Operation {
        Operation {
            op_type: OpType::AddStaticRoute,
            table: Some("tgw-rtb-insp".into()),
            role: Some(TableRole::Inspection),
            attachment: "fw".into(),
            spoke: "fw".into(),
            destination_cidr: Some("0.0.0.0/0".parse().unwrap()),
            next_hop: Some("fw".into()),
            depends_on: vec![3],
        }
    }

    #[test]
    fn plain_line_includes_route() {
        assert_eq!(
            plain_line(&route()),
            "AddStaticRoute fw tgw-rtb-insp 0.0.0.0/0 -> fw"
        );
    }

    #[test]
    fn table_cell_shows_role() {
        assert_eq!(table_cell(&route()), "tgw-rtb-insp (inspection)");
    }
}
