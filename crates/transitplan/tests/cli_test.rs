//! Integration tests for the `transitplan` CLI binary.
//!
//! Each test writes its descriptors into a temp dir and points
//! `TRANSITPLAN_CONFIG` there, so the user's real configuration is never read.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const HUB: &str = r#"
[hub]
id = "tgw-0abc"
firewall_table = "tgw-rtb-fw"
standard_table = "tgw-rtb-std"
inspection_table = "tgw-rtb-insp"
"#;

const SPOKES: &str = r#"
[[spokes]]
id = "egress"
cidr = "10.10.0.0/16"
traffic_class = "egress"

[[spokes]]
id = "fw"
cidr = "100.64.0.0/16"
traffic_class = "inspection"

[[spokes]]
id = "a"
cidr = "10.1.0.0/16"
traffic_class = "inspected"

[[spokes]]
id = "c"
cidr = "10.3.0.0/16"
traffic_class = "standard"
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    /// `transitplan` with env isolation.
    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("transitplan");
        cmd.env("TRANSITPLAN_CONFIG", self.config_path())
            .env_remove("TRANSITPLAN_PROFILE")
            .env_remove("TRANSITPLAN_OUTPUT")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

fn scenario_a(ws: &Workspace) -> PathBuf {
    ws.write("topology.toml", &format!("{HUB}{SPOKES}"))
}

fn without_fw(ws: &Workspace) -> PathBuf {
    let spokes = SPOKES.replace(
        "[[spokes]]\nid = \"fw\"\ncidr = \"100.64.0.0/16\"\ntraffic_class = \"inspection\"\n\n",
        "",
    );
    ws.write("no-fw.toml", &format!("{HUB}{spokes}"))
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let ws = Workspace::new();
    let output = ws.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let ws = Workspace::new();
    ws.cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("plan")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("rules")),
    );
}

#[test]
fn test_completions_zsh() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let ws = Workspace::new();
    let output = ws.cmd().args(["--output", "xml", "rules"]).output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("possible values"));
}

// ── plan ────────────────────────────────────────────────────────────

#[test]
fn test_plan_table() {
    let ws = Workspace::new();
    let file = scenario_a(&ws);
    ws.cmd()
        .args(["plan", arg(&file)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Associate")
                .and(predicate::str::contains("tgw-rtb-insp (inspection)"))
                .and(predicate::str::contains("EnableApplianceMode")),
        );
}

#[test]
fn test_plan_json_starts_with_associations() {
    let ws = Workspace::new();
    let file = scenario_a(&ws);
    let output = ws
        .cmd()
        .args(["plan", arg(&file), "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["hub"], "tgw-0abc");
    let ops = plan["operations"].as_array().unwrap();
    assert_eq!(ops[0]["opType"], "Associate");
    assert_eq!(ops[0]["spoke"], "a");
    assert_eq!(ops[0]["table"], "tgw-rtb-insp");
}

#[test]
fn test_plan_full_includes_normalized_descriptor() {
    let ws = Workspace::new();
    let file = scenario_a(&ws);
    let output = ws
        .cmd()
        .args(["plan", arg(&file), "--full", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let compilation: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(compilation["descriptor"]["spokes"][0]["id"], "a");
    assert!(compilation["plan"]["operations"].is_array());
}

#[test]
fn test_plan_is_identical_for_json_descriptor() {
    let ws = Workspace::new();
    let toml_file = scenario_a(&ws);
    let json_file = ws.write(
        "topology.json",
        r#"{
            "hub": {"id": "tgw-0abc", "firewallTable": "tgw-rtb-fw",
                    "standardTable": "tgw-rtb-std", "inspectionTable": "tgw-rtb-insp"},
            "spokes": [
                {"id": "c", "cidr": "10.3.0.0/16", "trafficClass": "standard"},
                {"id": "a", "cidr": "10.1.0.0/16", "trafficClass": "inspected"},
                {"id": "fw", "cidr": "100.64.0.0/16", "trafficClass": "inspection"},
                {"id": "egress", "cidr": "10.10.0.0/16", "trafficClass": "egress"}
            ]
        }"#,
    );

    let from_toml = ws
        .cmd()
        .args(["plan", arg(&toml_file), "-o", "json"])
        .output()
        .unwrap();
    let from_json = ws
        .cmd()
        .args(["plan", arg(&json_file), "-o", "json"])
        .output()
        .unwrap();
    assert!(from_toml.status.success());
    assert_eq!(from_toml.stdout, from_json.stdout);
}

#[test]
fn test_plan_routes_attachment_side_into_firewall_endpoint() {
    let ws = Workspace::new();
    let spokes = SPOKES.replace(
        "traffic_class = \"inspection\"",
        "traffic_class = \"inspection\"\nfirewall_endpoint = \"vpce-0fw\"\nattachment_route_table = \"rtb-fw-tgw\"",
    );
    let file = ws.write("endpoint.toml", &format!("{HUB}{spokes}"));
    ws.cmd()
        .args(["plan", arg(&file), "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "AddLocalRoute fw rtb-fw-tgw 0.0.0.0/0 -> vpce-0fw",
        ));
}

#[test]
fn test_plan_endpoint_on_standard_spoke_exits_3() {
    let ws = Workspace::new();
    let file = ws.write(
        "misplaced.toml",
        &format!(
            "{HUB}\n[[spokes]]\nid = \"c\"\ncidr = \"10.3.0.0/16\"\ntraffic_class = \"standard\"\n\
             firewall_endpoint = \"vpce-0fw\"\n"
        ),
    );
    ws.cmd()
        .args(["plan", arg(&file)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("firewall_endpoint"));
}

#[test]
fn test_plan_without_inspection_spoke_exits_3() {
    let ws = Workspace::new();
    let file = without_fw(&ws);
    ws.cmd()
        .args(["plan", arg(&file)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no inspection spoke"));
}

#[test]
fn test_plan_overlapping_cidrs_exits_3() {
    let ws = Workspace::new();
    let file = ws.write(
        "overlap.toml",
        &format!(
            "{HUB}\n[[spokes]]\nid = \"a\"\ncidr = \"10.1.0.0/16\"\ntraffic_class = \"standard\"\n\n\
             [[spokes]]\nid = \"b\"\ncidr = \"10.1.0.0/24\"\ntraffic_class = \"standard\"\n"
        ),
    );
    ws.cmd()
        .args(["plan", arg(&file)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("overlaps"));
}

#[test]
fn test_plan_missing_file_exits_2() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["plan", "does-not-exist.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

// ── Profiles ────────────────────────────────────────────────────────

#[test]
fn test_hubless_descriptor_uses_profile() {
    let ws = Workspace::new();
    ws.write(
        "config.toml",
        r#"
default_profile = "prod"

[profiles.prod]
hub_id = "tgw-prod"
firewall_table = "fw-prod"
standard_table = "std-prod"
inspection_table = "insp-prod"
"#,
    );
    let file = ws.write("hubless.toml", SPOKES);

    ws.cmd()
        .args(["plan", arg(&file), "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Associate a insp-prod"));
}

#[test]
fn test_hubless_descriptor_without_profile_exits_5() {
    let ws = Workspace::new();
    let file = ws.write("hubless.toml", SPOKES);
    ws.cmd()
        .args(["plan", arg(&file)])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("[hub]"));
}

#[test]
fn test_unknown_profile_exits_5() {
    let ws = Workspace::new();
    let file = ws.write("hubless.toml", SPOKES);
    ws.cmd()
        .args(["--profile", "staging", "plan", arg(&file)])
        .assert()
        .code(5);
}

// ── check / facts / rules ───────────────────────────────────────────

#[test]
fn test_check_clean_topology() {
    let ws = Workspace::new();
    let file = scenario_a(&ws);
    ws.cmd()
        .args(["check", arg(&file)])
        .assert()
        .success()
        .stderr(predicate::str::contains("no violations"));
}

#[test]
fn test_check_unreachable_spoke_exits_4() {
    let ws = Workspace::new();
    let file = ws.write(
        "lonely.toml",
        &format!("{HUB}\n[[spokes]]\nid = \"c\"\ncidr = \"10.3.0.0/16\"\ntraffic_class = \"standard\"\n"),
    );
    ws.cmd()
        .args(["check", arg(&file), "-o", "plain"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("fatal unreachable"));
}

#[test]
fn test_facts_json_lists_propagations() {
    let ws = Workspace::new();
    let file = scenario_a(&ws);
    let output = ws
        .cmd()
        .args(["facts", arg(&file), "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let facts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let propagations = facts["propagations"].as_array().unwrap();
    assert!(
        propagations
            .iter()
            .all(|p| !(p["attachment"] == "a" && p["table"] == "standard"))
    );
}

#[test]
fn test_rules_plain() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["rules", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "inspected associate=inspection propagate=firewall",
        ));
}

// ── config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_without_file() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("output = \"table\""));
}
