//! # SARIF Output
//!
//! SARIF (Static Analysis Results Interchange Format) 2.1.0 rendering.
//! One `run` per document. Deterministic: rules are sorted by id, results
//! follow the frame ordering, and no timestamps appear inside result
//! objects.

use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::types::{Finding, PipelineResult, Severity};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str =
    "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const INFORMATION_URI: &str = "https://github.com/warden-dev/warden";

/// Build the complete SARIF document.
pub fn to_sarif(result: &PipelineResult) -> Value {
    json!({
        "$schema": SARIF_SCHEMA,
        "version": SARIF_VERSION,
        "runs": [create_run(result)]
    })
}

fn create_run(result: &PipelineResult) -> Value {
    json!({
        "tool": {
            "driver": {
                "name": "warden",
                "version": crate::types::VERSION,
                "informationUri": INFORMATION_URI,
                "rules": create_rules(result)
            }
        },
        "results": create_results(result)
    })
}

/// Rule descriptors de-duplicated by rule id across all frames, in stable
/// (sorted) order.
fn create_rules(result: &PipelineResult) -> Vec<Value> {
    let mut by_id: BTreeMap<String, &Finding> = BTreeMap::new();
    for finding in result.findings() {
        let rule_id = effective_rule_id(finding);
        by_id.entry(rule_id).or_insert(finding);
    }

    by_id
        .into_iter()
        .map(|(rule_id, finding)| {
            json!({
                "id": rule_id,
                "name": rule_id,
                "shortDescription": { "text": finding.message },
                "defaultConfiguration": {
                    "level": severity_to_level(finding.severity)
                },
                "properties": {
                    "frame": finding.frame_id,
                }
            })
        })
        .collect()
}

fn create_results(result: &PipelineResult) -> Vec<Value> {
    result
        .findings()
        .map(|finding| {
            let mut sarif_result = json!({
                "ruleId": effective_rule_id(finding),
                "level": severity_to_level(finding.severity),
                "message": { "text": finding.message },
                "partialFingerprints": {
                    "primaryLocationLineHash": finding.fingerprint
                },
                "properties": {
                    "tags": [finding.frame_id.clone(), finding.severity.as_str().to_string()]
                }
            });
            if let Some(location) = create_location(finding) {
                sarif_result["locations"] = json!([location]);
            }
            sarif_result
        })
        .collect()
}

fn create_location(finding: &Finding) -> Option<Value> {
    let file = finding.file_path.as_ref()?;
    let mut physical = json!({
        "artifactLocation": { "uri": file.to_string_lossy() }
    });
    if let Some(line) = finding.line {
        let mut region = json!({ "startLine": line });
        if let Some(line_end) = finding.line_end {
            region["endLine"] = json!(line_end);
        }
        if let Some(column) = finding.column {
            region["startColumn"] = json!(column);
        }
        if let Some(column_end) = finding.column_end {
            region["endColumn"] = json!(column_end);
        }
        if let Some(snippet) = &finding.code_snippet {
            region["snippet"] = json!({ "text": snippet });
        }
        physical["region"] = region;
    }
    Some(json!({ "physicalLocation": physical }))
}

fn effective_rule_id(finding: &Finding) -> String {
    match &finding.rule_id {
        Some(rule_id) => format!("{}/{}", finding.frame_id, rule_id),
        None => finding.frame_id.clone(),
    }
}

fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrameResult;
    use std::path::PathBuf;

    fn result_with_findings(findings: Vec<Finding>) -> PipelineResult {
        let mut frame = FrameResult::new("security", "Security", true);
        frame.findings = findings;
        let mut result = PipelineResult::new("test");
        result.frame_results = vec![frame];
        result
    }

    fn secret_finding() -> Finding {
        Finding::new("security", Severity::Critical, "Hardcoded secret detected")
            .with_rule("secret")
            .with_location(PathBuf::from("app.py"), 5)
            .with_column(3)
            .with_snippet("api_key = \"...\"")
    }

    #[test]
    fn document_structure_is_sarif_2_1_0() {
        let sarif = to_sarif(&result_with_findings(vec![secret_finding()]));
        assert_eq!(sarif["version"], "2.1.0");
        assert_eq!(sarif["runs"].as_array().unwrap().len(), 1);
        let run = &sarif["runs"][0];
        assert_eq!(run["tool"]["driver"]["name"], "warden");
        assert!(run["tool"]["driver"]["informationUri"].is_string());
    }

    #[test]
    fn critical_maps_to_error_level() {
        let sarif = to_sarif(&result_with_findings(vec![secret_finding()]));
        let result = &sarif["runs"][0]["results"][0];
        assert_eq!(result["level"], "error");
        assert_eq!(result["ruleId"], "security/secret");
        let region = &result["locations"][0]["physicalLocation"]["region"];
        assert_eq!(region["startLine"], 5);
        assert_eq!(region["startColumn"], 3);
        assert_eq!(region["snippet"]["text"], "api_key = \"...\"");
    }

    #[test]
    fn fingerprint_is_carried() {
        let finding = secret_finding();
        let fingerprint = finding.fingerprint.clone();
        let sarif = to_sarif(&result_with_findings(vec![finding]));
        assert_eq!(
            sarif["runs"][0]["results"][0]["partialFingerprints"]["primaryLocationLineHash"],
            json!(fingerprint)
        );
    }

    #[test]
    fn empty_result_has_empty_results_array() {
        let sarif = to_sarif(&result_with_findings(vec![]));
        assert_eq!(sarif["runs"][0]["results"], json!([]));
        assert_eq!(sarif["runs"][0]["tool"]["driver"]["rules"], json!([]));
    }

    #[test]
    fn rules_are_deduplicated_and_sorted() {
        let findings = vec![
            secret_finding(),
            Finding::new("security", Severity::Critical, "Hardcoded secret detected")
                .with_rule("secret")
                .with_location(PathBuf::from("other.py"), 9),
            Finding::new("chaos", Severity::Medium, "Bare except")
                .with_rule("bare_except")
                .with_location(PathBuf::from("a.py"), 1),
        ];
        let sarif = to_sarif(&result_with_findings(findings));
        let rules = sarif["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap();
        let ids: Vec<&str> = rules.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["chaos/bare_except", "security/secret"]);
    }

    #[test]
    fn identical_input_is_byte_identical() {
        let a = serde_json::to_string(&to_sarif(&result_with_findings(vec![secret_finding()])))
            .unwrap();
        let b = serde_json::to_string(&to_sarif(&result_with_findings(vec![secret_finding()])))
            .unwrap();
        assert_eq!(a, b);
    }
}
