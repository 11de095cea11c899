// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_bare_json() {
    let reply = r#"{"decision": "PASS", "score": 92, "blockers": [], "prescriptive_fixes": []}"#;
    let critique = QaCritique::parse(reply).unwrap();
    assert_eq!(critique.decision, QaDecision::Pass);
    assert_eq!(critique.score, 92);
}

#[test]
fn parses_json_wrapped_in_prose_and_fences() {
    let reply = "Here is my assessment:\n```json\n{\"decision\": \"REWORK\", \"score\": 40, \"blockers\": [\"hook missing\"], \"prescriptive_fixes\": [\"open on the reveal\"]}\n```\nHope that helps.";
    let critique = QaCritique::parse(reply).unwrap();
    assert_eq!(critique.decision, QaDecision::Rework);
    assert_eq!(critique.blockers, vec!["hook missing"]);
    assert_eq!(critique.prescriptive_fixes, vec!["open on the reveal"]);
}

#[test]
fn nested_objects_and_braces_in_strings_do_not_confuse_the_scanner() {
    let reply = r#"{"decision": "FAIL", "score": 5, "blockers": ["stray } in output", "schema {a} mismatch"], "prescriptive_fixes": []}"#;
    let critique = QaCritique::parse(reply).unwrap();
    assert_eq!(critique.decision, QaDecision::Fail);
    assert_eq!(critique.blockers.len(), 2);
}

#[test]
fn missing_optional_fields_default() {
    let critique = QaCritique::parse(r#"{"decision": "PASS"}"#).unwrap();
    assert_eq!(critique.score, 0);
    assert!(critique.blockers.is_empty());
}

#[test]
fn unparseable_reply_returns_none() {
    assert!(QaCritique::parse("the output looks fine to me").is_none());
    assert!(QaCritique::parse("{\"decision\": \"MAYBE\"}").is_none());
    assert!(QaCritique::parse("{truncated").is_none());
}

#[test]
fn malformed_reply_critique_is_a_rework_with_a_fix() {
    let critique = QaCritique::malformed_reply();
    assert_eq!(critique.decision, QaDecision::Rework);
    assert_eq!(
        critique.prescriptive_fixes,
        vec!["restate output in the declared schema"]
    );
}
