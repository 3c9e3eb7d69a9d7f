//! Truncation syntax guarantees across budget sweeps

use retentive_truncate::{detect_content_type, truncate, validate_and_fix, ContentType};

#[test]
fn json_output_parses_at_every_budget() {
    let items: Vec<serde_json::Value> = (0..200)
        .map(|i| serde_json::json!({"id": i, "debug": "noise", "payload": format!("row {i}")}))
        .collect();
    let text = serde_json::json!({"rows": items, "cursor": "abc"}).to_string();

    for budget in [60, 120, 300, 1_000, 5_000] {
        let outcome = truncate(&text, budget, Some(ContentType::Json)).unwrap();
        assert!(outcome.final_size <= budget, "budget {budget} exceeded");
        assert!(outcome.syntax_valid, "budget {budget} lost validity");
        assert!(
            serde_json::from_str::<serde_json::Value>(&outcome.content).is_ok(),
            "budget {budget} produced unparseable output: {}",
            outcome.content
        );
    }
}

#[test]
fn json_scenario_keeps_both_keys() {
    // {"a": [1..1000], "b": "x"} at a tight budget: output parses, keeps a
    // shortened "a" and the untouched "b".
    let items: Vec<u32> = (0..1_000).collect();
    let text = serde_json::json!({"a": items, "b": "x"}).to_string();
    let outcome = truncate(&text, 120, Some(ContentType::Json)).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&outcome.content).unwrap();
    assert!(parsed.get("a").is_some());
    assert_eq!(parsed["b"], "x");
    assert!(matches!(
        outcome.method,
        "array-truncation" | "property-removal" | "string-truncation" | "minimal-json"
    ));
}

#[test]
fn code_output_never_splits_a_block() {
    let source: String = (0..50)
        .map(|i| {
            format!(
                "export function handler{i}(req) {{\n  if (req.ok) {{\n    return {i};\n  }}\n}}\n"
            )
        })
        .collect();

    for budget in [50, 150, 400, 2_000] {
        let outcome = truncate(&source, budget, Some(ContentType::Code)).unwrap();
        assert!(outcome.final_size <= budget);
        let opens = outcome.content.matches('{').count();
        let closes = outcome.content.matches('}').count();
        assert_eq!(opens, closes, "half-open block at budget {budget}");
        assert!(outcome.content.ends_with("// [TRUNCATED]"));
    }
}

#[test]
fn tree_output_keeps_tree_lines_only() {
    let tree: String = (0..2_000)
        .map(|i| format!("{}├── mod_{i}.rs\n", "│   ".repeat(i % 6)))
        .collect();
    let outcome = truncate(&tree, 2_000, Some(ContentType::Tree)).unwrap();
    assert!(outcome.final_size <= 2_000);
    for line in outcome.content.lines() {
        assert!(
            line.contains("├──") || line.starts_with("..."),
            "unexpected line shape: {line}"
        );
    }
}

#[test]
fn detection_dispatches_all_five_types() {
    assert_eq!(detect_content_type("{\"k\": 1}"), ContentType::Json);
    assert_eq!(
        detect_content_type("import x from 'y';\nexport class A {}"),
        ContentType::Code
    );
    assert_eq!(detect_content_type("<!doctype html><p>hi</p>"), ContentType::Markup);
    assert_eq!(detect_content_type("src\n└── lib.rs"), ContentType::Tree);
    assert_eq!(detect_content_type("plain words only"), ContentType::Text);
}

#[test]
fn repair_then_truncate_pipeline() {
    // Broken JSON with a trailing comma still truncates validly.
    let rows: String = (0..300).map(|i| format!("{i},")).collect();
    let broken = format!("{{\"rows\": [{rows}],}}");
    assert!(serde_json::from_str::<serde_json::Value>(&broken).is_err());

    let repair = validate_and_fix(&broken);
    assert!(!repair.valid);
    assert!(repair.fixed.is_some());

    let outcome = truncate(&broken, 200, Some(ContentType::Json)).unwrap();
    assert!(outcome.syntax_valid);
    assert!(serde_json::from_str::<serde_json::Value>(&outcome.content).is_ok());
}
