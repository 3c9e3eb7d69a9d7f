//! Message reducer invariants under the seed scenarios

use retentive_core::config::MessageSettings;
use retentive_core::{Message, ToolCallRecord};
use retentive_history::HistoryReducer;

fn reducer(max_count: usize) -> HistoryReducer {
    HistoryReducer::new(MessageSettings {
        max_count,
        max_total_bytes: 10 * 1024 * 1024,
        preserve_important: true,
    })
}

#[test]
fn pruning_preserves_human_scenario() {
    // MaxMessages=3 over [human, tool, tool, tool, assistant+calls, tool]:
    // the human survives, the tool-calling assistant is promoted, and the
    // last tool output stays.
    let messages = vec![
        Message::human("please fix the flaky test"),
        Message::tool("running test 1"),
        Message::tool("running test 2"),
        Message::tool("running test 3"),
        Message::assistant("patching").with_tool_calls(vec![ToolCallRecord::new("edit")]),
        Message::tool("patch applied"),
    ];
    let out = reducer(3).reduce(messages, vec![]);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].text(), "please fix the flaky test");
    assert_eq!(out[1].text(), "patching");
    assert_eq!(out[2].text(), "patch applied");
}

#[test]
fn window_boundaries() {
    let at_capacity: Vec<Message> = (0..5).map(|i| Message::tool(format!("m{i}"))).collect();
    let out = reducer(5).reduce(at_capacity.clone(), vec![]);
    assert_eq!(out, at_capacity, "exact capacity is untouched");

    let out = reducer(5).reduce(at_capacity, vec![Message::tool("m5")]);
    assert_eq!(out.len(), 5, "one over prunes back to the window");
    assert_eq!(out.last().unwrap().text(), "m5");
}

#[test]
fn empty_update_is_idempotent() {
    let reducer = reducer(10);
    let state: Vec<Message> = (0..8).map(|i| Message::human(format!("h{i}"))).collect();
    let once = reducer.reduce(state.clone(), vec![]);
    assert_eq!(once, state);
    let twice = reducer.reduce(once.clone(), vec![]);
    assert_eq!(twice, once);
}

#[test]
fn bounds_hold_across_streaming_appends() {
    let reducer = reducer(20);
    let mut state: Vec<Message> = Vec::new();
    for batch in 0..30 {
        let update: Vec<Message> = (0..7)
            .map(|i| Message::tool(format!("batch {batch} line {i}")))
            .collect();
        state = reducer.reduce(state, update);
        assert!(state.len() <= 20, "count bound violated at batch {batch}");
    }
}

#[test]
fn error_outputs_outlive_routine_ones() {
    let mut messages: Vec<Message> = (0..30).map(|i| Message::tool(format!("ok {i}"))).collect();
    messages.insert(3, Message::tool("step error: connection refused"));
    let out = reducer(10).reduce(messages, vec![]);
    assert!(
        out.iter().any(|m| m.text().contains("connection refused")),
        "the error-bearing output should be retained"
    );
}
