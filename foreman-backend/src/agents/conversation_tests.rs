//! Integration tests for the conversation loop: termination, tool-result
//! matching, error embedding, and the iteration cap.

use crate::agents::conversation::{ConversationLoop, MAX_ITERATIONS};
use crate::db::Database;
use crate::llm::{ChatMessage, Completion, ContentBlock, LlmClient, MessageContent, MockLlmClient, Role};
use crate::tools;
use serde_json::json;
use std::sync::Arc;

/// Single-turn history ending with a user message, the common case.
fn user_turn(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(text)]
}

/// Wires an in-memory database, the real tool registry, and a mock model.
struct TestHarness {
    loop_: ConversationLoop,
    mock: MockLlmClient,
    db: Arc<Database>,
}

impl TestHarness {
    fn new(completions: Vec<Completion>) -> Self {
        let db = Arc::new(Database::new(":memory:").expect("in-memory db"));
        let registry = Arc::new(tools::create_default_registry());
        let mock = MockLlmClient::new(completions.into_iter().map(Ok).collect());
        let loop_ = ConversationLoop::new(LlmClient::Mock(mock.clone()), registry, db.clone());
        TestHarness { loop_, mock, db }
    }
}

fn tool_use_completion(text: Option<&str>, uses: &[(&str, &str, serde_json::Value)]) -> Completion {
    let mut content = Vec::new();
    if let Some(text) = text {
        content.push(ContentBlock::Text {
            text: text.to_string(),
        });
    }
    for (id, name, input) in uses {
        content.push(ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        });
    }
    Completion {
        content,
        stop_reason: Some("tool_use".to_string()),
    }
}

#[tokio::test]
async fn no_tool_completion_returns_after_one_call() {
    let harness = TestHarness::new(vec![Completion::text("Pipeline looks healthy.")]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("How is the pipeline?"))
        .await
        .expect("chat succeeds");

    assert_eq!(outcome.message, "Pipeline looks healthy.");
    assert!(outcome.tool_events.is_empty());
    assert_eq!(harness.mock.get_trace().len(), 1);
}

#[tokio::test]
async fn unknown_department_is_rejected() {
    let harness = TestHarness::new(vec![]);
    let result = harness.loop_.run("marketing", user_turn("hello")).await;
    assert!(result.is_err());
    assert_eq!(harness.mock.get_trace().len(), 0);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let harness = TestHarness::new(vec![]);
    let result = harness.loop_.run("sales", user_turn("   ")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn history_must_end_with_a_user_turn() {
    let harness = TestHarness::new(vec![]);

    let empty = harness.loop_.run("sales", vec![]).await;
    assert!(empty.is_err());

    let ends_with_assistant = vec![
        ChatMessage::user("Any open deals?"),
        ChatMessage::assistant_blocks(vec![ContentBlock::Text {
            text: "There are two.".to_string(),
        }]),
    ];
    let result = harness.loop_.run("sales", ends_with_assistant).await;
    assert!(result.is_err());
    assert_eq!(harness.mock.get_trace().len(), 0);
}

#[tokio::test]
async fn prior_turns_are_forwarded_to_the_model() {
    let harness = TestHarness::new(vec![Completion::text("Acme, as discussed.")]);

    let history = vec![
        ChatMessage::user("Which client has the biggest deal?"),
        ChatMessage::assistant_blocks(vec![ContentBlock::Text {
            text: "Acme, at $12k.".to_string(),
        }]),
        ChatMessage::user("Remind me who that was?"),
    ];
    harness
        .loop_
        .run("sales", history)
        .await
        .expect("chat succeeds");

    let trace = harness.mock.get_trace();
    assert_eq!(trace.len(), 1);
    assert_eq!(trace[0].input_messages.len(), 3);
    assert_eq!(trace[0].input_messages[0].role, Role::User);
    assert_eq!(trace[0].input_messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn tool_results_go_back_keyed_by_invocation_id() {
    let harness = TestHarness::new(vec![
        tool_use_completion(None, &[("toolu_01", "open_deals", json!({}))]),
        Completion::text("There are no open deals."),
    ]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Any open deals?"))
        .await
        .expect("chat succeeds");

    assert_eq!(outcome.message, "There are no open deals.");
    assert_eq!(outcome.tool_events.len(), 1);
    assert_eq!(outcome.tool_events[0].tool_name, "open_deals");

    // The second model call must carry the assistant tool_use turn plus a
    // user turn holding the matching tool_result block.
    let trace = harness.mock.get_trace();
    assert_eq!(trace.len(), 2);
    let second_input = &trace[1].input_messages;
    assert_eq!(second_input.len(), 3);
    assert_eq!(second_input[2].role, Role::User);
    match &second_input[2].content {
        MessageContent::Blocks(blocks) => {
            assert_eq!(blocks.len(), 1);
            match &blocks[0] {
                ContentBlock::ToolResult { tool_use_id, is_error, .. } => {
                    assert_eq!(tool_use_id, "toolu_01");
                    assert!(!is_error);
                }
                other => panic!("expected tool_result block, got {:?}", other),
            }
        }
        other => panic!("expected block content, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_tool_is_embedded_as_error_not_fatal() {
    let harness = TestHarness::new(vec![
        tool_use_completion(None, &[("toolu_01", "crystal_ball", json!({}))]),
        Completion::text("That tool isn't available."),
    ]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Predict next quarter"))
        .await
        .expect("loop survives unknown tool");

    assert_eq!(outcome.tool_events.len(), 1);
    assert_eq!(
        outcome.tool_events[0].tool_result,
        json!({"error": "Tool not found: crystal_ball"})
    );

    // The error travels back to the model flagged, not thrown
    let trace = harness.mock.get_trace();
    match &trace[1].input_messages[2].content {
        MessageContent::Blocks(blocks) => match &blocks[0] {
            ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
            other => panic!("expected tool_result block, got {:?}", other),
        },
        other => panic!("expected block content, got {:?}", other),
    }
}

#[tokio::test]
async fn parallel_tool_results_keep_request_order() {
    let harness = TestHarness::new(vec![
        tool_use_completion(
            None,
            &[
                ("toolu_01", "open_deals", json!({})),
                ("toolu_02", "activity_summary", json!({})),
            ],
        ),
        Completion::text("Done."),
    ]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Deals and activity please"))
        .await
        .expect("chat succeeds");

    assert_eq!(outcome.tool_events.len(), 2);
    assert_eq!(outcome.tool_events[0].tool_name, "open_deals");
    assert_eq!(outcome.tool_events[1].tool_name, "activity_summary");

    let trace = harness.mock.get_trace();
    match &trace[1].input_messages[2].content {
        MessageContent::Blocks(blocks) => {
            let ids: Vec<&str> = blocks
                .iter()
                .map(|b| match b {
                    ContentBlock::ToolResult { tool_use_id, .. } => tool_use_id.as_str(),
                    other => panic!("expected tool_result block, got {:?}", other),
                })
                .collect();
            assert_eq!(ids, vec!["toolu_01", "toolu_02"]);
        }
        other => panic!("expected block content, got {:?}", other),
    }
}

#[tokio::test]
async fn iteration_cap_stops_a_tool_hungry_model() {
    // Queue more tool-calling completions than the cap allows. The loop
    // must stop at the cap and fall back to the last text it saw.
    let completions: Vec<Completion> = (0..MAX_ITERATIONS + 2)
        .map(|i| {
            tool_use_completion(
                Some(&format!("thinking step {}", i)),
                &[(&format!("toolu_{:02}", i), "open_deals", json!({}))],
            )
        })
        .collect();
    let harness = TestHarness::new(completions);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Keep digging"))
        .await
        .expect("loop terminates");

    assert_eq!(harness.mock.get_trace().len(), MAX_ITERATIONS);
    assert_eq!(outcome.tool_events.len(), MAX_ITERATIONS);
    // Last text wins
    assert_eq!(
        outcome.message,
        format!("thinking step {}", MAX_ITERATIONS - 1)
    );
}

#[tokio::test]
async fn iteration_cap_with_no_text_returns_empty_message() {
    // A model that only ever calls tools produces no text at all. The cap
    // reply is then empty rather than invented on the model's behalf.
    let completions: Vec<Completion> = (0..MAX_ITERATIONS)
        .map(|i| {
            tool_use_completion(
                None,
                &[(&format!("toolu_{:02}", i), "open_deals", json!({}))],
            )
        })
        .collect();
    let harness = TestHarness::new(completions);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Keep digging"))
        .await
        .expect("loop terminates");

    assert_eq!(outcome.message, "");
    assert_eq!(outcome.tool_events.len(), MAX_ITERATIONS);
}

#[tokio::test]
async fn tool_from_another_department_is_rejected() {
    // ticket_lookup is registered, but only support and engineering declare
    // it. A sales agent asking for it gets the same error as a bogus name.
    let harness = TestHarness::new(vec![
        tool_use_completion(None, &[("toolu_01", "ticket_lookup", json!({"ticket_id": "TCK-1"}))]),
        Completion::text("I can't look up tickets."),
    ]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("What's the status of TCK-1?"))
        .await
        .expect("loop survives the rejected tool");

    assert_eq!(outcome.tool_events.len(), 1);
    assert_eq!(
        outcome.tool_events[0].tool_result,
        json!({"error": "Tool not found: ticket_lookup"})
    );

    let trace = harness.mock.get_trace();
    match &trace[1].input_messages[2].content {
        MessageContent::Blocks(blocks) => match &blocks[0] {
            ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
            other => panic!("expected tool_result block, got {:?}", other),
        },
        other => panic!("expected block content, got {:?}", other),
    }
}

#[tokio::test]
async fn last_text_wins_across_iterations() {
    let harness = TestHarness::new(vec![
        tool_use_completion(Some("Checking the pipeline."), &[("toolu_01", "open_deals", json!({}))]),
        Completion {
            content: vec![],
            stop_reason: Some("end_turn".to_string()),
        },
    ]);

    let outcome = harness
        .loop_
        .run("sales", user_turn("Status?"))
        .await
        .expect("chat succeeds");

    // Final completion carried no text, so the earlier text stands.
    assert_eq!(outcome.message, "Checking the pipeline.");
}

#[tokio::test]
async fn tool_executions_are_audited() {
    let harness = TestHarness::new(vec![
        tool_use_completion(None, &[("toolu_01", "open_deals", json!({}))]),
        Completion::text("No deals."),
    ]);

    harness
        .loop_
        .run("sales", user_turn("Any open deals?"))
        .await
        .expect("chat succeeds");

    // Audit writes are fire-and-forget; give them a beat to land.
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(harness.db.count_tool_executions().unwrap(), 1);
    assert_eq!(harness.db.count_conversations().unwrap(), 1);
}
