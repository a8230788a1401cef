//! Chat engine behaviour against a scripted connector.
//!
//! Run with:
//!   cargo test --test chat_flow

mod common;

use chrono::NaiveDate;
use common::{config, csv, engine_replying, inventory_xlsx, FakeConnector, Script, PROBE};
use edgequake_docchat::pipeline::report::render_report;
use edgequake_docchat::pipeline::input::TabularFormat;
use edgequake_docchat::{ChatEngine, ChatError, Role, SessionState};
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::sync::Arc;

// ── History invariants ───────────────────────────────────────────────────────

#[tokio::test]
async fn successful_turn_appends_user_then_assistant() {
    let (engine, _) = engine_replying("Paris.");
    let mut state = SessionState::new();

    let out = engine.send_message(&mut state, "Capital of France?").await.unwrap();

    assert_eq!(out.reply, "Paris.");
    assert_eq!(out.model, "gemini-1.5-flash");
    assert_eq!(state.request_count, 1);
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.messages[0].content, "Capital of France?");
    assert_eq!(state.messages[1].role, Role::Assistant);
    assert_eq!(state.messages[1].content, "Paris.");
}

#[tokio::test]
async fn failed_turn_keeps_user_message_only() {
    let connector = FakeConnector::new(); // every candidate unknown
    let engine = ChatEngine::new(config(), Arc::new(connector));
    let mut state = SessionState::new();

    let err = engine.send_message(&mut state, "hello?").await.unwrap_err();

    assert!(matches!(err, ChatError::ModelUnreachable { tried: 6, .. }), "{err:?}");
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.messages[0].role, Role::User);
    assert_eq!(state.request_count, 0);
}

#[tokio::test]
async fn request_count_grows_once_per_successful_turn() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    for i in 1..=3 {
        let out = engine.send_message(&mut state, "again").await.unwrap();
        assert_eq!(out.request_count, i);
    }
    assert_eq!(state.messages.len(), 6);
}

#[tokio::test]
async fn clear_chat_keeps_artifacts_and_remove_files_keeps_messages() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    engine.ingest_table(&mut state, "t.csv", csv(2, 2).as_bytes()).unwrap();
    state.pdf_text = "pdf body".into();
    engine.send_message(&mut state, "hi").await.unwrap();

    state.clear_chat();
    assert!(state.messages.is_empty());
    assert_eq!(state.request_count, 0);
    assert!(state.has_pdf() && state.has_data());

    engine.send_message(&mut state, "hi again").await.unwrap();
    state.remove_files();
    assert!(!state.has_pdf() && !state.has_data());
    assert_eq!(state.messages.len(), 2);
}

// ── Model fallback ───────────────────────────────────────────────────────────

#[tokio::test]
async fn third_candidate_answers_and_later_ones_are_never_tried() {
    let connector = FakeConnector::new()
        .with("gemini-1.5-flash", Script::Down("404 not found".into()))
        .with("gemini-1.5-pro", Script::Unconstructible("bad name".into()))
        .with("gemini-pro", Script::Reply("from gemini-pro".into()))
        .with("models/gemini-1.5-flash", Script::Reply("never".into()));
    let engine = ChatEngine::new(config(), Arc::new(connector.clone()));
    let mut state = SessionState::new();

    let out = engine.send_message(&mut state, "question").await.unwrap();

    assert_eq!(out.model, "gemini-pro");
    assert_eq!(out.reply, "from gemini-pro");
    assert_eq!(
        connector.calls(),
        vec![
            ("gemini-1.5-flash".to_string(), PROBE.to_string()),
            ("gemini-pro".to_string(), PROBE.to_string()),
            ("gemini-pro".to_string(), "question".to_string()),
        ]
    );
}

#[tokio::test]
async fn probing_happens_again_on_every_turn() {
    let (engine, connector) = engine_replying("ok");
    let mut state = SessionState::new();
    engine.send_message(&mut state, "one").await.unwrap();
    engine.send_message(&mut state, "two").await.unwrap();
    let probes = connector.calls().iter().filter(|(_, p)| p == PROBE).count();
    assert_eq!(probes, 2);
}

#[tokio::test]
async fn quota_failure_on_the_real_call_is_reported_as_usage_limit() {
    let connector = FakeConnector::new().with(
        "gemini-1.5-flash",
        Script::FailsRealCall("429 You exceeded your current quota".into()),
    );
    let engine = ChatEngine::new(config(), Arc::new(connector));
    let mut state = SessionState::new();

    let err = engine.send_message(&mut state, "q").await.unwrap_err();
    assert!(matches!(err, ChatError::QuotaExceeded { .. }));
    assert_eq!(
        err.user_message(),
        "Daily usage limit reached. Please try again later or contact support."
    );
    assert_eq!(state.messages.len(), 1);
}

#[tokio::test]
async fn other_failure_on_the_real_call_shows_raw_text() {
    let connector = FakeConnector::new().with(
        "gemini-1.5-flash",
        Script::FailsRealCall("500 upstream reset".into()),
    );
    let engine = ChatEngine::new(config(), Arc::new(connector));
    let err = engine
        .send_message(&mut SessionState::new(), "q")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Error: 500 upstream reset");
}

// ── Context assembly through the engine ──────────────────────────────────────

#[tokio::test]
async fn prompt_without_artifacts_is_the_message() {
    let connector = FakeConnector::new().with("gemini-1.5-flash", Script::Echo);
    let engine = ChatEngine::new(config(), Arc::new(connector.clone()));
    engine
        .send_message(&mut SessionState::new(), "plain question")
        .await
        .unwrap();
    assert_eq!(connector.real_prompts()[0].1, "plain question");
}

#[tokio::test]
async fn pdf_context_is_cut_to_exactly_8000_characters() {
    let connector = FakeConnector::new().with("gemini-1.5-flash", Script::Echo);
    let engine = ChatEngine::new(config(), Arc::new(connector.clone()));
    let mut state = SessionState {
        pdf_text: "é".repeat(10_000),
        ..Default::default()
    };

    engine.send_message(&mut state, "summarise").await.unwrap();

    let prompt = &connector.real_prompts()[0].1;
    let expected = format!(
        "Context information:\n\n\nPDF Content:\n{}\n\n\nUser question: summarise",
        "é".repeat(8000)
    );
    assert_eq!(prompt, &expected);
}

#[tokio::test]
async fn both_artifacts_appear_pdf_first() {
    let connector = FakeConnector::new().with("gemini-1.5-flash", Script::Echo);
    let engine = ChatEngine::new(config(), Arc::new(connector.clone()));
    let mut state = SessionState {
        pdf_text: "PDFTEXT".into(),
        ..Default::default()
    };
    engine.ingest_table(&mut state, "t.csv", b"a\n1\n").unwrap();

    engine.send_message(&mut state, "compare").await.unwrap();

    let prompt = &connector.real_prompts()[0].1;
    let pdf_at = prompt.find("PDF Content:\nPDFTEXT").unwrap();
    let data_at = prompt.find("Data:\n").unwrap();
    assert!(pdf_at < data_at);
    assert!(prompt.ends_with("User question: compare"));
}

// ── Uploads ──────────────────────────────────────────────────────────────────

#[test]
fn ten_by_three_csv_reports_its_shape() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    let summary = engine
        .ingest_table(&mut state, "data.csv", csv(10, 3).as_bytes())
        .unwrap();
    assert_eq!(summary.status_line(), "Data loaded (10 rows, 3 columns)");
    assert_eq!(summary.preview.lines().count(), 6);
    assert_eq!(state.data_context.lines().count(), 11);
}

#[test]
fn second_upload_replaces_the_first() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    engine.ingest_table(&mut state, "a.csv", b"first\n1\n").unwrap();
    engine.ingest_table(&mut state, "b.csv", b"second\n2\n").unwrap();
    assert!(state.data_context.contains("second"));
    assert!(!state.data_context.contains("first"));
}

#[test]
fn xlsx_upload_renders_numbers_and_missing_cells() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();

    let summary = engine
        .ingest_table(&mut state, "inventory.xlsx", &inventory_xlsx())
        .unwrap();

    assert_eq!(summary.format, TabularFormat::Xlsx);
    assert_eq!((summary.rows, summary.columns), (2, 3));
    assert_eq!(summary.status_line(), "Data loaded (2 rows, 3 columns)");
    assert_eq!(
        state.data_context,
        "     name  qty  price\n\
         0  widget    4    2.5\n\
         1  gadget  NaN     10"
    );
    assert_eq!(summary.preview, state.data_context);
}

#[test]
fn xlsx_without_extension_is_recognised_by_signature() {
    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    let summary = engine
        .ingest_table(&mut state, "upload", &inventory_xlsx())
        .unwrap();
    assert_eq!(summary.format, TabularFormat::Xlsx);
    assert_eq!(summary.columns, 3);
}

#[tokio::test]
async fn pdf_upload_loads_text_and_preview() {
    let at = NaiveDate::from_ymd_opt(2026, 1, 2)
        .and_then(|d| d.and_hms_opt(3, 4, 5))
        .unwrap();
    let fixture = render_report("Fixture", "Quarterly revenue summary", at).unwrap();

    let (engine, _) = engine_replying("ok");
    let mut state = SessionState::new();
    let summary = engine
        .ingest_pdf(&mut state, "fixture.pdf", fixture.bytes)
        .await
        .unwrap();

    assert!(summary.characters > 0);
    assert_eq!(summary.pages, 1);
    assert!(summary.preview.ends_with("..."));
    assert!(state.pdf_text.contains("Quarterly"), "got {:?}", state.pdf_text);
    assert_eq!(
        summary.status_line(),
        format!("PDF loaded ({} characters)", state.pdf_text.chars().count())
    );
}

// ── Reports ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn make_pdf_report_returns_a_timestamped_pdf() {
    let (engine, _) = engine_replying("Sales rose in Zürich and 東京.");
    let mut state = SessionState::new();

    let out = engine
        .send_message(&mut state, "Please make pdf report")
        .await
        .unwrap();

    let report = out.report.expect("report requested");
    assert!(out.report_error.is_none());
    assert!(report.file_name.starts_with("ai_report_"));
    assert!(report.file_name.ends_with(".pdf"));
    assert_eq!(report.file_name.len(), "ai_report_YYYYMMDD_HHMMSS.pdf".len());
    assert!(report.bytes.starts_with(b"%PDF"));
    let shown = shown_text(&report.bytes);
    let latin1: &[u8] = b"Sales rose in Z\xfcrich and ??.";
    assert!(shown.iter().any(|line| line.as_slice() == latin1), "{shown:?}");
}

/// `Tj` operands of every page, one entry per shown line.
fn shown_text(pdf: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf).unwrap();
    let mut lines = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for op in content.operations.iter().filter(|op| op.operator == "Tj") {
            if let Some(Object::String(bytes, _)) = op.operands.first() {
                lines.push(bytes.clone());
            }
        }
    }
    lines
}

#[tokio::test]
async fn ordinary_message_produces_no_report() {
    let (engine, _) = engine_replying("ok");
    let out = engine
        .send_message(&mut SessionState::new(), "what is in the pdf?")
        .await
        .unwrap();
    assert!(out.report.is_none());
    assert!(out.report_error.is_none());
}
