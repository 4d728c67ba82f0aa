//! Integration tests for the playground pipeline.
//!
//! The toolchain is faked by `common::ScriptedRuntime`, so these run
//! without a WebAssembly engine.

mod common;

use std::sync::Arc;

use base64::Engine;
use common::{
    canonical, playground, ScriptedRuntime, StaticAssets, LINK_ERROR, NO_LINK_OUTPUT, SYNTAX_ERROR,
};
use gowasm_core::layout::{self, SUPPORT_ARCHIVES};
use gowasm_core::render::{display_ops, DisplayOp};
use gowasm_core::{
    ChannelSink, EventLog, FileStore, FormatOutcome, HtmlTranscript, MemoryFs, OutputEvent,
    Playground, PlaygroundError, RunOutcome, StepKind,
};

fn stdout(body: &str) -> OutputEvent {
    OutputEvent::Stdout(body.to_string())
}

fn stderr(body: &str) -> OutputEvent {
    OutputEvent::Stderr(body.to_string())
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_initialize_installs_support_files() {
    let (playground, _) = playground().await;
    let store = playground.store();

    for archive in SUPPORT_ARCHIVES.iter() {
        assert!(store.exists(&archive.vfs_path()), "{}", archive.package);
    }
    assert_eq!(
        store.read(layout::IMPORTCFG_LINK_PATH).unwrap(),
        layout::link_importcfg().into_bytes()
    );
}

#[tokio::test]
async fn test_initialize_fails_when_any_asset_is_missing() {
    let fs = Arc::new(MemoryFs::new());
    let result = Playground::initialize_with_store(
        &StaticAssets::complete().without("cmd/link.wasm"),
        ScriptedRuntime::new(),
        fs.clone(),
    )
    .await;

    let err = match result {
        Ok(_) => panic!("initialization should fail"),
        Err(err) => err,
    };
    assert!(matches!(err, PlaygroundError::AssetLoad { .. }));
    assert!(err.to_string().contains("cmd/link.wasm"));
    assert!(fs.paths().is_empty(), "nothing installed on failure");
}

// =============================================================================
// Run
// =============================================================================

#[tokio::test]
async fn test_successful_run_streams_program_output() {
    let (playground, runtime) = playground().await;
    let log = EventLog::new();

    let report = playground
        .run("stdout hello\nstderr careful\n", &log)
        .await;

    assert_eq!(
        log.events(),
        vec![
            OutputEvent::Start,
            stdout("hello\n"),
            stderr("careful\n"),
            OutputEvent::End(None),
        ]
    );
    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(report.summary, None);
    assert_eq!(runtime.started(), vec!["compile", "link", "a.out"]);
    assert_eq!(report.steps.len(), 3);
    assert_eq!(
        report.step(StepKind::Compile).unwrap().argv[0],
        "compile".to_string()
    );
}

#[tokio::test]
async fn test_compile_error_skips_link_and_run() {
    let (playground, runtime) = playground().await;
    let log = EventLog::new();

    let report = playground.run(SYNTAX_ERROR, &log).await;

    assert_eq!(
        log.events(),
        vec![
            OutputEvent::Start,
            stderr("./main.go:1:1: syntax error\n"),
            OutputEvent::End(Some("status 2.".to_string())),
        ]
    );
    assert_eq!(
        report.outcome,
        RunOutcome::StepFailed {
            step: StepKind::Compile,
            exit_code: 2
        }
    );
    assert_eq!(runtime.started(), vec!["compile"]);
    assert!(report.step(StepKind::Link).is_none());
}

#[tokio::test]
async fn test_link_error_skips_run() {
    let (playground, runtime) = playground().await;
    let log = EventLog::new();

    let report = playground
        .run(&format!("stdout never\n{LINK_ERROR}\n"), &log)
        .await;

    assert_eq!(
        log.events(),
        vec![
            OutputEvent::Start,
            stderr("main.main: undefined: missing\n"),
            OutputEvent::End(Some("status 1.".to_string())),
        ]
    );
    assert_eq!(
        report.outcome,
        RunOutcome::StepFailed {
            step: StepKind::Link,
            exit_code: 1
        }
    );
    assert_eq!(runtime.started(), vec!["compile", "link"]);
    assert!(report.step(StepKind::Run).is_none());
    assert_eq!(playground.metrics().snapshot().step_failures, 1);
}

#[tokio::test]
async fn test_missing_program_after_link_is_infrastructure_failure() {
    let (playground, runtime) = playground().await;
    let log = EventLog::new();

    let report = playground
        .run(&format!("stdout never\n{NO_LINK_OUTPUT}\n"), &log)
        .await;

    assert_eq!(
        log.events(),
        vec![
            OutputEvent::Start,
            OutputEvent::End(Some(
                "wasm error: /a.out: file does not exist".to_string()
            )),
        ]
    );
    assert_eq!(
        report.outcome,
        RunOutcome::Infrastructure {
            step: StepKind::Run,
            message: "/a.out: file does not exist".to_string(),
        }
    );
    assert_eq!(runtime.started(), vec!["compile", "link"]);
    assert_eq!(
        report.step(StepKind::Run).unwrap().error.as_deref(),
        Some("/a.out: file does not exist")
    );
}

#[tokio::test]
async fn test_program_exit_code_becomes_summary() {
    let (playground, _) = playground().await;
    let log = EventLog::new();

    let report = playground
        .run("stdout partial\nexit 3\nstdout never\n", &log)
        .await;

    assert_eq!(log.stdout(), "partial\n");
    assert_eq!(
        log.events().last(),
        Some(&OutputEvent::End(Some("status 3.".to_string())))
    );
    assert_eq!(report.outcome.process_exit_code(), 3);
}

#[tokio::test]
async fn test_instantiation_failure_ends_run() {
    let (playground, runtime) = playground().await;
    runtime.break_module("link");
    let log = EventLog::new();

    let report = playground.run("stdout hi\n", &log).await;

    let events = log.events();
    assert_eq!(events.first(), Some(&OutputEvent::Start));
    assert_eq!(
        events.last(),
        Some(&OutputEvent::End(Some(
            "wasm error: link: invalid magic number".to_string()
        )))
    );
    assert_eq!(events.iter().filter(|e| e.is_end()).count(), 1);
    assert!(matches!(
        report.outcome,
        RunOutcome::Infrastructure {
            step: StepKind::Link,
            ..
        }
    ));
    assert_eq!(report.outcome.process_exit_code(), 1);
    assert!(report.step(StepKind::Link).unwrap().error.is_some());
    assert_eq!(playground.metrics().snapshot().infra_failures, 1);
}

#[tokio::test]
async fn test_runs_reuse_the_store() {
    let (playground, _) = playground().await;

    let first = EventLog::new();
    playground.run("stdout one\n", &first).await;
    let second = EventLog::new();
    playground.run("stdout two\n", &second).await;

    assert_eq!(first.stdout(), "one\n");
    assert_eq!(second.stdout(), "two\n");
    let metrics = playground.metrics().snapshot();
    assert_eq!(metrics.runs_started, 2);
    assert_eq!(metrics.runs_succeeded, 2);
}

#[tokio::test]
async fn test_channel_sink_receives_ordered_events() {
    let (playground, _) = playground().await;
    let (sink, mut rx) = ChannelSink::new();

    playground.run("stdout streamed\n", sink).await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![OutputEvent::Start, stdout("streamed\n"), OutputEvent::End(None)]
    );
}

// =============================================================================
// Format
// =============================================================================

#[tokio::test]
async fn test_format_returns_canonical_text() {
    let (playground, _) = playground().await;
    let messy = "stdout hi   \n\n\nexit 0  ";

    let formatted = playground.format(messy).await;

    assert_eq!(formatted, FormatOutcome::Formatted(canonical(messy)));
}

#[tokio::test]
async fn test_format_is_idempotent() {
    let (playground, _) = playground().await;

    let once = playground
        .format("stdout a  \n\nstdout b")
        .await
        .into_canonical_text()
        .unwrap();
    let twice = playground.format(&once).await;

    assert_eq!(twice.canonical_text(), Some(once.as_str()));
}

#[tokio::test]
async fn test_format_failure_is_silent() {
    let (playground, _) = playground().await;
    let source = format!("{SYNTAX_ERROR}   \n");

    let outcome = playground.format(&source).await;

    assert_eq!(outcome, FormatOutcome::Unchanged);
    assert_eq!(
        playground.store().read(layout::SOURCE_PATH).unwrap(),
        source.into_bytes()
    );
    assert_eq!(playground.metrics().snapshot().formats_skipped, 1);
}

#[tokio::test]
async fn test_formatter_instantiation_failure_is_silent() {
    let (playground, runtime) = playground().await;
    runtime.break_module("gofmt");
    let messy = "stdout hi   \n";
    let log = EventLog::new();

    let (report, formatted) = playground.run_and_format(messy, &log).await;

    assert_eq!(formatted, FormatOutcome::Unchanged);
    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(
        log.events(),
        vec![OutputEvent::Start, stdout("hi\n"), OutputEvent::End(None)]
    );
    assert_eq!(
        playground.store().read(layout::SOURCE_PATH).unwrap(),
        messy.as_bytes().to_vec()
    );
    assert_eq!(playground.metrics().snapshot().formats_skipped, 1);
}

#[tokio::test]
async fn test_run_and_format_compiles_unformatted_source() {
    let (playground, runtime) = playground().await;
    let messy = "stdout hi   \n\nstdout there\n";
    let log = EventLog::new();

    let (report, formatted) = playground.run_and_format(messy, &log).await;

    assert_eq!(report.outcome, RunOutcome::Succeeded);
    assert_eq!(runtime.compiled_sources(), vec![messy.to_string()]);
    assert_eq!(formatted, FormatOutcome::Formatted(canonical(messy)));
    assert_eq!(
        playground.store().read(layout::SOURCE_PATH).unwrap(),
        canonical(messy).into_bytes()
    );
    assert_eq!(log.stdout(), "hi\nthere\n");
}

#[tokio::test]
async fn test_run_and_format_with_syntax_error() {
    let (playground, _) = playground().await;
    let log = EventLog::new();

    let (report, formatted) = playground.run_and_format(SYNTAX_ERROR, &log).await;

    assert_eq!(formatted, FormatOutcome::Unchanged);
    assert_eq!(report.summary.as_deref(), Some("status 2."));
    // Formatter diagnostics never reach the run's output.
    assert!(!log.stderr().contains("expected 'package'"));
}

// =============================================================================
// Rendering
// =============================================================================

#[tokio::test]
async fn test_events_carry_shaped_payloads() {
    let (playground, _) = playground().await;
    let log = EventLog::new();

    playground
        .run("stdout <script>\nstdout A\x0cB\x0cC\n", &log)
        .await;

    assert_eq!(
        log.events(),
        vec![
            OutputEvent::Start,
            stdout("&lt;script&gt;\n"),
            stdout("\x0cC\n"),
            OutputEvent::End(None),
        ]
    );
}

#[tokio::test]
async fn test_transcript_renders_escaped_run() {
    let (playground, _) = playground().await;
    let transcript = HtmlTranscript::new();

    playground.run("stdout <b>&\n", &transcript).await;

    assert_eq!(
        transcript.markup(),
        "<span class=\"stdout\">&lt;b&gt;&amp;\n</span>\
         <span class=\"system\">\nProgram exited.</span>"
    );
}

#[tokio::test]
async fn test_program_image_output_renders_inline() {
    let (playground, _) = playground().await;
    let log = EventLog::new();
    let png = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG\r\n");

    playground
        .run(&format!("stdout IMAGE:{png}\n"), &log)
        .await;

    let image = log
        .events()
        .iter()
        .flat_map(display_ops)
        .find_map(|op| match op {
            DisplayOp::Image { src } => Some(src),
            _ => None,
        })
        .expect("image op");
    assert!(image.starts_with(&format!("data:image/png;base64,{png}")));
}
