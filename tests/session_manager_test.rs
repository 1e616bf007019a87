//! End-to-end accept-loop tests: a scripted engine connects over TCP and
//! the manager negotiates features, replays pending breakpoints, elects an
//! active session, and tears everything down on disconnect.

mod common;

use assert_matches::assert_matches;
use common::FakeEngine;
use dbgp_mcp::config::ServerConfig;
use dbgp_mcp::dbgp::types::{SessionStatus, StreamKind};
use dbgp_mcp::session::{BreakpointOptions, ManagerEvent, PendingBreakpointKind, SessionManager};
use dbgp_mcp::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

async fn start_manager() -> (Arc<SessionManager>, SocketAddr) {
    let manager = Arc::new(SessionManager::new(ServerConfig {
        listen_host: "127.0.0.1".to_string(),
        listen_port: 0,
        command_timeout_ms: 5_000,
        ..Default::default()
    }));
    let listener = manager.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(manager.clone().run(listener));
    (manager, addr)
}

async fn attach_engine(addr: SocketAddr, ide_key: &str, file_uri: &str) -> FakeEngine<TcpStream> {
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut engine = FakeEngine::new(stream);
    engine.send_init(ide_key, file_uri).await;
    engine.ack_feature_negotiation().await;
    engine
}

async fn wait_for_session_created(events: &mut broadcast::Receiver<ManagerEvent>) -> String {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for session_created")
            .expect("event channel closed")
        {
            ManagerEvent::SessionCreated { session_id } => return session_id,
            _ => {}
        }
    }
}

async fn wait_for_session_ended(events: &mut broadcast::Receiver<ManagerEvent>) -> String {
    loop {
        match tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for session_ended")
            .expect("event channel closed")
        {
            ManagerEvent::SessionEnded { session_id } => return session_id,
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_session_registered_after_init_and_negotiation() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();

    let _engine = attach_engine(addr, "editor-1", "file:///app/main.php").await;
    let session_id = wait_for_session_created(&mut events).await;

    let session = manager.get_session(&session_id).await.unwrap();
    assert_eq!(session.init_record().ide_key, "editor-1");
    assert_eq!(session.init_record().file_uri, "file:///app/main.php");
    assert_eq!(session.get_state().await.status, SessionStatus::Starting);

    let found = manager.find_by_file("main.php").await.unwrap();
    assert_eq!(found.id, session_id);
    let found = manager.find_by_ide_key("editor-1").await.unwrap();
    assert_eq!(found.id, session_id);
}

#[tokio::test]
async fn test_pending_breakpoint_applied_on_attach() {
    let (manager, addr) = start_manager().await;

    let pending = manager
        .pending_breakpoints()
        .add(PendingBreakpointKind::Line {
            path: "/x/y.s".to_string(),
            line: 10,
            condition: Some("$a > 1".to_string()),
        })
        .await;
    assert!(pending.id.starts_with("pending_"));

    let mut events = manager.subscribe();
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut engine = FakeEngine::new(stream);
    engine.send_init("k", "file:///x/y.s").await;
    engine.ack_feature_negotiation().await;

    // The replayed intent must arrive as a conditional breakpoint with the
    // condition as base64 data.
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "breakpoint_set");
    assert!(cmd.contains("-t conditional"), "got: {cmd}");
    assert!(cmd.contains("-f file:///x/y.s"), "got: {cmd}");
    assert!(cmd.contains("-n 10"), "got: {cmd}");
    assert!(cmd.ends_with("-- JGEgPiAx"), "got: {cmd}");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="breakpoint_set" transaction_id="{tx}" id="9001" resolved="resolved"/>"#
        ))
        .await;

    let session_id = wait_for_session_created(&mut events).await;
    let applied = manager.pending_breakpoints().applied_for(&session_id).await;
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].pending_id, pending.id);
    assert_eq!(applied[0].engine_breakpoint_id, "9001");
}

#[tokio::test]
async fn test_pending_breakpoints_survive_across_sessions() {
    let (manager, addr) = start_manager().await;
    manager
        .pending_breakpoints()
        .add(PendingBreakpointKind::Exception {
            exception: "*".to_string(),
        })
        .await;

    let mut events = manager.subscribe();

    // First session: the intent is installed, then the engine goes away.
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut engine = FakeEngine::new(stream);
    engine.send_init("k", "file:///a.x").await;
    engine.ack_feature_negotiation().await;
    let cmd = engine.read_command().await;
    assert!(cmd.contains("-t exception"), "got: {cmd}");
    assert!(cmd.contains("-x *"), "got: {cmd}");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="breakpoint_set" transaction_id="{tx}" id="7"/>"#
        ))
        .await;
    let first_id = wait_for_session_created(&mut events).await;

    drop(engine);
    let ended = wait_for_session_ended(&mut events).await;
    assert_eq!(ended, first_id);
    assert!(manager.pending_breakpoints().applied_for(&first_id).await.is_empty());

    // Second session: the still-enabled intent is replayed.
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut engine = FakeEngine::new(stream);
    engine.send_init("k", "file:///a.x").await;
    engine.ack_feature_negotiation().await;
    let cmd = engine.read_command().await;
    assert!(cmd.contains("-t exception"), "got: {cmd}");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="breakpoint_set" transaction_id="{tx}" id="8"/>"#
        ))
        .await;
    let second_id = wait_for_session_created(&mut events).await;
    assert_ne!(second_id, first_id);

    let applied = manager.pending_breakpoints().applied_for(&second_id).await;
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].engine_breakpoint_id, "8");
}

#[tokio::test]
async fn test_failed_pending_apply_does_not_block_session() {
    let (manager, addr) = start_manager().await;
    manager
        .pending_breakpoints()
        .add(PendingBreakpointKind::Line {
            path: "/gone.x".to_string(),
            line: 1,
            condition: None,
        })
        .await;

    let mut events = manager.subscribe();
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut engine = FakeEngine::new(stream);
    engine.send_init("k", "file:///a.x").await;
    engine.ack_feature_negotiation().await;

    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "breakpoint_set");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            concat!(
                r#"<response command="breakpoint_set" transaction_id="{}">"#,
                r#"<error code="100"><message>can not open file</message></error></response>"#
            ),
            tx
        ))
        .await;

    // The rejection is logged, not fatal: the session still comes up.
    let session_id = wait_for_session_created(&mut events).await;
    assert!(manager.pending_breakpoints().applied_for(&session_id).await.is_empty());
    assert!(manager.get_session(&session_id).await.is_ok());
}

#[tokio::test]
async fn test_engine_error_surfaces_code_and_message() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();
    let mut engine = attach_engine(addr, "k", "file:///m.x").await;
    let session_id = wait_for_session_created(&mut events).await;
    let session = manager.get_session(&session_id).await.unwrap();

    let task = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .set_line_breakpoint("/m.x", 3, &BreakpointOptions::default())
                .await
        }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "breakpoint_set");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            concat!(
                r#"<response command="breakpoint_set" transaction_id="{}">"#,
                r#"<error code="200"><message>breakpoint could not be set</message></error></response>"#
            ),
            tx
        ))
        .await;

    let result = task.await.unwrap();
    assert_matches!(result, Err(Error::Engine { code: 200, ref message })
        if message == "breakpoint could not be set");

    // The session stays usable after an engine error.
    let task = tokio::spawn({
        let session = session.clone();
        async move { session.stack_depth().await }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "stack_depth");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="stack_depth" transaction_id="{tx}" depth="1"/>"#
        ))
        .await;
    assert_eq!(task.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn test_break_updates_state_and_emits_change() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();
    let mut engine = attach_engine(addr, "k", "file:///a.x").await;
    let session_id = wait_for_session_created(&mut events).await;
    let session = manager.get_session(&session_id).await.unwrap();

    let run = tokio::spawn({
        let session = session.clone();
        async move { session.continue_execution().await }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "run");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            concat!(
                r#"<response command="run" transaction_id="{}" status="break" reason="ok">"#,
                r#"<xdebug:message filename="file:///a.x" lineno="5"/></response>"#
            ),
            tx
        ))
        .await;

    let status = run.await.unwrap().unwrap();
    assert_eq!(status.status, SessionStatus::Break);
    assert_eq!(status.file.as_deref(), Some("file:///a.x"));
    assert_eq!(status.line, Some(5));

    let state = session.get_state().await;
    assert_eq!(state.status, SessionStatus::Break);
    assert_eq!(state.current_file.as_deref(), Some("file:///a.x"));
    assert_eq!(state.current_line, Some(5));

    loop {
        match tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for state change")
            .expect("event channel closed")
        {
            ManagerEvent::SessionStateChanged { session_id: id, status, line, .. } => {
                assert_eq!(id, session_id);
                assert_eq!(status, SessionStatus::Break);
                assert_eq!(line, Some(5));
                break;
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_active_election_prefers_break_then_creation_order() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();

    let _engine1 = attach_engine(addr, "first", "file:///one.x").await;
    let first_id = wait_for_session_created(&mut events).await;
    let mut engine2 = attach_engine(addr, "second", "file:///two.x").await;
    let second_id = wait_for_session_created(&mut events).await;

    // Put the second session at a break before any election has happened.
    let session2 = manager.get_session(&second_id).await.unwrap();
    let run = tokio::spawn({
        let session = session2.clone();
        async move { session.continue_execution().await }
    });
    let cmd = engine2.read_command().await;
    let tx = common::transaction_id(&cmd);
    engine2
        .send_frame(&format!(
            r#"<response command="run" transaction_id="{tx}" status="break" reason="ok"/>"#
        ))
        .await;
    run.await.unwrap().unwrap();

    // A session at a break beats an earlier-created running one.
    assert_eq!(manager.active_session().await.unwrap().id, second_id);

    // Explicit selection overrides election entirely.
    manager.set_active(&first_id).await.unwrap();
    assert_eq!(manager.active_session().await.unwrap().id, first_id);

    assert_matches!(
        manager.set_active("not-a-session").await,
        Err(Error::SessionNotFound(_))
    );
}

#[tokio::test]
async fn test_election_recovers_after_active_session_ends() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();

    let engine1 = attach_engine(addr, "first", "file:///one.x").await;
    let first_id = wait_for_session_created(&mut events).await;
    let mut engine2 = attach_engine(addr, "second", "file:///two.x").await;
    let second_id = wait_for_session_created(&mut events).await;

    manager.set_active(&first_id).await.unwrap();
    drop(engine1);
    let ended = wait_for_session_ended(&mut events).await;
    assert_eq!(ended, first_id);

    // Election falls through to the surviving session.
    assert_eq!(manager.active_session().await.unwrap().id, second_id);

    // Session two stopped at a break stays electable and addressable.
    let session2 = manager.get_session(&second_id).await.unwrap();
    let run = tokio::spawn({
        let session = session2.clone();
        async move { session.continue_execution().await }
    });
    let cmd = engine2.read_command().await;
    let tx = common::transaction_id(&cmd);
    engine2
        .send_frame(&format!(
            r#"<response command="run" transaction_id="{tx}" status="break" reason="ok"/>"#
        ))
        .await;
    assert_eq!(run.await.unwrap().unwrap().status, SessionStatus::Break);
}

#[tokio::test]
async fn test_stream_output_fans_out() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();
    let mut engine = attach_engine(addr, "k", "file:///a.x").await;
    let session_id = wait_for_session_created(&mut events).await;

    engine
        .send_frame(r#"<stream type="stdout" encoding="base64">aGkK</stream>"#)
        .await;

    loop {
        match tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for output")
            .expect("event channel closed")
        {
            ManagerEvent::Output { session_id: id, stream, content } => {
                assert_eq!(id, session_id);
                assert_eq!(stream, StreamKind::Stdout);
                assert_eq!(content, "hi\n");
                break;
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_eval_error_and_source_decoding() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();
    let mut engine = attach_engine(addr, "k", "file:///a.x").await;
    let session_id = wait_for_session_created(&mut events).await;
    let session = manager.get_session(&session_id).await.unwrap();

    // An engine-side eval failure is a distinct evaluation error.
    let eval = tokio::spawn({
        let session = session.clone();
        async move { session.eval("$undefined->boom()", None).await }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "eval");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            concat!(
                r#"<response command="eval" transaction_id="{}">"#,
                r#"<error code="206"><message>can not evaluate expression</message></error></response>"#
            ),
            tx
        ))
        .await;
    assert_matches!(eval.await.unwrap(), Err(Error::Eval(ref msg))
        if msg == "can not evaluate expression");

    // Source text comes back base64-encoded and is decoded for the caller.
    let source = tokio::spawn({
        let session = session.clone();
        async move { session.source("/a.x", Some(1), Some(2)).await }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "source");
    assert!(cmd.contains("-f file:///a.x"), "got: {cmd}");
    assert!(cmd.contains("-b 1"), "got: {cmd}");
    assert!(cmd.contains("-e 2"), "got: {cmd}");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="source" transaction_id="{tx}" encoding="base64" success="1">aGkK</response>"#
        ))
        .await;
    assert_eq!(source.await.unwrap().unwrap(), "hi\n");

    // Stream redirection acknowledges with a success flag.
    let redirect = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .redirect_stdout(dbgp_mcp::session::RedirectMode::Copy)
                .await
        }
    });
    let cmd = engine.read_command().await;
    assert_eq!(common::command_name(&cmd), "stdout");
    assert!(cmd.contains("-c 1"), "got: {cmd}");
    let tx = common::transaction_id(&cmd);
    engine
        .send_frame(&format!(
            r#"<response command="stdout" transaction_id="{tx}" success="1"/>"#
        ))
        .await;
    assert!(redirect.await.unwrap().unwrap());
}

#[tokio::test]
async fn test_close_session_tears_down_connection() {
    let (manager, addr) = start_manager().await;
    let mut events = manager.subscribe();
    let _engine = attach_engine(addr, "k", "file:///a.x").await;
    let session_id = wait_for_session_created(&mut events).await;

    manager.close_session(&session_id).await.unwrap();
    let ended = wait_for_session_ended(&mut events).await;
    assert_eq!(ended, session_id);
    assert_matches!(
        manager.get_session(&session_id).await,
        Err(Error::SessionNotFound(_))
    );
}
