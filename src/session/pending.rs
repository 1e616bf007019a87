//! Breakpoint intents held until an engine exists to install them on.
//!
//! A client can ask for breakpoints before (or between) debug sessions.
//! Those intents live here under `pending_<n>` ids and are replayed against
//! every session as it attaches. The resulting engine-assigned ids are
//! tracked per session and discarded when that session ends; the intents
//! themselves persist until explicitly removed.

use super::session::{BreakpointOptions, DebugSession};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PendingBreakpointKind {
    Line {
        path: String,
        line: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition: Option<String>,
    },
    Exception { exception: String },
    Call { function: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBreakpoint {
    pub id: String,
    #[serde(flatten)]
    pub kind: PendingBreakpointKind,
    pub enabled: bool,
    #[serde(skip)]
    pub created_at: SystemTime,
}

/// One successful installation of a pending intent on a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedBreakpoint {
    pub pending_id: String,
    pub session_id: String,
    pub engine_breakpoint_id: String,
}

#[derive(Default)]
pub struct PendingBreakpointStore {
    entries: RwLock<Vec<PendingBreakpoint>>,
    // Applied mappings keyed by session id; dropped wholesale on session end.
    applied: RwLock<HashMap<String, Vec<AppliedBreakpoint>>>,
    counter: AtomicU64,
}

impl PendingBreakpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, kind: PendingBreakpointKind) -> PendingBreakpoint {
        let id = format!("pending_{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        let breakpoint = PendingBreakpoint {
            id: id.clone(),
            kind,
            enabled: true,
            created_at: SystemTime::now(),
        };
        self.entries.write().await.push(breakpoint.clone());
        info!(pending_id = %id, "pending breakpoint recorded");
        breakpoint
    }

    pub async fn list(&self) -> Vec<PendingBreakpoint> {
        self.entries.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<PendingBreakpoint> {
        self.entries.read().await.iter().find(|b| b.id == id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|b| b.id != id);
        let removed = entries.len() != before;
        drop(entries);
        if removed {
            let mut applied = self.applied.write().await;
            for mappings in applied.values_mut() {
                mappings.retain(|a| a.pending_id != id);
            }
        }
        removed
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|b| b.id == id) {
            Some(breakpoint) => {
                breakpoint.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Install every enabled intent on a freshly attached session, in
    /// insertion order. Each intent is applied at most once per session;
    /// an engine rejection is logged and does not stop the rest.
    pub async fn apply_to_session(&self, session: &DebugSession) {
        let entries = self.entries.read().await.clone();
        for breakpoint in entries.iter().filter(|b| b.enabled) {
            let already_applied = self
                .applied
                .read()
                .await
                .get(&session.id)
                .is_some_and(|v| v.iter().any(|a| a.pending_id == breakpoint.id));
            if already_applied {
                continue;
            }

            let result = match &breakpoint.kind {
                PendingBreakpointKind::Line { path, line, condition } => {
                    let opts = BreakpointOptions {
                        condition: condition.clone(),
                        ..Default::default()
                    };
                    session
                        .set_line_breakpoint(path, *line, &opts)
                        .await
                        .map(|r| r.id)
                }
                PendingBreakpointKind::Exception { exception } => {
                    session.set_exception_breakpoint(exception).await.map(|r| r.id)
                }
                PendingBreakpointKind::Call { function } => {
                    session.set_call_breakpoint(function).await.map(|r| r.id)
                }
            };

            match result {
                Ok(engine_id) => {
                    info!(
                        pending_id = %breakpoint.id,
                        session_id = %session.id,
                        engine_breakpoint_id = %engine_id,
                        "pending breakpoint applied"
                    );
                    self.applied
                        .write()
                        .await
                        .entry(session.id.clone())
                        .or_default()
                        .push(AppliedBreakpoint {
                            pending_id: breakpoint.id.clone(),
                            session_id: session.id.clone(),
                            engine_breakpoint_id: engine_id,
                        });
                }
                Err(e) => {
                    warn!(
                        pending_id = %breakpoint.id,
                        session_id = %session.id,
                        "failed to apply pending breakpoint: {}",
                        e
                    );
                }
            }
        }
    }

    pub async fn applied_for(&self, session_id: &str) -> Vec<AppliedBreakpoint> {
        self.applied
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The session is gone; its applied mappings go with it. The intents
    /// stay live for the next session.
    pub async fn session_closed(&self, session_id: &str) {
        self.applied.write().await.remove(session_id);
    }
}
