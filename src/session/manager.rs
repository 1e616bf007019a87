//! Accepts inbound engine connections and multiplexes the live sessions.
//!
//! Each accepted socket gets a connection plus a task that drives its event
//! stream. A session is registered only once the engine's `init` frame has
//! arrived and feature negotiation has run, so callers never observe a
//! session without an init record. Pending breakpoints are replayed before
//! the session becomes visible.

use super::pending::PendingBreakpointStore;
use super::session::DebugSession;
use crate::config::ServerConfig;
use crate::dbgp::types::{SessionStatus, StreamKind};
use crate::dbgp::{Connection, ConnectionEvent, DbgpTransportTrait, TcpTransport};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Fan-out events for external subscribers (the tool layer, exporters).
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    SessionCreated {
        session_id: String,
    },
    SessionEnded {
        session_id: String,
    },
    SessionStateChanged {
        session_id: String,
        status: SessionStatus,
        file: Option<String>,
        line: Option<u32>,
    },
    Output {
        session_id: String,
        stream: StreamKind,
        content: String,
    },
}

pub struct SessionManager {
    config: ServerConfig,
    sessions: Arc<RwLock<HashMap<String, Arc<DebugSession>>>>,
    active_id: Arc<RwLock<Option<String>>>,
    pending_breakpoints: Arc<PendingBreakpointStore>,
    events: broadcast::Sender<ManagerEvent>,
    next_seq: AtomicU64,
}

impl SessionManager {
    pub fn new(config: ServerConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            active_id: Arc::new(RwLock::new(None)),
            pending_breakpoints: Arc::new(PendingBreakpointStore::new()),
            events,
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.events.subscribe()
    }

    pub fn pending_breakpoints(&self) -> Arc<PendingBreakpointStore> {
        self.pending_breakpoints.clone()
    }

    /// Bind the DBGp listener. This is the only fatal startup step; the
    /// accept loop itself runs via [`SessionManager::run`].
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            Error::Internal(format!("failed to bind DBGp listener on {addr}: {e}"))
        })?;
        info!("📡 listening for DBGp engines on {}", addr);
        Ok(listener)
    }

    pub async fn run(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (socket, peer) = listener.accept().await?;
            info!(%peer, "DBGp engine connected");
            let manager = self.clone();
            tokio::spawn(async move {
                manager.handle_engine(socket).await;
            });
        }
    }

    async fn handle_engine(self: Arc<Self>, socket: TcpStream) {
        let transport: Box<dyn DbgpTransportTrait> = Box::new(TcpTransport::new(socket));
        let (connection, mut events) = Connection::new(transport, self.config.command_timeout());
        let mut session: Option<Arc<DebugSession>> = None;

        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Init(init) => {
                    if session.is_some() {
                        warn!("duplicate init frame on connection, ignoring");
                        continue;
                    }
                    let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                    let new = Arc::new(DebugSession::new(
                        seq,
                        init,
                        connection.clone(),
                        &self.config,
                    ));
                    if let Err(e) = new.initialize().await {
                        warn!(session_id = %new.id, "feature negotiation aborted: {}", e);
                    }
                    self.pending_breakpoints.apply_to_session(&new).await;
                    self.sessions
                        .write()
                        .await
                        .insert(new.id.clone(), new.clone());
                    info!(session_id = %new.id, "✅ debug session created");
                    let _ = self.events.send(ManagerEvent::SessionCreated {
                        session_id: new.id.clone(),
                    });
                    session = Some(new);
                }
                ConnectionEvent::Response(response) => {
                    if let Some(session) = &session {
                        if session.apply_response(&response).await {
                            let state = session.get_state().await;
                            let _ = self.events.send(ManagerEvent::SessionStateChanged {
                                session_id: session.id.clone(),
                                status: state.status,
                                file: state.current_file,
                                line: state.current_line,
                            });
                        }
                    }
                }
                ConnectionEvent::Stream(record) => {
                    if let Some(session) = &session {
                        let _ = self.events.send(ManagerEvent::Output {
                            session_id: session.id.clone(),
                            stream: record.kind,
                            content: record.content,
                        });
                    }
                }
                ConnectionEvent::ProtocolError(message) => {
                    warn!("protocol error on engine connection: {}", message);
                }
                ConnectionEvent::Closed => break,
            }
        }

        if let Some(session) = session {
            session.mark_stopped().await;
            self.sessions.write().await.remove(&session.id);
            self.pending_breakpoints.session_closed(&session.id).await;
            {
                let mut active = self.active_id.write().await;
                if active.as_deref() == Some(session.id.as_str()) {
                    *active = None;
                }
            }
            let _ = self.events.send(ManagerEvent::SessionEnded {
                session_id: session.id.clone(),
            });
            info!(session_id = %session.id, "debug session ended");
        }
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Arc<DebugSession>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    /// The session addressed by tool calls that do not name one.
    ///
    /// A previously chosen id wins while it is still live. Otherwise the
    /// earliest-created session sitting at a break is elected, then the
    /// earliest-created session of any status. The choice is cached.
    pub async fn active_session(&self) -> Option<Arc<DebugSession>> {
        let sessions = self.sessions.read().await;
        let mut active = self.active_id.write().await;

        if let Some(id) = active.as_deref() {
            if let Some(session) = sessions.get(id) {
                return Some(session.clone());
            }
        }

        let mut ordered: Vec<&Arc<DebugSession>> = sessions.values().collect();
        ordered.sort_by_key(|s| s.seq);

        let mut elected: Option<&Arc<DebugSession>> = None;
        for session in ordered.iter().copied() {
            if session.get_state().await.status == SessionStatus::Break {
                elected = Some(session);
                break;
            }
        }
        let elected = elected.or_else(|| ordered.first().copied());

        *active = elected.map(|s| s.id.clone());
        elected.cloned()
    }

    pub async fn set_active(&self, session_id: &str) -> Result<()> {
        let sessions = self.sessions.read().await;
        if !sessions.contains_key(session_id) {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        *self.active_id.write().await = Some(session_id.to_string());
        Ok(())
    }

    /// Live sessions in creation order.
    pub async fn list_sessions(&self) -> Vec<Arc<DebugSession>> {
        let mut sessions: Vec<Arc<DebugSession>> =
            self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.seq);
        sessions
    }

    pub async fn find_by_file(&self, needle: &str) -> Option<Arc<DebugSession>> {
        for session in self.list_sessions().await {
            if session.matches_file(needle).await {
                return Some(session);
            }
        }
        None
    }

    pub async fn find_by_ide_key(&self, ide_key: &str) -> Option<Arc<DebugSession>> {
        self.list_sessions()
            .await
            .into_iter()
            .find(|s| s.init_record().ide_key == ide_key)
    }

    /// Close one session. Removal from the map rides the connection's close
    /// event, same as an engine-initiated disconnect.
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        let session = self.get_session(session_id).await?;
        session.close().await;
        Ok(())
    }

    pub async fn close_all(&self) {
        for session in self.list_sessions().await {
            session.close().await;
        }
    }
}
