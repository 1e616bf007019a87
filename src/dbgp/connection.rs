//! One DBGp engine connection.
//!
//! DBGp allows a single outstanding command per connection. The connection
//! owns that rule: a command issued while another is in flight is queued,
//! and the queue is drained by response completion (or timeout expiry),
//! never by the writer. Responses are correlated to waiting callers by
//! transaction id.

use super::command;
use super::transport_trait::DbgpTransportTrait;
use super::types::{InitRecord, Response, StreamRecord};
use super::xml::Element;
use crate::{Error, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Engine-to-server traffic in arrival order. `Closed` is always the final
/// event.
#[derive(Debug)]
pub enum ConnectionEvent {
    Init(InitRecord),
    Response(Response),
    Stream(StreamRecord),
    ProtocolError(String),
    Closed,
}

type WaiterSender = oneshot::Sender<Result<Response>>;

#[derive(Debug)]
struct Waiter {
    transaction_id: u32,
    command: String,
    sender: WaiterSender,
}

#[derive(Debug)]
struct QueuedCommand {
    transaction_id: u32,
    command: String,
    wire: Vec<u8>,
    sender: WaiterSender,
}

#[derive(Debug, Default)]
struct CommandState {
    // Single-command rule: at most one entry here, ever.
    outstanding: Option<Waiter>,
    queue: VecDeque<QueuedCommand>,
    closed: bool,
}

#[derive(Debug)]
pub struct Connection {
    tx_counter: AtomicU32,
    state: Arc<Mutex<CommandState>>,
    write_tx: mpsc::UnboundedSender<Vec<u8>>,
    init: Arc<RwLock<Option<InitRecord>>>,
    command_timeout: Duration,
}

impl Connection {
    /// Wrap a transport and spawn its reader and writer tasks. The returned
    /// receiver delivers every engine-initiated event; dropping it does not
    /// stop the connection.
    pub fn new(
        transport: Box<dyn DbgpTransportTrait>,
        command_timeout: Duration,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let transport = Arc::new(Mutex::new(transport));
        let state = Arc::new(Mutex::new(CommandState::default()));
        let init = Arc::new(RwLock::new(None));
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let connection = Arc::new(Self {
            tx_counter: AtomicU32::new(1),
            state: state.clone(),
            write_tx: write_tx.clone(),
            init: init.clone(),
            command_timeout,
        });

        tokio::spawn(Self::frame_reader(
            transport.clone(),
            state,
            init,
            event_tx,
            write_tx,
            command_timeout,
        ));
        tokio::spawn(Self::command_writer(transport, write_rx));

        (connection, event_rx)
    }

    /// Issue one DBGp command and wait for its response. If another command
    /// is outstanding the submission is queued; queue order is FIFO. The
    /// timeout is armed when the command actually goes on the wire. The
    /// returned response may still carry an engine error, which the caller
    /// interprets ([`Response::into_result`]).
    pub async fn send_command(
        &self,
        cmd: &str,
        args: &[(&str, String)],
        data: Option<&[u8]>,
    ) -> Result<Response> {
        let transaction_id = self.tx_counter.fetch_add(1, Ordering::SeqCst);
        let wire = command::encode(cmd, transaction_id, args, data);
        let (sender, receiver) = oneshot::channel();

        {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(Error::ConnectionClosed);
            }
            if state.outstanding.is_none() {
                self.write_tx.send(wire).map_err(|_| Error::ConnectionClosed)?;
                state.outstanding = Some(Waiter {
                    transaction_id,
                    command: cmd.to_string(),
                    sender,
                });
                Self::arm_timer(
                    self.state.clone(),
                    self.write_tx.clone(),
                    self.command_timeout,
                    transaction_id,
                );
            } else {
                debug!(command = cmd, transaction_id, "command queued behind outstanding command");
                state.queue.push_back(QueuedCommand {
                    transaction_id,
                    command: cmd.to_string(),
                    wire,
                    sender,
                });
            }
        }

        receiver.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// The init record the engine opened the connection with, once seen.
    pub async fn init_record(&self) -> Option<InitRecord> {
        self.init.read().await.clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// Fail all waiters and stop accepting commands. The reader notices the
    /// closed flag on its next cycle and emits the `Closed` event.
    pub async fn close(&self) {
        debug!("closing DBGp connection");
        Self::fail_all(&self.state).await;
    }

    async fn frame_reader(
        transport: Arc<Mutex<Box<dyn DbgpTransportTrait>>>,
        state: Arc<Mutex<CommandState>>,
        init: Arc<RwLock<Option<InitRecord>>>,
        event_tx: mpsc::UnboundedSender<ConnectionEvent>,
        write_tx: mpsc::UnboundedSender<Vec<u8>>,
        command_timeout: Duration,
    ) {
        loop {
            if state.lock().await.closed {
                break;
            }

            // Hold the transport lock only while a frame may be ready; the
            // writer task needs it between frames.
            let frame = {
                let mut transport = transport.lock().await;
                tokio::select! {
                    result = transport.read_frame() => Some(result),
                    _ = tokio::time::sleep(Duration::from_millis(50)) => None,
                }
            };

            let xml = match frame {
                None => {
                    tokio::time::sleep(Duration::from_micros(100)).await;
                    continue;
                }
                Some(Ok(xml)) => xml,
                Some(Err(Error::ConnectionClosed)) => break,
                Some(Err(e)) => {
                    error!("failed to read DBGp frame: {}", e);
                    break;
                }
            };

            let element = match Element::parse(&xml) {
                Ok(element) => element,
                Err(e) => {
                    warn!("undecodable DBGp frame: {}", e);
                    let _ = event_tx.send(ConnectionEvent::ProtocolError(e.to_string()));
                    continue;
                }
            };

            match element.local_name() {
                "init" => {
                    let record = InitRecord::parse(&element);
                    info!(
                        app_id = %record.app_id,
                        ide_key = %record.ide_key,
                        file = %record.file_uri,
                        "DBGp init received"
                    );
                    *init.write().await = Some(record.clone());
                    let _ = event_tx.send(ConnectionEvent::Init(record));
                }
                "response" => {
                    let response = Response::parse(element);
                    Self::complete_response(&state, &write_tx, command_timeout, &response).await;
                    let _ = event_tx.send(ConnectionEvent::Response(response));
                }
                "stream" => {
                    let _ = event_tx.send(ConnectionEvent::Stream(StreamRecord::parse(&element)));
                }
                other => {
                    warn!("unexpected DBGp root element <{}>", other);
                    let _ = event_tx.send(ConnectionEvent::ProtocolError(format!(
                        "unexpected root element <{other}>"
                    )));
                }
            }
        }

        Self::fail_all(&state).await;
        let _ = event_tx.send(ConnectionEvent::Closed);
        debug!("DBGp frame reader exiting");
    }

    async fn command_writer(
        transport: Arc<Mutex<Box<dyn DbgpTransportTrait>>>,
        mut write_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    ) {
        while let Some(bytes) = write_rx.recv().await {
            let mut transport = transport.lock().await;
            if let Err(e) = transport.write_command(&bytes).await {
                error!("failed to write DBGp command: {}", e);
                break;
            }
        }
        debug!("DBGp command writer exiting");
    }

    /// Deliver a response to its waiter, then let the next queued command
    /// go out. The dequeue is driven by response completion, which is what
    /// keeps the single-command invariant honest.
    async fn complete_response(
        state: &Arc<Mutex<CommandState>>,
        write_tx: &mpsc::UnboundedSender<Vec<u8>>,
        command_timeout: Duration,
        response: &Response,
    ) {
        let mut guard = state.lock().await;
        let matches = response.transaction_id.is_some()
            && guard
                .outstanding
                .as_ref()
                .is_some_and(|w| Some(w.transaction_id) == response.transaction_id);

        if matches {
            if let Some(waiter) = guard.outstanding.take() {
                if waiter.sender.send(Ok(response.clone())).is_err() {
                    debug!(
                        transaction_id = waiter.transaction_id,
                        "waiter gone before response delivery"
                    );
                }
            }
        } else {
            warn!(
                transaction_id = ?response.transaction_id,
                command = %response.command,
                "response does not match any outstanding command"
            );
        }

        Self::dispatch_next(state, &mut guard, write_tx, command_timeout);
    }

    fn dispatch_next(
        state: &Arc<Mutex<CommandState>>,
        guard: &mut CommandState,
        write_tx: &mpsc::UnboundedSender<Vec<u8>>,
        command_timeout: Duration,
    ) {
        while guard.outstanding.is_none() {
            let Some(next) = guard.queue.pop_front() else {
                break;
            };
            if write_tx.send(next.wire).is_err() {
                // Writer gone; dropping the sender fails the caller.
                continue;
            }
            let transaction_id = next.transaction_id;
            guard.outstanding = Some(Waiter {
                transaction_id,
                command: next.command,
                sender: next.sender,
            });
            Self::arm_timer(state.clone(), write_tx.clone(), command_timeout, transaction_id);
        }
    }

    /// Watchdog for one dispatched command. If the command is still
    /// outstanding when the timer fires, its waiter fails with `Timeout`
    /// and the queue is drained; a completed command makes this a no-op.
    fn arm_timer(
        state: Arc<Mutex<CommandState>>,
        write_tx: mpsc::UnboundedSender<Vec<u8>>,
        command_timeout: Duration,
        transaction_id: u32,
    ) {
        tokio::spawn(async move {
            tokio::time::sleep(command_timeout).await;
            let mut guard = state.lock().await;
            let expired = guard
                .outstanding
                .as_ref()
                .is_some_and(|w| w.transaction_id == transaction_id);
            if !expired {
                return;
            }
            if let Some(waiter) = guard.outstanding.take() {
                warn!(
                    command = %waiter.command,
                    transaction_id,
                    "DBGp command timed out"
                );
                let _ = waiter
                    .sender
                    .send(Err(Error::Timeout(waiter.command.clone())));
            }
            Self::dispatch_next(&state, &mut guard, &write_tx, command_timeout);
        });
    }

    async fn fail_all(state: &Arc<Mutex<CommandState>>) {
        let mut guard = state.lock().await;
        guard.closed = true;
        // Dropping the senders fails every waiter with ConnectionClosed.
        guard.outstanding = None;
        guard.queue.clear();
    }
}
