//! One live debug session wrapping one engine connection.
//!
//! The session performs feature negotiation on attach and exposes the DBGp
//! command surface as typed operations. Status and current location follow
//! whatever the engine last reported; every response that carries them
//! overwrites the previous value.

use crate::config::ServerConfig;
use crate::dbgp::types::{
    Breakpoint, BreakpointSetResult, Context, ExecutionStatus, InitRecord, Property, Response,
    SessionStatus, StackFrame,
};
use crate::dbgp::Connection;
use crate::util::to_file_uri;
use crate::{Error, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mutable run state, readable as a snapshot.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: SessionStatus,
    pub current_file: Option<String>,
    pub current_line: Option<u32>,
}

/// Optional settings for a line breakpoint. A condition turns the
/// breakpoint into type `conditional` on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointOptions {
    pub condition: Option<String>,
    pub hit_value: Option<u64>,
    /// One of `>=`, `==`, `%`.
    pub hit_condition: Option<String>,
    #[serde(default)]
    pub temporary: bool,
}

/// How an output stream redirection behaves: 0 disables, 1 copies to the
/// IDE, 2 redirects entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    Disable,
    Copy,
    Redirect,
}

impl RedirectMode {
    fn as_arg(self) -> String {
        match self {
            Self::Disable => "0".to_string(),
            Self::Copy => "1".to_string(),
            Self::Redirect => "2".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct DebugSession {
    pub id: String,
    /// Creation order within the manager; drives active-session election.
    pub seq: u64,
    pub start_time: SystemTime,
    init: InitRecord,
    connection: Arc<Connection>,
    state: Arc<RwLock<SessionState>>,
    breakpoints: Arc<RwLock<Vec<Breakpoint>>>,
    config: ServerConfig,
}

impl DebugSession {
    pub fn new(seq: u64, init: InitRecord, connection: Arc<Connection>, config: &ServerConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seq,
            start_time: SystemTime::now(),
            init,
            connection,
            state: Arc::new(RwLock::new(SessionState {
                status: SessionStatus::Starting,
                current_file: None,
                current_line: None,
            })),
            breakpoints: Arc::new(RwLock::new(Vec::new())),
            config: config.clone(),
        }
    }

    /// Feature negotiation, run once on attach. A feature the engine
    /// rejects is logged and skipped; the session stays usable.
    pub async fn initialize(&self) -> Result<()> {
        let features = [
            ("max_depth", self.config.max_depth.to_string()),
            ("max_children", self.config.max_children.to_string()),
            ("max_data", self.config.max_data.to_string()),
            ("show_hidden", "1".to_string()),
        ];
        for (name, value) in features {
            if let Err(e) = self.feature_set(name, &value).await {
                warn!(session_id = %self.id, feature = name, "feature negotiation failed: {}", e);
            }
        }
        debug!(session_id = %self.id, "feature negotiation complete");
        Ok(())
    }

    async fn feature_set(&self, name: &str, value: &str) -> Result<()> {
        self.connection
            .send_command(
                "feature_set",
                &[("n", name.to_string()), ("v", value.to_string())],
                None,
            )
            .await?
            .into_result()
            .map(|_| ())
    }

    pub fn init_record(&self) -> &InitRecord {
        &self.init
    }

    pub async fn get_state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn breakpoint_cache(&self) -> Vec<Breakpoint> {
        self.breakpoints.read().await.clone()
    }

    // --- breakpoints ---

    pub async fn set_line_breakpoint(
        &self,
        file: &str,
        line: u32,
        opts: &BreakpointOptions,
    ) -> Result<BreakpointSetResult> {
        let kind = if opts.condition.is_some() { "conditional" } else { "line" };
        let mut args = vec![
            ("t", kind.to_string()),
            ("f", to_file_uri(file)),
            ("n", line.to_string()),
        ];
        if let Some(hit_value) = opts.hit_value {
            args.push(("h", hit_value.to_string()));
        }
        if let Some(hit_condition) = &opts.hit_condition {
            args.push(("o", hit_condition.clone()));
        }
        if opts.temporary {
            args.push(("r", "1".to_string()));
        }

        let response = self
            .connection
            .send_command("breakpoint_set", &args, opts.condition.as_deref().map(str::as_bytes))
            .await?
            .into_result()?;
        let result = response.breakpoint_set_result();
        info!(session_id = %self.id, file, line, breakpoint_id = %result.id, "line breakpoint set");
        self.cache_breakpoint(&result, kind).await;
        Ok(result)
    }

    pub async fn set_exception_breakpoint(&self, exception: &str) -> Result<BreakpointSetResult> {
        let response = self
            .connection
            .send_command(
                "breakpoint_set",
                &[("t", "exception".to_string()), ("x", exception.to_string())],
                None,
            )
            .await?
            .into_result()?;
        let result = response.breakpoint_set_result();
        info!(session_id = %self.id, exception, breakpoint_id = %result.id, "exception breakpoint set");
        self.cache_breakpoint(&result, "exception").await;
        Ok(result)
    }

    pub async fn set_call_breakpoint(&self, function: &str) -> Result<BreakpointSetResult> {
        let response = self
            .connection
            .send_command(
                "breakpoint_set",
                &[("t", "call".to_string()), ("m", function.to_string())],
                None,
            )
            .await?
            .into_result()?;
        let result = response.breakpoint_set_result();
        info!(session_id = %self.id, function, breakpoint_id = %result.id, "call breakpoint set");
        self.cache_breakpoint(&result, "call").await;
        Ok(result)
    }

    async fn cache_breakpoint(&self, result: &BreakpointSetResult, kind: &str) {
        // The set response carries no breakpoint element, so synthesize a
        // cache entry from what we know; breakpoint_list replaces it with
        // the engine's view.
        let mut cache = self.breakpoints.write().await;
        cache.push(Breakpoint {
            id: result.id.clone(),
            breakpoint_type: kind.to_string(),
            enabled: true,
            resolved: result.resolved,
            filename: None,
            lineno: None,
            function: None,
            exception: None,
            expression: None,
            hit_count: None,
            hit_value: None,
            hit_condition: None,
        });
    }

    pub async fn remove_breakpoint(&self, id: &str) -> Result<bool> {
        let response = self
            .connection
            .send_command("breakpoint_remove", &[("d", id.to_string())], None)
            .await?
            .into_result()?;
        self.breakpoints.write().await.retain(|b| b.id != id);
        Ok(response.error.is_none())
    }

    pub async fn update_breakpoint(
        &self,
        id: &str,
        enabled: Option<bool>,
        hit_value: Option<u64>,
        hit_condition: Option<&str>,
    ) -> Result<bool> {
        let mut args = vec![("d", id.to_string())];
        if let Some(enabled) = enabled {
            let state = if enabled { "enabled" } else { "disabled" };
            args.push(("s", state.to_string()));
        }
        if let Some(hit_value) = hit_value {
            args.push(("h", hit_value.to_string()));
        }
        if let Some(hit_condition) = hit_condition {
            args.push(("o", hit_condition.to_string()));
        }
        let response = self
            .connection
            .send_command("breakpoint_update", &args, None)
            .await?
            .into_result()?;
        Ok(response.error.is_none())
    }

    /// Fetch the engine's breakpoint table, replacing the local cache.
    pub async fn list_breakpoints(&self) -> Result<Vec<Breakpoint>> {
        let response = self
            .connection
            .send_command("breakpoint_list", &[], None)
            .await?
            .into_result()?;
        let breakpoints = response.breakpoints();
        *self.breakpoints.write().await = breakpoints.clone();
        Ok(breakpoints)
    }

    // --- execution ---

    pub async fn continue_execution(&self) -> Result<ExecutionStatus> {
        self.run_command("run").await
    }

    pub async fn step_into(&self) -> Result<ExecutionStatus> {
        self.run_command("step_into").await
    }

    pub async fn step_over(&self) -> Result<ExecutionStatus> {
        self.run_command("step_over").await
    }

    pub async fn step_out(&self) -> Result<ExecutionStatus> {
        self.run_command("step_out").await
    }

    pub async fn stop(&self) -> Result<ExecutionStatus> {
        self.run_command("stop").await
    }

    pub async fn detach(&self) -> Result<ExecutionStatus> {
        self.run_command("detach").await
    }

    async fn run_command(&self, command: &str) -> Result<ExecutionStatus> {
        let response = self
            .connection
            .send_command(command, &[], None)
            .await?
            .into_result()?;
        self.apply_response(&response).await;
        let state = self.state.read().await;
        Ok(ExecutionStatus {
            status: response.status.unwrap_or(state.status),
            file: response
                .location
                .as_ref()
                .map(|l| l.filename.clone())
                .or_else(|| state.current_file.clone()),
            line: response
                .location
                .as_ref()
                .map(|l| l.lineno)
                .or(state.current_line),
        })
    }

    // --- inspection ---

    pub async fn stack_depth(&self) -> Result<u32> {
        let response = self
            .connection
            .send_command("stack_depth", &[], None)
            .await?
            .into_result()?;
        Ok(response.element.attr_u32("depth").unwrap_or(0))
    }

    pub async fn stack_get(&self, depth: Option<u32>) -> Result<Vec<StackFrame>> {
        let mut args = Vec::new();
        if let Some(depth) = depth {
            args.push(("d", depth.to_string()));
        }
        let response = self
            .connection
            .send_command("stack_get", &args, None)
            .await?
            .into_result()?;
        Ok(response.stack_frames())
    }

    pub async fn context_names(&self, depth: Option<u32>) -> Result<Vec<Context>> {
        let mut args = Vec::new();
        if let Some(depth) = depth {
            args.push(("d", depth.to_string()));
        }
        let response = self
            .connection
            .send_command("context_names", &args, None)
            .await?
            .into_result()?;
        Ok(response.contexts())
    }

    pub async fn context_get(&self, depth: u32, context: u32) -> Result<Vec<Property>> {
        let response = self
            .connection
            .send_command(
                "context_get",
                &[("d", depth.to_string()), ("c", context.to_string())],
                None,
            )
            .await?
            .into_result()?;
        Ok(response.properties())
    }

    pub async fn property_get(
        &self,
        name: &str,
        context: u32,
        depth: u32,
        page: Option<u32>,
    ) -> Result<Property> {
        let mut args = vec![
            ("n", name.to_string()),
            ("c", context.to_string()),
            ("d", depth.to_string()),
            ("m", self.config.max_data.to_string()),
        ];
        if let Some(page) = page {
            args.push(("p", page.to_string()));
        }
        let response = self
            .connection
            .send_command("property_get", &args, None)
            .await?
            .into_result()?;
        response
            .properties()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Protocol(format!("property_get returned no property for {name}")))
    }

    pub async fn property_set(
        &self,
        name: &str,
        context: u32,
        depth: u32,
        value: &str,
    ) -> Result<bool> {
        let response = self
            .connection
            .send_command(
                "property_set",
                &[
                    ("n", name.to_string()),
                    ("c", context.to_string()),
                    ("d", depth.to_string()),
                ],
                Some(value.as_bytes()),
            )
            .await?
            .into_result()?;
        Ok(response.success.unwrap_or(false))
    }

    /// Evaluate an expression in the engine. An engine-side failure comes
    /// back as a distinct evaluation error rather than a generic one.
    pub async fn eval(&self, expression: &str, depth: Option<u32>) -> Result<Property> {
        let mut args = Vec::new();
        if let Some(depth) = depth {
            args.push(("d", depth.to_string()));
        }
        let response = self
            .connection
            .send_command("eval", &args, Some(expression.as_bytes()))
            .await?;
        if let Some(error) = &response.error {
            if error.code != 0 {
                return Err(Error::Eval(error.message.clone()));
            }
        }
        response
            .properties()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Eval("engine returned no result".to_string()))
    }

    pub async fn source(&self, file: &str, begin: Option<u32>, end: Option<u32>) -> Result<String> {
        let mut args = vec![("f", to_file_uri(file))];
        if let Some(begin) = begin {
            args.push(("b", begin.to_string()));
        }
        if let Some(end) = end {
            args.push(("e", end.to_string()));
        }
        let response = self
            .connection
            .send_command("source", &args, None)
            .await?
            .into_result()?;
        response.element.decoded_text()
    }

    pub async fn redirect_stdout(&self, mode: RedirectMode) -> Result<bool> {
        let response = self
            .connection
            .send_command("stdout", &[("c", mode.as_arg())], None)
            .await?
            .into_result()?;
        Ok(response.success.unwrap_or(false))
    }

    pub async fn redirect_stderr(&self, mode: RedirectMode) -> Result<bool> {
        let response = self
            .connection
            .send_command("stderr", &[("c", mode.as_arg())], None)
            .await?
            .into_result()?;
        Ok(response.success.unwrap_or(false))
    }

    // --- lifecycle & state tracking ---

    /// Fold a response into the session state. Returns true when the
    /// response carried status or location information, i.e. when a state
    /// change event should go out.
    pub(crate) async fn apply_response(&self, response: &Response) -> bool {
        if response.status.is_none() && response.location.is_none() {
            return false;
        }
        let mut state = self.state.write().await;
        if let Some(status) = response.status {
            state.status = status;
        }
        if let Some(location) = &response.location {
            state.current_file = Some(location.filename.clone());
            state.current_line = Some(location.lineno);
        }
        true
    }

    pub(crate) async fn mark_stopped(&self) {
        self.state.write().await.status = SessionStatus::Stopped;
    }

    pub async fn close(&self) {
        info!(session_id = %self.id, "closing debug session");
        self.connection.close().await;
    }

    /// True when the lookup needle matches the file the engine announced at
    /// init or the file execution currently sits in.
    pub async fn matches_file(&self, needle: &str) -> bool {
        if self.init.file_uri.contains(needle) {
            return true;
        }
        self.state
            .read()
            .await
            .current_file
            .as_deref()
            .is_some_and(|f| f.contains(needle))
    }
}
