//! The debugger tool surface.
//!
//! Every tool is a named operation with a typed argument record and a JSON
//! result. Tools that operate on a session accept an optional `sessionId`;
//! when omitted, the manager's active-session election picks one. A missing
//! session is reported as a structured `error` payload, not a protocol
//! failure, so the client can recover (e.g. by setting a pending
//! breakpoint before any engine has connected).

use crate::session::{BreakpointOptions, DebugSession, PendingBreakpointKind, SessionManager};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionArgs {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointArgs {
    pub session_id: Option<String>,
    pub path: Option<String>,
    pub line: Option<u32>,
    pub condition: Option<String>,
    pub hit_value: Option<u64>,
    pub hit_condition: Option<String>,
    pub exception: Option<String>,
    pub function: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointArgs {
    pub session_id: Option<String>,
    pub breakpoint_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBreakpointArgs {
    pub session_id: Option<String>,
    pub breakpoint_id: String,
    pub enabled: Option<bool>,
    pub hit_value: Option<u64>,
    pub hit_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceArgs {
    pub session_id: Option<String>,
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextsArgs {
    pub session_id: Option<String>,
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesArgs {
    pub session_id: Option<String>,
    pub context: Option<u32>,
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableArgs {
    pub session_id: Option<String>,
    pub name: String,
    pub context: Option<u32>,
    pub depth: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableArgs {
    pub session_id: Option<String>,
    pub name: String,
    pub value: String,
    pub context: Option<u32>,
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateArgs {
    pub session_id: Option<String>,
    pub expression: String,
    pub depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceArgs {
    pub session_id: Option<String>,
    pub path: String,
    pub begin_line: Option<u32>,
    pub end_line: Option<u32>,
}

fn no_session_error() -> Value {
    json!({
        "error": {
            "code": "no_session",
            "message": "No debug session is connected. Waiting for an engine to attach.",
        }
    })
}

fn session_not_found_error(session_id: &str) -> Value {
    json!({
        "error": {
            "code": "session_not_found",
            "message": format!("No debug session with id {session_id}"),
        }
    })
}

pub struct ToolsHandler {
    manager: Arc<SessionManager>,
}

impl ToolsHandler {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    pub async fn handle_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "debugger_list_sessions" => self.list_sessions().await,
            "debugger_session_state" => self.session_state(arguments).await,
            "debugger_set_active_session" => self.set_active_session(arguments).await,
            "debugger_close_session" => self.close_session(arguments).await,
            "debugger_set_breakpoint" => self.set_breakpoint(arguments).await,
            "debugger_remove_breakpoint" => self.remove_breakpoint(arguments).await,
            "debugger_update_breakpoint" => self.update_breakpoint(arguments).await,
            "debugger_list_breakpoints" => self.list_breakpoints(arguments).await,
            "debugger_continue" => self.execution(arguments, "run").await,
            "debugger_step_into" => self.execution(arguments, "step_into").await,
            "debugger_step_over" => self.execution(arguments, "step_over").await,
            "debugger_step_out" => self.execution(arguments, "step_out").await,
            "debugger_stop" => self.execution(arguments, "stop").await,
            "debugger_detach" => self.execution(arguments, "detach").await,
            "debugger_stack_trace" => self.stack_trace(arguments).await,
            "debugger_contexts" => self.contexts(arguments).await,
            "debugger_variables" => self.variables(arguments).await,
            "debugger_variable" => self.variable(arguments).await,
            "debugger_set_variable" => self.set_variable(arguments).await,
            "debugger_evaluate" => self.evaluate(arguments).await,
            "debugger_source" => self.source(arguments).await,
            _ => Err(Error::MethodNotFound(name.to_string())),
        }
    }

    /// Resolve the addressed session: explicit id first, active election
    /// otherwise. `Err` carries the structured error payload to return.
    async fn resolve_session(
        &self,
        session_id: Option<&str>,
    ) -> std::result::Result<Arc<DebugSession>, Value> {
        match session_id {
            Some(id) => self
                .manager
                .get_session(id)
                .await
                .map_err(|_| session_not_found_error(id)),
            None => self
                .manager
                .active_session()
                .await
                .ok_or_else(no_session_error),
        }
    }

    async fn session_json(session: &DebugSession) -> Value {
        let state = session.get_state().await;
        let init = session.init_record();
        json!({
            "sessionId": session.id,
            "status": state.status,
            "file": state.current_file,
            "line": state.current_line,
            "ideKey": init.ide_key,
            "language": init.language,
            "appId": init.app_id,
            "fileUri": init.file_uri,
        })
    }

    async fn list_sessions(&self) -> Result<Value> {
        let mut sessions = Vec::new();
        for session in self.manager.list_sessions().await {
            sessions.push(Self::session_json(&session).await);
        }
        Ok(json!({ "sessions": sessions }))
    }

    async fn session_state(&self, arguments: Value) -> Result<Value> {
        let args: SessionArgs = serde_json::from_value(arguments)?;
        match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => Ok(Self::session_json(&session).await),
            Err(error) => Ok(error),
        }
    }

    async fn set_active_session(&self, arguments: Value) -> Result<Value> {
        let args: SetActiveArgs = serde_json::from_value(arguments)?;
        match self.manager.set_active(&args.session_id).await {
            Ok(()) => Ok(json!({ "activeSessionId": args.session_id })),
            Err(Error::SessionNotFound(id)) => Ok(session_not_found_error(&id)),
            Err(e) => Err(e),
        }
    }

    async fn close_session(&self, arguments: Value) -> Result<Value> {
        let args: SessionArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        self.manager.close_session(&session.id).await?;
        Ok(json!({ "sessionId": session.id, "status": "closed" }))
    }

    async fn set_breakpoint(&self, arguments: Value) -> Result<Value> {
        let args: SetBreakpointArgs = serde_json::from_value(arguments)?;

        let kind = if let Some(exception) = args.exception.clone() {
            PendingBreakpointKind::Exception { exception }
        } else if let Some(function) = args.function.clone() {
            PendingBreakpointKind::Call { function }
        } else if let (Some(path), Some(line)) = (args.path.clone(), args.line) {
            PendingBreakpointKind::Line {
                path,
                line,
                condition: args.condition.clone(),
            }
        } else {
            return Err(Error::InvalidRequest(
                "set_breakpoint requires path+line, exception, or function".to_string(),
            ));
        };

        let session = match &args.session_id {
            Some(id) => match self.manager.get_session(id).await {
                Ok(session) => Some(session),
                Err(_) => return Ok(session_not_found_error(id)),
            },
            None => self.manager.active_session().await,
        };

        // Without a session the intent is parked and replayed on attach.
        let Some(session) = session else {
            let pending = self.manager.pending_breakpoints().add(kind).await;
            return Ok(json!({ "pending": true, "id": pending.id }));
        };

        let result = match kind {
            PendingBreakpointKind::Line { path, line, condition } => {
                let opts = BreakpointOptions {
                    condition,
                    hit_value: args.hit_value,
                    hit_condition: args.hit_condition.clone(),
                    temporary: false,
                };
                session.set_line_breakpoint(&path, line, &opts).await?
            }
            PendingBreakpointKind::Exception { exception } => {
                session.set_exception_breakpoint(&exception).await?
            }
            PendingBreakpointKind::Call { function } => {
                session.set_call_breakpoint(&function).await?
            }
        };

        Ok(json!({
            "pending": false,
            "sessionId": session.id,
            "id": result.id,
            "resolved": result.resolved,
        }))
    }

    async fn remove_breakpoint(&self, arguments: Value) -> Result<Value> {
        let args: RemoveBreakpointArgs = serde_json::from_value(arguments)?;

        if args.breakpoint_id.starts_with("pending_") {
            let removed = self
                .manager
                .pending_breakpoints()
                .remove(&args.breakpoint_id)
                .await;
            if !removed {
                return Err(Error::BreakpointNotFound(args.breakpoint_id));
            }
            return Ok(json!({ "removed": true, "id": args.breakpoint_id }));
        }

        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let removed = session.remove_breakpoint(&args.breakpoint_id).await?;
        Ok(json!({ "removed": removed, "id": args.breakpoint_id }))
    }

    async fn update_breakpoint(&self, arguments: Value) -> Result<Value> {
        let args: UpdateBreakpointArgs = serde_json::from_value(arguments)?;

        if args.breakpoint_id.starts_with("pending_") {
            // A pending breakpoint has no engine side yet; hit counts only
            // make sense once it has been applied to a session.
            if args.hit_value.is_some() || args.hit_condition.is_some() {
                return Err(Error::InvalidRequest(
                    "pending breakpoints accept only enable/disable updates".to_string(),
                ));
            }
            let Some(enabled) = args.enabled else {
                return Err(Error::InvalidRequest(
                    "update requires an 'enabled' value for pending breakpoints".to_string(),
                ));
            };
            let updated = self
                .manager
                .pending_breakpoints()
                .set_enabled(&args.breakpoint_id, enabled)
                .await;
            if !updated {
                return Err(Error::BreakpointNotFound(args.breakpoint_id));
            }
            return Ok(json!({ "updated": true, "id": args.breakpoint_id, "enabled": enabled }));
        }

        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let updated = session
            .update_breakpoint(
                &args.breakpoint_id,
                args.enabled,
                args.hit_value,
                args.hit_condition.as_deref(),
            )
            .await?;
        Ok(json!({ "updated": updated, "id": args.breakpoint_id }))
    }

    async fn list_breakpoints(&self, arguments: Value) -> Result<Value> {
        let args: SessionArgs = serde_json::from_value(arguments)?;
        let pending = self.manager.pending_breakpoints().list().await;

        let session = match &args.session_id {
            Some(id) => match self.manager.get_session(id).await {
                Ok(session) => Some(session),
                Err(_) => return Ok(session_not_found_error(id)),
            },
            None => self.manager.active_session().await,
        };

        let mut result = json!({ "pending": pending });
        if let Some(session) = session {
            let breakpoints = session.list_breakpoints().await?;
            let applied = self
                .manager
                .pending_breakpoints()
                .applied_for(&session.id)
                .await;
            result["sessionId"] = json!(session.id);
            result["breakpoints"] = serde_json::to_value(breakpoints)?;
            result["applied"] = serde_json::to_value(applied)?;
        }
        Ok(result)
    }

    async fn execution(&self, arguments: Value, command: &str) -> Result<Value> {
        let args: SessionArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };

        let status = match command {
            "run" => session.continue_execution().await?,
            "step_into" => session.step_into().await?,
            "step_over" => session.step_over().await?,
            "step_out" => session.step_out().await?,
            "stop" => session.stop().await?,
            "detach" => session.detach().await?,
            _ => return Err(Error::Internal(format!("unknown execution command {command}"))),
        };

        let mut result = serde_json::to_value(&status)?;
        result["sessionId"] = json!(session.id);
        Ok(result)
    }

    async fn stack_trace(&self, arguments: Value) -> Result<Value> {
        let args: StackTraceArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let frames = session.stack_get(args.depth).await?;
        Ok(json!({ "sessionId": session.id, "stackFrames": frames }))
    }

    async fn contexts(&self, arguments: Value) -> Result<Value> {
        let args: ContextsArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let contexts = session.context_names(args.depth).await?;
        Ok(json!({ "sessionId": session.id, "contexts": contexts }))
    }

    async fn variables(&self, arguments: Value) -> Result<Value> {
        let args: VariablesArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let variables = session
            .context_get(args.depth.unwrap_or(0), args.context.unwrap_or(0))
            .await?;
        Ok(json!({ "sessionId": session.id, "variables": variables }))
    }

    async fn variable(&self, arguments: Value) -> Result<Value> {
        let args: VariableArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let variable = session
            .property_get(
                &args.name,
                args.context.unwrap_or(0),
                args.depth.unwrap_or(0),
                args.page,
            )
            .await?;
        Ok(json!({ "sessionId": session.id, "variable": variable }))
    }

    async fn set_variable(&self, arguments: Value) -> Result<Value> {
        let args: SetVariableArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let success = session
            .property_set(
                &args.name,
                args.context.unwrap_or(0),
                args.depth.unwrap_or(0),
                &args.value,
            )
            .await?;
        Ok(json!({ "sessionId": session.id, "success": success }))
    }

    async fn evaluate(&self, arguments: Value) -> Result<Value> {
        let args: EvaluateArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let result = session.eval(&args.expression, args.depth).await?;
        Ok(json!({ "sessionId": session.id, "result": result }))
    }

    async fn source(&self, arguments: Value) -> Result<Value> {
        let args: SourceArgs = serde_json::from_value(arguments)?;
        let session = match self.resolve_session(args.session_id.as_deref()).await {
            Ok(session) => session,
            Err(error) => return Ok(error),
        };
        let source = session
            .source(&args.path, args.begin_line, args.end_line)
            .await?;
        Ok(json!({ "sessionId": session.id, "path": args.path, "source": source }))
    }

    pub fn list_tools() -> Vec<Value> {
        let session_id_prop = json!({
            "type": "string",
            "description": "Session id; omitted means the active session"
        });

        vec![
            json!({
                "name": "debugger_list_sessions",
                "title": "List Debug Sessions",
                "description": "Lists every connected debug session with its status and current location.",
                "inputSchema": { "type": "object", "properties": {} },
                "annotations": { "category": "session-management" }
            }),
            json!({
                "name": "debugger_session_state",
                "title": "Session State",
                "description": "Status, current file and line of one session (or the active one).",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "session-management" }
            }),
            json!({
                "name": "debugger_set_active_session",
                "title": "Set Active Session",
                "description": "Makes the named session the default target for tools called without a sessionId.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": { "type": "string" } },
                    "required": ["sessionId"]
                },
                "annotations": { "category": "session-management" }
            }),
            json!({
                "name": "debugger_close_session",
                "title": "Close Session",
                "description": "Closes a debug session and drops its engine connection.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "session-management" }
            }),
            json!({
                "name": "debugger_set_breakpoint",
                "title": "Set Breakpoint",
                "description": "Sets a line, conditional, exception or call breakpoint. When no engine is connected yet the breakpoint is stored as pending (id prefixed pending_) and installed automatically on every session as it attaches.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "path": { "type": "string", "description": "Source file path for a line breakpoint" },
                        "line": { "type": "integer", "description": "1-indexed line number" },
                        "condition": { "type": "string", "description": "Expression; makes the breakpoint conditional" },
                        "hitValue": { "type": "integer" },
                        "hitCondition": { "type": "string", "enum": [">=", "==", "%"] },
                        "exception": { "type": "string", "description": "Exception name (or *) for an exception breakpoint" },
                        "function": { "type": "string", "description": "Function name for a call breakpoint" }
                    }
                },
                "annotations": { "category": "breakpoints" }
            }),
            json!({
                "name": "debugger_remove_breakpoint",
                "title": "Remove Breakpoint",
                "description": "Removes a breakpoint by id. pending_ ids are removed from the pending store; anything else is removed from the addressed session.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "breakpointId": { "type": "string" }
                    },
                    "required": ["breakpointId"]
                },
                "annotations": { "category": "breakpoints" }
            }),
            json!({
                "name": "debugger_update_breakpoint",
                "title": "Update Breakpoint",
                "description": "Enables or disables a breakpoint, or adjusts hit count settings. Pending breakpoints accept only enable/disable.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "breakpointId": { "type": "string" },
                        "enabled": { "type": "boolean" },
                        "hitValue": { "type": "integer" },
                        "hitCondition": { "type": "string", "enum": [">=", "==", "%"] }
                    },
                    "required": ["breakpointId"]
                },
                "annotations": { "category": "breakpoints" }
            }),
            json!({
                "name": "debugger_list_breakpoints",
                "title": "List Breakpoints",
                "description": "Lists the engine's breakpoint table for the addressed session plus every pending breakpoint.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "breakpoints" }
            }),
            json!({
                "name": "debugger_continue",
                "title": "Continue",
                "description": "Resumes execution until the next breakpoint or program end. Returns the resulting status and location.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_step_into",
                "title": "Step Into",
                "description": "Steps to the next statement, entering function calls.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_step_over",
                "title": "Step Over",
                "description": "Steps to the next statement in the current frame.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_step_out",
                "title": "Step Out",
                "description": "Runs until the current function returns.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_stop",
                "title": "Stop",
                "description": "Tells the engine to terminate the debuggee.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_detach",
                "title": "Detach",
                "description": "Detaches from the debuggee, letting it run to completion without the debugger.",
                "inputSchema": {
                    "type": "object",
                    "properties": { "sessionId": session_id_prop.clone() }
                },
                "annotations": { "category": "execution" }
            }),
            json!({
                "name": "debugger_stack_trace",
                "title": "Stack Trace",
                "description": "The call stack at the current break position, topmost frame first (level 0).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "depth": { "type": "integer", "description": "Fetch only this stack level" }
                    }
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_contexts",
                "title": "Variable Contexts",
                "description": "The engine's variable contexts at a stack depth (locals, superglobals, constants).",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "depth": { "type": "integer" }
                    }
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_variables",
                "title": "List Variables",
                "description": "All variables in one context at one stack depth. Defaults to locals (context 0) in the top frame.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "context": { "type": "integer" },
                        "depth": { "type": "integer" }
                    }
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_variable",
                "title": "Get Variable",
                "description": "One variable (and its children, up to the negotiated depth) by full name, e.g. $arr[0].",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "name": { "type": "string" },
                        "context": { "type": "integer" },
                        "depth": { "type": "integer" },
                        "page": { "type": "integer", "description": "Child page for large structures" }
                    },
                    "required": ["name"]
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_set_variable",
                "title": "Set Variable",
                "description": "Assigns a new value to a variable in the paused program.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "name": { "type": "string" },
                        "value": { "type": "string" },
                        "context": { "type": "integer" },
                        "depth": { "type": "integer" }
                    },
                    "required": ["name", "value"]
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_evaluate",
                "title": "Evaluate Expression",
                "description": "Evaluates an expression in the paused program and returns the resulting value tree.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "expression": { "type": "string" },
                        "depth": { "type": "integer", "description": "Stack depth to evaluate in" }
                    },
                    "required": ["expression"]
                },
                "annotations": { "category": "inspection" }
            }),
            json!({
                "name": "debugger_source",
                "title": "Fetch Source",
                "description": "Fetches source text from the engine, optionally limited to a line range. Useful when the file only exists inside the debuggee's container.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": session_id_prop.clone(),
                        "path": { "type": "string" },
                        "beginLine": { "type": "integer" },
                        "endLine": { "type": "integer" }
                    },
                    "required": ["path"]
                },
                "annotations": { "category": "inspection" }
            }),
        ]
    }
}
