//! Typed views over the engine's XML dialect.
//!
//! The parsing helpers here are total: a malformed or partial payload
//! produces zeros, `None`s and empty sequences rather than errors. Engine
//! errors carried inside an otherwise valid `<response>` are preserved and
//! surfaced by [`Response::into_result`].

use super::xml::Element;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Engine run state as reported in `response/@status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Starting,
    Break,
    Running,
    Stopping,
    Stopped,
}

impl SessionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "starting" => Some(Self::Starting),
            "break" => Some(Self::Break),
            "running" => Some(Self::Running),
            "stopping" => Some(Self::Stopping),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Break => "break",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

/// The first frame an engine sends on a new connection. Immutable once
/// received.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRecord {
    pub app_id: String,
    pub ide_key: String,
    pub session: String,
    pub thread: String,
    pub language: String,
    pub protocol_version: String,
    pub file_uri: String,
    pub engine: Option<EngineInfo>,
}

impl InitRecord {
    pub fn parse(element: &Element) -> Self {
        let attr = |name: &str| element.attr(name).unwrap_or_default().to_string();
        let engine = element.child("engine").map(|e| EngineInfo {
            name: e.text.clone(),
            version: e.attr("version").unwrap_or_default().to_string(),
        });
        Self {
            app_id: attr("appid"),
            ide_key: attr("idekey"),
            session: attr("session"),
            thread: attr("thread"),
            language: attr("language"),
            protocol_version: attr("protocol_version"),
            file_uri: attr("fileuri"),
            engine,
        }
    }
}

/// `error/@code` plus the nested message text.
#[derive(Debug, Clone, Serialize)]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

/// Post-step location from `response > (xdebug:message | message)`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub filename: String,
    pub lineno: u32,
    pub exception: Option<String>,
}

/// One `<response>` frame: the echoed command, its transaction id, and the
/// common attributes every per-command decoder shares. The raw element is
/// kept for those decoders.
#[derive(Debug, Clone)]
pub struct Response {
    pub command: String,
    pub transaction_id: Option<u32>,
    pub status: Option<SessionStatus>,
    pub reason: Option<String>,
    pub success: Option<bool>,
    pub error: Option<EngineError>,
    pub location: Option<SourceLocation>,
    pub element: Element,
}

impl Response {
    pub fn parse(element: Element) -> Self {
        let error = element.child("error").map(|e| EngineError {
            code: e.attr_i32("code").unwrap_or(0),
            message: e
                .child("message")
                .map(|m| m.text.clone())
                .unwrap_or_else(|| e.text.clone()),
        });
        let location = element.child("message").map(|m| SourceLocation {
            filename: m.attr("filename").unwrap_or_default().to_string(),
            lineno: m.attr_u32("lineno").unwrap_or(0),
            exception: m.attr("exception").map(str::to_string),
        });
        Self {
            command: element.attr("command").unwrap_or_default().to_string(),
            transaction_id: element.attr_u32("transaction_id"),
            status: element.attr("status").and_then(SessionStatus::parse),
            reason: element.attr("reason").map(str::to_string),
            success: element.attr_bool("success"),
            error,
            location,
            element,
        }
    }

    /// Promote an engine-reported error (`error/@code != 0`) into [`Error`].
    /// A response without one passes through unchanged.
    pub fn into_result(self) -> Result<Self> {
        match &self.error {
            Some(err) if err.code != 0 => Err(Error::Engine {
                code: err.code,
                message: err.message.clone(),
            }),
            _ => Ok(self),
        }
    }

    pub fn stack_frames(&self) -> Vec<StackFrame> {
        self.element
            .children_named("stack")
            .map(StackFrame::from_element)
            .collect()
    }

    pub fn contexts(&self) -> Vec<Context> {
        self.element
            .children_named("context")
            .map(|c| Context {
                id: c.attr_u32("id").unwrap_or(0),
                name: c.attr("name").unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn properties(&self) -> Vec<Property> {
        self.element
            .children_named("property")
            .map(Property::from_element)
            .collect()
    }

    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.element
            .children_named("breakpoint")
            .map(Breakpoint::from_element)
            .collect()
    }

    /// Result of `breakpoint_set`: the engine-assigned id and whether the
    /// engine could already resolve the breakpoint to a real location.
    pub fn breakpoint_set_result(&self) -> BreakpointSetResult {
        BreakpointSetResult {
            id: self.element.attr("id").unwrap_or_default().to_string(),
            resolved: matches!(self.element.attr("resolved"), Some("resolved" | "1" | "true")),
        }
    }
}

/// Engine stdout/stderr content. Uncorrelated: stream frames carry no
/// transaction id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    pub kind: StreamKind,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamRecord {
    pub fn parse(element: &Element) -> Self {
        let kind = match element.attr("type") {
            Some("stderr") => StreamKind::Stderr,
            _ => StreamKind::Stdout,
        };
        let content = element
            .decoded_text()
            .unwrap_or_else(|_| element.text.clone());
        Self { kind, content }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub level: u32,
    #[serde(rename = "type")]
    pub frame_type: String,
    pub filename: String,
    pub lineno: u32,
    #[serde(rename = "where")]
    pub where_: Option<String>,
    pub cmdbegin: Option<String>,
    pub cmdend: Option<String>,
}

impl StackFrame {
    fn from_element(el: &Element) -> Self {
        Self {
            level: el.attr_u32("level").unwrap_or(0),
            frame_type: el.attr("type").unwrap_or("file").to_string(),
            filename: el.attr("filename").unwrap_or_default().to_string(),
            lineno: el.attr_u32("lineno").unwrap_or(0),
            where_: el.attr("where").map(str::to_string),
            cmdbegin: el.attr("cmdbegin").map(str::to_string),
            cmdend: el.attr("cmdend").map(str::to_string),
        }
    }
}

/// A variable context (conventionally 0 = locals, 1 = superglobals,
/// 2 = constants; ids are engine-assigned).
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    pub id: u32,
    pub name: String,
}

/// One inspected value. Properties form a tree whose depth and breadth are
/// bounded by the negotiated `max_depth`/`max_children`/`max_data` limits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub fullname: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub classname: Option<String>,
    pub facet: Option<String>,
    pub constant: bool,
    pub has_children: bool,
    pub numchildren: u32,
    pub size: u32,
    pub page: u32,
    pub pagesize: u32,
    pub address: Option<String>,
    pub key: Option<String>,
    pub value: String,
    pub children: Vec<Property>,
}

impl Property {
    pub fn from_element(el: &Element) -> Self {
        Self {
            name: el.attr("name").unwrap_or_default().to_string(),
            fullname: el.attr("fullname").unwrap_or_default().to_string(),
            property_type: el.attr("type").unwrap_or_default().to_string(),
            classname: el.attr("classname").map(str::to_string),
            facet: el.attr("facet").map(str::to_string),
            constant: el.attr_bool("constant").unwrap_or(false),
            has_children: el.attr_bool("children").unwrap_or(false),
            numchildren: el.attr_u32("numchildren").unwrap_or(0),
            size: el.attr_u32("size").unwrap_or(0),
            page: el.attr_u32("page").unwrap_or(0),
            pagesize: el.attr_u32("pagesize").unwrap_or(0),
            address: el.attr("address").map(str::to_string),
            key: el.attr("key").map(str::to_string),
            value: el.decoded_text().unwrap_or_else(|_| el.text.clone()),
            children: el.children_named("property").map(Self::from_element).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub breakpoint_type: String,
    pub enabled: bool,
    pub resolved: bool,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub function: Option<String>,
    pub exception: Option<String>,
    pub expression: Option<String>,
    pub hit_count: Option<u64>,
    pub hit_value: Option<u64>,
    pub hit_condition: Option<String>,
}

impl Breakpoint {
    pub fn from_element(el: &Element) -> Self {
        Self {
            id: el.attr("id").unwrap_or_default().to_string(),
            breakpoint_type: el.attr("type").unwrap_or_default().to_string(),
            enabled: el.attr("state") != Some("disabled"),
            resolved: matches!(el.attr("resolved"), Some("resolved" | "1" | "true")),
            filename: el.attr("filename").map(str::to_string),
            lineno: el.attr_u32("lineno"),
            function: el.attr("function").map(str::to_string),
            exception: el.attr("exception").map(str::to_string),
            expression: el
                .attr("expression")
                .map(str::to_string)
                .or_else(|| el.child("expression").map(|c| c.text.clone())),
            hit_count: el.attr_u64("hit_count"),
            hit_value: el.attr_u64("hit_value"),
            hit_condition: el.attr("hit_condition").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointSetResult {
    pub id: String,
    pub resolved: bool,
}

/// Outcome of a continuation command (`run`, the steps, `stop`, `detach`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    pub status: SessionStatus,
    pub file: Option<String>,
    pub line: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_init_record() {
        let el = Element::parse(
            r#"<init appid="1" idekey="k" session="s" thread="t" language="X"
                    protocol_version="1.0" fileuri="file:///a.x">
                 <engine version="3.2"><![CDATA[Xdebug]]></engine>
               </init>"#,
        )
        .unwrap();
        let init = InitRecord::parse(&el);
        assert_eq!(init.app_id, "1");
        assert_eq!(init.ide_key, "k");
        assert_eq!(init.language, "X");
        assert_eq!(init.file_uri, "file:///a.x");
        let engine = init.engine.unwrap();
        assert_eq!(engine.name, "Xdebug");
        assert_eq!(engine.version, "3.2");
    }

    #[test]
    fn test_parse_break_response_with_location() {
        let el = Element::parse(
            r#"<response command="run" transaction_id="1" status="break" reason="ok">
                 <xdebug:message filename="file:///a.x" lineno="5"/>
               </response>"#,
        )
        .unwrap();
        let response = Response::parse(el);
        assert_eq!(response.command, "run");
        assert_eq!(response.transaction_id, Some(1));
        assert_eq!(response.status, Some(SessionStatus::Break));
        let location = response.location.unwrap();
        assert_eq!(location.filename, "file:///a.x");
        assert_eq!(location.lineno, 5);
    }

    #[test]
    fn test_engine_error_surfaced() {
        let el = Element::parse(
            r#"<response command="breakpoint_set" transaction_id="3">
                 <error code="200"><message>breakpoint could not be set</message></error>
               </response>"#,
        )
        .unwrap();
        let result = Response::parse(el).into_result();
        assert_matches!(result, Err(Error::Engine { code: 200, ref message })
            if message == "breakpoint could not be set");
    }

    #[test]
    fn test_base64_property_value() {
        let el = Element::parse(
            r#"<response command="property_get" transaction_id="4">
                 <property name="$s" fullname="$s" type="string" encoding="base64">SGVsbG8=</property>
               </response>"#,
        )
        .unwrap();
        let response = Response::parse(el);
        let props = response.properties();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].value, "Hello");
        assert_eq!(props[0].property_type, "string");
    }

    #[test]
    fn test_nested_properties() {
        let el = Element::parse(
            r#"<response command="context_get" transaction_id="5">
                 <property name="$arr" fullname="$arr" type="array" children="1" numchildren="2">
                   <property name="0" fullname="$arr[0]" type="int">1</property>
                   <property name="1" fullname="$arr[1]" type="int">2</property>
                 </property>
               </response>"#,
        )
        .unwrap();
        let props = Response::parse(el).properties();
        assert_eq!(props.len(), 1);
        assert!(props[0].has_children);
        assert_eq!(props[0].numchildren, 2);
        assert_eq!(props[0].children.len(), 2);
        assert_eq!(props[0].children[1].fullname, "$arr[1]");
        assert_eq!(props[0].children[1].value, "2");
    }

    #[test]
    fn test_stack_frames_and_contexts() {
        let el = Element::parse(
            r#"<response command="stack_get" transaction_id="6">
                 <stack level="0" type="file" filename="file:///a.x" lineno="5" where="main"/>
                 <stack level="1" type="eval" filename="file:///b.x" lineno="9"/>
               </response>"#,
        )
        .unwrap();
        let frames = Response::parse(el).stack_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].level, 0);
        assert_eq!(frames[0].where_.as_deref(), Some("main"));
        assert_eq!(frames[1].frame_type, "eval");

        let el = Element::parse(
            r#"<response command="context_names" transaction_id="7">
                 <context name="Locals" id="0"/>
                 <context name="Superglobals" id="1"/>
               </response>"#,
        )
        .unwrap();
        let contexts = Response::parse(el).contexts();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[1].name, "Superglobals");
        assert_eq!(contexts[1].id, 1);
    }

    #[test]
    fn test_breakpoint_list_and_set_result() {
        let el = Element::parse(
            r#"<response command="breakpoint_list" transaction_id="8">
                 <breakpoint id="9001" type="line" state="enabled" resolved="resolved"
                             filename="file:///a.x" lineno="10" hit_count="2"/>
                 <breakpoint id="9002" type="exception" state="disabled" exception="RuntimeError"/>
               </response>"#,
        )
        .unwrap();
        let bps = Response::parse(el).breakpoints();
        assert_eq!(bps.len(), 2);
        assert_eq!(bps[0].id, "9001");
        assert!(bps[0].enabled);
        assert!(bps[0].resolved);
        assert_eq!(bps[0].hit_count, Some(2));
        assert!(!bps[1].enabled);
        assert_eq!(bps[1].exception.as_deref(), Some("RuntimeError"));

        let el = Element::parse(
            r#"<response command="breakpoint_set" transaction_id="9" id="9003" resolved="unresolved"/>"#,
        )
        .unwrap();
        let set = Response::parse(el).breakpoint_set_result();
        assert_eq!(set.id, "9003");
        assert!(!set.resolved);
    }

    #[test]
    fn test_missing_fields_default() {
        let el = Element::parse(r#"<response command="status"/>"#).unwrap();
        let response = Response::parse(el);
        assert_eq!(response.transaction_id, None);
        assert!(response.status.is_none());
        assert!(response.stack_frames().is_empty());
        assert!(response.properties().is_empty());
        assert!(response.breakpoints().is_empty());
    }

    #[test]
    fn test_stream_record() {
        let el = Element::parse(r#"<stream type="stdout" encoding="base64">aGkK</stream>"#).unwrap();
        let record = StreamRecord::parse(&el);
        assert_eq!(record.kind, StreamKind::Stdout);
        assert_eq!(record.content, "hi\n");
    }
}
