use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::payload::OverlayPayload;
use crate::telephony::CallSignal;

pub const METHOD_CLOSE_OVERLAY: &str = "closeOverlay";
pub const METHOD_GET_NATIVE_NUMBER: &str = "getNativeNumber";
pub const METHOD_GET_PRE_START_DATA: &str = "getPreStartData";
pub const METHOD_UPDATE_LOOKUP_RESULT: &str = "updateLookupResult";
pub const METHOD_SHOW_OVERLAY_WITH_DATA: &str = "showOverlayWithData";
pub const METHOD_UPDATE_HEIGHT: &str = "updateHeight";

/// Start-command `state` value that pre-warms the engine after boot.
pub const BOOT_STATE: &str = "BOOT";

/// A method invocation as it arrives on the command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeCall {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl BridgeCall {
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Commands the renderer (or the outer application) can send the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    CloseOverlay,
    GetNativeNumber,
    GetPreStartData,
    /// `None` when the arguments were not a map.
    UpdateLookupResult(Option<OverlayPayload>),
    ShowOverlayWithData(Option<OverlayPayload>),
    /// `None` (or a non-positive value) restores wrap-content.
    UpdateHeight(Option<i64>),
    Unknown(String),
}

impl BridgeCommand {
    pub fn from_call(call: BridgeCall) -> Self {
        let BridgeCall { method, arguments } = call;
        match method.as_str() {
            METHOD_CLOSE_OVERLAY => BridgeCommand::CloseOverlay,
            METHOD_GET_NATIVE_NUMBER => BridgeCommand::GetNativeNumber,
            METHOD_GET_PRE_START_DATA => BridgeCommand::GetPreStartData,
            METHOD_UPDATE_LOOKUP_RESULT => {
                BridgeCommand::UpdateLookupResult(arguments.and_then(OverlayPayload::from_value))
            }
            METHOD_SHOW_OVERLAY_WITH_DATA => {
                BridgeCommand::ShowOverlayWithData(arguments.and_then(OverlayPayload::from_value))
            }
            METHOD_UPDATE_HEIGHT => {
                BridgeCommand::UpdateHeight(arguments.as_ref().and_then(requested_height))
            }
            _ => BridgeCommand::Unknown(method),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            BridgeCommand::CloseOverlay => METHOD_CLOSE_OVERLAY,
            BridgeCommand::GetNativeNumber => METHOD_GET_NATIVE_NUMBER,
            BridgeCommand::GetPreStartData => METHOD_GET_PRE_START_DATA,
            BridgeCommand::UpdateLookupResult(_) => METHOD_UPDATE_LOOKUP_RESULT,
            BridgeCommand::ShowOverlayWithData(_) => METHOD_SHOW_OVERLAY_WITH_DATA,
            BridgeCommand::UpdateHeight(_) => METHOD_UPDATE_HEIGHT,
            BridgeCommand::Unknown(method) => method.as_str(),
        }
    }
}

fn requested_height(arguments: &Value) -> Option<i64> {
    let height = arguments.get("height")?;
    height
        .as_i64()
        .or_else(|| height.as_f64().map(|h| h.round() as i64))
}

/// Result handed back to the caller of a bridge method.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeReply {
    Null,
    Value(Value),
    NotImplemented,
}

impl BridgeReply {
    pub fn value(&self) -> Option<&Value> {
        match self {
            BridgeReply::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            BridgeReply::Null => Value::Null,
            BridgeReply::Value(value) => value.clone(),
            BridgeReply::NotImplemented => json!({ "error": "notImplemented" }),
        }
    }
}

/// Arguments of a start request from the surrounding process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartCommand {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
}

/// What a start request asks the controller to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCommand {
    CallState(CallSignal),
    ShowOverlay,
    Boot,
}

impl ServiceCommand {
    /// `command` wins over `state`; a request carrying neither is `None`.
    pub fn from_start(start: StartCommand) -> Option<Self> {
        if start.command.as_deref() == Some(METHOD_SHOW_OVERLAY_WITH_DATA) {
            return Some(ServiceCommand::ShowOverlay);
        }
        let state = start.state?;
        if state.trim().eq_ignore_ascii_case(BOOT_STATE) {
            return Some(ServiceCommand::Boot);
        }
        Some(ServiceCommand::CallState(CallSignal::from_label(
            &state,
            start.number.as_deref(),
        )))
    }
}
