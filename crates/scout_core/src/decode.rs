use serde::Deserialize;
use serde_json::Value;

use crate::{StageId, StageProgress};

/// A decoded progress stream message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// Connection heartbeat; carries no state change.
    Keepalive,
    Update(ProgressUpdate),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    pub stage: Option<StageUpdate>,
    pub status: Option<TerminalStatus>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageUpdate {
    pub stage: StageId,
    pub progress: StageProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Completed,
    Error,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("payload has an ill-typed field: {0}")]
    InvalidField(String),
    #[error("unknown stage {0}")]
    UnknownStage(u64),
    #[error("stage {stage} update without current/total")]
    MissingCounts { stage: u64 },
    #[error("unknown status {0:?}")]
    UnknownStatus(String),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    keepalive: Option<bool>,
    #[serde(default)]
    stage: Option<u64>,
    #[serde(default)]
    current: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Decode one stream payload.
///
/// The server marks every non-terminal message with `status: "running"`, which
/// decodes to no transition. Counts above a known total are clamped to it.
pub fn decode_message(payload: &str) -> Result<StreamMessage, DecodeError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| DecodeError::InvalidJson(err.to_string()))?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let raw: RawMessage =
        serde_json::from_value(value).map_err(|err| DecodeError::InvalidField(err.to_string()))?;

    if raw.keepalive == Some(true) {
        return Ok(StreamMessage::Keepalive);
    }

    let stage = raw
        .stage
        .map(|number| decode_stage(number, raw.current, raw.total))
        .transpose()?;

    let status = match raw.status.as_deref() {
        None | Some("running") => None,
        Some("completed") => Some(TerminalStatus::Completed),
        Some("error") => Some(TerminalStatus::Error),
        Some(other) => return Err(DecodeError::UnknownStatus(other.to_string())),
    };

    Ok(StreamMessage::Update(ProgressUpdate {
        stage,
        status,
        message: raw.message.filter(|text| !text.is_empty()),
    }))
}

fn decode_stage(
    number: u64,
    current: Option<u64>,
    total: Option<u64>,
) -> Result<StageUpdate, DecodeError> {
    let stage = u8::try_from(number)
        .ok()
        .and_then(StageId::from_number)
        .ok_or(DecodeError::UnknownStage(number))?;
    let (Some(current), Some(total)) = (current, total) else {
        return Err(DecodeError::MissingCounts { stage: number });
    };
    let current = if total > 0 { current.min(total) } else { current };
    Ok(StageUpdate {
        stage,
        progress: StageProgress::new(current, total),
    })
}
