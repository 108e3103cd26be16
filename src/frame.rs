//! Frame — wire protocol between viewers and the hub.
//!
//! ARCHITECTURE
//! ============
//! Viewers send JSON `{cmd, data}` objects (or the bare text `init`) over a
//! WebSocket. The hub answers with `{cmd, data}` commands: a single
//! `updateBAC` snapshot for unicast replies, a JSON array of drained commands
//! for broadcast flushes, and `error` frames for rejected input.
//!
//! DESIGN
//! ======
//! Decoding is two-phase: the envelope is parsed first so an unknown `cmd`
//! is distinguishable from a malformed payload, then `data` is decoded into
//! the typed struct for that command and validated. Nothing downstream ever
//! touches an untyped map.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bac::{BacError, MAX_WEIGHT_KG, MIN_WEIGHT_KG, Sex};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Bare-text liveness/bootstrap signal requesting an immediate snapshot.
pub const INIT_SIGNAL: &str = "init";

pub const CMD_JOIN: &str = "new user";
pub const CMD_DRINK: &str = "new drink";

/// Longest participant name accepted, in characters.
pub const MAX_NAME_CHARS: usize = 64;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code for structured error frames.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("binary frames are not supported")]
    BinaryUnsupported,
    #[error(transparent)]
    Bac(#[from] BacError),
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "E_MALFORMED_FRAME",
            Self::UnknownCommand(_) => "E_UNKNOWN_COMMAND",
            Self::InvalidField { .. } => "E_INVALID_FIELD",
            Self::BinaryUnsupported => "E_BINARY_UNSUPPORTED",
            Self::Bac(e) => e.error_code(),
        }
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Participant name -> current BAC. Ordered so frames serialize stably.
pub type BalanceMap = BTreeMap<String, f64>;

/// One outbound command. Serializes as `{"cmd": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", content = "data")]
pub enum Command {
    /// Full balance snapshot.
    #[serde(rename = "updateBAC")]
    UpdateBac(BalanceMap),
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl Command {
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::Error { code: err.error_code().to_string(), message: err.to_string() }
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// A decoded, validated inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Join(Join),
    Drink(Drink),
    RequestInitialState,
}

/// Validated `new user` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub name: String,
    pub weight: f64,
    pub sex: Sex,
    pub room: String,
}

/// Validated `new drink` payload. `sex`, `volume` and `strength` are checked
/// by the BAC engine when the drink is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Drink {
    pub name: String,
    pub weight: f64,
    pub sex: String,
    pub volume: f64,
    pub strength: f64,
    pub bac: f64,
}

#[derive(Deserialize)]
struct Envelope {
    cmd: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct JoinData {
    name: String,
    weight: f64,
    sex: String,
    room: String,
}

#[derive(Deserialize)]
struct DrinkData {
    name: String,
    weight: f64,
    sex: String,
    volume: f64,
    strength: f64,
    bac: f64,
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Returns a `ProtocolError` for anything that is not `init` or a known,
/// well-formed command.
pub fn decode(text: &str) -> Result<Inbound, ProtocolError> {
    if text.trim() == INIT_SIGNAL {
        return Ok(Inbound::RequestInitialState);
    }

    let envelope: Envelope = serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    match envelope.cmd.as_str() {
        CMD_JOIN => {
            let data: JoinData = decode_data(envelope.data)?;
            Ok(Inbound::Join(Join {
                name: check_name(data.name)?,
                weight: check_weight(data.weight)?,
                sex: data.sex.parse()?,
                room: data.room.trim().to_string(),
            }))
        }
        CMD_DRINK => {
            let data: DrinkData = decode_data(envelope.data)?;
            if !data.bac.is_finite() || data.bac < 0.0 {
                return Err(ProtocolError::InvalidField { field: "bac", reason: "must be a non-negative number".into() });
            }
            Ok(Inbound::Drink(Drink {
                name: check_name(data.name)?,
                weight: check_weight(data.weight)?,
                sex: data.sex,
                volume: data.volume,
                strength: data.strength,
                bac: data.bac,
            }))
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

fn decode_data<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

fn check_name(name: String) -> Result<String, ProtocolError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidField { field: "name", reason: "must not be empty".into() });
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(ProtocolError::InvalidField {
            field: "name",
            reason: format!("must be at most {MAX_NAME_CHARS} characters"),
        });
    }
    Ok(trimmed.to_string())
}

fn check_weight(weight: f64) -> Result<f64, ProtocolError> {
    if weight.is_finite() && (MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight) {
        Ok(weight)
    } else {
        Err(ProtocolError::InvalidField {
            field: "weight",
            reason: format!("must be in [{MIN_WEIGHT_KG}, {MAX_WEIGHT_KG}] kg"),
        })
    }
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
