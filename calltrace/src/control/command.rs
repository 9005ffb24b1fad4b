use serde::{Deserialize, Serialize};

use crate::{
    core::probe::{ProbeRef, ProbeSpec},
    events::ThreadRef,
};

/// Errors specific to the control channel.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ControlError {
    /// Emitted when a command line can't be decoded.
    #[error("Malformed command: {0}")]
    Malformed(String),
}

/// Inbound command. Commands are marshaled to JSON as a name/payload pair,
/// e.g. `{"name": "thread:follow", "payload": {"id": 7}}`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "name", content = "payload")]
pub enum Command {
    #[serde(rename = "thread:follow")]
    Follow(ThreadRef),
    #[serde(rename = "thread:unfollow")]
    Unfollow(ThreadRef),
    #[serde(rename = "function:add-probe")]
    AddProbe(ProbeSpec),
    #[serde(rename = "function:remove-probe")]
    RemoveProbe(ProbeRef),
    #[serde(rename = "function:update-probe")]
    UpdateProbe(ProbeSpec),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Follow(_) => "thread:follow",
            Command::Unfollow(_) => "thread:unfollow",
            Command::AddProbe(_) => "function:add-probe",
            Command::RemoveProbe(_) => "function:remove-probe",
            Command::UpdateProbe(_) => "function:update-probe",
        }
    }

    /// Decode a command line. On failure the command name is returned along
    /// the error, if it could be found.
    pub fn from_json(line: &str) -> Result<Command, (Option<String>, ControlError)> {
        let value: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| (None, ControlError::Malformed(e.to_string())))?;
        let name = value
            .get("name")
            .and_then(|n| n.as_str())
            .map(String::from);

        serde_json::from_value(value).map_err(|e| (name, ControlError::Malformed(e.to_string())))
    }
}

/// Answer to a command, written on the control channel once the command was
/// handled.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Reply {
    Reply {
        name: String,
        result: Option<serde_json::Value>,
    },
    Error {
        name: String,
        message: String,
    },
}
