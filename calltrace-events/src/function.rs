use std::fmt;

use super::*;
use crate::event_payload;

/// Caller-supplied identifier tagging the output of a probe handler.
pub type ProbeHandlerId = u64;

/// Message logged by a probe handler while it was running.
#[event_payload("function:log")]
pub struct FunctionLogEvent {
    /// Identifier of the handler which emitted the message.
    pub id: ProbeHandlerId,
    /// Message fragments, joined by ", ".
    pub message: String,
}

impl EventFmt for FunctionLogEvent {
    fn event_fmt(&self, f: &mut fmt::Formatter, _: &DisplayFormat) -> fmt::Result {
        write!(f, "[probe {}] {}", self.id, self.message)
    }
}
