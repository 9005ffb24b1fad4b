//! Outbound events. Events are marshaled to JSON as a name/payload pair, e.g.
//!
//! {
//!     "name": "thread:summary",
//!     "payload": {
//!         "thread": { "id": 7 },
//!         "summary": {
//!             "0x1050": { "symbol": { "module": "m", "offset": 80 }, "count": 3 },
//!             "0x9000": { "symbol": null, "count": 1 }
//!         }
//!     }
//! }
//!
//! {
//!     "name": "function:log",
//!     "payload": { "id": 2, "message": "a, 1, true" }
//! }

use std::fmt;

use anyhow::Result;

use crate::*;

/// Payload of a named event. Use `#[calltrace_derive::event_payload(name)]`
/// to implement it.
pub trait EventPayload: serde::Serialize {
    /// Name of the event carrying this payload.
    const NAME: &'static str;
    fn to_json(&self) -> serde_json::Value;
}

/// Full event. Internal representation.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "name", content = "payload")]
pub enum Event {
    #[serde(rename = "thread:summary")]
    ThreadSummary(ThreadSummaryEvent),
    #[serde(rename = "function:log")]
    FunctionLog(FunctionLogEvent),
}

impl Event {
    /// Name of the event, as seen on the control channel.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ThreadSummary(_) => ThreadSummaryEvent::NAME,
            Event::FunctionLog(_) => FunctionLogEvent::NAME,
        }
    }

    /// Create an Event from a json string.
    pub fn from_json(line: &str) -> Result<Event> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<ThreadSummaryEvent> for Event {
    fn from(payload: ThreadSummaryEvent) -> Self {
        Event::ThreadSummary(payload)
    }
}

impl From<FunctionLogEvent> for Event {
    fn from(payload: FunctionLogEvent) -> Self {
        Event::FunctionLog(payload)
    }
}

impl EventFmt for Event {
    fn event_fmt(&self, f: &mut fmt::Formatter, format: &DisplayFormat) -> fmt::Result {
        match self {
            Event::ThreadSummary(e) => e.event_fmt(f, format),
            Event::FunctionLog(e) => e.event_fmt(f, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_wire_format() {
        let log = Event::from(FunctionLogEvent {
            id: 2,
            message: "a, 1, true".to_string(),
        });
        let json = log.to_json().unwrap();
        assert_eq!(json["name"], log.name());
        assert_eq!(json["payload"], serde_json::json!({"id": 2, "message": "a, 1, true"}));

        let summary = Event::from(ThreadSummaryEvent {
            thread: ThreadRef { id: 1 },
            summary: ThreadSummary::new(),
        });
        assert_eq!(summary.to_json().unwrap()["name"], "thread:summary");
        assert_eq!(summary.name(), ThreadSummaryEvent::NAME);
    }

    #[test]
    fn parse_event() {
        let event = Event::from_json(
            r#"{"name":"thread:summary","payload":{"thread":{"id":7},"summary":{"0x1050":{"symbol":{"module":"m","offset":80},"count":3}}}}"#,
        )
        .unwrap();

        let Event::ThreadSummary(summary) = event else {
            panic!("wrong event type");
        };
        assert_eq!(summary.thread.id, 7);
        assert_eq!(summary.summary["0x1050"].count, 3);
        assert_eq!(
            summary.summary["0x1050"].symbol.as_ref().unwrap().module,
            "m"
        );

        assert!(Event::from_json(r#"{"name":"thread:nope","payload":{}}"#).is_err());
    }

    #[test]
    fn display_log() {
        let event = Event::from(FunctionLogEvent {
            id: 4,
            message: "hello".to_string(),
        });
        assert_eq!(
            format!("{}", event.display(DisplayFormat::new())),
            "[probe 4] hello"
        );
    }
}
