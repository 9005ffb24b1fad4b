use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
    path::Path,
    sync::{Mutex, PoisonError},
};

use anyhow::{anyhow, Result};

use crate::events::Event;

/// Outbound transport of events to the control channel. Events are sent from
/// the control path and from traced threads alike.
pub trait EventSink: Send + Sync {
    fn send(&self, event: Event) -> Result<()>;
}

/// Writes JSON values, one per line. The same writer is used for outbound
/// events and for command replies, so both end up in order on the channel.
pub struct JsonWriter {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonWriter {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(stdout()))
    }

    /// Create (or truncate) a file to write to.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(&path)
            .map_err(|e| anyhow!("Could not create {}: {e}", path.as_ref().display()))?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    /// Marshal and write a single value, then flush the line.
    pub fn write_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        Ok(writer.flush()?)
    }
}

impl EventSink for JsonWriter {
    fn send(&self, event: Event) -> Result<()> {
        self.write_json(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{events::*, testing::SharedBuffer};

    #[test]
    fn json_lines() {
        let buf = SharedBuffer::default();
        let writer = JsonWriter::new(Box::new(buf.clone()));

        writer
            .send(Event::from(FunctionLogEvent {
                id: 1,
                message: "a, 1, true".to_string(),
            }))
            .unwrap();
        writer.write_json(&serde_json::json!({"type": "reply"})).unwrap();

        assert_eq!(
            buf.lines(),
            vec![
                serde_json::json!({"name": "function:log", "payload": {"id": 1, "message": "a, 1, true"}}),
                serde_json::json!({"type": "reply"}),
            ]
        );
    }
}
