//! Handles the file (json) to Rust event retrieval and the unmarshaling process.

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use anyhow::{anyhow, Result};

use crate::Event;

/// File events factory retrieving and unmarshaling events, one per line.
pub struct FileEventsFactory {
    reader: BufReader<Box<dyn Read + Send>>,
    /// Current line number, for error reporting.
    line: usize,
}

impl FileEventsFactory {
    pub fn from_path<P>(file: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::new(Box::new(File::open(&file).map_err(|e| {
            anyhow!("Could not open {}: {e}", file.as_ref().display())
        })?)))
    }

    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        FileEventsFactory {
            reader: BufReader::new(reader),
            line: 0,
        }
    }

    /// Retrieve the next event or None if we've reached the end of the file.
    /// Blank lines are skipped.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let mut line = String::new();

        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Err(e) => return Err(e.into()),
                Ok(0) => return Ok(None),
                Ok(_) => self.line += 1,
            }

            if line.trim().is_empty() {
                continue;
            }

            return Event::from_json(line.trim())
                .map(Some)
                .map_err(|e| anyhow!("Failed to parse event at line {}: {e}", self.line));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn factory(content: &'static str) -> FileEventsFactory {
        FileEventsFactory::new(Box::new(Cursor::new(content)))
    }

    #[test]
    fn read_from_file() {
        let mut fact = FileEventsFactory::from_path("test_data/events.json").unwrap();

        let mut events = Vec::new();
        while let Some(event) = fact.next_event().unwrap() {
            events.push(event)
        }

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].name(), "thread:summary");
        assert_eq!(events[1].name(), "function:log");
        assert_eq!(events[2].name(), "thread:summary");
    }

    #[test]
    fn skip_blank_lines() {
        let mut fact = factory(
            "\n{\"name\":\"function:log\",\"payload\":{\"id\":1,\"message\":\"x\"}}\n\n",
        );
        assert!(fact.next_event().unwrap().is_some());
        assert!(fact.next_event().unwrap().is_none());
    }

    #[test]
    fn invalid_line() {
        let mut fact = factory("{\"name\":\"function:log\",\"payload\":{\"id\":1,\"message\":\"x\"}}\nnot json\n");
        assert!(fact.next_event().is_ok());
        let err = fact.next_event().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
