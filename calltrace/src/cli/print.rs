//! # Print
//!
//! Parses recorded events and prints them back to stdout.

use std::{
    io::{self, stdout, ErrorKind, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::{MainConfig, SubCommandParserRunner};
use crate::events::{file::FileEventsFactory, *};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PrintFormat {
    SingleLine,
    #[default]
    MultiLine,
    Json,
}

#[derive(Args, Debug, Default)]
pub struct Print {
    #[arg(help = "Events file, as written by the agent (JSON lines)")]
    pub input: PathBuf,
    #[arg(long, help = "Format used when printing an event")]
    #[clap(value_enum, default_value_t=PrintFormat::MultiLine)]
    pub format: PrintFormat,
}

/// Format and write events one by one.
pub struct PrintEvent {
    writer: Box<dyn Write>,
    format: PrintFormat,
}

impl PrintEvent {
    pub fn new(writer: Box<dyn Write>, format: PrintFormat) -> Self {
        Self { writer, format }
    }

    pub fn process_one(&mut self, e: &Event) -> Result<()> {
        match self.format {
            PrintFormat::Json => {
                let mut event = serde_json::to_vec(e)?;
                event.push(b'\n');
                self.writer.write_all(&event)?;
            }
            PrintFormat::SingleLine | PrintFormat::MultiLine => {
                let multiline = self.format == PrintFormat::MultiLine;
                let event = format!("{}", e.display(DisplayFormat::new().multiline(multiline)));
                self.writer.write_all(event.as_bytes())?;
                self.writer
                    .write_all(if multiline { b"\n\n" } else { b"\n" })?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}

impl SubCommandParserRunner for Print {
    fn run(&mut self, _: &MainConfig) -> Result<()> {
        let mut factory = FileEventsFactory::from_path(&self.input)?;
        let mut output = PrintEvent::new(Box::new(stdout()), self.format);

        while let Some(event) = factory.next_event()? {
            if let Err(e) = output.process_one(&event) {
                match e.downcast_ref::<io::Error>() {
                    // Output closed (e.g. piped to head), stop quietly.
                    Some(io_error) if io_error.kind() == ErrorKind::BrokenPipe => return Ok(()),
                    _ => return Err(e),
                }
            }
        }
        output.flush()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::testing::SharedBuffer;

    fn print(format: PrintFormat) -> String {
        let buf = SharedBuffer::default();
        let mut output = PrintEvent::new(Box::new(buf.clone()), format);
        let mut factory =
            FileEventsFactory::from_path("../calltrace-events/test_data/events.json").unwrap();

        while let Some(event) = factory.next_event().unwrap() {
            output.process_one(&event).unwrap();
        }
        output.flush().unwrap();
        buf.text()
    }

    #[test_case(PrintFormat::SingleLine, 3; "single line")]
    #[test_case(PrintFormat::Json, 3; "json")]
    fn line_count(format: PrintFormat, lines: usize) {
        assert_eq!(print(format).lines().count(), lines);
    }

    #[test]
    fn multi_line() {
        let out = print(PrintFormat::MultiLine);
        // Events are separated by an empty line.
        assert_eq!(out.split("\n\n").filter(|e| !e.is_empty()).count(), 3);
    }

    #[test]
    fn json_is_lossless() {
        let out = print(PrintFormat::Json);
        let events: Vec<Event> = out.lines().map(|l| Event::from_json(l).unwrap()).collect();

        let mut factory =
            FileEventsFactory::from_path("../calltrace-events/test_data/events.json").unwrap();
        let mut expected = Vec::new();
        while let Some(event) = factory.next_event().unwrap() {
            expected.push(event);
        }
        assert_eq!(events, expected);
    }
}
