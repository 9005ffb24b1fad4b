use std::{io::BufRead, sync::Arc};

use anyhow::Result;
use log::{debug, info, log_enabled, warn, Level};
use serde_json::json;

use super::{Command, ControlError, Reply};
use crate::{
    config::AgentConfig,
    core::{
        probe::{HandlerCompiler, ProbeRegistry},
        Engine, EventSink, JsonWriter, SymbolResolver, ThreadTracer,
    },
};

/// Agent owns the tracing state of a process: the thread tracer and the probe
/// registry. It is built once by the hosting service and handles commands one
/// at a time, in arrival order.
pub struct Agent {
    tracer: ThreadTracer,
    probes: ProbeRegistry,
    output: Arc<JsonWriter>,
}

impl Agent {
    /// Create a new agent. Events and command replies are both written to
    /// `output`.
    pub fn new(
        engine: Arc<dyn Engine>,
        resolver: Arc<dyn SymbolResolver>,
        compiler: Arc<dyn HandlerCompiler>,
        output: Arc<JsonWriter>,
    ) -> Self {
        let sink: Arc<dyn EventSink> = output.clone();
        Self {
            tracer: ThreadTracer::new(Arc::clone(&engine), resolver, Arc::clone(&sink)),
            probes: ProbeRegistry::new(engine, compiler, sink),
            output,
        }
    }

    /// Create a new agent, getting the module map and the output from the
    /// configuration.
    pub fn from_config(
        config: &AgentConfig,
        engine: Arc<dyn Engine>,
        compiler: Arc<dyn HandlerCompiler>,
    ) -> Result<Self> {
        let map = config.symbols.module_map()?;
        info!("Agent started with {} module(s)", map.len());

        Ok(Self::new(
            engine,
            Arc::new(map),
            compiler,
            Arc::new(config.events.writer()?),
        ))
    }

    /// Handle a single command. Adding a probe returns its engine id, other
    /// commands return nothing.
    pub fn handle(&mut self, command: Command) -> Result<Option<serde_json::Value>> {
        Ok(match command {
            Command::Follow(thread) => {
                self.tracer.follow(thread)?;
                None
            }
            Command::Unfollow(thread) => {
                self.tracer.unfollow(thread)?;
                None
            }
            Command::AddProbe(spec) => {
                let id = self.probes.add_probe(&spec)?;
                self.dump_probes();
                Some(json!(id))
            }
            Command::RemoveProbe(probe) => {
                self.probes.remove_probe(&probe)?;
                self.dump_probes();
                None
            }
            Command::UpdateProbe(spec) => {
                self.probes.update_probe(&spec)?;
                None
            }
        })
    }

    fn dump_probes(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }

        let probes = self
            .probes
            .probes()
            .iter()
            .map(|(addr, id)| format!("{addr} (probe {id})"))
            .collect::<Vec<_>>();
        debug!("{} probe(s) installed: {}", probes.len(), probes.join(", "));
    }

    /// Read commands from `reader`, one JSON object per line, until the end of
    /// the input. A reply is written for each command; failing commands and
    /// malformed lines do not stop the loop, only I/O errors do.
    pub fn serve<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut buf = Vec::new();
        let mut num = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            num += 1;

            let reply = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.dispatch(line, num),
                Err(e) => Self::malformed(None, ControlError::Malformed(e.to_string()), num),
            };
            self.output.write_json(&reply)?;
        }
    }

    fn dispatch(&mut self, line: &str, num: usize) -> Reply {
        let command = match Command::from_json(line) {
            Ok(command) => command,
            Err((name, e)) => return Self::malformed(name, e, num),
        };

        let name = command.name().to_string();
        match self.handle(command) {
            Ok(result) => Reply::Reply { name, result },
            Err(e) => {
                warn!("Command {name} failed: {e}");
                Reply::Error {
                    name,
                    message: e.to_string(),
                }
            }
        }
    }

    fn malformed(name: Option<String>, e: ControlError, num: usize) -> Reply {
        warn!("Skipping line {num}: {e}");
        Reply::Error {
            name: name.unwrap_or_default(),
            message: e.to_string(),
        }
    }

    /// Installed probes, for diagnostics. The listing is also logged at debug
    /// level whenever a probe is added or removed.
    pub fn probes(&self) -> &ProbeRegistry {
        &self.probes
    }
}
