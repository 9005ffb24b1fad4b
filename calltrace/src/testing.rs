//! Test helpers: in-memory fakes of the host collaborators.

use std::{
    collections::HashMap,
    io::{self, Write},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Result};

use crate::{
    core::{
        probe::*, Address, Engine, EngineProbeId, EventSink, Invocation, ProbeCallback, RawSummary,
        SummaryCallback,
    },
    events::{Event, ProbeHandlerId, ThreadId},
    probe_log,
};

type SharedSummaryCallback = Arc<dyn Fn(RawSummary) -> Result<()> + Send + Sync>;
type SharedProbeCallback = Arc<dyn Fn(&Invocation) -> Result<()> + Send + Sync>;

#[derive(Default)]
struct FakeEngineState {
    threads: HashMap<ThreadId, SharedSummaryCallback>,
    probes: HashMap<EngineProbeId, (Address, SharedProbeCallback)>,
    next_id: EngineProbeId,
    registrations: usize,
    removed: Vec<EngineProbeId>,
    fail: bool,
}

impl FakeEngineState {
    fn check_failure(&mut self) -> Result<()> {
        if std::mem::take(&mut self.fail) {
            bail!("engine failure");
        }
        Ok(())
    }
}

/// Engine keeping callbacks in memory. Callbacks are run outside of the state
/// lock so they can call back into the engine.
#[derive(Default)]
pub(crate) struct FakeEngine {
    state: Mutex<FakeEngineState>,
}

impl FakeEngine {
    /// Make the next engine operation fail.
    pub(crate) fn fail_next(&self) {
        self.state.lock().unwrap().fail = true;
    }

    /// Report a summary for a followed thread.
    pub(crate) fn summary(&self, thread: ThreadId, raw: RawSummary) -> Result<()> {
        let callback = self
            .state
            .lock()
            .unwrap()
            .threads
            .get(&thread)
            .cloned()
            .ok_or_else(|| anyhow!("thread {thread} is not followed"))?;
        callback(raw)
    }

    /// Execute `address` on thread 1, running all probes installed there.
    pub(crate) fn hit(&self, address: Address, args: &[u64]) -> Result<()> {
        let callbacks: Vec<SharedProbeCallback> = self
            .state
            .lock()
            .unwrap()
            .probes
            .values()
            .filter(|(a, _)| *a == address)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        let invocation = Invocation {
            thread: 1,
            address,
            args,
        };
        callbacks.iter().try_for_each(|cb| cb(&invocation))
    }

    pub(crate) fn followed(&self) -> Vec<ThreadId> {
        let mut threads: Vec<_> = self.state.lock().unwrap().threads.keys().copied().collect();
        threads.sort();
        threads
    }

    pub(crate) fn probes(&self) -> Vec<(EngineProbeId, Address)> {
        let mut probes: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .probes
            .iter()
            .map(|(id, (a, _))| (*id, *a))
            .collect();
        probes.sort();
        probes
    }

    /// Number of successful `add_call_probe` calls.
    pub(crate) fn registrations(&self) -> usize {
        self.state.lock().unwrap().registrations
    }

    /// Number of successful `remove_call_probe` calls.
    pub(crate) fn removals(&self) -> usize {
        self.state.lock().unwrap().removed.len()
    }

    pub(crate) fn removed(&self) -> Vec<EngineProbeId> {
        self.state.lock().unwrap().removed.clone()
    }
}

impl Engine for FakeEngine {
    fn follow(&self, thread: ThreadId, on_summary: SummaryCallback) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;
        state.threads.insert(thread, Arc::from(on_summary));
        Ok(())
    }

    fn unfollow(&self, thread: ThreadId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;
        state.threads.remove(&thread);
        Ok(())
    }

    fn add_call_probe(&self, address: Address, callback: ProbeCallback) -> Result<EngineProbeId> {
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;

        state.next_id += 1;
        let id = state.next_id;
        state.probes.insert(id, (address, Arc::from(callback)));
        state.registrations += 1;
        Ok(id)
    }

    fn remove_call_probe(&self, id: EngineProbeId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_failure()?;

        if state.probes.remove(&id).is_none() {
            bail!("unknown probe {id}");
        }
        state.removed.push(id);
        Ok(())
    }
}

/// Event sink keeping everything it is sent.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Log messages, with their handler id.
    pub(crate) fn logs(&self) -> Vec<(ProbeHandlerId, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::FunctionLog(log) => Some((log.id, log.message)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.logs().into_iter().map(|(_, msg)| msg).collect()
    }
}

impl EventSink for RecordingSink {
    fn send(&self, event: Event) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Compiler for a tiny script language:
/// - "log:<text>" logs <text>.
/// - "args" logs the address and the first two arguments.
/// - "fail" returns an error.
#[derive(Default)]
pub(crate) struct TestCompiler;

impl HandlerCompiler for TestCompiler {
    fn compile(&self, script: &str) -> Result<Box<dyn ProbeHandler>> {
        if let Some(text) = script.strip_prefix("log:") {
            let text = text.to_string();
            return Ok(Box::new(ProbeHandlerFunc::new(
                move |_: &Invocation, log: &LogSink| probe_log!(log, text),
            )));
        }

        let handler: Box<dyn ProbeHandler> = match script {
            "args" => Box::new(ProbeHandlerFunc::new(|inv: &Invocation, log: &LogSink| {
                probe_log!(
                    log,
                    inv.address,
                    inv.arg(0).unwrap_or_default(),
                    inv.arg(1).unwrap_or_default()
                )
            })),
            "fail" => Box::new(ProbeHandlerFunc::new(|_: &Invocation, _: &LogSink| {
                bail!("handler failed")
            })),
            _ => bail!("Invalid script: {script}"),
        };
        Ok(handler)
    }
}

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Parse the content as JSON lines.
    pub(crate) fn lines(&self) -> Vec<serde_json::Value> {
        self.text()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
