//! # Handlers
//!
//! Probe handlers are the pluggable logic run when a probed address executes.
//! They are produced at runtime from script text by a host-provided compiler
//! and can be replaced while the probe is live.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use anyhow::Result;

use crate::{
    core::{EventSink, Invocation},
    events::{FunctionLogEvent, ProbeHandlerId},
};

/// Logic run on each probe hit. Handlers are shared with traced threads and
/// may run concurrently on any number of them.
pub trait ProbeHandler: Send + Sync {
    /// Run the handler. Errors are returned unchanged to the engine.
    fn invoke(&self, invocation: &Invocation, log: &LogSink) -> Result<()>;
}

/// ProbeHandlerFunc is a wrapper for functions that implements ProbeHandler.
pub struct ProbeHandlerFunc<F>
where
    F: Fn(&Invocation, &LogSink) -> Result<()> + Send + Sync,
{
    func: F,
}

impl<F> ProbeHandlerFunc<F>
where
    F: Fn(&Invocation, &LogSink) -> Result<()> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> ProbeHandler for ProbeHandlerFunc<F>
where
    F: Fn(&Invocation, &LogSink) -> Result<()> + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation, log: &LogSink) -> Result<()> {
        (self.func)(invocation, log)
    }
}

/// Compiles script text into a probe handler. The compilation mechanism (and
/// the script language) is up to the host.
pub trait HandlerCompiler: Send + Sync {
    fn compile(&self, script: &str) -> Result<Box<dyn ProbeHandler>>;
}

/// Single-slot holder of the current handler of a probe. The holder itself
/// stays at a stable location for the lifetime of the probe, only its content
/// is swapped.
///
/// Readers clone the current `Arc` and release the lock before running the
/// handler: a reader always sees a handler in full, either the one before or
/// the one after a concurrent `replace`.
pub struct HandlerHolder {
    current: RwLock<Arc<dyn ProbeHandler>>,
}

impl HandlerHolder {
    pub fn new(handler: Arc<dyn ProbeHandler>) -> Self {
        Self {
            current: RwLock::new(handler),
        }
    }

    /// Get the current handler.
    pub fn current(&self) -> Arc<dyn ProbeHandler> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in a new handler, returning the previous one. Invocations already
    /// running keep using the previous handler until they return.
    pub fn replace(&self, handler: Arc<dyn ProbeHandler>) -> Arc<dyn ProbeHandler> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, handler)
    }
}

/// Log sink handed to probe handlers. Messages are tagged with the probe
/// handler identifier and sent as `function:log` events.
#[derive(Clone)]
pub struct LogSink {
    id: ProbeHandlerId,
    sink: Arc<dyn EventSink>,
}

impl LogSink {
    pub fn new(id: ProbeHandlerId, sink: Arc<dyn EventSink>) -> Self {
        Self { id, sink }
    }

    pub fn id(&self) -> ProbeHandlerId {
        self.id
    }

    /// Log a message made of one or more fragments. Fragments are formatted
    /// and joined with ", ".
    ///
    /// ```ignore
    /// log.log(&[&"a", &1, &true])?; // "a, 1, true"
    /// ```
    pub fn log(&self, fragments: &[&dyn fmt::Display]) -> Result<()> {
        let message = fragments
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        self.sink.send(
            FunctionLogEvent {
                id: self.id,
                message,
            }
            .into(),
        )
    }
}

/// Log fragments from a probe handler, e.g. `probe_log!(log, "a", 1, true)`.
#[macro_export]
macro_rules! probe_log {
    ($log:expr, $($fragment:expr),+ $(,)?) => {
        $log.log(&[$(&$fragment as &dyn ::std::fmt::Display),+])
    };
}
