//! # Engine
//!
//! Interface to the host instrumentation engine. The engine follows threads,
//! aggregates their call counts and runs call probes. Everything here is
//! provided by the host; this crate only manages what gets registered.

use std::collections::HashMap;

use anyhow::Result;

use super::Address;
use crate::events::ThreadId;

/// Opaque handle returned by the engine when a call probe is registered.
pub type EngineProbeId = u64;

/// Call counts reported by the engine for a followed thread, keyed by the raw
/// (textual) address of each call target.
pub type RawSummary = HashMap<String, u64>;

/// Callback invoked by the engine with the call summary of a followed thread.
/// It runs on an engine-chosen thread, possibly concurrently with the control
/// path.
pub type SummaryCallback = Box<dyn Fn(RawSummary) -> Result<()> + Send + Sync>;

/// Callback invoked by the engine each time a probed address executes. It
/// runs synchronously on the thread which hit the address.
pub type ProbeCallback = Box<dyn Fn(&Invocation) -> Result<()> + Send + Sync>;

/// Engine-supplied description of a single probe hit.
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Thread which executed the probed address.
    pub thread: ThreadId,
    /// Probed address.
    pub address: Address,
    /// Raw argument values, as read by the engine at function entry.
    pub args: &'a [u64],
}

impl Invocation<'_> {
    /// Get the n-th raw argument, if the engine provided it.
    pub fn arg(&self, n: usize) -> Option<u64> {
        self.args.get(n).copied()
    }
}

/// Trait representing the interface of the instrumentation engine. All calls
/// are synchronous bookkeeping and are expected to return quickly; they must
/// not wait on traced-thread activity.
///
/// Engines must not start new probe invocations once `remove_call_probe`
/// returned, but an invocation already in flight may complete.
pub trait Engine: Send + Sync {
    /// Start tracing the calls made by `thread`. Re-following a thread is
    /// left to the engine.
    fn follow(&self, thread: ThreadId, on_summary: SummaryCallback) -> Result<()>;
    /// Stop tracing `thread`. The summary callback given to `follow` must be
    /// dropped by the engine.
    fn unfollow(&self, thread: ThreadId) -> Result<()>;
    /// Run `callback` each time `address` executes.
    fn add_call_probe(&self, address: Address, callback: ProbeCallback) -> Result<EngineProbeId>;
    /// Remove a probe previously added with `add_call_probe`.
    fn remove_call_probe(&self, id: EngineProbeId) -> Result<()>;
}
