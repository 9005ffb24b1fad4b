//! # Tracer
//!
//! Per-thread call tracing. Following a thread hands the engine a summary
//! callback; every summary the engine reports is symbolicated and sent out as
//! a `thread:summary` event.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};

use super::{symbolicate, Address, Engine, EventSink, RawSummary, SummaryCallback, SymbolResolver};
use crate::events::{CallTarget, ThreadRef, ThreadSummary, ThreadSummaryEvent};

/// ThreadTracer starts and stops call tracing of threads. It holds no
/// per-thread state: sessions live in the engine, alongside the summary
/// callback given when following a thread.
pub struct ThreadTracer {
    engine: Arc<dyn Engine>,
    resolver: Arc<dyn SymbolResolver>,
    sink: Arc<dyn EventSink>,
}

impl ThreadTracer {
    pub fn new(
        engine: Arc<dyn Engine>,
        resolver: Arc<dyn SymbolResolver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            engine,
            resolver,
            sink,
        }
    }

    /// Start tracing `thread`. Following a thread twice is up to the engine.
    pub fn follow(&self, thread: ThreadRef) -> Result<()> {
        debug!("Following thread {}", thread.id);
        self.engine
            .follow(thread.id, self.summary_callback(thread))
    }

    /// Stop tracing `thread`. Unfollowing a thread which was never followed
    /// is up to the engine.
    pub fn unfollow(&self, thread: ThreadRef) -> Result<()> {
        debug!("Unfollowing thread {}", thread.id);
        self.engine.unfollow(thread.id)
    }

    fn summary_callback(&self, thread: ThreadRef) -> SummaryCallback {
        let resolver = Arc::clone(&self.resolver);
        let sink = Arc::clone(&self.sink);

        Box::new(move |raw: RawSummary| {
            let summary = enrich(resolver.as_ref(), raw);
            sink.send(ThreadSummaryEvent { thread, summary }.into())
        })
    }
}

/// Symbolicate every entry of a raw summary. Addresses not owned by any
/// module, or which can't be parsed, keep their count with no symbol.
pub fn enrich(resolver: &dyn SymbolResolver, raw: RawSummary) -> ThreadSummary {
    raw.into_iter()
        .map(|(raw_addr, count)| {
            let symbol = match raw_addr.parse::<Address>() {
                Ok(addr) => symbolicate(resolver, addr),
                Err(e) => {
                    warn!("Can't symbolicate {raw_addr}: {e}");
                    None
                }
            };
            (raw_addr, CallTarget { symbol, count })
        })
        .collect()
}
