use std::{collections::HashMap, fmt};

use super::*;
use crate::{event_payload, event_type};

/// Host thread identifier, as handed out by the instrumentation engine.
pub type ThreadId = u64;

/// Reference to a host thread. No state is attached to it.
#[event_type]
#[derive(Copy, Eq, Hash)]
pub struct ThreadRef {
    pub id: ThreadId,
}

/// Code location relative to the module owning it.
#[event_type]
#[derive(Eq)]
pub struct ModuleSymbol {
    /// Name of the owning module.
    pub module: String,
    /// Offset from the module base, truncated to 32 bits.
    pub offset: i32,
}

impl fmt::Display for ModuleSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset < 0 {
            true => write!(f, "{}-{:#x}", self.module, self.offset.unsigned_abs()),
            false => write!(f, "{}+{:#x}", self.module, self.offset),
        }
    }
}

/// One row of a thread summary.
#[event_type]
#[derive(Eq)]
pub struct CallTarget {
    /// Symbol of the call target, null when no module owns the address.
    pub symbol: Option<ModuleSymbol>,
    /// Number of calls seen during the tracing interval.
    pub count: u64,
}

/// Raw address (textual) to call target mapping.
pub type ThreadSummary = HashMap<String, CallTarget>;

/// Per-thread call summary, as reported by the engine and enriched with
/// symbols.
#[event_payload("thread:summary")]
pub struct ThreadSummaryEvent {
    pub thread: ThreadRef,
    pub summary: ThreadSummary,
}

impl ThreadSummaryEvent {
    /// Summary rows, most called first. Ties are ordered by address text so
    /// the output is stable.
    pub fn sorted(&self) -> Vec<(&String, &CallTarget)> {
        let mut rows: Vec<_> = self.summary.iter().collect();
        rows.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        rows
    }
}

impl EventFmt for ThreadSummaryEvent {
    fn event_fmt(&self, f: &mut fmt::Formatter, format: &DisplayFormat) -> fmt::Result {
        write!(f, "[thread {}]", self.thread.id)?;

        if format.multiline {
            write!(f, " {} call target(s)", self.summary.len())?;
            for (addr, target) in self.sorted() {
                write!(f, "\n  {addr}")?;
                if let Some(symbol) = &target.symbol {
                    write!(f, " {symbol}")?;
                }
                write!(f, " x{}", target.count)?;
            }
            return Ok(());
        }

        write!(f, " ")?;
        let mut sep = DelimWriter::new(", ");
        for (addr, target) in self.sorted() {
            sep.write(f)?;
            match &target.symbol {
                Some(symbol) => write!(f, "{symbol}")?,
                None => write!(f, "{addr}")?,
            }
            write!(f, " x{}", target.count)?;
        }
        Ok(())
    }
}
