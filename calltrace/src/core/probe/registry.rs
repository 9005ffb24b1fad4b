use std::{collections::HashMap, sync::Arc};

use anyhow::{bail, Result};
use log::debug;

use super::handler::*;
use crate::{
    core::{Address, Engine, EngineProbeId, EventSink, Invocation, ProbeCallback},
    events::ProbeHandlerId,
};

/// Specific types of errors the probe registry can generate.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProbeError {
    /// Emitted when adding a probe on an address which already has one.
    #[error("Probe already exists at {0}")]
    DuplicateProbe(Address),
    /// Emitted when removing or updating a probe which does not exist.
    #[error("No such probe at {0}")]
    ProbeNotFound(Address),
}

/// Request to install (or update) a probe.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProbeSpec {
    /// Identifier tagging the handler's log messages.
    pub id: ProbeHandlerId,
    /// Probed address, also identifying the probe.
    pub address: Address,
    /// Handler script, compiled by the host.
    pub script: String,
}

/// Reference to an installed probe.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProbeRef {
    pub address: Address,
}

/// Installed probe.
struct Probe {
    /// Engine handle, needed to remove the probe.
    id: EngineProbeId,
    /// Identifier the handler's log messages are tagged with.
    handler_id: ProbeHandlerId,
    /// Current logic, shared with the callback registered in the engine.
    holder: Arc<HandlerHolder>,
}

/// ProbeRegistry owns all the probes installed through it, at most one per
/// address. It is driven by the control path only; traced threads never look
/// probes up, they run the callback the engine was given for an address.
pub struct ProbeRegistry {
    engine: Arc<dyn Engine>,
    compiler: Arc<dyn HandlerCompiler>,
    sink: Arc<dyn EventSink>,
    probes: HashMap<Address, Probe>,
}

impl ProbeRegistry {
    pub fn new(
        engine: Arc<dyn Engine>,
        compiler: Arc<dyn HandlerCompiler>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            engine,
            compiler,
            sink,
            probes: HashMap::new(),
        }
    }

    /// Install a probe at `spec.address` and return the engine probe id.
    pub fn add_probe(&mut self, spec: &ProbeSpec) -> Result<EngineProbeId> {
        if self.probes.contains_key(&spec.address) {
            bail!(ProbeError::DuplicateProbe(spec.address));
        }

        let handler = self.compiler.compile(&spec.script)?;
        let holder = Arc::new(HandlerHolder::new(Arc::from(handler)));

        let callback = Self::probe_callback(
            Arc::clone(&holder),
            LogSink::new(spec.id, Arc::clone(&self.sink)),
        );
        let id = self.engine.add_call_probe(spec.address, callback)?;
        debug!("Probe {id} added at {}", spec.address);

        self.probes.insert(
            spec.address,
            Probe {
                id,
                handler_id: spec.id,
                holder,
            },
        );
        Ok(id)
    }

    /// Remove the probe at `probe.address`. The probe is deregistered from the
    /// engine before being forgotten; if the engine fails to remove it, the
    /// probe is kept.
    pub fn remove_probe(&mut self, probe: &ProbeRef) -> Result<()> {
        let id = match self.probes.get(&probe.address) {
            Some(p) => p.id,
            None => bail!(ProbeError::ProbeNotFound(probe.address)),
        };

        self.engine.remove_call_probe(id)?;
        self.probes.remove(&probe.address);

        debug!("Probe {id} removed from {}", probe.address);
        Ok(())
    }

    /// Replace the logic of the probe at `spec.address`. The engine
    /// registration is left untouched, so log messages keep the handler id
    /// given when the probe was added.
    pub fn update_probe(&mut self, spec: &ProbeSpec) -> Result<()> {
        let probe = match self.probes.get(&spec.address) {
            Some(p) => p,
            None => bail!(ProbeError::ProbeNotFound(spec.address)),
        };

        let handler = self.compiler.compile(&spec.script)?;
        probe.holder.replace(Arc::from(handler));

        if spec.id != probe.handler_id {
            debug!(
                "Probe {} at {} keeps logging as {} (update requested {})",
                probe.id, spec.address, probe.handler_id, spec.id
            );
        }
        debug!("Probe {} updated at {}", probe.id, spec.address);
        Ok(())
    }

    /// Get the list of installed probes, as (address, engine probe id) pairs
    /// sorted by address.
    pub fn probes(&self) -> Vec<(Address, EngineProbeId)> {
        let mut probes: Vec<_> = self.probes.iter().map(|(a, p)| (*a, p.id)).collect();
        probes.sort();
        probes
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Callback given to the engine. Each hit reads the holder at call time so
    /// updates apply to the next invocation without re-registering.
    fn probe_callback(holder: Arc<HandlerHolder>, log: LogSink) -> ProbeCallback {
        Box::new(move |invocation: &Invocation| {
            holder.current().invoke(invocation, &log)
        })
    }
}
