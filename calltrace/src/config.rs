//! # Configuration
//!
//! Agent configuration, loaded from a YAML file:
//!
//! ```yaml
//! symbols:
//!   pid: 1234
//! events:
//!   output: /tmp/events.json
//! ```
//!
//! Every section and field is optional.

use std::{fs::read_to_string, path::PathBuf};

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

use crate::core::{JsonWriter, ModuleMap};

/// Where to get the module map from. Defaults to the current process.
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct SymbolsConfig {
    /// Process whose /proc/<pid>/maps is used.
    pub pid: Option<i32>,
    /// Maps file, in the /proc/<pid>/maps format.
    pub maps: Option<PathBuf>,
}

impl SymbolsConfig {
    /// Build the module map described by this section.
    pub fn module_map(&self) -> Result<ModuleMap> {
        match (self.pid, &self.maps) {
            (Some(_), Some(_)) => bail!("symbols: pid and maps are mutually exclusive"),
            (Some(pid), None) => ModuleMap::from_pid(pid),
            (None, Some(maps)) => ModuleMap::from_maps_file(maps),
            (None, None) => ModuleMap::from_self(),
        }
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct EventsConfig {
    /// File JSON-lines events and replies are written to. Defaults to stdout.
    pub output: Option<PathBuf>,
}

impl EventsConfig {
    pub fn writer(&self) -> Result<JsonWriter> {
        Ok(match &self.output {
            Some(path) => JsonWriter::create(path)?,
            None => JsonWriter::stdout(),
        })
    }
}

#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default)]
    pub symbols: SymbolsConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

impl AgentConfig {
    /// Load a configuration from a path.
    pub fn load(path: PathBuf) -> Result<AgentConfig> {
        let contents = read_to_string(&path)
            .map_err(|e| anyhow!("Could not read {}: {e}", path.display()))?;
        AgentConfig::from_str(contents.as_str())
    }

    /// Load a configuration from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<AgentConfig> {
        Ok(serde_yaml::from_str(contents)?)
    }
}
