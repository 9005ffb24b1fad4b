//! Module map built from the memory mappings of a process.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    ops::Bound::{Included, Unbounded},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Result};
use log::{debug, warn};

use super::{Module, SymbolResolver};
use crate::core::Address;

/// Address-range module map. Modules are indexed by their base address and
/// must not overlap.
#[derive(Debug, Default)]
pub struct ModuleMap {
    modules: BTreeMap<Address, Module>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the module map of a running process from /proc/<pid>/maps.
    pub fn from_pid(pid: i32) -> Result<Self> {
        Self::from_maps_file(PathBuf::from("/proc").join(pid.to_string()).join("maps"))
    }

    /// Build the module map of the current process.
    pub fn from_self() -> Result<Self> {
        Self::from_maps_file("/proc/self/maps")
    }

    /// Build a module map from a file following the /proc/<pid>/maps format.
    pub fn from_maps_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let content = fs::read_to_string(&file)
            .map_err(|e| anyhow!("Could not read {}: {e}", file.as_ref().display()))?;
        Self::from_maps(&content)
    }

    /// Parse the content of a maps file. The format of a line is:
    /// 55f9dd85c000-55f9dd85e000 r--p 00000000 00:1f 793986    /usr/bin/kitty
    ///
    /// Only file-backed mappings are kept. All the mappings of a given file are
    /// merged into a single module, from the lowest start to the highest end.
    pub fn from_maps(content: &str) -> Result<Self> {
        // Order of first appearance, so colliding ranges are resolved the same
        // way on every run.
        let mut order = Vec::new();
        let mut ranges: HashMap<&str, (u64, u64)> = HashMap::new();

        for line in content.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 5 {
                bail!("Invalid maps line: {line}");
            }

            // Anonymous mappings and pseudo files ([heap], [stack], etc).
            let path = match fields.get(5) {
                Some(path) if path.starts_with('/') => *path,
                _ => continue,
            };

            let (start, end) = fields[0]
                .split_once('-')
                .ok_or_else(|| anyhow!("Invalid maps range: {}", fields[0]))?;
            let start = u64::from_str_radix(start, 16)?;
            let end = u64::from_str_radix(end, 16)?;
            if end <= start {
                bail!("Invalid maps range: {}", fields[0]);
            }

            ranges
                .entry(path)
                .and_modify(|range| {
                    range.0 = range.0.min(start);
                    range.1 = range.1.max(end);
                })
                .or_insert_with(|| {
                    order.push(path);
                    (start, end)
                });
        }

        let mut map = ModuleMap::new();
        for path in order {
            let (start, end) = ranges[path];
            let name = Path::new(path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(path);

            let module = Module::new(name, Address(start), end - start);
            if let Err(e) = map.insert(module) {
                warn!("Skipping {path}: {e}");
            }
        }

        debug!("{} module(s) found in maps", map.len());
        Ok(map)
    }

    /// Add a module to the map. Fails if it overlaps an existing one.
    pub fn insert(&mut self, module: Module) -> Result<()> {
        if module.end <= module.base {
            bail!("Module {} is empty", module.name);
        }

        let prev = self
            .modules
            .range((Unbounded, Included(&module.base)))
            .next_back();
        let next = self.modules.range(module.base..).next();
        if let Some((_, m)) = prev.filter(|(_, m)| m.end > module.base) {
            bail!("Module {module} overlaps {m}");
        }
        if let Some((_, m)) = next.filter(|(_, m)| m.base < module.end) {
            bail!("Module {module} overlaps {m}");
        }

        self.modules.insert(module.base, module);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over modules, lowest base first.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

impl SymbolResolver for ModuleMap {
    fn find(&self, addr: Address) -> Option<&Module> {
        self.modules
            .range((Unbounded, Included(&addr)))
            .next_back()
            .map(|(_, m)| m)
            .filter(|m| m.contains(addr))
    }
}
