use std::fmt;

use crate::{core::Address, events::ModuleSymbol};

/// Loaded module covering the `[base, end)` address range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub base: Address,
    pub end: Address,
}

impl Module {
    pub fn new(name: &str, base: Address, size: u64) -> Self {
        Module {
            name: name.to_string(),
            base,
            end: Address(base.0.saturating_add(size)),
        }
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.base <= addr && addr < self.end
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}-{}]", self.name, self.base, self.end)
    }
}

/// Maps addresses to the module owning them.
pub trait SymbolResolver: Send + Sync {
    /// Find the module owning `addr`, if any.
    fn find(&self, addr: Address) -> Option<&Module>;
}

/// Resolve an address into a module-relative symbol. An address owned by no
/// module has no symbol; this is not an error.
pub fn symbolicate(resolver: &dyn SymbolResolver, addr: Address) -> Option<ModuleSymbol> {
    resolver.find(addr).map(|module| ModuleSymbol {
        module: module.name.clone(),
        offset: addr.offset_from(module.base),
    })
}
