//! # Symbolicate
//!
//! Resolves raw addresses into module-relative locations, using the memory
//! mappings of a process.

use std::{
    io::{stdout, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Args;

use super::{MainConfig, SubCommandParserRunner};
use crate::{
    config::SymbolsConfig,
    core::{symbolicate, Address, SymbolResolver},
};

#[derive(Args, Debug, Default)]
pub struct Symbolicate {
    #[arg(long, help = "Use the memory mappings of this process (default: calltrace itself)")]
    pub pid: Option<i32>,
    #[arg(
        long,
        conflicts_with = "pid",
        help = "Use a file in the /proc/<pid>/maps format"
    )]
    pub maps: Option<PathBuf>,
    #[arg(required = true, help = "Addresses, as 0x-prefixed hexadecimal or decimal")]
    pub addresses: Vec<Address>,
}

impl Symbolicate {
    /// Write one line per address: the address followed by its symbol, or by
    /// "?" when no module owns it.
    fn resolve(&self, resolver: &dyn SymbolResolver, out: &mut dyn Write) -> Result<()> {
        for addr in self.addresses.iter() {
            match symbolicate(resolver, *addr) {
                Some(symbol) => writeln!(out, "{addr} {symbol}")?,
                None => writeln!(out, "{addr} ?")?,
            }
        }
        Ok(())
    }
}

impl SubCommandParserRunner for Symbolicate {
    fn run(&mut self, _: &MainConfig) -> Result<()> {
        let map = SymbolsConfig {
            pid: self.pid,
            maps: self.maps.clone(),
        }
        .module_map()?;

        let mut out = stdout().lock();
        self.resolve(&map, &mut out)?;
        Ok(out.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::ModuleMap, testing::SharedBuffer};

    #[test]
    fn resolve() {
        let cmd = Symbolicate {
            pid: None,
            maps: Some(PathBuf::from("test_data/maps")),
            addresses: vec![
                Address(0x55f9dd85c050),
                Address(0x55f9df000000),
                Address(0x7f1c2a02b123),
            ],
        };
        let map = ModuleMap::from_maps_file("test_data/maps").unwrap();
        let mut buf = SharedBuffer::default();

        cmd.resolve(&map, &mut buf).unwrap();
        assert_eq!(
            buf.text(),
            "0x55f9dd85c050 kitty+0x50\n0x55f9df000000 ?\n0x7f1c2a02b123 libc.so.6+0x2b123\n"
        );
    }
}
