// Symbol collection over parsed units

use super::{FileSymbols, SymbolCollection};
use crate::parser::ParsedUnit;
use rayon::prelude::*;
use tracing::debug;

/// Aggregates per-file declarations into a [`SymbolCollection`]
pub struct SymbolCollector;

impl SymbolCollector {
    pub fn new() -> Self {
        Self
    }

    /// Collect the declarations of every unit; `failed` counts files the provider rejected
    pub fn collect(&self, units: &[ParsedUnit], failed: usize) -> SymbolCollection {
        let mut collection = units
            .par_iter()
            .fold(SymbolCollection::new, |mut acc, unit| {
                acc.add_file(
                    unit.path.clone(),
                    FileSymbols {
                        package: unit.package.clone(),
                        library_uri: unit.library_uri.clone(),
                        declarations: unit.declarations.clone(),
                        directives: unit.directives.clone(),
                    },
                );
                acc
            })
            .reduce(SymbolCollection::new, |mut a, b| {
                a.merge(b);
                a
            });

        for _ in 0..failed {
            collection.record_failure();
        }

        debug!(
            "Collected {} declarations from {} files ({} failed)",
            collection.len(),
            collection.file_count(),
            collection.failed()
        );
        collection
    }
}

impl Default for SymbolCollector {
    fn default() -> Self {
        Self::new()
    }
}
