//! Declaration sources.
//!
//! A [`DeclarationSource`] yields translation units one at a time; each unit
//! is a flat stream of [`SourceRecord`]s. The pipeline depends only on the
//! trait, so front-ends can be swapped without touching later stages.

pub mod lexer;
pub mod record;
pub mod scanner;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::core::Span;

pub use record::{RecordKind, SourceRecord};
pub use scanner::HeaderScanner;

/// Identifier of a translation unit, usually the header path.
pub type UnitId = String;

/// One logical input group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub id: UnitId,
    pub records: Vec<SourceRecord>,
}

impl TranslationUnit {
    pub fn new(id: impl Into<UnitId>, records: Vec<SourceRecord>) -> Self {
        TranslationUnit {
            id: id.into(),
            records,
        }
    }

    /// Whether the front-end reported any error for this unit.
    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.kind, RecordKind::Error))
    }
}

/// Produces successive translation units.
pub trait DeclarationSource {
    /// The next unit, or `None` at end of input.
    fn next_unit(&mut self) -> Option<TranslationUnit>;
}

/// Units built from in-memory header text.
#[derive(Debug, Default)]
pub struct MemorySource {
    units: VecDeque<TranslationUnit>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `text` as a unit named `id`.
    pub fn with_header(mut self, id: impl Into<UnitId>, text: &str) -> Self {
        let id = id.into();
        let records = HeaderScanner::new().scan(&id, text);
        self.units.push_back(TranslationUnit::new(id, records));
        self
    }

    /// Add a prepared unit.
    pub fn with_unit(mut self, unit: TranslationUnit) -> Self {
        self.units.push_back(unit);
        self
    }
}

impl DeclarationSource for MemorySource {
    fn next_unit(&mut self) -> Option<TranslationUnit> {
        self.units.pop_front()
    }
}

/// Units read from header files on disk.
///
/// Files are read and scanned in parallel when the source is created; units
/// are handed out in input order.
#[derive(Debug)]
pub struct HeaderSource {
    units: VecDeque<TranslationUnit>,
}

impl HeaderSource {
    pub fn new(paths: &[PathBuf]) -> Self {
        tracing::info!("Scanning {} headers", paths.len());

        let scanner = HeaderScanner::new();
        let units: Vec<TranslationUnit> = paths
            .par_iter()
            .map(|path| scan_file(&scanner, path))
            .collect();

        HeaderSource {
            units: units.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl DeclarationSource for HeaderSource {
    fn next_unit(&mut self) -> Option<TranslationUnit> {
        self.units.pop_front()
    }
}

fn scan_file(scanner: &HeaderScanner, path: &Path) -> TranslationUnit {
    let id = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let records = scanner.scan(&id, &text);
            tracing::debug!("{}: {} records", id, records.len());
            TranslationUnit::new(id, records)
        }
        Err(e) => {
            let span = Span::point(id.as_str(), 1, 1);
            let record = SourceRecord::error(format!("failed to read header: {}", e), span);
            TranslationUnit::new(id, vec![record])
        }
    }
}
