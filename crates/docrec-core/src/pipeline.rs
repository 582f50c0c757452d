//! Pipeline orchestration: extraction, detection, parsing, normalization,
//! validation and deduplication of one or many documents.

use std::path::Path;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::dedup::dedup;
use crate::error::Result;
use crate::extract::{extract_document, ExtractionBackend, FileBackend};
use crate::models::config::DocrecConfig;
use crate::models::record::{Record, SOURCE_FILE_FIELD};
use crate::models::stats::RunStatistics;
use crate::normalize::Normalizer;
use crate::parsers::{detect, ParserKind};
use crate::validate::Validator;

/// Outcome of one `process_*` call.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Records in the final set.
    pub total_rows: usize,
    /// Documents that failed with an input error.
    pub errors: usize,
    /// Documents skipped because nothing was extracted or parsed.
    pub warnings: usize,
    /// Validation messages produced.
    pub validation_errors: usize,
    pub files_processed: usize,
    pub files_succeeded: usize,
    pub elapsed: Duration,
    /// The final, deduplicated record set.
    pub records: Vec<Record>,
    /// Human-readable problems, prefixed with the document name.
    pub issues: Vec<String>,
}

impl RunReport {
    /// True when every document was processed without an input error.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}

/// Document processing pipeline.
///
/// Documents are handled one after another; statistics accumulate over
/// the lifetime of the instance.
pub struct Pipeline {
    config: DocrecConfig,
    backend: Box<dyn ExtractionBackend>,
    normalizer: Normalizer,
    validator: Validator,
    forced: Option<ParserKind>,
    stats: RunStatistics,
}

impl Pipeline {
    /// Create a pipeline over the given extraction backend.
    pub fn new(config: DocrecConfig, backend: Box<dyn ExtractionBackend>) -> Self {
        Self {
            normalizer: Normalizer::new(config.normalization.clone()),
            validator: Validator::new(config.validation.clone()),
            config,
            backend,
            forced: None,
            stats: RunStatistics::new(),
        }
    }

    /// Create a pipeline reading documents from the filesystem.
    pub fn with_file_backend(config: DocrecConfig) -> Self {
        let backend = FileBackend::new(config.extraction.max_pages);
        Self::new(config, Box::new(backend))
    }

    /// Force a parser instead of detecting one per document.
    pub fn with_parser(mut self, kind: Option<ParserKind>) -> Self {
        self.forced = kind;
        self
    }

    pub fn config(&self) -> &DocrecConfig {
        &self.config
    }

    /// Counters accumulated since construction.
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Process a single document.
    pub fn process_one(&mut self, path: &Path) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::default();

        if let Some(records) = self.run_document(path, &mut report)? {
            report.records = self.deduplicate(records);
        }

        Ok(self.finish(report, start))
    }

    /// Process several documents into one merged record set.
    ///
    /// Every record is tagged with its source file name, and duplicates are
    /// removed across the whole run.
    pub fn process_many<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<RunReport> {
        self.process_many_with(paths, |_| {})
    }

    /// `process_many`, calling `on_document` after each document.
    pub fn process_many_with<P, F>(&mut self, paths: &[P], mut on_document: F) -> Result<RunReport>
    where
        P: AsRef<Path>,
        F: FnMut(&Path),
    {
        let start = Instant::now();
        let mut report = RunReport::default();
        let mut merged = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let outcome = self.run_document(path, &mut report)?;
            on_document(path);

            let Some(records) = outcome else {
                continue;
            };

            let source = source_name(path);
            merged.extend(records.into_iter().map(|mut record| {
                record.insert(SOURCE_FILE_FIELD.into(), Value::String(source.clone()));
                record
            }));
        }

        report.records = self.deduplicate(merged);
        Ok(self.finish(report, start))
    }

    /// Extract, parse, normalize and validate one document.
    ///
    /// Input errors and empty results are recorded in `report` and yield
    /// `None`; only a validation failure under the `fail` policy escapes.
    fn run_document(&mut self, path: &Path, report: &mut RunReport) -> Result<Option<Vec<Record>>> {
        let name = source_name(path);
        report.files_processed += 1;
        self.stats.files_seen += 1;

        info!("Processing {}", name);

        let doc = match extract_document(self.backend.as_ref(), path, &self.config.extraction) {
            Ok(doc) => doc,
            Err(e) => {
                error!("Failed to extract {}: {}", name, e);
                report.errors += 1;
                self.stats.errors += 1;
                report.issues.push(format!("{name}: {e}"));
                return Ok(None);
            }
        };

        if doc.is_empty() {
            warn!("No content extracted from {}", name);
            self.record_warning(report, format!("{name}: no content extracted"));
            return Ok(None);
        }

        let kind = match self.forced {
            Some(kind) => kind,
            None => detect(&doc, &self.config.parsers),
        };
        let entry = self.config.parsers.entry_or_default(kind);
        let parser = kind.build(&entry);
        debug!("Parsing {} with {} parser", name, kind);

        let raw = parser.parse(&doc);
        if raw.is_empty() {
            warn!("No records parsed from {}", name);
            self.record_warning(report, format!("{name}: no records parsed"));
            return Ok(None);
        }

        let normalized = self.normalizer.normalize(raw);
        let (records, messages) = self
            .validator
            .validate(normalized, parser.validation_rules())?;

        for message in &messages {
            warn!("{}: {}", name, message);
        }
        report.validation_errors += messages.len();
        self.stats.validation_errors += messages.len();
        report
            .issues
            .extend(messages.into_iter().map(|m| format!("{name}: {m}")));

        report.files_succeeded += 1;
        self.stats.files_succeeded += 1;
        info!("{}: {} records", name, records.len());

        Ok(Some(records))
    }

    fn record_warning(&mut self, report: &mut RunReport, issue: String) {
        report.warnings += 1;
        self.stats.warnings += 1;
        report.issues.push(issue);
    }

    fn deduplicate(&self, records: Vec<Record>) -> Vec<Record> {
        let settings = &self.config.deduplication;
        if !settings.enabled {
            return records;
        }

        let before = records.len();
        let records = dedup(records, &settings.key_columns, settings.keep);
        let removed = before - records.len();
        if removed > 0 {
            info!("Removed {} duplicate rows", removed);
        }
        records
    }

    fn finish(&mut self, mut report: RunReport, start: Instant) -> RunReport {
        report.total_rows = report.records.len();
        report.elapsed = start.elapsed();
        self.stats.records_produced += report.total_rows;

        info!(
            "Run finished: {} rows from {}/{} files in {:.2?}",
            report.total_rows, report.files_succeeded, report.files_processed, report.elapsed
        );
        report
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
