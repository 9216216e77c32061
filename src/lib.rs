pub mod core;
pub mod errors;
pub mod geography;
pub mod input;
pub mod output;
pub mod tables;
pub mod validation;
mod wrappers;


pub use crate::wrappers::rdsap::complete;

use crate::errors::RdSapError;
use crate::input::{ingest_for_processing, DwellingRecord};
use crate::output::Output;
use crate::validation::{validate, ValidationReport};
use crate::wrappers::{choose_wrapper, ChosenWrapper, SapWrapper};
use bitflags::bitflags;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info, instrument, warn};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ProjectFlags: u8 {
        /// Treat each dwelling as an RdSAP survey and complete it before validation.
        const RDSAP_COMPLETION = 0b1;
        const PREPROCESS_ONLY = 0b10;
        /// Count dwellings with validation violations as failures.
        const STRICT_VALIDATION = 0b100;
    }
}

/// Load all lookup tables and rule trees up front. Safe to call more than once.
pub fn init() {
    tables::init();
    validation::rules::init();
}

#[derive(Debug, Serialize)]
pub struct DwellingResult {
    pub id: String,
    #[serde(flatten)]
    pub outcome: DwellingOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DwellingOutcome {
    Completed {
        dwelling: JsonValue,
        #[serde(skip_serializing_if = "Option::is_none")]
        validation: Option<ValidationReport>,
    },
    Failed {
        error: String,
    },
}

impl DwellingResult {
    pub fn is_valid(&self) -> bool {
        match &self.outcome {
            DwellingOutcome::Completed { validation, .. } => validation_passed(validation),
            DwellingOutcome::Failed { .. } => false,
        }
    }
}

/// A dwelling that was not validated counts as passing.
fn validation_passed(validation: &Option<ValidationReport>) -> bool {
    validation.as_ref().map_or(true, |report| report.passed)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    pub with_violations: usize,
}

impl BatchSummary {
    fn record(&mut self, result: &DwellingResult) {
        self.processed += 1;
        match &result.outcome {
            DwellingOutcome::Completed { validation, .. } => {
                self.completed += 1;
                if !validation_passed(validation) {
                    self.with_violations += 1;
                }
            }
            DwellingOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Whether the batch as a whole should be reported as successful.
    pub fn is_success(&self, flags: &ProjectFlags) -> bool {
        self.failed == 0
            && (!flags.contains(ProjectFlags::STRICT_VALIDATION) || self.with_violations == 0)
    }
}

#[derive(Debug)]
pub struct RunResults {
    pub summary: BatchSummary,
    pub dwellings: Vec<DwellingResult>,
}

/// Complete (when asked to) and validate every dwelling in the input, a JSON object or array of
/// objects, writing one JSON document per dwelling plus a summary to the output. A dwelling that
/// cannot be completed is reported and the rest of the batch carries on.
#[instrument(skip_all)]
pub fn run_project(
    input: impl Read,
    output: &impl Output,
    flags: &ProjectFlags,
) -> Result<RunResults, RdSapError> {
    init();

    let dwellings = ingest_for_processing(input)?;
    let wrapper = choose_wrapper(flags);
    info!(
        "Processing {} dwelling(s) as {} input",
        dwellings.len(),
        wrapper.output_type()
    );

    let results = dwellings
        .into_par_iter()
        .map(|dwelling| process_dwelling(dwelling, &wrapper, flags))
        .collect::<Vec<_>>();

    let mut summary = BatchSummary::default();
    for result in &results {
        summary.record(result);
    }

    if !output.is_noop() {
        write_results(output, &results, &summary).map_err(RdSapError::ErrorInOutput)?;
    }

    Ok(RunResults {
        summary,
        dwellings: results,
    })
}

fn process_dwelling(
    dwelling: DwellingRecord,
    wrapper: &ChosenWrapper,
    flags: &ProjectFlags,
) -> DwellingResult {
    let id = dwelling.identifier();

    let processed = catch_unwind(AssertUnwindSafe(|| {
        wrapper.apply_preprocessing(dwelling, flags)
    }))
    .map_err(|panic| RdSapError::PanicInProcessing(panic_message(panic)))
    .and_then(|result| result.map_err(RdSapError::from));

    let outcome = match processed {
        Ok(dwelling) => {
            let validation =
                (!flags.contains(ProjectFlags::PREPROCESS_ONLY)).then(|| validate(&dwelling));
            if let Some(report) = &validation {
                for violation in &report.violations {
                    warn!(dwelling = %id, "{violation}");
                }
            }
            DwellingOutcome::Completed {
                dwelling: dwelling.finalize(),
                validation,
            }
        }
        Err(err) => {
            error!(dwelling = %id, "{err}");
            DwellingOutcome::Failed {
                error: err.to_string(),
            }
        }
    };

    DwellingResult { id, outcome }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn write_results(
    output: &impl Output,
    results: &[DwellingResult],
    summary: &BatchSummary,
) -> anyhow::Result<()> {
    for (index, result) in results.iter().enumerate() {
        let location_key = location_key_for(index, &result.id);
        let writer = output.writer_for_location_key(&location_key, "json")?;
        serde_json::to_writer_pretty(writer, result)?;
    }
    let writer = output.writer_for_location_key(SUMMARY_LOCATION_KEY, "json")?;
    serde_json::to_writer_pretty(writer, summary)?;

    Ok(())
}

const SUMMARY_LOCATION_KEY: &str = "summary";

/// Dwelling identifiers are used in file names, so anything other than letters, digits, '-' and
/// '_' is replaced. The batch position leads the key, which keeps keys unique within a batch and
/// apart from the summary.
fn location_key_for(index: usize, id: &str) -> String {
    let sanitised: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{index}_{sanitised}")
}
