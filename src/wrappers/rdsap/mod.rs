use crate::errors::InputError;
use crate::input::DwellingRecord;
use crate::wrappers::SapWrapper;
use crate::ProjectFlags;

pub mod completion;

pub use completion::complete;

/// Wrapper for reduced data SAP surveys, which fills in the inputs a survey does not record.
pub(crate) struct RdSapWrapper;

impl RdSapWrapper {
    pub(crate) fn new() -> Self {
        Self {}
    }
}

impl SapWrapper for RdSapWrapper {
    fn apply_preprocessing(
        &self,
        dwelling: DwellingRecord,
        _flags: &ProjectFlags,
    ) -> Result<DwellingRecord, InputError> {
        complete(dwelling)
    }

    fn output_type(&self) -> &'static str {
        "RdSAP"
    }
}
