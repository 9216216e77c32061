use crate::errors::InputError;
use crate::input::DwellingRecord;
use crate::wrappers::rdsap::RdSapWrapper;
use crate::ProjectFlags;

pub mod rdsap;

/// Common trait for a wrapper that prepares a dwelling record for a particular assessment
/// methodology before it is validated and handed on to the SAP calculation.
pub(crate) trait SapWrapper {
    fn apply_preprocessing(
        &self,
        dwelling: DwellingRecord,
        flags: &ProjectFlags,
    ) -> Result<DwellingRecord, InputError>;

    /// Short label used to name output files.
    fn output_type(&self) -> &'static str;
}

/// A wrapper that does nothing, for when the input is already a full SAP record.
pub(crate) struct PassthroughSapWrapper;

impl PassthroughSapWrapper {
    pub(crate) fn new() -> Self {
        Self {}
    }
}

impl SapWrapper for PassthroughSapWrapper {
    fn apply_preprocessing(
        &self,
        dwelling: DwellingRecord,
        _flags: &ProjectFlags,
    ) -> Result<DwellingRecord, InputError> {
        Ok(dwelling)
    }

    fn output_type(&self) -> &'static str {
        "SAP"
    }
}

pub(crate) fn choose_wrapper(flags: &ProjectFlags) -> ChosenWrapper {
    if flags.contains(ProjectFlags::RDSAP_COMPLETION) {
        ChosenWrapper::RdSap(RdSapWrapper::new())
    } else {
        ChosenWrapper::Passthrough(PassthroughSapWrapper::new())
    }
}

/// An enum to wrap the known wrappers that could be chosen for a given invocation.
pub(crate) enum ChosenWrapper {
    Passthrough(PassthroughSapWrapper),
    RdSap(RdSapWrapper),
}

impl SapWrapper for ChosenWrapper {
    fn apply_preprocessing(
        &self,
        dwelling: DwellingRecord,
        flags: &ProjectFlags,
    ) -> Result<DwellingRecord, InputError> {
        match self {
            ChosenWrapper::Passthrough(wrapper) => wrapper.apply_preprocessing(dwelling, flags),
            ChosenWrapper::RdSap(wrapper) => wrapper.apply_preprocessing(dwelling, flags),
        }
    }

    fn output_type(&self) -> &'static str {
        match self {
            ChosenWrapper::Passthrough(wrapper) => wrapper.output_type(),
            ChosenWrapper::RdSap(wrapper) => wrapper.output_type(),
        }
    }
}
