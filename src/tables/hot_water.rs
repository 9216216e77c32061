use crate::tables::AgeBand;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cylinder size as recorded in an RdSAP survey.
#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CylinderDescriptor {
    Normal,
    Medium,
    Large,
    NoAccess,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CylinderInsulationType {
    Jacket,
    Foam,
}

/// Table S15: cylinder volume (litres) by size descriptor. An inaccessible cylinder is assumed
/// to be of normal size.
pub fn water_cylinder_volume(descriptor: CylinderDescriptor) -> f64 {
    match descriptor {
        CylinderDescriptor::Normal | CylinderDescriptor::NoAccess => 110.,
        CylinderDescriptor::Medium => 160.,
        CylinderDescriptor::Large => 210.,
    }
}

/// Default cylinder insulation thickness (mm) and type when the cylinder was not inspected.
pub fn cylinder_insulation_properties(age_band: AgeBand) -> (f64, CylinderInsulationType) {
    match age_band {
        AgeBand::A | AgeBand::B | AgeBand::C | AgeBand::D | AgeBand::E | AgeBand::F => {
            (12., CylinderInsulationType::Jacket)
        }
        AgeBand::G | AgeBand::H => (25., CylinderInsulationType::Foam),
        AgeBand::I | AgeBand::J => (38., CylinderInsulationType::Foam),
        AgeBand::K => (50., CylinderInsulationType::Foam),
    }
}

pub fn primary_pipework_insulated(age_band: AgeBand) -> bool {
    age_band == AgeBand::K
}

pub fn has_hw_time_control(age_band: AgeBand) -> bool {
    age_band >= AgeBand::I
}
