use crate::tables::AgeBand;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FloorType {
    Solid,
    /// Unqualified suspended timber, as recorded by a surveyor. Never left in a completed record.
    SuspendedTimber,
    SuspendedTimberSealed,
    SuspendedTimberUnsealed,
    SuspendedOther,
}

/// The floor type to use for a dwelling's ground floor. An unqualified suspended timber floor is
/// taken to be unsealed for bands A to E and sealed from F onwards. With no observation, bands A
/// and B are assumed to have suspended timber floors and later bands solid floors.
pub fn floor_type_for(age_band: AgeBand, observed: Option<FloorType>) -> FloorType {
    match observed {
        Some(FloorType::SuspendedTimber) => {
            if age_band <= AgeBand::E {
                FloorType::SuspendedTimberUnsealed
            } else {
                FloorType::SuspendedTimberSealed
            }
        }
        Some(floor_type) => floor_type,
        None if age_band <= AgeBand::B => FloorType::SuspendedTimberUnsealed,
        None => FloorType::Solid,
    }
}

/// Table S11: assumed ground floor insulation thickness (mm).
pub fn floor_insulation_thickness(age_band: AgeBand) -> f64 {
    match age_band {
        AgeBand::I => 25.,
        AgeBand::J => 75.,
        AgeBand::K => 100.,
        _ => 0.,
    }
}
