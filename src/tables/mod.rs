//! RdSAP Appendix S lookup tables and the SAP tables the completion engine consults alongside them.

pub mod age_band;
pub mod floors;
pub mod hot_water;
pub mod living_area;
pub mod ventilation;
pub mod walls;

pub use age_band::{age_band_for, AgeBand};
pub use floors::{floor_insulation_thickness, floor_type_for, FloorType};
pub use hot_water::{
    cylinder_insulation_properties, has_hw_time_control, primary_pipework_insulated,
    water_cylinder_volume, CylinderDescriptor, CylinderInsulationType,
};
pub use living_area::living_area_fraction;
pub use ventilation::{
    has_draught_lobby, n_fans_and_vents, num_sheltered_sides, percent_draught_stripping, Opening,
};
pub use walls::{wall_thickness, wall_u_value, WallInsulation, WallMaterial};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DwellingType {
    House,
    Flat,
    Bungalow,
    Maisonette,
}

impl DwellingType {
    pub(crate) fn is_flat_or_maisonette(&self) -> bool {
        matches!(self, DwellingType::Flat | DwellingType::Maisonette)
    }
}

/// Load every table that is parsed from embedded data. Tables load themselves on first use; call
/// this before fanning work out across threads so the one-time load happens up front.
pub fn init() {
    age_band::init();
    walls::init();
}
