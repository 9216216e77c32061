use crate::errors::InputError;
use crate::tables::{AgeBand, DwellingType};
use serde::{Deserialize, Serialize};

/// A window or door surveyed for draught-stripping. `count` groups identical openings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Opening {
    pub draught_stripped: bool,
    #[serde(default = "default_opening_count")]
    pub count: u32,
}

fn default_opening_count() -> u32 {
    1
}

/// Table S5.1: number of extract fans and passive vents.
pub fn n_fans_and_vents(age_band: AgeBand, n_rooms: u32) -> Result<u32, InputError> {
    if n_rooms == 0 {
        return Err(InputError::new(
            "number of habitable rooms must be at least 1 to look up extract fans",
        ));
    }

    Ok(match age_band {
        AgeBand::A | AgeBand::B | AgeBand::C | AgeBand::D | AgeBand::E => 0,
        AgeBand::F | AgeBand::G => 1,
        _ => match n_rooms {
            1..=2 => 1,
            3..=5 => 2,
            6..=8 => 3,
            _ => 4,
        },
    })
}

/// Number of sheltered sides, for the infiltration shelter factor.
pub fn num_sheltered_sides(dwelling_type: DwellingType, n_floors: u32) -> Result<u32, InputError> {
    if n_floors == 0 {
        return Err(InputError::new("number of storeys must be at least 1"));
    }

    Ok(match dwelling_type {
        DwellingType::House | DwellingType::Bungalow if n_floors >= 3 => 1,
        _ => 2,
    })
}

pub fn has_draught_lobby(dwelling_type: DwellingType) -> bool {
    dwelling_type.is_flat_or_maisonette()
}

/// Percentage (0 to 100, to the nearest whole percent) of windows and doors that are
/// draught-stripped. No openings counts as 0%.
pub fn percent_draught_stripping(openings: &[Opening]) -> f64 {
    let (stripped, total) = openings.iter().fold((0u64, 0u64), |(stripped, total), opening| {
        let count = opening.count as u64;
        (
            stripped + if opening.draught_stripped { count } else { 0 },
            total + count,
        )
    });

    if total == 0 {
        return 0.;
    }

    (100. * stripped as f64 / total as f64).round()
}
