use crate::errors::InputError;

/// SAP Table 27, indexed by number of habitable rooms from 1. Dwellings with more rooms than the
/// table covers use the last entry.
const LIVING_AREA_FRACTIONS: [f64; 15] = [
    0.75, 0.50, 0.30, 0.25, 0.21, 0.18, 0.16, 0.14, 0.13, 0.12, 0.11, 0.10, 0.10, 0.09, 0.09,
];

pub fn living_area_fraction(n_rooms: u32) -> Result<f64, InputError> {
    if n_rooms == 0 {
        return Err(InputError::new(
            "number of habitable rooms must be at least 1 to find the living area fraction",
        ));
    }
    let index = (n_rooms as usize).min(LIVING_AREA_FRACTIONS.len()) - 1;

    Ok(LIVING_AREA_FRACTIONS[index])
}
