use crate::core::units::MILLIMETRES_IN_METRE;
use crate::errors::InputError;
use crate::tables::{floor_insulation_thickness, AgeBand};
use std::f64::consts::PI;

// Thermal properties of ground from BS EN ISO 13370:2017 Table 7
const THERMAL_CONDUCTIVITY_OF_GROUND: f64 = 1.5; // in W/(m.K)
const R_SI_FOR_GROUND: f64 = 0.17; // ISO 6946 - internal surface resistance
const R_SE_FOR_GROUND: f64 = 0.04; // ISO 6946 - external surface resistance
const THERMAL_CONDUCTIVITY_OF_FLOOR_INSULATION: f64 = 0.035; // in W/(m.K)

// Suspended floor assumptions from RdSAP Appendix S
const HEIGHT_OF_FLOOR_ABOVE_GROUND: f64 = 0.3; // in m
const U_VALUE_OF_UNDERFLOOR_WALLS: f64 = 1.5; // in W/(m2.K)
const WIND_SPEED_AT_10M: f64 = 5.; // in m/s
const WIND_SHIELDING_FACTOR: f64 = 0.05;
const VENTILATION_OPENINGS_PER_PERIMETER: f64 = 0.003; // in m2/m
const THERMAL_RESISTANCE_OF_SUSPENDED_DECK: f64 = 0.2; // in m2.K/W

/// U-value (W/m²K) of a ground floor, from its age band, exposed perimeter (m), the thickness of
/// the walls around it (m) and its area (m²). Suspended timber floors are assumed for bands A and
/// B, solid floors otherwise. The result is not rounded.
pub fn ground_floor_u(
    age_band: AgeBand,
    exposed_perimeter: f64,
    wall_thickness: f64,
    floor_area: f64,
) -> Result<f64, InputError> {
    if floor_area == 0. {
        return Ok(0.);
    }
    if exposed_perimeter <= 0. {
        return Err(InputError::new(format!(
            "exposed perimeter of ground floor must be greater than zero, got {exposed_perimeter}"
        )));
    }

    let r_f = floor_insulation_thickness(age_band) / MILLIMETRES_IN_METRE as f64
        / THERMAL_CONDUCTIVITY_OF_FLOOR_INSULATION;

    // characteristic dimension of floor
    let b = 2. * floor_area / exposed_perimeter;

    Ok(if age_band <= AgeBand::B {
        suspended_floor_u(b, wall_thickness, r_f)
    } else {
        solid_floor_u(b, wall_thickness, r_f)
    })
}

fn suspended_floor_u(b: f64, wall_thickness: f64, r_f: f64) -> f64 {
    // BS EN ISO 13370:2017 Eqn 8
    let d_g = wall_thickness + THERMAL_CONDUCTIVITY_OF_GROUND * (R_SI_FOR_GROUND + R_SE_FOR_GROUND);
    let u_g = 2. * THERMAL_CONDUCTIVITY_OF_GROUND * (PI * b / d_g + 1.).ln() / (PI * b + d_g);

    // BS EN ISO 13370:2017 Eqn 9
    let u_x = 2. * HEIGHT_OF_FLOOR_ABOVE_GROUND * U_VALUE_OF_UNDERFLOOR_WALLS / b
        + 1450. * VENTILATION_OPENINGS_PER_PERIMETER * WIND_SPEED_AT_10M * WIND_SHIELDING_FACTOR
            / b;

    1. / (2. * R_SI_FOR_GROUND + r_f + THERMAL_RESISTANCE_OF_SUSPENDED_DECK + 1. / (u_g + u_x))
}

fn solid_floor_u(b: f64, wall_thickness: f64, r_f: f64) -> f64 {
    // total equivalent thickness
    let d_t = wall_thickness
        + THERMAL_CONDUCTIVITY_OF_GROUND * (R_SI_FOR_GROUND + r_f + R_SE_FOR_GROUND);

    if d_t < b {
        // BS EN ISO 13370:2017 Eqn 4, uninsulated or moderately insulated
        2. * THERMAL_CONDUCTIVITY_OF_GROUND * (PI * b / d_t + 1.).ln() / (PI * b + d_t)
    } else {
        // BS EN ISO 13370:2017 Eqn 5, well insulated
        THERMAL_CONDUCTIVITY_OF_GROUND / (0.457 * b + d_t)
    }
}
