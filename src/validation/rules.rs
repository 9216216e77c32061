use crate::input::{field, DwellingRecord};
use crate::validation::{FieldType, Predicate, Rule, ValidationReport};
use std::sync::LazyLock;

const DWELLING_TYPES: &[&str] = &["house", "flat", "bungalow", "maisonette"];
const COUNTRIES: &[&str] = &["England", "Scotland", "NorthernIreland", "Wales"];
const AGE_BANDS: &[&str] = &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"];
const COMPLETED_FLOOR_TYPES: &[&str] = &[
    "solid",
    "suspended_timber_sealed",
    "suspended_timber_unsealed",
    "suspended_other",
];
const CYLINDER_INSULATION_TYPES: &[&str] = &["jacket", "foam"];
const PV_ORIENTATIONS: &[&str] = &["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
const PV_PITCHES: &[&str] = &["horizontal", "30_degrees", "45_degrees", "60_degrees", "vertical"];

/// The inputs a dwelling record must carry before it can be rated. Fields that may legitimately
/// be zero or false (e.g. `n_fans_and_vents`, `draught_stripping`) cannot sit under a bare
/// `Required`, as those values count as not provided.
static SAP_RULES: LazyLock<Rule> = LazyLock::new(|| {
    Rule::Group(vec![
        // identity and geometry
        Rule::required(field::DWELLING_TYPE, FieldType::Enum(DWELLING_TYPES)),
        Rule::required(field::COUNTRY, FieldType::Enum(COUNTRIES)),
        Rule::required(field::AGE_BAND, FieldType::Enum(AGE_BANDS)),
        Rule::required(field::GFA, FieldType::Number),
        Rule::required(field::VOLUME, FieldType::Number),
        Rule::required(field::N_STOREYS, FieldType::Integer),
        Rule::required(field::N_ROOMS, FieldType::Integer),
        // fabric
        Rule::required(field::WALL_U_VALUE, FieldType::Number),
        Rule::required(field::THERMAL_MASS_PARAMETER, FieldType::Number),
        // infiltration: a measured air permeability, or the floor type when untested
        Rule::required_if(
            pressure_tested(),
            vec![Rule::one_of(
                "air tightness",
                vec![
                    Rule::required(field::PRESSURISATION_TEST_RESULT, FieldType::Number),
                    Rule::required(field::PRESSURISATION_TEST_RESULT_AVERAGE, FieldType::Number),
                ],
            )],
        ),
        Rule::required_if(
            Predicate::Not(Box::new(pressure_tested())),
            vec![Rule::required(
                field::FLOOR_TYPE,
                FieldType::Enum(COMPLETED_FLOOR_TYPES),
            )],
        ),
        Rule::required(field::LIVING_AREA_FRACTION, FieldType::Number),
        Rule::required(field::N_SHELTERED_SIDES, FieldType::Integer),
        // space heating
        Rule::required(field::MAIN_HEATING_FUEL, FieldType::String),
        Rule::required(field::MAIN_HEATING_EFFICIENCY, FieldType::Number),
        Rule::required_if_and_only_if(
            Predicate::Truthy(field::HAS_SECOND_MAIN_HEATING),
            vec![Rule::required(field::MAIN_HEATING_FRACTION, FieldType::Number)],
        ),
        // hot water
        Rule::required_if(
            Predicate::Truthy(field::HAS_HW_CYLINDER),
            vec![Rule::one_of(
                "cylinder loss",
                vec![
                    Rule::required(field::MEASURED_CYLINDER_LOSS, FieldType::Number),
                    Rule::Group(vec![
                        Rule::required(field::HW_CYLINDER_VOLUME, FieldType::Number),
                        Rule::required(field::CYLINDER_INSULATION_THICKNESS, FieldType::Number),
                        Rule::required(
                            field::CYLINDER_INSULATION_TYPE,
                            FieldType::Enum(CYLINDER_INSULATION_TYPES),
                        ),
                    ]),
                ],
            )],
        ),
        // photovoltaics
        Rule::OptionalGroup(vec![
            Rule::required(field::PV_PEAK_POWER, FieldType::Number),
            Rule::required(field::PV_ORIENTATION, FieldType::Enum(PV_ORIENTATIONS)),
            Rule::required(field::PV_PITCH, FieldType::Enum(PV_PITCHES)),
        ]),
    ])
});

fn pressure_tested() -> Predicate {
    Predicate::Any(vec![
        Predicate::Present(field::PRESSURISATION_TEST_RESULT),
        Predicate::Present(field::PRESSURISATION_TEST_RESULT_AVERAGE),
    ])
}

pub(crate) fn init() {
    LazyLock::force(&SAP_RULES);
}

/// Check a dwelling record against the SAP input rules, collecting every violation.
pub fn validate(record: &DwellingRecord) -> ValidationReport {
    SAP_RULES.evaluate(record)
}
