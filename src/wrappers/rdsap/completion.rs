use crate::core::ground_floor::ground_floor_u;
use crate::core::units::millimetres_to_metres;
use crate::errors::InputError;
use crate::geography::{country_for, Country};
use crate::input::{field, DwellingRecord};
use crate::tables::{
    age_band_for, cylinder_insulation_properties, floor_type_for, has_draught_lobby,
    has_hw_time_control, living_area_fraction, n_fans_and_vents, num_sheltered_sides,
    percent_draught_stripping, primary_pipework_insulated, wall_thickness, wall_u_value,
    water_cylinder_volume, AgeBand, CylinderDescriptor, DwellingType, FloorType, Opening,
    WallInsulation, WallMaterial,
};
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};

/// in kJ/m2.K
const DEFAULT_THERMAL_MASS_PARAMETER: f64 = 250.;
const DEFAULT_NUMBER_OF_STOREYS: u32 = 1;

/// Fill in every SAP input an RdSAP survey leaves out, using the Appendix S tables. Observed
/// values are never replaced, except for the few fields SAP always recomputes. Fails on the first
/// field that can be neither read nor inferred.
#[instrument(skip(dwelling), fields(id = %dwelling.identifier()))]
pub fn complete(mut dwelling: DwellingRecord) -> Result<DwellingRecord, InputError> {
    let dwelling_type: DwellingType = dwelling
        .parsed(field::DWELLING_TYPE)?
        .ok_or_else(|| InputError::missing(field::DWELLING_TYPE))?;
    let country = resolve_country(&mut dwelling)?;
    let age_band = resolve_age_band(&mut dwelling, country)?;

    if !dwelling.is_present(field::N_FANS_AND_VENTS) {
        let n_rooms = required_integer(&dwelling, field::N_ROOMS)?;
        fill(&mut dwelling, field::N_FANS_AND_VENTS, n_fans_and_vents(age_band, n_rooms)?)?;
    }

    let has_pressurisation_test = dwelling.is_present(field::PRESSURISATION_TEST_RESULT_AVERAGE)
        || dwelling.is_present(field::PRESSURISATION_TEST_RESULT);
    if !has_pressurisation_test {
        resolve_floor_type(&mut dwelling, age_band)?;
        resolve_draught_stripping(&mut dwelling)?;
    }

    if !dwelling.is_present(field::HAS_DRAUGHT_LOBBY) {
        fill(&mut dwelling, field::HAS_DRAUGHT_LOBBY, has_draught_lobby(dwelling_type))?;
    }

    if !dwelling.is_present(field::N_SHELTERED_SIDES) {
        let n_storeys = dwelling
            .integer(field::N_STOREYS)?
            .unwrap_or(DEFAULT_NUMBER_OF_STOREYS);
        fill(
            &mut dwelling,
            field::N_SHELTERED_SIDES,
            num_sheltered_sides(dwelling_type, n_storeys)?,
        )?;
    }

    resolve_walls(&mut dwelling, country, age_band)?;
    resolve_ground_floor_u_value(&mut dwelling, age_band)?;

    if !dwelling.is_present(field::THERMAL_MASS_PARAMETER) {
        fill(&mut dwelling, field::THERMAL_MASS_PARAMETER, DEFAULT_THERMAL_MASS_PARAMETER)?;
    }

    let n_rooms = required_integer(&dwelling, field::N_ROOMS)?;
    canonical(&mut dwelling, field::LIVING_AREA_FRACTION, living_area_fraction(n_rooms)?)?;

    resolve_hot_water_cylinder(&mut dwelling, age_band)?;

    if !dwelling.is_present(field::PRIMARY_PIPEWORK_INSULATED) {
        fill(
            &mut dwelling,
            field::PRIMARY_PIPEWORK_INSULATED,
            primary_pipework_insulated(age_band),
        )?;
    }
    canonical(&mut dwelling, field::HAS_HW_TIME_CONTROL, has_hw_time_control(age_band))?;

    Ok(dwelling)
}

fn fill(
    dwelling: &mut DwellingRecord,
    key: &str,
    value: impl Into<JsonValue>,
) -> Result<(), InputError> {
    let value = value.into();
    debug!("Derived {key} = {value}");
    dwelling.derive(key, value)?;

    Ok(())
}

fn canonical(
    dwelling: &mut DwellingRecord,
    key: &str,
    value: impl Into<JsonValue>,
) -> Result<(), InputError> {
    let value = value.into();
    if let Some(observed) = dwelling.get(key) {
        if *observed != value {
            debug!("Replacing {key} = {observed} with canonical value {value}");
        }
    }
    dwelling.assign_canonical(key, value)?;

    Ok(())
}

fn required_integer(dwelling: &DwellingRecord, key: &str) -> Result<u32, InputError> {
    dwelling
        .integer(key)?
        .ok_or_else(|| InputError::missing(key))
}

/// The country whose tables apply. Wales is stored and looked up as England.
fn resolve_country(dwelling: &mut DwellingRecord) -> Result<Country, InputError> {
    if let Some(country) = dwelling.parsed::<Country>(field::COUNTRY)? {
        return Ok(country.for_rdsap_tables());
    }

    let country = country_for(dwelling)?.for_rdsap_tables();
    fill(dwelling, field::COUNTRY, country.to_string())?;

    Ok(country)
}

fn resolve_age_band(dwelling: &mut DwellingRecord, country: Country) -> Result<AgeBand, InputError> {
    if let Some(age_band) = dwelling.parsed::<AgeBand>(field::AGE_BAND)? {
        return Ok(age_band);
    }

    let year = construction_year(dwelling)?.ok_or_else(|| {
        InputError::new("insufficient data to determine construction age: provide age_band or age")
    })?;
    let age_band = age_band_for(year, country)?;
    fill(dwelling, field::AGE_BAND, age_band.to_string())?;

    Ok(age_band)
}

/// The construction year, which surveys record either as a number or as a string of digits.
fn construction_year(dwelling: &DwellingRecord) -> Result<Option<i32>, InputError> {
    let invalid = || InputError::wrong_type(field::AGE, "a construction year");

    dwelling
        .get(field::AGE)
        .map(|age| match age {
            JsonValue::Number(year) => year
                .as_i64()
                .and_then(|year| i32::try_from(year).ok())
                .ok_or_else(invalid),
            JsonValue::String(year) => year.trim().parse::<i32>().map_err(|_| invalid()),
            _ => Err(invalid()),
        })
        .transpose()
}

fn resolve_floor_type(dwelling: &mut DwellingRecord, age_band: AgeBand) -> Result<(), InputError> {
    let observed = dwelling.parsed::<FloorType>(field::FLOOR_TYPE)?;
    let floor_type = floor_type_for(age_band, observed);

    match observed {
        None => fill(dwelling, field::FLOOR_TYPE, floor_type.to_string()),
        Some(observed) if observed != floor_type => {
            canonical(dwelling, field::FLOOR_TYPE, floor_type.to_string())
        }
        Some(_) => Ok(()),
    }
}

fn resolve_draught_stripping(dwelling: &mut DwellingRecord) -> Result<(), InputError> {
    if dwelling.is_present(field::DRAUGHT_STRIPPING) {
        return Ok(());
    }

    // a survey with no opening records has nothing draught stripped
    let openings: Vec<Opening> = dwelling.parsed(field::OPENINGS)?.unwrap_or_default();
    fill(
        dwelling,
        field::DRAUGHT_STRIPPING,
        percent_draught_stripping(&openings),
    )
}

/// Wall U-value from the wall construction. The wall thickness is filled in alongside, as the
/// ground floor calculation depends on it.
fn resolve_walls(
    dwelling: &mut DwellingRecord,
    country: Country,
    age_band: AgeBand,
) -> Result<(), InputError> {
    if dwelling.is_present(field::WALL_U_VALUE) {
        return Ok(());
    }

    let material = dwelling.parsed::<WallMaterial>(field::WALL_MATERIAL)?;
    let insulation = dwelling.parsed::<WallInsulation>(field::WALL_INSULATION)?;
    let (material, insulation) = match (material, insulation) {
        (Some(material), Some(insulation)) => (material, insulation),
        (material, insulation) => {
            let missing = [
                (material.is_none(), field::WALL_MATERIAL),
                (insulation.is_none(), field::WALL_INSULATION),
            ]
            .into_iter()
            .filter_map(|(is_missing, key)| is_missing.then_some(key))
            .collect::<Vec<_>>();
            return Err(InputError::new(format!(
                "wall_u_value cannot be determined without {}",
                missing.join(" and ")
            )));
        }
    };

    fill(
        dwelling,
        field::WALL_U_VALUE,
        wall_u_value(country, age_band, material, insulation)?,
    )?;
    if !dwelling.is_present(field::WALL_THICKNESS) {
        fill(
            dwelling,
            field::WALL_THICKNESS,
            wall_thickness(age_band, material, insulation)?,
        )?;
    }

    Ok(())
}

/// Only dwellings with surveyed ground floor geometry get a calculated floor U-value.
fn resolve_ground_floor_u_value(
    dwelling: &mut DwellingRecord,
    age_band: AgeBand,
) -> Result<(), InputError> {
    if dwelling.is_present(field::FLOOR_U_VALUE) {
        return Ok(());
    }
    let Some(floor_area) = dwelling.number(field::GROUND_FLOOR_AREA)? else {
        return Ok(());
    };

    let perimeter = dwelling
        .number(field::GROUND_FLOOR_PERIMETER)?
        .ok_or_else(|| InputError::missing(field::GROUND_FLOOR_PERIMETER))?;
    let wall_thickness_mm = match dwelling.number(field::WALL_THICKNESS)? {
        Some(thickness) => thickness,
        None => {
            let thickness = tabulated_wall_thickness(dwelling, age_band)?.ok_or_else(|| {
                InputError::new(
                    "wall_thickness is required to calculate floor_u_value: provide wall_thickness, or wall_material and wall_insulation",
                )
            })?;
            fill(dwelling, field::WALL_THICKNESS, thickness)?;
            thickness
        }
    };

    let u_value = ground_floor_u(
        age_band,
        perimeter,
        millimetres_to_metres(wall_thickness_mm),
        floor_area,
    )?;
    fill(dwelling, field::FLOOR_U_VALUE, u_value)
}

/// Table thickness for the surveyed wall construction, if there is one.
fn tabulated_wall_thickness(
    dwelling: &DwellingRecord,
    age_band: AgeBand,
) -> Result<Option<f64>, InputError> {
    let material = dwelling.parsed::<WallMaterial>(field::WALL_MATERIAL)?;
    let insulation = dwelling.parsed::<WallInsulation>(field::WALL_INSULATION)?;

    match (material, insulation) {
        (Some(material), Some(insulation)) => {
            Ok(Some(wall_thickness(age_band, material, insulation)?))
        }
        _ => Ok(None),
    }
}

fn resolve_hot_water_cylinder(
    dwelling: &mut DwellingRecord,
    age_band: AgeBand,
) -> Result<(), InputError> {
    let has_cylinder = dwelling.boolean(field::HAS_HW_CYLINDER)?.unwrap_or(false);
    if !has_cylinder || dwelling.is_present(field::MEASURED_CYLINDER_LOSS) {
        return Ok(());
    }

    if !dwelling.is_present(field::HW_CYLINDER_VOLUME) {
        let descriptor: CylinderDescriptor =
            dwelling.parsed(field::HW_CYLINDER_SIZE)?.ok_or_else(|| {
                InputError::new(
                    "hw_cylinder_volume cannot be determined without hw_cylinder_size",
                )
            })?;
        fill(
            dwelling,
            field::HW_CYLINDER_VOLUME,
            water_cylinder_volume(descriptor),
        )?;
    }

    match (
        dwelling.is_present(field::CYLINDER_INSULATION_THICKNESS),
        dwelling.is_present(field::CYLINDER_INSULATION_TYPE),
    ) {
        (true, true) => Ok(()),
        (false, false) => {
            let (thickness, insulation_type) = cylinder_insulation_properties(age_band);
            fill(dwelling, field::CYLINDER_INSULATION_THICKNESS, thickness)?;
            fill(
                dwelling,
                field::CYLINDER_INSULATION_TYPE,
                insulation_type.to_string(),
            )
        }
        _ => Err(InputError::new(
            "cylinder_insulation_thickness and cylinder_insulation_type must be given together",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    #[fixture]
    fn welsh_house() -> DwellingRecord {
        DwellingRecord::from_json(json!({
            "dwelling_type": "house",
            "country_code": "GB-WLS",
            "age": 1935,
            "n_rooms": 5,
            "Nstoreys": 2,
            "wall_material": "solid_brick",
            "wall_insulation": "none",
            "openings": [
                {"draught_stripped": true, "count": 6},
                {"draught_stripped": false, "count": 2}
            ]
        }))
        .unwrap()
    }

    fn completed(value: JsonValue) -> Result<JsonValue, InputError> {
        complete(DwellingRecord::from_json(value)?).map(DwellingRecord::finalize)
    }

    #[rstest]
    fn test_complete_welsh_house(welsh_house: DwellingRecord) {
        let completed = complete(welsh_house).unwrap().finalize();

        assert_eq!(completed["country"], json!("England"));
        assert_eq!(completed["age_band"], json!("C"));
        assert_eq!(completed["n_fans_and_vents"], json!(0));
        assert_eq!(completed["floor_type"], json!("solid"));
        assert_eq!(completed["draught_stripping"], json!(75.0));
        assert_eq!(completed["has_draught_lobby"], json!(false));
        assert_eq!(completed["Nshelteredsides"], json!(2));
        assert_relative_eq!(completed["wall_u_value"].as_f64().unwrap(), 2.1);
        assert_relative_eq!(completed["wall_thickness"].as_f64().unwrap(), 220.);
        assert_relative_eq!(completed["thermal_mass_parameter"].as_f64().unwrap(), 250.);
        assert_relative_eq!(completed["living_area_fraction"].as_f64().unwrap(), 0.21);
        assert_eq!(completed["primary_pipework_insulated"], json!(false));
        assert_eq!(completed["has_hw_time_control"], json!(false));
        for cylinder_field in [
            "hw_cylinder_volume",
            "cylinder_insulation_thickness",
            "cylinder_insulation_type",
        ] {
            assert!(completed.get(cylinder_field).is_none());
        }
    }

    #[rstest]
    fn test_complete_is_idempotent(welsh_house: DwellingRecord) {
        let once = complete(welsh_house).unwrap();
        let twice = complete(once.clone()).unwrap();

        assert_eq!(once.clone().finalize(), twice.finalize());

        let reingested = complete(DwellingRecord::from_json(once.clone().finalize()).unwrap())
            .unwrap()
            .finalize();
        assert_eq!(once.finalize(), reingested);
    }

    #[rstest]
    fn test_observed_values_are_kept() {
        let completed = completed(json!({
            "dwelling_type": "flat",
            "country": "Scotland",
            "age_band": "H",
            "n_rooms": 3,
            "n_fans_and_vents": 5,
            "draught_stripping": 40,
            "has_draught_lobby": false,
            "Nshelteredsides": 3,
            "wall_u_value": 0.9,
            "thermal_mass_parameter": 100.0,
            "primary_pipework_insulated": true
        }))
        .unwrap();

        assert_eq!(completed["n_fans_and_vents"], json!(5));
        assert_eq!(completed["draught_stripping"], json!(40));
        assert_eq!(completed["has_draught_lobby"], json!(false));
        assert_eq!(completed["Nshelteredsides"], json!(3));
        assert_eq!(completed["wall_u_value"], json!(0.9));
        assert_eq!(completed["thermal_mass_parameter"], json!(100.0));
        assert_eq!(completed["primary_pipework_insulated"], json!(true));
        assert_eq!(completed["country"], json!("Scotland"));
        assert!(completed.get("wall_thickness").is_none());
    }

    #[rstest]
    fn test_canonical_fields_are_recomputed() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "region_code": 1,
            "age_band": "J",
            "n_rooms": 2,
            "floor_type": "suspended_timber",
            "draught_stripping": 100,
            "wall_u_value": 0.35,
            "living_area_fraction": 0.9,
            "has_hw_time_control": false
        }))
        .unwrap();

        assert_eq!(completed["living_area_fraction"], json!(0.5));
        assert_eq!(completed["has_hw_time_control"], json!(true));
        assert_eq!(completed["floor_type"], json!("suspended_timber_sealed"));
    }

    #[rstest]
    fn test_pressurisation_test_skips_floor_and_draught_stripping() {
        let completed = completed(json!({
            "dwelling_type": "bungalow",
            "country_code": "GB-ENG",
            "age_band": "K",
            "n_rooms": 4,
            "pressurisation_test_result": 4.5,
            "wall_u_value": 0.3
        }))
        .unwrap();

        assert!(completed.get("floor_type").is_none());
        assert!(completed.get("draught_stripping").is_none());
        assert_eq!(completed["n_fans_and_vents"], json!(2));
        assert_eq!(completed["Nshelteredsides"], json!(2));
    }

    #[rstest]
    fn test_hot_water_cylinder_defaults() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "country_code": "GB-SCT",
            "age_band": "G",
            "n_rooms": 6,
            "Nstoreys": 3,
            "draught_stripping": 50,
            "wall_u_value": 0.45,
            "has_hw_cylinder": true,
            "hw_cylinder_size": "medium"
        }))
        .unwrap();

        assert_eq!(completed["hw_cylinder_volume"], json!(160.0));
        assert_eq!(completed["cylinder_insulation_thickness"], json!(25.0));
        assert_eq!(completed["cylinder_insulation_type"], json!("foam"));
        assert_eq!(completed["Nshelteredsides"], json!(1));
        assert_eq!(completed["country"], json!("Scotland"));
    }

    #[rstest]
    fn test_measured_cylinder_loss_skips_cylinder_defaults() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "country_code": "GB-ENG",
            "age_band": "G",
            "n_rooms": 6,
            "draught_stripping": 50,
            "wall_u_value": 0.45,
            "has_hw_cylinder": true,
            "measured_cylinder_loss": 1.4
        }))
        .unwrap();

        assert!(completed.get("hw_cylinder_volume").is_none());
        assert!(completed.get("cylinder_insulation_type").is_none());
    }

    #[rstest]
    fn test_ground_floor_u_value_is_calculated() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "country_code": "GB-ENG",
            "age_band": "C",
            "n_rooms": 5,
            "draught_stripping": 50,
            "wall_material": "solid_brick",
            "wall_insulation": "none",
            "ground_floor_area": 80.0,
            "ground_floor_perimeter": 40.0
        }))
        .unwrap();

        assert_relative_eq!(
            completed["floor_u_value"].as_f64().unwrap(),
            0.7323368244461255,
            max_relative = 1e-12
        );
    }

    #[rstest]
    fn test_ground_floor_u_value_with_observed_wall_u_value() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "country_code": "GB-ENG",
            "age_band": "C",
            "n_rooms": 5,
            "draught_stripping": 50,
            "wall_u_value": 1.2,
            "wall_material": "solid_brick",
            "wall_insulation": "none",
            "ground_floor_area": 80.0,
            "ground_floor_perimeter": 40.0
        }))
        .unwrap();

        assert_eq!(completed["wall_u_value"], json!(1.2));
        assert_relative_eq!(completed["wall_thickness"].as_f64().unwrap(), 220.);
        assert_relative_eq!(
            completed["floor_u_value"].as_f64().unwrap(),
            0.7323368244461255,
            max_relative = 1e-12
        );
    }

    #[rstest]
    #[case::unknown_dwelling_type(
        json!({"dwelling_type": "castle", "country_code": "GB-ENG", "age_band": "C"}),
        r#"dwelling_type has an unrecognised value of "castle""#
    )]
    #[case::no_construction_age(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "n_rooms": 3}),
        "insufficient data to determine construction age: provide age_band or age"
    )]
    #[case::no_country(
        json!({"dwelling_type": "house", "age_band": "C"}),
        "either country_code or region_code is required to determine the country"
    )]
    #[case::no_wall_construction(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0, "wall_insulation": "none"}),
        "wall_u_value cannot be determined without wall_material"
    )]
    #[case::no_wall_data(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0}),
        "wall_u_value cannot be determined without wall_material and wall_insulation"
    )]
    #[case::no_cylinder_size(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0, "wall_u_value": 1.0, "has_hw_cylinder": true}),
        "hw_cylinder_volume cannot be determined without hw_cylinder_size"
    )]
    #[case::half_cylinder_insulation(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0, "wall_u_value": 1.0, "has_hw_cylinder": true, "hw_cylinder_volume": 120, "cylinder_insulation_thickness": 50}),
        "cylinder_insulation_thickness and cylinder_insulation_type must be given together"
    )]
    #[case::malformed_openings(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "wall_u_value": 1.0, "openings": [{"count": 2}]}),
        r#"openings has an unrecognised value of [{"count":2}]"#
    )]
    #[case::no_perimeter(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0, "wall_material": "cavity", "wall_insulation": "none", "ground_floor_area": 50}),
        "ground_floor_perimeter is required but was not provided"
    )]
    #[case::no_wall_construction_for_floor(
        json!({"dwelling_type": "house", "country_code": "GB-ENG", "age_band": "C", "n_rooms": 3, "draught_stripping": 0, "wall_u_value": 1.2, "ground_floor_area": 50, "ground_floor_perimeter": 30}),
        "wall_thickness is required to calculate floor_u_value: provide wall_thickness, or wall_material and wall_insulation"
    )]
    fn test_completion_errors(#[case] input: JsonValue, #[case] message: &str) {
        assert_eq!(completed(input).unwrap_err().message(), message);
    }

    #[rstest]
    fn test_no_openings_means_no_draught_stripping() {
        let completed = completed(json!({
            "dwelling_type": "house",
            "country_code": "GB-ENG",
            "age_band": "C",
            "n_rooms": 3,
            "wall_u_value": 1.0
        }))
        .unwrap();

        assert_eq!(completed["draught_stripping"], json!(0.0));
    }

    #[rstest]
    #[case(json!(1935))]
    #[case(json!("1935"))]
    #[case(json!(" 1935 "))]
    fn test_construction_year_formats(#[case] age: JsonValue) {
        let dwelling = DwellingRecord::from_json(json!({ "age": age })).unwrap();
        assert_eq!(construction_year(&dwelling).unwrap(), Some(1935));
    }

    #[rstest]
    #[case(json!("nineteen thirty five"))]
    #[case(json!(1935.5))]
    #[case(json!(true))]
    fn test_construction_year_rejects_non_years(#[case] age: JsonValue) {
        let dwelling = DwellingRecord::from_json(json!({ "age": age })).unwrap();
        assert!(construction_year(&dwelling).is_err());
    }
}
