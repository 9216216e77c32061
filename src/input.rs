use crate::errors::InputError;
use indexmap::{IndexMap, IndexSet};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use std::io::{BufReader, Read};

/// Canonical names of the dwelling fields read or written during completion and validation.
pub mod field {
    pub const DWELLING_ID: &str = "dwelling_id";
    pub const ID: &str = "id";
    pub const DWELLING_TYPE: &str = "dwelling_type";
    pub const COUNTRY: &str = "country";
    pub const COUNTRY_CODE: &str = "country_code";
    pub const REGION_CODE: &str = "region_code";
    pub const AGE_BAND: &str = "age_band";
    pub const AGE: &str = "age";
    pub const GFA: &str = "GFA";
    pub const VOLUME: &str = "volume";
    pub const N_STOREYS: &str = "Nstoreys";
    pub const N_ROOMS: &str = "n_rooms";
    pub const N_FANS_AND_VENTS: &str = "n_fans_and_vents";
    pub const PRESSURISATION_TEST_RESULT: &str = "pressurisation_test_result";
    pub const PRESSURISATION_TEST_RESULT_AVERAGE: &str = "pressurisation_test_result_average";
    pub const FLOOR_TYPE: &str = "floor_type";
    pub const DRAUGHT_STRIPPING: &str = "draught_stripping";
    pub const OPENINGS: &str = "openings";
    pub const HAS_DRAUGHT_LOBBY: &str = "has_draught_lobby";
    pub const N_SHELTERED_SIDES: &str = "Nshelteredsides";
    pub const WALL_U_VALUE: &str = "wall_u_value";
    pub const WALL_MATERIAL: &str = "wall_material";
    pub const WALL_INSULATION: &str = "wall_insulation";
    pub const WALL_THICKNESS: &str = "wall_thickness";
    pub const THERMAL_MASS_PARAMETER: &str = "thermal_mass_parameter";
    pub const LIVING_AREA_FRACTION: &str = "living_area_fraction";
    pub const HAS_HW_CYLINDER: &str = "has_hw_cylinder";
    pub const MEASURED_CYLINDER_LOSS: &str = "measured_cylinder_loss";
    pub const HW_CYLINDER_VOLUME: &str = "hw_cylinder_volume";
    pub const HW_CYLINDER_SIZE: &str = "hw_cylinder_size";
    pub const CYLINDER_INSULATION_THICKNESS: &str = "cylinder_insulation_thickness";
    pub const CYLINDER_INSULATION_TYPE: &str = "cylinder_insulation_type";
    pub const PRIMARY_PIPEWORK_INSULATED: &str = "primary_pipework_insulated";
    pub const HAS_HW_TIME_CONTROL: &str = "has_hw_time_control";
    pub const GROUND_FLOOR_AREA: &str = "ground_floor_area";
    pub const GROUND_FLOOR_PERIMETER: &str = "ground_floor_perimeter";
    pub const FLOOR_U_VALUE: &str = "floor_u_value";
    pub const MAIN_HEATING_FUEL: &str = "main_heating_fuel";
    pub const MAIN_HEATING_EFFICIENCY: &str = "main_heating_efficiency";
    pub const HAS_SECOND_MAIN_HEATING: &str = "has_second_main_heating";
    pub const MAIN_HEATING_FRACTION: &str = "main_heating_fraction";
    pub const PV_PEAK_POWER: &str = "pv_peak_power";
    pub const PV_ORIENTATION: &str = "pv_orientation";
    pub const PV_PITCH: &str = "pv_pitch";
}

/// Read one dwelling (a JSON object) or a batch of dwellings (a JSON array of objects).
pub fn ingest_for_processing(json: impl Read) -> anyhow::Result<Vec<DwellingRecord>> {
    let reader = BufReader::new(json);
    let input: JsonValue = serde_json::from_reader(reader)?;

    let records = match input {
        JsonValue::Array(dwellings) => dwellings
            .into_iter()
            .enumerate()
            .map(|(index, dwelling)| DwellingRecord::from_json_at(dwelling, index))
            .collect::<Result<Vec<_>, _>>()?,
        dwelling => vec![DwellingRecord::from_json_at(dwelling, 0)?],
    };

    Ok(records)
}

/// A single dwelling as surveyed, together with the values derived for it during completion.
///
/// Observed values are never changed. A derived value may be written once for a key that has no
/// value yet. A small set of canonical fields (values SAP always recomputes from its own tables)
/// may instead be assigned once over the top of whatever was observed.
#[derive(Clone, Debug, PartialEq)]
pub struct DwellingRecord {
    observed: Map<String, JsonValue>,
    derived: IndexMap<String, JsonValue>,
    canonical: IndexSet<String>,
    position: usize,
}

impl DwellingRecord {
    pub fn from_json(value: JsonValue) -> Result<Self, InputError> {
        Self::from_json_at(value, 0)
    }

    fn from_json_at(value: JsonValue, position: usize) -> Result<Self, InputError> {
        match value {
            JsonValue::Object(observed) => Ok(Self {
                observed,
                derived: Default::default(),
                canonical: Default::default(),
                position,
            }),
            _ => Err(InputError::new(format!(
                "dwelling at position {position} is not a JSON object"
            ))),
        }
    }

    /// A label for this dwelling suitable for log and output file names.
    pub fn identifier(&self) -> String {
        [field::DWELLING_ID, field::ID]
            .iter()
            .find_map(|key| match self.observed.get(*key) {
                Some(JsonValue::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(JsonValue::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| format!("dwelling_{}", self.position))
    }

    /// The current value for a field, with derived and canonical values taking precedence. Null is
    /// treated the same as an absent field.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.derived
            .get(key)
            .or_else(|| self.observed.get(key))
            .filter(|value| !value.is_null())
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, InputError> {
        self.get(key)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| InputError::wrong_type(key, "a number"))
            })
            .transpose()
    }

    pub fn integer(&self, key: &str) -> Result<Option<u32>, InputError> {
        self.get(key)
            .map(|value| {
                value
                    .as_u64()
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|number| number.fract() == 0.0 && *number >= 0.0)
                            .map(|number| number as u64)
                    })
                    .and_then(|number| u32::try_from(number).ok())
                    .ok_or_else(|| InputError::wrong_type(key, "a non-negative whole number"))
            })
            .transpose()
    }

    pub fn boolean(&self, key: &str) -> Result<Option<bool>, InputError> {
        self.get(key)
            .map(|value| {
                value
                    .as_bool()
                    .ok_or_else(|| InputError::wrong_type(key, "true or false"))
            })
            .transpose()
    }

    pub fn string(&self, key: &str) -> Result<Option<&str>, InputError> {
        self.get(key)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| InputError::wrong_type(key, "a string"))
            })
            .transpose()
    }

    pub fn list(&self, key: &str) -> Result<Option<&Vec<JsonValue>>, InputError> {
        self.get(key)
            .map(|value| {
                value
                    .as_array()
                    .ok_or_else(|| InputError::wrong_type(key, "a list"))
            })
            .transpose()
    }

    /// Read a field as one of the closed enumerations used for table lookups.
    pub fn parsed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, InputError> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|_| {
                    InputError::new(format!("{key} has an unrecognised value of {value}"))
                })
            })
            .transpose()
    }

    /// Record a value inferred for a field that has no value yet.
    pub fn derive(&mut self, key: &str, value: impl Into<JsonValue>) -> Result<&mut Self, InputError> {
        if self.is_present(key) {
            return Err(InputError::new(format!(
                "{key} already has a value and cannot be derived again"
            )));
        }
        self.derived.insert(key.into(), value.into());

        Ok(self)
    }

    /// Assign the canonical value of a field that is always recomputed, shadowing any observed
    /// value. Once assigned, a canonical value can only be confirmed, not changed.
    pub fn assign_canonical(
        &mut self,
        key: &str,
        value: impl Into<JsonValue>,
    ) -> Result<&mut Self, InputError> {
        let value = value.into();
        if self.canonical.contains(key) {
            if self.derived.get(key) != Some(&value) {
                return Err(InputError::new(format!(
                    "canonical value for {key} has already been assigned"
                )));
            }
            return Ok(self);
        }
        self.canonical.insert(key.into());
        self.derived.insert(key.into(), value);

        Ok(self)
    }

    pub fn derived_keys(&self) -> impl Iterator<Item = &str> {
        self.derived.keys().map(String::as_str)
    }

    /// Flatten into a single JSON object: observed fields in their original order with any
    /// canonical replacements applied in place, followed by newly derived fields.
    pub fn finalize(self) -> JsonValue {
        let mut merged = self.observed;
        for (key, value) in self.derived {
            merged.insert(key, value);
        }

        JsonValue::Object(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;
    use std::io::Cursor;

    #[fixture]
    fn record() -> DwellingRecord {
        DwellingRecord::from_json(json!({
            "dwelling_id": "abc-1",
            "n_rooms": 5,
            "GFA": 84.5,
            "has_hw_cylinder": true,
            "floor_type": "suspended_timber",
            "country_code": "GB-ENG",
            "wall_thickness": null
        }))
        .unwrap()
    }

    #[rstest]
    fn test_typed_accessors(record: DwellingRecord) {
        assert_eq!(record.integer("n_rooms").unwrap(), Some(5));
        assert_eq!(record.number("GFA").unwrap(), Some(84.5));
        assert_eq!(record.boolean("has_hw_cylinder").unwrap(), Some(true));
        assert_eq!(record.string("country_code").unwrap(), Some("GB-ENG"));
        assert_eq!(record.number("volume").unwrap(), None);
    }

    #[rstest]
    fn test_typed_accessors_reject_wrong_types(record: DwellingRecord) {
        assert!(record.integer("GFA").is_err());
        assert!(record.boolean("n_rooms").is_err());
        assert!(record.string("GFA").is_err());
        assert!(record.list("GFA").is_err());
    }

    #[rstest]
    fn test_null_is_absent(record: DwellingRecord) {
        assert!(!record.is_present("wall_thickness"));
        assert_eq!(record.number("wall_thickness").unwrap(), None);
    }

    #[rstest]
    fn test_derive_only_fills_absent_fields(mut record: DwellingRecord) {
        record.derive("volume", 210.0).unwrap();
        record.derive("wall_thickness", 220.0).unwrap();

        assert_eq!(record.number("volume").unwrap(), Some(210.0));
        assert!(record.derive("volume", 1.0).is_err());
        assert!(record.derive("GFA", 1.0).is_err());
        assert_eq!(record.number("GFA").unwrap(), Some(84.5));
    }

    #[rstest]
    fn test_canonical_assignment_shadows_observed_value(mut record: DwellingRecord) {
        record
            .assign_canonical("floor_type", "suspended_timber_sealed")
            .unwrap();

        assert_eq!(
            record.string("floor_type").unwrap(),
            Some("suspended_timber_sealed")
        );
        assert!(record
            .assign_canonical("floor_type", "suspended_timber_sealed")
            .is_ok());
        assert!(record
            .assign_canonical("floor_type", "suspended_timber_unsealed")
            .is_err());
    }

    #[rstest]
    fn test_finalize_keeps_observed_order(mut record: DwellingRecord) {
        record.assign_canonical("floor_type", "solid").unwrap();
        record.derive("volume", 200.0).unwrap();

        let finalized = record.finalize();
        let keys = finalized
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec![
                "dwelling_id",
                "n_rooms",
                "GFA",
                "has_hw_cylinder",
                "floor_type",
                "country_code",
                "wall_thickness",
                "volume"
            ]
        );
        assert_eq!(finalized["floor_type"], json!("solid"));
    }

    #[rstest]
    fn test_identifier() {
        assert_eq!(
            DwellingRecord::from_json(json!({"id": 17})).unwrap().identifier(),
            "17"
        );
        assert_eq!(
            DwellingRecord::from_json(json!({})).unwrap().identifier(),
            "dwelling_0"
        );
    }

    #[rstest]
    fn test_ingest_single_and_batch() {
        let single = ingest_for_processing(Cursor::new(r#"{"n_rooms": 3}"#)).unwrap();
        assert_eq!(single.len(), 1);

        let batch =
            ingest_for_processing(Cursor::new(r#"[{"n_rooms": 3}, {"n_rooms": 4}]"#)).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].identifier(), "dwelling_1");

        assert!(ingest_for_processing(Cursor::new(r#"[1, 2]"#)).is_err());
        assert!(ingest_for_processing(Cursor::new("not json")).is_err());
    }
}
