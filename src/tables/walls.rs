use crate::errors::InputError;
use crate::geography::Country;
use crate::tables::AgeBand;
use csv::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::sync::LazyLock;
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WallMaterial {
    Stone,
    SolidBrick,
    Cob,
    Cavity,
    TimberFrame,
    SystemBuild,
}

#[derive(Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WallInsulation {
    /// As built
    None,
    FilledCavity,
    Internal,
    External,
}

/// A row of one of the wall tables, with one value per age band from A to K. Blank cells are
/// combinations the regulatory table does not cover. The thickness table has no country column.
#[derive(Debug, Deserialize)]
struct WallRow {
    country: Option<Country>,
    material: WallMaterial,
    insulation: WallInsulation,
    #[serde(rename = "A")]
    a: Option<f64>,
    #[serde(rename = "B")]
    b: Option<f64>,
    #[serde(rename = "C")]
    c: Option<f64>,
    #[serde(rename = "D")]
    d: Option<f64>,
    #[serde(rename = "E")]
    e: Option<f64>,
    #[serde(rename = "F")]
    f: Option<f64>,
    #[serde(rename = "G")]
    g: Option<f64>,
    #[serde(rename = "H")]
    h: Option<f64>,
    #[serde(rename = "I")]
    i: Option<f64>,
    #[serde(rename = "J")]
    j: Option<f64>,
    #[serde(rename = "K")]
    k: Option<f64>,
}

impl WallRow {
    fn entries(&self) -> impl Iterator<Item = (AgeBand, f64)> {
        let values = [
            self.a, self.b, self.c, self.d, self.e, self.f, self.g, self.h, self.i, self.j, self.k,
        ];
        AgeBand::iter()
            .zip(values)
            .filter_map(|(band, value)| value.map(|value| (band, value)))
    }
}

type WallUValueKey = (Country, WallMaterial, WallInsulation, AgeBand);
type WallThicknessKey = (WallMaterial, WallInsulation, AgeBand);

/// Tables S5 to S7: default wall U-values (W/m²K) by country.
static WALL_U_VALUES: LazyLock<HashMap<WallUValueKey, f64>> = LazyLock::new(|| {
    let mut u_values: HashMap<WallUValueKey, f64> = Default::default();

    let mut reader = Reader::from_reader(BufReader::new(Cursor::new(include_str!(
        "./wall_u_values.csv"
    ))));
    for row in reader.deserialize() {
        let row: WallRow = row.expect("Reading the wall U-values file failed.");
        let country = row
            .country
            .expect("Every row of the wall U-values file should name a country.");
        for (band, u_value) in row.entries() {
            u_values.insert((country, row.material, row.insulation, band), u_value);
        }
    }

    u_values
});

/// Table S3: default wall thickness (mm).
static WALL_THICKNESSES: LazyLock<HashMap<WallThicknessKey, f64>> = LazyLock::new(|| {
    let mut thicknesses: HashMap<WallThicknessKey, f64> = Default::default();

    let mut reader = Reader::from_reader(BufReader::new(Cursor::new(include_str!(
        "./wall_thicknesses.csv"
    ))));
    for row in reader.deserialize() {
        let row: WallRow = row.expect("Reading the wall thicknesses file failed.");
        for (band, thickness) in row.entries() {
            thicknesses.insert((row.material, row.insulation, band), thickness);
        }
    }

    thicknesses
});

pub(crate) fn init() {
    LazyLock::force(&WALL_U_VALUES);
    LazyLock::force(&WALL_THICKNESSES);
}

/// Default U-value of an external wall. Wales shares the England table.
pub fn wall_u_value(
    country: Country,
    age_band: AgeBand,
    material: WallMaterial,
    insulation: WallInsulation,
) -> Result<f64, InputError> {
    WALL_U_VALUES
        .get(&(country.for_rdsap_tables(), material, insulation, age_band))
        .copied()
        .ok_or_else(|| {
            InputError::new(format!(
                "no default wall U-value for {material} walls with {insulation} insulation in age band {age_band} ({country})"
            ))
        })
}

/// Default wall thickness in millimetres.
pub fn wall_thickness(
    age_band: AgeBand,
    material: WallMaterial,
    insulation: WallInsulation,
) -> Result<f64, InputError> {
    WALL_THICKNESSES
        .get(&(material, insulation, age_band))
        .copied()
        .ok_or_else(|| {
            InputError::new(format!(
                "no default wall thickness for {material} walls with {insulation} insulation in age band {age_band}"
            ))
        })
}
