use crate::errors::InputError;
use crate::geography::Country;
use csv::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::sync::LazyLock;
use strum::{Display, EnumIter, EnumString};

/// RdSAP construction age bands. Bands are ordered from oldest (A) to newest (K).
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum AgeBand {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
}

#[derive(Debug, Deserialize)]
struct AgeBandRange {
    country: Country,
    band: AgeBand,
    start: Option<i32>,
    end: Option<i32>,
}

impl AgeBandRange {
    fn contains(&self, year: i32) -> bool {
        self.start.map_or(true, |start| year >= start) && self.end.map_or(true, |end| year <= end)
    }
}

/// Table S1, keyed by the three sets of date ranges (England & Wales, Scotland, Northern Ireland).
static AGE_BAND_RANGES: LazyLock<HashMap<Country, Vec<AgeBandRange>>> = LazyLock::new(|| {
    let mut ranges: HashMap<Country, Vec<AgeBandRange>> = Default::default();

    let mut reader = Reader::from_reader(BufReader::new(Cursor::new(include_str!(
        "./age_band_ranges.csv"
    ))));
    for range in reader.deserialize() {
        let range: AgeBandRange = range.expect("Reading the age band ranges file failed.");
        ranges.entry(range.country).or_default().push(range);
    }

    ranges
});

pub(crate) fn init() {
    LazyLock::force(&AGE_BAND_RANGES);
}

/// The age band whose date range for the given country contains the construction year.
pub fn age_band_for(year: i32, country: Country) -> Result<AgeBand, InputError> {
    let table_country = match country {
        Country::Wales => Country::England,
        other => other,
    };

    AGE_BAND_RANGES
        .get(&table_country)
        .and_then(|ranges| ranges.iter().find(|range| range.contains(year)))
        .map(|range| range.band)
        .ok_or_else(|| {
            InputError::new(format!(
                "construction year {year} does not fall within any age band for {country}"
            ))
        })
}
