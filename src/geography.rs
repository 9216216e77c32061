use crate::errors::InputError;
use crate::input::{field, DwellingRecord};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::{Display, EnumIter, EnumString, FromRepr};
use tracing::warn;

#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
pub enum Country {
    England,
    Scotland,
    NorthernIreland,
    Wales,
}

impl Country {
    /// Map an ISO 3166-2 subdivision code onto a country.
    pub fn from_iso_code(code: &str) -> Result<Self, InputError> {
        match code {
            "GB-EAW" | "GB-ENG" => Ok(Country::England),
            "GB-NIR" => Ok(Country::NorthernIreland),
            "GB-SCT" => Ok(Country::Scotland),
            "GB-WLS" => Ok(Country::Wales),
            _ => Err(InputError::new(format!(
                "country code {code} is not a recognised UK country code"
            ))),
        }
    }

    /// The RdSAP tables have no separate entries for Wales, which uses the England values.
    pub fn for_rdsap_tables(self) -> Self {
        match self {
            Country::Wales => Country::England,
            other => other,
        }
    }
}

/// SAP climate regions, numbered as in SAP Table U1.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize_repr,
    Display,
    EnumIter,
    Eq,
    FromRepr,
    Hash,
    PartialEq,
    Serialize_repr,
)]
#[repr(u8)]
pub enum Region {
    Thames = 1,
    SouthEastEngland = 2,
    SouthernEngland = 3,
    SouthWestEngland = 4,
    SevernWales = 5,
    Midlands = 6,
    WestPenninesWales = 7,
    NorthWestEngland = 8,
    Borders = 9,
    NorthEastEngland = 10,
    EastPennines = 11,
    EastAnglia = 12,
    Wales = 13,
    WestScotland = 14,
    EastScotland = 15,
    NorthEastScotland = 16,
    Highland = 17,
    WesternIsles = 18,
    Orkney = 19,
    Shetland = 20,
}

impl Region {
    /// Region 8 is labelled both North West England and South West Scotland.
    pub const SOUTH_WEST_SCOTLAND: Region = Region::NorthWestEngland;

    pub fn from_code(code: u32) -> Result<Self, InputError> {
        u8::try_from(code)
            .ok()
            .and_then(Region::from_repr)
            .ok_or_else(|| {
                InputError::new(format!("region code {code} is not a recognised SAP region"))
            })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

const REGIONS_BY_COUNTRY: [(Country, &[Region]); 4] = [
    (
        Country::England,
        &[
            Region::Thames,
            Region::SouthEastEngland,
            Region::SouthernEngland,
            Region::SouthWestEngland,
            Region::Midlands,
            Region::NorthWestEngland,
            Region::NorthEastEngland,
            Region::EastPennines,
            Region::EastAnglia,
        ],
    ),
    (
        Country::Wales,
        &[Region::SevernWales, Region::WestPenninesWales, Region::Wales],
    ),
    (
        Country::Scotland,
        &[
            Region::Borders,
            Region::WestScotland,
            Region::EastScotland,
            Region::NorthEastScotland,
            Region::Highland,
            Region::WesternIsles,
            Region::Orkney,
            Region::Shetland,
        ],
    ),
    // Northern Ireland has no numbered region; it is reached through its ISO code only.
    (Country::NorthernIreland, &[]),
];

pub fn region_to_country(region: Region) -> Result<Country, InputError> {
    REGIONS_BY_COUNTRY
        .iter()
        .find(|(_, regions)| regions.contains(&region))
        .map(|(country, _)| *country)
        .ok_or_else(|| {
            InputError::new(format!(
                "region {region} ({}) does not belong to any country",
                region.code()
            ))
        })
}

/// Resolve the country a dwelling sits in, preferring its ISO country code over its SAP region.
pub fn country_for(dwelling: &DwellingRecord) -> Result<Country, InputError> {
    match dwelling.string(field::COUNTRY_CODE)? {
        Some(code) => {
            let country = Country::from_iso_code(code)?;
            let region_country = dwelling.integer(field::REGION_CODE).and_then(|region_code| {
                region_code
                    .map(|region_code| {
                        Region::from_code(region_code)
                            .and_then(region_to_country)
                            .map(|region_country| (region_code, region_country))
                    })
                    .transpose()
            });
            match region_country {
                Ok(Some((region_code, region_country))) if region_country != country => {
                    warn!(
                        "Country code {code} disagrees with region code {region_code} ({region_country}); using {country}"
                    );
                }
                Err(err) => {
                    warn!("Ignoring unusable region code alongside country code {code}: {err}");
                }
                _ => {}
            }
            Ok(country)
        }
        None => match dwelling.integer(field::REGION_CODE)? {
            Some(region_code) => region_to_country(Region::from_code(region_code)?),
            None => Err(InputError::new(
                "either country_code or region_code is required to determine the country",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    fn dwelling(value: serde_json::Value) -> DwellingRecord {
        DwellingRecord::from_json(value).unwrap()
    }

    #[rstest]
    #[case("GB-EAW", Country::England)]
    #[case("GB-ENG", Country::England)]
    #[case("GB-NIR", Country::NorthernIreland)]
    #[case("GB-SCT", Country::Scotland)]
    #[case("GB-WLS", Country::Wales)]
    fn test_from_iso_code(#[case] code: &str, #[case] expected: Country) {
        assert_eq!(Country::from_iso_code(code).unwrap(), expected);
    }

    #[rstest]
    #[case("GB")]
    #[case("gb-eng")]
    #[case("")]
    #[case("FR-IDF")]
    fn test_from_iso_code_rejects_unknown_codes(#[case] code: &str) {
        assert!(Country::from_iso_code(code).is_err());
    }

    #[rstest]
    fn test_regions_partition_exactly_one_to_twenty() {
        let partitioned = REGIONS_BY_COUNTRY
            .iter()
            .flat_map(|(_, regions)| regions.iter().map(|region| region.code()))
            .sorted()
            .collect_vec();

        assert_eq!(partitioned, (1..=20).collect_vec());
    }

    #[rstest]
    fn test_every_region_maps_to_one_country() {
        for region in Region::iter() {
            let owners = REGIONS_BY_COUNTRY
                .iter()
                .filter(|(_, regions)| regions.contains(&region))
                .count();
            assert_eq!(owners, 1, "region {region} should belong to exactly one country");
            assert!(region_to_country(region).is_ok());
        }
    }

    #[rstest]
    fn test_region_eight_alias_shares_code() {
        assert_eq!(Region::SOUTH_WEST_SCOTLAND.code(), 8);
        assert_eq!(Region::SOUTH_WEST_SCOTLAND, Region::NorthWestEngland);
        assert_eq!(
            region_to_country(Region::SOUTH_WEST_SCOTLAND).unwrap(),
            Country::England
        );
    }

    #[rstest]
    #[case(0)]
    #[case(21)]
    #[case(255)]
    #[case(1000)]
    fn test_from_code_rejects_out_of_range(#[case] code: u32) {
        assert!(Region::from_code(code).is_err());
    }

    #[rstest]
    #[case(1, Country::England)]
    #[case(5, Country::Wales)]
    #[case(13, Country::Wales)]
    #[case(9, Country::Scotland)]
    #[case(20, Country::Scotland)]
    fn test_region_to_country(#[case] code: u32, #[case] expected: Country) {
        assert_eq!(
            region_to_country(Region::from_code(code).unwrap()).unwrap(),
            expected
        );
    }

    #[rstest]
    fn test_country_for_prefers_iso_code() {
        let record = dwelling(json!({"country_code": "GB-SCT", "region_code": 1}));
        assert_eq!(country_for(&record).unwrap(), Country::Scotland);
    }

    #[rstest]
    #[case::out_of_range(json!({"country_code": "GB-NIR", "region_code": 21}))]
    #[case::not_a_number(json!({"country_code": "GB-NIR", "region_code": "antrim"}))]
    #[case::negative(json!({"country_code": "GB-NIR", "region_code": -3}))]
    fn test_country_for_ignores_unusable_region_beside_iso_code(
        #[case] value: serde_json::Value,
    ) {
        assert_eq!(
            country_for(&dwelling(value)).unwrap(),
            Country::NorthernIreland
        );
    }

    #[rstest]
    fn test_country_for_falls_back_to_region() {
        let record = dwelling(json!({"region_code": 14}));
        assert_eq!(country_for(&record).unwrap(), Country::Scotland);
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"country_code": "XX"}))]
    #[case(json!({"region_code": 42}))]
    #[case(json!({"region_code": "north"}))]
    fn test_country_for_errors(#[case] value: serde_json::Value) {
        assert!(country_for(&dwelling(value)).is_err());
    }

    #[rstest]
    fn test_wales_uses_england_tables() {
        assert_eq!(Country::Wales.for_rdsap_tables(), Country::England);
        assert_eq!(Country::Scotland.for_rdsap_tables(), Country::Scotland);
    }
}
