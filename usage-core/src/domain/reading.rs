use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// The closed set of utilities a household reading can describe.
///
/// `Unknown` is a decode-time fallback for legacy rows whose stored type
/// string falls outside the closed set; it is rejected on new writes and
/// contributes to no aggregation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilityType {
    Electricity,
    Gas,
    Water,
    Unknown,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized utility type '{0}'")]
pub struct ParseUtilityError(pub String);

impl UtilityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UtilityType::Electricity => "electricity",
            UtilityType::Gas => "gas",
            UtilityType::Water => "water",
            UtilityType::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, UtilityType::Unknown)
    }

    /// Tolerant decode for stored rows: anything outside the closed set maps
    /// to `Unknown` instead of failing the whole query.
    pub fn from_stored(raw: &str) -> UtilityType {
        raw.parse().unwrap_or(UtilityType::Unknown)
    }
}

impl FromStr for UtilityType {
    type Err = ParseUtilityError;

    /// Strict parse: only the three metered utilities are accepted. Used on
    /// the write path; `from_stored` is the tolerant read-path counterpart.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electricity" => Ok(UtilityType::Electricity),
            "gas" => Ok(UtilityType::Gas),
            "water" => Ok(UtilityType::Water),
            other => Err(ParseUtilityError(other.to_string())),
        }
    }
}

/// Deserialization is tolerant everywhere readings flow in: unrecognized
/// type strings become `Unknown` rather than a decode error. The write path
/// re-checks with the strict parse.
impl<'de> Deserialize<'de> for UtilityType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(UtilityType::from_stored(&raw))
    }
}

impl std::fmt::Display for UtilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Utility selector for list/chart queries: everything, or one exact type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityFilter {
    All,
    Only(UtilityType),
}

impl FromStr for UtilityFilter {
    type Err = ParseUtilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(UtilityFilter::All)
        } else {
            s.parse().map(UtilityFilter::Only)
        }
    }
}

/// One utility usage observation for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub date: Date,
    #[serde(rename = "type")]
    pub utility_type: UtilityType,
    pub usage: f64,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the caller when recording a new reading; id, owner
/// scoping and timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReading {
    pub date: Date,
    #[serde(rename = "type")]
    pub utility_type: UtilityType,
    pub usage: f64,
    pub notes: Option<String>,
}

/// Partial update of an existing reading. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingPatch {
    pub date: Option<Date>,
    #[serde(rename = "type")]
    pub utility_type: Option<UtilityType>,
    pub usage: Option<f64>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_accepts_only_the_closed_set() {
        assert_eq!("gas".parse::<UtilityType>(), Ok(UtilityType::Gas));
        assert!("solar".parse::<UtilityType>().is_err());
        assert!("unknown".parse::<UtilityType>().is_err());
        assert!("Electricity".parse::<UtilityType>().is_err());
    }

    #[test]
    fn stored_decode_falls_back_to_unknown() {
        assert_eq!(UtilityType::from_stored("water"), UtilityType::Water);
        assert_eq!(UtilityType::from_stored("solar"), UtilityType::Unknown);
        assert!(!UtilityType::from_stored("solar").is_known());
    }

    #[test]
    fn serde_round_trips_known_types_and_tolerates_the_rest() {
        assert_eq!(serde_json::to_string(&UtilityType::Gas).unwrap(), "\"gas\"");
        assert_eq!(
            serde_json::from_str::<UtilityType>("\"water\"").unwrap(),
            UtilityType::Water
        );
        assert_eq!(
            serde_json::from_str::<UtilityType>("\"solar\"").unwrap(),
            UtilityType::Unknown
        );
    }

    #[test]
    fn filter_parse_handles_all_and_exact_types() {
        assert_eq!("all".parse::<UtilityFilter>(), Ok(UtilityFilter::All));
        assert_eq!(
            "electricity".parse::<UtilityFilter>(),
            Ok(UtilityFilter::Only(UtilityType::Electricity))
        );
        assert!("everything".parse::<UtilityFilter>().is_err());
    }
}
