// Parsing of wall-clock times and day codes as they appear in catalog exports.
use chrono::{NaiveTime, Timelike};

const FORMATS: [&str; 5] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p", "%I:%M:%S %p"];

/// Parse "09:30", "9:30 AM", "09:30:00" or "9:30PM" into a `NaiveTime`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let tok = raw.trim().to_uppercase().replace('.', ":");
    if tok.is_empty() {
        return None;
    }
    FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(&tok, f).ok())
}

/// Minutes since midnight.
pub fn minutes(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Serde helpers for `Option<NaiveTime>` fields. Reads any format accepted by
/// `parse_clock`, writes 24h "HH:MM".
pub mod opt {
    use super::parse_clock;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_clock(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", s))),
        }
    }
}

/// Same as `opt` but for required fields.
pub mod req {
    use super::parse_clock;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(d)?;
        parse_clock(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}'", s)))
    }
}
