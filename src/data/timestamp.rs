//! Text encoding of commit timestamps.
//!
//! Timestamps are exchanged as `dd/mm/yyyy HH:MM:SS ±hh:mm`, for example
//! `05/03/2024 14:07:09 +05:30`. Parsing is strict: anything that does not
//! render back to the exact same text is rejected.

use chrono::{DateTime, FixedOffset};

/// `strftime` layout of the text encoding.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S %:z";

/// Formats a timestamp in its own offset.
pub fn format_timestamp(when: &DateTime<FixedOffset>) -> String {
    when.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a timestamp, returning `None` unless `text` is exactly in the layout.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let parsed = DateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()?;

    // chrono accepts single-digit fields and a colon-less offset
    (format_timestamp(&parsed) == text).then_some(parsed)
}

/// Serde adapter storing timestamps in the text encoding.
pub mod serde_text {
    use chrono::{DateTime, FixedOffset};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serializes a timestamp as text.
    pub fn serialize<S: Serializer>(
        when: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(when))
    }

    /// Deserializes a timestamp from text.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid timestamp '{text}', expected dd/mm/yyyy HH:MM:SS +hh:mm"
            ))
        })
    }

    /// Adapter for optional timestamps.
    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{de, Deserialize, Deserializer, Serializer};

        /// Serializes an optional timestamp as text.
        pub fn serialize<S: Serializer>(
            when: &Option<DateTime<FixedOffset>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match when {
                Some(when) => serializer.serialize_some(&super::super::format_timestamp(when)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes an optional timestamp from text.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
            let Some(text) = Option::<String>::deserialize(deserializer)? else {
                return Ok(None);
            };
            super::super::parse_timestamp(&text).map(Some).ok_or_else(|| {
                de::Error::custom(format!(
                    "invalid timestamp '{text}', expected dd/mm/yyyy HH:MM:SS +hh:mm"
                ))
            })
        }
    }
}
