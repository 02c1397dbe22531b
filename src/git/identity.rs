//! Author and committer identities.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{Signature, Time};
use serde::{Deserialize, Serialize};

/// Name, email and timestamp of a commit author or committer.
///
/// Two identities are equal only when their timestamps denote the same
/// instant *and* carry the same UTC offset; moving a commit to another time
/// zone is an edit even though the instant is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Timestamp with the offset recorded in the commit.
    #[serde(with = "crate::data::timestamp::serde_text")]
    pub when: DateTime<FixedOffset>,
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.email == other.email
            && same_moment(&self.when, &other.when)
    }
}

impl Eq for Identity {}

/// Compares two timestamps by instant and by offset.
pub fn same_moment(a: &DateTime<FixedOffset>, b: &DateTime<FixedOffset>) -> bool {
    a == b && a.offset() == b.offset()
}

impl Identity {
    /// Creates an identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: DateTime<FixedOffset>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    /// Reads an identity from a git signature.
    ///
    /// Names and emails that are not valid UTF-8 are decoded lossily.
    pub fn from_signature(signature: &Signature<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(signature.name_bytes()).into_owned();
        let email = String::from_utf8_lossy(signature.email_bytes()).into_owned();
        let when = time_to_datetime(signature.when())?;

        Ok(Self { name, email, when })
    }

    /// Builds a git signature carrying this identity.
    pub fn to_signature(&self) -> Result<Signature<'static>> {
        Signature::new(&self.name, &self.email, &datetime_to_time(&self.when))
            .with_context(|| format!("Invalid signature: {} <{}>", self.name, self.email))
    }
}

/// Converts a git timestamp into a chrono datetime in its recorded offset.
pub fn time_to_datetime(time: Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .with_context(|| format!("Invalid time zone offset: {} minutes", time.offset_minutes()))?;

    let utc = DateTime::from_timestamp(time.seconds(), 0).context("Invalid commit timestamp")?;

    Ok(utc.with_timezone(&offset))
}

/// Converts a chrono datetime into a git timestamp.
///
/// Sub-minute offsets cannot be represented by git and are truncated.
pub fn datetime_to_time(when: &DateTime<FixedOffset>) -> Time {
    Time::new(when.timestamp(), when.offset().local_minus_utc() / 60)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(offset_hours: i32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn same_instant_different_offset_is_not_equal() {
        // 12:00 +02:00 and 10:00 +00:00 are the same instant
        let a = Identity::new("A", "a@example.com", at(2, 12));
        let b = Identity::new("A", "a@example.com", at(0, 10));

        assert_eq!(a.when, b.when);
        assert_ne!(a, b);
    }

    #[test]
    fn git_time_round_trip_keeps_offset() {
        let when = FixedOffset::west_opt(5 * 3600 + 30 * 60)
            .unwrap()
            .with_ymd_and_hms(2021, 12, 31, 23, 59, 58)
            .unwrap();

        let back = time_to_datetime(datetime_to_time(&when)).unwrap();

        assert!(same_moment(&when, &back));
    }

    #[test]
    fn signature_round_trip() {
        let identity = Identity::new("Jane Doe", "jane@example.com", at(-7, 8));
        let signature = identity.to_signature().unwrap();

        assert_eq!(Identity::from_signature(&signature).unwrap(), identity);
    }
}
