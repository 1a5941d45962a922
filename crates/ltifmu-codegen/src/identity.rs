//! Per-build identity shared by the compiled source and the descriptor.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::error::{CodegenError, Result};

/// Identifier, GUID and generation time of one build.
///
/// A host checks that the identifier and GUID in the descriptor match the
/// ones compiled into the binary before it accepts the unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    identifier: String,
    guid: Uuid,
    generated_at: SystemTime,
}

impl BuildIdentity {
    /// Mint a fresh identity for `identifier`.
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        Self::with_guid(identifier, Uuid::new_v4(), SystemTime::now())
    }

    /// Build an identity from explicit parts.
    pub fn with_guid(
        identifier: impl Into<String>,
        guid: Uuid,
        generated_at: SystemTime,
    ) -> Result<Self> {
        let identifier = identifier.into();
        if !is_c_identifier(&identifier) {
            return Err(CodegenError::InvalidIdentifier { identifier });
        }
        Ok(Self {
            identifier,
            guid,
            generated_at,
        })
    }

    /// Symbol prefix and archive base name.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn guid(&self) -> Uuid {
        self.guid
    }

    pub fn generated_at(&self) -> SystemTime {
        self.generated_at
    }

    /// Generation time formatted as an XML Schema `dateTime` in UTC.
    pub fn timestamp_string(&self) -> String {
        iso8601(self.generated_at)
    }
}

/// Format `time` as `YYYY-MM-DDTHH:MM:SSZ`, clamping times before the epoch.
fn iso8601(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let days = secs / 86_400;
    let day_secs = secs % 86_400;

    let mut year = 1970u64;
    let mut remaining = days;
    loop {
        let year_days = if is_leap(year) { 366 } else { 365 };
        if remaining < year_days {
            break;
        }
        remaining -= year_days;
        year += 1;
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let month_days = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 0;
    while month < 11 && remaining >= month_days[month] {
        remaining -= month_days[month];
        month += 1;
    }

    format!(
        "{year:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        month + 1,
        remaining + 1,
        day_secs / 3600,
        day_secs % 3600 / 60,
        day_secs % 60,
    )
}

fn is_leap(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Whether `s` is usable as a C identifier.
pub fn is_c_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn identifier_rules() {
        assert!(is_c_identifier("model"));
        assert!(is_c_identifier("_pid2"));
        assert!(!is_c_identifier(""));
        assert!(!is_c_identifier("2fast"));
        assert!(!is_c_identifier("my-model"));
        assert!(!is_c_identifier("caf\u{e9}"));
    }

    #[test]
    fn rejects_invalid_identifier() {
        assert_eq!(
            BuildIdentity::new("bad name").unwrap_err(),
            CodegenError::InvalidIdentifier {
                identifier: "bad name".into()
            }
        );
    }

    #[test]
    fn fresh_identities_differ() {
        let a = BuildIdentity::new("m").unwrap();
        let b = BuildIdentity::new("m").unwrap();
        assert_ne!(a.guid(), b.guid());
    }

    #[test]
    fn timestamp_format() {
        let at = |secs| UNIX_EPOCH + Duration::from_secs(secs);
        let id = BuildIdentity::with_guid("m", Uuid::nil(), at(1_709_622_489)).unwrap();
        assert_eq!(id.timestamp_string(), "2024-03-05T07:08:09Z");

        assert_eq!(iso8601(UNIX_EPOCH), "1970-01-01T00:00:00Z");
        assert_eq!(iso8601(at(951_868_799)), "2000-02-29T23:59:59Z");
        assert_eq!(iso8601(at(1_704_067_199)), "2023-12-31T23:59:59Z");
    }
}
