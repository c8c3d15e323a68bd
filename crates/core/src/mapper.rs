//! Offence-to-ticket mapping.

use chrono::NaiveDateTime;

use crate::config::SiteConfig;
use crate::manifest::EventRecord;
use crate::ticketing::TicketFields;

/// Timestamp format used in manifests, e.g. `17/12/2025 00:55:06`.
pub const MANIFEST_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Timestamp format expected by the ticketing API.
pub const REMOTE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An offence that passed validation and can be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOffence {
    pub index: usize,
    pub vrm: String,
    pub entered_at: NaiveDateTime,
    pub exited_at: NaiveDateTime,
    pub entrance: EventRecord,
    pub exit: EventRecord,
}

pub fn parse_manifest_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), MANIFEST_TIME_FORMAT)
}

pub fn format_remote(at: &NaiveDateTime) -> String {
    at.format(REMOTE_TIME_FORMAT).to_string()
}

/// Build the ticket-creation fields for one offence.
///
/// The contravention happens at exit; the observation window spans entry to
/// exit. `issued_at` is the only input that is not derived from the offence.
pub fn map_offence(
    offence: &ValidatedOffence,
    site: &SiteConfig,
    issued_at: NaiveDateTime,
) -> TicketFields {
    let entry_time = format_remote(&offence.entered_at);
    let exit_time = format_remote(&offence.exited_at);

    TicketFields {
        enforcement_type: site.enforcement_type.clone(),
        ticket_type: site.ticket_type.clone(),
        site_code: site.site_code.clone(),
        contravention_datetime: exit_time.clone(),
        issued_datetime: format_remote(&issued_at),
        observed_from_datetime: entry_time,
        observed_to_datetime: exit_time,
        vrm: offence.vrm.clone(),
        primary_contravention: site.primary_contravention.clone(),
        badge_id: site.badge_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn site() -> SiteConfig {
        SiteConfig {
            site_code: "SITE01".to_string(),
            enforcement_type: "2".to_string(),
            ticket_type: "pcn".to_string(),
            badge_id: "B42".to_string(),
            primary_contravention: "87".to_string(),
        }
    }

    fn offence() -> ValidatedOffence {
        ValidatedOffence {
            index: 1,
            vrm: "AB12CDE".to_string(),
            entered_at: parse_manifest_timestamp("17/12/2025 00:55:06").unwrap(),
            exited_at: parse_manifest_timestamp("17/12/2025 01:10:00").unwrap(),
            entrance: EventRecord::default(),
            exit: EventRecord::default(),
        }
    }

    #[test]
    fn test_parse_manifest_timestamp() {
        let parsed = parse_manifest_timestamp(" 01/02/2026 13:04:05 ").unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(13, 4, 5)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_manifest_timestamp_rejects_other_formats() {
        assert!(parse_manifest_timestamp("2025-12-17 00:55:06").is_err());
        assert!(parse_manifest_timestamp("32/12/2025 00:55:06").is_err());
        assert!(parse_manifest_timestamp("17/12/2025").is_err());
    }

    #[test]
    fn test_map_offence_fields() {
        let issued = NaiveDate::from_ymd_opt(2025, 12, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let fields = map_offence(&offence(), &site(), issued);

        assert_eq!(fields.contravention_datetime, "2025-12-17 01:10:00");
        assert_eq!(fields.observed_from_datetime, "2025-12-17 00:55:06");
        assert_eq!(fields.observed_to_datetime, "2025-12-17 01:10:00");
        assert_eq!(fields.issued_datetime, "2025-12-18 09:00:00");
        assert_eq!(fields.vrm, "AB12CDE");
        assert_eq!(fields.primary_contravention, "87");
        assert_eq!(fields.site_code, "SITE01");
        assert_eq!(fields.ticket_type, "pcn");
        assert_eq!(fields.badge_id, "B42");
        assert_eq!(fields.enforcement_type, "2");
    }

    #[test]
    fn test_map_offence_is_deterministic_for_fixed_issue_time() {
        let issued = NaiveDate::from_ymd_opt(2025, 12, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            map_offence(&offence(), &site(), issued),
            map_offence(&offence(), &site(), issued)
        );
    }
}
