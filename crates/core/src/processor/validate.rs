//! Per-offence validation ahead of submission.

use crate::manifest::{EventRecord, OffenceRecord};
use crate::mapper::{parse_manifest_timestamp, ValidatedOffence};

use super::types::{EventKind, OffenceRejection};

/// Check an offence is complete enough to become a ticket.
///
/// Checks run in order: vehicle id, both events present, entrance timestamp,
/// exit timestamp. The first failure is reported.
pub fn validate_offence(record: &OffenceRecord) -> Result<ValidatedOffence, OffenceRejection> {
    let vrm = record
        .vrm
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(OffenceRejection::MissingVehicleId)?;

    let entrance = record
        .entrance
        .as_ref()
        .ok_or(OffenceRejection::MissingEvent(EventKind::Entrance))?;
    let exit = record
        .exit
        .as_ref()
        .ok_or(OffenceRejection::MissingEvent(EventKind::Exit))?;

    let entered_at = event_time(entrance, EventKind::Entrance)?;
    let exited_at = event_time(exit, EventKind::Exit)?;

    Ok(ValidatedOffence {
        index: record.index,
        vrm: vrm.to_string(),
        entered_at,
        exited_at,
        entrance: entrance.clone(),
        exit: exit.clone(),
    })
}

fn event_time(
    event: &EventRecord,
    kind: EventKind,
) -> Result<chrono::NaiveDateTime, OffenceRejection> {
    let raw = event.timestamp.as_deref().unwrap_or_default();
    parse_manifest_timestamp(raw).map_err(|_| OffenceRejection::BadTimestamp {
        event: kind,
        value: raw.to_string(),
    })
}
