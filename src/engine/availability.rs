use std::collections::BTreeMap;

use crate::dates::StayRange;
use crate::inventory::RoomInventory;
use crate::model::Reservation;

// ── Availability Algorithm ────────────────────────────────────────

/// Count reservations of `room_type` that consume inventory within `range`.
///
/// A reservation counts when its status consumes capacity (see
/// [`crate::model::Status::consumes_capacity`]) and its half-open stay
/// overlaps the query range. `exclude_id` drops one reservation from the
/// count — used when re-checking capacity for an update-in-place.
pub fn overlapping_count(
    records: &[Reservation],
    room_type: &str,
    range: &StayRange,
    exclude_id: Option<&str>,
    include_tentative: bool,
) -> u32 {
    records
        .iter()
        .filter(|r| r.room_type == room_type)
        .filter(|r| exclude_id.is_none_or(|id| r.id != id))
        .filter(|r| r.status.consumes_capacity(r.guaranteed, include_tentative))
        .filter(|r| r.stay().overlaps(range))
        .count() as u32
}

/// True iff at least one room of `room_type` is free over `range`.
/// An unknown room type has no inventory and is never available.
pub fn room_is_available(
    records: &[Reservation],
    inventory: &RoomInventory,
    room_type: &str,
    range: &StayRange,
    exclude_id: Option<&str>,
    include_tentative: bool,
) -> bool {
    let Some(total) = inventory.total(room_type) else {
        return false;
    };
    overlapping_count(records, room_type, range, exclude_id, include_tentative) < total
}

/// Free-room count per room type over `range`. Free is clamped at zero:
/// an oversold collection (e.g. hand-edited storage) reports 0, never a
/// negative count.
pub fn compute_availability(
    records: &[Reservation],
    inventory: &RoomInventory,
    range: &StayRange,
    include_tentative: bool,
) -> BTreeMap<String, u32> {
    inventory
        .iter()
        .map(|(room_type, total)| {
            let booked = overlapping_count(records, room_type, range, None, include_tentative);
            (room_type.to_string(), total.saturating_sub(booked))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use chrono::{NaiveDate, Utc};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(arrival: &str, departure: &str) -> StayRange {
        StayRange::query(d(arrival), d(departure)).unwrap()
    }

    fn reservation(id: &str, room: &str, arrival: &str, departure: &str) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: id.into(),
            profile_id: None,
            property_id: "PROP1".into(),
            guest_name: "Guest".into(),
            room_type: room.into(),
            arrival_date: d(arrival),
            departure_date: d(departure),
            rate_plan_code: "RACK".into(),
            source_code: "WEB".into(),
            market_code: "LEISURE".into(),
            guaranteed: true,
            guarantee_type: None,
            currency: "USD".into(),
            total_amount: 0.0,
            guest_count: 1,
            status: Status::Reserved,
            created_at: now,
            updated_at: now,
        }
    }

    fn with_status(mut r: Reservation, status: Status, guaranteed: bool) -> Reservation {
        r.status = status;
        r.guaranteed = guaranteed;
        r
    }

    #[test]
    fn counts_only_matching_room_type() {
        let records = vec![
            reservation("a", "single", "2025-12-01", "2025-12-03"),
            reservation("b", "double", "2025-12-01", "2025-12-03"),
        ];
        let q = range("2025-12-01", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, false), 1);
        assert_eq!(overlapping_count(&records, "suite", &q, None, false), 0);
    }

    #[test]
    fn back_to_back_does_not_count() {
        let records = vec![reservation("a", "single", "2025-12-01", "2025-12-03")];
        assert_eq!(
            overlapping_count(&records, "single", &range("2025-12-03", "2025-12-05"), None, false),
            0
        );
        assert_eq!(
            overlapping_count(&records, "single", &range("2025-12-02", "2025-12-04"), None, false),
            1
        );
    }

    #[test]
    fn exclusion_drops_one_reservation() {
        let records = vec![
            reservation("a", "single", "2025-12-01", "2025-12-03"),
            reservation("b", "single", "2025-12-01", "2025-12-03"),
        ];
        let q = range("2025-12-01", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, false), 2);
        assert_eq!(overlapping_count(&records, "single", &q, Some("a"), false), 1);
    }

    #[test]
    fn tentative_counts_only_on_request() {
        let tentative = with_status(
            reservation("a", "single", "2025-12-01", "2025-12-03"),
            Status::Reserved,
            false,
        );
        let records = vec![tentative];
        let q = range("2025-12-01", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, false), 0);
        assert_eq!(overlapping_count(&records, "single", &q, None, true), 1);
    }

    #[test]
    fn guaranteed_reserved_always_counts() {
        // reserved + guaranteed=true consumes even when tentatives are off.
        let records = vec![reservation("a", "single", "2025-12-01", "2025-12-03")];
        let q = range("2025-12-01", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, false), 1);
    }

    #[test]
    fn terminal_statuses_never_count() {
        let records = vec![
            with_status(reservation("a", "single", "2025-12-01", "2025-12-03"), Status::CheckedOut, true),
            with_status(reservation("b", "single", "2025-12-01", "2025-12-03"), Status::Cancelled, true),
        ];
        let q = range("2025-12-01", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, true), 0);
    }

    #[test]
    fn checked_in_still_occupies() {
        let records = vec![with_status(
            reservation("a", "single", "2025-12-01", "2025-12-03"),
            Status::CheckedIn,
            false,
        )];
        let q = range("2025-12-02", "2025-12-03");
        assert_eq!(overlapping_count(&records, "single", &q, None, false), 1);
    }

    #[test]
    fn availability_when_type_is_full() {
        let inv = RoomInventory::standard();
        let records: Vec<Reservation> = (0..2)
            .map(|i| reservation(&format!("s{i}"), "suite", "2025-12-01", "2025-12-03"))
            .collect();
        let q = range("2025-12-01", "2025-12-03");
        assert!(!room_is_available(&records, &inv, "suite", &q, None, false));
        // Excluding one of the two frees a slot.
        assert!(room_is_available(&records, &inv, "suite", &q, Some("s0"), false));
    }

    #[test]
    fn unknown_room_type_is_never_available() {
        let inv = RoomInventory::standard();
        let q = range("2025-12-01", "2025-12-03");
        assert!(!room_is_available(&[], &inv, "penthouse", &q, None, false));
    }

    #[test]
    fn free_counts_per_type() {
        let inv = RoomInventory::standard();
        let records = vec![
            reservation("a", "single", "2025-12-01", "2025-12-03"),
            reservation("b", "single", "2025-12-02", "2025-12-04"),
            reservation("c", "double", "2025-12-01", "2025-12-02"),
        ];
        let free = compute_availability(&records, &inv, &range("2025-12-01", "2025-12-03"), false);
        assert_eq!(free["single"], 3);
        assert_eq!(free["double"], 2);
        assert_eq!(free["suite"], 2);
    }

    #[test]
    fn free_count_never_negative() {
        // More consuming reservations than the type has rooms (a hand-edited
        // store could contain this) clamps at zero.
        let inv = RoomInventory::standard();
        let records: Vec<Reservation> = (0..4)
            .map(|i| reservation(&format!("s{i}"), "suite", "2025-12-01", "2025-12-03"))
            .collect();
        let free = compute_availability(&records, &inv, &range("2025-12-01", "2025-12-03"), false);
        assert_eq!(free["suite"], 0);
    }

    #[test]
    fn zero_width_range_is_well_defined() {
        let inv = RoomInventory::standard();
        let records = vec![
            // Strictly spans the query day — occupies.
            reservation("a", "single", "2025-12-04", "2025-12-06"),
            // Arrives on the query day — does not overlap [d, d).
            reservation("b", "single", "2025-12-05", "2025-12-07"),
        ];
        let free = compute_availability(&records, &inv, &range("2025-12-05", "2025-12-05"), false);
        assert_eq!(free["single"], 4);
    }
}
