use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::StayRange;
use crate::store::Record;

/// Property every reservation lands on unless the caller says otherwise.
/// Legacy booking requests carry no property at all, so the adapter pins
/// them here too.
pub const DEFAULT_PROPERTY_ID: &str = "PROP1";
pub const DEFAULT_RATE_PLAN: &str = "RACK";
pub const DEFAULT_SOURCE_CODE: &str = "WEB";
pub const DEFAULT_MARKET_CODE: &str = "LEISURE";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Reservation lifecycle status. Wire names are exact and case-sensitive —
/// availability counting matches on the enum, never on a normalized string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Reserved,
    Booked,
    Guaranteed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl Status {
    /// Whether a reservation in this status consumes room inventory.
    ///
    /// `reserved` is the tentative case: it consumes only when the
    /// reservation is guaranteed, or when the caller asked to count
    /// tentatives. A guaranteed `reserved` always consumes, even with
    /// `include_tentative = false`.
    pub fn consumes_capacity(self, guaranteed: bool, include_tentative: bool) -> bool {
        match self {
            Status::Booked | Status::CheckedIn | Status::Guaranteed => true,
            Status::Reserved => guaranteed || include_tentative,
            Status::CheckedOut | Status::Cancelled => false,
        }
    }

    pub fn can_check_in(self) -> bool {
        matches!(self, Status::Reserved | Status::Booked | Status::Guaranteed)
    }

    pub fn can_check_out(self) -> bool {
        matches!(self, Status::CheckedIn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Reserved => "reserved",
            Status::Booked => "booked",
            Status::Guaranteed => "guaranteed",
            Status::CheckedIn => "checked_in",
            Status::CheckedOut => "checked_out",
            Status::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical stored reservation. One id internally; the `reservation_id`
/// alias exists only on [`ReservationView`] at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub profile_id: Option<String>,
    pub property_id: String,
    pub guest_name: String,
    pub room_type: String,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub rate_plan_code: String,
    pub source_code: String,
    pub market_code: String,
    pub guaranteed: bool,
    pub guarantee_type: Option<String>,
    pub currency: String,
    pub total_amount: f64,
    pub guest_count: u32,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn stay(&self) -> StayRange {
        StayRange {
            arrival: self.arrival_date,
            departure: self.departure_date,
        }
    }

    pub fn view(&self) -> ReservationView {
        ReservationView {
            reservation_id: self.id.clone(),
            record: self.clone(),
        }
    }
}

impl Record for Reservation {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Outbound reservation shape: the canonical record plus the legacy
/// `reservation_id` alias for callers still on the old field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationView {
    pub reservation_id: String,
    #[serde(flatten)]
    pub record: Reservation,
}

fn default_guaranteed() -> bool {
    true
}

/// Inbound create/update body. Dates arrive as strings so the date utility
/// owns their failure mode; everything defaultable is optional. An absent or
/// null `status` keeps the prior status on update (and defaults to
/// `reserved` on create). `guaranteed` defaults to true — an ordinary
/// booking holds its room; callers opt *in* to tentative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub profile_id: Option<String>,
    pub property_id: Option<String>,
    pub guest_name: String,
    pub room_type: String,
    pub arrival_date: String,
    pub departure_date: String,
    pub rate_plan_code: Option<String>,
    pub source_code: Option<String>,
    pub market_code: Option<String>,
    #[serde(default = "default_guaranteed")]
    pub guaranteed: bool,
    pub guarantee_type: Option<String>,
    pub currency: Option<String>,
    pub total_amount: Option<f64>,
    pub guest_count: Option<u32>,
    pub status: Option<Status>,
}

impl Default for ReservationDraft {
    fn default() -> Self {
        Self {
            profile_id: None,
            property_id: None,
            guest_name: String::new(),
            room_type: String::new(),
            arrival_date: String::new(),
            departure_date: String::new(),
            rate_plan_code: None,
            source_code: None,
            market_code: None,
            guaranteed: true,
            guarantee_type: None,
            currency: None,
            total_amount: None,
            guest_count: None,
            status: None,
        }
    }
}

/// The legacy four-field booking request. The compatibility adapter lifts
/// this into a full [`ReservationDraft`]; responses are always the full
/// reservation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyBookingDraft {
    pub guest_name: String,
    pub room_type: String,
    pub check_in: String,
    pub check_out: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// The canonical stored guest profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub profile_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name; derived from first/last when not given explicitly.
    pub name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    pub address: Option<Address>,
    pub loyalty_number: Option<String>,
    pub loyalty_level: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, Value>,
    #[serde(default)]
    pub vip_status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn view(&self, history: Option<Vec<HistoryEntry>>) -> ProfileView {
        ProfileView {
            profile_id: self.profile_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            name: self.name.clone(),
            emails: self.emails.clone(),
            phones: self.phones.clone(),
            address: self.address.clone(),
            loyalty_number: self.loyalty_number.clone(),
            loyalty_level: self.loyalty_level.clone(),
            language: self.language.clone(),
            preferences: self.preferences.clone(),
            vip_status: self.vip_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            reservation_history: history,
        }
    }
}

impl Record for Profile {
    fn key(&self) -> &str {
        &self.profile_id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub profile_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    pub address: Option<Address>,
    pub loyalty_number: Option<String>,
    pub loyalty_level: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, Value>,
    #[serde(default)]
    pub vip_status: bool,
}

/// Partial profile update: only fields present in the request are merged.
/// `preferences` is the exception — when supplied it replaces the stored
/// mapping wholesale, even when empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub emails: Option<Vec<String>>,
    pub phones: Option<Vec<String>>,
    pub address: Option<Address>,
    pub loyalty_number: Option<String>,
    pub loyalty_level: Option<String>,
    pub language: Option<String>,
    pub preferences: Option<BTreeMap<String, Value>>,
    pub vip_status: Option<bool>,
}

/// The public profile shape. Only this allow-list of fields ever leaves the
/// store; `reservation_history` is attached on single-profile reads.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub address: Option<Address>,
    pub loyalty_number: Option<String>,
    pub loyalty_level: Option<String>,
    pub language: Option<String>,
    pub preferences: BTreeMap<String, Value>,
    pub vip_status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_history: Option<Vec<HistoryEntry>>,
}

/// Fixed field subset exposed per reservation in a profile's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub reservation_id: String,
    pub property_id: String,
    pub room_type: String,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub status: Status,
    pub total_amount: f64,
    pub currency: String,
}

impl HistoryEntry {
    pub fn from_reservation(r: &Reservation) -> Self {
        Self {
            reservation_id: r.id.clone(),
            property_id: r.property_id.clone(),
            room_type: r.room_type.clone(),
            arrival_date: r.arrival_date,
            departure_date: r.departure_date,
            status: r.status,
            total_amount: r.total_amount,
            currency: r.currency.clone(),
        }
    }
}

/// Acknowledgment returned by delete operations.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionAck {
    pub status: &'static str,
    pub id: String,
    pub deleted_at: DateTime<Utc>,
}

/// Message-plus-record shape returned by check-in/check-out.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionReceipt {
    pub message: String,
    pub reservation: ReservationView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// One audit-trail entry: a snapshot of an operation's request, response,
/// outcome, and HTTP-equivalent status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub operation: String,
    pub request: Value,
    pub response: Value,
    pub outcome: Outcome,
    pub status: u16,
    pub recorded_at: DateTime<Utc>,
}

/// One event-sink entry: event name plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEvent {
    pub event: String,
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_are_snake_case() {
        assert_eq!(serde_json::to_value(Status::CheckedIn).unwrap(), "checked_in");
        assert_eq!(
            serde_json::from_value::<Status>("reserved".into()).unwrap(),
            Status::Reserved
        );
        // Case-sensitive: the capitalized form is not a status.
        assert!(serde_json::from_value::<Status>("Reserved".into()).is_err());
    }

    #[test]
    fn capacity_consumption_by_status() {
        for status in [Status::Booked, Status::CheckedIn, Status::Guaranteed] {
            assert!(status.consumes_capacity(false, false), "{status} always consumes");
        }
        for status in [Status::CheckedOut, Status::Cancelled] {
            assert!(!status.consumes_capacity(true, true), "{status} never consumes");
        }
        // The tentative distinction lives entirely on `reserved`.
        assert!(Status::Reserved.consumes_capacity(true, false));
        assert!(Status::Reserved.consumes_capacity(false, true));
        assert!(!Status::Reserved.consumes_capacity(false, false));
    }

    #[test]
    fn transition_guards() {
        assert!(Status::Reserved.can_check_in());
        assert!(Status::Booked.can_check_in());
        assert!(Status::Guaranteed.can_check_in());
        assert!(!Status::CheckedIn.can_check_in());
        assert!(!Status::CheckedOut.can_check_in());
        assert!(Status::CheckedIn.can_check_out());
        assert!(!Status::Reserved.can_check_out());
    }

    #[test]
    fn view_exposes_both_id_aliases() {
        let now = Utc::now();
        let r = Reservation {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            profile_id: None,
            property_id: DEFAULT_PROPERTY_ID.into(),
            guest_name: "Alice".into(),
            room_type: "single".into(),
            arrival_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            departure_date: NaiveDate::from_ymd_opt(2025, 12, 3).unwrap(),
            rate_plan_code: DEFAULT_RATE_PLAN.into(),
            source_code: DEFAULT_SOURCE_CODE.into(),
            market_code: DEFAULT_MARKET_CODE.into(),
            guaranteed: true,
            guarantee_type: None,
            currency: DEFAULT_CURRENCY.into(),
            total_amount: 0.0,
            guest_count: 1,
            status: Status::Reserved,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(r.view()).unwrap();
        assert_eq!(json["id"], json["reservation_id"]);
        assert_eq!(json["id"], "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(json["arrival_date"], "2025-12-01");
    }

    #[test]
    fn draft_guaranteed_defaults_true() {
        let draft: ReservationDraft = serde_json::from_value(serde_json::json!({
            "guest_name": "Bob",
            "room_type": "single",
            "arrival_date": "2025-12-05",
            "departure_date": "2025-12-07",
        }))
        .unwrap();
        assert!(draft.guaranteed);
        assert!(draft.status.is_none());
    }

    #[test]
    fn patch_distinguishes_absent_from_empty_preferences() {
        let absent: ProfilePatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(absent.preferences.is_none());

        let empty: ProfilePatch =
            serde_json::from_value(serde_json::json!({ "preferences": {} })).unwrap();
        assert_eq!(empty.preferences, Some(BTreeMap::new()));
    }
}
