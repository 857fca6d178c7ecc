use std::collections::BTreeMap;

use serde_json::{Value, json};
use ulid::Ulid;

use crate::dates::{StayRange, parse_date};
use crate::model::*;
use crate::notify::STREAM_RESERVATIONS;

use super::availability::{compute_availability, room_is_available};
use super::{Engine, EngineError};

impl Engine {
    /// Shared create/update validation. Shape errors (malformed dates,
    /// zero-night stays, unknown room types, empty parties) fail here,
    /// before any capacity work.
    fn validate_draft(&self, draft: &ReservationDraft) -> Result<StayRange, EngineError> {
        let arrival = parse_date("arrival_date", &draft.arrival_date)?;
        let departure = parse_date("departure_date", &draft.departure_date)?;
        let stay = StayRange::new(arrival, departure)?;
        if !self.inventory.contains(&draft.room_type) {
            return Err(EngineError::Validation(format!(
                "unknown room_type {:?}",
                draft.room_type
            )));
        }
        if draft.guest_count == Some(0) {
            return Err(EngineError::Validation("guest_count must be at least 1".into()));
        }
        Ok(stay)
    }

    // ── Availability query ───────────────────────────────────

    /// Free-room counts per type over the given window; both dates default
    /// to today, so the bare query is the zero-width `[today, today)`.
    pub async fn availability(
        &self,
        check_in: Option<&str>,
        check_out: Option<&str>,
        include_tentatives: bool,
    ) -> Result<BTreeMap<String, u32>, EngineError> {
        let request = json!({
            "check_in": check_in,
            "check_out": check_out,
            "include_tentatives": include_tentatives,
        });
        let result = self
            .availability_inner(check_in, check_out, include_tentatives)
            .await;
        match &result {
            Ok(rooms) => self.audit.record(
                "availability",
                request,
                json!({ "rooms_available": rooms }),
                Outcome::Success,
                200,
            ),
            Err(err) => self.record_failure("availability", STREAM_RESERVATIONS, request, err, None),
        }
        result
    }

    async fn availability_inner(
        &self,
        check_in: Option<&str>,
        check_out: Option<&str>,
        include_tentatives: bool,
    ) -> Result<BTreeMap<String, u32>, EngineError> {
        let today = Self::now().date_naive();
        let arrival = match check_in {
            Some(s) => parse_date("check_in", s)?,
            None => today,
        };
        let departure = match check_out {
            Some(s) => parse_date("check_out", s)?,
            None => today,
        };
        let range = StayRange::query(arrival, departure)?;
        let store = self.reservations.read().await;
        Ok(compute_availability(
            store.list(),
            &self.inventory,
            &range,
            include_tentatives,
        ))
    }

    // ── Reads ────────────────────────────────────────────────

    pub async fn list_reservations(&self) -> Vec<ReservationView> {
        let store = self.reservations.read().await;
        store.list().iter().map(Reservation::view).collect()
    }

    /// Lookup by id. Both exposed aliases (`id`, `reservation_id`) carry the
    /// canonical value, so either one resolves here.
    pub async fn get_reservation(&self, id: &str) -> Result<ReservationView, EngineError> {
        let store = self.reservations.read().await;
        store
            .get(id)
            .map(Reservation::view)
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))
    }

    // ── Create ───────────────────────────────────────────────

    pub async fn create_reservation(
        &self,
        draft: ReservationDraft,
    ) -> Result<ReservationView, EngineError> {
        let request = serde_json::to_value(&draft).unwrap_or(Value::Null);
        let result = self.create_inner(draft).await;
        match &result {
            Ok(view) => self.record_success(
                "create_reservation",
                STREAM_RESERVATIONS,
                201,
                request,
                serde_json::to_value(view).unwrap_or(Value::Null),
                "reservation_created",
            ),
            Err(err) => self.record_failure(
                "create_reservation",
                STREAM_RESERVATIONS,
                request,
                err,
                Some("reservation_create_failed"),
            ),
        }
        result
    }

    async fn create_inner(&self, draft: ReservationDraft) -> Result<ReservationView, EngineError> {
        let stay = self.validate_draft(&draft)?;

        // Write guard held from the capacity check through the mirrored put:
        // two creates racing for the last room cannot both pass the check.
        let mut store = self.reservations.write().await;
        if !room_is_available(store.list(), &self.inventory, &draft.room_type, &stay, None, false) {
            return Err(EngineError::Conflict(format!(
                "no {} rooms available from {} to {}",
                draft.room_type, stay.arrival, stay.departure
            )));
        }

        let now = Self::now();
        let record = Reservation {
            id: Ulid::new().to_string(),
            profile_id: draft.profile_id,
            property_id: draft.property_id.unwrap_or_else(|| DEFAULT_PROPERTY_ID.into()),
            guest_name: draft.guest_name,
            room_type: draft.room_type,
            arrival_date: stay.arrival,
            departure_date: stay.departure,
            rate_plan_code: draft.rate_plan_code.unwrap_or_else(|| DEFAULT_RATE_PLAN.into()),
            source_code: draft.source_code.unwrap_or_else(|| DEFAULT_SOURCE_CODE.into()),
            market_code: draft.market_code.unwrap_or_else(|| DEFAULT_MARKET_CODE.into()),
            guaranteed: draft.guaranteed,
            guarantee_type: draft.guarantee_type,
            currency: draft.currency.unwrap_or_else(|| DEFAULT_CURRENCY.into()),
            total_amount: draft.total_amount.unwrap_or(0.0),
            guest_count: draft.guest_count.unwrap_or(1),
            status: draft.status.unwrap_or(Status::Reserved),
            created_at: now,
            updated_at: now,
        };
        let view = record.view();
        store.put(record).map_err(EngineError::storage)?;
        Ok(view)
    }

    // ── Update ───────────────────────────────────────────────

    pub async fn update_reservation(
        &self,
        id: &str,
        draft: ReservationDraft,
    ) -> Result<ReservationView, EngineError> {
        let request = serde_json::to_value(&draft).unwrap_or(Value::Null);
        let result = self.update_inner(id, draft).await;
        match &result {
            Ok(view) => self.record_success(
                "update_reservation",
                STREAM_RESERVATIONS,
                200,
                request,
                serde_json::to_value(view).unwrap_or(Value::Null),
                "reservation_updated",
            ),
            Err(err) => self.record_failure(
                "update_reservation",
                STREAM_RESERVATIONS,
                request,
                err,
                Some("reservation_update_failed"),
            ),
        }
        result
    }

    async fn update_inner(
        &self,
        id: &str,
        draft: ReservationDraft,
    ) -> Result<ReservationView, EngineError> {
        let stay = self.validate_draft(&draft)?;

        let mut store = self.reservations.write().await;
        let existing = store
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))?;

        // Re-check capacity with this reservation excluded, so moving within
        // (or out of) its own fully-booked window is legal.
        if !room_is_available(
            store.list(),
            &self.inventory,
            &draft.room_type,
            &stay,
            Some(&existing.id),
            false,
        ) {
            return Err(EngineError::Conflict(format!(
                "no {} rooms available from {} to {}",
                draft.room_type, stay.arrival, stay.departure
            )));
        }

        let record = Reservation {
            id: existing.id,
            profile_id: draft.profile_id,
            property_id: draft.property_id.unwrap_or_else(|| DEFAULT_PROPERTY_ID.into()),
            guest_name: draft.guest_name,
            room_type: draft.room_type,
            arrival_date: stay.arrival,
            departure_date: stay.departure,
            rate_plan_code: draft.rate_plan_code.unwrap_or_else(|| DEFAULT_RATE_PLAN.into()),
            source_code: draft.source_code.unwrap_or_else(|| DEFAULT_SOURCE_CODE.into()),
            market_code: draft.market_code.unwrap_or_else(|| DEFAULT_MARKET_CODE.into()),
            guaranteed: draft.guaranteed,
            guarantee_type: draft.guarantee_type,
            currency: draft.currency.unwrap_or_else(|| DEFAULT_CURRENCY.into()),
            total_amount: draft.total_amount.unwrap_or(0.0),
            guest_count: draft.guest_count.unwrap_or(1),
            // Absent (or null) status keeps the prior one, never clears it.
            status: draft.status.unwrap_or(existing.status),
            created_at: existing.created_at,
            updated_at: Self::now(),
        };
        let view = record.view();
        store.put(record).map_err(EngineError::storage)?;
        Ok(view)
    }

    // ── Delete ───────────────────────────────────────────────

    /// Terminal removal, callable from any status. No soft delete: the
    /// record leaves the store entirely.
    pub async fn delete_reservation(&self, id: &str) -> Result<DeletionAck, EngineError> {
        let request = json!({ "id": id });
        let result = self.delete_inner(id).await;
        match &result {
            Ok((ack, removed)) => self.record_success(
                "delete_reservation",
                STREAM_RESERVATIONS,
                200,
                request,
                json!({
                    "reservation": serde_json::to_value(removed.view()).unwrap_or(Value::Null),
                    "deleted_at": ack.deleted_at,
                }),
                "reservation_deleted",
            ),
            Err(err) => self.record_failure(
                "delete_reservation",
                STREAM_RESERVATIONS,
                request,
                err,
                Some("reservation_delete_failed"),
            ),
        }
        result.map(|(ack, _)| ack)
    }

    async fn delete_inner(&self, id: &str) -> Result<(DeletionAck, Reservation), EngineError> {
        let mut store = self.reservations.write().await;
        let removed = store
            .delete(id)
            .map_err(EngineError::storage)?
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))?;
        let ack = DeletionAck {
            status: "deleted",
            id: removed.id.clone(),
            deleted_at: Self::now(),
        };
        Ok((ack, removed))
    }

    // ── Check-in / check-out ─────────────────────────────────

    pub async fn check_in(&self, id: &str) -> Result<TransitionReceipt, EngineError> {
        let request = json!({ "id": id });
        let result = self.transition_inner(id, Status::CheckedIn).await;
        match &result {
            Ok(receipt) => self.record_success(
                "check_in",
                STREAM_RESERVATIONS,
                200,
                request,
                serde_json::to_value(receipt).unwrap_or(Value::Null),
                "reservation_checked_in",
            ),
            Err(err) => self.record_failure(
                "check_in",
                STREAM_RESERVATIONS,
                request,
                err,
                Some("reservation_checkin_failed"),
            ),
        }
        result
    }

    pub async fn check_out(&self, id: &str) -> Result<TransitionReceipt, EngineError> {
        let request = json!({ "id": id });
        let result = self.transition_inner(id, Status::CheckedOut).await;
        match &result {
            Ok(receipt) => self.record_success(
                "check_out",
                STREAM_RESERVATIONS,
                200,
                request,
                serde_json::to_value(receipt).unwrap_or(Value::Null),
                "reservation_checked_out",
            ),
            Err(err) => self.record_failure(
                "check_out",
                STREAM_RESERVATIONS,
                request,
                err,
                Some("reservation_checkout_failed"),
            ),
        }
        result
    }

    async fn transition_inner(
        &self,
        id: &str,
        target: Status,
    ) -> Result<TransitionReceipt, EngineError> {
        let mut store = self.reservations.write().await;
        let mut record = store
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))?;

        let (allowed, verb, done) = match target {
            Status::CheckedIn => (record.status.can_check_in(), "check in", "checked in"),
            Status::CheckedOut => (record.status.can_check_out(), "check out", "checked out"),
            other => {
                return Err(EngineError::InvalidState(format!(
                    "{other} is not a transition target"
                )));
            }
        };
        if !allowed {
            return Err(EngineError::InvalidState(format!(
                "cannot {verb} reservation {id} from status {}",
                record.status
            )));
        }

        record.status = target;
        record.updated_at = Self::now();
        let view = record.view();
        let message = format!("{} {}", view.record.guest_name, done);
        store.put(record).map_err(EngineError::storage)?;
        Ok(TransitionReceipt {
            message,
            reservation: view,
        })
    }
}
