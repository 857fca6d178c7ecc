mod availability;
mod error;
mod legacy;
mod profiles;
mod reservations;

pub use availability::{compute_availability, overlapping_count, room_is_available};
pub use error::EngineError;

use std::io;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::audit::AuditTrail;
use crate::inventory::RoomInventory;
use crate::model::{AuditRecord, OperationEvent, Outcome, Profile, Reservation};
use crate::notify::NotifyHub;
use crate::store::{JsonSink, JsonStore, MemSink, MemStore, Store};

pub type SharedStore<T> = Arc<RwLock<Box<dyn Store<T>>>>;

/// The reservation/profile engine: owns the stores, the inventory table,
/// and the side channels. Each mutating operation serializes through its
/// store's write guard, held across the whole check-then-write sequence, so
/// an availability check can never race a competing write.
pub struct Engine {
    pub inventory: RoomInventory,
    pub(super) reservations: SharedStore<Reservation>,
    pub(super) profiles: SharedStore<Profile>,
    pub(super) audit: AuditTrail,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    pub fn new(
        inventory: RoomInventory,
        reservations: Box<dyn Store<Reservation>>,
        profiles: Box<dyn Store<Profile>>,
        audit: AuditTrail,
        notify: Arc<NotifyHub>,
    ) -> Self {
        Self {
            inventory,
            reservations: Arc::new(RwLock::new(reservations)),
            profiles: Arc::new(RwLock::new(profiles)),
            audit,
            notify,
        }
    }

    /// Wire every durable collection under `data_dir`: the two mirrored
    /// stores plus the audit-trail and event-sink files.
    pub fn open(data_dir: &Path) -> io::Result<Self> {
        let reservations: JsonStore<Reservation> =
            JsonStore::open(data_dir.join("reservations.json"))?;
        let profiles: JsonStore<Profile> = JsonStore::open(data_dir.join("profiles.json"))?;
        let audit_sink: JsonSink<AuditRecord> = JsonSink::open(data_dir.join("audit-log.json"))?;
        let event_sink: JsonSink<OperationEvent> = JsonSink::open(data_dir.join("events.json"))?;
        let audit = AuditTrail::new(Box::new(audit_sink));
        let notify = Arc::new(NotifyHub::new(Some(Box::new(event_sink))));
        Ok(Self::new(
            RoomInventory::standard(),
            Box::new(reservations),
            Box::new(profiles),
            audit,
            notify,
        ))
    }

    /// Pure in-memory engine for tests: MemStore-backed, sinks discarded.
    pub fn in_memory(inventory: RoomInventory) -> Self {
        let audit_sink: MemSink<AuditRecord> = MemSink::new();
        let event_sink: MemSink<OperationEvent> = MemSink::new();
        Self::new(
            inventory,
            Box::new(MemStore::new()),
            Box::new(MemStore::new()),
            AuditTrail::new(Box::new(audit_sink)),
            Arc::new(NotifyHub::new(Some(Box::new(event_sink)))),
        )
    }

    pub(super) fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Audit + event + metrics for a successful state change.
    pub(super) fn record_success(
        &self,
        operation: &'static str,
        stream: &'static str,
        status: u16,
        request: Value,
        response: Value,
        event: &str,
    ) {
        metrics::counter!(
            crate::observability::OPERATIONS_TOTAL,
            "operation" => operation,
            "outcome" => "success"
        )
        .increment(1);
        self.audit
            .record(operation, request, response.clone(), Outcome::Success, status);
        self.notify.emit(
            stream,
            crate::model::OperationEvent {
                event: event.to_string(),
                payload: response,
            },
        );
    }

    /// Audit + metrics for any failure; state-changing operations also emit
    /// their `*_failed` event. Runs before the error is returned.
    pub(super) fn record_failure(
        &self,
        operation: &'static str,
        stream: &'static str,
        request: Value,
        err: &EngineError,
        event: Option<&str>,
    ) {
        metrics::counter!(
            crate::observability::OPERATIONS_TOTAL,
            "operation" => operation,
            "outcome" => "failure"
        )
        .increment(1);
        self.audit.record(
            operation,
            request.clone(),
            json!({ "error": err.to_string() }),
            Outcome::Failure,
            err.status_code(),
        );
        if let Some(event) = event {
            self.notify.emit(
                stream,
                crate::model::OperationEvent {
                    event: event.to_string(),
                    payload: json!({ "error": err.to_string(), "request": request }),
                },
            );
        }
    }
}
