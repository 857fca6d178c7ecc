use chrono::Utc;
use serde_json::Value;

use crate::model::{AuditRecord, Outcome};
use crate::store::Sink;

/// Audit trail: one entry per operation outcome. Best-effort by design — a
/// sink failure is logged, counted, and swallowed; it must never change the
/// outcome of the operation being audited.
pub struct AuditTrail {
    sink: Box<dyn Sink<AuditRecord>>,
}

impl AuditTrail {
    pub fn new(sink: Box<dyn Sink<AuditRecord>>) -> Self {
        Self { sink }
    }

    pub fn record(
        &self,
        operation: &str,
        request: Value,
        response: Value,
        outcome: Outcome,
        status: u16,
    ) {
        let record = AuditRecord {
            operation: operation.to_string(),
            request,
            response,
            outcome,
            status,
            recorded_at: Utc::now(),
        };
        if let Err(e) = self.sink.append(record) {
            metrics::counter!(crate::observability::SINK_WRITE_FAILURES_TOTAL).increment(1);
            tracing::warn!("audit write failed: {e}");
        }
    }
}
