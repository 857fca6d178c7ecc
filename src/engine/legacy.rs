use crate::model::{
    DEFAULT_PROPERTY_ID, LegacyBookingDraft, ReservationDraft, ReservationView,
};

use super::{Engine, EngineError};

impl LegacyBookingDraft {
    /// Lift the legacy four-field shape into a full draft: `check_in`/
    /// `check_out` become the stay dates, the property is pinned to the
    /// default, everything else takes the create defaults.
    pub fn into_draft(self) -> ReservationDraft {
        ReservationDraft {
            guest_name: self.guest_name,
            room_type: self.room_type,
            arrival_date: self.check_in,
            departure_date: self.check_out,
            property_id: Some(DEFAULT_PROPERTY_ID.to_string()),
            ..ReservationDraft::default()
        }
    }
}

/// The legacy booking surface shares the reservation engine: requests are
/// adapted on the way in, and responses pass through as the full
/// reservation shape, never a cut-down legacy one. List/get/delete need no
/// adaptation at all and the edge routes them straight to the reservation
/// operations.
impl Engine {
    pub async fn create_booking(
        &self,
        legacy: LegacyBookingDraft,
    ) -> Result<ReservationView, EngineError> {
        self.create_reservation(legacy.into_draft()).await
    }

    pub async fn update_booking(
        &self,
        id: &str,
        legacy: LegacyBookingDraft,
    ) -> Result<ReservationView, EngineError> {
        self.update_reservation(id, legacy.into_draft()).await
    }
}
