use serde_json::{Value, json};
use ulid::Ulid;

use crate::model::*;
use crate::notify::STREAM_PROFILES;

use super::{Engine, EngineError};

/// Display name: an explicit name wins; otherwise it is derived from the
/// given name parts, so it is non-empty whenever first/last is present.
fn display_name(explicit: Option<&str>, first: Option<&str>, last: Option<&str>) -> String {
    if let Some(name) = explicit
        && !name.trim().is_empty() {
            return name.to_string();
        }
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect();
    parts.join(" ")
}

impl Engine {
    // ── Reads ────────────────────────────────────────────────

    pub async fn list_profiles(&self) -> Vec<ProfileView> {
        let store = self.profiles.read().await;
        store.list().iter().map(|p| p.view(None)).collect()
    }

    /// Single-profile read: the public view plus the reservation history,
    /// joined from the reservation store on `profile_id`.
    pub async fn get_profile(&self, id: &str) -> Result<ProfileView, EngineError> {
        let store = self.profiles.read().await;
        let profile = store
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("profile {id}")))?;
        drop(store);

        let reservations = self.reservations.read().await;
        let history: Vec<HistoryEntry> = reservations
            .list()
            .iter()
            .filter(|r| r.profile_id.as_deref() == Some(id))
            .map(HistoryEntry::from_reservation)
            .collect();
        Ok(profile.view(Some(history)))
    }

    // ── Create ───────────────────────────────────────────────

    pub async fn create_profile(&self, draft: ProfileDraft) -> Result<ProfileView, EngineError> {
        let request = serde_json::to_value(&draft).unwrap_or(Value::Null);
        let result = self.create_profile_inner(draft).await;
        match &result {
            Ok(view) => self.record_success(
                "create_profile",
                STREAM_PROFILES,
                201,
                request,
                serde_json::to_value(view).unwrap_or(Value::Null),
                "profile_created",
            ),
            Err(err) => self.record_failure(
                "create_profile",
                STREAM_PROFILES,
                request,
                err,
                Some("profile_create_failed"),
            ),
        }
        result
    }

    async fn create_profile_inner(&self, draft: ProfileDraft) -> Result<ProfileView, EngineError> {
        let mut store = self.profiles.write().await;
        if let Some(id) = &draft.profile_id
            && store.get(id).is_some() {
                return Err(EngineError::Conflict(format!("profile {id} already exists")));
            }

        let now = Self::now();
        let name = display_name(
            draft.name.as_deref(),
            draft.first_name.as_deref(),
            draft.last_name.as_deref(),
        );
        let profile = Profile {
            profile_id: draft.profile_id.unwrap_or_else(|| Ulid::new().to_string()),
            first_name: draft.first_name,
            last_name: draft.last_name,
            name,
            emails: draft.emails,
            phones: draft.phones,
            address: draft.address,
            loyalty_number: draft.loyalty_number,
            loyalty_level: draft.loyalty_level,
            language: draft.language,
            preferences: draft.preferences,
            vip_status: draft.vip_status,
            created_at: now,
            updated_at: now,
        };
        let view = profile.view(None);
        store.put(profile).map_err(EngineError::storage)?;
        Ok(view)
    }

    // ── Update ───────────────────────────────────────────────

    pub async fn update_profile(
        &self,
        id: &str,
        patch: ProfilePatch,
    ) -> Result<ProfileView, EngineError> {
        let request = serde_json::to_value(&patch).unwrap_or(Value::Null);
        let result = self.update_profile_inner(id, patch).await;
        match &result {
            Ok(view) => self.record_success(
                "update_profile",
                STREAM_PROFILES,
                200,
                request,
                serde_json::to_value(view).unwrap_or(Value::Null),
                "profile_updated",
            ),
            Err(err) => self.record_failure(
                "update_profile",
                STREAM_PROFILES,
                request,
                err,
                Some("profile_update_failed"),
            ),
        }
        result
    }

    async fn update_profile_inner(
        &self,
        id: &str,
        patch: ProfilePatch,
    ) -> Result<ProfileView, EngineError> {
        let mut store = self.profiles.write().await;
        let mut profile = store
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("profile {id}")))?;

        // Merge only what the request carries; untouched fields stay as-is.
        let name_changed =
            patch.name.is_some() || patch.first_name.is_some() || patch.last_name.is_some();
        if let Some(v) = patch.first_name {
            profile.first_name = Some(v);
        }
        if let Some(v) = patch.last_name {
            profile.last_name = Some(v);
        }
        if name_changed {
            profile.name = display_name(
                patch.name.as_deref(),
                profile.first_name.as_deref(),
                profile.last_name.as_deref(),
            );
        }
        if let Some(v) = patch.emails {
            profile.emails = v;
        }
        if let Some(v) = patch.phones {
            profile.phones = v;
        }
        if let Some(v) = patch.address {
            profile.address = Some(v);
        }
        if let Some(v) = patch.loyalty_number {
            profile.loyalty_number = Some(v);
        }
        if let Some(v) = patch.loyalty_level {
            profile.loyalty_level = Some(v);
        }
        if let Some(v) = patch.language {
            profile.language = Some(v);
        }
        // Preferences are replaced wholesale whenever supplied, even empty.
        if let Some(prefs) = patch.preferences {
            profile.preferences = prefs;
        }
        if let Some(v) = patch.vip_status {
            profile.vip_status = v;
        }
        profile.updated_at = Self::now();

        let view = profile.view(None);
        store.put(profile).map_err(EngineError::storage)?;
        Ok(view)
    }

    // ── Delete ───────────────────────────────────────────────

    /// Removes the profile only. Reservations referencing it keep their
    /// `profile_id`; the dangling weak reference is accepted behavior.
    pub async fn delete_profile(&self, id: &str) -> Result<DeletionAck, EngineError> {
        let request = json!({ "id": id });
        let result = self.delete_profile_inner(id).await;
        match &result {
            Ok((ack, removed)) => self.record_success(
                "delete_profile",
                STREAM_PROFILES,
                200,
                request,
                json!({
                    "profile": serde_json::to_value(removed.view(None)).unwrap_or(Value::Null),
                    "deleted_at": ack.deleted_at,
                }),
                "profile_deleted",
            ),
            Err(err) => self.record_failure(
                "delete_profile",
                STREAM_PROFILES,
                request,
                err,
                Some("profile_delete_failed"),
            ),
        }
        result.map(|(ack, _)| ack)
    }

    async fn delete_profile_inner(&self, id: &str) -> Result<(DeletionAck, Profile), EngineError> {
        let mut store = self.profiles.write().await;
        let removed = store
            .delete(id)
            .map_err(EngineError::storage)?
            .ok_or_else(|| EngineError::NotFound(format!("profile {id}")))?;
        let ack = DeletionAck {
            status: "deleted",
            id: removed.profile_id.clone(),
            deleted_at: Self::now(),
        };
        Ok((ack, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::display_name;

    #[test]
    fn explicit_name_wins() {
        assert_eq!(display_name(Some("Dr. A. Lovelace"), Some("Ada"), Some("Lovelace")), "Dr. A. Lovelace");
    }

    #[test]
    fn derived_from_parts() {
        assert_eq!(display_name(None, Some("Ada"), Some("Lovelace")), "Ada Lovelace");
        assert_eq!(display_name(None, Some("Ada"), None), "Ada");
        assert_eq!(display_name(None, None, Some("Lovelace")), "Lovelace");
    }

    #[test]
    fn blank_explicit_falls_back() {
        assert_eq!(display_name(Some("  "), Some("Ada"), None), "Ada");
    }

    #[test]
    fn nothing_given_is_empty() {
        assert_eq!(display_name(None, None, None), "");
    }
}
