use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BrandId, TemplateId, TierKey, TierTemplate, UserId, WalletCard};
use crate::workflows::wallet::activity::ActivitySnapshot;

pub const CARD_UNLOCK_NOTIFICATION: &str = "card_unlock";

/// Read side the engine depends on: activity counters, tier templates and held cards.
pub trait WalletRepository: Send + Sync {
    /// Counters for one user with one brand. Implementations read once per call and return
    /// zeroed counters when the user has no activity.
    fn activity_snapshot(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<ActivitySnapshot, RepositoryError>;
    /// Templates in brand-defined order.
    fn tier_templates(&self, brand_id: &BrandId) -> Result<Vec<TierTemplate>, RepositoryError>;
    fn wallet_card(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<Option<WalletCard>, RepositoryError>;
    fn wallet_cards(&self, user_id: &UserId) -> Result<Vec<WalletCard>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Notification store plus the suppression records guarding it.
pub trait NotificationSink: Send + Sync {
    /// Template ids the user has already been told about for this brand.
    fn notified_tiers(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<BTreeSet<TemplateId>, NotificationError>;

    /// Store the notification and its suppression record as one upsert keyed by
    /// `(user_id, template_id)`. A second write for the same key must not create a visible
    /// notification and reports [`RecordOutcome::AlreadyNotified`].
    fn record_unlock(
        &self,
        notification: UnlockNotification,
    ) -> Result<RecordOutcome, NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Created,
    AlreadyNotified,
}

/// "You unlocked X" payload handed to the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockNotification {
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub template_id: TemplateId,
    pub tier: TierKey,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub action_url: String,
    pub created_at: DateTime<Utc>,
}

impl UnlockNotification {
    pub fn suppression_key(&self) -> (UserId, TemplateId) {
        (self.user_id.clone(), self.template_id.clone())
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification store unavailable: {0}")]
    Transport(String),
}
