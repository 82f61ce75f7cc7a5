use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::domain::{BrandId, TemplateId, TierKey, UserId};
use super::evaluation::TierProgress;
use super::repository::{
    NotificationSink, RecordOutcome, UnlockNotification, CARD_UNLOCK_NOTIFICATION,
};
use crate::config::WalletConfig;

/// Outcome of one notification pass, per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub delivered: Vec<TierKey>,
    pub suppressed: Vec<TierKey>,
    pub failed: Vec<NotifyFailure>,
}

impl NotifyReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyFailure {
    pub tier: TierKey,
    pub error: String,
}

/// Emits at most one `card_unlock` notification per user and tier template.
///
/// Failures are reported, never raised: the evaluation that triggered the pass is still valid,
/// and because suppression is only recorded alongside a delivered notification the next
/// evaluation retries whatever failed here.
pub struct UnlockNotifier<N> {
    sink: Arc<N>,
    config: WalletConfig,
}

impl<N> UnlockNotifier<N>
where
    N: NotificationSink,
{
    pub fn new(sink: Arc<N>, config: WalletConfig) -> Self {
        Self { sink, config }
    }

    /// Look up prior notifications for the user, then notify the remaining new unlocks.
    pub fn notify_new_unlocks(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        current_tier: Option<&TierKey>,
        tiers: &[TierProgress],
    ) -> NotifyReport {
        if candidates(tiers, current_tier).next().is_none() {
            return NotifyReport::default();
        }

        // The upsert in `record_unlock` still dedupes if this lookup is unavailable.
        let already_notified = match self.sink.notified_tiers(user_id, brand_id) {
            Ok(notified) => notified,
            Err(err) => {
                tracing::warn!(
                    user_id = %user_id.0,
                    brand_id = %brand_id.0,
                    error = %err,
                    "unlock suppression lookup failed"
                );
                BTreeSet::new()
            }
        };

        self.notify_with_history(user_id, brand_id, current_tier, tiers, &already_notified)
    }

    /// Notify every unlocked tier other than the held one that is not in `already_notified`.
    pub fn notify_with_history(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        current_tier: Option<&TierKey>,
        tiers: &[TierProgress],
        already_notified: &BTreeSet<TemplateId>,
    ) -> NotifyReport {
        let mut report = NotifyReport::default();

        for tier in candidates(tiers, current_tier) {
            if already_notified.contains(&tier.template.id) {
                report.suppressed.push(tier.tier().clone());
                continue;
            }

            let notification = self.compose(user_id, brand_id, tier);
            match self.sink.record_unlock(notification) {
                Ok(RecordOutcome::Created) => {
                    tracing::info!(
                        user_id = %user_id.0,
                        brand_id = %brand_id.0,
                        tier = %tier.tier(),
                        "card unlock notification created"
                    );
                    report.delivered.push(tier.tier().clone());
                }
                Ok(RecordOutcome::AlreadyNotified) => {
                    report.suppressed.push(tier.tier().clone());
                }
                Err(err) => {
                    tracing::warn!(
                        user_id = %user_id.0,
                        brand_id = %brand_id.0,
                        tier = %tier.tier(),
                        error = %err,
                        "card unlock notification failed"
                    );
                    report.failed.push(NotifyFailure {
                        tier: tier.tier().clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        report
    }

    pub(crate) fn compose(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        tier: &TierProgress,
    ) -> UnlockNotification {
        UnlockNotification {
            user_id: user_id.clone(),
            brand_id: brand_id.clone(),
            template_id: tier.template.id.clone(),
            tier: tier.tier().clone(),
            kind: CARD_UNLOCK_NOTIFICATION.to_string(),
            title: "New card unlocked".to_string(),
            message: format!(
                "You unlocked the {} card. Open your wallet to claim it.",
                tier.template.name
            ),
            action_url: format!("{}/{}", self.config.action_url_base, brand_id.0),
            created_at: Utc::now(),
        }
    }
}

fn candidates<'a>(
    tiers: &'a [TierProgress],
    current_tier: Option<&'a TierKey>,
) -> impl Iterator<Item = &'a TierProgress> + 'a {
    tiers
        .iter()
        .filter(move |tier| tier.unlocked && Some(tier.tier()) != current_tier)
}
