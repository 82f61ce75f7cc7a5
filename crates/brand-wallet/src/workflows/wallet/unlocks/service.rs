use std::sync::Arc;

use super::domain::{BrandId, TierKey, TierTemplate, UserId, WalletCard};
use super::evaluation::{TierProgress, UnlockEngine};
use super::notifier::UnlockNotifier;
use super::repository::{NotificationSink, RepositoryError, WalletRepository};
use super::views::{DashboardCard, DashboardView, MemberTierView, WalletTierView};
use crate::config::WalletConfig;
use crate::workflows::wallet::activity::ActivitySnapshot;

/// Service composing the wallet repository, unlock engine, and notifier.
///
/// Every surface that shows tier state (wallet, brand console, dashboard) goes through here so
/// they agree on what is unlocked.
pub struct CardUnlockService<R, N> {
    repository: Arc<R>,
    notifier: UnlockNotifier<N>,
    engine: UnlockEngine,
}

impl<R, N> CardUnlockService<R, N>
where
    R: WalletRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, sink: Arc<N>, config: WalletConfig) -> Self {
        Self {
            repository,
            notifier: UnlockNotifier::new(sink, config),
            engine: UnlockEngine::new(),
        }
    }

    /// Tier progress for the user's own wallet; newly unlocked tiers are notified.
    pub fn wallet_tiers(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<WalletTierView, CardUnlockServiceError> {
        let card = self.repository.wallet_card(user_id, brand_id)?;
        let current_tier = card.map(|card| card.tier);
        let tiers = self.evaluate_brand(user_id, brand_id, current_tier.as_ref())?;

        let report =
            self.notifier
                .notify_new_unlocks(user_id, brand_id, current_tier.as_ref(), &tiers);

        Ok(WalletTierView {
            user_id: user_id.clone(),
            brand_id: brand_id.clone(),
            current_tier,
            tiers,
            newly_unlocked: report.delivered,
        })
    }

    /// Brand console view of a member's progress. Read-only: no notifications are sent.
    pub fn member_tiers(
        &self,
        brand_id: &BrandId,
        user_id: &UserId,
    ) -> Result<MemberTierView, CardUnlockServiceError> {
        let card = self
            .repository
            .wallet_card(user_id, brand_id)?
            .ok_or(RepositoryError::NotFound)?;
        let tiers = self.evaluate_brand(user_id, brand_id, Some(&card.tier))?;

        Ok(MemberTierView {
            user_id: card.user_id,
            brand_id: card.brand_id,
            member_id: card.member_id,
            current_tier: card.tier,
            tiers,
        })
    }

    /// One summary per held card, notifying new unlocks along the way.
    pub fn dashboard(&self, user_id: &UserId) -> Result<DashboardView, CardUnlockServiceError> {
        let cards = self.repository.wallet_cards(user_id)?;
        let mut summaries = Vec::with_capacity(cards.len());
        let mut newly_unlocked = Vec::new();

        for WalletCard {
            brand_id,
            tier,
            member_id,
            ..
        } in cards
        {
            let tiers = self.evaluate_brand(user_id, &brand_id, Some(&tier))?;
            let report = self
                .notifier
                .notify_new_unlocks(user_id, &brand_id, Some(&tier), &tiers);
            newly_unlocked.extend(report.delivered);
            summaries.push(DashboardCard::from_tiers(brand_id, member_id, tier, tiers));
        }

        Ok(DashboardView {
            user_id: user_id.clone(),
            cards: summaries,
            newly_unlocked,
        })
    }

    /// Evaluate caller-supplied templates without touching storage.
    pub fn preview(
        &self,
        templates: &[TierTemplate],
        snapshot: &ActivitySnapshot,
        current_tier: Option<&TierKey>,
    ) -> Vec<TierProgress> {
        self.engine.aggregate(templates, snapshot, current_tier)
    }

    fn evaluate_brand(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        current_tier: Option<&TierKey>,
    ) -> Result<Vec<TierProgress>, CardUnlockServiceError> {
        let templates = self.repository.tier_templates(brand_id)?;
        let snapshot = self.repository.activity_snapshot(user_id, brand_id)?;
        Ok(self.engine.aggregate(&templates, &snapshot, current_tier))
    }
}

/// Error raised by the card unlock service.
#[derive(Debug, thiserror::Error)]
pub enum CardUnlockServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
