use serde::Serialize;

use super::domain::{BrandId, TierKey, UserId};
use super::evaluation::TierProgress;

/// The user's own wallet screen for one brand.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTierView {
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub current_tier: Option<TierKey>,
    pub tiers: Vec<TierProgress>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub newly_unlocked: Vec<TierKey>,
}

/// Brand console view of one wallet member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTierView {
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub member_id: String,
    pub current_tier: TierKey,
    pub tiers: Vec<TierProgress>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCard {
    pub brand_id: BrandId,
    pub member_id: String,
    pub current_tier: TierKey,
    pub unlocked_tiers: Vec<TierKey>,
    /// First locked auto-assign tier in brand order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<TierProgress>,
}

impl DashboardCard {
    pub(crate) fn from_tiers(
        brand_id: BrandId,
        member_id: String,
        current_tier: TierKey,
        tiers: Vec<TierProgress>,
    ) -> Self {
        let unlocked_tiers = tiers
            .iter()
            .filter(|tier| tier.unlocked)
            .map(|tier| tier.tier().clone())
            .collect();
        let next_tier = tiers
            .into_iter()
            .find(|tier| !tier.unlocked && !tier.is_manual_only());

        Self {
            brand_id,
            member_id,
            current_tier,
            unlocked_tiers,
            next_tier,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub user_id: UserId,
    pub cards: Vec<DashboardCard>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub newly_unlocked: Vec<TierKey>,
}
