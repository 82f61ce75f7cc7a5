//! Wallet card unlock evaluation: condition trees in, tier progress and one-time unlock
//! notifications out.
//!
//! [`UnlockEngine`] is pure and shared by every caller. [`CardUnlockService`] is the only place
//! that reads storage and triggers [`UnlockNotifier`], so the wallet screen, the brand console
//! and the dashboard always agree on which tiers are unlocked.

pub mod domain;
pub mod evaluation;
pub mod notifier;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    BrandId, ConditionKind, ConditionOperator, TemplateId, TierKey, TierTemplate, UnlockCondition,
    UnlockConditions, UserId, WalletCard,
};
pub use evaluation::{ConditionOutcome, ConditionProgress, TierProgress, UnlockEngine};
pub use notifier::{NotifyFailure, NotifyReport, UnlockNotifier};
pub use repository::{
    NotificationError, NotificationSink, RecordOutcome, RepositoryError, UnlockNotification,
    WalletRepository, CARD_UNLOCK_NOTIFICATION,
};
pub use router::{wallet_router, PreviewRequest};
pub use service::{CardUnlockService, CardUnlockServiceError};
pub use views::{DashboardCard, DashboardView, MemberTierView, WalletTierView};
