mod conditions;
mod progress;
mod resolver;

pub use progress::{ConditionProgress, TierProgress};

use super::domain::{TierKey, TierTemplate, UnlockCondition};
use crate::workflows::wallet::activity::ActivitySnapshot;
use serde::{Deserialize, Serialize};

/// Stateless evaluator turning brand condition trees and activity counters into unlock state.
///
/// Every method is a total function of its inputs, so one engine is shared across requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlockEngine;

impl UnlockEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a single condition against the snapshot.
    pub fn evaluate(
        &self,
        condition: &UnlockCondition,
        snapshot: &ActivitySnapshot,
    ) -> ConditionOutcome {
        conditions::evaluate_condition(condition, snapshot)
    }

    /// Whether a tier's ordered conditions unlock it for a user holding `current_tier`.
    pub fn resolve(
        &self,
        conditions: &[UnlockCondition],
        snapshot: &ActivitySnapshot,
        current_tier: Option<&TierKey>,
        template_tier: &TierKey,
    ) -> bool {
        let outcomes: Vec<ConditionOutcome> = conditions
            .iter()
            .map(|condition| self.evaluate(condition, snapshot))
            .collect();
        resolver::resolve_outcomes(conditions, &outcomes, current_tier, template_tier)
    }

    /// Progress for every template, in the order given.
    pub fn aggregate(
        &self,
        templates: &[TierTemplate],
        snapshot: &ActivitySnapshot,
        current_tier: Option<&TierKey>,
    ) -> Vec<TierProgress> {
        let tiers: Vec<TierProgress> = templates
            .iter()
            .map(|template| progress::tier_progress(template, snapshot, current_tier))
            .collect();

        tracing::debug!(
            templates = tiers.len(),
            unlocked = tiers.iter().filter(|tier| tier.unlocked).count(),
            current_tier = current_tier.map(TierKey::as_str),
            "evaluated tier templates"
        );

        tiers
    }
}

/// Measured value, threshold and verdict for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    pub current: f64,
    pub required: f64,
    pub met: bool,
}
