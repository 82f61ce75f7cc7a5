use serde::Serialize;
use serde_json::{Map, Value};

use super::super::domain::{ConditionOperator, TierKey, TierTemplate, UnlockCondition};
use super::{conditions, resolver, ConditionOutcome};
use crate::workflows::wallet::activity::ActivitySnapshot;

/// Display row for one condition of an auto-assign tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionProgress {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    pub params: Map<String, Value>,
    pub current: f64,
    pub required: f64,
    pub met: bool,
}

impl ConditionProgress {
    fn new(condition: &UnlockCondition, outcome: ConditionOutcome) -> Self {
        Self {
            kind: condition.kind.type_name().to_string(),
            operator: condition.operator,
            params: condition.params.clone(),
            current: outcome.current,
            required: outcome.required,
            met: outcome.met,
        }
    }
}

/// Template plus the user's unlock state. `progress` is `None` for manual-only tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    #[serde(flatten)]
    pub template: TierTemplate,
    pub progress: Option<Vec<ConditionProgress>>,
    pub unlocked: bool,
}

impl TierProgress {
    pub fn tier(&self) -> &TierKey {
        &self.template.tier
    }

    pub fn is_manual_only(&self) -> bool {
        self.progress.is_none()
    }
}

pub(crate) fn tier_progress(
    template: &TierTemplate,
    snapshot: &ActivitySnapshot,
    current_tier: Option<&TierKey>,
) -> TierProgress {
    let config = &template.unlock_conditions;
    if config.is_manual_only() {
        return TierProgress {
            template: template.clone(),
            progress: None,
            unlocked: current_tier == Some(&template.tier),
        };
    }

    let outcomes: Vec<ConditionOutcome> = config
        .conditions
        .iter()
        .map(|condition| conditions::evaluate_condition(condition, snapshot))
        .collect();
    let unlocked =
        resolver::resolve_outcomes(&config.conditions, &outcomes, current_tier, &template.tier);
    let progress = config
        .conditions
        .iter()
        .zip(outcomes)
        .map(|(condition, outcome)| ConditionProgress::new(condition, outcome))
        .collect();

    TierProgress {
        template: template.clone(),
        progress: Some(progress),
        unlocked,
    }
}
