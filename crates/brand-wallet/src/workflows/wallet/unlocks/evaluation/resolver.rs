use super::super::domain::{ConditionOperator, TierKey, UnlockCondition};
use super::ConditionOutcome;

/// Left-to-right fold of condition verdicts. The first operator is ignored; anything other
/// than `AND` joins with `OR`. An empty list folds to `false`.
pub(crate) fn fold_outcomes(conditions: &[UnlockCondition], outcomes: &[ConditionOutcome]) -> bool {
    let mut verdicts = conditions.iter().zip(outcomes);
    let Some((_, first)) = verdicts.next() else {
        return false;
    };

    verdicts.fold(first.met, |acc, (condition, outcome)| match condition.operator {
        Some(ConditionOperator::And) => acc && outcome.met,
        Some(ConditionOperator::Or) | None => acc || outcome.met,
    })
}

/// The held tier is always unlocked, whatever its conditions say now.
pub(crate) fn resolve_outcomes(
    conditions: &[UnlockCondition],
    outcomes: &[ConditionOutcome],
    current_tier: Option<&TierKey>,
    template_tier: &TierKey,
) -> bool {
    let is_current = current_tier == Some(template_tier);
    if conditions.is_empty() {
        return is_current;
    }

    fold_outcomes(conditions, outcomes) || is_current
}
