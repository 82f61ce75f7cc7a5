use super::super::domain::{ConditionKind, UnlockCondition};
use super::ConditionOutcome;
use crate::workflows::wallet::activity::ActivitySnapshot;

const DEFAULT_MIN_QUANTITY: f64 = 1.0;
const DEFAULT_MIN_EVENTS: f64 = 1.0;
const DEFAULT_MIN_AMOUNT: f64 = 0.0;
const MANUAL_REQUIRED: f64 = 1.0;

pub(crate) fn evaluate_condition(
    condition: &UnlockCondition,
    snapshot: &ActivitySnapshot,
) -> ConditionOutcome {
    match &condition.kind {
        ConditionKind::Activation { min_quantity } => threshold(
            f64::from(snapshot.activations_count),
            min_quantity.unwrap_or(DEFAULT_MIN_QUANTITY),
        ),
        ConditionKind::Event {
            min_events,
            event_type,
        } => threshold(
            f64::from(snapshot.events_attended(event_type.as_deref())),
            min_events.unwrap_or(DEFAULT_MIN_EVENTS),
        ),
        // Purchases are not tracked yet; these stay unmet until they are.
        ConditionKind::Purchase { min_quantity, .. } => {
            unmet(min_quantity.unwrap_or(DEFAULT_MIN_QUANTITY))
        }
        ConditionKind::Spending { min_amount } => unmet(min_amount.unwrap_or(DEFAULT_MIN_AMOUNT)),
        ConditionKind::Manual | ConditionKind::Unknown(_) => unmet(MANUAL_REQUIRED),
    }
}

fn threshold(current: f64, required: f64) -> ConditionOutcome {
    ConditionOutcome {
        current,
        required,
        met: current >= required,
    }
}

fn unmet(required: f64) -> ConditionOutcome {
    ConditionOutcome {
        current: 0.0,
        required,
        met: false,
    }
}
