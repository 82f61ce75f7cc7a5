use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier wrapper for platform users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrandId(pub String);

/// Globally unique id of a tier template; suppression records are keyed on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(pub String);

/// Brand-scoped tier key such as `member`, `silver` or `gold`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierKey(pub String);

impl TierKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Combinator joining a condition to the result of everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl ConditionOperator {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Closed set of condition kinds a brand can author, plus a catch-all for anything else.
///
/// Thresholds are `None` when absent or malformed; the evaluator supplies the defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    Activation {
        min_quantity: Option<f64>,
    },
    Event {
        min_events: Option<f64>,
        event_type: Option<String>,
    },
    Purchase {
        min_quantity: Option<f64>,
        product_category: Option<String>,
    },
    Spending {
        min_amount: Option<f64>,
    },
    Manual,
    Unknown(String),
}

impl ConditionKind {
    pub fn parse(type_name: &str, params: &Map<String, Value>) -> Self {
        match type_name {
            "activation" => Self::Activation {
                min_quantity: number_param(params, "minQuantity"),
            },
            "event" => Self::Event {
                min_events: number_param(params, "minEvents"),
                event_type: text_param(params, "eventType"),
            },
            "purchase" => Self::Purchase {
                min_quantity: number_param(params, "minQuantity"),
                product_category: text_param(params, "productCategory"),
            },
            "spending" => Self::Spending {
                min_amount: number_param(params, "minAmount"),
            },
            "manual" => Self::Manual,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Activation { .. } => "activation",
            Self::Event { .. } => "event",
            Self::Purchase { .. } => "purchase",
            Self::Spending { .. } => "spending",
            Self::Manual => "manual",
            Self::Unknown(name) => name,
        }
    }
}

fn number_param(params: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match params.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|number| number.is_finite())
}

fn text_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// One brand-authored unlock requirement.
///
/// Decoding never fails: any JSON value becomes a condition, with unrecognised shapes
/// landing in [`ConditionKind::Unknown`]. The authored `params` are kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "WireCondition")]
pub struct UnlockCondition {
    pub kind: ConditionKind,
    pub operator: Option<ConditionOperator>,
    pub params: Map<String, Value>,
}

impl UnlockCondition {
    pub fn new(kind: ConditionKind, operator: Option<ConditionOperator>) -> Self {
        let params = kind_params(&kind);
        Self {
            kind,
            operator,
            params,
        }
    }
}

impl From<Value> for UnlockCondition {
    fn from(value: Value) -> Self {
        let params = value
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let type_name = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let operator = value
            .get("operator")
            .and_then(Value::as_str)
            .and_then(ConditionOperator::from_wire);

        Self {
            kind: ConditionKind::parse(type_name, &params),
            operator,
            params,
        }
    }
}

#[derive(Serialize)]
struct WireCondition {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operator: Option<ConditionOperator>,
    params: Map<String, Value>,
}

impl From<UnlockCondition> for WireCondition {
    fn from(condition: UnlockCondition) -> Self {
        Self {
            kind: condition.kind.type_name().to_string(),
            operator: condition.operator,
            params: condition.params,
        }
    }
}

fn kind_params(kind: &ConditionKind) -> Map<String, Value> {
    let mut params = Map::new();
    let mut put_number = |key: &str, value: &Option<f64>| {
        if let Some(number) = value.and_then(serde_json::Number::from_f64) {
            params.insert(key.to_string(), Value::Number(number));
        }
    };
    match kind {
        ConditionKind::Activation { min_quantity } => put_number("minQuantity", min_quantity),
        ConditionKind::Event { min_events, .. } => put_number("minEvents", min_events),
        ConditionKind::Purchase { min_quantity, .. } => put_number("minQuantity", min_quantity),
        ConditionKind::Spending { min_amount } => put_number("minAmount", min_amount),
        ConditionKind::Manual | ConditionKind::Unknown(_) => {}
    }
    match kind {
        ConditionKind::Event {
            event_type: Some(event_type),
            ..
        } => {
            params.insert("eventType".to_string(), Value::from(event_type.as_str()));
        }
        ConditionKind::Purchase {
            product_category: Some(category),
            ..
        } => {
            params.insert("productCategory".to_string(), Value::from(category.as_str()));
        }
        _ => {}
    }
    params
}

/// `{ conditions, autoAssign }` block stored on each tier template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct UnlockConditions {
    pub conditions: Vec<UnlockCondition>,
    pub auto_assign: bool,
}

impl UnlockConditions {
    /// Decode a stored condition tree. Text that is not JSON at all yields a manual-only tier.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from(value),
            Err(err) => {
                tracing::warn!(error = %err, "unlock conditions are not valid json; treating tier as manual-only");
                Self::default()
            }
        }
    }

    /// Tiers that can only be granted by a brand admin.
    pub fn is_manual_only(&self) -> bool {
        !self.auto_assign || self.conditions.is_empty()
    }
}

impl From<Value> for UnlockConditions {
    fn from(value: Value) -> Self {
        // Trees kept in a text column arrive as an encoded JSON string.
        if let Value::String(raw) = &value {
            return Self::from_json(raw);
        }

        let conditions = value
            .get("conditions")
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().map(UnlockCondition::from).collect())
            .unwrap_or_default();
        let auto_assign = match value.get("autoAssign") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(raw)) => raw.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        Self {
            conditions,
            auto_assign,
        }
    }
}

/// Keys the engine writes next to a flattened template when reporting progress.
const RESERVED_ATTRIBUTES: [&str; 2] = ["progress", "unlocked"];

/// Brand-authored membership level. Display attributes are carried through untouched, except
/// for keys that would collide with evaluated progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireTemplate")]
pub struct TierTemplate {
    pub id: TemplateId,
    pub brand_id: BrandId,
    pub tier: TierKey,
    pub name: String,
    #[serde(default)]
    pub unlock_conditions: UnlockConditions,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTemplate {
    id: TemplateId,
    brand_id: BrandId,
    tier: TierKey,
    name: String,
    #[serde(default)]
    unlock_conditions: UnlockConditions,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl From<WireTemplate> for TierTemplate {
    fn from(wire: WireTemplate) -> Self {
        let mut attributes = wire.attributes;
        for key in RESERVED_ATTRIBUTES {
            if attributes.remove(key).is_some() {
                tracing::debug!(template_id = %wire.id.0, key, "dropping reserved template attribute");
            }
        }

        Self {
            id: wire.id,
            brand_id: wire.brand_id,
            tier: wire.tier,
            name: wire.name,
            unlock_conditions: wire.unlock_conditions,
            attributes,
        }
    }
}

/// The card a user currently holds with a brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCard {
    pub user_id: UserId,
    pub brand_id: BrandId,
    pub tier: TierKey,
    pub member_id: String,
}
