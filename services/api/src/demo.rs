use crate::infra::{read_json_file, InMemoryNotificationSink, InMemoryWalletRepository};
use brand_wallet::config::WalletConfig;
use brand_wallet::error::AppError;
use brand_wallet::workflows::wallet::unlocks::{
    BrandId, CardUnlockService, CardUnlockServiceError, RepositoryError, TierKey, TierProgress,
    TierTemplate, UnlockEngine, UserId, WalletCard, WalletTierView,
};
use brand_wallet::workflows::wallet::{
    ActivationRecord, ActivationStatus, ActivitySnapshot, EventRsvp, RsvpStatus,
};
use chrono::Utc;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_BRAND: &str = "aurora";
pub(crate) const DEMO_USER: &str = "rider-1";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Attended events to record between the first and second evaluation.
    #[arg(long, default_value_t = 2)]
    pub(crate) events: u32,
    /// Event type attached to the recorded RSVPs.
    #[arg(long, default_value = "track_day")]
    pub(crate) event_type: String,
    /// Base URL used for the notification action link.
    #[arg(long)]
    pub(crate) wallet_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON file holding an array of tier templates in brand order
    #[arg(long)]
    pub(crate) templates: PathBuf,
    /// JSON file holding activity counters (defaults to no activity)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Tier the user currently holds
    #[arg(long)]
    pub(crate) current_tier: Option<String>,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        templates,
        snapshot,
        current_tier,
    } = args;

    let templates: Vec<TierTemplate> = read_json_file(&templates)?;
    let snapshot = match snapshot {
        Some(path) => read_json_file(&path)?,
        None => ActivitySnapshot::default(),
    };
    let current_tier = current_tier.map(TierKey::new);

    let tiers = UnlockEngine::new().aggregate(&templates, &snapshot, current_tier.as_ref());
    println!("{}", serde_json::to_string_pretty(&json!({ "tiers": tiers }))?);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        events,
        event_type,
        wallet_url,
    } = args;

    let config = match wallet_url {
        Some(url) => WalletConfig::new(url)?,
        None => WalletConfig::default(),
    };
    let repository = Arc::new(InMemoryWalletRepository::default());
    let notifications = Arc::new(InMemoryNotificationSink::default());
    let (user_id, brand_id) = seed_demo_brand(&repository)?;
    let service = CardUnlockService::new(repository.clone(), notifications.clone(), config);

    println!("Brand wallet unlock demo");
    println!("\nPass 1: one verified vehicle activation");
    render_wallet(&service.wallet_tiers(&user_id, &brand_id)?);

    for index in 0..events {
        repository
            .record_rsvp(
                &user_id,
                &brand_id,
                EventRsvp {
                    event_id: format!("{event_type}-{}", index + 1),
                    event_type: Some(event_type.clone()),
                    status: RsvpStatus::Going,
                },
            )
            .map_err(CardUnlockServiceError::from)?;
    }
    println!("\nPass 2: {events} attended {event_type} events recorded");
    render_wallet(&service.wallet_tiers(&user_id, &brand_id)?);

    println!("\nPass 3: no new activity");
    render_wallet(&service.wallet_tiers(&user_id, &brand_id)?);

    let sent = notifications.notifications();
    println!("\nNotifications delivered: {}", sent.len());
    for notification in sent {
        println!(
            "  - [{}] {} -> {}",
            notification.tier, notification.message, notification.action_url
        );
    }

    Ok(())
}

/// Install the Aurora tier catalog and a rider holding the member card with one activation.
pub(crate) fn seed_demo_brand(
    repository: &InMemoryWalletRepository,
) -> Result<(UserId, BrandId), AppError> {
    let user_id = UserId(DEMO_USER.to_string());
    let brand_id = BrandId(DEMO_BRAND.to_string());

    let seed = || -> Result<(), RepositoryError> {
        repository.put_templates(brand_id.clone(), demo_templates()?)?;
        repository.issue_card(WalletCard {
            user_id: user_id.clone(),
            brand_id: brand_id.clone(),
            tier: TierKey::new("member"),
            member_id: "AUR-000001".to_string(),
        })?;
        repository.record_activation(
            &user_id,
            &brand_id,
            ActivationRecord {
                vehicle_id: "VIN-AUR-0001".to_string(),
                status: ActivationStatus::Verified,
                activated_at: Utc::now(),
            },
        )
    };
    seed().map_err(CardUnlockServiceError::from)?;

    Ok((user_id, brand_id))
}

fn demo_templates() -> Result<Vec<TierTemplate>, RepositoryError> {
    serde_json::from_value(json!([
        {
            "id": "aurora-member",
            "brandId": DEMO_BRAND,
            "tier": "member",
            "name": "Member",
            "cardColor": "#2d3748",
            "unlockConditions": { "conditions": [], "autoAssign": true }
        },
        {
            "id": "aurora-silver",
            "brandId": DEMO_BRAND,
            "tier": "silver",
            "name": "Silver",
            "cardColor": "#a0aec0",
            "unlockConditions": {
                "autoAssign": true,
                "conditions": [{ "type": "activation", "params": { "minQuantity": 1 } }]
            }
        },
        {
            "id": "aurora-gold",
            "brandId": DEMO_BRAND,
            "tier": "gold",
            "name": "Gold",
            "cardColor": "#d69e2e",
            "unlockConditions": {
                "autoAssign": true,
                "conditions": [
                    { "type": "activation", "params": { "minQuantity": 1 } },
                    { "type": "event", "operator": "AND", "params": { "minEvents": 2 } }
                ]
            }
        },
        {
            "id": "aurora-platinum",
            "brandId": DEMO_BRAND,
            "tier": "platinum",
            "name": "Platinum",
            "cardColor": "#e2e8f0",
            "unlockConditions": {
                "autoAssign": true,
                "conditions": [
                    { "type": "event", "params": { "minEvents": 5, "eventType": "track_day" } },
                    { "type": "spending", "operator": "OR", "params": { "minAmount": 2500 } }
                ]
            }
        },
        {
            "id": "aurora-black",
            "brandId": DEMO_BRAND,
            "tier": "black",
            "name": "Black",
            "cardColor": "#000000",
            "unlockConditions": { "conditions": [], "autoAssign": false }
        }
    ]))
    .map_err(|err| RepositoryError::Unavailable(format!("demo templates invalid: {err}")))
}

fn render_wallet(view: &WalletTierView) {
    let current = view
        .current_tier
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string());
    println!("- Current tier: {current}");
    for tier in &view.tiers {
        render_tier(tier);
    }
    if view.newly_unlocked.is_empty() {
        println!("- Newly unlocked: none");
    } else {
        let names: Vec<String> = view.newly_unlocked.iter().map(ToString::to_string).collect();
        println!("- Newly unlocked: {}", names.join(", "));
    }
}

fn render_tier(tier: &TierProgress) {
    let marker = if tier.unlocked { "x" } else { " " };
    println!("  [{marker}] {} ({})", tier.template.name, tier.tier());
    match &tier.progress {
        None => println!("      assigned by the brand"),
        Some(rows) => {
            for row in rows {
                let operator = row.operator.map(|op| op.label()).unwrap_or("");
                println!(
                    "      {operator:>3} {:<10} {}/{} {}",
                    row.kind,
                    row.current,
                    row.required,
                    if row.met { "met" } else { "pending" }
                );
            }
        }
    }
}
