use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::config::WalletConfig;
use crate::workflows::wallet::activity::ActivitySnapshot;
use crate::workflows::wallet::unlocks::domain::{
    BrandId, TemplateId, TierKey, TierTemplate, UnlockCondition, UserId, WalletCard,
};
use crate::workflows::wallet::unlocks::repository::{
    NotificationError, NotificationSink, RecordOutcome, RepositoryError, UnlockNotification,
    WalletRepository,
};
use crate::workflows::wallet::unlocks::{wallet_router, CardUnlockService};

pub(super) const BRAND: &str = "aurora";
pub(super) const USER: &str = "user-7";

pub(super) fn brand() -> BrandId {
    BrandId(BRAND.to_string())
}

pub(super) fn user() -> UserId {
    UserId(USER.to_string())
}

pub(super) fn tier(key: &str) -> TierKey {
    TierKey::new(key)
}

pub(super) fn template(tier: &str, conditions: Value, auto_assign: bool) -> TierTemplate {
    serde_json::from_value(json!({
        "id": format!("tpl-{tier}"),
        "brandId": BRAND,
        "tier": tier,
        "name": format!("{}{}", tier[..1].to_uppercase(), &tier[1..]),
        "cardColor": "#1f2933",
        "unlockConditions": {
            "conditions": conditions,
            "autoAssign": auto_assign,
        }
    }))
    .expect("template fixture decodes")
}

pub(super) fn conditions(value: Value) -> Vec<UnlockCondition> {
    serde_json::from_value(value).expect("condition fixture decodes")
}

/// Activation then event, joined by `operator`.
pub(super) fn activation_then_events(operator: &str) -> Value {
    json!([
        { "type": "activation", "params": { "minQuantity": 1 } },
        { "type": "event", "operator": operator, "params": { "minEvents": 2 } }
    ])
}

/// member (manual), silver (1 activation), gold (1 activation AND 2 events),
/// platinum (3 track days), vip (manual, conditions present but not auto-assigned).
pub(super) fn brand_templates() -> Vec<TierTemplate> {
    vec![
        template("member", json!([]), true),
        template(
            "silver",
            json!([{ "type": "activation", "params": { "minQuantity": 1 } }]),
            true,
        ),
        template("gold", activation_then_events("AND"), true),
        template(
            "platinum",
            json!([{ "type": "event", "params": { "minEvents": 3, "eventType": "track_day" } }]),
            true,
        ),
        template(
            "vip",
            json!([{ "type": "activation", "params": { "minQuantity": 1 } }]),
            false,
        ),
    ]
}

pub(super) fn member_card() -> WalletCard {
    WalletCard {
        user_id: user(),
        brand_id: brand(),
        tier: tier("member"),
        member_id: "AUR-000042".to_string(),
    }
}

pub(super) fn wallet_config() -> WalletConfig {
    WalletConfig::new("https://app.example.com/wallet").expect("valid wallet url")
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    snapshots: Mutex<HashMap<(UserId, BrandId), ActivitySnapshot>>,
    templates: Mutex<HashMap<BrandId, Vec<TierTemplate>>>,
    cards: Mutex<Vec<WalletCard>>,
    snapshot_reads: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn seeded(snapshot: ActivitySnapshot) -> Self {
        let repository = Self::default();
        repository.set_templates(brand(), brand_templates());
        repository.set_snapshot(user(), brand(), snapshot);
        repository.add_card(member_card());
        repository
    }

    pub(super) fn set_snapshot(&self, user_id: UserId, brand_id: BrandId, snapshot: ActivitySnapshot) {
        self.snapshots
            .lock()
            .expect("repository mutex poisoned")
            .insert((user_id, brand_id), snapshot);
    }

    pub(super) fn set_templates(&self, brand_id: BrandId, templates: Vec<TierTemplate>) {
        self.templates
            .lock()
            .expect("repository mutex poisoned")
            .insert(brand_id, templates);
    }

    pub(super) fn add_card(&self, card: WalletCard) {
        self.cards
            .lock()
            .expect("repository mutex poisoned")
            .push(card);
    }

    pub(super) fn snapshot_reads(&self) -> usize {
        self.snapshot_reads.load(Ordering::SeqCst)
    }
}

impl WalletRepository for MemoryRepository {
    fn activity_snapshot(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<ActivitySnapshot, RepositoryError> {
        self.snapshot_reads.fetch_add(1, Ordering::SeqCst);
        let guard = self.snapshots.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(&(user_id.clone(), brand_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn tier_templates(&self, brand_id: &BrandId) -> Result<Vec<TierTemplate>, RepositoryError> {
        let guard = self.templates.lock().expect("repository mutex poisoned");
        Ok(guard.get(brand_id).cloned().unwrap_or_default())
    }

    fn wallet_card(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<Option<WalletCard>, RepositoryError> {
        let guard = self.cards.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .find(|card| &card.user_id == user_id && &card.brand_id == brand_id)
            .cloned())
    }

    fn wallet_cards(&self, user_id: &UserId) -> Result<Vec<WalletCard>, RepositoryError> {
        let guard = self.cards.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|card| &card.user_id == user_id)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailableRepository;

impl WalletRepository for UnavailableRepository {
    fn activity_snapshot(
        &self,
        _user_id: &UserId,
        _brand_id: &BrandId,
    ) -> Result<ActivitySnapshot, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn tier_templates(&self, _brand_id: &BrandId) -> Result<Vec<TierTemplate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn wallet_card(
        &self,
        _user_id: &UserId,
        _brand_id: &BrandId,
    ) -> Result<Option<WalletCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn wallet_cards(&self, _user_id: &UserId) -> Result<Vec<WalletCard>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Notification store with a unique key on `(user, template)`, like the production table.
#[derive(Default)]
pub(super) struct MemoryNotifications {
    records: Mutex<BTreeMap<(UserId, TemplateId), UnlockNotification>>,
    writes: AtomicUsize,
}

impl MemoryNotifications {
    pub(super) fn notifications(&self) -> Vec<UnlockNotification> {
        self.records
            .lock()
            .expect("notification mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl NotificationSink for MemoryNotifications {
    fn notified_tiers(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<BTreeSet<TemplateId>, NotificationError> {
        let guard = self.records.lock().expect("notification mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.user_id == user_id && &record.brand_id == brand_id)
            .map(|record| record.template_id.clone())
            .collect())
    }

    fn record_unlock(
        &self,
        notification: UnlockNotification,
    ) -> Result<RecordOutcome, NotificationError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.records.lock().expect("notification mutex poisoned");
        let key = notification.suppression_key();
        if guard.contains_key(&key) {
            return Ok(RecordOutcome::AlreadyNotified);
        }
        guard.insert(key, notification);
        Ok(RecordOutcome::Created)
    }
}

/// Sink whose history lookup is stale: it never reports earlier notifications, so only the
/// upsert protects against duplicates.
#[derive(Default)]
pub(super) struct StaleLookupNotifications {
    pub(super) inner: MemoryNotifications,
}

impl NotificationSink for StaleLookupNotifications {
    fn notified_tiers(
        &self,
        _user_id: &UserId,
        _brand_id: &BrandId,
    ) -> Result<BTreeSet<TemplateId>, NotificationError> {
        Ok(BTreeSet::new())
    }

    fn record_unlock(
        &self,
        notification: UnlockNotification,
    ) -> Result<RecordOutcome, NotificationError> {
        self.inner.record_unlock(notification)
    }
}

pub(super) struct OfflineNotifications;

impl NotificationSink for OfflineNotifications {
    fn notified_tiers(
        &self,
        _user_id: &UserId,
        _brand_id: &BrandId,
    ) -> Result<BTreeSet<TemplateId>, NotificationError> {
        Err(NotificationError::Transport("queue offline".to_string()))
    }

    fn record_unlock(
        &self,
        _notification: UnlockNotification,
    ) -> Result<RecordOutcome, NotificationError> {
        Err(NotificationError::Transport("queue offline".to_string()))
    }
}

pub(super) fn build_service(
    snapshot: ActivitySnapshot,
) -> (
    CardUnlockService<MemoryRepository, MemoryNotifications>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::seeded(snapshot));
    let notifications = Arc::new(MemoryNotifications::default());
    let service =
        CardUnlockService::new(repository.clone(), notifications.clone(), wallet_config());
    (service, repository, notifications)
}

pub(super) fn wallet_router_with_service(
    service: CardUnlockService<MemoryRepository, MemoryNotifications>,
) -> axum::Router {
    wallet_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
