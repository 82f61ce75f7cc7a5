use brand_wallet::workflows::wallet::unlocks::{
    BrandId, NotificationError, NotificationSink, RecordOutcome, RepositoryError, TemplateId,
    TierTemplate, UnlockNotification, UserId, WalletCard, WalletRepository,
};
use brand_wallet::workflows::wallet::{ActivationRecord, ActivitySnapshot, EventRsvp};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

type MemberKey = (UserId, BrandId);

#[derive(Default)]
struct WalletTables {
    activations: HashMap<MemberKey, Vec<ActivationRecord>>,
    rsvps: HashMap<MemberKey, Vec<EventRsvp>>,
    templates: HashMap<BrandId, Vec<TierTemplate>>,
    cards: BTreeMap<MemberKey, WalletCard>,
}

/// Process-local wallet storage. Snapshots are derived from raw activity rows on every read.
#[derive(Default, Clone)]
pub(crate) struct InMemoryWalletRepository {
    tables: Arc<Mutex<WalletTables>>,
}

impl InMemoryWalletRepository {
    fn tables(&self) -> Result<MutexGuard<'_, WalletTables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("wallet tables poisoned".to_string()))
    }

    pub(crate) fn put_templates(
        &self,
        brand_id: BrandId,
        templates: Vec<TierTemplate>,
    ) -> Result<(), RepositoryError> {
        self.tables()?.templates.insert(brand_id, templates);
        Ok(())
    }

    pub(crate) fn issue_card(&self, card: WalletCard) -> Result<(), RepositoryError> {
        let key = (card.user_id.clone(), card.brand_id.clone());
        self.tables()?.cards.insert(key, card);
        Ok(())
    }

    pub(crate) fn record_activation(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        record: ActivationRecord,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .activations
            .entry((user_id.clone(), brand_id.clone()))
            .or_default()
            .push(record);
        Ok(())
    }

    pub(crate) fn record_rsvp(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
        rsvp: EventRsvp,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .rsvps
            .entry((user_id.clone(), brand_id.clone()))
            .or_default()
            .push(rsvp);
        Ok(())
    }
}

impl WalletRepository for InMemoryWalletRepository {
    fn activity_snapshot(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<ActivitySnapshot, RepositoryError> {
        let tables = self.tables()?;
        let key = (user_id.clone(), brand_id.clone());
        let activations = tables.activations.get(&key).map(Vec::as_slice).unwrap_or(&[]);
        let rsvps = tables.rsvps.get(&key).map(Vec::as_slice).unwrap_or(&[]);
        Ok(ActivitySnapshot::from_records(activations, rsvps))
    }

    fn tier_templates(&self, brand_id: &BrandId) -> Result<Vec<TierTemplate>, RepositoryError> {
        Ok(self
            .tables()?
            .templates
            .get(brand_id)
            .cloned()
            .unwrap_or_default())
    }

    fn wallet_card(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<Option<WalletCard>, RepositoryError> {
        Ok(self
            .tables()?
            .cards
            .get(&(user_id.clone(), brand_id.clone()))
            .cloned())
    }

    fn wallet_cards(&self, user_id: &UserId) -> Result<Vec<WalletCard>, RepositoryError> {
        Ok(self
            .tables()?
            .cards
            .values()
            .filter(|card| &card.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Notification table with a unique (user, template) key.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationSink {
    rows: Arc<Mutex<BTreeMap<(UserId, TemplateId), UnlockNotification>>>,
}

impl InMemoryNotificationSink {
    fn rows(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<(UserId, TemplateId), UnlockNotification>>, NotificationError>
    {
        self.rows
            .lock()
            .map_err(|_| NotificationError::Transport("notification table poisoned".to_string()))
    }

    pub(crate) fn notifications(&self) -> Vec<UnlockNotification> {
        self.rows()
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn notified_tiers(
        &self,
        user_id: &UserId,
        brand_id: &BrandId,
    ) -> Result<BTreeSet<TemplateId>, NotificationError> {
        Ok(self
            .rows()?
            .values()
            .filter(|row| &row.user_id == user_id && &row.brand_id == brand_id)
            .map(|row| row.template_id.clone())
            .collect())
    }

    fn record_unlock(
        &self,
        notification: UnlockNotification,
    ) -> Result<RecordOutcome, NotificationError> {
        let mut rows = self.rows()?;
        let key = notification.suppression_key();
        if rows.contains_key(&key) {
            return Ok(RecordOutcome::AlreadyNotified);
        }
        rows.insert(key, notification);
        Ok(RecordOutcome::Created)
    }
}

pub(crate) fn read_json_file<T>(path: &Path) -> Result<T, brand_wallet::error::AppError>
where
    T: serde::de::DeserializeOwned,
{
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
