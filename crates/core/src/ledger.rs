//! The owning controller tying the tab registry to a store.
//!
//! Every user action goes through [`Ledger`], either via its async methods or
//! via [`Ledger::dispatch`] with a [`Command`]. Mutations apply in memory
//! first and are then written through to the store. When a write fails the
//! ledger drops into degraded mode: changes keep applying in memory, no
//! further writes are attempted, and [`Ledger::flush`] is the way back.
//! Renames are the exception and either complete in both places or not at all.
//!
//! Records held in memory are always either read from the store or created
//! by the ledger. When the tab list could not be read at start-up, `flush`
//! first merges with what the store holds before writing anything.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::{
    command::{Command, Outcome, ShoppingTarget},
    error::LedgerError,
    models::{GameRecord, Job, Resource},
    registry::TabRegistry,
    shopping::{self, ShoppingList, TotalsView},
    store::{load_game, load_tabs, save_game, save_tabs, Store, StoreError, TABS_KEY},
};

static EMPTY_RECORD: GameRecord = GameRecord {
    resources: Vec::new(),
    jobs: Vec::new(),
};

/// Tab name used when the configured default is unusable.
pub const FALLBACK_TAB: &str = "default";

/// Whether changes are still being written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Every change is written through.
    Online,
    /// A store operation failed; changes live in memory only.
    Degraded {
        /// Message of the failure that caused the switch.
        reason: String,
    },
}

/// Controller owning the tab registry, the loaded records and the store.
pub struct Ledger<S> {
    store: S,
    registry: TabRegistry,
    persistence: Persistence,
    last_saved: Option<DateTime<Utc>>,
    /// False until the stored tab list has been read.
    registry_verified: bool,
    /// Tabs whose record was created in memory while the tab list was unread.
    placeholders: HashSet<String>,
    /// Keys of tabs renamed while degraded, removed on the next flush.
    stale_keys: Vec<String>,
}

impl<S: Store> Ledger<S> {
    /// Load the tab list from `store`, creating `default_tab` when there is none.
    ///
    /// A store that cannot be read leaves the ledger degraded with a single
    /// empty tab instead of failing.
    pub async fn open(store: S, default_tab: &str) -> Self {
        let default_tab = match default_tab.trim() {
            "" | TABS_KEY => FALLBACK_TAB,
            name => name,
        }
        .to_string();

        match bootstrap(&store, &default_tab).await {
            Ok((registry, last_saved)) => Self {
                store,
                registry,
                persistence: Persistence::Online,
                last_saved,
                registry_verified: true,
                placeholders: HashSet::new(),
                stale_keys: Vec::new(),
            },
            Err(err) => {
                error!(%err, "store unavailable at start-up; continuing in memory");
                Self {
                    store,
                    registry: TabRegistry::new(default_tab.clone(), GameRecord::default()),
                    persistence: Persistence::Degraded {
                        reason: err.to_string(),
                    },
                    last_saved: None,
                    registry_verified: false,
                    placeholders: HashSet::from([default_tab]),
                    stale_keys: Vec::new(),
                }
            }
        }
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tab names in display order.
    pub fn tabs(&self) -> &[String] {
        self.registry.names()
    }

    /// Name of the active tab.
    pub fn active_tab(&self) -> &str {
        self.registry.active()
    }

    /// Position of the active tab in [`Ledger::tabs`].
    pub fn active_index(&self) -> usize {
        self.registry.active_index()
    }

    /// Record of the active tab.
    pub fn active_record(&self) -> &GameRecord {
        self.registry
            .record(self.registry.active())
            .unwrap_or(&EMPTY_RECORD)
    }

    /// Record held in memory for `tab`, if it has been loaded.
    pub fn record(&self, tab: &str) -> Option<&GameRecord> {
        self.registry.record(tab)
    }

    /// Current persistence state.
    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// True once a store failure switched the ledger to memory only.
    pub fn is_degraded(&self) -> bool {
        matches!(self.persistence, Persistence::Degraded { .. })
    }

    /// Time of the last successful record write.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Create a tab with a generated name, persist it and make it active.
    pub async fn create_tab(&mut self) -> Result<String, LedgerError> {
        let name = self.registry.next_tab_name();
        self.registry.create(&name)?;
        if !self.registry_verified {
            self.placeholders.insert(name.clone());
        }
        info!(tab = %name, "created tab");
        self.persist_record(&name).await?;
        self.persist_tab_list().await?;
        Ok(name)
    }

    /// Rename a tab in the store and in memory, or in neither.
    pub async fn rename_tab(&mut self, from: &str, to: &str) -> Result<String, LedgerError> {
        let to = self.registry.check_rename(from, to)?;
        self.ensure_loaded(from).await?;

        let degraded = self.is_degraded();
        if !degraded {
            let record = self.registry.record(from).cloned().unwrap_or_default();
            let names = self.registry.names_after_rename(from, &to);
            self.commit_rename(from, &to, &record, &names).await?;
        }

        self.registry.rename(from, &to)?;
        if degraded {
            self.stale_keys.retain(|key| *key != to);
            if self.placeholders.remove(from) {
                self.placeholders.insert(to.clone());
            } else {
                self.stale_keys.push(from.to_string());
            }
            warn!(from, to = %to, "store degraded; rename kept in memory until flush");
        }
        info!(from, to = %to, "renamed tab");
        Ok(to)
    }

    /// Activate `tab`, replacing its in-memory record with the stored one.
    pub async fn switch_tab(&mut self, tab: &str) -> Result<(), LedgerError> {
        if !self.registry.contains(tab) {
            return Err(LedgerError::UnknownTab(tab.to_string()));
        }

        if self.is_degraded() {
            warn!(tab, "store degraded; switching without reloading");
            self.ensure_loaded(tab).await?;
            return self.registry.activate(tab);
        }

        let loaded = load_game(&self.store, tab).await;
        match loaded {
            Ok(entry) => {
                let record = entry.map(|entry| entry.record).unwrap_or_default();
                self.registry.store_record(tab, record)?;
                self.registry.activate(tab)?;
                info!(tab, "switched tab");
                Ok(())
            }
            Err(err) => {
                let err = self.degrade(err);
                if self.registry.record(tab).is_some() {
                    self.registry.activate(tab)?;
                }
                Err(err)
            }
        }
    }

    /// Add a resource or product to `tab`.
    pub async fn add_resource(
        &mut self,
        tab: &str,
        resource: Resource,
    ) -> Result<String, LedgerError> {
        self.ensure_loaded(tab).await?;
        let name = self.record_mut(tab)?.add_resource(resource)?.name.clone();
        debug!(tab, resource = %name, "added resource");
        self.persist_record(tab).await?;
        Ok(name)
    }

    /// Remove a resource or product from `tab`. Dependants are left dangling.
    pub async fn remove_resource(&mut self, tab: &str, name: &str) -> Result<Resource, LedgerError> {
        self.ensure_loaded(tab).await?;
        let removed = self.record_mut(tab)?.remove_resource(name)?;
        debug!(tab, resource = name, "removed resource");
        self.persist_record(tab).await?;
        Ok(removed)
    }

    /// Replace a resource or product in place.
    pub async fn edit_resource(
        &mut self,
        tab: &str,
        original: &str,
        replacement: Resource,
    ) -> Result<String, LedgerError> {
        self.ensure_loaded(tab).await?;
        let name = self
            .record_mut(tab)?
            .edit_resource(original, replacement)?
            .name
            .clone();
        debug!(tab, from = original, to = %name, "edited resource");
        self.persist_record(tab).await?;
        Ok(name)
    }

    /// Add a job to `tab`.
    pub async fn add_job(&mut self, tab: &str, job: Job) -> Result<String, LedgerError> {
        self.ensure_loaded(tab).await?;
        let name = self.record_mut(tab)?.add_job(job)?.name.clone();
        debug!(tab, job = %name, "added job");
        self.persist_record(tab).await?;
        Ok(name)
    }

    /// Remove a job from `tab`.
    pub async fn remove_job(&mut self, tab: &str, name: &str) -> Result<Job, LedgerError> {
        self.ensure_loaded(tab).await?;
        let removed = self.record_mut(tab)?.remove_job(name)?;
        debug!(tab, job = name, "removed job");
        self.persist_record(tab).await?;
        Ok(removed)
    }

    /// Replace a job in place.
    pub async fn edit_job(
        &mut self,
        tab: &str,
        original: &str,
        replacement: Job,
    ) -> Result<String, LedgerError> {
        self.ensure_loaded(tab).await?;
        let name = self
            .record_mut(tab)?
            .edit_job(original, replacement)?
            .name
            .clone();
        debug!(tab, from = original, to = %name, "edited job");
        self.persist_record(tab).await?;
        Ok(name)
    }

    /// Shopping list for a product or job of a loaded tab.
    pub fn shopping_list(
        &self,
        tab: &str,
        target: &ShoppingTarget,
        view: TotalsView,
    ) -> Result<ShoppingList, LedgerError> {
        let record = self
            .registry
            .record(tab)
            .ok_or_else(|| LedgerError::UnknownTab(tab.to_string()))?;
        match target {
            ShoppingTarget::Product(name) => {
                let product = record
                    .resource(name)
                    .ok_or_else(|| LedgerError::UnknownResource(name.clone()))?;
                match view {
                    TotalsView::Direct => Ok(shopping::totals(product, &record.resources)),
                    TotalsView::Exploded => shopping::exploded_totals(product, &record.resources),
                }
            }
            ShoppingTarget::Job(name) => {
                let job = record
                    .job(name)
                    .ok_or_else(|| LedgerError::UnknownJob(name.clone()))?;
                match view {
                    TotalsView::Direct => Ok(shopping::job_totals(job, &record.resources)),
                    TotalsView::Exploded => shopping::exploded_job_totals(job, &record.resources),
                }
            }
        }
    }

    /// Write every loaded record and the tab list, leaving degraded mode on success.
    pub async fn flush(&mut self) -> Result<(), LedgerError> {
        if !self.registry_verified {
            self.reconcile().await?;
        }
        let stale: Vec<String> = self
            .stale_keys
            .iter()
            .filter(|key| !self.registry.contains(key))
            .cloned()
            .collect();
        for key in &stale {
            let result = self.store.delete(key).await;
            if let Err(err) = result {
                return Err(self.degrade(err));
            }
            debug!(key = %key, "removed record of renamed tab");
        }
        self.stale_keys.clear();

        let mut failure: Option<StoreError> = None;
        let mut saved_at = None;
        for (tab, record) in self.registry.loaded() {
            match save_game(&self.store, tab, record).await {
                Ok(at) => saved_at = Some(at),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if failure.is_none() {
            if let Err(err) = save_tabs(&self.store, self.registry.names()).await {
                failure = Some(err);
            }
        }
        if let Some(err) = failure {
            return Err(self.degrade(err));
        }

        if self.is_degraded() {
            info!("store reachable again; persistence restored");
        }
        self.persistence = Persistence::Online;
        self.last_saved = saved_at.or(self.last_saved);
        Ok(())
    }

    /// Execute a [`Command`].
    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome, LedgerError> {
        debug!(?command, "dispatch");
        match command {
            Command::CreateTab => self.create_tab().await.map(Outcome::TabCreated),
            Command::RenameTab { from, to } => {
                let to = self.rename_tab(&from, &to).await?;
                Ok(Outcome::TabRenamed { from, to })
            }
            Command::SwitchTab(tab) => {
                self.switch_tab(&tab).await?;
                Ok(Outcome::TabSwitched(tab))
            }
            Command::AddResource { tab, resource } => self
                .add_resource(&tab, resource)
                .await
                .map(Outcome::ResourceAdded),
            Command::RemoveResource { tab, name } => {
                let removed = self.remove_resource(&tab, &name).await?;
                Ok(Outcome::ResourceRemoved(removed.name))
            }
            Command::EditResource {
                tab,
                original,
                replacement,
            } => {
                let to = self.edit_resource(&tab, &original, replacement).await?;
                Ok(Outcome::ResourceEdited { from: original, to })
            }
            Command::AddJob { tab, job } => self.add_job(&tab, job).await.map(Outcome::JobAdded),
            Command::RemoveJob { tab, name } => {
                let removed = self.remove_job(&tab, &name).await?;
                Ok(Outcome::JobRemoved(removed.name))
            }
            Command::EditJob {
                tab,
                original,
                replacement,
            } => {
                let to = self.edit_job(&tab, &original, replacement).await?;
                Ok(Outcome::JobEdited { from: original, to })
            }
            Command::ShoppingList { tab, target, view } => {
                self.ensure_loaded(&tab).await?;
                self.shopping_list(&tab, &target, view)
                    .map(Outcome::ShoppingList)
            }
            Command::Flush => {
                self.flush().await?;
                Ok(Outcome::Flushed)
            }
        }
    }

    /// Read `tab` from the store unless it is already in memory. Reads are
    /// attempted even while degraded; a failed read leaves the tab unloaded.
    async fn ensure_loaded(&mut self, tab: &str) -> Result<(), LedgerError> {
        if !self.registry.contains(tab) {
            return Err(LedgerError::UnknownTab(tab.to_string()));
        }
        if self.registry.record(tab).is_some() {
            return Ok(());
        }
        let record = load_game(&self.store, tab)
            .await?
            .map(|entry| entry.record)
            .unwrap_or_default();
        debug!(tab, "loaded tab record");
        self.registry.store_record(tab, record)
    }

    /// Merge the stored tab list and records into a registry that was built
    /// without reading them.
    async fn reconcile(&mut self) -> Result<(), LedgerError> {
        let stored = match load_tabs(&self.store).await {
            Ok(names) => stored_tab_names(names),
            Err(err) => return Err(self.degrade(err)),
        };
        let mut placeholders: Vec<String> = self.placeholders.iter().cloned().collect();
        placeholders.sort();
        for tab in placeholders {
            if !stored.contains(&tab) {
                continue;
            }
            let loaded = load_game(&self.store, &tab).await;
            let mut merged = match loaded {
                Ok(entry) => entry.map(|entry| entry.record).unwrap_or_default(),
                Err(err) => return Err(self.degrade(err)),
            };
            if let Some(local) = self.registry.record(&tab) {
                merged.absorb(local.clone());
            }
            self.registry.store_record(&tab, merged)?;
        }
        self.registry.adopt_stored_names(stored);
        self.placeholders.clear();
        self.registry_verified = true;
        info!(tabs = self.registry.names().len(), "merged with stored tab list");
        Ok(())
    }

    fn record_mut(&mut self, tab: &str) -> Result<&mut GameRecord, LedgerError> {
        self.registry
            .record_mut(tab)
            .ok_or_else(|| LedgerError::UnknownTab(tab.to_string()))
    }

    async fn persist_record(&mut self, tab: &str) -> Result<(), LedgerError> {
        if self.is_degraded() {
            debug!(tab, "store degraded; keeping change in memory");
            return Ok(());
        }
        let Some(record) = self.registry.record(tab) else {
            return Ok(());
        };
        let result = save_game(&self.store, tab, record).await;
        match result {
            Ok(saved_at) => {
                self.last_saved = Some(saved_at);
                Ok(())
            }
            Err(err) => Err(self.degrade(err)),
        }
    }

    async fn persist_tab_list(&mut self) -> Result<(), LedgerError> {
        if self.is_degraded() {
            return Ok(());
        }
        let result = save_tabs(&self.store, self.registry.names()).await;
        result.map_err(|err| self.degrade(err))
    }

    async fn commit_rename(
        &self,
        from: &str,
        to: &str,
        record: &GameRecord,
        names: &[String],
    ) -> Result<(), LedgerError> {
        let previous = self.store.get(to).await?;
        if let Err(err) = save_game(&self.store, to, record).await {
            error!(%err, from, to, "rename failed writing new record");
            return Err(err.into());
        }
        if let Err(err) = self.store.delete(from).await {
            error!(%err, from, to, "rename failed removing old record; rolling back");
            self.restore(to, previous).await;
            return Err(err.into());
        }
        if let Err(err) = save_tabs(&self.store, names).await {
            error!(%err, from, to, "rename failed writing tab list; rolling back");
            if let Err(restore) = save_game(&self.store, from, record).await {
                warn!(%restore, tab = from, "could not restore record during rollback");
            }
            self.restore(to, previous).await;
            return Err(err.into());
        }
        Ok(())
    }

    /// Put back what `key` held before a rename, or remove it if it held nothing.
    async fn restore(&self, key: &str, previous: Option<serde_json::Value>) {
        let result = match previous {
            Some(value) => self.store.put(key, value).await,
            None => self.store.delete(key).await,
        };
        if let Err(err) = result {
            warn!(%err, key, "could not restore record during rollback");
        }
    }

    fn degrade(&mut self, err: StoreError) -> LedgerError {
        error!(%err, "store write failed; continuing in memory only");
        self.persistence = Persistence::Degraded {
            reason: err.to_string(),
        };
        LedgerError::StoreUnavailable(err)
    }
}

fn stored_tab_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && name != TABS_KEY)
        .collect()
}

async fn bootstrap<S: Store>(
    store: &S,
    default_tab: &str,
) -> Result<(TabRegistry, Option<DateTime<Utc>>), StoreError> {
    let names = stored_tab_names(load_tabs(store).await?);

    match names.first() {
        Some(first) => {
            let entry = load_game(store, first).await?;
            let saved_at = entry.as_ref().and_then(|entry| entry.saved_at);
            let record = entry.map(|entry| entry.record).unwrap_or_default();
            let registry = TabRegistry::from_names(names.clone(), record)
                .unwrap_or_else(|| TabRegistry::new(default_tab, GameRecord::default()));
            info!(
                tabs = registry.names().len(),
                active = registry.active(),
                "loaded tab registry"
            );
            Ok((registry, saved_at))
        }
        None => {
            let record = GameRecord::default();
            let saved_at = save_game(store, default_tab, &record).await?;
            save_tabs(store, &[default_tab.to_string()]).await?;
            info!(tab = default_tab, "created default tab");
            Ok((TabRegistry::new(default_tab, record), Some(saved_at)))
        }
    }
}
