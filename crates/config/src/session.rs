use std::time::{Duration, Instant};

use crate::auto_lock::{AutoLock, LockDecision, LockState};
use crate::error::Result;
use crate::session_config::SessionConfig;
use crate::settings::SettingsRecord;
use crate::store::SettingsStore;

/// One-time follow-ups found while restoring settings. The session only
/// records them; whoever owns the API client carries them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// The retired "nobody" peer-to-peer calls setting must be pushed to
    /// the server as a disallow-all privacy rule.
    DisallowPeerToPeerCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing was saved yet
    Fresh,
    /// Saved settings were applied
    Restored,
    /// Saved settings were unreadable, defaults kept
    Defaulted,
}

/// Call-once save timer. Scheduling again replaces the deadline, so a burst
/// of changes ends up as one write. A delay past the clock's range leaves
/// the save to [`Session::save_now`].
#[derive(Debug, Clone, Default)]
pub struct SaveDebounce {
    deadline: Option<Instant>,
}

impl SaveDebounce {
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = now.checked_add(delay);
        if self.deadline.is_none() {
            log::warn!("Save delay {:?} is out of range, not scheduling", delay);
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once when the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Owner of the logged-in user's settings.
///
/// Readers get `&SettingsRecord`; every write goes through
/// [`Session::update_settings`] so it is persisted.
pub struct Session<S: SettingsStore> {
    config: SessionConfig,
    store: S,
    settings: SettingsRecord,
    save: SaveDebounce,
    auto_lock: AutoLock,
    migrations: Vec<Migration>,
}

impl<S: SettingsStore> Session<S> {
    pub fn new(config: SessionConfig, store: S) -> Self {
        let auto_lock = AutoLock::new(config.auto_lock_timeout(), config.auto_lock_late_tolerance());
        Self {
            config,
            store,
            settings: SettingsRecord::default(),
            save: SaveDebounce::default(),
            auto_lock,
            migrations: Vec::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load and apply the saved settings blob.
    ///
    /// An unreadable blob is not fatal: the session keeps its defaults.
    /// Errors from the store itself are returned.
    pub fn restore(&mut self, now: Instant) -> Result<RestoreOutcome> {
        let Some(blob) = self.store.load()? else {
            return Ok(RestoreOutcome::Fresh);
        };

        match self.settings.apply_serialized(&blob) {
            Ok(notes) => {
                if notes.legacy_calls_peer_to_peer_nobody {
                    log::info!("Scheduling peer-to-peer calls privacy migration");
                    self.migrations.push(Migration::DisallowPeerToPeerCalls);
                    // Rewrite the blob without the legacy value
                    self.save_settings_delayed(now);
                }
                Ok(RestoreOutcome::Restored)
            }
            Err(e) => {
                log::warn!("Could not restore session settings, using defaults: {}", e);
                Ok(RestoreOutcome::Defaulted)
            }
        }
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    pub fn settings_snapshot(&self) -> SettingsRecord {
        self.settings.clone()
    }

    /// Change settings and schedule a debounced save.
    pub fn update_settings<F, R>(&mut self, now: Instant, f: F) -> R
    where
        F: FnOnce(&mut SettingsRecord) -> R,
    {
        let result = f(&mut self.settings);
        self.save_settings_delayed(now);
        result
    }

    pub fn save_settings_delayed(&mut self, now: Instant) {
        let delay = self.config.save_delay();
        self.save_settings_delayed_by(now, delay);
    }

    pub fn save_settings_delayed_by(&mut self, now: Instant, delay: Duration) {
        self.save.schedule(now, delay);
    }

    pub fn save_pending(&self) -> bool {
        self.save.is_pending()
    }

    /// Write the settings if the debounce deadline has passed.
    /// Returns whether a write happened.
    pub fn flush_due(&mut self, now: Instant) -> Result<bool> {
        if !self.save.take_due(now) {
            return Ok(false);
        }
        self.write()?;
        Ok(true)
    }

    /// Write immediately, dropping any pending debounced save.
    pub fn save_now(&mut self) -> Result<()> {
        self.save.cancel();
        self.write()
    }

    fn write(&mut self) -> Result<()> {
        let blob = self.settings.serialize();
        self.store.save(&blob)
    }

    /// Hand over queued one-time migrations.
    pub fn take_migrations(&mut self) -> Vec<Migration> {
        std::mem::take(&mut self.migrations)
    }

    // Auto-lock

    pub fn auto_lock(&self) -> &AutoLock {
        &self.auto_lock
    }

    pub fn set_auto_lock_timeout(&mut self, timeout: Duration) {
        self.auto_lock.set_timeout(timeout);
    }

    pub fn check_auto_lock(&mut self, now: Instant, state: &LockState) -> LockDecision {
        self.auto_lock.check(now, state)
    }

    pub fn check_auto_lock_in(&mut self, now: Instant, after: Duration) {
        self.auto_lock.check_in(now, after);
    }

    pub fn local_passcode_changed(&mut self, now: Instant, state: &LockState) -> LockDecision {
        self.auto_lock.passcode_changed(now, state)
    }

    pub fn passcode_lock_changed(&mut self) {
        self.auto_lock.lock_state_changed();
    }

    pub fn poll_auto_lock(&mut self, now: Instant, state: &LockState) -> Option<LockDecision> {
        self.auto_lock.poll(now, state)
    }
}
