//! Persistent alarm store.
//!
//! [`AlarmService`] owns the alarm collection and its document path. Every
//! mutation is flushed to disk with write-then-rename before the call
//! returns. The due check evaluates each alarm against local time, disables
//! one-shot alarms, notifies the observer, starts the alarm sound and deletes
//! remove-after-trigger alarms.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kiosk::alarm::{AlarmService, MockAlarmObserver};
//! use kiosk::types::Alarm;
//!
//! let service = AlarmService::open("data/alarms.json");
//! service.add(Alarm::new("a1", 7, 0).with_label("wake up"))?;
//!
//! let observer = Arc::new(MockAlarmObserver::new());
//! service.set_observer(observer.clone());
//! service.check_due_now();
//! # Ok::<(), kiosk::alarm::AlarmError>(())
//! ```

pub mod error;
pub mod schedule;
pub mod storage;
pub mod trigger;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

pub use error::{AlarmError, Result};
pub use schedule::should_fire;
pub use trigger::{AlarmObserver, ChannelAlarmObserver, MockAlarmObserver};

use crate::sound::{HelperSoundLauncher, SoundLauncher};
use crate::types::Alarm;

/// Default alarm document file name.
pub const DEFAULT_ALARM_FILE: &str = "alarms.json";

// ============================================================================
// AlarmService
// ============================================================================

/// Alarm store backed by a JSON document.
///
/// All methods take `&self`; a single mutex guards the whole collection so
/// the due check and user edits may run on different threads. Callers only
/// ever receive copies of alarm records.
pub struct AlarmService {
    /// Canonical document path
    path: PathBuf,
    /// The collection, in insertion order
    alarms: Mutex<Vec<Alarm>>,
    /// Serializes due checks so an alarm cannot fire twice concurrently
    due_check: Mutex<()>,
    /// Single observer slot
    observer: RwLock<Option<Arc<dyn AlarmObserver>>>,
    /// Sound side effect
    sound: Arc<dyn SoundLauncher>,
}

impl AlarmService {
    /// Opens the store at `path`, loading any existing document.
    ///
    /// A missing or malformed document starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let alarms = storage::load(&path);
        info!("Alarm store opened at {:?} with {} alarm(s)", path, alarms.len());
        Self {
            path,
            alarms: Mutex::new(alarms),
            due_check: Mutex::new(()),
            observer: RwLock::new(None),
            sound: Arc::new(HelperSoundLauncher::default()),
        }
    }

    /// Opens the store for `file` inside `data_dir`.
    pub fn open_in(data_dir: impl AsRef<Path>, file: &str) -> Self {
        Self::open(data_dir.as_ref().join(file))
    }

    /// Replaces the sound launcher.
    #[must_use]
    pub fn with_sound_launcher(mut self, sound: Arc<dyn SoundLauncher>) -> Self {
        self.sound = sound;
        self
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers the trigger observer, replacing any previous one.
    pub fn set_observer(&self, observer: Arc<dyn AlarmObserver>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    /// Removes the trigger observer.
    pub fn clear_observer(&self) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ------------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------------

    /// Appends `alarm` and persists the collection.
    ///
    /// # Errors
    ///
    /// Returns `AlarmError::InvalidAlarm` for an empty id or out-of-range
    /// time, `AlarmError::DuplicateId` if the id is taken, and a storage
    /// error if persisting fails (the alarm stays in memory).
    pub fn add(&self, alarm: Alarm) -> Result<()> {
        alarm.validate().map_err(AlarmError::InvalidAlarm)?;

        let mut alarms = self.lock_alarms();
        if alarms.iter().any(|a| a.id == alarm.id) {
            return Err(AlarmError::DuplicateId(alarm.id));
        }
        debug!("Adding alarm {} at {}", alarm.id, alarm.time_string());
        alarms.push(alarm);
        self.persist(&alarms)
    }

    /// Replaces the alarm with `id` in place.
    ///
    /// Returns `Ok(false)` if no alarm has that id.
    ///
    /// # Errors
    ///
    /// Returns `AlarmError::InvalidAlarm` on validation failure,
    /// `AlarmError::DuplicateId` if `alarm.id` belongs to another record, and
    /// a storage error if persisting fails (the update stays in memory).
    pub fn update(&self, id: &str, alarm: Alarm) -> Result<bool> {
        alarm.validate().map_err(AlarmError::InvalidAlarm)?;

        let mut alarms = self.lock_alarms();
        let Some(index) = alarms.iter().position(|a| a.id == id) else {
            return Ok(false);
        };
        if alarm.id != id && alarms.iter().any(|a| a.id == alarm.id) {
            return Err(AlarmError::DuplicateId(alarm.id));
        }
        debug!("Updating alarm {}", id);
        alarms[index] = alarm;
        self.persist(&alarms)?;
        Ok(true)
    }

    /// Deletes the alarm with `id`.
    ///
    /// Returns `Ok(false)` if no alarm has that id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails (the alarm stays deleted).
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut alarms = self.lock_alarms();
        let before = alarms.len();
        alarms.retain(|a| a.id != id);
        if alarms.len() == before {
            return Ok(false);
        }
        debug!("Removed alarm {}", id);
        self.persist(&alarms)?;
        Ok(true)
    }

    /// Sets the enabled flag of the alarm with `id`.
    ///
    /// Returns `Ok(false)` if no alarm has that id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails (the flag stays set).
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let mut alarms = self.lock_alarms();
        let Some(alarm) = alarms.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        alarm.enabled = enabled;
        debug!("Alarm {} enabled={}", id, enabled);
        self.persist(&alarms)?;
        Ok(true)
    }

    /// Returns a copy of the collection in insertion order.
    pub fn list(&self) -> Vec<Alarm> {
        self.lock_alarms().clone()
    }

    /// Returns a copy of the alarm with `id`.
    pub fn get(&self, id: &str) -> Option<Alarm> {
        self.lock_alarms().iter().find(|a| a.id == id).cloned()
    }

    /// Number of stored alarms.
    pub fn len(&self) -> usize {
        self.lock_alarms().len()
    }

    /// Returns true if the store holds no alarms.
    pub fn is_empty(&self) -> bool {
        self.lock_alarms().is_empty()
    }

    /// Flushes the current collection to disk.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisting fails.
    pub fn save_now(&self) -> Result<()> {
        let alarms = self.lock_alarms();
        self.persist(&alarms)
    }

    // ------------------------------------------------------------------------
    // Due check
    // ------------------------------------------------------------------------

    /// Runs the due check against the current local time.
    pub fn check_due_now(&self) -> Vec<Alarm> {
        self.check_due(Local::now().naive_local())
    }

    /// Fires every alarm due at local time `now`, in insertion order.
    ///
    /// For each due alarm: a one-shot alarm without remove-after-trigger is
    /// disabled and persisted first, then the observer is notified, then the
    /// sound helper is started if a sound is set. Remove-after-trigger alarms
    /// are deleted once all notifications are done.
    ///
    /// Returns copies of the fired alarms as the observer saw them. Storage
    /// and sound failures are logged, never returned.
    pub fn check_due(&self, now: NaiveDateTime) -> Vec<Alarm> {
        let _serialized = self
            .due_check
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let fired = self.mark_due(now);
        if fired.is_empty() {
            return fired;
        }

        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for alarm in &fired {
            info!("Alarm {} ({}) fired at {}", alarm.id, alarm.label, alarm.time_string());
            if let Some(observer) = &observer {
                observer.on_alarm(alarm);
            }
            if alarm.has_sound() {
                if let Err(e) = self.sound.launch(&alarm.sound) {
                    warn!("Failed to start sound for alarm {}: {}", alarm.id, e);
                }
            }
        }

        let expired: Vec<&str> = fired
            .iter()
            .filter(|a| a.remove_after_trigger)
            .map(|a| a.id.as_str())
            .collect();
        if !expired.is_empty() {
            let mut alarms = self.lock_alarms();
            alarms.retain(|a| !expired.contains(&a.id.as_str()));
            debug!("Removed {} alarm(s) after trigger", expired.len());
            if let Err(e) = self.persist(&alarms) {
                warn!("Alarm removal after trigger not persisted: {}", e);
            }
        }

        fired
    }

    /// Collects due alarms and disables fired one-shots under one lock.
    fn mark_due(&self, now: NaiveDateTime) -> Vec<Alarm> {
        let mut alarms = self.lock_alarms();
        let mut fired = Vec::new();
        let mut disabled_any = false;

        for alarm in alarms.iter_mut() {
            if !should_fire(alarm, now) {
                continue;
            }
            // Remove-after-trigger takes precedence over disable-on-fire.
            if alarm.is_one_shot() && !alarm.remove_after_trigger {
                alarm.enabled = false;
                disabled_any = true;
            }
            fired.push(alarm.clone());
        }

        if disabled_any {
            if let Err(e) = self.persist(&alarms) {
                warn!("One-shot alarm disable not persisted: {}", e);
            }
        }
        fired
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn lock_alarms(&self) -> MutexGuard<'_, Vec<Alarm>> {
        self.alarms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, alarms: &[Alarm]) -> Result<()> {
        storage::save(&self.path, alarms).inspect_err(|e| {
            warn!("Alarm document {:?} not updated: {}", self.path, e);
        })
    }
}

impl std::fmt::Debug for AlarmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmService")
            .field("path", &self.path)
            .field("alarms", &self.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
