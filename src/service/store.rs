//! User Store
//!
//! Owns every live user session and serializes mutations per user.
//!
//! ## Locking
//!
//! ```text
//! sessions: RwLock<BTreeMap<UserId, Arc<Mutex<UserSession>>>>
//!              │ read: look up the session, release the map
//!              ▼
//!           Mutex<UserSession>  regen → tap → diff → snapshot (no awaits)
//!              │ release
//!              ▼
//!           SnapshotSink::persist
//! ```
//!
//! The map lock is only written on register/restore. Two taps for the same
//! user queue on the session mutex, so the energy check and its spend can
//! never interleave.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::game::combo::{self, StreakChange};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::energy;
use crate::game::events::{diff_events, GameEvent, GameEventData};
use crate::game::hud::HudView;
use crate::game::reward::{self, TapOutcome};
use crate::game::state::{Millis, UserId, UserState};
use crate::service::clock::Clock;
use crate::service::sync::{SnapshotError, SnapshotSink, UserSnapshot};

/// A user's live state and its private random stream.
#[derive(Debug)]
pub struct UserSession {
    state: UserState,
    rng: DeterministicRng,
    version: u64,
}

impl UserSession {
    fn snapshot(&self) -> UserSnapshot {
        UserSnapshot::capture(&self.state, &self.rng, self.version)
    }
}

/// Everything a tap produced.
#[derive(Clone, Debug)]
pub struct TapReport {
    /// Outcome of the tap
    pub outcome: TapOutcome,
    /// Milestones crossed by this tap (and the regen before it)
    pub events: Vec<GameEvent>,
    /// State after the tap
    pub snapshot: UserSnapshot,
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No session for this user.
    #[error("unknown user {0}")]
    UnknownUser(String),

    /// A session already exists for this user.
    #[error("user {0} is already registered")]
    AlreadyRegistered(String),

    /// Snapshot rejected.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Concurrent home of all user sessions.
pub struct UserStore {
    /// Validated economy constants
    config: Arc<GameConfig>,
    /// Root of every per-user seed
    master_seed: u64,
    /// Active sessions
    sessions: RwLock<BTreeMap<UserId, Arc<Mutex<UserSession>>>>,
    /// Persistence collaborator
    sink: Arc<dyn SnapshotSink>,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl UserStore {
    /// Validate `config` and build an empty store.
    pub fn new(
        config: GameConfig,
        master_seed: u64,
        sink: Arc<dyn SnapshotSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            master_seed,
            sessions: RwLock::new(BTreeMap::new()),
            sink,
            clock,
        })
    }

    /// Store config.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Create a fresh session for `user_id`.
    pub async fn register(&self, user_id: UserId) -> Result<UserSnapshot, StoreError> {
        let now = self.clock.now_ms();
        let session = UserSession {
            state: UserState::new(user_id, &self.config, now),
            rng: DeterministicRng::for_user(self.master_seed, user_id.as_bytes()),
            version: 0,
        };
        let snapshot = session.snapshot();

        {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&user_id) {
                return Err(StoreError::AlreadyRegistered(user_id.short()));
            }
            sessions.insert(user_id, Arc::new(Mutex::new(session)));
        }

        info!("Registered user {}", user_id.short());
        self.sink.persist(snapshot.clone());
        Ok(snapshot)
    }

    /// Load a persisted session, replacing any live one.
    ///
    /// A snapshot taken under a different energy limit is moved onto the
    /// store's limit (stored taps clamped) and persisted as a new version.
    pub async fn restore(&self, snapshot: UserSnapshot) -> Result<(), StoreError> {
        snapshot.verify()?;
        let user_id = snapshot.user_id;
        let mut session = UserSession {
            state: snapshot.state,
            rng: snapshot.rng,
            version: snapshot.version,
        };

        let limit = self.config.energy_limit;
        let resized = if session.state.energy_limit != limit {
            warn!("User {} snapshot energy limit {} replaced by {}",
                  user_id.short(), session.state.energy_limit, limit);
            session.state.energy_limit = limit;
            session.state.taps_left = session.state.taps_left.min(limit);
            session.version += 1;
            Some(session.snapshot())
        } else {
            None
        };
        let version = session.version;

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(user_id, Arc::new(Mutex::new(session)));
        }

        info!("Restored user {} at version {}", user_id.short(), version);
        if let Some(snapshot) = resized {
            self.sink.persist(snapshot);
        }
        Ok(())
    }

    /// Tap now.
    pub async fn tap(&self, user_id: &UserId) -> Result<TapReport, StoreError> {
        let now = self.clock.now_ms();
        self.tap_at(user_id, now).await
    }

    /// Tap at an explicit time (replays, tests).
    pub async fn tap_at(&self, user_id: &UserId, now: Millis) -> Result<TapReport, StoreError> {
        let session = self.session(user_id).await?;

        let (outcome, events, snapshot, changed) = {
            let mut guard = session.lock().await;
            let UserSession { state, rng, version } = &mut *guard;
            let before = state.clone();

            let credited = energy::regen(state, now, &self.config);
            let refilled = credited > 0 && state.taps_left == state.energy_limit;
            let outcome = reward::tap(state, now, &self.config, rng);

            // The tap spends from a refilled bar, so the diff alone misses it
            let mut events = diff_events(&before, state, &self.config, now);
            if refilled {
                events.push(GameEvent::energy_refilled(now, credited));
                events.sort();
            }

            let changed = *state != before;
            if changed {
                *version += 1;
            }
            (outcome, events, guard.snapshot(), changed)
        };

        for event in &events {
            log_event(user_id, event);
        }
        if changed {
            self.sink.persist(snapshot.clone());
        }

        Ok(TapReport { outcome, events, snapshot })
    }

    /// Session-boundary signal for `day`.
    pub async fn begin_session(
        &self,
        user_id: &UserId,
        day: NaiveDate,
    ) -> Result<StreakChange, StoreError> {
        let session = self.session(user_id).await?;

        let (change, snapshot) = {
            let mut guard = session.lock().await;
            let change = combo::record_session(&mut guard.state, day);
            if matches!(change, StreakChange::Started | StreakChange::Extended) {
                guard.version += 1;
                (change, Some(guard.snapshot()))
            } else {
                (change, None)
            }
        };

        match change {
            StreakChange::Stale => {
                warn!("Dropped stale session signal for {} ({})", user_id.short(), day);
            }
            StreakChange::Started | StreakChange::Extended => {
                debug!("User {} streak {:?} on {}", user_id.short(), change, day);
            }
            StreakChange::Unchanged => {}
        }
        if let Some(snapshot) = snapshot {
            self.sink.persist(snapshot);
        }
        Ok(change)
    }

    /// Current snapshot without mutating anything.
    pub async fn snapshot(&self, user_id: &UserId) -> Result<UserSnapshot, StoreError> {
        let session = self.session(user_id).await?;
        let guard = session.lock().await;
        Ok(guard.snapshot())
    }

    /// Display model as of now. Energy is shown regenerated but the stored
    /// state is left alone.
    pub async fn hud(&self, user_id: &UserId) -> Result<HudView, StoreError> {
        let session = self.session(user_id).await?;
        let mut preview = session.lock().await.state.clone();
        let now = self.clock.now_ms();
        energy::regen(&mut preview, now, &self.config);
        Ok(HudView::from_state(&preview, &self.config, now))
    }

    /// Number of live sessions.
    pub async fn user_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    async fn session(&self, user_id: &UserId) -> Result<Arc<Mutex<UserSession>>, StoreError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::UnknownUser(user_id.short()))
    }
}

fn log_event(user_id: &UserId, event: &GameEvent) {
    match &event.data {
        GameEventData::LevelUp { from, to } => {
            debug!("User {} level {} -> {}", user_id.short(), from, to);
        }
        GameEventData::RankUp { to, title, .. } => {
            debug!("User {} reached rank {} ({})", user_id.short(), to, title);
        }
        GameEventData::ComboHot { combo } => {
            debug!("User {} combo hot at {}", user_id.short(), combo);
        }
        _ => {}
    }
}
