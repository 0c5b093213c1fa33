//! Tap Economy Server
//!
//! Runs a seeded demo session through the user store, then replays the same
//! taps through a bare engine to verify determinism.

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tap_economy::{
    VERSION,
    core::{format::format_number_with, hash::short_hex, rng::DeterministicRng},
    game::{
        config::GameConfig,
        events::GameEventData,
        hud::OutcomeBadge,
        reward::{OutcomeKind, TapEngine},
        state::{Millis, UserId},
    },
    service::{ManualClock, MemorySink, UserStore},
};

/// Demo taps
const DEMO_TAPS: u64 = 1_500;

/// Master seed for the demo store
const DEMO_SEED: u64 = 12345;

/// Gap before tap `i`: mostly fast bursts, a pause every 40 taps.
fn tap_gap(i: u64) -> Millis {
    if i % 40 == 39 {
        4_000
    } else {
        120 + (i * 37) % 180
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Tap Economy Server v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => GameConfig::default(),
    };
    info!("Config fingerprint: {}", short_hex(&config.fingerprint()));
    info!("Energy: {} taps, +1 every {} ms", config.energy_limit, config.recharge_interval_ms);

    demo_session(config).await
}

/// Demo function to exercise the store.
async fn demo_session(config: GameConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");

    let sink = Arc::new(MemorySink::new());
    let clock = Arc::new(ManualClock::new(0));
    let store = UserStore::new(config.clone(), DEMO_SEED, sink.clone(), clock.clone())?;

    let user = UserId::new([1; 16]);
    store.register(user).await?;
    info!("User: {}", user.to_uuid_string());

    let start_day = NaiveDate::from_ymd_opt(2024, 1, 1).context("bad demo date")?;
    store.begin_session(&user, start_day).await?;

    let fmt = |v| format_number_with(v, &config.number_suffixes);
    let mut now: Millis = 0;
    let mut criticals = 0u32;
    let mut jackpots = 0u32;
    let mut exhausted = 0u32;

    for i in 0..DEMO_TAPS {
        now += tap_gap(i);
        clock.set(now);
        let report = store.tap(&user).await?;

        match report.outcome.kind {
            _ if !report.outcome.success => exhausted += 1,
            OutcomeKind::Critical => criticals += 1,
            OutcomeKind::Jackpot => {
                jackpots += 1;
                if let Some(badge) = OutcomeBadge::for_outcome(&report.outcome, &config) {
                    info!("Tap {}: {}", i, badge.text);
                }
            }
            OutcomeKind::Normal => {}
        }

        for event in &report.events {
            match &event.data {
                GameEventData::RankUp { to, title, .. } => {
                    info!("Tap {}: rank {} reached ({})", i, to, title);
                }
                GameEventData::LevelUp { to, .. } if to % 5 == 0 => {
                    info!("Tap {}: level {}", i, to);
                }
                _ => {}
            }
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let snapshot = store.snapshot(&user).await?;
    let hud = store.hud(&user).await?;
    info!("Balance: {} ({} lifetime)", hud.balance, fmt(snapshot.state.total_earned));
    info!("Level {} ({}%), rank {} {}", hud.level, hud.xp_percent, hud.rank_icon, hud.rank_title);
    info!("Energy {}, combo {} ({}), streak {}", hud.energy, hud.combo, hud.multiplier, hud.streak);
    info!("Criticals: {}, jackpots: {}, exhausted: {}", criticals, jackpots, exhausted);
    info!("Persisted version: {:?}", sink.latest(&user).map(|s| s.version));
    info!("Final State Hash: {}", hex::encode(snapshot.state_hash));

    // Verify determinism by replaying through a bare engine
    info!("=== Verifying Determinism ===");
    let mut engine = TapEngine::new(config, DeterministicRng::for_user(DEMO_SEED, user.as_bytes()))?;
    let mut replay = engine.new_user(user, 0);
    engine.begin_session(&mut replay, start_day);

    let mut now: Millis = 0;
    for i in 0..DEMO_TAPS {
        now += tap_gap(i);
        engine.regen(&mut replay, now);
        engine.tap(&mut replay, now);
    }

    let replay_hash = replay.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if snapshot.state_hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        anyhow::bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}
