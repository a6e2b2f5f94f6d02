//! # Reprise - Tiered Practice Queue
//!
//! Reprise decides which recorded drill to practise next. Recordings live in
//! numbered tiers; a weighted draw picks a tier and an unplayed recording
//! inside it, and recordings that have been practised enough move down to
//! the tier below.
//!
//! ## Usage
//!
//! ```bash
//! # Register new recordings found in a folder
//! reprise scan ~/recordings/new --apply
//!
//! # Practise
//! reprise next
//! reprise done <identity>
//!
//! # Inspect
//! reprise status
//! reprise history
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use reprise::cli::{self, Command};
use reprise::config::Settings;
use reprise::demotion::Demotion;
use reprise::engine;
use reprise::error::EngineError;
use reprise::lock::StoreLock;
use reprise::{completion, intake, snapshot};
use std::path::{Path, PathBuf};

/// Main entry point for the Reprise application.
///
/// Initializes logging, parses command-line arguments, loads settings and
/// routes commands. Commands that write the store hold the store lock for
/// their whole load, mutate and flush cycle.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug reprise next` - Enable debug logging
/// - `RUST_LOG=reprise::demotion=trace reprise done <id>` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match &args.command {
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
            return Ok(());
        }
        Command::CompleteIdentities { fish } => {
            // Completion must never fail loudly.
            if let Ok((_, settings)) = load_settings(&args) {
                if let Ok(store) = snapshot::load_store(&settings.store_path) {
                    completion::write_identity_completions(&mut std::io::stdout(), &store, *fish)?;
                }
            }
            return Ok(());
        }
        _ => {}
    }

    let (settings_path, settings) = load_settings(&args)?;
    let _lock = if args.command.mutates_store() {
        Some(StoreLock::acquire(&settings.store_path)?)
    } else {
        None
    };

    match args.command {
        Command::Next => next(&settings)?,
        Command::Done { identity } => done(&settings, &identity)?,
        Command::Adjust => adjust(&settings)?,
        Command::Register { titles } => register(&settings_path, settings, &titles)?,
        Command::Scan { folder, apply } => scan(&settings_path, settings, &folder, apply)?,
        Command::Move { identity, tier } => {
            let store = snapshot::load_store(&settings.store_path)?;
            let moved = engine::move_record(&store, &identity, tier)?;
            snapshot::save_store(&settings.store_path, &moved)?;
            println!("Moved {identity} to tier {tier}");
        }
        Command::History => history(&settings)?,
        Command::Status => status(&settings)?,
        Command::Completion { .. } | Command::CompleteIdentities { .. } => {}
    }

    Ok(())
}

/// Load the settings file and apply the per-invocation overrides.
fn load_settings(args: &cli::Args) -> Result<(PathBuf, Settings)> {
    let path = match &args.settings {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };
    debug!("Using settings file {}", path.display());

    let mut settings = Settings::load(&path)?;
    if let Some(strategy) = args.strategy {
        settings.engine.weighting = strategy;
    }
    if let Some(exp_base) = args.exp_base {
        settings.engine.exp_base = exp_base;
    }
    settings.engine.validate().context("Invalid weighting override")?;

    Ok((path, settings))
}

fn nothing_to_play(err: &EngineError) {
    info!("{err}");
    println!("Nothing to play: {err}");
}

fn next(settings: &Settings) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    let mut rng = rand::thread_rng();

    let pick = match engine::pick_next(&store, &settings.engine, &mut rng) {
        Ok(pick) => pick,
        Err(err) if err.is_nothing_to_play() => {
            nothing_to_play(&err);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if pick.reset {
        info!("Tier {} started over", pick.tier);
        snapshot::save_store(&settings.store_path, &pick.store)?;
    }

    println!("tier:     {}", pick.tier);
    println!("title:    {}", pick.record.title);
    println!("identity: {}", pick.identity);
    println!("url:      {}", settings.playback_url(&pick.record.title));
    Ok(())
}

fn done(settings: &Settings, identity: &str) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    let completed = engine::report_completion(&store, identity)?;
    let (rebalanced, demotions) = engine::run_demotion(&completed)?;

    let history = snapshot::load_history(&settings.history_path, settings.engine.history_capacity)?;
    let history = engine::append_history(&history, identity, settings.engine.history_capacity);

    snapshot::save_store(&settings.store_path, &rebalanced)?;
    snapshot::save_history(&settings.history_path, &history)?;

    if let Some((tier, record)) = rebalanced.find(identity) {
        println!("{} (tier {tier}) played {} time(s)", record.title, record.play_count);
    }
    print_demotions(&demotions);
    Ok(())
}

fn adjust(settings: &Settings) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    let (rebalanced, demotions) = engine::run_demotion(&store)?;
    if demotions.is_empty() {
        println!("No records to demote");
        return Ok(());
    }
    snapshot::save_store(&settings.store_path, &rebalanced)?;
    print_demotions(&demotions);
    Ok(())
}

fn print_demotions(demotions: &[Demotion]) {
    for demotion in demotions {
        println!(
            "Demoted {} from tier {} to tier {}",
            demotion.title, demotion.from, demotion.to
        );
    }
}

fn register(settings_path: &Path, mut settings: Settings, titles: &[String]) -> Result<()> {
    let mut store = snapshot::load_store(&settings.store_path)?;
    let mut counter = settings.sequence;

    let mut registered = Vec::with_capacity(titles.len());
    for title in titles {
        let registration = engine::register(&store, counter, title)
            .with_context(|| format!("Failed to register '{title}'"))?;
        store = registration.store;
        counter = registration.counter;
        registered.push((registration.tier, registration.record));
    }

    // Counter first: a burned sequence number is harmless, a reused one is not.
    settings.sequence = counter;
    settings.save(settings_path)?;
    snapshot::save_store(&settings.store_path, &store)?;

    for (tier, record) in registered {
        println!("Registered {} in tier {tier} as {}", record.title, record.identity);
    }
    Ok(())
}

fn scan(settings_path: &Path, mut settings: Settings, folder: &Path, apply: bool) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    let candidates = intake::scan_folder(folder)?;
    let check = intake::check_candidates(&store, &candidates);

    match check.target_tier() {
        Some(tier) => println!("{} valid, target tier {tier}", check.valid.len()),
        None => println!("{} valid, no tier left above {}", check.valid.len(), check.last_tier),
    }
    for title in &check.valid {
        println!("  + {title}");
    }
    for title in &check.invalid {
        println!("  ! {title} (invalid characters)");
    }
    for title in &check.duplicate {
        println!("  = {title} (already registered)");
    }

    if !apply || check.valid.is_empty() {
        return Ok(());
    }

    let batch = intake::register_batch(&store, settings.sequence, &check.valid)?;
    settings.sequence = batch.counter;
    settings.save(settings_path)?;
    snapshot::save_store(&settings.store_path, &batch.store)?;
    println!("Registered {} records into tier {}", batch.records.len(), batch.tier);
    Ok(())
}

fn history(settings: &Settings) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    let log = snapshot::load_history(&settings.history_path, settings.engine.history_capacity)?;
    for entry in engine::resolve_history(&log, &store) {
        println!(
            "{}\t{}\t{}\tplayed {}",
            entry.tier, entry.title, entry.identity, entry.play_count
        );
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    let store = snapshot::load_store(&settings.store_path)?;
    println!(
        "{} records, {} weighting, exp base {}",
        store.len(),
        settings.engine.weighting,
        settings.engine.exp_base
    );

    let probabilities = match engine::tier_probabilities(&store, &settings.engine) {
        Ok(probabilities) => probabilities,
        Err(err) if err.is_nothing_to_play() => {
            nothing_to_play(&err);
            Default::default()
        }
        Err(err) => return Err(err.into()),
    };

    for summary in store.tier_summary() {
        let weight = probabilities.get(&summary.tier).copied().unwrap_or(0.0);
        println!(
            "tier {:>3}: {:>4} records, {:>4} unplayed, p = {:.3}",
            summary.tier, summary.count, summary.unplayed, weight
        );
    }
    Ok(())
}
