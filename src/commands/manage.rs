use anyhow::{bail, Context, Result};
use chrono::Utc;

use herald::config::Config;
use herald::models::{Broadcast, Destination, MediaKind, NewBroadcast, Payload};
use herald::storage::{create_sqlite_store, SharedBroadcastStore};

/// Arguments for the add command
pub struct AddParams {
    pub destination: i64,
    pub text: String,
    pub interval: i64,
    pub duration: i64,
    pub media_kind: Option<String>,
    pub media_ref: Option<String>,
    pub thread: Option<i64>,
    pub button_text: Option<String>,
    pub button_url: Option<String>,
}

fn open_store(config: &Config) -> Result<SharedBroadcastStore> {
    create_sqlite_store(&config.database.sqlite_path)
        .with_context(|| format!("Failed to open {}", config.database.sqlite_path.display()))
}

/// Add a broadcast for a destination
pub fn add(config: &Config, params: AddParams) -> Result<()> {
    let mut payload = Payload::text(params.text);

    match (&params.media_kind, &params.media_ref) {
        (Some(kind), Some(file_ref)) => {
            let kind = MediaKind::from_str_opt(kind)
                .with_context(|| format!("Unknown media kind: {kind}"))?;
            payload = payload.with_media(kind, file_ref);
        }
        (None, None) => {}
        _ => bail!("--media-kind and --media-ref must be given together"),
    }

    if let Some(thread_id) = params.thread {
        payload = payload.with_thread(thread_id);
    }

    match (&params.button_text, &params.button_url) {
        (Some(text), Some(url)) => payload = payload.with_button(text, url),
        (None, None) => {}
        _ => bail!("--button-text and --button-url must be given together"),
    }

    let new = NewBroadcast {
        destination_id: params.destination,
        payload,
        interval_minutes: params.interval,
        duration_minutes: params.duration,
    };

    let store = open_store(config)?;
    let id = store.add_broadcast(&new, Utc::now().timestamp())?;

    println!(
        "Added broadcast {id} for destination {} (every {}m for {}m)",
        params.destination, params.interval, params.duration
    );
    Ok(())
}

/// List broadcasts for a destination
pub fn list(config: &Config, destination: i64, active_only: bool) -> Result<()> {
    let store = open_store(config)?;
    let broadcasts = store.list_broadcasts(destination, active_only)?;

    if broadcasts.is_empty() {
        println!("No broadcasts for destination {destination}");
        return Ok(());
    }

    println!("Broadcasts for destination {destination}");
    println!("=======================================");
    for b in &broadcasts {
        print_broadcast(b);
    }
    Ok(())
}

/// Toggle a broadcast between active and paused
pub fn toggle(config: &Config, id: i64, destination: i64) -> Result<()> {
    let store = open_store(config)?;

    let mut broadcast = store
        .get_broadcast(id)?
        .with_context(|| format!("No broadcast with id {id}"))?;
    if broadcast.destination_id != destination {
        bail!("Broadcast {id} does not belong to destination {destination}");
    }

    broadcast.is_active = !broadcast.is_active;
    store.update_broadcast(&broadcast)?;

    let state = if broadcast.is_active {
        "active"
    } else {
        "paused"
    };
    println!("Broadcast {id} is now {state}");
    Ok(())
}

/// Remove a broadcast
pub fn remove(config: &Config, id: i64, destination: i64) -> Result<()> {
    let store = open_store(config)?;

    if store.delete_broadcast(id, destination)? {
        println!("Removed broadcast {id}");
    } else {
        println!("No broadcast {id} for destination {destination}");
    }
    Ok(())
}

/// Enable or disable a destination
pub fn set_destination(config: &Config, id: i64, enabled: bool) -> Result<()> {
    let store = open_store(config)?;

    let mut destination = store.get_destination(id)?.unwrap_or_else(|| {
        // Explicit enable/disable may precede the first broadcast.
        Destination::new(id)
    });
    destination.is_enabled = enabled;
    store.save_destination(&destination)?;

    let state = if enabled { "enabled" } else { "disabled" };
    println!("Destination {id} is now {state}");
    Ok(())
}

/// Show a destination and its broadcasts
pub fn show_destination(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config)?;

    let Some(destination) = store.get_destination(id)? else {
        println!("No destination {id}");
        return Ok(());
    };

    println!("Destination {id}");
    println!("  Enabled: {}", destination.is_enabled);
    if !destination.operator_ids.is_empty() {
        println!("  Operators: {:?}", destination.operator_ids);
    }

    let broadcasts = store.list_broadcasts(id, false)?;
    println!("  Broadcasts: {}", broadcasts.len());
    for b in &broadcasts {
        print_broadcast(b);
    }
    Ok(())
}

fn print_broadcast(b: &Broadcast) {
    let state = if b.is_active { "active" } else { "paused" };
    let last = match b.last_sent_at {
        Some(ts) => format!("last sent at {ts}"),
        None => String::from("never sent"),
    };
    println!(
        "  #{} [{state}] every {}m for {}m, {last}: {}",
        b.id,
        b.interval_minutes,
        b.duration_minutes,
        summary(&b.payload.text)
    );
}

fn summary(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX).collect();
        format!("{head}...")
    }
}
