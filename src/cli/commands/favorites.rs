//! Favorite site commands.

use super::app::{App, block_on, print_mutation};
use crate::cli::FavoritesCommands;
use crate::error::{Error, Result};
use crate::model::{Collection, FavoriteEntry};
use crate::validate::find_similar_keys;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ListOutput<'a> {
    source: &'a str,
    count: usize,
    entries: &'a [FavoriteEntry],
}

/// Execute favorites commands.
pub fn execute(command: &FavoritesCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;
    match command {
        FavoritesCommands::Add { url } => add(&app, url, json),
        FavoritesCommands::Remove { url } => remove(&app, url, json),
        FavoritesCommands::Pin { url } => set_pinned(&app, url, true, json),
        FavoritesCommands::Unpin { url } => set_pinned(&app, url, false, json),
        FavoritesCommands::Reorder { order } => reorder(&app, order, json),
        FavoritesCommands::List { remote } => list(&app, *remote, json),
    }
}

fn add(app: &App, url: &str, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let outcome = sync.add_favorite(url).await?;
        print_mutation("Added", url, outcome, sync.queue().len(), json)
    })
}

fn remove(app: &App, url: &str, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let favorites: Vec<FavoriteEntry> = sync.local_records()?;
        if !favorites.iter().any(|f| f.url == url) {
            return Err(Error::EntryNotFound {
                collection: Collection::Favorites.to_string(),
                key: url.to_string(),
                similar: find_similar_keys(url, favorites.iter().map(|f| f.url.as_str()), 3),
            });
        }
        let outcome = sync.delete(Collection::Favorites, url).await?;
        print_mutation("Removed", url, outcome, sync.queue().len(), json)
    })
}

fn set_pinned(app: &App, url: &str, pinned: bool, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let outcome = sync.set_pinned(url, pinned).await?;
        let action = if pinned { "Pinned" } else { "Unpinned" };
        print_mutation(action, url, outcome, sync.queue().len(), json)
    })
}

fn reorder(app: &App, order: &[usize], json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let favorites: Vec<FavoriteEntry> = sync.local_records()?;
        if let Some(bad) = order.iter().find(|&&i| i >= favorites.len()) {
            return Err(Error::InvalidArgument(format!(
                "position {bad} is out of range ({} favorites)",
                favorites.len()
            )));
        }
        let outcome = sync.reorder(Collection::Favorites, order.to_vec()).await?;
        let positions = order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        print_mutation("Reordered", &positions, outcome, sync.queue().len(), json)
    })
}

fn list(app: &App, remote: bool, json: bool) -> Result<()> {
    let entries: Vec<FavoriteEntry> = if remote {
        block_on(app.remote_records())?
    } else {
        app.coordinator()?.local_records()?
    };
    let source = if remote { "remote" } else { "local" };

    if json {
        let output = ListOutput {
            source,
            count: entries.len(),
            entries: &entries,
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No favorites ({source}).");
        return Ok(());
    }
    for (position, entry) in entries.iter().enumerate() {
        let pin = if entry.pinned { "*" } else { " " };
        println!(
            "  {position:>2} {pin} {:<24} {}",
            entry.title.bold(),
            entry.url.dimmed()
        );
    }
    Ok(())
}
