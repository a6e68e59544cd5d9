//! Search history commands.

use super::app::{App, block_on, print_mutation};
use crate::cli::HistoryCommands;
use crate::clock::format_ms;
use crate::error::{Error, Result};
use crate::model::{Collection, SearchHistoryEntry};
use crate::validate::find_similar_keys;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ListOutput<'a> {
    source: &'a str,
    count: usize,
    entries: &'a [SearchHistoryEntry],
}

/// Execute history commands.
pub fn execute(command: &HistoryCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let app = App::open(db_path)?;
    match command {
        HistoryCommands::Add { term } => add(&app, term, json),
        HistoryCommands::Remove { term } => remove(&app, term, json),
        HistoryCommands::List { limit, remote } => list(&app, *limit, *remote, json),
    }
}

fn add(app: &App, term: &str, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let outcome = sync.record_search(term).await?;
        print_mutation("Recorded", term.trim(), outcome, sync.queue().len(), json)
    })
}

fn remove(app: &App, term: &str, json: bool) -> Result<()> {
    block_on(async {
        let sync = app.connect().await?;
        let history: Vec<SearchHistoryEntry> = sync.local_records()?;
        if !history.iter().any(|e| e.term == term) {
            return Err(Error::EntryNotFound {
                collection: Collection::History.to_string(),
                key: term.to_string(),
                similar: find_similar_keys(term, history.iter().map(|e| e.term.as_str()), 3),
            });
        }
        let outcome = sync.delete(Collection::History, term).await?;
        print_mutation("Removed", term, outcome, sync.queue().len(), json)
    })
}

fn list(app: &App, limit: Option<usize>, remote: bool, json: bool) -> Result<()> {
    let mut entries: Vec<SearchHistoryEntry> = if remote {
        block_on(app.remote_records())?
    } else {
        app.coordinator()?.local_records()?
    };
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
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
        println!("No search history ({source}).");
        return Ok(());
    }
    for entry in &entries {
        println!("  {}  {}", format_ms(entry.last_searched), entry.term);
    }
    Ok(())
}
