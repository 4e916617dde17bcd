//! Dive list diagnostic entry point.
//!
//! # Responsibility
//! - Load a JSON store snapshot and build the requested layout.
//! - Print rows and emitted notifications as JSON lines.
//!
//! # Invariants
//! - Output is deterministic for a given snapshot and arguments.
//! - The store is never written back.

use clap::{Parser, ValueEnum};
use divelist_core::{
    init_logging, Column, DiveListService, DisplayPrefs, LoggingConfig, MemoryDiveRepository,
    ModelEvent, ProjectionKind, RowIndex, TextFilter, TextQuery,
};
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    List,
    Tree,
}

impl From<LayoutArg> for ProjectionKind {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::List => ProjectionKind::List,
            LayoutArg::Tree => ProjectionKind::Tree,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "divelist",
    version,
    about = "Print the dive list projection of a store snapshot"
)]
struct Cli {
    /// JSON store snapshot (`sites`, `trips`, `dives`).
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Row layout.
    #[arg(long, value_enum, default_value = "list")]
    layout: LayoutArg,

    /// Keyword filter applied after the initial build.
    #[arg(long, value_name = "TEXT")]
    filter: Option<String>,

    /// Treat `--filter` as a regular expression.
    #[arg(long, requires = "filter")]
    regex: bool,

    /// JSON display preferences.
    #[arg(long, value_name = "PATH")]
    prefs: Option<PathBuf>,

    /// Also print hidden rows.
    #[arg(long)]
    all: bool,

    /// Print emitted notifications after the rows.
    #[arg(long)]
    events: bool,

    /// Absolute directory for log files; logging stays off without it.
    #[arg(long = "log-dir", value_name = "DIR")]
    log_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long = "log-level", value_name = "LEVEL", requires = "log_dir")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let mut config = LoggingConfig::with_dir(log_dir.clone());
        if let Some(level) = &cli.log_level {
            config.level = level.clone();
        }
        init_logging(&config)?;
    }

    let snapshot = std::fs::read_to_string(&cli.snapshot)?;
    let repo = MemoryDiveRepository::from_json(&snapshot)?;
    let prefs = match &cli.prefs {
        Some(path) => DisplayPrefs::from_json(&std::fs::read_to_string(path)?)?,
        None => DisplayPrefs::default(),
    };
    info!(
        "event=cli_run module=cli status=ok dives={} layout={:?}",
        repo.len(),
        cli.layout
    );

    let mut service = DiveListService::new(repo, cli.layout.into());
    service.set_prefs(prefs);
    let mut events = service.populate();
    if let Some(text) = &cli.filter {
        let query = TextQuery {
            text: text.clone(),
            raw_pattern: cli.regex,
        };
        events.extend(service.set_oracle(Box::new(TextFilter::new(&query)?)));
    }

    for index in rows(&service) {
        let shown = service.projection().is_shown(index);
        if !shown && !cli.all {
            continue;
        }
        let cells: Vec<String> = Column::ALL
            .iter()
            .map(|column| service.cell_text(index, *column).unwrap_or_default())
            .collect();
        println!(
            "{}",
            json!({ "row": index, "shown": shown, "cells": cells })
        );
    }

    if cli.events {
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    print_summary(&service, &events);
    Ok(())
}

/// Every row in display order, trip members right after their trip.
fn rows(service: &DiveListService<MemoryDiveRepository>) -> Vec<RowIndex> {
    let projection = service.projection();
    let mut rows = Vec::new();
    for row in 0..projection.row_count(None) {
        rows.push(RowIndex::top(row));
        if projection.trip_at(row).is_some() {
            rows.extend((0..projection.row_count(Some(row))).map(|member| RowIndex::child(row, member)));
        }
    }
    rows
}

fn print_summary(service: &DiveListService<MemoryDiveRepository>, events: &[ModelEvent]) {
    eprintln!(
        "rows={} shown={} total={} events={}",
        service.projection().row_count(None),
        service.projection().shown_count(),
        service.repo().len(),
        events.len()
    );
}
