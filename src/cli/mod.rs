//! Command-line interface for fieldsync.
//!
//! Provides commands for capturing media offline, draining the sync queue,
//! reconciling with the archive, and driving the confirm/reject review.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config;
use crate::domain::{ArtifactKind, ArtifactStatus};
use crate::ingest::{capture_file, CaptureRequest};
use crate::remote::HttpArchiveClient;
use crate::resolve::{ConfirmError, ConfirmOutcome, ConfirmSubmission, ConflictResolver, ResolutionAction};
use crate::store::{ListFilter, LocalStore};
use crate::sync::SyncOrchestrator;

/// fieldsync - offline capture queue and archive sync
#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a media file into the offline queue
    Capture {
        /// Path to the recorded audio or image file
        file: PathBuf,

        /// Excavation site name (case preserved exactly)
        #[arg(short, long)]
        site: String,

        /// Media kind
        #[arg(short, long, value_enum, default_value = "audio")]
        kind: CaptureKind,

        /// Recorder/photographer name
        #[arg(long)]
        recorded_by: Option<String>,

        #[arg(long)]
        gps_lat: Option<f64>,

        #[arg(long)]
        gps_lon: Option<f64>,
    },

    /// Drain the pending queue against the archive
    Sync,

    /// Reconcile local artifacts with authoritative server state
    Refresh,

    /// Re-run remote processing for an uploaded artifact
    Reprocess {
        /// Artifact id
        id: String,
    },

    /// List artifacts
    List {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Filter by site
        #[arg(long)]
        site: Option<String>,

        /// Maximum number of artifacts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one artifact in full
    Show {
        /// Artifact id
        id: String,
    },

    /// Confirm a processed artifact into the permanent record store
    Confirm {
        /// Artifact id
        id: String,

        /// Field override as key=value (repeatable); defaults come from
        /// the AI interpretation
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// Entity type (defaults to the interpretation's)
        #[arg(long)]
        entity_type: Option<String>,

        /// Target table (defaults to the interpretation's)
        #[arg(long)]
        table: Option<String>,

        /// Duplicate resolution action
        #[arg(long, value_enum)]
        force: Option<ForceArg>,
    },

    /// Reject an artifact (terminal, no archive write)
    Reject {
        /// Artifact id
        id: String,
    },

    /// Delete an artifact and its queue entry
    Delete {
        /// Artifact id
        id: String,
    },

    /// Remove fully synced artifacts older than the retention threshold
    Prune {
        /// Age threshold in days (defaults to the configured value)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CaptureKind {
    Audio,
    Image,
}

impl From<CaptureKind> for ArtifactKind {
    fn from(k: CaptureKind) -> Self {
        match k {
            CaptureKind::Audio => ArtifactKind::AudioNote,
            CaptureKind::Image => ArtifactKind::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Offline,
    Processed,
    ErrorProcessed,
    Validated,
    Rejected,
}

impl From<StatusArg> for ArtifactStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Offline => ArtifactStatus::Offline,
            StatusArg::Processed => ArtifactStatus::Processed,
            StatusArg::ErrorProcessed => ArtifactStatus::ErrorProcessed,
            StatusArg::Validated => ArtifactStatus::Validated,
            StatusArg::Rejected => ArtifactStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ForceArg {
    Merge,
    Overwrite,
    Ignore,
}

impl From<ForceArg> for ResolutionAction {
    fn from(f: ForceArg) -> Self {
        match f {
            ForceArg::Merge => ResolutionAction::Merge,
            ForceArg::Overwrite => ResolutionAction::Overwrite,
            ForceArg::Ignore => ResolutionAction::Ignore,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Capture {
                file,
                site,
                kind,
                recorded_by,
                gps_lat,
                gps_lon,
            } => capture(file, site, kind, recorded_by, gps_lat, gps_lon).await,
            Commands::Sync => sync().await,
            Commands::Refresh => refresh().await,
            Commands::Reprocess { id } => reprocess(&id).await,
            Commands::List {
                status,
                site,
                limit,
            } => list(status, site, limit),
            Commands::Show { id } => show(&id),
            Commands::Confirm {
                id,
                fields,
                entity_type,
                table,
                force,
            } => confirm(&id, fields, entity_type, table, force).await,
            Commands::Reject { id } => reject(&id).await,
            Commands::Delete { id } => delete(&id),
            Commands::Prune { days } => prune(days),
            Commands::Config => show_config(),
        }
    }
}

fn open_store() -> Result<Arc<LocalStore>> {
    let cfg = config::config()?;
    let store = LocalStore::open(cfg.db_path())
        .with_context(|| format!("Failed to open store at {}", cfg.db_path().display()))?;
    Ok(Arc::new(store))
}

fn open_archive() -> Result<Arc<HttpArchiveClient>> {
    let cfg = config::config()?;
    let client = HttpArchiveClient::with_timeout(cfg.archive_url.clone(), cfg.timeout)
        .context("Failed to build archive client")?;
    Ok(Arc::new(client))
}

async fn capture(
    file: PathBuf,
    site: String,
    kind: CaptureKind,
    recorded_by: Option<String>,
    gps_lat: Option<f64>,
    gps_lon: Option<f64>,
) -> Result<()> {
    let cfg = config::config()?;
    let store = open_store()?;

    let artifact = capture_file(
        &store,
        kind.into(),
        &file,
        &cfg.media,
        CaptureRequest {
            site,
            recorded_by,
            gps_lat,
            gps_lon,
        },
    )
    .await?;

    println!("Captured {} ({})", artifact.id, artifact.kind);
    println!("  site:   {}", artifact.meta.site);
    println!("  queued: {} pending", store.queue_len()?);
    Ok(())
}

async fn sync() -> Result<()> {
    let store = open_store()?;
    let archive = open_archive()?;
    let orchestrator = SyncOrchestrator::new(store, archive);

    let report = orchestrator
        .run_sync(|p| {
            println!("  [{}/{}] {}", p.done, p.total, p.artifact_id);
        })
        .await?;

    match report {
        Some(report) => {
            println!(
                "Sync finished: {}/{} completed, {} failed",
                report.completed,
                report.total,
                report.errors.len()
            );
            for failure in &report.errors {
                println!(
                    "  ✗ {} ({:?}): {}",
                    failure.entry.artifact_id, failure.stage, failure.error
                );
            }
        }
        None => println!("A sync run is already active"),
    }
    Ok(())
}

async fn refresh() -> Result<()> {
    let store = open_store()?;
    let archive = open_archive()?;
    let orchestrator = SyncOrchestrator::new(store, archive);

    let patched = orchestrator.refresh_processed().await?;
    println!("Reconciled {} artifact(s) from server state", patched);
    Ok(())
}

async fn reprocess(id: &str) -> Result<()> {
    let store = open_store()?;
    let archive = open_archive()?;
    let orchestrator = SyncOrchestrator::new(store, archive);

    let artifact = orchestrator.reprocess(id).await?;
    println!("Reprocessed {} -> {}", artifact.id, artifact.status);
    Ok(())
}

fn list(status: Option<StatusArg>, site: Option<String>, limit: usize) -> Result<()> {
    let store = open_store()?;
    let artifacts = store.list(&ListFilter {
        status: status.map(Into::into),
        site,
        limit: Some(limit),
    })?;

    if artifacts.is_empty() {
        println!("No artifacts");
        return Ok(());
    }

    for a in artifacts {
        let remote = a
            .remote_id
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<10} {:<15} {:>6}  {}  {}",
            a.id,
            a.kind,
            a.status,
            remote,
            a.created_at.format("%Y-%m-%d %H:%M"),
            a.meta.site
        );
    }
    Ok(())
}

fn show(id: &str) -> Result<()> {
    let store = open_store()?;
    let a = store.get(id)?;

    println!("Artifact {}", a.id);
    println!("  kind:      {}", a.kind);
    println!("  status:    {}", a.status);
    println!("  site:      {}", a.meta.site);
    println!("  file:      {}", a.meta.file_name);
    if let Some(remote_id) = a.remote_id {
        println!("  remote id: {}", remote_id);
    }
    if let Some(ref t) = a.transcription {
        println!("  transcription: {}", t);
    }
    if let Some(ref interp) = a.interpretation {
        println!(
            "  interpretation: {} -> {} (confidence {:.2})",
            interp.entity_type, interp.target_table, interp.confidence
        );
        for (k, v) in &interp.extracted_fields {
            println!("    {} = {}", k, v);
        }
        for rel in &interp.relationships {
            println!("    {} {} (area {}, {})", rel.kind, rel.unit, rel.area, rel.site);
        }
    }
    if let Some(entry) = store.entry_for_artifact(id)? {
        println!("  queued: priority {}, {} attempt(s)", entry.priority, entry.attempts);
    }
    Ok(())
}

/// Parse repeated `key=value` field overrides.
fn parse_fields(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    for item in raw {
        let (key, value) = item
            .split_once('=')
            .with_context(|| format!("Expected key=value, got '{}'", item))?;
        fields.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(fields)
}

async fn confirm(
    id: &str,
    raw_fields: Vec<String>,
    entity_type: Option<String>,
    table: Option<String>,
    force: Option<ForceArg>,
) -> Result<()> {
    let store = open_store()?;
    let archive = open_archive()?;
    let artifact = store.get(id)?;

    // Start from the AI interpretation, let the reviewer override.
    let mut fields = artifact
        .interpretation
        .as_ref()
        .map(|i| i.extracted_fields.clone())
        .unwrap_or_default();
    fields.extend(parse_fields(&raw_fields)?);

    let submission = ConfirmSubmission {
        fields,
        entity_type: entity_type
            .or_else(|| artifact.interpretation.as_ref().map(|i| i.entity_type.clone()))
            .unwrap_or_else(|| "US".to_string()),
        target_table: table
            .or_else(|| artifact.interpretation.as_ref().map(|i| i.target_table.clone()))
            .unwrap_or_else(|| "us_table".to_string()),
    };

    let resolver = ConflictResolver::new(store, archive);
    match resolver
        .confirm(id, &submission, force.map(Into::into))
        .await
    {
        Ok(ConfirmOutcome::Confirmed) => {
            println!("Confirmed {} into {}", id, submission.target_table);
        }
        Ok(ConfirmOutcome::Ignored) => {
            println!("Conflict ignored; {} left reviewable", id);
        }
        Err(ConfirmError::Conflict(key)) => {
            println!("Duplicate record already archived: {}", key);
            println!("Resolve with --force merge | overwrite | ignore");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn reject(id: &str) -> Result<()> {
    let store = open_store()?;
    let archive = open_archive()?;
    let resolver = ConflictResolver::new(store, archive);

    let artifact = resolver.reject(id).await?;
    println!("Rejected {}", artifact.id);
    Ok(())
}

fn delete(id: &str) -> Result<()> {
    let store = open_store()?;
    store.delete(id)?;
    println!("Deleted {}", id);
    Ok(())
}

fn prune(days: Option<i64>) -> Result<()> {
    let cfg = config::config()?;
    let store = open_store()?;
    let removed = store.prune(days.unwrap_or(cfg.retention_days))?;
    println!("Pruned {} artifact(s)", removed);
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;
    println!("home:      {}", cfg.home.display());
    println!("media:     {}", cfg.media.display());
    println!("database:  {}", cfg.db_path().display());
    println!("archive:   {}", cfg.archive_url);
    println!("timeout:   {:?}", cfg.timeout);
    println!("retention: {} days", cfg.retention_days);
    match cfg.config_file {
        Some(ref path) => println!("config:    {}", path.display()),
        None => println!("config:    (defaults)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&[
            "area=1".to_string(),
            "us = 2045".to_string(),
        ])
        .unwrap();
        assert_eq!(fields.get("area").unwrap(), "1");
        assert_eq!(fields.get("us").unwrap(), "2045");
    }

    #[test]
    fn test_parse_fields_rejects_bare_key() {
        assert!(parse_fields(&["area".to_string()]).is_err());
    }
}
