//! Per-family sync: eTag check, conditional download, load

use super::client::RemoteSource;
use super::share::{sanitize_link, share_id_from_link};
use super::state::SyncState;
use crate::error::{SyncError, SyncResult};
use crate::excel::WorkbookLoader;
use crate::types::{FileFamily, Workbook, WorkbookSet};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Idle,
    UpToDate,
    UpdateAvailable,
    Success,
    Error,
    NeedsConsent,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::UpToDate => "up_to_date",
            SyncStatus::UpdateAvailable => "update_available",
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
            SyncStatus::NeedsConsent => "needs_consent",
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, SyncStatus::Error | SyncStatus::NeedsConsent)
    }
}

/// What the status badge of one family shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSyncStatus {
    pub status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl FileSyncStatus {
    fn with(status: SyncStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// One family to sync and the link it syncs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub family: FileFamily,
    /// Sharing URL, or a stored `share:<id>`
    pub link: String,
}

impl SyncTarget {
    pub fn new(family: FileFamily, link: impl Into<String>) -> Self {
        Self {
            family,
            link: link.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Report whether an update exists without downloading it
    pub only_check_meta: bool,
}

/// Collaborators shared by every family in one sync run
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub source: &'a dyn RemoteSource,
    pub loader: &'a WorkbookLoader,
    pub token: &'a str,
    pub options: SyncOptions,
}

#[derive(Debug, Clone)]
pub struct FileSyncOutcome {
    pub status: FileSyncStatus,
    /// Freshly downloaded workbook, if any
    pub workbook: Option<Workbook>,
    pub bytes: Option<Vec<u8>>,
}

/// Sync a single family.
///
/// The download is skipped when the stored eTag matches and a workbook is
/// already loaded, or when only metadata was requested.
pub async fn sync_file(
    ctx: SyncContext<'_>,
    family: FileFamily,
    share_id: &str,
    state: &mut SyncState,
    has_workbook: bool,
) -> SyncResult<FileSyncOutcome> {
    let meta = ctx.source.fetch_meta(share_id, ctx.token).await?;
    let same_version = state.etag(family) == Some(meta.e_tag.as_str());

    let mut status = FileSyncStatus {
        status: SyncStatus::Idle,
        message: None,
        etag: Some(meta.e_tag.clone()),
        last_modified: Some(meta.last_modified_date_time.clone()),
    };

    if same_version && has_workbook {
        status.status = SyncStatus::UpToDate;
        return Ok(FileSyncOutcome {
            status,
            workbook: None,
            bytes: None,
        });
    }
    if ctx.options.only_check_meta {
        status.status = if same_version {
            SyncStatus::UpToDate
        } else {
            SyncStatus::UpdateAvailable
        };
        return Ok(FileSyncOutcome {
            status,
            workbook: None,
            bytes: None,
        });
    }

    info!(%family, etag = %meta.e_tag, "downloading new version");
    let bytes = ctx.source.fetch_content(share_id, ctx.token).await?;
    let workbook = ctx.loader.load_bytes(&bytes)?;
    state.record(family, &meta);

    status.status = SyncStatus::Success;
    Ok(FileSyncOutcome {
        status,
        workbook: Some(workbook),
        bytes: Some(bytes),
    })
}

/// Result of syncing every configured family
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub statuses: BTreeMap<FileFamily, FileSyncStatus>,
    /// Current workbooks with any downloads applied
    pub workbooks: WorkbookSet,
    /// Raw downloaded buffers, by family
    pub downloads: BTreeMap<FileFamily, Vec<u8>>,
    pub changed: bool,
}

impl SyncReport {
    pub fn needs_consent(&self) -> bool {
        self.statuses
            .values()
            .any(|s| s.status == SyncStatus::NeedsConsent)
    }

    pub fn has_failures(&self) -> bool {
        self.statuses.values().any(|s| s.status.is_failure())
    }
}

/// Sync each target in turn.
///
/// A failure marks only its own family `error`. An authorization failure
/// stops the run, discards its downloads and marks every target
/// `needs_consent`.
pub async fn sync_all(
    ctx: SyncContext<'_>,
    targets: &[SyncTarget],
    state: &mut SyncState,
    current: &WorkbookSet,
) -> SyncReport {
    let snapshot = state.clone();
    let mut report = SyncReport {
        workbooks: current.clone(),
        ..SyncReport::default()
    };

    for target in targets {
        let Some(share_id) = share_id_from_link(&target.link) else {
            report.statuses.insert(
                target.family,
                FileSyncStatus::with(SyncStatus::Idle, "no link configured"),
            );
            continue;
        };

        let stored = sanitize_link(&share_id);
        if state.links.get(&target.family) != Some(&stored) {
            state.forget(target.family);
            state.links.insert(target.family, stored);
        }

        let has_workbook = report.workbooks.is_loaded(target.family);
        let result = sync_file(ctx, target.family, &share_id, state, has_workbook).await;

        match result {
            Ok(outcome) => {
                if let Some(workbook) = outcome.workbook {
                    report.workbooks.set(target.family, workbook);
                    report.changed = true;
                }
                if let Some(bytes) = outcome.bytes {
                    report.downloads.insert(target.family, bytes);
                }
                report.statuses.insert(target.family, outcome.status);
            }
            Err(e) if e.is_auth() => {
                warn!(family = %target.family, error = %e, "sync needs broader consent");
                return consent_required(targets, &e, current, state, snapshot);
            }
            Err(e) => {
                warn!(family = %target.family, error = %e, "sync failed");
                report
                    .statuses
                    .insert(target.family, FileSyncStatus::with(SyncStatus::Error, e.to_string()));
            }
        }
    }

    if !ctx.options.only_check_meta {
        state.last_sync = Some(Utc::now());
    }
    report
}

fn consent_required(
    targets: &[SyncTarget],
    error: &SyncError,
    current: &WorkbookSet,
    state: &mut SyncState,
    snapshot: SyncState,
) -> SyncReport {
    // Keep this run's links; a family whose link changed keeps no eTag
    let links = std::mem::take(&mut state.links);
    let mut restored = snapshot;
    for (family, link) in &links {
        if restored.links.get(family) != Some(link) {
            restored.forget(*family);
        }
    }
    restored.links = links;
    *state = restored;

    let message = format!("insufficient permissions: {}", error);
    SyncReport {
        statuses: targets
            .iter()
            .map(|t| {
                (
                    t.family,
                    FileSyncStatus::with(SyncStatus::NeedsConsent, message.clone()),
                )
            })
            .collect(),
        workbooks: current.clone(),
        downloads: BTreeMap::new(),
        changed: false,
    }
}
