use crate::config::Endpoints;
use crate::error::Result;
use crate::report::{OutputMode, Report};
use crate::status::StatusMapping;
use crate::{download, pep, versions, whats_new};
use pyscout_scanner::Session;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Per-item progress of a routine, reported to an optional observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: usize },
    Advanced { index: usize, url: String },
    Finished,
}

/// Callback for reporting item progress
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Everything a routine needs to run.
pub struct ScrapeContext {
    pub session: Session,
    pub endpoints: Endpoints,
    pub downloads_dir: PathBuf,
    pub statuses: StatusMapping,
    progress_callback: Option<ProgressCallback>,
}

impl ScrapeContext {
    pub fn new(session: Session, endpoints: Endpoints, downloads_dir: PathBuf) -> Self {
        Self {
            session,
            endpoints,
            downloads_dir,
            statuses: StatusMapping::new(),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub(crate) fn report_progress(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    WhatsNew,
    LatestVersions,
    Download,
    Pep,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::WhatsNew, Mode::LatestVersions, Mode::Download, Mode::Pep];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::WhatsNew => "whats-new",
            Mode::LatestVersions => "latest-versions",
            Mode::Download => "download",
            Mode::Pep => "pep",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|mode| mode.as_str() == s)
    }

    /// The PEP summary always goes to a file.
    pub fn effective_output(&self, requested: OutputMode) -> OutputMode {
        match self {
            Mode::Pep => OutputMode::File,
            _ => requested,
        }
    }
}

/// Run one routine. `Ok(None)` means there is nothing to hand to the output stage.
pub async fn run_mode(mode: Mode, ctx: &ScrapeContext) -> Result<Option<Report>> {
    info!(mode = mode.as_str(), "Running routine");
    match mode {
        Mode::WhatsNew => whats_new::whats_new(ctx).await,
        Mode::LatestVersions => versions::latest_versions(ctx).await,
        Mode::Download => download::download(ctx).await,
        Mode::Pep => pep::pep(ctx).await,
    }
}
