use anyhow::{Context, anyhow};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use pyscout_core::cache::{CACHE_FILE_NAME, ResponseCache};
use pyscout_core::config::Endpoints;
use pyscout_core::report::{OutputMode, control_output};
use pyscout_core::{Mode, ProgressCallback, ProgressEvent, ScrapeContext, run_mode};
use pyscout_scanner::Session;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Everything pulled out of the command line for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub mode: Mode,
    pub output: OutputMode,
    pub clear_cache: bool,
    pub quiet: bool,
    pub cache_dir: PathBuf,
    pub results_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub endpoints: Endpoints,
}

pub fn settings_from_matches(matches: &ArgMatches) -> anyhow::Result<RunSettings> {
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("No mode given"))?;
    let mode = Mode::from_str(name).ok_or_else(|| anyhow!("Unknown mode: {}", name))?;

    // Global args are propagated to the subcommand matches.
    let output = match sub_matches.get_one::<String>("output") {
        Some(value) => {
            OutputMode::from_str(value).ok_or_else(|| anyhow!("Unknown output: {}", value))?
        }
        None => OutputMode::Plain,
    };

    let cache_dir = sub_matches
        .get_one::<String>("cache-dir")
        .context("Missing cache directory")?;
    let cache_dir = PathBuf::from(shellexpand::tilde(cache_dir).as_ref());

    let results_dir = sub_matches
        .get_one::<PathBuf>("results-dir")
        .cloned()
        .context("Missing results directory")?;
    let downloads_dir = sub_matches
        .get_one::<PathBuf>("downloads-dir")
        .cloned()
        .context("Missing downloads directory")?;

    let docs_url = sub_matches
        .get_one::<Url>("docs-url")
        .context("Missing docs URL")?;
    let peps_url = sub_matches
        .get_one::<Url>("peps-url")
        .context("Missing PEPs URL")?;

    Ok(RunSettings {
        mode,
        output,
        clear_cache: sub_matches.get_flag("clear-cache"),
        quiet: sub_matches.get_flag("quiet"),
        cache_dir,
        results_dir,
        downloads_dir,
        endpoints: Endpoints::new(docs_url.as_str(), peps_url.as_str()),
    })
}

/// Open the response cache in `cache_dir`, emptying it first when asked.
pub fn open_cache(cache_dir: &Path, clear: bool) -> anyhow::Result<Arc<ResponseCache>> {
    fs::create_dir_all(cache_dir).with_context(|| {
        format!("Failed to create cache directory {}", cache_dir.display())
    })?;
    let cache_path = cache_dir.join(CACHE_FILE_NAME);
    let existed = ResponseCache::exists(&cache_path);
    let cache = ResponseCache::new(&cache_path)
        .with_context(|| format!("Failed to open cache at {}", cache_path.display()))?;
    debug!(path = %cache_path.display(), existed, "Response cache opened");

    if clear {
        let removed = cache.clear().context("Failed to clear cache")?;
        info!(removed, "Cache cleared");
    }

    Ok(Arc::new(cache))
}

/// Progress bar driven by routine events. Hidden when `quiet` is set.
pub fn progress_callback(quiet: bool) -> anyhow::Result<ProgressCallback> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    Ok(bar_progress_callback(pb))
}

/// Drive `pb` from routine events: one step per finished item.
pub fn bar_progress_callback(pb: ProgressBar) -> ProgressCallback {
    Arc::new(move |event: ProgressEvent| match event {
        ProgressEvent::Started { total } => {
            pb.reset();
            pb.set_length(total as u64);
        }
        ProgressEvent::Advanced { index, url } => {
            pb.set_position(index as u64 + 1);
            pb.set_message(url);
        }
        ProgressEvent::Finished => pb.finish_and_clear(),
    })
}

/// Run the selected routine and route its report.
///
/// Returns the results file path when the report was written to disk.
pub async fn handle_mode(settings: &RunSettings) -> anyhow::Result<Option<PathBuf>> {
    debug!(?settings, "Run settings");
    let cache = open_cache(&settings.cache_dir, settings.clear_cache)?;
    let session = Session::new()
        .context("Failed to build HTTP client")?
        .with_cache(cache);
    let ctx = ScrapeContext::new(
        session,
        settings.endpoints.clone(),
        settings.downloads_dir.clone(),
    )
    .with_progress_callback(progress_callback(settings.quiet)?);

    let mode = settings.mode;
    let report = run_mode(mode, &ctx)
        .await
        .with_context(|| format!("Routine {} failed", mode.as_str()))?;

    let Some(report) = report else {
        debug!(mode = mode.as_str(), "Nothing to output");
        return Ok(None);
    };

    let output = mode.effective_output(settings.output);
    control_output(&report, output, mode.as_str(), &settings.results_dir)
        .context("Failed to output results")
}
