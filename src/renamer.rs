use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::analyzer::{ImageAnalyzer, NameSource};
use crate::config::Config;
use crate::metadata::{FileMetadata, read_metadata};
use crate::pipeline::collect_images;

/// Skip reason when the suggested name equals the current one.
pub const REASON_UNCHANGED: &str = "name unchanged";
/// Skip reason when the destination is already taken.
pub const REASON_TARGET_EXISTS: &str = "target already exists";

/// A precomputed rename decision for one image.
///
/// Plans produced by [`Renamer::scan`] can be saved and handed back to
/// [`Renamer::perform_rename`], which then renames without analyzing again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamePlan {
    pub original_path: PathBuf,
    pub original_name: String,
    /// New file name including the original extension.
    pub suggested_name: Option<String>,
    pub source: Option<NameSource>,
    pub metadata: Option<FileMetadata>,
    /// `original_name == suggested_name`, compared case-sensitively.
    pub is_same_name: bool,
    pub would_rename: bool,
    pub error: Option<String>,
}

impl RenamePlan {
    fn failed(path: &Path, error: String) -> Self {
        Self {
            original_path: path.to_path_buf(),
            original_name: file_name_of(path),
            suggested_name: None,
            source: None,
            metadata: None,
            is_same_name: false,
            would_rename: false,
            error: Some(error),
        }
    }
}

/// What happened to one plan entry during [`Renamer::execute_plans`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub original_path: PathBuf,
    pub original_name: String,
    pub new_path: Option<PathBuf>,
    pub new_name: Option<String>,
    pub success: bool,
    pub skipped: bool,
    /// The rename was only simulated.
    pub dry_run: bool,
    pub reason: Option<String>,
    pub error: Option<String>,
}

impl RenameOutcome {
    fn base(plan: &RenamePlan) -> Self {
        Self {
            original_path: plan.original_path.clone(),
            original_name: plan.original_name.clone(),
            new_path: None,
            new_name: plan.suggested_name.clone(),
            success: false,
            skipped: false,
            dry_run: false,
            reason: None,
            error: None,
        }
    }

    fn skipped(plan: &RenamePlan, reason: &str) -> Self {
        Self {
            success: true,
            skipped: true,
            reason: Some(reason.to_string()),
            ..Self::base(plan)
        }
    }

    fn failed(plan: &RenamePlan, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(plan)
        }
    }

    fn renamed(plan: &RenamePlan, new_path: PathBuf, dry_run: bool) -> Self {
        Self {
            new_path: Some(new_path),
            success: true,
            dry_run,
            ..Self::base(plan)
        }
    }
}

/// Running tallies for a rename batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSummary {
    pub total: usize,
    /// Entries that reached a rename attempt (`success + failed`).
    pub processed: usize,
    pub skipped: usize,
    pub success: usize,
    pub failed: usize,
}

/// Result of a rename batch, split by outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameReport {
    pub successful: Vec<RenameOutcome>,
    pub skipped: Vec<RenameOutcome>,
    pub failed: Vec<RenameOutcome>,
    pub summary: RenameSummary,
}

/// Emitted after each file during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanProgress {
    pub current: usize,
    pub total: usize,
    pub percent: u8,
    pub file_name: String,
}

/// Emitted after each file during a rename batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameProgress {
    pub current: usize,
    pub total: usize,
    pub percent: u8,
    pub file_name: String,
    pub processed: usize,
    pub skipped: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressEvent {
    Scan(ScanProgress),
    Rename(RenameProgress),
}

/// Result of [`rename_single_file`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRename {
    pub success: bool,
    pub new_path: Option<PathBuf>,
    pub error: Option<String>,
}

/// Drives images through the analyzer and renames them, one at a time.
///
/// A renamer lives for one operation. Per-file problems end up in the
/// returned plans and outcomes; only failures to list the input paths are
/// returned as errors.
///
/// # Example
///
/// ```rust,no_run
/// use image_renamer::analyzer::ImageAnalyzer;
/// use image_renamer::config::Config;
/// use image_renamer::renamer::Renamer;
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::default();
/// let analyzer = ImageAnalyzer::from_config(&config);
/// let renamer = Renamer::new(&analyzer, &config);
///
/// let paths = [PathBuf::from("./photos")];
/// let plans = renamer.preview_rename(&paths).await?;
/// let report = renamer.perform_rename(&paths, false, Some(&plans)).await?;
/// println!("{} renamed, {} skipped", report.summary.success, report.summary.skipped);
/// # Ok(())
/// # }
/// ```
pub struct Renamer<'a> {
    analyzer: &'a ImageAnalyzer,
    config: &'a Config,
    progress: Option<Box<dyn Fn(&ProgressEvent) + 'a>>,
}

impl<'a> Renamer<'a> {
    pub fn new(analyzer: &'a ImageAnalyzer, config: &'a Config) -> Self {
        Self {
            analyzer,
            config,
            progress: None,
        }
    }

    /// Report progress to `callback` after every file.
    pub fn with_progress(mut self, callback: impl Fn(&ProgressEvent) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(cb) = &self.progress {
            cb(&event);
        }
    }

    /// Analyze every image under `paths` and build a plan entry for each.
    pub async fn scan(&self, paths: &[PathBuf]) -> Result<Vec<RenamePlan>> {
        let images = collect_images(paths, self.config)?;
        let total = images.len();
        log::info!("Found {total} image(s)");

        let mut fallback_seen = HashMap::new();
        let mut plans = Vec::with_capacity(total);
        for (i, path) in images.iter().enumerate() {
            log::info!("[{}/{}] Analyzing: {}", i + 1, total, path.display());
            let plan = self.plan_file(path, &mut fallback_seen).await;
            if let Some(ref err) = plan.error {
                log::error!("  Error: {err}");
            }
            plans.push(plan);

            self.emit(ProgressEvent::Scan(ScanProgress {
                current: i + 1,
                total,
                percent: percent(i + 1, total),
                file_name: file_name_of(path),
            }));
        }

        Ok(plans)
    }

    /// [`scan`](Self::scan), keeping only entries without errors.
    pub async fn preview_rename(&self, paths: &[PathBuf]) -> Result<Vec<RenamePlan>> {
        let plans = self.scan(paths).await?;
        Ok(plans.into_iter().filter(|p| p.error.is_none()).collect())
    }

    /// Rename every image under `paths`.
    ///
    /// Entries found in `plans` are used as-is; images without a plan are
    /// analyzed now. Paths are matched after canonicalization, so `./photos`
    /// and `photos` find the same plans.
    pub async fn perform_rename(
        &self,
        paths: &[PathBuf],
        dry_run: bool,
        plans: Option<&[RenamePlan]>,
    ) -> Result<RenameReport> {
        let images = collect_images(paths, self.config)?;
        let known: HashMap<PathBuf, &RenamePlan> = plans
            .unwrap_or_default()
            .iter()
            .map(|p| (plan_key(&p.original_path), p))
            .collect();

        let mut fallback_seen = HashMap::new();
        let mut batch = Vec::with_capacity(images.len());
        for path in &images {
            match known.get(&plan_key(path)) {
                Some(plan) => batch.push((*plan).clone()),
                None => {
                    log::debug!("No plan for {}; analyzing", path.display());
                    batch.push(self.plan_file(path, &mut fallback_seen).await);
                }
            }
        }

        Ok(self.execute_plans(&batch, dry_run))
    }

    /// Carry out (or simulate) a list of plans in order.
    ///
    /// Never overwrites: a destination that exists on disk, or that an
    /// earlier entry of this batch already claimed, is skipped.
    pub fn execute_plans(&self, plans: &[RenamePlan], dry_run: bool) -> RenameReport {
        if dry_run {
            log::info!("DRY RUN: no files will be modified");
        }

        let total = plans.len();
        let mut report = RenameReport {
            summary: RenameSummary {
                total,
                ..RenameSummary::default()
            },
            ..RenameReport::default()
        };
        let mut claimed = HashSet::new();

        for (i, plan) in plans.iter().enumerate() {
            let outcome = execute_one(plan, dry_run, &mut claimed);
            let summary = &mut report.summary;

            if outcome.skipped {
                log::info!(
                    "  Skipped {}: {}",
                    outcome.original_name,
                    outcome.reason.as_deref().unwrap_or_default()
                );
                summary.skipped += 1;
                report.skipped.push(outcome);
            } else if outcome.success {
                log::info!(
                    "  {} {} → {}",
                    if dry_run { "Would rename" } else { "Renamed" },
                    outcome.original_name,
                    outcome.new_name.as_deref().unwrap_or_default()
                );
                summary.processed += 1;
                summary.success += 1;
                report.successful.push(outcome);
            } else {
                log::warn!(
                    "  Failed {}: {}",
                    outcome.original_name,
                    outcome.error.as_deref().unwrap_or_default()
                );
                summary.processed += 1;
                summary.failed += 1;
                report.failed.push(outcome);
            }

            let summary = report.summary;
            self.emit(ProgressEvent::Rename(RenameProgress {
                current: i + 1,
                total,
                percent: percent(i + 1, total),
                file_name: plan.original_name.clone(),
                processed: summary.processed,
                skipped: summary.skipped,
                success: summary.success,
                failed: summary.failed,
            }));
        }

        report
    }

    async fn plan_file(
        &self,
        path: &Path,
        fallback_seen: &mut HashMap<String, usize>,
    ) -> RenamePlan {
        let metadata = match read_metadata(path) {
            Ok(m) => m,
            Err(e) => return RenamePlan::failed(path, format!("{e:#}")),
        };

        let analysis = self.analyzer.suggest_name(path).await;
        let base = if analysis.source == NameSource::Fallback {
            disambiguate(analysis.suggested_base_name, fallback_seen)
        } else {
            analysis.suggested_base_name
        };

        let original_name = file_name_of(path);
        let suggested_name = format!("{base}{}", metadata.extension);
        let is_same_name = original_name == suggested_name;
        log::info!("  Suggested: {suggested_name} ({})", analysis.source);

        RenamePlan {
            original_path: path.to_path_buf(),
            original_name,
            suggested_name: Some(suggested_name),
            source: Some(analysis.source),
            metadata: Some(metadata),
            is_same_name,
            would_rename: !is_same_name,
            error: None,
        }
    }
}

fn execute_one(plan: &RenamePlan, dry_run: bool, claimed: &mut HashSet<PathBuf>) -> RenameOutcome {
    if let Some(ref err) = plan.error {
        return RenameOutcome::failed(plan, err.clone());
    }
    let Some(new_name) = plan.suggested_name.as_deref() else {
        return RenameOutcome::failed(plan, "no suggested name");
    };
    if plan.is_same_name || new_name == plan.original_name {
        return RenameOutcome::skipped(plan, REASON_UNCHANGED);
    }
    if !is_plain_file_name(new_name) {
        return RenameOutcome::failed(plan, format!("invalid file name: {new_name}"));
    }

    let new_path = sibling(&plan.original_path, new_name);
    if claimed.contains(&new_path) || new_path.exists() {
        return RenameOutcome::skipped(plan, REASON_TARGET_EXISTS);
    }

    if dry_run {
        claimed.insert(new_path.clone());
        return RenameOutcome::renamed(plan, new_path, true);
    }

    let result = rename_single_file(&plan.original_path, new_name);
    match (result.success, result.new_path) {
        (true, Some(new_path)) => {
            claimed.insert(new_path.clone());
            RenameOutcome::renamed(plan, new_path, false)
        }
        _ => RenameOutcome::failed(plan, result.error.unwrap_or_default()),
    }
}

/// Rename `path` to `new_name` within the same directory.
///
/// Refuses to overwrite an existing file and rejects names containing path
/// separators.
pub fn rename_single_file(path: &Path, new_name: &str) -> SingleRename {
    let fail = |error: String| SingleRename {
        success: false,
        new_path: None,
        error: Some(error),
    };

    if !is_plain_file_name(new_name) {
        return fail(format!("invalid file name: {new_name}"));
    }
    let new_path = sibling(path, new_name);
    if new_path.exists() {
        return fail(REASON_TARGET_EXISTS.to_string());
    }

    match std::fs::rename(path, &new_path) {
        Ok(()) => SingleRename {
            success: true,
            new_path: Some(new_path),
            error: None,
        },
        Err(e) => fail(format!("Failed to rename {}: {e}", path.display())),
    }
}

/// Append `_2`, `_3`, … to fallback names already handed out in this batch.
fn disambiguate(base: String, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}_{count}")
    }
}

fn sibling(path: &Path, new_name: &str) -> PathBuf {
    path.parent().unwrap_or_else(|| Path::new("")).join(new_name)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name() == Some(OsStr::new(name))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lookup key for matching plans to images: the canonical path, or the path
/// as given when it cannot be resolved.
fn plan_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Rounded to the nearest whole percent.
fn percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        ((current * 100 + total / 2) / total) as u8
    }
}
