//! Batch processing of transcript directories.
//!
//! Each file is loaded, run through the segment pipeline and, in apply mode,
//! written back when any segment changed. Files share no state, so they are
//! spread over a small pool of blocking tasks; results are gathered in input
//! order so the change log reads the same as a sequential run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::normalizer::SegmentPipeline;
use crate::transcript::{RecordError, TranscriptRecord};

/// Whether modified records are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistMode {
    #[default]
    DryRun,
    Apply,
}

impl PersistMode {
    /// Writing happens only on an explicit `--apply`; `--dry-run` always wins.
    pub fn from_flags(apply: bool, dry_run: bool) -> Self {
        if apply && !dry_run {
            PersistMode::Apply
        } else {
            PersistMode::DryRun
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == PersistMode::DryRun
    }
}

/// One rewritten segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEntry {
    pub file: PathBuf,
    pub segment: usize,
    pub original: String,
    pub updated: String,
}

impl ChangeEntry {
    pub fn file_name(&self) -> String {
        file_name(&self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Load,
    Persist,
    /// The worker task died before returning a result.
    Worker,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of processing a single file.
#[derive(Debug, Clone, Default)]
pub struct FileOutcome {
    pub changes: Vec<ChangeEntry>,
    pub persisted: bool,
}

impl FileOutcome {
    pub fn is_modified(&self) -> bool {
        !self.changes.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Files found in the directory
    pub files_seen: usize,
    /// Files the pipeline actually loaded
    pub files_processed: usize,
    pub files_modified: usize,
    pub changes: Vec<ChangeEntry>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    fn absorb(&mut self, path: PathBuf, result: Result<Option<FileOutcome>, RecordError>) {
        match result {
            Ok(None) => {}
            Ok(Some(outcome)) => {
                self.files_processed += 1;
                if outcome.is_modified() {
                    self.files_modified += 1;
                }
                self.changes.extend(outcome.changes);
            }
            Err(err) => {
                let kind = match err {
                    RecordError::Persist { .. } => FailureKind::Persist,
                    _ => FailureKind::Load,
                };
                warn!("Skipping {:?}: {}", path, err);
                self.failures.push(FileFailure {
                    file: path,
                    kind,
                    message: err.to_string(),
                });
            }
        }
    }

    fn absorb_worker_failure(&mut self, path: PathBuf, err: tokio::task::JoinError) {
        warn!("Worker for {:?} failed: {}", path, err);
        self.failures.push(FileFailure {
            file: path,
            kind: FailureKind::Worker,
            message: format!("worker task failed: {err}"),
        });
    }
}

pub struct BatchProcessor {
    pipeline: SegmentPipeline,
    mode: PersistMode,
}

impl BatchProcessor {
    pub fn new(pipeline: SegmentPipeline, mode: PersistMode) -> Self {
        Self { pipeline, mode }
    }

    /// Run the pipeline over an in-memory record.
    pub fn apply_to_record(
        &self,
        record: &mut TranscriptRecord,
        path: &Path,
        eligible: bool,
    ) -> Vec<ChangeEntry> {
        let mut changes = Vec::new();

        for (segment, text) in record.texts_mut().into_iter().enumerate() {
            let updated = self.pipeline.run(text, eligible);
            if updated != *text {
                changes.push(ChangeEntry {
                    file: path.to_path_buf(),
                    segment,
                    original: std::mem::replace(text, updated.clone()),
                    updated,
                });
            }
        }

        changes
    }

    /// Process one file. `Ok(None)` means the mode does not want this file.
    pub fn process_file(&self, path: &Path) -> Result<Option<FileOutcome>, RecordError> {
        let name = file_name(path);
        if !self.pipeline.wants(&name) {
            debug!("Skipping {:?}: not a non-verbal category", path);
            return Ok(None);
        }

        let mut record = TranscriptRecord::load(path)?;
        let eligible = self.pipeline.is_eligible(&name);
        let changes = self.apply_to_record(&mut record, path, eligible);

        let mut outcome = FileOutcome {
            changes,
            persisted: false,
        };

        if outcome.is_modified() && self.mode == PersistMode::Apply {
            record.persist(path)?;
            outcome.persisted = true;
        }

        if outcome.is_modified() {
            debug!("{:?}: {} segment(s) changed", path, outcome.changes.len());
        }

        Ok(Some(outcome))
    }

    /// Process files one after another on the current thread.
    pub fn process_sequential(&self, files: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport {
            files_seen: files.len(),
            ..Default::default()
        };
        for path in files {
            report.absorb(path.clone(), self.process_file(path));
        }
        report
    }

    /// Process files on up to `workers` blocking tasks.
    pub async fn process_files(self: Arc<Self>, files: Vec<PathBuf>, workers: usize) -> Result<BatchReport> {
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::with_capacity(files.len());

        for path in &files {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .context("Worker pool closed")?;
            let processor = Arc::clone(&self);
            let path = path.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                processor.process_file(&path)
            }));
        }

        let mut report = BatchReport {
            files_seen: files.len(),
            ..Default::default()
        };
        for (path, handle) in files.into_iter().zip(handles) {
            match handle.await {
                Ok(result) => report.absorb(path, result),
                Err(err) => report.absorb_worker_failure(path, err),
            }
        }

        info!(
            "Processed {} of {} files, {} modified, {} failed",
            report.files_processed,
            report.files_seen,
            report.files_modified,
            report.failures.len()
        );

        Ok(report)
    }

    /// Discover and process every `*.json` file in `dir`.
    pub async fn process_directory(self: Arc<Self>, dir: &Path, workers: usize) -> Result<BatchReport> {
        let files = discover_json_files(dir)?;
        info!("Found {} JSON files in {:?}", files.len(), dir);
        self.process_files(files, workers).await
    }
}

/// Every `*.json` file directly inside `dir`, sorted by path.
pub fn discover_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read directory {:?}", dir))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::PipelineMode;
    use crate::rules::RuleTable;
    use std::fs;

    fn processor(mode: PipelineMode, persist: PersistMode) -> BatchProcessor {
        let rules = RuleTable::builtin().unwrap();
        BatchProcessor::new(SegmentPipeline::new(&rules, mode), persist)
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const PAIN_FILE: &str = r#"{
  "file": "voice_bebop_pain_big_03.json",
  "segments": [
    {"start": 0, "end": 1, "text": "Subscribe to my channel"},
    {"start": 1, "end": 2, "text": "Argh!"}
  ]
}"#;

    #[test]
    fn test_persist_mode_from_flags() {
        assert_eq!(PersistMode::from_flags(false, false), PersistMode::DryRun);
        assert_eq!(PersistMode::from_flags(false, true), PersistMode::DryRun);
        assert_eq!(PersistMode::from_flags(true, false), PersistMode::Apply);
        assert_eq!(PersistMode::from_flags(true, true), PersistMode::DryRun);
    }

    #[test]
    fn test_dry_run_records_changes_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "voice_bebop_pain_big_03.json", PAIN_FILE);

        let outcome = processor(PipelineMode::Full, PersistMode::DryRun)
            .process_file(&path)
            .unwrap()
            .unwrap();

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].segment, 0);
        assert_eq!(outcome.changes[0].original, "Subscribe to my channel");
        assert_eq!(outcome.changes[0].updated, "");
        assert!(!outcome.persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), PAIN_FILE);
    }

    #[test]
    fn test_apply_writes_full_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "voice_bebop_pain_big_03.json", PAIN_FILE);

        let outcome = processor(PipelineMode::Full, PersistMode::Apply)
            .process_file(&path)
            .unwrap()
            .unwrap();
        assert!(outcome.persisted);

        let record = TranscriptRecord::load(&path).unwrap();
        assert_eq!(record.texts(), vec!["", "Argh!"]);
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_unmodified_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"{"file": "voice_bebop_kill_01.json", "segments": [{"start": 0, "end": 1, "text": "Got him."}]}"#;
        let path = write(dir.path(), "voice_bebop_kill_01.json", content);

        let outcome = processor(PipelineMode::Full, PersistMode::Apply)
            .process_file(&path)
            .unwrap()
            .unwrap();

        assert!(!outcome.is_modified());
        assert!(!outcome.persisted);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_scrub_only_skips_other_categories() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "voice_bebop_kill_01.json", "not even json");

        let result = processor(PipelineMode::ScrubOnly, PersistMode::DryRun)
            .process_file(&path)
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_failure_is_reported_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "a_bad.json", "{broken");
        let good = write(
            dir.path(),
            "b_good.json",
            r#"{"file": "b", "segments": [{"start": 0, "end": 1, "text": "Stone Viscous"}]}"#,
        );

        let report = processor(PipelineMode::Full, PersistMode::DryRun)
            .process_sequential(&[bad.clone(), good.clone()]);

        assert_eq!(report.files_seen, 2);
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, bad);
        assert_eq!(report.failures[0].kind, FailureKind::Load);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].file, good);
        assert_eq!(report.changes[0].updated, "Stun Viscous");
    }

    #[test]
    fn test_persist_error_is_recorded_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("voice_test_01.json");
        let record = TranscriptRecord::from_json_str(
            r#"{"file": "voice_test_01.json", "segments": []}"#,
            &target,
        )
        .unwrap();
        let err = record.persist(&target).unwrap_err();

        let mut report = BatchReport::default();
        report.absorb(target.clone(), Err(err));

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, target);
        assert_eq!(report.failures[0].kind, FailureKind::Persist);
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.files_modified, 0);
        assert!(report.changes.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_directory_fails_persist_without_changes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "voice_bebop_pain_big_03.json", PAIN_FILE);
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not stop privileged users; nothing to check then.
        if tempfile::NamedTempFile::new_in(dir.path()).is_ok() {
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = processor(PipelineMode::Full, PersistMode::Apply)
            .process_sequential(std::slice::from_ref(&path));
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file, path);
        assert_eq!(report.failures[0].kind, FailureKind::Persist);
        assert_eq!(report.files_modified, 0);
        assert!(report.changes.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), PAIN_FILE);
    }

    #[tokio::test]
    async fn test_worker_panic_is_recorded_as_failure() {
        let handle = tokio::task::spawn_blocking(|| -> Result<Option<FileOutcome>, RecordError> {
            panic!("boom")
        });
        let err = handle.await.unwrap_err();

        let mut report = BatchReport::default();
        report.absorb_worker_failure(PathBuf::from("voice_01.json"), err);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Worker);
        assert!(report.failures[0].message.starts_with("worker task failed"));
        assert!(report.changes.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_run_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..12 {
            write(
                dir.path(),
                &format!("voice_{i:02}.json"),
                &format!(
                    r#"{{"file": "{i}", "segments": [{{"start": 0, "end": 1, "text": "Stone Ivy {i}"}}]}}"#
                ),
            );
        }
        write(dir.path(), "readme.md", "ignored");

        let processor = Arc::new(processor(PipelineMode::Full, PersistMode::DryRun));
        let report = processor.process_directory(dir.path(), 4).await.unwrap();

        assert_eq!(report.files_seen, 12);
        assert_eq!(report.files_modified, 12);
        let names: Vec<String> = report.changes.iter().map(|c| c.file_name()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("voice_{i:02}.json")).collect();
        assert_eq!(names, expected);
        assert!(report.changes.iter().all(|c| c.updated.starts_with("Stun Ivy")));
    }

    #[test]
    fn test_discover_ignores_non_json_and_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.json", "{}");
        write(dir.path(), "a.json", "{}");
        write(dir.path(), "c.txt", "");
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(&dir.path().join("nested"), "d.json", "{}");

        let files = discover_json_files(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();

        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
