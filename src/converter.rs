//! Run orchestration for pcb-offset
//!
//! This module drives a run over one input directory: discovery, per-file
//! decode / sniff / rewrite, and atomic output into the `output` directory.
//! A failure on one file is reported and the run moves on to the next.

use crate::{
    config::Config,
    encoding::{self, TextEncoding},
    engine::{offset_excellon, offset_gerber, Rewrite},
    error::{OffsetError, Result, ResultExt},
    format::FormatDescriptor,
    patterns::{FileKind, FilePatterns},
    progress::ProgressTracker,
    sniff::{sniff_excellon, sniff_gerber},
    transform::LineStats,
};
use anyhow::Context;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// How a file ended up in the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Transformed,
    Copied { reason: String },
    Failed { reason: String },
}

/// Per-file result consumed by the reporting layer
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub kind: FileKind,
    pub recognized: bool,
    pub descriptor: Option<FormatDescriptor>,
    pub encoding: Option<TextEncoding>,
    pub stats: LineStats,
    pub outcome: FileOutcome,
}

impl FileReport {
    fn new(path: &Path, kind: FileKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            recognized: false,
            descriptor: None,
            encoding: None,
            stats: LineStats::default(),
            outcome: FileOutcome::Failed {
                reason: "not processed".to_string(),
            },
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Header findings for one file, without writing anything
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub kind: FileKind,
    pub descriptor: FormatDescriptor,
    pub encoding: TextEncoding,
    pub recognized: bool,
    pub apertures: usize,
    pub indicators: Vec<&'static str>,
}

/// Totals across a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn total_modified(&self) -> usize {
        self.reports.iter().map(|r| r.stats.coordinates_modified).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.reports
            .iter()
            .map(|r| {
                r.stats.line_errors + usize::from(matches!(r.outcome, FileOutcome::Failed { .. }))
            })
            .sum()
    }

    pub fn failed_files(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn recognized_drill_files(&self) -> (usize, usize) {
        let drills = self.reports.iter().filter(|r| r.kind == FileKind::Drill);
        let total = drills.clone().count();
        (drills.filter(|r| r.recognized).count(), total)
    }
}

/// The main offset engine driver
pub struct Converter {
    config: Config,
    progress_tracker: ProgressTracker,
    patterns: FilePatterns,
}

impl Converter {
    /// Create a new converter with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let progress_enabled = !config.no_progress;

        Ok(Self {
            config,
            progress_tracker: ProgressTracker::new(progress_enabled),
            patterns: FilePatterns::new().context("Failed to compile filename patterns")?,
        })
    }

    /// Discover candidates, stopping the run when there are none
    pub fn discover(&self) -> Result<Vec<(PathBuf, FileKind)>> {
        self.config
            .validate()
            .context("Configuration validation failed")?;

        let files = self
            .patterns
            .discover(&self.config.input_dir, self.config.get_kind_filter())?;

        if files.is_empty() {
            return Err(OffsetError::NoInputFiles {
                path: self.config.input_dir.display().to_string(),
            }
            .into());
        }

        Ok(files)
    }

    /// Run the complete offset process
    pub fn run(&self) -> Result<RunSummary> {
        let start = std::time::Instant::now();
        let files = self.discover()?;

        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir).with_path_context("create output directory", &output_dir)?;

        let progress = self
            .progress_tracker
            .create_file_progress(files.len(), "Offsetting files");

        let mut summary = RunSummary::default();
        for (path, kind) in &files {
            let report = self.process_file(path, *kind, &output_dir);
            match &report.outcome {
                FileOutcome::Failed { reason } => {
                    error!("{}: {}", report.file_name(), reason)
                }
                FileOutcome::Copied { reason } => {
                    info!("{}: copied unchanged ({})", report.file_name(), reason)
                }
                FileOutcome::Transformed => info!(
                    "{}: modified {} coordinates, {} errors",
                    report.file_name(),
                    report.stats.coordinates_modified,
                    report.stats.line_errors
                ),
            }
            ProgressTracker::update_progress(&progress, 1, Some(report.file_name().as_str()));
            summary.reports.push(report);
        }

        ProgressTracker::finish_progress(progress, "File processing completed");
        info!("Run completed in {} ms", start.elapsed().as_millis());
        Ok(summary)
    }

    /// Sniff every candidate and report its format
    pub fn analyze(&self) -> Result<Vec<FileAnalysis>> {
        let files = self.discover()?;
        let mut analyses = Vec::with_capacity(files.len());

        for (path, kind) in files {
            let bytes = match fs::read(&path).with_path_context("read", &path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("{:#}", e);
                    continue;
                }
            };
            let decoded = encoding::decode(&bytes);

            let analysis = match kind {
                FileKind::Gerber => {
                    let header = sniff_gerber(&decoded.text);
                    FileAnalysis {
                        path,
                        kind,
                        descriptor: header.descriptor,
                        encoding: decoded.encoding,
                        recognized: header.format_declared,
                        apertures: header.apertures.len(),
                        indicators: Vec::new(),
                    }
                }
                FileKind::Drill => {
                    let probe = sniff_excellon(&decoded.text);
                    FileAnalysis {
                        path,
                        kind,
                        descriptor: probe.descriptor,
                        encoding: decoded.encoding,
                        recognized: probe.is_drill_file,
                        apertures: 0,
                        indicators: probe.indicators,
                    }
                }
            };
            analyses.push(analysis);
        }

        Ok(analyses)
    }

    /// Process a single file; never propagates errors
    fn process_file(&self, path: &Path, kind: FileKind, output_dir: &Path) -> FileReport {
        let mut report = FileReport::new(path, kind);
        let Some(file_name) = path.file_name() else {
            report.outcome = FileOutcome::Failed {
                reason: "path has no file name".to_string(),
            };
            return report;
        };
        let output_path = output_dir.join(file_name);
        debug!("Processing {} -> {}", path.display(), output_path.display());

        let bytes = match fs::read(path).with_path_context("read", path) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.outcome = self.fallback_copy(path, &output_path, &e);
                return report;
            }
        };

        let decoded = encoding::decode(&bytes);
        report.encoding = Some(decoded.encoding);

        let offset = self.config.offset();
        let rewrite = match kind {
            FileKind::Gerber => {
                let (header, rewrite) = offset_gerber(&decoded.text, &offset);
                report.descriptor = Some(header.descriptor);
                report.recognized = true;
                rewrite
            }
            FileKind::Drill => {
                let (probe, rewrite) = offset_excellon(&decoded.text, &offset);
                report.descriptor = Some(probe.descriptor);
                report.recognized = probe.is_drill_file;
                rewrite
            }
        };
        report.stats = rewrite.stats();

        report.outcome = match rewrite {
            Rewrite::Transformed { text, .. } => {
                let encoded = decoded.encoding.encode(&text);
                match write_atomic(&output_path, &encoded) {
                    Ok(()) => FileOutcome::Transformed,
                    Err(e) => {
                        report.stats.line_errors += 1;
                        self.copy_verbatim(&bytes, &output_path, &e)
                    }
                }
            }
            Rewrite::Passthrough { reason } => match write_atomic(&output_path, &bytes) {
                Ok(()) => FileOutcome::Copied { reason },
                Err(e) => io_failure(&output_path, &e),
            },
        };

        report
    }

    /// Input could not be read; try a plain filesystem copy instead
    fn fallback_copy(&self, path: &Path, output_path: &Path, cause: &anyhow::Error) -> FileOutcome {
        warn!("{:#}; attempting verbatim copy", cause);
        match fs::copy(path, output_path).with_path_context("copy", path) {
            Ok(_) => FileOutcome::Copied {
                reason: format!("{:#}", cause),
            },
            Err(e) => io_failure(path, &e),
        }
    }

    /// Writing the rewritten text failed; keep the original bytes instead
    fn copy_verbatim(
        &self,
        bytes: &[u8],
        output_path: &Path,
        cause: &anyhow::Error,
    ) -> FileOutcome {
        warn!("{:#}; writing original content instead", cause);
        match write_atomic(output_path, bytes) {
            Ok(()) => FileOutcome::Copied {
                reason: format!("{:#}", cause),
            },
            Err(e) => io_failure(output_path, &e),
        }
    }
}

fn io_failure(path: &Path, cause: &anyhow::Error) -> FileOutcome {
    let failure = OffsetError::FileIoFailure {
        path: path.display().to_string(),
        reason: format!("{:#}", cause),
    };
    FileOutcome::Failed {
        reason: failure.to_string(),
    }
}

/// Write `bytes` to a temporary file beside `path`, then rename it into place
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).with_path_context("create temporary", dir)?;
    temp.write_all(bytes)
        .with_path_context("write temporary", temp.path())?;
    temp.flush().with_path_context("flush temporary", temp.path())?;
    temp.persist(path).with_path_context("persist output", path)?;

    debug!("Written output file: {}", path.display());
    Ok(())
}
