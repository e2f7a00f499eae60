//! Filename patterns for discovering Gerber and drill files
//!
//! Gerber layers are recognised purely by extension. Drill candidates use a
//! looser set of suffixes (`.txt`, `.nc`) that only count when the filename
//! also hints at drilling; the sniffer confirms them afterwards.

use crate::error::{Result, ResultExt};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kind of fabrication file a path was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Gerber,
    Drill,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Gerber => "Gerber",
            FileKind::Drill => "drill",
        }
    }
}

/// Which kinds a run should pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Gerber,
    Drill,
}

impl KindFilter {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gerber" => KindFilter::Gerber,
            "drill" => KindFilter::Drill,
            _ => KindFilter::All,
        }
    }

    pub fn accepts(&self, kind: FileKind) -> bool {
        matches!(
            (self, kind),
            (KindFilter::All, _)
                | (KindFilter::Gerber, FileKind::Gerber)
                | (KindFilter::Drill, FileKind::Drill)
        )
    }
}

/// Ordered filename patterns for both dialects
#[derive(Debug)]
pub struct FilePatterns {
    gerber: Vec<Regex>,
    drill: Vec<Regex>,
    drill_loose: Vec<Regex>,
    drill_keywords: Vec<&'static str>,
}

impl FilePatterns {
    pub fn new() -> Result<Self> {
        let compile = |patterns: &[&str]| -> Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| Regex::new(p).map_err(anyhow::Error::from))
                .collect()
        };

        Ok(Self {
            gerber: compile(&[
                r"(?i)\.gbr$",
                r"(?i)\.gb$",
                r"(?i)\.ger$",
                r"(?i)\.pho$",
                r"(?i)\.gtl$",
                r"(?i)\.gbl$",
                r"(?i)\.gto$",
                r"(?i)\.gbo$",
                r"(?i)\.gts$",
                r"(?i)\.gbs$",
                r"(?i)\.gtp$",
                r"(?i)\.gbp$",
                r"(?i)\.gm1$",
                r"(?i)\.gml$",
                r"(?i)\.gko$",
            ])?,
            drill: compile(&[r"(?i)\.drl$", r"(?i)\.drd$"])?,
            drill_loose: compile(&[r"(?i)\.txt$", r"(?i)\.nc$"])?,
            drill_keywords: vec!["drill", "drl", "drd", "nc_drill", "nc"],
        })
    }

    /// Classify a bare filename
    pub fn match_filename(&self, filename: &str) -> Option<FileKind> {
        if self.gerber.iter().any(|re| re.is_match(filename)) {
            return Some(FileKind::Gerber);
        }

        if self.drill.iter().any(|re| re.is_match(filename)) {
            return Some(FileKind::Drill);
        }

        if self.drill_loose.iter().any(|re| re.is_match(filename)) {
            let lower = filename.to_lowercase();
            if self.drill_keywords.iter().any(|k| lower.contains(k)) {
                return Some(FileKind::Drill);
            }
            debug!("Skipping {}: no drill keyword in name", filename);
        }

        None
    }

    /// List candidate files directly inside `dir`, sorted by name
    pub fn discover(&self, dir: &Path, filter: KindFilter) -> Result<Vec<(PathBuf, FileKind)>> {
        let mut files = fs::read_dir(dir)
            .with_path_context("read directory", dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let kind = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(|name| self.match_filename(name))?;
                filter.accepts(kind).then_some((path, kind))
            })
            .collect::<Vec<_>>();

        files.sort_by(|a, b| a.0.cmp(&b.0));

        info!("Discovered {} candidate files in {}", files.len(), dir.display());
        debug!("Candidates: {:?}", files);
        Ok(files)
    }
}
