/// Merges previously written hull files into one hull
///
/// Every file under a directory (recursively) with the reader format's
/// extension is read and folded into the accumulated hull with the geometry
/// processor's merge, so hole policy, polar normalization and the vertex
/// budget apply to the combined result.

use crate::error::{HullError, Result};
use crate::geometry_processor::GeometryProcessor;
use crate::hull_geometry::HullGeometry;
use crate::input::InputFileProcessor;
use crate::output::OutputFormat;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct MultiFileHullMerger {
    format: OutputFormat,
    processor: GeometryProcessor,
    merged: Option<HullGeometry>,
    files_merged: usize,
}

impl MultiFileHullMerger {
    pub fn new(format: OutputFormat, processor: GeometryProcessor) -> Self {
        Self {
            format,
            processor,
            merged: None,
            files_merged: 0,
        }
    }

    pub fn files_merged(&self) -> usize {
        self.files_merged
    }

    /// Paths under `root` ending in the reader's extension, sorted
    pub fn hull_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_files(root, self.format.ext(), &mut files)?;
        files.sort();
        Ok(files)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let geometry = self.format.read(path)?;
        debug!(path = %path.display(), vertices = geometry.vertex_count(), "merging hull file");

        let merged = self
            .processor
            .merge(geometry.into_polygons(), self.merged.take())?;
        self.merged = Some(merged.geometry);
        self.files_merged += 1;
        Ok(())
    }
}

impl InputFileProcessor for MultiFileHullMerger {
    fn process(&mut self, path: &Path) -> Result<Option<&HullGeometry>> {
        let files = self.hull_files(path)?;
        info!(root = %path.display(), files = files.len(), "merging hull files");
        for file in &files {
            self.merge_file(file)?;
        }
        Ok(self.merged.as_ref())
    }
}

fn collect_files(path: &Path, ext: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            files.push(path.to_path_buf());
        }
        return Ok(());
    }
    if !path.is_dir() {
        return Err(HullError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    for entry in fs::read_dir(path)? {
        collect_files(&entry?.path(), ext, files)?;
    }
    Ok(())
}
