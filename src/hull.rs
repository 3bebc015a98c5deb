/// Hull state machine
///
/// A hull collects points as deduplicated cell ids and turns them into
/// geometry in one of two ways: all at once when input ends, or every time
/// a fixed-size buffer of distinct cells fills up. Buffered generation bounds
/// memory for unbounded point streams at the cost of more, smaller merges.

use crate::error::{HullError, Result};
use crate::geometry_processor::GeometryProcessor;
use crate::grid_index::{CellId, GeoPoint};
use crate::hull_geometry::HullGeometry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// When pending cells are turned into geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullMode {
    /// Accumulate every cell, generate once at the end of input
    Complete,
    /// Generate and merge whenever `buffer_size` distinct cells are pending
    Buffered { buffer_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HullState {
    /// Nothing pending
    Idle,
    /// Cells pending generation
    Accumulating,
}

/// What an `add_point` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The cell was recorded (or was already pending)
    Pending,
    /// The buffer filled and a generation ran
    Generated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HullStats {
    pub points_added: u64,
    pub generations: u64,
    /// Polygons dropped by the polar normalizer across all generations
    pub skipped_polygons: u64,
}

pub struct Hull {
    processor: GeometryProcessor,
    mode: HullMode,
    pending: HashSet<CellId>,
    accumulated: Option<HullGeometry>,
    stats: HullStats,
}

impl Hull {
    pub fn new(processor: GeometryProcessor, mode: HullMode) -> Result<Self> {
        if let HullMode::Buffered { buffer_size: 0 } = mode {
            return Err(HullError::InvalidConfig(
                "point buffer size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            processor,
            mode,
            pending: HashSet::new(),
            accumulated: None,
            stats: HullStats::default(),
        })
    }

    pub fn complete(processor: GeometryProcessor) -> Self {
        Self {
            processor,
            mode: HullMode::Complete,
            pending: HashSet::new(),
            accumulated: None,
            stats: HullStats::default(),
        }
    }

    pub fn buffered(processor: GeometryProcessor, buffer_size: usize) -> Result<Self> {
        Self::new(processor, HullMode::Buffered { buffer_size })
    }

    pub fn mode(&self) -> HullMode {
        self.mode
    }

    pub fn state(&self) -> HullState {
        if self.pending.is_empty() {
            HullState::Idle
        } else {
            HullState::Accumulating
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &HullStats {
        &self.stats
    }

    pub fn processor(&self) -> &GeometryProcessor {
        &self.processor
    }

    /// Record the cell containing `point`.
    ///
    /// In buffered mode, reaching exactly `buffer_size` pending cells runs a
    /// generation before returning.
    pub fn add_point(&mut self, point: GeoPoint) -> Result<AddOutcome> {
        let cell = self.processor.cell_for(point)?;
        self.pending.insert(cell);
        self.stats.points_added += 1;

        match self.mode {
            HullMode::Buffered { buffer_size } if self.pending.len() == buffer_size => {
                self.generate_hull()?;
                Ok(AddOutcome::Generated)
            }
            _ => Ok(AddOutcome::Pending),
        }
    }

    /// Turn every pending cell into geometry and merge it into the hull.
    ///
    /// Pending cells are taken up front, so the hull is back to `Idle` even
    /// when the merge fails. The accumulated hull is replaced only on success.
    pub fn generate_hull(&mut self) -> Result<()> {
        let cells = std::mem::take(&mut self.pending);
        if cells.is_empty() {
            return Err(HullError::EmptyCellSet);
        }

        let projection = self.processor.project(&cells)?;
        let merged = self
            .processor
            .merge(projection.polygons, self.accumulated.clone())?;

        self.stats.generations += 1;
        self.stats.skipped_polygons += (projection.skipped + merged.skipped) as u64;
        debug!(
            cells = cells.len(),
            generation = self.stats.generations,
            vertices = merged.geometry.vertex_count(),
            "generated hull"
        );
        self.accumulated = Some(merged.geometry);
        Ok(())
    }

    /// End of input: generate if anything is pending, then return the hull
    pub fn finish(&mut self) -> Result<Option<&HullGeometry>> {
        if !self.pending.is_empty() {
            self.generate_hull()?;
        }
        Ok(self.accumulated.as_ref())
    }

    pub fn hull_geometry(&self) -> Option<&HullGeometry> {
        self.accumulated.as_ref()
    }

    pub fn into_hull_geometry(self) -> Option<HullGeometry> {
        self.accumulated
    }
}
