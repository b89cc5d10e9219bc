// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline record — ordered, append-only snapshots of every detection stage,
// keyed by label. Passed through a detection run as an explicit side channel
// so stages recorded before a failure stay available for diagnostics.

use flatpage_core::types::{CornerSet, HoughLine};
use image::DynamicImage;

/// Label of the edge-map snapshot.
pub const EDGES_STAGE: &str = "edges";
/// Label of the edge map with detected lines drawn over it.
pub const LINES_STAGE: &str = "lines";
/// Label of the source image with the chosen quadrilateral drawn over it.
pub const CORNERS_STAGE: &str = "corners";
/// Label of the rectified page.
pub const WARP_STAGE: &str = "warp";

/// Structured data recorded next to a stage image.
#[derive(Debug, Clone, PartialEq)]
pub enum StageData {
    Lines(Vec<HoughLine>),
    Corners(CornerSet),
}

/// One recorded stage.
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub image: DynamicImage,
    pub data: Option<StageData>,
}

/// Ordered label → snapshot mapping for one detection run.
///
/// Recording an existing label replaces its snapshot but keeps the label's
/// original position in the order.
#[derive(Debug, Clone, Default)]
pub struct PipelineRecord {
    entries: Vec<(String, StageRecord)>,
}

impl PipelineRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage image under `label`.
    pub fn record(&mut self, image: DynamicImage, label: impl Into<String>) {
        self.insert(label.into(), StageRecord { image, data: None });
    }

    /// Record a stage image together with its structured data.
    pub fn record_with(&mut self, image: DynamicImage, label: impl Into<String>, data: StageData) {
        self.insert(
            label.into(),
            StageRecord {
                image,
                data: Some(data),
            },
        );
    }

    fn insert(&mut self, label: String, stage: StageRecord) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = stage,
            None => self.entries.push((label, stage)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&StageRecord> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, stage)| stage)
    }

    pub fn image(&self, label: &str) -> Option<&DynamicImage> {
        self.get(label).map(|stage| &stage.image)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Labels in the order they were first recorded.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// The record as an ordered list of (label, image) pairs.
    pub fn as_mapping(&self) -> Vec<(&str, &DynamicImage)> {
        self.entries
            .iter()
            .map(|(label, stage)| (label.as_str(), &stage.image))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageRecord)> {
        self.entries.iter().map(|(label, stage)| (label.as_str(), stage))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the record, keeping the order.
    pub fn into_entries(self) -> Vec<(String, StageRecord)> {
        self.entries
    }
}
