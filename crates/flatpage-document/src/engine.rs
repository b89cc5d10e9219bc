// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection engine — runs edges → lines → corners → warp on one image,
// records every stage, and hands the flattened page to a text extractor.

use flatpage_core::config::DetectionConfig;
use flatpage_core::error::{FlatpageError, Result};
use flatpage_core::types::{CornerSet, Point, TransformMatrix};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::pipeline::overlay::{draw_corners, draw_lines};
use crate::pipeline::record::{
    CORNERS_STAGE, EDGES_STAGE, LINES_STAGE, PipelineRecord, StageData, WARP_STAGE,
};
use crate::scan::{detect_lines, extract_edges, rectify, select_corners};
use crate::scan::rectify::RectifiedSize;
use crate::text::{NoTextExtractor, TextExtractor};

/// Everything a successful detection run produces.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Words read off the rectified page; empty when extraction failed.
    pub words: Vec<String>,
    pub original: DynamicImage,
    pub rectified: DynamicImage,
    /// Maps source coordinates onto rectified coordinates.
    pub transform: TransformMatrix,
    pub corners: CornerSet,
    pub size: RectifiedSize,
}

impl DetectionResult {
    /// Map a point on the rectified page back into the original image.
    pub fn map_to_source(&self, point: Point) -> Option<Point> {
        self.transform.inverse()?.apply(point)
    }
}

/// Finds a page in a photo, flattens it and extracts its text.
///
/// The engine holds no per-run state; one instance can process any number of
/// images.
#[derive(Debug, Clone)]
pub struct DetectionEngine<E = NoTextExtractor> {
    config: DetectionConfig,
    extractor: E,
}

impl DetectionEngine<NoTextExtractor> {
    /// Engine without text extraction.
    pub fn new(config: DetectionConfig) -> Result<Self> {
        Self::with_extractor(config, NoTextExtractor)
    }
}

impl<E: TextExtractor> DetectionEngine<E> {
    pub fn with_extractor(config: DetectionConfig, extractor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Run the full pipeline and return the result with a fresh record.
    ///
    /// On failure the partial record is dropped; use
    /// [`detect_document_into`](Self::detect_document_into) to keep it.
    pub fn detect_document(&self, image: DynamicImage) -> Result<(DetectionResult, PipelineRecord)> {
        let mut record = PipelineRecord::new();
        let result = self.detect_document_into(image, &mut record)?;
        Ok((result, record))
    }

    /// Run the full pipeline, recording each stage into `record`.
    ///
    /// Stages recorded before a failure stay in `record`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect_document_into(
        &self,
        image: DynamicImage,
        record: &mut PipelineRecord,
    ) -> Result<DetectionResult> {
        let (width, height) = (image.width(), image.height());
        info!("Starting document detection");

        let edges = extract_edges(&image, &self.config.edges)?;
        record.record(DynamicImage::ImageLuma8(edges.clone()), EDGES_STAGE);

        let lines = detect_lines(&edges, &self.config.lines);
        debug!(lines = lines.len(), "Lines detected");
        record.record_with(
            DynamicImage::ImageRgb8(draw_lines(&edges, &lines)),
            LINES_STAGE,
            StageData::Lines(lines.clone()),
        );

        let corners = select_corners(&lines, width, height, &self.config.corners).map_err(|err| {
            warn!(reason = %err, "No document found");
            FlatpageError::from(err)
        })?;
        record.record_with(
            DynamicImage::ImageRgb8(draw_corners(&image, &corners)),
            CORNERS_STAGE,
            StageData::Corners(corners.clone()),
        );

        let rectified = rectify(&image, &corners, self.config.aspect_ratio)?;
        record.record(rectified.image.clone(), WARP_STAGE);

        let words = match self.extractor.extract_text(&rectified.image) {
            Ok(words) => words,
            Err(err) => {
                warn!(error = %err, "Text extraction failed; continuing without words");
                Vec::new()
            }
        };

        info!(
            out_w = rectified.size.width,
            out_h = rectified.size.height,
            words = words.len(),
            "Document detected"
        );
        Ok(DetectionResult {
            words,
            original: image,
            rectified: rectified.image,
            transform: rectified.transform,
            corners,
            size: rectified.size,
        })
    }

    /// Only the geometric part: edges, lines and corner selection.
    pub fn locate_corners(&self, image: &DynamicImage) -> Result<CornerSet> {
        let edges = extract_edges(image, &self.config.edges)?;
        let lines = detect_lines(&edges, &self.config.lines);
        Ok(select_corners(
            &lines,
            image.width(),
            image.height(),
            &self.config.corners,
        )?)
    }
}
