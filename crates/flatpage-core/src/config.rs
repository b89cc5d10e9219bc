// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection configuration. Every tunable of the pipeline lives here with its
// default; partial JSON documents fill the rest from `Default`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatpageError, Result};

/// ISO 216 paper ratio (A-series height / width).
pub const ISO_PAPER_RATIO: f64 = std::f64::consts::SQRT_2;

/// Tunables for the whole detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Edge extraction (blur + Canny).
    pub edges: EdgeParams,
    /// Hough line detection.
    pub lines: LineParams,
    /// Quadrilateral selection.
    pub corners: CornerParams,
    /// Ratio of the longer to the shorter side of the rectified page.
    pub aspect_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            edges: EdgeParams::default(),
            lines: LineParams::default(),
            corners: CornerParams::default(),
            aspect_ratio: ISO_PAPER_RATIO,
        }
    }
}

/// Gaussian blur and Canny hysteresis thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    /// Standard deviation of the Gaussian blur applied before Canny.
    pub blur_sigma: f32,
    /// Lower hysteresis threshold on gradient magnitude.
    pub low_threshold: f32,
    /// Upper hysteresis threshold on gradient magnitude.
    pub high_threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            low_threshold: 50.0,
            high_threshold: 150.0,
        }
    }
}

/// Hough accumulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineParams {
    /// Fixed vote threshold. When `None` the threshold scales with the image.
    pub vote_threshold: Option<u32>,
    /// Fraction of the shorter image side used as the scaled vote threshold.
    pub vote_fraction: f64,
    /// Floor for the scaled vote threshold.
    pub min_votes: u32,
    /// Non-maximum suppression radius in the (offset, angle) accumulator.
    pub suppression_radius: u32,
    /// Half-width in pixels of the band used to count a line's edge support.
    pub support_band: f32,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            vote_threshold: None,
            vote_fraction: 0.15,
            min_votes: 30,
            suppression_radius: 8,
            support_band: 1.0,
        }
    }
}

impl LineParams {
    /// Vote threshold to use for an image of the given size.
    pub fn threshold_for(&self, width: u32, height: u32) -> u32 {
        match self.vote_threshold {
            Some(threshold) => threshold,
            None => {
                let scaled = (width.min(height) as f64 * self.vote_fraction) as u32;
                scaled.max(self.min_votes)
            }
        }
    }
}

/// Acceptance criteria for candidate quadrilaterals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerParams {
    /// Max deviation (degrees) of a line from its group's dominant orientation.
    pub angle_tolerance_deg: f32,
    /// Minimum angle (degrees) between the two dominant orientations.
    pub min_separation_deg: f32,
    /// Strongest lines kept per cluster before pairing.
    pub max_lines_per_cluster: usize,
    /// Minimum quadrilateral area as a fraction of the image area.
    pub min_area_ratio: f64,
    /// Maximum ratio of the longer to the shorter mean side length.
    pub max_side_ratio: f64,
    /// Candidates within this fraction of the best area compete on straightness.
    pub area_tie_ratio: f64,
    /// How far outside the image (fraction of each dimension) a corner may lie.
    pub border_margin_ratio: f64,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: 35.0,
            min_separation_deg: 45.0,
            max_lines_per_cluster: 8,
            min_area_ratio: 0.1,
            max_side_ratio: 4.0,
            area_tie_ratio: 0.02,
            border_margin_ratio: 0.05,
        }
    }
}

impl DetectionConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every parameter is finite and in range.
    pub fn validate(&self) -> Result<()> {
        let edges = &self.edges;
        if !(edges.blur_sigma.is_finite() && edges.blur_sigma > 0.0) {
            return Err(invalid(format!(
                "edges.blur_sigma must be positive, got {}",
                edges.blur_sigma
            )));
        }
        if !(edges.low_threshold.is_finite() && edges.low_threshold >= 0.0) {
            return Err(invalid(format!(
                "edges.low_threshold must be non-negative, got {}",
                edges.low_threshold
            )));
        }
        if !edges.high_threshold.is_finite() || edges.high_threshold < edges.low_threshold {
            return Err(invalid(format!(
                "edges.high_threshold ({}) must be >= edges.low_threshold ({})",
                edges.high_threshold, edges.low_threshold
            )));
        }

        let lines = &self.lines;
        if lines.vote_threshold == Some(0) {
            return Err(invalid("lines.vote_threshold must be at least 1".into()));
        }
        if !(lines.vote_fraction.is_finite() && lines.vote_fraction > 0.0 && lines.vote_fraction <= 1.0) {
            return Err(invalid(format!(
                "lines.vote_fraction must be in (0, 1], got {}",
                lines.vote_fraction
            )));
        }
        if lines.min_votes == 0 {
            return Err(invalid("lines.min_votes must be at least 1".into()));
        }
        if !(lines.support_band.is_finite() && lines.support_band > 0.0) {
            return Err(invalid(format!(
                "lines.support_band must be positive, got {}",
                lines.support_band
            )));
        }

        let corners = &self.corners;
        if !(corners.angle_tolerance_deg > 0.0 && corners.angle_tolerance_deg < 45.0) {
            return Err(invalid(format!(
                "corners.angle_tolerance_deg must be in (0, 45), got {}",
                corners.angle_tolerance_deg
            )));
        }
        if !(corners.min_separation_deg > 0.0 && corners.min_separation_deg <= 90.0) {
            return Err(invalid(format!(
                "corners.min_separation_deg must be in (0, 90], got {}",
                corners.min_separation_deg
            )));
        }
        if corners.max_lines_per_cluster < 2 {
            return Err(invalid(
                "corners.max_lines_per_cluster must be at least 2".into(),
            ));
        }
        if !(corners.min_area_ratio.is_finite() && (0.0..1.0).contains(&corners.min_area_ratio)) {
            return Err(invalid(format!(
                "corners.min_area_ratio must be in [0, 1), got {}",
                corners.min_area_ratio
            )));
        }
        if !(corners.max_side_ratio.is_finite() && corners.max_side_ratio >= 1.0) {
            return Err(invalid(format!(
                "corners.max_side_ratio must be >= 1, got {}",
                corners.max_side_ratio
            )));
        }
        if !(corners.area_tie_ratio.is_finite() && (0.0..1.0).contains(&corners.area_tie_ratio)) {
            return Err(invalid(format!(
                "corners.area_tie_ratio must be in [0, 1), got {}",
                corners.area_tie_ratio
            )));
        }
        if !(corners.border_margin_ratio.is_finite() && corners.border_margin_ratio >= 0.0) {
            return Err(invalid(format!(
                "corners.border_margin_ratio must be non-negative, got {}",
                corners.border_margin_ratio
            )));
        }

        if !(self.aspect_ratio.is_finite() && self.aspect_ratio >= 1.0) {
            return Err(invalid(format!(
                "aspect_ratio must be >= 1, got {}",
                self.aspect_ratio
            )));
        }

        Ok(())
    }
}

fn invalid(message: String) -> FlatpageError {
    FlatpageError::Config(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.aspect_ratio - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            DetectionConfig::from_json_str(r#"{ "lines": { "vote_threshold": 120 } }"#)
                .expect("partial config should parse");
        assert_eq!(config.lines.vote_threshold, Some(120));
        assert_eq!(config.lines.suppression_radius, 8);
        assert_eq!(config.edges, EdgeParams::default());
        assert_eq!(config.corners, CornerParams::default());
    }

    #[test]
    fn inverted_canny_thresholds_rejected() {
        let mut config = DetectionConfig::default();
        config.edges.low_threshold = 200.0;
        config.edges.high_threshold = 100.0;
        assert!(matches!(config.validate(), Err(FlatpageError::Config(_))));
    }

    #[test]
    fn orientation_separation_out_of_range_rejected() {
        let err = DetectionConfig::from_json_str(r#"{ "corners": { "min_separation_deg": 120.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, FlatpageError::Config(_)), "got {err:?}");
    }

    #[test]
    fn aspect_ratio_below_one_rejected() {
        let err = DetectionConfig::from_json_str(r#"{ "aspect_ratio": 0.5 }"#).unwrap_err();
        assert!(matches!(err, FlatpageError::Config(_)), "got {err:?}");
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = DetectionConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, FlatpageError::Serialization(_)));
    }

    #[test]
    fn scaled_vote_threshold() {
        let params = LineParams::default();
        // 0.15 * 400 = 60
        assert_eq!(params.threshold_for(400, 500), 60);
        // Tiny images fall back to the floor.
        assert_eq!(params.threshold_for(50, 50), 30);

        let fixed = LineParams {
            vote_threshold: Some(200),
            ..LineParams::default()
        };
        assert_eq!(fixed.threshold_for(400, 500), 200);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("flatpage.json");

        let mut config = DetectionConfig::default();
        config.corners.min_area_ratio = 0.25;
        std::fs::write(&path, config.to_json_string().expect("serialize")).expect("write");

        let loaded = DetectionConfig::from_json_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DetectionConfig::from_json_file("/nonexistent/flatpage.json").unwrap_err();
        assert!(matches!(err, FlatpageError::Io(_)));
    }
}
