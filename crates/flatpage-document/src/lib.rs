// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// flatpage-document — Find a photographed page and flatten it.
//
// Provides the detection pipeline (edge extraction, Hough line detection,
// corner selection, perspective rectification), a diagnostic record of every
// stage, and the text-extraction hand-off (OCR behind the `ocr` feature).

pub mod engine;
pub mod pipeline;
pub mod scan;
pub mod text;

// Re-export the primary types so callers can use `flatpage_document::DetectionEngine` etc.
pub use engine::{DetectionEngine, DetectionResult};
pub use pipeline::record::{PipelineRecord, StageData, StageRecord};
pub use scan::corners::CornersNotFound;
pub use scan::rectify::{Rectified, RectifiedSize};
pub use text::{NoTextExtractor, TextExtractor};

#[cfg(feature = "ocr")]
pub use text::ocr::OcrEngine;
