// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end detection runs on synthetic photos.

mod common;

use common::{BACKGROUND, init_tracing, rotated_page, tilted_a4_photo};
use flatpage_core::{CornerSet, DetectionConfig, FlatpageError, Point};
use flatpage_document::{DetectionEngine, PipelineRecord, StageData, TextExtractor};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

const CORNER_TOLERANCE: f64 = 5.0;

fn engine() -> DetectionEngine {
    DetectionEngine::new(DetectionConfig::default()).expect("default config is valid")
}

struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    fn extract_text(&self, _image: &DynamicImage) -> flatpage_core::error::Result<Vec<String>> {
        Err(FlatpageError::TextExtraction("recogniser unavailable".into()))
    }
}

struct WordsExtractor;

impl TextExtractor for WordsExtractor {
    fn extract_text(&self, image: &DynamicImage) -> flatpage_core::error::Result<Vec<String>> {
        Ok(vec![format!("{}x{}", image.width(), image.height())])
    }
}

#[test]
fn tilted_page_corners_are_recovered() {
    init_tracing();
    let page = tilted_a4_photo();
    let expected = CornerSet::from_points(page.corners).expect("valid page");
    let (result, _) = engine().detect_document(page.image).expect("page found");

    let error = result.corners.max_corner_distance(&expected);
    assert!(error <= CORNER_TOLERANCE, "corners {:?} off by {error:.2}px", result.corners);
}

#[test]
fn page_rotated_near_the_diagonal_is_recovered() {
    init_tracing();
    for rotation in [40.0, 45.0, -40.0] {
        let page = rotated_page(600, 700, (300.0, 350.0), (280.0, 396.0), rotation);
        let expected = CornerSet::from_points(page.corners).expect("valid page");
        let (result, _) = engine()
            .detect_document(page.image)
            .unwrap_or_else(|err| panic!("{rotation}°: {err}"));

        let error = result.corners.max_corner_distance(&expected);
        assert!(error <= CORNER_TOLERANCE, "{rotation}°: off by {error:.2}px");
        let aspect = result.size.aspect();
        assert!(
            (aspect - std::f64::consts::SQRT_2).abs() <= 1.0 / result.size.width.min(result.size.height) as f64,
            "{rotation}°: aspect {aspect}"
        );
    }
}

#[test]
fn rectified_page_has_iso_aspect() {
    init_tracing();
    let (result, _) = engine()
        .detect_document(tilted_a4_photo().image)
        .expect("page found");

    let (w, h) = (result.rectified.width() as f64, result.rectified.height() as f64);
    assert!(h > w, "portrait page should stay portrait ({w}x{h})");
    let aspect = h / w;
    assert!(
        (aspect - std::f64::consts::SQRT_2).abs() <= 1.0 / w,
        "aspect {aspect}"
    );
    assert!(w <= result.size.measured_width.min(result.size.measured_height) + 1e-9);
}

#[test]
fn rectified_page_is_mostly_paper() {
    let (result, _) = engine()
        .detect_document(tilted_a4_photo().image)
        .expect("page found");
    let gray = result.rectified.to_luma8();
    let (w, h) = gray.dimensions();
    let centre = gray.get_pixel(w / 2, h / 2).0[0];
    assert!(centre > 200, "centre of flattened page is {centre}");
}

#[test]
fn landscape_page_stays_landscape() {
    let page = rotated_page(500, 400, (250.0, 200.0), (283.0, 200.0), -3.0);
    let (result, _) = engine().detect_document(page.image).expect("page found");
    assert!(result.rectified.width() > result.rectified.height());
}

#[test]
fn detection_is_deterministic() {
    let engine = engine();
    let image = tilted_a4_photo().image;
    let (first, first_record) = engine.detect_document(image.clone()).expect("first run");
    let (second, second_record) = engine.detect_document(image).expect("second run");

    assert_eq!(first.corners, second.corners);
    assert_eq!(first.corners.max_corner_distance(&second.corners), 0.0);
    assert_eq!(first.transform, second.transform);
    assert_eq!(first.rectified.as_bytes(), second.rectified.as_bytes());
    assert_eq!(
        first_record.get("lines").and_then(|s| s.data.clone()),
        second_record.get("lines").and_then(|s| s.data.clone())
    );
}

#[test]
fn blank_photo_is_document_not_found_with_partial_record() {
    init_tracing();
    let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 400, Luma([BACKGROUND])));
    let mut record = PipelineRecord::new();

    let err = engine().detect_document_into(blank, &mut record).unwrap_err();
    assert!(matches!(err, FlatpageError::DocumentNotFound(_)), "got {err:?}");
    assert_eq!(record.labels().collect::<Vec<_>>(), vec!["edges", "lines"]);
    assert_eq!(
        record.get("lines").and_then(|s| s.data.clone()),
        Some(StageData::Lines(Vec::new()))
    );
}

#[test]
fn empty_image_is_invalid_input() {
    let mut record = PipelineRecord::new();
    let err = engine()
        .detect_document_into(DynamicImage::new_luma8(0, 0), &mut record)
        .unwrap_err();
    assert!(matches!(err, FlatpageError::InvalidInput(_)), "got {err:?}");
    assert!(record.is_empty());
}

#[test]
fn failing_text_extraction_still_returns_the_page() {
    let engine = DetectionEngine::with_extractor(DetectionConfig::default(), FailingExtractor)
        .expect("engine");
    let (result, record) = engine
        .detect_document(tilted_a4_photo().image)
        .expect("geometry succeeds regardless of text extraction");
    assert!(result.words.is_empty());
    assert!(record.contains("warp"));
}

#[test]
fn extractor_sees_the_rectified_page() {
    let engine =
        DetectionEngine::with_extractor(DetectionConfig::default(), WordsExtractor).expect("engine");
    let (result, _) = engine
        .detect_document(tilted_a4_photo().image)
        .expect("page found");
    assert_eq!(
        result.words,
        vec![format!("{}x{}", result.size.width, result.size.height)]
    );
}

#[test]
fn record_holds_every_stage_in_order() {
    let page = tilted_a4_photo();
    let (result, record) = engine().detect_document(page.image).expect("page found");

    assert_eq!(
        record.labels().collect::<Vec<_>>(),
        vec!["edges", "lines", "corners", "warp"]
    );
    assert_eq!(
        record.get("corners").and_then(|s| s.data.clone()),
        Some(StageData::Corners(result.corners))
    );
    let warp = record.image("warp").expect("warp recorded");
    assert_eq!(warp.as_bytes(), result.rectified.as_bytes());
    let edges = record.image("edges").expect("edges recorded");
    assert_eq!((edges.width(), edges.height()), (400, 500));
}

#[test]
fn rectified_corners_map_back_to_source_corners() {
    let (result, _) = engine()
        .detect_document(tilted_a4_photo().image)
        .expect("page found");
    let (w, h) = (result.size.width as f64, result.size.height as f64);

    for (dest, src) in [
        (Point::new(0.0, 0.0), result.corners.top_left()),
        (Point::new(w, 0.0), result.corners.top_right()),
        (Point::new(0.0, h), result.corners.bottom_left()),
        (Point::new(w, h), result.corners.bottom_right()),
    ] {
        let back = result.map_to_source(dest).expect("finite");
        assert!(back.distance(&src) < 1e-6, "{dest:?} -> {back:?}, want {src:?}");
    }
}

#[test]
fn color_photo_keeps_its_format() {
    let gray = tilted_a4_photo().image.to_luma8();
    let rgb = RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v.saturating_sub(10)])
    });
    let (result, _) = engine()
        .detect_document(DynamicImage::ImageRgb8(rgb))
        .expect("page found");
    assert!(result.rectified.as_rgb8().is_some());
    assert!(result.original.as_rgb8().is_some());
}
