// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the detection pipeline: the full run on a
// synthetic photo, plus the two most expensive stages on their own.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use flatpage_core::DetectionConfig;
use flatpage_document::DetectionEngine;
use flatpage_document::scan::{detect_lines, extract_edges};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 400x500 dark photo with an axis-aligned bright page from (100, 108) to
/// (300, 391).
fn synthetic_photo() -> DynamicImage {
    let mut img = GrayImage::from_pixel(400, 500, Luma([30u8]));
    for y in 108..391 {
        for x in 100..300 {
            img.put_pixel(x, y, Luma([240u8]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_full_detection(c: &mut Criterion) {
    let engine = match DetectionEngine::new(DetectionConfig::default()) {
        Ok(engine) => engine,
        Err(err) => panic!("default config rejected: {err}"),
    };
    let photo = synthetic_photo();

    c.bench_function("detect_document (400x500)", |b| {
        b.iter(|| {
            let result = engine.detect_document(black_box(photo.clone()));
            black_box(result.is_ok());
        });
    });
}

/// Edge extraction and Hough line detection, the hot path of every run.
fn bench_stages(c: &mut Criterion) {
    let config = DetectionConfig::default();
    let photo = synthetic_photo();

    c.bench_function("extract_edges (400x500)", |b| {
        b.iter(|| black_box(extract_edges(black_box(&photo), &config.edges).is_ok()));
    });

    let edges = match extract_edges(&photo, &config.edges) {
        Ok(edges) => edges,
        Err(err) => panic!("edge extraction failed: {err}"),
    };
    c.bench_function("detect_lines (400x500)", |b| {
        b.iter(|| black_box(detect_lines(black_box(&edges), &config.lines).len()));
    });
}

criterion_group!(benches, bench_full_detection, bench_stages);
criterion_main!(benches);
