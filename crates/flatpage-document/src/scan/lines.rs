// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line detection — Hough transform over the edge map, followed by a support
// count and offset refinement for every reported line.

use flatpage_core::config::LineParams;
use flatpage_core::types::{HoughLine, Point};
use image::GrayImage;
use imageproc::hough::{LineDetectionOptions, PolarLine};
use tracing::{debug, instrument};

/// Detect straight lines in a binary edge map.
///
/// The Hough accumulator uses 1° × 1 px bins with non-maximum suppression.
/// Each surviving line is then scored by the number of edge pixels within
/// `support_band` of it, and its offset is moved to the mean position of
/// those pixels. Lines that describe the same edge from both sides of the
/// 0°/180° seam are merged, keeping the stronger one.
///
/// An empty result is a legitimate outcome (e.g. a blank image). The output
/// is sorted by votes descending, then angle, then offset, so identical
/// input always yields an identical sequence.
#[instrument(skip_all, fields(width = edges.width(), height = edges.height()))]
pub fn detect_lines(edges: &GrayImage, params: &LineParams) -> Vec<HoughLine> {
    let (width, height) = edges.dimensions();
    let vote_threshold = params.threshold_for(width, height);
    let options = LineDetectionOptions {
        vote_threshold,
        suppression_radius: params.suppression_radius,
    };

    let polar = imageproc::hough::detect_lines(edges, options);
    let measured: Vec<HoughLine> = polar
        .iter()
        .map(|line| measure_support(line, edges, params.support_band as f64))
        .filter(|line| line.votes > 0)
        .collect();
    let lines = suppress_duplicates(measured, params.suppression_radius as f64);

    debug!(
        raw_lines = polar.len(),
        lines = lines.len(),
        vote_threshold,
        "Hough lines detected"
    );
    lines
}

/// Re-centre the line's offset on nearby edge pixels, then count its support.
///
/// The accumulator offset is quantised to whole pixels, so the centring pass
/// looks one pixel further out than the counting pass.
fn measure_support(line: &PolarLine, edges: &GrayImage, band: f64) -> HoughLine {
    let rough = HoughLine::new(line.angle_in_degrees as f64, line.r as f64, 0);
    // Re-centring moves the line by at most `band + 1`.
    let nearby = edge_points_near(edges, &rough, 2.0 * band + 2.0);

    let mut near = 0u32;
    let mut drift = 0.0;
    for p in &nearby {
        let d = rough.signed_distance(*p);
        if d.abs() <= band + 1.0 {
            near += 1;
            drift += d;
        }
    }
    if near == 0 {
        return rough;
    }

    let centred = HoughLine::new(rough.angle_deg, rough.offset + drift / near as f64, 0);
    let votes = nearby
        .iter()
        .filter(|p| centred.signed_distance(**p).abs() <= band)
        .count() as u32;
    HoughLine::new(centred.angle_deg, centred.offset, votes)
}

/// Edge pixels within `reach` of `line`.
///
/// Walks the line one column (or row) at a time and only inspects the pixels
/// inside the band, so the cost grows with the image side rather than its
/// area.
fn edge_points_near(edges: &GrayImage, line: &HoughLine, reach: f64) -> Vec<Point> {
    let (width, height) = edges.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let (sin, cos) = line.angle_deg.to_radians().sin_cos();
    let mut points = Vec::new();
    let mut visit = |x: u32, y: u32| {
        if edges.get_pixel(x, y).0[0] > 0 {
            let p = Point::new(x as f64, y as f64);
            if line.signed_distance(p).abs() <= reach {
                points.push(p);
            }
        }
    };

    if sin.abs() >= cos.abs() {
        // Mostly horizontal: one short vertical run per column.
        let span = reach / sin.abs();
        for x in 0..width {
            let Some(y) = line.y_at(x as f64) else { continue };
            let (lo, hi) = ((y - span).floor().max(0.0), (y + span).ceil().min((height - 1) as f64));
            if lo > hi {
                continue;
            }
            for y in lo as u32..=hi as u32 {
                visit(x, y);
            }
        }
    } else {
        let span = reach / cos.abs();
        for y in 0..height {
            let Some(x) = line.x_at(y as f64) else { continue };
            let (lo, hi) = ((x - span).floor().max(0.0), (x + span).ceil().min((width - 1) as f64));
            if lo > hi {
                continue;
            }
            for x in lo as u32..=hi as u32 {
                visit(x, y);
            }
        }
    }
    points
}

/// Drop lines within `radius` (degrees and pixels) of a stronger line.
///
/// The accumulator's own suppression does not wrap at 180°, so a vertical
/// edge can come back as both (0°, r) and (179°, -r).
fn suppress_duplicates(mut lines: Vec<HoughLine>, radius: f64) -> Vec<HoughLine> {
    sort_by_strength(&mut lines);
    let mut kept: Vec<HoughLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if !kept.iter().any(|strong| same_line(strong, &line, radius)) {
            kept.push(line);
        }
    }
    kept
}

fn same_line(a: &HoughLine, b: &HoughLine, radius: f64) -> bool {
    let diff = (a.angle_deg - b.angle_deg).abs();
    // Across the seam the normal flips, and with it the sign of the offset.
    let (angle_gap, b_offset) = if diff > 90.0 {
        (180.0 - diff, -b.offset)
    } else {
        (diff, b.offset)
    };
    angle_gap <= radius && (a.offset - b_offset).abs() <= radius
}

/// Strongest first; ties broken by angle, then offset.
pub fn sort_by_strength(lines: &mut [HoughLine]) {
    lines.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then(a.angle_deg.total_cmp(&b.angle_deg))
            .then(a.offset.total_cmp(&b.offset))
    });
}
