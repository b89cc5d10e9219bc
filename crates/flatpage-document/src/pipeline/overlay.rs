// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic overlays drawn into the pipeline record.

use flatpage_core::types::{CornerSet, HoughLine};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const LINE_COLOR: Rgb<u8> = Rgb([255, 40, 40]);
const QUAD_COLOR: Rgb<u8> = Rgb([40, 220, 40]);

/// Corner marker colors in `CornerSet` order (TL, TR, BL, BR).
const CORNER_COLORS: [Rgb<u8>; 4] = [
    Rgb([255, 0, 0]),
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 255, 0]),
];

/// The edge map in gray with every detected line drawn across it.
pub fn draw_lines(edges: &GrayImage, lines: &[HoughLine]) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(edges.clone()).to_rgb8();
    let (width, height) = canvas.dimensions();

    for line in lines {
        if let Some((a, b)) = line.clip_to(width, height) {
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                LINE_COLOR,
            );
        }
    }
    canvas
}

/// The source image with the quadrilateral outlined and its corners marked.
pub fn draw_corners(image: &DynamicImage, corners: &CornerSet) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();

    let polygon = corners.polygon();
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[(i + 1) % polygon.len()]);
        draw_line_segment_mut(
            &mut canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            QUAD_COLOR,
        );
    }

    let radius = (width.min(height) / 80).max(2) as i32;
    for (point, color) in corners.points().iter().zip(CORNER_COLORS) {
        draw_filled_circle_mut(
            &mut canvas,
            (point.x.round() as i32, point.y.round() as i32),
            radius,
            color,
        );
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatpage_core::Point;

    #[test]
    fn lines_are_drawn_over_edges() {
        let edges = GrayImage::new(50, 40);
        let overlay = draw_lines(&edges, &[HoughLine::new(90.0, 20.0, 10)]);
        assert_eq!(overlay.dimensions(), (50, 40));
        assert_eq!(*overlay.get_pixel(25, 20), LINE_COLOR);
        assert_eq!(*overlay.get_pixel(25, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn corners_are_marked_in_order() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 200, Rgb([90, 90, 90])));
        let corners = CornerSet::from_points([
            Point::new(20.0, 20.0),
            Point::new(180.0, 20.0),
            Point::new(20.0, 180.0),
            Point::new(180.0, 180.0),
        ])
        .expect("valid quad");

        let overlay = draw_corners(&image, &corners);
        assert_eq!(*overlay.get_pixel(20, 20), CORNER_COLORS[0]);
        assert_eq!(*overlay.get_pixel(180, 20), CORNER_COLORS[1]);
        assert_eq!(*overlay.get_pixel(20, 180), CORNER_COLORS[2]);
        assert_eq!(*overlay.get_pixel(180, 180), CORNER_COLORS[3]);
        assert_eq!(*overlay.get_pixel(100, 20), QUAD_COLOR);
        assert_eq!(*overlay.get_pixel(100, 100), Rgb([90, 90, 90]));
    }
}
