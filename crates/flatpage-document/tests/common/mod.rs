// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the detection integration tests.

#![allow(dead_code)]

use flatpage_core::Point;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;

pub const BACKGROUND: u8 = 30;
pub const PAPER: u8 = 240;

/// A synthetic photo: a bright page on a dark background.
pub struct SyntheticPage {
    pub image: DynamicImage,
    /// Page corners in TL, TR, BL, BR order.
    pub corners: [Point; 4],
}

/// Draw a `page_w` x `page_h` page centred at (`cx`, `cy`) and rotated by
/// `rotation_deg` clockwise onto a `width` x `height` canvas.
pub fn rotated_page(
    width: u32,
    height: u32,
    (cx, cy): (f64, f64),
    (page_w, page_h): (f64, f64),
    rotation_deg: f64,
) -> SyntheticPage {
    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let place = |dx: f64, dy: f64| {
        Point::new(
            (cx + dx * cos - dy * sin).round(),
            (cy + dx * sin + dy * cos).round(),
        )
    };
    let (hw, hh) = (page_w / 2.0, page_h / 2.0);
    let tl = place(-hw, -hh);
    let tr = place(hw, -hh);
    let br = place(hw, hh);
    let bl = place(-hw, hh);

    let mut gray = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));
    let polygon: Vec<PixelPoint<i32>> = [tl, tr, br, bl]
        .iter()
        .map(|p| PixelPoint::new(p.x as i32, p.y as i32))
        .collect();
    draw_polygon_mut(&mut gray, &polygon, Luma([PAPER]));

    SyntheticPage {
        image: DynamicImage::ImageLuma8(gray),
        corners: [tl, tr, bl, br],
    }
}

/// The reference scene: a 200x283 page rotated 4° in a 400x500 photo.
pub fn tilted_a4_photo() -> SyntheticPage {
    rotated_page(400, 500, (200.0, 250.0), (200.0, 283.0), 4.0)
}

/// Route pipeline logs to the test harness; set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
