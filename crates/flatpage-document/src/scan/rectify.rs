// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — size the flat page from the measured sides of
// the quadrilateral, solve the projective transform, and resample.

use flatpage_core::error::{FlatpageError, Result};
use flatpage_core::types::{CornerSet, Point, TransformMatrix};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

/// Output geometry of a rectification, with the measurements it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectifiedSize {
    pub top_width: f64,
    pub bottom_width: f64,
    pub left_height: f64,
    pub right_height: f64,
    /// `min(top_width, bottom_width)`.
    pub measured_width: f64,
    /// `min(left_height, right_height)`.
    pub measured_height: f64,
    /// Output raster width in pixels.
    pub width: u32,
    /// Output raster height in pixels.
    pub height: u32,
}

impl RectifiedSize {
    /// Longer over shorter output side.
    pub fn aspect(&self) -> f64 {
        let (w, h) = (self.width as f64, self.height as f64);
        w.max(h) / w.min(h)
    }
}

/// A flattened page and the transform that produced it.
#[derive(Debug, Clone)]
pub struct Rectified {
    pub image: DynamicImage,
    /// Maps source image coordinates onto rectified coordinates.
    pub transform: TransformMatrix,
    pub size: RectifiedSize,
}

/// Compute the output size for `corners`.
///
/// Width and height are each the smaller of the two opposite side lengths.
/// The shorter of the two is kept (floored to whole pixels) and the other is
/// set to `shorter * aspect_ratio`, so a page measured taller than wide stays
/// portrait and one measured wider than tall stays landscape.
pub fn output_size(corners: &CornerSet, aspect_ratio: f64) -> Result<RectifiedSize> {
    let top_width = corners.top_width();
    let bottom_width = corners.bottom_width();
    let left_height = corners.left_height();
    let right_height = corners.right_height();

    let measured_width = top_width.min(bottom_width);
    let measured_height = left_height.min(right_height);
    if !(measured_width.is_finite() && measured_width > 0.0)
        || !(measured_height.is_finite() && measured_height > 0.0)
    {
        return Err(FlatpageError::Geometry(format!(
            "measured page size must be positive, got {measured_width:.3} x {measured_height:.3}"
        )));
    }
    if !(aspect_ratio.is_finite() && aspect_ratio >= 1.0) {
        return Err(FlatpageError::Geometry(format!(
            "aspect ratio must be >= 1, got {aspect_ratio}"
        )));
    }

    let shorter = measured_width.min(measured_height).floor();
    if shorter < 1.0 {
        return Err(FlatpageError::Geometry(format!(
            "page is smaller than one pixel ({measured_width:.3} x {measured_height:.3})"
        )));
    }
    let longer = (shorter * aspect_ratio).round();

    let (width, height) = if measured_height < measured_width {
        (longer as u32, shorter as u32)
    } else {
        (shorter as u32, longer as u32)
    };

    Ok(RectifiedSize {
        top_width,
        bottom_width,
        left_height,
        right_height,
        measured_width,
        measured_height,
        width,
        height,
    })
}

/// Destination corners in `CornerSet` order: top-left, top-right,
/// bottom-left, bottom-right.
pub fn destination_corners(size: &RectifiedSize) -> [Point; 4] {
    let (w, h) = (size.width as f64, size.height as f64);
    [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(0.0, h),
        Point::new(w, h),
    ]
}

/// Warp the quadrilateral bounded by `corners` into an upright rectangle.
///
/// 8-bit gray and RGB images keep their format; everything else is resampled
/// as RGBA8. Output pixels whose source falls outside the image are white.
#[instrument(skip_all, fields(width = image.width(), height = image.height(), aspect_ratio))]
pub fn rectify(image: &DynamicImage, corners: &CornerSet, aspect_ratio: f64) -> Result<Rectified> {
    if image.width() == 0 || image.height() == 0 {
        return Err(FlatpageError::InvalidInput(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    let size = output_size(corners, aspect_ratio)?;
    debug!(
        top = size.top_width,
        bottom = size.bottom_width,
        left = size.left_height,
        right = size.right_height,
        out_w = size.width,
        out_h = size.height,
        "Output size computed"
    );

    let transform = solve_transform(&corners.points(), &destination_corners(&size))?;
    let projection = projection_for(&transform)?;

    let warped = warp_image(image, &projection, size.width, size.height);

    info!(out_w = size.width, out_h = size.height, "Page rectified");
    Ok(Rectified {
        image: warped,
        transform,
        size,
    })
}

/// The transform taking each `src` corner onto the matching `dest` corner.
fn solve_transform(src: &[Point; 4], dest: &[Point; 4]) -> Result<TransformMatrix> {
    TransformMatrix::from_correspondences(src, dest).ok_or_else(|| {
        FlatpageError::Geometry("corner correspondences give a singular transform".into())
    })
}

fn projection_for(transform: &TransformMatrix) -> Result<Projection> {
    Projection::from_matrix(transform.to_row_major_f32()).ok_or_else(|| {
        FlatpageError::Geometry("perspective transform is not invertible".into())
    })
}

fn warp_image(image: &DynamicImage, projection: &Projection, width: u32, height: u32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(width, height);
            warp_into(gray, projection, Interpolation::Bilinear, Luma([255u8]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        DynamicImage::ImageRgb8(rgb) => {
            let mut out = RgbImage::new(width, height);
            warp_into(rgb, projection, Interpolation::Bilinear, Rgb([255u8, 255, 255]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
        other => {
            let rgba = other.to_rgba8();
            let mut out = RgbaImage::new(width, height);
            warp_into(
                &rgba,
                projection,
                Interpolation::Bilinear,
                Rgba([255u8, 255, 255, 255]),
                &mut out,
            );
            DynamicImage::ImageRgba8(out)
        }
    }
}
