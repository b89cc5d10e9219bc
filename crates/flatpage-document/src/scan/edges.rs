// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge extraction — grayscale conversion, Gaussian smoothing and Canny edge
// detection, producing the binary map the Hough transform votes on.

use flatpage_core::config::EdgeParams;
use flatpage_core::error::{FlatpageError, Result};
use image::{DynamicImage, GrayImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

/// Produce a binary edge map (0 or 255) with the same dimensions as `image`.
///
/// Color images are converted to grayscale first. A zero-sized image is
/// rejected with [`FlatpageError::InvalidInput`].
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn extract_edges(image: &DynamicImage, params: &EdgeParams) -> Result<GrayImage> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(FlatpageError::InvalidInput(format!(
            "image has no pixels ({width}x{height})"
        )));
    }

    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, params.blur_sigma);
    let edges = canny(&blurred, params.low_threshold, params.high_threshold);

    debug!(
        edge_pixels = edge_pixel_count(&edges),
        sigma = params.blur_sigma,
        low = params.low_threshold,
        high = params.high_threshold,
        "Edge map extracted"
    );
    Ok(edges)
}

/// Number of set pixels in an edge map.
pub fn edge_pixel_count(edges: &GrayImage) -> usize {
    edges.pixels().filter(|p| p.0[0] > 0).count()
}
