// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction: the capability the detection engine hands the
// rectified page to. The OCR-backed implementation lives behind the `ocr`
// feature so the rest of the crate builds and tests without model files.

#[cfg(feature = "ocr")]
pub mod ocr;

use flatpage_core::error::Result;
use image::DynamicImage;

/// Anything that can read words off a rectified page.
pub trait TextExtractor {
    /// Recognised words in reading order. An empty page yields an empty list.
    fn extract_text(&self, image: &DynamicImage) -> Result<Vec<String>>;
}

impl<T: TextExtractor + ?Sized> TextExtractor for &T {
    fn extract_text(&self, image: &DynamicImage) -> Result<Vec<String>> {
        (**self).extract_text(image)
    }
}

impl<T: TextExtractor + ?Sized> TextExtractor for Box<T> {
    fn extract_text(&self, image: &DynamicImage) -> Result<Vec<String>> {
        (**self).extract_text(image)
    }
}

/// Extractor for callers that only want the geometry; always returns no words.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextExtractor;

impl TextExtractor for NoTextExtractor {
    fn extract_text(&self, _image: &DynamicImage) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Split recognised text into words, dropping empty tokens.
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_text_extractor_returns_nothing() {
        let img = DynamicImage::new_luma8(10, 10);
        assert!(NoTextExtractor.extract_text(&img).expect("ok").is_empty());
    }

    #[test]
    fn boxed_extractor_delegates() {
        let boxed: Box<dyn TextExtractor> = Box::new(NoTextExtractor);
        let img = DynamicImage::new_luma8(1, 1);
        assert!(boxed.extract_text(&img).expect("ok").is_empty());
    }

    #[test]
    fn words_are_split_across_lines() {
        assert_eq!(
            split_words("  Invoice No.\n\n 4711\tpaid "),
            vec!["Invoice", "No.", "4711", "paid"]
        );
        assert!(split_words(" \n ").is_empty());
    }
}
