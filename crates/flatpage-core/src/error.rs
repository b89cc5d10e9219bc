// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Flatpage.

use thiserror::Error;

/// Top-level error type for all Flatpage operations.
#[derive(Debug, Error)]
pub enum FlatpageError {
    // -- Input errors --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Detection errors --
    /// No document-shaped quadrilateral could be found in the image.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// Degenerate geometry reached a stage that needs a proper quadrilateral.
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    #[error("text extraction failed: {0}")]
    TextExtraction(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FlatpageError>;
