// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for apps that show detection failures to the
// person holding the camera.
//
// "No page in this photo" is an expected outcome, not a crash; the severity
// tells the caller whether to ask for a new photo or to report a bug.

use crate::error::FlatpageError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The photo did not work; take another one.
    Retake,
    /// Bad input or settings supplied by the calling program.
    Permanent,
    /// Internal-consistency fault that should never happen.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `FlatpageError` into a `HumanError`.
pub fn humanize_error(err: &FlatpageError) -> HumanError {
    match err {
        FlatpageError::DocumentNotFound(_) => HumanError {
            message: "We couldn't find a page in this photo.".into(),
            suggestion: "Place the page on a plain, darker surface so all four edges are visible, then take the photo again.".into(),
            severity: Severity::Retake,
        },

        FlatpageError::InvalidInput(detail) => HumanError {
            message: "This photo couldn't be read.".into(),
            suggestion: format!("The image appears to be empty or damaged. Try taking the photo again. ({detail})"),
            severity: Severity::Retake,
        },

        FlatpageError::Geometry(detail) => HumanError {
            message: "Something went wrong while straightening the page.".into(),
            suggestion: format!("Please report this problem. ({detail})"),
            severity: Severity::Internal,
        },

        FlatpageError::TextExtraction(_) => HumanError {
            message: "Text recognition didn't work on this page.".into(),
            suggestion: "Try again with better lighting, making sure the text is clear and in focus.".into(),
            severity: Severity::Retake,
        },

        FlatpageError::Config(detail) => HumanError {
            message: "The detection settings are invalid.".into(),
            suggestion: format!("Check the settings file. ({detail})"),
            severity: Severity::Permanent,
        },

        FlatpageError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The settings file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::Permanent,
                }
            } else {
                HumanError {
                    message: "There was a problem reading a file.".into(),
                    suggestion: "Try again. If this keeps happening, check the file permissions.".into(),
                    severity: Severity::Permanent,
                }
            }
        }

        FlatpageError::Serialization(_) => HumanError {
            message: "The settings file isn't valid.".into(),
            suggestion: "Check that the settings file is well-formed JSON.".into(),
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_not_found_asks_for_retake() {
        let err = FlatpageError::DocumentNotFound("only 1 vertical line".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Retake);
    }

    #[test]
    fn geometry_is_internal() {
        let human = humanize_error(&FlatpageError::Geometry("singular transform".into()));
        assert_eq!(human.severity, Severity::Internal);
        assert!(human.suggestion.contains("singular transform"));
    }

    #[test]
    fn missing_settings_file_is_permanent() {
        let err = FlatpageError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.message.contains("couldn't be found"));
    }
}
