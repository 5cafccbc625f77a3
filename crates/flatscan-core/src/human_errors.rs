// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people scanning documents.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity tells the caller whose fault it was: bad input from the client,
// or a failure on our side.

use crate::error::FlatscanError;

/// Which side of the boundary an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The submitted input was missing or unusable.
    ClientError,
    /// Processing failed after valid input was received.
    ServerError,
}

impl Severity {
    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ClientError => 2,
            Self::ServerError => 1,
        }
    }
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `FlatscanError` into a `HumanError`.
pub fn humanize_error(err: &FlatscanError) -> HumanError {
    match err {
        FlatscanError::EmptyInput => HumanError {
            message: "No images were received.".into(),
            suggestion: "Choose at least one photo of a document and try again.".into(),
            severity: Severity::ClientError,
        },

        FlatscanError::ImageError(detail) => HumanError {
            message: "One of the photos couldn't be read.".into(),
            suggestion: format!(
                "Make sure every file is a JPEG, PNG or TIFF photo and isn't damaged. ({detail})"
            ),
            severity: Severity::ClientError,
        },

        FlatscanError::Segmentation(_) => HumanError {
            message: "We couldn't separate the document from the background.".into(),
            suggestion: "Check that the background-removal model is installed, or run without it.".into(),
            severity: Severity::ServerError,
        },

        FlatscanError::EncodingFailure(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "None of the pages could be turned into a document. Try again with different photos.".into(),
            severity: Severity::ServerError,
        },

        FlatscanError::Config(detail) => HumanError {
            message: "The settings file has a problem.".into(),
            suggestion: format!("Fix or delete the settings file and try again. ({detail})"),
            severity: Severity::ClientError,
        },

        FlatscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::ClientError,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to read or write that file.".into(),
                    suggestion: "Check the file and folder permissions, or choose another output folder.".into(),
                    severity: Severity::ServerError,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    severity: Severity::ServerError,
                }
            }
        }

        FlatscanError::Serialization(_) => HumanError {
            message: "Some internal data couldn't be saved or loaded.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::ServerError,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_client_error() {
        let human = humanize_error(&FlatscanError::EmptyInput);
        assert_eq!(human.severity, Severity::ClientError);
        assert_eq!(human.severity.exit_code(), 2);
    }

    #[test]
    fn encoding_failure_is_server_error() {
        let err = FlatscanError::EncodingFailure("no pages".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ServerError);
        assert_eq!(human.severity.exit_code(), 1);
    }

    #[test]
    fn segmentation_failure_is_server_error() {
        let err = FlatscanError::Segmentation("model missing".into());
        assert_eq!(humanize_error(&err).severity, Severity::ServerError);
    }

    #[test]
    fn undecodable_image_mentions_detail() {
        let err = FlatscanError::ImageError("bad magic".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ClientError);
        assert!(human.suggestion.contains("bad magic"));
    }

    #[test]
    fn missing_file_is_client_error() {
        let err = FlatscanError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ClientError);
    }
}
