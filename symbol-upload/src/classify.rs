// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

pub const UPLOAD_FAILED: &str = "Error while trying to upload symbols";

const ERROR_MARKER: &str = "error";

/// How stderr lines are matched against the word "error".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorMatch {
    /// Only the lowercase substring `error` marks a line as fatal.
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl ErrorMatch {
    fn is_error(self, line: &str) -> bool {
        match self {
            ErrorMatch::CaseSensitive => line.contains(ERROR_MARKER),
            ErrorMatch::CaseInsensitive => line.to_lowercase().contains(ERROR_MARKER),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UploadOutcome {
    Success,
    Failure(String),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UploadOutcome::Success => write!(f, "success"),
            UploadOutcome::Failure(reason) => write!(f, "failure: {}", reason),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Classification {
    pub outcome: UploadOutcome,
    /// Lines that marked the upload as failed.
    pub errors: Vec<String>,
    /// Lines that were reported but not treated as failures.
    pub diagnostics: Vec<String>,
}

/// Decide the outcome of an upload from the uploader's stderr.
///
/// The uploader does not report failures reliably through its exit code, so
/// any stderr line mentioning "error" fails the upload.  Other lines are
/// passed through as diagnostics and do not affect the outcome.
pub fn classify_errors<S: AsRef<str>>(lines: &[S], policy: ErrorMatch) -> Classification {
    let mut errors = vec![];
    let mut diagnostics = vec![];

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }

        if policy.is_error(line) {
            error!("{}", line);
            errors.push(line.to_owned());
        } else {
            debug!("{}", line);
            diagnostics.push(line.to_owned());
        }
    }

    let outcome = if errors.is_empty() {
        UploadOutcome::Success
    } else {
        UploadOutcome::Failure(UPLOAD_FAILED.to_owned())
    };

    Classification {
        outcome,
        errors,
        diagnostics,
    }
}
