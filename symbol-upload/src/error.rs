// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::version::Version;

/// Rejection of an upload request before any process is launched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no credentials provided, set an auth token (or the deprecated api key)")]
    MissingCredential,

    #[error("both an auth token and an api key were provided, only one may be set")]
    ConflictingCredentials,

    #[error("missing required value: `{0}`")]
    MissingField(&'static str),

    #[error("symbol file does not exist: `{}`", .0.display())]
    PathNotFound(PathBuf),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("uploader failed to start: `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("error reading uploader output")]
    Io(#[from] io::Error),

    #[error("uploader did not exit within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),

    #[error("uploader is not installed or not on the PATH: `{program}`")]
    UploaderMissing {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to determine uploader version from output: {0:?}")]
    UnknownVersion(String),

    #[error("uploader version {found} is older than the required {minimum}")]
    OutdatedUploader { found: Version, minimum: Version },
}
