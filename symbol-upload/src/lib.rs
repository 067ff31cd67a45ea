// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

pub mod classify;
pub mod env;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod request;
pub mod shell;
pub mod uploader;
pub mod version;

pub use classify::{classify_errors, Classification, ErrorMatch, UploadOutcome};
pub use error::{UploadError, ValidationError};
pub use orchestrator::UploadOrchestrator;
pub use request::{Credential, UploadParams, UploadRequest, ValidationWarning};
pub use uploader::UploaderCommand;
pub use version::Version;
