// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::classify::{classify_errors, ErrorMatch, UploadOutcome};
use crate::env;
use crate::error::{UploadError, ValidationError};
use crate::process::run_process;
use crate::request::{UploadParams, UploadRequest};
use crate::uploader::UploaderCommand;
use crate::version::{self, Version};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    Validating,
    Invoking,
    Draining,
    Classified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let as_str = match self {
            Stage::Validating => "validating",
            Stage::Invoking => "invoking",
            Stage::Draining => "draining",
            Stage::Classified => "classified",
        };
        write!(f, "{}", as_str)
    }
}

/// Runs a single symbol upload through the external uploader.
///
/// Each call to `upload` owns its own child process and buffers; nothing is
/// shared between invocations and nothing is retried.
#[derive(Clone, Debug, Default)]
pub struct UploadOrchestrator {
    uploader: UploaderCommand,
    verbose: bool,
    error_match: ErrorMatch,
    timeout: Option<Duration>,
    minimum_version: Option<Version>,
}

impl UploadOrchestrator {
    pub fn new(uploader: UploaderCommand) -> Self {
        Self {
            uploader,
            ..Self::default()
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn error_match(mut self, error_match: ErrorMatch) -> Self {
        self.error_match = error_match;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn minimum_version(mut self, minimum: Option<Version>) -> Self {
        self.minimum_version = minimum;
        self
    }

    pub fn validate(&self, params: UploadParams) -> Result<UploadRequest, ValidationError> {
        UploadRequest::validate(params)
    }

    pub fn build_environment(&self, request: &UploadRequest) -> HashMap<String, String> {
        env::build_environment(request, self.verbose)
    }

    /// Launch the uploader for `paths` and classify what it reports.
    ///
    /// Errors are reserved for the process failing to start, its output
    /// becoming unreadable or the timeout expiring.  A failed upload is an
    /// `Ok(UploadOutcome::Failure(..))`.
    pub async fn invoke(
        &self,
        paths: &[PathBuf],
        org: &str,
        project: &str,
        environment: &HashMap<String, String>,
    ) -> Result<UploadOutcome, UploadError> {
        let argv = self.uploader.upload_dsym_args(paths, org, project);
        let command_line = self.uploader.render(&argv);
        debug!(
            "running uploader: cmd:{} env:{:?} timeout:{:?}",
            command_line,
            env::redacted(environment),
            self.timeout
        );

        let cmd = self.uploader.command(&argv, environment);
        self.transition(Stage::Draining);
        let result = run_process(cmd, "uploader", self.timeout).await?;

        self.transition(Stage::Classified);
        if result.exit_status.success && result.stderr.is_empty() {
            return Ok(UploadOutcome::Success);
        }

        if !result.exit_status.success {
            warn!(
                "uploader exited with {:?}: {}",
                result.exit_status, command_line
            );
        }

        Ok(classify_errors(&result.stderr, self.error_match).outcome)
    }

    /// Validate `params`, run the uploader once and report the outcome.
    pub async fn upload(&self, params: UploadParams) -> Result<(), UploadError> {
        self.transition(Stage::Validating);
        let request = self.validate(params)?;

        if let Some(minimum) = self.minimum_version {
            version::check_version(&self.uploader, minimum).await?;
        }

        self.transition(Stage::Invoking);
        let environment = self.build_environment(&request);
        let outcome = self
            .invoke(
                request.symbol_paths(),
                request.organization_slug(),
                request.project_slug(),
                &environment,
            )
            .await?;

        match outcome {
            UploadOutcome::Success => {
                info!(
                    "uploaded {} symbol file(s) to {}/{}",
                    request.symbol_paths().len(),
                    request.organization_slug(),
                    request.project_slug()
                );
                Ok(())
            }
            UploadOutcome::Failure(reason) => Err(UploadError::Failed(reason)),
        }
    }

    fn transition(&self, stage: Stage) {
        debug!("symbol upload: {}", stage);
    }
}
