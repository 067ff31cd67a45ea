// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use symbol_upload::{ErrorMatch, UploadOrchestrator, UploadParams, UploaderCommand, Version};

#[derive(Args, Clone, Debug, Default)]
pub struct UploadOpt {
    /// Crash-reporting service URL, if not the uploader's default.
    #[arg(long, env = "SERVICE_URL")]
    pub url: Option<String>,

    #[arg(long, env = "SERVICE_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Deprecated: use --auth-token.
    #[arg(long, env = "SERVICE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "SERVICE_ORG")]
    pub org_slug: Option<String>,

    #[arg(long, env = "SERVICE_PROJECT")]
    pub project_slug: Option<String>,

    /// Symbol file to upload, sent after any --dsym-paths.
    #[arg(long)]
    pub dsym_path: Option<String>,

    #[arg(long, num_args = 1..)]
    pub dsym_paths: Vec<String>,

    /// JSON file with upload parameters.  Command line values take precedence.
    #[arg(short, long = "config")]
    pub config_path: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct UploaderOpt {
    #[arg(long, default_value = symbol_upload::uploader::DEFAULT_UPLOADER)]
    pub uploader: PathBuf,

    /// Argument placed before the upload sub-command (repeatable).
    #[arg(long = "uploader-arg", allow_hyphen_values = true)]
    pub uploader_args: Vec<String>,

    /// Seconds to wait for the uploader before killing it.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Treat "ERROR", "Error", ... on stderr as failures too.
    #[arg(long)]
    pub case_insensitive: bool,

    /// Refuse to run an uploader older than this version.
    #[arg(long)]
    pub min_version: Option<Version>,
}

impl UploadOpt {
    pub fn params(&self) -> Result<UploadParams> {
        let params = UploadParams {
            url: self.url.clone(),
            auth_token: self.auth_token.clone(),
            api_key: self.api_key.clone(),
            org_slug: self.org_slug.clone(),
            project_slug: self.project_slug.clone(),
            dsym_path: self.dsym_path.clone(),
            dsym_paths: self.dsym_paths.clone(),
        };

        match &self.config_path {
            Some(path) => Ok(params.or(load_params(path)?)),
            None => Ok(params),
        }
    }
}

impl UploaderOpt {
    pub fn uploader_command(&self) -> UploaderCommand {
        self.uploader_args
            .iter()
            .fold(UploaderCommand::new(&self.uploader), |cmd, arg| cmd.arg(arg))
    }

    pub fn orchestrator(&self, verbose: bool) -> UploadOrchestrator {
        let error_match = if self.case_insensitive {
            ErrorMatch::CaseInsensitive
        } else {
            ErrorMatch::CaseSensitive
        };

        UploadOrchestrator::new(self.uploader_command())
            .verbose(verbose)
            .error_match(error_match)
            .timeout(self.timeout.map(Duration::from_secs))
            .minimum_version(self.min_version)
    }
}

pub fn load_params(config_path: impl AsRef<Path>) -> Result<UploadParams> {
    let config_path = config_path.as_ref();
    debug!("loading upload config from: {}", config_path.display());
    let data = std::fs::read(config_path)
        .with_context(|| format!("unable to read config file: {}", config_path.display()))?;
    let params = serde_json::from_slice(&data)
        .with_context(|| format!("invalid config file: {}", config_path.display()))?;
    Ok(params)
}
