// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::env;
use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;

use crate::error::ValidationError;

/// Caller-supplied upload configuration, before validation.
///
/// Every field is optional here so that values can be merged from several
/// sources (command line, environment, config file) before `validate` runs.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct UploadParams {
    pub url: Option<String>,
    pub auth_token: Option<String>,
    pub api_key: Option<String>,
    pub org_slug: Option<String>,
    pub project_slug: Option<String>,
    pub dsym_path: Option<String>,
    pub dsym_paths: Vec<String>,
}

impl UploadParams {
    /// Fill every unset field of `self` from `other`.
    ///
    /// `dsym_paths` is only taken from `other` when `self` has none.
    pub fn or(self, other: UploadParams) -> UploadParams {
        UploadParams {
            url: self.url.or(other.url),
            auth_token: self.auth_token.or(other.auth_token),
            api_key: self.api_key.or(other.api_key),
            org_slug: self.org_slug.or(other.org_slug),
            project_slug: self.project_slug.or(other.project_slug),
            dsym_path: self.dsym_path.or(other.dsym_path),
            dsym_paths: if self.dsym_paths.is_empty() {
                other.dsym_paths
            } else {
                self.dsym_paths
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Credential {
    AuthToken(String),
    /// Deprecated in favor of `AuthToken`.
    ApiKey(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationWarning {
    DeprecatedApiKey,
}

/// A validated upload request.  Constructed only by `UploadRequest::validate`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRequest {
    service_url: Option<String>,
    credential: Credential,
    organization_slug: String,
    project_slug: String,
    symbol_paths: Vec<PathBuf>,
    warnings: Vec<ValidationWarning>,
}

impl UploadRequest {
    pub fn validate(params: UploadParams) -> Result<Self, ValidationError> {
        let auth_token = non_empty(params.auth_token);
        let api_key = non_empty(params.api_key);

        let mut warnings = vec![];
        let credential = match (auth_token, api_key) {
            (None, None) => return Err(ValidationError::MissingCredential),
            (Some(_), Some(_)) => return Err(ValidationError::ConflictingCredentials),
            (Some(token), None) => Credential::AuthToken(token),
            (None, Some(key)) => {
                warn!("the api key is deprecated and will be removed, use an auth token instead");
                warnings.push(ValidationWarning::DeprecatedApiKey);
                Credential::ApiKey(key)
            }
        };

        let organization_slug =
            non_empty(params.org_slug).ok_or(ValidationError::MissingField("org_slug"))?;
        let project_slug =
            non_empty(params.project_slug).ok_or(ValidationError::MissingField("project_slug"))?;

        let candidates: Vec<String> = params
            .dsym_paths
            .into_iter()
            .chain(params.dsym_path)
            .filter(|path| !path.trim().is_empty())
            .collect();

        if candidates.is_empty() {
            return Err(ValidationError::MissingField("dsym_path"));
        }

        let symbol_paths = candidates
            .iter()
            .map(|candidate| resolve_existing(candidate))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            service_url: non_empty(params.url),
            credential,
            organization_slug,
            project_slug,
            symbol_paths,
            warnings,
        })
    }

    pub fn service_url(&self) -> Option<&str> {
        self.service_url.as_deref()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn organization_slug(&self) -> &str {
        &self.organization_slug
    }

    pub fn project_slug(&self) -> &str {
        &self.project_slug
    }

    pub fn symbol_paths(&self) -> &[PathBuf] {
        &self.symbol_paths
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn resolve_existing(candidate: &str) -> Result<PathBuf, ValidationError> {
    let path = Path::new(candidate);
    let resolved = match path.absolutize() {
        Ok(resolved) => resolved.into_owned(),
        // absolutize only fails when the working directory is unreadable
        Err(_) => env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    };

    if resolved.exists() {
        Ok(resolved)
    } else {
        Err(ValidationError::PathNotFound(resolved))
    }
}
