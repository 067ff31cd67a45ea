// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::UploadError;
use crate::uploader::UploaderCommand;

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("invalid regex");
}

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// First `MAJOR.MINOR.PATCH` found anywhere in `text`.
    pub fn find(text: &str) -> Option<Self> {
        let captures = VERSION_RE.captures(text)?;
        let part = |i: usize| -> Option<u64> { captures.get(i)?.as_str().parse().ok() };
        Some(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Version::find(s) {
            Some(version) if version.to_string() == s.trim() => Ok(version),
            _ => Err(format!("invalid version, expected MAJOR.MINOR.PATCH: {}", s)),
        }
    }
}

/// Ask the uploader for its version and make sure it is at least `minimum`.
pub async fn check_version(
    uploader: &UploaderCommand,
    minimum: Version,
) -> Result<Version, UploadError> {
    let program = uploader.program().to_string_lossy().into_owned();

    let output = uploader
        .command(&uploader.version_args(), &HashMap::new())
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|source| UploadError::UploaderMissing {
            program: program.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let found =
        Version::find(&stdout).ok_or_else(|| UploadError::UnknownVersion(stdout.to_string()))?;
    debug!("{} reports version {}", program, found);

    if found < minimum {
        return Err(UploadError::OutdatedUploader { found, minimum });
    }

    Ok(found)
}
