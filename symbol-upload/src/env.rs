// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;

use crate::request::{Credential, UploadRequest};

pub const SERVICE_URL: &str = "SERVICE_URL";
pub const SERVICE_AUTH_TOKEN: &str = "SERVICE_AUTH_TOKEN";
pub const SERVICE_API_KEY: &str = "SERVICE_API_KEY";
pub const SERVICE_LOG_LEVEL: &str = "SERVICE_LOG_LEVEL";

/// Environment handed to a single uploader invocation.
///
/// Nothing here touches the current process environment; the map is applied
/// to the child with `Command::envs`.
pub fn build_environment(request: &UploadRequest, verbose: bool) -> HashMap<String, String> {
    let mut env = HashMap::new();

    if let Some(url) = request.service_url().filter(|url| !url.is_empty()) {
        env.insert(SERVICE_URL.to_owned(), url.to_owned());
    }

    match request.credential() {
        Credential::AuthToken(token) if !token.is_empty() => {
            env.insert(SERVICE_AUTH_TOKEN.to_owned(), token.clone());
        }
        Credential::ApiKey(key) if !key.is_empty() => {
            env.insert(SERVICE_API_KEY.to_owned(), key.clone());
        }
        _ => {}
    }

    if verbose {
        env.insert(SERVICE_LOG_LEVEL.to_owned(), "debug".to_owned());
    }

    env
}

/// Copy of `env` with credential values masked, for logging.
pub fn redacted(env: &HashMap<String, String>) -> HashMap<&str, &str> {
    env.iter()
        .map(|(k, v)| {
            let v = match k.as_str() {
                SERVICE_AUTH_TOKEN | SERVICE_API_KEY => "<redacted>",
                _ => v.as_str(),
            };
            (k.as_str(), v)
        })
        .collect()
}
