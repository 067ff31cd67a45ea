// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use pretty_assertions::assert_eq;
use symbol_upload::{
    UploadError, UploadOrchestrator, UploadParams, UploaderCommand, ValidationError, Version,
};
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Result<Self> {
        Ok(Self { dir: tempdir()? })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn symbol_file(&self, name: &str) -> Result<String> {
        let path = self.path(name);
        std::fs::write(&path, b"not really a dSYM")?;
        Ok(path.to_string_lossy().into_owned())
    }

    /// Fake uploader: a shell script run through `sh`, so it never has to be
    /// executable.
    fn uploader(&self, body: &str) -> Result<UploaderCommand> {
        let script = self.path("fake-uploader.sh");
        std::fs::write(&script, body)?;
        Ok(UploaderCommand::new("sh").arg(script))
    }

    fn params(&self) -> Result<UploadParams> {
        Ok(UploadParams {
            auth_token: Some("secret-token".into()),
            org_slug: Some("acme".into()),
            project_slug: Some("ios-app".into()),
            dsym_path: Some(self.symbol_file("app.dSYM.zip")?),
            ..UploadParams::default()
        })
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(ToOwned::to_owned)
        .collect())
}

#[tokio::test]
async fn test_clean_exit_is_success() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("echo 'Uploaded 1 debug file'\nexit 0\n")?;

    UploadOrchestrator::new(uploader)
        .upload(fixture.params()?)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_error_on_stderr_fails() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("echo 'error: invalid token' >&2\nexit 0\n")?;

    let err = UploadOrchestrator::new(uploader)
        .upload(fixture.params()?)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Failed(_)));
    assert_eq!(err.to_string(), "Error while trying to upload symbols");
    Ok(())
}

#[tokio::test]
async fn test_warning_on_stderr_is_success() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("echo 'warning: slow network' >&2\nexit 0\n")?;

    UploadOrchestrator::new(uploader)
        .upload(fixture.params()?)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_nonzero_exit_without_error_line_is_success() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("exit 1\n")?;

    UploadOrchestrator::new(uploader)
        .upload(fixture.params()?)
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_command_line_and_environment() -> Result<()> {
    let fixture = Fixture::new()?;
    let args_out = fixture.path("args.txt");
    let env_out = fixture.path("env.txt");
    let uploader = fixture.uploader(&format!(
        "for arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\n\
         printf '%s\\n' \"url=${{SERVICE_URL-unset}}\" \"token=${{SERVICE_AUTH_TOKEN-unset}}\" \
         \"key=${{SERVICE_API_KEY-unset}}\" \"log=${{SERVICE_LOG_LEVEL-unset}}\" > '{}'\n",
        args_out.display(),
        env_out.display()
    ))?;

    let mut params = fixture.params()?;
    let extra = fixture.symbol_file("x.dSYM.zip")?;
    params.dsym_paths = vec![extra.clone()];
    params.org_slug = Some("org; rm -rf /".into());
    params.url = Some("https://crash.example.com/".into());
    let single = params.dsym_path.clone().unwrap_or_default();

    UploadOrchestrator::new(uploader)
        .verbose(true)
        .upload(params)
        .await?;

    assert_eq!(
        read_lines(&args_out)?,
        vec![
            "upload-dsym".to_owned(),
            extra,
            single,
            "--org".to_owned(),
            "org; rm -rf /".to_owned(),
            "--project".to_owned(),
            "ios-app".to_owned(),
        ]
    );
    assert_eq!(
        read_lines(&env_out)?,
        vec![
            "url=https://crash.example.com/",
            "token=secret-token",
            "key=unset",
            "log=debug",
        ]
    );

    // the credentials only ever reach the child
    assert!(std::env::var_os("SERVICE_AUTH_TOKEN").is_none());
    Ok(())
}

#[tokio::test]
async fn test_validation_happens_before_launch() -> Result<()> {
    let fixture = Fixture::new()?;
    let marker = fixture.path("ran");
    let uploader = fixture.uploader(&format!("touch '{}'\n", marker.display()))?;

    let mut params = fixture.params()?;
    params.api_key = Some("also-set".into());

    let err = UploadOrchestrator::new(uploader)
        .upload(params)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::Validation(ValidationError::ConflictingCredentials)
    ));
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_uploader() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = UploaderCommand::new(fixture.path("no-such-uploader"));

    let err = UploadOrchestrator::new(uploader)
        .upload(fixture.params()?)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Launch { .. }));
    Ok(())
}

#[tokio::test]
async fn test_timeout_kills_uploader() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("exec sleep 30\n")?;

    let err = UploadOrchestrator::new(uploader)
        .timeout(Some(Duration::from_millis(300)))
        .upload(fixture.params()?)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Timeout(_)));
    Ok(())
}

#[tokio::test]
async fn test_outdated_uploader_rejected() -> Result<()> {
    let fixture = Fixture::new()?;
    let marker = fixture.path("uploaded");
    let uploader = fixture.uploader(&format!(
        "if [ \"$1\" = --version ]; then echo 'crash-cli 1.4.0'; exit 0; fi\ntouch '{}'\n",
        marker.display()
    ))?;

    let err = UploadOrchestrator::new(uploader)
        .minimum_version(Some(Version::new(2, 0, 0)))
        .upload(fixture.params()?)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::OutdatedUploader { .. }));
    assert!(!marker.exists());
    Ok(())
}

#[tokio::test]
async fn test_case_insensitive_policy() -> Result<()> {
    let fixture = Fixture::new()?;
    let uploader = fixture.uploader("echo 'ERROR: unauthorized' >&2\n")?;

    UploadOrchestrator::new(uploader.clone())
        .upload(fixture.params()?)
        .await?;

    let err = UploadOrchestrator::new(uploader)
        .error_match(symbol_upload::ErrorMatch::CaseInsensitive)
        .upload(fixture.params()?)
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Failed(_)));
    Ok(())
}
