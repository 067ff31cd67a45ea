// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::{crate_version, Args, Parser};
use symbol_upload::version::check_version;
use symbol_upload::Version;

pub mod config;

use config::{UploadOpt, UploaderOpt};

#[derive(Parser, Debug)]
#[command(name = "symbol-upload", version = crate_version!())]
enum Opt {
    /// Upload debug symbol files through the external uploader.
    Upload(UploadCmd),
    /// Check that the uploader is installed and recent enough.
    Check(UploaderCmd),
}

#[derive(Args, Debug)]
struct UploadCmd {
    #[command(flatten)]
    upload: UploadOpt,

    #[command(flatten)]
    uploader: UploaderOpt,

    /// Enable debug logging here and in the uploader.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct UploaderCmd {
    #[command(flatten)]
    uploader: UploaderOpt,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    let verbose = match &opt {
        Opt::Upload(cmd) => cmd.verbose,
        Opt::Check(cmd) => cmd.verbose,
    };
    init_logging(verbose);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(opt))
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(opt: Opt) -> Result<()> {
    match opt {
        Opt::Upload(cmd) => upload(cmd).await,
        Opt::Check(cmd) => check(cmd).await,
    }
}

async fn upload(cmd: UploadCmd) -> Result<()> {
    let params = cmd.upload.params()?;
    cmd.uploader
        .orchestrator(cmd.verbose)
        .upload(params)
        .await
        .context("symbol upload failed")
}

async fn check(cmd: UploaderCmd) -> Result<()> {
    let minimum = cmd.uploader.min_version.unwrap_or(Version::new(0, 0, 0));
    let found = check_version(&cmd.uploader.uploader_command(), minimum)
        .await
        .context("uploader check failed")?;

    info!(
        "{} {} is available",
        cmd.uploader.uploader.display(),
        found
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Opt::command().debug_assert();
    }

    #[test]
    fn test_parse_upload() {
        let opt = Opt::try_parse_from([
            "symbol-upload",
            "upload",
            "--auth-token",
            "t",
            "--org-slug",
            "acme",
            "--project-slug",
            "app",
            "--dsym-paths",
            "/b/x.dSYM.zip",
            "/c/y.dSYM.zip",
            "--dsym-path",
            "/a/app.dSYM.zip",
            "--uploader-arg",
            "@vendor/cli",
            "--uploader",
            "npx",
            "--timeout",
            "60",
            "--min-version",
            "2.0.0",
            "-v",
        ])
        .unwrap();

        let Opt::Upload(cmd) = opt else {
            panic!("expected upload subcommand");
        };
        assert!(cmd.verbose);
        assert_eq!(cmd.upload.dsym_paths, vec!["/b/x.dSYM.zip", "/c/y.dSYM.zip"]);
        assert_eq!(cmd.upload.dsym_path.as_deref(), Some("/a/app.dSYM.zip"));
        assert_eq!(cmd.uploader.uploader_args, vec!["@vendor/cli"]);
        assert_eq!(cmd.uploader.timeout, Some(60));
        assert_eq!(cmd.uploader.min_version, Some(Version::new(2, 0, 0)));
    }

    #[test]
    fn test_reject_bad_version() {
        let result = Opt::try_parse_from(["symbol-upload", "check", "--min-version", "two"]);
        assert!(result.is_err());
    }
}
