// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::env::{SERVICE_API_KEY, SERVICE_AUTH_TOKEN, SERVICE_LOG_LEVEL, SERVICE_URL};
use crate::shell;

pub const DEFAULT_UPLOADER: &str = "crash-cli";
pub const UPLOAD_DSYM: &str = "upload-dsym";

/// The external uploader executable, plus any arguments that must precede
/// the sub-command (for example `npx @vendor/cli`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploaderCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Default for UploaderCommand {
    fn default() -> Self {
        Self::new(DEFAULT_UPLOADER)
    }
}

impl UploaderCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Sub-command and arguments for uploading `paths`.
    ///
    /// Slugs are separate argv entries and never pass through a shell.
    pub fn upload_dsym_args(&self, paths: &[PathBuf], org: &str, project: &str) -> Vec<OsString> {
        let mut argv: Vec<OsString> = self.args.clone();
        argv.push(UPLOAD_DSYM.into());
        argv.extend(paths.iter().map(|path| path.clone().into_os_string()));
        argv.push("--org".into());
        argv.push(org.into());
        argv.push("--project".into());
        argv.push(project.into());
        argv
    }

    pub fn version_args(&self) -> Vec<OsString> {
        let mut argv = self.args.clone();
        argv.push("--version".into());
        argv
    }

    /// Command running the uploader with `argv`.
    ///
    /// Service variables inherited from the current process are removed, so
    /// the child only sees the ones in `env`.
    pub fn command(&self, argv: &[OsString], env: &HashMap<String, String>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.env_remove("RUST_LOG");
        for name in [SERVICE_URL, SERVICE_AUTH_TOKEN, SERVICE_API_KEY, SERVICE_LOG_LEVEL] {
            cmd.env_remove(name);
        }
        cmd.args(argv).envs(env);
        cmd
    }

    /// Shell-quoted command line equivalent to running `argv`.
    pub fn render(&self, argv: &[OsString]) -> String {
        let program = self.program.to_string_lossy();
        let args = argv.iter().map(|arg| arg.to_string_lossy());
        shell::join(std::iter::once(program).chain(args))
    }
}
