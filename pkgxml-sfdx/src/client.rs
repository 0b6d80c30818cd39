//! `sfdx` invocation.
//!
//! Two sub-commands are used:
//! - `force:org:display -u <org>` to check that an org is known and authenticated
//! - `force:mdapi:retrieve -u <org> -r <dir> -w <wait> ...` to fetch metadata
//!
//! A successful retrieve leaves `unpackaged.zip` in the target directory.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;

use pkgxml_core::{OrgAlias, RetrievalMode, RunOptions};

use crate::error::SfdxError;

/// Name of the archive `force:mdapi:retrieve` writes into its target directory.
pub const ARCHIVE_FILE: &str = "unpackaged.zip";

/// Parameters of a single metadata retrieve.
#[derive(Debug, Clone)]
pub struct RetrieveRequest<'a> {
    pub mode: &'a RetrievalMode,
    pub target_dir: &'a Path,
    pub wait_seconds: u32,
}

/// Operations the orchestrator needs from a metadata retrieval tool.
pub trait RetrievalClient {
    /// Fail with [`SfdxError::Connection`] unless `org` is reachable and authenticated.
    fn ensure_connected(&self, org: &OrgAlias) -> impl Future<Output = Result<(), SfdxError>>;

    /// Retrieve metadata from `org` and return the path of the produced archive.
    fn retrieve(
        &self,
        org: &OrgAlias,
        request: &RetrieveRequest<'_>,
    ) -> impl Future<Output = Result<PathBuf, SfdxError>>;
}

/// [`RetrievalClient`] backed by the `sfdx` executable.
#[derive(Debug, Clone)]
pub struct SfdxClient {
    program: PathBuf,
    verbose: bool,
}

impl SfdxClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            verbose: false,
        }
    }

    /// Pass `--verbose` through to retrieve commands.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn from_options(options: &RunOptions) -> Self {
        Self::new(&options.sfdx_program).verbose(options.sfdx_verbose)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn run(&self, args: &[String]) -> Result<Output, SfdxError> {
        tracing::debug!(
            program = %self.program.display(),
            args = %args.join(" "),
            "running external client"
        );
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| SfdxError::Spawn {
                program: self.program.display().to_string(),
                source,
            })
    }
}

impl RetrievalClient for SfdxClient {
    async fn ensure_connected(&self, org: &OrgAlias) -> Result<(), SfdxError> {
        let output = self.run(&org_display_args(org)).await?;
        if !output.status.success() {
            return Err(SfdxError::Connection {
                org: org.clone(),
                message: failure_message(&output),
            });
        }
        tracing::debug!(%org, "org connected");
        Ok(())
    }

    async fn retrieve(
        &self,
        org: &OrgAlias,
        request: &RetrieveRequest<'_>,
    ) -> Result<PathBuf, SfdxError> {
        let output = self.run(&retrieve_args(org, request, self.verbose)).await?;
        if !output.status.success() {
            return Err(SfdxError::Retrieval {
                org: org.clone(),
                message: failure_message(&output),
            });
        }
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(%org, "sfdx: {line}");
        }

        let archive = request.target_dir.join(ARCHIVE_FILE);
        if !archive.is_file() {
            return Err(SfdxError::Retrieval {
                org: org.clone(),
                message: format!("no archive was written to {}", archive.display()),
            });
        }
        tracing::info!(%org, archive = %archive.display(), "retrieved metadata");
        Ok(archive)
    }
}

/// Arguments for the connectivity check.
pub fn org_display_args(org: &OrgAlias) -> Vec<String> {
    vec![
        "force:org:display".to_string(),
        "-u".to_string(),
        org.to_string(),
    ]
}

/// Arguments for a metadata retrieve.
pub fn retrieve_args(org: &OrgAlias, request: &RetrieveRequest<'_>, verbose: bool) -> Vec<String> {
    let mut args = vec![
        "force:mdapi:retrieve".to_string(),
        "-u".to_string(),
        org.to_string(),
        "-r".to_string(),
        request.target_dir.display().to_string(),
        "-w".to_string(),
        request.wait_seconds.to_string(),
    ];
    match request.mode {
        RetrievalMode::PackageName(name) => {
            args.extend(["-p".to_string(), name.clone(), "-s".to_string()]);
        }
        RetrievalMode::Manifest(path) => {
            args.extend(["-k".to_string(), path.display().to_string()]);
        }
    }
    if verbose {
        args.push("--verbose".to_string());
    }
    args
}

/// Best description of why the tool failed: stderr, then stdout, then the status.
fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !stdout.is_empty() {
        return stdout;
    }
    format!("exited with {}", output.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_display_targets_org() {
        assert_eq!(
            org_display_args(&OrgAlias::from("dev@example.com")),
            vec!["force:org:display", "-u", "dev@example.com"]
        );
    }

    #[test]
    fn package_name_retrieve_is_single_package() {
        let mode = RetrievalMode::PackageName("becem".to_string());
        let request = RetrieveRequest {
            mode: &mode,
            target_dir: Path::new("/tmp/org1"),
            wait_seconds: 100,
        };
        assert_eq!(
            retrieve_args(&OrgAlias::from("qa"), &request, false),
            vec![
                "force:mdapi:retrieve",
                "-u",
                "qa",
                "-r",
                "/tmp/org1",
                "-w",
                "100",
                "-p",
                "becem",
                "-s"
            ]
        );
    }

    #[test]
    fn manifest_retrieve_passes_manifest_and_verbose() {
        let mode = RetrievalMode::Manifest(PathBuf::from("/src/package.xml"));
        let request = RetrieveRequest {
            mode: &mode,
            target_dir: Path::new("/tmp/org2"),
            wait_seconds: 30,
        };
        let args = retrieve_args(&OrgAlias::from("prod"), &request, true);
        assert_eq!(
            &args[7..],
            &["-k".to_string(), "/src/package.xml".to_string(), "--verbose".to_string()]
        );
        assert!(args.contains(&"30".to_string()));
        assert!(!args.contains(&"-p".to_string()));
    }

    #[test]
    fn client_from_options_carries_program_and_verbosity() {
        let mut options = RunOptions::new("a", "b", PathBuf::from("."));
        options.sfdx_program = PathBuf::from("/opt/sfdx/bin/sfdx");
        options.sfdx_verbose = true;
        let client = SfdxClient::from_options(&options);
        assert_eq!(client.program(), Path::new("/opt/sfdx/bin/sfdx"));
        assert!(client.verbose);
    }
}
