//! The comparison pipeline.
//!
//! Stages run strictly in order. Work that is independent per org (connectivity,
//! workspaces, retrieve, extraction, lookup, reads, stripping) runs as two
//! lanes joined before the next stage starts. Synchronous filesystem work goes
//! through `spawn_blocking`. Any error ends the run; nothing is retried.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use pkgxml_core::{
    diff_manifests, locator, marker,
    save::{save_manifests, SaveRequest},
    DiffOutcome, ManifestDiff, OrgAlias, RunOptions, StripOutcome,
};
use pkgxml_sfdx::{RetrievalClient, RetrieveRequest, SfdxClient};

use crate::error::{io_err, RunError};
use crate::workspace::OrgWorkspace;

/// Pipeline checkpoints, in the order a run passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    OrgsVerified,
    TempDirsReady,
    Retrieved,
    Extracted,
    ManifestsRead,
    /// Only reached in package-name mode.
    Stripped,
    ManifestsFinal,
    Diffed,
    /// Only reached when the save policy wrote copies.
    Saved,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::OrgsVerified => "orgs_verified",
            Stage::TempDirsReady => "temp_dirs_ready",
            Stage::Retrieved => "retrieved",
            Stage::Extracted => "extracted",
            Stage::ManifestsRead => "manifests_read",
            Stage::Stripped => "stripped",
            Stage::ManifestsFinal => "manifests_final",
            Stage::Diffed => "diffed",
            Stage::Saved => "saved",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-org part of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgManifest {
    pub org: OrgAlias,
    /// `None` when stripping was skipped (explicit-manifest mode).
    pub strip: Option<StripOutcome>,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub org1: OrgManifest,
    pub org2: OrgManifest,
    pub outcome: DiffOutcome,
    pub diff: ManifestDiff,
    /// Copies written to the save directory.
    pub saved: Vec<PathBuf>,
    /// Workspaces left on disk because `keep_temp` was set.
    pub kept_workspaces: Vec<PathBuf>,
    pub stages: Vec<Stage>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}

/// One comparison run over a [`RetrievalClient`].
pub struct Runner<'a, C> {
    options: &'a RunOptions,
    client: &'a C,
    temp_root: PathBuf,
    saved_at: Option<DateTime<Utc>>,
    stage: Stage,
    stages: Vec<Stage>,
}

impl<'a, C: RetrievalClient> Runner<'a, C> {
    pub fn new(options: &'a RunOptions, client: &'a C) -> Self {
        Self {
            options,
            client,
            temp_root: std::env::temp_dir(),
            saved_at: None,
            stage: Stage::Start,
            stages: vec![Stage::Start],
        }
    }

    /// Create workspaces below `root` instead of the system temp directory.
    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    /// Fix the timestamp used in saved file names.
    pub fn saved_at(mut self, at: DateTime<Utc>) -> Self {
        self.saved_at = Some(at);
        self
    }

    /// Run every stage; on failure the error is logged with the last completed stage.
    pub async fn run(mut self) -> Result<RunReport, RunError> {
        match self.run_stages().await {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::error!(after = %self.stage, error = %err, "manifest comparison failed");
                Err(err)
            }
        }
    }

    fn advance(&mut self, stage: Stage) {
        tracing::debug!(from = %self.stage, to = %stage, "pipeline stage");
        self.stage = stage;
        self.stages.push(stage);
    }

    async fn run_stages(&mut self) -> Result<RunReport, RunError> {
        let options = self.options;
        let client = self.client;
        let (org1, org2) = (&options.org1, &options.org2);
        options.validate()?;
        tracing::info!(%org1, %org2, mode = %options.mode, "comparing package manifests");

        tokio::try_join!(client.ensure_connected(org1), client.ensure_connected(org2))?;
        self.advance(Stage::OrgsVerified);

        let (ws1, ws2) = tokio::try_join!(
            create_workspace(self.temp_root.clone(), org1.clone()),
            create_workspace(self.temp_root.clone(), org2.clone())
        )?;
        let workspaces = [ws1, ws2];
        self.advance(Stage::TempDirsReady);

        let compared = self.compare_in(&workspaces).await;

        // Honoured on failure as well.
        let kept_workspaces = if options.keep_temp {
            workspaces.into_iter().map(OrgWorkspace::keep).collect()
        } else {
            Vec::new()
        };
        let mut report = compared?;
        self.advance(Stage::Done);
        report.kept_workspaces = kept_workspaces;
        report.stages = self.stages.clone();
        Ok(report)
    }

    /// Retrieve through save, working inside `workspaces`.
    async fn compare_in(&mut self, workspaces: &[OrgWorkspace; 2]) -> Result<RunReport, RunError> {
        let options = self.options;
        let client = self.client;
        let (org1, org2) = (&options.org1, &options.org2);

        let requests = workspaces.each_ref().map(|ws| RetrieveRequest {
            mode: &options.mode,
            target_dir: ws.path(),
            wait_seconds: options.wait_seconds,
        });
        let (archive1, archive2) = tokio::try_join!(
            client.retrieve(org1, &requests[0]),
            client.retrieve(org2, &requests[1])
        )?;
        self.advance(Stage::Retrieved);

        let (base1, base2) = tokio::try_join!(
            extract_archive(archive1, workspaces[0].extracted_dir()),
            extract_archive(archive2, workspaces[1].extracted_dir())
        )?;
        self.advance(Stage::Extracted);

        let explicit = options.mode.has_explicit_manifest();
        let (path1, path2) = tokio::try_join!(
            locate_manifest(base1, explicit),
            locate_manifest(base2, explicit)
        )?;
        let (mut text1, mut text2) =
            tokio::try_join!(read_manifest(&path1), read_manifest(&path2))?;
        self.advance(Stage::ManifestsRead);

        let (strip1, strip2) = if explicit {
            (None, None)
        } else {
            let (strip1, strip2) =
                tokio::try_join!(strip_marker(path1.clone()), strip_marker(path2.clone()))?;
            (text1, text2) = tokio::try_join!(read_manifest(&path1), read_manifest(&path2))?;
            self.advance(Stage::Stripped);
            (Some(strip1), Some(strip2))
        };
        self.advance(Stage::ManifestsFinal);

        let diff = diff_manifests(&text1, &text2);
        let outcome = diff.outcome();
        tracing::info!(
            %outcome,
            added = diff.added_lines(),
            removed = diff.removed_lines(),
            "compared manifests"
        );
        self.advance(Stage::Diffed);

        let saved = save_copies(
            options,
            [path1, path2],
            self.saved_at.unwrap_or_else(Utc::now),
            outcome,
        )
        .await?;
        if !saved.is_empty() {
            self.advance(Stage::Saved);
        }

        Ok(RunReport {
            org1: OrgManifest {
                org: org1.clone(),
                strip: strip1,
            },
            org2: OrgManifest {
                org: org2.clone(),
                strip: strip2,
            },
            outcome,
            diff,
            saved,
            kept_workspaces: Vec::new(),
            stages: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Blocking filesystem work, run off the async workers
// ---------------------------------------------------------------------------

async fn blocking<T, F>(task: &'static str, f: F) -> Result<T, RunError>
where
    F: FnOnce() -> Result<T, RunError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RunError::Join(format!("{task}: {e}")))?
}

async fn create_workspace(root: PathBuf, org: OrgAlias) -> Result<OrgWorkspace, RunError> {
    blocking("workspace creation", move || OrgWorkspace::create_in(&root, &org)).await
}

async fn extract_archive(archive: PathBuf, dest: PathBuf) -> Result<PathBuf, RunError> {
    blocking("archive extraction", move || {
        pkgxml_sfdx::extract(&archive, &dest)?;
        Ok(dest)
    })
    .await
}

async fn locate_manifest(base: PathBuf, explicit: bool) -> Result<PathBuf, RunError> {
    blocking("manifest lookup", move || Ok(locator::locate_manifest(&base, explicit)?)).await
}

async fn strip_marker(path: PathBuf) -> Result<StripOutcome, RunError> {
    blocking("marker stripping", move || Ok(marker::strip_file(&path)?)).await
}

async fn save_copies(
    options: &RunOptions,
    manifests: [PathBuf; 2],
    timestamp: DateTime<Utc>,
    outcome: DiffOutcome,
) -> Result<Vec<PathBuf>, RunError> {
    let policy = options.save_policy;
    let save_dir = options.save_dir.clone();
    let overwrite = options.overwrite;
    blocking("saving manifests", move || {
        let request = SaveRequest {
            policy,
            save_dir: &save_dir,
            manifests: [manifests[0].as_path(), manifests[1].as_path()],
            overwrite,
            timestamp,
        };
        Ok(save_manifests(&request, outcome)?)
    })
    .await
}

async fn read_manifest(path: &Path) -> Result<String, RunError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io_err(path, e))
}

/// Install the global tracing subscriber; `RUST_LOG` overrides `verbose`.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run a comparison against the real `sfdx` client and block until it finishes.
pub fn start_blocking(options: &RunOptions) -> Result<RunReport, RunError> {
    init_tracing(options.verbose);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    let client = SfdxClient::from_options(options);
    runtime.block_on(Runner::new(options, &client).run())
}
