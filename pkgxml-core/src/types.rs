//! Domain types for a manifest comparison run.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// Default package name used when neither `--packagename` nor `--packagexml` is given.
pub const DEFAULT_PACKAGE_NAME: &str = "becem";

/// Default `-w` value handed to the external client.
pub const DEFAULT_WAIT_SECONDS: u32 = 100;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed org identifier (alias or username) understood by `sfdx -u`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrgAlias(pub String);

impl OrgAlias {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrgAlias {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgAlias {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How the external client decides which components to retrieve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Retrieve a named package; the tool produces the manifest itself.
    PackageName(String),
    /// Retrieve whatever an explicit manifest file lists.
    Manifest(PathBuf),
}

impl RetrievalMode {
    pub fn has_explicit_manifest(&self) -> bool {
        matches!(self, RetrievalMode::Manifest(_))
    }
}

impl Default for RetrievalMode {
    fn default() -> Self {
        RetrievalMode::PackageName(DEFAULT_PACKAGE_NAME.to_string())
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalMode::PackageName(name) => write!(f, "package '{name}'"),
            RetrievalMode::Manifest(path) => write!(f, "manifest {}", path.display()),
        }
    }
}

/// When compared manifests are copied to the save directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SavePolicy {
    #[default]
    Never,
    Diff,
    Always,
}

impl SavePolicy {
    /// Whether copies are written for a run that ended with `outcome`.
    pub fn applies_to(self, outcome: DiffOutcome) -> bool {
        match self {
            SavePolicy::Never => false,
            SavePolicy::Diff => outcome == DiffOutcome::Different,
            SavePolicy::Always => true,
        }
    }
}

impl fmt::Display for SavePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavePolicy::Never => write!(f, "never"),
            SavePolicy::Diff => write!(f, "diff"),
            SavePolicy::Always => write!(f, "always"),
        }
    }
}

impl FromStr for SavePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(SavePolicy::Never),
            "diff" => Ok(SavePolicy::Diff),
            "always" => Ok(SavePolicy::Always),
            other => Err(format!(
                "unknown save policy '{other}'; expected: never, diff, always"
            )),
        }
    }
}

/// Result of comparing the two manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOutcome {
    Identical,
    Different,
}

impl DiffOutcome {
    /// Process exit status for a run that completed with this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            DiffOutcome::Identical => 0,
            DiffOutcome::Different => 1,
        }
    }
}

impl fmt::Display for DiffOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffOutcome::Identical => write!(f, "identical"),
            DiffOutcome::Different => write!(f, "different"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run options
// ---------------------------------------------------------------------------

/// Configuration resolved once at startup and shared read-only by every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    pub org1: OrgAlias,
    pub org2: OrgAlias,
    pub mode: RetrievalMode,
    pub save_policy: SavePolicy,
    /// Destination for saved copies. Must exist when `save_policy` is not `never`.
    pub save_dir: PathBuf,
    /// Replace saved copies that already exist.
    pub overwrite: bool,
    /// Passed through to the external client as `-w`.
    pub wait_seconds: u32,
    /// Program name or path of the external client.
    pub sfdx_program: PathBuf,
    pub sfdx_verbose: bool,
    pub verbose: bool,
    /// Persist temp workspaces instead of removing them at the end of the run.
    pub keep_temp: bool,
}

impl RunOptions {
    /// Options with defaults for everything except the two orgs.
    pub fn new(org1: impl Into<OrgAlias>, org2: impl Into<OrgAlias>, save_dir: PathBuf) -> Self {
        Self {
            org1: org1.into(),
            org2: org2.into(),
            mode: RetrievalMode::default(),
            save_policy: SavePolicy::default(),
            save_dir,
            overwrite: false,
            wait_seconds: DEFAULT_WAIT_SECONDS,
            sfdx_program: PathBuf::from("sfdx"),
            sfdx_verbose: false,
            verbose: false,
            keep_temp: false,
        }
    }

    /// Check the invariants that must hold before any external call is made.
    pub fn validate(&self) -> Result<(), ManifestError> {
        for (flag, org) in [("--org1", &self.org1), ("--org2", &self.org2)] {
            if org.as_str().trim().is_empty() {
                return Err(ManifestError::InvalidOptions(format!(
                    "{flag} must not be empty"
                )));
            }
        }

        match &self.mode {
            RetrievalMode::PackageName(name) if name.trim().is_empty() => {
                return Err(ManifestError::InvalidOptions(
                    "package name must not be empty".to_string(),
                ));
            }
            RetrievalMode::Manifest(path) if !path.is_file() => {
                return Err(ManifestError::InvalidOptions(format!(
                    "package manifest {} does not exist",
                    path.display()
                )));
            }
            _ => {}
        }

        if self.save_policy != SavePolicy::Never && !self.save_dir.is_dir() {
            return Err(ManifestError::InvalidOptions(format!(
                "save directory {} does not exist",
                self.save_dir.display()
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn save_policy_parses_case_insensitively() {
        assert_eq!("never".parse::<SavePolicy>(), Ok(SavePolicy::Never));
        assert_eq!("DIFF".parse::<SavePolicy>(), Ok(SavePolicy::Diff));
        assert_eq!("Always".parse::<SavePolicy>(), Ok(SavePolicy::Always));
    }

    #[test]
    fn save_policy_rejects_unknown_value() {
        let err = "sometimes".parse::<SavePolicy>().unwrap_err();
        assert!(err.contains("sometimes"));
        assert!(err.contains("never, diff, always"));
    }

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(DiffOutcome::Identical.exit_code(), 0);
        assert_eq!(DiffOutcome::Different.exit_code(), 1);
    }

    #[test]
    fn default_mode_is_package_name() {
        let mode = RetrievalMode::default();
        assert_eq!(mode, RetrievalMode::PackageName("becem".to_string()));
        assert!(!mode.has_explicit_manifest());
        assert!(RetrievalMode::Manifest(PathBuf::from("package.xml")).has_explicit_manifest());
    }

    #[test]
    fn validate_accepts_defaults_without_saving() {
        let options = RunOptions::new("dev", "qa", PathBuf::from("/definitely/not/here"));
        options.validate().expect("never policy ignores save dir");
    }

    #[test]
    fn validate_requires_save_dir_when_saving() {
        let mut options = RunOptions::new("dev", "qa", PathBuf::from("/definitely/not/here"));
        options.save_policy = SavePolicy::Diff;
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("save directory"), "got: {err}");
    }

    #[test]
    fn validate_requires_existing_manifest() {
        let dir = TempDir::new().expect("tempdir");
        let mut options = RunOptions::new("dev", "qa", dir.path().to_path_buf());
        options.mode = RetrievalMode::Manifest(dir.path().join("missing.xml"));
        assert!(options.validate().is_err());

        let manifest = dir.path().join("package.xml");
        fs::write(&manifest, "<Package/>\n").expect("write");
        options.mode = RetrievalMode::Manifest(manifest);
        options.validate().expect("manifest exists");
    }

    #[test]
    fn validate_rejects_blank_org() {
        let options = RunOptions::new("  ", "qa", PathBuf::from("."));
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("--org1"), "got: {err}");
    }
}
