//! pkgxml-diff: compare the package manifests of two orgs.
//!
//! # Usage
//!
//! ```text
//! pkgxml-diff --org1 <org> --org2 <org> [--packagename <name> | --packagexml <file>]
//!             [--save-packagexml never|diff|always] [--save-dir <dir>] [--overwrite]
//!             [--wait <seconds>] [--sfdx-bin <path>] [--keep-temp] [--json]
//!             [--verbose] [--sfdx-verbose]
//! ```
//!
//! Exit status is 0 when the manifests are identical and 1 when they differ
//! or the comparison could not be completed.

mod report;

use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use pkgxml_core::{
    types::{DEFAULT_PACKAGE_NAME, DEFAULT_WAIT_SECONDS},
    RetrievalMode, RunOptions, SavePolicy,
};
use pkgxml_runner::start_blocking;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pkgxml-diff",
    version,
    about = "Retrieve package.xml from two orgs and report how they differ",
    long_about = None,
)]
struct Cli {
    /// First org alias or username.
    #[arg(long, value_name = "ORG")]
    org1: String,

    /// Second org alias or username.
    #[arg(long, value_name = "ORG")]
    org2: String,

    /// Package to retrieve when no --packagexml is given.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PACKAGE_NAME)]
    packagename: String,

    /// Manifest that drives the retrieve instead of a package name.
    #[arg(long, value_name = "FILE")]
    packagexml: Option<PathBuf>,

    /// When to save the compared manifests: never, diff or always.
    #[arg(long = "save-packagexml", value_name = "POLICY", default_value_t = SavePolicy::Never)]
    save_packagexml: SavePolicy,

    /// Directory for saved manifests (defaults to the current directory).
    #[arg(long = "save-dir", value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Replace saved manifests that already exist.
    #[arg(long)]
    overwrite: bool,

    /// Wait value handed to the retrieve command.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_WAIT_SECONDS)]
    wait: u32,

    /// Path or name of the sfdx executable.
    #[arg(long = "sfdx-bin", value_name = "PATH", default_value = "sfdx")]
    sfdx_bin: PathBuf,

    /// Keep the temporary retrieve directories and print their paths.
    #[arg(long = "keep-temp")]
    keep_temp: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(long)]
    verbose: bool,

    /// Pass --verbose to sfdx.
    #[arg(long = "sfdx-verbose")]
    sfdx_verbose: bool,
}

impl Cli {
    fn into_options(self) -> Result<RunOptions> {
        let save_dir = match self.save_dir {
            Some(dir) => dir,
            None => env::current_dir().context("could not determine current directory")?,
        };

        let mut options = RunOptions::new(self.org1, self.org2, save_dir);
        options.mode = match self.packagexml {
            Some(path) => RetrievalMode::Manifest(path),
            None => RetrievalMode::PackageName(self.packagename),
        };
        options.save_policy = self.save_packagexml;
        options.overwrite = self.overwrite;
        options.wait_seconds = self.wait;
        options.sfdx_program = self.sfdx_bin;
        options.sfdx_verbose = self.sfdx_verbose;
        options.verbose = self.verbose;
        options.keep_temp = self.keep_temp;
        Ok(options)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not errors.
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let json = cli.json;
    let options = cli.into_options()?;
    options.validate().context("argument error")?;

    let report = start_blocking(&options).context("manifest comparison failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !io::stdout().is_terminal() {
            colored::control::set_override(false);
        }
        print!("{}", report::render(&report));
    }

    Ok(report.exit_code())
}
