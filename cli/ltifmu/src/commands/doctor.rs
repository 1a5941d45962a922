//! `ltifmu doctor`: host and toolchain diagnostics.

use std::path::Path;

use anyhow::Result;
use ltifmu_package::skeleton::REQUIRED_FILES;
use ltifmu_package::{PlatformId, RuntimeSkeleton};

use crate::commands::build::{BuildArgs, Settings, RUNTIME_DIR_ENV};
use crate::config::{LtifmuConfig, CONFIG_FILE_NAME};

/// Print host, toolchain, runtime and configuration status.
pub fn run(cwd: &Path) -> Result<()> {
    println!("=== ltifmu Doctor ===");
    println!();
    println!("ltifmu version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- Host ---");
    let platform = match PlatformId::host() {
        Ok(platform) => {
            println!("  Platform id: {platform}");
            println!("  Library:     {}", platform.library_name("<identifier>"));
            Some(platform)
        }
        Err(e) => {
            println!("  Platform id: {e}");
            None
        }
    };
    println!();

    println!("--- Configuration ---");
    let loaded = match LtifmuConfig::find_and_load(cwd) {
        Ok(Some(loaded)) => {
            println!("  {CONFIG_FILE_NAME}: found at {}", loaded.dir.display());
            Some(loaded)
        }
        Ok(None) => {
            println!("  {CONFIG_FILE_NAME}: not found");
            None
        }
        Err(e) => {
            println!("  {CONFIG_FILE_NAME}: error: {e:#}");
            None
        }
    };
    let settings = Settings::resolve(&BuildArgs::default(), loaded.as_ref(), cwd, |key| {
        std::env::var(key).ok()
    })?;
    println!("  Step size:    {}", settings.step_size);
    println!("  Keep sources: {}", settings.keep_sources);
    println!();

    println!("--- Toolchain ---");
    if let Some(platform) = platform {
        let toolchain = settings.toolchain();
        let compiler = toolchain.compiler_for(platform);
        match toolchain.probe(platform) {
            Some(version) => println!("  {compiler}: {version}"),
            None => println!("  {compiler}: not found"),
        }
        if !settings.flags.is_empty() {
            println!("  Flags: {}", settings.flags.join(" "));
        }
    } else {
        println!("  (no supported platform)");
    }
    println!();

    println!("--- Runtime Skeleton ---");
    for line in runtime_report(&settings.runtime_dir) {
        println!("  {line}");
    }

    Ok(())
}

/// Status lines for the runtime skeleton at `dir`.
///
/// ltifmu does not bundle the skeleton, so a missing one comes with
/// directions for supplying it.
fn runtime_report(dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Directory: {}", dir.display())];
    match RuntimeSkeleton::open(dir) {
        Ok(skeleton) => lines.push(format!("Status: ok ({} files)", skeleton.files().len())),
        Err(e) => {
            lines.push(format!("Status: {e}"));
            lines.push(format!("Required: {}", REQUIRED_FILES.join(", ")));
            lines.push("ltifmu ships no runtime skeleton. Provide the FMI 2.0 headers".to_string());
            lines.push("and the fmi2Template sources in one directory and point".to_string());
            lines.push(format!(
                "--runtime-dir, [runtime] dir in {CONFIG_FILE_NAME} or {RUNTIME_DIR_ENV} at it."
            ));
        }
    }
    lines
}
