//! Build report.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::platform::PlatformId;

/// Summary of one successful build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Model identifier (archive base name and symbol prefix).
    pub identifier: String,
    pub guid: Uuid,
    pub platform: PlatformId,
    pub nx: usize,
    pub nu: usize,
    pub ny: usize,
    /// Total register count.
    pub nr: usize,
    /// Nominal Euler step exported to the generated source.
    pub step_size: f64,
    /// Toolchain that compiled the library.
    pub toolchain: String,
    /// Path of the written archive.
    pub archive: PathBuf,
    /// Archive entry names, sorted.
    pub entries: Vec<String>,
    /// Total build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildReport {
    pub fn has_sources(&self) -> bool {
        self.entries.iter().any(|e| e.starts_with("sources/"))
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(f, "Model: {}", self.identifier)?;
        writeln!(f, "GUID: {}", self.guid)?;
        writeln!(f, "Platform: {}", self.platform)?;
        writeln!(f, "Toolchain: {}", self.toolchain)?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f)?;

        writeln!(f, "--- Model ---")?;
        writeln!(
            f,
            "  States: {}, inputs: {}, outputs: {} ({} registers)",
            self.nx, self.nu, self.ny, self.nr,
        )?;
        writeln!(f, "  Step size: {}", self.step_size)?;

        writeln!(f)?;
        writeln!(f, "--- Archive ({} entries) ---", self.entries.len())?;
        writeln!(f, "  {}", self.archive.display())?;
        for entry in &self.entries {
            writeln!(f, "    {entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_display() {
        let report = BuildReport {
            identifier: "q".into(),
            guid: Uuid::nil(),
            platform: PlatformId::from_target("linux", 64).unwrap(),
            nx: 2,
            nu: 1,
            ny: 1,
            nr: 9,
            step_size: 0.001,
            toolchain: "gcc".into(),
            archive: PathBuf::from("out/q.fmu"),
            entries: vec![
                "binaries/linux64/q.so".into(),
                "modelDescription.xml".into(),
            ],
            duration_ms: 42,
        };
        let text = report.to_string();
        assert!(text.contains("=== Build Report ==="));
        assert!(text.contains("Platform: linux64"));
        assert!(text.contains("States: 2, inputs: 1, outputs: 1 (9 registers)"));
        assert!(text.contains("--- Archive (2 entries) ---"));
        assert!(text.contains("    binaries/linux64/q.so"));
        assert!(!report.has_sources());
    }
}
