//! Native toolchain invocation.
//!
//! The generated translation unit and the runtime skeleton are compiled into
//! one shared library per build. The [`Toolchain`] trait is the seam the
//! pipeline compiles through; [`SystemToolchain`] drives the host C compiler.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use ltifmu_codegen::SOURCE_FILE_NAME;

use crate::error::{PackageError, Result};
use crate::platform::{Os, PlatformId};

/// Everything a toolchain needs to build one unit's library.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    /// `sources/` tree: the generated source plus `include/`.
    pub sources_dir: &'a Path,
    /// Empty directory for objects and the library.
    pub build_dir: &'a Path,
    pub identifier: &'a str,
    pub platform: PlatformId,
}

impl CompileRequest<'_> {
    /// Where the library is expected once compilation succeeds.
    pub fn output_path(&self) -> PathBuf {
        self.build_dir.join(self.platform.library_name(self.identifier))
    }
}

/// Something that can turn a `sources/` tree into a shared library.
pub trait Toolchain {
    /// Compile and link, returning the path of the produced library.
    fn compile(&self, request: &CompileRequest<'_>) -> Result<PathBuf>;

    /// Human-readable name for logs and reports.
    fn name(&self) -> String;
}

/// The host C compiler, invoked as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct SystemToolchain {
    compiler: Option<String>,
    flags: Vec<String>,
}

impl SystemToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `compiler` instead of the platform default.
    pub fn with_compiler(mut self, compiler: impl Into<String>) -> Self {
        self.compiler = Some(compiler.into());
        self
    }

    /// Extra flags passed before the source file.
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Compiler executable used for `platform`.
    pub fn compiler_for(&self, platform: PlatformId) -> &str {
        match &self.compiler {
            Some(compiler) => compiler.as_str(),
            None => default_compiler(platform.os()),
        }
    }

    /// The full command line for `request`, without running it.
    pub fn command(&self, request: &CompileRequest<'_>) -> Command {
        let compiler = self.compiler_for(request.platform);
        let include = request.sources_dir.join("include");
        let source = request.sources_dir.join(SOURCE_FILE_NAME);
        let output = request.output_path();

        let mut cmd = Command::new(compiler);
        cmd.current_dir(request.build_dir);
        match request.platform.os() {
            Os::Win => {
                let mut out_flag = std::ffi::OsString::from("/Fe");
                out_flag.push(&output);
                cmd.args(["/nologo", "/LD", "/Oy", "/Ob1", "/Oi", "/DDISABLE_PREFIX"])
                    .arg("/I")
                    .arg(&include)
                    .args(&self.flags)
                    .arg(out_flag)
                    .arg(&source)
                    .arg("shlwapi.lib");
            }
            Os::Linux => {
                cmd.args(["-shared", "-fPIC", "-static-libgcc", "-DDISABLE_PREFIX"])
                    .arg("-I")
                    .arg(&include)
                    .args(&self.flags)
                    .arg("-o")
                    .arg(&output)
                    .arg(&source)
                    .arg("-lm");
            }
            Os::Darwin => {
                cmd.args(["-shared", "-fPIC", "-arch", "x86_64", "-arch", "arm64"])
                    .arg("-DDISABLE_PREFIX")
                    .arg("-I")
                    .arg(&include)
                    .args(&self.flags)
                    .arg("-o")
                    .arg(&output)
                    .arg(&source)
                    .arg("-lm");
            }
        }
        cmd
    }

    /// First line of the compiler's version banner, if it can be run.
    pub fn probe(&self, platform: PlatformId) -> Option<String> {
        let compiler = self.compiler_for(platform);
        let mut cmd = Command::new(compiler);
        if platform.os() != Os::Win {
            cmd.arg("--version");
        }
        let output = cmd.output().ok()?;
        // cl prints its banner on stderr.
        let text = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        String::from_utf8_lossy(&text)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    }
}

impl Toolchain for SystemToolchain {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<PathBuf> {
        let compiler = self.compiler_for(request.platform).to_string();
        let mut cmd = self.command(request);
        tracing::info!(command = ?cmd, "compiling shared library");

        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PackageError::UnsupportedPlatformOrToolchain {
                message: format!("compiler `{compiler}` not found on PATH"),
            },
            _ => PackageError::Io {
                context: format!("failed to invoke `{compiler}`"),
                source: e,
            },
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // cl reports diagnostics on stdout.
            let diagnostics = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(PackageError::CompileFailure {
                compiler,
                status: output.status.to_string(),
                stderr: diagnostics.trim_end().to_string(),
            });
        }

        let library = request.output_path();
        if !library.is_file() {
            return Err(PackageError::MissingOutput { path: library });
        }
        Ok(library)
    }

    fn name(&self) -> String {
        match &self.compiler {
            Some(compiler) => compiler.clone(),
            None => "system".to_string(),
        }
    }
}

/// Compiler used when none is configured.
pub fn default_compiler(os: Os) -> &'static str {
    match os {
        Os::Win => "cl",
        Os::Linux => "gcc",
        Os::Darwin => "clang",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn request<'a>(sources: &'a Path, build: &'a Path, os: &str) -> CompileRequest<'a> {
        CompileRequest {
            sources_dir: sources,
            build_dir: build,
            identifier: "q",
            platform: PlatformId::from_target(os, 64).unwrap(),
        }
    }

    #[test]
    fn linux_command_line() {
        let (src, build) = (Path::new("/s"), Path::new("/b"));
        let tc = SystemToolchain::new().with_flags(vec!["-O2".to_string()]);
        let req = request(src, build, "linux");
        let cmd = tc.command(&req);
        assert_eq!(cmd.get_program(), "gcc");
        let args = args(&cmd);
        assert!(args.contains(&"-shared".to_string()));
        assert!(args.contains(&"-fPIC".to_string()));
        assert!(args.contains(&"-DDISABLE_PREFIX".to_string()));
        assert!(args.contains(&"-O2".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("-lm"));
        let out = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(Path::new(&args[out + 1]), build.join("q.so"));
        assert_eq!(cmd.get_current_dir(), Some(build));
    }

    #[test]
    fn platform_defaults_and_override() {
        let tc = SystemToolchain::new();
        let mac = PlatformId::from_target("macos", 64).unwrap();
        let win = PlatformId::from_target("windows", 64).unwrap();
        assert_eq!(tc.compiler_for(mac), "clang");
        assert_eq!(tc.compiler_for(win), "cl");
        assert_eq!(tc.clone().with_compiler("cc").compiler_for(mac), "cc");
    }

    #[test]
    fn windows_command_line() {
        let (src, build) = (Path::new("s"), Path::new("b"));
        let cmd = SystemToolchain::new().command(&request(src, build, "windows"));
        let args = args(&cmd);
        assert!(args.contains(&"/LD".to_string()));
        assert!(args.iter().any(|a| a.starts_with("/Fe") && a.ends_with("q.dll")));
    }

    #[test]
    fn missing_compiler_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let tc = SystemToolchain::new().with_compiler("ltifmu-no-such-compiler");
        let req = CompileRequest {
            sources_dir: dir.path(),
            build_dir: dir.path(),
            identifier: "q",
            platform: PlatformId::host().unwrap(),
        };
        assert!(matches!(
            tc.compile(&req),
            Err(PackageError::UnsupportedPlatformOrToolchain { .. })
        ));
    }
}
