//! Host platform identification.
//!
//! Binaries inside a unit live under `binaries/<platform-id>/`, where the
//! platform id is `{os}{bits}` (`linux64`, `win32`, `darwin64`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PackageError, Result};

/// Operating systems a unit can carry a binary for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Win,
    Linux,
    Darwin,
}

impl Os {
    /// Map a Rust `target_os` name.
    pub fn from_target_os(name: &str) -> Option<Os> {
        match name {
            "windows" => Some(Os::Win),
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::Darwin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Os::Win => "win",
            Os::Linux => "linux",
            Os::Darwin => "darwin",
        }
    }

    /// Shared-library file extension.
    pub fn library_extension(self) -> &'static str {
        match self {
            Os::Win => "dll",
            Os::Linux => "so",
            Os::Darwin => "dylib",
        }
    }
}

/// A `{os}{bits}` platform id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformId {
    os: Os,
    bits: u8,
}

impl PlatformId {
    pub fn new(os: Os, bits: u8) -> Result<Self> {
        if bits != 32 && bits != 64 {
            return Err(PackageError::UnsupportedPlatformOrToolchain {
                message: format!("{bits}-bit {} is not a platform a unit can target", os.as_str()),
            });
        }
        Ok(Self { os, bits })
    }

    /// The platform this process runs on.
    pub fn host() -> Result<Self> {
        Self::from_target(std::env::consts::OS, usize::BITS)
    }

    /// Build a platform id from a `target_os` name and pointer width.
    pub fn from_target(target_os: &str, pointer_bits: u32) -> Result<Self> {
        let os = Os::from_target_os(target_os).ok_or_else(|| {
            PackageError::UnsupportedPlatformOrToolchain {
                message: format!("operating system '{target_os}' is not supported"),
            }
        })?;
        let bits = u8::try_from(pointer_bits).map_err(|_| {
            PackageError::UnsupportedPlatformOrToolchain {
                message: format!("{pointer_bits}-bit pointers are not supported"),
            }
        })?;
        Self::new(os, bits)
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// File name of the compiled library for `identifier`.
    pub fn library_name(&self, identifier: &str) -> String {
        format!("{identifier}.{}", self.os.library_extension())
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.os.as_str(), self.bits)
    }
}
