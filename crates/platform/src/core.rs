//! Platform detection

use std::fmt;

/// The platforms the pipeline distinguishes between.
///
/// Only macOS and Windows carry a code-signing tool; everything else is
/// `Other` and must be rejected explicitly by signing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Other,
}

impl Platform {
    /// Detect the platform this process is running on
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOS
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// The executable suffix binaries carry on this platform
    #[must_use]
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            _ => "",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOS => write!(f, "macos"),
            Self::Windows => write!(f, "windows"),
            Self::Other => write!(f, "{}", std::env::consts::OS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_matches_target_os() {
        let platform = Platform::current();
        if cfg!(target_os = "macos") {
            assert_eq!(platform, Platform::MacOS);
        } else if cfg!(target_os = "windows") {
            assert_eq!(platform, Platform::Windows);
        } else {
            assert_eq!(platform, Platform::Other);
        }
    }

    #[test]
    fn exe_suffix_only_on_windows() {
        assert_eq!(Platform::Windows.exe_suffix(), ".exe");
        assert_eq!(Platform::MacOS.exe_suffix(), "");
        assert_eq!(Platform::Other.exe_suffix(), "");
    }
}
