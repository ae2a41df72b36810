#![deny(clippy::pedantic, unsafe_code)]

//! Blob injection into a host runtime binary
//!
//! Injection locates the sentinel fuse inside the target executable, flips
//! its state byte, and splices a length-prefixed copy of the blob directly
//! after it. Everything before the marker and after the payload region is
//! carried over unchanged, and the file is replaced through a sibling
//! temporary file so a concurrent reader never observes a partial write.

pub mod sentinel;

pub use sentinel::{MACHO_SEGMENT_NAME, SEA_FUSE};

use seapack_errors::{Error, InjectError};
use sentinel::{locate_marker, marker_state, MarkerState, STATE_INJECTED};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Options controlling a single injection
#[derive(Debug, Clone, Default)]
pub struct InjectOptions {
    /// Replace an existing payload instead of failing
    pub overwrite: bool,
    /// Mach-O segment the target must carry (macOS targets)
    pub macho_segment_name: Option<String>,
}

/// Inject `blob` into the binary at `binary_path`.
///
/// The file is left either in its original state or fully injected; on any
/// error before the final rename the target is untouched.
///
/// # Errors
///
/// Returns an error if the file cannot be read or replaced, the sentinel
/// marker is absent, duplicated, or corrupt, the platform container
/// constraint fails, or a payload is already present without `overwrite`.
pub async fn inject(binary_path: &Path, blob: &[u8], options: &InjectOptions) -> Result<(), Error> {
    let bytes = fs::read(binary_path)
        .await
        .map_err(|e| Error::io_with_path(&e, binary_path))?;

    let patched = patch(&bytes, blob, options)?;

    debug!(
        binary = %binary_path.display(),
        blob_len = blob.len(),
        "writing injected binary"
    );
    replace_file(binary_path, &patched).await
}

/// Pure injection core: returns the patched image without touching disk.
///
/// # Errors
///
/// Same marker, container, and overwrite failures as [`inject`].
pub fn patch(bytes: &[u8], blob: &[u8], options: &InjectOptions) -> Result<Vec<u8>, Error> {
    let marker = locate_marker(bytes)?;

    if let Some(segment) = options.macho_segment_name.as_deref() {
        verify_macho_segment(bytes, segment)?;
    }

    // Tail of the original image that survives the splice: everything after
    // the state byte for an empty marker, everything after the old payload
    // when overwriting.
    let state_offset = marker.state_offset();
    let tail_start = match marker_state(bytes, marker)? {
        MarkerState::Empty => state_offset + 1,
        MarkerState::Injected { .. } if !options.overwrite => {
            return Err(InjectError::BlobAlreadyInjected.into());
        }
        MarkerState::Injected { payload } => payload.end,
    };

    let length = blob.len() as u64;
    let mut out =
        Vec::with_capacity(bytes.len() - (tail_start - state_offset - 1) + 8 + blob.len());
    out.extend_from_slice(&bytes[..state_offset]);
    out.push(STATE_INJECTED);
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(blob);
    out.extend_from_slice(&bytes[tail_start..]);
    Ok(out)
}

/// Extract the injected payload from a binary image, if one is present.
///
/// # Errors
///
/// Returns an error if the marker is absent, duplicated, or corrupt.
pub fn find_payload(bytes: &[u8]) -> Result<Option<&[u8]>, Error> {
    let marker = locate_marker(bytes)?;
    match marker_state(bytes, marker)? {
        MarkerState::Empty => Ok(None),
        MarkerState::Injected { payload } => Ok(Some(&bytes[payload])),
    }
}

const MACHO_MAGICS: [[u8; 4]; 6] = [
    [0xcf, 0xfa, 0xed, 0xfe], // MH_MAGIC_64
    [0xfe, 0xed, 0xfa, 0xcf], // MH_CIGAM_64
    [0xce, 0xfa, 0xed, 0xfe], // MH_MAGIC
    [0xfe, 0xed, 0xfa, 0xce], // MH_CIGAM
    [0xca, 0xfe, 0xba, 0xbe], // FAT_MAGIC
    [0xbe, 0xba, 0xfe, 0xca], // FAT_CIGAM
];

fn verify_macho_segment(bytes: &[u8], segment: &str) -> Result<(), Error> {
    let magic = bytes.get(..4).ok_or_else(|| InjectError::InvalidBinaryFormat {
        message: "file too short for a Mach-O header".to_string(),
    })?;
    if !MACHO_MAGICS.iter().any(|m| m == magic) {
        return Err(InjectError::InvalidBinaryFormat {
            message: "not a Mach-O binary".to_string(),
        }
        .into());
    }
    let present = bytes
        .windows(segment.len())
        .any(|window| window == segment.as_bytes());
    if !present {
        return Err(InjectError::InvalidBinaryFormat {
            message: format!("required segment '{segment}' not present"),
        }
        .into());
    }
    Ok(())
}

/// Replace `target` with `bytes` via a sibling temporary file and rename,
/// preserving the original permission bits.
async fn replace_file(target: &Path, bytes: &[u8]) -> Result<(), Error> {
    let metadata = fs::metadata(target)
        .await
        .map_err(|e| Error::io_with_path(&e, target))?;

    let tmp = sibling_tmp_path(target);
    let staged = async {
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::io_with_path(&e, &tmp))?;
        fs::set_permissions(&tmp, metadata.permissions())
            .await
            .map_err(|e| Error::io_with_path(&e, &tmp))?;
        fs::rename(&tmp, target)
            .await
            .map_err(|e| Error::io_with_path(&e, target))
    }
    .await;

    if staged.is_err() {
        let _ = fs::remove_file(&tmp).await;
    }
    staged
}

fn sibling_tmp_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
