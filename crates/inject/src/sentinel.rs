//! Sentinel marker layout and search
//!
//! The host runtime binary carries the fuse token followed by `:` and a
//! single state byte: `0` while no payload is present, `1` once a payload
//! has been injected. An injected marker is followed by an 8-byte
//! little-endian length and the payload bytes, so the region is
//! self-describing for any reader that can find the fuse.

use seapack_errors::{Error, InjectError};
use std::ops::Range;

/// Fuse token embedded in the host runtime binary.
///
/// The token is versioned; it must match the runtime the pipeline targets or
/// the payload will not be recognized at run time.
pub const SEA_FUSE: &str = "NODE_SEA_FUSE_fce680ab2cc467b6e072b8b5df1996b2";

/// Mach-O segment the runtime reserves for the payload on macOS
pub const MACHO_SEGMENT_NAME: &str = "NODE_SEA";

pub(crate) const STATE_EMPTY: u8 = b'0';
pub(crate) const STATE_INJECTED: u8 = b'1';
const LENGTH_FIELD: usize = std::mem::size_of::<u64>();

/// Location of the fuse token within a binary
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    /// Offset of the first fuse byte
    pub offset: usize,
}

impl Marker {
    /// Offset of the state byte (one past the `:` separator)
    pub fn state_offset(self) -> usize {
        self.offset + SEA_FUSE.len() + 1
    }
}

/// Payload state recorded at the marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MarkerState {
    Empty,
    Injected { payload: Range<usize> },
}

fn find_all(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter_map(|(i, window)| (window == needle).then_some(i))
        .collect()
}

/// Locate the fuse token, enforcing exactly one occurrence.
pub(crate) fn locate_marker(bytes: &[u8]) -> Result<Marker, Error> {
    let occurrences = find_all(bytes, SEA_FUSE.as_bytes());
    match occurrences.as_slice() {
        [] => Err(InjectError::MarkerNotFound.into()),
        [offset] => Ok(Marker { offset: *offset }),
        _ => Err(InjectError::AmbiguousMarker {
            count: occurrences.len(),
        }
        .into()),
    }
}

/// Parse the state byte and, for an injected marker, the payload range.
pub(crate) fn marker_state(bytes: &[u8], marker: Marker) -> Result<MarkerState, Error> {
    let separator = marker.offset + SEA_FUSE.len();
    if bytes.get(separator) != Some(&b':') {
        return Err(InjectError::CorruptMarker {
            message: "missing ':' separator after fuse token".to_string(),
        }
        .into());
    }

    let state_offset = marker.state_offset();
    let state = *bytes.get(state_offset).ok_or_else(|| InjectError::CorruptMarker {
        message: "file ends before the fuse state byte".to_string(),
    })?;

    match state {
        STATE_EMPTY => Ok(MarkerState::Empty),
        STATE_INJECTED => {
            let length_start = state_offset + 1;
            let length_end = length_start + LENGTH_FIELD;
            let length_bytes =
                bytes
                    .get(length_start..length_end)
                    .ok_or_else(|| InjectError::CorruptMarker {
                        message: "file ends before the payload length field".to_string(),
                    })?;
            let length = u64::from_le_bytes(
                length_bytes
                    .try_into()
                    .map_err(|_| Error::internal("length field slice has wrong size"))?,
            );
            let length = usize::try_from(length).map_err(|_| InjectError::CorruptMarker {
                message: format!("payload length {length} does not fit in memory"),
            })?;

            let payload_start = length_end;
            let payload_end =
                payload_start
                    .checked_add(length)
                    .ok_or_else(|| InjectError::CorruptMarker {
                        message: "payload length overflows file offset".to_string(),
                    })?;
            if payload_end > bytes.len() {
                return Err(InjectError::CorruptMarker {
                    message: format!(
                        "payload length {length} exceeds file size {}",
                        bytes.len()
                    ),
                }
                .into());
            }
            Ok(MarkerState::Injected {
                payload: payload_start..payload_end,
            })
        }
        other => Err(InjectError::CorruptMarker {
            message: format!("unexpected fuse state byte 0x{other:02x}"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_marker(state: &[u8]) -> Vec<u8> {
        let mut bytes = b"head ".to_vec();
        bytes.extend_from_slice(SEA_FUSE.as_bytes());
        bytes.extend_from_slice(state);
        bytes.extend_from_slice(b" tail");
        bytes
    }

    #[test]
    fn locates_single_marker() {
        let bytes = with_marker(b":0");
        let marker = locate_marker(&bytes).unwrap();
        assert_eq!(marker.offset, 5);
    }

    #[test]
    fn missing_marker_is_an_error() {
        let err = locate_marker(b"no fuse here").unwrap_err();
        assert!(matches!(err, Error::Inject(InjectError::MarkerNotFound)));
    }

    #[test]
    fn duplicate_marker_is_ambiguous() {
        let mut bytes = with_marker(b":0");
        bytes.extend_from_slice(SEA_FUSE.as_bytes());
        let err = locate_marker(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::Inject(InjectError::AmbiguousMarker { count: 2 })
        ));
    }

    #[test]
    fn empty_state_parses() {
        let bytes = with_marker(b":0");
        let marker = locate_marker(&bytes).unwrap();
        assert_eq!(marker_state(&bytes, marker).unwrap(), MarkerState::Empty);
    }

    #[test]
    fn injected_state_yields_payload_range() {
        let mut bytes = b"head ".to_vec();
        bytes.extend_from_slice(SEA_FUSE.as_bytes());
        bytes.extend_from_slice(b":1");
        bytes.extend_from_slice(&3u64.to_le_bytes());
        bytes.extend_from_slice(b"abc tail");

        let marker = locate_marker(&bytes).unwrap();
        let MarkerState::Injected { payload } = marker_state(&bytes, marker).unwrap() else {
            panic!("expected injected state");
        };
        assert_eq!(&bytes[payload], b"abc");
    }

    #[test]
    fn corrupt_separator_and_state_are_rejected() {
        let bytes = with_marker(b"_0");
        let marker = locate_marker(&bytes).unwrap();
        assert!(matches!(
            marker_state(&bytes, marker).unwrap_err(),
            Error::Inject(InjectError::CorruptMarker { .. })
        ));

        let bytes = with_marker(b":x");
        let marker = locate_marker(&bytes).unwrap();
        assert!(matches!(
            marker_state(&bytes, marker).unwrap_err(),
            Error::Inject(InjectError::CorruptMarker { .. })
        ));
    }

    #[test]
    fn oversized_length_is_rejected() {
        let mut bytes = b"head ".to_vec();
        bytes.extend_from_slice(SEA_FUSE.as_bytes());
        bytes.extend_from_slice(b":1");
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let marker = locate_marker(&bytes).unwrap();
        assert!(matches!(
            marker_state(&bytes, marker).unwrap_err(),
            Error::Inject(InjectError::CorruptMarker { .. })
        ));
    }
}
