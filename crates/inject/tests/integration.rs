//! Integration tests for blob injection

use seapack_errors::{Error, InjectError};
use seapack_inject::{find_payload, inject, patch, InjectOptions, SEA_FUSE};
use std::path::PathBuf;
use tempfile::TempDir;

/// A fake runtime image with one unarmed fuse in the middle
fn fixture_image() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"\x7fELF fake header ");
    bytes.extend_from_slice(SEA_FUSE.as_bytes());
    bytes.extend_from_slice(b":0");
    bytes.extend_from_slice(b" trailing code and data");
    bytes
}

async fn write_fixture(dir: &TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("runtime-copy");
    tokio::fs::write(&path, bytes).await.unwrap();
    path
}

#[tokio::test]
async fn inject_writes_payload_and_preserves_other_bytes() {
    let dir = TempDir::new().unwrap();
    let original = fixture_image();
    let path = write_fixture(&dir, &original).await;
    let blob = b"0123456789";

    inject(&path, blob, &InjectOptions::default()).await.unwrap();

    let injected = tokio::fs::read(&path).await.unwrap();
    assert_eq!(find_payload(&injected).unwrap(), Some(blob.as_slice()));

    // Bytes before the marker and after the payload region are untouched
    let fuse_at = original
        .windows(SEA_FUSE.len())
        .position(|w| w == SEA_FUSE.as_bytes())
        .unwrap();
    let state_at = fuse_at + SEA_FUSE.len() + 1;
    assert_eq!(&injected[..state_at], &original[..state_at]);
    let tail_len = original.len() - state_at - 1;
    assert_eq!(
        &injected[injected.len() - tail_len..],
        &original[original.len() - tail_len..]
    );
}

#[tokio::test]
async fn missing_marker_fails_without_modifying_file() {
    let dir = TempDir::new().unwrap();
    let original = b"no marker in this file".to_vec();
    let path = write_fixture(&dir, &original).await;

    let err = inject(&path, b"blob", &InjectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Inject(InjectError::MarkerNotFound)));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), original);
}

#[tokio::test]
async fn duplicate_marker_fails_without_modifying_file() {
    let dir = TempDir::new().unwrap();
    let mut original = fixture_image();
    original.extend_from_slice(SEA_FUSE.as_bytes());
    original.extend_from_slice(b":0");
    let path = write_fixture(&dir, &original).await;

    let err = inject(&path, b"blob", &InjectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Inject(InjectError::AmbiguousMarker { count: 2 })
    ));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), original);
}

#[tokio::test]
async fn second_injection_requires_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, &fixture_image()).await;

    inject(&path, b"first", &InjectOptions::default()).await.unwrap();
    let after_first = tokio::fs::read(&path).await.unwrap();

    let err = inject(&path, b"second", &InjectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Inject(InjectError::BlobAlreadyInjected)
    ));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), after_first);
}

#[tokio::test]
async fn overwrite_replaces_payload_fully() {
    let dir = TempDir::new().unwrap();
    let original = fixture_image();
    let path = write_fixture(&dir, &original).await;

    inject(&path, b"a much longer first payload", &InjectOptions::default())
        .await
        .unwrap();
    inject(
        &path,
        b"2nd",
        &InjectOptions {
            overwrite: true,
            macho_segment_name: None,
        },
    )
    .await
    .unwrap();

    let injected = tokio::fs::read(&path).await.unwrap();
    assert_eq!(find_payload(&injected).unwrap(), Some(b"2nd".as_slice()));
    // No residue of the first payload survives
    assert!(!injected
        .windows(b"longer first".len())
        .any(|w| w == b"longer first"));
    // Overwriting with an equal-length image restores the original size
    assert_eq!(injected.len(), original.len() + 8 + 3);
}

#[cfg(unix)]
#[tokio::test]
async fn injection_preserves_permission_bits() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, &fixture_image()).await;
    tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .await
        .unwrap();

    inject(&path, b"payload", &InjectOptions::default()).await.unwrap();

    let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn macho_segment_constraint_rejects_foreign_formats() {
    let blob = b"blob";
    let options = InjectOptions {
        overwrite: false,
        macho_segment_name: Some("NODE_SEA".to_string()),
    };

    // ELF-looking fixture: wrong magic
    let err = patch(&fixture_image(), blob, &options).unwrap_err();
    assert!(matches!(
        err,
        Error::Inject(InjectError::InvalidBinaryFormat { .. })
    ));

    // Mach-O magic but no segment name
    let mut macho = vec![0xcf, 0xfa, 0xed, 0xfe];
    macho.extend_from_slice(SEA_FUSE.as_bytes());
    macho.extend_from_slice(b":0");
    let err = patch(&macho, blob, &options).unwrap_err();
    assert!(matches!(
        err,
        Error::Inject(InjectError::InvalidBinaryFormat { .. })
    ));

    // Mach-O magic with the segment present succeeds
    let mut macho = vec![0xcf, 0xfa, 0xed, 0xfe];
    macho.extend_from_slice(b"NODE_SEA\0\0\0\0\0\0\0\0");
    macho.extend_from_slice(SEA_FUSE.as_bytes());
    macho.extend_from_slice(b":0");
    let patched = patch(&macho, blob, &options).unwrap();
    assert_eq!(find_payload(&patched).unwrap(), Some(blob.as_slice()));
}
