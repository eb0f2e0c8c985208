use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::asset_decode("x")
            .to_string()
            .contains("asset decode error:")
    );
    assert!(
        ReelError::capture_unsupported("x")
            .to_string()
            .contains("capture unsupported:")
    );
    assert!(
        ReelError::finalize("x")
            .to_string()
            .contains("finalize error:")
    );
    assert!(
        ReelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ReelError::EmptyTimeline.to_string().contains("empty timeline"));
}

#[test]
fn kind_matches_variant() {
    assert_eq!(ReelError::EmptyTimeline.kind(), ErrorKind::EmptyTimeline);
    assert_eq!(ReelError::asset_decode("x").kind(), ErrorKind::AssetDecode);
    assert_eq!(
        ReelError::capture_unsupported("x").kind(),
        ErrorKind::CaptureUnsupported
    );
    assert_eq!(ReelError::Aborted.kind(), ErrorKind::Aborted);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}
