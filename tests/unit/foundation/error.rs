use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VisageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        VisageError::asset_not_found("layered/a/body")
            .to_string()
            .contains("asset not found: layered/a/body")
    );
    assert!(
        VisageError::unreadable("x")
            .to_string()
            .contains("unreadable image:")
    );
    assert!(
        VisageError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        VisageError::dimension_mismatch("x")
            .to_string()
            .contains("dimension mismatch:")
    );
    assert!(VisageError::decode("x").to_string().contains("decode error:"));
    assert!(VisageError::config("x").to_string().contains("config error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VisageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
