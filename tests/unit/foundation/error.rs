use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ColorSwapError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ColorSwapError::payload("x")
            .to_string()
            .contains("payload error:")
    );
    assert!(
        ColorSwapError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn host_errors_convert() {
    let err: ColorSwapError = HostError::CompNotFound(7).into();
    assert!(err.to_string().starts_with("host error:"));
    assert!(err.to_string().contains('7'));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ColorSwapError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
