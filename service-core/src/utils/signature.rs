use subtle::ConstantTimeEq;

/// Compare two hex digests in constant time, ignoring ASCII case.
pub fn digests_match(expected: &str, provided: &str) -> bool {
    let expected = expected.to_ascii_lowercase();
    let provided = provided.trim().to_ascii_lowercase();

    let expected_bytes = expected.as_bytes();
    let provided_bytes = provided.as_bytes();

    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}
