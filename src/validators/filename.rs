/// Reduces an uploaded filename to a safe storage-key component.
///
/// Directory components (either separator style) are stripped first, then
/// every character outside `[A-Za-z0-9._-]` becomes `_`. The result can be
/// embedded in a derived storage key without enabling path traversal.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
