/// Normalize a display string: trim surrounding whitespace and collapse
/// blank input to `None`.
///
/// Entity setters apply this to every optional display string so that
/// empty strings never reach the record store.
pub fn normalize<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    match value {
        Some(s) => {
            let trimmed = s.as_ref().trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        None => None,
    }
}
