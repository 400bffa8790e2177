//! Input sanitization applied before validation

/// Normalizes user-supplied strings in place: trims surrounding whitespace
/// and turns blank optional fields into `None`.
pub trait Sanitize {
    fn sanitize(&mut self);
}

pub(crate) fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_optional(value: &mut Option<String>) {
    if let Some(inner) = value.as_mut() {
        trim(inner);
        if inner.is_empty() {
            *value = None;
        }
    }
}
