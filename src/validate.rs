//! Pure predicates over candidate field values.

/// `true` iff `value` is only ASCII digits and its integer value is nonzero.
pub fn is_positive_integer(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| c.is_ascii_digit())
        && value.chars().any(|c| c != '0')
}

/// `true` iff `value` parses as a finite number (integer, float or exponent
/// form, surrounding whitespace allowed).
pub fn is_decimal(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(f64::is_finite)
        .unwrap_or(false)
}

/// `true` iff `value` is at most `max_len` characters long.
pub fn within_length(value: &str, max_len: usize) -> bool {
    value.chars().count() <= max_len
}

/// `true` iff `field_name` is not one of `locked`.
pub fn is_unlocked_field<'a, I>(field_name: &str, locked: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    !locked.into_iter().any(|name| name == field_name)
}

/// `true` iff `code` is exactly one of `allowed` (case-sensitive).
pub fn is_known_currency<S: AsRef<str>>(code: &str, allowed: &[S]) -> bool {
    allowed.iter().any(|c| c.as_ref() == code)
}
