/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a cleaned cell as a year. Accepts `2010` and integral floats like `2010.0`.
pub fn parse_year(s: &str) -> Option<i64> {
    if let Ok(y) = s.parse::<i64>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Parse a cleaned cell as a number.
///
/// `Ok(None)` for blanks and non-finite values, `Err(())` for anything else
/// that is not a number.
pub fn parse_number(s: &str) -> Result<Option<f64>, ()> {
    if s.is_empty() {
        return Ok(None);
    }
    let v: f64 = s.parse().map_err(|_| ())?;
    Ok(v.is_finite().then_some(v))
}

/// Case-insensitive header comparison on cleaned text.
pub fn header_matches(cell: &str, name: &str) -> bool {
    clean_str(cell).to_lowercase() == name.to_lowercase()
}
