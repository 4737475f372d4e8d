//! Color extraction for captured computed styles.
//!
//! Computed colors arrive as `rgb()`/`rgba()` strings. The toolbar and the
//! host work with 6-digit hex, so captured values are normalized here.

/// Color used when a computed color is fully transparent.
pub const TRANSPARENT_FALLBACK: &str = "#ffffff";

/// Convert a CSS color string into a 6-digit lowercase hex string.
///
/// - `rgb(r, g, b)` and `rgba(r, g, b, a)` become `#rrggbb`.
/// - A fully transparent alpha maps to white.
/// - Hex colors pass through (3-digit forms are expanded).
/// - Anything else is returned unchanged.
#[must_use]
pub fn to_hex(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('#') {
        return normalize_hex(trimmed).unwrap_or_else(|| trimmed.to_string());
    }

    let lower = trimmed.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    let Some(inner) = inner else {
        return trimmed.to_string();
    };

    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 || parts.len() > 4 {
        return trimmed.to_string();
    }

    if let Some(alpha) = parts.get(3) {
        match parse_alpha(alpha) {
            Some(a) if a <= 0.0 => return TRANSPARENT_FALLBACK.to_string(),
            Some(_) => {}
            None => return TRANSPARENT_FALLBACK.to_string(),
        }
    }

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        match parse_channel(part) {
            Some(v) => *slot = v,
            None => return TRANSPARENT_FALLBACK.to_string(),
        }
    }

    format!("#{:02x}{:02x}{:02x}", channels[0], channels[1], channels[2])
}

// Clamped to 0..=255 before the cast
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_channel(part: &str) -> Option<u8> {
    let value: f32 = if let Some(pct) = part.strip_suffix('%') {
        pct.parse::<f32>().ok()? * 2.55
    } else {
        part.parse().ok()?
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(part: &str) -> Option<f32> {
    if let Some(pct) = part.strip_suffix('%') {
        return pct.parse::<f32>().ok().map(|v| v / 100.0);
    }
    part.parse().ok()
}

fn normalize_hex(value: &str) -> Option<String> {
    let digits = value.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => Some(
            digits
                .chars()
                .fold(String::from("#"), |mut acc, c| {
                    acc.push(c);
                    acc.push(c);
                    acc
                })
                .to_ascii_lowercase(),
        ),
        6 => Some(format!("#{}", digits.to_ascii_lowercase())),
        _ => None,
    }
}
