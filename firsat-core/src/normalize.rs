//! Free-text numeric normalization.
//!
//! Listing sites and users write numbers every which way: "1.234,5 TL",
//! "95 m²", "3+1". These parsers coerce that into clean floats and never
//! fail — unusable input is simply missing, and the caller keeps whatever
//! default it already had.

/// Parse locale-formatted free text into a float.
///
/// Handles both Turkish ("1.234,5") and point-decimal ("1234.5") notation:
/// when both separators appear, the later one is the decimal separator and
/// the other is stripped as a thousands separator. Returns `None` for empty
/// or unparseable input.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if kept.is_empty() {
        return None;
    }

    let dots = kept.matches('.').count();
    let commas = kept.matches(',').count();

    let cleaned = if dots > 0 && commas > 0 {
        let last_dot = kept.rfind('.').unwrap_or(0);
        let last_comma = kept.rfind(',').unwrap_or(0);
        let (decimal, thousands) = if last_dot > last_comma {
            ('.', ',')
        } else {
            (',', '.')
        };
        let stripped = kept.replace(thousands, "");
        if decimal == ',' {
            stripped.replace(',', ".")
        } else {
            stripped
        }
    } else if commas > 0 {
        if commas == 1 {
            // single comma is a decimal comma
            kept.replace(',', ".")
        } else {
            kept.replace(',', "")
        }
    } else if dots > 1 {
        kept.replace('.', "")
    } else {
        kept
    };

    cleaned.parse::<f64>().ok()
}

/// Parse Turkish room-count notation.
///
/// "3+1" means three bedrooms plus a living room, so it counts as 4 rooms.
/// "studio" and "1+0" both count as a single room. Anything else falls back
/// to [`parse_numeric`].
pub fn parse_rooms(raw: &str) -> Option<f64> {
    let t = raw.trim().to_lowercase();
    if t.is_empty() {
        return None;
    }
    if t.contains("studio") || t.contains("1+0") {
        return Some(1.0);
    }
    if t.contains('+') {
        let parts: Vec<&str> = t.split('+').map(str::trim).collect();
        if parts.len() >= 2
            && let (Ok(bedrooms), Ok(living)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>())
        {
            return Some(f64::from(bedrooms + living));
        }
    }
    parse_numeric(&t)
}
