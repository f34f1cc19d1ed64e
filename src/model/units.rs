use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PathOpsError, Result};
use crate::model::document::Document;

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([-+]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?)\s*([a-zA-Z]*)\s*$")
        .expect("valid length regex")
});

/// Pixels per unit at 96 dpi.
fn px_per_unit(unit: &str) -> Option<f64> {
    let factor = match unit {
        "" | "px" => 1.0,
        "in" => 96.0,
        "pt" => 96.0 / 72.0,
        "pc" => 16.0,
        "mm" => 96.0 / 25.4,
        "cm" => 96.0 / 2.54,
        "m" => 96.0 / 0.0254,
        "q" | "Q" => 96.0 / 101.6,
        _ => return None,
    };
    Some(factor)
}

/// Convert a CSS length such as `1px` or `0.5mm` to pixels.
pub fn to_px(length: &str) -> Result<f64> {
    let caps = LENGTH_RE
        .captures(length)
        .ok_or_else(|| PathOpsError::InvalidLength(length.to_string()))?;
    let value: f64 = caps[1]
        .parse()
        .map_err(|_| PathOpsError::InvalidLength(length.to_string()))?;
    let factor = px_per_unit(&caps[2]).ok_or_else(|| PathOpsError::InvalidLength(length.to_string()))?;
    Ok(value * factor)
}

/// User units per pixel, from the root `viewBox` width over the root `width`.
///
/// Falls back to 1 when either is missing, unparsable or zero.
pub fn document_scale(doc: &Document) -> f64 {
    let Some(root) = doc.element(doc.root()) else {
        return 1.0;
    };

    let width = root.attr(None, "width").and_then(|w| to_px(w).ok());
    let viewbox_width = root.attr(None, "viewBox").and_then(|vb| {
        vb.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .nth(2)
            .and_then(|w| w.parse::<f64>().ok())
    });

    match (width, viewbox_width) {
        (Some(width), Some(vb)) if width > 0.0 && vb > 0.0 => vb / width,
        _ => 1.0,
    }
}

/// Convert a length to the document's user units.
pub fn unit_to_uu(doc: &Document, length: &str) -> Result<f64> {
    Ok(to_px(length)? * document_scale(doc))
}
