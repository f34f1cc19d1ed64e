//! Element classification for Inkscape path operations.

use crate::model::document::{Element, INKSCAPE_NS, SODIPODI_NS, SVG_NS};

/// SVG basic shapes.
pub const SVG_SHAPES: [&str; 6] = ["rect", "circle", "ellipse", "line", "polyline", "polygon"];

pub fn is_group(el: &Element) -> bool {
    el.is(SVG_NS, "g")
}

pub fn is_path(el: &Element) -> bool {
    el.is(SVG_NS, "path")
}

pub fn is_basic_shape(el: &Element) -> bool {
    SVG_SHAPES.iter().any(|shape| el.is(SVG_NS, shape))
}

/// Inkscape custom shapes (stars, spirals, arcs) carry `sodipodi:type`.
pub fn is_custom_shape(el: &Element) -> bool {
    el.has_attr(Some(SODIPODI_NS), "type")
}

pub fn is_shape(el: &Element) -> bool {
    is_basic_shape(el) || is_custom_shape(el)
}

pub fn has_path_effect(el: &Element) -> bool {
    el.has_attr(Some(INKSCAPE_NS), "path-effect")
}

/// A path whose `d` is the source of truth (no live path effect, no custom shape).
pub fn is_modifiable_path(el: &Element) -> bool {
    is_path(el) && !(has_path_effect(el) || is_custom_shape(el))
}

pub fn is_image(el: &Element) -> bool {
    el.is(SVG_NS, "image")
}

pub fn is_text(el: &Element) -> bool {
    el.is(SVG_NS, "text")
}

/// Whether Inkscape's path operations accept this element.
pub fn does_pathops(el: &Element) -> bool {
    is_path(el) || is_shape(el) || is_text(el)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::Document;

    const DRAWING: &str = r##"<svg xmlns="http://www.w3.org/2000/svg"
        xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
        xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
      <g id="g"/>
      <path id="plain" d="M 0,0 L 1,1"/>
      <path id="star" sodipodi:type="star" d="M 0,0 Z"/>
      <path id="lpe" inkscape:path-effect="#pe1" d="M 0,0 Z"/>
      <rect id="rect"/>
      <polygon id="poly"/>
      <text id="text">x</text>
      <image id="img"/>
      <use id="use"/>
    </svg>"##;

    fn with<F: Fn(&Element) -> bool>(doc: &Document, id: &str, f: F) -> bool {
        let key = doc.get_element_by_id(id).unwrap();
        f(doc.element(key).unwrap())
    }

    #[test]
    fn classifies_operable_elements() {
        let doc = Document::parse(DRAWING).unwrap();
        for id in ["plain", "star", "lpe", "rect", "poly", "text"] {
            assert!(with(&doc, id, does_pathops), "{id} should be operable");
        }
        for id in ["g", "img", "use"] {
            assert!(!with(&doc, id, does_pathops), "{id} should not be operable");
        }
    }

    #[test]
    fn modifiable_paths_exclude_effects_and_custom_shapes() {
        let doc = Document::parse(DRAWING).unwrap();
        assert!(with(&doc, "plain", is_modifiable_path));
        assert!(!with(&doc, "star", is_modifiable_path));
        assert!(!with(&doc, "lpe", is_modifiable_path));
        assert!(with(&doc, "star", is_custom_shape));
        assert!(with(&doc, "img", is_image));
        assert!(with(&doc, "g", is_group));
    }
}
