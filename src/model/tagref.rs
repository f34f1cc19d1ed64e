//! Selection-set references (`inkscape:tag/inkscape:tagref` in `<defs>`).
//!
//! Inkscape crashes when closing a document whose selection sets point at
//! objects that no longer exist, so references to objects consumed by a path
//! operation have to be repaired before the document is handed back.

use serde::Deserialize;

use crate::model::document::{Document, INKSCAPE_NS, NodeKey, SVG_NS, XLINK_NS};

/// How to repair a tagref whose target is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairMode {
    /// Delete the dangling reference.
    #[default]
    Purge,
    /// Recreate the missing id as an empty path.
    Placeholder,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub purged: Vec<String>,
    pub placeholders: Vec<String>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.purged.is_empty() && self.placeholders.is_empty()
    }
}

/// First `<defs>` in document order.
pub fn find_defs(doc: &Document) -> Option<NodeKey> {
    doc.descendants(doc.root())
        .find(|key| doc.element(*key).is_some_and(|el| el.is(SVG_NS, "defs")))
}

pub fn tagrefs(doc: &Document) -> Vec<NodeKey> {
    let Some(defs) = find_defs(doc) else {
        return Vec::new();
    };

    doc.element_children(defs)
        .filter(|tag| doc.element(*tag).is_some_and(|el| el.is(INKSCAPE_NS, "tag")))
        .flat_map(|tag| doc.element_children(tag))
        .filter(|tagref| doc.element(*tagref).is_some_and(|el| el.is(INKSCAPE_NS, "tagref")))
        .collect()
}

pub fn has_tagrefs(doc: &Document) -> bool {
    !tagrefs(doc).is_empty()
}

/// Id referenced by a tagref's `xlink:href`, without the leading `#`.
fn target_id(doc: &Document, tagref: NodeKey) -> Option<String> {
    let href = doc.element(tagref)?.attr(Some(XLINK_NS), "href")?;
    let id = href.strip_prefix('#').unwrap_or(href);
    if id.is_empty() { None } else { Some(id.to_string()) }
}

/// Repair every tagref whose target id is missing from `doc`.
pub fn repair(doc: &mut Document, mode: RepairMode) -> RepairReport {
    let mut report = RepairReport::default();

    for tagref in tagrefs(doc) {
        let target = target_id(doc, tagref);
        if let Some(id) = target.as_deref() {
            if doc.get_element_by_id(id).is_some() {
                continue;
            }
        }

        match (mode, target) {
            (RepairMode::Placeholder, Some(id)) => {
                let root = doc.root();
                if let Some(ghost) = doc.append_element(root, "path") {
                    doc.set_attr(ghost, "d", "M 0,0 Z");
                    doc.set_attr(ghost, "id", id.clone());
                    tracing::debug!(id = %id, "tagref placeholder created");
                    report.placeholders.push(id);
                }
            }
            // without an href there is nothing to recreate
            (_, target) => {
                doc.remove(tagref);
                let id = target.unwrap_or_default();
                tracing::debug!(id = %id, "dangling tagref purged");
                report.purged.push(id);
            }
        }
    }

    report
}
