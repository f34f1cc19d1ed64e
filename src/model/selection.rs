use std::collections::HashSet;

use crate::model::document::{Document, Element, NodeKey};
use crate::model::element::{does_pathops, is_group, is_image, is_modifiable_path, is_path};

/// Eligible elements reached from the host selection, deduplicated.
#[derive(Debug, Default)]
pub struct Selection {
    keys: Vec<NodeKey>,
}

/// Selection in document (paint) order, split into the top-most element and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordered {
    pub top: String,
    pub others: Vec<String>,
}

impl Selection {
    /// Expand the selected ids into operable elements.
    ///
    /// Groups are expanded recursively, or only the directly selected groups
    /// when `recursive` is false. Group containers themselves are never kept,
    /// nor are elements without an id.
    pub fn collect(doc: &Document, selected: &[String], recursive: bool) -> Self {
        // 0: unlimited, 1: selected groups only
        let level = if recursive { 0 } else { 1 };
        let mut keys = Vec::new();
        let mut seen = HashSet::new();

        for id in selected {
            match doc.get_element_by_id(id) {
                Some(key) => visit(doc, key, level, 0, &mut keys, &mut seen),
                None => tracing::debug!(id = %id, "selected id not found in document"),
            }
        }

        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    /// Sort by document order and take the last element as top.
    ///
    /// Returns `None` when fewer than two distinct ids are eligible.
    pub fn into_ordered(self, doc: &Document) -> Option<Ordered> {
        let ids: Vec<String> = self
            .keys
            .iter()
            .filter_map(|key| doc.element(*key).and_then(Element::id))
            .map(str::to_string)
            .collect();

        let mut others = z_sort(doc, &ids);
        if others.len() < 2 {
            return None;
        }
        let top = others.pop()?;
        Some(Ordered { top, others })
    }
}

fn visit(
    doc: &Document,
    key: NodeKey,
    level: usize,
    current: usize,
    out: &mut Vec<NodeKey>,
    seen: &mut HashSet<NodeKey>,
) {
    let current = current + 1;
    let Some(el) = doc.element(key) else {
        return;
    };

    if is_group(el) && (level == 0 || current <= level) {
        for child in doc.element_children(key) {
            visit(doc, child, level, current, out, seen);
        }
    }

    if !does_pathops(el) {
        if is_image(el) {
            tracing::debug!(id = ?el.id(), "skipping image, not supported by path operations");
        }
        return;
    }

    let Some(id) = el.id() else {
        tracing::debug!(element = %el.qname, "skipping element without id");
        return;
    };

    if is_path(el) && !is_modifiable_path(el) {
        tracing::debug!(id = %id, "path effect or custom shape is flattened by the operation");
    }

    if seen.insert(key) {
        out.push(key);
    }
}

/// Order `ids` by a depth-first walk of the whole document.
pub fn z_sort(doc: &Document, ids: &[String]) -> Vec<String> {
    let mut pending: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut ordered = Vec::with_capacity(pending.len());

    for key in doc.descendants(doc.root()) {
        if pending.is_empty() {
            break;
        }
        let Some(id) = doc.element(key).and_then(Element::id) else {
            continue;
        };
        if pending.remove(id) {
            ordered.push(id.to_string());
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAWING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <rect id="r1"/>
  <g id="g1">
    <path id="p1" d="M 0,0 H 1"/>
    <g id="g2">
      <circle id="c1"/>
      <text id="t1">x</text>
    </g>
    <image id="i1"/>
    <path d="M 1,1 H 2"/>
  </g>
  <ellipse id="e1"/>
  <g id="g3"/>
</svg>"#;

    fn ids(doc: &Document, sel: &Selection) -> Vec<String> {
        sel.keys()
            .iter()
            .map(|k| doc.element(*k).unwrap().id().unwrap().to_string())
            .collect()
    }

    fn select(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recursive_expansion_excludes_groups() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["g1"]), true);
        assert_eq!(ids(&doc, &sel), vec!["p1", "c1", "t1"]);
    }

    #[test]
    fn one_level_expansion_skips_nested_groups() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["g1"]), false);
        assert_eq!(ids(&doc, &sel), vec!["p1"]);
    }

    #[test]
    fn order_follows_document_not_selection() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["e1", "g2", "r1"]), true);
        let ordered = sel.into_ordered(&doc).unwrap();
        assert_eq!(ordered.top, "e1");
        assert_eq!(ordered.others, vec!["r1", "c1", "t1"]);
    }

    #[test]
    fn top_never_in_others() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["g1", "r1", "e1"]), true);
        let ordered = sel.into_ordered(&doc).unwrap();
        assert_eq!(ordered.top, "e1");
        assert!(!ordered.others.contains(&ordered.top));
        assert_eq!(ordered.others.len(), 4);
    }

    #[test]
    fn duplicates_count_once() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["p1", "g1", "p1"]), false);
        assert_eq!(sel.len(), 1);
        assert!(sel.into_ordered(&doc).is_none());
    }

    #[test]
    fn single_element_is_insufficient() {
        let doc = Document::parse(DRAWING).unwrap();
        let sel = Selection::collect(&doc, &select(&["r1"]), true);
        assert!(sel.into_ordered(&doc).is_none());

        let sel = Selection::collect(&doc, &select(&["g3", "i1", "missing"]), true);
        assert_eq!(sel.len(), 0);
        assert!(sel.into_ordered(&doc).is_none());
    }

    #[test]
    fn shared_id_counts_once() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="g"><rect id="a"/><rect id="a"/></g></svg>"#,
        )
        .unwrap();
        let sel = Selection::collect(&doc, &select(&["g"]), true);
        assert_eq!(sel.len(), 2);
        assert!(sel.into_ordered(&doc).is_none());
    }

    #[test]
    fn z_sort_reorders_and_drops_unknown() {
        let doc = Document::parse(DRAWING).unwrap();
        let sorted = z_sort(&doc, &select(&["e1", "nope", "p1", "r1"]));
        assert_eq!(sorted, vec!["r1", "p1", "e1"]);
    }
}
