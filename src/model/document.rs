//! Owned, editable SVG document.
//!
//! Nodes live in a slot-map arena; each element keeps its qualified name
//! and attributes exactly as read so that serialisation reproduces the
//! input apart from deliberate edits. Namespaces are resolved once at parse
//! time and matched by URI.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use quick_xml::Writer;
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use regex::Regex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{PathOpsError, Result};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
pub const SODIPODI_NS: &str = "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written, including any prefix.
    pub qname: String,
    pub ns: Option<String>,
    pub local: String,
    pub value: String,
    /// Escaped value as read; `None` once the value is edited.
    pub raw: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub qname: String,
    pub ns: Option<String>,
    pub local: String,
    pub attributes: Vec<Attribute>,
}

impl Element {
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.local == local && self.ns.as_deref() == Some(ns)
    }

    pub fn attr(&self, ns: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local == local && a.ns.as_deref() == ns)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, ns: Option<&str>, local: &str) -> bool {
        self.attr(ns, local).is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr(None, "id")
    }

    /// Set an un-namespaced attribute, keeping its position when it exists.
    pub fn set_attr(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|a| a.local == local && a.ns.is_none())
        {
            Some(existing) => {
                existing.value = value;
                existing.raw = None;
            }
            None => self.attributes.push(Attribute {
                qname: local.to_string(),
                ns: None,
                local: local.to_string(),
                value,
                raw: None,
            }),
        }
    }

    fn prefix(&self) -> Option<&str> {
        self.qname.split_once(':').map(|(prefix, _)| prefix)
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(Element),
    /// Text, comments, CDATA and processing instructions, kept verbatim.
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
    prologue: Vec<Event<'static>>,
    epilogue: Vec<Event<'static>>,
    ids: HashMap<String, NodeKey>,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| PathOpsError::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Parse raw input. Anything other than UTF-8 is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| PathOpsError::Xml(format!("document is not valid UTF-8: {e}")))?;
        Self::parse(text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(text);
        let mut nodes: SlotMap<NodeKey, Node> = SlotMap::with_key();
        let mut root: Option<NodeKey> = None;
        let mut stack: Vec<NodeKey> = Vec::new();
        let mut prologue = Vec::new();
        let mut epilogue = Vec::new();
        let mut entities = Entities::default();

        loop {
            let (resolved, event) = reader.read_resolved_event()?;
            let ns = entities.namespace(resolved);

            if let Event::DocType(doctype) = &event {
                entities.declare(&String::from_utf8_lossy(doctype));
            }

            match event {
                Event::Start(ref start) | Event::Empty(ref start) => {
                    let element = read_element(&reader, &entities, ns, start)?;
                    let parent = stack.last().copied();
                    if parent.is_none() && root.is_some() {
                        return Err(PathOpsError::Xml(
                            "document has more than one root element".to_string(),
                        ));
                    }

                    let key = nodes.insert(Node {
                        parent,
                        children: Vec::new(),
                        kind: NodeKind::Element(element),
                    });
                    match parent {
                        Some(parent) => nodes[parent].children.push(key),
                        None => root = Some(key),
                    }
                    if matches!(event, Event::Start(_)) {
                        stack.push(key);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => break,
                other => {
                    let other = other.into_owned();
                    match (stack.last().copied(), root) {
                        (Some(parent), _) => {
                            let key = nodes.insert(Node {
                                parent: Some(parent),
                                children: Vec::new(),
                                kind: NodeKind::Other(other),
                            });
                            nodes[parent].children.push(key);
                        }
                        (None, None) => prologue.push(other),
                        (None, Some(_)) => epilogue.push(other),
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(PathOpsError::Xml("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| PathOpsError::Xml("document has no root element".to_string()))?;

        let mut doc = Self {
            nodes,
            root,
            prologue,
            epilogue,
            ids: HashMap::new(),
        };
        doc.reindex();
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| PathOpsError::io(path, e))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prologue {
            writer.write_event(event.clone()).map_err(xml_write_error)?;
        }
        self.write_node(&mut writer, self.root)?;
        for event in &self.epilogue {
            writer.write_event(event.clone()).map_err(xml_write_error)?;
        }
        Ok(writer.into_inner())
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn element(&self, key: NodeKey) -> Option<&Element> {
        match &self.nodes.get(key)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Other(_) => None,
        }
    }

    pub fn element_mut(&mut self, key: NodeKey) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(key)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Other(_) => None,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key)?.parent
    }

    /// Element children of `key`, in document order.
    pub fn element_children(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.nodes
            .get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Depth-first, pre-order walk over `from` and every element below it.
    pub fn descendants(&self, from: NodeKey) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![from],
        }
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeKey> {
        self.ids.get(id).copied()
    }

    pub fn id_count(&self) -> usize {
        self.ids.len()
    }

    /// Append a new empty element to `parent`, in the parent's namespace.
    pub fn append_element(&mut self, parent: NodeKey, local: &str) -> Option<NodeKey> {
        let parent_el = self.element(parent)?;
        let qname = match parent_el.prefix() {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        };
        let element = Element {
            qname,
            ns: parent_el.ns.clone(),
            local: local.to_string(),
            attributes: Vec::new(),
        };

        let key = self.nodes.insert(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind: NodeKind::Element(element),
        });
        self.nodes[parent].children.push(key);
        Some(key)
    }

    /// Set an attribute, keeping the id index in step when `id` changes.
    pub fn set_attr(&mut self, key: NodeKey, local: &str, value: impl Into<String>) {
        let Some(element) = self.element_mut(key) else {
            return;
        };
        element.set_attr(local, value);
        if local == "id" {
            self.reindex();
        }
    }

    /// Detach `key` and drop its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        let Some(parent) = self.parent(key) else {
            return false;
        };
        self.nodes[parent].children.retain(|child| *child != key);

        let mut doomed = vec![key];
        while let Some(next) = doomed.pop() {
            if let Some(node) = self.nodes.remove(next) {
                doomed.extend(node.children);
            }
        }

        self.reindex();
        true
    }

    /// Rebuild the id index. With duplicate ids the first in document order wins.
    fn reindex(&mut self) {
        let mut ids = HashMap::new();
        for key in self.descendants(self.root) {
            if let Some(id) = self.element(key).and_then(Element::id) {
                ids.entry(id.to_string()).or_insert(key);
            }
        }
        self.ids = ids;
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, key: NodeKey) -> Result<()> {
        let node = &self.nodes[key];
        match &node.kind {
            NodeKind::Other(event) => {
                writer.write_event(event.clone()).map_err(xml_write_error)?;
            }
            NodeKind::Element(element) => {
                let mut start = BytesStart::new(element.qname.as_str());
                for attr in &element.attributes {
                    match &attr.raw {
                        Some(raw) => start.push_attribute(XmlAttribute::from((
                            attr.qname.as_bytes(),
                            raw.as_bytes(),
                        ))),
                        None => start.push_attribute((attr.qname.as_str(), attr.value.as_str())),
                    }
                }

                if node.children.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(xml_write_error)?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(xml_write_error)?;
                    for child in &node.children {
                        self.write_node(writer, *child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(element.qname.as_str())))
                        .map_err(xml_write_error)?;
                }
            }
        }
        Ok(())
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeKey>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.stack.pop()?;
        let children: Vec<NodeKey> = self.doc.element_children(key).collect();
        self.stack.extend(children.into_iter().rev());
        Some(key)
    }
}

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([^\s%"']+)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).expect("valid entity regex")
});

/// Internal entities declared in the DOCTYPE, on top of the predefined XML ones.
#[derive(Debug, Default)]
struct Entities(HashMap<String, String>);

impl Entities {
    fn declare(&mut self, doctype: &str) {
        for caps in ENTITY_RE.captures_iter(doctype) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            self.0.entry(caps[1].to_string()).or_insert_with(|| value.to_string());
        }
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .or_else(|| resolve_predefined_entity(name))
    }

    fn unescape(&self, raw: &str) -> Result<String> {
        unescape_with(raw, |name| self.resolve(name))
            .map(|value| value.into_owned())
            .map_err(|e| PathOpsError::Xml(e.to_string()))
    }

    /// Namespace URIs are bound from the raw `xmlns` value, so entities are expanded here.
    fn namespace(&self, resolved: ResolveResult<'_>) -> Option<String> {
        match resolved {
            ResolveResult::Bound(Namespace(ns)) => {
                let raw = String::from_utf8_lossy(ns);
                Some(self.unescape(&raw).unwrap_or_else(|_| raw.into_owned()))
            }
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        }
    }
}

fn read_element(
    reader: &NsReader<&[u8]>,
    entities: &Entities,
    ns: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        attributes.push(Attribute {
            qname: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            ns: entities.namespace(resolved),
            local: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: entities.unescape(&raw)?,
            raw: Some(raw),
        });
    }

    Ok(Element {
        qname: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ns,
        local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
    })
}

fn xml_write_error(e: impl std::fmt::Display) -> PathOpsError {
    PathOpsError::Xml(e.to_string())
}
