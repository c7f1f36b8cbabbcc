//! # Gamelist Document Codec
//!
//! Gamelists and recovery fragments share one XML shape:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <gameList parentHash="1234">
//!   <game>
//!     <path>./mario.nes</path>
//!     <favorite>true</favorite>
//!   </game>
//!   <folder>
//!     <path>./sub</path>
//!     <desc>...</desc>
//!   </folder>
//! </gameList>
//! ```
//!
//! The store never needs streaming access or namespaces, so documents are
//! read into a small ordered [`Element`] tree with `quick-xml`'s event
//! reader and written back with its indenting writer. Element order is
//! preserved, which keeps "remove then re-append" saves stable for entries
//! that were not touched.

use crate::error::DocumentError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

pub const ROOT_TAG: &str = "gameList";
pub const GAME_TAG: &str = "game";
pub const FOLDER_TAG: &str = "folder";
pub const PATH_TAG: &str = "path";
pub const PARENT_HASH_ATTR: &str = "parentHash";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces an existing attribute in place, or appends it.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    pub fn push_text_child(&mut self, name: &str, text: impl Into<String>) {
        self.children.push(Element::with_text(name, text));
    }

    /// Drops every direct child called `name`, returning how many went.
    pub fn remove_children_named(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.name != name);
        before - self.children.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// An empty `<gameList/>` document.
    pub fn new() -> Self {
        Self {
            root: Element::new(ROOT_TAG),
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(bytes)?;
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| DocumentError::Unbalanced(String::new()))?;
                    // indentation between child elements; leaf text stays verbatim
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(DocumentError::Unbalanced(open.name));
        }
        root.map(|root| Self { root })
            .ok_or(DocumentError::MissingRoot)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_element(&mut writer, &self.root)?;
        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, DocumentError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DocumentError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DocumentError::MultipleRoots),
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !element.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&element.text)))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<gameList parentHash="42">
  <game>
    <path>./mario.nes</path>
    <name>Super Mario &amp; Friends</name>
    <unknownTag>ignored by the record, kept by the codec</unknownTag>
  </game>
  <folder><path>./sub</path></folder>
</gameList>
"#;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let doc = Document::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root.name, ROOT_TAG);
        assert_eq!(doc.root.attr(PARENT_HASH_ATTR), Some("42"));
        assert_eq!(doc.root.children.len(), 2);

        let game = &doc.root.children[0];
        assert_eq!(game.name, GAME_TAG);
        assert_eq!(game.child_text(PATH_TAG), Some("./mario.nes"));
        assert_eq!(game.child_text("name"), Some("Super Mario & Friends"));
        assert_eq!(doc.root.children[1].child_text(PATH_TAG), Some("./sub"));
    }

    #[test]
    fn written_documents_parse_back_identically() {
        let mut doc = Document::new();
        doc.root.set_attr(PARENT_HASH_ATTR, "0");
        let mut game = Element::new(GAME_TAG);
        game.push_text_child(PATH_TAG, "./a <b>.nes");
        game.push_text_child("desc", "Line one\nLine \"two\"");
        doc.root.children.push(game);
        doc.root.children.push(Element::new(FOLDER_TAG));

        let bytes = doc.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("&lt;b&gt;"));

        assert_eq!(Document::parse(&bytes).unwrap(), doc);
    }

    #[test]
    fn leaf_text_keeps_its_whitespace() {
        let desc = "  Indented first line\nsecond\n";
        let mut doc = Document::new();
        let mut game = Element::new(GAME_TAG);
        game.push_text_child(PATH_TAG, "./mario.nes");
        game.push_text_child("desc", desc);
        doc.root.children.push(game);

        let parsed = Document::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.root.text, "");
        assert_eq!(parsed.root.children[0].text, "");
        assert_eq!(parsed.root.children[0].child_text("desc"), Some(desc));

        let handwritten = b"<gameList>\n  <game>\n    <name> padded </name>\n  </game>\n</gameList>";
        let parsed = Document::parse(handwritten).unwrap();
        assert_eq!(parsed.root.children[0].child_text("name"), Some(" padded "));
    }

    #[test]
    fn set_attr_replaces_existing_value() {
        let mut element = Element::new(ROOT_TAG);
        element.set_attr(PARENT_HASH_ATTR, "1");
        element.set_attr(PARENT_HASH_ATTR, "2");
        assert_eq!(element.attributes.len(), 1);
        assert_eq!(element.attr(PARENT_HASH_ATTR), Some("2"));
    }

    #[test]
    fn truncated_document_is_rejected() {
        let result = Document::parse(b"<gameList><game><path>./x.nes</path>");
        assert!(result.is_err());
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(
            Document::parse(b"   "),
            Err(DocumentError::MissingRoot)
        ));
    }

    #[test]
    fn mismatched_end_tag_is_rejected() {
        assert!(Document::parse(b"<gameList><game></folder></gameList>").is_err());
    }

    #[test]
    fn remove_children_counts_removed() {
        let mut game = Element::new(GAME_TAG);
        game.push_text_child("name", "a");
        game.push_text_child(PATH_TAG, "./a");
        game.push_text_child("name", "b");
        assert_eq!(game.remove_children_named("name"), 2);
        assert_eq!(game.children.len(), 1);
    }
}
