//! Minimal XML emission and parse helpers.
//!
//! Emission goes through [`Element`], a small owning builder that writes
//! prefixed names literally and escapes text and attribute values. Parsing
//! is `roxmltree`; the helpers here smooth over the few lookup patterns the
//! codec needs (local-name matching, trimmed child text).

use std::fmt::Write as _;

/// An XML element under construction. Names are written as given, so
/// namespace prefixes (`soap-env:`, `cwmp:`) are part of the name.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Element with text content, in one call.
    pub fn text_node(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text(text)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Serialises the element tree with an XML declaration.
    pub fn into_document(self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(out, "<{}", self.name);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
        }
        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            let _ = write!(out, "{}</{}>\n", escape(text, false), self.name);
            return;
        }
        out.push('\n');
        for child in &self.children {
            child.write_into(out, depth + 1);
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        let _ = write!(out, "</{}>\n", self.name);
    }
}

fn escape(raw: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\'' if attribute => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// First element child whose local name matches.
pub fn first_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == local_name)
}

/// Trimmed text content of the first matching element child.
pub fn child_text(node: roxmltree::Node<'_, '_>, local_name: &str) -> Option<String> {
    first_child(node, local_name).map(|child| child.text().unwrap_or_default().trim().to_owned())
}

/// All element children, skipping text and comment nodes.
pub fn element_children<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children().filter(roxmltree::Node::is_element)
}

/// Attribute lookup by local name, ignoring the prefix.
pub fn attribute<'a>(node: roxmltree::Node<'a, '_>, local_name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|attr| attr.name() == local_name)
        .map(|attr| attr.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        let doc = Element::new("Root")
            .attr("note", "a \"quoted\" & <odd> value")
            .child(Element::text_node("Leaf", "1 < 2 & 3 > 2"))
            .into_document();
        assert!(doc.contains("a &quot;quoted&quot; &amp; &lt;odd&gt; value"));
        assert!(doc.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn empty_element_self_closes() {
        let doc = Element::new("cwmp:GetRPCMethods").into_document();
        assert!(doc.contains("<cwmp:GetRPCMethods/>"));
    }

    #[test]
    fn helpers_find_children_by_local_name() {
        let xml = r#"<a xmlns:x="urn:x"><x:b>  hello  </x:b><c/></a>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        assert_eq!(child_text(root, "b").as_deref(), Some("hello"));
        assert!(first_child(root, "c").is_some());
        assert_eq!(element_children(root).count(), 2);
    }
}
