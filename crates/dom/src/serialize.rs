//! Serialization of single nodes and their subtrees back to XML text.

use crate::document::{Document, Element, Namespace, NodeId, NodeKey, NodeKind};
use crate::error::DomError;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::escape::escape;

pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Serializes the node identified by `key`.
///
/// An element becomes a self-contained fragment: every namespace in scope is
/// declared on its start tag. An attribute becomes `name="value"`.
pub(crate) fn to_xml_string(doc: &Document, key: NodeKey) -> Result<String, DomError> {
    if !doc.contains(key) {
        return Err(DomError::UnknownNode(key));
    }
    if let NodeKey::Attribute(owner, idx) = key {
        let attr = doc.attribute(owner, idx).ok_or(DomError::UnknownNode(key))?;
        return Ok(format!("{}=\"{}\"", attr.name.qualified(), escape(attr.value.as_str())));
    }

    let mut writer = Writer::new(Vec::new());
    write_node(doc, key.owner(), &[], &mut writer)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(
    doc: &Document,
    id: NodeId,
    inherited: &[Namespace],
    writer: &mut Writer<Vec<u8>>,
) -> Result<(), DomError> {
    match doc.kind(id) {
        NodeKind::Root => {
            for &child in doc.children(id) {
                write_node(doc, child, &[], writer)?;
            }
        }
        NodeKind::Element(element) => write_element(doc, id, element, inherited, writer)?,
        NodeKind::Text(text) => write_event(writer, Event::Text(BytesText::new(text)))?,
        NodeKind::Comment(text) => write_event(writer, Event::Comment(BytesText::from_escaped(text.as_str())))?,
        NodeKind::ProcessingInstruction { target, value } => {
            let content = match value {
                Some(value) => format!("{} {}", target, value),
                None => target.clone(),
            };
            write_event(writer, Event::PI(BytesPI::new(content)))?;
        }
    }
    Ok(())
}

fn write_element(
    doc: &Document,
    id: NodeId,
    element: &Element,
    inherited: &[Namespace],
    writer: &mut Writer<Vec<u8>>,
) -> Result<(), DomError> {
    let name = element.name.qualified();
    let mut start = BytesStart::new(name.as_str());

    // Declare only the bindings the parent did not already have.
    for ns in element.namespaces.iter().filter(|ns| !inherited.contains(ns)) {
        let attr_name = match &ns.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        start.push_attribute((attr_name.as_str(), ns.uri.as_str()));
    }
    // An unprefixed element without a namespace under a default namespace.
    if element.name.namespace().is_none()
        && element.name.prefix().is_none()
        && inherited.iter().any(|ns| ns.prefix.is_none())
        && !element.namespaces.iter().any(|ns| ns.prefix.is_none())
    {
        start.push_attribute(("xmlns", ""));
    }
    for attr in &element.attributes {
        start.push_attribute((attr.name.qualified().as_str(), attr.value.as_str()));
    }

    let children = doc.children(id);
    if children.is_empty() {
        return write_event(writer, Event::Empty(start));
    }
    write_event(writer, Event::Start(start))?;
    for &child in children {
        write_node(doc, child, &element.namespaces, writer)?;
    }
    write_event(writer, Event::End(BytesEnd::new(name.as_str())))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), DomError> {
    writer
        .write_event(event)
        .map_err(|e| DomError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, NodeKey};

    const XML: &str = r#"<class xmlns="urn:src" name="A &amp; B"><member name="m">x &lt; y</member><!--note--><plain xmlns=""/></class>"#;

    #[test]
    fn test_element_roundtrips_with_namespace_declared_once() {
        let doc = Document::parse(XML).unwrap();
        let class = doc.root_element().unwrap();
        let xml = doc.node(class, NodeKey::Node(class)).to_xml_string().unwrap();
        assert_eq!(
            xml,
            r#"<class xmlns="urn:src" name="A &amp; B"><member name="m">x &lt; y</member><!--note--><plain xmlns=""/></class>"#
        );
    }

    #[test]
    fn test_nested_element_declares_inherited_namespaces() {
        let doc = Document::parse(XML).unwrap();
        let class = doc.root_element().unwrap();
        let member = doc.child_elements(class).next().unwrap().0;
        let xml = doc.node(member, NodeKey::Node(member)).to_xml_string().unwrap();
        assert_eq!(xml, r#"<member xmlns="urn:src" name="m">x &lt; y</member>"#);
    }

    #[test]
    fn test_attribute_serializes_as_pair() {
        let doc = Document::parse(XML).unwrap();
        let class = doc.root_element().unwrap();
        let xml = doc.node(class, NodeKey::Attribute(class, 0)).to_xml_string().unwrap();
        assert_eq!(xml, r#"name="A &amp; B""#);
    }
}
