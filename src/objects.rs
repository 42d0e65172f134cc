//! Per-entity adapters binding a collector document to a template slot.

use crate::events::{ClassEndEvent, InterfaceEndEvent, TraitEndEvent};
use crate::wrapper::{SRC_NAMESPACE, XmlWrapper};
use doxweave_dom::Document;
use std::sync::Arc;

/// The kinds of documented entities that get a page of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Class,
    Interface,
    Trait,
}

impl ObjectKind {
    /// Base name of the template rendering one entity of this kind.
    pub fn template_name(self) -> &'static str {
        match self {
            ObjectKind::Class => "class",
            ObjectKind::Interface => "interface",
            ObjectKind::Trait => "trait",
        }
    }

    /// Directory below the output root that receives the rendered pages.
    pub fn output_subdir(self) -> &'static str {
        match self {
            ObjectKind::Class => "classes",
            ObjectKind::Interface => "interfaces",
            ObjectKind::Trait => "traits",
        }
    }

    /// Name the entity is exposed under inside its template.
    pub fn var_name(self) -> &'static str {
        self.template_name()
    }
}

pub trait ObjectAdapter {
    fn kind(&self) -> ObjectKind;

    fn var_name(&self) -> &'static str {
        self.kind().var_name()
    }

    /// Fully qualified name, used to name the output file.
    fn object_name(&self) -> String;

    fn value(&self) -> &XmlWrapper;
}

/// The document element of a collector unit file.
#[derive(Debug, Clone)]
struct UnitXml {
    xml: XmlWrapper,
}

impl UnitXml {
    fn new(doc: &Arc<Document>) -> Self {
        UnitXml {
            xml: XmlWrapper::from_document(Arc::clone(doc), SRC_NAMESPACE),
        }
    }

    /// The `full` attribute of the root element, read directly so a child
    /// element named `full` can never stand in for it.
    fn full_name(&self) -> String {
        self.xml
            .as_raw_node()
            .and_then(|node| node.element())
            .and_then(|element| element.attribute(None, "full"))
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ClassObject(UnitXml);

impl ClassObject {
    pub fn new(event: &ClassEndEvent) -> Self {
        ClassObject(UnitXml::new(&event.class))
    }
}

impl ObjectAdapter for ClassObject {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Class
    }

    fn object_name(&self) -> String {
        self.0.full_name()
    }

    fn value(&self) -> &XmlWrapper {
        &self.0.xml
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceObject(UnitXml);

impl InterfaceObject {
    pub fn new(event: &InterfaceEndEvent) -> Self {
        InterfaceObject(UnitXml::new(&event.interface))
    }
}

impl ObjectAdapter for InterfaceObject {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Interface
    }

    fn object_name(&self) -> String {
        self.0.full_name()
    }

    fn value(&self) -> &XmlWrapper {
        &self.0.xml
    }
}

#[derive(Debug, Clone)]
pub struct TraitObject(UnitXml);

impl TraitObject {
    pub fn new(event: &TraitEndEvent) -> Self {
        TraitObject(UnitXml::new(&event.unit))
    }
}

impl ObjectAdapter for TraitObject {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Trait
    }

    fn object_name(&self) -> String {
        self.0.full_name()
    }

    fn value(&self) -> &XmlWrapper {
        &self.0.xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(xml: &str) -> Arc<Document> {
        Arc::new(Document::parse(xml).unwrap())
    }

    #[test]
    fn test_class_adapter() {
        let event = ClassEndEvent {
            class: doc(r#"<class xmlns="http://xml.phpdox.net/src" name="Service" full="App\Service"/>"#),
        };
        let class = ClassObject::new(&event);
        assert_eq!(class.var_name(), "class");
        assert_eq!(class.object_name(), "App\\Service");
        assert_eq!(class.value().get("name").unwrap().as_text(), "Service");
    }

    #[test]
    fn test_trait_adapter_uses_its_own_slot() {
        let event = TraitEndEvent {
            unit: doc(r#"<trait xmlns="http://xml.phpdox.net/src" full="App\Loggable"/>"#),
        };
        let adapter = TraitObject::new(&event);
        assert_eq!(adapter.var_name(), "trait");
        assert_eq!(adapter.kind().output_subdir(), "traits");
        assert_eq!(adapter.object_name(), "App\\Loggable");
    }

    #[test]
    fn test_object_name_ignores_child_elements() {
        let event = InterfaceEndEvent {
            interface: doc(r#"<interface xmlns="http://xml.phpdox.net/src"><full>Not\This</full></interface>"#),
        };
        let adapter = InterfaceObject::new(&event);
        assert_eq!(adapter.var_name(), "interface");
        assert_eq!(adapter.object_name(), "");
        // The resolution policy would have found the child.
        assert_eq!(adapter.value().get("full").unwrap().as_text(), "Not\\This");
    }
}
