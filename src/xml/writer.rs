use super::attributes::AttributeMap;
use super::element::Element;
use crate::model::{NodeKind, ProcessModel, ProcessNode, XmlDefineType, XmlResultType};
use itertools::Itertools;

impl ProcessNode {
    /// The attributes this node is written with.
    pub fn attributes(&self) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        attributes.insert_opt("id", self.id());
        attributes.insert_opt("label", self.label());
        attributes.insert_opt("x", (!self.x().is_nan()).then_some(self.x()));
        attributes.insert_opt("y", (!self.y().is_nan()).then_some(self.y()));
        if self.max_predecessor_count() == Some(1) {
            attributes.insert_opt("predecessor", self.predecessors().iter().next());
        }
        match self.kind() {
            NodeKind::Split(bounds) | NodeKind::Join(bounds) => {
                attributes.insert("min", bounds.min.to_string());
                attributes.insert("max", bounds.max.to_string());
            }
            NodeKind::Activity(activity) => attributes.insert_opt("name", activity.name.as_deref()),
            NodeKind::Start | NodeKind::End => {}
        }
        attributes
    }

    pub fn to_element(&self) -> Element {
        let mut element = with_attributes(Element::new(self.kind().name()), self.attributes());
        if let Some(condition) = self.as_activity().and_then(|activity| activity.condition.as_deref()) {
            element = element.with_child(Element::new("condition").with_text(condition));
        }
        if self.max_predecessor_count().is_none() {
            for predecessor in self.predecessors() {
                element = element.with_child(Element::new("predecessor").with_text(predecessor.as_str()));
            }
        }
        element
            .children
            .extend(self.results().iter().map(|result| result_element("result", result)));
        element
            .children
            .extend(self.defines().iter().map(|define| define_element("define", define)));
        element
    }
}

impl ProcessModel {
    /// The attributes of the root element.
    pub fn attributes(&self) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        attributes.insert_opt("name", self.name());
        attributes.insert_opt("owner", self.owner());
        attributes.insert_opt("uuid", self.uuid());
        if !self.roles().is_empty() {
            attributes.insert("roles", self.roles().iter().join(","));
        }
        attributes
    }

    pub fn to_element(&self) -> Element {
        let mut root = with_attributes(Element::new("processModel"), self.attributes());
        root.children
            .extend(self.imports().iter().map(|import| result_element("import", import)));
        root.children
            .extend(self.exports().iter().map(|export| define_element("export", export)));
        root.children.extend(self.nodes().map(ProcessNode::to_element));
        root
    }
}

fn with_attributes(element: Element, attributes: AttributeMap) -> Element {
    attributes
        .into_iter()
        .fold(element, |element, (name, value)| element.with_attribute(name, value))
}

fn result_element(name: &str, result: &XmlResultType) -> Element {
    let mut attributes = AttributeMap::new();
    attributes.insert("name", result.name.as_str());
    attributes.insert_opt("path", result.path.as_deref());
    with_attributes(Element::new(name), attributes).with_text(result.content.as_str())
}

fn define_element(name: &str, define: &XmlDefineType) -> Element {
    let mut attributes = AttributeMap::new();
    attributes.insert("name", define.name.as_str());
    attributes.insert_opt("refnode", define.ref_node.as_deref());
    attributes.insert_opt("refname", define.ref_name.as_deref());
    attributes.insert_opt("path", define.path.as_deref());
    with_attributes(Element::new(name), attributes).with_text(define.content.as_str())
}
