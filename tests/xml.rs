//! Tests for reading and writing the XML form of process models.
mod common;
use common::{SAMPLE_XML, assert_reciprocal, create_linear_model, ids};
use procgraph::config::ModelConfig;
use procgraph::prelude::*;
use procgraph::xml::{AttributeMap, Element, NAMESPACE};

/// Everything structural about a node, for comparing models.
fn summary(model: &ProcessModel) -> Vec<(String, String, Vec<String>, Vec<String>)> {
    model
        .nodes()
        .map(|node| {
            (
                node.id().unwrap().to_string(),
                node.kind().name().to_string(),
                ids(node.predecessors()),
                ids(node.successors()),
            )
        })
        .collect()
}

fn wrap(body: &str) -> String {
    format!(r#"<pe:processModel xmlns:pe="{NAMESPACE}">{body}</pe:processModel>"#)
}

#[test]
fn test_read_sample_model() {
    let model = read_model(SAMPLE_XML).unwrap();

    assert_eq!(model.name(), Some("order"));
    assert_eq!(model.owner(), Some("alice"));
    assert_eq!(
        model.uuid().map(|uuid| uuid.to_string()),
        Some("5b2c8f52-4a5e-4c6e-9f5e-0f1d2c3b4a59".to_string())
    );
    assert_eq!(model.roles().len(), 2);
    assert!(model.roles().contains("manager"));

    assert_eq!(model.imports().len(), 1);
    assert_eq!(model.imports()[0].path.as_deref(), Some("/order/customer"));
    assert_eq!(model.imports()[0].content, "ACME");
    assert_eq!(model.exports()[0].ref_node.as_deref(), Some("price"));

    assert_eq!(model.len(), 6);
    assert!(model.unresolved_refs().is_empty());
    assert!(model.validate().is_empty());
    assert_reciprocal(&model);
}

#[test]
fn test_read_node_details() {
    let model = read_model(SAMPLE_XML).unwrap();

    let start = model.node_by_id("start").unwrap();
    assert_eq!((start.x(), start.y()), (10.0, 20.0));

    let fork = model.node_by_id("fork").unwrap();
    assert_eq!(fork.join_split().map(|b| (b.min, b.max)), Some((2, 2)));
    assert_eq!(ids(fork.successors()), vec!["price", "ship"]);

    let price = model.node_by_id("price").unwrap();
    assert_eq!(price.label(), Some("Price the order"));
    assert!(!price.has_position());
    let activity = price.as_activity().unwrap();
    assert_eq!(activity.name.as_deref(), Some("Price"));
    assert_eq!(activity.condition.as_deref(), Some("order.total > 0"));
    assert_eq!(price.results().len(), 1);
    assert_eq!(price.results()[0].name, "amount");

    let ship = model.node_by_id("ship").unwrap();
    assert_eq!(ship.defines()[0].ref_name.as_deref(), Some("address"));

    let merge = model.node_by_id("merge").unwrap();
    assert_eq!(ids(merge.predecessors()), vec!["price", "ship"]);
    assert_eq!(ids(merge.successors()), vec!["end"]);
}

#[test]
fn test_write_then_read_is_equivalent() {
    let model = read_model(SAMPLE_XML).unwrap();
    let written = write_model(&model).unwrap();
    assert!(written.contains(&format!(r#"xmlns:pe="{NAMESPACE}""#)));

    let reread = read_model(&written).unwrap();
    assert_eq!(summary(&reread), summary(&model));
    assert_eq!(reread.name(), model.name());
    assert_eq!(reread.uuid(), model.uuid());
    assert_eq!(reread.roles(), model.roles());
    assert_eq!(reread.imports(), model.imports());
    assert_eq!(reread.exports(), model.exports());
    for node in model.nodes() {
        let other = reread.node_by_id(node.id().unwrap()).unwrap();
        assert_eq!(other.kind(), node.kind());
        assert_eq!(other.label(), node.label());
        assert_eq!(other.results(), node.results());
        assert_eq!(other.defines(), node.defines());
    }
}

#[test]
fn test_built_model_round_trips() {
    let (model, _) = create_linear_model();
    let reread = read_model(&write_model(&model).unwrap()).unwrap();
    assert_eq!(summary(&reread), summary(&model));
}

#[test]
fn test_single_coordinate_round_trips() {
    let mut model = ProcessModel::new();
    let mut start = ProcessNode::start().with_id("s");
    start.set_position(10.0, f64::NAN);
    model.add_node(start).unwrap();
    let mut end = ProcessNode::end().with_id("e");
    end.set_position(f64::NAN, 3.5);
    model.add_node(end).unwrap();

    let written = write_model(&model).unwrap();
    assert!(written.contains(r#"x="10""#), "{written}");
    assert!(written.contains(r#"y="3.5""#), "{written}");

    let reread = read_model(&written).unwrap();
    let start = reread.node_by_id("s").unwrap();
    assert_eq!(start.x(), 10.0);
    assert!(start.y().is_nan());
    assert!(!start.has_position());
    let end = reread.node_by_id("e").unwrap();
    assert!(end.x().is_nan());
    assert_eq!(end.y(), 3.5);
}

#[test]
fn test_unknown_model_child_is_rejected() {
    let result = read_model(&wrap("<pe:start id=\"s\"/><pe:bogus/>"));
    assert_eq!(
        result.err(),
        Some(XmlError::UnhandledElement {
            parent: "processModel".to_string(),
            name: "bogus".to_string(),
        })
    );
}

#[test]
fn test_unknown_node_child_is_rejected() {
    let result = read_model(&wrap("<pe:activity id=\"a\"><pe:bogus/></pe:activity>"));
    assert_eq!(
        result.err(),
        Some(XmlError::UnhandledElement {
            parent: "activity".to_string(),
            name: "bogus".to_string(),
        })
    );
}

#[test]
fn test_foreign_elements_and_attributes_are_skipped() {
    let xml = r#"<pe:processModel xmlns:pe="http://adaptivity.nl/ProcessEngine/" xmlns:ui="urn:ui"
        ui:theme="dark" colour="blue">
      <ui:layout grid="8"/>
      <pe:start id="s" ui:colour="red" unknown="1"/>
    </pe:processModel>"#;
    let model = read_model(xml).unwrap();
    assert_eq!(model.len(), 1);
    assert!(model.node_by_id("s").is_some());
}

#[test]
fn test_wrong_root_is_rejected() {
    assert!(matches!(
        read_model("<model/>"),
        Err(XmlError::UnhandledElement { ref parent, ref name })
            if parent == "document" && name == "model"
    ));
}

#[test]
fn test_malformed_documents() {
    assert!(matches!(read_model(""), Err(XmlError::Parse(_))));
    assert!(matches!(
        read_model(&wrap("<pe:start></pe:end>")),
        Err(XmlError::Parse(_))
    ));
    assert_eq!(
        read_model(&wrap("<pe:start id=\"s\" x=\"left\"/>")).err(),
        Some(XmlError::InvalidValue {
            name: "x".to_string(),
            value: "left".to_string(),
        })
    );
    assert_eq!(
        read_model(&wrap("<pe:import path=\"/p\"/>")).err(),
        Some(XmlError::MissingAttribute {
            element: "import".to_string(),
            name: "name".to_string(),
        })
    );
}

#[test]
fn test_shared_predecessor_needs_deferred_fan_out() {
    let body = r#"<pe:start id="s"/>
        <pe:activity id="a" predecessor="s"/>
        <pe:activity id="b" predecessor="s"/>"#;

    assert!(matches!(
        read_model(&wrap(body)),
        Err(XmlError::Model(ModelError::IllegalProcessModel(_)))
    ));

    let config = ModelConfig {
        fan_out: FanOutPolicy::Deferred,
        ..ModelConfig::default()
    };
    let mut model = read_model_with(&wrap(body), config).unwrap();
    assert_eq!(model.node_by_id("s").unwrap().successors().len(), 2);

    model.normalize(&mut DefaultSplitFactory).unwrap();
    assert_eq!(model.node_by_id("s").unwrap().successors().len(), 1);
    assert!(model.validate().is_empty());
}

#[test]
fn test_dangling_predecessor_survives_reading() {
    let model = read_model(&wrap(r#"<pe:end id="e" predecessor="missing"/>"#)).unwrap();
    let dangling = model.unresolved_refs();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].1.as_str(), "missing");
}

#[test]
fn test_node_attribute_callbacks() {
    let mut node = ProcessNode::split(1, 1);
    assert_eq!(node.deserialize_attribute(None, "id", "fork"), Ok(true));
    assert_eq!(node.deserialize_attribute(None, "max", "3"), Ok(true));
    assert_eq!(node.deserialize_attribute(None, "name", "ignored"), Ok(false));
    assert_eq!(
        node.deserialize_attribute(Some("urn:other"), "id", "x"),
        Ok(false)
    );
    assert_eq!(node.id(), Some("fork"));
    assert_eq!(node.join_split().map(|b| b.max), Some(3));

    let attributes = node.attributes();
    assert_eq!(attributes.get("id"), Some("fork"));
    assert_eq!(attributes.get("min"), Some("1"));
    assert_eq!(attributes.get("max"), Some("3"));
    assert!(attributes.get("x").is_none());
}

#[test]
fn test_attribute_map_keeps_first_insertion_order() {
    let mut attributes = AttributeMap::new();
    attributes.insert("b", "1");
    attributes.insert("a", "2");
    attributes.insert("b", "3");
    attributes.insert_opt("c", None::<&str>);

    let pairs: Vec<_> = attributes.iter().collect();
    assert_eq!(pairs, vec![("b", "3"), ("a", "2")]);
    assert_eq!(attributes.remove("b"), Some("3".to_string()));
    assert_eq!(attributes.len(), 1);
}

#[test]
fn test_element_parse_resolves_namespaces() {
    let root = Element::parse(
        r#"<root xmlns:pe="http://adaptivity.nl/ProcessEngine/" plain="1"><pe:child pe:qualified="2">text &amp; more</pe:child></root>"#,
    )
    .unwrap();

    assert!(!root.in_namespace());
    assert_eq!(root.attribute("plain"), Some("1"));
    let child = &root.children[0];
    assert!(child.is("child"));
    assert_eq!(child.text, "text & more");
    assert_eq!(child.attributes[0].namespace.as_deref(), Some(NAMESPACE));
    assert!(child.attribute("qualified").is_none());
}
