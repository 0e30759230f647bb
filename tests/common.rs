//! Common test utilities for building process models and documents.
use procgraph::prelude::*;

/// Keys of the `start -> work -> end` model built by [`create_linear_model`].
#[allow(dead_code)]
pub struct Linear {
    pub start: NodeKey,
    pub work: NodeKey,
    pub end: NodeKey,
}

/// Builds `start -> work -> end` through successor edits only.
#[allow(dead_code)]
pub fn create_linear_model() -> (ProcessModel, Linear) {
    let mut model = ProcessModel::builder().name("linear").build();
    let start = model
        .add_node(ProcessNode::start().with_id("start"))
        .unwrap();
    model
        .add_successor(start, ProcessNode::activity().with_id("work"))
        .unwrap();
    let work = model.key_of("work").unwrap();
    model
        .add_successor(work, ProcessNode::end().with_id("end"))
        .unwrap();
    let end = model.key_of("end").unwrap();
    (model, Linear { start, work, end })
}

/// Builds a model where the activity `work` fans out to `end1` and `end2` directly,
/// which only a deferred fan-out policy allows.
#[allow(dead_code)]
pub fn create_fan_out_model() -> ProcessModel {
    let mut model = ProcessModel::builder()
        .name("fan-out")
        .fan_out(FanOutPolicy::Deferred)
        .build();
    let start = model
        .add_node(ProcessNode::start().with_id("start"))
        .unwrap();
    let work = model
        .add_node(ProcessNode::activity().with_id("work"))
        .unwrap();
    model.add_successor(start, work).unwrap();
    model
        .add_successor(work, ProcessNode::end().with_id("end1"))
        .unwrap();
    model
        .add_successor(work, ProcessNode::end().with_id("end2"))
        .unwrap();
    model
}

/// Ids of the entries of a link set, in insertion order.
#[allow(dead_code)]
pub fn ids(set: &IdentifiableSet<NodeRef>) -> Vec<String> {
    set.iter().map(|reference| reference.as_str().to_string()).collect()
}

/// Checks that every link is recorded on both of its ends.
#[allow(dead_code)]
pub fn assert_reciprocal(model: &ProcessModel) {
    for node in model.nodes() {
        let id = node.id().unwrap();
        for successor in node.successors() {
            let other = model
                .get_node(successor)
                .unwrap_or_else(|| panic!("'{id}' has a dangling successor '{successor}'"));
            assert!(
                other.predecessors().contains_id(Some(id)),
                "'{}' does not list '{id}' as predecessor",
                successor
            );
        }
        for predecessor in node.predecessors() {
            let other = model
                .get_node(predecessor)
                .unwrap_or_else(|| panic!("'{id}' has a dangling predecessor '{predecessor}'"));
            assert!(
                other.successors().contains_id(Some(id)),
                "'{}' does not list '{id}' as successor",
                predecessor
            );
        }
    }
}

/// A small document exercising every element the reader knows.
#[allow(dead_code)]
pub const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<pe:processModel xmlns:pe="http://adaptivity.nl/ProcessEngine/" xmlns:ui="urn:example:ui"
    name="order" owner="alice" uuid="5b2c8f52-4a5e-4c6e-9f5e-0f1d2c3b4a59" roles="clerk, manager">
  <pe:import name="customer" path="/order/customer">ACME</pe:import>
  <pe:export name="total" refnode="price" refname="amount"/>
  <pe:start id="start" x="10" y="20"/>
  <pe:split id="fork" predecessor="start" min="2" max="2"/>
  <pe:activity id="price" predecessor="fork" name="Price" label="Price the order">
    <pe:condition>order.total &gt; 0</pe:condition>
    <pe:result name="amount" path="/price"/>
    <ui:hint>ignored</ui:hint>
  </pe:activity>
  <pe:activity id="ship" predecessor="fork" name="Ship">
    <pe:define name="address" refnode="start" refname="address"/>
  </pe:activity>
  <pe:join id="merge" min="2" max="2">
    <pe:predecessor>price</pe:predecessor>
    <pe:predecessor>ship</pe:predecessor>
  </pe:join>
  <pe:end id="end" predecessor="merge"/>
</pe:processModel>"#;
