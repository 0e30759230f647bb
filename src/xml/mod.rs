//! XML form of process models.
//!
//! The model itself never parses XML. The reader turns the document into an [`Element`]
//! tree and offers each attribute and child to the model or node it belongs to through
//! `deserialize_attribute` / `deserialize_child`, which answer whether they consumed it.
//! The writer goes the other way through `attributes()` / `to_element()`.
//!
//! ```rust
//! use procgraph::xml::{read_model, write_model};
//!
//! let xml = r#"<pe:processModel xmlns:pe="http://adaptivity.nl/ProcessEngine/" name="demo">
//!   <pe:start id="start"/>
//!   <pe:activity id="work" predecessor="start" name="Work"/>
//!   <pe:end id="end" predecessor="work"/>
//! </pe:processModel>"#;
//!
//! let model = read_model(xml).unwrap();
//! assert_eq!(model.len(), 3);
//! assert!(model.unresolved_refs().is_empty());
//! assert!(write_model(&model).unwrap().contains("pe:activity"));
//! ```

pub mod attributes;
pub mod element;

mod reader;
mod writer;

pub use attributes::AttributeMap;
pub use element::{Element, XmlAttribute};

use crate::config::ModelConfig;
use crate::error::XmlError;
use crate::model::ProcessModel;
use reader::read_children;
use tracing::warn;

/// Namespace of process model documents.
pub const NAMESPACE: &str = "http://adaptivity.nl/ProcessEngine/";

/// Prefix the writer binds [`NAMESPACE`] to.
pub const PREFIX: &str = "pe";

pub fn read_model(xml: &str) -> Result<ProcessModel, XmlError> {
    read_model_with(xml, ModelConfig::default())
}

/// Reads a model owned under `config` and resolves the references between its nodes.
///
/// Elements in the process namespace that the model does not know fail the read with
/// [`XmlError::UnhandledElement`]; elements from other namespaces are skipped, and so
/// are attributes nobody handles.
pub fn read_model_with(xml: &str, config: ModelConfig) -> Result<ProcessModel, XmlError> {
    let root = Element::parse(xml)?;
    if !root.is("processModel") {
        return Err(XmlError::UnhandledElement {
            parent: "document".to_string(),
            name: root.to_string(),
        });
    }

    let mut model = ProcessModel::with_config(config);
    for attribute in &root.attributes {
        let handled = model.deserialize_attribute(
            attribute.namespace.as_deref(),
            &attribute.name,
            &attribute.value,
        )?;
        if !handled {
            warn!(element = %root.name, attribute = %attribute.name, "skipping unhandled attribute");
        }
    }
    read_children(&root, |child| model.deserialize_child(child))?;
    model.resolve_refs()?;
    Ok(model)
}

pub fn write_model(model: &ProcessModel) -> Result<String, XmlError> {
    model.to_element().write()
}
