use super::element::Element;
use crate::error::XmlError;
use crate::model::{ProcessModel, ProcessNode, XmlDefineType, XmlResultType};
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

impl ProcessNode {
    /// Applies one attribute read from XML. Returns `Ok(false)` when the attribute means
    /// nothing to this kind of node.
    pub fn deserialize_attribute(
        &mut self,
        namespace: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<bool, XmlError> {
        if namespace.is_some() {
            return Ok(false);
        }
        match local_name {
            "id" => self.set_id(value)?,
            "label" => self.set_label(Some(value.to_string())),
            "x" => {
                let x = parse_value(local_name, value)?;
                self.set_position(x, self.y());
            }
            "y" => {
                let y = parse_value(local_name, value)?;
                self.set_position(self.x(), y);
            }
            "predecessor" if self.max_predecessor_count() == Some(1) => {
                self.add_predecessor(value)?;
            }
            "min" | "max" if self.join_split().is_some() => {
                let bound: u32 = parse_value(local_name, value)?;
                if let Some(bounds) = self.join_split_mut() {
                    if local_name == "min" {
                        bounds.min = bound;
                    } else {
                        bounds.max = bound;
                    }
                }
            }
            "name" if self.as_activity().is_some() => {
                if let Some(activity) = self.as_activity_mut() {
                    activity.name = Some(value.to_string());
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Applies one child element read from XML. Returns `Ok(false)` when the element
    /// means nothing to this kind of node.
    pub fn deserialize_child(&mut self, element: &Element) -> Result<bool, XmlError> {
        if !element.in_namespace() {
            return Ok(false);
        }
        match element.name.as_str() {
            "result" => self.results_mut().push(read_result(element)?),
            "define" => self.defines_mut().push(read_define(element)?),
            "condition" if self.as_activity().is_some() => {
                if let Some(activity) = self.as_activity_mut() {
                    activity.condition = Some(element.text.clone());
                }
            }
            "predecessor" if self.max_predecessor_count().is_none() => {
                self.add_predecessor(element.text.trim())?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl ProcessModel {
    pub fn deserialize_attribute(
        &mut self,
        namespace: Option<&str>,
        local_name: &str,
        value: &str,
    ) -> Result<bool, XmlError> {
        if namespace.is_some() {
            return Ok(false);
        }
        match local_name {
            "name" => self.set_name(Some(value.to_string())),
            "owner" => self.set_owner(Some(value.to_string())),
            "uuid" => {
                let uuid = Uuid::parse_str(value.trim()).map_err(|_| XmlError::InvalidValue {
                    name: local_name.to_string(),
                    value: value.to_string(),
                })?;
                self.set_uuid(Some(uuid));
            }
            "roles" => self.set_roles(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty()),
            ),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Handles an import, an export or a node element. Nodes are added to the model with
    /// their links pending.
    pub fn deserialize_child(&mut self, element: &Element) -> Result<bool, XmlError> {
        if !element.in_namespace() {
            return Ok(false);
        }
        match element.name.as_str() {
            "import" => self.imports_mut().push(read_result(element)?),
            "export" => self.exports_mut().push(read_define(element)?),
            _ => match read_node(element)? {
                Some(node) => {
                    self.add_node(node)?;
                }
                None => return Ok(false),
            },
        }
        Ok(true)
    }
}

/// Builds a detached node from its element, or `None` for elements that are no node.
pub(crate) fn read_node(element: &Element) -> Result<Option<ProcessNode>, XmlError> {
    let mut node = match element.name.as_str() {
        "start" => ProcessNode::start(),
        "activity" => ProcessNode::activity(),
        "split" => ProcessNode::split(1, 1),
        "join" => ProcessNode::join(1, 1),
        "end" => ProcessNode::end(),
        _ => return Ok(None),
    };

    for attribute in &element.attributes {
        let handled = node.deserialize_attribute(
            attribute.namespace.as_deref(),
            &attribute.name,
            &attribute.value,
        )?;
        if !handled {
            warn!(element = %element.name, attribute = %attribute.name, "skipping unhandled attribute");
        }
    }
    read_children(element, |child| node.deserialize_child(child))?;
    Ok(Some(node))
}

/// Feeds every child in the process namespace to `handle`; children from other
/// namespaces are skipped.
pub(crate) fn read_children(
    element: &Element,
    mut handle: impl FnMut(&Element) -> Result<bool, XmlError>,
) -> Result<(), XmlError> {
    for child in &element.children {
        if !child.in_namespace() {
            debug!(parent = %element.name, child = %child, "skipping foreign element");
            continue;
        }
        if !handle(child)? {
            return Err(XmlError::UnhandledElement {
                parent: element.name.clone(),
                name: child.name.clone(),
            });
        }
    }
    Ok(())
}

fn read_result(element: &Element) -> Result<XmlResultType, XmlError> {
    Ok(XmlResultType {
        name: element.required_attribute("name")?.to_string(),
        path: element.attribute("path").map(str::to_string),
        content: element.text.clone(),
    })
}

fn read_define(element: &Element) -> Result<XmlDefineType, XmlError> {
    Ok(XmlDefineType {
        name: element.required_attribute("name")?.to_string(),
        ref_node: element.attribute("refnode").map(str::to_string),
        ref_name: element.attribute("refname").map(str::to_string),
        path: element.attribute("path").map(str::to_string),
        content: element.text.clone(),
    })
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, XmlError> {
    value.trim().parse().map_err(|_| XmlError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
