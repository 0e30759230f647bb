use serde::{Deserialize, Serialize};

/// Data imported into a node (or into the model as a whole).
///
/// `content` is carried as an opaque blob; the model never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmlResultType {
    pub name: String,
    pub path: Option<String>,
    pub content: String,
}

impl XmlResultType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Data exported from a node, optionally taken from a result of another node
/// (`ref_node` / `ref_name`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XmlDefineType {
    pub name: String,
    pub ref_node: Option<String>,
    pub ref_name: Option<String>,
    pub path: Option<String>,
    pub content: String,
}

impl XmlDefineType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ref(mut self, node: impl Into<String>, name: impl Into<String>) -> Self {
        self.ref_node = Some(node.into());
        self.ref_name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}
