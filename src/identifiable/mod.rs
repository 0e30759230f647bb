pub mod set;

pub use set::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything that exposes a stable string identifier.
///
/// The id is optional so that objects under construction (nodes that have not been
/// given an id yet) can still live in an [`IdentifiableSet`].
pub trait Identifiable {
    fn id(&self) -> Option<&str>;
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    fn id(&self) -> Option<&str> {
        (**self).id()
    }
}

impl Identifiable for String {
    fn id(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl Identifiable for str {
    fn id(&self) -> Option<&str> {
        Some(self)
    }
}

/// A bare, unresolved reference to something by its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Identifiable for Identifier {
    fn id(&self) -> Option<&str> {
        Some(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
