use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entity that can be referenced polymorphically by an `(id, kind)` pair.
pub trait Morphable {
    fn morph_key(&self) -> Uuid;
    fn morph_name(&self) -> &str;
}

/// A bare identity pair, for callers that don't hold the entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MorphRef {
    pub id: Uuid,
    pub name: String,
}

impl MorphRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Morphable for MorphRef {
    fn morph_key(&self) -> Uuid {
        self.id
    }

    fn morph_name(&self) -> &str {
        &self.name
    }
}
