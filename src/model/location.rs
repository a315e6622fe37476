use serde::Serialize;

use crate::graph::ElementId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Storey {
    pub id: ElementId,
    pub name: String,
    pub elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Space {
    pub id: ElementId,
    pub name: String,
    pub storey_id: Option<ElementId>, // None when no decomposition parent is a storey
}

/// Where an element sits: storey and, if known, the room inside it.
///
/// `space_name` and `space_id` are either both set or both `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub storey_name: Option<String>,
    pub storey_id: Option<ElementId>,
    pub space_name: Option<String>,
    pub space_id: Option<ElementId>,
}

impl Location {
    #[must_use]
    pub fn in_storey(storey: &Storey) -> Self {
        Self {
            storey_name: Some(storey.name.clone()),
            storey_id: Some(storey.id),
            space_name: None,
            space_id: None,
        }
    }

    #[must_use]
    pub fn with_space(mut self, space: &Space) -> Self {
        self.space_name = Some(space.name.clone());
        self.space_id = Some(space.id);
        self
    }

    #[must_use]
    pub fn storey_name_or_empty(&self) -> &str {
        self.storey_name.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn space_name_or_empty(&self) -> &str {
        self.space_name.as_deref().unwrap_or("")
    }
}
