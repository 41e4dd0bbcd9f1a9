//! Person identities and alias table entries

use serde::{Deserialize, Serialize};

/// Resolved identity: stable id plus display name
///
/// `id` is externally meaningless but must never change once assigned,
/// since downstream consumers join on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One row of the alias table: free-text spelling → identity
///
/// Several aliases may share a `person_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAlias {
    pub alias_text: String,
    pub person_id: String,
    pub display_name: String,
}

impl PersonAlias {
    pub fn new(
        alias_text: impl Into<String>,
        person_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            alias_text: alias_text.into(),
            person_id: person_id.into(),
            display_name: display_name.into(),
        }
    }
}
