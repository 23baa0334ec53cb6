//! Tag and ingredient domain types.
//!
//! Tags and ingredients have the same shape (a user-owned name) and the same
//! behavior, but live in separate tables and must never be mixed up. They
//! share one generic [`Label`] type, specialized by a zero-sized kind marker
//! that carries the table names and the typed ID.

use core::fmt;
use core::marker::PhantomData;

use serde::Serialize;

use recipe_box_core::{IngredientId, TagId, UserId};

/// Describes one kind of label and where it is stored.
pub trait LabelKind: fmt::Debug + Clone + Copy + PartialEq + Eq + Send + Sync + Unpin + 'static {
    /// Typed primary key.
    type Id: fmt::Debug
        + Copy
        + Eq
        + From<i32>
        + Into<i32>
        + Serialize
        + Send
        + Sync
        + Unpin
        + 'static;

    /// Human-readable singular name, used in logs.
    const NAME: &'static str;
    /// Table holding the labels.
    const TABLE: &'static str;
    /// Join table linking recipes to labels.
    const LINK_TABLE: &'static str;
    /// Column in [`Self::LINK_TABLE`] referencing [`Self::TABLE`].
    const LINK_COLUMN: &'static str;
    /// Recipe field holding label references in requests and responses.
    const FIELD: &'static str;
}

/// Marker for recipe tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagKind;

impl LabelKind for TagKind {
    type Id = TagId;

    const NAME: &'static str = "tag";
    const TABLE: &'static str = "core.tag";
    const LINK_TABLE: &'static str = "core.recipe_tags";
    const LINK_COLUMN: &'static str = "tag_id";
    const FIELD: &'static str = "tags";
}

/// Marker for recipe ingredients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientKind;

impl LabelKind for IngredientKind {
    type Id = IngredientId;

    const NAME: &'static str = "ingredient";
    const TABLE: &'static str = "core.ingredient";
    const LINK_TABLE: &'static str = "core.recipe_ingredients";
    const LINK_COLUMN: &'static str = "ingredient_id";
    const FIELD: &'static str = "ingredients";
}

/// A user-owned label.
///
/// Serializes as `{"id": ..., "name": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct Label<K: LabelKind> {
    /// Label ID.
    pub id: K::Id,
    /// Owner; fixed at creation.
    #[serde(skip)]
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    #[serde(skip)]
    kind: PhantomData<K>,
}

impl<K: LabelKind> Label<K> {
    /// Create a label value.
    #[must_use]
    pub const fn new(id: K::Id, user_id: UserId, name: String) -> Self {
        Self {
            id,
            user_id,
            name,
            kind: PhantomData,
        }
    }
}

impl<K: LabelKind> fmt::Display for Label<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A recipe tag.
pub type Tag = Label<TagKind>;

/// A recipe ingredient.
pub type Ingredient = Label<IngredientKind>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_name() {
        let tag = Tag::new(TagId::new(1), UserId::new(1), "Vegan".to_string());
        assert_eq!(tag.to_string(), "Vegan");

        let ingredient =
            Ingredient::new(IngredientId::new(1), UserId::new(1), "Cinnamon".to_string());
        assert_eq!(ingredient.to_string(), "Cinnamon");
    }

    #[test]
    fn test_serializes_without_owner() {
        let tag = Tag::new(TagId::new(3), UserId::new(9), "Dessert".to_string());
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "name": "Dessert"}));
    }
}
