//! Tag and ingredient association filtering.
//!
//! Recipe listings accept `?tags=1,2&ingredients=3`. A recipe passes the tag
//! criterion when it carries *any* of the listed tags, and likewise for
//! ingredients; when both are supplied a recipe must pass both.

use core::num::ParseIntError;
use core::str::FromStr;

use crate::types::{IngredientId, TagId};

/// Error returned for a malformed identifier token in a query parameter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid identifier {token:?} in `{param}`: {source}")]
pub struct IdTokenError {
    /// Name of the query parameter being parsed.
    pub param: &'static str,
    /// The offending token.
    pub token: String,
    /// Why the token did not parse.
    #[source]
    pub source: ParseIntError,
}

/// Records that carry tag and ingredient associations.
pub trait Associations {
    /// IDs of the tags attached to this record.
    fn tag_ids(&self) -> &[TagId];

    /// IDs of the ingredients attached to this record.
    fn ingredient_ids(&self) -> &[IngredientId];
}

/// Parse a comma-separated list of identifier tokens.
///
/// Tokens are trimmed; every token (including an empty one, as in `"1,,2"`)
/// must parse as an integer.
///
/// # Errors
///
/// Returns `IdTokenError` naming `param` and the first token that fails to
/// parse.
pub fn parse_id_tokens<T>(param: &'static str, raw: &str) -> Result<Vec<T>, IdTokenError>
where
    T: FromStr<Err = ParseIntError>,
{
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse().map_err(|source| IdTokenError {
                param,
                token: token.to_owned(),
                source,
            })
        })
        .collect()
}

/// Parsed tag/ingredient criteria for a recipe listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationFilter {
    /// Tags to match; `None` leaves the tag criterion unapplied.
    pub tags: Option<Vec<TagId>>,
    /// Ingredients to match; `None` leaves the ingredient criterion unapplied.
    pub ingredients: Option<Vec<IngredientId>>,
}

impl AssociationFilter {
    /// Build a filter from raw `tags` / `ingredients` query values.
    ///
    /// Missing or empty values leave the corresponding criterion unapplied.
    ///
    /// # Errors
    ///
    /// Returns `IdTokenError` if either value contains a non-numeric token.
    pub fn from_query(
        tags: Option<&str>,
        ingredients: Option<&str>,
    ) -> Result<Self, IdTokenError> {
        let tags = tags
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id_tokens("tags", raw))
            .transpose()?;
        let ingredients = ingredients
            .filter(|raw| !raw.is_empty())
            .map(|raw| parse_id_tokens("ingredients", raw))
            .transpose()?;

        Ok(Self { tags, ingredients })
    }

    /// Whether no criterion will be applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.as_deref().is_none_or(<[TagId]>::is_empty)
            && self
                .ingredients
                .as_deref()
                .is_none_or(<[IngredientId]>::is_empty)
    }

    /// Whether a single record satisfies every applied criterion.
    pub fn matches<R: Associations + ?Sized>(&self, record: &R) -> bool {
        matches_any(record.tag_ids(), self.tags.as_deref())
            && matches_any(record.ingredient_ids(), self.ingredients.as_deref())
    }

    /// Keep the records that satisfy every applied criterion, in input order.
    #[must_use]
    pub fn apply<R: Associations>(&self, records: Vec<R>) -> Vec<R> {
        filter_by_associations(records, self.tags.as_deref(), self.ingredients.as_deref())
    }
}

/// Restrict `records` to those associated with the given tags and ingredients.
///
/// A `None` or empty list leaves that criterion unapplied. Input order is
/// preserved.
#[must_use]
pub fn filter_by_associations<R: Associations>(
    records: Vec<R>,
    tag_ids: Option<&[TagId]>,
    ingredient_ids: Option<&[IngredientId]>,
) -> Vec<R> {
    records
        .into_iter()
        .filter(|record| {
            matches_any(record.tag_ids(), tag_ids) && matches_any(record.ingredient_ids(), ingredient_ids)
        })
        .collect()
}

fn matches_any<T: PartialEq>(attached: &[T], wanted: Option<&[T]>) -> bool {
    match wanted {
        Some(wanted) if !wanted.is_empty() => attached.iter().any(|id| wanted.contains(id)),
        _ => true,
    }
}
