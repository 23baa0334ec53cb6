//! Storage paths for uploaded recipe images.
//!
//! Every upload gets a fresh random name so two recipes can never overwrite
//! each other's images, while the original extension is kept so the media
//! server can infer a content type.

use uuid::Uuid;

/// Directory (relative to the media root) holding recipe images.
pub const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

/// Source of unique identifiers for generated file names.
///
/// Production code uses [`UuidV4Source`]; tests substitute a fixed source to
/// assert exact paths.
pub trait UniqueIdSource {
    /// Produce the next identifier.
    fn next_id(&self) -> String;
}

/// Random version-4 UUIDs in canonical hyphenated lowercase form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Source;

impl UniqueIdSource for UuidV4Source {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> UniqueIdSource for F
where
    F: Fn() -> String,
{
    fn next_id(&self) -> String {
        self()
    }
}

/// Generate a storage-relative path for an uploaded recipe image.
///
/// Returns `uploads/recipe/<uuid>.<ext>`, where `<ext>` is everything after
/// the last `.` in `original_filename`.
///
/// # Example
///
/// ```
/// use recipe_box_core::recipe_image_path;
///
/// let path = recipe_image_path("myimage.jpg");
/// assert!(path.starts_with("uploads/recipe/"));
/// assert!(path.ends_with(".jpg"));
/// ```
#[must_use]
pub fn recipe_image_path(original_filename: &str) -> String {
    recipe_image_path_with(&UuidV4Source, original_filename)
}

/// Generate a recipe image path using the given identifier source.
///
/// The extension is taken verbatim and never validated. A name without a
/// period is used whole as the extension, and an empty name produces a path
/// ending in a bare `.`.
#[must_use]
pub fn recipe_image_path_with<S>(source: &S, original_filename: &str) -> String
where
    S: UniqueIdSource + ?Sized,
{
    let ext = original_filename
        .rsplit_once('.')
        .map_or(original_filename, |(_, ext)| ext);

    format!("{RECIPE_IMAGE_DIR}/{}.{ext}", source.next_id())
}
