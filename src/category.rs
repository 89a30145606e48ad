//! Defines the [`Category`] type and the closed [`Categories`] set that every
//! [`crate::post::PostRecord`] must belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A post category. Records refer to a category by `name`; the `label` is the
/// text a navigation menu shows for it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Category {
    /// The category's key, e.g. `frontend`. This is what post frontmatter and
    /// index lookups use.
    pub name: String,

    /// The human-readable name, e.g. `Frontend`. Defaults to `name`.
    #[serde(default)]
    pub label: String,
}

impl Category {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Category {
        Category {
            name: name.into(),
            label: label.into(),
        }
    }
}

impl Hash for Category {
    /// Implements [`Hash`] for [`Category`] by delegating directly to the
    /// `name` field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Category {
    /// Implements [`PartialEq`] and [`Eq`] for [`Category`] by delegating
    /// directly to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Category {}

/// The fixed, ordered set of known categories. Order is configuration order
/// and is the order in which an index lists its categories.
#[derive(Clone, Debug, PartialEq)]
pub struct Categories(Vec<Category>);

impl Categories {
    /// Builds a category set. Empty labels fall back to the category name.
    /// Fails if two categories share a name.
    pub fn new(categories: Vec<Category>) -> Result<Categories, DuplicateCategoryError> {
        let mut out: Vec<Category> = Vec::with_capacity(categories.len());
        for mut category in categories {
            if out.contains(&category) {
                return Err(DuplicateCategoryError(category.name));
            }
            if category.label.is_empty() {
                category.label = category.name.clone();
            }
            out.push(category);
        }
        Ok(Categories(out))
    }

    /// Looks up a category by name.
    pub fn resolve(&self, name: &str) -> Result<&Category, UnknownCategoryError> {
        self.0
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| UnknownCategoryError(name.to_owned()))
    }

    /// Returns the category's position in the set.
    pub fn position(&self, name: &str) -> Result<usize, UnknownCategoryError> {
        self.0
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| UnknownCategoryError(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Categories {
    /// The two categories the blog ships with.
    fn default() -> Self {
        Categories(vec![
            Category::new("frontend", "Frontend"),
            Category::new("deep_learning", "Deep Learning"),
        ])
    }
}

/// Returned when a name is not in the [`Categories`] set.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownCategoryError(pub String);

impl fmt::Display for UnknownCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown category `{}`", &self.0)
    }
}

impl std::error::Error for UnknownCategoryError {}

/// Returned when two categories in one set share a name.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCategoryError(pub String);

impl fmt::Display for DuplicateCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "category `{}` is listed more than once", &self.0)
    }
}

impl std::error::Error for DuplicateCategoryError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let categories = Categories::default();
        assert_eq!(categories.resolve("frontend").unwrap().label, "Frontend");
        assert_eq!(categories.position("deep_learning"), Ok(1));
        assert_eq!(
            categories.resolve("tech"),
            Err(UnknownCategoryError("tech".to_owned()))
        );
    }

    #[test]
    fn test_label_defaults_to_name() -> Result<(), DuplicateCategoryError> {
        let categories = Categories::new(vec![Category::new("tech", "")])?;
        assert_eq!(categories.resolve("tech").unwrap().label, "tech");
        Ok(())
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Categories::new(vec![
            Category::new("tech", "Tech"),
            Category::new("tech", "Technology"),
        ]);
        assert_eq!(result, Err(DuplicateCategoryError("tech".to_owned())));
    }
}
