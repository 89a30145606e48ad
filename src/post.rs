//! Defines the [`PostRecord`] type, the unit of data the index and the
//! navigation sequence operate on.

use serde::{Deserialize, Serialize};

/// A post as seen by the index: just the metadata needed to list it and link
/// to it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostRecord {
    /// The post's title. Navigation looks posts up by title, so titles are
    /// expected to be unique within a category.
    pub title: String,

    /// The publication date as `YYYY-MM-DD`. The first four characters are
    /// the year the post is listed under.
    pub date: String,

    /// The name of the [`crate::category::Category`] the post belongs to.
    pub category: String,

    /// Where the rendered post lives. Never interpreted, only passed through
    /// to navigation links.
    #[serde(default)]
    pub path: String,
}

impl PostRecord {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        category: impl Into<String>,
        path: impl Into<String>,
    ) -> PostRecord {
        PostRecord {
            title: title.into(),
            date: date.into(),
            category: category.into(),
            path: path.into(),
        }
    }
}
