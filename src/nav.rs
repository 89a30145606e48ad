//! Previous/next navigation between the posts of one category. A [`Sequence`]
//! is a category's year groups flattened into one list, most recent first, so
//! "previous" means one step further down the list (older) and "next" means
//! one step up (newer).

use crate::index::{CategoryIndex, YearGroup};
use crate::post::PostRecord;

/// The posts of one category in index order (most recent first). Borrows
/// from the [`CategoryIndex`] it was flattened from.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence<'a>(Vec<&'a PostRecord>);

impl<'a> Sequence<'a> {
    /// Concatenates the posts of every group in `years`, in stored order.
    pub fn flatten(years: &'a [YearGroup]) -> Sequence<'a> {
        Sequence(years.iter().flat_map(|group| group.posts.iter()).collect())
    }

    /// Flattens `category` from `index`. Returns `None` if the index has no
    /// such category.
    pub fn of(index: &'a CategoryIndex, category: &str) -> Option<Sequence<'a>> {
        index.years(category).map(Sequence::flatten)
    }

    /// Returns the position of the first post titled `title`. Titles aren't
    /// guaranteed unique; a duplicate resolves to the most recent post.
    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.0.iter().position(|post| post.title == title)
    }

    /// Returns the position of the post at `path`.
    pub fn index_of_path(&self, path: &str) -> Option<usize> {
        self.0.iter().position(|post| post.path == path)
    }

    /// Returns the neighbours of the post at `position`: `previous` is the
    /// older post after it, `next` the newer post before it.
    pub fn neighbors(&self, position: usize) -> Neighbors<'a> {
        Neighbors {
            previous: position.checked_add(1).and_then(|i| self.get(i)),
            next: position.checked_sub(1).and_then(|i| self.get(i)),
        }
    }

    /// Looks `title` up and returns its neighbours. A title that isn't in the
    /// sequence has no neighbours.
    pub fn neighbors_of(&self, title: &str) -> Neighbors<'a> {
        match self.index_of(title) {
            Some(position) => self.neighbors(position),
            None => Neighbors::default(),
        }
    }

    /// Like [`Sequence::neighbors_of`], keyed by the post's path.
    pub fn neighbors_of_path(&self, path: &str) -> Neighbors<'a> {
        match self.index_of_path(path) {
            Some(position) => self.neighbors(position),
            None => Neighbors::default(),
        }
    }

    pub fn get(&self, position: usize) -> Option<&'a PostRecord> {
        self.0.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PostRecord> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The posts a post page links to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neighbors<'a> {
    /// The next older post, if any.
    pub previous: Option<&'a PostRecord>,

    /// The next newer post, if any.
    pub next: Option<&'a PostRecord>,
}

impl<'a> Neighbors<'a> {
    /// The link target for the "previous" arrow, or `""` if there is none.
    pub fn previous_path(&self) -> &'a str {
        self.previous.map_or("", |post| post.path.as_str())
    }

    /// The link target for the "next" arrow, or `""` if there is none.
    pub fn next_path(&self) -> &'a str {
        self.next.map_or("", |post| post.path.as_str())
    }
}
