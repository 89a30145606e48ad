//! Defines [`CategoryIndexStore`], the service object that owns the built
//! [`CategoryIndex`]. It is created once at startup and handed to listing and
//! post views by reference. The index is built on the first call to
//! [`CategoryIndexStore::ensure_built`] and never rebuilt.

use crate::category::{Categories, UnknownCategoryError};
use crate::index::{self, CategoryIndex, YearGroup};
use crate::post::PostRecord;
use std::fmt;
use tracing::{debug, info};

/// Where a [`CategoryIndexStore`] is in its lifecycle. The only transitions
/// are `Uninitialized -> Building -> Ready` and, when a build fails,
/// `Building -> Uninitialized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Building,
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Building => "building",
            Phase::Ready => "ready",
        })
    }
}

enum State {
    Uninitialized,
    Building,
    Ready(CategoryIndex),
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            State::Uninitialized => Phase::Uninitialized,
            State::Building => Phase::Building,
            State::Ready(_) => Phase::Ready,
        }
    }
}

/// Holds the [`CategoryIndex`] for the lifetime of the process.
pub struct CategoryIndexStore {
    categories: Categories,
    state: State,
}

impl CategoryIndexStore {
    /// Creates an unbuilt store for `categories`.
    pub fn new(categories: Categories) -> CategoryIndexStore {
        CategoryIndexStore {
            categories,
            state: State::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    /// Builds the index from `records` unless it is already built, in which
    /// case `records` is ignored. Safe to call on every navigation. If the
    /// build fails, nothing is cached and the store stays unbuilt.
    pub fn ensure_built(&mut self, records: &[PostRecord]) -> Result<()> {
        if let State::Ready(_) = self.state {
            debug!("category index already built");
            return Ok(());
        }

        self.transition(State::Building)?;
        match index::build(&self.categories, records) {
            Ok(index) => {
                info!(
                    categories = index.len(),
                    posts = index.post_count(),
                    "built category index"
                );
                self.transition(State::Ready(index))
            }
            Err(err) => {
                self.transition(State::Uninitialized)?;
                Err(Error::Build(err))
            }
        }
    }

    /// Returns the year groups for `category`. Never empty: a category
    /// without posts has a single [`YearGroup::no_posts`] group.
    pub fn index(&self, category: &str) -> Result<&[YearGroup]> {
        self.built()
            .ok_or(Error::NotBuilt)?
            .years(category)
            .ok_or_else(|| Error::UnknownCategory(UnknownCategoryError(category.to_owned())))
    }

    /// Returns the whole index, if built.
    pub fn built(&self) -> Option<&CategoryIndex> {
        match &self.state {
            State::Ready(index) => Some(index),
            _ => None,
        }
    }

    fn transition(&mut self, next: State) -> Result<()> {
        let (from, to) = (self.state.phase(), next.phase());
        match (from, to) {
            (Phase::Uninitialized, Phase::Building)
            | (Phase::Building, Phase::Ready)
            | (Phase::Building, Phase::Uninitialized) => {
                debug!(%from, %to, "category index store transition");
                self.state = next;
                Ok(())
            }
            _ => Err(Error::Transition { from, to }),
        }
    }
}

/// The result of a [`CategoryIndexStore`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or building a [`CategoryIndexStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Returned when the index is queried before it was built.
    NotBuilt,

    /// Returned when querying a category that isn't in the store's set.
    UnknownCategory(UnknownCategoryError),

    /// Returned when building the index failed.
    Build(index::Error),

    /// Returned for a lifecycle transition the store doesn't allow.
    Transition { from: Phase, to: Phase },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotBuilt => write!(f, "category index queried before it was built"),
            Error::UnknownCategory(err) => err.fmt(f),
            Error::Build(err) => write!(f, "building category index: {}", err),
            Error::Transition { from, to } => {
                write!(f, "category index store can't go from {} to {}", from, to)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotBuilt => None,
            Error::UnknownCategory(err) => Some(err),
            Error::Build(err) => Some(err),
            Error::Transition { .. } => None,
        }
    }
}

impl From<index::Error> for Error {
    /// Converts an [`index::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: index::Error) -> Error {
        Error::Build(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::category::Category;
    use crate::index::NO_POSTS_YEAR;

    fn store() -> CategoryIndexStore {
        CategoryIndexStore::new(
            Categories::new(vec![
                Category::new("tech", "Tech"),
                Category::new("game", "Game"),
            ])
            .unwrap(),
        )
    }

    fn records() -> Vec<PostRecord> {
        vec![
            PostRecord::new("A", "2023-05-01", "tech", "/posts/a.html"),
            PostRecord::new("B", "2023-01-01", "tech", "/posts/b.html"),
            PostRecord::new("C", "2022-12-01", "tech", "/posts/c.html"),
        ]
    }

    #[test]
    fn test_index_before_build() {
        let store = store();
        assert_eq!(store.phase(), Phase::Uninitialized);
        assert_eq!(store.index("tech"), Err(Error::NotBuilt));
        assert!(store.built().is_none());
    }

    #[test]
    fn test_ensure_built() -> Result<()> {
        let mut store = store();
        store.ensure_built(&records())?;
        assert_eq!(store.phase(), Phase::Ready);

        let tech = store.index("tech")?;
        assert_eq!(tech.len(), 2);
        assert_eq!(tech[0].posts[0].title, "A");

        let game = store.index("game")?;
        assert_eq!(game.len(), 1);
        assert_eq!(game[0].year, NO_POSTS_YEAR);

        assert_eq!(
            store.index("cooking"),
            Err(Error::UnknownCategory(UnknownCategoryError(
                "cooking".to_owned()
            )))
        );
        Ok(())
    }

    #[test]
    fn test_ensure_built_is_idempotent() -> Result<()> {
        let mut store = store();
        store.ensure_built(&records())?;
        let first = store.built().cloned();

        // A second call must not regroup, so a different record set (even an
        // invalid one) changes nothing.
        store.ensure_built(&[PostRecord::new("X", "not-a-date", "nowhere", "")])?;
        assert_eq!(store.built().cloned(), first);
        assert_eq!(store.phase(), Phase::Ready);
        Ok(())
    }

    #[test]
    fn test_every_category_listed_after_build() -> Result<()> {
        let mut store = store();
        store.ensure_built(&[])?;
        let names: Vec<String> = store.categories().iter().map(|c| c.name.clone()).collect();
        for name in names {
            assert!(!store.index(&name)?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_failed_build_caches_nothing() -> Result<()> {
        let mut store = store();
        let mut bad = records();
        bad.push(PostRecord::new("D", "2023-99-01", "tech", ""));

        match store.ensure_built(&bad) {
            Err(Error::Build(index::Error::DateParse { title, .. })) => assert_eq!(title, "D"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(store.phase(), Phase::Uninitialized);
        assert_eq!(store.index("tech"), Err(Error::NotBuilt));

        store.ensure_built(&records())?;
        assert_eq!(store.phase(), Phase::Ready);
        Ok(())
    }

    #[test]
    fn test_illegal_transitions() -> Result<()> {
        let mut store = store();
        let empty = index::build(store.categories(), &[])?;
        assert_eq!(
            store.transition(State::Ready(empty)),
            Err(Error::Transition {
                from: Phase::Uninitialized,
                to: Phase::Ready,
            })
        );

        store.ensure_built(&[])?;
        assert_eq!(
            store.transition(State::Building),
            Err(Error::Transition {
                from: Phase::Ready,
                to: Phase::Building,
            })
        );
        assert_eq!(store.phase(), Phase::Ready);
        Ok(())
    }
}
