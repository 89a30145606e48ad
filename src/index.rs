//! Groups [`PostRecord`]s into a [`CategoryIndex`]: for every known category,
//! a list of [`YearGroup`]s ordered most recent year first, each holding its
//! posts ordered most recent first.
//!
//! Building is fail-fast. The first record with an unknown category or a
//! malformed date aborts the whole batch, since a partial index would produce
//! wrong previous/next links.

use crate::category::{Categories, Category, UnknownCategoryError};
use crate::post::PostRecord;
use chrono::{Datelike, NaiveDate};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// The `year` of the single [`YearGroup`] a category gets when it has no
/// posts at all.
pub const NO_POSTS_YEAR: &str = "none";

/// The posts of one category published in one year.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct YearGroup {
    /// The 4-digit year, or [`NO_POSTS_YEAR`].
    pub year: String,

    /// The year's posts, most recent first.
    pub posts: Vec<PostRecord>,
}

impl YearGroup {
    /// The placeholder group for a category without posts.
    pub fn no_posts() -> YearGroup {
        YearGroup {
            year: NO_POSTS_YEAR.to_owned(),
            posts: Vec::new(),
        }
    }

    pub fn is_no_posts(&self) -> bool {
        self.year == NO_POSTS_YEAR
    }
}

/// The grouped and sorted posts of every known category. Immutable once
/// built; see [`build`].
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryIndex {
    categories: Vec<(Category, Vec<YearGroup>)>,
}

impl CategoryIndex {
    /// Returns the year groups for `category`, or `None` if the index has no
    /// such category. Never returns an empty slice.
    pub fn years(&self, category: &str) -> Option<&[YearGroup]> {
        self.categories
            .iter()
            .find(|(c, _)| c.name == category)
            .map(|(_, years)| years.as_slice())
    }

    /// Iterates over categories in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[YearGroup])> {
        self.categories
            .iter()
            .map(|(category, years)| (category, years.as_slice()))
    }

    /// The number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// The number of posts across all categories.
    pub fn post_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|(_, years)| years.iter())
            .map(|group| group.posts.len())
            .sum()
    }
}

impl Serialize for CategoryIndex {
    /// Serializes as a map from category name to year groups, keeping
    /// configuration order.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.categories.iter().map(|(c, years)| (&c.name, years)))
    }
}

/// A year group while grouping is still in progress. Posts keep their parsed
/// date so sorting compares calendar dates.
struct PendingGroup<'a> {
    year: i32,
    key: &'a str,
    posts: Vec<(NaiveDate, &'a PostRecord)>,
}

impl PendingGroup<'_> {
    fn finish(mut self) -> YearGroup {
        // `sort_by` is stable, so same-day posts keep encounter order.
        self.posts.sort_by(|a, b| b.0.cmp(&a.0));
        YearGroup {
            year: self.key.to_owned(),
            posts: self.posts.into_iter().map(|(_, p)| p.clone()).collect(),
        }
    }
}

/// Builds a [`CategoryIndex`] from `records`, which may be empty and in any
/// order. Every category in `categories` is present in the result, with a
/// [`YearGroup::no_posts`] group if no record belongs to it.
pub fn build(categories: &Categories, records: &[PostRecord]) -> Result<CategoryIndex> {
    let mut groups: Vec<Vec<PendingGroup>> = categories.iter().map(|_| Vec::new()).collect();

    // (category position, year) -> position of the year's group in
    // `groups[category]`, in first-seen order.
    let mut positions: HashMap<(usize, &str), usize> = HashMap::new();

    for record in records {
        let category = categories
            .position(&record.category)
            .map_err(|err| Error::UnknownCategory {
                title: record.title.clone(),
                err,
            })?;
        let date = parse_date(record)?;
        let key = &record.date[..4];

        let category_groups = &mut groups[category];
        let position = *positions.entry((category, key)).or_insert_with(|| {
            category_groups.push(PendingGroup {
                year: date.year(),
                key,
                posts: Vec::new(),
            });
            category_groups.len() - 1
        });
        category_groups[position].posts.push((date, record));
    }

    let categories = categories
        .iter()
        .zip(groups)
        .map(|(category, mut groups)| {
            let years = if groups.is_empty() {
                vec![YearGroup::no_posts()]
            } else {
                groups.sort_by(|a, b| b.year.cmp(&a.year));
                groups.into_iter().map(PendingGroup::finish).collect()
            };
            debug!(
                category = %category.name,
                years = years.len(),
                posts = years.iter().map(|g| g.posts.len()).sum::<usize>(),
                "indexed category"
            );
            (category.clone(), years)
        })
        .collect();

    Ok(CategoryIndex { categories })
}

/// Parses a record's date, which must be exactly `YYYY-MM-DD` and a real
/// calendar day.
fn parse_date(record: &PostRecord) -> Result<NaiveDate> {
    let date = &record.date;
    let malformed = || Error::DateParse {
        title: record.title.clone(),
        date: date.clone(),
    };
    if !is_iso_date_shape(date.as_bytes()) {
        return Err(malformed());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| malformed())
}

/// `DDDD-DD-DD` with ASCII digits. `chrono` alone would also take padded or
/// single-digit months and days.
fn is_iso_date_shape(date: &[u8]) -> bool {
    date.len() == 10
        && date.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// The result of building a [`CategoryIndex`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a record that can't be indexed. Both variants name the
/// offending record by title.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Returned when a record's date isn't a valid `YYYY-MM-DD` date.
    DateParse { title: String, date: String },

    /// Returned when a record's category isn't one of the known categories.
    UnknownCategory {
        title: String,
        err: UnknownCategoryError,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DateParse { title, date } => write!(
                f,
                "post `{}`: date `{}` is not a valid YYYY-MM-DD date",
                title, date
            ),
            Error::UnknownCategory { title, err } => write!(f, "post `{}`: {}", title, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DateParse { .. } => None,
            Error::UnknownCategory { title: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn categories() -> Categories {
        Categories::new(vec![
            Category::new("tech", "Tech"),
            Category::new("game", "Game"),
        ])
        .unwrap()
    }

    fn post(title: &str, date: &str, category: &str) -> PostRecord {
        PostRecord::new(title, date, category, format!("/posts/{}.html", title))
    }

    fn titles(group: &YearGroup) -> Vec<&str> {
        group.posts.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_build_groups_by_year() -> Result<()> {
        let records = vec![
            post("A", "2023-05-01", "tech"),
            post("B", "2023-01-01", "tech"),
            post("C", "2022-12-01", "tech"),
        ];
        let index = build(&categories(), &records)?;

        let tech = index.years("tech").unwrap();
        assert_eq!(tech.len(), 2);
        assert_eq!(tech[0].year, "2023");
        assert_eq!(titles(&tech[0]), vec!["A", "B"]);
        assert_eq!(tech[1].year, "2022");
        assert_eq!(titles(&tech[1]), vec!["C"]);

        // untouched categories still get listed
        assert_eq!(index.years("game").unwrap(), &[YearGroup::no_posts()][..]);
        Ok(())
    }

    #[test]
    fn test_build_empty() -> Result<()> {
        let index = build(&categories(), &[])?;
        assert_eq!(index.len(), 2);
        for (_, years) in index.iter() {
            assert_eq!(years.len(), 1);
            assert_eq!(years[0].year, NO_POSTS_YEAR);
            assert!(years[0].posts.is_empty());
        }
        assert_eq!(index.post_count(), 0);
        Ok(())
    }

    #[test]
    fn test_build_sorts_unordered_input() -> Result<()> {
        let records = vec![
            post("old", "2009-03-04", "tech"),
            post("mid", "2021-06-30", "tech"),
            post("new", "2024-01-15", "tech"),
            post("early-2021", "2021-01-02", "tech"),
            post("late-2021", "2021-12-31", "tech"),
            post("g1", "2020-02-02", "game"),
        ];
        let index = build(&categories(), &records)?;
        let tech = index.years("tech").unwrap();

        let years: Vec<&str> = tech.iter().map(|g| g.year.as_str()).collect();
        assert_eq!(years, vec!["2024", "2021", "2009"]);
        assert_eq!(titles(&tech[1]), vec!["late-2021", "mid", "early-2021"]);

        for pair in tech.windows(2) {
            assert!(pair[0].year.parse::<i32>().unwrap() >= pair[1].year.parse::<i32>().unwrap());
        }
        for group in tech {
            for pair in group.posts.windows(2) {
                assert!(pair[0].date >= pair[1].date);
            }
        }
        Ok(())
    }

    #[test]
    fn test_build_keeps_encounter_order_for_same_day() -> Result<()> {
        let records = vec![
            post("first", "2022-07-07", "tech"),
            post("newer", "2022-08-01", "tech"),
            post("second", "2022-07-07", "tech"),
        ];
        let index = build(&categories(), &records)?;
        let tech = index.years("tech").unwrap();
        assert_eq!(titles(&tech[0]), vec!["newer", "first", "second"]);
        Ok(())
    }

    #[test]
    fn test_every_record_indexed_once() -> Result<()> {
        let records = vec![
            post("a", "2019-01-01", "tech"),
            post("b", "2020-01-01", "game"),
            post("c", "2019-05-05", "game"),
            post("d", "2018-09-09", "tech"),
        ];
        let index = build(&categories(), &records)?;
        assert_eq!(index.post_count(), records.len());

        for record in &records {
            let found = index
                .iter()
                .flat_map(|(_, years)| years.iter())
                .flat_map(|g| g.posts.iter())
                .filter(|p| *p == record)
                .count();
            assert_eq!(found, 1, "{} indexed {} times", record.title, found);
            assert!(index
                .years(&record.category)
                .unwrap()
                .iter()
                .any(|g| g.posts.contains(record)));
        }
        Ok(())
    }

    #[test]
    fn test_unknown_category_fails_whole_batch() {
        let records = vec![
            post("fine", "2023-01-01", "tech"),
            post("stray", "2023-01-02", "cooking"),
        ];
        assert_eq!(
            build(&categories(), &records),
            Err(Error::UnknownCategory {
                title: "stray".to_owned(),
                err: UnknownCategoryError("cooking".to_owned()),
            })
        );
    }

    #[test]
    fn test_malformed_date_fails_whole_batch() {
        for date in &[
            "2023-13-01",
            "2023-02-30",
            "2023/05/01",
            "23-05-01",
            "2023-5-1",
            "2023- 5-01",
            "2023-05- 1",
            "2023- 5- 1",
            "2023-05-01T",
            "",
        ] {
            let records = vec![post("fine", "2023-01-01", "tech"), post("bad", date, "tech")];
            assert_eq!(
                build(&categories(), &records),
                Err(Error::DateParse {
                    title: "bad".to_owned(),
                    date: date.to_string(),
                }),
                "date {:?}",
                date
            );
        }
    }

    #[test]
    fn test_serialize_keeps_category_order() -> std::result::Result<(), serde_yaml::Error> {
        let index = build(&categories(), &[post("A", "2023-05-01", "game")]).unwrap();
        let yaml = serde_yaml::to_string(&index)?;
        let tech = yaml.find("tech:").unwrap();
        let game = yaml.find("game:").unwrap();
        assert!(tech < game);
        assert!(yaml.contains(NO_POSTS_YEAR));
        Ok(())
    }
}
