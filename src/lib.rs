//! The library code for `blognav`, the post index behind a personal blog's
//! listing pages and its previous/next links. The work breaks down into three
//! steps:
//!
//! 1. Loading post records from document frontmatter ([`crate::loader`])
//! 2. Grouping the records by category and year ([`crate::index`]), once per
//!    process ([`crate::store`])
//! 3. Flattening a category into one chronological sequence and finding a
//!    post's neighbours in it ([`crate::nav`])
//!
//! The second step is where the ordering rules live: every known category is
//! listed, years run most recent first, and posts within a year run most
//! recent first with same-day posts kept in the order they were found. The
//! third step reads that ordering back, so "previous" is always the older post
//! and "next" the newer one.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod category;
pub mod config;
pub mod index;
pub mod loader;
pub mod nav;
pub mod post;
pub mod store;
pub mod telemetry;
