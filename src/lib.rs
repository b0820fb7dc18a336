//! The library code for the `ghostwright` static blog generator. The
//! architecture can be generally broken down into three distinct steps:
//!
//! 1. Reading and parsing raw source files into canonical posts
//!    ([`crate::source`], [`crate::markdown`], [`crate::post`])
//! 2. Computing the output set: sorting, grouping by tag and author,
//!    paginating every view, and resolving every URL before anything renders
//!    ([`crate::group`], [`crate::page`], [`crate::url`])
//! 3. Rendering and writing the output files ([`crate::pipeline`],
//!    [`crate::render`], [`crate::feed`], [`crate::write`])
//!
//! Of the three, the second step is the heart of the crate. Every post's
//! permanent URL is assigned when the post is constructed and never
//! recomputed, which is what lets the index, the tag and author archives, and
//! the RSS feeds all link to pages some *other* pipeline writes and agree on
//! the result. A group of archive pages is paginated twice over the same
//! posts -- once at the HTML page size and once at the feed page size -- and
//! each page carries its own URL from the moment it exists.
//!
//! The third step is the only I/O-bound one: render jobs are executed by a
//! bounded worker pool, and the first failure cancels the work still queued.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod date;
pub mod feed;
pub mod group;
pub mod markdown;
pub mod page;
pub mod pipeline;
pub mod post;
pub mod render;
pub mod source;
pub mod url;
pub mod write;
