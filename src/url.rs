//! Defines the [`RelativeUrl`] type and the functions that compute every URL
//! the generator ever emits. This module is the single source of truth for
//! link targets: post pages, archive pages, and feed pages all derive both
//! their output file path and every cross-link pointing at them from the same
//! [`RelativeUrl`] value, so a URL computed here is guaranteed to match the
//! file the build actually writes.

use std::fmt;
use std::path::{Path, PathBuf};

/// A site-relative URL. Always starts and ends with `/`, always uses forward
/// slashes, never contains `.`/`..` segments or doubled slashes. Instances
/// can only be produced by the constructors in this module, which is what
/// lets downstream stages treat the value as already-resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativeUrl(String);

impl RelativeUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts the URL into the output file path (relative to the output
    /// root) that serves it. Directory-style URLs are served by an index
    /// document, so `/tag/rust/page/2/` maps to `tag/rust/page/2/index.html`
    /// and feed URLs map to `.../index.xml`.
    pub fn file_path(&self, kind: OutputKind) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(match kind {
            OutputKind::Html => "index.html",
            OutputKind::Feed => "index.xml",
        });
        path
    }

    /// Prefixes the URL with `base`, stripping any trailing slash from the
    /// base first so the join point never contains a doubled slash.
    pub fn absolute(&self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for RelativeUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The two flavors of output document an archive URL can address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Html,
    Feed,
}

/// Identifies which archive a paginated URL belongs to. The same scope value
/// is used for every page of one archive, which is what keeps page 1's "next"
/// link textually identical to page 2's own URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The site-wide chronological index, rooted at `/`.
    Index,

    /// A tag archive, rooted at `/tag/<slug>/`. Carries the tag slug.
    Tag(String),

    /// An author archive, rooted at `/author/<slug>/`. Carries the author
    /// slug.
    Author(String),
}

impl Scope {
    fn prefix(&self) -> String {
        match self {
            Scope::Index => String::from("/"),
            Scope::Tag(slug) => format!("/tag/{}/", slug),
            Scope::Author(slug) => format!("/author/{}/", slug),
        }
    }
}

/// Computes the permanent URL for a post from its source path relative to the
/// input root: the extension is stripped and the remaining path becomes a
/// directory-style URL (`2014/hello.md` -> `/2014/hello/`).
pub fn post_url(source_path: &Path) -> RelativeUrl {
    let mut url = String::from("/");
    let stripped = source_path.with_extension("");
    for component in stripped
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
    {
        url.push_str(&component);
        url.push('/');
    }
    RelativeUrl(url)
}

/// Computes the URL of page `page` (1-indexed) of an archive. HTML archives
/// address later pages as `page/N/` under the scope prefix; feeds live under
/// `rss/` and address later pages as plain `N/`.
pub fn archive_url(scope: &Scope, kind: OutputKind, page: usize) -> RelativeUrl {
    let mut url = scope.prefix();
    match kind {
        OutputKind::Html => {
            if page > 1 {
                url.push_str(&format!("page/{}/", page));
            }
        }
        OutputKind::Feed => {
            url.push_str("rss/");
            if page > 1 {
                url.push_str(&format!("{}/", page));
            }
        }
    }
    RelativeUrl(url)
}
