//! Pagination. Splits an ordered post sequence into fixed-size [`Page`]s,
//! computing the pagination metadata and the destination URL of every page up
//! front. Even an empty input produces exactly one (empty) page, so every
//! archive always has a landing page. A [`Page`] can only be produced here,
//! which guarantees it carries its resolved URL before it reaches a renderer.

use crate::post::Post;
use crate::url::{self, OutputKind, RelativeUrl, Scope};
use std::fmt;

/// Pagination metadata for one page, in the shape Ghost themes consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-indexed page number.
    pub page: usize,

    /// Total number of pages in this set; at least 1.
    pub pages: usize,

    /// Total number of items across the whole set.
    pub total: usize,

    /// The configured page size.
    pub limit: usize,

    pub next: Option<usize>,
    pub prev: Option<usize>,
}

/// One render-ready page of an archive: an ordered slice of the group's
/// posts, pagination metadata, and the page's own URL. Ephemeral; it exists
/// to be handed to the renderer and then discarded.
pub struct Page<'a> {
    pub items: Vec<&'a Post>,
    pub pagination: Pagination,
    pub relative_url: RelativeUrl,
}

/// Splits `posts` into pages of `page_size`, computing every page's URL from
/// the same `scope`/`kind` context so that one page's `next` link and the
/// following page's own URL are textually identical.
pub fn paginate<'a>(
    posts: &[&'a Post],
    page_size: usize,
    scope: &Scope,
    kind: OutputKind,
) -> Result<Vec<Page<'a>>> {
    if page_size == 0 {
        return Err(Error::ZeroPageSize);
    }

    let total = posts.len();
    let pages = std::cmp::max(1, total.div_ceil(page_size));

    Ok((1..=pages)
        .map(|page| {
            let start = (page - 1) * page_size;
            let stop = std::cmp::min(start + page_size, total);
            Page {
                items: posts[start..stop].to_vec(),
                pagination: Pagination {
                    page,
                    pages,
                    total,
                    limit: page_size,
                    next: if page < pages { Some(page + 1) } else { None },
                    prev: if page > 1 { Some(page - 1) } else { None },
                },
                relative_url: url::archive_url(scope, kind, page),
            }
        })
        .collect())
}

/// The result of a pagination operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a pagination invariant violation. This is a programming-error
/// class; it aborts the build rather than silently producing wrong output.
#[derive(Debug)]
pub enum Error {
    /// Returned when pagination is requested with a page size of zero.
    ZeroPageSize,
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ZeroPageSize => write!(f, "pagination requires a page size of at least 1"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::AuthorRegistry;
    use crate::markdown;
    use crate::post::Normalizer;
    use crate::source::SourceFile;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn posts(n: usize) -> Vec<Post> {
        let registry = AuthorRegistry::new(BTreeMap::new());
        let mut normalizer = Normalizer::new(&registry);
        (0..n)
            .map(|i| {
                let file = SourceFile {
                    path: PathBuf::from(format!("2014-01-{:02}-post.md", i + 1)),
                    contents: String::from("x"),
                    ctime: None,
                };
                let doc = markdown::parse(&file.path, &file.contents);
                normalizer.normalize(&file, doc)
            })
            .collect()
    }

    #[test]
    fn test_partition_without_overlap_or_gaps() -> Result<()> {
        let posts = posts(7);
        let refs: Vec<&Post> = posts.iter().collect();
        let pages = paginate(&refs, 3, &Scope::Index, OutputKind::Html)?;

        assert_eq!(pages.len(), 3);
        let flattened: Vec<u64> = pages
            .iter()
            .flat_map(|p| p.items.iter().map(|post| post.id))
            .collect();
        let original: Vec<u64> = refs.iter().map(|p| p.id).collect();
        assert_eq!(flattened, original);

        let total: usize = pages.iter().map(|p| p.items.len()).sum();
        assert_eq!(total, 7);
        Ok(())
    }

    #[test]
    fn test_link_consistency() -> Result<()> {
        let posts = posts(7);
        let refs: Vec<&Post> = posts.iter().collect();
        let pages = paginate(&refs, 5, &Scope::Index, OutputKind::Html)?;

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].pagination.page, 1);
        assert_eq!(pages[0].pagination.next, Some(2));
        assert_eq!(pages[0].pagination.prev, None);
        assert_eq!(pages[1].pagination.prev, Some(1));
        assert_eq!(pages[1].pagination.next, None);
        assert_eq!(pages[0].items.len(), 5);
        assert_eq!(pages[1].items.len(), 2);

        // page 1's "next" URL is exactly page 2's own URL
        let next_url =
            url::archive_url(&Scope::Index, OutputKind::Html, 2);
        assert_eq!(pages[1].relative_url, next_url);
        Ok(())
    }

    #[test]
    fn test_empty_input_yields_one_empty_page() -> Result<()> {
        let pages = paginate(
            &[],
            5,
            &Scope::Author(String::from("quiet")),
            OutputKind::Html,
        )?;
        assert_eq!(pages.len(), 1);
        assert!(pages[0].items.is_empty());
        assert_eq!(pages[0].pagination.pages, 1);
        assert_eq!(pages[0].pagination.total, 0);
        assert_eq!(pages[0].pagination.next, None);
        assert_eq!(pages[0].pagination.prev, None);
        assert_eq!(pages[0].relative_url.as_str(), "/author/quiet/");
        Ok(())
    }

    #[test]
    fn test_exact_multiple_of_page_size() -> Result<()> {
        let posts = posts(10);
        let refs: Vec<&Post> = posts.iter().collect();
        let pages = paginate(&refs, 5, &Scope::Index, OutputKind::Html)?;
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].items.len(), 5);
        Ok(())
    }

    #[test]
    fn test_zero_page_size_fails_loudly() {
        let result = paginate(&[], 0, &Scope::Index, OutputKind::Html);
        assert!(matches!(result, Err(Error::ZeroPageSize)));
    }

    #[test]
    fn test_limit_reflects_configured_page_size() -> Result<()> {
        let posts = posts(4);
        let refs: Vec<&Post> = posts.iter().collect();
        let pages = paginate(&refs, 15, &Scope::Index, OutputKind::Feed)?;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].pagination.limit, 15);
        assert_eq!(pages[0].relative_url.as_str(), "/rss/");
        Ok(())
    }
}
