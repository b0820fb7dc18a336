//! The canonical [`Post`] model and the normalizer that produces it. A
//! [`Post`] is constructed exactly once per source file, complete: by the
//! time a value of this type exists it already carries a resolved publication
//! timestamp and its permanent [`RelativeUrl`], so later stages (sorting,
//! grouping, pagination, rendering) can treat posts as immutable and never
//! recompute a URL.

use crate::config::{Author, AuthorRegistry};
use crate::date;
use crate::markdown::Document;
use crate::source::SourceFile;
use crate::url::{self, RelativeUrl};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A post tag. Tags are value objects: two tags with the same name are
/// interchangeable, and the slug is derived deterministically from the name,
/// so a tag can be rebuilt from a group key at any point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub name: String,

    /// Lowercased name with every non-alphanumeric character replaced by `-`.
    pub slug: String,

    /// Ghost themes expect a description on every tag; it mirrors the name.
    pub description: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            slug: name
                .to_lowercase()
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect(),
            description: name.to_owned(),
        }
    }
}

/// One canonical content entry.
#[derive(Clone, Debug)]
pub struct Post {
    /// Sequential per-run id, assigned in input stream order. Does not
    /// correlate with publication order.
    pub id: u64,

    pub title: String,
    pub slug: String,

    /// Rendered HTML body.
    pub html: String,

    /// Raw markdown body, retained for pass-through compatibility.
    pub markdown: String,

    pub draft: bool,

    /// `true` for standalone pages, which render individually but never
    /// appear in archives or feeds.
    pub page: bool,

    pub author: Arc<Author>,

    /// Tags in their order of appearance in the source metadata.
    pub tags: Vec<Tag>,

    /// Resolved publication timestamp; always present.
    pub published_at: DateTime<Utc>,

    /// The post's permanent URL, assigned at construction and immutable. All
    /// downstream cross-links reuse this value.
    pub relative_url: RelativeUrl,
}

/// Maps raw parsed files into canonical [`Post`]s. Holds the per-run id
/// counter, seeded at 1.
pub struct Normalizer<'a> {
    registry: &'a AuthorRegistry,
    next_id: u64,
}

impl<'a> Normalizer<'a> {
    pub fn new(registry: &'a AuthorRegistry) -> Normalizer<'a> {
        Normalizer {
            registry,
            next_id: 1,
        }
    }

    /// Normalizes one parsed source file into a [`Post`]. Total: every field
    /// is populated or defaulted, and malformed metadata never fails the
    /// build.
    pub fn normalize(&mut self, file: &SourceFile, doc: Document) -> Post {
        let id = self.next_id;
        self.next_id += 1;

        let stem = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let title = match doc.front_matter.title {
            Some(title) if !title.is_empty() => title,
            _ => match doc.headings.first() {
                Some(heading) if !heading.is_empty() => heading.clone(),
                _ => stem.clone(),
            },
        };

        Post {
            id,
            slug: slug::slugify(&stem),
            html: doc.html,
            markdown: doc.markdown,
            draft: to_boolean(doc.front_matter.draft.as_ref()),
            page: to_boolean(doc.front_matter.page.as_ref()),
            author: self.registry.lookup(doc.front_matter.author.as_deref()),
            tags: parse_tags(doc.front_matter.tags.as_ref()),
            published_at: date::resolve(
                doc.front_matter.published_at.as_deref(),
                &file.path,
                file.ctime,
            ),
            relative_url: url::post_url(&file.path),
            title,
        }
    }
}

/// Coerces a loosely-typed front matter flag into a boolean. `true`, `yes`,
/// and `1` (as bool, string, or number) are truthy; anything else, including
/// malformed input, is false.
fn to_boolean(value: Option<&serde_yaml::Value>) -> bool {
    match value {
        Some(serde_yaml::Value::Bool(b)) => *b,
        Some(serde_yaml::Value::String(s)) => {
            matches!(s.trim(), "true" | "yes" | "1")
        }
        Some(serde_yaml::Value::Number(n)) => n.as_u64() == Some(1),
        _ => false,
    }
}

/// Parses the raw `tags` front matter value into a tag list, preserving the
/// order of appearance. A string splits on commas when any are present,
/// otherwise on whitespace; a YAML sequence contributes one tag per string
/// element. Anything else yields no tags.
fn parse_tags(value: Option<&serde_yaml::Value>) -> Vec<Tag> {
    match value {
        Some(serde_yaml::Value::String(s)) => {
            let names: Vec<&str> = if s.contains(',') {
                s.split(',').collect()
            } else {
                s.split_whitespace().collect()
            };
            names
                .into_iter()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(Tag::new)
                .collect()
        }
        Some(serde_yaml::Value::Sequence(seq)) => seq
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Tag::new)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn registry() -> AuthorRegistry {
        let mut authors = BTreeMap::new();
        authors.insert(
            String::from("sam"),
            Author {
                name: String::from("Sam Doe"),
                slug: String::from("sam"),
                bio: String::new(),
                website: String::new(),
                image: String::new(),
                cover: String::new(),
            },
        );
        AuthorRegistry::new(authors)
    }

    fn file(path: &str, contents: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            contents: contents.to_owned(),
            ctime: None,
        }
    }

    fn normalize_one(path: &str, contents: &str) -> Post {
        let registry = registry();
        let mut normalizer = Normalizer::new(&registry);
        let file = file(path, contents);
        let doc = markdown::parse(&file.path, &file.contents);
        normalizer.normalize(&file, doc)
    }

    #[test]
    fn test_title_from_front_matter() {
        let post = normalize_one("a.md", "---\ntitle: Explicit\n---\n# Heading\n");
        assert_eq!(post.title, "Explicit");
    }

    #[test]
    fn test_title_falls_back_to_first_heading() {
        let post = normalize_one("a.md", "# Hello world\nYOLO");
        assert_eq!(post.title, "Hello world");
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let post = normalize_one("some-post.md", "YOLO");
        assert_eq!(post.title, "some-post");
    }

    #[test]
    fn test_author_resolution() {
        let post = normalize_one("a.md", "---\nauthor: sam\n---\nbody");
        assert_eq!(post.author.name, "Sam Doe");

        let post = normalize_one("a.md", "---\nauthor: nobody\n---\nbody");
        assert_eq!(post.author.name, "Anonymous");

        let post = normalize_one("a.md", "body");
        assert_eq!(post.author.name, "Anonymous");
    }

    #[test]
    fn test_boolean_coercion() {
        assert!(normalize_one("a.md", "---\ndraft: true\n---\nx").draft);
        assert!(normalize_one("a.md", "---\ndraft: \"yes\"\n---\nx").draft);
        assert!(normalize_one("a.md", "---\npage: 1\n---\nx").page);
        assert!(!normalize_one("a.md", "---\ndraft: maybe\n---\nx").draft);
        assert!(!normalize_one("a.md", "x").draft);
        assert!(!normalize_one("a.md", "x").page);
    }

    #[test]
    fn test_space_separated_tags() {
        let post = normalize_one("a.md", "---\ntags: foo bar baz\n---\nx");
        let names: Vec<&str> = post.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_comma_separated_tags() {
        let post = normalize_one("a.md", "---\ntags: \"foo, bar,baz\"\n---\nx");
        let names: Vec<&str> = post.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_missing_tags_is_empty() {
        assert!(normalize_one("a.md", "x").tags.is_empty());
    }

    #[test]
    fn test_tag_slug_derivation() {
        let tag = Tag::new("Rust & Friends");
        assert_eq!(tag.slug, "rust---friends");
        assert_eq!(tag.description, "Rust & Friends");
    }

    #[test]
    fn test_ids_are_sequential_in_input_order() {
        let registry = registry();
        let mut normalizer = Normalizer::new(&registry);
        for (i, name) in ["z.md", "a.md", "m.md"].iter().enumerate() {
            let file = file(name, "body");
            let doc = markdown::parse(&file.path, &file.contents);
            let post = normalizer.normalize(&file, doc);
            assert_eq!(post.id, i as u64 + 1);
        }
    }

    #[test]
    fn test_url_assigned_at_construction() {
        let post = normalize_one("2014/01/hello.md", "x");
        assert_eq!(post.relative_url.as_str(), "/2014/01/hello/");
    }
}
