//! Configuration loading. A project is described by a `ghostwright.yaml`
//! file; [`Config::from_directory`] searches the provided directory and its
//! ancestors for one, in the same way version control tools locate their
//! repository root. The resulting [`Config`] is an immutable value threaded
//! explicitly through the build; nothing in this crate reads configuration
//! from global state, so two builds with different configurations can coexist
//! in one process.

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An author record, sourced from site metadata (never from posts). The
/// `slug` keys the author's archive URL and defaults to the slugified map key
/// when the record doesn't carry one.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    pub website: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub cover: String,
}

/// The process-wide author mapping, loaded once per run and read-only during
/// rendering. Lookup never fails: unknown or unset author slugs resolve to
/// the default author.
#[derive(Clone, Debug)]
pub struct AuthorRegistry {
    authors: BTreeMap<String, Arc<Author>>,
    default: Arc<Author>,
}

impl AuthorRegistry {
    /// Builds a registry from the configured author map. A `default` entry is
    /// used as the fallback author if present; otherwise one is synthesized
    /// so that lookup stays total even for an empty map.
    pub fn new(mut authors: BTreeMap<String, Author>) -> AuthorRegistry {
        for (key, author) in authors.iter_mut() {
            if author.slug.is_empty() {
                author.slug = slug::slugify(key);
            }
        }
        let default = Arc::new(authors.remove("default").unwrap_or(Author {
            name: String::from("Anonymous"),
            slug: String::from("anonymous"),
            bio: String::new(),
            website: String::new(),
            image: String::new(),
            cover: String::new(),
        }));
        AuthorRegistry {
            authors: authors.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
            default,
        }
    }

    /// Looks up an author by declared slug, substituting the default author
    /// for unknown or missing slugs.
    pub fn lookup(&self, declared: Option<&str>) -> Arc<Author> {
        declared
            .and_then(|slug| self.authors.get(slug))
            .unwrap_or(&self.default)
            .clone()
    }

    pub fn default_author(&self) -> Arc<Author> {
        self.default.clone()
    }
}

/// The site metadata made available to every template as `settings`.
#[derive(Clone, Debug)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,

    /// The site's base URL, without a trailing slash.
    pub url: String,

    /// The secure base URL, where it differs from `url`.
    pub url_ssl: String,
}

/// On-disk project file shape.
#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    url: String,

    #[serde(default)]
    url_ssl: Option<String>,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    feed_page_size: FeedPageSize,

    #[serde(default = "default_source_directory")]
    source_directory: PathBuf,

    #[serde(default = "default_theme_directory")]
    theme_directory: PathBuf,

    #[serde(default = "default_output_directory")]
    output_directory: PathBuf,

    #[serde(default)]
    authors: BTreeMap<String, Author>,
}

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(5)
    }
}

#[derive(Deserialize)]
struct FeedPageSize(usize);
impl Default for FeedPageSize {
    fn default() -> Self {
        FeedPageSize(15)
    }
}

fn default_source_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_theme_directory() -> PathBuf {
    PathBuf::from("theme")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("out")
}

/// Fully-resolved build configuration.
pub struct Config {
    pub site: SiteMeta,
    pub authors: AuthorRegistry,
    pub page_size: usize,
    pub feed_page_size: usize,
    pub source_directory: PathBuf,
    pub theme_directory: PathBuf,
    pub output_directory: PathBuf,
    pub threads: usize,
}

impl Config {
    /// Searches `dir` and its ancestors for a `ghostwright.yaml` project file
    /// and loads it.
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<&Path>,
        threads: Option<usize>,
    ) -> Result<Config> {
        let path = dir.join("ghostwright.yaml");
        if path.exists() {
            Config::from_project_file(&path, output_directory, threads)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory, threads),
                None => Err(anyhow!(
                    "Could not find `ghostwright.yaml` in any parent directory"
                )),
            }
        }
    }

    /// Loads configuration from a specific project file. Relative directories
    /// in the file are resolved against the file's own directory; the
    /// `output_directory` and `threads` arguments are CLI overrides.
    pub fn from_project_file(
        path: &Path,
        output_directory: Option<&Path>,
        threads: Option<usize>,
    ) -> Result<Config> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Parsing project file `{}`", path.display()))?;

        let base = url::Url::parse(&project.url)
            .with_context(|| format!("Parsing site URL `{}`", project.url))?;
        let url = base.as_str().trim_end_matches('/').to_owned();
        let url_ssl = match &project.url_ssl {
            Some(ssl) => url::Url::parse(ssl)
                .with_context(|| format!("Parsing secure site URL `{}`", ssl))?
                .as_str()
                .trim_end_matches('/')
                .to_owned(),
            None => url.clone(),
        };

        let project_root = path
            .parent()
            .ok_or_else(|| anyhow!("Project file `{}` has no parent directory", path.display()))?;

        Ok(Config {
            site: SiteMeta {
                title: project.title,
                description: project.description,
                url,
                url_ssl,
            },
            authors: AuthorRegistry::new(project.authors),
            page_size: project.page_size.0,
            feed_page_size: project.feed_page_size.0,
            source_directory: project_root.join(project.source_directory),
            theme_directory: project_root.join(project.theme_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join(project.output_directory),
            },
            threads: match threads {
                Some(threads) => threads,
                None => num_cpus::get(),
            },
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_registry_lookup_known_author() {
        let mut authors = BTreeMap::new();
        authors.insert(
            String::from("sam"),
            Author {
                name: String::from("Sam Doe"),
                slug: String::new(),
                bio: String::new(),
                website: String::new(),
                image: String::new(),
                cover: String::new(),
            },
        );
        let registry = AuthorRegistry::new(authors);
        assert_eq!(registry.lookup(Some("sam")).name, "Sam Doe");
        assert_eq!(registry.lookup(Some("sam")).slug, "sam");
    }

    #[test]
    fn test_registry_lookup_unknown_author_yields_default() {
        let mut authors = BTreeMap::new();
        authors.insert(
            String::from("default"),
            Author {
                name: String::from("Editorial Staff"),
                slug: String::from("staff"),
                bio: String::new(),
                website: String::new(),
                image: String::new(),
                cover: String::new(),
            },
        );
        let registry = AuthorRegistry::new(authors);
        assert_eq!(registry.lookup(Some("nobody")).name, "Editorial Staff");
        assert_eq!(registry.lookup(None).name, "Editorial Staff");
    }

    #[test]
    fn test_registry_lookup_with_empty_map() {
        let registry = AuthorRegistry::new(BTreeMap::new());
        assert_eq!(registry.lookup(Some("anyone")).name, "Anonymous");
    }
}
