//! The template-renderer boundary. The pipeline hands the renderer a
//! [`RenderContext`]: a tagged union with one variant per template kind, each
//! carrying exactly the fields that kind's contract requires. The default
//! implementation is [`GtmplRenderer`], which loads one template per kind
//! from the theme directory and renders with [`gtmpl`].
//!
//! Locals shape per kind (all kinds also receive `settings` with the site's
//! title, description, and base URL, plus `relative_url` and
//! `pre_computed_relative_url` for the page being rendered):
//!
//! * `post`/`page`: `post` -- the full post object.
//! * `index`: `posts` + `pagination`.
//! * `tag`: `posts` + `pagination` + `tag`.
//! * `author`: `posts` + `pagination` + `author`.

use crate::config::{Author, SiteMeta};
use crate::page::{Page, Pagination};
use crate::post::{Post, Tag};
use crate::url::RelativeUrl;
use gtmpl::{Context, Template};
use gtmpl_value::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The template kinds the renderer dispatches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Post,
    Page,
    Index,
    Tag,
    Author,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Post => "post",
            TemplateKind::Page => "page",
            TemplateKind::Index => "index",
            TemplateKind::Tag => "tag",
            TemplateKind::Author => "author",
        }
    }

    const ALL: [TemplateKind; 5] = [
        TemplateKind::Post,
        TemplateKind::Page,
        TemplateKind::Index,
        TemplateKind::Tag,
        TemplateKind::Author,
    ];
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one render call needs, keyed by template kind. Constructing a
/// variant requires the post or page value, which already carries its
/// resolved URL, so a context can't exist without one.
pub enum RenderContext<'a> {
    Post { post: &'a Post },
    Page { post: &'a Post },
    Index { page: &'a Page<'a> },
    Tag { tag: Tag, page: &'a Page<'a> },
    Author { author: Arc<Author>, page: &'a Page<'a> },
}

impl RenderContext<'_> {
    pub fn template(&self) -> TemplateKind {
        match self {
            RenderContext::Post { .. } => TemplateKind::Post,
            RenderContext::Page { .. } => TemplateKind::Page,
            RenderContext::Index { .. } => TemplateKind::Index,
            RenderContext::Tag { .. } => TemplateKind::Tag,
            RenderContext::Author { .. } => TemplateKind::Author,
        }
    }

    /// The URL of the document this context renders. Reused (never
    /// recomputed) from the post or page.
    pub fn relative_url(&self) -> &RelativeUrl {
        match self {
            RenderContext::Post { post } | RenderContext::Page { post } => &post.relative_url,
            RenderContext::Index { page }
            | RenderContext::Tag { page, .. }
            | RenderContext::Author { page, .. } => &page.relative_url,
        }
    }
}

/// The external template-renderer capability.
pub trait Renderer {
    fn render(&self, ctx: &RenderContext) -> Result<String>;
}

/// Renders [`RenderContext`]s with Go-style templates loaded from a theme
/// directory: one `{kind}.html` file per template kind, each prefixed with
/// the shared `base.html` when the theme provides one.
pub struct GtmplRenderer {
    templates: HashMap<TemplateKind, Template>,
    site: SiteMeta,
}

impl GtmplRenderer {
    /// Loads and parses the theme's templates.
    pub fn from_theme_directory(dir: &Path, site: SiteMeta) -> Result<GtmplRenderer> {
        let base = dir.join("base.html");
        let base_contents = if base.is_file() {
            read_template(&base)?
        } else {
            String::new()
        };

        let mut templates = HashMap::new();
        for kind in TemplateKind::ALL {
            let path = dir.join(format!("{}.html", kind.as_str()));
            let mut contents = base_contents.clone();
            contents.push_str(&read_template(&path)?);
            let mut template = Template::default();
            template.parse(&contents).map_err(|err| Error::Parse {
                kind,
                err: err.to_string(),
            })?;
            templates.insert(kind, template);
        }
        Ok(GtmplRenderer { templates, site })
    }

    fn locals(&self, ctx: &RenderContext) -> Value {
        let mut locals: HashMap<String, Value> = HashMap::new();
        locals.insert("settings".to_owned(), site_value(&self.site));
        let url = ctx.relative_url().to_string();
        locals.insert("relative_url".to_owned(), Value::String(url.clone()));
        locals.insert("pre_computed_relative_url".to_owned(), Value::String(url));
        match ctx {
            RenderContext::Post { post } | RenderContext::Page { post } => {
                locals.insert("post".to_owned(), post_value(post));
            }
            RenderContext::Index { page } => {
                insert_page(&mut locals, page);
            }
            RenderContext::Tag { tag, page } => {
                insert_page(&mut locals, page);
                locals.insert("tag".to_owned(), tag_value(tag));
            }
            RenderContext::Author { author, page } => {
                insert_page(&mut locals, page);
                locals.insert("author".to_owned(), author_value(author));
            }
        }
        Value::Object(locals)
    }
}

impl Renderer for GtmplRenderer {
    fn render(&self, ctx: &RenderContext) -> Result<String> {
        let kind = ctx.template();
        let template = self
            .templates
            .get(&kind)
            // every kind is loaded in from_theme_directory
            .ok_or_else(|| Error::Execute {
                kind,
                err: String::from("no template loaded"),
            })?;
        let context = Context::from(self.locals(ctx)).map_err(|err| Error::Execute {
            kind,
            err: err.to_string(),
        })?;
        let mut out = Vec::new();
        template.execute(&mut out, &context).map_err(|err| Error::Execute {
            kind,
            err: err.to_string(),
        })?;
        String::from_utf8(out).map_err(|err| Error::Execute {
            kind,
            err: err.to_string(),
        })
    }
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

fn insert_page(locals: &mut HashMap<String, Value>, page: &Page) {
    locals.insert(
        "posts".to_owned(),
        Value::Array(page.items.iter().map(|post| post_value(post)).collect()),
    );
    locals.insert("pagination".to_owned(), pagination_value(&page.pagination));
}

fn site_value(site: &SiteMeta) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert(
        "description".to_owned(),
        Value::String(site.description.clone()),
    );
    m.insert("url".to_owned(), Value::String(site.url.clone()));
    m.insert("url_ssl".to_owned(), Value::String(site.url_ssl.clone()));
    Value::Object(m)
}

/// Converts a [`Post`] into a template [`Value`].
pub fn post_value(post: &Post) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("id".to_owned(), Value::from(post.id));
    m.insert("title".to_owned(), Value::String(post.title.clone()));
    m.insert("slug".to_owned(), Value::String(post.slug.clone()));
    m.insert("html".to_owned(), Value::String(post.html.clone()));
    m.insert("markdown".to_owned(), Value::String(post.markdown.clone()));
    m.insert("draft".to_owned(), Value::from(post.draft));
    m.insert("page".to_owned(), Value::from(post.page));
    m.insert(
        "published_at".to_owned(),
        Value::String(post.published_at.to_rfc3339()),
    );
    m.insert("author".to_owned(), author_value(&post.author));
    m.insert(
        "tags".to_owned(),
        Value::Array(post.tags.iter().map(tag_value).collect()),
    );
    let url = post.relative_url.to_string();
    m.insert("relative_url".to_owned(), Value::String(url.clone()));
    m.insert("pre_computed_relative_url".to_owned(), Value::String(url));
    Value::Object(m)
}

fn tag_value(tag: &Tag) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(tag.name.clone()));
    m.insert("slug".to_owned(), Value::String(tag.slug.clone()));
    m.insert(
        "description".to_owned(),
        Value::String(tag.description.clone()),
    );
    // no tag hierarchy in this model
    m.insert("parent".to_owned(), Value::Nil);
    Value::Object(m)
}

fn author_value(author: &Author) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(author.name.clone()));
    m.insert("slug".to_owned(), Value::String(author.slug.clone()));
    m.insert("bio".to_owned(), Value::String(author.bio.clone()));
    m.insert("website".to_owned(), Value::String(author.website.clone()));
    m.insert("image".to_owned(), Value::String(author.image.clone()));
    m.insert("cover".to_owned(), Value::String(author.cover.clone()));
    Value::Object(m)
}

fn pagination_value(pagination: &Pagination) -> Value {
    let option_to_value = |opt: Option<usize>| match opt {
        Some(n) => Value::from(n as u64),
        None => Value::Nil,
    };
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("page".to_owned(), Value::from(pagination.page as u64));
    m.insert("pages".to_owned(), Value::from(pagination.pages as u64));
    m.insert("total".to_owned(), Value::from(pagination.total as u64));
    m.insert("limit".to_owned(), Value::from(pagination.limit as u64));
    m.insert("next".to_owned(), option_to_value(pagination.next));
    m.insert("prev".to_owned(), option_to_value(pagination.prev));
    Value::Object(m)
}


/// The result of a render operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a template-rendering error. Render failures are fatal for the
/// run; they carry the template kind so the failing page can be diagnosed.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing a template file.
    Parse { kind: TemplateKind, err: String },

    /// Returned when the renderer signals an error for a template/locals
    /// pair.
    Execute { kind: TemplateKind, err: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file `{}`: {}", path.display(), err)
            }
            Error::Parse { kind, err } => {
                write!(f, "Parsing `{}` template: {}", kind, err)
            }
            Error::Execute { kind, err } => {
                write!(f, "Rendering `{}` template: {}", kind, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Parse { .. } => None,
            Error::Execute { .. } => None,
        }
    }
}
