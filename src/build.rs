//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output site: reading raw source files
//! ([`crate::source`]), parsing and normalizing them into canonical posts
//! ([`crate::markdown`], [`crate::post`]), and running the content pipelines
//! ([`crate::pipeline`]) with the template renderer, feed serializer, and
//! filesystem sink adapters.

use crate::config::Config;
use crate::feed::RssSerializer;
use crate::pipeline::{self, Options};
use crate::post::Normalizer;
use crate::render::{Error as RenderError, GtmplRenderer};
use crate::source::{self, Error as SourceError};
use crate::write::FsSink;
use crate::{markdown, post};
use std::fmt;
use tracing::info;

/// Builds the site from a [`Config`] value. Normalization is total; the
/// fallible steps are reading sources, loading templates, and the render/
/// write pipelines.
pub fn build_site(config: &Config) -> Result<()> {
    let files = source::read_source(&config.source_directory)?;
    info!(files = files.len(), "read source directory");

    let mut normalizer = Normalizer::new(&config.authors);
    let posts: Vec<post::Post> = files
        .iter()
        .map(|file| {
            let doc = markdown::parse(&file.path, &file.contents);
            normalizer.normalize(file, doc)
        })
        .collect();

    let renderer =
        GtmplRenderer::from_theme_directory(&config.theme_directory, config.site.clone())?;
    let feeds = RssSerializer::new(&config.site.url_ssl);
    let sink = FsSink::new(&config.output_directory);

    pipeline::run(
        &config.site,
        &Options {
            page_size: config.page_size,
            feed_page_size: config.feed_page_size,
            threads: config.threads,
        },
        posts,
        &renderer,
        &feeds,
        &sink,
    )?;

    info!(output = %config.output_directory.display(), "site built");
    Ok(())
}

/// The result of a full site build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading the source directory.
    Source(SourceError),

    /// Returned for errors loading or parsing theme templates.
    Render(RenderError),

    /// Returned for errors in the render/write pipelines.
    Pipeline(pipeline::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Source(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Pipeline(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(err) => Some(err),
            Error::Render(err) => Some(err),
            Error::Pipeline(err) => Some(err),
        }
    }
}

impl From<SourceError> for Error {
    /// Converts a [`SourceError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: SourceError) -> Error {
        Error::Source(err)
    }
}

impl From<RenderError> for Error {
    /// Converts a [`RenderError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<pipeline::Error> for Error {
    /// Converts a [`pipeline::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: pipeline::Error) -> Error {
        Error::Pipeline(err)
    }
}
