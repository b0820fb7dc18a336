//! The feed-serializer boundary. Feed pages mirror the HTML archives: the
//! site index and every tag and author group get their own paginated RSS
//! feed. The pipeline hands the serializer the feed metadata and the page's
//! posts; the default implementation produces RSS 2.0 with the `rss` crate.
//! Item links and guids reuse each post's precomputed URL, absolutized
//! against the configured base, so feed readers and rendered HTML agree on
//! every link.

use crate::post::Post;
use crate::url::RelativeUrl;
use rss::{Category, Channel, Guid, Item};
use std::fmt;

/// Channel-level metadata for one feed.
pub struct FeedMetadata {
    /// Channel title, e.g. `My Blog` or `My Blog - rust`.
    pub title: String,

    pub description: String,

    /// Absolute URL of the HTML view this feed mirrors.
    pub link: String,

    /// The feed page's own URL.
    pub relative_url: RelativeUrl,
}

/// The external feed-serialization capability: metadata plus items in, XML
/// document out.
pub trait FeedSerializer {
    fn serialize(&self, meta: &FeedMetadata, posts: &[&Post]) -> Result<String>;
}

/// Serializes feeds as RSS 2.0.
pub struct RssSerializer {
    /// Site base URL, used to absolutize item links.
    base_url: String,
}

impl RssSerializer {
    pub fn new(base_url: &str) -> RssSerializer {
        RssSerializer {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl FeedSerializer for RssSerializer {
    fn serialize(&self, meta: &FeedMetadata, posts: &[&Post]) -> Result<String> {
        let mut channel = Channel::default();
        channel.set_title(meta.title.clone());
        channel.set_description(meta.description.clone());
        channel.set_link(meta.link.clone());
        channel.set_generator(Some(String::from("ghostwright")));
        channel.set_items(
            posts
                .iter()
                .map(|post| {
                    let link = post.relative_url.absolute(&self.base_url);
                    let mut guid = Guid::default();
                    guid.set_value(link.clone());
                    guid.set_permalink(true);

                    let mut item = Item::default();
                    item.set_title(post.title.clone());
                    item.set_link(link);
                    item.set_guid(guid);
                    item.set_description(post.html.clone());
                    item.set_pub_date(post.published_at.to_rfc2822());
                    item.set_author(post.author.name.clone());
                    item.set_categories(
                        post.tags
                            .iter()
                            .map(|tag| {
                                let mut category = Category::default();
                                category.set_name(tag.name.clone());
                                category
                            })
                            .collect::<Vec<Category>>(),
                    );
                    item
                })
                .collect::<Vec<Item>>(),
        );

        let buffer = channel.write_to(Vec::new())?;
        String::from_utf8(buffer).map_err(Error::Utf8)
    }
}

/// The result of a feed-serialization operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error serializing a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned for XML-writing errors.
    Rss(rss::Error),

    /// Returned when the serialized document isn't valid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rss(err) => err.fmt(f),
            Error::Utf8(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Rss(err) => Some(err),
            Error::Utf8(err) => Some(err),
        }
    }
}

impl From<rss::Error> for Error {
    /// Converts an [`rss::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator in feed operations.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}
