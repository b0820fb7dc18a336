//! The markdown collaborator boundary. The content pipeline itself never
//! looks at markdown; it consumes the `{html, headings, front matter}` record
//! this module produces from a raw source file. Front matter is delimited by
//! `---` fences; a file without fences is treated as all body with empty
//! front matter, and unparseable front matter degrades to the defaults rather
//! than failing the build.

use pulldown_cmark::{html, Event, Options, Parser, Tag};
use serde::Deserialize;
use tracing::warn;

/// Loosely-typed front matter fields. `draft`/`page`/`tags` stay as raw YAML
/// values because real-world front matter spells booleans as `true`, `"yes"`,
/// or `1`, and tags as either a string or a sequence; coercion happens during
/// normalization and is total.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub published_at: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub tags: Option<serde_yaml::Value>,

    #[serde(default)]
    pub draft: Option<serde_yaml::Value>,

    #[serde(default)]
    pub page: Option<serde_yaml::Value>,
}

/// The parsed form of one source file: rendered body plus the metadata the
/// normalizer needs.
#[derive(Clone, Debug)]
pub struct Document {
    pub front_matter: FrontMatter,

    /// The rendered HTML body.
    pub html: String,

    /// The text of each heading, in document order.
    pub headings: Vec<String>,

    /// The raw markdown body, retained on the post for pass-through
    /// compatibility.
    pub markdown: String,
}

/// Parses a raw source file into a [`Document`]. Total: malformed front
/// matter is logged and replaced with defaults.
pub fn parse(path: &std::path::Path, contents: &str) -> Document {
    let (front, body) = split_front_matter(contents);
    let front_matter = match front {
        None => FrontMatter::default(),
        Some(raw) => match serde_yaml::from_str(raw) {
            Ok(front_matter) => front_matter,
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring malformed front matter");
                FrontMatter::default()
            }
        },
    };

    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut headings = Vec::new();
    let mut heading: Option<String> = None;
    let events: Vec<Event> = Parser::new_ext(body, options)
        .map(|event| {
            match &event {
                Event::Start(Tag::Heading(..)) => heading = Some(String::new()),
                Event::End(Tag::Heading(..)) => {
                    if let Some(text) = heading.take() {
                        headings.push(text);
                    }
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(heading) = heading.as_mut() {
                        heading.push_str(text);
                    }
                }
                _ => {}
            }
            event
        })
        .collect();

    let mut rendered = String::new();
    html::push_html(&mut rendered, events.into_iter());

    Document {
        front_matter,
        html: rendered,
        headings,
        markdown: body.to_owned(),
    }
}

/// Splits a file into its front matter and body. The front matter is the
/// content between a leading `---` fence and the next `---`; absent fences
/// mean the whole file is body.
fn split_front_matter(input: &str) -> (Option<&str>, &str) {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return (None, input);
    }
    match input[FENCE.len()..].find(FENCE) {
        None => (None, input),
        Some(offset) => {
            let yaml_stop = FENCE.len() + offset;
            (
                Some(&input[FENCE.len()..yaml_stop]),
                &input[yaml_stop + FENCE.len()..],
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_with_front_matter() {
        let doc = parse(
            Path::new("hello.md"),
            "---\ntitle: Hello\ntags: foo bar\n---\n# Heading\n\nBody text.",
        );
        assert_eq!(doc.front_matter.title.as_deref(), Some("Hello"));
        assert_eq!(doc.headings, vec![String::from("Heading")]);
        assert!(doc.html.contains("<h1>Heading</h1>"));
        assert!(doc.markdown.contains("Body text."));
    }

    #[test]
    fn test_parse_without_front_matter() {
        let doc = parse(Path::new("hello.md"), "# Hello world\nYOLO");
        assert!(doc.front_matter.title.is_none());
        assert_eq!(doc.headings, vec![String::from("Hello world")]);
    }

    #[test]
    fn test_malformed_front_matter_degrades_to_defaults() {
        let doc = parse(
            Path::new("hello.md"),
            "---\ntitle: [unclosed\n---\nBody.",
        );
        assert!(doc.front_matter.title.is_none());
        assert!(doc.html.contains("Body."));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let doc = parse(Path::new("x.md"), "# Using `serde`\n");
        assert_eq!(doc.headings, vec![String::from("Using serde")]);
    }
}
