//! The pipeline assembler. Takes the normalized post collection and fans it
//! out into the five output pipelines (post/page, index, tag, author, site
//! feed). All grouping, pagination, and URL computation is synchronous and
//! happens up front; the resulting render jobs are then executed by a bounded
//! worker pool, since template rendering and file writing are the only
//! I/O-bound steps. The tag and author pipelines branch into an HTML archive
//! and a feed, but both branches read the same materialized group; the source
//! collection is traversed once per grouping, never per branch.

use crate::config::{Author, SiteMeta};
use crate::feed::{self, FeedMetadata, FeedSerializer};
use crate::group::{self, Group};
use crate::page::{self, Page};
use crate::post::{Post, Tag};
use crate::render::{self, RenderContext, Renderer, TemplateKind};
use crate::url::{self, OutputKind, Scope};
use crate::write::{self, OutputFile, Sink};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Pipeline knobs, owned by the caller's configuration.
pub struct Options {
    /// Posts per HTML archive page.
    pub page_size: usize,

    /// Posts per feed page.
    pub feed_page_size: usize,

    /// Render worker count.
    pub threads: usize,
}

/// Identifies the archive a paginated set belongs to, carrying the record its
/// template needs.
enum ArchiveLabel {
    Index,
    Tag(Tag),
    Author(Arc<Author>),
}

impl ArchiveLabel {
    fn scope(&self) -> Scope {
        match self {
            ArchiveLabel::Index => Scope::Index,
            ArchiveLabel::Tag(tag) => Scope::Tag(tag.slug.clone()),
            ArchiveLabel::Author(author) => Scope::Author(author.slug.clone()),
        }
    }

    fn feed_title(&self, site: &SiteMeta) -> String {
        match self {
            ArchiveLabel::Index => site.title.clone(),
            ArchiveLabel::Tag(tag) => format!("{} - {}", site.title, tag.name),
            ArchiveLabel::Author(author) => format!("{} - {}", site.title, author.name),
        }
    }
}

/// One archive's materialized output: the HTML pagination pass and the feed
/// pagination pass over the same ordered posts. The two passes are
/// independently sized; they share posts, not pages.
struct Archive<'a> {
    label: ArchiveLabel,
    html_pages: Vec<Page<'a>>,
    feed_pages: Vec<Page<'a>>,
}

/// One unit of deferred I/O-bound work.
enum Job<'a> {
    Render {
        ctx: RenderContext<'a>,
        dest: PathBuf,
    },
    Feed {
        meta: FeedMetadata,
        items: Vec<&'a Post>,
        dest: PathBuf,
    },
}

impl Job<'_> {
    fn dest(&self) -> &PathBuf {
        match self {
            Job::Render { dest, .. } | Job::Feed { dest, .. } => dest,
        }
    }
}

/// Runs every pipeline over an already-normalized collection. Drafts are
/// dropped first; `page: true` entries render individually but join no
/// archive; everything else flows into the index, tag, author, and feed
/// views. Returns the first failure, after cancelling any work still queued.
pub fn run(
    site: &SiteMeta,
    options: &Options,
    mut entries: Vec<Post>,
    renderer: &(dyn Renderer + Sync),
    feeds: &(dyn FeedSerializer + Sync),
    sink: &(dyn Sink + Sync),
) -> Result<()> {
    entries.retain(|entry| {
        if entry.draft {
            debug!(url = %entry.relative_url, "skipping draft");
        }
        !entry.draft
    });

    let (pages, mut posts): (Vec<Post>, Vec<Post>) =
        entries.into_iter().partition(|entry| entry.page);
    group::sort_posts(&mut posts);
    let post_refs: Vec<&Post> = posts.iter().collect();

    debug!(
        posts = posts.len(),
        pages = pages.len(),
        "assembling pipelines"
    );

    let archives = build_archives(&post_refs, options)?;
    let jobs = build_jobs(site, &posts, &pages, &archives)?;
    execute(jobs, options.threads, renderer, feeds, sink)
}

/// Materializes the index archive plus one archive per tag group and per
/// author group, each paginated twice (HTML and feed page sizes).
fn build_archives<'a>(posts: &[&'a Post], options: &Options) -> Result<Vec<Archive<'a>>> {
    let mut archives = Vec::new();

    let mut push = |label: ArchiveLabel, group: &[&'a Post]| -> Result<()> {
        let scope = label.scope();
        archives.push(Archive {
            html_pages: page::paginate(group, options.page_size, &scope, OutputKind::Html)?,
            feed_pages: page::paginate(group, options.feed_page_size, &scope, OutputKind::Feed)?,
            label,
        });
        Ok(())
    };

    push(ArchiveLabel::Index, posts)?;

    for Group { key, posts } in group::group_by_tag(posts) {
        push(ArchiveLabel::Tag(Tag::new(&key)), &posts)?;
    }

    for Group { key: _, posts } in group::group_by_author(posts) {
        // the group is non-empty by construction
        let author = posts[0].author.clone();
        push(ArchiveLabel::Author(author), &posts)?;
    }

    Ok(archives)
}

/// Flattens posts, pages, and archives into the full job list, verifying that
/// no two jobs target the same output path.
fn build_jobs<'a>(
    site: &SiteMeta,
    posts: &'a [Post],
    pages: &'a [Post],
    archives: &'a [Archive<'a>],
) -> Result<Vec<Job<'a>>> {
    let mut jobs = Vec::new();

    for post in posts {
        jobs.push(Job::Render {
            ctx: RenderContext::Post { post },
            dest: post.relative_url.file_path(OutputKind::Html),
        });
    }
    for post in pages {
        jobs.push(Job::Render {
            ctx: RenderContext::Page { post },
            dest: post.relative_url.file_path(OutputKind::Html),
        });
    }

    for archive in archives {
        for page in &archive.html_pages {
            let ctx = match &archive.label {
                ArchiveLabel::Index => RenderContext::Index { page },
                ArchiveLabel::Tag(tag) => RenderContext::Tag {
                    tag: tag.clone(),
                    page,
                },
                ArchiveLabel::Author(author) => RenderContext::Author {
                    author: author.clone(),
                    page,
                },
            };
            jobs.push(Job::Render {
                dest: page.relative_url.file_path(OutputKind::Html),
                ctx,
            });
        }

        // feeds are served to external readers, so their links use the
        // secure base
        let html_url = url::archive_url(&archive.label.scope(), OutputKind::Html, 1);
        for page in &archive.feed_pages {
            jobs.push(Job::Feed {
                meta: FeedMetadata {
                    title: archive.label.feed_title(site),
                    description: site.description.clone(),
                    link: html_url.absolute(&site.url_ssl),
                    relative_url: page.relative_url.clone(),
                },
                items: page.items.clone(),
                dest: page.relative_url.file_path(OutputKind::Feed),
            });
        }
    }

    let mut seen = HashSet::new();
    for job in &jobs {
        if !seen.insert(job.dest().clone()) {
            return Err(Error::PathCollision(job.dest().clone()));
        }
    }

    Ok(jobs)
}

/// Executes jobs on a bounded worker pool. The job queue is a bounded channel
/// so the producer suspends when workers fall behind; the first failure flips
/// the abort flag and remaining jobs are drained without executing.
fn execute(
    jobs: Vec<Job>,
    threads: usize,
    renderer: &(dyn Renderer + Sync),
    feeds: &(dyn FeedSerializer + Sync),
    sink: &(dyn Sink + Sync),
) -> Result<()> {
    let threads = std::cmp::max(1, threads);
    let (tx, rx) = crossbeam_channel::bounded::<Job>(threads * 2);
    let abort = AtomicBool::new(false);
    let failure: Mutex<Option<Error>> = Mutex::new(None);

    std::thread::scope(|scope| {
        let abort = &abort;
        let failure = &failure;
        for _ in 0..threads {
            let rx = rx.clone();
            scope.spawn(move || {
                for job in rx {
                    if abort.load(Ordering::Relaxed) {
                        continue;
                    }
                    if let Err(err) = run_job(job, renderer, feeds, sink) {
                        abort.store(true, Ordering::Relaxed);
                        let mut slot = match failure.lock() {
                            Ok(slot) => slot,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                    }
                }
            });
        }
        drop(rx);

        for job in jobs {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            if tx.send(job).is_err() {
                break;
            }
        }
        drop(tx);
    });

    match failure.into_inner() {
        Ok(Some(err)) => Err(err),
        Err(poisoned) => match poisoned.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        },
        Ok(None) => Ok(()),
    }
}

fn run_job(
    job: Job,
    renderer: &(dyn Renderer + Sync),
    feeds: &(dyn FeedSerializer + Sync),
    sink: &(dyn Sink + Sync),
) -> Result<()> {
    match job {
        Job::Render { ctx, dest } => {
            let template = ctx.template();
            let contents = renderer.render(&ctx).map_err(|err| Error::Render {
                template,
                path: dest.clone(),
                err,
            })?;
            info!(path = %dest.display(), %template, "write");
            sink.write(OutputFile {
                path: dest,
                contents,
            })?;
        }
        Job::Feed { meta, items, dest } => {
            let contents = feeds.serialize(&meta, &items).map_err(|err| Error::Feed {
                path: dest.clone(),
                err,
            })?;
            info!(path = %dest.display(), "write feed");
            sink.write(OutputFile {
                path: dest,
                contents,
            })?;
        }
    }
    Ok(())
}

/// The result of a pipeline run.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal pipeline failure.
#[derive(Debug)]
pub enum Error {
    /// Returned when the renderer fails for a page; carries the template kind
    /// and destination path for diagnosis.
    Render {
        template: TemplateKind,
        path: PathBuf,
        err: render::Error,
    },

    /// Returned when feed serialization fails.
    Feed { path: PathBuf, err: feed::Error },

    /// Returned when an output file can't be written.
    Write(write::Error),

    /// Returned for pagination invariant violations.
    Paginate(page::Error),

    /// Returned when two pipelines compute the same destination path.
    PathCollision(PathBuf),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Render {
                template,
                path,
                err,
            } => write!(
                f,
                "Rendering `{}` page `{}`: {}",
                template,
                path.display(),
                err
            ),
            Error::Feed { path, err } => {
                write!(f, "Serializing feed `{}`: {}", path.display(), err)
            }
            Error::Write(err) => err.fmt(f),
            Error::Paginate(err) => err.fmt(f),
            Error::PathCollision(path) => {
                write!(
                    f,
                    "Two pipelines produced the same output path `{}`",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Render { err, .. } => Some(err),
            Error::Feed { err, .. } => Some(err),
            Error::Write(err) => Some(err),
            Error::Paginate(err) => Some(err),
            Error::PathCollision(_) => None,
        }
    }
}

impl From<write::Error> for Error {
    /// Converts a [`write::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator when writing output files.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<page::Error> for Error {
    /// Converts a [`page::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator around pagination.
    fn from(err: page::Error) -> Error {
        Error::Paginate(err)
    }
}
