//! Sorting and grouping over the full post collection. The sorter buffers
//! everything (pagination needs global order); the groupers partition the
//! sorted collection by tag and by author while preserving that order within
//! each group. Groups borrow the posts they reference; they exist only long
//! enough to be paginated.

use crate::post::Post;
use std::collections::BTreeMap;

/// A named partition of the post collection: every post in `posts` carries
/// the tag (or author) `key` refers to, in sorted order.
pub struct Group<'a> {
    pub key: String,
    pub posts: Vec<&'a Post>,
}

/// Sorts posts newest-first. The sort is stable, so posts with equal
/// timestamps keep their input stream order.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

/// Partitions posts by tag name. A post with N tags appears in N groups; a
/// post with no tags appears in none. Groups are emitted in key order so a
/// build is reproducible.
pub fn group_by_tag<'a>(posts: &[&'a Post]) -> Vec<Group<'a>> {
    let mut groups: BTreeMap<String, Vec<&'a Post>> = BTreeMap::new();
    for &post in posts {
        for tag in &post.tags {
            groups.entry(tag.name.clone()).or_default().push(post);
        }
    }
    into_groups(groups)
}

/// Partitions posts by author slug. Every post appears in exactly one group;
/// the default author's group collects posts with unknown or unset authors.
pub fn group_by_author<'a>(posts: &[&'a Post]) -> Vec<Group<'a>> {
    let mut groups: BTreeMap<String, Vec<&'a Post>> = BTreeMap::new();
    for &post in posts {
        groups
            .entry(post.author.slug.clone())
            .or_default()
            .push(post);
    }
    into_groups(groups)
}

fn into_groups(map: BTreeMap<String, Vec<&Post>>) -> Vec<Group> {
    map.into_iter()
        .map(|(key, posts)| Group { key, posts })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::AuthorRegistry;
    use crate::markdown;
    use crate::post::Normalizer;
    use crate::source::SourceFile;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn posts(specs: &[(&str, &str)]) -> Vec<Post> {
        let registry = AuthorRegistry::new(BTreeMap::new());
        let mut normalizer = Normalizer::new(&registry);
        specs
            .iter()
            .map(|(path, contents)| {
                let file = SourceFile {
                    path: PathBuf::from(path),
                    contents: (*contents).to_owned(),
                    ctime: None,
                };
                let doc = markdown::parse(&file.path, &file.contents);
                normalizer.normalize(&file, doc)
            })
            .collect()
    }

    #[test]
    fn test_sort_newest_first() {
        let mut posts = posts(&[
            ("2014-01-01-old.md", "x"),
            ("2016-01-01-new.md", "x"),
            ("2015-01-01-mid.md", "x"),
        ]);
        sort_posts(&mut posts);
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec!["2016-01-01-new", "2015-01-01-mid", "2014-01-01-old"]
        );
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let mut posts = posts(&[
            ("2014-01-01-first.md", "x"),
            ("2014-01-01-second.md", "x"),
            ("2014-01-01-third.md", "x"),
        ]);
        sort_posts(&mut posts);
        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_group_by_tag_completeness() {
        let posts = posts(&[
            ("2014-01-01-a.md", "---\ntags: rust web\n---\nx"),
            ("2014-01-02-b.md", "---\ntags: rust\n---\nx"),
            ("2014-01-03-c.md", "x"),
        ]);
        let refs: Vec<&Post> = posts.iter().collect();
        let groups = group_by_tag(&refs);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["rust", "web"]);

        let rust = &groups[0];
        assert_eq!(rust.posts.len(), 2);
        let web = &groups[1];
        assert_eq!(web.posts.len(), 1);
        // the untagged post appears in no group
        let total: usize = groups.iter().map(|g| g.posts.len()).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_group_by_tag_preserves_order_within_group() {
        let mut posts = posts(&[
            ("2014-01-01-old.md", "---\ntags: t\n---\nx"),
            ("2016-01-01-new.md", "---\ntags: t\n---\nx"),
        ]);
        sort_posts(&mut posts);
        let refs: Vec<&Post> = posts.iter().collect();
        let groups = group_by_tag(&refs);
        let slugs: Vec<&str> = groups[0].posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["2016-01-01-new", "2014-01-01-old"]);
    }

    #[test]
    fn test_group_by_author_exactly_one_group_per_post() {
        let posts = posts(&[("a.md", "x"), ("b.md", "x")]);
        let refs: Vec<&Post> = posts.iter().collect();
        let groups = group_by_author(&refs);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "anonymous");
        assert_eq!(groups[0].posts.len(), 2);
    }

    #[test]
    fn test_no_empty_groups() {
        let groups = group_by_tag(&[]);
        assert!(groups.is_empty());
    }
}
