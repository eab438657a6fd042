//! Recursive glob resolution.
//!
//! The host glob primitive only matches one directory level per segment.
//! [`GlobResolver`] adds the `**` segment ("zero or more directories") on
//! top of it by splitting the pattern at the first `/**/`, globbing the
//! prefix, and recursing into every subdirectory:
//!
//! ```text
//! a/**/x.txt  =  a/x.txt                  (zero levels, single-segment remainder only)
//!             ∪  a/*/x.txt                (one level, `**` taken literally)
//!             ∪  resolve(d/**/x.txt)      for every directory d in a/*
//! ```
//!
//! # Example
//!
//! ```no_run
//! use xfs::resolver::{GlobFlags, GlobResolver};
//!
//! let sources = GlobResolver::new().resolve("src/**/*.rs", GlobFlags::NONE)?;
//! # Ok::<(), xfs::error::GlobError>(())
//! ```

use std::collections::HashSet;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};
use tracing::{debug, trace, warn};

use crate::error::{GlobError, GlobResult, XfsError, XfsResult};

/// Separator around a recursive wildcard segment.
const RECURSIVE_SEGMENT: &str = "/**/";

// =============================================================================
// Flags
// =============================================================================

/// Flags forwarded to the glob primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GlobFlags(u32);

impl GlobFlags {
    pub const NONE: GlobFlags = GlobFlags(0);
    /// Return only directories.
    pub const ONLY_DIR: GlobFlags = GlobFlags(1 << 0);
    /// Keep discovery order instead of sorting.
    pub const NO_SORT: GlobFlags = GlobFlags(1 << 1);
    /// Append a separator to every directory.
    pub const MARK: GlobFlags = GlobFlags(1 << 2);
    /// Return the pattern itself when nothing matches.
    pub const NO_CHECK: GlobFlags = GlobFlags(1 << 3);
    /// Fail on unreadable directories instead of skipping them.
    pub const ERR: GlobFlags = GlobFlags(1 << 4);

    const ALL: u32 = 0b1_1111;

    /// Build flags from raw bits, rejecting unknown ones.
    pub fn from_bits(bits: u32) -> XfsResult<Self> {
        if bits & !Self::ALL != 0 {
            return Err(XfsError::InvalidArgument(format!(
                "unknown glob flags {:#x}",
                bits & !Self::ALL
            )));
        }
        Ok(GlobFlags(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: GlobFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn without(self, other: GlobFlags) -> GlobFlags {
        GlobFlags(self.0 & !other.0)
    }
}

impl BitOr for GlobFlags {
    type Output = GlobFlags;

    fn bitor(self, rhs: GlobFlags) -> GlobFlags {
        GlobFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for GlobFlags {
    fn bitor_assign(&mut self, rhs: GlobFlags) {
        self.0 |= rhs.0;
    }
}

// =============================================================================
// Primitive
// =============================================================================

/// A non-recursive glob: `*`, `?` and `[...]` within single path segments.
///
/// A `**` segment must be treated as an ordinary one-level wildcard.
pub trait SegmentGlob {
    fn glob(&self, pattern: &str, flags: GlobFlags) -> GlobResult<Vec<PathBuf>>;
}

/// [`SegmentGlob`] backed by the `glob` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostGlob;

impl HostGlob {
    fn options() -> glob::MatchOptions {
        glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        }
    }
}

impl SegmentGlob for HostGlob {
    fn glob(&self, pattern: &str, flags: GlobFlags) -> GlobResult<Vec<PathBuf>> {
        let single_level = flatten_recursive_segments(pattern);
        let paths = glob::glob_with(&single_level, Self::options()).map_err(|source| {
            GlobError::Pattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) if flags.contains(GlobFlags::ERR) => return Err(e.into()),
                Err(e) => {
                    warn!(pattern, error = %e, "skipping unreadable glob entry");
                    continue;
                }
            };

            let is_dir = path.is_dir();
            if flags.contains(GlobFlags::ONLY_DIR) && !is_dir {
                continue;
            }
            if flags.contains(GlobFlags::MARK) && is_dir {
                matches.push(mark(path));
            } else {
                matches.push(path);
            }
        }

        if !flags.contains(GlobFlags::NO_SORT) {
            matches.sort();
        }
        if matches.is_empty() && flags.contains(GlobFlags::NO_CHECK) {
            matches.push(PathBuf::from(pattern));
        }
        Ok(matches)
    }
}

/// The `glob` crate treats a `**` segment as recursive; degrade it to `*`.
fn flatten_recursive_segments(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| if segment == "**" { "*" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn mark(path: PathBuf) -> PathBuf {
    let mut marked = path.into_os_string();
    marked.push(MAIN_SEPARATOR_STR);
    PathBuf::from(marked)
}

// =============================================================================
// Resolver
// =============================================================================

/// Deduplicated matches in first-seen order.
#[derive(Debug, Default)]
struct MatchSet {
    seen: HashSet<PathBuf>,
    paths: Vec<PathBuf>,
}

impl MatchSet {
    fn extend(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if self.seen.insert(path.clone()) {
                self.paths.push(path);
            }
        }
    }

    fn into_vec(self) -> Vec<PathBuf> {
        self.paths
    }
}

/// Split a pattern at its first recursive segment.
///
/// Returns `(prefix, remainder)` without the separating slashes.
pub fn split_recursive(pattern: &str) -> Option<(&str, &str)> {
    pattern.split_once(RECURSIVE_SEGMENT)
}

/// Resolves glob patterns that may contain a `**` segment.
#[derive(Debug, Clone, Default)]
pub struct GlobResolver<G = HostGlob> {
    primitive: G,
}

impl GlobResolver<HostGlob> {
    pub fn new() -> Self {
        Self { primitive: HostGlob }
    }
}

impl<G: SegmentGlob> GlobResolver<G> {
    /// Use a custom non-recursive primitive.
    pub fn with_primitive(primitive: G) -> Self {
        Self { primitive }
    }

    /// Return every distinct path matching `pattern`.
    ///
    /// Results are sorted unless [`GlobFlags::NO_SORT`] is given. Symlinked
    /// directories are followed; a directory already on the current
    /// recursion chain is skipped, so symlink cycles terminate.
    pub fn resolve(&self, pattern: &str, flags: GlobFlags) -> GlobResult<Vec<PathBuf>> {
        // Sorting and the no-match fallback apply to the union, not to each branch.
        let branch_flags = flags.without(GlobFlags::NO_CHECK) | GlobFlags::NO_SORT;

        let mut matches = MatchSet::default();
        let mut chain = Vec::new();
        self.expand(pattern, None, branch_flags, &mut chain, &mut matches)?;

        let mut paths = matches.into_vec();
        if !flags.contains(GlobFlags::NO_SORT) {
            paths.sort();
        }
        if paths.is_empty() && flags.contains(GlobFlags::NO_CHECK) {
            paths.push(PathBuf::from(pattern));
        }

        debug!(pattern, matches = paths.len(), "resolved glob");
        Ok(paths)
    }

    /// `location` is the directory the prefix of `pattern` denotes, when it
    /// is known; the prefix itself is glob-escaped below the top level.
    fn expand(
        &self,
        pattern: &str,
        location: Option<&Path>,
        flags: GlobFlags,
        chain: &mut Vec<PathBuf>,
        matches: &mut MatchSet,
    ) -> GlobResult<()> {
        let Some((prefix, remainder)) = split_recursive(pattern) else {
            matches.extend(self.primitive.glob(pattern, flags)?);
            return Ok(());
        };
        trace!(prefix, remainder, "expanding recursive segment");

        let mut dir_flags = GlobFlags::ONLY_DIR | GlobFlags::NO_SORT;
        if flags.contains(GlobFlags::ERR) {
            dir_flags |= GlobFlags::ERR;
        }
        let dirs = self.primitive.glob(&format!("{}/*", prefix), dir_flags)?;

        // `**` taken literally: exactly one level below the prefix.
        matches.extend(self.primitive.glob(pattern, flags)?);

        // `**` matching zero levels.
        if !remainder.contains('/') {
            matches.extend(
                self.primitive
                    .glob(&format!("{}/{}", prefix, remainder), flags)?,
            );
        }

        let location = location.unwrap_or_else(|| Path::new(prefix));
        let pushed = match location.canonicalize() {
            Ok(dir) => {
                chain.push(dir);
                true
            }
            Err(_) => false,
        };
        let result = self.expand_children(dirs, remainder, flags, chain, matches);
        if pushed {
            chain.pop();
        }
        result
    }

    fn expand_children(
        &self,
        dirs: Vec<PathBuf>,
        remainder: &str,
        flags: GlobFlags,
        chain: &mut Vec<PathBuf>,
        matches: &mut MatchSet,
    ) -> GlobResult<()> {
        for dir in dirs {
            if let Ok(canonical) = dir.canonicalize() {
                if chain.contains(&canonical) {
                    warn!(dir = %dir.display(), "skipping directory cycle");
                    continue;
                }
            }

            let literal_dir = glob::Pattern::escape(&dir.to_string_lossy());
            let sub_pattern = format!("{}{}{}", literal_dir, RECURSIVE_SEGMENT, remainder);
            self.expand(&sub_pattern, Some(dir.as_path()), flags, chain, matches)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs::{create_dir_all, File};
    use tempfile::TempDir;

    fn touch(base: &Path, rel: &str) {
        let path = base.join(rel);
        if let Some(parent) = path.parent() {
            create_dir_all(parent).unwrap();
        }
        File::create(path).unwrap();
    }

    fn pattern(base: &Path, rel: &str) -> String {
        format!("{}/{}", base.display(), rel)
    }

    fn relative(base: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        let mut rel: Vec<String> = paths
            .into_iter()
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        rel.sort();
        rel
    }

    /// Primitive answering from a fixed table and recording every call.
    struct FakeGlob {
        answers: HashMap<String, Vec<PathBuf>>,
        calls: RefCell<Vec<(String, GlobFlags)>>,
    }

    impl FakeGlob {
        fn new(answers: &[(&str, &[&str])]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(p, paths)| (p.to_string(), paths.iter().map(PathBuf::from).collect()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn patterns(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(p, _)| p.clone()).collect()
        }
    }

    impl SegmentGlob for FakeGlob {
        fn glob(&self, pattern: &str, flags: GlobFlags) -> GlobResult<Vec<PathBuf>> {
            self.calls.borrow_mut().push((pattern.to_string(), flags));
            Ok(self.answers.get(pattern).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn test_split_recursive() {
        assert_eq!(split_recursive("a/**/x.txt"), Some(("a", "x.txt")));
        assert_eq!(split_recursive("a/**/b/**/x"), Some(("a", "b/**/x")));
        assert_eq!(split_recursive("a/*/x.txt"), None);
    }

    #[test]
    fn test_flatten_recursive_segments() {
        assert_eq!(flatten_recursive_segments("a/**/b/**"), "a/*/b/*");
        assert_eq!(flatten_recursive_segments("a/x**y/b"), "a/x**y/b");
    }

    #[test]
    fn test_flags_from_bits() {
        let flags = GlobFlags::from_bits(0b101).unwrap();
        assert!(flags.contains(GlobFlags::ONLY_DIR));
        assert!(flags.contains(GlobFlags::MARK));
        assert!(!flags.contains(GlobFlags::NO_SORT));
        assert_eq!(flags.bits(), 0b101);

        let err = GlobFlags::from_bits(1 << 9).unwrap_err();
        assert!(matches!(err, XfsError::InvalidArgument(_)));
    }

    #[test]
    fn test_expansion_steps_with_fake_primitive() {
        let fake = FakeGlob::new(&[
            ("a/*", &["a/b"]),
            ("a/**/x.txt", &["a/b/x.txt"]),
            ("a/x.txt", &["a/x.txt"]),
            ("a/b/*", &["a/b/c"]),
            ("a/b/**/x.txt", &["a/b/c/x.txt"]),
            ("a/b/x.txt", &["a/b/x.txt"]),
        ]);
        let resolver = GlobResolver::with_primitive(fake);
        let found = resolver.resolve("a/**/x.txt", GlobFlags::NONE).unwrap();

        // a/b/x.txt is reached twice but listed once.
        assert_eq!(
            found,
            vec![
                PathBuf::from("a/b/c/x.txt"),
                PathBuf::from("a/b/x.txt"),
                PathBuf::from("a/x.txt"),
            ]
        );

        let calls = resolver.primitive.patterns();
        assert_eq!(calls[0], "a/*");
        assert!(calls.contains(&"a/b/c/*".to_string()));
    }

    #[test]
    fn test_zero_level_skipped_for_nested_remainder() {
        let fake = FakeGlob::new(&[("a/sub/x.txt", &["a/sub/x.txt"])]);
        let resolver = GlobResolver::with_primitive(fake);
        let found = resolver.resolve("a/**/sub/x.txt", GlobFlags::NONE).unwrap();

        assert!(found.is_empty());
        assert!(!resolver
            .primitive
            .patterns()
            .contains(&"a/sub/x.txt".to_string()));
    }

    #[test]
    fn test_err_flag_reaches_directory_listing() {
        let fake = FakeGlob::new(&[("a/*", &["a/b"])]);
        let resolver = GlobResolver::with_primitive(fake);
        resolver
            .resolve("a/**/x.txt", GlobFlags::ERR | GlobFlags::MARK)
            .unwrap();

        let calls = resolver.primitive.calls.borrow();
        let listings: Vec<GlobFlags> = calls
            .iter()
            .filter(|(p, _)| p.ends_with("/*"))
            .map(|(_, flags)| *flags)
            .collect();
        assert_eq!(listings.len(), 2);
        for flags in listings {
            assert!(flags.contains(GlobFlags::ONLY_DIR | GlobFlags::ERR));
            assert!(!flags.contains(GlobFlags::MARK));
        }
    }

    #[test]
    fn test_no_check_applies_to_union_only() {
        let resolver = GlobResolver::with_primitive(FakeGlob::new(&[]));
        let found = resolver.resolve("a/**/x.txt", GlobFlags::NO_CHECK).unwrap();
        assert_eq!(found, vec![PathBuf::from("a/**/x.txt")]);
    }

    #[test]
    fn test_resolve_nested_tree() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/b/c/x.txt");
        touch(base, "a/x.txt");
        touch(base, "a/b/y.txt");

        let found = GlobResolver::new()
            .resolve(&pattern(base, "a/**/x.txt"), GlobFlags::NONE)
            .unwrap();

        assert_eq!(relative(base, found), vec!["a/b/c/x.txt", "a/x.txt"]);
    }

    #[test]
    fn test_resolve_wildcard_remainder() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "fixtures/server/main.rs");
        touch(base, "fixtures/family.rs");
        touch(base, "fixtures/family.csv");
        touch(base, "fixtures/deep/er/trait.rs");

        let found = GlobResolver::new()
            .resolve(&pattern(base, "fixtures/**/*.rs"), GlobFlags::NONE)
            .unwrap();

        assert_eq!(
            relative(base, found),
            vec![
                "fixtures/deep/er/trait.rs",
                "fixtures/family.rs",
                "fixtures/server/main.rs",
            ]
        );
    }

    #[test]
    fn test_union_property() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/x.txt");
        touch(base, "a/b/x.txt");
        touch(base, "a/b/c/x.txt");
        touch(base, "a/d/e/f/x.txt");

        let resolver = GlobResolver::new();
        let whole = resolver
            .resolve(&pattern(base, "a/**/x.txt"), GlobFlags::NONE)
            .unwrap();

        let mut union = MatchSet::default();
        union.extend(HostGlob.glob(&pattern(base, "a/x.txt"), GlobFlags::NONE).unwrap());
        union.extend(HostGlob.glob(&pattern(base, "a/**/x.txt"), GlobFlags::NONE).unwrap());
        for sub in HostGlob.glob(&pattern(base, "a/*"), GlobFlags::ONLY_DIR).unwrap() {
            let sub_pattern = format!("{}/**/x.txt", sub.display());
            union.extend(resolver.resolve(&sub_pattern, GlobFlags::NONE).unwrap());
        }
        let mut union = union.into_vec();
        union.sort();

        assert_eq!(whole, union);
        let distinct: HashSet<_> = whole.iter().collect();
        assert_eq!(distinct.len(), whole.len());
        assert_eq!(whole.len(), 4);
    }

    #[test]
    fn test_pattern_without_recursive_segment() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "one.txt");
        touch(base, "two.txt");
        touch(base, "sub/three.txt");

        let found = GlobResolver::new()
            .resolve(&pattern(base, "*.txt"), GlobFlags::NONE)
            .unwrap();
        assert_eq!(relative(base, found), vec!["one.txt", "two.txt"]);
    }

    #[test]
    fn test_hidden_entries_need_literal_dot() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/.hidden/x.txt");
        touch(base, "a/shown/x.txt");

        let found = GlobResolver::new()
            .resolve(&pattern(base, "a/**/x.txt"), GlobFlags::NONE)
            .unwrap();
        assert_eq!(relative(base, found), vec!["a/shown/x.txt"]);
    }

    #[test]
    fn test_only_dir_and_mark() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/b/file.txt");
        create_dir_all(base.join("a/b/c")).unwrap();

        let found = GlobResolver::new()
            .resolve(&pattern(base, "a/**/*"), GlobFlags::ONLY_DIR | GlobFlags::MARK)
            .unwrap();

        assert_eq!(found.len(), 2);
        assert!(found
            .iter()
            .all(|p| p.to_string_lossy().ends_with(MAIN_SEPARATOR_STR)));
        let nested = format!("c{}", MAIN_SEPARATOR_STR);
        assert!(found.iter().any(|p| p.to_string_lossy().ends_with(&nested)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/b/x.txt");
        std::os::unix::fs::symlink(base.join("a"), base.join("a/b/loop")).unwrap();

        let found = GlobResolver::new()
            .resolve(&pattern(base, "a/**/x.txt"), GlobFlags::NONE)
            .unwrap();

        assert_eq!(relative(base, found), vec!["a/b/x.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_under_bracketed_dir() {
        let dir = TempDir::new().unwrap();
        let base = dir.path();
        touch(base, "a/[x]/f.txt");
        std::os::unix::fs::symlink(base.join("a"), base.join("a/[x]/loop")).unwrap();

        let found = GlobResolver::new()
            .resolve(&pattern(base, "a/**/f.txt"), GlobFlags::NONE)
            .unwrap();

        assert_eq!(relative(base, found), vec!["a/[x]/f.txt"]);
    }
}
