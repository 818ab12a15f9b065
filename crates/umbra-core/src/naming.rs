//! Identifier conventions used by the analyzer.
//!
//! File nodes are keyed by their relative path, members by
//! `<file-path>::<name>`, classes optionally carry a `::class` marker and
//! third-party modules live under the `module:` prefix.

pub const DEPENDENCY_PREFIX: &str = "module:";
pub const CLASS_MARKER: &str = "::class";
pub const MEMBER_SEPARATOR: &str = "::";
pub const PATH_SEPARATOR: char = '/';

pub(crate) const VOID: &str = "void";
pub(crate) const NONE_LITERAL: &str = "None";

pub fn is_dependency(id: &str) -> bool {
    id.starts_with(DEPENDENCY_PREFIX)
}

pub fn has_class_marker(id: &str) -> bool {
    id.contains(CLASS_MARKER)
}

/// Module name without the reserved prefix, `None` for ordinary identifiers.
pub fn dependency_name(id: &str) -> Option<&str> {
    id.strip_prefix(DEPENDENCY_PREFIX)
}

/// File path part of a member identifier (`a/b.py::f` -> `a/b.py`).
pub fn file_part(id: &str) -> &str {
    match id.find(MEMBER_SEPARATOR) {
        Some(pos) => &id[..pos],
        None => id,
    }
}

pub fn last_segment(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_name() {
        assert_eq!(dependency_name("module:requests"), Some("requests"));
        assert_eq!(dependency_name("src/requests.py"), None);
        assert!(is_dependency("module:os"));
    }

    #[test]
    fn test_file_part() {
        assert_eq!(file_part("a/b.py::run"), "a/b.py");
        assert_eq!(file_part("a/b.py::Foo::class"), "a/b.py");
        assert_eq!(file_part("a/b.py"), "a/b.py");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("a/b/c.py"), "c.py");
        assert_eq!(last_segment("c.py"), "c.py");
        assert_eq!(last_segment("a/"), "");
    }
}
