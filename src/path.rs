//! Path expressions — dotted, space-separated, or pre-split.
//!
//! `"a.b.c"` and `"a b c"` resolve to the same segment sequence.

/// Split a path expression into segments.
///
/// A string containing `.` splits on dots; otherwise it splits on
/// whitespace. The empty string resolves to no segments at all.
pub fn resolve(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    if path.contains('.') {
        path.split('.').map(str::to_string).collect()
    } else {
        path.split_whitespace().map(str::to_string).collect()
    }
}

/// Anything usable as a command path: a path expression, or an
/// already-split segment sequence (used as-is).
pub trait IntoPath {
    fn into_path(self) -> Vec<String>;
}

impl IntoPath for &str {
    fn into_path(self) -> Vec<String> {
        resolve(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Vec<String> {
        resolve(&self)
    }
}

impl IntoPath for Vec<String> {
    fn into_path(self) -> Vec<String> {
        self
    }
}

impl IntoPath for &[String] {
    fn into_path(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoPath for &[&str] {
    fn into_path(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoPath for &[&str; N] {
    fn into_path(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Turn a Rust identifier into a segment name: lowercase, with leading and
/// trailing underscores stripped. `"List_"` → `"list"`, `"_dir"` → `"dir"`.
pub fn clean_segment(name: &str) -> String {
    name.to_lowercase()
        .trim_matches('_')
        .to_string()
}

/// Clean every segment of a dotted qualified name.
pub fn clean_qualname(qualname: &str) -> Vec<String> {
    qualname.split('.').map(clean_segment).collect()
}
