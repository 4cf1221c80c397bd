//! Rewriting of diagram click directives into absolute repository links.
//!
//! The diagram phase asks the model for `click NodeId "path"` directives
//! with repository-relative paths. This pass turns each path into a full
//! GitHub URL, choosing `blob` for file-like paths and `tree` for
//! directories, and leaves every other character of the diagram untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CLICK_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    // click ComponentName "path/to/something"
    Regex::new(r#"click ([^\s"]+)\s+"([^"]+)""#).expect("click directive pattern is valid")
});

/// Rewrite every `click <id> "<path>"` directive in `diagram` into
/// `click <id> "https://github.com/<owner>/<repo>/<blob|tree>/<branch>/<path>"`.
///
/// Pure and deterministic; input without directives is returned unchanged.
///
/// ```
/// use diagramsmith::rewrite::rewrite_click_paths;
///
/// let out = rewrite_click_paths(r#"click A "src/main.go""#, "o", "r", "main");
/// assert_eq!(out, r#"click A "https://github.com/o/r/blob/main/src/main.go""#);
/// ```
pub fn rewrite_click_paths(diagram: &str, owner: &str, repo: &str, branch: &str) -> String {
    CLICK_DIRECTIVE
        .replace_all(diagram, |caps: &Captures<'_>| {
            let id = &caps[1];
            let path = caps[2].trim_matches(['"', '\'']);
            let is_file = path
                .rsplit('/')
                .next()
                .is_some_and(|segment| segment.contains('.'));
            let path_type = if is_file { "blob" } else { "tree" };
            format!(r#"click {id} "https://github.com/{owner}/{repo}/{path_type}/{branch}/{path}""#)
        })
        .into_owned()
}
