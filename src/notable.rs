// src/notable.rs

//! Picks diagnostic-looking lines out of captured command output, so
//! summaries can surface warnings without dumping whole logs.

use std::sync::LazyLock;

use regex::Regex;

static MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)error|warn|fail").expect("marker pattern is a valid regex")
});

/// Return every line of `texts` containing `error`, `warn` or `fail` in any
/// casing.
///
/// Lines keep their input order (texts are scanned in the order given) and
/// their original casing; surrounding whitespace is trimmed.
pub fn extract<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    texts
        .into_iter()
        .flat_map(str::lines)
        .filter(|line| MARKERS.is_match(line))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Whether a single line would be kept by [`extract`].
pub fn is_notable(line: &str) -> bool {
    MARKERS.is_match(line)
}
