//! Artifact naming: `<last URL path segment>_<fragment>`.

/// Stem used when the URL path has no usable segment.
const DEFAULT_STEM: &str = "download.bin";

/// Extracts the last path segment from a URL.
///
/// Query and fragment are ignored, as are trailing slashes. Returns `None`
/// if the path is empty/root or the segment is `.`/`..`. Unparseable input
/// falls back to the text after the final `/`.
pub fn last_path_segment(url: &str) -> Option<String> {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .map(str::to_string)?,
        Err(_) => url.rsplit('/').next().unwrap_or_default().to_string(),
    };
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

/// File name for the artifact a task writes: the URL's last segment joined
/// with the task's name fragment by an underscore.
///
/// # Examples
///
/// - `artifact_file_name("https://example.test/repo", "1")` → `"repo_1"`
pub fn artifact_file_name(url: &str, fragment: &str) -> String {
    let stem = last_path_segment(url).unwrap_or_else(|| DEFAULT_STEM.to_string());
    format!("{}_{}", stem, fragment)
}
