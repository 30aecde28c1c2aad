//! Parse raw HTTP response header lines collected by libcurl.

/// Parse collected header lines into `(name, value)` pairs.
///
/// Status lines (`HTTP/1.1 200 OK`) and blank separators are skipped. Names
/// keep their original case; lookups compare case-insensitively.
pub(crate) fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with("HTTP/") {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            headers.push((name.to_string(), value.trim().to_string()));
        }
    }
    headers
}

/// True if `line` opens a new response header block (after a redirect or 100-continue).
pub(crate) fn is_status_line(line: &str) -> bool {
    line.starts_with("HTTP/")
}
