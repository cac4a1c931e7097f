// ABOUTME: Remote path helpers for FTP paths.
// ABOUTME: Joining, separator normalization, and case-insensitive comparison.

/// Join a relative path onto a remote directory. Absolute paths are returned as-is.
pub fn join(dir: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.starts_with('\\') {
        return relative.to_string();
    }
    let dir = dir.trim_end_matches(['/', '\\']);
    format!("{}/{}", dir, relative)
}

/// Normalize separators to `/` and resolve `.`, `..` and repeated separators.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Compare two remote paths ignoring ASCII case and separator style.
pub fn same_path(a: &str, b: &str) -> bool {
    normalize(a).eq_ignore_ascii_case(&normalize(b))
}
