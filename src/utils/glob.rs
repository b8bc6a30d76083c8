//! Glob matching for suppression keys, suppression file scopes and ignore
//! patterns.
//!
//! Suppression keys are matched segment-wise (`:`-separated, `*` matches one
//! whole segment). File patterns use path globs where `*` stays inside one
//! path component and `**` crosses directories. Both matchers are
//! deliberately glob, not regex: the match rules stay unambiguous and cheap.

/// Match a `frame:rule:target` suppression key against a rule pattern.
///
/// Each `:`-separated pattern segment must equal the key segment, be the `*`
/// wildcard, or be a prefix/suffix glob like `missing_*`. Segment counts must
/// agree.
pub fn key_match(pattern: &str, key: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split(':').collect();
    let key_segments: Vec<&str> = key.split(':').collect();

    if pattern_segments.len() != key_segments.len() {
        return false;
    }

    pattern_segments
        .iter()
        .zip(key_segments.iter())
        .all(|(p, k)| segment_match(p, k))
}

fn segment_match(pattern: &str, segment: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == segment;
    }
    // Within a segment, `*` matches any run of characters
    wildcard_match(pattern.as_bytes(), segment.as_bytes())
}

/// Match a file path against a glob pattern.
///
/// `*` matches within one path component, `**` matches across components.
/// Patterns and paths are compared on `/`-separated components.
pub fn path_match(pattern: &str, path: &str) -> bool {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    components_match(&pattern_parts, &path_parts)
}

fn components_match(pattern: &[&str], path: &[&str]) -> bool {
    match (pattern.first(), path.first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some(&"**"), _) => {
            // `**` swallows zero or more leading components
            if components_match(&pattern[1..], path) {
                return true;
            }
            match path.first() {
                Some(_) => components_match(pattern, &path[1..]),
                None => false,
            }
        }
        (Some(_), None) => false,
        (Some(p), Some(c)) => {
            wildcard_match(p.as_bytes(), c.as_bytes()) && components_match(&pattern[1..], &path[1..])
        }
    }
}

/// Iterative wildcard match where `*` matches any run of bytes (never `/`,
/// callers split on separators first) and `?` matches one byte.
fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == text[t] || pattern[p] == b'?') {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
