//! Glob matching for entry paths

/// Case-insensitive glob match supporting `*` and `?`.
///
/// The pattern is tried against the file name and then the full path, so
/// `*.mid` matches `songs/foo/foo.mid`.
#[must_use]
pub fn matches_glob(pattern: &str, full_path: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let file_name = full_path.rsplit('/').next().unwrap_or(full_path);

    [file_name, full_path].iter().any(|text| {
        let text: Vec<char> = text.chars().collect();
        glob_at(&pattern, &text)
    })
}

fn glob_at(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| glob_at(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && glob_at(rest, &text[1..]),
        Some((c, rest)) => text
            .split_first()
            .is_some_and(|(t, tail)| t.eq_ignore_ascii_case(c) && glob_at(rest, tail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_file_name_or_path() {
        assert!(matches_glob("*.mid", "songs/foo/foo.mid"));
        assert!(matches_glob("songs/*/foo.MID", "songs/foo/foo.mid"));
        assert!(matches_glob("fo?.mid", "songs/foo/foo.mid"));
        assert!(!matches_glob("*.mogg", "songs/foo/foo.mid"));
        assert!(!matches_glob("f?.mid", "foo.mid"));
    }
}
