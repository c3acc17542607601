//! Char-boundary safe text bounding for channel display.

/// Keep at most `max` characters from the start of `text`.
#[must_use]
pub fn head_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Keep at most `max` characters from the end of `text`.
///
/// Log output is most useful at its tail, so evidence is bounded this way.
#[must_use]
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    match text.char_indices().nth(count - max) {
        Some((idx, _)) => text[idx..].to_string(),
        None => String::new(),
    }
}

/// Keep the last `n` non-empty lines of `text`.
#[must_use]
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_chars() {
        assert_eq!(head_chars("abcdef", 3), "abc");
        assert_eq!(head_chars("abc", 10), "abc");
        assert_eq!(head_chars("ééé", 2), "éé");
    }

    #[test]
    fn test_tail_chars() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 3), "abc");
        assert_eq!(tail_chars("xyzé", 1), "é");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn test_tail_lines_skips_blank_lines() {
        let logs = "one\n\ntwo\nthree\n\nfour\n";
        assert_eq!(tail_lines(logs, 2), "three\nfour");
        assert_eq!(tail_lines(logs, 10), "one\ntwo\nthree\nfour");
        assert_eq!(tail_lines("", 3), "");
    }
}
