//! Comment text handling.
//!
//! Marker stripping turns one raw comment into content lines; normalization
//! then works on plain text and is idempotent.

/// Minimum length of a banner line.
const BANNER_MIN_LEN: usize = 3;

/// Content lines of a raw comment, with comment markers removed.
///
/// `//`, `///` and `//!` lose their marker; block comments lose `/*`,
/// `/**`, `/*!`, `*/` and a leading `*` on continuation lines. Leading
/// whitespace is kept so normalization can dedent consistently.
pub fn strip_markers(raw: &str) -> Vec<String> {
    let raw = raw.trim_end();

    if let Some(body) = raw.strip_prefix("//") {
        let body = body
            .strip_prefix('/')
            .or_else(|| body.strip_prefix('!'))
            .unwrap_or(body);
        return vec![body.to_string()];
    }

    if let Some(body) = raw.strip_prefix("/*") {
        let body = body.strip_suffix("*/").unwrap_or(body);
        let body = body
            .strip_prefix('*')
            .or_else(|| body.strip_prefix('!'))
            .unwrap_or(body);

        return body
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let line = line.trim_end();
                if i == 0 {
                    return line.to_string();
                }
                let trimmed = line.trim_start();
                match trimmed.strip_prefix('*') {
                    Some(rest) if !trimmed.starts_with("*/") => rest.to_string(),
                    _ => line.to_string(),
                }
            })
            .collect();
    }

    raw.lines().map(str::to_string).collect()
}

/// Normalize docstring text.
///
/// Removes the common leading-whitespace prefix of the non-blank lines,
/// trims trailing whitespace and drops blank leading and trailing lines.
/// Internal blank lines are preserved.
pub fn normalize_docstring(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let prefix = common_indent(lines);
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                ""
            } else {
                &line[prefix.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest whitespace prefix shared by every non-blank line.
fn common_indent<'a>(lines: &[&'a str]) -> &'a str {
    let mut prefix: Option<&'a str> = None;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        let indent_len = line.len() - line.trim_start().len();
        let indent = &line[..indent_len];
        prefix = Some(match prefix {
            None => indent,
            Some(p) => {
                let shared = p
                    .char_indices()
                    .zip(indent.chars())
                    .find(|((_, a), b)| a != b)
                    .map_or(p.len().min(indent.len()), |((i, _), _)| i);
                &p[..shared]
            }
        });
    }
    prefix.unwrap_or("")
}

/// Normalized docstring for a run of raw comments.
pub fn docstring_from_comments<'a>(raw: impl IntoIterator<Item = &'a str>) -> String {
    let lines: Vec<String> = raw.into_iter().flat_map(strip_markers).collect();
    normalize_docstring(&lines.join("\n"))
}

/// Whether `line` is a single punctuation character repeated at least three times.
fn is_rule(line: &str) -> bool {
    let line = line.trim();
    let mut chars = line.chars();
    match chars.next() {
        Some(c) if c.is_ascii_punctuation() => {
            line.len() >= BANNER_MIN_LEN && chars.all(|other| other == c)
        }
        _ => false,
    }
}

/// Whether a raw comment line is a banner (`////////`, `// ------`).
pub fn is_banner_line(raw: &str) -> bool {
    if is_rule(raw) {
        return true;
    }
    let lines: Vec<String> = strip_markers(raw)
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect();
    !lines.is_empty() && lines.iter().all(|l| is_rule(l))
}

/// Title of a banner run: its non-banner lines, normalized. `None` when the
/// run holds no banner line.
pub fn banner_title<'a>(raw: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut found = false;
    let mut lines = Vec::new();
    for comment in raw {
        if is_banner_line(comment) {
            found = true;
            continue;
        }
        for line in strip_markers(comment) {
            if is_rule(&line) {
                found = true;
            } else {
                lines.push(line);
            }
        }
    }
    found.then(|| normalize_docstring(&lines.join("\n")))
}
