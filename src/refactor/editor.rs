// Text ranges scheduled for deletion and the rules for growing, merging and
// applying them

use regex::Regex;
use std::sync::OnceLock;

/// `import`/`export`/`part`/`library` directive through its `;` and line end
fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*(?:import|export|part|library)[\s;'"][^;]*;[^\n]*\n?"#)
            .expect("directive pattern is valid")
    })
}

fn blank_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank pattern is valid"))
}

/// Why an issue's range could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    Empty,
    OutOfBounds { offset: usize, len: usize },
    NotCharBoundary(usize),
}

impl std::fmt::Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeError::Empty => write!(f, "empty range"),
            RangeError::OutOfBounds { offset, len } => {
                write!(f, "offset {} is outside the file ({} bytes)", offset, len)
            }
            RangeError::NotCharBoundary(at) => write!(f, "byte {} is not a character boundary", at),
        }
    }
}

/// Half-open byte range `[start, end)` to delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixRange {
    pub start: usize,
    pub end: usize,
    /// Whether leading doc comments and annotations go with the range
    pub take_leading_comments: bool,
}

impl FixRange {
    /// Clamp an issue's offset/length to the current text
    pub fn clamp(text: &str, offset: usize, length: usize) -> Result<Self, RangeError> {
        if length == 0 {
            return Err(RangeError::Empty);
        }
        if offset >= text.len() {
            return Err(RangeError::OutOfBounds {
                offset,
                len: text.len(),
            });
        }
        let end = offset.saturating_add(length).min(text.len());
        for at in [offset, end] {
            if !text.is_char_boundary(at) {
                return Err(RangeError::NotCharBoundary(at));
            }
        }
        Ok(Self {
            start: offset,
            end,
            take_leading_comments: true,
        })
    }

    pub fn without_leading_comments(mut self) -> Self {
        self.take_leading_comments = false;
        self
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Sort and merge overlapping or adjacent ranges
pub fn merge_ranges(mut ranges: Vec<FixRange>) -> Vec<FixRange> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<FixRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
                last.take_leading_comments &= range.take_leading_comments;
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Grow a range to whole lines and over the comments and annotations above it
pub fn expand_range(text: &str, range: FixRange) -> FixRange {
    let mut expanded = range;

    let line_start = text[..range.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    if text[line_start..range.start].trim().is_empty() {
        expanded.start = line_start;
    }

    let rest_end = text[range.end..]
        .find('\n')
        .map(|i| range.end + i)
        .unwrap_or(text.len());
    let rest = text[range.end..rest_end].trim();
    if rest.is_empty() || rest.starts_with("//") {
        expanded.end = (rest_end + 1).min(text.len());
    }

    if range.take_leading_comments && expanded.start == line_start {
        expanded.start = walk_back(text, expanded.start);
    }
    // nothing follows: drop the blank lines that would trail the file
    if expanded.end == text.len() && expanded.start == line_start_of(text, expanded.start) {
        expanded.start = skip_blank_lines(text, expanded.start);
    }
    expanded
}

fn line_start_of(text: &str, at: usize) -> usize {
    text[..at].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn skip_blank_lines(text: &str, start: usize) -> usize {
    let mut cursor = start;
    while cursor > 0 {
        let line_start = line_start_of(text, cursor - 1);
        if !text[line_start..cursor - 1].trim().is_empty() {
            break;
        }
        cursor = line_start;
    }
    cursor
}

/// Start of the doc comments, comments and annotation lines directly above
/// `start`. Blank lines are only taken when something above them is.
fn walk_back(text: &str, start: usize) -> usize {
    let mut committed = start;
    let mut cursor = start;
    let mut seen_blank = false;

    while cursor > 0 {
        let line_end = cursor - 1;
        let line_start = text[..line_end].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = text[line_start..line_end].trim();

        if line.is_empty() {
            seen_blank = true;
        } else if line.starts_with("///") || line.starts_with('@') {
            committed = line_start;
        } else if line.starts_with("//") && !seen_blank {
            committed = line_start;
        } else if line.ends_with("*/") {
            match block_comment_start(text, line_end, seen_blank) {
                Some(block_start) => {
                    committed = block_start;
                    cursor = block_start;
                    continue;
                }
                None => break,
            }
        } else {
            break;
        }
        cursor = line_start;
    }
    committed
}

/// Line start of the `/* ... */` block closing at `line_end`, if the block
/// opens on a line of its own. Plain block comments follow the `//` rule.
fn block_comment_start(text: &str, line_end: usize, seen_blank: bool) -> Option<usize> {
    let open = text[..line_end].rfind("/*")?;
    let open_line = line_start_of(text, open);
    if !text[open_line..open].trim().is_empty() {
        return None;
    }
    let is_doc = text[open..].starts_with("/**");
    (is_doc || !seen_blank).then_some(open_line)
}

/// Byte spans of all directives in `text`
pub fn directive_spans(text: &str) -> Vec<(usize, usize)> {
    directive_pattern()
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect()
}

/// Move `expanded.start` past any directive it grew into. `original_start`
/// is where the range began before expansion.
pub fn clamp_to_directives(
    expanded: FixRange,
    original_start: usize,
    directives: &[(usize, usize)],
) -> FixRange {
    let mut clamped = expanded;
    for &(start, end) in directives {
        if start < original_start && end > clamped.start {
            clamped.start = end.min(original_start);
        }
    }
    clamped
}

/// Expanded, directive-safe, merged ranges for `ranges`
pub fn plan(text: &str, ranges: Vec<FixRange>) -> Vec<FixRange> {
    let directives = directive_spans(text);
    let expanded = merge_ranges(ranges)
        .into_iter()
        .map(|range| {
            let grown = expand_range(text, range);
            if range.take_leading_comments {
                clamp_to_directives(grown, range.start, &directives)
            } else {
                grown
            }
        })
        .collect();
    merge_ranges(expanded)
}

/// Delete `ranges` back to front, then collapse runs of blank lines
pub fn apply(text: &str, ranges: &[FixRange]) -> String {
    let mut sorted: Vec<&FixRange> = ranges.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));

    let mut out = text.to_string();
    for range in sorted {
        if range.end <= out.len() && range.start < range.end {
            out.replace_range(range.start..range.end, "");
        }
    }
    blank_runs().replace_all(&out, "\n\n").into_owned()
}

/// Nothing but directives, comments and whitespace
pub fn is_effectively_empty(text: &str) -> bool {
    let without_directives = directive_pattern().replace_all(text, "");
    strip_comments(&without_directives).trim().is_empty()
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map(|i| &after[i..]).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map(|i| &after[i + 2..]).unwrap_or("");
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }
    out
}

/// `word` appears in `text` delimited by non-identifier characters
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    text.match_indices(word).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after = text[at + word.len()..].chars().next();
        !before.map(is_ident).unwrap_or(false) && !after.map(is_ident).unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(text: &str, needle: &str) -> FixRange {
        let start = text.find(needle).unwrap();
        FixRange::clamp(text, start, needle.len()).unwrap()
    }

    #[test]
    fn test_clamp_rejects_empty_and_out_of_bounds() {
        assert_eq!(FixRange::clamp("abc", 1, 0), Err(RangeError::Empty));
        assert!(matches!(
            FixRange::clamp("abc", 5, 1),
            Err(RangeError::OutOfBounds { offset: 5, len: 3 })
        ));
        assert_eq!(FixRange::clamp("abc", 1, 10).unwrap().end, 3);
        assert_eq!(FixRange::clamp("é", 1, 1), Err(RangeError::NotCharBoundary(1)));
    }

    #[test]
    fn test_merge_overlapping_and_adjacent() {
        let r = |start, end| FixRange {
            start,
            end,
            take_leading_comments: true,
        };
        let merged = merge_ranges(vec![r(10, 20), r(0, 5), r(5, 8), r(15, 30)]);
        assert_eq!(merged, vec![r(0, 8), r(10, 30)]);
    }

    #[test]
    fn test_expand_takes_doc_comment_and_annotation() {
        let text = "class A {}\n\n/// Docs\n@deprecated\nclass B {}\nclass C {}\n";
        let plan = plan(text, vec![range_of(text, "class B {}")]);
        assert_eq!(apply(text, &plan), "class A {}\n\nclass C {}\n");
    }

    #[test]
    fn test_expand_takes_block_doc_comment() {
        let text = "class Live {}\n\n/**\n * Old helper.\n */\nclass Dead {}\n\nclass Live2 {}\n";
        let plan = plan(text, vec![range_of(text, "class Dead {}")]);
        assert_eq!(apply(text, &plan), "class Live {}\n\nclass Live2 {}\n");
    }

    #[test]
    fn test_block_comment_after_blank_line_is_kept() {
        let text = "/* License text */\n\nclass B {}\nclass C {}\n";
        let plan = plan(text, vec![range_of(text, "class B {}")]);
        assert_eq!(apply(text, &plan), "/* License text */\n\nclass C {}\n");
    }

    #[test]
    fn test_blank_line_stops_plain_comments() {
        let text = "// Copyright header\n\nclass B {}\nclass C {}\n";
        let plan = plan(text, vec![range_of(text, "class B {}")]);
        assert_eq!(apply(text, &plan), "// Copyright header\n\nclass C {}\n");
    }

    #[test]
    fn test_trailing_declaration_takes_blank_lines_above() {
        let text = "class A {}\n\n\nclass B {}\n";
        let plan = plan(text, vec![range_of(text, "class B {}")]);
        assert_eq!(apply(text, &plan), "class A {}\n");
    }

    #[test]
    fn test_single_line_member_keeps_class_intact() {
        let text = "class A { void used() {} void _helper() => used(); }\n";
        let plan = plan(text, vec![range_of(text, "void _helper() => used();")]);
        assert_eq!(apply(text, &plan), "class A { void used() {}  }\n");
    }

    #[test]
    fn test_directives_never_swallowed() {
        let text = "import 'a.dart';\n// ignore: unused\nclass Dead {}\n";
        let dead = range_of(text, "class Dead {}");
        let plan = plan(text, vec![dead]);
        let out = apply(text, &plan);
        assert!(out.starts_with("import 'a.dart';\n"));
        assert!(!out.contains("Dead"));
    }

    #[test]
    fn test_import_range_has_no_backward_walk() {
        let text = "// keep\nimport 'a.dart';\nimport 'b.dart';\n";
        let range = range_of(text, "import 'b.dart';").without_leading_comments();
        let out = apply(text, &plan(text, vec![range]));
        assert_eq!(out, "// keep\nimport 'a.dart';\n");
    }

    #[test]
    fn test_apply_collapses_blank_runs() {
        let text = "a\n\nb\n\nc\n";
        let plan = plan(text, vec![range_of(text, "b")]);
        assert_eq!(apply(text, &plan), "a\n\nc\n");
    }

    #[test]
    fn test_effectively_empty() {
        assert!(is_effectively_empty(
            "library models;\nimport 'a.dart'\n    show A;\n/* c */\n// x\n\n"
        ));
        assert!(!is_effectively_empty("import 'a.dart';\nint x = 1;\n"));
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("void _helper() {}", "_helper"));
        assert!(!contains_word("void _helperTwo() {}", "_helper"));
        assert!(contains_word("import 'a.dart';", "a.dart"));
        assert!(!contains_word("import 'data.dart';", "a.dart"));
    }
}
