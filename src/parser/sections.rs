//! Scanner for the nested `Keyword { ... }` sections of the legacy text format.
//!
//! Sections nest to arbitrary depth (`Model { System { Block { ... } } }`),
//! so a flat pattern match cannot find where one ends. [`find_sections`]
//! locates each opening `Keyword {` and walks forward counting braces to the
//! matching close. Braces inside double-quoted strings are ignored.

/// One `Keyword { body }` occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// Byte offset of the keyword.
    pub start: usize,
    /// Byte offset just past the closing brace.
    pub end: usize,
    /// Text between the braces.
    pub body: &'a str,
}

impl Section<'_> {
    pub fn contains(&self, offset: usize) -> bool {
        offset > self.start && offset < self.end
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Find every `keyword {` section in `text`, nested ones included, in order
/// of their opening. Unbalanced sections are skipped.
pub fn find_sections<'a>(text: &'a str, keyword: &str) -> Vec<Section<'a>> {
    let bytes = text.as_bytes();
    let kw = keyword.as_bytes();
    let mut sections = Vec::new();
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        let at_boundary = i == 0 || !is_ident_byte(bytes[i - 1]);
        if at_boundary && bytes[i..].starts_with(kw) {
            let mut j = i + kw.len();
            if (j < bytes.len() && bytes[j].is_ascii_whitespace()) || bytes.get(j) == Some(&b'{') {
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if bytes.get(j) == Some(&b'{') {
                    match matching_close(bytes, j) {
                        Some(close) => sections.push(Section {
                            start: i,
                            end: close + 1,
                            body: &text[j + 1..close],
                        }),
                        None => {
                            tracing::warn!(offset = i, "unbalanced {} section skipped", keyword);
                        }
                    }
                    // Continue inside the body so nested sections are found too.
                    i = j + 1;
                    continue;
                }
            }
        }
        i += 1;
    }
    sections
}

/// Index of the `}` matching the `{` at `open`.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Net brace depth change of one line and whether it has any brace at all,
/// ignoring braces inside strings.
fn brace_delta(line: &str) -> (isize, bool) {
    let mut delta = 0;
    let mut any = false;
    let mut in_string = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                delta += 1;
                any = true;
            }
            '}' => {
                delta -= 1;
                any = true;
            }
            _ => {}
        }
    }
    (delta, any)
}

/// Parse the value part of a `Key value` line: a quoted string yields its
/// contents, anything else the trimmed remainder of the line.
fn parse_value(rest: &str) -> String {
    let rest = rest.trim();
    if let Some(quoted) = rest.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = quoted.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push('\\');
                        out.push(next);
                    }
                }
                '"' => return out,
                _ => out.push(c),
            }
        }
        return out;
    }
    rest.to_string()
}

/// The `Key value` lines of a section body that are not inside a nested
/// section, in order. Duplicate keys are all returned.
pub fn entries(body: &str) -> Vec<(&str, String)> {
    let mut out = Vec::new();
    let mut depth: isize = 0;
    for raw in body.lines() {
        let line = raw.trim();
        let (delta, has_brace) = brace_delta(line);
        let at_top = depth == 0;
        depth = (depth + delta).max(0);
        if !at_top || has_brace || line.is_empty() || line.starts_with("//") || line.starts_with('#') {
            continue;
        }
        let Some((key, rest)) = line.split_once(|c: char| c.is_whitespace()) else {
            continue;
        };
        if !key.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            continue;
        }
        let value = parse_value(rest);
        if value.is_empty() {
            continue;
        }
        out.push((key, value));
    }
    out
}

/// Value of the first top-level `key value` line in a section body.
pub fn entry(body: &str, key: &str) -> Option<String> {
    entries(body)
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_sections_once_each() {
        let text = r#"
Model {
  System {
    Block {
      BlockType SubSystem
      Name "Outer"
      System {
        Block {
          BlockType Gain
          Name "Inner"
        }
      }
    }
  }
}
"#;
        let blocks = find_sections(text, "Block");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].body.contains("Outer"));
        assert!(blocks[0].body.contains("Inner"));
        assert!(!blocks[1].body.contains("Outer"));
        assert!(blocks[0].contains(blocks[1].start));
    }

    #[test]
    fn keyword_must_be_a_whole_word() {
        let text = "BlockParameterDefaults {\n Block {\n BlockType Gain\n }\n}\nSrcBlock \"x\"\n";
        let blocks = find_sections(text, "Block");
        assert_eq!(blocks.len(), 1);
        assert_eq!(find_sections(text, "BlockParameterDefaults").len(), 1);
    }

    #[test]
    fn braces_in_strings_do_not_nest() {
        let text = "Block {\n  Name \"odd } name {\"\n  BlockType Gain\n}\nBlock {\n BlockType Sum\n}\n";
        let blocks = find_sections(text, "Block");
        assert_eq!(blocks.len(), 2);
        assert_eq!(entry(blocks[0].body, "Name").as_deref(), Some("odd } name {"));
        assert_eq!(entry(blocks[1].body, "BlockType").as_deref(), Some("Sum"));
    }

    #[test]
    fn unbalanced_section_is_skipped() {
        let text = "Block {\n BlockType Gain\n";
        assert!(find_sections(text, "Block").is_empty());
    }

    #[test]
    fn entries_skip_nested_sections() {
        let body = r#"
      BlockType SubSystem
      Name "Controller"
      System {
        Name "ShouldNotLeak"
      }
      Ports [1, 1]
"#;
        let e = entries(body);
        let keys: Vec<&str> = e.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["BlockType", "Name", "Ports"]);
        assert_eq!(e[1].1, "Controller");
        assert_eq!(e[2].1, "[1, 1]");
    }
}
