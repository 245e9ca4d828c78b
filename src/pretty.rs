//! Brace-aware re-indentation of decompiled source.
//!
//! Works on text only. Each object literal outside a string is collapsed to
//! one line and then re-flowed: short flat objects stay inline, everything
//! else gets one property per line. The width limit counts the line up to
//! the end of the object. Objects holding an escaped newline are left alone,
//! and objects nested deeper than `MAX_REFLOW_DEPTH` stay collapsed.

const INDENT: &str = "  ";
const MAX_INLINE_PROPERTIES: usize = 3;
const MAX_INLINE_WIDTH: usize = 80;
const MAX_REFLOW_DEPTH: usize = 32;

/// Characters of `text` with their byte offsets, flagged `true` when they
/// sit outside string literals. Quotes themselves count as string text.
struct CodeChars<'a> {
    chars: std::str::CharIndices<'a>,
    quote: Option<char>,
    escaped: bool,
}

impl<'a> CodeChars<'a> {
    fn new(text: &'a str) -> Self {
        CodeChars {
            chars: text.char_indices(),
            quote: None,
            escaped: false,
        }
    }
}

impl Iterator for CodeChars<'_> {
    type Item = (usize, char, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, ch) = self.chars.next()?;

        let in_code = match self.quote {
            Some(quote) => {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                false
            }
            None if ch == '"' || ch == '\'' => {
                self.quote = Some(ch);
                false
            }
            None => true,
        };
        Some((index, ch, in_code))
    }
}

pub fn pretty_print(text: &str) -> String {
    format_segment(text, 0, 0)
}

/// Re-flow every outermost object literal in `text`, which starts at
/// `column` of its line.
fn format_segment(text: &str, indent: usize, column: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch, in_code) in CodeChars::new(text) {
        if !in_code {
            continue;
        }
        match ch {
            '{' => {
                if depth == 0 {
                    start = index;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    out.push_str(&text[copied..start]);
                    let object = compact(&text[start..=index]);
                    out.push_str(&format_object(&object, indent, line_column(&out, column)));
                    copied = index + 1;
                }
            }
            _ => {}
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Collapse whitespace runs that span lines into one space.
fn compact(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();

    for (_, ch, in_code) in CodeChars::new(text) {
        if in_code && ch.is_whitespace() {
            run.push(ch);
            continue;
        }
        flush_whitespace(&mut out, &mut run);
        out.push(ch);
    }
    flush_whitespace(&mut out, &mut run);
    out
}

fn flush_whitespace(out: &mut String, run: &mut String) {
    if run.contains('\n') {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

/// Column where the next character appended to `out` lands.
fn line_column(out: &str, column: usize) -> usize {
    match out.rfind('\n') {
        Some(newline) => out[newline + 1..].chars().count(),
        None => column + out.chars().count(),
    }
}

/// Lay out one compacted object literal that starts at `column`.
fn format_object(object: &str, indent: usize, column: usize) -> String {
    let inner = object[1..object.len() - 1].trim();
    if inner.is_empty() {
        return "{}".to_string();
    }
    if inner.contains("\\n") || indent >= MAX_REFLOW_DEPTH {
        return object.to_string();
    }

    let properties = split_properties(inner);
    let inline = format!("{{ {} }}", properties.join(", "));
    let nested = CodeChars::new(inner).any(|(_, ch, in_code)| in_code && (ch == '{' || ch == '['));
    let width = column + inline.chars().count();

    if properties.len() <= MAX_INLINE_PROPERTIES && !nested && width < MAX_INLINE_WIDTH {
        return inline;
    }

    let padding = INDENT.repeat(indent + 1);
    let lines: Vec<String> = properties
        .iter()
        .map(|property| {
            let text = format_segment(property, indent + 1, padding.len());
            format!("{}{}", padding, text)
        })
        .collect();
    format!("{{\n{}\n{}}}", lines.join(",\n"), INDENT.repeat(indent))
}

/// Split on commas that are not nested in brackets or strings.
fn split_properties(inner: &str) -> Vec<&str> {
    let mut properties = vec![];
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch, in_code) in CodeChars::new(inner) {
        if !in_code {
            continue;
        }
        match ch {
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                properties.push(&inner[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    properties.push(&inner[start..]);

    properties
        .into_iter()
        .map(str::trim)
        .filter(|property| !property.is_empty())
        .collect()
}
