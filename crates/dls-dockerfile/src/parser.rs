//! Hand-rolled Dockerfile scanner.
//!
//! Dockerfiles have a simple line-oriented grammar with no dominant
//! third-party parser crate in the Rust ecosystem (unlike HCL/YAML,
//! where `dls-bake`/`dls-compose` lean on `hcl-edit`/`saphyr`), so this
//! hand-writes the lexer for a format no existing crate covers well.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flag {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Upper-cased instruction keyword, e.g. `FROM`, `ARG`, `RUN`.
    pub value: String,
    pub flags: Vec<Flag>,
    /// Raw argument text with continuations joined and the leading flags
    /// stripped.
    pub args: String,
    pub start_line: u32,
    pub end_line: u32,
    pub span: std::ops::Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDirectives {
    pub escape: char,
    pub syntax: Option<String>,
    pub check: Option<String>,
}

impl Default for ParserDirectives {
    fn default() -> Self {
        Self {
            escape: '\\',
            syntax: None,
            check: None,
        }
    }
}

pub fn parse(source: &str) -> (Vec<Instruction>, ParserDirectives) {
    let mut directives = ParserDirectives::default();
    let mut directives_open = true;

    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut instructions = Vec::new();
    let mut offset = 0usize;
    let mut line_no = 0u32;

    let mut i = 0usize;
    while i < lines.len() {
        let line_start_offset = offset;
        let line_start_line = line_no;
        let raw_line = lines[i];
        let trimmed = raw_line.trim_end_matches(['\n', '\r']);

        if directives_open {
            if let Some(directive) = parse_directive(trimmed) {
                apply_directive(&mut directives, &directive);
                offset += raw_line.len();
                line_no += 1;
                i += 1;
                continue;
            }
            if !trimmed.trim().is_empty() {
                directives_open = false;
            }
        }

        let content = trimmed.trim_start();
        if content.is_empty() || content.starts_with('#') {
            offset += raw_line.len();
            line_no += 1;
            i += 1;
            continue;
        }

        // Gather the full logical line, following escape-continuations.
        let mut joined = String::new();
        let mut end_line = line_start_line;
        let mut cur = trimmed;
        let mut cur_len_consumed = raw_line.len();
        loop {
            let stripped = strip_continuation(cur, directives.escape);
            match stripped {
                Some(body) => {
                    joined.push_str(body);
                    joined.push(' ');
                    i += 1;
                    offset += cur_len_consumed;
                    line_no += 1;
                    // Skip blank/comment lines inside a continuation.
                    loop {
                        if i >= lines.len() {
                            break;
                        }
                        let next_raw = lines[i];
                        let next_trimmed = next_raw.trim_end_matches(['\n', '\r']);
                        if next_trimmed.trim().is_empty() || next_trimmed.trim_start().starts_with('#') {
                            offset += next_raw.len();
                            line_no += 1;
                            end_line = line_no;
                            i += 1;
                            continue;
                        }
                        break;
                    }
                    if i >= lines.len() {
                        break;
                    }
                    cur = lines[i].trim_end_matches(['\n', '\r']);
                    cur_len_consumed = lines[i].len();
                    end_line = line_no;
                }
                None => {
                    joined.push_str(cur);
                    offset += cur_len_consumed;
                    line_no += 1;
                    i += 1;
                    break;
                }
            }
        }

        if let Some(instruction) = build_instruction(
            joined.trim(),
            line_start_line,
            end_line,
            line_start_offset..offset,
        ) {
            instructions.push(instruction);
        }
    }

    (instructions, directives)
}

struct Directive {
    key: String,
    value: String,
}

fn parse_directive(trimmed: &str) -> Option<Directive> {
    let rest = trimmed.trim().strip_prefix('#')?;
    let rest = rest.trim_start();
    let (key, value) = rest.split_once('=')?;
    let key = key.trim();
    if key.chars().any(|c| c.is_whitespace()) || key.is_empty() {
        return None;
    }
    Some(Directive {
        key: key.to_ascii_lowercase(),
        value: value.trim().to_string(),
    })
}

fn apply_directive(directives: &mut ParserDirectives, directive: &Directive) {
    match directive.key.as_str() {
        "escape" => {
            if let Some(ch) = directive.value.chars().next() {
                directives.escape = ch;
            }
        }
        "syntax" => directives.syntax = Some(directive.value.clone()),
        "check" => directives.check = Some(directive.value.clone()),
        _ => {}
    }
}

/// Returns the line body with its trailing continuation marker removed,
/// or `None` if the line doesn't continue.
fn strip_continuation(line: &str, escape: char) -> Option<&str> {
    let trailing_ws_start = line.trim_end().len();
    let without_trailing_ws = &line[..trailing_ws_start];
    let last = without_trailing_ws.chars().next_back()?;
    if last != escape {
        return None;
    }
    // An escape immediately followed by another escape is not a
    // continuation marker.
    let body = &without_trailing_ws[..without_trailing_ws.len() - escape.len_utf8()];
    Some(body.trim_end())
}

fn build_instruction(
    text: &str,
    start_line: u32,
    end_line: u32,
    span: std::ops::Range<usize>,
) -> Option<Instruction> {
    if text.is_empty() {
        return None;
    }
    let mut parts = text.splitn(2, char::is_whitespace);
    let keyword = parts.next()?.to_ascii_uppercase();
    let rest = parts.next().unwrap_or("").trim_start();

    let mut flags = Vec::new();
    let mut remainder = rest;
    loop {
        let candidate = remainder.trim_start();
        if !candidate.starts_with("--") {
            remainder = candidate;
            break;
        }
        let mut split = candidate.splitn(2, char::is_whitespace);
        let token = split.next().unwrap_or("");
        let after = split.next().unwrap_or("");
        let flag_body = &token[2..];
        let (name, value) = match flag_body.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (flag_body.to_string(), None),
        };
        flags.push(Flag { name, value });
        remainder = after;
    }

    Some(Instruction {
        value: keyword,
        flags,
        args: remainder.trim().to_string(),
        start_line,
        end_line,
        span,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_instructions_with_line_spans() {
        let (instructions, _) = parse("FROM scratch AS base\nARG foo=bar\n");
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[0].value, "FROM");
        assert_eq!(instructions[0].args, "scratch AS base");
        assert_eq!(instructions[0].start_line, 0);
        assert_eq!(instructions[0].end_line, 1);
        assert_eq!(instructions[1].start_line, 1);
    }

    #[test]
    fn joins_escaped_continuations_and_skips_inline_comments() {
        let (instructions, _) = parse("RUN apt-get update && \\\n    # comment\n    apt-get install -y curl\n");
        assert_eq!(instructions.len(), 1);
        assert!(instructions[0].args.contains("apt-get install -y curl"));
        assert_eq!(instructions[0].end_line, 2);
    }

    #[test]
    fn parses_leading_flags() {
        let (instructions, _) = parse("COPY --from=build --chown=app:app /src /dst\n");
        assert_eq!(instructions[0].flags.len(), 2);
        assert_eq!(instructions[0].flags[0].name, "from");
        assert_eq!(instructions[0].flags[0].value.as_deref(), Some("build"));
        assert_eq!(instructions[0].args, "/src /dst");
    }

    #[test]
    fn reads_parser_directives_before_first_instruction() {
        let (_, directives) = parse("# syntax=docker/dockerfile:1\n# escape=`\nFROM scratch\n");
        assert_eq!(directives.syntax.as_deref(), Some("docker/dockerfile:1"));
        assert_eq!(directives.escape, '`');
    }

    #[test]
    fn directive_after_first_instruction_is_ignored() {
        let (_, directives) = parse("FROM scratch\n# escape=`\n");
        assert_eq!(directives.escape, '\\');
    }
}
