//! Lightweight text heuristics shared by the analyzers.
//!
//! Nothing here parses a language. Functions are located by header
//! patterns and delimited by brace balance (or indentation for
//! colon-terminated headers), and complexity is a weighted keyword count:
//! each `if`, `else`, `for`, `while`, `switch`, `case`, `guard` and `catch`
//! adds 1.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use super::Finding;

lazy_static! {
    static ref COMPLEXITY_KEYWORD: Regex =
        Regex::new(r"\b(if|else|for|while|switch|case|guard|catch)\b").unwrap();

    /// `func`, `fn`, `function` and `def` headers, with an optional Go receiver.
    static ref KEYWORD_FUNCTION: Regex = Regex::new(
        r"^\s*(?:[@A-Za-z][\w()]*\s+)*?(?:func|fn|function|def)\s+(?:\([^)]*\)\s*)?([A-Za-z_$][\w$]*)"
    ).unwrap();

    /// C-family method headers: `<type tokens> name(<params>) {`.
    static ref C_STYLE_FUNCTION: Regex = Regex::new(
        r"^\s*(?:[\w:<>\[\],*&]+\s+)+[*&]?([A-Za-z_]\w*)\s*\([^;{}]*\)\s*(?:const\s*)?(?:throws\s+[\w.,\s]+)?\{?\s*$"
    ).unwrap();
}

/// Words that look like a C-style header name but open a control block.
const NON_FUNCTION_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "else", "new", "sizeof", "foreach", "using",
    "lock",
];

/// A function located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    /// 1-based line of the function header.
    pub start_line: usize,
    pub line_count: usize,
}

/// A trimmed line that appears more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLine {
    pub text: String,
    pub first_line: usize,
    /// 1-based line of the second occurrence.
    pub repeat_line: usize,
    pub occurrences: usize,
}

/// Number of lines in the text.
pub fn line_count(source: &str) -> usize {
    source.lines().count()
}

/// Weighted count of branching and loop keywords.
pub fn complexity(source: &str) -> usize {
    COMPLEXITY_KEYWORD.find_iter(source).count()
}

/// Lines longer than `max_chars` characters, as `(line, length)` pairs.
pub fn long_lines(source: &str, max_chars: usize) -> Vec<(usize, usize)> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let len = line.chars().count();
            (len > max_chars).then_some((idx + 1, len))
        })
        .collect()
}

/// Trimmed lines of at least `min_len` characters that appear more than once,
/// ordered by the line of their second occurrence.
pub fn duplicate_lines(source: &str, min_len: usize) -> Vec<DuplicateLine> {
    let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut repeats: Vec<(&str, usize)> = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.chars().count() < min_len {
            continue;
        }
        let entry = seen.entry(line).or_insert((idx + 1, 0));
        entry.1 += 1;
        if entry.1 == 2 {
            repeats.push((line, idx + 1));
        }
    }

    repeats
        .into_iter()
        .map(|(text, repeat_line)| {
            let (first_line, occurrences) = seen[text];
            DuplicateLine {
                text: text.to_string(),
                first_line,
                repeat_line,
                occurrences,
            }
        })
        .collect()
}

/// Locate functions and estimate their length in lines.
///
/// Span ends come from per-line tables built in one pass each, so nested
/// or unclosed headers never rescan the rest of the text.
pub fn function_spans(source: &str) -> Vec<FunctionSpan> {
    let lines: Vec<&str> = source.lines().collect();
    let headers: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| function_name(line).map(|name| (idx, name)))
        .collect();
    if headers.is_empty() {
        return Vec::new();
    }

    let depths = closing_depths(&lines);
    let indent_ends = indentation_ends(&lines);
    let has_open = |idx: usize| lines.get(idx).is_some_and(|l| l.contains('{'));

    // Brace-delimited headers: (header, line of the opening brace, depth before the header).
    let mut queries = Vec::new();
    let mut ends = vec![0; headers.len()];
    for (i, &(start, _)) in headers.iter().enumerate() {
        let base = if start == 0 { 0 } else { depths[start - 1] };
        if lines[start].trim_end().ends_with(':') {
            ends[i] = indent_ends[start];
        } else if has_open(start) {
            queries.push((i, start, base));
        } else if start + 1 == lines.len() {
            ends[i] = start;
        } else if has_open(start + 1) {
            queries.push((i, start + 1, base));
        } else {
            // No body brace on the header or the line after it.
            ends[i] = indent_ends[start];
        }
    }
    for (i, end) in brace_ends(&depths, &queries) {
        ends[i] = end.unwrap_or(lines.len() - 1);
    }

    headers
        .into_iter()
        .zip(ends)
        .map(|((start, name), end)| FunctionSpan {
            name,
            start_line: start + 1,
            line_count: end - start + 1,
        })
        .collect()
}

fn function_name(line: &str) -> Option<String> {
    if let Some(caps) = KEYWORD_FUNCTION.captures(line) {
        return Some(caps[1].to_string());
    }

    let caps = C_STYLE_FUNCTION.captures(line)?;
    let name = &caps[1];
    if NON_FUNCTION_NAMES.contains(&name) {
        return None;
    }
    let prefix = line[..caps.get(1)?.start()].trim();
    if prefix
        .split_whitespace()
        .any(|tok| NON_FUNCTION_NAMES.contains(&tok) || tok == "=")
    {
        return None;
    }
    Some(name.to_string())
}

/// Brace depth at the end of each line.
fn closing_depths(lines: &[&str]) -> Vec<i64> {
    let mut depth = 0i64;
    lines
        .iter()
        .map(|line| {
            for ch in line.chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            depth
        })
        .collect()
}

/// For each `(id, from, base)`, the first line at or after `from` whose
/// closing depth is at most `base`.
///
/// Sweeps right to left keeping the strict prefix minima of the depths in
/// a stack, so each query is a binary search.
fn brace_ends(depths: &[i64], queries: &[(usize, usize, i64)]) -> Vec<(usize, Option<usize>)> {
    let mut order: Vec<&(usize, usize, i64)> = queries.iter().collect();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    // Bottom to top: indices decrease, depths increase.
    let mut minima: Vec<usize> = Vec::new();
    let mut pending = order.into_iter().peekable();
    let mut results = Vec::with_capacity(queries.len());

    for idx in (0..depths.len()).rev() {
        while minima.last().is_some_and(|&top| depths[top] >= depths[idx]) {
            minima.pop();
        }
        minima.push(idx);

        while let Some(&(id, _, base)) = pending.next_if(|q| q.1 == idx) {
            let count = minima.partition_point(|&k| depths[k] <= base);
            results.push((id, count.checked_sub(1).map(|p| minima[p])));
        }
    }

    results
}

/// For each line, the last line of the block indented under it (the line
/// itself when nothing is). Blank lines never end a block.
fn indentation_ends(lines: &[&str]) -> Vec<usize> {
    let mut ends = vec![0; lines.len()];
    let mut last_non_blank = vec![0; lines.len()];
    let mut prev = 0;
    for (idx, line) in lines.iter().enumerate() {
        if !line.trim().is_empty() {
            prev = idx;
        }
        last_non_blank[idx] = prev;
    }

    // Non-blank lines to the right, nearest on top, indentation rising.
    let mut stack: Vec<usize> = Vec::new();
    for idx in (0..lines.len()).rev() {
        if lines[idx].trim().is_empty() {
            ends[idx] = idx;
            continue;
        }
        let width = indent_width(lines[idx]);
        while stack.last().is_some_and(|&k| indent_width(lines[k]) > width) {
            stack.pop();
        }
        let block_end = stack.last().map_or(lines.len(), |&k| k);
        ends[idx] = last_non_blank[block_end - 1].max(idx);
        stack.push(idx);
    }

    ends
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Order findings by source line; file-level findings go last.
pub fn sort_by_line(findings: &mut [Finding]) {
    findings.sort_by_key(|f| f.line.unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_counts_keywords() {
        let src = "if a { } else if b { }\nfor x in y {}\nwhile true {}\nswitch v { case 1: }\n";
        // if, else, if, for, while, switch, case
        assert_eq!(complexity(src), 7);
        assert_eq!(complexity("let notify = verify(elsewhere)"), 0);
    }

    #[test]
    fn test_long_lines() {
        let src = format!("short\n{}\nshort", "x".repeat(150));
        assert_eq!(long_lines(&src, 120), vec![(2, 150)]);
        assert!(long_lines(&src, 150).is_empty());
    }

    #[test]
    fn test_duplicate_lines() {
        let dup = "let configuration = load_configuration(path);";
        let src = format!("{dup}\nfoo()\n    {dup}\n{dup}\nshort\nshort\n");
        let dups = duplicate_lines(&src, 30);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].first_line, 1);
        assert_eq!(dups[0].repeat_line, 3);
        assert_eq!(dups[0].occurrences, 3);
    }

    #[test]
    fn test_brace_function_span() {
        let src = "fn main() {\n    let x = 1;\n    if x > 0 {\n        go();\n    }\n}\nfn other() {}\n";
        let spans = function_spans(src);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "main");
        assert_eq!(spans[0].start_line, 1);
        assert_eq!(spans[0].line_count, 6);
        assert_eq!(spans[1].name, "other");
        assert_eq!(spans[1].line_count, 1);
    }

    #[test]
    fn test_python_function_span() {
        let src = "def greet(name):\n    msg = name\n\n    return msg\n\nprint(greet('x'))\n";
        let spans = function_spans(src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "greet");
        assert_eq!(spans[0].line_count, 4);
    }

    #[test]
    fn test_go_receiver_and_java_method() {
        let go = "func (s *Server) Handle(w http.ResponseWriter) {\n\treturn\n}\n";
        assert_eq!(function_spans(go)[0].name, "Handle");

        let java = "public static void main(String[] args) {\n    run();\n}\n";
        let spans = function_spans(java);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "main");
        assert_eq!(spans[0].line_count, 3);
    }

    #[test]
    fn test_control_flow_is_not_a_function() {
        let src = "} else if (ready) {\nwhile (x) {\nreturn compute(x);\n";
        assert!(function_spans(src).is_empty());
    }

    #[test]
    fn test_header_with_brace_on_next_line() {
        let src = "void run()\n{\n    go();\n}\nint x = 1;\n";
        let spans = function_spans(src);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].line_count, 4);
    }

    #[test]
    fn test_nested_python_functions() {
        let src = "def outer():\n    def inner():\n        pass\n\n    return inner\nx = 1\n";
        let spans = function_spans(src);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].name.as_str(), spans[0].line_count), ("outer", 5));
        assert_eq!((spans[1].name.as_str(), spans[1].line_count), ("inner", 2));
    }

    #[test]
    fn test_many_unclosed_nested_headers() {
        let depth = 5_000;
        let src = "fn f() {\n".repeat(depth);
        let spans = function_spans(&src);
        assert_eq!(spans.len(), depth);
        for (i, span) in spans.iter().enumerate() {
            assert_eq!(span.start_line, i + 1);
            assert_eq!(span.line_count, depth - i);
        }
    }

    #[test]
    fn test_nested_brace_spans_close_at_own_level() {
        let src = "fn outer() {\n    fn inner() {\n        a();\n    }\n    b();\n}\n";
        let spans = function_spans(src);
        assert_eq!(spans[0].line_count, 6);
        assert_eq!(spans[1].start_line, 2);
        assert_eq!(spans[1].line_count, 3);
    }

    #[test]
    fn test_unclosed_function_runs_to_end() {
        let src = "function broken() {\n  a();\n  b();\n";
        let spans = function_spans(src);
        assert_eq!(spans[0].line_count, 3);
    }
}
