//! Literal text fixes.
//!
//! [`suggest_fixes`] derives line-level rewrites from findings whose rule
//! has a deterministic fix, and [`apply`] performs one exact substring
//! replacement. Nothing here approximates: a span that is not present
//! verbatim is never applied.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::{Finding, Rule};

/// A find-and-replace transformation derived from a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// `"{rule}:{line}"`, unique within one report.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Exact text expected in the source.
    pub original_span: String,
    pub replacement: String,
    /// In `[0, 1]`.
    pub confidence: f64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixError {
    #[error("fix {0} is not applicable: original text not found")]
    NotApplicable(String),
}

/// Replace the first occurrence of `fix.original_span` with
/// `fix.replacement`.
///
/// Fails with [`FixError::NotApplicable`] when the span is empty or not
/// present verbatim; the input is never partially modified.
pub fn apply(source: &str, fix: &Fix) -> Result<String, FixError> {
    if fix.original_span.is_empty() || !source.contains(&fix.original_span) {
        return Err(FixError::NotApplicable(fix.id.clone()));
    }
    Ok(source.replacen(&fix.original_span, &fix.replacement, 1))
}

lazy_static! {
    static ref BARE_EXCEPT: Regex = Regex::new(r"except\s*:").unwrap();
    static ref VAR_KEYWORD: Regex = Regex::new(r"\bvar\b").unwrap();
    static ref LOOSE_EQUALITY: Regex = Regex::new(r"([^=!<>])==([^=])").unwrap();
}

/// Rewrite of one line, with its title and confidence.
struct Rewrite {
    title: &'static str,
    replacement: String,
    confidence: f64,
}

fn rewrite_line(rule: Rule, line: &str) -> Option<Rewrite> {
    let (title, replacement, confidence) = match rule {
        Rule::PythonBareExcept => (
            "Catch Exception instead of everything",
            BARE_EXCEPT.replace(line, "except Exception:").into_owned(),
            0.9,
        ),
        Rule::JsVar => (
            "Replace var with let",
            VAR_KEYWORD.replace_all(line, "let").into_owned(),
            0.8,
        ),
        Rule::JsLooseEquality => (
            "Use strict equality",
            replace_loose_equality(line),
            0.8,
        ),
        Rule::JsConsoleLog => ("Remove console.log", String::new(), 0.6),
        _ => return None,
    };
    (replacement != line).then_some(Rewrite {
        title,
        replacement,
        confidence,
    })
}

/// `a == b` becomes `a === b`. Repeated until stable, since adjacent
/// matches share a character.
fn replace_loose_equality(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let next = LOOSE_EQUALITY.replace_all(&current, "${1}===${2}").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Derive fixes for the findings that have a deterministic rewrite.
///
/// Each fix replaces the full text of the finding's line. Findings without
/// a line, or whose line no longer exists, are skipped.
pub fn suggest_fixes(source: &str, findings: &[Finding]) -> Vec<Fix> {
    let lines: Vec<&str> = source.lines().collect();

    findings
        .iter()
        .filter_map(|finding| {
            let line_no = finding.line?;
            let line = *lines.get(line_no.checked_sub(1)?)?;
            let rewrite = rewrite_line(finding.rule, line)?;
            Some(Fix {
                id: format!("{}:{}", finding.rule, line_no),
                title: rewrite.title.to_string(),
                description: finding.message.clone(),
                original_span: line.to_string(),
                replacement: rewrite.replacement,
                confidence: rewrite.confidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::Severity;

    fn fix(span: &str, replacement: &str) -> Fix {
        Fix {
            id: "test:1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            original_span: span.to_string(),
            replacement: replacement.to_string(),
            confidence: 0.5,
        }
    }

    #[test]
    fn test_apply_replaces_first_occurrence_only() {
        let out = apply("a == b; c == d; a == b", &fix("a == b", "a === b")).unwrap();
        assert_eq!(out, "a === b; c == d; a == b");
    }

    #[test]
    fn test_apply_missing_span() {
        let err = apply("nothing here", &fix("absent", "x")).unwrap_err();
        assert_eq!(err, FixError::NotApplicable("test:1".to_string()));
    }

    #[test]
    fn test_apply_empty_span_rejected() {
        assert!(apply("text", &fix("", "x")).is_err());
    }

    #[test]
    fn test_bare_except_fix() {
        let src = "try:\n    run()\nexcept:\n    pass\n";
        let finding = Finding::new(Rule::PythonBareExcept, Severity::Warning, "bare").at_line(3, 4);
        let fixes = suggest_fixes(src, &[finding]);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].id, "python_bare_except:3");
        assert_eq!(fixes[0].original_span, "except:");
        assert_eq!(fixes[0].replacement, "except Exception:");

        let patched = apply(src, &fixes[0]).unwrap();
        assert_eq!(patched, "try:\n    run()\nexcept Exception:\n    pass\n");
    }

    #[test]
    fn test_js_rewrites() {
        assert_eq!(
            rewrite_line(Rule::JsVar, "var total = 0;").unwrap().replacement,
            "let total = 0;"
        );
        assert_eq!(
            rewrite_line(Rule::JsLooseEquality, "if (a == b && c == d) {}")
                .unwrap()
                .replacement,
            "if (a === b && c === d) {}"
        );
        assert_eq!(
            rewrite_line(Rule::JsLooseEquality, "x==y").unwrap().replacement,
            "x===y"
        );
        assert!(rewrite_line(Rule::JsLooseEquality, "a === b").is_none());
        assert_eq!(
            rewrite_line(Rule::JsConsoleLog, "  console.log(x);")
                .unwrap()
                .replacement,
            ""
        );
    }

    #[test]
    fn test_rules_without_rewrite_are_skipped() {
        let src = "eval(x)\n";
        let finding = Finding::new(Rule::DynamicEval, Severity::Critical, "eval").at_line(1, 1);
        assert!(suggest_fixes(src, &[finding]).is_empty());

        let no_line = Finding::new(Rule::JsVar, Severity::Warning, "var");
        assert!(suggest_fixes("var a;", &[no_line]).is_empty());
    }
}
