//! Language-specific rule sets.
//!
//! Each supported language contributes a small table of line patterns
//! (unsafe dynamic constructs, wildcard imports, leftover debug output and
//! the like). Every rule reports once, on its first matching line, with the
//! total occurrence count in the message. Languages without a table fall
//! back to a single line-length rule.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::config::Thresholds;

use super::heuristics::{self, long_lines};
use super::{Analyzer, Finding, Language, Rule, Severity};

/// A single language rule.
struct LanguageRule {
    rule: Rule,
    pattern: &'static str,
    severity: Severity,
    message: &'static str,
    suggestion: &'static str,
}

struct CompiledRule {
    regex: Regex,
    rule: &'static LanguageRule,
}

const SWIFT_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::SwiftForceTry,
        pattern: r"\btry!",
        severity: Severity::Warning,
        message: "try! crashes at runtime if the call throws",
        suggestion: "Use do/catch or try? and handle the failure",
    },
    LanguageRule {
        rule: Rule::SwiftForceCast,
        pattern: r"\bas!",
        severity: Severity::Warning,
        message: "forced downcast with as!",
        suggestion: "Use as? with optional binding",
    },
    LanguageRule {
        rule: Rule::SwiftPrint,
        pattern: r"^\s*print\s*\(",
        severity: Severity::Info,
        message: "print() left in code",
        suggestion: "Use os.Logger or remove debug output",
    },
];

const PYTHON_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::PythonBareExcept,
        pattern: r"^\s*except\s*:",
        severity: Severity::Warning,
        message: "bare except: catches SystemExit and KeyboardInterrupt",
        suggestion: "Catch Exception (or something narrower) instead",
    },
    LanguageRule {
        rule: Rule::PythonWildcardImport,
        pattern: r"^\s*from\s+\S+\s+import\s+\*",
        severity: Severity::Warning,
        message: "wildcard import pollutes the module namespace",
        suggestion: "Import the names you use explicitly",
    },
    LanguageRule {
        rule: Rule::PythonMutableDefault,
        pattern: r"^\s*def\s+\w+\s*\([^)]*=\s*(\[\]|\{\})",
        severity: Severity::Warning,
        message: "mutable default argument is shared between calls",
        suggestion: "Default to None and create the container inside the function",
    },
    LanguageRule {
        rule: Rule::PythonPrint,
        pattern: r"^\s*print\s*\(",
        severity: Severity::Info,
        message: "print() left in code",
        suggestion: "Use the logging module",
    },
];

const JAVASCRIPT_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::JsVar,
        pattern: r"\bvar\s+[A-Za-z_$]",
        severity: Severity::Warning,
        message: "var declaration is function-scoped",
        suggestion: "Use let or const",
    },
    LanguageRule {
        rule: Rule::JsLooseEquality,
        pattern: r"[^=!<>]==[^=]",
        severity: Severity::Warning,
        message: "loose equality (==) coerces types",
        suggestion: "Use strict equality (===)",
    },
    LanguageRule {
        rule: Rule::JsConsoleLog,
        pattern: r"\bconsole\.log\s*\(",
        severity: Severity::Info,
        message: "console.log left in code",
        suggestion: "Remove debug output or use a logger",
    },
    LanguageRule {
        rule: Rule::JsDocumentWrite,
        pattern: r"\bdocument\.write\s*\(",
        severity: Severity::Warning,
        message: "document.write blocks parsing and enables injection",
        suggestion: "Manipulate the DOM with createElement/textContent",
    },
];

const TYPESCRIPT_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::TsAny,
        pattern: r":\s*any\b",
        severity: Severity::Warning,
        message: "explicit any disables type checking",
        suggestion: "Use a concrete type or unknown",
    },
    LanguageRule {
        rule: Rule::TsIgnore,
        pattern: r"@ts-ignore",
        severity: Severity::Warning,
        message: "@ts-ignore suppresses type errors",
        suggestion: "Fix the type error or use @ts-expect-error with a reason",
    },
];

const JAVA_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::JavaSystemOut,
        pattern: r"System\.out\.println",
        severity: Severity::Info,
        message: "System.out.println left in code",
        suggestion: "Use a logging framework",
    },
    LanguageRule {
        rule: Rule::JavaGenericCatch,
        pattern: r"catch\s*\(\s*Exception\b",
        severity: Severity::Warning,
        message: "catching Exception hides unrelated failures",
        suggestion: "Catch the specific exception types you can handle",
    },
    LanguageRule {
        rule: Rule::JavaWildcardImport,
        pattern: r"^\s*import\s+[\w.]+\.\*\s*;",
        severity: Severity::Info,
        message: "wildcard import",
        suggestion: "Import classes explicitly",
    },
];

const CSHARP_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::CsharpConsoleWrite,
        pattern: r"Console\.WriteLine",
        severity: Severity::Info,
        message: "Console.WriteLine left in code",
        suggestion: "Use ILogger",
    },
    LanguageRule {
        rule: Rule::CsharpGenericCatch,
        pattern: r"catch\s*\(\s*Exception\b",
        severity: Severity::Warning,
        message: "catching Exception hides unrelated failures",
        suggestion: "Catch the specific exception types you can handle",
    },
    LanguageRule {
        rule: Rule::CsharpGoto,
        pattern: r"\bgoto\b",
        severity: Severity::Warning,
        message: "goto makes control flow hard to follow",
        suggestion: "Restructure with loops or early returns",
    },
];

const CPP_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::CppUnsafeFunction,
        pattern: r"\b(gets|strcpy|sprintf)\s*\(",
        severity: Severity::Error,
        message: "unbounded C string function can overflow its buffer",
        suggestion: "Use fgets/strncpy/snprintf or std::string",
    },
    LanguageRule {
        rule: Rule::CppUsingNamespaceStd,
        pattern: r"using\s+namespace\s+std\s*;",
        severity: Severity::Warning,
        message: "using namespace std pulls every std name into scope",
        suggestion: "Qualify names or import the ones you need",
    },
    LanguageRule {
        rule: Rule::CppRawMalloc,
        pattern: r"\bmalloc\s*\(",
        severity: Severity::Info,
        message: "manual malloc memory management",
        suggestion: "Prefer RAII containers or smart pointers",
    },
];

const GO_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::GoDiscardedError,
        pattern: r"^\s*_\s*=\s*\S|,\s*_\s*:?=",
        severity: Severity::Warning,
        message: "return value discarded with _",
        suggestion: "Check the error instead of discarding it",
    },
    LanguageRule {
        rule: Rule::GoPanic,
        pattern: r"\bpanic\s*\(",
        severity: Severity::Warning,
        message: "panic in library code",
        suggestion: "Return an error to the caller",
    },
    LanguageRule {
        rule: Rule::GoPrintln,
        pattern: r"fmt\.Println",
        severity: Severity::Info,
        message: "fmt.Println left in code",
        suggestion: "Use the log or slog package",
    },
];

const RUST_RULES: &[LanguageRule] = &[
    LanguageRule {
        rule: Rule::RustUnwrap,
        pattern: r"\.unwrap\(\)",
        severity: Severity::Warning,
        message: ".unwrap() panics on None/Err",
        suggestion: "Propagate with ? or handle the error",
    },
    LanguageRule {
        rule: Rule::RustUnsafe,
        pattern: r"\bunsafe\s*\{",
        severity: Severity::Warning,
        message: "unsafe block",
        suggestion: "Document the safety invariant or use a safe abstraction",
    },
    LanguageRule {
        rule: Rule::RustTodo,
        pattern: r"\b(todo|unimplemented)!\s*\(",
        severity: Severity::Error,
        message: "todo!/unimplemented! panics when reached",
        suggestion: "Implement the code path",
    },
    LanguageRule {
        rule: Rule::RustPrintln,
        pattern: r"\bprintln!\s*\(",
        severity: Severity::Info,
        message: "println! left in code",
        suggestion: "Use tracing or log",
    },
];

fn rule_tables(language: Language) -> &'static [&'static [LanguageRule]] {
    match language {
        Language::Swift => &[SWIFT_RULES],
        Language::Python => &[PYTHON_RULES],
        Language::JavaScript => &[JAVASCRIPT_RULES],
        Language::TypeScript => &[JAVASCRIPT_RULES, TYPESCRIPT_RULES],
        Language::Java => &[JAVA_RULES],
        Language::CSharp => &[CSHARP_RULES],
        Language::Cpp => &[CPP_RULES],
        Language::Go => &[GO_RULES],
        Language::Rust => &[RUST_RULES],
        Language::Generic => &[],
    }
}

static COMPILED: Lazy<HashMap<Language, Vec<CompiledRule>>> = Lazy::new(|| {
    Language::ALL
        .iter()
        .map(|&language| {
            let rules = rule_tables(language)
                .iter()
                .flat_map(|table| table.iter())
                .map(|rule| CompiledRule {
                    regex: Regex::new(rule.pattern).unwrap(),
                    rule,
                })
                .collect();
            (language, rules)
        })
        .collect()
});

/// Runs the rule set of one language.
#[derive(Debug, Clone)]
pub struct LanguageAnalyzer {
    language: Language,
    generic_max_line_length: usize,
}

impl LanguageAnalyzer {
    pub fn new(language: Language, thresholds: &Thresholds) -> Self {
        Self {
            language,
            generic_max_line_length: thresholds.generic_max_line_length,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn line_length_rule(&self, source: &str, total: usize) -> Vec<Finding> {
        let long = long_lines(source, self.generic_max_line_length);
        let Some(&(first, _)) = long.first() else {
            return Vec::new();
        };
        vec![Finding::new(
            Rule::LineTooLong,
            Severity::Info,
            format!(
                "{} line(s) longer than {} characters",
                long.len(),
                self.generic_max_line_length
            ),
        )
        .at_line(first, total)
        .with_suggestion("Wrap long lines for readability")]
    }
}

impl Analyzer for LanguageAnalyzer {
    fn name(&self) -> &'static str {
        self.language.as_str()
    }

    fn analyze(&self, source: &str) -> anyhow::Result<Vec<Finding>> {
        let lines: Vec<&str> = source.lines().collect();
        let total = lines.len();

        if self.language == Language::Generic {
            return Ok(self.line_length_rule(source, total));
        }

        let rules = COMPILED
            .get(&self.language)
            .ok_or_else(|| anyhow::anyhow!("no rule table for {}", self.language))?;

        let mut findings = Vec::new();
        for compiled in rules {
            let matches: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, line)| compiled.regex.is_match(line))
                .map(|(idx, _)| idx + 1)
                .collect();

            let Some(&first) = matches.first() else {
                continue;
            };
            let rule = compiled.rule;
            let message = if matches.len() > 1 {
                format!("{} ({} occurrences)", rule.message, matches.len())
            } else {
                rule.message.to_string()
            };
            findings.push(
                Finding::new(rule.rule, rule.severity, message)
                    .at_line(first, total)
                    .with_suggestion(rule.suggestion),
            );
        }

        heuristics::sort_by_line(&mut findings);
        Ok(findings)
    }
}
