//! Signature-based security scanning.
//!
//! Each signature is matched case-insensitively against every line and
//! reports at most once per source (on its first matching line).

use lazy_static::lazy_static;
use regex::Regex;

use super::heuristics;
use super::{Analyzer, Finding, Rule, Severity};

/// A risk signature.
struct Signature {
    rule: Rule,
    pattern: &'static str,
    severity: Severity,
    message: &'static str,
    suggestion: &'static str,
    /// Extra check on the matched text, for patterns the regex alone over-reports.
    refine: Option<fn(&str) -> bool>,
}

/// Pre-compiled signature.
struct CompiledSignature {
    regex: Regex,
    signature: &'static Signature,
}

static SIGNATURES: &[Signature] = &[
    Signature {
        rule: Rule::HardcodedPassword,
        pattern: r"password\s*=(?:[^=]|$)",
        severity: Severity::Critical,
        message: "hardcoded password assignment",
        suggestion: "Load passwords from a secret store or environment variable",
        refine: None,
    },
    Signature {
        rule: Rule::HardcodedApiKey,
        pattern: r"api[_-]?key\s*=(?:[^=]|$)",
        severity: Severity::Critical,
        message: "hardcoded API key assignment",
        suggestion: "Move API keys out of source into configuration or a keychain",
        refine: None,
    },
    Signature {
        rule: Rule::PrivateKey,
        pattern: r"private[_-]?key\s*=(?:[^=]|$)|-----BEGIN [A-Z ]*PRIVATE KEY-----",
        severity: Severity::Critical,
        message: "private key embedded in source",
        suggestion: "Never commit private keys; load them from a protected file",
        refine: None,
    },
    Signature {
        rule: Rule::HardcodedSecret,
        pattern: r"secret\s*=(?:[^=]|$)",
        severity: Severity::Warning,
        message: "hardcoded secret assignment",
        suggestion: "Read secrets from the environment or a secret manager",
        refine: None,
    },
    Signature {
        rule: Rule::HardcodedToken,
        pattern: r"token\s*=(?:[^=]|$)",
        severity: Severity::Warning,
        message: "hardcoded token assignment",
        suggestion: "Inject tokens at runtime instead of storing them in code",
        refine: None,
    },
    Signature {
        rule: Rule::DynamicEval,
        pattern: r"\beval\s*\(",
        severity: Severity::Critical,
        message: "use of eval() executes arbitrary code",
        suggestion: "Parse the input explicitly instead of evaluating it",
        refine: None,
    },
    Signature {
        rule: Rule::DynamicExec,
        pattern: r"\bexec\s*\(",
        severity: Severity::Critical,
        message: "use of exec() executes arbitrary code",
        suggestion: "Avoid dynamic execution; dispatch to known functions instead",
        refine: None,
    },
    Signature {
        rule: Rule::SqlConcatenation,
        pattern: r#"["'][^"']*\b(select|insert|update|delete)\b[^"']*["']\s*\+"#,
        severity: Severity::Error,
        message: "SQL statement built by string concatenation",
        suggestion: "Use parameterized queries",
        refine: None,
    },
    Signature {
        rule: Rule::CredentialLiteral,
        pattern: r#"["'][A-Za-z0-9+/_\-]{32,}={0,2}["']"#,
        severity: Severity::Warning,
        message: "long opaque string literal looks like a credential",
        suggestion: "Verify this is not a credential; if it is, move it out of source",
        refine: Some(mixes_letters_and_digits),
    },
    Signature {
        rule: Rule::InsecureUrl,
        pattern: r#"["']http://[^"'\s]+"#,
        severity: Severity::Info,
        message: "plain http:// URL",
        suggestion: "Use https:// for network endpoints",
        refine: Some(is_remote_url),
    },
];

lazy_static! {
    static ref COMPILED: Vec<CompiledSignature> = SIGNATURES
        .iter()
        .map(|signature| CompiledSignature {
            regex: Regex::new(&format!("(?i){}", signature.pattern)).unwrap(),
            signature,
        })
        .collect();
}

fn mixes_letters_and_digits(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit()) && text.chars().any(|c| c.is_ascii_alphabetic())
}

fn is_remote_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    !(lower.contains("://localhost") || lower.contains("://127.0.0.1"))
}

/// Matches a fixed table of risk signatures.
#[derive(Debug, Clone, Default)]
pub struct SecurityAnalyzer;

impl SecurityAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for SecurityAnalyzer {
    fn name(&self) -> &'static str {
        "security"
    }

    fn analyze(&self, source: &str) -> anyhow::Result<Vec<Finding>> {
        let lines: Vec<&str> = source.lines().collect();
        let total = lines.len();
        let mut findings = Vec::new();

        for compiled in COMPILED.iter() {
            let sig = compiled.signature;
            let hit = lines.iter().enumerate().find(|(_, line)| {
                compiled.regex.find_iter(line).any(|m| match sig.refine {
                    Some(refine) => refine(m.as_str()),
                    None => true,
                })
            });

            if let Some((idx, _)) = hit {
                findings.push(
                    Finding::new(sig.rule, sig.severity, sig.message)
                        .at_line(idx + 1, total)
                        .with_suggestion(sig.suggestion),
                );
            }
        }

        heuristics::sort_by_line(&mut findings);
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<Finding> {
        SecurityAnalyzer::new().analyze(src).unwrap()
    }

    #[test]
    fn test_eval_is_single_critical() {
        let findings = scan("eval(userInput)");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::DynamicEval);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].message.contains("eval"));
        assert_eq!(findings[0].line, Some(1));
    }

    #[test]
    fn test_case_insensitive_and_first_line_only() {
        let src = "x = 1\nPASSWORD = \"hunter2\"\npassword = \"again\"\n";
        let findings = scan(src);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::HardcodedPassword);
        assert_eq!(findings[0].line, Some(2));
    }

    #[test]
    fn test_comparison_is_not_assignment() {
        assert!(scan("if password == input {").is_empty());
    }

    #[test]
    fn test_exec_does_not_match_execute() {
        assert!(scan("cursor.execute(query)").is_empty());
        assert_eq!(scan("exec(code)")[0].rule, Rule::DynamicExec);
    }

    #[test]
    fn test_credential_literal_needs_mixed_content() {
        let token = "\"AKIA4EXAMPLE7QWERTYUIOPASDFGHJKL12\"";
        let findings = scan(&format!("let k = {}", token));
        assert!(findings.iter().any(|f| f.rule == Rule::CredentialLiteral));

        let padding = format!("let k = \"{}\"", "a".repeat(40));
        assert!(scan(&padding).is_empty());
    }

    #[test]
    fn test_sql_concatenation() {
        let findings = scan("q = \"SELECT * FROM users WHERE id = \" + id");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::SqlConcatenation);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_insecure_url_skips_localhost() {
        assert!(scan("url = \"http://localhost:8080\"").is_empty());
        let findings = scan("url = \"http://api.example.org\"");
        assert_eq!(findings[0].rule, Rule::InsecureUrl);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_findings_sorted_by_line() {
        let src = "eval(x)\napi_key = \"abc\"\n";
        let findings = scan(src);
        let lines: Vec<_> = findings.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
    }
}
