//! Core types for analysis findings.

use serde::{Deserialize, Serialize};

/// Severity levels for findings, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    #[serde(alias = "medium")]
    Warning,
    #[serde(alias = "high")]
    Error,
    Critical,
}

impl Severity {
    /// Whether findings of this severity count toward the overall rating.
    pub fn counts_toward_rating(&self) -> bool {
        matches!(self, Severity::Warning | Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "medium" => Ok(Severity::Warning),
            "error" | "high" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Broad category a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Quality,
    Security,
    Performance,
    Suggestion,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Quality => write!(f, "quality"),
            Category::Security => write!(f, "security"),
            Category::Performance => write!(f, "performance"),
            Category::Suggestion => write!(f, "suggestion"),
        }
    }
}

/// Stable identifiers for every rule an analyzer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    // Quality
    LongFunction,
    HighComplexity,
    DuplicateLine,
    OverlongLine,
    // Security
    HardcodedPassword,
    HardcodedApiKey,
    HardcodedSecret,
    HardcodedToken,
    PrivateKey,
    DynamicEval,
    DynamicExec,
    CredentialLiteral,
    SqlConcatenation,
    InsecureUrl,
    // Performance
    LongLine,
    HeavyComputation,
    // Language rules
    SwiftForceTry,
    SwiftForceCast,
    SwiftPrint,
    PythonBareExcept,
    PythonWildcardImport,
    PythonMutableDefault,
    PythonPrint,
    JsVar,
    JsLooseEquality,
    JsConsoleLog,
    JsDocumentWrite,
    TsAny,
    TsIgnore,
    JavaSystemOut,
    JavaGenericCatch,
    JavaWildcardImport,
    CsharpConsoleWrite,
    CsharpGenericCatch,
    CsharpGoto,
    CppUnsafeFunction,
    CppUsingNamespaceStd,
    CppRawMalloc,
    GoDiscardedError,
    GoPanic,
    GoPrintln,
    RustUnwrap,
    RustUnsafe,
    RustTodo,
    RustPrintln,
    LineTooLong,
}

impl Rule {
    pub const ALL: &'static [Rule] = &[
        Rule::LongFunction,
        Rule::HighComplexity,
        Rule::DuplicateLine,
        Rule::OverlongLine,
        Rule::HardcodedPassword,
        Rule::HardcodedApiKey,
        Rule::HardcodedSecret,
        Rule::HardcodedToken,
        Rule::PrivateKey,
        Rule::DynamicEval,
        Rule::DynamicExec,
        Rule::CredentialLiteral,
        Rule::SqlConcatenation,
        Rule::InsecureUrl,
        Rule::LongLine,
        Rule::HeavyComputation,
        Rule::SwiftForceTry,
        Rule::SwiftForceCast,
        Rule::SwiftPrint,
        Rule::PythonBareExcept,
        Rule::PythonWildcardImport,
        Rule::PythonMutableDefault,
        Rule::PythonPrint,
        Rule::JsVar,
        Rule::JsLooseEquality,
        Rule::JsConsoleLog,
        Rule::JsDocumentWrite,
        Rule::TsAny,
        Rule::TsIgnore,
        Rule::JavaSystemOut,
        Rule::JavaGenericCatch,
        Rule::JavaWildcardImport,
        Rule::CsharpConsoleWrite,
        Rule::CsharpGenericCatch,
        Rule::CsharpGoto,
        Rule::CppUnsafeFunction,
        Rule::CppUsingNamespaceStd,
        Rule::CppRawMalloc,
        Rule::GoDiscardedError,
        Rule::GoPanic,
        Rule::GoPrintln,
        Rule::RustUnwrap,
        Rule::RustUnsafe,
        Rule::RustTodo,
        Rule::RustPrintln,
        Rule::LineTooLong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::LongFunction => "long_function",
            Rule::HighComplexity => "high_complexity",
            Rule::DuplicateLine => "duplicate_line",
            Rule::OverlongLine => "overlong_line",
            Rule::HardcodedPassword => "hardcoded_password",
            Rule::HardcodedApiKey => "hardcoded_api_key",
            Rule::HardcodedSecret => "hardcoded_secret",
            Rule::HardcodedToken => "hardcoded_token",
            Rule::PrivateKey => "private_key",
            Rule::DynamicEval => "dynamic_eval",
            Rule::DynamicExec => "dynamic_exec",
            Rule::CredentialLiteral => "credential_literal",
            Rule::SqlConcatenation => "sql_concatenation",
            Rule::InsecureUrl => "insecure_url",
            Rule::LongLine => "long_line",
            Rule::HeavyComputation => "heavy_computation",
            Rule::SwiftForceTry => "swift_force_try",
            Rule::SwiftForceCast => "swift_force_cast",
            Rule::SwiftPrint => "swift_print",
            Rule::PythonBareExcept => "python_bare_except",
            Rule::PythonWildcardImport => "python_wildcard_import",
            Rule::PythonMutableDefault => "python_mutable_default",
            Rule::PythonPrint => "python_print",
            Rule::JsVar => "js_var",
            Rule::JsLooseEquality => "js_loose_equality",
            Rule::JsConsoleLog => "js_console_log",
            Rule::JsDocumentWrite => "js_document_write",
            Rule::TsAny => "ts_any",
            Rule::TsIgnore => "ts_ignore",
            Rule::JavaSystemOut => "java_system_out",
            Rule::JavaGenericCatch => "java_generic_catch",
            Rule::JavaWildcardImport => "java_wildcard_import",
            Rule::CsharpConsoleWrite => "csharp_console_write",
            Rule::CsharpGenericCatch => "csharp_generic_catch",
            Rule::CsharpGoto => "csharp_goto",
            Rule::CppUnsafeFunction => "cpp_unsafe_function",
            Rule::CppUsingNamespaceStd => "cpp_using_namespace_std",
            Rule::CppRawMalloc => "cpp_raw_malloc",
            Rule::GoDiscardedError => "go_discarded_error",
            Rule::GoPanic => "go_panic",
            Rule::GoPrintln => "go_println",
            Rule::RustUnwrap => "rust_unwrap",
            Rule::RustUnsafe => "rust_unsafe",
            Rule::RustTodo => "rust_todo",
            Rule::RustPrintln => "rust_println",
            Rule::LineTooLong => "line_too_long",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Rule::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    /// The category findings for this rule are filed under.
    pub fn category(&self) -> Category {
        match self {
            Rule::HardcodedPassword
            | Rule::HardcodedApiKey
            | Rule::HardcodedSecret
            | Rule::HardcodedToken
            | Rule::PrivateKey
            | Rule::DynamicEval
            | Rule::DynamicExec
            | Rule::CredentialLiteral
            | Rule::SqlConcatenation
            | Rule::InsecureUrl
            | Rule::CppUnsafeFunction
            | Rule::RustUnsafe => Category::Security,
            Rule::LongLine | Rule::HeavyComputation => Category::Performance,
            Rule::SwiftPrint
            | Rule::PythonPrint
            | Rule::JsConsoleLog
            | Rule::JavaSystemOut
            | Rule::CsharpConsoleWrite
            | Rule::GoPrintln
            | Rule::RustPrintln => Category::Suggestion,
            _ => Category::Quality,
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source languages with a dedicated rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Swift,
    Python,
    JavaScript,
    TypeScript,
    Java,
    CSharp,
    Cpp,
    Go,
    Rust,
    #[default]
    Generic,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::Swift,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
        Language::CSharp,
        Language::Cpp,
        Language::Go,
        Language::Rust,
        Language::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Swift => "swift",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Generic => "generic",
        }
    }

    /// Determine the language from a file extension (without dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "swift" => Language::Swift,
            "py" | "pyw" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" | "mts" => Language::TypeScript,
            "java" => Language::Java,
            "cs" => Language::CSharp,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "c" | "h" => Language::Cpp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            _ => Language::Generic,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "swift" => Ok(Language::Swift),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "java" => Ok(Language::Java),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "cpp" | "c++" => Ok(Language::Cpp),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "generic" | "text" => Ok(Language::Generic),
            _ => Err(format!("unknown language: {}", s)),
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: Rule,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    /// 1-based line number, absent when the issue is not tied to one line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn new(rule: Rule, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule,
            category: rule.category(),
            severity,
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    /// Attach a line number, clamped into `1..=total_lines`.
    pub fn at_line(mut self, line: usize, total_lines: usize) -> Self {
        self.line = clamp_line(line, total_lines);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Re-clamp an existing line number against the analyzed text.
    pub fn clamp_line(&mut self, total_lines: usize) {
        if let Some(line) = self.line {
            self.line = clamp_line(line, total_lines);
        }
    }

    /// Create a unique key for this finding (for deduplication/comparison).
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.rule,
            self.line.map(|l| l.to_string()).unwrap_or_default(),
            self.message
        )
    }
}

fn clamp_line(line: usize, total_lines: usize) -> Option<usize> {
    if total_lines == 0 {
        None
    } else {
        Some(line.clamp(1, total_lines))
    }
}

/// One code-analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub source: String,
    pub language: Language,
    pub want_ai: bool,
}

impl AnalysisRequest {
    pub fn new(source: impl Into<String>, language: Language, want_ai: bool) -> Self {
        Self {
            source: source.into(),
            language,
            want_ai,
        }
    }
}
