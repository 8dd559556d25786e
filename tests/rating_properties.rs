//! Property-based tests for the rating table, the local quality score and
//! the fix applicator.

use proptest::prelude::*;

use codereview::detect::{Finding, Rule, Severity};
use codereview::fix::{self, Fix, FixError};
use codereview::score::{self, Rating};

fn expected_rating(n: usize) -> Rating {
    match n {
        0 => Rating::Excellent,
        1..=2 => Rating::Good,
        3..=5 => Rating::NeedsImprovement,
        _ => Rating::Poor,
    }
}

fn rated_severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Warning),
        Just(Severity::Error),
        Just(Severity::Critical),
    ]
}

fn finding(severity: Severity) -> Finding {
    Finding::new(Rule::LongLine, severity, "synthetic")
}

fn fix_for(span: &str, replacement: &str) -> Fix {
    Fix {
        id: "synthetic:1".to_string(),
        title: "synthetic".to_string(),
        description: "synthetic".to_string(),
        original_span: span.to_string(),
        replacement: replacement.to_string(),
        confidence: 1.0,
    }
}

#[test]
fn boundary_counts() {
    for (n, rating) in [
        (0, Rating::Excellent),
        (1, Rating::Good),
        (2, Rating::Good),
        (3, Rating::NeedsImprovement),
        (5, Rating::NeedsImprovement),
        (6, Rating::Poor),
    ] {
        let findings: Vec<Finding> = (0..n).map(|_| finding(Severity::Warning)).collect();
        assert_eq!(score::rating(&findings), rating, "n = {}", n);
    }
}

proptest! {
    #[test]
    fn rating_follows_count_table(
        rated in prop::collection::vec(rated_severity(), 0..12),
        infos in 0usize..6,
    ) {
        let mut findings: Vec<Finding> = rated.iter().copied().map(finding).collect();
        findings.extend((0..infos).map(|_| finding(Severity::Info)));
        prop_assert_eq!(score::rating(&findings), expected_rating(rated.len()));
    }

    #[test]
    fn info_only_is_excellent(infos in 0usize..50) {
        let findings: Vec<Finding> = (0..infos).map(|_| finding(Severity::Info)).collect();
        prop_assert_eq!(score::rating(&findings), Rating::Excellent);
    }

    #[test]
    fn local_score_formula(critical in 0usize..5, error in 0usize..8, warning in 0usize..25) {
        let mut findings = Vec::new();
        findings.extend((0..critical).map(|_| finding(Severity::Critical)));
        findings.extend((0..error).map(|_| finding(Severity::Error)));
        findings.extend((0..warning).map(|_| finding(Severity::Warning)));

        let expected = (100i64 - 30 * critical as i64 - 15 * error as i64 - 5 * warning as i64).max(0);
        prop_assert_eq!(score::local_quality_score(&findings) as i64, expected);
    }

    #[test]
    fn missing_span_never_applies(source in "[a-z \n]{0,60}", span in "[A-Z]{1,8}") {
        let fix = fix_for(&span, "replacement");
        prop_assert_eq!(
            fix::apply(&source, &fix),
            Err(FixError::NotApplicable("synthetic:1".to_string()))
        );
    }

    #[test]
    fn only_first_occurrence_replaced(prefix in "[a-z]{0,10}", middle in "[a-z]{0,10}") {
        let source = format!("{}SPAN{}SPAN", prefix, middle);
        let patched = fix::apply(&source, &fix_for("SPAN", "[x]")).unwrap();
        prop_assert_eq!(patched, format!("{}[x]{}SPAN", prefix, middle));
    }
}
