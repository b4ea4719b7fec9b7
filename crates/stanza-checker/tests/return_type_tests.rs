//! End-to-end tests for return-type verification.
//!
//! Each test parses a source snippet through the real parser, scans and
//! links a codebase, runs the file analyzer, and asserts on the emitted
//! issue kinds and messages.

use stanza_checker::{AnalysisResult, FileAnalyzer};
use stanza_codebase::Codebase;
use stanza_common::{Config, Issue, IssueKind};
use stanza_parser::parse_file;
use std::sync::Arc;

fn analyze_with_config(source: &str, config: Config) -> AnalysisResult {
    let ast = parse_file("/src/test.php", source).expect("source parses");
    let mut codebase = Codebase::new(Arc::new(config));
    codebase.scan_file(&ast);
    codebase.link();
    FileAnalyzer::new(&codebase)
        .analyze(&ast)
        .expect("analysis succeeds")
}

fn analyze(source: &str) -> Vec<Issue> {
    analyze_with_config(source, Config::default()).issues
}

fn kinds(source: &str) -> Vec<IssueKind> {
    analyze(source).into_iter().map(|issue| issue.kind).collect()
}

#[test]
fn void_function_with_declared_void_is_clean() {
    assert_eq!(kinds("function f(): void { $x = 1; }"), vec![]);
}

#[test]
fn never_function_that_only_throws_is_clean() {
    assert_eq!(
        kinds("function f(): never { throw new RuntimeException('no'); }"),
        vec![]
    );
}

#[test]
fn throw_only_stub_with_value_type_is_clean() {
    // A single throw is presumably an exception saying this method is not
    // to be used.
    assert_eq!(
        kinds("function f(): int { throw new LogicException('unimplemented'); }"),
        vec![]
    );
}

#[test]
fn exit_only_body_with_value_type_is_clean() {
    assert_eq!(kinds("function f(): int { exit(1); }"), vec![]);
}

#[test]
fn empty_body_with_value_type_reports_invalid_return() {
    let issues = analyze("function f(): int { $x = 1; }");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::InvalidReturnType);
    assert!(issues[0].message.contains("Not all code paths"));
}

#[test]
fn wrong_scalar_reports_declared_and_inferred() {
    let issues = analyze("function f(): string { return 5; }");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::InvalidReturnType);
    assert!(issues[0].message.contains("'string'"));
    assert!(issues[0].message.contains("'int'"));
}

#[test]
fn nullable_leak_against_native_int() {
    let source = r#"
        function f($c): int {
            if ($c) { return null; }
            return 5;
        }
    "#;
    assert_eq!(kinds(source), vec![IssueKind::InvalidNullableReturnType]);
}

#[test]
fn nullable_declared_type_admits_null_return() {
    let source = r#"
        function f($c): ?int {
            if ($c) { return null; }
            return 5;
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn falsable_leak_against_declared_int() {
    let source = "/** @return int */\nfunction pos($c) { return $c ? 1 : false; }";
    assert_eq!(kinds(source), vec![IssueKind::InvalidFalsableReturnType]);
}

#[test]
fn falsable_leak_not_reported_for_bool_declared_type() {
    let source = "function f($c): bool { return $c ? true : false; }";
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn missing_closure_return_type_mentions_inferred_nullable_string() {
    let source = r#"
        function outer(): void {
            $f = function ($c) { return rand(0, 1) ? "a" : null; };
        }
    "#;
    let issues = analyze(source);
    let closure_issues: Vec<_> = issues
        .iter()
        .filter(|issue| issue.kind == IssueKind::MissingClosureReturnType)
        .collect();
    assert_eq!(closure_issues.len(), 1);
    assert!(closure_issues[0].message.contains("?string"));
}

#[test]
fn to_string_returning_object_is_invalid() {
    let source = r#"
        class B {}
        class A {
            public function __toString() { return new B(); }
        }
    "#;
    assert_eq!(kinds(source), vec![IssueKind::InvalidToString]);
}

#[test]
fn to_string_returning_string_is_clean() {
    let source = r#"
        class A {
            public function __toString() { return 'a'; }
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn dunder_methods_without_declared_type_are_not_checked() {
    let source = r#"
        class A {
            public function __construct() { $this->x = 1; }
            public function __get($name) { return 5; }
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn generator_yield_type_supersedes_return_type() {
    // The declared docblock type describes the yielded values; the `return`
    // inside the generator does not clash with it.
    let source = r#"
        /** @return int */
        function gen() {
            yield 1;
            yield 2;
            return;
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn never_function_with_return_reports_invalid() {
    let issues = analyze("function f(): never { return; }");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::InvalidReturnType);
    assert!(issues[0].message.contains("not expected to return"));
}

#[test]
fn not_all_paths_return_with_native_type() {
    let source = r#"
        function f($c): int {
            if ($c) { return 1; }
        }
    "#;
    let issues = analyze(source);
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("Not all code paths"));
}

#[test]
fn docblock_declared_type_gets_implicit_null_instead() {
    // With a docblock-sourced declared type the fall-off models an implicit
    // null return rather than a control-flow complaint.
    let source = r#"
        /** @return ?int */
        function f($c) {
            if ($c) { return 1; }
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn docblock_nullable_skips_no_return_found() {
    // Docblock-sourced nullable declared types are treated as already
    // permissive when no return statements exist.
    let source = "/** @return ?int */\nfunction f() { $x = 1; }";
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn native_nullable_does_not_skip_control_flow_check() {
    let issues = analyze("function f(): ?int { $x = 1; }");
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("Not all code paths"));
}

#[test]
fn docblock_non_nullable_reports_no_return_found() {
    let issues = analyze("/** @return int */\nfunction f() { $x = 1; }");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::InvalidReturnType);
    assert!(issues[0].message.contains("No return statements were found"));
}

#[test]
fn missing_return_type_mentions_inferred() {
    let issues = analyze("function f() { return 5; }");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::MissingReturnType);
    assert!(issues[0].message.contains("expecting int"));
}

#[test]
fn mixed_inferred_cannot_be_verified() {
    let source = r#"
        function f($x): int {
            return $x;
        }
    "#;
    assert_eq!(kinds(source), vec![IssueKind::MixedInferredReturnType]);
}

#[test]
fn more_specific_declared_type_is_coercion() {
    let source = r#"
        class Base {}
        class Child extends Base {}
        /** @return Child */
        function f(): Child { return new Base(); }
    "#;
    let issues = analyze(source);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::MoreSpecificReturnType);
    assert!(issues[0].message.contains("more specific"));
}

#[test]
fn subclass_instance_satisfies_parent_return_type() {
    let source = r#"
        class Base {}
        class Child extends Base {}
        function f(): Base { return new Child(); }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn less_specific_return_type_for_plain_function() {
    let source = "function f(): ?int { return 5; }";
    assert_eq!(kinds(source), vec![IssueKind::LessSpecificReturnType]);
}

#[test]
fn less_specific_skipped_for_overridable_method() {
    // Base::make is public, non-final and overridden: narrowing the
    // declared contract is unsafe, so nothing is reported for it.
    let source = r#"
        class Base {
            public function make(): ?int { return 5; }
        }
        class Leaf extends Base {
            public function make(): ?int { return $c ? 5 : null; }
        }
    "#;
    let issues = analyze(source);
    assert!(
        issues
            .iter()
            .all(|issue| issue.kind != IssueKind::LessSpecificReturnType),
        "unexpected LessSpecificReturnType: {issues:?}"
    );
}

#[test]
fn less_specific_reported_for_private_method() {
    let source = r#"
        class A {
            private function make(): ?int { return 5; }
        }
    "#;
    assert_eq!(kinds(source), vec![IssueKind::LessSpecificReturnType]);
}

#[test]
fn mismatching_docblock_return_type() {
    let source = "/** @return string */\nfunction f(): int { return 'a'; }";
    let issues = analyze(source);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::MismatchingDocblockReturnType);
    assert!(issues[0].message.contains("'string'"));
    assert!(issues[0].message.contains("'int'"));
}

#[test]
fn self_return_type_is_fleshed_out() {
    let source = r#"
        class Builder {
            public function with(): self { return $this; }
        }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn verification_is_idempotent() {
    let source = "function f(): string { return 5; }";
    let first = analyze(source);
    let second = analyze(source);
    assert_eq!(first, second);

    let clean = "function f(): int { return 5; }";
    assert_eq!(analyze(clean), analyze(clean));
}

#[test]
fn suppressed_issue_is_dropped() {
    let source = r#"
        /** @suppress InvalidReturnType */
        function f(): string { return 5; }
    "#;
    assert_eq!(kinds(source), vec![]);
}

#[test]
fn issues_are_ordered_by_source_offset() {
    let source = r#"
        function a(): string { return 5; }
        function b(): int { return 'x'; }
    "#;
    let issues = analyze(source);
    assert_eq!(issues.len(), 2);
    assert!(issues[0].location.span.start < issues[1].location.span.start);
}

mod auto_fix {
    use super::*;
    use stanza_common::Severity;

    fn fixing(source: &str, issue_names: &[&str]) -> AnalysisResult {
        let mut config = Config::default();
        for name in issue_names {
            config.issues_to_fix.insert((*name).to_string());
        }
        analyze_with_config(source, config)
    }

    #[test]
    fn missing_return_type_queues_edit_instead_of_issue() {
        let result = fixing("function f() { return 5; }", &["MissingReturnType"]);
        assert!(result.issues.is_empty());
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].docblock_type, "int");
        assert_eq!(result.edits[0].native_type.as_deref(), Some("int"));
    }

    #[test]
    fn mixed_inferred_type_is_not_auto_added() {
        let result = fixing("function f($x) { return $x; }", &["MissingReturnType"]);
        assert!(result.edits.is_empty());
    }

    #[test]
    fn null_inferred_type_is_not_auto_added() {
        let result = fixing("function f() { return null; }", &["MissingReturnType"]);
        assert!(result.edits.is_empty());
    }

    #[test]
    fn invalid_return_type_rewrites_declared_type() {
        let result = fixing("function f(): string { return 5; }", &["InvalidReturnType"]);
        assert!(result.issues.is_empty());
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].docblock_type, "int");
    }

    #[test]
    fn nullable_fix_widens_declared_type() {
        let source = r#"
            function f($c): int {
                if ($c) { return null; }
                return 5;
            }
        "#;
        let result = fixing(source, &["InvalidNullableReturnType"]);
        assert!(result.issues.is_empty());
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].docblock_type, "?int");
    }

    #[test]
    fn falsable_union_is_docblock_only() {
        let source = "/** @return int */\nfunction pos($c) { return $c ? 1 : false; }";
        let result = fixing(source, &["InvalidFalsableReturnType"]);
        assert_eq!(result.edits.len(), 1);
        // int|false cannot be written as a native signature type.
        assert!(result.edits[0].native_type.is_none());
    }

    #[test]
    fn severity_config_downgrades_issue() {
        let mut config = Config::default();
        config.set_issue_level("InvalidReturnType", Severity::Suppress);
        let result = analyze_with_config("function f(): string { return 5; }", config);
        assert!(result.issues.is_empty());
    }
}
