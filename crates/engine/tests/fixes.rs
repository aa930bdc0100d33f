use engine::{
    fix_file, run_pipeline, AstCache, CancellationFlag, Edit, ErrorKind, Finding, FixState,
    MetricsRecorder, PipelineConfig, RuleRegistry, Severity,
};
use engine::selector::FirstFixer;
use ir::Document;
use rules::RuleDescriptor;

fn run_one(text: &str) -> engine::FileOutcome {
    run_pipeline(vec![("script.ps1".to_string(), text.to_string())])
        .into_iter()
        .next()
        .expect("one outcome per input")
}

#[test]
fn alias_commands_are_canonicalized() {
    let outcome = run_one("gci -Path C:\\Temp\n");
    assert!(outcome.success);
    assert!(outcome.changed);
    assert_eq!(outcome.fixed_content, "Get-ChildItem -Path C:\\Temp\n");
    let fix = outcome
        .results
        .iter()
        .find(|r| r.rule_id == "alias-usage")
        .expect("alias fix recorded");
    assert_eq!(fix.state, FixState::Validated);
    assert!(fix.confidence >= 0.5);
}

#[test]
fn empty_catch_gets_error_reporting() {
    let outcome = run_one("try { Get-Item $path } catch { }");
    assert_eq!(
        outcome.fixed_content,
        "try { Get-Item $path } catch { Write-Error $_ }"
    );
    assert!(outcome
        .results
        .iter()
        .any(|r| r.rule_id == "empty-catch" && r.state == FixState::Validated));
}

#[test]
fn empty_catch_fix_keeps_interior_comments() {
    let outcome = run_one("try { DoWork } catch { # keep me: retry is intentional\n}");
    assert!(outcome.changed);
    assert_eq!(
        outcome.fixed_content,
        "try { DoWork } catch { Write-Error $_ # keep me: retry is intentional\n}"
    );
    assert!(outcome
        .results
        .iter()
        .any(|r| r.rule_id == "empty-catch" && r.state == FixState::Validated));
}

#[test]
fn insecure_urls_are_upgraded() {
    let outcome = run_one("Invoke-WebRequest \"http://example.org/data\"");
    assert_eq!(
        outcome.fixed_content,
        "Invoke-WebRequest \"https://example.org/data\""
    );
}

#[test]
fn invoke_expression_is_flagged_not_fixed() {
    let outcome = run_one("Invoke-Expression $userInput");
    assert!(outcome.success);
    assert!(!outcome.changed);
    assert_eq!(outcome.fixed_content, "Invoke-Expression $userInput");
    let skip = outcome
        .results
        .iter()
        .find(|r| r.rule_id == "invoke-expression")
        .expect("finding recorded");
    assert_eq!(skip.state, FixState::Skipped);
    assert_eq!(skip.error_kind, Some(ErrorKind::ManualReviewRequired));
    assert!(outcome
        .outstanding
        .iter()
        .any(|f| f.rule_id == "invoke-expression"));
}

#[test]
fn plaintext_password_is_detect_only() {
    let src = "$p = ConvertTo-SecureString \"hunter2\" -AsPlainText -Force";
    let outcome = run_one(src);
    assert!(!outcome.changed);
    assert!(outcome
        .outstanding
        .iter()
        .any(|f| f.rule_id == "plaintext-password"));
}

#[test]
fn unparseable_files_are_left_byte_identical() {
    let src = "Write-Output \"never closed";
    let outcome = run_one(src);
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(ErrorKind::ParseFailure));
    assert!(!outcome.changed);
    assert_eq!(outcome.fixed_content, src);
    assert!(outcome.results.is_empty());
}

#[test]
fn second_run_over_fixed_output_is_a_no_op() {
    let sources = vec![
        ("a.ps1".to_string(), "gci -Path C:\\  \n".to_string()),
        (
            "b.ps1".to_string(),
            "try { ls } catch { }\niwr http://example.org\n".to_string(),
        ),
        ("c.ps1".to_string(), "Write-Output 'clean'\n".to_string()),
    ];
    let first = run_pipeline(sources);
    let fixed: Vec<(String, String)> = first
        .iter()
        .map(|o| (o.path.clone(), o.fixed_content.clone()))
        .collect();
    let second = run_pipeline(fixed);
    for outcome in &second {
        assert!(!outcome.changed, "{} changed on the second run", outcome.path);
        assert!(outcome
            .results
            .iter()
            .all(|r| r.applied_edits.is_empty()));
    }
}

#[test]
fn every_validated_fix_keeps_the_file_parseable() {
    let sources = vec![
        ("a.ps1".to_string(), "gci; cat $f; rm $g  \n".to_string()),
        (
            "b.ps1".to_string(),
            "try {\n  iwr http://x.example\n} catch {\n}\n".to_string(),
        ),
    ];
    for outcome in run_pipeline(sources) {
        assert!(outcome.success);
        assert!(!parsers::parse(&outcome.fixed_content).has_fatal_errors());
    }
}

fn swap_detector(doc: &Document) -> Vec<Finding> {
    if doc.source.starts_with("swapit") {
        vec![Finding::new(
            "swap",
            Severity::Warning,
            ir::Span::new(0, 4, 1, 1),
            "swap prefix",
        )]
    } else {
        Vec::new()
    }
}

fn swap_fixer(_doc: &Document, _finding: &Finding) -> Vec<Edit> {
    vec![Edit::replace(0, 4, "SWAP")]
}

fn tail_detector(doc: &Document) -> Vec<Finding> {
    if doc.source.starts_with("swapit") {
        vec![Finding::new(
            "tail",
            Severity::Warning,
            ir::Span::new(2, 6, 1, 3),
            "tail overlap",
        )]
    } else {
        Vec::new()
    }
}

fn tail_fixer(_doc: &Document, _finding: &Finding) -> Vec<Edit> {
    vec![Edit::replace(2, 6, "XXXX")]
}

#[test]
fn overlapping_proposals_resolve_to_the_first_registered_rule() {
    let mut registry = RuleRegistry::new();
    registry
        .register(RuleDescriptor {
            id: "swap",
            default_severity: Severity::Warning,
            detector: swap_detector,
            fixers: vec![swap_fixer],
        })
        .unwrap();
    registry
        .register(RuleDescriptor {
            id: "tail",
            default_severity: Severity::Warning,
            detector: tail_detector,
            fixers: vec![tail_fixer],
        })
        .unwrap();

    let cache = AstCache::new(4);
    let outcome = fix_file(
        "conflict.ps1",
        "swapit",
        &registry,
        &cache,
        &PipelineConfig::default(),
        &MetricsRecorder::new(),
        &FirstFixer,
        &CancellationFlag::new(),
    );

    // the first-registered rule wins the overlapping region; the loser
    // is retried on the next pass, where its detector no longer fires
    assert_eq!(outcome.fixed_content, "SWAPit");
    let validated: Vec<&str> = outcome
        .results
        .iter()
        .filter(|r| r.state == FixState::Validated)
        .map(|r| r.rule_id.as_str())
        .collect();
    assert_eq!(validated, ["swap"]);
}

#[test]
fn duplicate_rule_registration_fails_fast() {
    let mut registry = RuleRegistry::builtin();
    let err = registry.register(rules::builtin::all().remove(0)).unwrap_err();
    assert!(err.to_string().contains("duplicate rule id"));
}
