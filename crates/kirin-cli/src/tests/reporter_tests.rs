use super::driver::{ClassSupertypes, LinkReport, ModuleSupertypes, ResolveReport};
use super::reporter::Reporter;
use kirin_common::Diagnostic;
use kirin_common::diagnostics::diagnostic_codes;
use kirin_linker::LinkStats;

fn loop_diagnostic() -> Diagnostic {
    Diagnostic::error(
        "app/A",
        "Loop in supertype definition for app.A",
        diagnostic_codes::LOOP_IN_SUPERTYPES,
    )
}

#[test]
fn plain_diagnostic_matches_display() {
    let reporter = Reporter::new(false);
    let diagnostic = loop_diagnostic();
    assert_eq!(reporter.format_diagnostic(&diagnostic), diagnostic.to_string());
    assert_eq!(
        reporter.format_diagnostic(&diagnostic),
        "app/A - error K1001: Loop in supertype definition for app.A"
    );
}

#[test]
fn resolve_report_lists_supertypes_and_errors() {
    let report = ResolveReport {
        modules: vec![ModuleSupertypes {
            module: "app".to_string(),
            classes: vec![
                ClassSupertypes {
                    declaration: "app/A".to_string(),
                    supertypes: vec!["<error: Loop in supertype definition for app.A>".to_string()],
                },
                ClassSupertypes {
                    declaration: "app/B".to_string(),
                    supertypes: Vec::new(),
                },
            ],
        }],
        diagnostics: vec![loop_diagnostic()],
        fake_overrides: Some(0),
    };
    let text = Reporter::new(false).render_resolve(&report);
    assert!(text.starts_with("module app\n"), "{text}");
    assert!(text.contains("  app/B: (none)"));
    assert!(text.contains("0 fake override(s) created"));
    assert!(text.ends_with("Found 1 error(s)."));
}

#[test]
fn link_report_mentions_unbound_symbols_only_when_present() {
    let mut report = LinkReport {
        modules: vec!["lib".to_string(), "app".to_string()],
        stats: LinkStats {
            modules: 2,
            top_levels: 3,
            bodies: 2,
            ..LinkStats::default()
        },
        fake_overrides: 1,
        unbound_symbols: Vec::new(),
    };
    let reporter = Reporter::new(false);
    let text = reporter.render_link(&report);
    assert!(text.starts_with("linked 2 module(s): lib, app"));
    assert!(text.contains("top levels:           3"));
    assert!(!text.contains("unbound"));

    report.unbound_symbols.push("lib/Missing|null[0]".to_string());
    let text = reporter.render_link(&report);
    assert!(text.contains("1 unbound symbol(s):"));
    assert!(text.ends_with("  lib/Missing|null[0]"));
}
