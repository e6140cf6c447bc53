use colored::Colorize;
use kirin_common::{Diagnostic, DiagnosticCategory};

use crate::driver::{LinkReport, PackReport, ResolveReport};

/// Text rendering of command reports.
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let category = match diagnostic.category {
            DiagnosticCategory::Error => self.paint("error", |s| s.red().bold()),
            DiagnosticCategory::Warning => self.paint("warning", |s| s.yellow().bold()),
            DiagnosticCategory::Message => self.paint("message", |s| s.blue().bold()),
        };
        let code = self.paint(&format!("K{}", diagnostic.code), |s| s.bright_black());
        format!(
            "{} - {category} {code}: {}",
            diagnostic.declaration, diagnostic.message_text
        )
    }

    fn render_diagnostics(&self, diagnostics: &[Diagnostic], out: &mut String) {
        if diagnostics.is_empty() {
            return;
        }
        out.push('\n');
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        let summary = format!("Found {} error(s).", diagnostics.len());
        out.push_str(&self.paint(&summary, |s| s.red()));
    }

    pub fn render_resolve(&self, report: &ResolveReport) -> String {
        let mut out = String::new();
        for module in &report.modules {
            out.push_str(&self.paint(&format!("module {}", module.module), |s| s.bold()));
            out.push('\n');
            for class in &module.classes {
                let supertypes = if class.supertypes.is_empty() {
                    "(none)".to_string()
                } else {
                    class.supertypes.join(", ")
                };
                out.push_str(&format!("  {}: {supertypes}\n", class.declaration));
            }
        }
        if let Some(created) = report.fake_overrides {
            out.push_str(&format!("{created} fake override(s) created\n"));
        }
        self.render_diagnostics(&report.diagnostics, &mut out);
        out.trim_end().to_string()
    }

    pub fn render_pack(&self, report: &PackReport) -> String {
        let mut out = String::new();
        for library in &report.libraries {
            out.push_str(&format!(
                "{} {} -> {} ({} file(s), {} top level(s))\n",
                self.paint("packed", |s| s.green()),
                library.module,
                library.path.display(),
                library.files,
                library.top_levels
            ));
        }
        self.render_diagnostics(&report.diagnostics, &mut out);
        out.trim_end().to_string()
    }

    pub fn render_link(&self, report: &LinkReport) -> String {
        let stats = &report.stats;
        let mut out = format!(
            "{} {} module(s): {}\n",
            self.paint("linked", |s| s.green()),
            report.modules.len(),
            report.modules.join(", ")
        );
        out.push_str(&format!("  top levels:           {}\n", stats.top_levels));
        out.push_str(&format!("  bodies:               {}\n", stats.bodies));
        out.push_str(&format!("  delegated expects:    {}\n", stats.delegated_expects));
        out.push_str(&format!("  forward declarations: {}\n", stats.forward_declarations));
        out.push_str(&format!("  fake overrides:       {}\n", report.fake_overrides));
        if !report.unbound_symbols.is_empty() {
            out.push_str(&self.paint(
                &format!("{} unbound symbol(s):", report.unbound_symbols.len()),
                |s| s.yellow(),
            ));
            out.push('\n');
            for symbol in &report.unbound_symbols {
                out.push_str(&format!("  {symbol}\n"));
            }
        }
        out.trim_end().to_string()
    }
}
