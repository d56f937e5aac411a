use crate::domain::constants::{BANNER_WIDTH, RUN_TITLE};
use crate::domain::models::{CheckRecord, ErrorBody, JsonErr, JsonOut, RunReport};
use crate::services::suite::{CheckEvent, Progress};
use serde::Serialize;
use std::io::Write;

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

pub fn print_one<T: Serialize>(
    json: bool,
    ok: bool,
    data: T,
    text: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok, data })?
        );
    } else {
        println!("{}", text(&data));
    }
    Ok(())
}

/// Errors go to stdout in JSON mode so callers parse a single document.
pub fn print_error(json: bool, code: &str, message: &str) {
    if json {
        let err = JsonErr {
            ok: false,
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        };
        match serde_json::to_string_pretty(&err) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("error: {}", message),
        }
    } else {
        eprintln!("error: {}", message);
    }
}

pub fn banner(title: &str) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}

fn status_text(record: &CheckRecord) -> String {
    match (record.status_code, record.detail.as_deref()) {
        (Some(code), _) => code.to_string(),
        (None, Some(detail)) => detail.to_string(),
        (None, None) => "no response".to_string(),
    }
}

/// Human-readable progress, printed as the run goes.
pub struct TextProgress<W: Write> {
    out: W,
}

impl TextProgress<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> TextProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn header(&mut self) {
        let _ = writeln!(self.out, "{}", banner(RUN_TITLE));
    }

    pub fn login_failed(&mut self, body: &str) {
        let _ = writeln!(self.out, "Login failed: {}", body);
    }

    pub fn summary(&mut self, report: &RunReport) {
        let _ = writeln!(self.out, "\n{}", banner("TEST SUMMARY"));
        for c in &report.checks {
            let _ = writeln!(
                self.out,
                "{} {}: {}",
                mark(c.passed()),
                c.name,
                if c.passed() { "PASS" } else { "FAIL" }
            );
        }
        let rule = "=".repeat(BANNER_WIDTH);
        let _ = writeln!(self.out, "\n{}", rule);
        let _ = writeln!(
            self.out,
            "TOTAL: {} PASSED, {} FAILED out of {}",
            report.passed, report.failed, report.total
        );
        let _ = writeln!(self.out, "Pass Rate: {:.1}%", report.pass_rate);
        let _ = writeln!(self.out, "{}", rule);
    }
}

impl<W: Write> Progress for TextProgress<W> {
    fn section(&mut self, title: &str) {
        let _ = writeln!(self.out, "\n{}", banner(title));
    }

    fn registered(&mut self, status: Option<u16>) {
        let line = match status {
            Some(code) => format!("{} Register User: {}", mark(matches!(code, 200 | 201)), code),
            None => format!("{} Register User: no response", mark(false)),
        };
        let _ = writeln!(self.out, "\n{}", line);
    }

    fn logged_in(&mut self, status: u16, user_id: Option<&str>, tenant_id: Option<&str>) {
        let _ = writeln!(self.out, "✓ Login User: {}", status);
        let _ = writeln!(self.out, "  → User ID: {}", user_id.unwrap_or("None"));
        let _ = writeln!(self.out, "  → Tenant ID: {}", tenant_id.unwrap_or("None"));
    }

    fn check(&mut self, event: &CheckEvent<'_>) {
        let record = event.record;
        let mut line = format!("{} {}: {}", mark(record.passed()), record.name, status_text(record));
        if let (Some(n), Some(label)) = (event.count, event.check.count_label) {
            line.push_str(&format!(" ({} {})", n, label));
        }
        let _ = writeln!(self.out, "{}", line);

        if let (Some(id), Some(cap)) = (event.captured, event.check.capture) {
            let _ = writeln!(self.out, "  → {}: {}", cap.label(), id);
        }
        if let Some(body) = event.error_body {
            let _ = writeln!(self.out, "  Error: {}", body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CheckOutcome;
    use crate::services::catalog::smoke_plan;
    use serde_json::json;

    fn record(name: &str, status: Option<u16>, outcome: CheckOutcome) -> CheckRecord {
        CheckRecord {
            name: name.to_string(),
            group: "CONTRACTS".to_string(),
            method: "POST".to_string(),
            path: "/api/contracts/".to_string(),
            status_code: status,
            outcome,
            detail: None,
        }
    }

    fn rendered(p: TextProgress<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    #[test]
    fn check_lines_carry_captures_counts_and_errors() {
        let plan = smoke_plan();
        let mut p = TextProgress::new(Vec::new());

        let created = record("Create Contract", Some(201), CheckOutcome::Pass);
        p.check(&CheckEvent {
            record: &created,
            check: &plan[0],
            count: None,
            captured: Some("c-1"),
            error_body: None,
        });
        let listed = record("List Contracts", Some(200), CheckOutcome::Pass);
        p.check(&CheckEvent {
            record: &listed,
            check: &plan[3],
            count: Some(2),
            captured: None,
            error_body: None,
        });
        let failed = record("Clone Contract", Some(400), CheckOutcome::Fail);
        let body = json!({"title": ["bad"]});
        p.check(&CheckEvent {
            record: &failed,
            check: &plan[5],
            count: None,
            captured: None,
            error_body: Some(&body),
        });

        let text = rendered(p);
        assert!(text.contains("✓ Create Contract: 201\n  → Contract ID: c-1\n"));
        assert!(text.contains("✓ List Contracts: 200 (2 contracts)\n"));
        assert!(text.contains("✗ Clone Contract: 400\n  Error: {\"title\":[\"bad\"]}\n"));
    }

    #[test]
    fn summary_reports_totals_and_rate() {
        let report = RunReport {
            base_url: "http://127.0.0.1:8000".to_string(),
            registration_status: Some(201),
            user_id: None,
            tenant_id: None,
            checks: vec![
                record("Create Contract", Some(201), CheckOutcome::Pass),
                record("Get Contract", Some(404), CheckOutcome::Fail),
            ],
            passed: 1,
            failed: 1,
            total: 2,
            pass_rate: 50.0,
        };
        let mut p = TextProgress::new(Vec::new());
        p.summary(&report);
        let text = rendered(p);
        assert!(text.contains("TEST SUMMARY"));
        assert!(text.contains("✓ Create Contract: PASS\n✗ Get Contract: FAIL\n"));
        assert!(text.contains("TOTAL: 1 PASSED, 1 FAILED out of 2\nPass Rate: 50.0%\n"));
    }

    #[test]
    fn banner_is_eighty_wide() {
        let b = banner("CONTRACTS");
        let lines: Vec<&str> = b.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), BANNER_WIDTH);
        assert_eq!(lines[1], "CONTRACTS");
    }
}
