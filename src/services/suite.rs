//! Smoke runner: idempotent account setup, login, then every check in plan order.
//!
//! Only a failed login aborts a run. Every other failure is recorded and the
//! runner moves on to the next check.

use crate::domain::constants::{ROUTE_LOGIN, ROUTE_REGISTER};
use crate::domain::models::{CheckOutcome, CheckRecord, LoginRequest, RegisterRequest, RunReport};
use crate::services::catalog::{Check, RunContext};
use crate::services::client::{ApiResponse, Method, Transport};
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(thiserror::Error, Debug)]
pub enum SmokeError {
    #[error("login failed: {body}")]
    LoginFailed { status: Option<u16>, body: String },
    #[error("invalid payload for {check}: {source}")]
    Payload {
        check: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SmokeError {
    pub fn code(&self) -> &'static str {
        match self {
            SmokeError::LoginFailed { .. } => "LOGIN_FAILED",
            SmokeError::Payload { .. } => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Direct access to a backend's user table, used to make setup idempotent.
pub trait AccountReset {
    /// Removes any user registered under `email`. Returns whether one existed.
    fn reset_user(&self, email: &str) -> anyhow::Result<bool>;
}

/// Receives run events as they happen; the default methods ignore everything.
pub trait Progress {
    fn section(&mut self, _title: &str) {}
    fn registered(&mut self, _status: Option<u16>) {}
    fn logged_in(&mut self, _status: u16, _user_id: Option<&str>, _tenant_id: Option<&str>) {}
    fn check(&mut self, _event: &CheckEvent<'_>) {}
}

pub struct Silent;

impl Progress for Silent {}

pub struct CheckEvent<'a> {
    pub record: &'a CheckRecord,
    pub check: &'a Check,
    pub count: Option<usize>,
    pub captured: Option<&'a str>,
    pub error_body: Option<&'a Value>,
}

pub struct SuiteRunner<'a, T: Transport> {
    transport: &'a T,
    base_url: String,
    credentials: Credentials,
    reset: Option<&'a dyn AccountReset>,
    plan: Vec<Check>,
}

impl<'a, T: Transport> SuiteRunner<'a, T> {
    pub fn new(transport: &'a T, base_url: &str, credentials: Credentials, plan: Vec<Check>) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            credentials,
            reset: None,
            plan,
        }
    }

    pub fn with_reset(mut self, reset: &'a dyn AccountReset) -> Self {
        self.reset = Some(reset);
        self
    }

    pub fn run(&self, progress: &mut dyn Progress) -> Result<RunReport, SmokeError> {
        if let Some(reset) = self.reset {
            match reset.reset_user(&self.credentials.email) {
                Ok(existed) => debug!(email = %self.credentials.email, existed, "test user reset"),
                Err(e) => warn!(error = %e, "test user reset failed"),
            }
        }

        let registration_status = self.register()?;
        progress.registered(registration_status);

        let (token, mut ctx) = self.login(progress)?;

        let mut checks = Vec::with_capacity(self.plan.len());
        let mut current_group = "";
        for check in &self.plan {
            if check.group != current_group {
                current_group = check.group;
                progress.section(current_group);
            }
            let record = self.run_check(check, &token, &mut ctx, progress)?;
            checks.push(record);
        }

        let report = summarize(&self.base_url, registration_status, &ctx, checks);
        info!(
            passed = report.passed,
            failed = report.failed,
            total = report.total,
            "smoke run finished"
        );
        Ok(report)
    }

    /// Only a payload that cannot be built is an error; any response, or no
    /// response at all, lets the run continue.
    fn register(&self) -> Result<Option<u16>, SmokeError> {
        let body = serde_json::to_value(RegisterRequest {
            email: self.credentials.email.clone(),
            password: self.credentials.password.clone(),
            full_name: self.credentials.full_name.clone(),
        })
        .map_err(|e| SmokeError::Payload {
            check: "Register User".to_string(),
            source: e.into(),
        })?;
        match self.transport.send(Method::Post, ROUTE_REGISTER, Some(&body), None) {
            Ok(resp) => {
                if !matches!(resp.status, 200 | 201) {
                    warn!(status = resp.status, body = %resp.body, "registration not accepted, continuing");
                }
                Ok(Some(resp.status))
            }
            Err(e) => {
                warn!(error = %e, "registration request failed, continuing");
                Ok(None)
            }
        }
    }

    fn login(&self, progress: &mut dyn Progress) -> Result<(String, RunContext), SmokeError> {
        let body = serde_json::to_value(LoginRequest {
            email: self.credentials.email.clone(),
            password: self.credentials.password.clone(),
        })
        .map_err(|e| SmokeError::Payload {
            check: "Login User".to_string(),
            source: e.into(),
        })?;

        let resp = self
            .transport
            .send(Method::Post, ROUTE_LOGIN, Some(&body), None)
            .map_err(|e| SmokeError::LoginFailed {
                status: None,
                body: e.to_string(),
            })?;

        if resp.status != 200 {
            return Err(SmokeError::LoginFailed {
                status: Some(resp.status),
                body: resp.body.to_string(),
            });
        }
        let token = resp
            .field("access")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SmokeError::LoginFailed {
                status: Some(resp.status),
                body: format!("no access token in response: {}", resp.body),
            })?
            .to_string();

        let user = resp.field("user");
        let ctx = RunContext {
            user_id: user.and_then(|u| u.get("user_id")).and_then(id_string),
            tenant_id: user.and_then(|u| u.get("tenant_id")).and_then(id_string),
            ..Default::default()
        };
        progress.logged_in(resp.status, ctx.user_id.as_deref(), ctx.tenant_id.as_deref());
        Ok((token, ctx))
    }

    fn run_check(
        &self,
        check: &Check,
        token: &str,
        ctx: &mut RunContext,
        progress: &mut dyn Progress,
    ) -> Result<CheckRecord, SmokeError> {
        let mut record = CheckRecord {
            name: check.name.to_string(),
            group: check.group.to_string(),
            method: check.method.as_str().to_string(),
            path: check.path.to_string(),
            status_code: None,
            outcome: CheckOutcome::Fail,
            detail: None,
        };

        let path = match check.resolve_path(ctx) {
            Ok(p) => p,
            Err(missing) => {
                record.detail = Some(format!("missing prerequisite: {}", missing));
                progress.check(&CheckEvent {
                    record: &record,
                    check,
                    count: None,
                    captured: None,
                    error_body: None,
                });
                return Ok(record);
            }
        };
        record.path = path.clone();

        let payload = check
            .build_payload(ctx)
            .map_err(|source| SmokeError::Payload {
                check: check.name.to_string(),
                source,
            })?;

        let resp = match self.transport.send(check.method, &path, payload.as_ref(), Some(token)) {
            Ok(r) => r,
            Err(e) => {
                warn!(check = check.name, error = %e, "request failed");
                record.detail = Some(e.to_string());
                progress.check(&CheckEvent {
                    record: &record,
                    check,
                    count: None,
                    captured: None,
                    error_body: None,
                });
                return Ok(record);
            }
        };
        record.status_code = Some(resp.status);

        if check.accepts(resp.status) {
            record.outcome = CheckOutcome::Pass;
            let mut stored = None;
            if let Some(cap) = check.capture {
                if let Some(value) = resp.field("id").and_then(id_string) {
                    ctx.store(cap, value);
                    stored = Some(cap);
                }
            }
            let captured = stored.and_then(|cap| ctx.get(cap.key()));
            let count = check.count_label.map(|_| resp.item_count());
            progress.check(&CheckEvent {
                record: &record,
                check,
                count,
                captured,
                error_body: None,
            });
        } else {
            record.detail = Some(error_detail(&resp));
            warn!(check = check.name, status = resp.status, body = %resp.body, "check failed");
            progress.check(&CheckEvent {
                record: &record,
                check,
                count: None,
                captured: None,
                error_body: check.reports_error_body().then_some(&resp.body),
            });
        }
        Ok(record)
    }
}

/// Ids may come back as JSON strings or numbers depending on the backend.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn error_detail(resp: &ApiResponse) -> String {
    match &resp.body {
        Value::Null => format!("unexpected status {}", resp.status),
        other => other.to_string(),
    }
}

pub fn summarize(
    base_url: &str,
    registration_status: Option<u16>,
    ctx: &RunContext,
    checks: Vec<CheckRecord>,
) -> RunReport {
    let passed = checks.iter().filter(|c| c.passed()).count();
    let total = checks.len();
    RunReport {
        base_url: base_url.to_string(),
        registration_status,
        user_id: ctx.user_id.clone(),
        tenant_id: ctx.tenant_id.clone(),
        checks,
        passed,
        failed: total - passed,
        total,
        pass_rate: pass_rate(passed, total),
    }
}

pub fn pass_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (passed as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::smoke_plan;
    use serde_json::json;
    use std::cell::RefCell;

    /// Answers by route, records every request it sees.
    struct ScriptedTransport {
        login_status: u16,
        register_down: bool,
        fail_paths: Vec<&'static str>,
        seen: RefCell<Vec<(Method, String, Option<String>)>>,
    }

    impl ScriptedTransport {
        fn healthy() -> Self {
            Self {
                login_status: 200,
                register_down: false,
                fail_paths: Vec::new(),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send(
            &self,
            method: Method,
            path: &str,
            _body: Option<&Value>,
            bearer: Option<&str>,
        ) -> anyhow::Result<ApiResponse> {
            self.seen
                .borrow_mut()
                .push((method, path.to_string(), bearer.map(str::to_string)));
            if self.register_down && path == ROUTE_REGISTER {
                anyhow::bail!("connection reset by peer");
            }
            if self.fail_paths.iter().any(|p| path.starts_with(p)) {
                return Ok(ApiResponse {
                    status: 500,
                    body: json!({"detail": "boom"}),
                });
            }
            let (status, body) = match (method, path) {
                (Method::Post, ROUTE_REGISTER) => (201, json!({"user_id": "u-1"})),
                (Method::Post, ROUTE_LOGIN) => (
                    self.login_status,
                    json!({"access": "tok", "user": {"user_id": "u-1", "tenant_id": "t-1"}}),
                ),
                (Method::Post, "/api/contracts/") => (201, json!({"id": "c-1"})),
                (Method::Post, "/api/contract-templates/") => (201, json!({"id": 7})),
                (Method::Post, _) => (201, json!({"id": "x"})),
                (Method::Get, "/api/contracts/") => (200, json!([{"id": "c-1"}, {"id": "c-2"}])),
                _ => (200, json!([])),
            };
            Ok(ApiResponse { status, body })
        }
    }

    struct Recorder(Vec<String>);

    impl Progress for Recorder {
        fn section(&mut self, title: &str) {
            self.0.push(format!("section:{}", title));
        }
        fn check(&mut self, event: &CheckEvent<'_>) {
            self.0.push(format!(
                "{}:{:?}:{:?}",
                event.record.name, event.record.outcome, event.count
            ));
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "completefixtest@example.com".to_string(),
            password: "TestPass123!@#".to_string(),
            full_name: "Test User".to_string(),
        }
    }

    #[test]
    fn healthy_backend_passes_every_check() {
        let transport = ScriptedTransport::healthy();
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let report = runner.run(&mut Silent).unwrap();

        assert_eq!(report.total, 18);
        assert_eq!(report.passed, 18);
        assert_eq!(report.failed, 0);
        assert_eq!(report.pass_rate, 100.0);
        assert_eq!(report.user_id.as_deref(), Some("u-1"));
        assert_eq!(report.registration_status, Some(201));

        let seen = transport.seen.borrow();
        assert!(seen.iter().any(|(_, p, _)| p == "/api/contracts/c-1/clone/"));
        assert!(seen
            .iter()
            .filter(|(_, p, _)| p.starts_with("/api/contracts"))
            .all(|(_, _, bearer)| bearer.as_deref() == Some("tok")));
    }

    #[test]
    fn failures_are_tallied_and_the_run_continues() {
        let transport = ScriptedTransport {
            fail_paths: vec!["/api/workflows/", "/api/repository/"],
            ..ScriptedTransport::healthy()
        };
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let report = runner.run(&mut Silent).unwrap();

        assert_eq!(report.failed, 4);
        assert_eq!(report.passed + report.failed, report.total);
        assert_eq!(report.pass_rate, 77.8);
        let failed: Vec<&str> = report
            .checks
            .iter()
            .filter(|c| !c.passed())
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            failed,
            vec!["Create Workflow", "List Workflows", "Repository Contents", "Repository Folders"]
        );
        assert_eq!(report.checks[11].status_code, Some(500));
    }

    #[test]
    fn unreachable_registration_is_reported_and_not_fatal() {
        let transport = ScriptedTransport {
            register_down: true,
            ..ScriptedTransport::healthy()
        };
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let report = runner.run(&mut Silent).unwrap();

        assert_eq!(report.registration_status, None);
        assert_eq!(report.passed, 18);
    }

    #[test]
    fn login_failure_is_fatal() {
        let transport = ScriptedTransport {
            login_status: 401,
            ..ScriptedTransport::healthy()
        };
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let err = runner.run(&mut Silent).unwrap_err();

        assert_eq!(err.code(), "LOGIN_FAILED");
        assert!(matches!(err, SmokeError::LoginFailed { status: Some(401), .. }));
        assert_eq!(transport.seen.borrow().len(), 2);
    }

    #[test]
    fn missing_contract_id_fails_dependent_checks_without_requests() {
        let transport = ScriptedTransport {
            fail_paths: vec!["/api/contracts/"],
            ..ScriptedTransport::healthy()
        };
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let report = runner.run(&mut Silent).unwrap();

        let get = &report.checks[1];
        assert!(!get.passed());
        assert_eq!(get.status_code, None);
        assert_eq!(get.detail.as_deref(), Some("missing prerequisite: contract_id"));
        let seen = transport.seen.borrow();
        assert!(!seen.iter().any(|(_, p, _)| p.contains("{contract_id}")));
        assert_eq!(report.passed + report.failed, 18);
    }

    #[test]
    fn reset_hook_runs_before_registration() {
        struct Reset(RefCell<Vec<String>>);
        impl AccountReset for Reset {
            fn reset_user(&self, email: &str) -> anyhow::Result<bool> {
                self.0.borrow_mut().push(email.to_string());
                Ok(true)
            }
        }

        let transport = ScriptedTransport::healthy();
        let reset = Reset(RefCell::new(Vec::new()));
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan())
            .with_reset(&reset);
        runner.run(&mut Silent).unwrap();
        assert_eq!(*reset.0.borrow(), vec!["completefixtest@example.com".to_string()]);
    }

    #[test]
    fn progress_sees_sections_and_counts() {
        let transport = ScriptedTransport::healthy();
        let runner = SuiteRunner::new(&transport, "http://x", credentials(), smoke_plan());
        let mut rec = Recorder(Vec::new());
        runner.run(&mut rec).unwrap();

        assert_eq!(rec.0[0], "section:CONTRACTS");
        assert!(rec.0.contains(&"List Contracts:Pass:Some(2)".to_string()));
        let sections = rec.0.iter().filter(|e| e.starts_with("section:")).count();
        assert_eq!(sections, 6);
    }

    #[test]
    fn pass_rate_guards_empty_runs() {
        assert_eq!(pass_rate(0, 0), 0.0);
        assert_eq!(pass_rate(1, 3), 33.3);
    }
}
