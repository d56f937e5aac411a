//! The smoke plan: every endpoint check a run executes, in order.

use crate::domain::constants::*;
use crate::domain::models::{
    CloneCreate, ContractCreate, ContractUpdate, MetadataFieldCreate, NotificationCreate,
    PlanEntry, TemplateCreate, VersionCreate, WorkflowCreate,
};
use crate::services::client::Method;
use serde_json::Value;

pub const GROUP_CONTRACTS: &str = "CONTRACTS";
pub const GROUP_TEMPLATES: &str = "TEMPLATES";
pub const GROUP_NOTIFICATIONS: &str = "NOTIFICATIONS";
pub const GROUP_WORKFLOWS: &str = "WORKFLOWS";
pub const GROUP_METADATA: &str = "METADATA";
pub const GROUP_DOCUMENTS: &str = "DOCUMENTS & REPOSITORY";

const CREATED: &[u16] = &[200, 201];
const OK: &[u16] = &[200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    ContractId,
    TemplateId,
}

impl Capture {
    pub fn key(&self) -> &'static str {
        match self {
            Capture::ContractId => "contract_id",
            Capture::TemplateId => "template_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Capture::ContractId => "Contract ID",
            Capture::TemplateId => "Template ID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    None,
    CreateContract,
    UpdateContract,
    CreateVersion,
    CloneContract,
    CreateTemplate,
    CreateNotification,
    CreateWorkflow,
    CreateMetadataField,
}

/// Values captured while the plan runs, used to fill path templates and payloads.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub contract_id: Option<String>,
    pub template_id: Option<String>,
}

impl RunContext {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "user_id" => self.user_id.as_deref(),
            "tenant_id" => self.tenant_id.as_deref(),
            "contract_id" => self.contract_id.as_deref(),
            "template_id" => self.template_id.as_deref(),
            _ => None,
        }
    }

    pub fn store(&mut self, capture: Capture, value: String) {
        match capture {
            Capture::ContractId => self.contract_id = Some(value),
            Capture::TemplateId => self.template_id = Some(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Check {
    pub group: &'static str,
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub expect: &'static [u16],
    pub payload: Payload,
    pub capture: Option<Capture>,
    /// Noun printed with the item count on success, e.g. "contracts".
    pub count_label: Option<&'static str>,
}

impl Check {
    fn new(
        group: &'static str,
        name: &'static str,
        method: Method,
        path: &'static str,
        expect: &'static [u16],
    ) -> Self {
        Self {
            group,
            name,
            method,
            path,
            expect,
            payload: Payload::None,
            capture: None,
            count_label: None,
        }
    }

    fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    fn capturing(mut self, capture: Capture) -> Self {
        self.capture = Some(capture);
        self
    }

    fn counting(mut self, label: &'static str) -> Self {
        self.count_label = Some(label);
        self
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.expect.contains(&status)
    }

    /// Create-style checks log the error body on failure.
    pub fn reports_error_body(&self) -> bool {
        self.payload != Payload::None && self.method == Method::Post
    }

    pub fn matches_group(&self, selector: &str) -> bool {
        let sel = selector.trim();
        self.group.eq_ignore_ascii_case(sel)
            || self
                .group
                .split_whitespace()
                .next()
                .map(|w| w.eq_ignore_ascii_case(sel))
                .unwrap_or(false)
    }

    /// Fills `{placeholder}` segments from the context. Returns the name of the
    /// first missing value on failure.
    pub fn resolve_path(&self, ctx: &RunContext) -> Result<String, String> {
        let mut out = String::with_capacity(self.path.len() + 36);
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let key = &rest[start + 1..start + len];
            let value = ctx.get(key).ok_or_else(|| key.to_string())?;
            out.push_str(&rest[..start]);
            out.push_str(value);
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    pub fn build_payload(&self, ctx: &RunContext) -> anyhow::Result<Option<Value>> {
        let value = match self.payload {
            Payload::None => return Ok(None),
            Payload::CreateContract => serde_json::to_value(ContractCreate {
                title: "Test Contract".to_string(),
                description: "Test Description".to_string(),
                status: Some("draft".to_string()),
            })?,
            Payload::UpdateContract => serde_json::to_value(ContractUpdate {
                title: Some("Updated Contract".to_string()),
                status: Some("pending".to_string()),
                ..Default::default()
            })?,
            Payload::CreateVersion => serde_json::to_value(VersionCreate {
                selected_clauses: vec!["CONF-001".to_string(), "TERM-001".to_string()],
                change_summary: "Updated contract".to_string(),
            })?,
            Payload::CloneContract => serde_json::to_value(CloneCreate {
                title: Some("Cloned Contract".to_string()),
            })?,
            Payload::CreateTemplate => serde_json::to_value(TemplateCreate {
                name: "Test Template".to_string(),
                contract_type: "NDA".to_string(),
                description: "Test Template".to_string(),
                r2_key: "test-template-key.docx".to_string(),
                merge_fields: vec!["company_name".to_string(), "date".to_string()],
                status: Some("draft".to_string()),
            })?,
            Payload::CreateNotification => serde_json::to_value(NotificationCreate {
                message: "Test notification".to_string(),
                notification_type: "email".to_string(),
                subject: "Test Subject".to_string(),
                body: "Test Body".to_string(),
                recipient_id: ctx.user_id.clone(),
            })?,
            Payload::CreateWorkflow => serde_json::to_value(WorkflowCreate {
                name: "Test Workflow".to_string(),
                description: "Test workflow description".to_string(),
                steps: Vec::new(),
            })?,
            Payload::CreateMetadataField => serde_json::to_value(MetadataFieldCreate {
                name: "test_field".to_string(),
                field_type: "text".to_string(),
                description: "Test field".to_string(),
            })?,
        };
        Ok(Some(value))
    }

    pub fn plan_entry(&self) -> PlanEntry {
        PlanEntry {
            group: self.group.to_string(),
            name: self.name.to_string(),
            method: self.method.as_str().to_string(),
            path: self.path.to_string(),
            expect: self.expect.to_vec(),
        }
    }
}

pub fn smoke_plan() -> Vec<Check> {
    use Method::*;
    vec![
        Check::new(GROUP_CONTRACTS, "Create Contract", Post, ROUTE_CONTRACTS, CREATED)
            .with_payload(Payload::CreateContract)
            .capturing(Capture::ContractId),
        Check::new(GROUP_CONTRACTS, "Get Contract", Get, "/api/contracts/{contract_id}/", OK),
        Check::new(GROUP_CONTRACTS, "Update Contract", Put, "/api/contracts/{contract_id}/", CREATED)
            .with_payload(Payload::UpdateContract),
        Check::new(GROUP_CONTRACTS, "List Contracts", Get, ROUTE_CONTRACTS, OK)
            .counting("contracts"),
        Check::new(
            GROUP_CONTRACTS,
            "Create Contract Version",
            Post,
            "/api/contracts/{contract_id}/create-version/",
            CREATED,
        )
        .with_payload(Payload::CreateVersion),
        Check::new(GROUP_CONTRACTS, "Clone Contract", Post, "/api/contracts/{contract_id}/clone/", CREATED)
            .with_payload(Payload::CloneContract),
        Check::new(
            GROUP_CONTRACTS,
            "List Contract Versions",
            Get,
            "/api/contracts/{contract_id}/versions/",
            OK,
        ),
        Check::new(GROUP_TEMPLATES, "Create Template", Post, ROUTE_TEMPLATES, CREATED)
            .with_payload(Payload::CreateTemplate)
            .capturing(Capture::TemplateId),
        Check::new(GROUP_TEMPLATES, "List Templates", Get, ROUTE_TEMPLATES, OK),
        Check::new(GROUP_NOTIFICATIONS, "Create Notification", Post, ROUTE_NOTIFICATIONS, CREATED)
            .with_payload(Payload::CreateNotification),
        Check::new(GROUP_NOTIFICATIONS, "List Notifications", Get, ROUTE_NOTIFICATIONS, OK)
            .counting("notifications"),
        Check::new(GROUP_WORKFLOWS, "Create Workflow", Post, ROUTE_WORKFLOWS, CREATED)
            .with_payload(Payload::CreateWorkflow),
        Check::new(GROUP_WORKFLOWS, "List Workflows", Get, ROUTE_WORKFLOWS, OK),
        Check::new(GROUP_METADATA, "Create Metadata Field", Post, ROUTE_METADATA_FIELDS, CREATED)
            .with_payload(Payload::CreateMetadataField),
        Check::new(GROUP_METADATA, "List Metadata Fields", Get, ROUTE_METADATA_FIELDS, OK),
        Check::new(GROUP_DOCUMENTS, "List Documents", Get, ROUTE_DOCUMENTS, OK),
        Check::new(GROUP_DOCUMENTS, "Repository Contents", Get, ROUTE_REPOSITORY, OK),
        Check::new(GROUP_DOCUMENTS, "Repository Folders", Get, ROUTE_REPOSITORY_FOLDERS, OK),
    ]
}

/// Plan filtered to the selected groups; an empty selection keeps everything.
pub fn select(plan: Vec<Check>, only: &[String]) -> anyhow::Result<Vec<Check>> {
    if only.is_empty() {
        return Ok(plan);
    }
    for sel in only {
        if !plan.iter().any(|c| c.matches_group(sel)) {
            anyhow::bail!("unknown check group: {}", sel);
        }
    }
    Ok(plan
        .into_iter()
        .filter(|c| only.iter().any(|sel| c.matches_group(sel)))
        .collect())
}
