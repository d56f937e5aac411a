//! Tenant-scoped collaborator records: templates, notifications, workflows,
//! metadata fields, plus the derived document and repository listings.

use super::accounts::Session;
use super::error::ApiError;
use crate::domain::models::{MetadataFieldCreate, NotificationCreate, TemplateCreate, WorkflowCreate};
use crate::services::ledger::Contract;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

pub const FIELD_TYPES: &[&str] = &["text", "number", "date", "boolean", "select"];
pub const NOTIFICATION_TYPES: &[&str] = &["email", "in_app", "sms"];
const TEMPLATE_STATUSES: &[&str] = &["draft", "published", "archived"];

#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub contract_type: String,
    pub description: String,
    pub r2_key: String,
    pub merge_fields: Vec<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub notification_type: String,
    pub subject: String,
    pub body: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub steps: Vec<Value>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetadataField {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub field_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub storage_key: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub name: String,
    pub path: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryItem {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryListing {
    pub folders: Vec<Folder>,
    pub items: Vec<RepositoryItem>,
}

#[derive(Debug, Default)]
pub struct Records {
    templates: Vec<Template>,
    notifications: Vec<Notification>,
    workflows: Vec<Workflow>,
    metadata_fields: Vec<MetadataField>,
}

impl Records {
    pub fn create_template(&mut self, who: Session, req: TemplateCreate) -> Result<Template, ApiError> {
        let name = required("name", &req.name)?;
        let contract_type = required("contract_type", &req.contract_type)?;
        let status = req.status.unwrap_or_else(|| "draft".to_string());
        if !TEMPLATE_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::field("status", format!("\"{}\" is not a valid choice.", status)));
        }
        if req.merge_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(ApiError::field("merge_fields", "Merge field names may not be blank."));
        }
        let template = Template {
            id: Uuid::new_v4(),
            tenant_id: who.tenant_id,
            name,
            contract_type,
            description: req.description,
            r2_key: req.r2_key.trim().to_string(),
            merge_fields: req.merge_fields,
            status,
            created_by: who.user_id,
            created_at: Utc::now(),
        };
        self.templates.push(template.clone());
        Ok(template)
    }

    pub fn templates(&self, who: Session) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|t| t.tenant_id == who.tenant_id)
            .cloned()
            .collect()
    }

    /// `is_member` answers whether a user id belongs to the caller's tenant.
    pub fn create_notification(
        &mut self,
        who: Session,
        req: NotificationCreate,
        is_member: impl Fn(Uuid) -> bool,
    ) -> Result<Notification, ApiError> {
        if !NOTIFICATION_TYPES.contains(&req.notification_type.as_str()) {
            return Err(ApiError::field(
                "notification_type",
                format!("\"{}\" is not a valid choice.", req.notification_type),
            ));
        }
        if req.message.trim().is_empty() && req.body.trim().is_empty() {
            return Err(ApiError::field("message", "This field may not be blank."));
        }
        let recipient_id = match req.recipient_id.as_deref() {
            None => who.user_id,
            Some(raw) => Uuid::parse_str(raw)
                .map_err(|_| ApiError::field("recipient_id", "Must be a valid UUID."))?,
        };
        if recipient_id != who.user_id && !is_member(recipient_id) {
            return Err(ApiError::field(
                "recipient_id",
                format!("Invalid pk \"{}\" - object does not exist.", recipient_id),
            ));
        }
        let notification = Notification {
            id: Uuid::new_v4(),
            tenant_id: who.tenant_id,
            sender_id: who.user_id,
            recipient_id,
            notification_type: req.notification_type,
            subject: req.subject,
            body: req.body,
            message: req.message,
            status: "pending".to_string(),
            created_at: Utc::now(),
        };
        self.notifications.push(notification.clone());
        Ok(notification)
    }

    /// Notifications the caller sent or received.
    pub fn notifications(&self, who: Session) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|n| n.tenant_id == who.tenant_id)
            .filter(|n| n.recipient_id == who.user_id || n.sender_id == who.user_id)
            .cloned()
            .collect()
    }

    pub fn create_workflow(&mut self, who: Session, req: WorkflowCreate) -> Result<Workflow, ApiError> {
        let name = required("name", &req.name)?;
        if req.steps.iter().any(|s| !s.is_object()) {
            return Err(ApiError::field("steps", "Each step must be an object."));
        }
        let workflow = Workflow {
            id: Uuid::new_v4(),
            tenant_id: who.tenant_id,
            name,
            description: req.description,
            steps: req.steps,
            is_active: true,
            created_by: who.user_id,
            created_at: Utc::now(),
        };
        self.workflows.push(workflow.clone());
        Ok(workflow)
    }

    pub fn workflows(&self, who: Session) -> Vec<Workflow> {
        self.workflows
            .iter()
            .filter(|w| w.tenant_id == who.tenant_id)
            .cloned()
            .collect()
    }

    pub fn create_metadata_field(
        &mut self,
        who: Session,
        req: MetadataFieldCreate,
    ) -> Result<MetadataField, ApiError> {
        let name = required("name", &req.name)?;
        if !FIELD_TYPES.contains(&req.field_type.as_str()) {
            return Err(ApiError::field(
                "field_type",
                format!("\"{}\" is not a valid choice.", req.field_type),
            ));
        }
        let field = MetadataField {
            id: Uuid::new_v4(),
            tenant_id: who.tenant_id,
            name,
            field_type: req.field_type,
            description: req.description,
            created_at: Utc::now(),
        };
        self.metadata_fields.push(field.clone());
        Ok(field)
    }

    pub fn metadata_fields(&self, who: Session) -> Vec<MetadataField> {
        self.metadata_fields
            .iter()
            .filter(|f| f.tenant_id == who.tenant_id)
            .cloned()
            .collect()
    }

    /// Stored files known to the tenant: every template with a storage key.
    pub fn documents(&self, who: Session) -> Vec<Document> {
        self.templates
            .iter()
            .filter(|t| t.tenant_id == who.tenant_id && !t.r2_key.is_empty())
            .map(|t| Document {
                id: t.id,
                name: t.name.clone(),
                storage_key: t.r2_key.clone(),
                kind: "template".to_string(),
                created_at: t.created_at,
            })
            .collect()
    }

    pub fn repository(&self, who: Session, contracts: &[Contract]) -> RepositoryListing {
        let mut items: Vec<RepositoryItem> = contracts
            .iter()
            .map(|c| RepositoryItem {
                id: c.id,
                name: c.title.clone(),
                kind: "contract".to_string(),
                folder: "/contracts".to_string(),
            })
            .collect();
        items.extend(self.documents(who).into_iter().map(|d| RepositoryItem {
            id: d.id,
            name: d.storage_key,
            kind: d.kind,
            folder: "/templates".to_string(),
        }));
        RepositoryListing {
            folders: folders_for(&items),
            items,
        }
    }
}

pub fn folders_for(items: &[RepositoryItem]) -> Vec<Folder> {
    ["contracts", "templates"]
        .iter()
        .map(|name| {
            let path = format!("/{}", name);
            Folder {
                name: name.to_string(),
                item_count: items.iter().filter(|i| i.folder == path).count(),
                path,
            }
        })
        .collect()
}

fn required(field: &str, raw: &str) -> Result<String, ApiError> {
    let v = raw.trim();
    if v.is_empty() {
        return Err(ApiError::field(field, "This field may not be blank."));
    }
    Ok(v.to_string())
}
