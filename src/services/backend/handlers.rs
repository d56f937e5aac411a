use super::accounts::{RegisteredUser, Session};
use super::error::ApiError;
use super::extract::ApiJson;
use super::records::{Document, Folder, MetadataField, Notification, RepositoryListing, Template, Workflow};
use super::BackendState;
use crate::domain::models::{
    CloneCreate, ContractCreate, ContractUpdate, LoginRequest, LoginResponse, MetadataFieldCreate,
    NotificationCreate, RegisterRequest, TemplateCreate, VersionCreate, WorkflowCreate,
};
use crate::services::ledger::{
    CloneRequest, Contract, ContractPatch, ContractStatus, ContractVersion, NewContract, NewVersion,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use uuid::Uuid;

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;
type Listed<T> = Result<Json<Vec<T>>, ApiError>;

/// Unparseable ids (including the literal `None` a failed capture produces) are 404s.
fn contract_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found())
}

fn parse_status(raw: Option<&str>) -> Result<Option<ContractStatus>, ApiError> {
    Ok(raw.map(ContractStatus::parse).transpose()?)
}

pub async fn register(
    State(state): State<BackendState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Created<RegisteredUser> {
    let user = state.lock().accounts.register(req)?;
    info!(user_id = %user.user_id, tenant_id = %user.tenant_id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<BackendState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let resp = state.lock().accounts.login(req)?;
    info!(user_id = %resp.user.user_id, "user logged in");
    Ok(Json(resp))
}

pub async fn create_contract(
    State(state): State<BackendState>,
    who: Session,
    ApiJson(req): ApiJson<ContractCreate>,
) -> Created<Contract> {
    let input = NewContract {
        title: req.title,
        description: req.description,
        status: parse_status(req.status.as_deref())?,
    };
    let contract = state.lock().ledger.create(who.tenant_id, who.user_id, input)?;
    info!(contract_id = %contract.id, "contract created");
    Ok((StatusCode::CREATED, Json(contract)))
}

pub async fn list_contracts(State(state): State<BackendState>, who: Session) -> Listed<Contract> {
    Ok(Json(state.lock().ledger.list(who.tenant_id)))
}

pub async fn get_contract(
    State(state): State<BackendState>,
    who: Session,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    let id = contract_id(&id)?;
    Ok(Json(state.lock().ledger.get(who.tenant_id, id)?))
}

pub async fn update_contract(
    State(state): State<BackendState>,
    who: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ContractUpdate>,
) -> Result<Json<Contract>, ApiError> {
    let id = contract_id(&id)?;
    let patch = ContractPatch {
        title: req.title,
        description: req.description,
        status: parse_status(req.status.as_deref())?,
    };
    let contract = state.lock().ledger.update(who.tenant_id, id, patch)?;
    info!(contract_id = %contract.id, status = contract.status.as_str(), "contract updated");
    Ok(Json(contract))
}

pub async fn create_version(
    State(state): State<BackendState>,
    who: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<VersionCreate>,
) -> Created<ContractVersion> {
    let id = contract_id(&id)?;
    let input = NewVersion {
        selected_clauses: req.selected_clauses,
        change_summary: req.change_summary,
    };
    let version = state
        .lock()
        .ledger
        .create_version(who.tenant_id, who.user_id, id, input)?;
    info!(
        contract_id = %id,
        version = version.version_number,
        clauses = version.selected_clauses.len(),
        "contract version created"
    );
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn clone_contract(
    State(state): State<BackendState>,
    who: Session,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CloneCreate>,
) -> Created<Contract> {
    let id = contract_id(&id)?;
    let copy = state
        .lock()
        .ledger
        .clone_contract(who.tenant_id, who.user_id, id, CloneRequest { title: req.title })?;
    info!(source = %id, contract_id = %copy.id, "contract cloned");
    Ok((StatusCode::CREATED, Json(copy)))
}

pub async fn list_versions(
    State(state): State<BackendState>,
    who: Session,
    Path(id): Path<String>,
) -> Listed<ContractVersion> {
    let id = contract_id(&id)?;
    Ok(Json(state.lock().ledger.versions(who.tenant_id, id)?))
}

pub async fn create_template(
    State(state): State<BackendState>,
    who: Session,
    ApiJson(req): ApiJson<TemplateCreate>,
) -> Created<Template> {
    let template = state.lock().records.create_template(who, req)?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn list_templates(State(state): State<BackendState>, who: Session) -> Listed<Template> {
    Ok(Json(state.lock().records.templates(who)))
}

pub async fn create_notification(
    State(state): State<BackendState>,
    who: Session,
    ApiJson(req): ApiJson<NotificationCreate>,
) -> Created<Notification> {
    let mut guard = state.lock();
    let store = &mut *guard;
    let accounts = &store.accounts;
    let notification = store
        .records
        .create_notification(who, req, |id| accounts.member_of(id, who.tenant_id))?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn list_notifications(
    State(state): State<BackendState>,
    who: Session,
) -> Listed<Notification> {
    Ok(Json(state.lock().records.notifications(who)))
}

pub async fn create_workflow(
    State(state): State<BackendState>,
    who: Session,
    ApiJson(req): ApiJson<WorkflowCreate>,
) -> Created<Workflow> {
    let workflow = state.lock().records.create_workflow(who, req)?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

pub async fn list_workflows(State(state): State<BackendState>, who: Session) -> Listed<Workflow> {
    Ok(Json(state.lock().records.workflows(who)))
}

pub async fn create_metadata_field(
    State(state): State<BackendState>,
    who: Session,
    ApiJson(req): ApiJson<MetadataFieldCreate>,
) -> Created<MetadataField> {
    let field = state.lock().records.create_metadata_field(who, req)?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn list_metadata_fields(
    State(state): State<BackendState>,
    who: Session,
) -> Listed<MetadataField> {
    Ok(Json(state.lock().records.metadata_fields(who)))
}

pub async fn list_documents(State(state): State<BackendState>, who: Session) -> Listed<Document> {
    Ok(Json(state.lock().records.documents(who)))
}

pub async fn repository(
    State(state): State<BackendState>,
    who: Session,
) -> Result<Json<RepositoryListing>, ApiError> {
    let store = state.lock();
    let contracts = store.ledger.list(who.tenant_id);
    Ok(Json(store.records.repository(who, &contracts)))
}

pub async fn repository_folders(State(state): State<BackendState>, who: Session) -> Listed<Folder> {
    let store = state.lock();
    let contracts = store.ledger.list(who.tenant_id);
    Ok(Json(store.records.repository(who, &contracts).folders))
}
