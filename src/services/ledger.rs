//! Contract ledger: tenant-scoped contracts with an append-only version history.
//!
//! Every contract carries a history of immutable [`ContractVersion`] snapshots.
//! Creating a contract records version 1; `create_version` appends the next
//! number and moves the contract's current clause selection to the new
//! snapshot; `clone_contract` derives a new contract with a fresh history and
//! leaves the source untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_CLAUSE_LEN: usize = 64;

const INITIAL_SUMMARY: &str = "Initial version";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Executed,
    Archived,
}

impl ContractStatus {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "executed" => Ok(Self::Executed),
            "archived" => Ok(Self::Archived),
            _ => Err(LedgerError::UnknownStatus(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
            Self::Archived => "archived",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("contract not found: {0}")]
    ContractNotFound(Uuid),
    #[error("title must be between 1 and {MAX_TITLE_LEN} characters")]
    InvalidTitle,
    #[error("invalid clause identifier: {0:?}")]
    InvalidClause(String),
    #[error("change_summary is required")]
    EmptyChangeSummary,
    #[error("unknown contract status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOrigin {
    pub contract_id: Uuid,
    pub version_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: ContractStatus,
    pub current_version: u32,
    pub selected_clauses: Vec<String>,
    pub cloned_from: Option<CloneOrigin>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractVersion {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub version_number: u32,
    pub title: String,
    pub description: String,
    pub status: ContractStatus,
    pub selected_clauses: Vec<String>,
    pub change_summary: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub title: String,
    pub description: String,
    pub status: Option<ContractStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ContractPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ContractStatus>,
}

#[derive(Debug, Clone)]
pub struct NewVersion {
    pub selected_clauses: Vec<String>,
    pub change_summary: String,
}

#[derive(Debug, Clone, Default)]
pub struct CloneRequest {
    /// Defaults to `"Copy of <source title>"`.
    pub title: Option<String>,
}

#[derive(Debug)]
struct Entry {
    contract: Contract,
    versions: Vec<ContractVersion>,
}

impl Entry {
    fn snapshot(&self, author: Uuid, change_summary: String) -> ContractVersion {
        ContractVersion {
            id: Uuid::new_v4(),
            contract_id: self.contract.id,
            version_number: self.contract.current_version,
            title: self.contract.title.clone(),
            description: self.contract.description.clone(),
            status: self.contract.status,
            selected_clauses: self.contract.selected_clauses.clone(),
            change_summary,
            created_by: author,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ContractLedger {
    entries: HashMap<Uuid, Entry>,
    order: Vec<Uuid>,
}

impl ContractLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        tenant: Uuid,
        author: Uuid,
        input: NewContract,
    ) -> Result<Contract, LedgerError> {
        let title = validate_title(&input.title)?;
        let now = Utc::now();
        let contract = Contract {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            title,
            description: input.description,
            status: input.status.unwrap_or(ContractStatus::Draft),
            current_version: 1,
            selected_clauses: Vec::new(),
            cloned_from: None,
            created_by: author,
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(contract, author, INITIAL_SUMMARY.to_string()))
    }

    pub fn get(&self, tenant: Uuid, id: Uuid) -> Result<Contract, LedgerError> {
        self.entry(tenant, id).map(|e| e.contract.clone())
    }

    pub fn list(&self, tenant: Uuid) -> Vec<Contract> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .filter(|e| e.contract.tenant_id == tenant)
            .map(|e| e.contract.clone())
            .collect()
    }

    /// Partial update. Edits are not versioned; only `create_version` appends history.
    pub fn update(
        &mut self,
        tenant: Uuid,
        id: Uuid,
        patch: ContractPatch,
    ) -> Result<Contract, LedgerError> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let entry = self.entry_mut(tenant, id)?;
        if let Some(title) = title {
            entry.contract.title = title;
        }
        if let Some(description) = patch.description {
            entry.contract.description = description;
        }
        if let Some(status) = patch.status {
            entry.contract.status = status;
        }
        entry.contract.updated_at = Utc::now();
        Ok(entry.contract.clone())
    }

    pub fn create_version(
        &mut self,
        tenant: Uuid,
        author: Uuid,
        id: Uuid,
        input: NewVersion,
    ) -> Result<ContractVersion, LedgerError> {
        let clauses = normalize_clauses(input.selected_clauses)?;
        let summary = input.change_summary.trim().to_string();
        if summary.is_empty() {
            return Err(LedgerError::EmptyChangeSummary);
        }

        let entry = self.entry_mut(tenant, id)?;
        entry.contract.current_version += 1;
        entry.contract.selected_clauses = clauses;
        entry.contract.updated_at = Utc::now();
        let version = entry.snapshot(author, summary);
        entry.versions.push(version.clone());
        Ok(version)
    }

    pub fn clone_contract(
        &mut self,
        tenant: Uuid,
        author: Uuid,
        id: Uuid,
        request: CloneRequest,
    ) -> Result<Contract, LedgerError> {
        let source = self.entry(tenant, id)?.contract.clone();
        let title = match request.title {
            Some(t) => validate_title(&t)?,
            None => validate_title(&format!("Copy of {}", source.title))?,
        };
        let now = Utc::now();
        let contract = Contract {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            title,
            description: source.description.clone(),
            status: ContractStatus::Draft,
            current_version: 1,
            selected_clauses: source.selected_clauses.clone(),
            cloned_from: Some(CloneOrigin {
                contract_id: source.id,
                version_number: source.current_version,
            }),
            created_by: author,
            created_at: now,
            updated_at: now,
        };
        let summary = format!("Cloned from {} v{}", source.id, source.current_version);
        Ok(self.insert(contract, author, summary))
    }

    pub fn versions(&self, tenant: Uuid, id: Uuid) -> Result<Vec<ContractVersion>, LedgerError> {
        self.entry(tenant, id).map(|e| e.versions.clone())
    }

    fn insert(&mut self, contract: Contract, author: Uuid, summary: String) -> Contract {
        let mut entry = Entry {
            contract,
            versions: Vec::new(),
        };
        let first = entry.snapshot(author, summary);
        entry.versions.push(first);
        let out = entry.contract.clone();
        self.order.push(out.id);
        self.entries.insert(out.id, entry);
        out
    }

    fn entry(&self, tenant: Uuid, id: Uuid) -> Result<&Entry, LedgerError> {
        self.entries
            .get(&id)
            .filter(|e| e.contract.tenant_id == tenant)
            .ok_or(LedgerError::ContractNotFound(id))
    }

    fn entry_mut(&mut self, tenant: Uuid, id: Uuid) -> Result<&mut Entry, LedgerError> {
        self.entries
            .get_mut(&id)
            .filter(|e| e.contract.tenant_id == tenant)
            .ok_or(LedgerError::ContractNotFound(id))
    }
}

fn validate_title(raw: &str) -> Result<String, LedgerError> {
    let title = raw.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(LedgerError::InvalidTitle);
    }
    Ok(title.to_string())
}

/// Trims, validates and de-duplicates clause ids, keeping first occurrences in order.
pub fn normalize_clauses(raw: Vec<String>) -> Result<Vec<String>, LedgerError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for clause in raw {
        let id = clause.trim();
        let well_formed = !id.is_empty()
            && id.len() <= MAX_CLAUSE_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(LedgerError::InvalidClause(clause));
        }
        if seen.insert(id.to_string()) {
            out.push(id.to_string());
        }
    }
    Ok(out)
}
