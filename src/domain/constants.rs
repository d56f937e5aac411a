pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_EMAIL: &str = "completefixtest@example.com";
pub const DEFAULT_PASSWORD: &str = "TestPass123!@#";
pub const DEFAULT_FULL_NAME: &str = "Test User";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

pub const BANNER_WIDTH: usize = 80;
pub const RUN_TITLE: &str = "CLM BACKEND - COMPLETE ENDPOINT TEST";

pub const ROUTE_REGISTER: &str = "/api/auth/register/";
pub const ROUTE_LOGIN: &str = "/api/auth/login/";
pub const ROUTE_CONTRACTS: &str = "/api/contracts/";
pub const ROUTE_TEMPLATES: &str = "/api/contract-templates/";
pub const ROUTE_NOTIFICATIONS: &str = "/api/notifications/";
pub const ROUTE_WORKFLOWS: &str = "/api/workflows/";
pub const ROUTE_METADATA_FIELDS: &str = "/api/metadata/fields/";
pub const ROUTE_DOCUMENTS: &str = "/api/documents/";
pub const ROUTE_REPOSITORY: &str = "/api/repository/";
pub const ROUTE_REPOSITORY_FOLDERS: &str = "/api/repository/folders/";

pub const ENV_BASE_URL: &str = "CLM_BASE_URL";
pub const ENV_EMAIL: &str = "CLM_SMOKE_EMAIL";
pub const ENV_PASSWORD: &str = "CLM_SMOKE_PASSWORD";
pub const ENV_FULL_NAME: &str = "CLM_SMOKE_FULL_NAME";
pub const ENV_TIMEOUT_MS: &str = "CLM_SMOKE_TIMEOUT_MS";
pub const ENV_LOG: &str = "CLM_SMOKE_LOG";
pub const ENV_LOG_JSON: &str = "CLM_SMOKE_LOG_JSON";
