use super::error::ApiError;
use crate::domain::models::{LoginRequest, LoginResponse, RegisterRequest, SessionUser};
use axum::http::{header, HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;
/// Older tokens of a user are revoked once it holds more than this many.
pub const MAX_SESSIONS_PER_USER: usize = 5;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub tenant_id: Uuid,
    salt: String,
    password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub tenant_id: Uuid,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
struct Issued {
    session: Session,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Accounts {
    users: HashMap<String, User>,
    sessions: HashMap<String, Issued>,
    issued: u64,
}

impl Accounts {
    pub fn register(&mut self, req: RegisterRequest) -> Result<RegisteredUser, ApiError> {
        let email = normalize_email(&req.email);
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::field("email", "Enter a valid email address."));
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::field(
                "password",
                format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters."),
            ));
        }
        if self.users.contains_key(&email) {
            return Err(ApiError::field(
                "email",
                "user with this email already exists.",
            ));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: Uuid::new_v4(),
            email: email.clone(),
            full_name: req.full_name.trim().to_string(),
            tenant_id: Uuid::new_v4(),
            password_digest: digest(&salt, &req.password),
            salt,
            created_at: Utc::now(),
        };
        let out = RegisteredUser {
            user_id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            tenant_id: user.tenant_id,
        };
        self.users.insert(email, user);
        Ok(out)
    }

    pub fn login(&mut self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let invalid = || ApiError::detail(StatusCode::UNAUTHORIZED, "Invalid email or password.");
        let user = self
            .users
            .get(&normalize_email(&req.email))
            .ok_or_else(invalid)?;
        if digest(&user.salt, &req.password) != user.password_digest {
            return Err(invalid());
        }

        let session = Session {
            user_id: user.id,
            tenant_id: user.tenant_id,
        };
        let access = Uuid::new_v4().simple().to_string();
        let response = LoginResponse {
            access: access.clone(),
            refresh: Uuid::new_v4().simple().to_string(),
            user: SessionUser {
                user_id: user.id.to_string(),
                email: user.email.clone(),
                full_name: user.full_name.clone(),
                tenant_id: user.tenant_id.to_string(),
            },
        };
        self.issued += 1;
        self.sessions.insert(
            access,
            Issued {
                session,
                seq: self.issued,
            },
        );
        self.evict_stale_sessions(session.user_id);
        Ok(response)
    }

    fn evict_stale_sessions(&mut self, user_id: Uuid) {
        let mut held: Vec<(u64, String)> = self
            .sessions
            .iter()
            .filter(|(_, i)| i.session.user_id == user_id)
            .map(|(token, i)| (i.seq, token.clone()))
            .collect();
        if held.len() <= MAX_SESSIONS_PER_USER {
            return;
        }
        held.sort_unstable();
        let excess = held.len() - MAX_SESSIONS_PER_USER;
        for (_, token) in held.into_iter().take(excess) {
            self.sessions.remove(&token);
        }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(ApiError::unauthorized)?;
        self.sessions.get(token).map(|i| i.session).ok_or_else(|| {
            ApiError::detail(StatusCode::UNAUTHORIZED, "Given token not valid.")
        })
    }

    /// Deletes the user and revokes its sessions. Data it created stays with its tenant.
    pub fn remove_by_email(&mut self, email: &str) -> bool {
        let Some(user) = self.users.remove(&normalize_email(email)) else {
            return false;
        };
        self.sessions.retain(|_, i| i.session.user_id != user.id);
        true
    }

    pub fn member_of(&self, user_id: Uuid, tenant_id: Uuid) -> bool {
        self.users
            .values()
            .any(|u| u.id == user_id && u.tenant_id == tenant_id)
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "TestPass123!@#".to_string(),
            full_name: "Test User".to_string(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn register_login_authenticate_cycle() {
        let mut accounts = Accounts::default();
        let user = accounts.register(register_req("A@Example.com")).unwrap();
        assert_eq!(user.email, "a@example.com");

        let login = accounts
            .login(login_req("a@example.com", "TestPass123!@#"))
            .unwrap();
        assert_eq!(login.user.user_id, user.user_id.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", login.access)).unwrap(),
        );
        let session = accounts.authenticate(&headers).unwrap();
        assert_eq!(session.tenant_id, user.tenant_id);
    }

    #[test]
    fn duplicate_email_and_bad_password_are_rejected() {
        let mut accounts = Accounts::default();
        accounts.register(register_req("a@example.com")).unwrap();

        let dup = accounts.register(register_req("a@example.com")).unwrap_err();
        assert_eq!(dup.status, StatusCode::BAD_REQUEST);

        let bad = accounts
            .login(login_req("a@example.com", "wrong-password"))
            .unwrap_err();
        assert_eq!(bad.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn removing_a_user_revokes_its_tokens() {
        let mut accounts = Accounts::default();
        accounts.register(register_req("a@example.com")).unwrap();
        let login = accounts
            .login(login_req("a@example.com", "TestPass123!@#"))
            .unwrap();

        assert!(accounts.remove_by_email("A@example.com"));
        assert!(!accounts.remove_by_email("a@example.com"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", login.access)).unwrap(),
        );
        assert!(accounts.authenticate(&headers).is_err());
        assert!(accounts.register(register_req("a@example.com")).is_ok());
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn repeated_logins_keep_only_the_newest_tokens() {
        let mut accounts = Accounts::default();
        let user = accounts.register(register_req("a@example.com")).unwrap();
        let tokens: Vec<String> = (0..MAX_SESSIONS_PER_USER + 2)
            .map(|_| {
                accounts
                    .login(login_req("a@example.com", "TestPass123!@#"))
                    .unwrap()
                    .access
            })
            .collect();

        assert_eq!(accounts.sessions.len(), MAX_SESSIONS_PER_USER);
        assert!(accounts.authenticate(&bearer(&tokens[0])).is_err());
        assert!(accounts.authenticate(&bearer(&tokens[1])).is_err());
        let newest = accounts.authenticate(&bearer(&tokens[tokens.len() - 1])).unwrap();
        assert_eq!(newest.user_id, user.user_id);
    }

    #[test]
    fn membership_is_scoped_to_the_tenant() {
        let mut accounts = Accounts::default();
        let a = accounts.register(register_req("a@example.com")).unwrap();
        let b = accounts.register(register_req("b@example.com")).unwrap();
        assert!(accounts.member_of(a.user_id, a.tenant_id));
        assert!(!accounts.member_of(b.user_id, a.tenant_id));
        assert!(!accounts.member_of(Uuid::new_v4(), a.tenant_id));
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let accounts = Accounts::default();
        let err = accounts.authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
