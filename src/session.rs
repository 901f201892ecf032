// src/session.rs

use crate::validator::claims::Claims;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Pending authorization `state`. Single use.
pub const OIDC_STATE: &str = "oidc_state";
/// Pending authorization `nonce`. Single use.
pub const OIDC_NONCE: &str = "oidc_nonce";
/// The raw ID Token, kept as `id_token_hint` for logout.
pub const ID_TOKEN: &str = "id_token";
/// The signed-in user.
pub const USER: &str = "user";

/// Used when the provider did not release an `email` claim.
pub const NO_EMAIL_CLAIM: &str = "(no email claim)";

/// Key-value storage scoped to one browser session.
///
/// The flow reads and writes only the keys defined in this module. Callers
/// must serialize requests for the same session; two callbacks racing on one
/// `oidc_state` are not arbitrated here.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);
    fn delete(&mut self, key: &str);
    /// Removes every key, including ones this crate did not write.
    fn clear(&mut self);

    fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// An in-process session, handy for tests and single-user tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySession {
    values: HashMap<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// The identity stored under [`USER`] after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub email: String,
    pub sub: Option<String>,
    pub name: Option<String>,
}

impl UserIdentity {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            email: claims
                .email
                .clone()
                .unwrap_or_else(|| NO_EMAIL_CLAIM.to_string()),
            sub: claims.sub.clone(),
            name: claims.name.clone(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "email": self.email,
            "sub": self.sub,
            "name": self.name,
        })
    }

    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}
