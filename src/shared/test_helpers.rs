#[cfg(test)]
use std::collections::HashMap;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use chrono::{Duration, Utc};

#[cfg(test)]
use fake::faker::internet::en::SafeEmail;

#[cfg(test)]
use fake::faker::lorem::en::Sentence;

#[cfg(test)]
use fake::faker::name::en::Name;

#[cfg(test)]
use fake::Fake;

#[cfg(test)]
use serde_json::{json, Value};

#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use crate::core::error::{AppError, Result};

#[cfg(test)]
use crate::features::auth::{Session, SessionProvider};

#[cfg(test)]
use crate::modules::store::{Filter, RecordStore};

/// Session that stays live for the duration of a test.
#[cfg(test)]
#[allow(dead_code)]
pub fn create_test_session(user_id: Uuid) -> Session {
    Session {
        user_id,
        email: Some(SafeEmail().fake()),
        access_token: "test-access-token".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// Raw store row for a film located in Paris, owned by `user_id`.
#[cfg(test)]
#[allow(dead_code)]
pub fn film_row(user_id: Uuid, status: &str) -> Value {
    json!({
        "id": Uuid::new_v4().to_string(),
        "title": Sentence(1..4).fake::<String>(),
        "director": Name().fake::<String>(),
        "location": "Paris, France",
        "coordinates": "POINT(2.3522 48.8566)",
        "year": 1995,
        "description": Sentence(3..8).fake::<String>(),
        "image_url": null,
        "status": status,
        "rejection_reason": null,
        "user_id": user_id.to_string(),
        "created_at": Utc::now().to_rfc3339()
    })
}

/// Raw store row for a profile.
#[cfg(test)]
#[allow(dead_code)]
pub fn profile_row(id: Uuid, is_admin: bool) -> Value {
    json!({
        "id": id.to_string(),
        "username": "test-user",
        "full_name": Name().fake::<String>(),
        "website": null,
        "avatar_url": null,
        "is_admin": is_admin
    })
}

/// In-memory [`RecordStore`] used by service tests. Tables are seeded with
/// [`InMemoryStore::with_table`]; stored functions answer with the response
/// scripted via [`InMemoryStore::with_rpc`] and fail when unscripted, which
/// is also how the fallback paths are exercised. Column projection is not
/// simulated; selects always return full rows.
#[cfg(test)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    rpc_responses: Mutex<HashMap<String, Value>>,
}

#[cfg(test)]
#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            rpc_responses: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_table(self, table: &str, rows: Vec<Value>) -> Self {
        self.tables.lock().unwrap().insert(table.to_string(), rows);
        self
    }

    pub fn with_rpc(self, function: &str, response: Value) -> Self {
        self.rpc_responses
            .lock()
            .unwrap()
            .insert(function.to_string(), response);
        self
    }

    /// Snapshot of a table for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn field_matches(row: &Value, filter: &Filter) -> bool {
        match row.get(&filter.column) {
            Some(Value::String(s)) => s == &filter.value,
            Some(other) => other.to_string() == filter.value,
            None => false,
        }
    }

    fn matches(row: &Value, filters: &[Filter]) -> bool {
        filters.iter().all(|f| Self::field_matches(row, f))
    }

    fn sort_key(row: &Value, column: &str) -> String {
        match row.get(column) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl RecordStore for InMemoryStore {
    async fn select(
        &self,
        table: &str,
        _columns: &str,
        filters: &[Filter],
        order: Option<&str>,
    ) -> Result<Vec<Value>> {
        let mut rows: Vec<Value> = {
            let tables = self.tables.lock().unwrap();
            tables
                .get(table)
                .map(|rows| {
                    rows.iter()
                        .filter(|r| Self::matches(r, filters))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(spec) = order {
            let (column, direction) = spec.rsplit_once('.').unwrap_or((spec, "asc"));
            rows.sort_by_key(|r| Self::sort_key(r, column));
            if direction == "desc" {
                rows.reverse();
            }
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        let mut record = record;
        if let Some(map) = record.as_object_mut() {
            map.entry("id")
                .or_insert_with(|| json!(Uuid::new_v4().to_string()));
            map.entry("created_at")
                .or_insert_with(|| json!(Utc::now().to_rfc3339()));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Value> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();

        let mut updated = None;
        for row in rows.iter_mut() {
            if !Self::matches(row, filters) {
                continue;
            }
            if let (Some(target), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in changes {
                    target.insert(key.clone(), value.clone());
                }
            }
            if updated.is_none() {
                updated = Some(row.clone());
            }
        }

        updated.ok_or_else(|| AppError::NotFound(format!("No matching record in {}", table)))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|r| !Self::matches(r, filters));
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, _args: Value) -> Result<Value> {
        self.rpc_responses
            .lock()
            .unwrap()
            .get(function)
            .cloned()
            .ok_or_else(|| AppError::Store(format!("Function {} is not available", function)))
    }
}

/// [`SessionProvider`] that hands out whatever session it was given.
#[cfg(test)]
pub struct StaticSessionProvider {
    session: Mutex<Option<Session>>,
}

#[cfg(test)]
#[allow(dead_code)]
impl StaticSessionProvider {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    pub fn set(&self, session: Option<Session>) {
        *self.session.lock().unwrap() = session;
    }
}

#[cfg(test)]
#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session.lock().unwrap().clone())
    }
}
