//! In-process `UserStore` used by handler tests. Mirrors the table's unique constraints.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::users::{
    repo::{SortOrder, StoreError, StoreResult, UniqueField, UserStore},
    repo_types::{DailyCount, NewUser, User},
};

#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, User>,
}

impl Inner {
    fn check_unique(&self, skip_id: Option<i64>, username: &str, email: &str) -> StoreResult<()> {
        let mut others = self.rows.values().filter(|r| Some(r.id) != skip_id);
        if others.clone().any(|r| r.email == email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if others.any(|r| r.username == username) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }
        Ok(())
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row with a caller-chosen timestamp, bypassing uniqueness checks.
    pub fn insert_raw(&self, username: &str, email: &str, created_at: OffsetDateTime) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.insert(
            id,
            User {
                id,
                username: username.into(),
                email: email.into(),
                password: String::new(),
                created_at,
            },
        );
        id
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().unwrap().rows.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.values().find(|r| r.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.values().find(|r| r.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_unique(None, &user.username, &user.email)?;
        inner.next_id += 1;
        let row = User {
            id: inner.next_id,
            username: user.username,
            email: user.email,
            password: user.password_hash,
            created_at: user.created_at,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_profile(&self, id: i64, username: &str, email: &str) -> StoreResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.rows.contains_key(&id) {
            return Ok(0);
        }
        inner.check_unique(Some(id), username, email)?;
        if let Some(row) = inner.rows.get_mut(&id) {
            row.username = username.into();
            row.email = email.into();
        }
        Ok(1)
    }

    async fn delete(&self, id: i64) -> StoreResult<u64> {
        let removed = self.inner.lock().unwrap().rows.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn list(&self, order: SortOrder) -> StoreResult<Vec<User>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<User> = inner.rows.values().cloned().collect();
        if order == SortOrder::NewestFirst {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn count_all(&self) -> StoreResult<i64> {
        Ok(self.inner.lock().unwrap().rows.len() as i64)
    }

    async fn count_created_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .filter(|r| r.created_at >= start && r.created_at < end)
            .count() as i64)
    }

    async fn count_created_since(&self, since: OffsetDateTime) -> StoreResult<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.values().filter(|r| r.created_at >= since).count() as i64)
    }

    async fn daily_registrations(&self, since: OffsetDateTime) -> StoreResult<Vec<DailyCount>> {
        let inner = self.inner.lock().unwrap();
        let mut per_day = BTreeMap::new();
        for row in inner.rows.values().filter(|r| r.created_at >= since) {
            let day = row.created_at.to_offset(time::UtcOffset::UTC).date();
            *per_day.entry(day).or_insert(0i64) += 1;
        }
        Ok(per_day
            .into_iter()
            .map(|(day, count)| DailyCount { day, count })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: String::new(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn email_clash_wins_over_username_clash_on_an_earlier_row() {
        let store = MemoryUserStore::new();
        store.insert_raw("bob", "b@x.com", OffsetDateTime::now_utc());
        store.insert_raw("alice", "a@x.com", OffsetDateTime::now_utc());

        let err = store.create(new_user("bob", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));

        let carol = store.insert_raw("carol", "c@x.com", OffsetDateTime::now_utc());
        let err = store
            .update_profile(carol, "bob", "a@x.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
    }

    #[tokio::test]
    async fn username_clash_alone_is_reported_as_username() {
        let store = MemoryUserStore::new();
        store.insert_raw("bob", "b@x.com", OffsetDateTime::now_utc());

        let err = store.create(new_user("bob", "new@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Username)));
    }
}
