use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, StoreResult, UserStore},
    repo_types::{NewUser, ProfileChanges, User},
};

/// `UserStore` held in process memory, kept in insertion order.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: None,
            profile_image: None,
            status: true,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(image) = changes.profile_image {
            user.profile_image = Some(image);
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn set_status(&self, id: Uuid, status: bool) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.status = status;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn list(&self, limit: Option<i64>, offset: i64) -> StoreResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        let skip = offset.max(0) as usize;
        let take = limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(users.iter().skip(skip).take(take).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "A".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create(new_user("a@x.com")).await.unwrap();
        let err = store.create(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_profile_only_touches_present_fields() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("a@x.com")).await.unwrap();
        store
            .update_profile(
                user.id,
                ProfileChanges {
                    phone: Some("555".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let updated = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "A");
        assert_eq!(updated.phone.as_deref(), Some("555"));
        assert!(updated.profile_image.is_none());
    }

    #[tokio::test]
    async fn list_applies_offset_and_limit() {
        let store = MemoryUserStore::default();
        for i in 0..5 {
            store.create(new_user(&format!("u{i}@x.com"))).await.unwrap();
        }
        let page = store.list(Some(2), 1).await.unwrap();
        let emails: Vec<_> = page.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["u1@x.com", "u2@x.com"]);
        assert_eq!(store.list(None, 0).await.unwrap().len(), 5);
    }
}
