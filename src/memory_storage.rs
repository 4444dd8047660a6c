//! In-process storage for tests and local runs without Postgres.

use crate::db_storage::{ListRepository, MemberRepository};
use crate::errors::AppError;
use crate::models::{MailChimpList, MailChimpMember};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryStore {
    lists: RwLock<HashMap<String, MailChimpList>>,
    members: RwLock<HashMap<Uuid, MailChimpMember>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_list(&self, list: MailChimpList) {
        self.lists
            .write()
            .await
            .insert(list.mailchimp_id.clone(), list);
    }

    pub async fn member_count(&self) -> usize {
        self.members.read().await.len()
    }
}

#[async_trait]
impl ListRepository for InMemoryStore {
    async fn find_by_external_id(
        &self,
        mailchimp_id: &str,
    ) -> Result<Option<MailChimpList>, AppError> {
        Ok(self.lists.read().await.get(mailchimp_id).cloned())
    }
}

#[async_trait]
impl MemberRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MailChimpMember>, AppError> {
        Ok(self.members.read().await.get(&id).cloned())
    }

    async fn save(&self, member: &MailChimpMember) -> Result<(), AppError> {
        self.members.write().await.insert(member.id, member.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.members.write().await.remove(&id);
        Ok(())
    }
}
