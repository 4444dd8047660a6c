use crate::db_storage::{ListRepository, MemberRepository};
use crate::errors::AppError;
use crate::mailchimp_client::{member_path, members_path, RemoteResources};
use crate::models::{pick_member_fields, MailChimpList, MailChimpMember, MemberFields};
use crate::remote_key::subscriber_hash;
use crate::validation::validate_member;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Keeps the local member mirror and MailChimp in step.
///
/// Each operation validates first, then performs its remote call and local
/// write strictly one after the other. Nothing is retried and a failed remote
/// call is never compensated.
#[derive(Clone)]
pub struct MemberService {
    lists: Arc<dyn ListRepository>,
    members: Arc<dyn MemberRepository>,
    remote: Arc<dyn RemoteResources>,
}

impl MemberService {
    pub fn new(
        lists: Arc<dyn ListRepository>,
        members: Arc<dyn MemberRepository>,
        remote: Arc<dyn RemoteResources>,
    ) -> Self {
        Self {
            lists,
            members,
            remote,
        }
    }

    /// Validates the payload, subscribes it on MailChimp, then stores the mirror.
    ///
    /// Returns the local view including the generated `member_id`.
    pub async fn create(
        &self,
        list_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        tracing::info!("Creating member on list {}", list_id);

        let candidate = pick_member_fields(payload);
        validate_member(&candidate)?;
        let fields = MemberFields::from_wire_map(candidate)?;

        self.find_list(list_id).await?;

        self.remote
            .create_resource(
                &members_path(list_id),
                &Value::Object(fields.to_wire_map()),
            )
            .await?;

        let member = MailChimpMember::new(fields, list_id);
        self.members.save(&member).await?;

        tracing::info!("✓ Member {} created on list {}", member.id, list_id);
        Ok(member.to_array())
    }

    /// Applies a partial update; fields absent from `payload` keep their values.
    ///
    /// MailChimp is patched first, addressed by the hash of the email it
    /// currently knows, and the mirror is only saved once that succeeds.
    pub async fn update(
        &self,
        list_id: &str,
        member_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        tracing::info!("Updating member {} on list {}", member_id, list_id);

        let member = self.find_member(list_id, member_id).await?;

        let merged = member.fields.merged_with(payload);
        validate_member(&merged)?;
        let fields = MemberFields::from_wire_map(merged)?;

        let remote_key = subscriber_hash(&member.fields.email_address);
        self.remote
            .patch_resource(
                &member_path(list_id, &remote_key),
                &Value::Object(fields.to_wire_map()),
            )
            .await?;

        let updated = MailChimpMember { fields, ..member };
        self.members.save(&updated).await?;

        Ok(updated.to_array())
    }

    /// Returns MailChimp's view of the member verbatim.
    pub async fn show(&self, list_id: &str, member_id: &str) -> Result<Value, AppError> {
        let member = self.find_member(list_id, member_id).await?;
        let remote_key = subscriber_hash(&member.fields.email_address);

        self.remote
            .get_resource(&member_path(list_id, &remote_key))
            .await
    }

    /// Returns MailChimp's member listing for the list verbatim.
    pub async fn show_all(&self, list_id: &str) -> Result<Value, AppError> {
        self.find_list(list_id).await?;

        self.remote.get_resource(&members_path(list_id)).await
    }

    /// Deletes the member on MailChimp, then drops the mirror.
    pub async fn remove(&self, list_id: &str, member_id: &str) -> Result<(), AppError> {
        tracing::info!("Removing member {} from list {}", member_id, list_id);

        let member = self.find_member(list_id, member_id).await?;
        let remote_key = subscriber_hash(&member.fields.email_address);

        self.remote
            .delete_resource(&member_path(list_id, &remote_key))
            .await?;
        self.members.delete(member.id).await?;

        Ok(())
    }

    async fn find_list(&self, list_id: &str) -> Result<MailChimpList, AppError> {
        self.lists
            .find_by_external_id(list_id)
            .await?
            .ok_or_else(|| AppError::list_not_found(list_id))
    }

    /// Looks a member up by local id; ids that are not UUIDs, or members of
    /// another list, are reported as not found.
    async fn find_member(&self, list_id: &str, member_id: &str) -> Result<MailChimpMember, AppError> {
        let not_found = || AppError::member_not_found(member_id, list_id);

        let id = Uuid::parse_str(member_id).map_err(|_| not_found())?;
        let member = self.members.find_by_id(id).await?.ok_or_else(not_found)?;

        if member.list_id != list_id {
            return Err(not_found());
        }
        Ok(member)
    }
}
