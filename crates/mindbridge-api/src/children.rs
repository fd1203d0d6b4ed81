use serde::{Deserialize, Serialize};
use tracing::info;

use mindbridge_core::models::child::{Child, NewChild};
use mindbridge_core::models::user::Role;

use crate::auth::MessageResponse;
use crate::client::ApiClient;
use crate::error::ApiError;

#[derive(Deserialize)]
struct ChildrenEnvelope {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddedChild {
    #[serde(default)]
    pub message: String,
    pub child_id: String,
}

#[derive(Serialize)]
struct MobileBody<'a> {
    mobile: &'a str,
}

#[derive(Serialize)]
struct ChildIdBody<'a> {
    child_id: &'a str,
}

#[derive(Serialize)]
struct SchoolBody<'a> {
    school: &'a str,
}

/// Route prefix owning child records for a guardian role. Psychologists
/// only read children by school and have no prefix.
fn scope(role: Role) -> Result<&'static str, ApiError> {
    match role {
        Role::Teacher => Ok("teacher"),
        Role::Parent => Ok("parent"),
        Role::Psychologist => Err(ApiError::NotGuardian(role)),
    }
}

/// Children linked to a guardian's mobile number. Parents are matched on
/// `parent_mobile`, teachers on `teacher_mobile`.
pub async fn list_children(
    client: &ApiClient,
    role: Role,
    mobile: &str,
) -> Result<Vec<Child>, ApiError> {
    client.require_token()?;
    let scope = scope(role)?;
    let envelope: ChildrenEnvelope = client
        .post_json(&["api", scope, "children"], &MobileBody { mobile })
        .await?;
    Ok(envelope.children)
}

pub async fn add_child(
    client: &ApiClient,
    role: Role,
    child: &NewChild,
) -> Result<AddedChild, ApiError> {
    client.require_token()?;
    let scope = scope(role)?;
    info!(name = %child.name, school = %child.school, "adding child");
    client
        .post_json(&["api", scope, "add-child"], child)
        .await
}

pub async fn delete_child(
    client: &ApiClient,
    role: Role,
    child_id: &str,
) -> Result<MessageResponse, ApiError> {
    client.require_token()?;
    let scope = scope(role)?;
    info!(child_id, "deleting child");
    client
        .post_json(&["api", scope, "delete-child"], &ChildIdBody { child_id })
        .await
}

/// All children registered at a school. Served for teachers and
/// psychologists; the backend answers 404 when none exist.
pub async fn children_by_school(
    client: &ApiClient,
    role: Role,
    school: &str,
) -> Result<Vec<Child>, ApiError> {
    let prefix = match role {
        Role::Psychologist => "psychologist",
        Role::Parent | Role::Teacher => "teacher",
    };
    let envelope: ChildrenEnvelope = client
        .post_json(&["api", prefix, "children-by-school"], &SchoolBody { school })
        .await?;
    Ok(envelope.children)
}
