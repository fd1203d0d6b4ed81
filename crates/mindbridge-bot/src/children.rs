use tracing::info;

use mindbridge_api::error::ApiError;
use mindbridge_core::models::child::Child;
use mindbridge_core::models::user::{Role, User};
use mindbridge_core::validation::ChildForm;

use crate::backend::Backend;
use crate::error::BotError;
use crate::store::Store;

/// The signed-in user, if their role owns child records.
fn guardian(store: &Store) -> Result<User, BotError> {
    let user = store
        .auth
        .user(jiff::Timestamp::now())
        .cloned()
        .ok_or(ApiError::Unauthenticated)?;
    if !user.role.is_guardian() {
        return Err(ApiError::NotGuardian(user.role).into());
    }
    Ok(user)
}

/// Fill guardian fields the form left blank from the signed-in user.
/// `school` is never filled; it must be entered for every child.
fn with_guardian_defaults(form: &ChildForm, user: &User) -> ChildForm {
    let mut form = form.clone();
    match user.role {
        Role::Teacher => {
            if form.teacher_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                form.teacher_name = Some(user.name.clone());
            }
            if form.teacher_mobile.as_deref().is_none_or(|m| m.trim().is_empty()) {
                form.teacher_mobile = Some(user.mobile.clone());
            }
        }
        Role::Parent => {
            if form.parent_name.trim().is_empty() {
                form.parent_name = user.name.clone();
            }
            if form.parent_mobile.trim().is_empty() {
                form.parent_mobile = user.mobile.clone();
            }
        }
        Role::Psychologist => {}
    }
    form
}

/// Reload the signed-in user's children into the store.
pub async fn refresh<'s, B: Backend>(
    backend: &B,
    store: &'s mut Store,
) -> Result<&'s [Child], BotError> {
    let user = guardian(store)?;
    let children = backend.list_children(user.role, &user.mobile).await?;
    store.children.set(children);
    Ok(store.children.all())
}

/// Validate the form and register the child.
///
/// Nothing is sent when validation fails. On success the new record is
/// appended to the store without a reload.
pub async fn add<B: Backend>(
    backend: &B,
    store: &mut Store,
    form: &ChildForm,
) -> Result<Child, BotError> {
    let user = guardian(store)?;
    let new_child = with_guardian_defaults(form, &user).validate()?;

    let child_id = backend.add_child(user.role, &new_child).await?;
    info!(%child_id, "child added");

    let child = new_child.into_child(child_id, jiff::Zoned::now().date());
    store.children.add(child.clone());
    Ok(child)
}

pub async fn delete<B: Backend>(
    backend: &B,
    store: &mut Store,
    child_id: &str,
) -> Result<(), BotError> {
    let user = guardian(store)?;
    backend.delete_child(user.role, child_id).await?;
    store.children.remove(child_id);
    Ok(())
}
