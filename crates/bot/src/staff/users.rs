use dinebot_core::callback::{CallbackData, Permission};
use dinebot_core::catalog::User;
use dinebot_core::report;
use dinebot_core::text::{
    self, ADMIN_GRANTED, ADMIN_REVOKED, CONTACT_USER, MANAGER_GRANTED, MANAGER_REVOKED, NOT_ADMIN,
    SELF_PERMISSION, USERS_EMPTY, USERS_USAGE, USER_NOT_FOUND, USER_USAGE,
};
use dinebot_core::transport::{CallbackRef, Content, InlineButton, InlineKeyboard, Keyboard, MessageRef};
use dinebot_core::types::ChatId;

use super::orders::positive_count;
use crate::context::BotContext;
use crate::effects::Transition;
use crate::error::BotError;

/// Contact link, plus permission toggles when an admin looks at someone
/// else.
fn user_keyboard(user: &User, viewer: &User) -> InlineKeyboard {
    let mut rows = vec![vec![InlineButton::url(CONTACT_USER, text::user_link(user.id))]];
    if viewer.is_admin && viewer.id != user.id {
        rows.push(vec![
            InlineButton::callback(
                text::toggle_label(user.is_admin, "admin", "admin"),
                CallbackData::TogglePermission {
                    user_id: user.id,
                    permission: Permission::Admin,
                },
            ),
            InlineButton::callback(
                text::toggle_label(user.is_manager, "manager", "manager"),
                CallbackData::TogglePermission {
                    user_id: user.id,
                    permission: Permission::Manager,
                },
            ),
        ]);
    }
    InlineKeyboard::new(rows)
}

/// New `(is_admin, is_manager)` flags and the notice for the actor.
///
/// Granting admin also grants manager; revoking manager also revokes admin.
fn toggled(user: &User, permission: Permission) -> (bool, bool, &'static str) {
    match permission {
        Permission::Admin if user.is_admin => (false, user.is_manager, ADMIN_REVOKED),
        Permission::Admin => (true, true, ADMIN_GRANTED),
        Permission::Manager if user.is_manager => (false, false, MANAGER_REVOKED),
        Permission::Manager => (user.is_admin, true, MANAGER_GRANTED),
    }
}

/// `/user <id|@username>`
pub(super) async fn show_user(
    ctx: &BotContext,
    actor: &User,
    chat: ChatId,
    args: &[String],
) -> Result<Transition, BotError> {
    let Some(arg) = args.first() else {
        return Ok(Transition::stay().text(chat, USER_USAGE));
    };

    let user = if let Some(username) = arg.strip_prefix('@') {
        ctx.repo.find_user_by_username(username).await?
    } else if let Ok(id) = arg.parse::<ChatId>() {
        ctx.repo.find_user(id).await?
    } else {
        return Ok(Transition::stay().text(chat, USER_USAGE));
    };

    let Some(user) = user else {
        return Ok(Transition::stay().text(chat, USER_NOT_FOUND));
    };

    Ok(Transition::stay().send(
        chat,
        Content::text(report::user_card(&user, ctx.settings.utc_offset)),
        Some(Keyboard::Inline(user_keyboard(&user, actor))),
    ))
}

/// `/users <n>`
pub(super) async fn recent_users(
    ctx: &BotContext,
    chat: ChatId,
    args: &[String],
) -> Result<Transition, BotError> {
    let Some(limit) = positive_count(args) else {
        return Ok(Transition::stay().text(chat, USERS_USAGE));
    };

    let users = ctx.repo.list_recent_users(limit).await?;
    if users.is_empty() {
        return Ok(Transition::stay().text(chat, USERS_EMPTY));
    }

    let table = report::users_table(&users, ctx.settings.utc_offset);
    Ok(Transition::stay().send(
        chat,
        Content::Document {
            file_name: "users.txt".into(),
            bytes: table.into_bytes(),
            caption: Some(format!("Last {limit} users")),
        },
        None,
    ))
}

pub(super) async fn toggle_permission(
    ctx: &BotContext,
    actor: &User,
    callback: &CallbackRef,
    message: MessageRef,
    user_id: ChatId,
    permission: Permission,
) -> Result<Transition, BotError> {
    if user_id == actor.id {
        return Ok(Transition::stay().alert(callback, SELF_PERMISSION));
    }
    if !actor.is_admin {
        return Ok(Transition::stay().alert(callback, NOT_ADMIN));
    }
    let Some(user) = ctx.repo.find_user(user_id).await? else {
        return Ok(Transition::stay().alert(callback, USER_NOT_FOUND));
    };

    let (is_admin, is_manager, notice) = toggled(&user, permission);
    let updated = ctx.repo.set_permissions(user_id, is_admin, is_manager).await?;
    tracing::info!(
        user_id,
        admin_id = actor.id,
        is_admin,
        is_manager,
        "Permissions changed"
    );

    Ok(Transition::stay()
        .alert(callback, notice)
        .edit(message, None, Some(user_keyboard(&updated, actor))))
}
