//! Restaurant management and the creation wizards.

use validator::Validate;

use dinebot_core::availability::{self, Schedule};
use dinebot_core::callback::CallbackData;
use dinebot_core::catalog::{
    parse_price, DishCategory, NewDish, NewDishCategory, NewRestaurant, Restaurant,
};
use dinebot_core::error::CoreError;
use dinebot_core::text::{
    self, CANCEL, CATEGORY_EXISTS, CHANGE_SCHEDULE, CURRENCY_TOO_LONG, DESCRIPTION_TOO_LONG,
    DISH_HIDDEN, DISH_SHOWN, NAME_TOO_LONG, NEW_CATEGORY, NEW_DISH, NEW_RESTAURANT, NO,
    RESTAURANT_EXISTS, RESTAURANT_HIDDEN, RESTAURANT_NOT_FOUND, RESTAURANT_SHOWN,
    RESTAURANT_USAGE, SCHEDULE_CANCELLED, SCHEDULE_CHANGED, SEND_CATEGORY, SEND_CATEGORY_NAME,
    SEND_CURRENCY, SEND_DISH_CATEGORY, SEND_DISH_DESCRIPTION, SEND_DISH_NAME, SEND_DISH_PHOTO,
    SEND_DISH_PRICE, SEND_DISH_RESTAURANT, SEND_RESTAURANT_NAME,
};
use dinebot_core::transport::{
    CallbackRef, Content, InlineButton, InlineKeyboard, Keyboard, MessageRef,
};
use dinebot_core::types::{ChatId, DbId};

use crate::context::BotContext;
use crate::dialog::{dish_content, not_recognized};
use crate::effects::Transition;
use crate::error::BotError;
use crate::session::{DishDraft, ManagedRestaurant, RestaurantDraft, Session, StaffFlow};

const MAX_NAME_CHARS: usize = 32;
const MAX_CURRENCY_CHARS: usize = 32;
const MAX_DESCRIPTION_CHARS: usize = 128;

// ---------------------------------------------------------------------------
// Restaurant overview
// ---------------------------------------------------------------------------

/// `/restaurant <name>`
pub(super) async fn open_restaurant(
    ctx: &BotContext,
    session: &mut Session,
    chat: ChatId,
    args: &[String],
) -> Result<Transition, BotError> {
    let name = args.join(" ");
    if name.trim().is_empty() {
        return Ok(Transition::stay().text(chat, RESTAURANT_USAGE));
    }
    let Some(restaurant) = ctx.repo.find_restaurant_by_name(name.trim()).await? else {
        return Ok(Transition::stay().text(chat, RESTAURANT_NOT_FOUND));
    };

    let schedule = ctx.repo.find_schedule(restaurant.id).await?;
    let categories = ctx
        .repo
        .list_restaurant_categories(restaurant.id, false)
        .await?;

    let overview = format!(
        "Name: {}\nCurrency: {}\n\nSchedule:\n{}",
        restaurant.name,
        restaurant.currency,
        availability::describe(&schedule)
    );

    let transition = Transition::stay()
        .send(
            chat,
            Content::text(overview),
            Some(Keyboard::Inline(restaurant_keyboard(&restaurant))),
        )
        .send(chat, Content::text(SEND_CATEGORY), Some(category_keyboard(&categories)));

    session.staff = Some(StaffFlow::ManagingRestaurant(ManagedRestaurant {
        id: restaurant.id,
        name: restaurant.name,
        categories,
    }));
    Ok(transition)
}

pub(super) async fn toggle_restaurant(
    ctx: &BotContext,
    callback: &CallbackRef,
    message: MessageRef,
    restaurant_id: DbId,
) -> Result<Transition, BotError> {
    let Some(current) = ctx.repo.find_restaurant(restaurant_id).await? else {
        return Ok(Transition::stay()
            .alert(callback, RESTAURANT_NOT_FOUND)
            .edit(message, None, None));
    };

    let restaurant = ctx
        .repo
        .set_restaurant_enabled(restaurant_id, !current.enabled)
        .await?;
    tracing::info!(restaurant_id, enabled = restaurant.enabled, "Restaurant toggled");

    let notice = if restaurant.enabled {
        RESTAURANT_SHOWN
    } else {
        RESTAURANT_HIDDEN
    };
    Ok(Transition::stay()
        .alert(callback, notice)
        .edit(message, None, Some(restaurant_keyboard(&restaurant))))
}

pub(super) async fn toggle_dish(
    ctx: &BotContext,
    callback: &CallbackRef,
    message: MessageRef,
    dish_id: DbId,
) -> Result<Transition, BotError> {
    let Some(current) = ctx.repo.find_dish(dish_id).await? else {
        return Ok(Transition::stay()
            .alert(callback, text::DISH_UNAVAILABLE)
            .edit(message, None, None));
    };

    let dish = ctx.repo.set_dish_enabled(dish_id, !current.enabled).await?;
    tracing::info!(dish_id, enabled = dish.enabled, "Dish toggled");

    let notice = if dish.enabled { DISH_SHOWN } else { DISH_HIDDEN };
    Ok(Transition::stay()
        .alert(callback, notice)
        .edit(message, None, Some(dish_keyboard(dish.id, dish.enabled))))
}

// ---------------------------------------------------------------------------
// Schedule editing
// ---------------------------------------------------------------------------

pub(super) async fn edit_schedule(
    ctx: &BotContext,
    session: &mut Session,
    callback: &CallbackRef,
    restaurant_id: DbId,
) -> Result<Transition, BotError> {
    let managed = match &session.staff {
        Some(StaffFlow::ManagingRestaurant(m) | StaffFlow::EditingSchedule(m))
            if m.id == restaurant_id =>
        {
            m.clone()
        }
        _ => {
            let Some(restaurant) = ctx.repo.find_restaurant(restaurant_id).await? else {
                return Ok(Transition::stay().alert(callback, RESTAURANT_NOT_FOUND));
            };
            let categories = ctx
                .repo
                .list_restaurant_categories(restaurant.id, false)
                .await?;
            ManagedRestaurant {
                id: restaurant.id,
                name: restaurant.name,
                categories,
            }
        }
    };

    let prompt = text::schedule_prompt(&managed.name);
    session.staff = Some(StaffFlow::EditingSchedule(managed));

    Ok(Transition::stay().answer(callback, None, false).send(
        callback.chat,
        Content::text(prompt),
        Some(Keyboard::Inline(InlineKeyboard::single(
            InlineButton::callback(CANCEL, CallbackData::CancelScheduleEdit),
        ))),
    ))
}

pub(super) fn cancel_schedule_edit(
    session: &mut Session,
    callback: &CallbackRef,
    message: MessageRef,
) -> Transition {
    if let Some(StaffFlow::EditingSchedule(managed)) = session.staff.take() {
        session.staff = Some(StaffFlow::ManagingRestaurant(managed));
    }
    Transition::stay()
        .answer(callback, Some(SCHEDULE_CANCELLED), false)
        .edit(message, None, None)
}

// ---------------------------------------------------------------------------
// Wizards
// ---------------------------------------------------------------------------

pub(super) fn start_new_restaurant(session: &mut Session, chat: ChatId) -> Transition {
    let draft = RestaurantDraft::default();
    let prompt = restaurant_progress(&draft, SEND_RESTAURANT_NAME);
    session.staff = Some(StaffFlow::NewRestaurant(draft));
    Transition::stay().send(chat, Content::text(prompt), Some(Keyboard::Remove))
}

pub(super) fn start_new_category(session: &mut Session, chat: ChatId) -> Transition {
    session.staff = Some(StaffFlow::NewCategory);
    Transition::stay().send(
        chat,
        Content::text(progress(NEW_CATEGORY, &[("Name", None)], SEND_CATEGORY_NAME)),
        Some(Keyboard::Remove),
    )
}

pub(super) async fn start_new_dish(
    ctx: &BotContext,
    session: &mut Session,
    chat: ChatId,
) -> Result<Transition, BotError> {
    let restaurants = ctx.repo.list_restaurants(false).await?;
    let names: Vec<&str> = restaurants.iter().map(|r| r.name.as_str()).collect();

    let draft = DishDraft::default();
    let prompt = dish_progress(&draft, SEND_DISH_RESTAURANT);
    session.staff = Some(StaffFlow::NewDish(draft));
    Ok(Transition::stay().send(chat, Content::text(prompt), Some(column_keyboard(&names))))
}

/// Text typed while a staff flow is active.
pub(super) async fn flow_text(
    ctx: &BotContext,
    session: &mut Session,
    flow: StaffFlow,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    let input = input.trim();
    match flow {
        StaffFlow::ManagingRestaurant(managed) => list_category_dishes(ctx, &managed, chat, input).await,
        StaffFlow::EditingSchedule(managed) => change_schedule(ctx, session, managed, chat, input).await,
        StaffFlow::NewRestaurant(draft) => restaurant_step(ctx, session, draft, chat, input).await,
        StaffFlow::NewCategory => category_step(ctx, session, chat, input).await,
        StaffFlow::NewDish(draft) => dish_step(ctx, session, draft, chat, input).await,
    }
}

/// Photo sent while a staff flow is active. Only the last dish wizard step
/// takes one.
pub(super) async fn flow_photo(
    ctx: &BotContext,
    session: &mut Session,
    flow: StaffFlow,
    chat: ChatId,
    file_id: &str,
) -> Result<Transition, BotError> {
    match flow {
        StaffFlow::NewDish(draft) if draft.price.is_some() => {
            finish_dish(ctx, session, draft, chat, Some(file_id.to_string())).await
        }
        _ => Ok(not_recognized(chat)),
    }
}

// ---- flow steps ----

async fn list_category_dishes(
    ctx: &BotContext,
    managed: &ManagedRestaurant,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    let Some(category) = managed.categories.iter().find(|c| c.name == input) else {
        return Ok(not_recognized(chat));
    };
    let Some(restaurant) = ctx.repo.find_restaurant(managed.id).await? else {
        return Ok(Transition::stay().text(chat, RESTAURANT_NOT_FOUND));
    };

    let dishes = ctx.repo.list_dishes(managed.id, category.id, false).await?;
    let mut transition = Transition::stay();
    for dish in &dishes {
        transition = transition.send(
            chat,
            dish_content(dish, &restaurant.currency),
            Some(Keyboard::Inline(dish_keyboard(dish.id, dish.enabled))),
        );
    }
    Ok(transition)
}

async fn change_schedule(
    ctx: &BotContext,
    session: &mut Session,
    managed: ManagedRestaurant,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    let schedule = match availability::parse_schedule(input) {
        Ok(schedule) => schedule,
        Err(CoreError::Validation(err)) => {
            return Ok(Transition::stay().text(chat, text::schedule_error(&err)));
        }
        Err(e) => return Err(e.into()),
    };

    ctx.repo.replace_schedule(managed.id, &schedule).await?;
    tracing::info!(restaurant_id = managed.id, days = schedule.len(), "Schedule replaced");

    let reopen = format!("/restaurant {}", managed.name);
    session.staff = Some(StaffFlow::ManagingRestaurant(managed));
    Ok(Transition::stay().send(
        chat,
        Content::text(SCHEDULE_CHANGED),
        Some(Keyboard::reply(vec![vec![reopen.as_str()]])),
    ))
}

async fn restaurant_step(
    ctx: &BotContext,
    session: &mut Session,
    mut draft: RestaurantDraft,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    match (&draft.name, &draft.currency) {
        (None, _) => {
            if !fits(input, MAX_NAME_CHARS) {
                return Ok(Transition::stay().text(chat, NAME_TOO_LONG));
            }
            if ctx.repo.find_restaurant_by_name(input).await?.is_some() {
                return Ok(Transition::stay().text(chat, RESTAURANT_EXISTS));
            }
            draft.name = Some(input.to_string());
            let prompt = restaurant_progress(&draft, SEND_CURRENCY);
            session.staff = Some(StaffFlow::NewRestaurant(draft));
            Ok(Transition::stay().text(chat, &prompt))
        }
        (Some(_), None) => {
            if !fits(input, MAX_CURRENCY_CHARS) {
                return Ok(Transition::stay().text(chat, CURRENCY_TOO_LONG));
            }
            draft.currency = Some(input.to_string());
            let prompt = restaurant_progress(&draft, &text::new_schedule_hint());
            session.staff = Some(StaffFlow::NewRestaurant(draft));
            Ok(Transition::stay().text(chat, &prompt))
        }
        (Some(name), Some(currency)) => {
            let schedule = match availability::parse_schedule(input) {
                Ok(schedule) => schedule,
                Err(CoreError::Validation(err)) => {
                    return Ok(Transition::stay().text(chat, text::schedule_error(&err)));
                }
                Err(e) => return Err(e.into()),
            };
            let new_restaurant = NewRestaurant {
                name: name.clone(),
                currency: currency.clone(),
            };
            create_restaurant(ctx, session, chat, new_restaurant, schedule).await
        }
    }
}

async fn create_restaurant(
    ctx: &BotContext,
    session: &mut Session,
    chat: ChatId,
    draft: NewRestaurant,
    schedule: Schedule,
) -> Result<Transition, BotError> {
    draft.validate().map_err(CoreError::from)?;
    let restaurant = match ctx.repo.create_restaurant(&draft, &schedule).await {
        Ok(restaurant) => restaurant,
        Err(CoreError::Conflict(_)) => {
            return Ok(Transition::stay().text(chat, RESTAURANT_EXISTS));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(restaurant_id = restaurant.id, name = %restaurant.name, "Restaurant created");

    session.staff = None;
    let open = format!("/restaurant {}", restaurant.name);
    Ok(Transition::stay().send(
        chat,
        Content::text(text::restaurant_created(&restaurant.name)),
        Some(Keyboard::reply(vec![
            vec![open.as_str()],
            vec!["/new_category"],
            vec!["/new_dish"],
        ])),
    ))
}

async fn category_step(
    ctx: &BotContext,
    session: &mut Session,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    if !fits(input, MAX_NAME_CHARS) {
        return Ok(Transition::stay().text(chat, NAME_TOO_LONG));
    }
    if ctx.repo.find_category_by_name(input).await?.is_some() {
        return Ok(Transition::stay().text(chat, CATEGORY_EXISTS));
    }

    let draft = NewDishCategory {
        name: input.to_string(),
    };
    draft.validate().map_err(CoreError::from)?;
    let category = match ctx.repo.create_category(&draft).await {
        Ok(category) => category,
        Err(CoreError::Conflict(_)) => {
            return Ok(Transition::stay().text(chat, CATEGORY_EXISTS));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(category_id = category.id, name = %category.name, "Category created");

    session.staff = None;
    Ok(Transition::stay().send(
        chat,
        Content::text(text::category_created(&category.name)),
        Some(Keyboard::reply(vec![vec!["/new_dish"]])),
    ))
}

async fn dish_step(
    ctx: &BotContext,
    session: &mut Session,
    mut draft: DishDraft,
    chat: ChatId,
    input: &str,
) -> Result<Transition, BotError> {
    let (prompt, keyboard) = if draft.restaurant.is_none() {
        let Some(restaurant) = ctx.repo.find_restaurant_by_name(input).await? else {
            return Ok(Transition::stay().text(chat, text::named_not_found("Restaurant", input)));
        };
        draft.restaurant = Some(restaurant.reference());

        let categories = ctx.repo.list_categories().await?;
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        (dish_progress(&draft, SEND_DISH_CATEGORY), column_keyboard(&names))
    } else if draft.category.is_none() {
        let Some(category) = ctx.repo.find_category_by_name(input).await? else {
            return Ok(Transition::stay().text(chat, text::named_not_found("Category", input)));
        };
        draft.category = Some(category);
        (dish_progress(&draft, SEND_DISH_NAME), Keyboard::Remove)
    } else if draft.name.is_none() {
        if !fits(input, MAX_NAME_CHARS) {
            return Ok(Transition::stay().text(chat, NAME_TOO_LONG));
        }
        draft.name = Some(input.to_string());
        (dish_progress(&draft, SEND_DISH_DESCRIPTION), Keyboard::Remove)
    } else if draft.description.is_none() {
        if input.chars().count() > MAX_DESCRIPTION_CHARS {
            return Ok(Transition::stay().text(chat, DESCRIPTION_TOO_LONG));
        }
        draft.description = Some(input.to_string());
        (dish_progress(&draft, SEND_DISH_PRICE), Keyboard::Remove)
    } else if draft.price.is_none() {
        match parse_price(input) {
            Ok(price) => draft.price = Some(price),
            Err(e) => {
                return Ok(Transition::stay().text(chat, text::price_error(&e.to_string())));
            }
        }
        (dish_progress(&draft, SEND_DISH_PHOTO), Keyboard::reply(vec![vec![NO]]))
    } else if input.eq_ignore_ascii_case(NO) {
        return finish_dish(ctx, session, draft, chat, None).await;
    } else {
        return Ok(Transition::stay().text(chat, SEND_DISH_PHOTO));
    };

    session.staff = Some(StaffFlow::NewDish(draft));
    Ok(Transition::stay().send(chat, Content::text(prompt), Some(keyboard)))
}

async fn finish_dish(
    ctx: &BotContext,
    session: &mut Session,
    draft: DishDraft,
    chat: ChatId,
    photo_file_id: Option<String>,
) -> Result<Transition, BotError> {
    let (Some(restaurant), Some(category), Some(name), Some(description), Some(price)) = (
        draft.restaurant,
        draft.category,
        draft.name,
        draft.description,
        draft.price,
    ) else {
        return Err(CoreError::Internal("dish draft is incomplete".into()).into());
    };

    let new_dish = NewDish {
        restaurant_id: restaurant.id,
        category_id: category.id,
        name,
        description,
        price,
        photo_file_id,
    };
    new_dish.validate().map_err(CoreError::from)?;
    let dish = ctx.repo.create_dish(&new_dish).await?;
    tracing::info!(dish_id = dish.id, restaurant_id = restaurant.id, "Dish created");

    session.staff = None;
    let open = format!("/restaurant {}", restaurant.name);
    Ok(Transition::stay().send(
        chat,
        Content::text(text::dish_created(&dish.name)),
        Some(Keyboard::reply(vec![
            vec!["/new_dish"],
            vec!["/new_category"],
            vec![open.as_str()],
        ])),
    ))
}

// ---- private helpers ----

fn restaurant_keyboard(restaurant: &Restaurant) -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![InlineButton::callback(
            text::toggle_label(restaurant.enabled, "enabled", "disabled"),
            CallbackData::ToggleRestaurant {
                restaurant_id: restaurant.id,
            },
        )],
        vec![InlineButton::callback(
            CHANGE_SCHEDULE,
            CallbackData::EditSchedule {
                restaurant_id: restaurant.id,
            },
        )],
    ])
}

fn dish_keyboard(dish_id: DbId, enabled: bool) -> InlineKeyboard {
    InlineKeyboard::single(InlineButton::callback(
        text::toggle_label(enabled, "enabled", "disabled"),
        CallbackData::ToggleDish { dish_id },
    ))
}

fn category_keyboard(categories: &[DishCategory]) -> Keyboard {
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    column_keyboard(&names)
}

/// One button per row; removes the keyboard when there is nothing to offer.
fn column_keyboard(labels: &[&str]) -> Keyboard {
    if labels.is_empty() {
        return Keyboard::Remove;
    }
    Keyboard::reply(labels.iter().map(|label| vec![*label]).collect())
}

fn fits(input: &str, max_chars: usize) -> bool {
    !input.is_empty() && input.chars().count() <= max_chars
}

fn restaurant_progress(draft: &RestaurantDraft, hint: &str) -> String {
    progress(
        NEW_RESTAURANT,
        &[
            ("Name", draft.name.clone()),
            ("Currency", draft.currency.clone()),
            ("Schedule", None),
        ],
        hint,
    )
}

fn dish_progress(draft: &DishDraft, hint: &str) -> String {
    progress(
        NEW_DISH,
        &[
            ("Restaurant", draft.restaurant.as_ref().map(|r| r.name.clone())),
            ("Category", draft.category.as_ref().map(|c| c.name.clone())),
            ("Name", draft.name.clone()),
            ("Description", draft.description.clone()),
            ("Price", draft.price.map(|p| p.to_string())),
            ("Photo", None),
        ],
        hint,
    )
}

/// Wizard summary: filled fields with their values, an arrow at the field
/// being asked for, then the hint.
fn progress(title: &str, fields: &[(&str, Option<String>)], hint: &str) -> String {
    let mut out = format!("{title}:\n\n");
    let mut marked = false;
    for (label, value) in fields {
        match value {
            Some(value) => out.push_str(&format!("{label}: {value}\n")),
            None if !marked => {
                marked = true;
                out.push_str(&format!("-> {label}:\n"));
            }
            None => out.push_str(&format!("{label}:\n")),
        }
    }
    out.push('\n');
    out.push_str(hint);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_marks_the_first_missing_field() {
        let draft = RestaurantDraft {
            name: Some("Tasca".into()),
            currency: None,
        };
        let text = restaurant_progress(&draft, SEND_CURRENCY);

        assert!(text.starts_with("New Restaurant:\n\n"));
        assert!(text.contains("Name: Tasca\n"));
        assert!(text.contains("-> Currency:\n"));
        assert!(text.contains("\nSchedule:\n"));
        assert!(text.ends_with(SEND_CURRENCY));
    }

    #[test]
    fn names_are_bounded_by_characters() {
        assert!(fits("Tasca", MAX_NAME_CHARS));
        assert!(!fits("", MAX_NAME_CHARS));
        assert!(fits(&"é".repeat(32), MAX_NAME_CHARS));
        assert!(!fits(&"a".repeat(33), MAX_NAME_CHARS));
    }

    #[test]
    fn empty_category_list_removes_the_keyboard() {
        assert!(matches!(category_keyboard(&[]), Keyboard::Remove));
    }
}
