#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;

use dinebot_bot::config::Settings;
use dinebot_bot::context::BotContext;
use dinebot_bot::dispatcher::SessionDispatcher;
use dinebot_bot::effects::{Effect, EffectRunner};
use dinebot_bot::maintenance::MaintenanceReporter;
use dinebot_bot::router::UpdateRouter;
use dinebot_bot::session::Session;
use dinebot_core::availability::parse_schedule;
use dinebot_core::callback::CallbackData;
use dinebot_core::catalog::{Dish, DishCategory, NewDish, NewDishCategory, Restaurant};
use dinebot_core::clock::FixedClock;
use dinebot_core::inbound::{ClientProfile, Inbound, InboundEvent};
use dinebot_core::memory::InMemoryRepository;
use dinebot_core::repository::Repository;
use dinebot_core::transport::{
    CallbackRef, Content, InlineKeyboard, Keyboard, MessageKind, MessageRef, Transport,
    TransportError,
};
use dinebot_core::types::{ChatId, GeoPoint};
use dinebot_events::EventBus;

pub const CLIENT: ChatId = 100;
pub const OTHER_CLIENT: ChatId = 101;
pub const DEVELOPER: ChatId = 1;
pub const MANAGER: ChatId = 2;
pub const STAFF_CHAT: ChatId = -500;

/// Every day from 09:00 to 22:00.
pub const DAILY: &str = "1 - 09.00 - 22.00\n2 - 09.00 - 22.00\n3 - 09.00 - 22.00\n\
4 - 09.00 - 22.00\n5 - 09.00 - 22.00\n6 - 09.00 - 22.00\n7 - 09.00 - 22.00";

// ---------------------------------------------------------------------------
// Recording transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Sent {
    pub chat: ChatId,
    pub content: Content,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Clone)]
pub struct Edited {
    pub message: MessageRef,
    pub text: Option<String>,
    pub keyboard: Option<InlineKeyboard>,
}

#[derive(Debug, Clone)]
pub struct Answered {
    pub callback_id: String,
    pub text: Option<String>,
    pub alert: bool,
}

/// Transport double that records every call.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<Sent>>,
    edits: Mutex<Vec<Edited>>,
    answers: Mutex<Vec<Answered>>,
    failing: Mutex<HashSet<ChatId>>,
    staff_chat_closed: AtomicBool,
    next_message_id: AtomicI64,
}

impl RecordingTransport {
    /// Sends to `chat` fail with `ChatUnavailable`.
    pub fn fail_chat(&self, chat: ChatId) {
        self.failing.lock().unwrap().insert(chat);
    }

    /// `can_post` answers `false` for every chat.
    pub fn close_chats(&self) {
        self.staff_chat_closed.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.chat == chat).collect()
    }

    /// Text bodies and captions sent to `chat`, in order.
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.sent_to(chat)
            .into_iter()
            .filter_map(|s| content_text(&s.content))
            .collect()
    }

    pub fn edits(&self) -> Vec<Edited> {
        self.edits.lock().unwrap().clone()
    }

    pub fn answers(&self) -> Vec<Answered> {
        self.answers.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.edits.lock().unwrap().clear();
        self.answers.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        chat: ChatId,
        content: &Content,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        if self.failing.lock().unwrap().contains(&chat) {
            return Err(TransportError::ChatUnavailable(chat));
        }
        self.sent.lock().unwrap().push(Sent {
            chat,
            content: content.clone(),
            keyboard: keyboard.cloned(),
        });
        Ok(MessageRef {
            chat,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
            kind: content.kind(),
        })
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: Option<&str>,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), TransportError> {
        self.edits.lock().unwrap().push(Edited {
            message: *message,
            text: text.map(String::from),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn answer(
        &self,
        callback: &CallbackRef,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError> {
        self.answers.lock().unwrap().push(Answered {
            callback_id: callback.id.clone(),
            text: text.map(String::from),
            alert,
        });
        Ok(())
    }

    async fn can_post(&self, _chat: ChatId) -> Result<bool, TransportError> {
        Ok(!self.staff_chat_closed.load(Ordering::SeqCst))
    }
}

pub fn content_text(content: &Content) -> Option<String> {
    match content {
        Content::Text(text) | Content::Monospace(text) => Some(text.clone()),
        Content::Photo { caption, .. } | Content::Document { caption, .. } => caption.clone(),
        Content::Location(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Seeded bot
// ---------------------------------------------------------------------------

/// A bot wired to the in-memory store, a fixed clock and a recording
/// transport.
///
/// Seed data: "Tasca" (EUR, open daily 09-22) with Mains = Bifana 4.50 and
/// Prego 6.00, and "Sushi Bar" (JPY, same hours) with Rolls = Maki 900.
/// The clock starts on Monday 2024-01-01 12:00 local time (+03:00).
pub struct TestBot {
    pub repo: Arc<InMemoryRepository>,
    pub clock: Arc<FixedClock>,
    pub transport: Arc<RecordingTransport>,
    pub bus: Arc<EventBus>,
    pub settings: Settings,
    pub ctx: Arc<BotContext>,
    pub router: UpdateRouter,
    pub runner: EffectRunner,

    pub tasca: Restaurant,
    pub mains: DishCategory,
    pub bifana: Dish,
    pub prego: Dish,
    pub sushi: Restaurant,
    pub rolls: DishCategory,
    pub maki: Dish,
}

impl TestBot {
    pub async fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        let transport = Arc::new(RecordingTransport::default());
        let bus = Arc::new(EventBus::default());
        let settings = Settings {
            staff_chat_id: STAFF_CHAT,
            developer_id: DEVELOPER,
            manager_id: MANAGER,
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
            city: "Lisbon".into(),
        };

        let schedule = parse_schedule(DAILY).unwrap();
        let tasca = repo
            .seed_restaurant("Tasca", "EUR", true, schedule.clone())
            .await;
        let sushi = repo
            .seed_restaurant("Sushi Bar", "JPY", true, schedule)
            .await;

        let mains = category(&repo, "Mains").await;
        let rolls = category(&repo, "Rolls").await;
        let bifana = dish(&repo, &tasca, &mains, "Bifana", Decimal::new(450, 2)).await;
        let prego = dish(&repo, &tasca, &mains, "Prego", Decimal::new(600, 2)).await;
        let maki = dish(&repo, &sushi, &rolls, "Maki", Decimal::new(900, 0)).await;

        repo.ensure_admin(DEVELOPER, clock_now(&clock)).await.unwrap();
        repo.upsert_user(&profile(MANAGER), clock_now(&clock))
            .await
            .unwrap();
        repo.set_permissions(MANAGER, false, true).await.unwrap();

        let ctx = Arc::new(BotContext::new(
            repo.clone(),
            clock.clone(),
            settings.clone(),
        ));
        let router = UpdateRouter::new(Arc::clone(&ctx));
        let runner = EffectRunner::new(transport.clone(), Arc::clone(&bus));

        Self {
            repo,
            clock,
            transport,
            bus,
            settings,
            ctx,
            router,
            runner,
            tasca,
            mains,
            bifana,
            prego,
            sushi,
            rolls,
            maki,
        }
    }

    /// A dispatcher sharing this bot's store, transport and bus.
    pub fn dispatcher(&self) -> SessionDispatcher {
        SessionDispatcher::new(
            UpdateRouter::new(Arc::clone(&self.ctx)),
            self.runner.clone(),
            MaintenanceReporter::new(self.transport.clone(), DEVELOPER),
        )
    }

    /// Route `event` from `CLIENT` in its private chat and perform the
    /// effects.
    pub async fn send(&self, session: &mut Session, event: InboundEvent) -> Vec<Effect> {
        self.send_as(session, inbound(session.client_id, session.client_id, event))
            .await
    }

    pub async fn send_as(&self, session: &mut Session, inbound: Inbound) -> Vec<Effect> {
        let effects = self
            .router
            .route(session, &inbound)
            .await
            .expect("routing failed");
        self.runner
            .apply(effects.clone())
            .await
            .expect("effects failed");
        effects
    }

    /// A client session after `/start`.
    pub async fn started(&self, client: ChatId) -> Session {
        let mut session = Session::new(client);
        self.send(&mut session, command("start", &[])).await;
        session
    }

    /// Start, open "Tasca", show Mains and put `quantity` Bifanas in the
    /// cart.
    pub async fn with_bifanas(&self, quantity: u32) -> Session {
        let mut session = self.started(CLIENT).await;
        self.send(&mut session, text(dinebot_core::text::CHOOSE_RESTAURANT))
            .await;
        self.send(&mut session, text("Tasca")).await;
        self.send(&mut session, text("Mains")).await;
        self.send(
            &mut session,
            callback(
                CLIENT,
                CallbackData::SelectQuantity {
                    dish_id: self.bifana.id,
                    quantity,
                },
            ),
        )
        .await;
        session
    }
}

fn clock_now(clock: &FixedClock) -> chrono::DateTime<Utc> {
    use dinebot_core::clock::Clock;
    clock.now()
}

async fn category(repo: &InMemoryRepository, name: &str) -> DishCategory {
    repo.create_category(&NewDishCategory { name: name.into() })
        .await
        .unwrap()
}

async fn dish(
    repo: &InMemoryRepository,
    restaurant: &Restaurant,
    category: &DishCategory,
    name: &str,
    price: Decimal,
) -> Dish {
    repo.create_dish(&NewDish {
        restaurant_id: restaurant.id,
        category_id: category.id,
        name: name.into(),
        description: format!("{name} description"),
        price,
        photo_file_id: None,
    })
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// Inbound builders
// ---------------------------------------------------------------------------

pub fn profile(id: ChatId) -> ClientProfile {
    ClientProfile {
        id,
        username: Some(format!("user{id}")),
        first_name: Some("Test".into()),
        last_name: None,
        is_bot: false,
    }
}

pub fn inbound(client: ChatId, chat: ChatId, event: InboundEvent) -> Inbound {
    Inbound {
        client: profile(client),
        chat,
        event,
    }
}

pub fn text(body: &str) -> InboundEvent {
    InboundEvent::Text(body.to_string())
}

pub fn command(name: &str, args: &[&str]) -> InboundEvent {
    InboundEvent::Command {
        name: name.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

pub fn location() -> InboundEvent {
    InboundEvent::Location(GeoPoint {
        latitude: 38.7223,
        longitude: -9.1393,
    })
}

static NEXT_CALLBACK: AtomicI64 = AtomicI64::new(1);

/// A button press on message 7 of `chat`.
pub fn callback(chat: ChatId, data: CallbackData) -> InboundEvent {
    InboundEvent::Callback {
        callback: CallbackRef {
            id: format!("cb-{}", NEXT_CALLBACK.fetch_add(1, Ordering::SeqCst)),
            chat,
        },
        message: MessageRef {
            chat,
            message_id: 7,
            kind: MessageKind::Text,
        },
        data: Some(data),
    }
}
