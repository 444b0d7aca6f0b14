//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the bot. The handlers
//! are organized in a testable way: the same handler tree is used by the
//! production dispatcher and can be exercised from integration tests.

use std::sync::Arc;

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ReplyMarkup};

use crate::access::{self, Role};
use crate::core::config;
use crate::core::utils::{format_duration, format_file_size};
use crate::i18n::{tr, tr_args};
use crate::session::SessionStore;
use crate::storage::catalog::{self, Book};
use crate::storage::db;
use crate::storage::{get_connection, stats, DbPool};
use crate::telegram::bot::Command;
use crate::telegram::keyboards;
use crate::workflow::{
    admin, book, category, search, AddBookState, DialogState, FileRef, Reply, StepOutcome,
};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub sessions: SessionStore,
    pub super_admins: Arc<Vec<i64>>,
}

impl HandlerDeps {
    /// Dependencies with the super-admin list taken from configuration.
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self::with_super_admins(db_pool, config::admin::SUPER_ADMIN_IDS.clone())
    }

    pub fn with_super_admins(db_pool: Arc<DbPool>, super_admins: Vec<i64>) -> Self {
        Self {
            db_pool,
            sessions: SessionStore::new(),
            super_admins: Arc::new(super_admins),
        }
    }
}

/// Creates the main dispatcher schema for the bot.
///
/// Branch order matters: commands first, then menu buttons, then uploaded
/// files, then free text going to the active dialog, callbacks last.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_menu = deps.clone();
    let deps_files = deps.clone();
    let deps_text = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(menu_button_handler(deps_menu))
        .branch(file_handler(deps_files))
        .branch(text_handler(deps_text))
        .branch(callback_handler(deps_callback))
}

fn resolve_role(deps: &HandlerDeps, telegram_id: i64) -> Role {
    let conn = match get_connection(&deps.db_pool) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to get DB connection for role check: {}", e);
            return Role::Anonymous;
        }
    };
    match access::resolve_with(&conn, &deps.super_admins, telegram_id) {
        Ok(role) => role,
        Err(e) => {
            log::error!("Failed to resolve role for {}: {}", telegram_id, e);
            Role::Anonymous
        }
    }
}

/// Registers the user on first contact. Best-effort: a failure is logged
/// and the update is still handled.
fn register_user(deps: &HandlerDeps, telegram_id: i64, username: Option<&str>) {
    match get_connection(&deps.db_pool) {
        Ok(conn) => {
            if let Err(e) = db::get_or_create_user(&conn, telegram_id, username) {
                log::warn!("Failed to register user {}: {}", telegram_id, e);
            }
        }
        Err(e) => log::warn!("Failed to get DB connection to register user: {}", e),
    }
}

fn record(deps: &HandlerDeps, kind: &str) {
    if let Ok(conn) = get_connection(&deps.db_pool) {
        if let Err(e) = stats::record_request(&conn, kind) {
            log::warn!("Failed to record request stats: {}", e);
        }
    }
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply) -> Result<(), teloxide::RequestError> {
    match reply.markup {
        Some(markup) => {
            bot.send_message(chat_id, reply.text).reply_markup(markup).await?;
        }
        None => {
            bot.send_message(chat_id, reply.text).await?;
        }
    }
    Ok(())
}

/// Applies the outcome of a dialog's opening step: only `Advance` creates a
/// session.
async fn apply_start(
    bot: &Bot,
    sessions: &SessionStore,
    chat_id: ChatId,
    outcome: StepOutcome,
) -> Result<(), HandlerError> {
    match outcome {
        StepOutcome::Advance { next, reply } => {
            sessions.start(chat_id.0, next).await;
            send_reply(bot, chat_id, reply).await?;
        }
        StepOutcome::Stay { reply }
        | StepOutcome::Finish { reply }
        | StepOutcome::Cancelled { reply } => {
            send_reply(bot, chat_id, reply).await?;
        }
        StepOutcome::Ignored => {}
    }
    Ok(())
}

/// Applies the outcome of a mid-dialog step against the session store.
async fn apply_step(
    bot: &Bot,
    sessions: &SessionStore,
    chat_id: ChatId,
    outcome: StepOutcome,
) -> Result<(), HandlerError> {
    match outcome {
        StepOutcome::Stay { reply } => send_reply(bot, chat_id, reply).await?,
        StepOutcome::Advance { next, reply } => {
            sessions.advance(chat_id.0, next).await;
            send_reply(bot, chat_id, reply).await?;
        }
        StepOutcome::Finish { reply } | StepOutcome::Cancelled { reply } => {
            sessions.finish(chat_id.0).await;
            send_reply(bot, chat_id, reply).await?;
        }
        StepOutcome::Ignored => {}
    }
    Ok(())
}

/// Whether the role may run the dialog at all. Checked again on every step,
/// so a demoted admin loses a dialog in progress.
fn dialog_permitted(state: &DialogState, role: Role) -> bool {
    match state {
        DialogState::Search(_) => true,
        DialogState::AddAdmin(_) | DialogState::RemoveAdmin(_) => role.is_super_admin(),
        _ => role.is_admin(),
    }
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let chat_id = msg.chat.id;
                let telegram_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(chat_id.0);
                let username = msg.from.as_ref().and_then(|u| u.username.clone());
                register_user(&deps, telegram_id, username.as_deref());
                record(&deps, "command");
                // A command aborts whatever dialog was in progress
                deps.sessions.finish(chat_id.0).await;

                match cmd {
                    Command::Start => {
                        let name = msg
                            .from
                            .as_ref()
                            .map(|u| u.first_name.clone())
                            .unwrap_or_else(|| "do'st".to_string());
                        let mut args = FluentArgs::new();
                        args.set("name", name.as_str());
                        bot.send_message(chat_id, tr_args("start-welcome", &args))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::user_menu()))
                            .await?;
                        send_catalog_root(&bot, &deps, chat_id).await?;
                    }
                    Command::Help => {
                        bot.send_message(chat_id, tr("help-text")).await?;
                    }
                    Command::Kitoblar => send_catalog_root(&bot, &deps, chat_id).await?,
                    Command::Panel => send_panel(&bot, &deps, chat_id, telegram_id).await?,
                }
                Ok(())
            }
        },
    )
}

const MENU_BUTTONS: &[&str] = &[
    keyboards::BTN_USER_BOOKS,
    keyboards::BTN_SEARCH,
    keyboards::BTN_BOOKS_ADMIN,
    keyboards::BTN_ADMINS,
    keyboards::BTN_STATS,
    keyboards::BTN_BACK,
    keyboards::BTN_MAIN_MENU,
    keyboards::BTN_ADD_ADMIN,
    keyboards::BTN_REMOVE_ADMIN,
    keyboards::BTN_LIST_ADMINS,
    keyboards::BTN_CATEGORIES,
    keyboards::BTN_BOOKS,
    keyboards::BTN_ADD_CATEGORY,
    keyboards::BTN_EDIT_CATEGORY,
    keyboards::BTN_DELETE_CATEGORY,
    keyboards::BTN_ADD_BOOK,
    keyboards::BTN_EDIT_BOOK,
    keyboards::BTN_DELETE_BOOK,
    keyboards::BTN_CANCEL,
];

fn is_menu_button(text: &str) -> bool {
    MENU_BUTTONS.contains(&text)
}

/// Handler for reply-keyboard menu buttons.
///
/// Menu buttons win over an active dialog, except the skip button which is
/// dialog input and falls through to the text handler.
fn menu_button_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(is_menu_button).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                let chat_id = msg.chat.id;
                let telegram_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(chat_id.0);
                record(&deps, "button");
                let role = resolve_role(&deps, telegram_id);

                match text.as_str() {
                    keyboards::BTN_CANCEL => {
                        deps.sessions.finish(chat_id.0).await;
                        let menu = if role.is_admin() {
                            keyboards::admin_menu()
                        } else {
                            keyboards::user_menu()
                        };
                        bot.send_message(chat_id, tr("cancelled"))
                            .reply_markup(ReplyMarkup::Keyboard(menu))
                            .await?;
                    }
                    keyboards::BTN_MAIN_MENU => {
                        deps.sessions.finish(chat_id.0).await;
                        bot.send_message(chat_id, tr("panel-closed"))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::user_menu()))
                            .await?;
                    }
                    keyboards::BTN_BACK => {
                        deps.sessions.finish(chat_id.0).await;
                        if role.is_admin() {
                            send_panel(&bot, &deps, chat_id, telegram_id).await?;
                        } else {
                            bot.send_message(chat_id, tr("panel-closed"))
                                .reply_markup(ReplyMarkup::Keyboard(keyboards::user_menu()))
                                .await?;
                        }
                    }
                    keyboards::BTN_USER_BOOKS => send_catalog_root(&bot, &deps, chat_id).await?,
                    keyboards::BTN_SEARCH => {
                        apply_start(&bot, &deps.sessions, chat_id, search::start()).await?;
                    }
                    keyboards::BTN_BOOKS_ADMIN => {
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        bot.send_message(chat_id, tr("books-admin-title"))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::books_admin_menu()))
                            .await?;
                    }
                    keyboards::BTN_CATEGORIES => {
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        bot.send_message(chat_id, tr("category-menu-title"))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::category_menu()))
                            .await?;
                    }
                    keyboards::BTN_BOOKS => {
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        bot.send_message(chat_id, tr("book-menu-title"))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::book_menu()))
                            .await?;
                    }
                    keyboards::BTN_STATS => {
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        send_stats(&bot, &deps, chat_id).await?;
                    }
                    keyboards::BTN_ADMINS => {
                        if let Some(reply) = require_super(role) {
                            bot.send_message(chat_id, reply).await?;
                            return Ok(());
                        }
                        bot.send_message(chat_id, tr("admin-menu-title"))
                            .reply_markup(ReplyMarkup::Keyboard(keyboards::admin_management_menu()))
                            .await?;
                    }
                    keyboards::BTN_ADD_ADMIN => {
                        if let Some(reply) = require_super(role) {
                            bot.send_message(chat_id, reply).await?;
                            return Ok(());
                        }
                        apply_start(&bot, &deps.sessions, chat_id, admin::start_add()).await?;
                    }
                    keyboards::BTN_REMOVE_ADMIN => {
                        if let Some(reply) = require_super(role) {
                            bot.send_message(chat_id, reply).await?;
                            return Ok(());
                        }
                        apply_start(&bot, &deps.sessions, chat_id, admin::start_remove()).await?;
                    }
                    keyboards::BTN_LIST_ADMINS => {
                        // Any admin may see the list; only managing it is
                        // reserved for super-admins
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        send_admin_list(&bot, &deps, chat_id).await?;
                    }
                    keyboards::BTN_ADD_CATEGORY
                    | keyboards::BTN_EDIT_CATEGORY
                    | keyboards::BTN_DELETE_CATEGORY
                    | keyboards::BTN_ADD_BOOK
                    | keyboards::BTN_EDIT_BOOK
                    | keyboards::BTN_DELETE_BOOK => {
                        if !role.is_admin() {
                            bot.send_message(chat_id, tr("access-denied")).await?;
                            return Ok(());
                        }
                        let outcome = {
                            let conn = get_connection(&deps.db_pool)?;
                            match text.as_str() {
                                keyboards::BTN_ADD_CATEGORY => category::start_add(&conn)?,
                                keyboards::BTN_EDIT_CATEGORY => category::start_edit(&conn)?,
                                keyboards::BTN_DELETE_CATEGORY => category::start_delete(&conn)?,
                                keyboards::BTN_ADD_BOOK => book::start_add(&conn)?,
                                keyboards::BTN_EDIT_BOOK => book::start_edit(&conn)?,
                                _ => book::start_delete(&conn)?,
                            }
                        };
                        apply_start(&bot, &deps.sessions, chat_id, outcome).await?;
                    }
                    _ => {}
                }
                Ok(())
            }
        })
}

fn require_super(role: Role) -> Option<String> {
    if role.is_super_admin() {
        None
    } else if role.is_admin() {
        Some(tr("admin-only-super"))
    } else {
        Some(tr("access-denied"))
    }
}

fn extract_file(msg: &Message) -> Option<FileRef> {
    if let Some(doc) = msg.document() {
        let is_pdf = doc
            .mime_type
            .as_ref()
            .map(|m| m.essence_str() == "application/pdf")
            .unwrap_or(false)
            || doc
                .file_name
                .as_deref()
                .map(|n| n.to_lowercase().ends_with(".pdf"))
                .unwrap_or(false);
        if !is_pdf {
            return None;
        }
        return Some(FileRef {
            file_id: doc.file.id.0.clone(),
            file_size: Some(doc.file.size as u64),
            duration: None,
        });
    }
    if let Some(audio) = msg.audio() {
        return Some(FileRef {
            file_id: audio.file.id.0.clone(),
            file_size: Some(audio.file.size as u64),
            duration: Some(audio.duration.seconds()),
        });
    }
    None
}

/// Handler for uploaded documents and audio during the add-book dialog.
fn file_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.document().is_some() || msg.audio().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let chat_id = msg.chat.id;
                record(&deps, "file");

                let Some(DialogState::AddBook(state)) = deps.sessions.get(chat_id.0).await else {
                    return Ok(());
                };
                match extract_file(&msg) {
                    Some(file) => {
                        let outcome = book::handle_add_file(&state, file)?;
                        apply_step(&bot, &deps.sessions, chat_id, outcome).await?;
                    }
                    None => {
                        if matches!(state, AddBookState::WaitingForFile { .. }) {
                            bot.send_message(chat_id, tr("book-file-invalid")).await?;
                        }
                    }
                }
                Ok(())
            }
        })
}

/// Handler for free text feeding the active dialog.
fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                let chat_id = msg.chat.id;
                let telegram_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(chat_id.0);
                let username = msg.from.as_ref().and_then(|u| u.username.clone());
                register_user(&deps, telegram_id, username.as_deref());
                record(&deps, "text");

                let Some(state) = deps.sessions.get(chat_id.0).await else {
                    bot.send_message(chat_id, tr("unknown-input")).await?;
                    return Ok(());
                };

                let role = resolve_role(&deps, telegram_id);
                if !dialog_permitted(&state, role) {
                    deps.sessions.finish(chat_id.0).await;
                    bot.send_message(chat_id, tr("access-denied")).await?;
                    return Ok(());
                }

                let outcome = {
                    let conn = get_connection(&deps.db_pool)?;
                    match &state {
                        DialogState::Search(_) => search::handle_text(&conn, &text)?,
                        DialogState::AddAdmin(_) => {
                            admin::handle_add_text(&conn, &deps.super_admins, &text)?
                        }
                        DialogState::RemoveAdmin(_) => {
                            admin::handle_remove_text(&conn, &deps.super_admins, &text)?
                        }
                        DialogState::AddCategory(s) => category::handle_add_text(&conn, s, &text)?,
                        DialogState::EditCategory(s) => category::handle_edit_text(&conn, s, &text)?,
                        DialogState::AddBook(s) => book::handle_add_text(&conn, s, &text)?,
                        DialogState::EditBook(s) => book::handle_edit_text(&conn, s, &text)?,
                        DialogState::DeleteCategory(_) | DialogState::DeleteBook(_) => {
                            StepOutcome::Ignored
                        }
                    }
                };
                apply_step(&bot, &deps.sessions, chat_id, outcome).await?;
                Ok(())
            }
        })
}

/// Handler for callback queries (inline keyboard buttons)
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let _ = bot.answer_callback_query(q.id.clone()).await;
            let Some(data) = q.data else {
                return Ok(());
            };
            let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
                return Ok(());
            };
            let telegram_id = q.from.id.0 as i64;
            record(&deps, "callback");

            // Catalog browsing works with or without an active dialog
            if data == "home" {
                send_catalog_root(&bot, &deps, chat_id).await?;
                return Ok(());
            }
            if let Some(id) = data.strip_prefix("cat:").and_then(|p| p.parse::<i64>().ok()) {
                send_category_view(&bot, &deps, chat_id, id).await?;
                return Ok(());
            }
            if let Some(id) = data.strip_prefix("book:").and_then(|p| p.parse::<i64>().ok()) {
                send_book(&bot, &deps, chat_id, id).await?;
                return Ok(());
            }

            let Some(state) = deps.sessions.get(chat_id.0).await else {
                return Ok(());
            };
            let role = resolve_role(&deps, telegram_id);
            if !dialog_permitted(&state, role) {
                deps.sessions.finish(chat_id.0).await;
                bot.send_message(chat_id, tr("access-denied")).await?;
                return Ok(());
            }

            let outcome = {
                let conn = get_connection(&deps.db_pool)?;
                match &state {
                    DialogState::AddCategory(s) => category::handle_add_callback(&conn, s, &data)?,
                    DialogState::EditCategory(s) => {
                        category::handle_edit_callback(&conn, s, &data)?
                    }
                    DialogState::DeleteCategory(s) => {
                        category::handle_delete_callback(&conn, s, &data)?
                    }
                    DialogState::AddBook(s) => book::handle_add_callback(&conn, s, &data)?,
                    DialogState::EditBook(s) => book::handle_edit_callback(&conn, s, &data)?,
                    DialogState::DeleteBook(s) => book::handle_delete_callback(&conn, s, &data)?,
                    _ => StepOutcome::Ignored,
                }
            };
            apply_step(&bot, &deps.sessions, chat_id, outcome).await?;
            Ok(())
        }
    })
}

async fn send_panel(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    telegram_id: i64,
) -> Result<(), HandlerError> {
    let role = resolve_role(deps, telegram_id);
    if !role.is_admin() {
        bot.send_message(chat_id, tr("access-denied")).await?;
        return Ok(());
    }
    let role_name = if role.is_super_admin() {
        tr("role-super")
    } else {
        tr("role-admin")
    };
    let mut args = FluentArgs::new();
    args.set("role", role_name.as_str());
    bot.send_message(chat_id, tr_args("panel-title", &args))
        .reply_markup(ReplyMarkup::Keyboard(keyboards::admin_menu()))
        .await?;
    Ok(())
}

async fn send_catalog_root(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) -> Result<(), HandlerError> {
    let categories = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::get_main_categories(&conn)?
    };
    if categories.is_empty() {
        bot.send_message(chat_id, tr("browse-empty"))
            .reply_markup(ReplyMarkup::Keyboard(keyboards::user_menu()))
            .await?;
        return Ok(());
    }
    bot.send_message(chat_id, tr("browse-categories"))
        .reply_markup(ReplyMarkup::InlineKeyboard(keyboards::categories_inline(
            &categories,
            "cat",
        )))
        .await?;
    Ok(())
}

async fn send_category_view(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    category_id: i64,
) -> Result<(), HandlerError> {
    let (category, children, books) = {
        let conn = get_connection(&deps.db_pool)?;
        let Some(category) = catalog::get_category(&conn, category_id)? else {
            bot.send_message(chat_id, tr("category-stale")).await?;
            return Ok(());
        };
        let children = catalog::get_child_categories(&conn, category_id)?;
        let books = catalog::get_books_by_category(&conn, category_id)?;
        (category, children, books)
    };

    let mut rows = keyboards::categories_inline(&children, "cat").inline_keyboard;
    rows.extend(keyboards::books_inline(&books, "book").inline_keyboard);
    let back = match category.parent_id {
        Some(parent) => format!("cat:{parent}"),
        None => "home".to_string(),
    };
    rows.push(vec![InlineKeyboardButton::callback(tr("browse-back-button"), back)]);

    let mut args = FluentArgs::new();
    args.set("name", category.name.as_str());
    bot.send_message(chat_id, tr_args("browse-category-header", &args))
        .reply_markup(ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows)))
        .await?;
    Ok(())
}

fn book_caption(book: &Book) -> String {
    let size = format_file_size(book.file_size);
    let mut args = FluentArgs::new();
    args.set("title", book.title.as_str());
    args.set("author", book.author.as_str());
    args.set("size", size.as_str());
    let mut caption = tr_args("book-caption", &args);

    if let Some(narrator) = &book.narrator {
        let mut args = FluentArgs::new();
        args.set("narrator", narrator.as_str());
        caption.push('\n');
        caption.push_str(&tr_args("book-caption-narrator", &args));
    }
    if book.duration.is_some() {
        let duration = format_duration(book.duration);
        let mut args = FluentArgs::new();
        args.set("duration", duration.as_str());
        caption.push('\n');
        caption.push_str(&tr_args("book-caption-duration", &args));
    }
    caption
}

/// Re-sends the stored Telegram file for a book, with a metadata caption.
async fn send_book(
    bot: &Bot,
    deps: &HandlerDeps,
    chat_id: ChatId,
    book_id: i64,
) -> Result<(), HandlerError> {
    let book = {
        let conn = get_connection(&deps.db_pool)?;
        catalog::get_book(&conn, book_id)?
    };
    let Some(book) = book else {
        bot.send_message(chat_id, tr("book-stale")).await?;
        return Ok(());
    };

    record(deps, "book");
    let caption = book_caption(&book);
    let file = InputFile::file_id(FileId(book.file_id.clone()));
    if book.duration.is_some() {
        bot.send_audio(chat_id, file).caption(caption).await?;
    } else {
        bot.send_document(chat_id, file).caption(caption).await?;
    }
    Ok(())
}

async fn send_stats(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) -> Result<(), HandlerError> {
    let conn = get_connection(&deps.db_pool)?;
    let users = db::count_users(&conn)?;
    let categories = catalog::count_categories(&conn)?;
    let books = catalog::count_books(&conn)?;
    // The stats table is created best-effort at startup; treat a missing
    // table as zero counters instead of failing the screen
    let usage = stats::usage_summary(&conn).unwrap_or(stats::UsageSummary {
        total_requests: 0,
        requests_today: 0,
    });

    let mut args = FluentArgs::new();
    args.set("users", users);
    args.set("categories", categories);
    args.set("books", books);
    args.set("total", usage.total_requests);
    args.set("today", usage.requests_today);
    bot.send_message(chat_id, tr_args("stats-text", &args))
        .reply_markup(ReplyMarkup::Keyboard(keyboards::admin_menu()))
        .await?;
    Ok(())
}

/// Renders the admin list: configured super-admins first, then the admins
/// granted through the bot. A super-admin who also has an admins row is
/// listed once, with the higher badge.
fn admin_list_text(conn: &rusqlite::Connection, super_admins: &[i64]) -> rusqlite::Result<String> {
    let admins = db::get_all_admins(conn)?;
    if super_admins.is_empty() && admins.is_empty() {
        return Ok(tr("admin-list-empty"));
    }

    let mut lines = vec![tr("admin-list-header")];
    for &telegram_id in super_admins {
        let name = db::get_user_by_telegram_id(conn, telegram_id)?
            .and_then(|user| user.username)
            .unwrap_or_else(|| telegram_id.to_string());
        let id = telegram_id.to_string();
        let mut args = FluentArgs::new();
        args.set("name", name.as_str());
        args.set("id", id.as_str());
        lines.push(tr_args("admin-list-item-super", &args));
    }
    for admin in &admins {
        if super_admins.contains(&admin.telegram_id) {
            continue;
        }
        let name = admin
            .name
            .clone()
            .unwrap_or_else(|| admin.telegram_id.to_string());
        let id = admin.telegram_id.to_string();
        let mut args = FluentArgs::new();
        args.set("name", name.as_str());
        args.set("id", id.as_str());
        lines.push(tr_args("admin-list-item", &args));
    }
    Ok(lines.join("\n"))
}

async fn send_admin_list(bot: &Bot, deps: &HandlerDeps, chat_id: ChatId) -> Result<(), HandlerError> {
    let text = {
        let conn = get_connection(&deps.db_pool)?;
        admin_list_text(&conn, &deps.super_admins)?
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}
