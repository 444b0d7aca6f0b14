//! Multi-step admin and user dialogs.
//!
//! Every dialog is a small state machine. Steps validate one piece of input
//! and either stay in place, advance with the collected data carried inside
//! the next state, or finish. Database writes happen only in the final step
//! of a dialog, so a cancelled or abandoned dialog leaves no trace.

pub mod admin;
pub mod book;
pub mod category;
pub mod search;

use rusqlite::Result;
use teloxide::types::{InlineKeyboardMarkup, KeyboardMarkup, ReplyMarkup};

use crate::storage::catalog::BookField;

/// Telegram file reference collected by the add-book dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub file_id: String,
    pub file_size: Option<u64>,
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddCategoryState {
    WaitingForParent,
    WaitingForName { parent_id: Option<i64> },
    WaitingForDescription { parent_id: Option<i64>, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCategoryState {
    WaitingForTarget,
    WaitingForName { category_id: i64 },
    WaitingForDescription { category_id: i64, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteCategoryState {
    WaitingForTarget,
    WaitingForConfirm { category_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddBookState {
    WaitingForCategory,
    WaitingForSubcategory {
        category_id: i64,
    },
    WaitingForFile {
        category_id: i64,
    },
    WaitingForTitle {
        category_id: i64,
        file: FileRef,
    },
    WaitingForAuthor {
        category_id: i64,
        file: FileRef,
        title: String,
    },
    WaitingForNarrator {
        category_id: i64,
        file: FileRef,
        title: String,
        author: String,
    },
    WaitingForDescription {
        category_id: i64,
        file: FileRef,
        title: String,
        author: String,
        narrator: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditBookState {
    WaitingForCategory,
    WaitingForBook { category_id: i64 },
    WaitingForField { book_id: i64 },
    WaitingForValue { book_id: i64, field: BookField },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteBookState {
    WaitingForCategory,
    WaitingForBook { category_id: i64 },
    WaitingForConfirm { book_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    WaitingForQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddAdminState {
    WaitingForId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveAdminState {
    WaitingForId,
}

/// The state of a chat's active dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    AddCategory(AddCategoryState),
    EditCategory(EditCategoryState),
    DeleteCategory(DeleteCategoryState),
    AddBook(AddBookState),
    EditBook(EditBookState),
    DeleteBook(DeleteBookState),
    Search(SearchState),
    AddAdmin(AddAdminState),
    RemoveAdmin(RemoveAdminState),
}

/// Outgoing message produced by a dialog step.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, markup: KeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            markup: Some(ReplyMarkup::Keyboard(markup)),
        }
    }

    pub fn with_inline(text: impl Into<String>, markup: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            markup: Some(ReplyMarkup::InlineKeyboard(markup)),
        }
    }
}

/// What a dialog step decided.
///
/// `Stay` re-prompts without changing state, `Advance` carries the next
/// state, `Finish` and `Cancelled` both end the dialog; only `Finish` may
/// have written to the database. `Ignored` means the update does not belong
/// to the current step (for example a stray button press) and nothing is
/// sent.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Stay { reply: Reply },
    Advance { next: DialogState, reply: Reply },
    Finish { reply: Reply },
    Cancelled { reply: Reply },
    Ignored,
}

/// Trimmed text, or None when the input is blank.
pub(crate) fn non_empty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parses a digits-only Telegram ID. Rejects signs, spaces and usernames.
pub(crate) fn parse_telegram_id(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Splits callback data `prefix:payload` and returns the payload when the
/// prefix matches.
pub(crate) fn callback_payload<'a>(data: &'a str, prefix: &str) -> Option<&'a str> {
    data.strip_prefix(prefix)?.strip_prefix(':')
}

pub(crate) fn ignored() -> Result<StepOutcome> {
    Ok(StepOutcome::Ignored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_id_is_digits_only() {
        assert_eq!(parse_telegram_id("123456"), Some(123456));
        assert_eq!(parse_telegram_id("  42  "), Some(42));
        assert_eq!(parse_telegram_id("-5"), None);
        assert_eq!(parse_telegram_id("12a4"), None);
        assert_eq!(parse_telegram_id("@username"), None);
        assert_eq!(parse_telegram_id(""), None);
    }

    #[test]
    fn blank_text_rejected() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" kitob "), Some("kitob"));
    }

    #[test]
    fn callback_payload_requires_prefix() {
        assert_eq!(callback_payload("delcat:7", "delcat"), Some("7"));
        assert_eq!(callback_payload("delcat_confirm:yes", "delcat"), None);
        assert_eq!(callback_payload("other:7", "delcat"), None);
    }
}
