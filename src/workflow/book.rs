//! Book management dialogs: add, edit a single field, delete.
//!
//! The add dialog accumulates everything in state and inserts the book only
//! at the very last step. The file must arrive before the metadata so an
//! abandoned upload never leaves a half-filled row.

use fluent_templates::fluent_bundle::FluentArgs;
use rusqlite::{Connection, Result};

use crate::i18n::{tr, tr_args};
use crate::storage::catalog::{self, BookField, NewBook};
use crate::telegram::keyboards;

use super::{
    callback_payload, ignored, non_empty, AddBookState, DeleteBookState, DialogState,
    EditBookState, FileRef, Reply, StepOutcome,
};

pub const CB_ADD_CATEGORY: &str = "addbook_cat";
pub const CB_ADD_SUBCATEGORY: &str = "addbook_sub";
pub const CB_EDIT_CATEGORY: &str = "editbook_cat";
pub const CB_EDIT_BOOK: &str = "editbook";
pub const CB_EDIT_FIELD: &str = "editbook_field";
pub const CB_DELETE_CATEGORY: &str = "delbook_cat";
pub const CB_DELETE_BOOK: &str = "delbook";
pub const CB_DELETE_CONFIRM: &str = "delbook_confirm";

fn file_prompt() -> Reply {
    Reply::with_keyboard(tr("book-prompt-file"), keyboards::cancel_keyboard())
}

fn text_prompt(key: &str) -> Reply {
    Reply::with_keyboard(tr(key), keyboards::cancel_keyboard())
}

fn optional_prompt(key: &str) -> Reply {
    Reply::with_keyboard(tr(key), keyboards::skip_keyboard())
}

fn required_text(text: &str) -> std::result::Result<String, Reply> {
    non_empty(text)
        .map(str::to_string)
        .ok_or_else(|| Reply::text(tr("category-name-empty")))
}

fn category_picker(conn: &Connection, prefix: &str) -> Result<Option<Reply>> {
    let categories = catalog::get_all_categories(conn)?;
    if categories.is_empty() {
        return Ok(None);
    }
    Ok(Some(Reply::with_inline(
        tr("book-add-choose-category"),
        keyboards::categories_inline(&categories, prefix),
    )))
}

/// Starts the add-book dialog with a category picker.
pub fn start_add(conn: &Connection) -> Result<StepOutcome> {
    match category_picker(conn, CB_ADD_CATEGORY)? {
        Some(reply) => Ok(StepOutcome::Advance {
            next: DialogState::AddBook(AddBookState::WaitingForCategory),
            reply,
        }),
        None => Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(tr("category-none"), keyboards::book_menu()),
        }),
    }
}

pub fn handle_add_callback(
    conn: &Connection,
    state: &AddBookState,
    data: &str,
) -> Result<StepOutcome> {
    match state {
        AddBookState::WaitingForCategory => {
            let Some(id) =
                callback_payload(data, CB_ADD_CATEGORY).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            if catalog::get_category(conn, id)?.is_none() {
                return Ok(StepOutcome::Stay {
                    reply: Reply::text(tr("category-stale")),
                });
            }

            let children = catalog::get_child_categories(conn, id)?;
            if children.is_empty() {
                return Ok(StepOutcome::Advance {
                    next: DialogState::AddBook(AddBookState::WaitingForFile { category_id: id }),
                    reply: file_prompt(),
                });
            }
            let keyboard = keyboards::categories_inline(&children, CB_ADD_SUBCATEGORY).append_row(
                vec![teloxide::types::InlineKeyboardButton::callback(
                    tr("book-add-here-button"),
                    format!("{CB_ADD_SUBCATEGORY}:self"),
                )],
            );
            Ok(StepOutcome::Advance {
                next: DialogState::AddBook(AddBookState::WaitingForSubcategory { category_id: id }),
                reply: Reply::with_inline(tr("book-add-choose-subcategory"), keyboard),
            })
        }
        AddBookState::WaitingForSubcategory { category_id } => {
            let Some(payload) = callback_payload(data, CB_ADD_SUBCATEGORY) else {
                return ignored();
            };
            let target = if payload == "self" {
                *category_id
            } else {
                let Ok(id) = payload.parse::<i64>() else {
                    return ignored();
                };
                if catalog::get_category(conn, id)?.is_none() {
                    return Ok(StepOutcome::Stay {
                        reply: Reply::text(tr("category-stale")),
                    });
                }
                id
            };
            Ok(StepOutcome::Advance {
                next: DialogState::AddBook(AddBookState::WaitingForFile { category_id: target }),
                reply: file_prompt(),
            })
        }
        _ => ignored(),
    }
}

/// Accepts the uploaded document or audio during the file step.
pub fn handle_add_file(state: &AddBookState, file: FileRef) -> Result<StepOutcome> {
    let AddBookState::WaitingForFile { category_id } = state else {
        return ignored();
    };
    Ok(StepOutcome::Advance {
        next: DialogState::AddBook(AddBookState::WaitingForTitle {
            category_id: *category_id,
            file,
        }),
        reply: text_prompt("book-prompt-title"),
    })
}

pub fn handle_add_text(
    conn: &Connection,
    state: &AddBookState,
    text: &str,
) -> Result<StepOutcome> {
    match state {
        AddBookState::WaitingForCategory | AddBookState::WaitingForSubcategory { .. } => ignored(),
        AddBookState::WaitingForFile { .. } => Ok(StepOutcome::Stay {
            reply: Reply::text(tr("book-file-invalid")),
        }),
        AddBookState::WaitingForTitle { category_id, file } => {
            let title = match required_text(text) {
                Ok(title) => title,
                Err(reply) => return Ok(StepOutcome::Stay { reply }),
            };
            Ok(StepOutcome::Advance {
                next: DialogState::AddBook(AddBookState::WaitingForAuthor {
                    category_id: *category_id,
                    file: file.clone(),
                    title,
                }),
                reply: text_prompt("book-prompt-author"),
            })
        }
        AddBookState::WaitingForAuthor { category_id, file, title } => {
            let author = match required_text(text) {
                Ok(author) => author,
                Err(reply) => return Ok(StepOutcome::Stay { reply }),
            };
            Ok(StepOutcome::Advance {
                next: DialogState::AddBook(AddBookState::WaitingForNarrator {
                    category_id: *category_id,
                    file: file.clone(),
                    title: title.clone(),
                    author,
                }),
                reply: optional_prompt("book-prompt-narrator"),
            })
        }
        AddBookState::WaitingForNarrator { category_id, file, title, author } => {
            let narrator = if text.trim() == keyboards::BTN_SKIP {
                None
            } else {
                Some(text.trim().to_string())
            };
            Ok(StepOutcome::Advance {
                next: DialogState::AddBook(AddBookState::WaitingForDescription {
                    category_id: *category_id,
                    file: file.clone(),
                    title: title.clone(),
                    author: author.clone(),
                    narrator,
                }),
                reply: optional_prompt("book-prompt-description"),
            })
        }
        AddBookState::WaitingForDescription { category_id, file, title, author, narrator } => {
            if catalog::get_category(conn, *category_id)?.is_none() {
                return Ok(StepOutcome::Finish {
                    reply: Reply::with_keyboard(tr("category-stale"), keyboards::book_menu()),
                });
            }

            let description = if text.trim() == keyboards::BTN_SKIP {
                String::new()
            } else {
                text.trim().to_string()
            };
            catalog::create_book(
                conn,
                &NewBook {
                    category_id: *category_id,
                    title: title.clone(),
                    author: author.clone(),
                    narrator: narrator.clone(),
                    description,
                    file_id: file.file_id.clone(),
                    file_size: file.file_size,
                    duration: file.duration,
                },
            )?;

            let mut args = FluentArgs::new();
            args.set("title", title.as_str());
            Ok(StepOutcome::Finish {
                reply: Reply::with_keyboard(tr_args("book-created", &args), keyboards::book_menu()),
            })
        }
    }
}

fn pick_book_in_category(
    conn: &Connection,
    category_id: i64,
    prefix: &str,
) -> Result<std::result::Result<Reply, Reply>> {
    let books = catalog::get_books_by_category(conn, category_id)?;
    if books.is_empty() {
        return Ok(Err(Reply::text(tr("book-none-in-category"))));
    }
    Ok(Ok(Reply::with_inline(
        tr("book-pick"),
        keyboards::books_inline(&books, prefix),
    )))
}

/// Starts the edit-book dialog with a category picker.
pub fn start_edit(conn: &Connection) -> Result<StepOutcome> {
    match category_picker(conn, CB_EDIT_CATEGORY)? {
        Some(reply) => Ok(StepOutcome::Advance {
            next: DialogState::EditBook(EditBookState::WaitingForCategory),
            reply,
        }),
        None => Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(tr("category-none"), keyboards::book_menu()),
        }),
    }
}

pub fn handle_edit_callback(
    conn: &Connection,
    state: &EditBookState,
    data: &str,
) -> Result<StepOutcome> {
    match state {
        EditBookState::WaitingForCategory => {
            let Some(id) =
                callback_payload(data, CB_EDIT_CATEGORY).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            match pick_book_in_category(conn, id, CB_EDIT_BOOK)? {
                Ok(reply) => Ok(StepOutcome::Advance {
                    next: DialogState::EditBook(EditBookState::WaitingForBook { category_id: id }),
                    reply,
                }),
                Err(reply) => Ok(StepOutcome::Stay { reply }),
            }
        }
        EditBookState::WaitingForBook { .. } => {
            let Some(id) = callback_payload(data, CB_EDIT_BOOK).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            if catalog::get_book(conn, id)?.is_none() {
                return Ok(StepOutcome::Stay {
                    reply: Reply::text(tr("book-stale")),
                });
            }
            Ok(StepOutcome::Advance {
                next: DialogState::EditBook(EditBookState::WaitingForField { book_id: id }),
                reply: Reply::with_inline(
                    tr("book-edit-choose-field"),
                    keyboards::book_fields_inline(CB_EDIT_FIELD),
                ),
            })
        }
        EditBookState::WaitingForField { book_id } => {
            let Some(payload) = callback_payload(data, CB_EDIT_FIELD) else {
                return ignored();
            };
            let field = match payload {
                "title" => BookField::Title,
                "author" => BookField::Author,
                "description" => BookField::Description,
                _ => return ignored(),
            };
            Ok(StepOutcome::Advance {
                next: DialogState::EditBook(EditBookState::WaitingForValue {
                    book_id: *book_id,
                    field,
                }),
                reply: text_prompt("book-edit-prompt-value"),
            })
        }
        EditBookState::WaitingForValue { .. } => ignored(),
    }
}

pub fn handle_edit_text(
    conn: &Connection,
    state: &EditBookState,
    text: &str,
) -> Result<StepOutcome> {
    let EditBookState::WaitingForValue { book_id, field } = state else {
        return ignored();
    };
    let value = match required_text(text) {
        Ok(value) => value,
        Err(reply) => return Ok(StepOutcome::Stay { reply }),
    };
    let updated = catalog::update_book_field(conn, *book_id, *field, &value)?;
    let key = if updated { "book-updated" } else { "book-stale" };
    Ok(StepOutcome::Finish {
        reply: Reply::with_keyboard(tr(key), keyboards::book_menu()),
    })
}

/// Starts the delete-book dialog with a category picker.
pub fn start_delete(conn: &Connection) -> Result<StepOutcome> {
    match category_picker(conn, CB_DELETE_CATEGORY)? {
        Some(reply) => Ok(StepOutcome::Advance {
            next: DialogState::DeleteBook(DeleteBookState::WaitingForCategory),
            reply,
        }),
        None => Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(tr("category-none"), keyboards::book_menu()),
        }),
    }
}

pub fn handle_delete_callback(
    conn: &Connection,
    state: &DeleteBookState,
    data: &str,
) -> Result<StepOutcome> {
    match state {
        DeleteBookState::WaitingForCategory => {
            let Some(id) =
                callback_payload(data, CB_DELETE_CATEGORY).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            match pick_book_in_category(conn, id, CB_DELETE_BOOK)? {
                Ok(reply) => Ok(StepOutcome::Advance {
                    next: DialogState::DeleteBook(DeleteBookState::WaitingForBook {
                        category_id: id,
                    }),
                    reply,
                }),
                Err(reply) => Ok(StepOutcome::Stay { reply }),
            }
        }
        DeleteBookState::WaitingForBook { .. } => {
            let Some(id) =
                callback_payload(data, CB_DELETE_BOOK).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            let Some(book) = catalog::get_book(conn, id)? else {
                return Ok(StepOutcome::Stay {
                    reply: Reply::text(tr("book-stale")),
                });
            };

            let mut args = FluentArgs::new();
            args.set("title", book.title.as_str());
            Ok(StepOutcome::Advance {
                next: DialogState::DeleteBook(DeleteBookState::WaitingForConfirm { book_id: id }),
                reply: Reply::with_inline(
                    tr_args("book-delete-confirm", &args),
                    keyboards::confirm_inline(CB_DELETE_CONFIRM),
                ),
            })
        }
        DeleteBookState::WaitingForConfirm { book_id } => {
            let Some(payload) = callback_payload(data, CB_DELETE_CONFIRM) else {
                return ignored();
            };
            match payload {
                "yes" => {
                    let removed = catalog::delete_book(conn, *book_id)?;
                    let key = if removed { "book-deleted" } else { "book-stale" };
                    Ok(StepOutcome::Finish {
                        reply: Reply::with_keyboard(tr(key), keyboards::book_menu()),
                    })
                }
                "no" => Ok(StepOutcome::Cancelled {
                    reply: Reply::with_keyboard(tr("cancelled"), keyboards::book_menu()),
                }),
                _ => ignored(),
            }
        }
    }
}
