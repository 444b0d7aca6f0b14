//! Category management dialogs: add, edit and delete.
//!
//! Deleting a category takes the whole subtree and every book inside it,
//! which is why it goes through an explicit confirmation step.

use fluent_templates::fluent_bundle::FluentArgs;
use rusqlite::{Connection, Result};

use crate::core::config;
use crate::i18n::{tr, tr_args};
use crate::storage::catalog;
use crate::telegram::keyboards;

use super::{
    callback_payload, ignored, non_empty, AddCategoryState, DeleteCategoryState, DialogState,
    EditCategoryState, Reply, StepOutcome,
};

pub const CB_ADD_PARENT: &str = "addcat_parent";
pub const CB_EDIT_TARGET: &str = "editcat";
pub const CB_DELETE_TARGET: &str = "delcat";
pub const CB_DELETE_CONFIRM: &str = "delcat_confirm";

fn name_prompt() -> Reply {
    Reply::with_keyboard(tr("category-prompt-name"), keyboards::cancel_keyboard())
}

fn description_prompt() -> Reply {
    Reply::with_keyboard(tr("category-prompt-description"), keyboards::skip_keyboard())
}

fn validated_name(text: &str) -> std::result::Result<&str, Reply> {
    let Some(name) = non_empty(text) else {
        return Err(Reply::text(tr("category-name-empty")));
    };
    if name.chars().count() > config::validation::MAX_NAME_LENGTH {
        return Err(Reply::text(tr("category-name-too-long")));
    }
    Ok(name)
}

fn description_from(text: &str) -> String {
    if text.trim() == keyboards::BTN_SKIP {
        String::new()
    } else {
        text.trim().to_string()
    }
}

/// Starts the add-category dialog. With an empty catalog the parent picker
/// is skipped and the new category becomes top-level.
pub fn start_add(conn: &Connection) -> Result<StepOutcome> {
    let categories = catalog::get_all_categories(conn)?;
    if categories.is_empty() {
        return Ok(StepOutcome::Advance {
            next: DialogState::AddCategory(AddCategoryState::WaitingForName { parent_id: None }),
            reply: name_prompt(),
        });
    }

    let keyboard = keyboards::categories_inline(&categories, CB_ADD_PARENT).append_row(vec![
        teloxide::types::InlineKeyboardButton::callback(
            tr("category-add-root-button"),
            format!("{CB_ADD_PARENT}:none"),
        ),
    ]);
    Ok(StepOutcome::Advance {
        next: DialogState::AddCategory(AddCategoryState::WaitingForParent),
        reply: Reply::with_inline(tr("category-add-choose-parent"), keyboard),
    })
}

pub fn handle_add_callback(
    conn: &Connection,
    state: &AddCategoryState,
    data: &str,
) -> Result<StepOutcome> {
    let AddCategoryState::WaitingForParent = state else {
        return ignored();
    };
    let Some(payload) = callback_payload(data, CB_ADD_PARENT) else {
        return ignored();
    };

    let parent_id = if payload == "none" {
        None
    } else {
        let Ok(id) = payload.parse::<i64>() else {
            return ignored();
        };
        if catalog::get_category(conn, id)?.is_none() {
            return Ok(StepOutcome::Stay {
                reply: Reply::text(tr("category-stale")),
            });
        }
        Some(id)
    };

    Ok(StepOutcome::Advance {
        next: DialogState::AddCategory(AddCategoryState::WaitingForName { parent_id }),
        reply: name_prompt(),
    })
}

pub fn handle_add_text(
    conn: &Connection,
    state: &AddCategoryState,
    text: &str,
) -> Result<StepOutcome> {
    match state {
        AddCategoryState::WaitingForParent => ignored(),
        AddCategoryState::WaitingForName { parent_id } => {
            let name = match validated_name(text) {
                Ok(name) => name.to_string(),
                Err(reply) => return Ok(StepOutcome::Stay { reply }),
            };
            Ok(StepOutcome::Advance {
                next: DialogState::AddCategory(AddCategoryState::WaitingForDescription {
                    parent_id: *parent_id,
                    name,
                }),
                reply: description_prompt(),
            })
        }
        AddCategoryState::WaitingForDescription { parent_id, name } => {
            let description = description_from(text);
            catalog::create_category(conn, name, &description, *parent_id)?;

            let mut args = FluentArgs::new();
            args.set("name", name.as_str());
            Ok(StepOutcome::Finish {
                reply: Reply::with_keyboard(
                    tr_args("category-created", &args),
                    keyboards::category_menu(),
                ),
            })
        }
    }
}

/// Starts the edit-category dialog with a category picker.
pub fn start_edit(conn: &Connection) -> Result<StepOutcome> {
    let categories = catalog::get_all_categories(conn)?;
    if categories.is_empty() {
        return Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(tr("category-none"), keyboards::category_menu()),
        });
    }
    Ok(StepOutcome::Advance {
        next: DialogState::EditCategory(EditCategoryState::WaitingForTarget),
        reply: Reply::with_inline(
            tr("category-pick"),
            keyboards::categories_inline(&categories, CB_EDIT_TARGET),
        ),
    })
}

pub fn handle_edit_callback(
    conn: &Connection,
    state: &EditCategoryState,
    data: &str,
) -> Result<StepOutcome> {
    let EditCategoryState::WaitingForTarget = state else {
        return ignored();
    };
    let Some(id) = callback_payload(data, CB_EDIT_TARGET).and_then(|p| p.parse::<i64>().ok())
    else {
        return ignored();
    };

    if catalog::get_category(conn, id)?.is_none() {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("category-stale")),
        });
    }
    Ok(StepOutcome::Advance {
        next: DialogState::EditCategory(EditCategoryState::WaitingForName { category_id: id }),
        reply: name_prompt(),
    })
}

pub fn handle_edit_text(
    conn: &Connection,
    state: &EditCategoryState,
    text: &str,
) -> Result<StepOutcome> {
    match state {
        EditCategoryState::WaitingForTarget => ignored(),
        EditCategoryState::WaitingForName { category_id } => {
            let name = match validated_name(text) {
                Ok(name) => name.to_string(),
                Err(reply) => return Ok(StepOutcome::Stay { reply }),
            };
            Ok(StepOutcome::Advance {
                next: DialogState::EditCategory(EditCategoryState::WaitingForDescription {
                    category_id: *category_id,
                    name,
                }),
                reply: description_prompt(),
            })
        }
        EditCategoryState::WaitingForDescription { category_id, name } => {
            // Skip keeps the old description, unlike add where it means empty
            let description = if text.trim() == keyboards::BTN_SKIP {
                match catalog::get_category(conn, *category_id)? {
                    Some(category) => category.description,
                    None => {
                        return Ok(StepOutcome::Finish {
                            reply: Reply::with_keyboard(
                                tr("category-stale"),
                                keyboards::category_menu(),
                            ),
                        })
                    }
                }
            } else {
                text.trim().to_string()
            };
            let updated = catalog::update_category(conn, *category_id, name, &description)?;
            let key = if updated { "category-updated" } else { "category-stale" };
            Ok(StepOutcome::Finish {
                reply: Reply::with_keyboard(tr(key), keyboards::category_menu()),
            })
        }
    }
}

/// Starts the delete-category dialog with a category picker.
pub fn start_delete(conn: &Connection) -> Result<StepOutcome> {
    let categories = catalog::get_all_categories(conn)?;
    if categories.is_empty() {
        return Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(tr("category-none"), keyboards::category_menu()),
        });
    }
    Ok(StepOutcome::Advance {
        next: DialogState::DeleteCategory(DeleteCategoryState::WaitingForTarget),
        reply: Reply::with_inline(
            tr("category-pick"),
            keyboards::categories_inline(&categories, CB_DELETE_TARGET),
        ),
    })
}

pub fn handle_delete_callback(
    conn: &Connection,
    state: &DeleteCategoryState,
    data: &str,
) -> Result<StepOutcome> {
    match state {
        DeleteCategoryState::WaitingForTarget => {
            let Some(id) =
                callback_payload(data, CB_DELETE_TARGET).and_then(|p| p.parse::<i64>().ok())
            else {
                return ignored();
            };
            let Some(category) = catalog::get_category(conn, id)? else {
                return Ok(StepOutcome::Stay {
                    reply: Reply::text(tr("category-stale")),
                });
            };

            let mut args = FluentArgs::new();
            args.set("name", category.name.as_str());
            Ok(StepOutcome::Advance {
                next: DialogState::DeleteCategory(DeleteCategoryState::WaitingForConfirm {
                    category_id: id,
                }),
                reply: Reply::with_inline(
                    tr_args("category-delete-confirm", &args),
                    keyboards::confirm_inline(CB_DELETE_CONFIRM),
                ),
            })
        }
        DeleteCategoryState::WaitingForConfirm { category_id } => {
            let Some(payload) = callback_payload(data, CB_DELETE_CONFIRM) else {
                return ignored();
            };
            match payload {
                "yes" => {
                    let removed = catalog::delete_category_tree(conn, *category_id)?;
                    if removed == 0 {
                        return Ok(StepOutcome::Finish {
                            reply: Reply::with_keyboard(
                                tr("category-stale"),
                                keyboards::category_menu(),
                            ),
                        });
                    }
                    let mut args = FluentArgs::new();
                    args.set("count", removed as i64);
                    Ok(StepOutcome::Finish {
                        reply: Reply::with_keyboard(
                            tr_args("category-deleted", &args),
                            keyboards::category_menu(),
                        ),
                    })
                }
                "no" => Ok(StepOutcome::Cancelled {
                    reply: Reply::with_keyboard(tr("cancelled"), keyboards::category_menu()),
                }),
                _ => ignored(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::run_migrations_for_test;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations_for_test(&mut conn).expect("run migrations");
        conn
    }

    #[test]
    fn empty_catalog_skips_parent_step() {
        let conn = test_conn();
        let outcome = start_add(&conn).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Advance {
                next: DialogState::AddCategory(AddCategoryState::WaitingForName { parent_id: None }),
                ..
            }
        ));
    }

    #[test]
    fn add_category_full_path() {
        let conn = test_conn();
        let root = catalog::create_category(&conn, "Adabiyot", "", None).unwrap();

        let state = AddCategoryState::WaitingForParent;
        let outcome =
            handle_add_callback(&conn, &state, &format!("{CB_ADD_PARENT}:{root}")).unwrap();
        let StepOutcome::Advance { next: DialogState::AddCategory(state), .. } = outcome else {
            panic!("expected advance, got {outcome:?}");
        };

        let outcome = handle_add_text(&conn, &state, "She'riyat").unwrap();
        let StepOutcome::Advance { next: DialogState::AddCategory(state), .. } = outcome else {
            panic!("expected advance, got {outcome:?}");
        };

        let outcome = handle_add_text(&conn, &state, keyboards::BTN_SKIP).unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));

        let children = catalog::get_child_categories(&conn, root).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "She'riyat");
        assert_eq!(children[0].description, "");
    }

    #[test]
    fn blank_name_stays_without_insert() {
        let conn = test_conn();
        let state = AddCategoryState::WaitingForName { parent_id: None };
        let outcome = handle_add_text(&conn, &state, "   ").unwrap();
        assert!(matches!(outcome, StepOutcome::Stay { .. }));
        assert_eq!(catalog::count_categories(&conn).unwrap(), 0);
    }

    #[test]
    fn stale_category_reported_on_pick() {
        let conn = test_conn();
        let state = EditCategoryState::WaitingForTarget;
        let outcome = handle_edit_callback(&conn, &state, &format!("{CB_EDIT_TARGET}:999")).unwrap();
        assert!(matches!(outcome, StepOutcome::Stay { .. }));
    }

    #[test]
    fn edit_skip_keeps_old_description() {
        let conn = test_conn();
        let id = catalog::create_category(&conn, "Adabiyot", "Eski tavsif", None).unwrap();

        let state = EditCategoryState::WaitingForDescription {
            category_id: id,
            name: "Mumtoz adabiyot".to_string(),
        };
        let outcome = handle_edit_text(&conn, &state, keyboards::BTN_SKIP).unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));

        let category = catalog::get_category(&conn, id).unwrap().unwrap();
        assert_eq!(category.name, "Mumtoz adabiyot");
        assert_eq!(category.description, "Eski tavsif");
    }

    #[test]
    fn delete_requires_confirmation() {
        let conn = test_conn();
        let root = catalog::create_category(&conn, "Adabiyot", "", None).unwrap();
        catalog::create_category(&conn, "She'riyat", "", Some(root)).unwrap();

        let state = DeleteCategoryState::WaitingForConfirm { category_id: root };
        let outcome =
            handle_delete_callback(&conn, &state, &format!("{CB_DELETE_CONFIRM}:no")).unwrap();
        assert!(matches!(outcome, StepOutcome::Cancelled { .. }));
        assert_eq!(catalog::count_categories(&conn).unwrap(), 2);

        let outcome =
            handle_delete_callback(&conn, &state, &format!("{CB_DELETE_CONFIRM}:yes")).unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
        assert_eq!(catalog::count_categories(&conn).unwrap(), 0);
    }
}
