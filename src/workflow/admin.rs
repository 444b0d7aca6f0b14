//! Admin role dialogs, available to super-admins only.
//!
//! Both dialogs ask for a bare numeric Telegram ID. A malformed ID keeps
//! the dialog open for another try; an unknown user ends it, since the
//! target has to talk to the bot first before it can be promoted.

use fluent_templates::fluent_bundle::FluentArgs;
use rusqlite::{Connection, Result};

use crate::i18n::{tr, tr_args};
use crate::storage::db;
use crate::telegram::keyboards;

use super::{parse_telegram_id, AddAdminState, DialogState, Reply, RemoveAdminState, StepOutcome};

fn finish(key: &str) -> StepOutcome {
    StepOutcome::Finish {
        reply: Reply::with_keyboard(tr(key), keyboards::admin_management_menu()),
    }
}

/// Starts the add-admin dialog.
pub fn start_add() -> StepOutcome {
    StepOutcome::Advance {
        next: DialogState::AddAdmin(AddAdminState::WaitingForId),
        reply: Reply::with_keyboard(tr("admin-add-prompt"), keyboards::cancel_keyboard()),
    }
}

/// Starts the remove-admin dialog.
pub fn start_remove() -> StepOutcome {
    StepOutcome::Advance {
        next: DialogState::RemoveAdmin(RemoveAdminState::WaitingForId),
        reply: Reply::with_keyboard(tr("admin-remove-prompt"), keyboards::cancel_keyboard()),
    }
}

pub fn handle_add_text(conn: &Connection, super_admins: &[i64], text: &str) -> Result<StepOutcome> {
    let Some(telegram_id) = parse_telegram_id(text) else {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("admin-id-invalid")),
        });
    };

    if super_admins.contains(&telegram_id) {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("admin-already")),
        });
    }

    let Some(user) = db::get_user_by_telegram_id(conn, telegram_id)? else {
        return Ok(finish("admin-user-not-found"));
    };
    if db::is_admin(conn, user.id)? {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("admin-already")),
        });
    }

    let name = user
        .username
        .clone()
        .unwrap_or_else(|| telegram_id.to_string());
    db::add_admin(conn, user.id, user.username.as_deref())?;

    let mut args = FluentArgs::new();
    args.set("name", name.as_str());
    Ok(StepOutcome::Finish {
        reply: Reply::with_keyboard(
            tr_args("admin-added", &args),
            keyboards::admin_management_menu(),
        ),
    })
}

pub fn handle_remove_text(
    conn: &Connection,
    super_admins: &[i64],
    text: &str,
) -> Result<StepOutcome> {
    let Some(telegram_id) = parse_telegram_id(text) else {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("admin-id-invalid")),
        });
    };

    if super_admins.contains(&telegram_id) {
        return Ok(finish("admin-super-immutable"));
    }

    let Some(user) = db::get_user_by_telegram_id(conn, telegram_id)? else {
        return Ok(finish("admin-user-not-found"));
    };
    if db::remove_admin(conn, user.id)? {
        Ok(finish("admin-removed"))
    } else {
        Ok(finish("admin-not-admin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{add_admin, get_all_admins, get_or_create_user, is_admin};
    use crate::storage::migrations::run_migrations_for_test;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations_for_test(&mut conn).expect("run migrations");
        conn
    }

    #[test]
    fn malformed_id_keeps_dialog_open() {
        let conn = test_conn();
        for input in ["@olim", "12a4", "-5", ""] {
            let outcome = handle_add_text(&conn, &[], input).unwrap();
            assert!(matches!(outcome, StepOutcome::Stay { .. }), "input {input:?}");
        }
        assert!(get_all_admins(&conn).unwrap().is_empty());
    }

    #[test]
    fn unknown_user_ends_dialog() {
        let conn = test_conn();
        let outcome = handle_add_text(&conn, &[], "424242").unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
        assert!(get_all_admins(&conn).unwrap().is_empty());
    }

    #[test]
    fn promotion_happy_path() {
        let conn = test_conn();
        let user = get_or_create_user(&conn, 424242, Some("olim")).unwrap();

        let outcome = handle_add_text(&conn, &[], "424242").unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
        assert!(is_admin(&conn, user.id).unwrap());
    }

    #[test]
    fn already_admin_stays_for_another_id() {
        let conn = test_conn();
        let user = get_or_create_user(&conn, 424242, Some("olim")).unwrap();
        add_admin(&conn, user.id, Some("olim")).unwrap();

        let outcome = handle_add_text(&conn, &[], "424242").unwrap();
        assert!(matches!(outcome, StepOutcome::Stay { .. }));
        assert_eq!(get_all_admins(&conn).unwrap().len(), 1);
    }

    #[test]
    fn super_admin_cannot_be_removed() {
        let conn = test_conn();
        get_or_create_user(&conn, 777, Some("bosh")).unwrap();

        let outcome = handle_remove_text(&conn, &[777], "777").unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
    }

    #[test]
    fn demotion_happy_path() {
        let conn = test_conn();
        let user = get_or_create_user(&conn, 424242, Some("olim")).unwrap();
        add_admin(&conn, user.id, Some("olim")).unwrap();

        let outcome = handle_remove_text(&conn, &[], "424242").unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
        assert!(!is_admin(&conn, user.id).unwrap());

        let outcome = handle_remove_text(&conn, &[], "424242").unwrap();
        assert!(matches!(outcome, StepOutcome::Finish { .. }));
    }
}
