//! Permission resolution.
//!
//! Roles are checked on every privileged update: the static super-admin
//! list from configuration first, then the persisted admins table. Nothing
//! here mutates state, so the check is safe to repeat at any point in a
//! dialog.

use rusqlite::Connection;

use crate::core::config;
use crate::storage::db;

/// Effective role of the user behind an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Anonymous,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Whether this role may open the admin panel and run admin workflows.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    /// Whether this role may manage other admins.
    pub fn is_super_admin(self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

/// Resolves the role for a Telegram ID against an explicit super-admin set.
///
/// Lookup order: static super-admin list, then the users table, then the
/// admins table keyed by internal user id. Unknown users are anonymous.
pub fn resolve_with(
    conn: &Connection,
    super_admins: &[i64],
    telegram_id: i64,
) -> rusqlite::Result<Role> {
    if super_admins.contains(&telegram_id) {
        return Ok(Role::SuperAdmin);
    }

    let Some(user) = db::get_user_by_telegram_id(conn, telegram_id)? else {
        return Ok(Role::Anonymous);
    };

    if db::is_admin(conn, user.id)? {
        Ok(Role::Admin)
    } else {
        Ok(Role::Anonymous)
    }
}

/// Resolves the role using the configured super-admin list.
pub fn resolve(conn: &Connection, telegram_id: i64) -> rusqlite::Result<Role> {
    resolve_with(conn, &config::admin::SUPER_ADMIN_IDS, telegram_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::{add_admin, get_or_create_user};
    use crate::storage::migrations::run_migrations_for_test;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations_for_test(&mut conn).expect("run migrations");
        conn
    }

    #[test]
    fn unknown_user_is_anonymous() {
        let conn = test_conn();
        assert_eq!(resolve_with(&conn, &[], 555).unwrap(), Role::Anonymous);
    }

    #[test]
    fn registered_non_admin_is_anonymous() {
        let conn = test_conn();
        get_or_create_user(&conn, 555, Some("oddiy")).unwrap();
        assert_eq!(resolve_with(&conn, &[], 555).unwrap(), Role::Anonymous);
    }

    #[test]
    fn admin_record_grants_admin() {
        let conn = test_conn();
        let user = get_or_create_user(&conn, 555, Some("olim")).unwrap();
        add_admin(&conn, user.id, Some("olim")).unwrap();
        assert_eq!(resolve_with(&conn, &[], 555).unwrap(), Role::Admin);
    }

    #[test]
    fn static_list_wins_without_db_row() {
        let conn = test_conn();
        // Not even registered: the static list alone grants super-admin
        assert_eq!(resolve_with(&conn, &[777], 777).unwrap(), Role::SuperAdmin);
    }
}
