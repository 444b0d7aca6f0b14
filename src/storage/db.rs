use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, Result};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// A registered bot user.
///
/// Users are created on first interaction and never deleted. The internal
/// `id` is what the admins table references; `telegram_id` is what updates
/// carry.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
}

/// An admin row joined with the owning user, for listings.
#[derive(Debug, Clone)]
pub struct AdminInfo {
    pub user_id: i64,
    pub telegram_id: i64,
    pub name: Option<String>,
}

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections. Every
/// connection gets a busy timeout so concurrent writers wait for the
/// SQLite lock instead of failing mid-operation. Schema migrations are run
/// separately at startup so that a migration failure can be logged without
/// taking the bot down.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(std::time::Duration::from_secs(30)));
    Pool::builder().max_size(10).build(manager)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Looks up a user by Telegram ID.
pub fn get_user_by_telegram_id(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, telegram_id, username FROM users WHERE telegram_id = ?1",
        [telegram_id],
        |row| {
            Ok(User {
                id: row.get(0)?,
                telegram_id: row.get(1)?,
                username: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Fetches the user for a Telegram ID, inserting a fresh row on first
/// contact. The stored username is refreshed when Telegram reports a new
/// one.
pub fn get_or_create_user(conn: &Connection, telegram_id: i64, username: Option<&str>) -> Result<User> {
    if let Some(user) = get_user_by_telegram_id(conn, telegram_id)? {
        if let Some(name) = username {
            if user.username.as_deref() != Some(name) {
                conn.execute(
                    "UPDATE users SET username = ?1 WHERE id = ?2",
                    rusqlite::params![name, user.id],
                )?;
                return Ok(User {
                    username: Some(name.to_string()),
                    ..user
                });
            }
        }
        return Ok(user);
    }

    conn.execute(
        "INSERT INTO users (telegram_id, username) VALUES (?1, ?2)",
        rusqlite::params![telegram_id, username],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        telegram_id,
        username: username.map(|s| s.to_string()),
    })
}

/// Checks whether the internal user id has an admin record.
pub fn is_admin(conn: &Connection, user_id: i64) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admins WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Grants the admin role by inserting an admin record.
pub fn add_admin(conn: &Connection, user_id: i64, name: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO admins (user_id, name) VALUES (?1, ?2)",
        rusqlite::params![user_id, name],
    )?;
    Ok(())
}

/// Revokes the admin role. Returns true when a record was actually removed.
pub fn remove_admin(conn: &Connection, user_id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM admins WHERE user_id = ?1", [user_id])?;
    Ok(affected > 0)
}

/// Lists all persisted admins joined with their user rows.
pub fn get_all_admins(conn: &Connection) -> Result<Vec<AdminInfo>> {
    let mut stmt = conn.prepare(
        "SELECT a.user_id, u.telegram_id, a.name
         FROM admins a JOIN users u ON u.id = a.user_id
         ORDER BY a.created_at",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(AdminInfo {
            user_id: row.get(0)?,
            telegram_id: row.get(1)?,
            name: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Total number of registered users.
pub fn count_users(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
