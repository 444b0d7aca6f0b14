//! Catalog storage: the hierarchical category tree and the books inside it.
//!
//! Categories form a forest through `parent_id`; books always belong to
//! exactly one category. All mutation here happens from workflow finalize
//! steps — intermediate dialog steps never touch these tables.

use rusqlite::{Connection, OptionalExtension, Result};

/// A catalog category. `parent_id` is None for top-level categories.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub parent_id: Option<i64>,
}

/// A book entry. `file_id` is the Telegram file reference the bot re-sends
/// on request; `duration` is only present for audio books.
#[derive(Debug, Clone)]
pub struct Book {
    pub id: i64,
    pub category_id: i64,
    pub title: String,
    pub author: String,
    pub narrator: Option<String>,
    pub description: String,
    pub file_id: String,
    pub file_size: Option<u64>,
    pub duration: Option<u32>,
}

/// Insert payload for a new book, accumulated by the add-book workflow.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub category_id: i64,
    pub title: String,
    pub author: String,
    pub narrator: Option<String>,
    pub description: String,
    pub file_id: String,
    pub file_size: Option<u64>,
    pub duration: Option<u32>,
}

/// Which single column an edit-book workflow rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Description,
}

impl BookField {
    fn column(self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Description => "description",
        }
    }
}

fn category_from_row(row: &rusqlite::Row<'_>) -> Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

fn book_from_row(row: &rusqlite::Row<'_>) -> Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        category_id: row.get(1)?,
        title: row.get(2)?,
        author: row.get(3)?,
        narrator: row.get(4)?,
        description: row.get(5)?,
        file_id: row.get(6)?,
        file_size: row.get::<_, Option<i64>>(7)?.map(|v| v as u64),
        duration: row.get::<_, Option<i64>>(8)?.map(|v| v as u32),
    })
}

const CATEGORY_COLUMNS: &str = "id, name, description, parent_id";
const BOOK_COLUMNS: &str =
    "id, category_id, title, author, narrator, description, file_id, file_size, duration";

/// Inserts a new category and returns its id.
pub fn create_category(
    conn: &Connection,
    name: &str,
    description: &str,
    parent_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO categories (name, description, parent_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, description, parent_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches one category by id.
pub fn get_category(conn: &Connection, id: i64) -> Result<Option<Category>> {
    conn.query_row(
        &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
        [id],
        category_from_row,
    )
    .optional()
}

/// Top-level categories, ordered by name.
pub fn get_main_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id IS NULL ORDER BY name"
    ))?;
    let rows = stmt.query_map([], category_from_row)?;
    rows.collect()
}

/// Direct children of a category, ordered by name.
pub fn get_child_categories(conn: &Connection, parent_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id = ?1 ORDER BY name"
    ))?;
    let rows = stmt.query_map([parent_id], category_from_row)?;
    rows.collect()
}

/// All categories, ordered with top-level ones first. Used by admin pickers.
pub fn get_all_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY parent_id IS NOT NULL, name"
    ))?;
    let rows = stmt.query_map([], category_from_row)?;
    rows.collect()
}

/// Rewrites a category's name and description. Returns false when the
/// category no longer exists (stale reference at commit time).
pub fn update_category(conn: &Connection, id: i64, name: &str, description: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3",
        rusqlite::params![name, description, id],
    )?;
    Ok(affected > 0)
}

/// Deletes a category together with its whole subtree and every book in it.
///
/// Both deletes run in one transaction: either the whole subtree goes, books
/// included, or nothing does. Returns the number of deleted categories
/// (0 when the target was already gone).
pub fn delete_category_tree(conn: &Connection, id: i64) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let removed = delete_subtree(&tx, id)?;
    tx.commit()?;
    Ok(removed)
}

fn delete_subtree(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM books WHERE category_id IN (
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM categories WHERE id = ?1
                UNION ALL
                SELECT c.id FROM categories c JOIN subtree s ON c.parent_id = s.id
            )
            SELECT id FROM subtree
        )",
        [id],
    )?;
    conn.execute(
        "DELETE FROM categories WHERE id IN (
            WITH RECURSIVE subtree(id) AS (
                SELECT id FROM categories WHERE id = ?1
                UNION ALL
                SELECT c.id FROM categories c JOIN subtree s ON c.parent_id = s.id
            )
            SELECT id FROM subtree
        )",
        [id],
    )
}

/// Inserts a new book and returns its id.
pub fn create_book(conn: &Connection, book: &NewBook) -> Result<i64> {
    conn.execute(
        "INSERT INTO books (category_id, title, author, narrator, description, file_id, file_size, duration)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            book.category_id,
            book.title,
            book.author,
            book.narrator,
            book.description,
            book.file_id,
            book.file_size.map(|v| v as i64),
            book.duration.map(|v| v as i64),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches one book by id.
pub fn get_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        [id],
        book_from_row,
    )
    .optional()
}

/// Books directly inside a category, ordered by title.
pub fn get_books_by_category(conn: &Connection, category_id: i64) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE category_id = ?1 ORDER BY title"
    ))?;
    let rows = stmt.query_map([category_id], book_from_row)?;
    rows.collect()
}

/// Rewrites a single book column. Returns false on a stale reference.
pub fn update_book_field(conn: &Connection, id: i64, field: BookField, value: &str) -> Result<bool> {
    let affected = conn.execute(
        &format!("UPDATE books SET {} = ?1 WHERE id = ?2", field.column()),
        rusqlite::params![value, id],
    )?;
    Ok(affected > 0)
}

/// Deletes a book. Returns false when it was already gone.
pub fn delete_book(conn: &Connection, id: i64) -> Result<bool> {
    let affected = conn.execute("DELETE FROM books WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

/// Case-insensitive substring search over title and author.
pub fn search_books(conn: &Connection, query: &str, limit: usize) -> Result<Vec<Book>> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books
         WHERE title LIKE ?1 OR author LIKE ?1
         ORDER BY title LIMIT ?2"
    ))?;
    let rows = stmt.query_map(rusqlite::params![pattern, limit as i64], book_from_row)?;
    rows.collect()
}

/// Total number of categories.
pub fn count_categories(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
}

/// Total number of books.
pub fn count_books(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
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

    fn sample_book(category_id: i64, title: &str) -> NewBook {
        NewBook {
            category_id,
            title: title.to_string(),
            author: "Abdulla Qodiriy".to_string(),
            narrator: None,
            description: String::new(),
            file_id: "file-abc".to_string(),
            file_size: Some(1024),
            duration: None,
        }
    }

    #[test]
    fn category_tree_queries() {
        let conn = test_conn();
        let root = create_category(&conn, "Adabiyot", "", None).unwrap();
        let child = create_category(&conn, "She'riyat", "", Some(root)).unwrap();

        assert_eq!(get_main_categories(&conn).unwrap().len(), 1);
        let children = get_child_categories(&conn, root).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child);
        assert_eq!(get_all_categories(&conn).unwrap().len(), 2);
    }

    #[test]
    fn delete_category_removes_subtree_and_books() {
        let conn = test_conn();
        let root = create_category(&conn, "Adabiyot", "", None).unwrap();
        let child = create_category(&conn, "She'riyat", "", Some(root)).unwrap();
        create_book(&conn, &sample_book(child, "Devon")).unwrap();

        let removed = delete_category_tree(&conn, root).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(count_categories(&conn).unwrap(), 0);
        assert_eq!(count_books(&conn).unwrap(), 0);
    }

    #[test]
    fn subtree_delete_rolls_back_as_a_unit() {
        let conn = test_conn();
        let root = create_category(&conn, "Adabiyot", "", None).unwrap();
        let child = create_category(&conn, "She'riyat", "", Some(root)).unwrap();
        create_book(&conn, &sample_book(child, "Devon")).unwrap();

        // Run both deletes inside an uncommitted transaction and drop it:
        // books must come back together with their categories
        {
            let tx = conn.unchecked_transaction().unwrap();
            let removed = delete_subtree(&tx, root).unwrap();
            assert_eq!(removed, 2);
            assert_eq!(count_books(&tx).unwrap(), 0);
        }
        assert_eq!(count_categories(&conn).unwrap(), 2);
        assert_eq!(count_books(&conn).unwrap(), 1);
    }

    #[test]
    fn update_book_single_field() {
        let conn = test_conn();
        let cat = create_category(&conn, "Nasr", "", None).unwrap();
        let id = create_book(&conn, &sample_book(cat, "O'tkan kunlar")).unwrap();

        assert!(update_book_field(&conn, id, BookField::Author, "A. Qodiriy").unwrap());
        let book = get_book(&conn, id).unwrap().unwrap();
        assert_eq!(book.author, "A. Qodiriy");

        // Stale id reports false instead of erroring
        assert!(!update_book_field(&conn, 9999, BookField::Title, "x").unwrap());
    }

    #[test]
    fn search_matches_title_and_author() {
        let conn = test_conn();
        let cat = create_category(&conn, "Nasr", "", None).unwrap();
        create_book(&conn, &sample_book(cat, "O'tkan kunlar")).unwrap();
        create_book(&conn, &sample_book(cat, "Mehrobdan chayon")).unwrap();

        assert_eq!(search_books(&conn, "kunlar", 20).unwrap().len(), 1);
        assert_eq!(search_books(&conn, "Qodiriy", 20).unwrap().len(), 2);
        assert!(search_books(&conn, "yo'q kitob", 20).unwrap().is_empty());
    }
}
