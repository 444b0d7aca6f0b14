//! Search dialog: one question, one answer.

use fluent_templates::fluent_bundle::FluentArgs;
use rusqlite::{Connection, Result};

use crate::i18n::{tr, tr_args};
use crate::storage::catalog;
use crate::telegram::keyboards;

use super::{non_empty, DialogState, Reply, SearchState, StepOutcome};

/// Prefix for result buttons; payloads are book ids, handled by the catalog
/// browser.
pub const CB_RESULT: &str = "book";

const MAX_RESULTS: usize = 20;

/// Starts the search dialog.
pub fn start() -> StepOutcome {
    StepOutcome::Advance {
        next: DialogState::Search(SearchState::WaitingForQuery),
        reply: Reply::with_keyboard(tr("search-prompt"), keyboards::cancel_keyboard()),
    }
}

pub fn handle_text(conn: &Connection, text: &str) -> Result<StepOutcome> {
    let Some(query) = non_empty(text) else {
        return Ok(StepOutcome::Stay {
            reply: Reply::text(tr("search-query-empty")),
        });
    };

    let books = catalog::search_books(conn, query, MAX_RESULTS)?;
    let mut args = FluentArgs::new();
    args.set("query", query);

    if books.is_empty() {
        return Ok(StepOutcome::Finish {
            reply: Reply::with_keyboard(
                tr_args("search-no-results", &args),
                keyboards::user_menu(),
            ),
        });
    }

    Ok(StepOutcome::Finish {
        reply: Reply::with_inline(
            tr_args("search-results-header", &args),
            keyboards::books_inline(&books, CB_RESULT),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::catalog::NewBook;
    use crate::storage::migrations::run_migrations_for_test;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations_for_test(&mut conn).expect("run migrations");
        conn
    }

    #[test]
    fn blank_query_stays() {
        let conn = test_conn();
        let outcome = handle_text(&conn, "   ").unwrap();
        assert!(matches!(outcome, StepOutcome::Stay { .. }));
    }

    #[test]
    fn query_finishes_with_or_without_results() {
        let conn = test_conn();
        let cat = catalog::create_category(&conn, "Nasr", "", None).unwrap();
        catalog::create_book(
            &conn,
            &NewBook {
                category_id: cat,
                title: "O'tkan kunlar".to_string(),
                author: "Abdulla Qodiriy".to_string(),
                narrator: None,
                description: String::new(),
                file_id: "f".to_string(),
                file_size: None,
                duration: None,
            },
        )
        .unwrap();

        assert!(matches!(handle_text(&conn, "kunlar").unwrap(), StepOutcome::Finish { .. }));
        assert!(matches!(handle_text(&conn, "yo'q").unwrap(), StepOutcome::Finish { .. }));
    }
}
