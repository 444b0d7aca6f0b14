//! End-to-end dialog scenarios on an in-memory database.
//!
//! These tests drive the same step functions the dispatcher uses, applying
//! outcomes to a real session store the way the callback and text handlers
//! do.

use pretty_assertions::assert_eq;
use rusqlite::Connection;

use kitobxona::access::{resolve_with, Role};
use kitobxona::session::SessionStore;
use kitobxona::storage::catalog;
use kitobxona::storage::db::{add_admin, get_all_admins, get_or_create_user};
use kitobxona::storage::migrations::run_migrations_for_test;
use kitobxona::workflow::{
    admin, category, search, AddAdminState, AddCategoryState, DialogState, SearchState,
    StepOutcome,
};

const CHAT: i64 = 1001;

fn test_conn() -> Connection {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    run_migrations_for_test(&mut conn).expect("run migrations");
    conn
}

/// Applies a step outcome to the store the way the dispatcher does.
async fn apply(store: &SessionStore, outcome: StepOutcome) {
    match outcome {
        StepOutcome::Advance { next, .. } => store.advance(CHAT, next).await,
        StepOutcome::Finish { .. } | StepOutcome::Cancelled { .. } => store.finish(CHAT).await,
        StepOutcome::Stay { .. } | StepOutcome::Ignored => {}
    }
}

#[tokio::test]
async fn add_category_dialog_end_to_end() {
    let conn = test_conn();
    let store = SessionStore::with_ttl(None);

    // Empty catalog: the dialog opens directly on the name step
    let outcome = category::start_add(&conn).unwrap();
    let StepOutcome::Advance { next, .. } = outcome else {
        panic!("expected advance, got {outcome:?}");
    };
    store.start(CHAT, next).await;
    assert_eq!(
        store.get(CHAT).await,
        Some(DialogState::AddCategory(AddCategoryState::WaitingForName { parent_id: None }))
    );

    // Blank name: the dialog stays put and nothing is written
    let state = AddCategoryState::WaitingForName { parent_id: None };
    let outcome = category::handle_add_text(&conn, &state, "   ").unwrap();
    assert!(matches!(outcome, StepOutcome::Stay { .. }));
    apply(&store, outcome).await;
    assert_eq!(
        store.get(CHAT).await,
        Some(DialogState::AddCategory(AddCategoryState::WaitingForName { parent_id: None }))
    );
    assert_eq!(catalog::count_categories(&conn).unwrap(), 0);

    // Valid name, then a real description
    let outcome = category::handle_add_text(&conn, &state, "Adabiyot").unwrap();
    let StepOutcome::Advance { next, .. } = outcome.clone() else {
        panic!("expected advance");
    };
    apply(&store, outcome).await;
    assert_eq!(catalog::count_categories(&conn).unwrap(), 0);

    let DialogState::AddCategory(state) = next else {
        panic!("unexpected dialog kind");
    };
    let outcome = category::handle_add_text(&conn, &state, "O'zbek adabiyoti").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    apply(&store, outcome).await;

    assert_eq!(store.get(CHAT).await, None);
    let cats = catalog::get_main_categories(&conn).unwrap();
    assert_eq!(cats.len(), 1);
    assert_eq!(cats[0].name, "Adabiyot");
    assert_eq!(cats[0].description, "O'zbek adabiyoti");
}

#[tokio::test]
async fn cancel_leaves_no_trace() {
    let conn = test_conn();
    let store = SessionStore::with_ttl(None);

    let outcome = category::start_add(&conn).unwrap();
    let StepOutcome::Advance { next, .. } = outcome else {
        panic!("expected advance");
    };
    store.start(CHAT, next).await;

    let state = AddCategoryState::WaitingForName { parent_id: None };
    let outcome = category::handle_add_text(&conn, &state, "Adabiyot").unwrap();
    apply(&store, outcome).await;

    // Cancel button: the dispatcher just drops the session
    store.finish(CHAT).await;
    assert_eq!(store.get(CHAT).await, None);
    assert_eq!(catalog::count_categories(&conn).unwrap(), 0);
}

#[tokio::test]
async fn starting_a_new_dialog_replaces_the_old_one() {
    let store = SessionStore::with_ttl(None);

    store
        .start(CHAT, DialogState::Search(SearchState::WaitingForQuery))
        .await;
    let StepOutcome::Advance { next, .. } = admin::start_add() else {
        panic!("expected advance");
    };
    store.start(CHAT, next).await;

    assert_eq!(
        store.get(CHAT).await,
        Some(DialogState::AddAdmin(AddAdminState::WaitingForId))
    );
}

#[tokio::test]
async fn admin_promotion_scenarios() {
    let conn = test_conn();
    let store = SessionStore::with_ttl(None);
    let StepOutcome::Advance { next, .. } = admin::start_add() else {
        panic!("expected advance");
    };
    store.start(CHAT, next).await;

    // Malformed ID re-prompts and keeps the dialog
    let outcome = admin::handle_add_text(&conn, &[], "@olim").unwrap();
    assert!(matches!(outcome, StepOutcome::Stay { .. }));
    apply(&store, outcome).await;
    assert_eq!(
        store.get(CHAT).await,
        Some(DialogState::AddAdmin(AddAdminState::WaitingForId))
    );

    // Unknown user ends the dialog without granting anything
    let outcome = admin::handle_add_text(&conn, &[], "555000").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    apply(&store, outcome).await;
    assert_eq!(store.get(CHAT).await, None);
    assert!(get_all_admins(&conn).unwrap().is_empty());

    // Known user is promoted and gains the admin role
    get_or_create_user(&conn, 555000, Some("olim")).unwrap();
    let outcome = admin::handle_add_text(&conn, &[], "555000").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    assert_eq!(resolve_with(&conn, &[], 555000).unwrap(), Role::Admin);

    // Promoting again reports it and stays open for another ID
    let outcome = admin::handle_add_text(&conn, &[], "555000").unwrap();
    assert!(matches!(outcome, StepOutcome::Stay { .. }));
    assert_eq!(get_all_admins(&conn).unwrap().len(), 1);
}

#[tokio::test]
async fn super_admin_survives_removal_attempts() {
    let conn = test_conn();
    let super_admins = [777i64];
    get_or_create_user(&conn, 777, Some("bosh")).unwrap();

    let outcome = admin::handle_remove_text(&conn, &super_admins, "777").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    assert_eq!(resolve_with(&conn, &super_admins, 777).unwrap(), Role::SuperAdmin);
}

#[tokio::test]
async fn demoted_admin_is_anonymous_again() {
    let conn = test_conn();
    let user = get_or_create_user(&conn, 300, Some("vaqtinchalik")).unwrap();
    add_admin(&conn, user.id, Some("vaqtinchalik")).unwrap();
    assert_eq!(resolve_with(&conn, &[], 300).unwrap(), Role::Admin);

    let outcome = admin::handle_remove_text(&conn, &[], "300").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    assert_eq!(resolve_with(&conn, &[], 300).unwrap(), Role::Anonymous);
}

#[tokio::test]
async fn search_dialog_round() {
    let conn = test_conn();
    let store = SessionStore::with_ttl(None);
    let cat = catalog::create_category(&conn, "Nasr", "", None).unwrap();
    catalog::create_book(
        &conn,
        &catalog::NewBook {
            category_id: cat,
            title: "O'tkan kunlar".to_string(),
            author: "Abdulla Qodiriy".to_string(),
            narrator: None,
            description: String::new(),
            file_id: "file-1".to_string(),
            file_size: Some(4096),
            duration: None,
        },
    )
    .unwrap();

    let StepOutcome::Advance { next, .. } = search::start() else {
        panic!("expected advance");
    };
    store.start(CHAT, next).await;

    // Blank query keeps the dialog open
    let outcome = search::handle_text(&conn, " ").unwrap();
    assert!(matches!(outcome, StepOutcome::Stay { .. }));

    // A real query ends it, found or not
    let outcome = search::handle_text(&conn, "qodiriy").unwrap();
    assert!(matches!(outcome, StepOutcome::Finish { .. }));
    apply(&store, outcome).await;
    assert_eq!(store.get(CHAT).await, None);
}
