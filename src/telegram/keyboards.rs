//! Reply and inline keyboard builders.
//!
//! Everything here is purely derived from data: menus for the admin panel,
//! pickers for categories/books, confirm rows. Button labels are exact-match
//! routed in the dispatcher schema, so they live here as consts rather than
//! in the message catalogue.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::storage::catalog::{Book, Category};

// Main menu
pub const BTN_USER_BOOKS: &str = "📚 Kitoblar";
pub const BTN_SEARCH: &str = "🔍 Qidirish";

// Admin panel
pub const BTN_BOOKS_ADMIN: &str = "📚 Kitoblar boshqaruvi";
pub const BTN_ADMINS: &str = "👥 Adminlar boshqaruvi";
pub const BTN_STATS: &str = "📊 Statistika";
pub const BTN_BACK: &str = "🔙 Ortga qaytish";
pub const BTN_MAIN_MENU: &str = "🏠 Asosiy menyu";

// Admin management
pub const BTN_ADD_ADMIN: &str = "➕ Admin qo'shish";
pub const BTN_REMOVE_ADMIN: &str = "❌ Adminni o'chirish";
pub const BTN_LIST_ADMINS: &str = "👥 Barcha adminlar";

// Catalog management
pub const BTN_CATEGORIES: &str = "📁 Kategoriyalar";
pub const BTN_BOOKS: &str = "📖 Kitoblar";
pub const BTN_ADD_CATEGORY: &str = "➕ Kategoriya qo'shish";
pub const BTN_EDIT_CATEGORY: &str = "✏️ Kategoriyani tahrirlash";
pub const BTN_DELETE_CATEGORY: &str = "🗑 Kategoriyani o'chirish";
pub const BTN_ADD_BOOK: &str = "➕ Kitob qo'shish";
pub const BTN_EDIT_BOOK: &str = "✏️ Kitobni tahrirlash";
pub const BTN_DELETE_BOOK: &str = "🗑 Kitobni o'chirish";

// Workflow controls
pub const BTN_CANCEL: &str = "❌ Bekor qilish";
pub const BTN_SKIP: &str = "⏭ O'tkazib yuborish";

fn rows(labels: &[&[&str]]) -> Vec<Vec<KeyboardButton>> {
    labels
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.to_string())).collect())
        .collect()
}

/// Main menu for regular users.
pub fn user_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[&[BTN_USER_BOOKS, BTN_SEARCH]])).resize_keyboard()
}

/// Admin panel home menu.
pub fn admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[
        &[BTN_BOOKS_ADMIN],
        &[BTN_ADMINS, BTN_STATS],
        &[BTN_MAIN_MENU],
    ]))
    .resize_keyboard()
}

/// Admin management submenu (super-admin only).
pub fn admin_management_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[
        &[BTN_ADD_ADMIN, BTN_REMOVE_ADMIN],
        &[BTN_LIST_ADMINS],
        &[BTN_BACK],
    ]))
    .resize_keyboard()
}

/// Books management home menu.
pub fn books_admin_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[&[BTN_CATEGORIES, BTN_BOOKS], &[BTN_BACK]])).resize_keyboard()
}

/// Category management submenu.
pub fn category_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[
        &[BTN_ADD_CATEGORY, BTN_EDIT_CATEGORY],
        &[BTN_DELETE_CATEGORY],
        &[BTN_BACK],
    ]))
    .resize_keyboard()
}

/// Book management submenu.
pub fn book_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[
        &[BTN_ADD_BOOK, BTN_EDIT_BOOK],
        &[BTN_DELETE_BOOK],
        &[BTN_BACK],
    ]))
    .resize_keyboard()
}

/// A single cancel button shown during workflow text steps.
pub fn cancel_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[&[BTN_CANCEL]])).resize_keyboard()
}

/// Skip + cancel, for optional workflow steps.
pub fn skip_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(rows(&[&[BTN_SKIP], &[BTN_CANCEL]])).resize_keyboard()
}

/// One button per category, callback data `{prefix}:{id}`.
pub fn categories_inline(categories: &[Category], prefix: &str) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = categories
        .iter()
        .map(|c| {
            let label = if c.parent_id.is_some() {
                format!("↳ {}", c.name)
            } else {
                c.name.clone()
            };
            vec![InlineKeyboardButton::callback(label, format!("{}:{}", prefix, c.id))]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// One button per book, callback data `{prefix}:{id}`.
pub fn books_inline(books: &[Book], prefix: &str) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = books
        .iter()
        .map(|b| {
            vec![InlineKeyboardButton::callback(
                format!("{} — {}", b.title, b.author),
                format!("{}:{}", prefix, b.id),
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Yes/no confirmation row, callback data `{prefix}:yes` / `{prefix}:no`.
pub fn confirm_inline(prefix: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Ha", format!("{}:yes", prefix)),
        InlineKeyboardButton::callback("❌ Yo'q", format!("{}:no", prefix)),
    ]])
}

/// Field picker for the edit-book workflow.
pub fn book_fields_inline(prefix: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("📕 Nomi", format!("{}:title", prefix))],
        vec![InlineKeyboardButton::callback("✍️ Muallifi", format!("{}:author", prefix))],
        vec![InlineKeyboardButton::callback("📝 Tavsifi", format!("{}:description", prefix))],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: name.to_string(),
            description: String::new(),
            parent_id,
        }
    }

    #[test]
    fn category_picker_callback_data() {
        let cats = vec![category(1, "Adabiyot", None), category(2, "She'riyat", Some(1))];
        let kb = categories_inline(&cats, "editcat");
        assert_eq!(kb.inline_keyboard.len(), 2);
        let first = &kb.inline_keyboard[0][0];
        assert_eq!(first.text, "Adabiyot");
        let second = &kb.inline_keyboard[1][0];
        assert_eq!(second.text, "↳ She'riyat");
    }

    #[test]
    fn confirm_row_payloads() {
        let kb = confirm_inline("delcat_confirm");
        assert_eq!(kb.inline_keyboard[0].len(), 2);
    }
}
