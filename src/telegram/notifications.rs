//! Service notifications sent to the super-admins.

use teloxide::prelude::*;

use crate::core::config;
use crate::i18n::tr;

/// Tells every configured super-admin that the bot came up.
///
/// Failures are logged per recipient; a blocked admin chat must not stop
/// startup or the remaining notifications.
pub async fn notify_startup(bot: &Bot) {
    for &admin_id in config::admin::SUPER_ADMIN_IDS.iter() {
        if let Err(e) = bot.send_message(ChatId(admin_id), tr("startup-notify")).await {
            log::warn!("Failed to notify admin {} about startup: {}", admin_id, e);
        }
    }
}
