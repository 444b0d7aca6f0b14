//! Bot initialization: the command enum and Telegram-side command setup.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::AppResult;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Mavjud buyruqlar:")]
pub enum Command {
    #[command(description = "botni ishga tushirish")]
    Start,
    #[command(description = "yordam")]
    Help,
    #[command(description = "kitoblar katalogi")]
    Kitoblar,
    #[command(description = "boshqaruv paneli")]
    Panel,
}

/// Creates a Bot instance from the `TELOXIDE_TOKEN` environment variable.
pub fn create_bot() -> Bot {
    Bot::from_env()
}

/// Publishes the command list to the Telegram UI.
///
/// The admin panel command is published too: Telegram shows it to everyone,
/// the permission check happens on use.
pub async fn setup_bot_commands(bot: &Bot) -> AppResult<()> {
    use teloxide::types::BotCommand;

    bot.set_my_commands(vec![
        BotCommand::new("start", "botni ishga tushirish"),
        BotCommand::new("help", "yordam"),
        BotCommand::new("kitoblar", "kitoblar katalogi"),
        BotCommand::new("panel", "boshqaruv paneli"),
    ])
    .await?;

    Ok(())
}
