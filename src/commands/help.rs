// help.rs - Help Command Module
// Usage text for the preview bot

use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

use crate::commands::preview::MAX_RECORDS;
use crate::preview::layout::MAX_COLUMNS;

pub fn help_text(prefix: &str) -> String {
    format!(
        "**🖼️ Preview Bot - Command Help**\n\n\
        **📝 Basic Commands:**\n\
        • `{p}ping` - Test bot connectivity\n\
        • `{p}help` - Show this help message\n\n\
        **🔍 Search Preview:**\n\
        • `{p}preview <keyword>` + `records.json` - Build a thumbnail grid\n\
        • `{p}preview -c <1-{max}> <keyword>` - Custom number of columns\n\
        • The attachment is a JSON array of `{{\"id\", \"title\", \"author\", \"thumb_url\"}}`\n\
        • Up to {records} results per preview; thumbnails that fail to download are skipped\n\n\
        **💡 Example:**\n\
        • `{p}preview -c 4 hatsune miku` (with records.json attached)",
        p = prefix,
        max = MAX_COLUMNS,
        records = MAX_RECORDS
    )
}

#[command]
#[aliases("h", "commands")]
/// Display help information for all available commands
pub async fn help(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let prefix = std::env::var("PREFIX").unwrap_or_else(|_| "^".to_string());
    msg.reply(ctx, help_text(&prefix)).await?;
    Ok(())
}
