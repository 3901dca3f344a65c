// ping.rs - Ping Command Module
// This module implements the ^ping command, which measures and displays the bot's response time.
//
// Used by: main.rs (command registration)

use log::warn;
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

#[command]
/// Main ^ping command handler
/// Replies, then edits the reply with the measured round trip
pub async fn ping(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let start_time = std::time::Instant::now();
    let mut response = msg.reply(ctx, "Pong! Calculating delay...").await?;
    let elapsed = start_time.elapsed();

    let updated_content = format!("Pong! Response time: {}ms", elapsed.as_millis());
    if let Err(e) = response.edit(&ctx.http, |m| m.content(updated_content)).await {
        warn!("[PING] Failed to update ping message with delay: {}", e);
    }

    Ok(())
}
