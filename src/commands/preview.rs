// preview.rs - Search Preview Command Module
// This module implements the ^preview command: it reads search records from an
// attached JSON file, builds the thumbnail grid and replies with the image.
//
// Key Features:
// - Optional column count (-c / --columns)
// - Title formatted as "Pixiv - <keyword>"
// - Distinct replies for "nothing loaded" and composition failures
//
// Used by: main.rs (command registration)

use std::sync::Arc;

use log::{error, info, warn};
use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::{AttachmentType, Message},
    prelude::TypeMapKey,
};

use crate::preview::error::PreviewError;
use crate::preview::layout::MAX_COLUMNS;
use crate::preview::record::{parse_records, ThumbnailRecord};
use crate::preview::PreviewService;

/// Most search results one ^preview will draw
pub const MAX_RECORDS: usize = 120;

// TypeMap key for the shared preview pipeline
pub struct PreviewServiceKey;
impl TypeMapKey for PreviewServiceKey {
    type Value = Arc<PreviewService>;
}

#[derive(Debug, PartialEq, Eq)]
pub struct PreviewRequest {
    pub keyword: String,
    pub columns: Option<u32>,
}

impl PreviewRequest {
    pub fn title(&self) -> String {
        format!("Pixiv - {}", self.keyword)
    }
}

/// Parse `[-c N | --columns N] <keyword...>`
pub fn parse_preview_args(input: &str) -> Result<PreviewRequest, String> {
    let mut tokens = input.split_whitespace().peekable();
    let mut columns = None;

    if let Some(&flag) = tokens.peek() {
        if flag == "-c" || flag == "--columns" {
            tokens.next();
            let value = tokens.next().ok_or("❌ Missing value for --columns")?;
            let parsed = value
                .parse::<u32>()
                .ok()
                .filter(|n| (1..=MAX_COLUMNS).contains(n))
                .ok_or_else(|| format!("❌ Columns must be a number between 1 and {}", MAX_COLUMNS))?;
            columns = Some(parsed);
        }
    }

    let keyword = tokens.collect::<Vec<_>>().join(" ");
    if keyword.is_empty() {
        return Err("❌ Please provide a keyword! Usage: `^preview [-c columns] <keyword>` with a records JSON attached".to_string());
    }

    Ok(PreviewRequest { keyword, columns })
}

/// Reject record lists that are empty or longer than MAX_RECORDS
pub fn check_record_count(records: &[ThumbnailRecord]) -> Result<(), String> {
    if records.is_empty() {
        return Err("❌ The attached file contains no search results.".to_string());
    }
    if records.len() > MAX_RECORDS {
        return Err(format!(
            "❌ Too many search results ({}), at most {} can be previewed at once.",
            records.len(),
            MAX_RECORDS
        ));
    }
    Ok(())
}

#[command]
#[aliases("pixivpreview", "grid")]
/// Main ^preview command handler
/// Supports:
///   - ^preview <keyword>              (records.json attached)
///   - ^preview -c <columns> <keyword> (records.json attached)
pub async fn preview(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let request = match parse_preview_args(args.message()) {
        Ok(request) => request,
        Err(usage) => {
            msg.reply(ctx, usage).await?;
            return Ok(());
        }
    };

    let attachment = match msg.attachments.first() {
        Some(attachment) => attachment,
        None => {
            msg.reply(ctx, "❌ Please attach a JSON file with the search results!").await?;
            return Ok(());
        }
    };

    let raw = match attachment.download().await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("[PREVIEW] Failed to download attachment {}: {}", attachment.filename, e);
            msg.reply(ctx, "❌ Failed to download the attachment!").await?;
            return Ok(());
        }
    };

    let records = match parse_records(&String::from_utf8_lossy(&raw)) {
        Ok(records) => records,
        Err(e) => {
            msg.reply(ctx, format!("❌ Could not read search results: {}", e)).await?;
            return Ok(());
        }
    };

    if let Err(reason) = check_record_count(&records) {
        msg.reply(ctx, reason).await?;
        return Ok(());
    }

    let service = {
        let data = ctx.data.read().await;
        data.get::<PreviewServiceKey>().cloned()
    };
    let service = match service {
        Some(service) => service,
        None => {
            error!("[PREVIEW] Preview service missing from client data");
            msg.reply(ctx, "❌ Preview is not available right now.").await?;
            return Ok(());
        }
    };

    msg.reply(
        ctx,
        format!("🔍 Searching: **{}**\nDownloading {} thumbnails, please wait~", request.keyword, records.len()),
    )
    .await?;
    let _typing = ctx.http.start_typing(msg.channel_id.0)?;

    let title = request.title();
    match service.compose_preview(&records, &title, request.columns).await {
        Ok(path) => {
            msg.channel_id
                .send_message(&ctx.http, |m| {
                    m.add_file(AttachmentType::Path(&path));
                    m
                })
                .await?;
            info!(
                "[PREVIEW] User {} ({}) previewed '{}' in {} columns",
                msg.author.name,
                msg.author.id,
                request.keyword,
                request.columns.unwrap_or_else(|| service.default_columns())
            );
        }
        Err(PreviewError::EmptyResult) => {
            warn!("[PREVIEW] No thumbnails loaded for '{}'", request.keyword);
            msg.reply(ctx, "❌ No thumbnails could be loaded, please try again later~").await?;
        }
        Err(e @ PreviewError::TooLarge { .. }) => {
            warn!("[PREVIEW] Rejected '{}': {}", request.keyword, e);
            msg.reply(ctx, "❌ That many results don't fit in one image, try more columns with `-c`~").await?;
        }
        Err(e) => {
            error!("[PREVIEW] Failed to build preview for '{}': {}", request.keyword, e);
            msg.reply(ctx, "❌ Something went wrong while building the preview image, please try again later~").await?;
        }
    }

    Ok(())
}
