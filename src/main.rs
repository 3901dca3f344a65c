mod commands;
mod config;
mod preview;

use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    framework::standard::{macros::group, StandardFramework},
    model::gateway::Ready,
    prelude::GatewayIntents,
};
use std::env;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use crate::commands::preview::PreviewServiceKey;
use crate::config::{load_config_file, BotConfig, PreviewConfig};
use crate::preview::PreviewService;

// Import all command constants generated by the #[command] macro
use crate::commands::help::HELP_COMMAND;
use crate::commands::ping::PING_COMMAND;
use crate::commands::preview::PREVIEW_COMMAND;

// Command group declaration - includes all available commands
#[group]
#[commands(ping, help, preview)]
struct General;

// Event handler implementation
struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        log::info!("Connected to {} guilds", ready.guilds.len());
        println!("✅ Bot connected as {}!", ready.user.name);
    }
}

// Reads quit/help/status from stdin until told to stop
async fn handle_command_line(shutdown_tx: mpsc::Sender<String>, preview_config: PreviewConfig) {
    use tokio::io::AsyncWriteExt;
    use tokio::time::{sleep, Duration};

    println!("📝 Command line interface active. Type 'help' for available commands.");

    // Let the connection messages print first
    sleep(Duration::from_millis(1500)).await;

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        if stdout.write_all(b"> ").await.is_err() || stdout.flush().await.is_err() {
            eprintln!("❌ Failed to write prompt");
            break;
        }

        match reader.next_line().await {
            Ok(Some(line)) => {
                let command = line.trim().to_lowercase();
                match command.as_str() {
                    "quit" | "q" | "exit" => {
                        println!("⏹️  Shutting down bot...");
                        if shutdown_tx.send("quit".to_string()).await.is_err() {
                            eprintln!("❌ Failed to send shutdown signal");
                        }
                        break;
                    }
                    "help" | "h" => {
                        println!("🤖 Available commands:");
                        println!("  quit, q, exit  - Stop the bot gracefully");
                        println!("  help, h        - Show this help message");
                        println!("  status         - Show bot status");
                    }
                    "status" => {
                        println!("🤖 Bot Status: Running");
                        println!("🖼️  Preview grid: {} columns, {}x{} cells", preview_config.columns, preview_config.thumb_width, preview_config.thumb_height);
                        println!("📥 Thumbnail fetches: {} at a time", preview_config.fetch_concurrency);
                        println!("📂 Output folder: {}", preview_config.tmp_path.display());
                    }
                    "" => {}
                    _ => {
                        println!("❓ Unknown command: '{}'. Type 'help' for available commands.", command);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                eprintln!("❌ Error reading command line: {}", e);
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from botconfig.txt file
    let config_map = match load_config_file() {
        Ok((path, map)) => {
            println!("✅ Configuration loaded from {}", path);
            map
        }
        Err(error) => {
            eprintln!("❌ Failed to load botconfig.txt: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=^");
            return;
        }
    };

    // Export for compatibility (RUST_LOG, PREFIX)
    for (key, value) in &config_map {
        env::set_var(key, value);
    }

    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let bot_config = match BotConfig::from_map(&config_map) {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            eprintln!("❌ {}. Replace it with your actual Discord bot token.", e);
            return;
        }
    };

    let preview_config = match PreviewConfig::from_map(&config_map) {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Invalid preview configuration: {}", e);
            return;
        }
    };

    // Font and HTTP client are validated here, once
    let preview_service = match PreviewService::from_config(&preview_config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            log::error!("❌ Failed to set up preview pipeline: {}", e);
            eprintln!("❌ {}. Check FONT_PATH in botconfig.txt", e);
            return;
        }
    };

    println!("🤖 Starting bot with prefix: '{}'", bot_config.prefix);

    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&bot_config.prefix)
                .case_insensitivity(true)
                .no_dm_prefix(true)
                .with_whitespace(true)
        })
        .after(|_ctx, msg, command_name, result| {
            Box::pin(async move {
                match result {
                    Ok(()) => log::debug!("Command '{}' finished for {} ({})", command_name, msg.author.name, msg.author.id),
                    Err(e) => log::error!(
                        "❌ Command '{}' failed for user {} ({}): {:?}",
                        command_name,
                        msg.author.name,
                        msg.author.id,
                        e
                    ),
                }
            })
        })
        .unrecognised_command(|_ctx, msg, unrecognized_command_name| {
            Box::pin(async move {
                log::debug!("Unrecognized command '{}' from {}", unrecognized_command_name, msg.author.name);
            })
        })
        .group(&GENERAL_GROUP);

    // Configure bot intents
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(&bot_config.token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check your token in botconfig.txt file");
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<PreviewServiceKey>(preview_service);
    }

    // Set up command line interface for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<String>(1);
    let cmd_task = tokio::spawn(handle_command_line(shutdown_tx, preview_config));

    println!("🚀 Bot is running...");
    println!("💡 Use 'quit' command to stop gracefully, or press Ctrl+C");
    tokio::select! {
        _ = signal::ctrl_c() => {
            println!("\n⏹️ Stopping bot gracefully...");
        }
        shutdown_signal = shutdown_rx.recv() => {
            if let Some(signal) = shutdown_signal {
                println!("📡 Received '{}' command, stopping bot gracefully...", signal);
            }
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
            }
        }
    }

    client.shard_manager.lock().await.shutdown_all().await;
    cmd_task.abort();

    println!("✅ Bot stopped");
}
