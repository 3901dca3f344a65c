// commands/mod.rs - Command Module Registry
// Declares all bot command modules so main.rs can register them in one group

pub mod help;           // Help text for the preview commands
pub mod ping;           // Basic ping/pong latency check
pub mod preview;        // Search result preview grid (^preview)
