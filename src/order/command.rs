//! Inbound message classification.

/// Parses message content into an [`Input`].
pub struct CommandParser;

impl CommandParser {
    /// Classify message content as a command or a free-text reply.
    pub fn parse(content: &str) -> Input {
        let trimmed = content.trim();
        if !trimmed.starts_with('/') {
            return Input::Reply {
                text: content.to_string(),
            };
        }

        // Telegram appends the bot's username in groups: `/start@my_bot`
        let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
        let command = word.split('@').next().unwrap_or(word).to_lowercase();

        match command.as_str() {
            "/start" | "/new" => Input::Start,
            "/cancel" | "/stop" => Input::Cancel,
            "/help" | "/?" => Input::Help,
            _ => Input::Unknown { command },
        }
    }
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Begin (or restart) an order.
    Start,
    /// Abort the current order.
    Cancel,
    /// Show the command list.
    Help,
    /// A slash command we do not know.
    Unknown { command: String },
    /// Free-text answer to the current prompt.
    Reply { text: String },
}
