//! Input line parsing.
//!
//! Lines starting with `/` are commands, anything else is sent as chat.

use sajiki_server::infrastructure::dto::websocket::SourceKindDto;

use crate::error::CommandError;

/// A parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    /// Pause at the local player's current position
    Pause,
    Seek(f64),
    Source { url: String, kind: SourceKindDto },
    Kick(String),
    Mute(bool),
    /// Ask the server for a fresh playback state
    Sync,
    /// Show local drift and player status
    Status,
    /// Toggle a simulated stall on the local player
    Stall,
    /// Set how many seconds the local player has buffered ahead
    Buffer(f64),
    Help,
    Quit,
    Chat(String),
}

pub const HELP: &str = "\
/play                       start playback (host)
/pause                      pause at the current position (host)
/seek <seconds>             jump to a position (host)
/source <url> [kind]        load media; kind = raw-file | adaptive-stream | embedded-platform (host)
/kick <user-id>             remove a participant for 30 minutes (host)
/mute, /unmute              update your mute flag
/sync                       request the current playback state
/status                     show local player and drift
/stall                      toggle a simulated stall
/buffer <seconds>           set the simulated buffer ahead
/quit                       leave
anything else               chat";

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Chat(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let command = match name {
        "play" => Command::Play,
        "pause" => Command::Pause,
        "seek" => Command::Seek(number(parts.next(), "seek", "a position in seconds")?),
        "source" => {
            let url = parts.next().ok_or(CommandError::MissingArgument {
                command: "source",
                expected: "a media URL",
            })?;
            let kind = match parts.next() {
                Some(kind) => source_kind(kind)?,
                None => SourceKindDto::RawFile,
            };
            Command::Source {
                url: url.to_string(),
                kind,
            }
        }
        "kick" => {
            let user = parts.next().ok_or(CommandError::MissingArgument {
                command: "kick",
                expected: "a user id",
            })?;
            Command::Kick(user.to_string())
        }
        "mute" => Command::Mute(true),
        "unmute" => Command::Mute(false),
        "sync" => Command::Sync,
        "status" => Command::Status,
        "stall" => Command::Stall,
        "buffer" => Command::Buffer(number(parts.next(), "buffer", "a number of seconds")?),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn number(
    arg: Option<&str>,
    command: &'static str,
    expected: &'static str,
) -> Result<f64, CommandError> {
    let arg = arg.ok_or(CommandError::MissingArgument { command, expected })?;
    arg.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(arg.to_string()))
}

fn source_kind(kind: &str) -> Result<SourceKindDto, CommandError> {
    match kind {
        "raw-file" | "file" => Ok(SourceKindDto::RawFile),
        "adaptive-stream" | "hls" => Ok(SourceKindDto::AdaptiveStream),
        "embedded-platform" | "embed" => Ok(SourceKindDto::EmbeddedPlatform),
        other => Err(CommandError::InvalidSourceKind(other.to_string())),
    }
}
