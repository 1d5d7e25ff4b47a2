use edocs_bridge::{MessageToBackend, notification::DocumentId};

/// A line typed by the user, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forward a command to the backend.
    Backend(MessageToBackend),
    /// Print the current view again.
    Show,
    /// Print the list of commands.
    Help,
    /// Persist a new server base URL. Used by sessions started afterwards.
    SetServer(String),
    /// End the session and exit.
    Quit,
}

pub const HELP: &str = "\
commands:
  r             refresh unread counters from the server
  l             reload the notification list
  m <id>        mark notifications of a document read (local only)
  a <id>        acknowledge a document on the server
  s             show counters and notifications
  server <url>  store a new server address (next session)
  q             end the session and quit";

/// Reasons a console line could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("a document id is required")]
    MissingDocumentId,
    #[error("`{0}` is not a document id")]
    InvalidDocumentId(String),
    #[error("a server url is required")]
    MissingServerUrl,
}

pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };

    let command = match head {
        "r" | "refresh" => Command::Backend(MessageToBackend::RefreshUnread),
        "l" | "load" => Command::Backend(MessageToBackend::LoadNotifications),
        "m" | "mark" => Command::Backend(MessageToBackend::MarkNotificationRead(
            document_id(words.next())?,
        )),
        "a" | "ack" => Command::Backend(MessageToBackend::AcknowledgeDocument(document_id(
            words.next(),
        )?)),
        "s" | "show" => Command::Show,
        "h" | "help" | "?" => Command::Help,
        "server" => Command::SetServer(
            words
                .next()
                .ok_or(ParseError::MissingServerUrl)?
                .to_string(),
        ),
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(command)
}

fn document_id(word: Option<&str>) -> Result<DocumentId, ParseError> {
    let word = word.ok_or(ParseError::MissingDocumentId)?;
    word.trim_start_matches('#')
        .parse()
        .map_err(|_| ParseError::InvalidDocumentId(word.to_string()))
}
