//! Domain errors

use std::fmt;
use thiserror::Error;

/// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Call already registered: {0}")]
    DuplicateCallId(String),

    #[error("No live call registered under: {0}")]
    UnknownCallId(String),

    #[error("Call already ended: {0}")]
    CallAlreadyEnded(String),

    #[error("Playback notification carries no correlating call context")]
    MissingCorrelationContext,

    #[error("Remote {command} command failed: {detail}")]
    RemoteCommandFailure {
        command: RemoteCommand,
        detail: String,
    },

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Asset cleanup failed: {0}")]
    AssetCleanupFailure(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Commands issued against the remote call platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    PlaceCall,
    PlayPrompt,
    SubscribeTone,
    EndCall,
    DirectoryLookup,
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteCommand::PlaceCall => "place-call",
            RemoteCommand::PlayPrompt => "play-prompt",
            RemoteCommand::SubscribeTone => "subscribe-tone",
            RemoteCommand::EndCall => "end-call",
            RemoteCommand::DirectoryLookup => "directory-lookup",
        };
        write!(f, "{}", name)
    }
}
