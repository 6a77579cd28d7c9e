//! Call value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-side state of a notification call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Placement accepted by the platform, no progress reported yet
    Dialing,
    /// Callee is being alerted
    Ringing,
    /// Call answered but the audio path is not up yet
    ConnectedAwaitingMedia,
    /// Greeting prompt is playing
    PlayingPrompt,
    /// Tone menu armed, waiting for a DTMF selection
    AwaitingTone,
}

impl SessionState {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, new_state: &SessionState) -> bool {
        use SessionState::*;

        match (self, new_state) {
            // From Dialing; platforms may skip the ringing report entirely
            (Dialing, Ringing) => true,
            (Dialing, ConnectedAwaitingMedia) => true,
            (Dialing, PlayingPrompt) => true,
            (Dialing, AwaitingTone) => true,

            // From Ringing
            (Ringing, ConnectedAwaitingMedia) => true,
            (Ringing, PlayingPrompt) => true,
            (Ringing, AwaitingTone) => true,

            // From ConnectedAwaitingMedia, once the audio path comes up
            (ConnectedAwaitingMedia, PlayingPrompt) => true,
            (ConnectedAwaitingMedia, AwaitingTone) => true,

            // Prompt completion arms the tone menu
            (PlayingPrompt, AwaitingTone) => true,

            // All other transitions are invalid
            _ => false,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Dialing => "dialing",
            SessionState::Ringing => "ringing",
            SessionState::ConnectedAwaitingMedia => "connected-awaiting-media",
            SessionState::PlayingPrompt => "playing-prompt",
            SessionState::AwaitingTone => "awaiting-tone",
        };
        write!(f, "{}", name)
    }
}

/// Call lifecycle state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportedCallState {
    /// Call object created, callee not alerted yet
    Initializing,
    /// Callee is being alerted
    Ringing,
    /// Call answered
    Connected,
    /// Call torn down on the platform side
    Ended,
}

/// Status of a playback operation as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationOutcome {
    Running,
    Completed,
    Failed,
}

/// DTMF digit reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToneDigit {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Star,
    Pound,
}

impl ToneDigit {
    /// Convert to character representation
    pub fn to_char(&self) -> char {
        match self {
            ToneDigit::Zero => '0',
            ToneDigit::One => '1',
            ToneDigit::Two => '2',
            ToneDigit::Three => '3',
            ToneDigit::Four => '4',
            ToneDigit::Five => '5',
            ToneDigit::Six => '6',
            ToneDigit::Seven => '7',
            ToneDigit::Eight => '8',
            ToneDigit::Nine => '9',
            ToneDigit::Star => '*',
            ToneDigit::Pound => '#',
        }
    }

    /// Parse from character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(ToneDigit::Zero),
            '1' => Some(ToneDigit::One),
            '2' => Some(ToneDigit::Two),
            '3' => Some(ToneDigit::Three),
            '4' => Some(ToneDigit::Four),
            '5' => Some(ToneDigit::Five),
            '6' => Some(ToneDigit::Six),
            '7' => Some(ToneDigit::Seven),
            '8' => Some(ToneDigit::Eight),
            '9' => Some(ToneDigit::Nine),
            '*' => Some(ToneDigit::Star),
            '#' => Some(ToneDigit::Pound),
            _ => None,
        }
    }
}

/// Action selected from the tone menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuSelection {
    /// Acknowledge the notification and end the call
    Confirm,
    /// Replay the greeting and the menu prompt
    Repeat,
}

impl MenuSelection {
    /// Map a DTMF digit to a menu action; unmapped digits select nothing
    pub fn from_tone(tone: ToneDigit) -> Option<Self> {
        match tone {
            ToneDigit::One => Some(MenuSelection::Confirm),
            ToneDigit::Two => Some(MenuSelection::Repeat),
            _ => None,
        }
    }
}

/// Party the notification call is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallTarget {
    /// Directory user reachable by identifier
    User { id: String },
    /// External phone number dialed over the PSTN bridge
    Phone { number: String },
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::User { id } => write!(f, "user {}", id),
            CallTarget::Phone { number } => write!(f, "phone {}", number),
        }
    }
}
