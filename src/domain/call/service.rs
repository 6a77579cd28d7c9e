//! Call domain service

use std::time::Duration;

/// How a connected call should be treated based on elapsed ring time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupClass {
    /// Connected quickly; a person answered
    Live,
    /// Connected just under the voicemail threshold; classification is shaky
    RetuneBand,
    /// Rang long enough that voicemail almost certainly picked up
    Voicemail,
}

/// Domain service for call-related decisions
///
/// Domain services contain business logic that doesn't naturally
/// fit within a single aggregate.
pub struct CallDomainService;

impl CallDomainService {
    /// Classify a pickup by how long the callee was alerted first
    ///
    /// Calls connected after `voicemail_threshold` of ringing are answered by
    /// voicemail, not a person. Connections landing within `warning_margin`
    /// below the threshold sit too close to the cutoff to trust; operators
    /// should retune the threshold toward the observed elapsed time.
    pub fn classify_pickup(
        elapsed: Duration,
        voicemail_threshold: Duration,
        warning_margin: Duration,
    ) -> PickupClass {
        if elapsed >= voicemail_threshold {
            return PickupClass::Voicemail;
        }

        let band_start = voicemail_threshold.saturating_sub(warning_margin);
        if elapsed >= band_start {
            return PickupClass::RetuneBand;
        }

        PickupClass::Live
    }
}
