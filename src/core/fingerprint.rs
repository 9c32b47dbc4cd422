//! Content fingerprinting - cheap change detection between exports

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Counters sampled from an open design
///
/// These are the inputs to the change fingerprint. They are plain
/// counts, not a content hash: a design edit that leaves every count
/// unchanged compares as unchanged. That is the accepted trade-off
/// for hosts that expose no cheap content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DesignCounters {
    /// Entries in the feature timeline
    pub timeline_length: u32,
    /// Position of the timeline rollback marker
    pub timeline_position: u32,
    /// Occurrences across the component tree
    pub occurrences: u32,
    /// User parameters
    pub parameters: u32,
    /// Solid bodies across all components
    pub bodies: u32,
}

/// Change fingerprint: the five counters joined by `/`
///
/// Formats as e.g. `14/14/3/6/5` and parses back losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(DesignCounters);

impl Fingerprint {
    pub fn counters(&self) -> DesignCounters {
        self.0
    }

    /// Compare against a stored fingerprint string
    ///
    /// Anything unparseable counts as a mismatch, so an export is never
    /// skipped on the strength of a corrupt record.
    pub fn matches(&self, stored: &str) -> bool {
        stored
            .parse::<Fingerprint>()
            .map(|f| f == *self)
            .unwrap_or(false)
    }
}

impl From<DesignCounters> for Fingerprint {
    fn from(counters: DesignCounters) -> Self {
        Self(counters)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.0.timeline_length,
            self.0.timeline_position,
            self.0.occurrences,
            self.0.parameters,
            self.0.bodies
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintParseError {
    #[error("expected 5 counters separated by '/', found {0}")]
    WrongArity(usize),
    #[error("counter '{0}' is not a number")]
    InvalidCounter(String),
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 5 {
            return Err(FingerprintParseError::WrongArity(parts.len()));
        }
        let mut values = [0u32; 5];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| FingerprintParseError::InvalidCounter(part.to_string()))?;
        }
        Ok(Fingerprint(DesignCounters {
            timeline_length: values[0],
            timeline_position: values[1],
            occurrences: values[2],
            parameters: values[3],
            bodies: values[4],
        }))
    }
}
