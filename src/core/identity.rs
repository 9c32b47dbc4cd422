//! Design identity - how a design is recognized across export sessions

use std::fmt;
use uuid::Uuid;

/// Characters that are invalid in exported file and folder names
const INVALID_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace characters that are invalid in file names with underscores
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if INVALID_FILE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Strip a trailing ` v<digits>` revision suffix from a document title
///
/// Hosts append a revision marker to the window title ("Bracket v7").
/// Only a true suffix is stripped; a ` v` elsewhere in the title is kept.
pub fn strip_revision_suffix(title: &str) -> &str {
    match title.rsplit_once(" v") {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => title,
    }
}

/// Resolved identity of an open design
///
/// Prefers the host-assigned document id. Falls back to a key derived
/// from the document title when the host has none, and keeps that
/// name key as a secondary lookup because host ids are session-scoped
/// and may not survive a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignIdentity {
    id: Option<Uuid>,
    base_name: String,
}

impl DesignIdentity {
    pub fn new(id: Option<Uuid>, title: &str) -> Self {
        Self {
            id,
            base_name: strip_revision_suffix(title).to_string(),
        }
    }

    /// Document title with any revision suffix removed
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Key the context record is stored under
    pub fn primary_key(&self) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => self.base_name.clone(),
        }
    }

    /// Name-derived key tried when the primary key has no record
    pub fn fallback_key(&self) -> String {
        self.base_name.clone()
    }

    /// Store keys to try on lookup, most specific first
    pub fn candidate_keys(&self) -> Vec<String> {
        let primary = self.primary_key();
        let fallback = self.fallback_key();
        if primary == fallback {
            vec![primary]
        } else {
            vec![primary, fallback]
        }
    }
}

impl fmt::Display for DesignIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{} ({})", self.base_name, id),
            None => write!(f, "{}", self.base_name),
        }
    }
}
