//! Resolution of free-form model tokens to reference-table IDs.
//!
//! A token is tried, in order, as:
//! 1. an internal ID of a row in the table
//! 2. a row's external code (exact match)
//! 3. a row's display name (case-insensitive)
//!
//! The first match wins. No match means unresolved; there is no fuzzy fallback.

use uuid::Uuid;

/// A row of a reference table that tokens can be resolved against.
pub trait ReferenceEntry {
    /// Typed ID returned on a match.
    type Id: Copy;

    /// Typed ID of the row.
    fn id(&self) -> Self::Id;

    /// The row's ID as a UUID, for direct ID matches.
    fn uuid(&self) -> Uuid;

    /// External code or number, if the row has one.
    fn code(&self) -> Option<&str>;

    /// Display name.
    fn name(&self) -> &str;
}

/// Which rule resolved the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    /// The token was the row's ID.
    Id,
    /// The token was the row's code.
    Code,
    /// The token was the row's name.
    Name,
}

/// A resolved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<I> {
    /// ID of the matching row.
    pub id: I,
    /// Rule that produced the match.
    pub matched_by: MatchedBy,
}

/// Resolves `token` against `entries`.
pub fn resolve<E: ReferenceEntry>(token: &str, entries: &[E]) -> Option<Resolved<E::Id>> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let found = |entry: &E, matched_by| {
        Some(Resolved {
            id: entry.id(),
            matched_by,
        })
    };

    if let Ok(uuid) = Uuid::parse_str(token)
        && let Some(entry) = entries.iter().find(|e| e.uuid() == uuid)
    {
        return found(entry, MatchedBy::Id);
    }

    if let Some(entry) = entries.iter().find(|e| e.code() == Some(token)) {
        return found(entry, MatchedBy::Code);
    }

    let lowered = token.to_lowercase();
    entries
        .iter()
        .find(|e| e.name().trim().to_lowercase() == lowered)
        .and_then(|entry| found(entry, MatchedBy::Name))
}
