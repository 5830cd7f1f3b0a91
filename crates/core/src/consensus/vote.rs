//! Plurality vote with a required quorum.

/// Result of a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consensus {
    /// A single value reached the required agreement.
    Agreed {
        /// The agreed value, trimmed.
        value: String,
        /// Number of candidates that voted for it.
        votes: usize,
    },
    /// No value reached the required agreement.
    NoConsensus {
        /// The most frequent non-empty value, if any.
        leader: Option<String>,
        /// Votes for the leader.
        votes: usize,
    },
}

impl Consensus {
    /// Returns the agreed value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Agreed { value, .. } => Some(value),
            Self::NoConsensus { .. } => None,
        }
    }

    /// Consumes the result and returns the agreed value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Agreed { value, .. } => Some(value),
            Self::NoConsensus { .. } => None,
        }
    }

    /// Returns true when a value reached the quorum.
    #[must_use]
    pub const fn is_agreed(&self) -> bool {
        matches!(self, Self::Agreed { .. })
    }

    /// Votes received by the winning (or leading) value.
    #[must_use]
    pub const fn votes(&self) -> usize {
        match self {
            Self::Agreed { votes, .. } | Self::NoConsensus { votes, .. } => *votes,
        }
    }
}

/// Agreement needed for every one of `calls` answers to match.
#[cfg(test)]
pub(crate) const fn unanimous(calls: usize) -> usize {
    calls
}

/// Agreement needed for more than half of `calls` answers to match.
#[cfg(test)]
pub(crate) const fn strict_majority(calls: usize) -> usize {
    calls / 2 + 1
}

/// Counts the candidates and returns the most frequent one if it has at least
/// `required` votes.
///
/// Candidates are compared after trimming. Empty candidates stand for a failed
/// or abstaining call: they are never counted and can never win. When two
/// values share the highest count the one seen first wins, so the result only
/// depends on the order of the candidates in that case. A `required` of zero is
/// treated as one.
pub fn vote<S: AsRef<str>>(candidates: &[S], required: usize) -> Consensus {
    // Insertion-ordered counts; ensembles are small.
    let mut counts: Vec<(&str, usize)> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let value = candidate.as_ref().trim();
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut leader: Option<(&str, usize)> = None;
    for &(value, count) in &counts {
        if leader.is_none_or(|(_, best)| count > best) {
            leader = Some((value, count));
        }
    }

    match leader {
        Some((value, votes)) if votes >= required.max(1) => Consensus::Agreed {
            value: value.to_string(),
            votes,
        },
        Some((value, votes)) => Consensus::NoConsensus {
            leader: Some(value.to_string()),
            votes,
        },
        None => Consensus::NoConsensus {
            leader: None,
            votes: 0,
        },
    }
}
