//! Append-only audit log of game actions.

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// Kind of logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Game initialised.
    GameStarted,
    /// Neutral territory claimed during placement.
    Claim,
    /// Reserve army placed during placement.
    Reinforce,
    /// Draft army placed.
    Draft,
    /// Card set redeemed.
    Redeem,
    /// Attack resolved.
    Attack,
    /// Armies moved into a conquered territory.
    Conquest,
    /// A player lost their last territory.
    Elimination,
    /// Card drawn at the end of an attack phase.
    CardDrawn,
    /// Armies moved between two owned territories.
    Fortify,
    /// Turn ended and play passed on.
    EndTurn,
    /// A single player owns the whole map.
    Victory,
}

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Turn the action happened on.
    pub turn: u32,
    /// Acting player, if any.
    pub player: Option<PlayerId>,
    /// What happened.
    pub action: HistoryAction,
    /// Territory most associated with the action, for highlighting.
    pub territory: Option<String>,
    /// Human-readable outcome.
    pub result: String,
}

/// Write-only sequence of [`HistoryEntry`] values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Append an entry.
    pub fn record(
        &mut self,
        turn: u32,
        player: Option<PlayerId>,
        action: HistoryAction,
        territory: Option<&str>,
        result: impl Into<String>,
    ) {
        self.entries.push(HistoryEntry {
            turn,
            player,
            action,
            territory: territory.map(str::to_string),
            result: result.into(),
        });
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry of a given kind.
    #[must_use]
    pub fn last_of(&self, action: HistoryAction) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.action == action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_last() {
        let mut history = History::default();
        assert!(history.is_empty());

        history.record(1, Some(0), HistoryAction::Draft, Some("peru"), "+1");
        history.record(1, Some(0), HistoryAction::EndTurn, None, "next: 1");

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().action, HistoryAction::EndTurn);
        assert_eq!(
            history.last_of(HistoryAction::Draft).unwrap().territory.as_deref(),
            Some("peru")
        );
        assert!(history.last_of(HistoryAction::Victory).is_none());
    }
}
