use serde::{Deserialize, Serialize};

/// Sender used for the block reward minted by the node that sealed the block.
pub const REWARD_SENDER: &str = "0";

/// A value transfer waiting in (or frozen into) a block.
///
/// Nothing here is validated: amounts may be zero or negative and neither
/// party has to exist anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Reward credited to `recipient` for sealing a block.
    pub fn reward(recipient: impl Into<String>, amount: i64) -> Self {
        Self::new(REWARD_SENDER, recipient, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_uses_sentinel_sender() {
        let tx = Transaction::reward("node-a", 1);
        assert_eq!(tx.sender, "0");
        assert!(tx.is_reward());
        assert!(!Transaction::new("alice", "bob", 1).is_reward());
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let tx = Transaction::new("alice", "bob", -3);
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["sender"], "alice");
        assert_eq!(v["recipient"], "bob");
        assert_eq!(v["amount"], -3);
    }
}
