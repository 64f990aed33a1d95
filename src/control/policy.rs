use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ControlError;

/// Notification channel a reminder level dispatches through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Channel {
    Email,
    Letter,
}

/// One reminder step of a policy: how many days overdue before it
/// applies, how it is delivered, and the message it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyLevel {
    pub id: Uuid,
    pub name: String,
    pub delay_days: i64,
    pub channel: Channel,
    #[serde(default)]
    pub block_account: bool,
    #[serde(default)]
    pub custom_text: String,
}

impl PolicyLevel {
    pub fn new(name: impl Into<String>, delay_days: i64, channel: Channel) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            delay_days,
            channel,
            block_account: false,
            custom_text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.custom_text = text.into();
        self
    }

    pub fn blocking(mut self) -> Self {
        self.block_account = true;
        self
    }
}

/// A dunning policy: an ordered escalation ladder applied to the
/// receivable accounts it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub account_ids: Vec<Uuid>,
    #[serde(default)]
    pub levels: Vec<PolicyLevel>,
}

impl Policy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            account_ids: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// Appends a level, rejecting any delay that does not strictly
    /// exceed the previous level's.
    pub fn push_level(&mut self, level: PolicyLevel) -> Result<(), ControlError> {
        if let Some(last) = self.levels.last() {
            if level.delay_days <= last.delay_days {
                return Err(ControlError::LevelOrdering {
                    policy: self.name.clone(),
                    previous: last.delay_days,
                    next: level.delay_days,
                });
            }
        }
        self.levels.push(level);
        Ok(())
    }

    pub fn assign_account(&mut self, account_id: Uuid) {
        if !self.account_ids.contains(&account_id) {
            self.account_ids.push(account_id);
        }
    }

    pub fn covers_account(&self, account_id: Uuid) -> bool {
        self.account_ids.contains(&account_id)
    }

    pub fn level(&self, index: usize) -> Option<&PolicyLevel> {
        self.levels.get(index)
    }

    /// Re-checks the level ordering invariant, for policies built from
    /// deserialized data rather than `push_level`.
    pub fn validate(&self) -> Result<(), ControlError> {
        for pair in self.levels.windows(2) {
            if pair[1].delay_days <= pair[0].delay_days {
                return Err(ControlError::LevelOrdering {
                    policy: self.name.clone(),
                    previous: pair[0].delay_days,
                    next: pair[1].delay_days,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_level_rejects_non_increasing_delay() {
        let mut policy = Policy::new("3 time policy");
        policy
            .push_level(PolicyLevel::new("First reminder", 15, Channel::Email))
            .unwrap();
        let err = policy
            .push_level(PolicyLevel::new("Too early", 15, Channel::Email))
            .expect_err("equal delay must be rejected");
        assert!(
            matches!(err, ControlError::LevelOrdering { previous: 15, next: 15, .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(policy.levels.len(), 1);
    }

    #[test]
    fn validate_catches_out_of_order_deserialized_levels() {
        let mut policy = Policy::new("Loose");
        policy.levels = vec![
            PolicyLevel::new("A", 30, Channel::Email),
            PolicyLevel::new("B", 10, Channel::Letter),
        ];
        assert!(policy.validate().is_err());
    }
}
