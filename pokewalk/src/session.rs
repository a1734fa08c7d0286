use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::GUEST_KEY;
use crate::remote::{PlayerDto, PlayerId, RemoteInventory};

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Account {
    #[default]
    Guest,
    Player { id: PlayerId, name: String },
}

impl Account {
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            Account::Guest => None,
            Account::Player { id, .. } => Some(*id),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.player_id().is_some()
    }

    /// Inventory cache key for this account.
    pub fn cache_key(&self) -> String {
        match self {
            Account::Guest => GUEST_KEY.to_string(),
            Account::Player { id, .. } => format!("player-{id}"),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Account::Guest => "guest".to_string(),
            Account::Player { id, name } if name.is_empty() => format!("#{id}"),
            Account::Player { name, .. } => name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum LoginOutcome {
    Bound(PlayerDto),
    /// The remote no longer knows this player.
    Stale(PlayerId),
    /// Could not reach the remote in time; play continues bound to the id.
    Unreachable { id: PlayerId, reason: String },
}

impl LoginOutcome {
    pub fn account(&self) -> Account {
        match self {
            LoginOutcome::Bound(player) => Account::Player {
                id: player.id,
                name: player.name.clone(),
            },
            LoginOutcome::Stale(_) => Account::Guest,
            LoginOutcome::Unreachable { id, .. } => Account::Player {
                id: *id,
                name: String::new(),
            },
        }
    }
}

/// Checks that `id` exists remotely, giving up after `timeout`.
pub async fn login(remote: &dyn RemoteInventory, id: PlayerId, timeout: Duration) -> LoginOutcome {
    match tokio::time::timeout(timeout, remote.fetch_player(id)).await {
        Ok(Ok(player)) => {
            tracing::info!(player_id = id, name = %player.name, "account bound");
            LoginOutcome::Bound(player)
        }
        Ok(Err(error)) if error.is_not_found() => {
            tracing::warn!(player_id = id, "stored account no longer exists");
            LoginOutcome::Stale(id)
        }
        Ok(Err(error)) => {
            tracing::warn!(player_id = id, %error, "login fetch failed");
            LoginOutcome::Unreachable {
                id,
                reason: error.to_string(),
            }
        }
        Err(_) => {
            tracing::warn!(player_id = id, ?timeout, "login fetch timed out");
            LoginOutcome::Unreachable {
                id,
                reason: "timed out".to_string(),
            }
        }
    }
}
