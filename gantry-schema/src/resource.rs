use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Observed lifecycle state of a managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// No query has been performed yet, or the last outcome is unknown.
    #[default]
    Unknown,
    Running,
    Stopped,
    /// A start/stop command is in flight.
    Transitioning,
    /// The runtime refused the last command.
    Error,
    NotFound,
}

impl ResourceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceState::Unknown => "unknown",
            ResourceState::Running => "running",
            ResourceState::Stopped => "stopped",
            ResourceState::Transitioning => "transitioning",
            ResourceState::Error => "error",
            ResourceState::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Start,
    Stop,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::Start => "start",
            LifecycleAction::Stop => "stop",
        }
    }

    /// State the resource is in once this action has taken effect.
    pub fn target_state(self) -> ResourceState {
        match self {
            LifecycleAction::Start => ResourceState::Running,
            LifecycleAction::Stop => ResourceState::Stopped,
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action `{}`", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for LifecycleAction {
    type Err = UnknownAction;

    /// Matching is exact: `Start` or ` stop` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(LifecycleAction::Start),
            "stop" => Ok(LifecycleAction::Stop),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub name: String,
    pub state: ResourceState,
    pub observed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of a successful `POST /resource/{action}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandResponse {
    pub message: String,
    pub status: ResourceState,
    pub resource: ResourceSnapshot,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_is_exact() {
        assert_eq!("start".parse::<LifecycleAction>(), Ok(LifecycleAction::Start));
        assert_eq!("stop".parse::<LifecycleAction>(), Ok(LifecycleAction::Stop));
        assert!("Start".parse::<LifecycleAction>().is_err());
        assert!("restart".parse::<LifecycleAction>().is_err());
        assert!("".parse::<LifecycleAction>().is_err());
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&ResourceState::NotFound).expect("serialize");
        assert_eq!(json, r#""not_found""#);
        assert_eq!(ResourceState::NotFound.to_string(), "not_found");
    }

    #[test]
    fn action_target_state() {
        assert_eq!(
            LifecycleAction::Start.target_state(),
            ResourceState::Running
        );
        assert_eq!(LifecycleAction::Stop.target_state(), ResourceState::Stopped);
    }
}
