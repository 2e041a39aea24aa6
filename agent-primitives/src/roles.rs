//! Agent roles and task kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the three agents in the generation crew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Produces the content plan from the transcript.
    Planner,
    /// Turns the plan into a draft article.
    Writer,
    /// Polishes the draft into the final article.
    Editor,
}

impl AgentRole {
    /// All roles in crew order.
    pub const ALL: [Self; 3] = [Self::Planner, Self::Writer, Self::Editor];

    /// Returns the lowercase key used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Writer => "writer",
            Self::Editor => "editor",
        }
    }

    /// Returns the task this agent is responsible for.
    #[must_use]
    pub const fn task(self) -> TaskKind {
        match self {
            Self::Planner => TaskKind::Plan,
            Self::Writer => TaskKind::Write,
            Self::Editor => TaskKind::Edit,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| Error::UnknownRole { name: s.to_owned() })
    }
}

/// One of the three sequential tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Content planning.
    Plan,
    /// Article drafting.
    Write,
    /// Final editing.
    Edit,
}

impl TaskKind {
    /// All tasks in execution order.
    pub const ALL: [Self; 3] = [Self::Plan, Self::Write, Self::Edit];

    /// Returns the lowercase key used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Write => "write",
            Self::Edit => "edit",
        }
    }

    /// Returns the agent assigned to this task.
    #[must_use]
    pub const fn agent(self) -> AgentRole {
        match self {
            Self::Plan => AgentRole::Planner,
            Self::Write => AgentRole::Writer,
            Self::Edit => AgentRole::Editor,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| Error::UnknownTask { name: s.to_owned() })
    }
}
