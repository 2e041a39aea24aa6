//! Strongly typed prompt configuration.
//!
//! The on-disk layout is a flat JSON object with one entry per agent plus a
//! `tasks` entry:
//!
//! ```json
//! {
//!   "planner": { "role": "...", "goal": "...", "backstory": "..." },
//!   "writer":  { "role": "...", "goal": "...", "backstory": "..." },
//!   "editor":  { "role": "...", "goal": "...", "backstory": "..." },
//!   "tasks":   { "plan": "...", "write": "...", "edit": "..." }
//! }
//! ```
//!
//! Missing entries (including an empty object) are filled from the built-in
//! defaults field by field, so a loaded [`PromptConfig`] always carries all
//! four top-level keys.

use std::fmt;
use std::str::FromStr;

use agent_primitives::{AgentRole, TaskKind};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Role, goal, and backstory for a single agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPrompt {
    /// Short role title, e.g. "Content Planner".
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Background framing for the agent.
    pub backstory: String,
}

impl AgentPrompt {
    /// Creates an agent prompt from its three parts.
    #[must_use]
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// Built-in prompt for the supplied agent.
    #[must_use]
    pub fn default_for(role: AgentRole) -> Self {
        match role {
            AgentRole::Planner => Self::new(
                "Content Planner",
                "Plan engaging and factually accurate content on the given topic",
                "You're working on planning a research report about a given topic.",
            ),
            AgentRole::Writer => Self::new(
                "Content Writer",
                "Write insightful and factually accurate research report",
                "You're working on writing a new opinion piece about a given topic.",
            ),
            AgentRole::Editor => Self::new(
                "Editor",
                "Edit a given blog post",
                "You are an editor who receives a research article from the Content Writer.",
            ),
        }
    }

    /// Returns the value of a single field.
    #[must_use]
    pub fn field(&self, field: AgentField) -> &str {
        match field {
            AgentField::Role => &self.role,
            AgentField::Goal => &self.goal,
            AgentField::Backstory => &self.backstory,
        }
    }

    fn field_mut(&mut self, field: AgentField) -> &mut String {
        match field {
            AgentField::Role => &mut self.role,
            AgentField::Goal => &mut self.goal,
            AgentField::Backstory => &mut self.backstory,
        }
    }
}

/// Task descriptions keyed by task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPrompts {
    /// Description of the planning task.
    pub plan: String,
    /// Description of the writing task.
    pub write: String,
    /// Description of the editing task.
    pub edit: String,
}

impl TaskPrompts {
    /// Returns the description of the supplied task.
    #[must_use]
    pub fn get(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Plan => &self.plan,
            TaskKind::Write => &self.write,
            TaskKind::Edit => &self.edit,
        }
    }

    fn get_mut(&mut self, kind: TaskKind) -> &mut String {
        match kind {
            TaskKind::Plan => &mut self.plan,
            TaskKind::Write => &mut self.write,
            TaskKind::Edit => &mut self.edit,
        }
    }

    /// Built-in description for the supplied task.
    #[must_use]
    pub fn default_for(kind: TaskKind) -> &'static str {
        match kind {
            TaskKind::Plan => "Plan content for the topic",
            TaskKind::Write => "Write a research article based on the content plan",
            TaskKind::Edit => "Edit and finalize the research article",
        }
    }
}

impl Default for TaskPrompts {
    fn default() -> Self {
        Self {
            plan: Self::default_for(TaskKind::Plan).to_owned(),
            write: Self::default_for(TaskKind::Write).to_owned(),
            edit: Self::default_for(TaskKind::Edit).to_owned(),
        }
    }
}

/// Editable prompt configuration driving the generation crew.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPromptConfig")]
pub struct PromptConfig {
    /// Planner agent prompt.
    pub planner: AgentPrompt,
    /// Writer agent prompt.
    pub writer: AgentPrompt,
    /// Editor agent prompt.
    pub editor: AgentPrompt,
    /// Task descriptions.
    pub tasks: TaskPrompts,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            planner: AgentPrompt::default_for(AgentRole::Planner),
            writer: AgentPrompt::default_for(AgentRole::Writer),
            editor: AgentPrompt::default_for(AgentRole::Editor),
            tasks: TaskPrompts::default(),
        }
    }
}

impl PromptConfig {
    /// Returns the prompt for the supplied agent.
    #[must_use]
    pub fn agent(&self, role: AgentRole) -> &AgentPrompt {
        match role {
            AgentRole::Planner => &self.planner,
            AgentRole::Writer => &self.writer,
            AgentRole::Editor => &self.editor,
        }
    }

    /// Returns a mutable reference to the prompt for the supplied agent.
    pub fn agent_mut(&mut self, role: AgentRole) -> &mut AgentPrompt {
        match role {
            AgentRole::Planner => &mut self.planner,
            AgentRole::Writer => &mut self.writer,
            AgentRole::Editor => &mut self.editor,
        }
    }

    /// Returns the description of the supplied task.
    #[must_use]
    pub fn task(&self, kind: TaskKind) -> &str {
        self.tasks.get(kind)
    }

    /// Reads a field by dotted key path (`planner.goal`, `tasks.edit`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] if the key does not name a field.
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        Ok(match key.parse::<FieldKey>()? {
            FieldKey::Agent(role, field) => self.agent(role).field(field),
            FieldKey::Task(kind) => self.task(kind),
        })
    }

    /// Replaces a field by dotted key path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] if the key does not name a field.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> ConfigResult<()> {
        self.set_field(key.parse()?, value);
        Ok(())
    }

    /// Replaces the field addressed by an already-parsed key.
    pub fn set_field(&mut self, key: FieldKey, value: impl Into<String>) {
        let slot = match key {
            FieldKey::Agent(role, field) => self.agent_mut(role).field_mut(field),
            FieldKey::Task(kind) => self.tasks.get_mut(kind),
        };
        *slot = value.into();
    }

    /// Iterates over every field as `(key, value)` in a stable order.
    pub fn entries(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        FieldKey::all().map(move |key| {
            let value = match key {
                FieldKey::Agent(role, field) => self.agent(role).field(field),
                FieldKey::Task(kind) => self.task(kind),
            };
            (key, value)
        })
    }
}

/// One of the three editable agent fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentField {
    /// The role title.
    Role,
    /// The goal statement.
    Goal,
    /// The backstory.
    Backstory,
}

impl AgentField {
    const ALL: [Self; 3] = [Self::Role, Self::Goal, Self::Backstory];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Goal => "goal",
            Self::Backstory => "backstory",
        }
    }
}

/// Dotted key path addressing one configuration field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKey {
    /// `<agent>.<field>`, e.g. `writer.backstory`.
    Agent(AgentRole, AgentField),
    /// `tasks.<task>`, e.g. `tasks.plan`.
    Task(TaskKind),
}

impl FieldKey {
    /// Every addressable key in display order.
    pub fn all() -> impl Iterator<Item = Self> {
        AgentRole::ALL
            .into_iter()
            .flat_map(|role| AgentField::ALL.map(|field| Self::Agent(role, field)))
            .chain(TaskKind::ALL.into_iter().map(Self::Task))
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent(role, field) => write!(f, "{role}.{}", field.as_str()),
            Self::Task(kind) => write!(f, "tasks.{kind}"),
        }
    }
}

impl FromStr for FieldKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigError::UnknownKey { key: s.to_owned() };
        let (head, tail) = s.split_once('.').ok_or_else(unknown)?;

        if head == "tasks" {
            return tail.parse::<TaskKind>().map(Self::Task).map_err(|_| unknown());
        }

        let role = head.parse::<AgentRole>().map_err(|_| unknown())?;
        let field = AgentField::ALL
            .into_iter()
            .find(|field| field.as_str() == tail)
            .ok_or_else(unknown)?;
        Ok(Self::Agent(role, field))
    }
}

#[derive(Deserialize)]
struct RawAgentPrompt {
    role: Option<String>,
    goal: Option<String>,
    backstory: Option<String>,
}

#[derive(Deserialize)]
struct RawTaskPrompts {
    plan: Option<String>,
    write: Option<String>,
    edit: Option<String>,
}

#[derive(Deserialize)]
struct RawPromptConfig {
    planner: Option<RawAgentPrompt>,
    writer: Option<RawAgentPrompt>,
    editor: Option<RawAgentPrompt>,
    tasks: Option<RawTaskPrompts>,
}

fn merge_agent(raw: Option<RawAgentPrompt>, role: AgentRole) -> AgentPrompt {
    let mut prompt = AgentPrompt::default_for(role);
    if let Some(raw) = raw {
        prompt.role = raw.role.unwrap_or(prompt.role);
        prompt.goal = raw.goal.unwrap_or(prompt.goal);
        prompt.backstory = raw.backstory.unwrap_or(prompt.backstory);
    }
    prompt
}

impl From<RawPromptConfig> for PromptConfig {
    fn from(raw: RawPromptConfig) -> Self {
        let mut tasks = TaskPrompts::default();
        if let Some(raw_tasks) = raw.tasks {
            tasks.plan = raw_tasks.plan.unwrap_or(tasks.plan);
            tasks.write = raw_tasks.write.unwrap_or(tasks.write);
            tasks.edit = raw_tasks.edit.unwrap_or(tasks.edit);
        }

        Self {
            planner: merge_agent(raw.planner, AgentRole::Planner),
            writer: merge_agent(raw.writer, AgentRole::Writer),
            editor: merge_agent(raw.editor, AgentRole::Editor),
            tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: PromptConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PromptConfig::default());
    }

    #[test]
    fn partial_object_is_completed_from_defaults() {
        let json = r#"{
            "writer": { "goal": "Write a short briefing" },
            "tasks": { "edit": "Proofread only" }
        }"#;
        let config: PromptConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.writer.goal, "Write a short briefing");
        assert_eq!(config.writer.role, "Content Writer");
        assert_eq!(config.tasks.edit, "Proofread only");
        assert_eq!(config.tasks.plan, "Plan content for the topic");
        assert_eq!(config.planner, AgentPrompt::default_for(AgentRole::Planner));
    }

    #[test]
    fn serializes_flat_layout() {
        let value = serde_json::to_value(PromptConfig::default()).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["editor", "planner", "tasks", "writer"]);
        assert_eq!(value["planner"]["role"], "Content Planner");
        assert_eq!(value["tasks"]["write"], "Write a research article based on the content plan");
    }

    #[test]
    fn key_paths_read_and_write_fields() {
        let mut config = PromptConfig::default();
        config.set("editor.backstory", "A meticulous copy editor.").unwrap();
        config.set("tasks.plan", "Outline the key findings").unwrap();

        assert_eq!(config.get("editor.backstory").unwrap(), "A meticulous copy editor.");
        assert_eq!(config.tasks.plan, "Outline the key findings");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = PromptConfig::default();
        for key in ["planner", "planner.mood", "reviewer.role", "tasks.review", ""] {
            let err = config.set(key, "x").expect_err("unknown key");
            assert!(matches!(err, ConfigError::UnknownKey { .. }), "{key}");
        }
        assert_eq!(config, PromptConfig::default());
    }

    #[test]
    fn entries_cover_every_key_once() {
        let config = PromptConfig::default();
        let keys: Vec<String> = config.entries().map(|(key, _)| key.to_string()).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys.first().map(String::as_str), Some("planner.role"));
        assert_eq!(keys.last().map(String::as_str), Some("tasks.edit"));
        for key in &keys {
            assert_eq!(key.parse::<FieldKey>().unwrap().to_string(), *key);
        }
    }
}
