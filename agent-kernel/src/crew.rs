//! Sequential crew of agents and tasks.
//!
//! A [`Crew`] runs its tasks in order. Each task is a single chat request:
//! the assigned agent's persona is the system prompt and the task
//! description (plus the previous task's output as context) is the user
//! message. The crew's result is the output of the last task.

use std::time::Instant;

use agent_adapters::traits::{
    AdapterError, InferenceRequest, MessageRole, ModelAdapter, PromptMessage,
};
use agent_config::{AgentPrompt, PromptConfig, Temperature};
use agent_primitives::{AgentRole, TaskKind};
use agent_prompts::{TemplateError, agent_system_prompt, task_prompt};
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while assembling agents and tasks.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// A required prompt field was blank.
    #[error("`{key}` must not be empty")]
    EmptyField {
        /// Dotted key of the blank field.
        key: String,
    },

    /// A prompt could not be rendered.
    #[error("failed to render prompt: {source}")]
    Prompt {
        /// Template failure.
        #[from]
        source: TemplateError,
    },
}

/// A task failed while the crew was running.
#[derive(Debug, Error)]
#[error("task `{task}` failed: {source}")]
pub struct ExecutionError {
    /// Task that failed.
    pub task: TaskKind,
    /// Underlying adapter failure.
    #[source]
    pub source: AdapterError,
}

/// An agent with a rendered persona.
#[derive(Clone, Debug)]
pub struct Agent {
    role: AgentRole,
    title: String,
    system_prompt: String,
    temperature: Temperature,
}

impl Agent {
    /// Builds an agent from its configured prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyField`] if the role or goal is blank.
    pub fn new(
        role: AgentRole,
        prompt: &AgentPrompt,
        temperature: Temperature,
    ) -> Result<Self, ConstructionError> {
        require(&prompt.role, || format!("{role}.role"))?;
        require(&prompt.goal, || format!("{role}.goal"))?;

        let system_prompt =
            agent_system_prompt(prompt.role.trim(), prompt.goal.trim(), prompt.backstory.trim())?;

        Ok(Self {
            role,
            title: prompt.role.trim().to_owned(),
            system_prompt,
            temperature,
        })
    }

    /// The crew slot this agent fills.
    #[must_use]
    pub const fn role(&self) -> AgentRole {
        self.role
    }

    /// The configured role title (e.g. "Content Planner").
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The rendered persona sent as the system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// A unit of work assigned to one agent.
#[derive(Clone, Debug)]
pub struct Task {
    kind: TaskKind,
    description: String,
}

impl Task {
    /// Builds a task from its description.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::EmptyField`] if the description is blank.
    pub fn new(kind: TaskKind, description: impl Into<String>) -> Result<Self, ConstructionError> {
        let description = description.into();
        require(&description, || format!("tasks.{kind}"))?;
        Ok(Self { kind, description })
    }

    /// Which task this is.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The full task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Output of a single task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskOutput {
    /// Task that produced the output.
    pub task: TaskKind,
    /// Role title of the agent that ran the task.
    pub agent: String,
    /// Model answer.
    pub output: String,
}

/// Outputs of every task, in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrewOutput {
    tasks: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Per-task outputs in execution order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskOutput] {
        &self.tasks
    }

    /// Output of the last task (the finished article).
    #[must_use]
    pub fn final_output(&self) -> &str {
        self.tasks.last().map_or("", |task| task.output.as_str())
    }
}

/// Ordered set of agents and tasks.
#[derive(Clone, Debug)]
pub struct Crew {
    agents: Vec<Agent>,
    tasks: Vec<Task>,
}

impl Crew {
    /// Assembles the planner/writer/editor crew. The plan task receives the
    /// transcript appended to its description.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError`] if any prompt field is blank or a prompt
    /// fails to render.
    pub fn from_config(
        config: &PromptConfig,
        transcript: &str,
        temperature: Temperature,
    ) -> Result<Self, ConstructionError> {
        let agents = AgentRole::ALL
            .into_iter()
            .map(|role| Agent::new(role, config.agent(role), temperature))
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = TaskKind::ALL
            .into_iter()
            .map(|kind| {
                let description = config.task(kind).trim();
                require(description, || format!("tasks.{kind}"))?;
                match kind {
                    TaskKind::Plan => Task::new(kind, format!("{description}: {transcript}")),
                    TaskKind::Write | TaskKind::Edit => Task::new(kind, description),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(agents = agents.len(), tasks = tasks.len(), "crew assembled");
        Ok(Self { agents, tasks })
    }

    /// Agents in crew order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Tasks in execution order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn agent_for(&self, task: &Task) -> Option<&Agent> {
        let role = task.kind().agent();
        self.agents.iter().find(|agent| agent.role() == role)
    }

    /// Runs every task in order, feeding each output to the next task.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] for the first task that fails; later tasks
    /// are not run.
    pub async fn kickoff(&self, adapter: &dyn ModelAdapter) -> Result<CrewOutput, ExecutionError> {
        let mut output = CrewOutput::default();

        for task in &self.tasks {
            let fail = |source: AdapterError| ExecutionError {
                task: task.kind(),
                source,
            };
            let agent = self.agent_for(task).ok_or_else(|| {
                fail(AdapterError::invalid_request(format!(
                    "no agent assigned to task `{}`",
                    task.kind()
                )))
            })?;

            let context = output.tasks.last().map(|previous| previous.output.as_str());
            let message = task_prompt(task.description(), context)
                .map_err(|err| fail(AdapterError::invalid_request(err.to_string())))?;
            let request = InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, message)])
                .map_err(fail)?
                .with_system_prompt(agent.system_prompt())
                .with_temperature(agent.temperature.value());

            info!(task = %task.kind(), agent = agent.title(), "task started");
            let started = Instant::now();
            let answer = collect_answer(adapter, request).await.map_err(fail)?;
            info!(
                task = %task.kind(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                chars = answer.len(),
                "task finished"
            );

            output.tasks.push(TaskOutput {
                task: task.kind(),
                agent: agent.title().to_owned(),
                output: answer,
            });
        }

        Ok(output)
    }
}

pub(crate) async fn collect_answer(
    adapter: &dyn ModelAdapter,
    request: InferenceRequest,
) -> Result<String, AdapterError> {
    let mut stream = adapter.infer(request).await?;
    let mut answer = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        answer.push_str(&chunk.delta);
        if chunk.done {
            break;
        }
    }
    Ok(answer)
}

fn require(value: &str, key: impl FnOnce() -> String) -> Result<(), ConstructionError> {
    if value.trim().is_empty() {
        Err(ConstructionError::EmptyField { key: key() })
    } else {
        Ok(())
    }
}
