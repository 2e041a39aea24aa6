//! Prompt text for crew agents and tasks.

use std::sync::LazyLock;

use crate::template::{PromptTemplate, TemplateResult};

static AGENT_SYSTEM: LazyLock<PromptTemplate> = LazyLock::new(|| {
    PromptTemplate::new("You are {{role}}. {{backstory}}\nYour personal goal is: {{goal}}")
});

static TASK: LazyLock<PromptTemplate> = LazyLock::new(|| {
    PromptTemplate::new(
        "Current Task: {{description}}\n\n\
         Begin! Give your complete and final answer to the task, not a summary of it.",
    )
});

static TASK_WITH_CONTEXT: LazyLock<PromptTemplate> = LazyLock::new(|| {
    PromptTemplate::new(
        "Current Task: {{description}}\n\n\
         This is the context you're working with:\n{{context}}\n\n\
         Begin! Give your complete and final answer to the task, not a summary of it.",
    )
});

/// Renders the system prompt that gives an agent its persona.
///
/// # Errors
///
/// Propagates template rendering failures.
pub fn agent_system_prompt(role: &str, goal: &str, backstory: &str) -> TemplateResult<String> {
    AGENT_SYSTEM.render(&[("role", role), ("goal", goal), ("backstory", backstory)])
}

/// Renders the user message for a task, including the output of the
/// previous task when there is one.
///
/// # Errors
///
/// Propagates template rendering failures.
pub fn task_prompt(description: &str, context: Option<&str>) -> TemplateResult<String> {
    match context {
        Some(context) => {
            TASK_WITH_CONTEXT.render(&[("description", description), ("context", context)])
        }
        None => TASK.render(&[("description", description)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_prompt_includes_persona() {
        let prompt = agent_system_prompt(
            "Editor",
            "Edit a given blog post",
            "You are an editor who receives a research article from the Content Writer.",
        )
        .unwrap();

        assert_eq!(
            prompt,
            "You are Editor. You are an editor who receives a research article from the Content Writer.\n\
             Your personal goal is: Edit a given blog post"
        );
    }

    #[test]
    fn task_prompt_without_context() {
        let prompt = task_prompt("Plan content for the topic: hello", None).unwrap();
        assert!(prompt.starts_with("Current Task: Plan content for the topic: hello\n\n"));
        assert!(!prompt.contains("context you're working with"));
    }

    #[test]
    fn task_prompt_with_context() {
        let prompt = task_prompt("Write the article", Some("1. Intro\n2. Findings")).unwrap();
        assert!(prompt.contains("This is the context you're working with:\n1. Intro\n2. Findings"));
    }

    #[test]
    fn braces_in_user_text_survive() {
        let prompt = task_prompt("Summarise {{this}}", Some("{{context}}")).unwrap();
        assert!(prompt.contains("Summarise {{this}}"));
        assert!(prompt.contains("\n{{context}}\n"));
    }
}
