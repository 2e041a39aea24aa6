//! Prompt templates with `{{variable}}` placeholders.

use std::collections::HashMap;
use std::fmt;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template operations.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder had no value supplied.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// A `{{` was never closed.
    #[error("unterminated placeholder at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening braces.
        offset: usize,
    },
}

/// A prompt template.
///
/// Every `{{name}}` placeholder must be bound at render time. Rendering is a
/// single pass: substituted values are copied verbatim and never scanned for
/// further placeholders, so user text containing braces is safe to insert.
///
/// # Examples
///
/// ```
/// use agent_prompts::template::PromptTemplate;
///
/// let template = PromptTemplate::new("You are {{role}}.");
/// let rendered = template.render(&[("role", "an editor")]).unwrap();
/// assert_eq!(rendered, "You are an editor.");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Creates a template from raw text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Renders the template with the supplied bindings.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if a placeholder is unbound
    /// and [`TemplateError::Unterminated`] for an unclosed placeholder.
    pub fn render(&self, bindings: &[(&str, &str)]) -> TemplateResult<String> {
        let lookup: HashMap<&str, &str> = bindings.iter().copied().collect();
        let mut out = String::with_capacity(self.text.len());

        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = lookup.get(name).ok_or_else(|| TemplateError::MissingVariable {
                        name: name.to_owned(),
                    })?;
                    out.push_str(value);
                }
            }
        }

        Ok(out)
    }

    fn segments(&self) -> TemplateResult<Vec<Segment<'_>>> {
        let mut segments = Vec::new();
        let mut rest = self.text.as_str();
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(&rest[..open]));
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or(TemplateError::Unterminated { offset: offset + open })?;
            segments.push(Segment::Variable(after_open[..close].trim()));

            let consumed = open + 2 + close + 2;
            rest = &rest[consumed..];
            offset += consumed;
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }
        Ok(segments)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_multiple_variables() {
        let template = PromptTemplate::new("{{greeting}} {{ name }}, {{question}}");
        let rendered = template
            .render(&[("greeting", "Hello"), ("name", "Alice"), ("question", "how are you?")])
            .unwrap();
        assert_eq!(rendered, "Hello Alice, how are you?");
    }

    #[test]
    fn missing_binding_is_an_error() {
        let err = PromptTemplate::new("Hello {{name}}!").render(&[]).expect_err("unbound");
        assert!(matches!(err, TemplateError::MissingVariable { name } if name == "name"));
    }

    #[test]
    fn inserted_values_are_not_re_expanded() {
        let template = PromptTemplate::new("Transcript: {{transcript}}");
        let rendered = template
            .render(&[("transcript", "literal {{role}} braces"), ("role", "x")])
            .unwrap();
        assert_eq!(rendered, "Transcript: literal {{role}} braces");
    }

    #[test]
    fn unterminated_placeholder_is_reported() {
        let err = PromptTemplate::new("ok {{broken").render(&[]).expect_err("unterminated");
        assert!(matches!(err, TemplateError::Unterminated { offset: 3 }));
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let template = PromptTemplate::new("single } brace { text");
        assert_eq!(template.render(&[]).unwrap(), "single } brace { text");
    }
}
