//! Structured generation adapters.
//!
//! A [`StructuredAdapter<T>`] is built once per (prompt, schema) pair at
//! startup. Each call renders the prompt, invokes the generator and runs
//! [`coerce`] exactly once on the raw output. Nothing but a fully validated
//! `T` ever leaves the adapter.

use std::marker::PhantomData;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::template::{PromptTemplate, Variables};
use super::{GenerationOutput, GenerationRequest, Generator, OutputSchema};
use crate::error::CoreResult;

/// Variable name the adapter fills with the schema's format instructions.
pub const FORMAT_INSTRUCTIONS: &str = "format_instructions";

/// A record type that can be requested from the generator.
pub trait GenerationSchema: DeserializeOwned + JsonSchema {
    /// Short identifier used in requests and error messages.
    const NAME: &'static str;

    /// Semantic checks beyond what deserialization enforces.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// The generator's output could not be turned into the requested record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {schema} generation output: {reason}")]
pub struct MalformedOutput {
    pub schema: &'static str,
    pub reason: String,
}

impl MalformedOutput {
    pub fn new(schema: &'static str, reason: impl Into<String>) -> Self {
        Self {
            schema,
            reason: reason.into(),
        }
    }
}

/// Interpret raw generator output as a `T`.
///
/// Structured output is deserialized as-is. Text output is stripped of a
/// surrounding code fence, parsed as a JSON object (falling back to the
/// outermost `{...}` span), then deserialized. The record must pass
/// [`GenerationSchema::validate`].
pub fn coerce<T: GenerationSchema>(output: GenerationOutput) -> Result<T, MalformedOutput> {
    let value = match output {
        GenerationOutput::Structured(value) => value,
        GenerationOutput::Text(text) => parse_mapping(&text).map_err(|e| MalformedOutput::new(T::NAME, e))?,
    };

    if !value.is_object() {
        return Err(MalformedOutput::new(T::NAME, "expected a JSON object"));
    }

    let record: T =
        serde_json::from_value(value).map_err(|e| MalformedOutput::new(T::NAME, e.to_string()))?;
    record
        .validate()
        .map_err(|reason| MalformedOutput::new(T::NAME, reason))?;
    Ok(record)
}

fn parse_mapping(text: &str) -> Result<Value, String> {
    let body = strip_code_fence(text.trim());
    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(value),
        Err(first) => match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])
                .map_err(|e| format!("text does not contain a JSON object: {e}")),
            _ => Err(format!("text is not JSON: {first}")),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn format_instructions(schema: &Value) -> String {
    format!(
        "Respond with exactly one JSON object that conforms to the JSON Schema below. \
         Output only the JSON object, with no commentary and no code fences.\n{schema}"
    )
}

/// Prompt template + output schema + generator, producing validated `T`s.
pub struct StructuredAdapter<T> {
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    schema: OutputSchema,
    _record: PhantomData<fn() -> T>,
}

impl<T: GenerationSchema> StructuredAdapter<T> {
    pub fn new(generator: Arc<dyn Generator>, template: PromptTemplate) -> Self {
        let root = schemars::schema_for!(T);
        let schema = serde_json::to_value(&root).unwrap_or(Value::Null);
        Self {
            generator,
            template,
            schema: OutputSchema {
                name: T::NAME,
                schema,
            },
            _record: PhantomData,
        }
    }

    /// Render the prompt with `variables`, generate and coerce.
    ///
    /// The adapter supplies [`FORMAT_INSTRUCTIONS`] itself.
    pub async fn generate(&self, variables: Variables) -> CoreResult<T> {
        let variables = variables.text(FORMAT_INSTRUCTIONS, format_instructions(&self.schema.schema));
        let prompt = self.template.render(&variables)?;

        debug!(
            template = self.template.name(),
            profile = self.generator.profile(),
            prompt_len = prompt.len(),
            "requesting structured generation"
        );

        let output = self
            .generator
            .generate(GenerationRequest {
                prompt,
                schema: Some(self.schema.clone()),
            })
            .await?;

        coerce::<T>(output).map_err(|e| {
            warn!(template = self.template.name(), error = %e, "generation output rejected");
            e.into()
        })
    }
}

/// Prompt template + generator, producing free text.
pub struct TextAdapter {
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
}

impl TextAdapter {
    const NAME: &'static str = "text";

    pub fn new(generator: Arc<dyn Generator>, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
        }
    }

    pub async fn generate(&self, variables: Variables) -> CoreResult<String> {
        let prompt = self.template.render(&variables)?;

        debug!(
            template = self.template.name(),
            profile = self.generator.profile(),
            "requesting text generation"
        );

        let output = self
            .generator
            .generate(GenerationRequest {
                prompt,
                schema: None,
            })
            .await?;

        let text = match output {
            GenerationOutput::Text(text) => text,
            GenerationOutput::Structured(Value::String(text)) => text,
            GenerationOutput::Structured(other) => other.to_string(),
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(MalformedOutput::new(Self::NAME, "empty response").into());
        }
        Ok(text.to_owned())
    }
}
