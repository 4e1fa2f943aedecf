//! Capability descriptors: the declared shape of tools, resources and prompts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The three families of capability a server can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// A schema-described callable.
    Tool,
    /// A URI-addressable readable.
    Resource,
    /// A parameterised text template.
    Prompt,
}

impl CapabilityKind {
    /// All kinds, in the order they are advertised.
    pub const ALL: [CapabilityKind; 3] = [Self::Tool, Self::Resource, Self::Prompt];

    /// Lowercase name used in failure messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared tool argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// Argument name.
    pub name: String,
    /// JSON Schema type (string, integer, number, boolean, object, array).
    #[serde(rename = "type")]
    pub arg_type: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Whether this argument is required.
    #[serde(default)]
    pub required: bool,
    /// Allowed values, rendered as a JSON Schema `enum`.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

impl ArgumentSpec {
    /// A required argument.
    pub fn required(
        name: impl Into<String>,
        arg_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            arg_type: arg_type.into(),
            description: description.into(),
            required: true,
            allowed: Vec::new(),
        }
    }

    /// An optional argument.
    pub fn optional(
        name: impl Into<String>,
        arg_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, arg_type, description)
        }
    }

    /// Restricts the argument to a fixed set of values.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = values.iter().map(|v| (*v).to_string()).collect();
        self
    }
}

/// A named prompt argument. Prompt arguments are always strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    #[serde(default)]
    pub required: bool,
}

impl PromptArgument {
    /// Creates a prompt argument.
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required,
        }
    }
}

/// What a capability accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySchema {
    /// JSON Schema object for tool input.
    Input(Value),
    /// URI template for a resource, e.g. `stock://{symbol}/earnings`.
    Template {
        uri_template: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// Declared prompt arguments.
    Arguments(Vec<PromptArgument>),
}

/// Metadata for one registered capability. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Tool, resource or prompt.
    pub kind: CapabilityKind,
    /// Unique within `kind`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Accepted inputs.
    pub schema: CapabilitySchema,
}

impl CapabilityDescriptor {
    /// Describes a tool whose input schema is built from `arguments`.
    pub fn tool(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: &[ArgumentSpec],
    ) -> Self {
        Self::tool_with_schema(name, description, build_input_schema(arguments))
    }

    /// Describes a tool with a hand-written JSON Schema.
    pub fn tool_with_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            kind: CapabilityKind::Tool,
            name: name.into(),
            description: description.into(),
            schema: CapabilitySchema::Input(input_schema),
        }
    }

    /// Describes a resource addressed by a URI template.
    pub fn resource(
        name: impl Into<String>,
        description: impl Into<String>,
        uri_template: impl Into<String>,
        mime_type: Option<&str>,
    ) -> Self {
        Self {
            kind: CapabilityKind::Resource,
            name: name.into(),
            description: description.into(),
            schema: CapabilitySchema::Template {
                uri_template: uri_template.into(),
                mime_type: mime_type.map(str::to_string),
            },
        }
    }

    /// Describes a prompt.
    pub fn prompt(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Vec<PromptArgument>,
    ) -> Self {
        Self {
            kind: CapabilityKind::Prompt,
            name: name.into(),
            description: description.into(),
            schema: CapabilitySchema::Arguments(arguments),
        }
    }

    /// The JSON Schema arguments are validated against, if any.
    ///
    /// Prompts get a synthesised schema (every argument is a string).
    /// Resources have none: their inputs come from the URI match.
    pub fn input_schema(&self) -> Option<Value> {
        match &self.schema {
            CapabilitySchema::Input(schema) => Some(schema.clone()),
            CapabilitySchema::Arguments(args) => {
                let specs: Vec<ArgumentSpec> = args
                    .iter()
                    .map(|a| ArgumentSpec {
                        name: a.name.clone(),
                        arg_type: "string".to_string(),
                        description: a.description.clone().unwrap_or_default(),
                        required: a.required,
                        allowed: Vec::new(),
                    })
                    .collect();
                Some(build_input_schema(&specs))
            }
            CapabilitySchema::Template { .. } => None,
        }
    }

    /// The URI template, for resources.
    pub fn uri_template(&self) -> Option<&str> {
        match &self.schema {
            CapabilitySchema::Template { uri_template, .. } => Some(uri_template),
            _ => None,
        }
    }

    /// The MIME type, for resources that declare one.
    pub fn mime_type(&self) -> Option<&str> {
        match &self.schema {
            CapabilitySchema::Template { mime_type, .. } => mime_type.as_deref(),
            _ => None,
        }
    }
}

/// Builds a JSON Schema `inputSchema` from tool arguments.
pub fn build_input_schema(arguments: &[ArgumentSpec]) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for arg in arguments {
        let mut prop = serde_json::Map::new();
        prop.insert("type".to_string(), Value::String(arg.arg_type.clone()));
        if !arg.description.is_empty() {
            prop.insert(
                "description".to_string(),
                Value::String(arg.description.clone()),
            );
        }
        if !arg.allowed.is_empty() {
            prop.insert(
                "enum".to_string(),
                Value::Array(arg.allowed.iter().cloned().map(Value::String).collect()),
            );
        }
        properties.insert(arg.name.clone(), Value::Object(prop));
        if arg.required {
            required.push(Value::String(arg.name.clone()));
        }
    }

    let mut schema = serde_json::Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), Value::Array(required));

    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_input_schema_empty_args() {
        let schema = build_input_schema(&[]);
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].as_object().expect("obj").is_empty());
        assert!(schema["required"].as_array().expect("arr").is_empty());
    }

    #[test]
    fn build_input_schema_with_args() {
        let args = vec![
            ArgumentSpec::required("slug", "string", "Unique slug for the note"),
            ArgumentSpec::optional("root", "string", "Optional root URI filter"),
        ];
        let schema = build_input_schema(&args);
        assert_eq!(schema["properties"]["slug"]["type"], "string");
        assert_eq!(
            schema["properties"]["root"]["description"],
            "Optional root URI filter"
        );
        let req = schema["required"].as_array().expect("arr");
        assert_eq!(req.len(), 1);
        assert_eq!(req[0], "slug");
    }

    #[test]
    fn one_of_renders_enum() {
        let arg = ArgumentSpec::required("side", "string", "").one_of(&["buy", "sell"]);
        let schema = build_input_schema(&[arg]);
        assert_eq!(
            schema["properties"]["side"]["enum"],
            serde_json::json!(["buy", "sell"])
        );
        assert!(schema["properties"]["side"].get("description").is_none());
    }

    #[test]
    fn prompt_schema_is_all_strings() {
        let d = CapabilityDescriptor::prompt(
            "git-commit",
            "commit message",
            vec![PromptArgument::new("changes", "the diff", true)],
        );
        let schema = d.input_schema().expect("schema");
        assert_eq!(schema["properties"]["changes"]["type"], "string");
        assert_eq!(schema["required"][0], "changes");
    }

    #[test]
    fn resource_exposes_template_and_mime() {
        let d = CapabilityDescriptor::resource(
            "Stock Earnings",
            "earnings",
            "stock://{symbol}/earnings",
            Some("application/json"),
        );
        assert_eq!(d.kind, CapabilityKind::Resource);
        assert_eq!(d.uri_template(), Some("stock://{symbol}/earnings"));
        assert_eq!(d.mime_type(), Some("application/json"));
        assert!(d.input_schema().is_none());
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(CapabilityKind::Tool.to_string(), "tool");
        assert_eq!(CapabilityKind::Resource.to_string(), "resource");
        assert_eq!(CapabilityKind::Prompt.to_string(), "prompt");
    }
}
