use schemars::gen::SchemaSettings;
use serde_json::Value;
use tracing::debug;
use trailblaze_core_types::ToolError;

use super::*;
use crate::llm_client::{ToolCall, ToolDescriptor};
use crate::step::PromptStep;

type Decoder = fn(Value) -> Result<TrailblazeTool, serde_json::Error>;

/// Registered tool: descriptor sent to the model plus its decoder.
#[derive(Clone)]
pub struct ToolDefinition {
    pub descriptor: ToolDescriptor,
    /// Argument names the schema marks as required.
    pub required: Vec<String>,
    pub read_only: bool,
    decode: Decoder,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.descriptor.name)
            .field("required", &self.required)
            .field("read_only", &self.read_only)
            .finish()
    }
}

fn decode<T: ToolKind>(args: Value) -> Result<TrailblazeTool, serde_json::Error> {
    serde_json::from_value::<T>(args).map(Into::into)
}

impl ToolDefinition {
    pub fn of<T: ToolKind>() -> Self {
        let root = SchemaSettings::draft07()
            .with(|settings| {
                settings.inline_subschemas = true;
                settings.meta_schema = None;
            })
            .into_generator()
            .into_root_schema_for::<T>();

        let description = root
            .schema
            .metadata
            .as_ref()
            .and_then(|meta| meta.description.clone())
            .unwrap_or_default();
        let required = root
            .schema
            .object
            .as_ref()
            .map(|object| object.required.iter().cloned().collect())
            .unwrap_or_default();

        let mut parameters = serde_json::to_value(&root.schema).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut parameters {
            map.remove("title");
            map.remove("description");
        }

        Self {
            descriptor: ToolDescriptor {
                name: T::NAME.to_string(),
                description,
                parameters,
            },
            required,
            read_only: T::READ_ONLY,
            decode: decode::<T>,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Name-keyed registry the resolver looks tools up in.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_default_tools()
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }

    /// Registry holding the full built-in catalogue.
    pub fn with_default_tools() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<ObjectiveStatusTool>()
            .register::<TapOnPointTool>()
            .register::<TapOnElementWithTextTool>()
            .register::<InputTextTool>()
            .register::<EraseTextTool>()
            .register::<HideKeyboardTool>()
            .register::<PressBackTool>()
            .register::<OpenUrlTool>()
            .register::<LaunchAppTool>()
            .register::<SwipeTool>()
            .register::<WaitTool>()
            .register::<ScrollUntilTextIsVisibleTool>()
            .register::<AssertVisibleWithTextTool>()
            .register::<RememberTextTool>()
            .register::<DumpMemoryTool>();
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register<T: ToolKind>(&mut self) -> &mut Self {
        self.definitions.retain(|definition| definition.name() != T::NAME);
        self.definitions.push(ToolDefinition::of::<T>());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.name() == name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Tools offered for a step. Verification steps only get read-only tools.
    pub fn descriptors_for_step(&self, step: &PromptStep) -> Vec<ToolDescriptor> {
        self.definitions
            .iter()
            .filter(|definition| !step.is_verification() || definition.read_only)
            .map(|definition| definition.descriptor.clone())
            .collect()
    }

    /// Turn a model tool call into a concrete tool.
    pub fn resolve(&self, call: &ToolCall) -> Result<TrailblazeTool, ToolError> {
        let definition = self.get(&call.tool_name).ok_or_else(|| unknown_tool(call))?;
        Self::decode_call(definition, call)
    }

    /// Like [`resolve`](Self::resolve), limited to the tools offered for `step`.
    pub fn resolve_for_step(
        &self,
        call: &ToolCall,
        step: &PromptStep,
    ) -> Result<TrailblazeTool, ToolError> {
        let definition = self
            .get(&call.tool_name)
            .filter(|definition| !step.is_verification() || definition.read_only)
            .ok_or_else(|| unknown_tool(call))?;
        Self::decode_call(definition, call)
    }

    fn decode_call(definition: &ToolDefinition, call: &ToolCall) -> Result<TrailblazeTool, ToolError> {

        let missing: Vec<String> = definition
            .required
            .iter()
            .filter(|name| matches!(call.raw_arguments.get(*name), None | Some(Value::Null)))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::MissingRequiredArgs {
                function_name: call.tool_name.clone(),
                function_args: call.raw_arguments.clone(),
                required_args: missing,
            });
        }

        (definition.decode)(Value::Object(call.raw_arguments.clone())).map_err(|err| {
            debug!(tool = %call.tool_name, "tool arguments rejected: {}", err);
            unknown_tool(call)
        })
    }
}

fn unknown_tool(call: &ToolCall) -> ToolError {
    ToolError::UnknownTool {
        function_name: call.tool_name.clone(),
        function_args: call.raw_arguments.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::{ScrollDirection, ScrollStartPosition};
    use serde_json::json;

    #[test]
    fn test_descriptor_uses_docs_and_required_fields() {
        let registry = ToolRegistry::with_default_tools();
        assert_eq!(registry.len(), 15);

        let scroll = registry.get("scrollUntilTextIsVisible").unwrap();
        assert_eq!(scroll.required, vec!["text".to_string()]);
        assert!(scroll.descriptor.description.starts_with("Scrolls the screen"));
        assert_eq!(
            scroll.descriptor.parameters["properties"]["direction"]["enum"],
            json!(["UP", "DOWN", "LEFT", "RIGHT"])
        );

        let tap = registry.get("tapOnPoint").unwrap();
        assert_eq!(tap.required, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_verification_steps_get_read_only_tools() {
        let registry = ToolRegistry::default();
        let names: Vec<String> = registry
            .descriptors_for_step(&PromptStep::verification("total visible"))
            .into_iter()
            .map(|d| d.name)
            .collect();

        assert!(names.contains(&"objectiveStatus".to_string()));
        assert!(names.contains(&"assertVisibleWithText".to_string()));
        assert!(!names.contains(&"tapOnPoint".to_string()));
        assert!(!names.contains(&"inputText".to_string()));
        assert_eq!(
            registry
                .descriptors_for_step(&PromptStep::direction("tap"))
                .len(),
            15
        );
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let registry = ToolRegistry::default();
        let tool = registry
            .resolve(&ToolCall::new(
                "scrollUntilTextIsVisible",
                json!({"text": "Checkout", "direction": "up"}),
            ))
            .unwrap();

        match tool {
            TrailblazeTool::ScrollUntilTextIsVisible(scroll) => {
                assert_eq!(scroll.direction, ScrollDirection::Up);
                assert_eq!(scroll.visibility_percentage, 100);
                assert_eq!(scroll.scroll_start_position, ScrollStartPosition::Center);
                assert_eq!(scroll.index, 0);
            }
            other => panic!("unexpected tool {other:?}"),
        }
    }

    #[test]
    fn test_resolve_reports_typed_errors() {
        let registry = ToolRegistry::default();

        let unknown = registry
            .resolve(&ToolCall::new("teleport", json!({})))
            .unwrap_err();
        assert!(matches!(unknown, ToolError::UnknownTool { ref function_name, .. } if function_name == "teleport"));

        let missing = registry
            .resolve(&ToolCall::new("tapOnPoint", json!({"x": 10, "y": null})))
            .unwrap_err();
        assert!(matches!(
            missing,
            ToolError::MissingRequiredArgs { ref required_args, .. } if required_args == &vec!["y".to_string()]
        ));

        let malformed = registry
            .resolve(&ToolCall::new("tapOnPoint", json!({"x": "ten", "y": 4})))
            .unwrap_err();
        assert!(matches!(malformed, ToolError::UnknownTool { .. }));
    }

    #[test]
    fn test_verification_steps_reject_mutating_tools() {
        let registry = ToolRegistry::default();
        let tap = ToolCall::new("tapOnPoint", json!({"x": 10, "y": 20}));

        let rejected = registry
            .resolve_for_step(&tap, &PromptStep::verification("total visible"))
            .unwrap_err();
        assert!(matches!(rejected, ToolError::UnknownTool { ref function_name, .. } if function_name == "tapOnPoint"));

        assert!(registry
            .resolve_for_step(&tap, &PromptStep::direction("tap"))
            .is_ok());
        assert!(registry
            .resolve_for_step(
                &ToolCall::new("assertVisibleWithText", json!({"text": "Total"})),
                &PromptStep::verification("total visible"),
            )
            .is_ok());
    }

    #[test]
    fn test_tool_json_carries_name() {
        let tool: TrailblazeTool = PressBackTool {}.into();
        assert_eq!(tool.to_json(), json!({"toolName": "pressBack", "args": {}}));
        assert_eq!(tool.name(), "pressBack");
    }
}
