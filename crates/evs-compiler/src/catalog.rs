use std::collections::BTreeMap;

use evs_core::EventScriptError;
use serde::{Deserialize, Serialize};

/// One entry of the instruction catalog: declared arity, the target
/// code template with `_PARAM0_`.. placeholders, and which parameter
/// positions name objects (those are routed through the scope's
/// object picking instead of expression compilation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionDescriptor {
    pub arity: usize,
    pub template: String,
    #[serde(default)]
    pub object_parameter_indexes: Vec<usize>,
}

impl InstructionDescriptor {
    pub fn new(arity: usize, template: impl Into<String>) -> Self {
        Self {
            arity,
            template: template.into(),
            object_parameter_indexes: Vec::new(),
        }
    }

    pub fn with_object_parameters(mut self, indexes: &[usize]) -> Self {
        self.object_parameter_indexes = indexes.to_vec();
        self
    }

    pub fn is_object_parameter(&self, index: usize) -> bool {
        self.object_parameter_indexes.contains(&index)
    }

    pub fn expand_template(&self, parameter_code: &[String]) -> String {
        let mut output = self.template.clone();
        for (index, code) in parameter_code.iter().enumerate() {
            output = output.replace(&format!("_PARAM{index}_"), code);
        }
        output
    }
}

/// Name-keyed catalog of conditions and actions. Populated at
/// process start, read-only during generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionRegistry {
    conditions: BTreeMap<String, InstructionDescriptor>,
    actions: BTreeMap<String, InstructionDescriptor>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    conditions: BTreeMap<String, InstructionDescriptor>,
    #[serde(default)]
    actions: BTreeMap<String, InstructionDescriptor>,
}

impl InstructionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_condition(&mut self, name: impl Into<String>, descriptor: InstructionDescriptor) {
        self.conditions.insert(name.into(), descriptor);
    }

    pub fn register_action(&mut self, name: impl Into<String>, descriptor: InstructionDescriptor) {
        self.actions.insert(name.into(), descriptor);
    }

    pub fn condition(&self, name: &str) -> Option<&InstructionDescriptor> {
        self.conditions.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&InstructionDescriptor> {
        self.actions.get(name)
    }

    pub fn from_json(source: &str) -> Result<Self, EventScriptError> {
        let catalog: CatalogFile = serde_json::from_str(source)
            .map_err(|error| EventScriptError::new("CATALOG_PARSE_ERROR", error.to_string()))?;

        for (name, descriptor) in catalog.conditions.iter().chain(catalog.actions.iter()) {
            if let Some(index) = descriptor
                .object_parameter_indexes
                .iter()
                .find(|index| **index >= descriptor.arity)
            {
                return Err(EventScriptError::new(
                    "CATALOG_OBJECT_INDEX_INVALID",
                    format!(
                        "Instruction \"{}\" marks parameter {} as an object but declares arity {}.",
                        name, index, descriptor.arity
                    ),
                ));
            }
        }

        Ok(Self {
            conditions: catalog.conditions,
            actions: catalog.actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_template_substitutes_placeholders_in_position_order() {
        let descriptor = InstructionDescriptor::new(2, "between(_PARAM0_, _PARAM1_)");
        let expanded =
            descriptor.expand_template(&["(low)".to_string(), "(high)".to_string()]);
        assert_eq!(expanded, "between((low), (high))");
    }

    #[test]
    fn expand_template_keeps_double_digit_placeholders_distinct() {
        let descriptor = InstructionDescriptor::new(11, "_PARAM1_ _PARAM10_");
        let code: Vec<String> = (0..11).map(|index| format!("p{index}")).collect();
        assert_eq!(descriptor.expand_template(&code), "p1 p10");
    }

    #[test]
    fn registry_keeps_condition_and_action_namespaces_separate() {
        let mut registry = InstructionRegistry::new();
        registry.register_condition("Visible", InstructionDescriptor::new(0, "is_visible()"));
        registry.register_action("Visible", InstructionDescriptor::new(0, "show()"));

        assert_eq!(
            registry.condition("Visible").expect("condition").template,
            "is_visible()"
        );
        assert_eq!(registry.action("Visible").expect("action").template, "show()");
        assert!(registry.condition("Missing").is_none());
    }

    #[test]
    fn from_json_loads_both_sections_with_optional_object_indexes() {
        let registry = InstructionRegistry::from_json(
            r#"{
  "conditions": {
    "ObjectVisible": {
      "arity": 1,
      "template": "is_visible(_PARAM0_)",
      "objectParameterIndexes": [0]
    }
  },
  "actions": {
    "AddScore": { "arity": 1, "template": "add_score(_PARAM0_)" }
  }
}"#,
        )
        .expect("catalog should parse");

        let condition = registry.condition("ObjectVisible").expect("condition");
        assert!(condition.is_object_parameter(0));
        let action = registry.action("AddScore").expect("action");
        assert!(action.object_parameter_indexes.is_empty());
    }

    #[test]
    fn from_json_rejects_invalid_json_and_out_of_range_object_index() {
        let parse_error =
            InstructionRegistry::from_json("{").expect_err("invalid json should fail");
        assert_eq!(parse_error.code, "CATALOG_PARSE_ERROR");

        let index_error = InstructionRegistry::from_json(
            r#"{ "actions": { "Bad": { "arity": 1, "template": "x(_PARAM0_)", "objectParameterIndexes": [2] } } }"#,
        )
        .expect_err("out-of-range object index should fail");
        assert_eq!(index_error.code, "CATALOG_OBJECT_INDEX_INVALID");
    }

    #[test]
    fn from_json_accepts_missing_sections() {
        let registry =
            InstructionRegistry::from_json("{}").expect("empty catalog should parse");
        assert!(registry.condition("Anything").is_none());
    }
}
