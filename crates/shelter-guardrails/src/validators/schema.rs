//! Structural validation of JSON output against a minimal schema
//!
//! Supports `type`, `required`, `properties` (nested), and `items` for
//! arrays. Unknown properties are permitted; only declared ones are checked.
//! Every violation yields its own finding under the stable category
//! `schema_mismatch`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shelter_types::{Action, Finding, GuardError, GuardResult, ValidationResult};

use crate::pipeline::Validator;

/// Expected JSON value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl SchemaKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
        }
    }

    fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Array => write!(f, "array"),
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Minimal structural schema description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    /// Required keys (object kinds only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Declared properties (object kinds only), checked in key order;
    /// undeclared keys are permitted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Element schema (array kinds only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Schema {
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: Vec::new(),
            properties: BTreeMap::new(),
            items: None,
        }
    }

    pub fn with_required(mut self, keys: &[&str]) -> Self {
        self.required = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    pub fn with_property(mut self, key: &str, schema: Schema) -> Self {
        self.properties.insert(key.to_string(), schema);
        self
    }

    pub fn with_items(mut self, schema: Schema) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    /// Reject structurally nonsensical schemas at construction time.
    fn check_well_formed(&self, path: &str) -> GuardResult<()> {
        if self.kind != SchemaKind::Object && (!self.required.is_empty() || !self.properties.is_empty())
        {
            return Err(GuardError::Schema(format!(
                "{path}: 'required'/'properties' are only valid on object schemas"
            )));
        }
        if self.kind != SchemaKind::Array && self.items.is_some() {
            return Err(GuardError::Schema(format!(
                "{path}: 'items' is only valid on array schemas"
            )));
        }
        for (key, sub) in &self.properties {
            sub.check_well_formed(&format!("{path}.{key}"))?;
        }
        if let Some(items) = &self.items {
            items.check_well_formed(&format!("{path}[]"))?;
        }
        Ok(())
    }
}

/// Validate that text is JSON conforming to a minimal schema
#[derive(Debug)]
pub struct SchemaValidator {
    schema: Schema,
}

impl SchemaValidator {
    pub const NAME: &'static str = "schema";

    pub fn new(schema: Schema) -> GuardResult<Self> {
        schema.check_well_formed("$")?;
        Ok(Self { schema })
    }
}

impl Validator for SchemaValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, text: &str) -> GuardResult<ValidationResult> {
        let mut findings: Vec<Finding> = Vec::new();

        match serde_json::from_str::<Value>(text) {
            Ok(value) => check_value(&value, &self.schema, "$", &mut findings),
            Err(e) => findings.push(Finding::new(
                Self::NAME,
                "schema_mismatch",
                format!("Invalid JSON: {e}"),
                1.0,
            )),
        }

        let is_valid = findings.is_empty();

        Ok(ValidationResult {
            is_valid,
            text: text.to_string(),
            original_text: text.to_string(),
            findings,
            action_taken: if is_valid {
                Action::Passthrough
            } else {
                Action::Block
            },
        })
    }
}

/// Collect one finding per violated rule; recurses through declared
/// properties and array items.
fn check_value(value: &Value, schema: &Schema, path: &str, findings: &mut Vec<Finding>) {
    if !schema.kind.matches(value) {
        findings.push(Finding::new(
            SchemaValidator::NAME,
            "schema_mismatch",
            format!(
                "{path}: expected {}, got {}",
                schema.kind,
                SchemaKind::name_of(value)
            ),
            0.9,
        ));
        // Structural checks below assume the right kind.
        return;
    }

    if let Value::Object(map) = value {
        for key in &schema.required {
            if !map.contains_key(key) {
                findings.push(Finding::new(
                    SchemaValidator::NAME,
                    "schema_mismatch",
                    format!("{path}: missing required field '{key}'"),
                    0.9,
                ));
            }
        }
        for (key, sub_schema) in &schema.properties {
            if let Some(sub_value) = map.get(key) {
                check_value(sub_value, sub_schema, &format!("{path}.{key}"), findings);
            }
        }
    }

    if let (Value::Array(elements), Some(items)) = (value, &schema.items) {
        for (i, element) in elements.iter().enumerate() {
            check_value(element, items, &format!("{path}[{i}]"), findings);
        }
    }
}
