use crate::{GraphError, NodeTypeDef};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Widget type and constraints for a configuration field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Secret,
    MultilineText,
    Boolean,
    Number {
        min: f64,
        max: f64,
        step: f64,
    },
    Select {
        options: Vec<String>,
    },
}

/// Visibility predicate evaluated against the current draft
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VisibilityRule {
    Always,
    Equals { field: String, value: Value },
    OneOf { field: String, values: Vec<Value> },
}

impl VisibilityRule {
    pub fn matches(&self, draft: &HashMap<String, Value>) -> bool {
        match self {
            VisibilityRule::Always => true,
            VisibilityRule::Equals { field, value } => {
                draft.get(field).map(|v| v == value).unwrap_or(false)
            }
            VisibilityRule::OneOf { field, values } => draft
                .get(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
        }
    }
}

/// Schema for one configurable field of a node kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub input: InputKind,
    pub default: Option<Value>,
    pub visible_when: VisibilityRule,
}

impl FieldSpec {
    fn new(name: &str, label: &str, input: InputKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            input,
            default: None,
            visible_when: VisibilityRule::Always,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::Text)
    }

    pub fn secret(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::Secret)
    }

    pub fn multiline(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::MultilineText)
    }

    pub fn boolean(name: &str, label: &str) -> Self {
        Self::new(name, label, InputKind::Boolean)
    }

    pub fn number(name: &str, label: &str, min: f64, max: f64, step: f64) -> Self {
        Self::new(name, label, InputKind::Number { min, max, step })
    }

    pub fn select(name: &str, label: &str, options: &[&str]) -> Self {
        Self::new(
            name,
            label,
            InputKind::Select {
                options: options.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn when_equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.visible_when = VisibilityRule::Equals {
            field: field.to_string(),
            value: value.into(),
        };
        self
    }

    pub fn when_one_of(mut self, field: &str, values: &[&str]) -> Self {
        self.visible_when = VisibilityRule::OneOf {
            field: field.to_string(),
            values: values.iter().map(|s| json!(s)).collect(),
        };
        self
    }
}

/// Editable draft configuration for one node
///
/// Rendering the form is a pure function of `(kind, draft)`. Edits stay local
/// until `into_config` commits the whole draft; dropping the draft is cancel.
#[derive(Debug, Clone)]
pub struct FormDraft<'a> {
    def: &'a NodeTypeDef,
    values: HashMap<String, Value>,
}

impl<'a> FormDraft<'a> {
    /// Seed a draft with the kind's defaults overlaid by the node's current
    /// configuration.
    pub fn new(def: &'a NodeTypeDef, current: &HashMap<String, Value>) -> Self {
        let mut values = HashMap::new();
        for field in &def.fields {
            if let Some(default) = &field.default {
                values.insert(field.name.clone(), default.clone());
            }
        }
        values.extend(current.clone());
        Self { def, values }
    }

    /// Ordered fields currently visible given the draft values
    pub fn visible_fields(&self) -> Vec<&FieldSpec> {
        self.def
            .fields
            .iter()
            .filter(|f| f.visible_when.matches(&self.values))
            .collect()
    }

    /// Set a field value. Numeric values are clamped into the widget's
    /// `[min, max]` range; no business-rule validation happens here.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), GraphError> {
        let spec = self
            .def
            .fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| GraphError::UnknownField {
                kind: self.def.kind.clone(),
                field: field.to_string(),
            })?;

        let value = match (&spec.input, &value) {
            (InputKind::Number { min, max, .. }, Value::Number(n)) => {
                let clamped = n.as_f64().unwrap_or(*min).clamp(*min, *max);
                json!(clamped)
            }
            _ => value,
        };

        self.values.insert(field.to_string(), value);
        Ok(())
    }

    /// Current draft value for a field (default-resolved at construction)
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Commit: the full draft object, fed to `GraphModel::patch_node_config`
    pub fn into_config(self) -> HashMap<String, Value> {
        self.values
    }
}
