//! Validation-rule compilation and the compiled validation schema.
//!
//! This module turns field declarations into [`ValidationRule`] trees and
//! assembles them into a [`ValidationSchema`] whose `parse` operation checks
//! an input document, accumulating every violation before reporting.
//!
//! Two behaviors here are deliberate contracts, not accidents:
//!
//! - A non-empty `enum` modifier **replaces** the whole in-progress rule
//!   with a case-insensitive string membership rule, whatever the declared
//!   base type was. Enum fields always validate as strings.
//! - An unresolvable type token is fatal. The persistence compiler accepts
//!   the same token silently; the two sides are asymmetric on purpose.

mod rule;

pub use rule::{Issue, ValidationFailure, ValidationRule};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::compiler::CompileOptions;
use crate::definition::{FieldEntry, FieldSpec, PatternSpec, SchemaDefinition};
use crate::error::{SchemaError, SchemaResult};
use crate::messages::{self, MessageDetail};
use crate::types::{CanonicalType, ResolveTarget};

use rule::Refinement;

/// A compiled validation schema: one rule per declared field, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct ValidationSchema {
    fields: IndexMap<SmolStr, ValidationRule>,
    strict: bool,
}

impl ValidationSchema {
    /// Check an input document against every field rule.
    ///
    /// All fields are checked and all failures reported together; a failure
    /// in one field never short-circuits its siblings. On success the
    /// returned value carries defaults for absent optional fields and, in
    /// non-strict mode, drops unrecognized keys.
    pub fn parse(&self, input: &Value) -> Result<Value, ValidationFailure> {
        let mut issues = Vec::new();
        match input.as_object() {
            Some(object) => {
                let out = self.check_object(&[], object, &mut issues);
                if issues.is_empty() {
                    Ok(Value::Object(out))
                } else {
                    Err(ValidationFailure { issues })
                }
            }
            None => Err(ValidationFailure {
                issues: vec![Issue::invalid_type(&[], input, "object")],
            }),
        }
    }

    /// Derive the all-fields-optional variant for partial updates.
    pub fn partial(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, rule)| {
                let mut rule = rule.clone();
                rule.optional = true;
                (name.clone(), rule)
            })
            .collect();
        Self {
            fields,
            strict: self.strict,
        }
    }

    /// The rule compiled for a field, if declared.
    pub fn field(&self, name: &str) -> Option<&ValidationRule> {
        self.fields.get(name)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn check_object(
        &self,
        path: &[String],
        object: &Map<String, Value>,
        issues: &mut Vec<Issue>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, rule) in &self.fields {
            let mut field_path = path.to_vec();
            field_path.push(name.to_string());

            match object.get(name.as_str()) {
                Some(value) => {
                    if let Some(checked) = rule.check(&field_path, value, issues) {
                        out.insert(name.to_string(), checked);
                    }
                }
                None => {
                    if !rule.is_optional() {
                        issues.push(Issue::required(&field_path, &rule.required_message));
                    } else if let Some(default) = rule.default_value() {
                        out.insert(name.to_string(), default.clone());
                    }
                }
            }
        }

        if self.strict {
            for key in object.keys() {
                if !self.fields.contains_key(key.as_str()) {
                    issues.push(Issue::unrecognized_key(path, key));
                }
            }
        }

        out
    }
}

/// Compile a whole definition into a validation schema.
///
/// Fails on the first unresolvable type token; no partial schema escapes.
pub fn compile_validation_schema(
    definition: &SchemaDefinition,
    options: &CompileOptions,
) -> SchemaResult<ValidationSchema> {
    let mut fields = IndexMap::with_capacity(definition.len());
    for (name, entry) in definition {
        fields.insert(name.clone(), compile_validation_field(name, entry, options)?);
    }
    Ok(ValidationSchema {
        fields,
        strict: options.strict_mode,
    })
}

/// Compile one field declaration into a rule tree.
pub fn compile_validation_field(
    name: &str,
    entry: &FieldEntry,
    options: &CompileOptions,
) -> SchemaResult<ValidationRule> {
    let mut rule = match entry {
        FieldEntry::Shorthand(specs) => compile_shorthand(name, specs, options)?,
        FieldEntry::Spec(spec) => compile_spec(name, spec, options)?,
    };
    rule.required_message =
        messages::synthesize(name, "required", MessageDetail::None, &options.custom_messages);
    Ok(rule)
}

/// Array shorthand: the item base type comes from the first element
/// (String when the sequence is empty); an item enum is enforced as a
/// case-insensitive membership test.
fn compile_shorthand(
    name: &str,
    specs: &[FieldSpec],
    options: &CompileOptions,
) -> SchemaResult<ValidationRule> {
    let item = match specs.first() {
        Some(first) => {
            let tag = first
                .field_type
                .resolve(ResolveTarget::Validation)
                .ok_or_else(|| {
                    SchemaError::unsupported_type(name, first.field_type.as_written())
                })?;
            match &first.allowed {
                Some(values) => {
                    if values.is_empty() {
                        return Err(SchemaError::empty_enum(name));
                    }
                    ValidationRule::one_of(
                        values.clone(),
                        messages::synthesize(
                            name,
                            "enum",
                            MessageDetail::Allowed(values),
                            &options.custom_messages,
                        ),
                    )
                }
                None => base_rule(name, tag, first, options)?,
            }
        }
        None => ValidationRule::string(),
    };
    Ok(ValidationRule::array_of(item))
}

fn compile_spec(
    name: &str,
    spec: &FieldSpec,
    options: &CompileOptions,
) -> SchemaResult<ValidationRule> {
    let tag = spec
        .field_type
        .resolve(ResolveTarget::Validation)
        .ok_or_else(|| SchemaError::unsupported_type(name, spec.field_type.as_written()))?;

    let custom = &options.custom_messages;
    let mut rule = base_rule(name, tag, spec, options)?;

    if spec.required == Some(false) {
        rule.optional = true;
    }

    if rule.is_string_typed() {
        if let Some(limit) = spec.minlength {
            rule.refinements.push(Refinement::MinLength {
                limit,
                message: messages::synthesize(name, "minlength", MessageDetail::Length(limit), custom),
            });
        }
        if let Some(limit) = spec.maxlength {
            rule.refinements.push(Refinement::MaxLength {
                limit,
                message: messages::synthesize(name, "maxlength", MessageDetail::Length(limit), custom),
            });
        }
    }

    if let Some(limit) = spec.min {
        if rule.is_number_typed() {
            rule.refinements.push(Refinement::Min {
                limit,
                message: messages::synthesize(name, "min", MessageDetail::Bound(limit), custom),
            });
        } else if rule.is_array_typed() {
            rule.refinements.push(Refinement::MinItems {
                limit,
                message: messages::synthesize(name, "min", MessageDetail::Count(limit), custom),
            });
        }
    }
    if let Some(limit) = spec.max {
        if rule.is_number_typed() {
            rule.refinements.push(Refinement::Max {
                limit,
                message: messages::synthesize(name, "max", MessageDetail::Bound(limit), custom),
            });
        } else if rule.is_array_typed() {
            rule.refinements.push(Refinement::MaxItems {
                limit,
                message: messages::synthesize(name, "max", MessageDetail::Count(limit), custom),
            });
        }
    }

    if spec.email == Some(true) && rule.is_string_typed() {
        rule.refinements.push(Refinement::Email {
            message: messages::synthesize(name, "email", MessageDetail::None, custom),
        });
    }

    // A non-empty enum discards everything accumulated so far and starts
    // over as a case-insensitive string membership rule.
    if let Some(values) = &spec.allowed {
        if values.is_empty() {
            return Err(SchemaError::empty_enum(name));
        }
        rule = ValidationRule::one_of(
            values.clone(),
            messages::synthesize(name, "enum", MessageDetail::Allowed(values), custom),
        );
    }

    if let Some(pattern) = &spec.pattern {
        if rule.is_string_typed() {
            let regex = match pattern {
                PatternSpec::Compiled(regex) => regex.clone(),
                PatternSpec::Source(source) => regex_lite::Regex::new(source).map_err(|e| {
                    SchemaError::invalid_pattern(name, source.clone(), e.to_string())
                })?,
            };
            rule.refinements.push(Refinement::Pattern {
                regex,
                message: messages::pattern_message(name, pattern.source(), custom),
            });
        }
    }

    if let Some(default) = &spec.default {
        rule.default = Some(default.clone());
        if spec.required != Some(true) {
            rule.optional = true;
        }
    }

    // Reference fields hold document ids whatever their declared type says.
    if spec.reference.is_some() && rule.is_string_typed() {
        rule.refinements.push(Refinement::Pattern {
            regex: rule::object_id_pattern(),
            message: format!("{name} must be a valid ObjectId"),
        });
    }

    // `unique` is accepted but enforced by the storage engine, not here.

    if rule.is_string_typed()
        && name.to_ascii_lowercase().contains("password")
        && spec.pattern.is_none()
    {
        rule.refinements.push(Refinement::StrongPassword {
            message: messages::strong_password_message(name),
        });
    }

    Ok(rule)
}

fn base_rule(
    name: &str,
    tag: CanonicalType,
    spec: &FieldSpec,
    options: &CompileOptions,
) -> SchemaResult<ValidationRule> {
    Ok(match tag {
        CanonicalType::String => ValidationRule::string(),
        CanonicalType::Number => ValidationRule::number(),
        CanonicalType::Boolean => ValidationRule::boolean(),
        CanonicalType::Date => ValidationRule::date(),
        CanonicalType::Array => match &spec.items {
            Some(item) => ValidationRule::array_of(compile_validation_field(name, item, options)?),
            None => ValidationRule::array_any(),
        },
        CanonicalType::Object => match &spec.schema {
            Some(nested) => ValidationRule::object_of(compile_validation_schema(nested, options)?),
            None => ValidationRule::object_open(),
        },
        CanonicalType::ObjectId => ValidationRule::object_id(name),
        CanonicalType::Mixed => ValidationRule::any(),
        CanonicalType::Map => ValidationRule::map(),
    })
}
