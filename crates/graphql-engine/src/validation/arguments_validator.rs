// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Pos, Positioned,
    types::{BaseType, InputValueDefinition, Type, TypeKind},
};
use async_graphql_value::{ConstValue, Name, Value, indexmap::IndexMap};
use serde_json::{Map, Value as JsonValue};

use crate::{schema::Schema, validation::validation_error::ValidationError};

pub(super) struct ArgumentValidator<'a> {
    schema: &'a Schema,
    variables: &'a HashMap<Name, ConstValue>,
    field_name: &'a str,
    pos: Pos,
}

impl<'a> ArgumentValidator<'a> {
    #[must_use]
    pub(super) fn new(
        schema: &'a Schema,
        variables: &'a HashMap<Name, ConstValue>,
        field_name: &'a str,
        pos: Pos,
    ) -> Self {
        Self {
            schema,
            variables,
            field_name,
            pos,
        }
    }

    /// Validations performed:
    /// - Ensure that all required arguments are provided (arguments with a default value are
    ///   filled in)
    /// - Ensure that there are no stray arguments (arguments that are not defined in the field)
    /// - Ensure that each argument (after substituting variables) is compatible with its type
    pub(super) fn validate(
        &self,
        argument_definitions: &[Positioned<InputValueDefinition>],
        arguments: &[(Positioned<Name>, Positioned<Value>)],
    ) -> Result<Map<String, JsonValue>, ValidationError> {
        // Stray arguments tracking: 1. Maintain a map of all the arguments supplied in the query
        let mut supplied: IndexMap<&Name, &Positioned<Value>> = arguments
            .iter()
            .map(|(name, value)| (&name.node, value))
            .collect();

        let mut validated = Map::new();

        for argument_definition in argument_definitions {
            let argument_definition = &argument_definition.node;
            let argument_name = &argument_definition.name.node;

            // Stray arguments tracking: 2. Remove the argument being processed
            let value = match supplied.shift_remove(argument_name) {
                Some(value) => Some(self.validate_argument(argument_definition, value)?),
                None => match &argument_definition.default_value {
                    Some(default_value) => Some(default_value.node.clone()),
                    None if argument_definition.ty.node.nullable => None,
                    None => {
                        return Err(ValidationError::RequiredArgumentNotFound(
                            argument_name.to_string(),
                            self.pos,
                        ));
                    }
                },
            };

            if let Some(value) = value {
                let value = value
                    .into_json()
                    .map_err(|e| ValidationError::InvalidArgumentType {
                        argument_name: argument_name.to_string(),
                        message: e.to_string(),
                        pos: self.pos,
                    })?;
                validated.insert(argument_name.to_string(), value);
            }
        }

        // Stray arguments tracking: 3. If any arguments are left, they are not defined in the field
        if !supplied.is_empty() {
            return Err(ValidationError::StrayArguments(
                supplied.keys().map(|name| name.to_string()).collect(),
                self.field_name.to_string(),
                self.pos,
            ));
        }

        Ok(validated)
    }

    fn validate_argument(
        &self,
        argument_definition: &InputValueDefinition,
        value: &Positioned<Value>,
    ) -> Result<ConstValue, ValidationError> {
        let resolved = resolve_variables(value, self.variables)?;

        coerce_value(self.schema, &argument_definition.ty.node, resolved).map_err(|message| {
            ValidationError::InvalidArgumentType {
                argument_name: argument_definition.name.node.to_string(),
                message,
                pos: value.pos,
            }
        })
    }
}

/// Substitute variables (which must be defined by the operation) into the value.
pub(super) fn resolve_variables(
    value: &Positioned<Value>,
    variables: &HashMap<Name, ConstValue>,
) -> Result<ConstValue, ValidationError> {
    value.node.clone().into_const_with(|name| {
        variables
            .get(&name)
            .cloned()
            .ok_or_else(|| ValidationError::VariableNotFound(name.to_string(), value.pos))
    })
}

/// Coerce a value to the given input type.
///
/// Built-in scalars are checked for the expected shape (`Int` must fit in 32 bits, `ID` accepts
/// strings and integers), enum values must be members of the enum, input objects are checked
/// field by field (filling in defaults), and a single value is accepted where a list is expected.
/// Custom scalars accept any value.
///
/// Returns a description of the mismatch on failure.
pub(super) fn coerce_value(
    schema: &Schema,
    typ: &Type,
    value: ConstValue,
) -> Result<ConstValue, String> {
    if value == ConstValue::Null {
        return if typ.nullable {
            Ok(ConstValue::Null)
        } else {
            Err(format!("expected a non-null value of type '{typ}'"))
        };
    }

    match &typ.base {
        BaseType::List(element_type) => match value {
            ConstValue::List(elements) => elements
                .into_iter()
                .map(|element| coerce_value(schema, element_type, element))
                .collect::<Result<Vec<_>, _>>()
                .map(ConstValue::List),
            single => Ok(ConstValue::List(vec![coerce_value(
                schema,
                element_type,
                single,
            )?])),
        },
        BaseType::Named(type_name) => coerce_named(schema, type_name, value),
    }
}

fn coerce_named(
    schema: &Schema,
    type_name: &Name,
    value: ConstValue,
) -> Result<ConstValue, String> {
    let mismatch = |value: &ConstValue| format!("expected {type_name}, found {}", kind(value));

    match (type_name.as_str(), &value) {
        ("Int", ConstValue::Number(number))
            if number
                .as_i64()
                .is_some_and(|number| i32::try_from(number).is_ok()) =>
        {
            Ok(value)
        }
        ("Float", ConstValue::Number(_))
        | ("String", ConstValue::String(_))
        | ("Boolean", ConstValue::Boolean(_))
        | ("ID", ConstValue::String(_)) => Ok(value),
        ("ID", ConstValue::Number(number)) if number.is_i64() || number.is_u64() => {
            Ok(ConstValue::String(number.to_string()))
        }
        ("Int" | "Float" | "String" | "Boolean" | "ID", _) => Err(mismatch(&value)),
        _ => match schema.get_type_definition(type_name).map(|td| &td.kind) {
            Some(TypeKind::Scalar) => Ok(value),
            Some(TypeKind::Enum(enum_type)) => {
                let member = match &value {
                    ConstValue::Enum(name) => name.as_str(),
                    // Variables arrive as JSON, where enum values are strings
                    ConstValue::String(string) => string.as_str(),
                    _ => return Err(mismatch(&value)),
                };

                if enum_type
                    .values
                    .iter()
                    .any(|enum_value| enum_value.node.value.node.as_str() == member)
                {
                    Ok(ConstValue::Enum(Name::new(member)))
                } else {
                    Err(format!("'{member}' is not a value of enum '{type_name}'"))
                }
            }
            Some(TypeKind::InputObject(input_object_type)) => match value {
                ConstValue::Object(mut fields) => {
                    let mut coerced = IndexMap::new();

                    for field_definition in input_object_type.fields.iter() {
                        let field_definition = &field_definition.node;
                        let field_name = &field_definition.name.node;

                        match fields.shift_remove(field_name) {
                            Some(field_value) => {
                                let field_value =
                                    coerce_value(schema, &field_definition.ty.node, field_value)
                                        .map_err(|message| {
                                            format!("field '{field_name}': {message}")
                                        })?;
                                coerced.insert(field_name.clone(), field_value);
                            }
                            None => match &field_definition.default_value {
                                Some(default_value) => {
                                    coerced.insert(field_name.clone(), default_value.node.clone());
                                }
                                None if field_definition.ty.node.nullable => {}
                                None => {
                                    return Err(format!(
                                        "missing required field '{field_name}' of '{type_name}'"
                                    ));
                                }
                            },
                        }
                    }

                    if fields.is_empty() {
                        Ok(ConstValue::Object(coerced))
                    } else {
                        let unknown = fields
                            .keys()
                            .map(|name| name.to_string())
                            .collect::<Vec<_>>();
                        Err(format!("unknown field(s) {unknown:?} for '{type_name}'"))
                    }
                }
                _ => Err(mismatch(&value)),
            },
            _ => Err(format!("'{type_name}' is not an input type")),
        },
    }
}

fn kind(value: &ConstValue) -> &'static str {
    match value {
        ConstValue::Null => "null",
        ConstValue::Number(_) => "a number",
        ConstValue::String(_) => "a string",
        ConstValue::Boolean(_) => "a boolean",
        ConstValue::Binary(_) => "binary data",
        ConstValue::Enum(_) => "an enum value",
        ConstValue::List(_) => "a list",
        ConstValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::from_sdl(
            r#"
            enum Genre { ROCK JAZZ }
            input ConcertFilter { title: String, genre: Genre = ROCK, minPrice: Int! }
            type Query { hello: String }
            "#,
        )
        .unwrap()
    }

    fn ty(typ: &str) -> Type {
        Type::new(typ).unwrap()
    }

    fn coerce(typ: &str, value: serde_json::Value) -> Result<serde_json::Value, String> {
        coerce_value(&schema(), &ty(typ), ConstValue::from_json(value).unwrap())
            .map(|value| value.into_json().unwrap())
    }

    #[test]
    fn scalars() {
        assert_eq!(coerce("Int!", serde_json::json!(5)), Ok(serde_json::json!(5)));
        assert_eq!(coerce("Float", serde_json::json!(5)), Ok(serde_json::json!(5)));
        assert_eq!(coerce("ID", serde_json::json!(42)), Ok(serde_json::json!("42")));
        assert_eq!(coerce("String", serde_json::Value::Null), Ok(serde_json::Value::Null));

        insta::assert_snapshot!(coerce("Int", serde_json::json!(3_000_000_000i64)).unwrap_err(), @"expected Int, found a number");
        insta::assert_snapshot!(coerce("Boolean", serde_json::json!("true")).unwrap_err(), @"expected Boolean, found a string");
        insta::assert_snapshot!(coerce("String!", serde_json::Value::Null).unwrap_err(), @"expected a non-null value of type 'String!'");
    }

    #[test]
    fn lists() {
        assert_eq!(
            coerce("[Int!]", serde_json::json!([1, 2])),
            Ok(serde_json::json!([1, 2]))
        );
        assert_eq!(coerce("[Int!]", serde_json::json!(1)), Ok(serde_json::json!([1])));
        assert!(coerce("[Int!]", serde_json::json!([1, null])).is_err());
    }

    #[test]
    fn enums() {
        assert_eq!(
            coerce("Genre", serde_json::json!("JAZZ")),
            Ok(serde_json::json!("JAZZ"))
        );
        insta::assert_snapshot!(coerce("Genre", serde_json::json!("POLKA")).unwrap_err(), @"'POLKA' is not a value of enum 'Genre'");
    }

    #[test]
    fn input_objects() {
        assert_eq!(
            coerce("ConcertFilter", serde_json::json!({"minPrice": 10})),
            Ok(serde_json::json!({"genre": "ROCK", "minPrice": 10}))
        );
        insta::assert_snapshot!(coerce("ConcertFilter", serde_json::json!({"title": "x"})).unwrap_err(), @"missing required field 'minPrice' of 'ConcertFilter'");
        insta::assert_snapshot!(coerce("ConcertFilter", serde_json::json!({"minPrice": 1, "venue": 2})).unwrap_err(), @r#"unknown field(s) ["venue"] for 'ConcertFilter'"#);
        insta::assert_snapshot!(coerce("ConcertFilter", serde_json::json!({"minPrice": "cheap"})).unwrap_err(), @"field 'minPrice': expected Int, found a string");
    }
}
