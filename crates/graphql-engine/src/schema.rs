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
    types::{
        FieldDefinition, InputValueDefinition, OperationType, SchemaDefinition, Type,
        TypeDefinition, TypeKind, TypeSystemDefinition,
    },
};
use async_graphql_value::Name;
use thiserror::Error;

use crate::validation::underlying_type;

pub const QUERY_ROOT_TYPENAME: &str = "Query";
pub const MUTATION_ROOT_TYPENAME: &str = "Mutation";

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// An immutable, validated schema.
///
/// Built once (typically at startup) and shared read-only by all requests.
#[derive(Debug)]
pub struct Schema {
    type_definitions: HashMap<String, TypeDefinition>,
    query_type_name: String,
    mutation_type_name: Option<String>,
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] async_graphql_parser::Error),

    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),

    #[error("Type '{0}' uses an unsupported kind (interfaces and unions are not supported)")]
    UnsupportedTypeKind(String),

    #[error("Subscriptions are not supported")]
    SubscriptionNotSupported,

    #[error("Extension of '{0}' doesn't match an existing object type")]
    InvalidExtension(String),

    #[error("Query root type '{0}' is not defined as an object type")]
    MissingQueryType(String),

    #[error("Mutation root type '{0}' is not defined as an object type")]
    MissingMutationType(String),

    #[error("Type '{type_name}' referenced by '{referenced_by}' is not defined")]
    UndefinedType {
        type_name: String,
        referenced_by: String,
    },

    #[error("'{referenced_by}' must be of an output type, but '{type_name}' is an input type")]
    InputTypeInOutputPosition {
        type_name: String,
        referenced_by: String,
    },

    #[error("'{referenced_by}' must be of an input type, but '{type_name}' is an object type")]
    OutputTypeInInputPosition {
        type_name: String,
        referenced_by: String,
    },

    #[error("Resolver registered for '{type_name}.{field_name}', which is not a field in the schema")]
    UnknownResolverTarget {
        type_name: String,
        field_name: String,
    },
}

impl Schema {
    /// Build a schema from SDL text.
    ///
    /// Supported: object, scalar, enum and input object types, `extend type` for object types,
    /// and an optional `schema { query: ..., mutation: ... }` definition.
    pub fn from_sdl(sdl: &str) -> Result<Schema, SchemaError> {
        let document = async_graphql_parser::parse_schema(sdl)?;

        let mut type_definitions: HashMap<String, TypeDefinition> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), builtin_scalar(name)))
            .collect();
        let mut extensions = vec![];
        let mut schema_definition = None;

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(definition) => {
                    schema_definition = Some(definition.node)
                }
                TypeSystemDefinition::Type(definition) => {
                    let definition = definition.node;
                    let name = definition.name.node.to_string();

                    if matches!(
                        definition.kind,
                        TypeKind::Interface(_) | TypeKind::Union(_)
                    ) {
                        return Err(SchemaError::UnsupportedTypeKind(name));
                    }

                    if definition.extend {
                        extensions.push(definition);
                    } else if type_definitions.insert(name.clone(), definition).is_some() {
                        return Err(SchemaError::DuplicateType(name));
                    }
                }
                // Directive definitions are accepted, but only @skip and @include are applied
                TypeSystemDefinition::Directive(_) => {}
            }
        }

        for extension in extensions {
            let name = extension.name.node.to_string();
            match (type_definitions.get_mut(&name), extension.kind) {
                (
                    Some(TypeDefinition {
                        kind: TypeKind::Object(existing),
                        ..
                    }),
                    TypeKind::Object(extension),
                ) => existing.fields.extend(extension.fields),
                _ => return Err(SchemaError::InvalidExtension(name)),
            }
        }

        let (query_type_name, mutation_type_name) =
            root_type_names(schema_definition, &type_definitions)?;

        let schema = Schema {
            type_definitions,
            query_type_name,
            mutation_type_name,
        };
        schema.check_references()?;

        Ok(schema)
    }

    pub fn get_type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions.get(name)
    }

    /// The name of the root type for the operation type (`None` if the schema doesn't support it).
    pub fn root_type_name(&self, operation_type: OperationType) -> Option<&str> {
        match operation_type {
            OperationType::Query => Some(&self.query_type_name),
            OperationType::Mutation => self.mutation_type_name.as_deref(),
            OperationType::Subscription => None,
        }
    }

    pub fn get_field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        match &self.get_type_definition(type_name)?.kind {
            TypeKind::Object(object_type) => object_type
                .fields
                .iter()
                .find(|field| field.node.name.node.as_str() == field_name)
                .map(|field| &field.node),
            _ => None,
        }
    }

    fn check_references(&self) -> Result<(), SchemaError> {
        for (type_name, definition) in self.type_definitions.iter() {
            match &definition.kind {
                TypeKind::Object(object_type) => {
                    for field in object_type.fields.iter() {
                        let field = &field.node;
                        let referenced_by = format!("{type_name}.{}", field.name.node);

                        if matches!(
                            self.referenced_kind(&field.ty.node, &referenced_by)?,
                            TypeKind::InputObject(_)
                        ) {
                            return Err(SchemaError::InputTypeInOutputPosition {
                                type_name: underlying_type(&field.ty.node).to_string(),
                                referenced_by,
                            });
                        }

                        for argument in field.arguments.iter() {
                            self.check_input_reference(
                                &argument.node,
                                &format!("{referenced_by}({})", argument.node.name.node),
                            )?;
                        }
                    }
                }
                TypeKind::InputObject(input_object_type) => {
                    for field in input_object_type.fields.iter() {
                        self.check_input_reference(
                            &field.node,
                            &format!("{type_name}.{}", field.node.name.node),
                        )?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn check_input_reference(
        &self,
        definition: &InputValueDefinition,
        referenced_by: &str,
    ) -> Result<(), SchemaError> {
        match self.referenced_kind(&definition.ty.node, referenced_by)? {
            TypeKind::Object(_) => Err(SchemaError::OutputTypeInInputPosition {
                type_name: underlying_type(&definition.ty.node).to_string(),
                referenced_by: referenced_by.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn referenced_kind(
        &self,
        typ: &Type,
        referenced_by: &str,
    ) -> Result<&TypeKind, SchemaError> {
        let type_name = underlying_type(typ);

        self.get_type_definition(type_name)
            .map(|definition| &definition.kind)
            .ok_or_else(|| SchemaError::UndefinedType {
                type_name: type_name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }
}

fn root_type_names(
    schema_definition: Option<SchemaDefinition>,
    type_definitions: &HashMap<String, TypeDefinition>,
) -> Result<(String, Option<String>), SchemaError> {
    let is_object = |name: &str| {
        matches!(
            type_definitions.get(name).map(|definition| &definition.kind),
            Some(TypeKind::Object(_))
        )
    };

    let (query, mutation) = match schema_definition {
        Some(definition) => {
            if definition.subscription.is_some() {
                return Err(SchemaError::SubscriptionNotSupported);
            }
            (
                definition
                    .query
                    .map(|name| name.node.to_string())
                    .unwrap_or_else(|| QUERY_ROOT_TYPENAME.to_string()),
                definition.mutation.map(|name| name.node.to_string()),
            )
        }
        None => (
            QUERY_ROOT_TYPENAME.to_string(),
            is_object(MUTATION_ROOT_TYPENAME).then(|| MUTATION_ROOT_TYPENAME.to_string()),
        ),
    };

    if !is_object(&query) {
        return Err(SchemaError::MissingQueryType(query));
    }

    match mutation {
        Some(mutation) if !is_object(&mutation) => Err(SchemaError::MissingMutationType(mutation)),
        mutation => Ok((query, mutation)),
    }
}

fn builtin_scalar(name: &str) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: None,
        name: Positioned::new(Name::new(name), Pos::default()),
        directives: vec![],
        kind: TypeKind::Scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scalars_and_roots() {
        let schema = Schema::from_sdl(
            r#"
            type Query { hello: String! }
            type Mutation { reset: Boolean }
            "#,
        )
        .unwrap();

        assert!(schema.get_type_definition("Int").is_some());
        assert_eq!(schema.root_type_name(OperationType::Query), Some("Query"));
        assert_eq!(
            schema.root_type_name(OperationType::Mutation),
            Some("Mutation")
        );
        assert_eq!(schema.root_type_name(OperationType::Subscription), None);
        assert!(schema.get_field("Query", "hello").is_some());
        assert!(schema.get_field("Query", "reset").is_none());
    }

    #[test]
    fn custom_root_names_and_extensions() {
        let schema = Schema::from_sdl(
            r#"
            schema { query: RootQuery }
            type RootQuery { hello: String }
            extend type RootQuery { goodbye: String }
            "#,
        )
        .unwrap();

        assert_eq!(
            schema.root_type_name(OperationType::Query),
            Some("RootQuery")
        );
        assert_eq!(schema.root_type_name(OperationType::Mutation), None);
        assert!(schema.get_field("RootQuery", "goodbye").is_some());
    }

    #[test]
    fn undefined_reference() {
        let error = Schema::from_sdl("type Query { concert: Concert }").unwrap_err();

        insta::assert_snapshot!(error, @"Type 'Concert' referenced by 'Query.concert' is not defined");
    }

    #[test]
    fn input_type_as_field_type() {
        let error = Schema::from_sdl(
            r#"
            input ConcertFilter { title: String }
            type Query { concert(filter: ConcertFilter): ConcertFilter }
            "#,
        )
        .unwrap_err();

        insta::assert_snapshot!(error, @"'Query.concert' must be of an output type, but 'ConcertFilter' is an input type");
    }

    #[test]
    fn missing_query_type() {
        let error = Schema::from_sdl("type Mutation { reset: Boolean }").unwrap_err();

        assert!(matches!(error, SchemaError::MissingQueryType(name) if name == "Query"));
    }

    #[test]
    fn unsupported_kinds() {
        let error = Schema::from_sdl(
            r#"
            interface Node { id: ID! }
            type Query { node: Node }
            "#,
        )
        .unwrap_err();

        assert!(matches!(error, SchemaError::UnsupportedTypeKind(name) if name == "Node"));
    }
}
