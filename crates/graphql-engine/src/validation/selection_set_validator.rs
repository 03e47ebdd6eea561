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
        BaseType, Directive, Field, FragmentDefinition, Selection, SelectionSet, Type,
        TypeDefinition, TypeKind,
    },
};
use async_graphql_value::{ConstValue, Name};
use serde_json::Map;

use crate::schema::Schema;

use super::{
    arguments_validator::{ArgumentValidator, resolve_variables},
    field::{TYPENAME_FIELD, ValidatedField},
    underlying_type,
    validation_error::ValidationError,
};

/// Context for validating a selection set.
pub(super) struct SelectionSetValidator<'a> {
    schema: &'a Schema,
    variables: &'a HashMap<Name, ConstValue>,
    fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    max_depth: usize,
}

impl<'a> SelectionSetValidator<'a> {
    #[must_use]
    pub(super) fn new(
        schema: &'a Schema,
        variables: &'a HashMap<Name, ConstValue>,
        fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
        max_depth: usize,
    ) -> Self {
        Self {
            schema,
            variables,
            fragment_definitions,
            max_depth,
        }
    }

    /// Validate the selection set of `container_type`, whose fields are at `depth` (top-level
    /// fields of an operation are at depth 1).
    ///
    /// Validations performed:
    /// - Each field is defined in the container type (see [`Self::validate_field`])
    /// - Fragments exist, apply to the container type, and don't spread themselves
    /// - `@skip` and `@include` are evaluated; other directives are rejected
    /// - Fields sharing a response name are mergeable
    /// - No field is deeper than the configured maximum depth
    pub(super) fn validate(
        &self,
        container_type: &TypeDefinition,
        selection_set: &Positioned<SelectionSet>,
        depth: usize,
    ) -> Result<Vec<ValidatedField>, ValidationError> {
        let mut fields = vec![];
        self.collect_fields(
            container_type,
            selection_set,
            depth,
            &mut vec![],
            &mut fields,
        )?;

        merge_fields(fields)
    }

    fn collect_fields(
        &self,
        container_type: &TypeDefinition,
        selection_set: &Positioned<SelectionSet>,
        depth: usize,
        fragment_path: &mut Vec<Name>,
        fields: &mut Vec<ValidatedField>,
    ) -> Result<(), ValidationError> {
        for selection in selection_set.node.items.iter() {
            match &selection.node {
                Selection::Field(field) => {
                    if self.is_included(&field.node.directives)? {
                        fields.push(self.validate_field(container_type, field, depth)?);
                    }
                }
                Selection::FragmentSpread(fragment_spread) => {
                    if !self.is_included(&fragment_spread.node.directives)? {
                        continue;
                    }

                    let fragment_name = &fragment_spread.node.fragment_name.node;
                    if fragment_path.contains(fragment_name) {
                        return Err(ValidationError::FragmentCycle(
                            fragment_name.to_string(),
                            fragment_spread.pos,
                        ));
                    }

                    let fragment_definition = self
                        .fragment_definitions
                        .get(fragment_name)
                        .ok_or_else(|| {
                            ValidationError::FragmentDefinitionNotFound(
                                fragment_name.to_string(),
                                fragment_spread.pos,
                            )
                        })?;

                    check_type_condition(
                        &fragment_definition.node.type_condition.node.on.node,
                        container_type,
                        fragment_spread.pos,
                    )?;

                    fragment_path.push(fragment_name.clone());
                    self.collect_fields(
                        container_type,
                        &fragment_definition.node.selection_set,
                        depth,
                        fragment_path,
                        fields,
                    )?;
                    fragment_path.pop();
                }
                Selection::InlineFragment(inline_fragment) => {
                    if !self.is_included(&inline_fragment.node.directives)? {
                        continue;
                    }

                    if let Some(type_condition) = &inline_fragment.node.type_condition {
                        check_type_condition(
                            &type_condition.node.on.node,
                            container_type,
                            inline_fragment.pos,
                        )?;
                    }

                    self.collect_fields(
                        container_type,
                        &inline_fragment.node.selection_set,
                        depth,
                        fragment_path,
                        fields,
                    )?;
                }
            }
        }

        Ok(())
    }

    /// Validations performed:
    /// - The field is within the depth limit
    /// - The field is defined in the container type (or is `__typename`)
    /// - The arguments are valid (see [`ArgumentValidator`])
    /// - Scalar and enum fields select no subfields; object fields select at least one
    fn validate_field(
        &self,
        container_type: &TypeDefinition,
        field: &Positioned<Field>,
        depth: usize,
    ) -> Result<ValidatedField, ValidationError> {
        if depth > self.max_depth {
            return Err(ValidationError::SelectionSetTooDeep {
                max_depth: self.max_depth,
                pos: field.pos,
            });
        }

        let field_name = field.node.name.node.as_str();
        let container_type_name = container_type.name.node.as_str();

        if field_name == TYPENAME_FIELD {
            return self.validate_typename_field(field);
        }

        let field_definition = self
            .schema
            .get_field(container_type_name, field_name)
            .ok_or_else(|| {
                ValidationError::InvalidField(
                    field_name.to_string(),
                    container_type_name.to_string(),
                    field.pos,
                )
            })?;

        let arguments = ArgumentValidator::new(self.schema, self.variables, field_name, field.pos)
            .validate(&field_definition.arguments, &field.node.arguments)?;

        let field_type = &field_definition.ty.node;
        let field_type_name = underlying_type(field_type);
        let field_type_definition = self
            .schema
            .get_type_definition(field_type_name)
            .ok_or_else(|| {
                ValidationError::InvalidFieldType(field_type_name.to_string(), field.pos)
            })?;

        let selection_set = &field.node.selection_set;

        let subfields = match &field_type_definition.kind {
            TypeKind::Object(_) => {
                if selection_set.node.items.is_empty() {
                    return Err(ValidationError::ObjectWithoutFields(
                        field_name.to_string(),
                        field_type_name.to_string(),
                        field.pos,
                    ));
                }
                self.validate(field_type_definition, selection_set, depth + 1)?
            }
            _ => {
                if !selection_set.node.items.is_empty() {
                    return Err(ValidationError::ScalarWithField(
                        field_name.to_string(),
                        field.pos,
                    ));
                }
                vec![]
            }
        };

        Ok(ValidatedField {
            alias: field.node.alias.as_ref().map(|alias| alias.node.clone()),
            name: field.node.name.node.clone(),
            arguments,
            field_type: field_type.clone(),
            subfields,
            pos: field.pos,
        })
    }

    fn validate_typename_field(
        &self,
        field: &Positioned<Field>,
    ) -> Result<ValidatedField, ValidationError> {
        if !field.node.arguments.is_empty() {
            return Err(ValidationError::StrayArguments(
                field
                    .node
                    .arguments
                    .iter()
                    .map(|(name, _)| name.node.to_string())
                    .collect(),
                TYPENAME_FIELD.to_string(),
                field.pos,
            ));
        }

        if !field.node.selection_set.node.items.is_empty() {
            return Err(ValidationError::ScalarWithField(
                TYPENAME_FIELD.to_string(),
                field.pos,
            ));
        }

        Ok(ValidatedField {
            alias: field.node.alias.as_ref().map(|alias| alias.node.clone()),
            name: field.node.name.node.clone(),
            arguments: Map::new(),
            field_type: Type {
                base: BaseType::Named(Name::new("String")),
                nullable: false,
            },
            subfields: vec![],
            pos: field.pos,
        })
    }

    /// Evaluate `@skip(if: ...)` and `@include(if: ...)`.
    fn is_included(&self, directives: &[Positioned<Directive>]) -> Result<bool, ValidationError> {
        for directive in directives {
            let directive_name = directive.node.name.node.as_str();

            let skip_when = match directive_name {
                "skip" => true,
                "include" => false,
                _ => {
                    return Err(ValidationError::UnknownDirective(
                        directive_name.to_string(),
                        directive.pos,
                    ));
                }
            };

            let condition = directive
                .node
                .arguments
                .iter()
                .find(|(name, _)| name.node.as_str() == "if")
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    ValidationError::RequiredArgumentNotFound("if".to_string(), directive.pos)
                })?;

            match resolve_variables(condition, self.variables)? {
                ConstValue::Boolean(condition) if condition == skip_when => return Ok(false),
                ConstValue::Boolean(_) => {}
                _ => {
                    return Err(ValidationError::InvalidArgumentType {
                        argument_name: "if".to_string(),
                        message: format!("@{directive_name} expects a Boolean"),
                        pos: condition.pos,
                    });
                }
            }
        }

        Ok(true)
    }
}

fn check_type_condition(
    type_condition: &Name,
    container_type: &TypeDefinition,
    pos: Pos,
) -> Result<(), ValidationError> {
    if type_condition == &container_type.name.node {
        Ok(())
    } else {
        Err(ValidationError::FragmentTypeMismatch(
            type_condition.to_string(),
            container_type.name.node.to_string(),
            pos,
        ))
    }
}

/// Merge fields with the same response name (such as `{ id id }` or fields selected both directly
/// and through a fragment). Fields can be merged only if they select the same underlying field
/// with the same arguments; their subfields are merged recursively.
fn merge_fields(fields: Vec<ValidatedField>) -> Result<Vec<ValidatedField>, ValidationError> {
    let mut merged: Vec<ValidatedField> = vec![];

    for field in fields {
        let output_name = field.output_name();

        match merged
            .iter_mut()
            .find(|existing| existing.output_name() == output_name)
        {
            Some(existing) => {
                if existing.name != field.name || existing.arguments != field.arguments {
                    return Err(ValidationError::FieldConflict(output_name, field.pos));
                }
                existing.subfields.extend(field.subfields);
            }
            None => merged.push(field),
        }
    }

    merged
        .into_iter()
        .map(|mut field| {
            field.subfields = merge_fields(std::mem::take(&mut field.subfields))?;
            Ok(field)
        })
        .collect()
}
