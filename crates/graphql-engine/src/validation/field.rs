// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{Pos, types::Type};
use async_graphql_value::Name;
use serde_json::{Map, Value};

pub const TYPENAME_FIELD: &str = "__typename";

#[derive(Debug, Clone)]
pub struct ValidatedField {
    pub alias: Option<Name>,
    /// The name of the field.
    pub name: Name,
    /// The coerced arguments to the field (including defaults), empty if the field takes none.
    pub arguments: Map<String, Value>,
    /// The declared type of the field.
    pub field_type: Type,
    /// The subfields being selected in this field, if it is an object. Empty if no fields are
    /// being selected.
    pub subfields: Vec<ValidatedField>,
    pub pos: Pos,
}

impl ValidatedField {
    pub fn output_name(&self) -> String {
        self.alias.as_ref().unwrap_or(&self.name).to_string()
    }
}
