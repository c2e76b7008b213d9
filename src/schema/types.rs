// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Logical representation of a Parquet schema: the type tree, the flattened
//! descriptor, and conversion to/from the thrift `SchemaElement` list.

use std::fmt;
use std::sync::Arc;

use crate::basic::{ColumnOrder, ConvertedType, Repetition, SortOrder, Type as PhysicalType};
use crate::errors::{ParquetError, Result};
use crate::format::SchemaElement;

/// Reference counted pointer to a schema node.
pub type TypePtr = Arc<Type>;
/// Reference counted pointer to a schema descriptor.
pub type SchemaDescPtr = Arc<SchemaDescriptor>;
/// Reference counted pointer to a column descriptor.
pub type ColumnDescPtr = Arc<ColumnDescriptor>;

/// Representation of a Parquet type describing either a primitive leaf or a
/// nested group.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// A leaf carrying a physical type.
    PrimitiveType {
        basic_info: BasicTypeInfo,
        physical_type: PhysicalType,
        type_length: i32,
        scale: i32,
        precision: i32,
    },
    /// A nested group of other types.
    GroupType {
        basic_info: BasicTypeInfo,
        fields: Vec<TypePtr>,
    },
}

impl Type {
    /// Creates a primitive type builder with the given name and physical type.
    pub fn primitive_type_builder(name: &str, physical_type: PhysicalType) -> PrimitiveTypeBuilder {
        PrimitiveTypeBuilder::new(name, physical_type)
    }

    /// Creates a group type builder with the given name.
    pub fn group_type_builder(name: &str) -> GroupTypeBuilder {
        GroupTypeBuilder::new(name)
    }

    /// Basic information about this type.
    pub fn get_basic_info(&self) -> &BasicTypeInfo {
        match self {
            Type::PrimitiveType { basic_info, .. } => basic_info,
            Type::GroupType { basic_info, .. } => basic_info,
        }
    }

    /// Name of this type.
    pub fn name(&self) -> &str {
        &self.get_basic_info().name
    }

    /// Fields of this group type, panics for a primitive type.
    pub fn get_fields(&self) -> &[TypePtr] {
        match self {
            Type::GroupType { fields, .. } => &fields[..],
            _ => panic!("Cannot call get_fields() on a non-group type"),
        }
    }

    /// Physical type of this leaf, panics for a group type.
    pub fn get_physical_type(&self) -> PhysicalType {
        match self {
            Type::PrimitiveType { physical_type, .. } => *physical_type,
            _ => panic!("Cannot call get_physical_type() on a non-primitive type"),
        }
    }

    /// Whether this is a primitive type.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::PrimitiveType { .. })
    }

    /// Whether this is a group type.
    pub fn is_group(&self) -> bool {
        matches!(self, Type::GroupType { .. })
    }

    /// Whether this is the top-level schema node (no repetition).
    pub fn is_schema(&self) -> bool {
        matches!(self, Type::GroupType { basic_info, .. } if basic_info.repetition.is_none())
    }

    /// Whether this type is an optional field.
    pub fn is_optional(&self) -> bool {
        self.get_basic_info().has_repetition()
            && self.get_basic_info().repetition() == Repetition::OPTIONAL
    }
}

/// Common type information shared by primitive and group nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicTypeInfo {
    name: String,
    repetition: Option<Repetition>,
    converted_type: ConvertedType,
    id: Option<i32>,
}

impl BasicTypeInfo {
    /// Name of this type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this type has a repetition set (the schema root has none).
    pub fn has_repetition(&self) -> bool {
        self.repetition.is_some()
    }

    /// Repetition of this type. Panics when unset.
    pub fn repetition(&self) -> Repetition {
        assert!(self.repetition.is_some());
        self.repetition.unwrap()
    }

    /// Converted type of this type.
    pub fn converted_type(&self) -> ConvertedType {
        self.converted_type
    }

    /// Whether this type has a field id.
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Field id of this type, or -1 when unset.
    pub fn id(&self) -> i32 {
        self.id.unwrap_or(-1)
    }
}

/// Builder for primitive types.
pub struct PrimitiveTypeBuilder {
    name: String,
    repetition: Repetition,
    physical_type: PhysicalType,
    converted_type: ConvertedType,
    length: i32,
    precision: i32,
    scale: i32,
    id: Option<i32>,
}

impl PrimitiveTypeBuilder {
    fn new(name: &str, physical_type: PhysicalType) -> Self {
        Self {
            name: name.to_owned(),
            repetition: Repetition::OPTIONAL,
            physical_type,
            converted_type: ConvertedType::NONE,
            length: -1,
            precision: -1,
            scale: -1,
            id: None,
        }
    }

    /// Sets the repetition for this field.
    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = repetition;
        self
    }

    /// Sets the converted type for this field.
    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = converted_type;
        self
    }

    /// Sets the type length (FIXED_LEN_BYTE_ARRAY only).
    pub fn with_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    /// Sets precision for decimal types.
    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// Sets scale for decimal types.
    pub fn with_scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the optional field id.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Builds the primitive type, validating the configuration.
    pub fn build(self) -> Result<Type> {
        if self.physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && self.length <= 0 {
            return Err(general_err!(
                "Invalid FIXED_LEN_BYTE_ARRAY length: {} for field '{}'",
                self.length,
                self.name
            ));
        }
        match self.converted_type {
            ConvertedType::UTF8 | ConvertedType::JSON | ConvertedType::BSON
                if self.physical_type != PhysicalType::BYTE_ARRAY =>
            {
                return Err(general_err!(
                    "{} cannot annotate field '{}' because it is not a BYTE_ARRAY field",
                    self.converted_type,
                    self.name
                ));
            }
            _ => {}
        }
        Ok(Type::PrimitiveType {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: Some(self.repetition),
                converted_type: self.converted_type,
                id: self.id,
            },
            physical_type: self.physical_type,
            type_length: self.length,
            scale: self.scale,
            precision: self.precision,
        })
    }
}

/// Builder for group types.
pub struct GroupTypeBuilder {
    name: String,
    repetition: Option<Repetition>,
    converted_type: ConvertedType,
    fields: Vec<TypePtr>,
    id: Option<i32>,
}

impl GroupTypeBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            repetition: None,
            converted_type: ConvertedType::NONE,
            fields: Vec::new(),
            id: None,
        }
    }

    /// Sets the repetition for this group.
    pub fn with_repetition(mut self, repetition: Repetition) -> Self {
        self.repetition = Some(repetition);
        self
    }

    /// Sets the converted type for this group.
    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = converted_type;
        self
    }

    /// Sets the fields of this group.
    pub fn with_fields(mut self, fields: Vec<TypePtr>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the optional field id.
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Builds the group type.
    pub fn build(self) -> Result<Type> {
        Ok(Type::GroupType {
            basic_info: BasicTypeInfo {
                name: self.name,
                repetition: self.repetition,
                converted_type: self.converted_type,
                id: self.id,
            },
            fields: self.fields,
        })
    }
}

/// Path of a column in the schema, as a list of parts from the root.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ColumnPath {
    parts: Vec<String>,
}

impl ColumnPath {
    /// Creates a new column path from the given parts.
    pub fn new(parts: Vec<String>) -> Self {
        ColumnPath { parts }
    }

    /// Returns the dot-separated string representation of this path.
    pub fn string(&self) -> String {
        self.parts.join(".")
    }

    /// Returns the parts of this path.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

impl From<&str> for ColumnPath {
    fn from(single_path: &str) -> Self {
        ColumnPath::new(vec![single_path.to_owned()])
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(parts: Vec<String>) -> Self {
        ColumnPath::new(parts)
    }
}

/// Physical description of a leaf column: the primitive type together with
/// its maximum definition and repetition levels and its path from the root.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescriptor {
    primitive_type: TypePtr,
    max_def_level: i16,
    max_rep_level: i16,
    path: ColumnPath,
}

impl ColumnDescriptor {
    /// Creates a new descriptor for a leaf column.
    pub fn new(
        primitive_type: TypePtr,
        max_def_level: i16,
        max_rep_level: i16,
        path: ColumnPath,
    ) -> Self {
        Self {
            primitive_type,
            max_def_level,
            max_rep_level,
            path,
        }
    }

    /// Maximum definition level for this column.
    pub fn max_def_level(&self) -> i16 {
        self.max_def_level
    }

    /// Maximum repetition level for this column.
    pub fn max_rep_level(&self) -> i16 {
        self.max_rep_level
    }

    /// The path of this column from the schema root.
    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    /// The leaf node of this column.
    pub fn self_type(&self) -> &Type {
        self.primitive_type.as_ref()
    }

    /// Name of this column.
    pub fn name(&self) -> &str {
        self.primitive_type.name()
    }

    /// Converted type of this column.
    pub fn converted_type(&self) -> ConvertedType {
        self.primitive_type.get_basic_info().converted_type()
    }

    /// Physical type of this column.
    pub fn physical_type(&self) -> PhysicalType {
        match self.primitive_type.as_ref() {
            Type::PrimitiveType { physical_type, .. } => *physical_type,
            Type::GroupType { .. } => panic!("non-leaf type in column descriptor"),
        }
    }

    /// Type length of this column (FIXED_LEN_BYTE_ARRAY only).
    pub fn type_length(&self) -> i32 {
        match self.primitive_type.as_ref() {
            Type::PrimitiveType { type_length, .. } => *type_length,
            Type::GroupType { .. } => panic!("non-leaf type in column descriptor"),
        }
    }

    /// Sort order for statistics of this column, derived from the converted
    /// and physical type.
    pub fn sort_order(&self) -> SortOrder {
        ColumnOrder::get_sort_order(self.converted_type(), self.physical_type())
    }
}

/// A schema descriptor: flattened view of the schema tree with a descriptor
/// per leaf column.
#[derive(Debug, PartialEq)]
pub struct SchemaDescriptor {
    schema: TypePtr,
    leaves: Vec<ColumnDescPtr>,
}

impl SchemaDescriptor {
    /// Creates a new descriptor from the schema root.
    pub fn new(tp: TypePtr) -> Self {
        assert!(tp.is_group(), "SchemaDescriptor should take a GroupType");
        let mut leaves = Vec::new();
        for f in tp.get_fields() {
            let mut path = Vec::new();
            build_tree(f, 0, 0, &mut path, &mut leaves);
        }
        Self { schema: tp, leaves }
    }

    /// Returns the descriptor for the `i`-th leaf column.
    pub fn column(&self, i: usize) -> ColumnDescPtr {
        assert!(
            i < self.leaves.len(),
            "Index out of bound: {} not in [0, {})",
            i,
            self.leaves.len()
        );
        self.leaves[i].clone()
    }

    /// Returns all leaf column descriptors.
    pub fn columns(&self) -> &[ColumnDescPtr] {
        &self.leaves
    }

    /// Number of leaf columns.
    pub fn num_columns(&self) -> usize {
        self.leaves.len()
    }

    /// The schema root node.
    pub fn root_schema(&self) -> &Type {
        self.schema.as_ref()
    }

    /// Reference counted clone of the schema root.
    pub fn root_schema_ptr(&self) -> TypePtr {
        self.schema.clone()
    }

    /// Name of the schema root.
    pub fn name(&self) -> &str {
        self.schema.name()
    }
}

fn build_tree(
    tp: &TypePtr,
    mut max_def_level: i16,
    mut max_rep_level: i16,
    path_so_far: &mut Vec<String>,
    leaves: &mut Vec<ColumnDescPtr>,
) {
    assert!(tp.get_basic_info().has_repetition());
    path_so_far.push(tp.name().to_owned());
    match tp.get_basic_info().repetition() {
        Repetition::OPTIONAL => {
            max_def_level += 1;
        }
        Repetition::REPEATED => {
            max_def_level += 1;
            max_rep_level += 1;
        }
        _ => {}
    }
    match tp.as_ref() {
        Type::PrimitiveType { .. } => {
            leaves.push(Arc::new(ColumnDescriptor::new(
                tp.clone(),
                max_def_level,
                max_rep_level,
                ColumnPath::new(path_so_far.clone()),
            )));
        }
        Type::GroupType { fields, .. } => {
            for f in fields {
                build_tree(f, max_def_level, max_rep_level, path_so_far, leaves);
            }
        }
    }
    path_so_far.pop();
}

/// Converts a flattened `SchemaElement` list into a schema tree.
pub fn from_thrift(elements: &[SchemaElement]) -> Result<TypePtr> {
    if elements.is_empty() {
        return Err(general_err!("Input schema must not be empty"));
    }
    let (index, root) = from_thrift_helper(elements, 0, true)?;
    if index != elements.len() {
        return Err(general_err!(
            "Expected exactly {} schema elements, consumed {}",
            elements.len(),
            index
        ));
    }
    Ok(root)
}

fn from_thrift_helper(
    elements: &[SchemaElement],
    index: usize,
    is_root: bool,
) -> Result<(usize, TypePtr)> {
    if index >= elements.len() {
        return Err(general_err!(
            "Index out of bound, index = {}, len = {}",
            index,
            elements.len()
        ));
    }
    let element = &elements[index];
    match element.num_children {
        None | Some(0) => {
            // leaf
            let physical = element
                .type_
                .ok_or_else(|| general_err!("Leaf schema element must have a type"))?;
            let repetition = element
                .repetition_type
                .ok_or_else(|| general_err!("Leaf schema element must have a repetition"))?;
            let mut builder = Type::primitive_type_builder(&element.name, physical)
                .with_repetition(repetition)
                .with_converted_type(element.converted_type.unwrap_or(ConvertedType::NONE));
            if let Some(length) = element.type_length {
                builder = builder.with_length(length);
            }
            if let Some(precision) = element.precision {
                builder = builder.with_precision(precision);
            }
            if let Some(scale) = element.scale {
                builder = builder.with_scale(scale);
            }
            if let Some(id) = element.field_id {
                builder = builder.with_id(id);
            }
            Ok((index + 1, Arc::new(builder.build()?)))
        }
        Some(n) => {
            let mut fields = Vec::with_capacity(n as usize);
            let mut next_index = index + 1;
            for _ in 0..n {
                let (new_index, field) = from_thrift_helper(elements, next_index, false)?;
                next_index = new_index;
                fields.push(field);
            }
            let mut builder = Type::group_type_builder(&element.name)
                .with_converted_type(element.converted_type.unwrap_or(ConvertedType::NONE))
                .with_fields(fields);
            // The root of the schema has no repetition; all other nodes must.
            if !is_root {
                let repetition = element
                    .repetition_type
                    .ok_or_else(|| general_err!("Group schema element must have a repetition"))?;
                builder = builder.with_repetition(repetition);
            }
            if let Some(id) = element.field_id {
                builder = builder.with_id(id);
            }
            Ok((next_index, Arc::new(builder.build()?)))
        }
    }
}

/// Flattens a schema tree into a `SchemaElement` list by depth-first
/// traversal.
pub fn to_thrift(schema: &Type) -> Result<Vec<SchemaElement>> {
    if !schema.is_group() {
        return Err(general_err!("Root schema must be a group type"));
    }
    let mut elements = Vec::new();
    to_thrift_helper(schema, &mut elements);
    Ok(elements)
}

fn to_thrift_helper(schema: &Type, elements: &mut Vec<SchemaElement>) {
    match schema {
        Type::PrimitiveType {
            basic_info,
            physical_type,
            type_length,
            scale,
            precision,
        } => {
            elements.push(SchemaElement {
                type_: Some(*physical_type),
                type_length: (*type_length >= 0).then_some(*type_length),
                repetition_type: Some(basic_info.repetition()),
                name: basic_info.name().to_owned(),
                num_children: None,
                converted_type: (basic_info.converted_type() != ConvertedType::NONE)
                    .then_some(basic_info.converted_type()),
                scale: (*scale >= 0).then_some(*scale),
                precision: (*precision >= 0).then_some(*precision),
                field_id: basic_info.has_id().then(|| basic_info.id()),
            });
        }
        Type::GroupType { basic_info, fields } => {
            elements.push(SchemaElement {
                type_: None,
                type_length: None,
                repetition_type: basic_info.has_repetition().then(|| basic_info.repetition()),
                name: basic_info.name().to_owned(),
                num_children: Some(fields.len() as i32),
                converted_type: (basic_info.converted_type() != ConvertedType::NONE)
                    .then_some(basic_info.converted_type()),
                scale: None,
                precision: None,
                field_id: basic_info.has_id().then(|| basic_info.id()),
            });
            for field in fields {
                to_thrift_helper(field, elements);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> TypePtr {
        let a = Arc::new(
            Type::primitive_type_builder("a", PhysicalType::INT32)
                .with_repetition(Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        let b = Arc::new(
            Type::primitive_type_builder("b", PhysicalType::BYTE_ARRAY)
                .with_converted_type(ConvertedType::UTF8)
                .with_repetition(Repetition::OPTIONAL)
                .build()
                .unwrap(),
        );
        let inner = Arc::new(
            Type::primitive_type_builder("item", PhysicalType::INT64)
                .with_repetition(Repetition::REPEATED)
                .build()
                .unwrap(),
        );
        let list = Arc::new(
            Type::group_type_builder("list")
                .with_repetition(Repetition::OPTIONAL)
                .with_fields(vec![inner])
                .build()
                .unwrap(),
        );
        Arc::new(
            Type::group_type_builder("schema")
                .with_fields(vec![a, b, list])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_schema_descriptor_levels() {
        let descr = SchemaDescriptor::new(test_schema());
        assert_eq!(descr.num_columns(), 3);
        assert_eq!(descr.column(0).max_def_level(), 0);
        assert_eq!(descr.column(0).max_rep_level(), 0);
        assert_eq!(descr.column(1).max_def_level(), 1);
        assert_eq!(descr.column(1).max_rep_level(), 0);
        assert_eq!(descr.column(2).max_def_level(), 2);
        assert_eq!(descr.column(2).max_rep_level(), 1);
        assert_eq!(descr.column(2).path().string(), "list.item");
    }

    #[test]
    fn test_thrift_roundtrip() {
        let schema = test_schema();
        let elements = to_thrift(&schema).unwrap();
        assert_eq!(elements.len(), 5);
        let parsed = from_thrift(&elements).unwrap();
        assert_eq!(parsed.as_ref(), schema.as_ref());
    }

    #[test]
    fn test_sort_order_from_descriptor() {
        let descr = SchemaDescriptor::new(test_schema());
        assert_eq!(descr.column(0).sort_order(), SortOrder::SIGNED);
        assert_eq!(descr.column(1).sort_order(), SortOrder::UNSIGNED);
    }

    #[test]
    fn test_invalid_fixed_len_byte_array() {
        let res = Type::primitive_type_builder("f", PhysicalType::FIXED_LEN_BYTE_ARRAY).build();
        assert!(res.is_err());
    }
}
