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
mod cast;
mod literal;
mod slot;
pub mod strict_cast;
pub mod typename;

use crate::common::ids::SlotId;
use crate::exec::chunk::Chunk;
use arrow::array::{ArrayRef, new_null_array};
use arrow::datatypes::DataType;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use self::strict_cast::CastSpec;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ExprId(pub usize);

#[derive(Clone, Debug)]
pub enum LiteralValue {
    Null,
    Utf8(String),
}

#[derive(Clone, Debug)]
pub enum ExprNode {
    Literal(LiteralValue),
    /// Slot id assigned by the planner's descriptor table.
    SlotRef(SlotId),
    /// Strict text-to-number cast bound once at plan compilation time.
    /// The bound CastSpec is immutable and shared by every batch evaluation.
    TryCastStrict {
        value: ExprId,
        spec: Arc<CastSpec>,
    },
}

/// Function kind identifier for all supported scalar functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    TryCastStrict,
}

/// Static function registry mapping function names to FunctionKind.
/// Uses case-insensitive matching.
pub static FUNCTION_REGISTRY: Lazy<HashMap<&'static str, FunctionKind>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Two-argument variant (value, type) and three-argument variant
    // (value, type, decimal_separator); both resolve through the same binder.
    m.insert("try_cast_strict", FunctionKind::TryCastStrict);
    m.insert("try_cast_strict_sp", FunctionKind::TryCastStrict);

    m
});

/// Bind a scalar function call by name. Binding validates the constant
/// arguments once per compiled query; later `eval` calls reuse the bound node.
pub fn bind_scalar_function(
    arena: &mut ExprArena,
    name: &str,
    args: &[ExprId],
) -> Result<ExprId, String> {
    let lower = name.to_ascii_lowercase();
    match FUNCTION_REGISTRY.get(lower.as_str()) {
        Some(FunctionKind::TryCastStrict) => strict_cast::bind_try_cast_strict(arena, args),
        None => Err(format!("unknown scalar function '{}'", name)),
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<ExprNode>,
    types: Vec<DataType>,
}

impl ExprArena {
    pub fn push_typed(&mut self, node: ExprNode, data_type: DataType) -> ExprId {
        let id = ExprId(self.nodes.len());
        self.nodes.push(node);
        self.types.push(data_type);
        id
    }

    pub fn node(&self, id: ExprId) -> Option<&ExprNode> {
        self.nodes.get(id.0)
    }

    pub fn data_type(&self, id: ExprId) -> Option<&DataType> {
        self.types.get(id.0)
    }

    pub fn eval(&self, id: ExprId, chunk: &Chunk) -> Result<ArrayRef, String> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| "invalid ExprId".to_string())?;
        match node {
            ExprNode::Literal(v) => {
                if matches!(v, LiteralValue::Null) {
                    let target_type = self.data_type(id).cloned().unwrap_or(DataType::Null);
                    if !matches!(target_type, DataType::Null) {
                        // Typed NULL literals must preserve the declared type.
                        return Ok(new_null_array(&target_type, chunk.len()));
                    }
                }
                literal::eval(v, chunk.len())
            }
            ExprNode::SlotRef(slot_id) => slot::eval_slot_ref(*slot_id, chunk),
            ExprNode::TryCastStrict { value, spec } => {
                strict_cast::eval(self, *value, spec, chunk)
            }
        }
    }
}

pub(crate) fn cast_text_to_target(
    array: &ArrayRef,
    target_type: &DataType,
) -> Result<ArrayRef, String> {
    cast::cast_text_to_type(array, target_type)
}
