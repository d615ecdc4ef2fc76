// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The application data graph, seen through a [`DataAccessor`].
//!
//! The engine never owns application data. It holds opaque [`DataRef`]s and
//! asks the accessor for typed [`DataField`] descriptors by name or index.
//! Skins address fields with dotted keys: `".label"` is relative to the
//! outline's own data node, `"settings.theme"` starts at the document's root
//! data node.
//!
//! [`MemoryGraph`] is an in-memory accessor for tests, tools and demos.

mod memory;

use alloc::string::String;

use crate::calc::{CalcKind, CalcType, CalcValue};
use crate::unit::{Unit, UnitContext, resolve_unit};

pub use memory::MemoryGraph;

/// An opaque handle to an object in the application data graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataRef(pub u64);

/// An opaque handle to a callable in the application data graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionRef(pub u64);

/// The storage kind of a data field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// No value.
    #[default]
    None,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Callable.
    Function,
    /// 8-bit character.
    Char,
    /// Unsigned byte.
    Byte,
    /// Complex value stored by reference.
    Complex,
    /// Record with named fields.
    Object,
    /// Indexed sequence.
    Array,
}

/// A field value as reported by a [`DataAccessor`].
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DataValue {
    /// Missing or empty.
    #[default]
    None,
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// Callable.
    Function(FunctionRef),
    /// Single character.
    Char(u8),
    /// Single byte.
    Byte(u8),
    /// Complex value.
    Complex(DataRef),
    /// Record.
    Object(DataRef),
    /// Sequence of `element`s. Character and byte arrays are strings.
    Array {
        /// Element storage kind.
        element: Primitive,
        /// The sequence object.
        obj: DataRef,
    },
    /// A fully materialized string, returned for whole-array reads of
    /// character or byte arrays.
    Text(String),
}

impl DataValue {
    /// The storage kind of this value.
    #[must_use]
    pub const fn primitive(&self) -> Primitive {
        match self {
            Self::None => Primitive::None,
            Self::Float(_) => Primitive::Float,
            Self::Double(_) => Primitive::Double,
            Self::Int32(_) => Primitive::Int32,
            Self::Int64(_) => Primitive::Int64,
            Self::Function(_) => Primitive::Function,
            Self::Char(_) => Primitive::Char,
            Self::Byte(_) => Primitive::Byte,
            Self::Complex(_) => Primitive::Complex,
            Self::Object(_) => Primitive::Object,
            Self::Array { .. } | Self::Text(_) => Primitive::Array,
        }
    }

    /// Returns `true` for [`DataValue::None`].
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A typed view of one field of a data object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataField {
    /// The field's value.
    pub value: DataValue,
    /// The object backing this field, when it can be written or traversed.
    pub obj: Option<DataRef>,
    /// The unit numeric values are stored in.
    pub unit: Unit,
    /// Application type name, used to pick templates for array elements.
    pub type_name: String,
}

impl DataField {
    /// A missing field.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Which element of a sequence to read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataIndex {
    /// The element at a position.
    At(usize),
    /// The whole sequence; for character arrays this yields [`DataValue::Text`].
    All,
}

/// Read/write access to the application's data graph.
pub trait DataAccessor {
    /// Reads a named field of `obj`. `None` describes `obj` itself.
    fn get_field(&self, obj: DataRef, name: Option<&str>) -> DataField;

    /// Reads an element of the sequence `obj`.
    fn get_index(&self, obj: DataRef, index: DataIndex) -> DataField;

    /// Overwrites the scalar stored in `obj`.
    fn set_scalar(&mut self, obj: DataRef, value: DataValue) -> bool;

    /// Replaces `count` elements of the sequence `obj` starting at `offset`
    /// with `values`.
    fn set_range(
        &mut self,
        obj: DataRef,
        element: Primitive,
        values: &[DataValue],
        offset: usize,
        count: usize,
    ) -> bool;
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Where a dotted key starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyRoot {
    /// The outline's own data node (`".name"`).
    Node,
    /// The document's root data node (`"name"`).
    Root,
}

/// Splits a key into its root and remaining dotted path.
#[must_use]
pub fn split_key(key: &str) -> (KeyRoot, &str) {
    match key.strip_prefix('.') {
        Some(rest) => (KeyRoot::Node, rest),
        None => (KeyRoot::Root, key),
    }
}

/// Walks all but the last segment of `path` from `base`.
///
/// Returns the object holding the final field and that field's name. An
/// empty path names `base` itself and yields `(base, None)`.
pub fn resolve_container<'k>(
    accessor: &dyn DataAccessor,
    base: DataRef,
    path: &'k str,
) -> Option<(DataRef, Option<&'k str>)> {
    let mut segments = path.split('.').filter(|s| !s.is_empty());
    let Some(mut last) = segments.next() else {
        return Some((base, None));
    };
    let mut obj = base;
    for next in segments {
        obj = accessor.get_field(obj, Some(last)).obj?;
        last = next;
    }
    Some((obj, Some(last)))
}

/// Reads the field `path` names below `base`.
#[must_use]
pub fn lookup(accessor: &dyn DataAccessor, base: DataRef, path: &str) -> DataField {
    match resolve_container(accessor, base, path) {
        Some((obj, name)) => accessor.get_field(obj, name),
        None => DataField::none(),
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Converts a data field to the kind a calculation node expects.
///
/// Numeric storage converts to `Int` or `Float` with the field's unit (or,
/// when the field is unitless, the node's unit) resolved to pixels.
/// Functions become `Func`; character and byte arrays become `Str` via a
/// whole-sequence read. Anything else yields the zero value of the kind.
#[must_use]
pub fn coerce(
    field: &DataField,
    expected: CalcType,
    accessor: &dyn DataAccessor,
    units: &UnitContext,
) -> CalcValue {
    let unit = if field.unit == Unit::Px {
        expected.unit
    } else {
        field.unit
    };
    let numeric = match field.value {
        DataValue::Float(v) => Some(f64::from(v)),
        DataValue::Double(v) => Some(v),
        DataValue::Int32(v) => Some(f64::from(v)),
        #[allow(clippy::cast_precision_loss, reason = "data integers are layout-sized")]
        DataValue::Int64(v) => Some(v as f64),
        _ => None,
    };

    match expected.kind {
        CalcKind::Float => match numeric {
            Some(v) => CalcValue::Float(resolve_unit(v, unit, units)),
            None => CalcValue::zero(CalcKind::Float),
        },
        CalcKind::Int => match (&field.value, numeric) {
            (DataValue::Int32(_) | DataValue::Int64(_), _) if unit == Unit::Px => {
                CalcValue::Int(match field.value {
                    DataValue::Int32(v) => i64::from(v),
                    DataValue::Int64(v) => v,
                    _ => 0,
                })
            }
            #[expect(clippy::cast_possible_truncation, reason = "truncation is the conversion")]
            (_, Some(v)) => CalcValue::Int(resolve_unit(v, unit, units) as i64),
            _ => CalcValue::zero(CalcKind::Int),
        },
        CalcKind::Func => match field.value {
            DataValue::Function(f) => CalcValue::Func(f),
            _ => CalcValue::zero(CalcKind::Func),
        },
        CalcKind::Str => match &field.value {
            DataValue::Text(s) => CalcValue::Str(s.clone()),
            DataValue::Array {
                element: Primitive::Char | Primitive::Byte,
                obj,
            } => match accessor.get_index(*obj, DataIndex::All).value {
                DataValue::Text(s) => CalcValue::Str(s),
                _ => CalcValue::zero(CalcKind::Str),
            },
            _ => CalcValue::zero(CalcKind::Str),
        },
        CalcKind::Operator => CalcValue::zero(CalcKind::Operator),
    }
}
