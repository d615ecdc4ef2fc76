// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed access to the fields a behavior or layout keeps in its state.
//!
//! Every registered behavior and layout carries a [`Resolver`]. The context
//! enumerates its [`fields`](Resolver::fields) once to build the global
//! field-name table; after that, state messages go through
//! [`get`](Resolver::get) and [`set`](Resolver::set) with the numeric
//! [`FieldId`]. A resolver answering `None` or `false` is not an error: the
//! message router simply asks the next resolver in the chain.

use core::any::Any;

use crate::calc::{CalcKind, CalcValue};
use crate::field::{FieldId, FieldInfo};

/// Field table and typed accessors for one kind of component state.
pub trait Resolver {
    /// The fields this component declares.
    fn fields(&self) -> &'static [FieldInfo];

    /// Reads a field from `state`. `None` means "not mine".
    fn get(&self, state: &dyn Any, field: FieldId) -> Option<CalcValue>;

    /// Writes a field into `state`. `false` means "not mine".
    fn set(&self, state: &mut dyn Any, field: FieldId, value: &CalcValue) -> bool;

    /// Translates a field name (ASCII case-insensitive) to its id.
    fn id_of(&self, name: &str) -> Option<FieldId> {
        self.fields()
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.id)
    }

    /// Returns the declared kind of `field`, if this resolver owns it.
    fn kind_of(&self, field: FieldId) -> Option<CalcKind> {
        self.fields().iter().find(|f| f.id == field).map(|f| f.kind)
    }

    /// Returns `true` if this resolver owns `field`.
    fn declares(&self, field: FieldId) -> bool {
        self.kind_of(field).is_some()
    }
}

/// A resolver that declares nothing and rejects everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn fields(&self) -> &'static [FieldInfo] {
        &[]
    }

    fn get(&self, _state: &dyn Any, _field: FieldId) -> Option<CalcValue> {
        None
    }

    fn set(&self, _state: &mut dyn Any, _field: FieldId, _value: &CalcValue) -> bool {
        false
    }
}
