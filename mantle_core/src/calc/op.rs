// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Operator registry.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::{CalcKind, CalcType, CalcValue};

/// Signature of an operator implementation.
///
/// Arguments arrive in push order with units already resolved to pixels.
pub type OperatorFn = fn(&[CalcValue]) -> CalcValue;

/// Largest number of arguments an operator may declare.
pub const MAX_OPERATOR_ARGS: usize = 6;

/// A registered operator.
#[derive(Clone)]
pub struct OperatorDef {
    /// Registry name, e.g. `"add_float"`.
    pub name: String,
    /// Argument kinds in push order.
    pub args: Vec<CalcKind>,
    /// Result type.
    pub result: CalcType,
    /// Implementation.
    pub call: OperatorFn,
}

impl OperatorDef {
    /// Describes an operator.
    ///
    /// # Panics
    ///
    /// Panics if more than six arguments are declared.
    #[must_use]
    pub fn new(name: &str, args: &[CalcKind], result: CalcKind, call: OperatorFn) -> Self {
        assert!(
            args.len() <= MAX_OPERATOR_ARGS,
            "operator {name} declares {} arguments (max {MAX_OPERATOR_ARGS})",
            args.len()
        );
        Self {
            name: name.to_owned(),
            args: args.to_vec(),
            result: CalcType::new(result),
            call,
        }
    }
}

impl fmt::Debug for OperatorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDef")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// A handle to an operator in an [`OperatorTable`].
///
/// Removing an operator bumps its slot's generation, so calculations that
/// still reference it fail verification with
/// [`VerifyError::StaleOperator`](super::VerifyError::StaleOperator).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorId {
    idx: u32,
    generation: u32,
}

impl fmt::Debug for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperatorId({}@gen{})", self.idx, self.generation)
    }
}

/// Named, generational operator storage.
#[derive(Debug, Default)]
pub struct OperatorTable {
    slots: Vec<Option<OperatorDef>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    names: BTreeMap<String, u32>,
}

impl OperatorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A table preloaded with the arithmetic, conversion and string operators.
    #[must_use]
    pub fn standard() -> Self {
        let mut table = Self::new();
        for def in standard_operators() {
            table.register(def);
        }
        table
    }

    /// Registers an operator and returns its handle.
    ///
    /// If an operator of the same name already exists, the existing handle
    /// is returned and `def` is discarded.
    pub fn register(&mut self, def: OperatorDef) -> OperatorId {
        if let Some(id) = self.id(&def.name) {
            return id;
        }
        let name = def.name.clone();
        let idx = if let Some(idx) = self.free_list.pop() {
            self.slots[idx as usize] = Some(def);
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "operator counts stay far below u32::MAX"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Some(def));
            self.generation.push(0);
            idx
        };
        self.names.insert(name, idx);
        OperatorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Removes the named operator. Outstanding handles become stale.
    pub fn remove(&mut self, name: &str) -> bool {
        let Some(idx) = self.names.remove(name) else {
            return false;
        };
        self.slots[idx as usize] = None;
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        true
    }

    /// Looks up an operator by handle. Returns `None` for stale handles.
    #[must_use]
    pub fn get(&self, id: OperatorId) -> Option<&OperatorDef> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots[id.idx as usize].as_ref()
    }

    /// Looks up an operator handle by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<OperatorId> {
        let idx = *self.names.get(name)?;
        Some(OperatorId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Number of registered operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no operators are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Built-in operators
// ---------------------------------------------------------------------------

fn int_arg(args: &[CalcValue], i: usize) -> i64 {
    args.get(i).and_then(CalcValue::as_i64).unwrap_or(0)
}

fn float_arg(args: &[CalcValue], i: usize) -> f64 {
    args.get(i).and_then(CalcValue::as_f64).unwrap_or(0.0)
}

fn str_arg(args: &[CalcValue], i: usize) -> &str {
    args.get(i).and_then(CalcValue::as_str).unwrap_or("")
}

fn standard_operators() -> Vec<OperatorDef> {
    use CalcKind::{Float, Int, Str};

    Vec::from([
        OperatorDef::new("add_int", &[Int, Int], Int, |a| {
            CalcValue::Int(int_arg(a, 0).wrapping_add(int_arg(a, 1)))
        }),
        OperatorDef::new("sub_int", &[Int, Int], Int, |a| {
            CalcValue::Int(int_arg(a, 0).wrapping_sub(int_arg(a, 1)))
        }),
        OperatorDef::new("mul_int", &[Int, Int], Int, |a| {
            CalcValue::Int(int_arg(a, 0).wrapping_mul(int_arg(a, 1)))
        }),
        // Integer division by zero yields zero rather than trapping.
        OperatorDef::new("div_int", &[Int, Int], Int, |a| {
            CalcValue::Int(int_arg(a, 0).checked_div(int_arg(a, 1)).unwrap_or(0))
        }),
        OperatorDef::new("neg_int", &[Int], Int, |a| {
            CalcValue::Int(int_arg(a, 0).wrapping_neg())
        }),
        OperatorDef::new("add_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0) + float_arg(a, 1))
        }),
        OperatorDef::new("sub_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0) - float_arg(a, 1))
        }),
        OperatorDef::new("mul_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0) * float_arg(a, 1))
        }),
        OperatorDef::new("div_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0) / float_arg(a, 1))
        }),
        OperatorDef::new("neg_float", &[Float], Float, |a| {
            CalcValue::Float(-float_arg(a, 0))
        }),
        OperatorDef::new("min_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0).min(float_arg(a, 1)))
        }),
        OperatorDef::new("max_float", &[Float, Float], Float, |a| {
            CalcValue::Float(float_arg(a, 0).max(float_arg(a, 1)))
        }),
        OperatorDef::new("int_to_float", &[Int], Float, |a| {
            CalcValue::Float(float_arg(a, 0))
        }),
        OperatorDef::new("float_to_int", &[Float], Int, |a| {
            CalcValue::Int(int_arg(a, 0))
        }),
        OperatorDef::new("concat", &[Str, Str], Str, |a| {
            let mut s = String::from(str_arg(a, 0));
            s.push_str(str_arg(a, 1));
            CalcValue::Str(s)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_first_wins() {
        let mut table = OperatorTable::new();
        let a = table.register(OperatorDef::new("one", &[], CalcKind::Int, |_| {
            CalcValue::Int(1)
        }));
        let b = table.register(OperatorDef::new("one", &[], CalcKind::Int, |_| {
            CalcValue::Int(2)
        }));
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        let def = table.get(a).unwrap();
        assert_eq!((def.call)(&[]), CalcValue::Int(1));
    }

    #[test]
    fn removal_stales_handles() {
        let mut table = OperatorTable::standard();
        let id = table.id("neg_int").unwrap();
        assert!(table.remove("neg_int"));
        assert!(table.get(id).is_none());
        assert!(!table.remove("neg_int"));

        // The slot is reused under a new generation.
        let fresh = table.register(OperatorDef::new("twice", &[CalcKind::Int], CalcKind::Int, |a| {
            CalcValue::Int(int_arg(a, 0) * 2)
        }));
        assert_ne!(fresh, id);
        assert!(table.get(id).is_none());
        assert!(table.get(fresh).is_some());
    }

    #[test]
    fn integer_division_by_zero_is_zero() {
        let table = OperatorTable::standard();
        let div = table.get(table.id("div_int").unwrap()).unwrap();
        assert_eq!((div.call)(&[CalcValue::Int(7), CalcValue::Int(0)]), CalcValue::Int(0));
        assert_eq!((div.call)(&[CalcValue::Int(7), CalcValue::Int(2)]), CalcValue::Int(3));
    }

    #[test]
    #[should_panic(expected = "declares 7 arguments")]
    fn too_many_arguments_panics() {
        let _ = OperatorDef::new("wide", &[CalcKind::Int; 7], CalcKind::Int, |_| {
            CalcValue::Int(0)
        });
    }
}
