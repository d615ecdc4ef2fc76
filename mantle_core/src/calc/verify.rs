// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static checking of calculations against an operator table.

use alloc::vec::Vec;
use core::fmt;

use super::{Binding, CalcKind, CalcNode, CalcValue, MAX_CALC_SIZE, OperatorTable};
use crate::unit::Unit;

/// Why a calculation was rejected.
///
/// `at` fields are node indices into [`Calculation::nodes`](super::Calculation::nodes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyError {
    /// The calculation exceeds [`MAX_CALC_SIZE`] nodes.
    TooLong {
        /// Number of nodes.
        len: usize,
    },
    /// A literal's payload does not match its declared kind.
    ValueMismatch {
        /// Offending node.
        at: usize,
    },
    /// An operator reference no longer resolves.
    StaleOperator {
        /// Offending node.
        at: usize,
    },
    /// An operator or binding needs more operands than the stack holds.
    StackUnderflow {
        /// Offending node.
        at: usize,
    },
    /// An operator argument has the wrong kind.
    ArgumentMismatch {
        /// Offending node.
        at: usize,
        /// Kind the operator declares.
        expected: CalcKind,
        /// Kind found on the stack.
        found: CalcKind,
    },
    /// An operator node carries a unit or a data/state binding.
    OperatorFlags {
        /// Offending node.
        at: usize,
    },
    /// A string or function value carries a unit.
    UnitOnUntypedValue {
        /// Offending node.
        at: usize,
    },
    /// A data/state binding is not preceded by a string key.
    MissingKey {
        /// Offending node.
        at: usize,
    },
    /// Evaluation would leave other than exactly one value.
    ResultCount {
        /// Values left on the stack.
        count: usize,
    },
    /// The final value has the wrong kind.
    ResultType {
        /// Kind the field requires.
        expected: CalcKind,
        /// Kind the calculation produces.
        found: CalcKind,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TooLong { len } => {
                write!(f, "calculation has {len} nodes (max {MAX_CALC_SIZE})")
            }
            Self::ValueMismatch { at } => {
                write!(f, "node {at}: literal does not match its declared kind")
            }
            Self::StaleOperator { at } => write!(f, "node {at}: operator no longer exists"),
            Self::StackUnderflow { at } => write!(f, "node {at}: not enough operands"),
            Self::ArgumentMismatch {
                at,
                expected,
                found,
            } => write!(f, "node {at}: expected {expected:?} argument, found {found:?}"),
            Self::OperatorFlags { at } => {
                write!(f, "node {at}: operators cannot carry units or bindings")
            }
            Self::UnitOnUntypedValue { at } => {
                write!(f, "node {at}: only numeric values can carry units")
            }
            Self::MissingKey { at } => write!(f, "node {at}: binding needs a string key"),
            Self::ResultCount { count } => {
                write!(f, "calculation leaves {count} values, expected 1")
            }
            Self::ResultType { expected, found } => {
                write!(f, "calculation produces {found:?}, expected {expected:?}")
            }
        }
    }
}

impl core::error::Error for VerifyError {}

/// Checks that `nodes` evaluates to exactly one value of kind `expected`.
///
/// Simulates the evaluation stack with kinds only. Units are ignored when
/// matching operator arguments, since every operand is resolved to pixels
/// before an operator sees it.
pub fn verify(
    nodes: &[CalcNode],
    ops: &OperatorTable,
    expected: CalcKind,
) -> Result<(), VerifyError> {
    if nodes.len() > MAX_CALC_SIZE {
        return Err(VerifyError::TooLong { len: nodes.len() });
    }

    let mut stack: Vec<CalcKind> = Vec::with_capacity(nodes.len());
    for (at, node) in nodes.iter().enumerate() {
        let kind = node.ty.kind;
        let has_unit = node.ty.unit != Unit::Px;

        if kind == CalcKind::Operator {
            if node.binding != Binding::Literal || has_unit {
                return Err(VerifyError::OperatorFlags { at });
            }
            let CalcValue::Operator(id) = node.value else {
                return Err(VerifyError::ValueMismatch { at });
            };
            let def = ops.get(id).ok_or(VerifyError::StaleOperator { at })?;
            let arity = def.args.len();
            if stack.len() < arity {
                return Err(VerifyError::StackUnderflow { at });
            }
            let base = stack.len() - arity;
            for (&found, &expected) in stack[base..].iter().zip(&def.args) {
                if found != expected {
                    return Err(VerifyError::ArgumentMismatch {
                        at,
                        expected,
                        found,
                    });
                }
            }
            stack.truncate(base);
            stack.push(def.result.kind);
            continue;
        }

        if has_unit && matches!(kind, CalcKind::Str | CalcKind::Func) {
            return Err(VerifyError::UnitOnUntypedValue { at });
        }

        match node.binding {
            Binding::Literal => {
                if node.value.kind() != kind {
                    return Err(VerifyError::ValueMismatch { at });
                }
            }
            Binding::Data | Binding::State => match stack.pop() {
                Some(CalcKind::Str) => {}
                Some(_) => return Err(VerifyError::MissingKey { at }),
                None => return Err(VerifyError::StackUnderflow { at }),
            },
        }
        stack.push(kind);
    }

    match stack.as_slice() {
        [found] if *found == expected => Ok(()),
        [found] => Err(VerifyError::ResultType {
            expected,
            found: *found,
        }),
        _ => Err(VerifyError::ResultCount { count: stack.len() }),
    }
}
