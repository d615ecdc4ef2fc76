// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack evaluation of verified calculations.

use alloc::string::String;
use alloc::vec::Vec;

use super::{Binding, CalcKind, CalcType, CalcValue, Calculation, OperatorTable};
use crate::unit::{Unit, UnitContext, resolve_unit};

/// Supplies values for `Data` and `State` nodes during evaluation.
pub trait Bindings {
    /// Looks up a data-graph field.
    ///
    /// The returned value must already be coerced to `ty.kind` and resolved
    /// to pixels; the data graph knows the unit its fields are stored in.
    fn data(&mut self, key: &str, ty: CalcType, units: &UnitContext) -> CalcValue;

    /// Looks up an outline field. The evaluator applies the node's unit.
    fn state(&mut self, key: &str, kind: CalcKind) -> CalcValue;
}

/// A stack entry whose unit has not been applied yet.
#[derive(Debug)]
struct Operand {
    value: CalcValue,
    unit: Unit,
}

impl Operand {
    const fn resolved(value: CalcValue) -> Self {
        Self {
            value,
            unit: Unit::Px,
        }
    }

    fn resolve(self, units: &UnitContext) -> CalcValue {
        apply_unit(self.value, self.unit, units)
    }
}

/// Converts a unit-tagged numeric value to pixels, keeping its kind.
fn apply_unit(value: CalcValue, unit: Unit, units: &UnitContext) -> CalcValue {
    if unit == Unit::Px {
        return value;
    }
    match value {
        CalcValue::Float(v) => CalcValue::Float(resolve_unit(v, unit, units)),
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            reason = "integer fields round-trip through pixels"
        )]
        CalcValue::Int(v) => CalcValue::Int(resolve_unit(v as f64, unit, units) as i64),
        other => other,
    }
}

fn pop_key(stack: &mut Vec<Operand>) -> String {
    match stack.pop().map(|o| o.value) {
        Some(CalcValue::Str(key)) => key,
        _ => {
            debug_assert!(false, "binding evaluated without a string key");
            String::new()
        }
    }
}

/// Evaluates a verified calculation.
///
/// Literal units ride on the stack until an operator consumes the value or
/// the value becomes the result; either way it is resolved against `units`
/// at that point. Bound values are resolved as soon as they are pushed.
///
/// Evaluating a calculation that does not [`verify`](super::verify) against
/// `ops` is a contract violation: debug builds assert, release builds yield
/// the zero value of the declared result kind.
pub fn evaluate(
    calc: &Calculation,
    ops: &OperatorTable,
    bindings: &mut dyn Bindings,
    units: &UnitContext,
) -> CalcValue {
    let mut stack: Vec<Operand> = Vec::with_capacity(calc.nodes().len());

    for node in calc.nodes() {
        match node.binding {
            Binding::Literal if node.ty.kind == CalcKind::Operator => {
                let def = match node.value {
                    CalcValue::Operator(id) => ops.get(id),
                    _ => None,
                };
                let Some(def) = def else {
                    debug_assert!(false, "stale operator in unverified calculation");
                    return CalcValue::zero(calc.result());
                };
                let arity = def.args.len();
                debug_assert!(stack.len() >= arity, "operator stack underflow");
                let base = stack.len().saturating_sub(arity);
                let args: Vec<CalcValue> = stack.drain(base..).map(|o| o.resolve(units)).collect();
                let value = (def.call)(&args);
                stack.push(Operand::resolved(apply_unit(value, def.result.unit, units)));
            }
            Binding::Literal => stack.push(Operand {
                value: node.value.clone(),
                unit: node.ty.unit,
            }),
            Binding::Data => {
                let key = pop_key(&mut stack);
                let value = bindings.data(&key, node.ty, units);
                stack.push(Operand::resolved(value));
            }
            Binding::State => {
                let key = pop_key(&mut stack);
                let value = bindings.state(&key, node.ty.kind);
                stack.push(Operand::resolved(apply_unit(value, node.ty.unit, units)));
            }
        }
    }

    debug_assert!(stack.len() == 1, "calculation left {} values", stack.len());
    match stack.pop() {
        Some(top) => top.resolve(units),
        None => CalcValue::zero(calc.result()),
    }
}

#[cfg(test)]
mod tests {
    use alloc::borrow::ToOwned;
    use alloc::collections::BTreeMap;
    use alloc::string::ToString;
    use alloc::vec::Vec;

    use super::*;
    use crate::calc::{CalcNode, verify};

    /// Serves fixed values and records every lookup.
    #[derive(Default)]
    struct Fixed {
        data: BTreeMap<String, CalcValue>,
        state: BTreeMap<String, CalcValue>,
        seen: Vec<String>,
    }

    impl Bindings for Fixed {
        fn data(&mut self, key: &str, ty: CalcType, _units: &UnitContext) -> CalcValue {
            self.seen.push(key.to_owned());
            self.data.get(key).cloned().unwrap_or(CalcValue::zero(ty.kind))
        }

        fn state(&mut self, key: &str, kind: CalcKind) -> CalcValue {
            self.seen.push(key.to_owned());
            self.state.get(key).cloned().unwrap_or(CalcValue::zero(kind))
        }
    }

    fn hidpi() -> UnitContext {
        UnitContext {
            font_size: 10.0,
            line_height: 12.0,
            dpi: 192.0,
            scale: 1.0,
        }
    }

    #[test]
    fn literal_units_resolve_at_the_result() {
        let ops = OperatorTable::standard();
        let calc = Calculation::float(8.0, Unit::Dp);
        let v = evaluate(&calc, &ops, &mut Fixed::default(), &hidpi());
        assert_eq!(v, CalcValue::Float(16.0));
    }

    #[test]
    fn operands_resolve_before_operators_see_them() {
        let ops = OperatorTable::standard();
        // 1em + 4dp at 10px font and 2x density.
        let calc = Calculation::builder(CalcKind::Float)
            .float_in(1.0, Unit::Em)
            .float_in(4.0, Unit::Dp)
            .op(ops.id("add_float").unwrap())
            .build();
        assert_eq!(verify(calc.nodes(), &ops, calc.result()), Ok(()));
        let v = evaluate(&calc, &ops, &mut Fixed::default(), &hidpi());
        assert_eq!(v, CalcValue::Float(18.0));
    }

    #[test]
    fn state_values_take_the_node_unit() {
        let ops = OperatorTable::standard();
        let mut fixed = Fixed::default();
        fixed.state.insert("gap".to_string(), CalcValue::Float(3.0));
        let calc = Calculation::builder(CalcKind::Float)
            .string("gap")
            .node(CalcNode::state(CalcKind::Float).with_unit(Unit::Ln))
            .build();
        let v = evaluate(&calc, &ops, &mut fixed, &hidpi());
        assert_eq!(v, CalcValue::Float(36.0));
        assert_eq!(fixed.seen, ["gap"]);
    }

    #[test]
    fn data_keys_are_popped_in_order() {
        let ops = OperatorTable::standard();
        let mut fixed = Fixed::default();
        fixed.data.insert("a".to_string(), CalcValue::Int(40));
        fixed.data.insert(".b".to_string(), CalcValue::Int(2));
        let calc = Calculation::builder(CalcKind::Int)
            .data("a", CalcKind::Int)
            .data(".b", CalcKind::Int)
            .op(ops.id("sub_int").unwrap())
            .build();
        assert_eq!(verify(calc.nodes(), &ops, calc.result()), Ok(()));
        let v = evaluate(&calc, &ops, &mut fixed, &UnitContext::IDENTITY);
        assert_eq!(v, CalcValue::Int(38));
        assert_eq!(fixed.seen, ["a", ".b"]);
    }

    #[test]
    fn strings_concatenate() {
        let ops = OperatorTable::standard();
        let calc = Calculation::builder(CalcKind::Str)
            .string("bo")
            .string("x")
            .op(ops.id("concat").unwrap())
            .build();
        let v = evaluate(&calc, &ops, &mut Fixed::default(), &UnitContext::IDENTITY);
        assert_eq!(v, CalcValue::Str("box".to_string()));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let ops = OperatorTable::standard();
        let calc = Calculation::builder(CalcKind::Float)
            .state("w", CalcKind::Float)
            .float_in(2.0, Unit::Mm)
            .op(ops.id("mul_float").unwrap())
            .build();
        let mut fixed = Fixed::default();
        fixed.state.insert("w".to_string(), CalcValue::Float(1.5));
        let a = evaluate(&calc, &ops, &mut fixed, &hidpi());
        let b = evaluate(&calc, &ops, &mut fixed, &hidpi());
        assert_eq!(a, b);
    }
}
