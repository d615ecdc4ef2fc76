// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Postfix calculations: the expression language skins bind fields with.
//!
//! A [`Calculation`] is a flat sequence of [`CalcNode`]s evaluated on a
//! stack. Literals push themselves, operator references pop their arguments
//! and push one result, and `Data`/`State` bindings pop a key string and push
//! the value they look up.
//!
//! ```text
//!   [ "width"  State(Float) ]   [ 2.0  Operator(mul_float) ]
//!     key ──────► lookup ──────► × 2 ──────► result
//! ```
//!
//! Calculations are [verified](verify::verify) once against an
//! [`OperatorTable`] when a skin is built. Evaluation of an unverified
//! calculation is a contract violation.

mod eval;
mod op;
mod verify;

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::data::FunctionRef;
use crate::unit::Unit;

pub use eval::{Bindings, evaluate};
pub use op::{OperatorDef, OperatorFn, OperatorId, OperatorTable};
pub use verify::{VerifyError, verify};

/// Maximum number of nodes a single calculation may hold.
pub const MAX_CALC_SIZE: usize = 4096;

/// The kind of value a calculation node produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CalcKind {
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Owned string.
    Str,
    /// Opaque function reference from the data graph.
    Func,
    /// Reference to a registered operator.
    Operator,
}

/// How a node obtains its value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Binding {
    /// The node's own value.
    #[default]
    Literal,
    /// A data-graph field named by the key string below it on the stack.
    Data,
    /// A field of this outline (or an ancestor) named by the key below it.
    State,
}

/// A value kind together with its unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CalcType {
    /// The value kind.
    pub kind: CalcKind,
    /// The unit the value is expressed in.
    pub unit: Unit,
}

impl CalcType {
    /// A unitless (pixel) type of the given kind.
    #[inline]
    #[must_use]
    pub const fn new(kind: CalcKind) -> Self {
        Self {
            kind,
            unit: Unit::Px,
        }
    }

    /// The same kind in a different unit.
    #[inline]
    #[must_use]
    pub const fn with_unit(self, unit: Unit) -> Self {
        Self { unit, ..self }
    }
}

impl From<CalcKind> for CalcType {
    fn from(kind: CalcKind) -> Self {
        Self::new(kind)
    }
}

/// A concrete value on the evaluation stack.
#[derive(Clone, Debug, PartialEq)]
pub enum CalcValue {
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    Str(String),
    /// Function reference.
    Func(FunctionRef),
    /// Operator reference.
    Operator(OperatorId),
}

impl CalcValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> CalcKind {
        match self {
            Self::Int(_) => CalcKind::Int,
            Self::Float(_) => CalcKind::Float,
            Self::Str(_) => CalcKind::Str,
            Self::Func(_) => CalcKind::Func,
            Self::Operator(_) => CalcKind::Operator,
        }
    }

    /// The zero value of a kind, used when a binding cannot be satisfied.
    ///
    /// Operators have no natural zero; requesting one yields `Int(0)`.
    #[must_use]
    pub const fn zero(kind: CalcKind) -> Self {
        match kind {
            CalcKind::Int | CalcKind::Operator => Self::Int(0),
            CalcKind::Float => Self::Float(0.0),
            CalcKind::Str => Self::Str(String::new()),
            CalcKind::Func => Self::Func(FunctionRef(0)),
        }
    }

    /// Numeric view of this value; integers widen to float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            #[allow(
                clippy::cast_precision_loss,
                reason = "layout coordinates never approach 2^53"
            )]
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view of this value; floats truncate toward zero.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            #[expect(
                clippy::cast_possible_truncation,
                reason = "truncation is the conversion"
            )]
            Self::Float(v) => Some(v as i64),
            _ => None,
        }
    }

    /// String view of this value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// One element of a calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct CalcNode {
    /// How the value is obtained.
    pub binding: Binding,
    /// The declared type of the value this node pushes.
    pub ty: CalcType,
    /// Literal payload. For `Data`/`State` nodes this is ignored.
    pub value: CalcValue,
}

impl CalcNode {
    /// An integer literal.
    #[must_use]
    pub const fn int(v: i64) -> Self {
        Self::literal(CalcValue::Int(v))
    }

    /// A float literal.
    #[must_use]
    pub const fn float(v: f64) -> Self {
        Self::literal(CalcValue::Float(v))
    }

    /// A string literal.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::literal(CalcValue::Str(s.to_owned()))
    }

    /// A reference to a registered operator.
    #[must_use]
    pub const fn operator(id: OperatorId) -> Self {
        Self::literal(CalcValue::Operator(id))
    }

    /// A data-graph binding producing `kind`.
    #[must_use]
    pub const fn data(kind: CalcKind) -> Self {
        Self::bound(Binding::Data, kind)
    }

    /// An outline-state binding producing `kind`.
    #[must_use]
    pub const fn state(kind: CalcKind) -> Self {
        Self::bound(Binding::State, kind)
    }

    /// The same node tagged with `unit`.
    #[must_use]
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.ty.unit = unit;
        self
    }

    const fn literal(value: CalcValue) -> Self {
        Self {
            binding: Binding::Literal,
            ty: CalcType::new(value.kind()),
            value,
        }
    }

    const fn bound(binding: Binding, kind: CalcKind) -> Self {
        Self {
            binding,
            ty: CalcType::new(kind),
            value: CalcValue::zero(kind),
        }
    }
}

/// An immutable, postfix-ordered expression with a declared result kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Calculation {
    nodes: Box<[CalcNode]>,
    result: CalcKind,
}

impl Calculation {
    /// Wraps a node sequence. No validation happens until [`verify`].
    #[must_use]
    pub fn new(nodes: Vec<CalcNode>, result: CalcKind) -> Self {
        Self {
            nodes: nodes.into_boxed_slice(),
            result,
        }
    }

    /// Starts building a calculation producing `result`.
    #[must_use]
    pub fn builder(result: CalcKind) -> CalculationBuilder {
        CalculationBuilder {
            nodes: Vec::new(),
            result,
        }
    }

    /// A calculation yielding a single integer.
    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::builder(CalcKind::Int).int(v).build()
    }

    /// A calculation yielding a single float in `unit`.
    #[must_use]
    pub fn float(v: f64, unit: Unit) -> Self {
        Self::builder(CalcKind::Float).float_in(v, unit).build()
    }

    /// A calculation yielding a constant string.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::builder(CalcKind::Str).string(s).build()
    }

    /// A calculation reading a single data-graph field.
    #[must_use]
    pub fn data(key: &str, kind: CalcKind) -> Self {
        Self::builder(kind).data(key, kind).build()
    }

    /// A calculation reading a single outline field.
    #[must_use]
    pub fn state(key: &str, kind: CalcKind) -> Self {
        Self::builder(kind).state(key, kind).build()
    }

    /// The node sequence in evaluation order.
    #[must_use]
    pub fn nodes(&self) -> &[CalcNode] {
        &self.nodes
    }

    /// The declared result kind.
    #[must_use]
    pub const fn result(&self) -> CalcKind {
        self.result
    }

    /// Returns `true` if evaluation never consults data or state.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.nodes.iter().all(|n| n.binding == Binding::Literal)
    }

    /// Lists the static keys this calculation reads.
    ///
    /// A `Data` or `State` node whose key is a string literal immediately
    /// before it contributes `(binding, key)`. Keys computed by operators are
    /// dynamic and yield `None` in place of the key.
    pub fn dependencies(&self) -> impl Iterator<Item = (Binding, Option<&str>)> + '_ {
        self.nodes.iter().enumerate().filter_map(move |(i, node)| {
            if node.binding == Binding::Literal {
                return None;
            }
            let key = i
                .checked_sub(1)
                .map(|prev| &self.nodes[prev])
                .filter(|prev| prev.binding == Binding::Literal)
                .and_then(|prev| prev.value.as_str());
            Some((node.binding, key))
        })
    }
}

/// Incremental constructor for [`Calculation`].
#[derive(Clone, Debug)]
pub struct CalculationBuilder {
    nodes: Vec<CalcNode>,
    result: CalcKind,
}

impl CalculationBuilder {
    /// Pushes an integer literal.
    #[must_use]
    pub fn int(self, v: i64) -> Self {
        self.node(CalcNode::int(v))
    }

    /// Pushes an integer literal in `unit`.
    #[must_use]
    pub fn int_in(self, v: i64, unit: Unit) -> Self {
        self.node(CalcNode::int(v).with_unit(unit))
    }

    /// Pushes a float literal.
    #[must_use]
    pub fn float(self, v: f64) -> Self {
        self.node(CalcNode::float(v))
    }

    /// Pushes a float literal in `unit`.
    #[must_use]
    pub fn float_in(self, v: f64, unit: Unit) -> Self {
        self.node(CalcNode::float(v).with_unit(unit))
    }

    /// Pushes a string literal.
    #[must_use]
    pub fn string(self, s: &str) -> Self {
        self.node(CalcNode::string(s))
    }

    /// Pushes an operator reference.
    #[must_use]
    pub fn op(self, id: OperatorId) -> Self {
        self.node(CalcNode::operator(id))
    }

    /// Pushes `key` followed by a data binding of `kind`.
    #[must_use]
    pub fn data(self, key: &str, kind: CalcKind) -> Self {
        self.string(key).node(CalcNode::data(kind))
    }

    /// Pushes `key` followed by a data binding of `kind` in `unit`.
    #[must_use]
    pub fn data_in(self, key: &str, kind: CalcKind, unit: Unit) -> Self {
        self.string(key).node(CalcNode::data(kind).with_unit(unit))
    }

    /// Pushes `key` followed by a state binding of `kind`.
    #[must_use]
    pub fn state(self, key: &str, kind: CalcKind) -> Self {
        self.string(key).node(CalcNode::state(kind))
    }

    /// Pushes an arbitrary node.
    #[must_use]
    pub fn node(mut self, node: CalcNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Finishes the calculation.
    #[must_use]
    pub fn build(self) -> Calculation {
        Calculation::new(self.nodes, self.result)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn builder_pushes_key_before_binding() {
        let calc = Calculation::data(".fillcolor", CalcKind::Int);
        assert_eq!(calc.nodes().len(), 2);
        assert_eq!(calc.nodes()[0].value.as_str(), Some(".fillcolor"));
        assert_eq!(calc.nodes()[1].binding, Binding::Data);
        assert!(!calc.is_constant());
    }

    #[test]
    fn dependencies_report_static_keys() {
        let ops = OperatorTable::standard();
        let add = ops.id("add_float").unwrap();
        let calc = Calculation::builder(CalcKind::Float)
            .state("^width", CalcKind::Float)
            .data("size.x", CalcKind::Float)
            .op(add)
            .build();
        let deps: Vec<_> = calc.dependencies().collect();
        assert_eq!(
            deps,
            [
                (Binding::State, Some("^width")),
                (Binding::Data, Some("size.x")),
            ]
        );
    }

    #[test]
    fn computed_keys_are_dynamic() {
        let ops = OperatorTable::standard();
        let concat = ops.id("concat").unwrap();
        let calc = Calculation::builder(CalcKind::Int)
            .string("fill")
            .string("color")
            .op(concat)
            .node(CalcNode::data(CalcKind::Int))
            .build();
        let deps: Vec<_> = calc.dependencies().collect();
        assert_eq!(deps, [(Binding::Data, None)]);
    }

    #[test]
    fn value_views() {
        assert_eq!(CalcValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CalcValue::Float(-2.7).as_i64(), Some(-2));
        assert_eq!(CalcValue::Str("x".into()).as_f64(), None);
        assert_eq!(CalcValue::zero(CalcKind::Str), CalcValue::Str(String::new()));
    }
}
