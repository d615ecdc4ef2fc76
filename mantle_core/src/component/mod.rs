// Copyright 2026 the Mantle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Behaviors shipped with the core.
//!
//! - [`boxes`]: a filled, bordered rectangle (`box`).
//! - [`text`]: a run of text (`text`).
//!
//! Both draw themselves and then return
//! [`Unhandled`](crate::message::MessageResult::Unhandled) so the default
//! behavior goes on to draw their children.

pub mod boxes;
pub mod text;

use crate::calc::CalcValue;

#[expect(clippy::cast_possible_truncation, reason = "colors are packed into the low 32 bits")]
pub(crate) fn color(value: &CalcValue) -> Option<u32> {
    value.as_i64().map(|v| v as u32)
}
