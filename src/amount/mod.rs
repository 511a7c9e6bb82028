// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Money representation.
//!
//! - `decimal` - exact fixed-point arithmetic ([`ScaledValue`])
//! - `units` - per-chain smallest-unit / display-unit conversion

pub mod decimal;
pub mod units;

pub use decimal::{DecimalError, ScaledValue};
pub use units::{to_display_unit, to_smallest_integer, to_smallest_unit, Chain};
