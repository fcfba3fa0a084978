// SPDX-FileCopyrightText: 2026 Quotely Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure pricing derivations for Quotely.
//!
//! Totals are always derived from a quote's persisted lines on read; nothing
//! in this crate touches storage or the network, and identical inputs always
//! produce identical outputs.

pub mod message;
pub mod totals;

pub use message::{SendTargets, build_quote_message, build_send_targets};
pub use totals::{Totals, calc_totals, line_total, money, parse_override, subtotal};
