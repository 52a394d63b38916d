// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use std::io::Write;

use tracing::debug;

/// Route a non-fatal diagnostic to the sink selected by `policy_report`:
/// structured log only when producing policy reports, human-readable text on
/// `out` otherwise.
pub(crate) fn emit<W: Write>(out: &mut W, policy_report: bool, message: &str) {
    if policy_report {
        debug!("{message}");
    } else {
        let _ = writeln!(out, "{message}");
    }
}
