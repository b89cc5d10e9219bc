// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diagnostic side channel: the ordered record of stage snapshots and the
// overlays drawn into it.

pub mod overlay;
pub mod record;

pub use record::PipelineRecord;
