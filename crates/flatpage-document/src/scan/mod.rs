// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection stages, leaf-first: edges → lines → corners → rectified page.
// Each stage is a pure function of its input and parameters.

pub mod corners;
pub mod edges;
pub mod lines;
pub mod rectify;

pub use corners::select_corners;
pub use edges::extract_edges;
pub use lines::detect_lines;
pub use rectify::rectify;
