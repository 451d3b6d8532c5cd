// Copyright 2025 Chapterdiff (https://github.com/chapterdiff)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Chapterdiff Compute
//!
//! Isolates the O(n·m) word-diff computation behind a request/response
//! boundary so large documents never block interactive work. A dedicated
//! actor task receives requests over a channel and runs each diff on the
//! blocking thread pool; callers hold a cloneable handle that correlates
//! responses by request id and enforces cancellation and timeouts.

mod actor;

pub use actor::{ComputeConfig, DiffComputeActor, DiffComputeHandle, DiffResponse};
