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

//! Settings seam for the whitespace-sensitivity toggle.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait SettingsProvider: Send + Sync {
    fn ignore_whitespace(&self) -> bool;
    fn set_ignore_whitespace(&self, value: bool);
}

/// Process-local settings, used when the host application does not bring
/// its own settings store.
#[derive(Default)]
pub struct InMemorySettings {
    ignore_whitespace: AtomicBool,
}

impl InMemorySettings {
    pub fn new(ignore_whitespace: bool) -> Self {
        Self { ignore_whitespace: AtomicBool::new(ignore_whitespace) }
    }
}

impl SettingsProvider for InMemorySettings {
    fn ignore_whitespace(&self) -> bool {
        self.ignore_whitespace.load(Ordering::Relaxed)
    }

    fn set_ignore_whitespace(&self, value: bool) {
        self.ignore_whitespace.store(value, Ordering::Relaxed);
    }
}
