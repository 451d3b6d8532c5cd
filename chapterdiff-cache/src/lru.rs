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

//! Bounded in-memory tier for hydrated chapters.
//!
//! Chapters and their access order are tracked separately: the chapter
//! list owns the content, the order list drives eviction. Evicted ids are
//! returned to the caller so it can downgrade the corresponding chapter
//! metadata to "not loaded". The chapter currently on screen can be
//! pinned so background hydration never evicts it.

use chapterdiff_core::Chapter;
use tracing::debug;

pub struct ChapterLru {
    capacity: usize,
    chapters: Vec<Chapter>,
    /// Least recently used first.
    access_order: Vec<String>,
    pinned: Option<String>,
}

impl ChapterLru {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            chapters: Vec::new(),
            access_order: Vec::new(),
            pinned: None,
        }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.chapters.iter().any(|c| c.id == id)
    }

    /// Ids of the hydrated chapters, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.chapters.iter().map(|c| c.id.as_str())
    }

    /// Protect a chapter from eviction (typically the one being viewed).
    pub fn set_pinned(&mut self, id: Option<String>) {
        self.pinned = id;
    }

    /// Look up a chapter without touching its access time.
    pub fn peek(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Look up a chapter and mark it most recently used.
    pub fn get(&mut self, id: &str) -> Option<&Chapter> {
        if !self.contains(id) {
            return None;
        }
        self.touch(id);
        self.peek(id)
    }

    /// Mutable lookup, marking the chapter most recently used.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Chapter> {
        if !self.contains(id) {
            return None;
        }
        self.touch(id);
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// Apply a mutation to a resident chapter, marking it most recently
    /// used. Returns `None` when the chapter is not resident.
    pub fn update<R>(&mut self, id: &str, f: impl FnOnce(&mut Chapter) -> R) -> Option<R> {
        let chapter = self.get_mut(id)?;
        Some(f(chapter))
    }

    fn touch(&mut self, id: &str) {
        self.access_order.retain(|entry| entry != id);
        self.access_order.push(id.to_string());
    }

    /// Insert or replace a chapter. Returns the ids evicted to stay
    /// within capacity.
    pub fn insert(&mut self, chapter: Chapter) -> Vec<String> {
        let id = chapter.id.clone();
        match self.chapters.iter_mut().find(|c| c.id == id) {
            Some(existing) => *existing = chapter,
            None => self.chapters.push(chapter),
        }
        self.touch(&id);

        let mut evicted = Vec::new();
        while self.chapters.len() > self.capacity {
            let victim = self
                .access_order
                .iter()
                .find(|candidate| Some(candidate.as_str()) != self.pinned.as_deref())
                .cloned();
            let Some(victim) = victim else { break };
            self.remove(&victim);
            debug!(chapter_id = %victim, "evicted chapter from memory cache");
            evicted.push(victim);
        }
        evicted
    }

    pub fn remove(&mut self, id: &str) -> Option<Chapter> {
        self.access_order.retain(|entry| entry != id);
        let index = self.chapters.iter().position(|c| c.id == id)?;
        Some(self.chapters.remove(index))
    }

    pub fn clear(&mut self) {
        self.chapters.clear();
        self.access_order.clear();
        self.pinned = None;
    }
}
