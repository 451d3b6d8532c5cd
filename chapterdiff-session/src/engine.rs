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

//! The comparison engine.
//!
//! Single owner of session state. Consumers drive it through the
//! operations below; every mutation takes the state lock briefly, leaves
//! a fully-formed snapshot behind, and publishes a change notification.
//! The expensive diff work happens in the compute actor, and every
//! asynchronous continuation re-checks the session generation before it
//! is allowed to touch state, so responses that outlive a navigation or
//! a reload land nowhere.

use crate::error::{SessionError, SessionResult};
use crate::hydrate::hydrate_from_changes;
use crate::provider::ContentProvider;
use crate::settings::SettingsProvider;
use crate::state::{ChapterPhase, SessionEvent, SessionPhase, SessionView};
use crate::stream;
use crate::text::take_chars;
use chapterdiff_cache::{BookCacheProvider, CacheKey, ChapterLru, ChapterStore};
use chapterdiff_compute::{ComputeConfig, DiffComputeActor, DiffComputeHandle};
use chapterdiff_core::{
    count_changes, BookDiffChapter, CachedChapterData, Chapter, ChapterMeta, DiffOptions,
    DiffToken, EngineConfig,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub(crate) struct EngineInner {
    pub(crate) phase: SessionPhase,
    pub(crate) original_path: String,
    pub(crate) cleaned_path: String,
    pub(crate) chapters: ChapterLru,
    pub(crate) chapters_meta: Vec<ChapterMeta>,
    pub(crate) current_chapter_id: Option<String>,
    pub(crate) loading: bool,
    pub(crate) loading_chapter_id: Option<String>,
    pub(crate) last_error: Option<SessionError>,
}

impl EngineInner {
    fn empty(max_cached_chapters: usize) -> Self {
        Self {
            phase: SessionPhase::Idle,
            original_path: String::new(),
            cleaned_path: String::new(),
            chapters: ChapterLru::new(max_cached_chapters),
            chapters_meta: Vec::new(),
            current_chapter_id: None,
            loading: false,
            loading_chapter_id: None,
            last_error: None,
        }
    }

    fn reset(&mut self, original_path: &str, cleaned_path: &str, max_cached_chapters: usize) {
        *self = Self::empty(max_cached_chapters);
        self.original_path = original_path.to_string();
        self.cleaned_path = cleaned_path.to_string();
    }

    fn advance_phase(&mut self, event: SessionEvent) {
        match self.phase.transition(event) {
            Ok(next) => self.phase = next,
            Err(error) => warn!(%error, "ignoring invalid session transition"),
        }
    }

    fn meta_mut(&mut self, id: &str) -> Option<&mut ChapterMeta> {
        self.chapters_meta.iter_mut().find(|m| m.id == id)
    }
}

/// State and collaborators shared between the engine and its background
/// streaming task.
pub(crate) struct EngineShared {
    pub(crate) inner: RwLock<EngineInner>,
    pub(crate) compute: DiffComputeHandle,
    pub(crate) store: Arc<dyn ChapterStore>,
    pub(crate) provider: Arc<dyn ContentProvider>,
    pub(crate) settings: Arc<dyn SettingsProvider>,
    pub(crate) book_cache: Option<Arc<dyn BookCacheProvider>>,
    pub(crate) config: EngineConfig,
    generation: AtomicU64,
    notify: watch::Sender<u64>,
}

impl EngineShared {
    pub(crate) fn publish(&self) {
        self.notify.send_modify(|version| *version = version.wrapping_add(1));
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a continuation started under `generation` has been
    /// superseded by a navigation or a new load.
    pub(crate) fn is_stale(&self, generation: u64) -> bool {
        self.current_generation() != generation
    }

    fn diff_options(&self) -> DiffOptions {
        DiffOptions { ignore_whitespace: self.settings.ignore_whitespace() }
    }

    /// Diff the first `loaded_chars` characters of both versions.
    ///
    /// Returns `None` for a stale response or an ambiguous empty result;
    /// both mean "apply no update".
    pub(crate) async fn compute_prefix(
        &self,
        original_text: &str,
        cleaned_text: &str,
        loaded_chars: usize,
        generation: u64,
    ) -> Option<Vec<DiffToken>> {
        let original = take_chars(original_text, loaded_chars).to_string();
        let cleaned = take_chars(cleaned_text, loaded_chars).to_string();
        let has_content = !original.is_empty() || !cleaned.is_empty();

        let response = self.compute.compute(generation, original, cleaned, self.diff_options()).await;

        if self.is_stale(response.generation) {
            debug!(request_id = response.request_id, "dropping stale diff response");
            return None;
        }
        if response.tokens.is_empty() && has_content {
            // Ambiguous: aborted or timed out. Never treated as "no
            // changes" for a chapter that has text.
            debug!(request_id = response.request_id, "dropping empty diff result");
            return None;
        }
        Some(response.tokens)
    }

    /// Make a chapter resident, hydrating it through the cheapest path
    /// available: memory, persistent cache, precomputed changes, then a
    /// live initial-prefix diff.
    ///
    /// `Ok(true)` means the chapter is resident afterwards; `Ok(false)`
    /// means the attempt was abandoned (stale generation) or degraded
    /// (computation produced nothing). Only content failures are errors.
    pub(crate) async fn ensure_chapter_ready(&self, id: &str, generation: u64) -> SessionResult<bool> {
        {
            let mut inner = self.inner.write();
            if inner.chapters.get(id).is_some() {
                return Ok(true);
            }
            inner.loading_chapter_id = Some(id.to_string());
        }
        self.publish();

        let result = self.hydrate_chapter(id, generation).await;

        {
            let mut inner = self.inner.write();
            if inner.loading_chapter_id.as_deref() == Some(id) {
                inner.loading_chapter_id = None;
            }
        }
        self.publish();
        result
    }

    async fn hydrate_chapter(&self, id: &str, generation: u64) -> SessionResult<bool> {
        let (original_path, cleaned_path, title) = {
            let inner = self.inner.read();
            let title = inner
                .chapters_meta
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.title.clone())
                .unwrap_or_default();
            (inner.original_path.clone(), inner.cleaned_path.clone(), title)
        };

        let text = self
            .provider
            .chapter_text(&original_path, &cleaned_path, id)
            .await
            .map_err(|error| SessionError::ContentUnavailable(error.to_string()))?;
        if self.is_stale(generation) {
            return Ok(false);
        }

        let total_chars = text.cleaned.chars().count();
        let key = CacheKey::new(&original_path, &cleaned_path, id);

        // Persistent tier.
        match self.store.load(&key).await {
            Ok(Some(entry)) if entry.total_chars == total_chars => {
                if self.is_stale(generation) {
                    return Ok(false);
                }
                let chapter = Chapter {
                    id: id.to_string(),
                    title,
                    original_text: text.original,
                    cleaned_text: text.cleaned,
                    diff_tokens: entry.diff_tokens,
                    change_count: entry.change_count,
                    loaded_chars: entry.loaded_chars.min(total_chars),
                    total_chars,
                };
                debug!(chapter_id = %id, "chapter restored from persistent cache");
                self.install_chapter(chapter, generation);
                return Ok(true);
            }
            Ok(Some(entry)) => {
                warn!(
                    chapter_id = %id,
                    cached = entry.total_chars,
                    actual = total_chars,
                    "cached chapter no longer matches its text, recomputing"
                );
            }
            Ok(None) => {}
            Err(error) => warn!(chapter_id = %id, %error, "chapter cache read failed"),
        }

        // Precomputed sparse changes from the book cache.
        let cached_changes = {
            let inner = self.inner.read();
            inner
                .chapters_meta
                .iter()
                .find(|m| m.id == id)
                .and_then(|m| m.cached_changes.clone())
        };
        if let Some(changes) = cached_changes {
            // One attempt only: success and failure both consume the
            // cached changes, so a bad artifact is never retried.
            self.clear_cached_changes(id);
            match hydrate_from_changes(
                &changes,
                &text.original,
                &text.cleaned,
                self.settings.ignore_whitespace(),
            ) {
                Ok(tokens) => {
                    if self.is_stale(generation) {
                        return Ok(false);
                    }
                    let chapter = Chapter {
                        id: id.to_string(),
                        title,
                        original_text: text.original,
                        cleaned_text: text.cleaned,
                        change_count: count_changes(&tokens),
                        diff_tokens: tokens,
                        loaded_chars: total_chars,
                        total_chars,
                    };
                    self.persist_chapter(&key, &chapter).await;
                    info!(chapter_id = %id, "chapter hydrated from precomputed book cache");
                    self.install_chapter(chapter, generation);
                    return Ok(true);
                }
                Err(error) => {
                    warn!(chapter_id = %id, %error, "precomputed changes unusable, computing live");
                }
            }
        }

        // Live computation over the initial prefix.
        let loaded_chars = total_chars.min(self.config.initial_load_chars);
        match self.compute_prefix(&text.original, &text.cleaned, loaded_chars, generation).await {
            Some(tokens) => {
                let chapter = Chapter {
                    id: id.to_string(),
                    title,
                    original_text: text.original,
                    cleaned_text: text.cleaned,
                    change_count: count_changes(&tokens),
                    diff_tokens: tokens,
                    loaded_chars,
                    total_chars,
                };
                if !chapter.has_more_content() {
                    self.persist_chapter(&key, &chapter).await;
                }
                self.install_chapter(chapter, generation);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Put a hydrated chapter into the memory tier and sync its metadata.
    /// Evicted chapters have their metadata downgraded to not-loaded.
    fn install_chapter(&self, chapter: Chapter, generation: u64) {
        if self.is_stale(generation) {
            return;
        }
        let mut inner = self.inner.write();
        let id = chapter.id.clone();
        let original_chars = chapter.original_text.chars().count();
        if let Some(meta) = inner.meta_mut(&id) {
            meta.is_loaded = true;
            meta.change_count = Some(chapter.change_count);
            meta.original_char_count = Some(original_chars);
            meta.cleaned_char_count = Some(chapter.total_chars);
            meta.is_oversized = chapter.total_chars > self.config.oversize_threshold;
        }
        let evicted = inner.chapters.insert(chapter);
        for victim in evicted {
            if let Some(meta) = inner.meta_mut(&victim) {
                meta.is_loaded = false;
            }
        }
        drop(inner);
        self.publish();
    }

    /// Apply a progressive-load step to a resident chapter. The loaded
    /// prefix only ever grows; a fully loaded chapter is written through
    /// to the persistent tier.
    pub(crate) async fn apply_progress(
        &self,
        id: &str,
        new_loaded: usize,
        tokens: Vec<DiffToken>,
        generation: u64,
    ) {
        if self.is_stale(generation) {
            return;
        }
        let persist = {
            let mut inner = self.inner.write();
            let original_path = inner.original_path.clone();
            let cleaned_path = inner.cleaned_path.clone();
            let outcome = inner.chapters.update(id, move |chapter| {
                if new_loaded <= chapter.loaded_chars {
                    return None;
                }
                chapter.change_count = count_changes(&tokens);
                chapter.diff_tokens = tokens;
                chapter.loaded_chars = new_loaded.min(chapter.total_chars);
                let entry =
                    (!chapter.has_more_content()).then(|| CachedChapterData::from_chapter(chapter));
                Some((chapter.change_count, entry))
            });
            let Some(Some((change_count, entry))) = outcome else {
                return;
            };
            if let Some(meta) = inner.meta_mut(id) {
                meta.change_count = Some(change_count);
            }
            entry.map(|entry| (CacheKey::new(original_path, cleaned_path, id), entry))
        };
        self.publish();

        if let Some((key, entry)) = persist {
            if let Err(error) = self.store.save(&key, &entry).await {
                warn!(chapter_id = %id, %error, "chapter cache write failed");
            }
        }
    }

    async fn persist_chapter(&self, key: &CacheKey, chapter: &Chapter) {
        let entry = CachedChapterData::from_chapter(chapter);
        if let Err(error) = self.store.save(key, &entry).await {
            warn!(chapter_id = %chapter.id, %error, "chapter cache write failed");
        }
    }

    fn clear_cached_changes(&self, id: &str) {
        let mut inner = self.inner.write();
        if let Some(meta) = inner.meta_mut(id) {
            meta.cached_changes = None;
        }
    }
}

#[derive(Default)]
struct StreamControl {
    token: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Owns one book comparison at a time.
pub struct ComparisonEngine {
    shared: Arc<EngineShared>,
    stream: Mutex<StreamControl>,
}

impl ComparisonEngine {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        store: Arc<dyn ChapterStore>,
        settings: Arc<dyn SettingsProvider>,
        config: EngineConfig,
    ) -> Self {
        Self::with_compute_config(provider, store, settings, config, ComputeConfig::default())
    }

    pub fn with_compute_config(
        provider: Arc<dyn ContentProvider>,
        store: Arc<dyn ChapterStore>,
        settings: Arc<dyn SettingsProvider>,
        config: EngineConfig,
        compute_config: ComputeConfig,
    ) -> Self {
        let compute = DiffComputeActor::new(compute_config).spawn();
        let (notify, _) = watch::channel(0u64);
        let max_cached = config.max_cached_chapters;
        Self {
            shared: Arc::new(EngineShared {
                inner: RwLock::new(EngineInner::empty(max_cached)),
                compute,
                store,
                provider,
                settings,
                book_cache: None,
                config,
                generation: AtomicU64::new(0),
                notify,
            }),
            stream: Mutex::new(StreamControl::default()),
        }
    }

    /// Attach a precomputed book cache source. Builder-style, before the
    /// first load.
    pub fn with_book_cache(mut self, book_cache: Arc<dyn BookCacheProvider>) -> Self {
        match Arc::get_mut(&mut self.shared) {
            Some(shared) => shared.book_cache = Some(book_cache),
            None => warn!("book cache attached after engine use, ignoring"),
        }
        self
    }

    /// Start a new comparison, replacing any previous session.
    pub async fn load_comparison(
        &self,
        original_path: &str,
        cleaned_path: &str,
    ) -> SessionResult<()> {
        info!(original_path, cleaned_path, "loading comparison");
        self.stop_streaming().await;
        let generation = self.shared.bump_generation();
        self.shared.compute.cancel_all();

        {
            let mut inner = self.shared.inner.write();
            let max_cached = self.shared.config.max_cached_chapters;
            inner.reset(original_path, cleaned_path, max_cached);
            inner.advance_phase(SessionEvent::LoadRequested);
            inner.loading = true;
        }
        self.shared.publish();

        let metas = match self.build_chapter_metas(original_path, cleaned_path).await {
            Ok(metas) => metas,
            Err(error) => {
                let mut inner = self.shared.inner.write();
                inner.advance_phase(SessionEvent::LoadFailed);
                inner.loading = false;
                inner.last_error = Some(error.clone());
                drop(inner);
                self.shared.publish();
                return Err(error);
            }
        };
        if self.shared.is_stale(generation) {
            // A newer load took over while metadata was in flight.
            return Ok(());
        }

        let first_id = metas.first().map(|m| m.id.clone());
        {
            let mut inner = self.shared.inner.write();
            inner.chapters_meta = metas;
            inner.current_chapter_id = first_id.clone();
            inner.chapters.set_pinned(first_id.clone());
            inner.advance_phase(SessionEvent::MetadataReady);
        }
        self.shared.publish();

        if let Some(id) = &first_id {
            if let Err(error) = self.shared.ensure_chapter_ready(id, generation).await {
                let mut inner = self.shared.inner.write();
                inner.loading = false;
                inner.last_error = Some(error.clone());
                drop(inner);
                self.shared.publish();
                return Err(error);
            }
        }

        self.start_streaming(generation).await;

        {
            let mut inner = self.shared.inner.write();
            inner.loading = false;
        }
        self.shared.publish();
        Ok(())
    }

    /// Build the complete chapter list, preferring the precomputed book
    /// cache and merging in live metadata when the producing job did not
    /// finish the whole book.
    async fn build_chapter_metas(
        &self,
        original_path: &str,
        cleaned_path: &str,
    ) -> SessionResult<Vec<ChapterMeta>> {
        let ignore_whitespace = self.shared.settings.ignore_whitespace();
        let artifact = match &self.shared.book_cache {
            Some(provider) => provider
                .load_book_cache(cleaned_path)
                .await
                .filter(|cache| cache.is_usable(ignore_whitespace)),
            None => None,
        };

        let mut metas: Vec<ChapterMeta> = Vec::new();
        if let Some(cache) = &artifact {
            for entry in &cache.chapters {
                metas.push(self.meta_from_book_entry(entry));
            }
            if cache.completed {
                debug!(chapters = metas.len(), "chapter list built from book cache");
                return Ok(metas);
            }
        }

        let live = self
            .shared
            .provider
            .chapter_metadata(original_path, cleaned_path)
            .await
            .map_err(|error| SessionError::ContentUnavailable(error.to_string()))?;

        if metas.is_empty() {
            return Ok(live
                .into_iter()
                .map(|chapter| ChapterMeta {
                    has_original: chapter.has_original,
                    has_cleaned: chapter.has_cleaned,
                    ..ChapterMeta::new(chapter.id, chapter.title)
                })
                .collect());
        }

        // Partial artifact: chapters it does not know about are appended
        // from live metadata so the list is always complete.
        for chapter in live {
            if !metas.iter().any(|m| m.id == chapter.id) {
                metas.push(ChapterMeta {
                    has_original: chapter.has_original,
                    has_cleaned: chapter.has_cleaned,
                    ..ChapterMeta::new(chapter.id, chapter.title)
                });
            }
        }
        Ok(metas)
    }

    fn meta_from_book_entry(&self, entry: &BookDiffChapter) -> ChapterMeta {
        ChapterMeta {
            change_count: Some(entry.change_count),
            is_oversized: entry.cleaned_char_count > self.shared.config.oversize_threshold,
            cached_changes: Some(entry.changes.clone()),
            original_char_count: Some(entry.original_char_count),
            cleaned_char_count: Some(entry.cleaned_char_count),
            ..ChapterMeta::new(entry.id.clone(), entry.title.clone())
        }
    }

    /// Switch the session to another chapter, invalidating any work still
    /// in flight for the previous one.
    pub async fn set_current_chapter(&self, id: &str) -> SessionResult<()> {
        {
            let inner = self.shared.inner.read();
            if !inner.chapters_meta.iter().any(|m| m.id == id) {
                return Err(SessionError::UnknownChapter(id.to_string()));
            }
        }

        self.stop_streaming().await;
        let generation = self.shared.bump_generation();

        {
            let mut inner = self.shared.inner.write();
            inner.current_chapter_id = Some(id.to_string());
            inner.chapters.set_pinned(Some(id.to_string()));
        }
        self.shared.publish();

        if let Err(error) = self.shared.ensure_chapter_ready(id, generation).await {
            let mut inner = self.shared.inner.write();
            inner.last_error = Some(error.clone());
            drop(inner);
            self.shared.publish();
            return Err(error);
        }

        self.start_streaming(generation).await;
        Ok(())
    }

    pub async fn next_chapter(&self) -> SessionResult<()> {
        match self.neighbor_chapter(1)? {
            Some(id) => self.set_current_chapter(&id).await,
            None => Ok(()),
        }
    }

    pub async fn previous_chapter(&self) -> SessionResult<()> {
        match self.neighbor_chapter(-1)? {
            Some(id) => self.set_current_chapter(&id).await,
            None => Ok(()),
        }
    }

    fn neighbor_chapter(&self, direction: isize) -> SessionResult<Option<String>> {
        let inner = self.shared.inner.read();
        let current = inner.current_chapter_id.as_deref().ok_or(SessionError::NoSession)?;
        let index = inner
            .chapters_meta
            .iter()
            .position(|m| m.id == current)
            .ok_or(SessionError::NoSession)?;
        let target = index as isize + direction;
        if target < 0 {
            return Ok(None);
        }
        Ok(inner.chapters_meta.get(target as usize).map(|m| m.id.clone()))
    }

    /// Extend the current chapter's diff by one step.
    pub async fn load_more(&self) -> SessionResult<()> {
        let generation = self.shared.current_generation();
        let step = {
            let mut inner = self.shared.inner.write();
            let id = inner.current_chapter_id.clone().ok_or(SessionError::NoSession)?;
            match inner.chapters.get(&id) {
                Some(chapter) if chapter.has_more_content() => {
                    let new_loaded =
                        (chapter.loaded_chars + self.shared.config.load_more_chars)
                            .min(chapter.total_chars);
                    Some((
                        id,
                        chapter.original_text.clone(),
                        chapter.cleaned_text.clone(),
                        new_loaded,
                    ))
                }
                _ => None,
            }
        };

        let Some((id, original_text, cleaned_text, new_loaded)) = step else {
            return Ok(());
        };

        if let Some(tokens) = self
            .shared
            .compute_prefix(&original_text, &cleaned_text, new_loaded, generation)
            .await
        {
            self.shared.apply_progress(&id, new_loaded, tokens, generation).await;
        }
        Ok(())
    }

    /// Flip whitespace sensitivity. Every cached diff for the pair is
    /// invalidated and the current chapter is recomputed under the new
    /// semantics.
    pub async fn toggle_ignore_whitespace(&self) -> SessionResult<()> {
        self.stop_streaming().await;
        let generation = self.shared.bump_generation();
        self.shared.compute.cancel_all();

        let value = !self.shared.settings.ignore_whitespace();
        self.shared.settings.set_ignore_whitespace(value);
        info!(ignore_whitespace = value, "whitespace sensitivity toggled");

        let (original_path, cleaned_path, current) = {
            let inner = self.shared.inner.read();
            (
                inner.original_path.clone(),
                inner.cleaned_path.clone(),
                inner.current_chapter_id.clone(),
            )
        };
        if original_path.is_empty() && cleaned_path.is_empty() {
            return Ok(());
        }

        if let Err(error) = self.shared.store.clear(&original_path, &cleaned_path).await {
            warn!(%error, "failed to clear chapter cache after toggle");
        }

        {
            let mut inner = self.shared.inner.write();
            inner.chapters.clear();
            inner.chapters.set_pinned(current.clone());
            for meta in &mut inner.chapters_meta {
                meta.is_loaded = false;
                meta.change_count = None;
                meta.cached_changes = None;
            }
        }
        self.shared.publish();

        if let Some(id) = current {
            if let Err(error) = self.shared.ensure_chapter_ready(&id, generation).await {
                let mut inner = self.shared.inner.write();
                inner.last_error = Some(error.clone());
                drop(inner);
                self.shared.publish();
                return Err(error);
            }
            self.start_streaming(generation).await;
        }
        Ok(())
    }

    /// Tear down the session: stop streaming, drop all hydrated content,
    /// and return to idle. The compute actor stays alive for the next
    /// load.
    pub async fn clear(&self) {
        self.stop_streaming().await;
        self.shared.bump_generation();
        self.shared.compute.cancel_all();

        {
            let mut inner = self.shared.inner.write();
            let max_cached = self.shared.config.max_cached_chapters;
            *inner = EngineInner::empty(max_cached);
        }
        self.shared.publish();
        info!("comparison session cleared");
    }

    /// Hard stop for leaving the diff view entirely: clears the session
    /// and terminates the compute actor, purging all pending request
    /// bookkeeping. The engine cannot be used afterwards.
    pub async fn shutdown(&self) {
        self.clear().await;
        self.shared.compute.shutdown();
    }

    async fn start_streaming(&self, generation: u64) {
        let mut control = self.stream.lock().await;
        if let Some(token) = control.token.take() {
            token.cancel();
        }
        if let Some(task) = control.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "streaming task join failed");
            }
        }
        if !self.shared.config.background_streaming || self.shared.is_stale(generation) {
            return;
        }

        let token = CancellationToken::new();
        control.token = Some(token.clone());
        control.task = Some(tokio::spawn(stream::run(self.shared.clone(), token, generation)));
    }

    /// Cancel the background streaming loop and wait for it to stop.
    async fn stop_streaming(&self) {
        let mut control = self.stream.lock().await;
        if let Some(token) = control.token.take() {
            token.cancel();
        }
        if let Some(task) = control.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "streaming task join failed");
            }
        }
    }

    /// Wait for the background streaming loop to finish on its own.
    /// Intended for tests and batch tooling; returns immediately when no
    /// loop is running.
    pub async fn wait_for_streaming(&self) {
        let task = { self.stream.lock().await.task.take() };
        if let Some(task) = task {
            if let Err(error) = task.await {
                warn!(%error, "streaming task join failed");
            }
        }
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// Snapshot of the session, or `None` before the first load.
    pub fn session(&self) -> Option<SessionView> {
        let inner = self.shared.inner.read();
        if inner.phase == SessionPhase::Idle && inner.original_path.is_empty() {
            return None;
        }
        Some(SessionView {
            phase: inner.phase,
            original_path: inner.original_path.clone(),
            cleaned_path: inner.cleaned_path.clone(),
            chapters_meta: inner.chapters_meta.clone(),
            current_chapter_id: inner.current_chapter_id.clone(),
            loading: inner.loading,
            loading_chapter_id: inner.loading_chapter_id.clone(),
        })
    }

    /// The chapter being viewed, when hydrated. Counts as an access for
    /// eviction purposes.
    pub fn current_chapter(&self) -> Option<Chapter> {
        let mut inner = self.shared.inner.write();
        let id = inner.current_chapter_id.clone()?;
        inner.chapters.get(&id).cloned()
    }

    /// A hydrated chapter by id, without touching its access time.
    pub fn chapter(&self, id: &str) -> Option<Chapter> {
        self.shared.inner.read().chapters.peek(id).cloned()
    }

    /// Loading phase of a chapter, derived from its current state.
    pub fn chapter_phase(&self, id: &str) -> ChapterPhase {
        let inner = self.shared.inner.read();
        crate::state::chapter_phase(
            inner.chapters.peek(id),
            inner.loading_chapter_id.as_deref() == Some(id),
        )
    }

    /// Whether the current chapter still has undiffed content.
    pub fn has_more_content(&self) -> bool {
        let inner = self.shared.inner.read();
        let Some(id) = inner.current_chapter_id.as_deref() else { return false };
        inner.chapters.peek(id).map(Chapter::has_more_content).unwrap_or(false)
    }

    /// Load progress of the current chapter, in 0..=1.
    pub fn loading_progress(&self) -> f64 {
        let inner = self.shared.inner.read();
        let Some(id) = inner.current_chapter_id.as_deref() else { return 0.0 };
        inner.chapters.peek(id).map(Chapter::loading_progress).unwrap_or(0.0)
    }

    pub fn is_loading(&self) -> bool {
        let inner = self.shared.inner.read();
        inner.loading || inner.loading_chapter_id.is_some()
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.inner.read().last_error.clone()
    }

    pub fn ignore_whitespace(&self) -> bool {
        self.shared.settings.ignore_whitespace()
    }

    /// Receiver that ticks after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.notify.subscribe()
    }
}
