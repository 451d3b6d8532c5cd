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

//! Integration tests for the cache tiers.

use chapterdiff_cache::{CacheError, CacheKey, ChapterLru, ChapterStore, FsChapterStore};
use chapterdiff_core::{CachedChapterData, Chapter, DiffToken};
use std::sync::Arc;

fn chapter(id: &str, body: &str) -> Chapter {
    let total = body.chars().count();
    Chapter {
        id: id.to_string(),
        title: format!("Chapter {id}"),
        original_text: body.to_string(),
        cleaned_text: body.to_string(),
        diff_tokens: vec![DiffToken::unchanged(body)],
        change_count: 0,
        loaded_chars: total,
        total_chars: total,
    }
}

/// Persist through the trait object, the way the session uses the store.
#[tokio::test]
async fn test_store_round_trip_through_trait_object() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ChapterStore> = Arc::new(FsChapterStore::new(dir.path()));

    let key = CacheKey::new("/b/original.epub", "/b/cleaned.epub", "ch-3");
    let data = CachedChapterData::from_chapter(&chapter("ch-3", "some chapter text"));

    store.save(&key, &data).await.unwrap();
    assert_eq!(store.load(&key).await.unwrap(), Some(data));
}

#[tokio::test]
async fn test_corrupt_entry_never_survives_either_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsChapterStore::new(dir.path());
    let key = CacheKey::new("/b/original.epub", "/b/cleaned.epub", "ch-1");

    // Write side refuses.
    let corrupt = CachedChapterData {
        diff_tokens: Vec::new(),
        change_count: 0,
        loaded_chars: 500,
        total_chars: 500,
        fully_loaded: true,
    };
    assert!(matches!(
        store.save(&key, &corrupt).await,
        Err(CacheError::CorruptEntry { .. })
    ));

    // Read side rejects an entry that slipped past the writer.
    let path_probe = CachedChapterData {
        diff_tokens: vec![DiffToken::unchanged("x")],
        change_count: 0,
        loaded_chars: 1,
        total_chars: 1,
        fully_loaded: true,
    };
    store.save(&key, &path_probe).await.unwrap();
    // Overwrite the valid file with a corrupt payload.
    let dir_entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(dir_entries.len(), 1);
    let file = dir_entries[0].as_ref().unwrap().path();
    std::fs::write(
        &file,
        serde_json::to_vec(&serde_json::json!({
            "diff_tokens": [],
            "change_count": 0,
            "loaded_chars": 500,
            "total_chars": 500,
            "fully_loaded": true,
        }))
        .unwrap(),
    )
    .unwrap();

    assert_eq!(store.load(&key).await.unwrap(), None);
}

/// Hydrating one chapter past capacity evicts exactly the least recently
/// accessed one; everything else stays resident.
#[test]
fn test_lru_eviction_is_exact() {
    let capacity = 5;
    let mut lru = ChapterLru::new(capacity);

    for i in 0..capacity {
        let evicted = lru.insert(chapter(&format!("ch-{i}"), "body"));
        assert!(evicted.is_empty());
    }

    // Access them all except ch-2, making ch-2 the oldest.
    for i in [0usize, 1, 3, 4] {
        assert!(lru.get(&format!("ch-{i}")).is_some());
    }

    let evicted = lru.insert(chapter("ch-5", "body"));
    assert_eq!(evicted, vec!["ch-2".to_string()]);
    assert_eq!(lru.len(), capacity);
    for i in [0usize, 1, 3, 4, 5] {
        assert!(lru.contains(&format!("ch-{i}")));
    }
}
