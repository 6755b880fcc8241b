/// Remark merging on top of habit storage

use crate::domain::HabitId;
use crate::storage::{HabitStorage, StorageError};
use crate::text::TextMerger;

/// Longest remark that gets persisted, in words
pub const MAX_REMARK_WORDS: usize = 20;

/// Merge `text` into the habit's remark and persist the result
///
/// Fails with `HabitNotFound` before the merger is ever consulted. The read
/// and the write take the storage lock separately with the merger awaited in
/// between, so two concurrent merges on one habit can lose one of the texts.
pub async fn merge_remark(
    storage: &dyn HabitStorage,
    merger: &dyn TextMerger,
    habit_id: HabitId,
    text: &str,
) -> Result<String, StorageError> {
    let existing = storage.get_remark(habit_id)?;

    let merged = merger.merge(&existing, text).await;
    let remark = truncate_words(&merged, MAX_REMARK_WORDS);

    storage.set_remark(habit_id, &remark)?;
    tracing::debug!("Merged remark for habit {}: {}", habit_id, remark);
    Ok(remark)
}

/// Keep at most `limit` whitespace-separated words
pub fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > limit {
        words[..limit].join(" ")
    } else {
        text.trim().to_string()
    }
}
