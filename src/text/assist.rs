/// Text capabilities and their two implementations
///
/// `LocalText` is deterministic and always available. `AssistedText` asks a
/// `TextGenerator` first and falls back to `LocalText` on any failure.

use async_trait::async_trait;
use serde_json::Value;

use crate::text::TextGenerator;

const MERGE_PROMPT: &str = "You combine earlier feedback about a habit with a new observation \
into one polished remark. Merge them into a clear, natural sentence without repeating \
information. Reply with the remark only, no explanation, in 20 words or fewer.";

const PROFILE_PROMPT: &str = "You write user profiles. You receive the answers a user gave \
to a questionnaire as JSON. Describe the user: likes, dislikes, hobbies, interests and \
anything else relevant.";

/// Merges an existing remark with new text
#[async_trait]
pub trait TextMerger: Send + Sync {
    async fn merge(&self, existing: &str, addition: &str) -> String;
}

/// Summarizes questionnaire answers into a short profile
#[async_trait]
pub trait ProfileSummarizer: Send + Sync {
    async fn summarize(&self, answers: &Value) -> String;
}

/// Deterministic text handling, used when no service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalText;

impl LocalText {
    /// `"<existing>. <addition>"`, unless the addition is already contained
    ///
    /// A blank existing remark yields the trimmed addition alone.
    pub fn merge_remarks(existing: &str, addition: &str) -> String {
        let existing = existing.trim();
        let addition = addition.trim();

        if existing.is_empty() {
            return addition.to_string();
        }
        if existing.contains(addition) {
            return existing.to_string();
        }
        format!("{}. {}", existing, addition)
    }

    pub fn profile(answers: &Value) -> String {
        let mut profile = String::from("Based on your answers, ");

        let free_time = answers
            .get("How do you usually prefer to spend your free time?")
            .and_then(Value::as_array);
        if let Some(free_time) = free_time {
            let picked = |choice: &str| free_time.iter().any(|v| v.as_str() == Some(choice));
            if picked("Engaging in creative activities") {
                profile.push_str("you're interested in creative pursuits. ");
            }
            if picked("Socializing with friends/family") {
                profile.push_str("you value social connections. ");
            }
            if picked("Learning something new") {
                profile.push_str("you have a thirst for knowledge. ");
            }
        }

        if answer(answers, "What's your ideal work style?")
            .to_lowercase()
            .contains("structured environment")
        {
            profile.push_str("You thrive with structure and organization. ");
        }

        if answer(answers, "Which of the following statements best describes your approach to tasks?")
            .to_lowercase()
            .contains("small, manageable tasks")
        {
            profile.push_str("You prefer breaking down tasks into smaller parts. ");
        }

        if answer(answers, "What motivates you the most to stick to a goal or habit?")
            .contains("Internal satisfaction")
        {
            profile.push_str("You're intrinsically motivated and driven by personal growth.");
        }

        profile.trim_end().to_string()
    }
}

fn answer<'a>(answers: &'a Value, question: &str) -> &'a str {
    answers.get(question).and_then(Value::as_str).unwrap_or("")
}

#[async_trait]
impl TextMerger for LocalText {
    async fn merge(&self, existing: &str, addition: &str) -> String {
        Self::merge_remarks(existing, addition)
    }
}

#[async_trait]
impl ProfileSummarizer for LocalText {
    async fn summarize(&self, answers: &Value) -> String {
        Self::profile(answers)
    }
}

/// Generator-backed text with a local fallback
pub struct AssistedText<G> {
    generator: G,
}

impl<G: TextGenerator> AssistedText<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> TextMerger for AssistedText<G> {
    async fn merge(&self, existing: &str, addition: &str) -> String {
        let messages = [
            format!("Previous remarks: {}", existing),
            format!("New Remark: {}", addition),
        ];

        match self.generator.generate(MERGE_PROMPT, &messages).await {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!("Remark merge fell back to local text: {}", e);
                LocalText::merge_remarks(existing, addition)
            }
        }
    }
}

#[async_trait]
impl<G: TextGenerator> ProfileSummarizer for AssistedText<G> {
    async fn summarize(&self, answers: &Value) -> String {
        let messages = [answers.to_string()];

        match self.generator.generate(PROFILE_PROMPT, &messages).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Profile generation fell back to local text: {}", e);
                LocalText::profile(answers)
            }
        }
    }
}
