// Prompt templates and the budgeted prompt builder shared by all quiz backends.

use crate::content::{ContentBundle, ImageAsset};

/// System prompt fixing the quiz output schema. Replace `{language}` before sending.
pub const QUIZ_SYSTEM_TEMPLATE: &str = r#"Create quiz questions based on the provided content. Type: multiple_choice (4 options). Write every question and option in {language}. Respond with JSON only.

Format: {"questions": [{"id": 1, "question": "Question text?", "type": "multiple_choice", "options": ["Full text of option A", "Full text of option B", "Full text of option C", "Full text of option D"], "correct_answer": 0}]}

correct_answer is the index of the correct option (0, 1, 2 or 3), where 0 = first option, 1 = second option and so on."#;

const TEXT_HEADER: &str = "TEXT:";
const IMAGES_HEADER: &str = "IMAGES FROM THE DOCUMENT:";

/// How much of a document a backend is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    pub max_text_chars: usize,
    pub max_images: usize,
}

/// Hosted multimodal models: small text window, a couple of page images.
pub const REMOTE_BUDGET: PromptBudget = PromptBudget {
    max_text_chars: 4000,
    max_images: 2,
};

/// Local models: more text, no images.
pub const LOCAL_BUDGET: PromptBudget = PromptBudget {
    max_text_chars: 8000,
    max_images: 0,
};

#[derive(Debug, Clone)]
pub struct QuizPrompt<'a> {
    pub system: String,
    pub user: String,
    pub images: &'a [ImageAsset],
}

impl QuizPrompt<'_> {
    /// System and user prompt folded into one string, for completion-style APIs.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

pub fn build_quiz_prompt<'a>(
    content: &'a ContentBundle,
    count: u32,
    budget: PromptBudget,
    language: &str,
) -> QuizPrompt<'a> {
    let images = &content.images[..content.images.len().min(budget.max_images)];

    let mut user = format!("Create {count} quiz questions based on the following content:\n\n");
    if !content.text.is_empty() {
        let text = truncate_chars(&content.text, budget.max_text_chars);
        user.push_str(&format!("{TEXT_HEADER}\n{text}\n\n"));
    }
    if !images.is_empty() {
        user.push_str(IMAGES_HEADER);
        user.push('\n');
    }
    user.push_str(&format!("\nCreate {count} questions. JSON only."));

    QuizPrompt {
        system: QUIZ_SYSTEM_TEMPLATE.replace("{language}", language),
        user,
        images,
    }
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
