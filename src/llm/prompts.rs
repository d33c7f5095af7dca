// ABOUTME: Builds the single-turn prompt sent to the chat-completion gateway
// ABOUTME: Combines a fixed preamble, up to five truncated procedures, the question and an answer cue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use crate::constants::prompt;
use crate::models::Procedure;
use std::fmt::Write;

/// Assembles prompts from a question and retrieved procedures
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_procedures: usize,
    max_content_chars: usize,
    response_language: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(prompt::DEFAULT_RESPONSE_LANGUAGE)
    }
}

impl PromptAssembler {
    /// Assembler with default limits answering in `response_language`
    #[must_use]
    pub fn new(response_language: impl Into<String>) -> Self {
        Self {
            max_procedures: prompt::MAX_CONTEXT_PROCEDURES,
            max_content_chars: prompt::MAX_CONTENT_CHARS,
            response_language: response_language.into(),
        }
    }

    /// Override the context limits
    #[must_use]
    pub const fn with_limits(mut self, max_procedures: usize, max_content_chars: usize) -> Self {
        self.max_procedures = max_procedures;
        self.max_content_chars = max_content_chars;
        self
    }

    /// Language the model is asked to answer in
    #[must_use]
    pub fn response_language(&self) -> &str {
        &self.response_language
    }

    /// Build the full prompt text
    #[must_use]
    pub fn assemble(&self, question: &str, candidates: &[Procedure]) -> String {
        let mut out = String::with_capacity(1024);

        let _ = writeln!(
            out,
            "You are an assistant for the company's internal procedure system. \
             Answer the employee's question using the procedure information below \
             whenever it is relevant."
        );
        let _ = writeln!(
            out,
            "Answer in {}, clearly and in detail. If the procedure information is \
             not sufficient, say so and give general guidance.",
            self.response_language
        );
        out.push('\n');
        out.push_str("PROCEDURE INFORMATION:\n");
        out.push_str(&self.build_context(candidates));
        out.push_str("\n---\n\n");
        let _ = writeln!(out, "QUESTION: {}", question.trim());
        out.push('\n');
        out.push_str("ANSWER:");
        out
    }

    /// Context section listing the first candidates
    #[must_use]
    pub fn build_context(&self, candidates: &[Procedure]) -> String {
        if candidates.is_empty() {
            return format!("{}\n", prompt::NO_RELEVANT_PROCEDURE);
        }

        let mut context = String::new();
        for (index, procedure) in candidates.iter().take(self.max_procedures).enumerate() {
            let _ = writeln!(
                context,
                "{}. {} (Category: {})",
                index + 1,
                procedure.title,
                procedure.category
            );
            if !procedure.description.trim().is_empty() {
                let _ = writeln!(context, "Description: {}", procedure.description);
            }
            let _ = writeln!(
                context,
                "Content: {}",
                truncate_chars(&procedure.content, self.max_content_chars)
            );
            context.push('\n');
        }
        context
    }
}

/// Truncate to `max_chars` Unicode scalar values, appending `...` when cut
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_scalar_values() {
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("abcd", 3), "abc...");
        assert_eq!(truncate_chars("Nghỉ việc", 4), "Nghỉ...");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_language_appears_in_preamble() {
        let text = PromptAssembler::new("English").assemble("hello?", &[]);
        assert!(text.contains("Answer in English"));
        assert!(text.contains(prompt::NO_RELEVANT_PROCEDURE));
        assert!(text.trim_end().ends_with("ANSWER:"));
    }
}
