//! The question bank and its client-safe projection.

use serde::{Deserialize, Serialize};

/// A single quiz question. Immutable after creation.
///
/// `correct_answer` indexes into `options` and must never reach a client
/// while the question is live — use [`Question::redacted`] for anything
/// that goes on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    /// Answer window in seconds.
    pub time_limit: u64,
}

impl Question {
    /// The time limit in milliseconds, as used by the scoring formula.
    pub fn limit_ms(&self) -> u64 {
        self.time_limit * 1000
    }

    /// Returns the question without the correct-answer index.
    pub fn redacted(&self) -> QuestionView {
        QuestionView {
            id: self.id,
            text: self.text.clone(),
            options: self.options.clone(),
            time_limit: self.time_limit,
        }
    }
}

/// The projection of a [`Question`] that is safe to send to clients:
/// everything except which option is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
    pub time_limit: u64,
}

/// The fixed in-memory sample set every room plays.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            text: "What is the capital of France?".into(),
            options: vec![
                "London".into(),
                "Paris".into(),
                "Berlin".into(),
                "Madrid".into(),
            ],
            correct_answer: 1,
            time_limit: 10,
        },
        Question {
            id: 2,
            text: "Which planet is known as the Red Planet?".into(),
            options: vec![
                "Venus".into(),
                "Mars".into(),
                "Jupiter".into(),
                "Saturn".into(),
            ],
            correct_answer: 1,
            time_limit: 10,
        },
        Question {
            id: 3,
            text: "What is 2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: 1,
            time_limit: 5,
        },
        Question {
            id: 4,
            text: "Who wrote 'Romeo and Juliet'?".into(),
            options: vec![
                "Charles Dickens".into(),
                "William Shakespeare".into(),
                "Mark Twain".into(),
                "Jane Austen".into(),
            ],
            correct_answer: 1,
            time_limit: 10,
        },
        Question {
            id: 5,
            text: "What is the largest ocean on Earth?".into(),
            options: vec![
                "Atlantic".into(),
                "Indian".into(),
                "Arctic".into(),
                "Pacific".into(),
            ],
            correct_answer: 3,
            time_limit: 10,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_view_omits_correct_answer() {
        let q = &sample_questions()[0];
        let json: serde_json::Value =
            serde_json::to_value(q.redacted()).unwrap();

        // Exactly the client-safe fields, nothing else.
        assert!(json.get("correct_answer").is_none());
        assert_eq!(json["id"], 1);
        assert_eq!(json["text"], "What is the capital of France?");
        assert_eq!(json["options"][1], "Paris");
        assert_eq!(json["time_limit"], 10);
    }

    #[test]
    fn test_sample_bank_shape() {
        let bank = sample_questions();
        assert_eq!(bank.len(), 5);
        for (i, q) in bank.iter().enumerate() {
            assert_eq!(q.id, (i + 1) as u32);
            assert!(q.correct_answer < q.options.len());
            assert!(q.time_limit > 0);
        }
    }

    #[test]
    fn test_limit_ms_converts_seconds() {
        let bank = sample_questions();
        assert_eq!(bank[0].limit_ms(), 10_000);
        assert_eq!(bank[2].limit_ms(), 5_000);
    }
}
