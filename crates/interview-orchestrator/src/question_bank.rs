//! Question bank for resume-personalised interviews.
//!
//! Maps skill names to ordered candidate questions and carries the fixed
//! default set used when no requested skill matches. The built-in bank is
//! created once at startup; a custom bank can be loaded from JSON.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InterviewError, Result};

/// Difficulty rating attached to every question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Warm-up level.
    Easy,
    /// Standard level (default).
    #[default]
    Medium,
    /// Stretch level.
    Hard,
}

impl Difficulty {
    /// Parses a string into a `Difficulty`, case-insensitively.
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Returns the display label for this difficulty.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid difficulty '{s}': expected one of 'easy', 'medium', 'hard'"
            ))
        })
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// A single interview question. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier across the bank.
    pub id: u32,
    /// The text the interviewer speaks.
    pub text: String,
    /// Broad topic label (e.g. "Frontend", "DSA").
    pub topic: String,
    /// The skill this question was selected for.
    pub skill: String,
    /// Difficulty rating.
    pub difficulty: Difficulty,
    /// Clarifying sub-questions, possibly empty.
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

impl Question {
    /// Creates a question from borrowed static data.
    #[must_use]
    pub fn new(
        id: u32,
        text: impl Into<String>,
        topic: impl Into<String>,
        skill: impl Into<String>,
        difficulty: Difficulty,
        follow_ups: &[&str],
    ) -> Self {
        Self {
            id,
            text: text.into(),
            topic: topic.into(),
            skill: skill.into(),
            difficulty,
            follow_ups: follow_ups.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Returns `true` if this question has at least one follow-up prompt.
    #[must_use]
    pub fn has_follow_ups(&self) -> bool {
        !self.follow_ups.is_empty()
    }
}

/// Skill-indexed question bank with a non-empty default set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Ordered questions per skill name (case-sensitive keys).
    skills: BTreeMap<String, Vec<Question>>,
    /// Fallback questions used when no requested skill matches.
    defaults: Vec<Question>,
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

impl QuestionBank {
    /// Creates and validates a bank from explicit entries.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::QuestionBankInvalid` if the default set is empty
    /// or question ids are not unique.
    pub fn new(skills: BTreeMap<String, Vec<Question>>, defaults: Vec<Question>) -> Result<Self> {
        let bank = Self { skills, defaults };
        bank.validate()?;
        Ok(bank)
    }

    /// Loads a bank from a JSON file with `skills` and `defaults` keys.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankNotFound` if the file is missing, `Json` if it does
    /// not parse, and `QuestionBankInvalid` if validation fails.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(InterviewError::bank_not_found(path));
            }
            Err(e) => return Err(InterviewError::Io(e)),
        };

        let bank: Self = serde_json::from_str(&contents)?;
        bank.validate()?;
        tracing::debug!(
            path = %path.display(),
            skills = bank.skills.len(),
            defaults = bank.defaults.len(),
            "Loaded question bank"
        );
        Ok(bank)
    }

    /// Checks the invariants every queue build relies on.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::QuestionBankInvalid` on the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.is_empty() {
            return Err(InterviewError::bank_invalid(
                "the default question set must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for question in self.skills.values().flatten().chain(&self.defaults) {
            if !seen.insert(question.id) {
                return Err(InterviewError::bank_invalid(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
            if question.text.trim().is_empty() {
                return Err(InterviewError::bank_invalid(format!(
                    "question {} has empty text",
                    question.id
                )));
            }
        }

        Ok(())
    }

    /// Returns the ordered questions for a skill, if the bank has an entry.
    #[must_use]
    pub fn questions_for(&self, skill: &str) -> Option<&[Question]> {
        self.skills.get(skill).map(Vec::as_slice)
    }

    /// Returns the fixed fallback questions.
    #[must_use]
    pub fn defaults(&self) -> &[Question] {
        &self.defaults
    }

    /// Iterates over the skill names the bank knows about, sorted.
    pub fn skills(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(String::as_str)
    }

    /// The built-in bank shipped with the product.
    #[must_use]
    pub fn builtin() -> Self {
        use Difficulty::{Easy, Hard, Medium};

        let mut skills = BTreeMap::new();
        skills.insert(
            "React".to_string(),
            vec![
                Question::new(
                    1,
                    "You listed React on your resume. Can you explain the difference between controlled and uncontrolled components?",
                    "Frontend",
                    "React",
                    Medium,
                    &[
                        "How do refs relate to uncontrolled components?",
                        "When would you prefer one over the other?",
                    ],
                ),
                Question::new(
                    2,
                    "Given your React experience, walk me through how you would optimise a component that re-renders too frequently.",
                    "Performance",
                    "React",
                    Hard,
                    &["What is the difference between useMemo and useCallback?"],
                ),
            ],
        );
        skills.insert(
            "TypeScript".to_string(),
            vec![Question::new(
                3,
                "Your resume shows TypeScript experience. Can you explain what a generic type is and give me a practical example?",
                "Languages",
                "TypeScript",
                Medium,
                &["How are generics different from the any type?"],
            )],
        );
        skills.insert(
            "Spring Boot".to_string(),
            vec![Question::new(
                4,
                "You have Spring Boot on your resume. How does dependency injection work in Spring? Walk me through an example.",
                "Backend",
                "Spring Boot",
                Medium,
                &["What is the difference between @Component, @Service, and @Repository?"],
            )],
        );
        skills.insert(
            "Data Structures".to_string(),
            vec![Question::new(
                5,
                "Given an array of integers, return the two indices that sum to a given target. Walk me through your approach before coding.",
                "DSA",
                "Data Structures",
                Medium,
                &[
                    "Can you optimise beyond O(N²)?",
                    "What is the time complexity of your HashMap approach?",
                ],
            )],
        );
        skills.insert(
            "Python".to_string(),
            vec![Question::new(
                6,
                "Your resume lists Python. What is the difference between a list and a generator in Python, and when would you use each?",
                "Languages",
                "Python",
                Easy,
                &["How does lazy evaluation help with large datasets?"],
            )],
        );
        skills.insert(
            "System Design".to_string(),
            vec![Question::new(
                7,
                "I see System Design on your resume. Walk me through how you would design a URL shortener like bit.ly.",
                "System Design",
                "System Design",
                Hard,
                &[
                    "How would you handle 1 million requests per second?",
                    "Where would you use a cache?",
                ],
            )],
        );

        let defaults = vec![
            Question::new(
                99,
                "Tell me about yourself and your most challenging technical project.",
                "General",
                "General",
                Easy,
                &["What technology choices would you change in hindsight?"],
            ),
            Question::new(
                100,
                "Given an array of integers, return the two indices that sum to a target value.",
                "DSA",
                "Data Structures",
                Medium,
                &["Can you do it in O(N)?"],
            ),
        ];

        Self { skills, defaults }
    }
}
