//! Question queue construction.
//!
//! The queue is built once per session from the requested skills and never
//! changes afterwards; only the session cursor moves over it.

use serde::{Deserialize, Serialize};

use crate::question_bank::{Question, QuestionBank};

/// Ordered, immutable sequence of questions for one session. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQueue {
    questions: Vec<Question>,
    is_fallback: bool,
}

impl QuestionQueue {
    /// Builds the queue for the requested skills.
    ///
    /// Each skill, in request order, contributes the first question the bank
    /// lists for it. Unknown skills are skipped and repeated skills contribute
    /// repeated questions. When nothing matches, the bank's default set is
    /// used unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use interview_orchestrator::{QuestionBank, QuestionQueue};
    ///
    /// let bank = QuestionBank::builtin();
    /// let queue = QuestionQueue::build(&["React", "Data Structures"], &bank);
    /// let ids: Vec<u32> = queue.iter().map(|q| q.id).collect();
    /// assert_eq!(ids, vec![1, 5]);
    ///
    /// let fallback = QuestionQueue::build::<&str>(&[], &bank);
    /// assert!(fallback.is_fallback());
    /// assert_eq!(fallback.len(), 2);
    /// ```
    #[must_use]
    pub fn build<S: AsRef<str>>(skills: &[S], bank: &QuestionBank) -> Self {
        let questions: Vec<Question> = skills
            .iter()
            .filter_map(|skill| {
                bank.questions_for(skill.as_ref())
                    .and_then(<[Question]>::first)
                    .cloned()
            })
            .collect();

        if questions.is_empty() {
            tracing::debug!(requested = skills.len(), "No skill matched, using default questions");
            return Self {
                questions: bank.defaults().to_vec(),
                is_fallback: true,
            };
        }

        Self {
            questions,
            is_fallback: false,
        }
    }

    /// Number of questions in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Returns the question at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Iterates over the questions in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    /// Returns `true` if the queue is the default fallback set.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.is_fallback
    }
}

impl<'a> IntoIterator for &'a QuestionQueue {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Splits a comma-delimited skill list, trimming entries and dropping empties.
///
/// ```
/// use interview_orchestrator::parse_skill_list;
///
/// assert_eq!(parse_skill_list("React, Python,,"), vec!["React", "Python"]);
/// assert!(parse_skill_list("").is_empty());
/// ```
#[must_use]
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
