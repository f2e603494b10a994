use serde::{Deserialize, Serialize};

/// Ordered user questions. Every entry contains a `?`; duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionList(Vec<String>);

impl QuestionList {
    /// Trims candidates and keeps the ones that read as questions.
    /// Returns the list together with how many candidates were dropped.
    pub fn from_candidates(candidates: Vec<String>) -> (Self, usize) {
        let total = candidates.len();
        let questions = candidates
            .into_iter()
            .map(|candidate| candidate.trim().to_string())
            .filter(|candidate| candidate.contains('?'))
            .collect::<Vec<_>>();
        let dropped = total - questions.len();
        (Self(questions), dropped)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// How far the list falls short of `target`, if at all.
    pub fn shortfall(&self, target: usize) -> Option<usize> {
        (self.0.len() < target).then(|| target - self.0.len())
    }
}

impl<'a> IntoIterator for &'a QuestionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
