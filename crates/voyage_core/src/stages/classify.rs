use async_trait::async_trait;
use tracing::info;

use crate::scratch::{InputType, ScratchRequest};
use crate::stage::{Next, Stage, StageMetadata, StageResult};
use crate::state::GameState;

pub const STAGE: StageMetadata = StageMetadata {
    id: "input-classifier",
    name: "InputClassifier",
    version: "1.0.0",
};

/// Phrases that mark input as feedback about the game's rules.
pub const QUESTION_KEYWORDS: &[&str] = &["I think", "should", "rules", "mechanism", "change"];

/// Labels input as an in-world action or a mechanism question.
///
/// Matching is a case-sensitive substring search; any hit wins.
#[derive(Clone, Debug)]
pub struct InputClassifier {
    keywords: Vec<String>,
}

impl Default for InputClassifier {
    fn default() -> Self {
        Self::with_keywords(QUESTION_KEYWORDS.iter().copied())
    }
}

impl InputClassifier {
    pub fn with_keywords<I, K>(keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, input: &str) -> InputType {
        if self.keywords.iter().any(|keyword| input.contains(keyword.as_str())) {
            InputType::Question
        } else {
            InputType::Action
        }
    }
}

#[async_trait]
impl Stage for InputClassifier {
    fn metadata(&self) -> StageMetadata {
        STAGE
    }

    async fn process(
        &self,
        scratch: &mut ScratchRequest,
        state: &mut GameState,
        next: Next<'_>,
    ) -> StageResult {
        let input_type = self.classify(scratch.input());
        info!(input = scratch.input(), %input_type, "classified input");
        scratch.user_input = Some(scratch.input().to_string());
        scratch.input_type = Some(input_type);
        next.run(scratch, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rules_feedback_is_a_question() {
        let classifier = InputClassifier::default();
        assert_eq!(
            classifier.classify("I think the spaceship rules should change"),
            InputType::Question
        );
        assert_eq!(classifier.classify("I drink water"), InputType::Action);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let classifier = InputClassifier::default();
        assert_eq!(classifier.classify("RULES are weird"), InputType::Action);
        assert_eq!(classifier.classify("i think so"), InputType::Action);
        assert_eq!(classifier.classify("exchange the part"), InputType::Question);
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let classifier = InputClassifier::with_keywords(["?"]);
        assert_eq!(classifier.classify("why?"), InputType::Question);
        assert_eq!(classifier.classify("rules"), InputType::Action);
    }

    proptest! {
        #[test]
        fn any_keyword_forces_question(
            prefix in "[a-z ]{0,12}",
            suffix in "[a-z ]{0,12}",
            index in 0usize..QUESTION_KEYWORDS.len(),
        ) {
            let input = format!("{}{}{}", prefix, QUESTION_KEYWORDS[index], suffix);
            prop_assert_eq!(InputClassifier::default().classify(&input), InputType::Question);
        }

        #[test]
        fn digits_only_input_is_an_action(input in "[0-9 ]{0,40}") {
            prop_assert_eq!(InputClassifier::default().classify(&input), InputType::Action);
        }
    }
}
