//! Concrete stages, listed in the order a step-processing pipeline registers them.

pub mod classify;
pub mod clock;
pub mod validate;
pub mod summarize;
pub mod narrate;

pub use classify::InputClassifier;
pub use clock::TimeAdvancer;
pub use narrate::EventGenerator;
pub use summarize::HistorySummarizer;
pub use validate::StateValidator;
