mod criteria;
pub mod evaluator;
mod principles;
mod prompts;
mod verdict;

pub use criteria::{catalog, lookup, CatalogEntry, CriteriaError, CriteriaSet, Criterion};
pub use evaluator::{CriteriaEvaluator, EvaluationError, EvaluationRequest};
pub use principles::{principle, principles, ConstitutionalPrinciple};
pub use prompts::{CriteriaPrompts, PromptTemplate};
pub use verdict::EvaluationResult;
