pub mod evaluator;
pub mod expression;
pub mod numeric;
pub mod parse;
pub mod solver;

pub use evaluator::{EvaluationError, ExpressionEvaluator, NativeEvaluator, Scope};
pub use expression::{Expression, operator::Operator};
pub use numeric::{NumericConstant, NumericConstantError};
pub use solver::{EquationSolver, GridSamples, SampleFailure};
