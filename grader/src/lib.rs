//! Exercises, grading of generated programs, and the progression through
//! a list of exercises.

pub mod exercise;
pub mod harness;
pub mod progression;

pub use exercise::{Exercise, ExerciseError, FunctionTest, Grading, TestCase};
pub use harness::{
    ANSWER_TOLERANCE, FunctionTestRun, TestResult, Verification, answers_match, check_single_answer,
    run_function_tests, verify,
};
pub use progression::{Outcome, Progression, ProgressionError, State};
