use serde::Deserialize;

/// A graded task. Exercises are immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Exercise {
    pub id: u32,
    pub level: String,
    pub title: String,
    /// Markdown.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub expected_answer: Option<f64>,
    #[serde(default)]
    pub function_test: Option<FunctionTest>,
}

/// The function an exercise asks for, and the cases it must pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionTest {
    pub function_name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestCase {
    pub args: Vec<f64>,
    pub expected: f64,
}

/// How an exercise is graded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Grading<'a> {
    SingleAnswer(f64),
    Function(&'a FunctionTest),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExerciseError {
    #[error("exercise {0} has neither an expected answer nor a function test")]
    NoGrading(u32),
    #[error("exercise {id}: `{name}` is not a valid function name")]
    InvalidFunctionName { id: u32, name: String },
    #[error("exercise {id}: test case {case} passes {found} arguments to a function of {expected} parameters")]
    ArityMismatch {
        id: u32,
        case: usize,
        expected: usize,
        found: usize,
    },
}

impl Exercise {
    /// A function test takes precedence over an expected answer.
    pub fn grading(&self) -> Result<Grading<'_>, ExerciseError> {
        match (&self.function_test, self.expected_answer) {
            (Some(test), _) => Ok(Grading::Function(test)),
            (None, Some(answer)) => Ok(Grading::SingleAnswer(answer)),
            (None, None) => Err(ExerciseError::NoGrading(self.id)),
        }
    }

    /// Check that the exercise can be graded at all.
    pub fn validate(&self) -> Result<(), ExerciseError> {
        let Grading::Function(test) = self.grading()? else {
            return Ok(());
        };
        if !is_identifier(&test.function_name) {
            return Err(ExerciseError::InvalidFunctionName {
                id: self.id,
                name: test.function_name.clone(),
            });
        }
        if !test.parameters.is_empty() {
            for (case, test_case) in test.test_cases.iter().enumerate() {
                if test_case.args.len() != test.parameters.len() {
                    return Err(ExerciseError::ArityMismatch {
                        id: self.id,
                        case: case + 1,
                        expected: test.parameters.len(),
                        found: test_case.args.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
