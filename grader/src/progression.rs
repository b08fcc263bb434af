use crate::exercise::Exercise;
use crate::harness::{self, TestResult};

/// Result of the latest check of the active exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Loading,
    Active { index: usize, score: u32, last_result: Outcome },
    Finished { score: u32 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProgressionError {
    #[error("no exercises have been loaded")]
    NotLoaded,
    #[error("there is no active exercise")]
    NotActive,
    #[error("exercise {index} of {total} is not the last one")]
    NotOnLastExercise { index: usize, total: usize },
}

/// Walks a learner through a list of exercises, keeping score.
///
/// Knows nothing about blocks or sandboxes: it only consumes verification
/// outcomes.
#[derive(Debug, Clone)]
pub struct Progression {
    exercises: Vec<Exercise>,
    state: State,
    /// Points of the active exercise were already awarded on this visit.
    awarded: bool,
}

impl Progression {
    pub fn new() -> Self {
        Progression {
            exercises: Vec::new(),
            state: State::Loading,
            awarded: false,
        }
    }

    /// Start over with `exercises`, already filtered by level.
    pub fn load(&mut self, exercises: Vec<Exercise>) {
        tracing::debug!(count = exercises.len(), "exercises loaded");
        self.exercises = exercises;
        self.start();
    }

    fn start(&mut self) {
        self.awarded = false;
        self.state = if self.exercises.is_empty() {
            State::Finished { score: 0 }
        } else {
            State::Active {
                index: 0,
                score: 0,
                last_result: Outcome::Pending,
            }
        };
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        match self.state {
            State::Active { index, .. } => self.exercises.get(index),
            _ => None,
        }
    }

    pub fn score(&self) -> u32 {
        match self.state {
            State::Loading => 0,
            State::Active { score, .. } | State::Finished { score } => score,
        }
    }

    pub fn is_last(&self) -> bool {
        matches!(self.state, State::Active { index, .. } if index + 1 == self.exercises.len())
    }

    /// Grade a declared answer against the active exercise's expected one.
    pub fn check_answer(&mut self, declared: Option<f64>) -> Result<bool, ProgressionError> {
        let exercise = self.current_exercise().ok_or(ProgressionError::NotActive)?;
        let correct = exercise
            .expected_answer
            .is_some_and(|expected| harness::check_single_answer(declared, expected));
        self.record(correct)
    }

    /// Grade function test results. No results, or an exercise without a
    /// function test, is incorrect.
    pub fn check_function_answer(&mut self, results: &[TestResult]) -> Result<bool, ProgressionError> {
        let exercise = self.current_exercise().ok_or(ProgressionError::NotActive)?;
        let correct = exercise.function_test.is_some() && harness::all_passed(results);
        self.record(correct)
    }

    /// Record an outcome decided elsewhere, e.g. by [`harness::verify`].
    pub fn record(&mut self, correct: bool) -> Result<bool, ProgressionError> {
        let State::Active {
            index,
            score,
            last_result,
        } = &mut self.state
        else {
            return Err(ProgressionError::NotActive);
        };
        *last_result = if correct { Outcome::Correct } else { Outcome::Incorrect };
        if correct && !self.awarded {
            let points = self.exercises.get(*index).map_or(0, |e| e.points);
            *score += points;
            self.awarded = true;
            tracing::debug!(exercise = *index, points, score = *score, "points awarded");
        }
        Ok(correct)
    }

    /// Move to the next exercise. Does nothing on the last one.
    pub fn next_exercise(&mut self) -> Result<bool, ProgressionError> {
        let State::Active {
            index, last_result, ..
        } = &mut self.state
        else {
            return Err(ProgressionError::NotActive);
        };
        if *index + 1 >= self.exercises.len() {
            return Ok(false);
        }
        *index += 1;
        *last_result = Outcome::Pending;
        self.awarded = false;
        tracing::debug!(exercise = *index, "advanced");
        Ok(true)
    }

    /// Dismiss the latest result and try the same exercise again.
    pub fn retry(&mut self) -> Result<(), ProgressionError> {
        match &mut self.state {
            State::Active { last_result, .. } => {
                *last_result = Outcome::Pending;
                Ok(())
            }
            _ => Err(ProgressionError::NotActive),
        }
    }

    pub fn finish(&mut self) -> Result<u32, ProgressionError> {
        match self.state {
            State::Active { index, score, .. } if index + 1 == self.exercises.len() => {
                self.state = State::Finished { score };
                tracing::debug!(score, "finished");
                Ok(score)
            }
            State::Active { index, .. } => Err(ProgressionError::NotOnLastExercise {
                index: index + 1,
                total: self.exercises.len(),
            }),
            _ => Err(ProgressionError::NotActive),
        }
    }

    /// Back to the first exercise with the score zeroed.
    pub fn reset(&mut self) -> Result<(), ProgressionError> {
        if self.state == State::Loading {
            return Err(ProgressionError::NotLoaded);
        }
        self.start();
        Ok(())
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercise::{FunctionTest, TestCase};

    fn exercise(id: u32, points: u32, expected_answer: f64) -> Exercise {
        Exercise {
            id,
            level: "basic".into(),
            title: format!("exercise {id}"),
            description: String::new(),
            hints: Vec::new(),
            points,
            expected_answer: Some(expected_answer),
            function_test: None,
        }
    }

    fn loaded() -> Progression {
        let mut progression = Progression::new();
        progression.load(vec![exercise(1, 10, 8.0), exercise(2, 20, 3.0)]);
        progression
    }

    #[test]
    fn starts_loading_and_activates_on_load() {
        let mut progression = Progression::new();
        assert_eq!(progression.state(), State::Loading);
        assert_eq!(progression.check_answer(Some(1.0)), Err(ProgressionError::NotActive));
        assert_eq!(progression.reset(), Err(ProgressionError::NotLoaded));

        progression.load(vec![exercise(1, 10, 8.0)]);
        assert_eq!(
            progression.state(),
            State::Active {
                index: 0,
                score: 0,
                last_result: Outcome::Pending
            }
        );
    }

    #[test]
    fn empty_list_is_finished() {
        let mut progression = Progression::new();
        progression.load(Vec::new());
        assert_eq!(progression.state(), State::Finished { score: 0 });
    }

    #[test]
    fn points_awarded_once_per_visit() {
        let mut progression = loaded();
        assert_eq!(progression.check_answer(Some(7.0)), Ok(false));
        assert_eq!(progression.score(), 0);
        assert_eq!(progression.check_answer(Some(8.0005)), Ok(true));
        assert_eq!(progression.check_answer(Some(8.0)), Ok(true));
        assert_eq!(progression.score(), 10);
        assert_eq!(progression.check_answer(None), Ok(false));
        assert_eq!(
            progression.state(),
            State::Active {
                index: 0,
                score: 10,
                last_result: Outcome::Incorrect
            }
        );
    }

    #[test]
    fn next_stops_at_the_last_exercise() {
        let mut progression = loaded();
        progression.check_answer(Some(8.0)).unwrap();
        assert_eq!(progression.next_exercise(), Ok(true));
        assert_eq!(
            progression.state(),
            State::Active {
                index: 1,
                score: 10,
                last_result: Outcome::Pending
            }
        );
        assert_eq!(progression.next_exercise(), Ok(false));
        assert!(progression.is_last());
        assert_eq!(progression.current_exercise().map(|e| e.id), Some(2));
    }

    #[test]
    fn retry_finish_and_reset() {
        let mut progression = loaded();
        assert_eq!(
            progression.finish(),
            Err(ProgressionError::NotOnLastExercise { index: 1, total: 2 })
        );
        progression.check_answer(Some(0.0)).unwrap();
        progression.retry().unwrap();
        assert!(matches!(
            progression.state(),
            State::Active {
                last_result: Outcome::Pending,
                ..
            }
        ));

        progression.check_answer(Some(8.0)).unwrap();
        progression.next_exercise().unwrap();
        progression.check_answer(Some(3.0)).unwrap();
        assert_eq!(progression.finish(), Ok(30));
        assert_eq!(progression.state(), State::Finished { score: 30 });
        assert_eq!(progression.next_exercise(), Err(ProgressionError::NotActive));

        progression.reset().unwrap();
        assert_eq!(progression.score(), 0);
        assert_eq!(progression.current_exercise().map(|e| e.id), Some(1));
    }

    #[test]
    fn function_answers_need_results() {
        let mut ex = exercise(3, 15, 0.0);
        ex.function_test = Some(FunctionTest {
            function_name: "doble".into(),
            parameters: vec!["n".into()],
            test_cases: vec![TestCase {
                args: vec![2.0],
                expected: 4.0,
            }],
        });
        let mut progression = Progression::new();
        progression.load(vec![ex]);

        assert_eq!(progression.check_function_answer(&[]), Ok(false));
        let passing = TestResult {
            args: vec![2.0],
            expected: 4.0,
            actual: Some(sandbox::RuntimeValue::Number(4.0)),
            passed: true,
        };
        assert_eq!(progression.check_function_answer(&[passing]), Ok(true));
        assert_eq!(progression.score(), 15);
    }
}
