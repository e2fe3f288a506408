//! Sample data for `--demo`.

use exam_core::model::{Question, QuestionId};
use remote::InMemoryBackend;

const OPEN_TESTS: u64 = 4;
const QUESTIONS_PER_TEST: u64 = 5;

/// Register the demo user and the open mock tests.
pub fn seed(backend: InMemoryBackend) -> InMemoryBackend {
    backend.add_user("demo", "demo");
    (1..=OPEN_TESTS).fold(backend, |backend, test| {
        backend.with_test(format!("test{test}"), questions_for(test))
    })
}

fn questions_for(test: u64) -> Vec<Question> {
    (1..=QUESTIONS_PER_TEST)
        .filter_map(|n| {
            let (a, b) = (test * 3 + n, n * 2 + 1);
            let sum = a + b;
            let options = [sum - 1, sum, sum + 2, sum + 5]
                .iter()
                .map(u64::to_string)
                .collect();
            Question::new(
                QuestionId::new(test * 100 + n),
                format!("What is {a} + {b}?"),
                options,
                Some(sum.to_string()),
            )
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::Clock;
    use exam_core::model::TestId;

    #[test]
    fn seeds_open_tests_with_answer_keys() {
        let backend = seed(InMemoryBackend::new(Clock::default_clock()));
        let answer = backend.canonical_answer(&TestId::new("test1"), QuestionId::new(101));
        assert_eq!(answer.as_deref(), Some("7"));
        assert!(
            backend
                .canonical_answer(&TestId::new("test5"), QuestionId::new(501))
                .is_none()
        );
    }
}
