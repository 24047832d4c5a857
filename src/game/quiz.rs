//! Math quiz content, regenerated periodically

use rand::Rng;

/// Problems per quiz round
pub const QUIZ_SIZE: usize = 5;

/// Largest sum an addition problem may have
pub const MAX_SUM: u32 = 100;

/// Largest spread between the wrong answer and the correct one
const WRONG_SPREAD: i64 = 10;

/// One arithmetic problem with a correct and a wrong answer slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MathExample {
    pub expression: String,
    pub correct: u32,
    pub wrong: u32,
    /// Answer slot (0 or 1) that holds `correct`
    pub correct_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MathQuiz {
    pub examples: Vec<MathExample>,
    /// Unix ms
    pub generated_at: u64,
}

impl MathQuiz {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: u64) -> Self {
        let examples = (0..QUIZ_SIZE).map(|_| MathExample::random(rng)).collect();
        Self {
            examples,
            generated_at: now,
        }
    }
}

impl MathExample {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (expression, correct) = if rng.gen_bool(0.5) {
            let a = rng.gen_range(0..=MAX_SUM);
            let b = rng.gen_range(0..=MAX_SUM - a);
            (format!("{a} + {b}"), a + b)
        } else {
            let a = rng.gen_range(0..=MAX_SUM);
            let b = rng.gen_range(0..=a);
            (format!("{a} - {b}"), a - b)
        };

        Self {
            expression,
            correct,
            wrong: wrong_answer(rng, correct),
            correct_index: rng.gen_range(0..2),
        }
    }
}

/// A plausible non-negative answer near `correct`, never equal to it
fn wrong_answer<R: Rng + ?Sized>(rng: &mut R, correct: u32) -> u32 {
    let correct = correct as i64;
    let low = (correct - WRONG_SPREAD).max(0);
    let high = correct + WRONG_SPREAD;

    // Draw from the range with `correct` removed
    let pick = rng.gen_range(low..high);
    let wrong = if pick >= correct { pick + 1 } else { pick };
    wrong as u32
}
