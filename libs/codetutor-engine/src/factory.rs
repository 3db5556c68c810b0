/// Challenge Factory
///
/// Single entry point for grading: dispatches on the challenge variant with
/// an exhaustive match, so a new variant cannot be added without a
/// validator. The answer shape must fit the variant; anything else is a
/// configuration error, returned before any execution happens.
use codetutor_common::{Answer, Challenge, ChallengeKind, ChallengeResult, ChallengeType};
use tracing::{info, warn};

use crate::engine::CodeExecutor;
use crate::error::{EngineError, Result};
use crate::evaluator::{
    validate_code, validate_code_output, validate_conceptual, validate_multiple_choice,
    validate_true_false, CodeMode,
};

/// Resolve a challenge discriminator
///
/// Accepts `MULTIPLE_CHOICE`, `multipleChoice`, `multiple-choice` and the
/// like. Unknown discriminators are rejected, never mapped to a default.
pub fn parse_challenge_type(discriminator: &str) -> Result<ChallengeType> {
    let key: String = discriminator
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    match key.as_str() {
        "multiplechoice" => Ok(ChallengeType::MultipleChoice),
        "truefalse" => Ok(ChallengeType::TrueFalse),
        "codeoutput" => Ok(ChallengeType::CodeOutput),
        "freecoding" => Ok(ChallengeType::FreeCoding),
        "codecompletion" => Ok(ChallengeType::CodeCompletion),
        "conceptual" => Ok(ChallengeType::Conceptual),
        _ => Err(EngineError::UnsupportedChallengeType(
            discriminator.to_string(),
        )),
    }
}

/// Grade one submission
///
/// ## Returns
/// - `Ok(ChallengeResult)` for every graded answer, right or wrong
/// - `Err(AnswerMismatch)` when the answer shape does not fit the variant
pub async fn submit(
    executor: &dyn CodeExecutor,
    challenge: &Challenge,
    answer: &Answer,
) -> Result<ChallengeResult> {
    let points = challenge.points;

    let result = match (&challenge.kind, answer) {
        (ChallengeKind::MultipleChoice(c), Answer::Choice(selected)) => {
            validate_multiple_choice(points, c, *selected)
        }
        (ChallengeKind::TrueFalse(c), Answer::TrueFalse(value)) => {
            validate_true_false(points, c, *value)
        }
        (ChallengeKind::CodeOutput(c), Answer::Output(output)) => {
            validate_code_output(points, c, output)
        }
        (ChallengeKind::FreeCoding(c), Answer::Code(code)) => {
            validate_code(executor, points, CodeMode::FreeCoding, c, code).await
        }
        (ChallengeKind::CodeCompletion(c), Answer::Code(code)) => {
            validate_code(executor, points, CodeMode::CodeCompletion, c, code).await
        }
        (ChallengeKind::Conceptual(c), Answer::Text(text)) => validate_conceptual(points, c, text),
        (kind, answer) => {
            warn!(
                challenge_id = %challenge.id,
                challenge_type = %kind.challenge_type(),
                answer = answer.kind(),
                "answer does not fit challenge"
            );
            return Err(EngineError::AnswerMismatch {
                challenge_type: kind.challenge_type(),
                got: answer.kind(),
            });
        }
    };

    info!(
        challenge_id = %challenge.id,
        challenge_type = %challenge.challenge_type(),
        is_correct = result.is_correct,
        score = result.score,
        max_score = result.max_score,
        "submission graded"
    );

    Ok(result)
}
