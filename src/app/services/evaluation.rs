use crate::adapters::http::RequestConfig;
use crate::app::services::missing_as_not_found;
use crate::core::envelope::ResponseEnvelope;
use crate::core::policy::{OperationKind, ServiceContext};
use crate::domain::model::{Evaluation, EvaluationResult, EvaluationSubmission};
use crate::utils::error::{AccessError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

const EVALUATION_NOT_FOUND: &str = "Evaluación no encontrada";

#[derive(Clone)]
pub struct EvaluationService {
    ctx: Arc<ServiceContext>,
}

impl EvaluationService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Questions are returned without their correct answers.
    pub async fn get_by_id(&self, id: u64) -> ResponseEnvelope<Evaluation> {
        let request = RequestConfig::get(format!("/evaluations/{}", id));
        self.ctx
            .read("evaluations.get_by_id", request, |data| {
                data.evaluation(id)
                    .cloned()
                    .ok_or_else(|| AccessError::not_found(EVALUATION_NOT_FOUND))
            })
            .await
            .map(Evaluation::without_answer_key)
            .map_err(missing_as_not_found(EVALUATION_NOT_FOUND))
            .into()
    }

    /// Not deduplicated: one user action must map to one call.
    pub async fn submit(
        &self,
        id: u64,
        submission: &EvaluationSubmission,
    ) -> ResponseEnvelope<EvaluationResult> {
        match self.submit_result(id, submission).await {
            Ok(result) => ResponseEnvelope::ok_with_message(result, "Evaluación enviada"),
            Err(e) => ResponseEnvelope::from_error(&e),
        }
    }

    async fn submit_result(
        &self,
        id: u64,
        submission: &EvaluationSubmission,
    ) -> Result<EvaluationResult> {
        let request = RequestConfig::post(format!("/evaluations/{}/submit", id))
            .json(serde_json::to_value(submission)?);

        self.ctx
            .resolve(
                "evaluations.submit",
                OperationKind::Mutation,
                request,
                |data| {
                    let snapshot = data.snapshot();
                    let evaluation = snapshot
                        .evaluation(id)
                        .ok_or_else(|| AccessError::not_found(EVALUATION_NOT_FOUND))?;
                    Ok(score_submission(evaluation, &submission.answers))
                },
            )
            .await
            .map(|result| self.with_verdict(id, result))
            .map_err(missing_as_not_found(EVALUATION_NOT_FOUND))
    }

    /// Live results omit `passed`; derive it from the known passing score.
    fn with_verdict(&self, id: u64, mut result: EvaluationResult) -> EvaluationResult {
        if result.passed.is_none() {
            let percentage = result.percentage;
            result.passed = self
                .ctx
                .fallback()
                .snapshot()
                .evaluation(id)
                .map(|evaluation| percentage >= evaluation.passing_score);
        }
        result
    }
}

/// Scores answers against the local answer key.
///
/// Answers are compared verbatim. A question set with no questions scores
/// 0% rather than dividing by zero.
pub fn score_submission(
    evaluation: &Evaluation,
    answers: &BTreeMap<String, String>,
) -> EvaluationResult {
    let correct = evaluation
        .questions
        .iter()
        .filter(|q| match (&q.correct_answer, answers.get(&q.id)) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        })
        .count();

    let score = correct as f64 * evaluation.points_per_question;
    let total_score = evaluation.questions.len() as f64 * evaluation.points_per_question;
    let percentage = if total_score > 0.0 {
        score / total_score * 100.0
    } else {
        0.0
    };

    EvaluationResult {
        score,
        total_score,
        percentage,
        passed: Some(percentage >= evaluation.passing_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::FallbackDataSet;

    fn answers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    #[test]
    fn test_all_correct_scores_full_marks() {
        let data = FallbackDataSet::seeded().unwrap();
        let evaluation = data.seed().evaluation(1).unwrap();

        let result = score_submission(
            evaluation,
            &answers(&[("q1", "2x"), ("q2", "0"), ("q3", "cos(x)")]),
        );
        assert_eq!(result.score, 30.0);
        assert_eq!(result.total_score, 30.0);
        assert_eq!(result.percentage, 100.0);
        assert_eq!(result.passed, Some(true));
    }

    #[test]
    fn test_partial_answers_below_passing_score() {
        let data = FallbackDataSet::seeded().unwrap();
        let evaluation = data.seed().evaluation(2).unwrap();

        let result = score_submission(evaluation, &answers(&[("q1", "O(log n)"), ("q2", "Pila")]));
        assert_eq!(result.score, 5.0);
        assert_eq!(result.total_score, 20.0);
        assert_eq!(result.percentage, 25.0);
        assert_eq!(result.passed, Some(false));
    }

    #[test]
    fn test_empty_question_set_scores_zero() {
        let evaluation = Evaluation {
            id: 9,
            course_id: 1,
            title: "Vacía".to_string(),
            description: String::new(),
            points_per_question: 10.0,
            passing_score: 60.0,
            time_limit_minutes: None,
            questions: vec![],
        };

        let result = score_submission(&evaluation, &BTreeMap::new());
        assert_eq!(result.percentage, 0.0);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.passed, Some(false));
    }
}
