use crate::adapters::http::RequestConfig;
use crate::app::services::missing_as_not_found;
use crate::core::envelope::ResponseEnvelope;
use crate::core::policy::ServiceContext;
use crate::domain::model::{Ack, Assignment, AssignmentSubmission};
use crate::utils::error::{AccessError, Result};
use crate::utils::validation;
use std::sync::Arc;

const ASSIGNMENT_NOT_FOUND: &str = "Tarea no encontrada";

#[derive(Clone)]
pub struct AssignmentService {
    ctx: Arc<ServiceContext>,
}

impl AssignmentService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Ordered by due date, soonest first.
    pub async fn list(&self) -> ResponseEnvelope<Vec<Assignment>> {
        self.list_result()
            .await
            .map(|mut assignments| {
                assignments.sort_by_key(|a| a.due_date);
                assignments
            })
            .into()
    }

    async fn list_result(&self) -> Result<Vec<Assignment>> {
        self.ctx
            .read("assignments.list", RequestConfig::get("/assignments"), |data| {
                Ok(data.assignments.clone())
            })
            .await
    }

    pub async fn get_by_id(&self, id: u64) -> ResponseEnvelope<Assignment> {
        self.list_result()
            .await
            .and_then(|assignments| {
                assignments
                    .into_iter()
                    .find(|a| a.id == id)
                    .ok_or_else(|| AccessError::not_found(ASSIGNMENT_NOT_FOUND))
            })
            .into()
    }

    /// Not deduplicated: one user action must map to one call.
    pub async fn submit(&self, id: u64, content: &str) -> ResponseEnvelope<Ack> {
        match self.submit_result(id, content).await {
            Ok(ack) => ResponseEnvelope::ok_with_message(ack, "Tarea entregada"),
            Err(e) => ResponseEnvelope::from_error(&e),
        }
    }

    async fn submit_result(&self, id: u64, content: &str) -> Result<Ack> {
        validation::validate_non_empty("content", content, "El contenido de la entrega")?;

        let submission = AssignmentSubmission {
            content: content.to_string(),
        };
        let request = RequestConfig::post(format!("/assignments/{}/submit", id))
            .json(serde_json::to_value(&submission)?);

        self.ctx
            .mutate("assignments.submit", request, |data| {
                let assignment = data
                    .assignments
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| AccessError::not_found(ASSIGNMENT_NOT_FOUND))?;
                if assignment.status == "graded" {
                    return Err(AccessError::validation("status", "La tarea ya fue calificada"));
                }
                assignment.status = "submitted".to_string();
                Ok(Ack)
            })
            .await
            .map_err(missing_as_not_found(ASSIGNMENT_NOT_FOUND))
    }
}
