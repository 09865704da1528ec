use crate::adapters::http::RequestConfig;
use crate::core::envelope::ResponseEnvelope;
use crate::core::policy::ServiceContext;
use crate::domain::model::Grade;
use std::sync::Arc;

#[derive(Clone)]
pub struct GradeService {
    ctx: Arc<ServiceContext>,
}

impl GradeService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub async fn list(&self) -> ResponseEnvelope<Vec<Grade>> {
        self.ctx
            .read("grades.list", RequestConfig::get("/grades"), |data| {
                Ok(data.grades.clone())
            })
            .await
            .into()
    }

    pub async fn list_for_course(&self, course_id: u64) -> ResponseEnvelope<Vec<Grade>> {
        self.list()
            .await
            .map(|grades| grades.into_iter().filter(|g| g.course_id == course_id).collect())
    }

    /// Mean of the normalized percentages, `None` for an empty slice.
    pub fn average(grades: &[Grade]) -> Option<f64> {
        if grades.is_empty() {
            return None;
        }
        let total: f64 = grades.iter().map(Grade::percentage).sum();
        Some(total / grades.len() as f64)
    }
}
