use crate::adapters::http::RequestConfig;
use crate::app::services::missing_as_not_found;
use crate::core::envelope::ResponseEnvelope;
use crate::core::fallback::Collections;
use crate::core::policy::ServiceContext;
use crate::domain::model::{Ack, Course, CourseDetail, CourseQuery};
use crate::utils::error::{AccessError, Result};
use std::sync::Arc;

const COURSE_NOT_FOUND: &str = "Curso no encontrado";

#[derive(Clone)]
pub struct CourseService {
    ctx: Arc<ServiceContext>,
}

impl CourseService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub async fn list(&self, query: CourseQuery) -> ResponseEnvelope<Vec<Course>> {
        let mut request = RequestConfig::get("/courses");
        if let Some(enrolled) = query.enrolled {
            request = request.query("enrolled", enrolled);
        }
        if let Some(limit) = query.limit {
            request = request.query("limit", limit);
        }

        self.ctx
            .read("courses.list", request, |data| Ok(local_list(data, query)))
            .await
            .into()
    }

    pub async fn get_by_id(&self, id: u64) -> ResponseEnvelope<CourseDetail> {
        let request = RequestConfig::get(format!("/courses/{}", id));
        self.ctx
            .read("courses.get_by_id", request, |data| {
                data.course(id)
                    .cloned()
                    .ok_or_else(|| AccessError::not_found(COURSE_NOT_FOUND))
            })
            .await
            .map_err(missing_as_not_found(COURSE_NOT_FOUND))
            .into()
    }

    /// Not deduplicated: one user action must map to one call.
    pub async fn enroll(&self, id: u64) -> ResponseEnvelope<Ack> {
        let already_enrolled = self.ctx.mode().is_demo()
            && self
                .ctx
                .fallback()
                .snapshot()
                .course(id)
                .map_or(false, |c| c.course.is_enrolled);

        let request = RequestConfig::post(format!("/courses/{}/enroll", id));
        let outcome = self
            .ctx
            .mutate("courses.enroll", request, |data| {
                let course = data
                    .courses
                    .iter_mut()
                    .find(|c| c.course.id == id)
                    .ok_or_else(|| AccessError::not_found(COURSE_NOT_FOUND))?;
                course.course.is_enrolled = true;
                Ok(Ack)
            })
            .await
            .map_err(missing_as_not_found(COURSE_NOT_FOUND));

        match outcome {
            Ok(ack) if already_enrolled => {
                ResponseEnvelope::ok_with_message(ack, "Ya estás inscrito en este curso")
            }
            Ok(ack) => ResponseEnvelope::ok_with_message(ack, "Inscripción exitosa"),
            Err(e) => ResponseEnvelope::from_error(&e),
        }
    }
}

fn local_list(data: &Collections, query: CourseQuery) -> Vec<Course> {
    data.courses
        .iter()
        .map(|c| &c.course)
        .filter(|c| query.enrolled.map_or(true, |enrolled| c.is_enrolled == enrolled))
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
