use crate::adapters::http::RequestConfig;
use crate::app::services::missing_as_not_found;
use crate::core::envelope::ResponseEnvelope;
use crate::core::policy::ServiceContext;
use crate::domain::model::{Ack, Announcement};
use crate::utils::error::AccessError;
use std::sync::Arc;

const ANNOUNCEMENT_NOT_FOUND: &str = "Anuncio no encontrado";

#[derive(Clone)]
pub struct CommunicationService {
    ctx: Arc<ServiceContext>,
}

impl CommunicationService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Newest first.
    pub async fn list_announcements(&self) -> ResponseEnvelope<Vec<Announcement>> {
        self.ctx
            .read(
                "announcements.list",
                RequestConfig::get("/announcements"),
                |data| Ok(data.announcements.clone()),
            )
            .await
            .map(|mut announcements| {
                announcements.sort_by(|a, b| b.published_at.cmp(&a.published_at));
                announcements
            })
            .into()
    }

    pub async fn unread_count(&self) -> ResponseEnvelope<usize> {
        self.list_announcements()
            .await
            .map(|announcements| announcements.iter().filter(|a| !a.read).count())
    }

    pub async fn mark_read(&self, id: u64) -> ResponseEnvelope<Ack> {
        let request = RequestConfig::post(format!("/announcements/{}/read", id));
        self.ctx
            .mutate("announcements.mark_read", request, |data| {
                let announcement = data
                    .announcements
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or_else(|| AccessError::not_found(ANNOUNCEMENT_NOT_FOUND))?;
                announcement.read = true;
                Ok(Ack)
            })
            .await
            .map_err(missing_as_not_found(ANNOUNCEMENT_NOT_FOUND))
            .into()
    }
}
