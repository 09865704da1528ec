use crate::adapters::http::RequestConfig;
use crate::core::envelope::ResponseEnvelope;
use crate::core::policy::ServiceContext;
use crate::domain::model::ScheduleEntry;
use chrono::{Datelike, Weekday};
use std::sync::Arc;

#[derive(Clone)]
pub struct ScheduleService {
    ctx: Arc<ServiceContext>,
}

impl ScheduleService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Whole week, ordered by day and start time.
    pub async fn list(&self) -> ResponseEnvelope<Vec<ScheduleEntry>> {
        self.ctx
            .read("schedule.list", RequestConfig::get("/schedule"), |data| {
                Ok(data.schedule.clone())
            })
            .await
            .map(sort_week)
            .into()
    }

    pub async fn for_day(&self, day: Weekday) -> ResponseEnvelope<Vec<ScheduleEntry>> {
        let day_number = day.number_from_monday();
        self.list().await.map(|entries| {
            entries
                .into_iter()
                .filter(|e| e.day_of_week == day_number)
                .collect()
        })
    }

    pub async fn today(&self) -> ResponseEnvelope<Vec<ScheduleEntry>> {
        self.for_day(chrono::Local::now().weekday()).await
    }
}

fn sort_week(mut entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    // "HH:MM" strings sort correctly as text.
    entries.sort_by(|a, b| {
        a.day_of_week
            .cmp(&b.day_of_week)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });
    entries
}
