use crate::app::services::{
    AssignmentService, AuthService, CommunicationService, CourseService, EvaluationService,
    GradeService, ScheduleService,
};
use crate::config::ClientConfig;
use crate::core::fallback::FallbackDataSet;
use crate::core::policy::ServiceContext;
use crate::core::session::SessionContext;
use crate::domain::ports::SecretStorage;
use crate::utils::error::Result;
use std::sync::Arc;

/// Entry point bundling every domain facade over one shared context.
///
/// All facades share the executor (and therefore the bearer token) and the
/// fallback working copy.
#[derive(Clone)]
pub struct AulaClient {
    ctx: Arc<ServiceContext>,
    auth: AuthService,
    courses: CourseService,
    grades: GradeService,
    schedule: ScheduleService,
    assignments: AssignmentService,
    communication: CommunicationService,
    evaluations: EvaluationService,
}

impl AulaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_context(Arc::new(ServiceContext::new(config)?)))
    }

    pub fn with_fallback(config: ClientConfig, fallback: FallbackDataSet) -> Result<Self> {
        Ok(Self::from_context(Arc::new(ServiceContext::with_fallback(
            config, fallback,
        )?)))
    }

    fn from_context(ctx: Arc<ServiceContext>) -> Self {
        tracing::debug!(
            "Client ready: mode={} base_url={} timeout={}ms fallback={}",
            ctx.mode(),
            ctx.config().base_url,
            ctx.config().timeout_ms,
            ctx.config().allow_offline_fallback
        );
        Self {
            auth: AuthService::new(ctx.clone()),
            courses: CourseService::new(ctx.clone()),
            grades: GradeService::new(ctx.clone()),
            schedule: ScheduleService::new(ctx.clone()),
            assignments: AssignmentService::new(ctx.clone()),
            communication: CommunicationService::new(ctx.clone()),
            evaluations: EvaluationService::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn courses(&self) -> &CourseService {
        &self.courses
    }

    pub fn grades(&self) -> &GradeService {
        &self.grades
    }

    pub fn schedule(&self) -> &ScheduleService {
        &self.schedule
    }

    pub fn assignments(&self) -> &AssignmentService {
        &self.assignments
    }

    pub fn communication(&self) -> &CommunicationService {
        &self.communication
    }

    pub fn evaluations(&self) -> &EvaluationService {
        &self.evaluations
    }

    /// Session bound to this client's executor and the given secret storage.
    pub fn session<S: SecretStorage>(&self, storage: S) -> SessionContext<S> {
        SessionContext::new(self.auth.clone(), storage)
    }
}
