use crate::adapters::http::RequestConfig;
use crate::core::envelope::ResponseEnvelope;
use crate::core::fallback::{Collections, DemoUser};
use crate::core::policy::{OperationKind, ServiceContext};
use crate::domain::model::{
    Ack, Credentials, LoginResult, ProfileUpdate, RegisterRequest, RegisterResult, UserProfile,
};
use crate::utils::error::{AccessError, Result};
use crate::utils::validation;
use serde_json::json;
use std::sync::Arc;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AuthService {
    ctx: Arc<ServiceContext>,
}

impl AuthService {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    pub async fn login(&self, credentials: &Credentials) -> ResponseEnvelope<LoginResult> {
        self.login_result(credentials).await.into()
    }

    pub(crate) async fn login_result(&self, credentials: &Credentials) -> Result<LoginResult> {
        validation::validate_non_empty("identifier", &credentials.identifier, "El usuario")?;
        validation::validate_non_empty("password", &credentials.password, "La contraseña")?;

        let identifier_field = if credentials.is_email() { "email" } else { "username" };
        let mut body = serde_json::Map::new();
        body.insert(identifier_field.to_string(), json!(credentials.identifier.trim()));
        body.insert("password".to_string(), json!(credentials.password));
        let request = RequestConfig::post("/auth/login").json(body.into());

        self.ctx
            .mutate("auth.login", request, |data| {
                data.users
                    .iter()
                    .find(|u| {
                        u.matches_identifier(&credentials.identifier)
                            && u.password == credentials.password
                    })
                    .map(|u| LoginResult {
                        token: u.token.clone(),
                        user: u.subject(),
                    })
                    .ok_or(AccessError::Authentication)
            })
            .await
            .map_err(|e| match e {
                AccessError::Http {
                    status: 400 | 401 | 403,
                    ..
                } => AccessError::Authentication,
                other => other,
            })
    }

    pub async fn register(&self, request: &RegisterRequest) -> ResponseEnvelope<RegisterResult> {
        match self.register_result(request).await {
            Ok(result) => ResponseEnvelope::ok_with_message(result, "Registro exitoso"),
            Err(e) => ResponseEnvelope::from_error(&e),
        }
    }

    async fn register_result(&self, request: &RegisterRequest) -> Result<RegisterResult> {
        validation::validate_min_length("username", &request.username, MIN_USERNAME_LEN, "El nombre de usuario")?;
        validation::validate_email("email", &request.email)?;
        validation::validate_min_length("password", &request.password, MIN_PASSWORD_LEN, "La contraseña")?;

        let body = serde_json::to_value(request)?;
        let http = RequestConfig::post("/auth/register").json(body);

        self.ctx
            .mutate("auth.register", http, |data| register_demo_user(data, request))
            .await
    }

    /// Best-effort server-side invalidation; local logout never depends on it.
    pub async fn logout_remote(&self) {
        if self.ctx.mode().is_demo() {
            return;
        }
        let request = RequestConfig::post("/auth/logout");
        if let Err(failure) = self.ctx.fetch::<Ack>(&request).await {
            tracing::warn!("🔐 Server-side logout failed: {:?}", failure);
        }
    }

    pub async fn profile(&self) -> ResponseEnvelope<UserProfile> {
        let request = RequestConfig::get("/user/profile");
        let token = self.ctx.current_token();
        self.ctx
            .read("auth.profile", request, |data| profile_for(data, token?))
            .await
            .into()
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ResponseEnvelope<UserProfile> {
        match self.update_profile_result(update).await {
            Ok(profile) => ResponseEnvelope::ok_with_message(profile, "Perfil actualizado"),
            Err(e) => ResponseEnvelope::from_error(&e),
        }
    }

    async fn update_profile_result(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(AccessError::validation("profile", "No hay cambios para guardar"));
        }

        let token = self.ctx.current_token()?;
        let request = RequestConfig::put("/user/profile").json(serde_json::to_value(update)?);

        self.ctx
            .mutate("auth.update_profile", request, |data| {
                let user = data
                    .users
                    .iter_mut()
                    .find(|u| u.token == token)
                    .ok_or(AccessError::SessionExpired)?;
                if let Some(first_name) = &update.first_name {
                    user.profile.first_name = Some(first_name.clone());
                }
                if let Some(last_name) = &update.last_name {
                    user.profile.last_name = Some(last_name.clone());
                }
                if let Some(phone) = &update.phone {
                    user.profile.phone = Some(phone.clone());
                }
                Ok(user.profile.clone())
            })
            .await
    }

    /// Checks the current token against the profile endpoint.
    ///
    /// Only an unambiguous unauthorized answer (or, in demo mode, an unknown
    /// token) yields `SessionExpired`; unreachable backends go through the
    /// regular read fallback.
    pub async fn validate_session(&self) -> Result<UserProfile> {
        let token = self.ctx.current_token()?;

        if self.ctx.mode().is_demo() {
            return profile_for(&self.ctx.fallback().snapshot(), token)
                .map_err(|_| AccessError::SessionExpired);
        }

        let request = RequestConfig::get("/user/profile");
        match self.ctx.fetch::<UserProfile>(&request).await {
            Ok(profile) => Ok(profile),
            Err(failure) if failure.is_unauthorized() => Err(AccessError::SessionExpired),
            Err(failure) => self.ctx.absorb(
                "auth.validate_session",
                OperationKind::Read,
                failure,
                |data| profile_for(&data.snapshot(), token),
            ),
        }
    }
}

fn profile_for(data: &Collections, token: String) -> Result<UserProfile> {
    data.user_by_token(&token)
        .map(|u| u.profile.clone())
        .ok_or_else(|| AccessError::not_found("Perfil no encontrado"))
}

fn register_demo_user(data: &mut Collections, request: &RegisterRequest) -> Result<RegisterResult> {
    let email = request.email.trim();
    let username = request.username.trim();

    if data.users.iter().any(|u| u.profile.email.eq_ignore_ascii_case(email)) {
        return Err(AccessError::validation("email", "El correo ya está registrado"));
    }
    if data.users.iter().any(|u| u.profile.username == username) {
        return Err(AccessError::validation("username", "El nombre de usuario ya existe"));
    }

    let id = data.users.iter().map(|u| u.profile.id).max().unwrap_or(0) + 1;
    let user = DemoUser {
        password: request.password.clone(),
        token: format!("demo-token-user-{}", id),
        profile: UserProfile {
            id,
            username: username.to_string(),
            email: email.to_string(),
            roles: request
                .roles
                .clone()
                .unwrap_or_else(|| vec!["student".to_string()]),
            first_name: None,
            last_name: None,
            phone: None,
            career: None,
            semester: None,
        },
    };
    let subject = user.subject();
    data.users.push(user);

    Ok(RegisterResult { user: subject })
}
