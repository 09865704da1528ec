use crate::utils::error::AccessError;
use serde::Serialize;

const GENERIC_FAILURE: &str = "Ocurrió un error inesperado";

/// Uniform `{success, data, message}` value returned by every facade operation.
///
/// A failed envelope always carries a non-empty message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        };
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }

    pub fn from_error(error: &AccessError) -> Self {
        Self::fail(error.user_message())
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ResponseEnvelope<U> {
        ResponseEnvelope {
            success: self.success,
            data: self.data.map(f),
            message: self.message,
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (_, _) => Err(self.message.unwrap_or_else(|| GENERIC_FAILURE.to_string())),
        }
    }
}

impl<T> From<Result<T, AccessError>> for ResponseEnvelope<T> {
    fn from(result: Result<T, AccessError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_envelope_always_has_message() {
        let envelope: ResponseEnvelope<()> = ResponseEnvelope::fail("   ");
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some(GENERIC_FAILURE));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_from_error_uses_humanized_text() {
        let envelope: ResponseEnvelope<u32> = Err(AccessError::not_found("Curso no encontrado")).into();
        assert_eq!(envelope.message.as_deref(), Some("Curso no encontrado"));

        let envelope: ResponseEnvelope<u32> = Ok(3).into();
        assert_eq!(envelope, ResponseEnvelope::ok(3));
    }

    #[test]
    fn test_serialized_shape() {
        let envelope = ResponseEnvelope::ok_with_message(vec![1, 2], "Inscripción exitosa");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"success": true, "data": [1, 2], "message": "Inscripción exitosa"})
        );
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ResponseEnvelope::ok(5).into_result(), Ok(5));
        assert_eq!(
            ResponseEnvelope::<u8>::fail("no").into_result(),
            Err("no".to_string())
        );
    }
}
