//! # Manejo de Errores
//! src/error.rs
//!
//! Tipos de error centralizados del router. Hay dos familias:
//!
//! - Errores de configuración ([`CompileError`], `Bind`, `InvalidConfig`):
//!   abortan el arranque antes de servir.
//! - Errores de runtime: se capturan en el dispatcher y se convierten en
//!   una respuesta `{"error": "..."}` con su status correspondiente.

use crate::http::StatusCode;
use thiserror::Error;

/// Alias de `Result` para las operaciones del crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error al compilar un path template (ej: `/users/<id>`)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// El template no empieza con `/`
    #[error("template {template:?} must start with '/'")]
    MissingLeadingSlash { template: String },

    /// `<>` sin nombre
    #[error("template {template:?} has an empty parameter name")]
    EmptyParam { template: String },

    /// El mismo nombre aparece dos veces
    #[error("template {template:?} repeats parameter <{name}>")]
    DuplicateParam { template: String, name: String },

    /// Segmento que no es literal ni `<name>` válido
    #[error("template {template:?} has an unparsable segment {segment:?}")]
    InvalidSegment { template: String, segment: String },

    /// El regex generado no compiló
    #[error("template {template:?} produced an invalid pattern: {reason}")]
    Regex { template: String, reason: String },
}

/// Errores del router y del servidor
#[derive(Error, Debug)]
pub enum Error {
    /// Template inválido al registrar una ruta
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Ninguna ruta coincide con método + path
    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// Método fuera de GET/POST/PUT/DELETE
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Request mal formado (escapes, Content-Length, JSON inválido...)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// El cliente dejó de enviar el body antes de completar `Content-Length`
    #[error("Timed out waiting for request body ({received} of {expected} bytes)")]
    RequestTimeout { expected: u64, received: u64 },

    /// Se pidió el body pero no hay `Content-Length`
    #[error("Content-Length required")]
    LengthRequired,

    /// Body más grande que el límite configurado
    #[error("Payload too large: limit={limit} bytes, declared={actual} bytes")]
    PayloadTooLarge { limit: u64, actual: u64 },

    /// Falla reportada por el handler de la aplicación
    #[error("Handler failed: {0}")]
    Handler(String),

    /// Error de serialización JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No se pudo hacer bind a la dirección
    #[error("Failed to bind server to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Valores de configuración inválidos
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error de IO genérico
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Atajo para que los handlers reporten una falla propia
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }

    /// Status HTTP con el que se responde este error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound { .. } => StatusCode::NotFound,
            Error::UnsupportedMethod(_) => StatusCode::NotImplemented,
            Error::MalformedRequest(_) => StatusCode::BadRequest,
            Error::RequestTimeout { .. } => StatusCode::RequestTimeout,
            Error::LengthRequired => StatusCode::LengthRequired,
            Error::PayloadTooLarge { .. } => StatusCode::PayloadTooLarge,
            Error::Compile(_)
            | Error::Handler(_)
            | Error::Json(_)
            | Error::Bind { .. }
            | Error::InvalidConfig(_)
            | Error::Io(_) => StatusCode::InternalServerError,
        }
    }

    /// Mensaje que ve el cliente en `{"error": ...}`
    ///
    /// Los errores 5xx no exponen detalles internos.
    pub fn client_message(&self) -> String {
        match self {
            Error::RouteNotFound { .. } => "Route not found".to_string(),
            Error::UnsupportedMethod(_)
            | Error::MalformedRequest(_)
            | Error::RequestTimeout { .. }
            | Error::LengthRequired
            | Error::PayloadTooLarge { .. } => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_message() {
        let err = Error::RouteNotFound {
            method: "GET".to_string(),
            path: "/unknown".to_string(),
        };
        assert_eq!(err.status(), StatusCode::NotFound);
        assert_eq!(err.client_message(), "Route not found");
        assert!(err.to_string().contains("/unknown"));
    }

    #[test]
    fn test_client_errors_keep_detail() {
        let err = Error::MalformedRequest("bad escape".to_string());
        assert_eq!(err.status(), StatusCode::BadRequest);
        assert!(err.client_message().contains("bad escape"));

        let err = Error::PayloadTooLarge { limit: 10, actual: 20 };
        assert_eq!(err.status(), StatusCode::PayloadTooLarge);
        assert!(err.client_message().contains("limit=10"));
    }

    #[test]
    fn test_request_timeout_is_client_error() {
        let err = Error::RequestTimeout { expected: 20, received: 7 };
        assert_eq!(err.status(), StatusCode::RequestTimeout);
        assert!(err.status().is_client_error());
        assert!(err.client_message().contains("7 of 20"));
    }

    #[test]
    fn test_handler_failure_hides_detail() {
        let err = Error::handler("database password is hunter2");
        assert_eq!(err.status(), StatusCode::InternalServerError);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_bind_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = Error::Bind {
            address: "0.0.0.0:8080".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("0.0.0.0:8080"));
    }

    #[test]
    fn test_compile_error_is_transparent() {
        let err: Error = CompileError::EmptyParam {
            template: "/a/<>".to_string(),
        }
        .into();
        assert!(err.to_string().contains("empty parameter name"));
    }
}
