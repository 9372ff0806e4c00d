//! # Códigos de Estado HTTP
//!
//! Códigos que el router puede emitir. Los handlers pueden elegir cualquiera
//! de ellos con `Reply::with_status`; el resto los asigna el dispatcher:
//!
//! - **2xx**: Éxito (200 por defecto para los handlers)
//! - **4xx**: Error del cliente (400, 404, 408, 411, 413)
//! - **5xx**: Error del servidor (500 para fallas de handler, 501)

/// Códigos de estado HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 201 Created - Recurso creado por el handler
    Created = 201,

    /// 202 Accepted - Petición aceptada para procesarse después
    Accepted = 202,

    /// 400 Bad Request - Request malformado
    BadRequest = 400,

    /// 401 Unauthorized
    Unauthorized = 401,

    /// 403 Forbidden
    Forbidden = 403,

    /// 404 Not Found - Ninguna ruta coincide
    NotFound = 404,

    /// 408 Request Timeout - El cliente dejó de enviar el body
    RequestTimeout = 408,

    /// 409 Conflict
    Conflict = 409,

    /// 411 Length Required - Falta Content-Length para leer el body
    LengthRequired = 411,

    /// 413 Payload Too Large - Body mayor al límite configurado
    PayloadTooLarge = 413,

    /// 422 Unprocessable Entity
    UnprocessableEntity = 422,

    /// 500 Internal Server Error - El handler falló
    InternalServerError = 500,

    /// 501 Not Implemented - Método no soportado
    NotImplemented = 501,

    /// 503 Service Unavailable
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use rester::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el reason phrase asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use rester::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::Conflict => "Conflict",
            StatusCode::LengthRequired => "Length Required",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::UnprocessableEntity => "Unprocessable Entity",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
