//! # Construcción de Respuestas HTTP
//!
//! Toda respuesta del router es JSON: el valor retornado por el handler
//! (status 200 salvo que el handler diga otra cosa) o un error
//! `{"error": "mensaje"}` con status no-2xx.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 27\r\n
//! \r\n
//! {"message":"Hello, world!"}
//! ```
//!
//! Los headers se calculan completos antes de escribir el primer byte del
//! body; [`Response::write_to`] emite la respuesta en un solo `write_all`.

use super::StatusCode;
use crate::router::Reply;
use serde_json::json;
use std::io::Write;

/// Respuesta HTTP lista para serializarse
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en orden de inserción; un nombre repetido reemplaza al anterior
    headers: Vec<(String, String)>,

    /// Body JSON ya serializado
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta vacía con el status indicado
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (versión builder)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega o reemplaza un header
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// Serializa un valor JSON como respuesta
    ///
    /// # Ejemplo
    /// ```
    /// use rester::http::{Response, StatusCode};
    /// use serde_json::json;
    ///
    /// let response = Response::json(StatusCode::Ok, &json!({"items": ["apple"]}));
    /// assert_eq!(response.body(), br#"{"items":["apple"]}"#);
    /// ```
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        // Serializar un Value a memoria no falla: las claves ya son strings
        let body = serde_json::to_vec(value).unwrap_or_else(|_| b"null".to_vec());
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body_bytes(body)
    }

    /// Respuesta de éxito a partir de lo que retornó un handler
    pub fn from_reply(reply: Reply) -> Self {
        Self::json(reply.status(), reply.body())
    }

    /// Respuesta de error con cuerpo `{"error": "mensaje"}`
    ///
    /// El mensaje se escapa correctamente (comillas, saltos de línea...).
    ///
    /// # Ejemplo
    /// ```
    /// use rester::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Route not found");
    /// assert_eq!(response.body(), br#"{"error":"Route not found"}"#);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    /// Convierte un error del crate en su respuesta JSON
    pub fn from_error(err: &crate::Error) -> Self {
        Self::error(err.status(), &err.client_message())
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Name: Value\r\n`
    /// - Línea vacía
    /// - Body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        if self.header("Content-Length").is_none() {
            result.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    /// Escribe la respuesta completa en el stream
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene un header por nombre, ignorando mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
