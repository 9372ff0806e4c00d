//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Este módulo parsea la cabecera (request line + headers) de un request.
//! El body NO se lee aquí: el servidor lo entrega al dispatcher como un
//! reader limitado a `Content-Length` bytes.
//!
//! ## Formato
//!
//! ```text
//! POST /echo?debug=1 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 7\r\n
//! \r\n
//! {"x":1}
//! ```
//!
//! El target (`/echo?debug=1`) se guarda crudo; separar path y query y
//! decodificar percent-escapes es trabajo del dispatcher.

use std::io::{BufRead, Read};
use thiserror::Error;

/// Headers HTTP en orden de llegada, con búsqueda case-insensitive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un header (se permiten nombres repetidos)
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Obtiene el primer valor de un header, ignorando mayúsculas
    ///
    /// # Ejemplo
    /// ```
    /// use rester::http::Headers;
    ///
    /// let mut headers = Headers::new();
    /// headers.insert("Content-Type", "application/json");
    /// assert_eq!(headers.get("content-type"), Some("application/json"));
    /// ```
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Todos los valores de un header, en orden de llegada
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Valor de `Content-Length`
    ///
    /// * `Ok(None)` - El header no está presente
    /// * `Ok(Some(n))` - Longitud declarada
    /// * `Err(_)` - El valor no son solo dígitos, o hay varios headers
    ///   `Content-Length` con valores distintos
    pub fn content_length(&self) -> crate::Result<Option<u64>> {
        let mut declared: Option<u64> = None;

        for raw in self.get_all("Content-Length") {
            let value = raw.trim();
            let length = value
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| value.parse::<u64>().ok())
                .flatten()
                .ok_or_else(|| {
                    crate::Error::MalformedRequest(format!("invalid Content-Length: {:?}", raw))
                })?;

            match declared {
                Some(previous) if previous != length => {
                    return Err(crate::Error::MalformedRequest(format!(
                        "conflicting Content-Length values: {} and {}",
                        previous, length
                    )));
                }
                _ => declared = Some(length),
            }
        }

        Ok(declared)
    }
}

/// Errores que pueden ocurrir leyendo la cabecera del request
#[derive(Debug, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// La conexión se cerró antes de la línea vacía final
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Versión HTTP distinta de 1.0 / 1.1
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header sin `:`
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// La cabecera supera el límite configurado
    #[error("Request header larger than {limit} bytes")]
    HeaderTooLarge { limit: usize },

    /// Error leyendo del socket
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cabecera de un request HTTP ya parseada
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Método tal cual llegó (se valida en el dispatcher)
    method: String,

    /// Target crudo: path + query opcional
    target: String,

    /// "HTTP/1.0" o "HTTP/1.1"
    version: String,

    headers: Headers,
}

impl RequestHead {
    /// Parsea una cabecera completa desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use rester::http::RequestHead;
    ///
    /// let raw = b"GET /users/42?verbose=1 HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let head = RequestHead::parse(raw).unwrap();
    ///
    /// assert_eq!(head.method(), "GET");
    /// assert_eq!(head.target(), "/users/42?verbose=1");
    /// assert_eq!(head.headers().get("host"), Some("localhost"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(buffer).map_err(|_| ParseError::InvalidRequestLine)?;

        if text.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = text.split("\r\n").map(|l| l.trim_end_matches('\n'));
        let request_line = lines.next().ok_or(ParseError::IncompleteRequest)?;
        let (method, target, version) = Self::parse_request_line(request_line)?;

        let mut headers = Headers::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => {
                    headers.insert(name.trim(), value.trim());
                }
                _ => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(RequestHead {
            method,
            target,
            version,
            headers,
        })
    }

    /// Lee una cabecera desde un stream, línea por línea, hasta `\r\n\r\n`
    ///
    /// Retorna `Ok(None)` si el peer cerró la conexión antes de mandar
    /// cualquier byte (fin normal de una conexión keep-alive).
    pub fn read_from<R: BufRead>(reader: &mut R, limit: usize) -> Result<Option<Self>, ParseError> {
        let mut buffer = Vec::new();

        loop {
            let remaining = (limit + 1).saturating_sub(buffer.len()) as u64;
            let start = buffer.len();
            let read = reader.by_ref().take(remaining).read_until(b'\n', &mut buffer)?;

            if read == 0 {
                if buffer.iter().all(|b| b.is_ascii_whitespace()) {
                    return Ok(None);
                }
                return Err(ParseError::IncompleteRequest);
            }
            if buffer.len() > limit {
                return Err(ParseError::HeaderTooLarge { limit });
            }

            let line = &buffer[start..];
            let blank = line == b"\r\n" || line == b"\n";
            if blank {
                // CRLFs sueltos antes de la request line se ignoran
                if buffer[..start].iter().all(|b| b.is_ascii_whitespace()) {
                    buffer.clear();
                    continue;
                }
                break;
            }
            if !line.ends_with(b"\n") {
                return Err(ParseError::IncompleteRequest);
            }
        }

        Self::parse(&buffer).map(Some)
    }

    /// Parsea la request line: `METHOD TARGET VERSION`
    fn parse_request_line(line: &str) -> Result<(String, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((parts[0].to_string(), parts[1].to_string(), version))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Indica si la conexión puede reutilizarse después de responder
    ///
    /// HTTP/1.1 es persistente salvo `Connection: close`; HTTP/1.0 solo si
    /// el cliente pide `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        let connection = self.headers.get("Connection").map(str::to_ascii_lowercase);
        match self.version.as_str() {
            "HTTP/1.1" => connection.as_deref() != Some("close"),
            _ => connection.as_deref() == Some("keep-alive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn test_parse_simple_get() {
        let raw = b"GET / HTTP/1.0\r\n\r\n";
        let head = RequestHead::parse(raw).unwrap();

        assert_eq!(head.method(), "GET");
        assert_eq!(head.target(), "/");
        assert_eq!(head.version(), "HTTP/1.0");
        assert!(head.headers().is_empty());
    }

    #[test]
    fn test_parse_keeps_raw_target() {
        let raw = b"GET /items?tag=a&tag=b HTTP/1.1\r\n\r\n";
        let head = RequestHead::parse(raw).unwrap();

        assert_eq!(head.target(), "/items?tag=a&tag=b");
    }

    #[test]
    fn test_parse_with_headers() {
        let raw = b"POST /echo HTTP/1.1\r\nHost: localhost:8080\r\nContent-Length: 7\r\n\r\n";
        let head = RequestHead::parse(raw).unwrap();

        assert_eq!(head.headers().get("HOST"), Some("localhost:8080"));
        assert_eq!(head.headers().content_length().unwrap(), Some(7));
    }

    #[test]
    fn test_content_length_missing_and_malformed() {
        let mut headers = Headers::new();
        assert_eq!(headers.content_length().unwrap(), None);

        headers.insert("Content-Length", "seven");
        assert!(matches!(
            headers.content_length(),
            Err(crate::Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_content_length_digits_only() {
        for raw in ["+7", "-0", " ", "0x10", "7 7", "1_000"] {
            let mut headers = Headers::new();
            headers.insert("Content-Length", raw);
            assert!(
                matches!(headers.content_length(), Err(crate::Error::MalformedRequest(_))),
                "{:?} should be rejected",
                raw
            );
        }

        let mut headers = Headers::new();
        headers.insert("Content-Length", " 007 ");
        assert_eq!(headers.content_length().unwrap(), Some(7));
    }

    #[test]
    fn test_content_length_duplicates() {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "5");
        headers.insert("content-length", "5");
        assert_eq!(headers.content_length().unwrap(), Some(5));

        headers.insert("CONTENT-LENGTH", "7");
        assert!(matches!(
            headers.content_length(),
            Err(crate::Error::MalformedRequest(_))
        ));
        assert_eq!(headers.get_all("content-length").count(), 3);
    }

    #[test]
    fn test_invalid_version() {
        let raw = b"GET / HTTP/2.0\r\n\r\n";
        let result = RequestHead::parse(raw);

        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(RequestHead::parse(b""), Err(ParseError::EmptyRequest)));
    }

    #[test]
    fn test_invalid_request_line() {
        let raw = b"GET\r\n\r\n";
        assert!(matches!(
            RequestHead::parse(raw),
            Err(ParseError::InvalidRequestLine)
        ));
    }

    #[test]
    fn test_invalid_header() {
        let raw = b"GET / HTTP/1.1\r\nNoColonHere\r\n\r\n";
        assert!(matches!(
            RequestHead::parse(raw),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_read_from_stops_at_blank_line() {
        let raw: &[u8] = b"POST /echo HTTP/1.1\r\nContent-Length: 7\r\n\r\n{\"x\":1}";
        let mut reader = BufReader::new(raw);

        let head = RequestHead::read_from(&mut reader, 8192).unwrap().unwrap();
        assert_eq!(head.target(), "/echo");

        let mut body = String::new();
        reader.read_to_string(&mut body).unwrap();
        assert_eq!(body, "{\"x\":1}");
    }

    #[test]
    fn test_read_from_eof_is_none() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(RequestHead::read_from(&mut reader, 8192).unwrap().is_none());
    }

    #[test]
    fn test_read_from_truncated() {
        let mut reader = BufReader::new(&b"GET / HTTP/1.1\r\nHost: x"[..]);
        assert!(matches!(
            RequestHead::read_from(&mut reader, 8192),
            Err(ParseError::IncompleteRequest)
        ));
    }

    #[test]
    fn test_read_from_header_too_large() {
        let raw = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "a".repeat(200));
        let mut reader = BufReader::new(raw.as_bytes());
        assert!(matches!(
            RequestHead::read_from(&mut reader, 64),
            Err(ParseError::HeaderTooLarge { limit: 64 })
        ));
    }

    #[test]
    fn test_keep_alive_rules() {
        let head = RequestHead::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(head.keep_alive());

        let head = RequestHead::parse(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!head.keep_alive());

        let head = RequestHead::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(!head.keep_alive());

        let head =
            RequestHead::parse(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n").unwrap();
        assert!(head.keep_alive());
    }
}
