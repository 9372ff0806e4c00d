//! # Módulo HTTP
//!
//! Piezas de protocolo que usa el router, implementadas sin frameworks:
//!
//! - Parsing de la cabecera de un request HTTP/1.0 o HTTP/1.1
//! - Construcción de responses JSON
//! - Códigos de estado
//!
//! No hay chunked transfer encoding ni streaming: el body de un request se
//! delimita siempre con `Content-Length` y el de una respuesta se calcula
//! completo antes de escribirse.

pub mod request;   // Parsing de la cabecera del request
pub mod response;  // Construcción de responses JSON
pub mod status;    // Códigos de estado HTTP

pub use request::{Headers, ParseError, RequestHead};
pub use response::Response;
pub use status::StatusCode;
