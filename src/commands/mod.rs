//! # Handlers de Demostración
//!
//! Handlers de ejemplo que registra el binario `rester`. No son parte del
//! router en sí: muestran cómo una aplicación usa la API de registro.
//!
//! Cada handler es una función `(contexto, query, path params) -> Reply`.

pub mod basic;

pub use basic::*;
