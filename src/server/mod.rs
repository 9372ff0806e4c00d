//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en `host:port`
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee la cabecera de cada request y entrega el body limitado
//! 4. Despacha con el `Dispatcher` y escribe la respuesta JSON

pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::Server;
