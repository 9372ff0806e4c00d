//! # RESTer
//! src/lib.rs
//!
//! Router HTTP mínimo: registra rutas `método + template` (con segmentos
//! dinámicos como `/users/<id>`), despacha cada request a la primera ruta
//! que coincide y serializa lo que retorna el handler como JSON.
//!
//! ## Arquitectura
//!
//! - `router`: compilación de templates, tabla de rutas, parámetros
//! - `dispatch`: un ciclo request → handler → respuesta
//! - `http`: parsing de la cabecera, responses JSON, status codes
//! - `server`: listener TCP, un thread por conexión
//! - `config`: configuración CLI / variables de entorno
//! - `commands`: handlers de demostración
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use rester::config::Config;
//! use rester::router::{Reply, Router};
//! use rester::server::Server;
//! use serde_json::json;
//!
//! let mut router = Router::new();
//! router
//!     .get("/users/<id>", |_ctx, _query, params| {
//!         Ok(Reply::new(json!({"id": params.get("id")})))
//!     })
//!     .expect("valid template");
//!
//! let server = Server::new(Config::default(), router);
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod router;
pub mod server;

pub use error::{CompileError, Error, Result};
