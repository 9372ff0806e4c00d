//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración de arranque con soporte para argumentos CLI y variables de
//! entorno. La tabla de rutas NO es configuración: la registra el código de
//! la aplicación antes de construir el `Server`.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./rester --host 0.0.0.0 --port 8080 --max-body-bytes 65536
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! RESTER_PORT=9000 RESTER_LOG=rester=debug ./rester
//! ```

use crate::dispatch::DEFAULT_MAX_BODY_BYTES;
use crate::error::{Error, Result};
use clap::Parser;
use std::time::Duration;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "rester")]
#[command(about = "Router HTTP mínimo con parámetros de ruta y respuestas JSON")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "localhost", env = "RESTER_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "RESTER_PORT")]
    pub port: u16,

    // === Límites ===

    /// Tamaño máximo del body de un request, en bytes
    #[arg(long = "max-body-bytes", default_value_t = DEFAULT_MAX_BODY_BYTES, env = "RESTER_MAX_BODY_BYTES")]
    pub max_body_bytes: u64,

    /// Tamaño máximo de la cabecera (request line + headers), en bytes
    #[arg(long = "max-header-bytes", default_value = "8192", env = "RESTER_MAX_HEADER_BYTES")]
    pub max_header_bytes: usize,

    /// Timeout de lectura del socket en segundos (0 = sin timeout)
    #[arg(long = "read-timeout-secs", default_value = "30", env = "RESTER_READ_TIMEOUT_SECS")]
    pub read_timeout_secs: u64,

    // === Logging ===

    /// Filtro de logs cuando RUST_LOG no está definido
    #[arg(long = "log-filter", default_value = "rester=info", env = "RESTER_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Crea una configuración parseando argumentos CLI y variables de entorno
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use rester::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "localhost:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de lectura, `None` si está deshabilitado
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("host must not be empty".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::InvalidConfig("max body bytes must be >= 1".to_string()));
        }
        // La request line mínima ("GET / HTTP/1.0\r\n\r\n") ocupa 18 bytes
        if self.max_header_bytes < 64 {
            return Err(Error::InvalidConfig("max header bytes must be >= 64".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_header_bytes: 8192,
            read_timeout_secs: 30,
            log_filter: "rester=info".to_string(),
        }
    }
}
