//! # Despacho de Requests
//! src/dispatch.rs
//!
//! Un ciclo de dispatch por request:
//!
//! ```text
//! (método, target, headers, body)
//!    │
//!    ├─ 1. separar path y query, decodificar percent-escapes por segmento
//!    ├─ 2. parsear QueryParams (keys repetidas conservan todos los valores)
//!    ├─ 3. Router::lookup(método, path)  ── sin match ──► 404 {"error": "Route not found"}
//!    ├─ 4. invocar el handler con (RequestContext, QueryParams, PathParams)
//!    └─ 5. Ok(valor) ──► 200 JSON  |  Err / panic ──► 4xx/5xx JSON
//! ```
//!
//! Ningún error de runtime escapa de [`Dispatcher::dispatch`]: siempre
//! retorna una [`Response`] completa. Un handler que falla o hace panic
//! afecta solo a su propio request; la tabla de rutas es de solo lectura.

use crate::error::{Error, Result};
use crate::http::{Headers, Response};
use crate::router::params::{decode_component, decode_path};
use crate::router::{Method, PathParams, QueryParams, Reply, Router};
use serde::de::DeserializeOwned;
use std::io::{ErrorKind, Read};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Límite por defecto para el body de un request (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Lo que el handler puede ver del request además de los parámetros
pub struct RequestContext<'a> {
    method: Method,
    path: &'a str,
    headers: &'a Headers,
    body: &'a mut dyn Read,
    max_body_bytes: u64,
    body_cache: Option<Vec<u8>>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        method: Method,
        path: &'a str,
        headers: &'a Headers,
        body: &'a mut dyn Read,
        max_body_bytes: u64,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            body,
            max_body_bytes,
            body_cache: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path ya decodificado, sin query
    pub fn path(&self) -> &str {
        self.path
    }

    pub fn headers(&self) -> &Headers {
        self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Lee el body completo, exactamente `Content-Length` bytes
    ///
    /// Se puede llamar varias veces; el socket se lee una sola vez.
    ///
    /// # Errores
    ///
    /// - `LengthRequired` si no hay `Content-Length`
    /// - `MalformedRequest` si el header no es un entero o el cliente manda
    ///   menos bytes de los declarados
    /// - `PayloadTooLarge` si supera el límite configurado
    /// - `RequestTimeout` si el socket vence esperando el resto del body
    pub fn body(&mut self) -> Result<&[u8]> {
        if self.body_cache.is_none() {
            let bytes = self.read_body()?;
            self.body_cache = Some(bytes);
        }
        Ok(self.body_cache.as_deref().unwrap_or_default())
    }

    /// Lee el body y lo deserializa como JSON
    ///
    /// Un JSON inválido es `MalformedRequest` (400), no una falla del handler.
    pub fn body_json<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.body()?;
        serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedRequest(format!("invalid JSON body: {}", e)))
    }

    fn read_body(&mut self) -> Result<Vec<u8>> {
        let length = self.headers.content_length()?.ok_or(Error::LengthRequired)?;

        if length > self.max_body_bytes {
            return Err(Error::PayloadTooLarge {
                limit: self.max_body_bytes,
                actual: length,
            });
        }

        let mut buffer = vec![0u8; length as usize];
        let mut received = 0;
        while received < buffer.len() {
            match self.body.read(&mut buffer[received..]) {
                Ok(0) => {
                    return Err(Error::MalformedRequest(format!(
                        "body shorter than Content-Length ({} bytes)",
                        length
                    )))
                }
                Ok(n) => received += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // Timeout del socket: el cliente dejó de mandar a mitad del body
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(Error::RequestTimeout {
                        expected: length,
                        received: received as u64,
                    })
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(buffer)
    }
}

/// Despachador: resuelve la ruta, invoca el handler y arma la respuesta
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    max_body_bytes: u64,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Cambia el límite de tamaño del body
    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Procesa un request y siempre retorna una respuesta JSON
    ///
    /// # Ejemplo
    /// ```
    /// use rester::dispatch::Dispatcher;
    /// use rester::http::{Headers, StatusCode};
    /// use rester::router::{Reply, Router};
    /// use serde_json::json;
    /// use std::sync::Arc;
    ///
    /// let mut router = Router::new();
    /// router.get("/hello", |_, _, _| Ok(Reply::new(json!({"message": "Hello, world!"})))).unwrap();
    /// let dispatcher = Dispatcher::new(Arc::new(router));
    ///
    /// let response = dispatcher.dispatch("GET", "/hello", &Headers::new(), &mut std::io::empty());
    /// assert_eq!(response.status(), StatusCode::Ok);
    ///
    /// let response = dispatcher.dispatch("POST", "/hello", &Headers::new(), &mut std::io::empty());
    /// assert_eq!(response.status(), StatusCode::NotFound);
    /// ```
    pub fn dispatch(
        &self,
        method: &str,
        target: &str,
        headers: &Headers,
        body: &mut dyn Read,
    ) -> Response {
        match self.try_dispatch(method, target, headers, body) {
            Ok(reply) => Response::from_reply(reply),
            Err(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!(method, target, status = status.as_u16(), error = %err, "request failed");
                } else {
                    tracing::debug!(method, target, status = status.as_u16(), error = %err, "request rejected");
                }
                Response::from_error(&err)
            }
        }
    }

    fn try_dispatch(
        &self,
        method: &str,
        target: &str,
        headers: &Headers,
        body: &mut dyn Read,
    ) -> Result<Reply> {
        let method: Method = method.parse()?;

        let (raw_path, raw_query) = split_target(target);
        let match_path = decode_path(raw_path)?;
        let path = decode_component(raw_path, false)?;
        let query = QueryParams::parse(raw_query)?;

        let (route, params) = self
            .router
            .lookup(method, &match_path)
            .ok_or_else(|| Error::RouteNotFound {
                method: method.to_string(),
                path: path.clone(),
            })?;

        tracing::trace!(%method, path = %path, template = route.template(), "route matched");

        let mut ctx = RequestContext::new(method, &path, headers, body, self.max_body_bytes);
        invoke(route.handler(), &mut ctx, &query, &params)
    }
}

/// Invoca el handler convirtiendo un panic en `Error::Handler`
fn invoke(
    handler: &dyn crate::router::Handler,
    ctx: &mut RequestContext<'_>,
    query: &QueryParams,
    params: &PathParams,
) -> Result<Reply> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.call(ctx, query, params))).unwrap_or_else(
        |payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(Error::Handler(format!("handler panicked: {}", detail)))
        },
    )
}

/// Separa `/path?query#fragment` en `("/path", "query")`
fn split_target(target: &str) -> (&str, &str) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    target.split_once('?').unwrap_or((target, ""))
}
