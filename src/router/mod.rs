//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla de rutas ordenada y append-only. Cada entrada es
//! `(Method, CompiledPattern, Handler)`.
//!
//! ## Arquitectura
//!
//! ```text
//! register("GET", "/users/<id>", handler)
//!        │
//!        ▼
//! CompiledPattern::compile  →  Route  →  Router.routes.push(..)
//!
//! lookup(GET, "/users/42")  →  primera ruta que coincida  →  (Route, {id: "42"})
//! ```
//!
//! ## Precedencia
//!
//! La búsqueda recorre las rutas **en orden de registro** y retorna la
//! primera que coincide. Si dos templates pueden coincidir con el mismo
//! path, gana el que se registró primero. Por eso las rutas específicas
//! van antes que las generales:
//!
//! ```
//! use rester::router::{Method, Reply, Router};
//! use serde_json::json;
//!
//! let mut router = Router::new();
//! router.get("/items/featured", |_, _, _| Ok(Reply::new(json!("featured")))).unwrap();
//! router.get("/items/<id>", |_, _, p| Ok(Reply::new(json!(p.get("id"))))).unwrap();
//!
//! let (route, _) = router.lookup(Method::Get, "/items/featured").unwrap();
//! assert_eq!(route.template(), "/items/featured");
//! ```
//!
//! Registrando `/items/<id>` primero, `/items/featured` sería inalcanzable.
//!
//! ## Sellado
//!
//! El `Router` solo se muta con `&mut self`. Al construir el `Server` se
//! mueve adentro de un `Arc` y a partir de ahí solo hay acceso de lectura:
//! no se pueden registrar rutas mientras se sirve tráfico.

pub mod params;
pub mod pattern;

pub use params::{PathParams, QueryParams};
pub use pattern::CompiledPattern;

use crate::dispatch::RequestContext;
use crate::error::{CompileError, Error, Result};
use crate::http::StatusCode;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Métodos HTTP que pueden registrarse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parsea un método; es case-sensitive como exige HTTP
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(Error::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lo que retorna un handler exitoso: un valor JSON y su status
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: StatusCode,
    body: serde_json::Value,
}

impl Reply {
    /// Respuesta 200 con el valor dado
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            status: StatusCode::Ok,
            body,
        }
    }

    /// Serializa cualquier valor `Serialize` como respuesta 200
    ///
    /// Un valor que no se puede representar como JSON (ej: un map con keys
    /// no-string) es una falla del handler.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Cambia el status de la respuesta
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }
}

impl From<serde_json::Value> for Reply {
    fn from(body: serde_json::Value) -> Self {
        Self::new(body)
    }
}

/// Capacidad de handler: `(contexto, query, path params) -> JSON | error`
///
/// Cualquier closure o función con esa firma implementa el trait.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        ctx: &mut RequestContext<'_>,
        query: &QueryParams,
        params: &PathParams,
    ) -> Result<Reply>;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply>
        + Send
        + Sync
        + 'static,
{
    fn call(
        &self,
        ctx: &mut RequestContext<'_>,
        query: &QueryParams,
        params: &PathParams,
    ) -> Result<Reply> {
        self(ctx, query, params)
    }
}

/// Entrada inmutable de la tabla de rutas
pub struct Route {
    method: Method,
    pattern: CompiledPattern,
    handler: Box<dyn Handler>,
}

impl Route {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .finish()
    }
}

/// Tabla de rutas ordenada
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compila el template y agrega la ruta al final de la tabla
    ///
    /// # Errores
    ///
    /// `CompileError` si el template es inválido. Es un error de arranque:
    /// nunca llega a un cliente.
    pub fn register<F>(
        &mut self,
        method: Method,
        template: &str,
        handler: F,
    ) -> std::result::Result<&mut Self, CompileError>
    where
        F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(method, template, handler)
    }

    /// Igual que [`Router::register`] pero para tipos que implementan
    /// [`Handler`] directamente
    pub fn register_handler<H: Handler>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
    ) -> std::result::Result<&mut Self, CompileError> {
        let pattern = CompiledPattern::compile(template)?;
        tracing::debug!(%method, template, index = self.routes.len(), "route registered");

        self.routes.push(Route {
            method,
            pattern,
            handler: Box::new(handler),
        });
        Ok(self)
    }

    pub fn get<F>(&mut self, template: &str, handler: F) -> std::result::Result<&mut Self, CompileError>
    where
        F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply> + Send + Sync + 'static,
    {
        self.register(Method::Get, template, handler)
    }

    pub fn post<F>(&mut self, template: &str, handler: F) -> std::result::Result<&mut Self, CompileError>
    where
        F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply> + Send + Sync + 'static,
    {
        self.register(Method::Post, template, handler)
    }

    pub fn put<F>(&mut self, template: &str, handler: F) -> std::result::Result<&mut Self, CompileError>
    where
        F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply> + Send + Sync + 'static,
    {
        self.register(Method::Put, template, handler)
    }

    pub fn delete<F>(&mut self, template: &str, handler: F) -> std::result::Result<&mut Self, CompileError>
    where
        F: Fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply> + Send + Sync + 'static,
    {
        self.register(Method::Delete, template, handler)
    }

    /// Busca la primera ruta que coincide con método + path
    ///
    /// `path` ya debe venir sin query y decodificado con
    /// [`params::decode_path`] (un `%2F` sigue siendo parte de su segmento).
    pub fn lookup(&self, method: Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .filter(|route| route.method == method)
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    /// Rutas en orden de registro
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
