//! # Comandos Básicos
//! src/commands/basic.rs
//!
//! - GET  /hello: Saludo fijo
//! - POST /echo: Devuelve el JSON recibido
//! - GET  /users/<id>: Usuario ficticio con el id del path
//! - GET  /items: Lista fija de items

use crate::dispatch::RequestContext;
use crate::error::Result;
use crate::router::{PathParams, QueryParams, Reply, Router};
use serde_json::{json, Value};

/// Handler para GET /hello
///
/// # Ejemplo de response
/// ```json
/// {"message": "Hello, world!"}
/// ```
pub fn hello_handler(_ctx: &mut RequestContext<'_>, _query: &QueryParams, _params: &PathParams) -> Result<Reply> {
    Ok(Reply::new(json!({"message": "Hello, world!"})))
}

/// Handler para POST /echo
///
/// Lee exactamente `Content-Length` bytes y los parsea como JSON. Un body
/// que no es JSON responde 400; sin `Content-Length`, 411.
///
/// # Ejemplo de response
/// ```json
/// {"received": {"x": 1}}
/// ```
pub fn echo_handler(ctx: &mut RequestContext<'_>, _query: &QueryParams, _params: &PathParams) -> Result<Reply> {
    let received: Value = ctx.body_json()?;
    Ok(Reply::new(json!({ "received": received })))
}

/// Handler para GET /users/<id>
///
/// El id se usa tal cual llega, sin convertirlo a número.
pub fn user_handler(_ctx: &mut RequestContext<'_>, _query: &QueryParams, params: &PathParams) -> Result<Reply> {
    let user_id = params.get("id").unwrap_or_default();
    Ok(Reply::new(json!({
        "user": {
            "id": user_id,
            "name": format!("User {}", user_id),
        }
    })))
}

/// Handler para GET /items
pub fn items_handler(_ctx: &mut RequestContext<'_>, _query: &QueryParams, _params: &PathParams) -> Result<Reply> {
    Ok(Reply::new(json!({"items": ["apple", "banana", "cherry"]})))
}

/// Registra las rutas de demostración en orden
///
/// Un template inválido se reporta como `Error::Compile` y aborta el arranque.
pub fn register_demo_routes(router: &mut Router) -> Result<()> {
    router
        .get("/hello", hello_handler)?
        .post("/echo", echo_handler)?
        .get("/users/<id>", user_handler)?
        .get("/items", items_handler)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Headers;
    use crate::router::Method;

    fn call(
        handler: fn(&mut RequestContext<'_>, &QueryParams, &PathParams) -> Result<Reply>,
        params: &PathParams,
        headers: &Headers,
        body: &[u8],
    ) -> Result<Reply> {
        let mut reader = body;
        let mut ctx = RequestContext::new(Method::Get, "/", headers, &mut reader, 1024);
        handler(&mut ctx, &QueryParams::new(), params)
    }

    #[test]
    fn test_hello_handler() {
        let reply = call(hello_handler, &PathParams::new(), &Headers::new(), b"").unwrap();
        assert_eq!(reply.body(), &json!({"message": "Hello, world!"}));
    }

    #[test]
    fn test_echo_handler() {
        let mut headers = Headers::new();
        headers.insert("Content-Length", "13");
        let reply = call(echo_handler, &PathParams::new(), &headers, br#"{"a":[1,2,3]}"#).unwrap();

        assert_eq!(reply.body(), &json!({"received": {"a": [1, 2, 3]}}));
    }

    #[test]
    fn test_echo_handler_requires_length() {
        let result = call(echo_handler, &PathParams::new(), &Headers::new(), b"{}");
        assert!(matches!(result, Err(crate::Error::LengthRequired)));
    }

    #[test]
    fn test_user_handler_keeps_id_as_string() {
        let mut params = PathParams::new();
        params.insert("id".to_string(), "042".to_string());
        let reply = call(user_handler, &params, &Headers::new(), b"").unwrap();

        assert_eq!(reply.body(), &json!({"user": {"id": "042", "name": "User 042"}}));
    }

    #[test]
    fn test_items_handler() {
        let reply = call(items_handler, &PathParams::new(), &Headers::new(), b"").unwrap();
        assert_eq!(reply.body()["items"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_register_demo_routes() {
        let mut router = Router::new();
        register_demo_routes(&mut router).unwrap();

        assert_eq!(router.len(), 4);
        assert!(router.lookup(Method::Post, "/echo").is_some());
        assert!(router.lookup(Method::Get, "/users/7").is_some());
    }

    #[test]
    fn test_invalid_template_aborts_startup() {
        fn register_all(router: &mut Router) -> Result<()> {
            register_demo_routes(router)?;
            router.get("/broken/<>", hello_handler)?;
            Ok(())
        }

        let err = register_all(&mut Router::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Compile(crate::CompileError::EmptyParam { .. })
        ));
    }
}
