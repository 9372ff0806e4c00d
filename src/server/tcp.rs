//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Acepta conexiones y procesa cada una en su propio thread. Dentro de una
//! conexión los requests se atienden de a uno: se lee la cabecera, se
//! despacha, se escribe la respuesta completa y recién ahí se lee el
//! siguiente (keep-alive de HTTP/1.1).
//!
//! Los threads comparten el `Router` a través de un `Arc` de solo lectura.
//! El socket se libera al salir de `handle_connection` por cualquier camino
//! (respuesta, error de parseo, error de IO) porque se destruye con el scope.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::http::{ParseError, RequestHead, Response, StatusCode};
use crate::router::Router;
use std::io::{self, BufReader, ErrorKind, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Servidor HTTP dueño de la tabla de rutas
pub struct Server {
    config: Config,
    worker: Worker,
}

/// Estado que cada thread de conexión necesita; se clona por conexión
#[derive(Debug, Clone)]
struct Worker {
    dispatcher: Dispatcher,
    max_header_bytes: usize,
    max_body_bytes: u64,
    read_timeout: Option<Duration>,
    requests: Arc<AtomicU64>,
}

impl Server {
    /// Crea el servidor. El `Router` se mueve adentro y queda sellado:
    /// a partir de aquí solo se lee.
    pub fn new(config: Config, router: Router) -> Self {
        let dispatcher =
            Dispatcher::new(Arc::new(router)).with_max_body_bytes(config.max_body_bytes);

        let worker = Worker {
            dispatcher,
            max_header_bytes: config.max_header_bytes,
            max_body_bytes: config.max_body_bytes,
            read_timeout: config.read_timeout(),
            requests: Arc::new(AtomicU64::new(0)),
        };

        Self { config, worker }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.worker.dispatcher
    }

    /// Hace bind a `host:port` de la configuración
    pub fn bind(&self) -> Result<TcpListener> {
        let address = self.config.address();
        TcpListener::bind(&address).map_err(|source| Error::Bind { address, source })
    }

    /// Valida la configuración, hace bind y sirve para siempre
    pub fn run(self) -> Result<()> {
        self.config.validate()?;
        let listener = self.bind()?;

        tracing::info!("Starting server on {}:{}", self.config.host, self.config.port);
        self.serve(listener)
    }

    /// Sirve conexiones de un listener ya abierto (un thread por conexión)
    pub fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            address = %local_addr,
            routes = self.worker.dispatcher.router().len(),
            "listening, one thread per connection"
        );
        for route in self.worker.dispatcher.router().routes() {
            tracing::debug!(method = %route.method(), template = route.template(), "route");
        }

        for (connection_id, stream) in listener.incoming().enumerate() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let peer = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::debug!(%peer, connection_id, "connection accepted");

            let worker = self.worker.clone();
            let spawned = thread::Builder::new()
                .name(format!("rester-conn-{}", connection_id))
                .spawn(move || {
                    if let Err(e) = Self::handle_connection(stream, &worker) {
                        tracing::warn!(%peer, error = %e, "connection error");
                    }
                });

            if let Err(e) = spawned {
                tracing::error!(error = %e, "failed to spawn connection thread");
            }
        }

        Ok(())
    }

    /// Atiende todos los requests de una conexión, uno a la vez
    fn handle_connection(stream: TcpStream, worker: &Worker) -> io::Result<()> {
        stream.set_read_timeout(worker.read_timeout)?;
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;

        loop {
            let head = match RequestHead::read_from(&mut reader, worker.max_header_bytes) {
                Ok(Some(head)) => head,
                Ok(None) => return Ok(()),
                Err(ParseError::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("idle connection timed out");
                    return Ok(());
                }
                Err(ParseError::Io(e)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "unparsable request");
                    Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e))
                        .with_header("Connection", "close")
                        .write_to(&mut writer)?;
                    return Ok(());
                }
            };

            let start = Instant::now();
            let request_id = format!("{:016x}", worker.requests.fetch_add(1, Ordering::Relaxed));

            // Sin un Content-Length válido no se puede delimitar el body:
            // el handler ve un body vacío y la conexión se cierra después
            let declared = head.headers().content_length();
            let framed = declared.is_ok() && head.headers().get("Transfer-Encoding").is_none();
            let body_len = declared.ok().flatten().unwrap_or(0);

            let mut body = (&mut reader).take(body_len);
            let mut response =
                worker
                    .dispatcher
                    .dispatch(head.method(), head.target(), head.headers(), &mut body);

            // Descartar lo que el handler no leyó, salvo que sea enorme
            let drained = body.limit() <= worker.max_body_bytes
                && io::copy(&mut body, &mut io::sink()).is_ok()
                && body.limit() == 0;

            let keep_alive = head.keep_alive() && framed && drained;
            response.add_header("Connection", if keep_alive { "keep-alive" } else { "close" });
            response.add_header("X-Request-Id", &request_id);
            response.write_to(&mut writer)?;

            tracing::info!(
                request_id = %request_id,
                method = head.method(),
                target = head.target(),
                status = response.status().as_u16(),
                latency_ms = start.elapsed().as_secs_f64() * 1000.0,
                "request served"
            );

            if !keep_alive {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands;
    use std::io::Write;
    use std::net::Shutdown;

    fn ephemeral_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").expect("bind")
    }

    fn demo_worker() -> Worker {
        let mut router = Router::new();
        commands::register_demo_routes(&mut router).unwrap();
        Server::new(Config::default(), router).worker
    }

    /// Acepta una conexión, la atiende y retorna todo lo que recibió el cliente
    fn roundtrip(raw: &[u8]) -> String {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let worker = demo_worker();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Server::handle_connection(stream, &worker).unwrap();
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_handle_connection_hello() {
        let text = roundtrip(b"GET /hello HTTP/1.0\r\n\r\n");

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("X-Request-Id:"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.ends_with(r#"{"message":"Hello, world!"}"#));
    }

    #[test]
    fn test_handle_connection_echo_body() {
        let text = roundtrip(
            b"POST /echo HTTP/1.1\r\nContent-Length: 7\r\nConnection: close\r\n\r\n{\"x\":1}",
        );

        assert!(text.contains("200 OK"));
        assert!(text.ends_with(r#"{"received":{"x":1}}"#));
    }

    #[test]
    fn test_handle_connection_not_found() {
        let text = roundtrip(b"GET /unknown HTTP/1.0\r\n\r\n");

        assert!(text.contains("404 Not Found"));
        assert!(text.contains("Content-Length: 27\r\n"));
        assert!(text.ends_with(r#"{"error":"Route not found"}"#));
    }

    #[test]
    fn test_handle_connection_parse_error() {
        let text = roundtrip(b"\x00\x01\x02\x03garbage\r\n\r\n");

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("Invalid request"));
    }

    #[test]
    fn test_handle_connection_keep_alive() {
        let text = roundtrip(
            b"GET /hello HTTP/1.1\r\n\r\n\
              POST /echo HTTP/1.1\r\nContent-Length: 2\r\n\r\n[]\
              GET /items HTTP/1.1\r\nConnection: close\r\n\r\n",
        );

        assert_eq!(text.matches("HTTP/1.1 200 OK").count(), 3);
        assert!(text.contains(r#"{"received":[]}"#));
        assert!(text.ends_with(r#"{"items":["apple","banana","cherry"]}"#));
    }

    #[test]
    fn test_unread_body_is_drained() {
        // /hello no lee el body; el segundo request debe parsearse igual
        let text = roundtrip(
            b"GET /hello HTTP/1.1\r\nContent-Length: 5\r\n\r\nxxxxx\
              GET /users/9 HTTP/1.1\r\nConnection: close\r\n\r\n",
        );

        assert_eq!(text.matches("200 OK").count(), 2);
        assert!(text.contains(r#""name":"User 9""#));
    }

    #[test]
    fn test_bad_content_length_closes_connection() {
        let text = roundtrip(
            b"POST /echo HTTP/1.1\r\nContent-Length: abc\r\n\r\n{}\
              GET /hello HTTP/1.1\r\n\r\n",
        );

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("Connection: close"));
        assert_eq!(text.matches("HTTP/1.1 ").count(), 1);
    }

    #[test]
    fn test_conflicting_content_length_closes_connection() {
        let text = roundtrip(
            b"POST /echo HTTP/1.1\r\nContent-Length: 2\r\nContent-Length: 9\r\n\r\n[]\
              GET /hello HTTP/1.1\r\n\r\n",
        );

        assert!(text.contains("400 Bad Request"));
        assert!(text.contains("conflicting Content-Length"));
        assert!(text.contains("Connection: close"));
        assert_eq!(text.matches("HTTP/1.1 ").count(), 1);
    }

    #[test]
    fn test_stalled_body_gets_408_and_closes() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();

        let mut router = Router::new();
        commands::register_demo_routes(&mut router).unwrap();
        let mut config = Config::default();
        config.read_timeout_secs = 1;
        let worker = Server::new(config, router).worker;

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Server::handle_connection(stream, &worker).unwrap();
        });

        // Declara 20 bytes, manda 7 y deja el socket abierto
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        client
            .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 20\r\n\r\n{\"x\":1}")
            .unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();
        let text = String::from_utf8_lossy(&buf);

        assert!(text.starts_with("HTTP/1.1 408 Request Timeout\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains("7 of 20"));
        assert!(!text.contains("Internal server error"));
    }

    #[test]
    fn test_handle_connection_peer_closed_immediately() {
        let listener = ephemeral_listener();
        let addr = listener.local_addr().unwrap();
        let worker = demo_worker();

        let t = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            Server::handle_connection(stream, &worker).unwrap();
        });

        drop(TcpStream::connect(addr).unwrap());
        t.join().unwrap();
    }

    #[test]
    fn test_bind_error() {
        let taken = ephemeral_listener();
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = taken.local_addr().unwrap().port();

        let server = Server::new(config, Router::new());
        assert!(matches!(server.bind(), Err(Error::Bind { .. })));
    }
}
