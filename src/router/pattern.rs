//! # Compilación de Path Templates
//! src/router/pattern.rs
//!
//! Convierte un template declarativo en un matcher anclado:
//!
//! ```text
//! /users/<id>/posts/<post_id>   →   ^/users/([^/]+)/posts/([^/]+)$
//! ```
//!
//! - Un segmento `<name>` captura uno o más caracteres distintos de `/`.
//! - Cualquier otro segmento se compara literalmente.
//! - El match cubre el path completo, nunca un prefijo.

use super::params::{escape_segment, unescape_segment, PathParams};
use crate::error::CompileError;
use regex::Regex;
use std::sync::OnceLock;

/// Sintaxis de un segmento parámetro: `<` + word chars + `>`
fn param_syntax() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| Regex::new(r"^<(\w*)>$").expect("static regex is valid"))
}

/// Matcher inmutable derivado de un path template
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Template original, para logs
    template: String,

    /// Regex anclado (`^...$`)
    regex: Regex,

    /// Nombres de los parámetros, en el orden de sus grupos de captura
    names: Vec<String>,
}

impl CompiledPattern {
    /// Compila un template
    ///
    /// # Errores
    ///
    /// - Template sin `/` inicial
    /// - Parámetro vacío (`<>`) o repetido
    /// - Segmento con `<`/`>` que no es un parámetro completo
    ///
    /// # Ejemplo
    /// ```
    /// use rester::router::CompiledPattern;
    ///
    /// let pattern = CompiledPattern::compile("/users/<id>").unwrap();
    /// let params = pattern.matches("/users/42").unwrap();
    /// assert_eq!(params.get("id"), Some("42"));
    /// assert!(pattern.matches("/users/42/extra").is_none());
    /// ```
    pub fn compile(template: &str) -> Result<Self, CompileError> {
        if !template.starts_with('/') {
            return Err(CompileError::MissingLeadingSlash {
                template: template.to_string(),
            });
        }

        let mut source = String::from("^");
        let mut names: Vec<String> = Vec::new();

        // El primer elemento del split es el "" antes del `/` inicial
        for segment in template.split('/').skip(1) {
            source.push('/');

            if let Some(caps) = param_syntax().captures(segment) {
                let name = &caps[1];
                if name.is_empty() {
                    return Err(CompileError::EmptyParam {
                        template: template.to_string(),
                    });
                }
                if names.iter().any(|n| n == name) {
                    return Err(CompileError::DuplicateParam {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                names.push(name.to_string());
                source.push_str("([^/]+)");
            } else if segment.contains(['<', '>']) {
                return Err(CompileError::InvalidSegment {
                    template: template.to_string(),
                    segment: segment.to_string(),
                });
            } else {
                source.push_str(&regex::escape(&escape_segment(segment)));
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| CompileError::Regex {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            names,
        })
    }

    /// Intenta hacer match contra un path decodificado con
    /// [`decode_path`](super::params::decode_path)
    ///
    /// Retorna los parámetros capturados (con `%2F` y `%25` restaurados), o
    /// `None` si no hay match.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;

        let mut params = PathParams::new();
        for (index, name) in self.names.iter().enumerate() {
            if let Some(value) = caps.get(index + 1) {
                params.insert(name.clone(), unescape_segment(value.as_str()));
            }
        }
        Some(params)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Nombres de parámetros en orden de aparición
    pub fn param_names(&self) -> &[String] {
        &self.names
    }
}
