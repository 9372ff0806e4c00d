//! # Parámetros de Path y Query
//! src/router/params.rs
//!
//! - [`PathParams`]: nombre → valor único, capturado por el pattern.
//! - [`QueryParams`]: nombre → lista de valores; una key puede repetirse
//!   (`?tag=a&tag=b` produce `tag = ["a", "b"]`).
//!
//! Ambos se construyen nuevos para cada request y nunca convierten tipos:
//! un `id` numérico llega como string y el handler lo parsea si quiere.

use crate::error::{Error, Result};
use std::borrow::Cow;
use std::collections::HashMap;

/// Parámetros dinámicos extraídos del path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: HashMap<String, String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.inner.insert(name, value);
    }

    /// Valor de un parámetro (siempre no vacío si existe)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parámetros del query string; cada key guarda todos sus valores en orden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    inner: HashMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsea un query string (sin el `?` inicial)
    ///
    /// Reglas de formulario URL:
    /// - Pares separados por `&`
    /// - `+` equivale a espacio
    /// - Percent-escapes decodificados en keys y valores
    /// - Pares con valor vacío (`a=` o `a`) se descartan
    ///
    /// # Errores
    ///
    /// `MalformedRequest` si un escape es inválido o no produce UTF-8.
    ///
    /// # Ejemplo
    /// ```
    /// use rester::router::QueryParams;
    ///
    /// let query = QueryParams::parse("tag=a&tag=b&q=hello+world").unwrap();
    /// assert_eq!(query.get_all("tag"), ["a", "b"]);
    /// assert_eq!(query.get("q"), Some("hello world"));
    /// ```
    pub fn parse(query: &str) -> Result<Self> {
        let mut params = Self::new();

        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }

            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            if raw_value.is_empty() {
                continue;
            }

            let key = decode_component(raw_key, true)?;
            let value = decode_component(raw_value, true)?;
            params.inner.entry(key).or_default().push(value);
        }

        Ok(params)
    }

    /// Primer valor de una key
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Todos los valores de una key, en el orden del URL
    pub fn get_all(&self, name: &str) -> &[String] {
        self.inner.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Decodifica percent-escapes (`%2F`, `%C3%B1`...)
///
/// A diferencia de `urlencoding::decode`, un `%` que no va seguido de dos
/// dígitos hexadecimales es un error y no se deja pasar tal cual.
pub fn decode_component(raw: &str, plus_as_space: bool) -> Result<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(Error::MalformedRequest(format!(
                    "invalid percent-escape in {:?}",
                    raw
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    let spaced;
    let input = if plus_as_space && raw.contains('+') {
        spaced = raw.replace('+', " ");
        spaced.as_str()
    } else {
        raw
    };

    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::MalformedRequest(format!("percent-escapes in {:?} are not UTF-8", raw)))
}

/// Decodifica un path segmento por segmento para hacer match
///
/// Dentro de cada segmento, un `/` o `%` decodificado vuelve a quedar como
/// `%2F` / `%25`. Así `%2F` nunca parte un segmento y un `<param>` puede
/// capturarlo; [`unescape_segment`] lo restaura en el valor capturado.
///
/// # Ejemplo
/// ```
/// use rester::router::params::decode_path;
///
/// assert_eq!(decode_path("/files/my%20file").unwrap(), "/files/my file");
/// assert_eq!(decode_path("/users/a%2Fb").unwrap(), "/users/a%2Fb");
/// ```
pub fn decode_path(raw: &str) -> Result<String> {
    let mut decoded = String::with_capacity(raw.len());
    for (index, segment) in raw.split('/').enumerate() {
        if index > 0 {
            decoded.push('/');
        }
        decoded.push_str(&escape_segment(&decode_component(segment, false)?));
    }
    Ok(decoded)
}

/// Escapa `%` y `/` de un segmento ya decodificado
pub(crate) fn escape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains(['%', '/']) {
        Cow::Owned(segment.replace('%', "%25").replace('/', "%2F"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Inverso de [`escape_segment`]: restaura `%2F` y `%25`
pub(crate) fn unescape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if rest.starts_with("%2F") {
            out.push('/');
            rest = &rest[3..];
        } else if rest.starts_with("%25") {
            out.push('%');
            rest = &rest[3..];
        } else {
            out.push('%');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        let query = QueryParams::parse("").unwrap();
        assert!(query.is_empty());
        assert_eq!(query.get("missing"), None);
        assert!(query.get_all("missing").is_empty());
    }

    #[test]
    fn test_repeated_keys_keep_all_values() {
        let query = QueryParams::parse("tag=a&tag=b").unwrap();

        assert_eq!(query.get_all("tag"), ["a", "b"]);
        assert_eq!(query.get("tag"), Some("a"));
        assert_eq!(query.len(), 1);
    }

    #[test]
    fn test_blank_values_dropped() {
        let query = QueryParams::parse("debug&empty=&page=2").unwrap();

        assert!(!query.contains("debug"));
        assert!(!query.contains("empty"));
        assert_eq!(query.get("page"), Some("2"));
    }

    #[test]
    fn test_decoding() {
        let query = QueryParams::parse("text=hello%20world&name=Jos%C3%A9&q=a+b").unwrap();

        assert_eq!(query.get("text"), Some("hello world"));
        assert_eq!(query.get("name"), Some("José"));
        assert_eq!(query.get("q"), Some("a b"));
    }

    #[test]
    fn test_encoded_plus_is_literal() {
        let query = QueryParams::parse("expr=1%2B1").unwrap();
        assert_eq!(query.get("expr"), Some("1+1"));
    }

    #[test]
    fn test_value_with_equals() {
        let query = QueryParams::parse("filter=a=b").unwrap();
        assert_eq!(query.get("filter"), Some("a=b"));
    }

    #[test]
    fn test_bad_escape_is_malformed() {
        assert!(matches!(
            QueryParams::parse("x=%zz"),
            Err(Error::MalformedRequest(_))
        ));
        assert!(matches!(
            QueryParams::parse("x=abc%2"),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        assert!(matches!(
            decode_component("%FF%FE", false),
            Err(Error::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_path_decoding_keeps_plus() {
        assert_eq!(decode_component("/a+b%20c", false).unwrap(), "/a+b c");
    }

    #[test]
    fn test_decode_path_keeps_segments() {
        assert_eq!(decode_path("/users/42").unwrap(), "/users/42");
        assert_eq!(decode_path("/h%65llo").unwrap(), "/hello");
        assert_eq!(decode_path("/users/a%2fb/posts").unwrap(), "/users/a%2Fb/posts");
        assert_eq!(decode_path("/pct/100%25").unwrap(), "/pct/100%25");
        assert!(matches!(decode_path("/bad/%zz"), Err(Error::MalformedRequest(_))));
    }

    #[test]
    fn test_segment_escape_round_trip() {
        for value in ["plain", "a/b", "100%", "%2F", "a%25/b", "ñ/%"] {
            assert_eq!(unescape_segment(&escape_segment(value)), value);
        }
    }

    #[test]
    fn test_path_params() {
        let mut params = PathParams::new();
        assert!(params.is_empty());

        params.insert("id".to_string(), "42".to_string());
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("other"), None);
        assert_eq!(params.iter().count(), 1);
    }
}
