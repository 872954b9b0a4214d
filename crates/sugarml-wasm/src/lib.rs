//! WASM bindings for the SugarML parser.
//!
//! Exposes `parse()` and `tokens()` to JavaScript via wasm-bindgen. Both
//! take the source and an optional `{ filename }` options object, return
//! plain JS values, and throw an `Error` carrying `line`, `col` and
//! `filename` properties on failure.

use serde::Serialize;
use sugarml_parser::{Diagnostic, Options};
use wasm_bindgen::prelude::*;

/// Parse SugarML source into its document tree.
///
/// Returns an array of `{ type, content | name, attrs, content, location }`
/// nodes.
#[wasm_bindgen]
pub fn parse(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = read_options(options)?;
    let nodes = match sugarml_parser::parse_source(source, &options) {
        Ok(nodes) => nodes,
        Err(e) => return Err(diagnostic_error(e.diagnostic())?),
    };
    to_js(&nodes)
}

/// Tokenize SugarML source.
#[wasm_bindgen]
pub fn tokens(source: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let options = read_options(options)?;
    let tokens = match sugarml_lexer::lex(source, &options) {
        Ok(tokens) => tokens,
        Err(e) => return Err(diagnostic_error(&e.diagnostic)?),
    };
    to_js(&tokens)
}

/// Get the parser version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn read_options(value: JsValue) -> Result<Options, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Options::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(JsValue::from)
}

/// Build the JS `Error` thrown for a failed parse.
fn diagnostic_error(diagnostic: &Diagnostic) -> Result<JsValue, JsValue> {
    let error = js_sys::Error::new(&diagnostic.to_string());
    error.set_name("SugarmlError");
    for (key, value) in error_props(diagnostic) {
        js_sys::Reflect::set(&error, &JsValue::from_str(key), &value.into())
            .map_err(|_| JsValue::from_str(&format!("Failed to set {key} property")))?;
    }
    Ok(error.into())
}

/// Extra properties attached to a thrown error.
fn error_props(diagnostic: &Diagnostic) -> Vec<(&'static str, PropValue)> {
    let mut props = vec![("filename", PropValue::Str(diagnostic.filename.clone()))];
    if let Some(location) = diagnostic.location {
        props.push(("line", PropValue::Num(location.line)));
        props.push(("col", PropValue::Num(location.column)));
    }
    props
}

#[derive(Debug, PartialEq)]
enum PropValue {
    Str(String),
    Num(usize),
}

impl From<PropValue> for JsValue {
    fn from(value: PropValue) -> Self {
        match value {
            PropValue::Str(s) => JsValue::from_str(&s),
            PropValue::Num(n) => JsValue::from_f64(n as f64),
        }
    }
}
