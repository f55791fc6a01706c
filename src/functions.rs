//! Demo Action Handlers
//!
//! A small set of remotely callable functions used by the example binaries and
//! the end-to-end tests. Each handler declares its parameter contract as a
//! typed struct; mismatched or unknown parameters are rejected as
//! `invalid_params` before the handler body runs.

use serde::Deserialize;
use serde_json::{ Value, json };

use crate::registry::{ HandlerResult, Registry, RegistryBuilder, parse_params };

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BinaryOperands {
    a: f64,
    b: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoParams {
    message: String,
}

/// Encode a whole-number result as a JSON integer, fractional as a float.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= (i64::MAX as f64) {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn add_numbers(operands: BinaryOperands) -> HandlerResult {
    Ok(number(operands.a + operands.b))
}

fn multiply_numbers(operands: BinaryOperands) -> HandlerResult {
    Ok(number(operands.a * operands.b))
}

fn echo(params: EchoParams) -> HandlerResult {
    Ok(Value::String(params.message))
}

/// Build the registry of demo actions: `add_numbers`, `multiply_numbers`,
/// and `echo`.
pub fn demo_registry() -> Registry {
    RegistryBuilder::new()
        .register_fn("add_numbers", |params| add_numbers(parse_params(params)?))
        .register_fn("multiply_numbers", |params| multiply_numbers(parse_params(params)?))
        .register_fn("echo", |params| echo(parse_params(params)?))
        .build()
}
