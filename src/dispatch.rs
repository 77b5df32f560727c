//! Dispatch — turn a flat parse result back into a handler call.
//!
//! The flat field set knows nothing about parameter order or kinds; the
//! handler's declared [`Signature`] drives the reconstruction of positional
//! and keyword arguments.

use crate::model::{CallArgs, ParamKind, Signature, Value};
use crate::tree::Endpoint;
use anyhow::{anyhow, bail, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// One parsed invocation: the resolved endpoint tag, the bound handler (when
/// the resolved node has one), and the flat field set.
pub struct ParsedInvocation<T> {
    /// Canonical dotted path of the resolved node, when it was registered.
    pub endpoint: Option<String>,
    /// The resolved handler; absent when the user stopped at a namespace.
    pub handler: Option<Rc<Endpoint<T>>>,
    /// Field values keyed by argument name.
    pub fields: BTreeMap<String, Value>,
}

impl<T> fmt::Debug for ParsedInvocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedInvocation")
            .field("endpoint", &self.endpoint)
            .field("handler", &self.handler.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Expand a `kwargs` field into a key/value mapping.
///
/// Accepts an already-expanded map, or a list of `key=value` tokens split on
/// the first `=`. A token without `=` is an error, not silently dropped.
pub fn expand_kwargs(value: Value) -> Result<BTreeMap<String, String>> {
    match value {
        Value::Map(map) => Ok(map),
        Value::List(items) => {
            let mut map = BTreeMap::new();
            for item in items {
                let (key, val) = item
                    .split_once('=')
                    .ok_or_else(|| anyhow!("malformed keyword argument (expected key=value): {item}"))?;
                map.insert(key.to_string(), val.to_string());
            }
            Ok(map)
        }
        _ => bail!("kwargs must be a key=value list or a mapping"),
    }
}

/// Reconstruct positional and keyword arguments for `signature` from a flat
/// field set.
///
/// Parameters are walked in declaration order: leading ones are supplied
/// positionally by name, a present variadic-positional field splices its
/// values in, and everything after the variadic is pulled by name as a
/// keyword. Fields matching no declared parameter are ignored; expanded
/// `kwargs` pairs are merged into the keyword arguments last.
pub fn build_call_args(signature: &Signature, mut fields: BTreeMap<String, Value>) -> Result<CallArgs> {
    let kwargs = match fields.remove("kwargs") {
        Some(value) => expand_kwargs(value)?,
        None => BTreeMap::new(),
    };

    let mut call = CallArgs::default();
    let mut after_variadic = false;

    for param in &signature.params {
        if param.is_receiver() {
            continue;
        }
        match param.kind {
            ParamKind::VarKeyword => {}
            ParamKind::VarPositional => {
                if let Some(value) = fields.remove(&param.name) {
                    match value {
                        Value::List(items) => {
                            call.positional.extend(items.into_iter().map(Value::Str));
                        }
                        other => call.positional.push(other),
                    }
                }
                after_variadic = true;
            }
            ParamKind::Positional => {
                if let Some(value) = fields.remove(&param.name) {
                    if after_variadic {
                        call.keyword.insert(param.name.clone(), value);
                    } else {
                        call.positional.push(value);
                    }
                }
            }
        }
    }

    for (key, value) in kwargs {
        call.keyword.insert(key, Value::Str(value));
    }

    Ok(call)
}
