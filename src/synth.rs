//! Argument synthesis — one argument definition per declared parameter.
//!
//! Maps a handler's [`Signature`] and its parsed doc comment onto an
//! [`ArgumentAcceptor`]: positional arguments for required parameters,
//! `--flag` arguments for defaulted ones, boolean toggles with the action
//! opposite to their default, and a `kwargs` collector for variadic-keyword
//! parameters.

use crate::docstring;
use crate::model::{ArgAction, ArgOverride, ArgSpec, Arity, ParamKind, Signature};
use std::collections::BTreeMap;

/// Help text used for a variadic-keyword argument when the doc comment has
/// nothing to say about it.
pub const KWARGS_HELP: &str = "Optional keyword arguments. Specify them as key=value";

/// Receiver of synthesized definitions — the boundary to the
/// argument-parsing library.
pub trait ArgumentAcceptor {
    fn set_description(&mut self, description: &str);
    fn add_argument(&mut self, spec: ArgSpec);
}

/// What to do with a variadic-positional parameter.
///
/// `Collect` synthesizes a positional argument taking one or more values;
/// `Skip` synthesizes nothing and the parameter never receives input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VarArgsPolicy {
    #[default]
    Collect,
    Skip,
}

/// Synthesize argument definitions for every eligible parameter of
/// `signature` and set the acceptor's description from its doc comment.
///
/// Overrides are keyed by the final argument name (after flag prefixing);
/// entries that match nothing are silently unused.
pub fn synthesize(
    acceptor: &mut dyn ArgumentAcceptor,
    signature: &Signature,
    overrides: &BTreeMap<String, ArgOverride>,
    policy: VarArgsPolicy,
) {
    let doc = docstring::parse(&signature.doc);
    acceptor.set_description(&doc.description);

    for param in &signature.params {
        if param.is_receiver() {
            continue;
        }

        // First matching doc entry wins.
        let doc_help = doc
            .params
            .iter()
            .find(|entry| entry.name == param.name)
            .and_then(|entry| entry.description.clone());

        let mut spec = ArgSpec {
            name: param.name.clone(),
            action: ArgAction::Store,
            arity: None,
            default: None,
            help: doc_help
                .clone()
                .unwrap_or_else(|| param.name.clone()),
        };

        match param.kind {
            ParamKind::Positional => {}
            ParamKind::VarPositional => {
                if policy == VarArgsPolicy::Skip {
                    continue;
                }
                spec.arity = Some(Arity::OneOrMore);
            }
            ParamKind::VarKeyword => {
                spec.name = "kwargs".to_string();
                spec.arity = Some(Arity::ZeroOrMore);
                spec.help = doc_help.unwrap_or_else(|| KWARGS_HELP.to_string());
            }
        }

        if let Some(default) = &param.default {
            spec.name = format!("--{}", spec.name);
            spec.default = Some(default.clone());
            // Booleans get the action opposite to their default, so the
            // flag's presence always means something.
            if let Some(enabled) = default.as_bool() {
                spec.action = if enabled {
                    ArgAction::StoreFalse
                } else {
                    ArgAction::StoreTrue
                };
            }
        }

        if let Some(entry) = overrides.get(&spec.name) {
            entry.apply(&mut spec);
        }

        acceptor.add_argument(spec);
    }
}
