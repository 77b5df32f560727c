//! Data model shared across the crate — parameter schemas, argument
//! definitions, and parsed values.

use std::collections::BTreeMap;

// -- Values -------------------------------------------------------------------

/// A parsed argument value, a declared default, or a handler input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bool(bool),
    /// Collected variadic values (`one-or-more` / `zero-or-more` arguments).
    List(Vec<String>),
    /// An already-expanded `key=value` mapping.
    Map(BTreeMap<String, String>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

// -- Parameter schema ---------------------------------------------------------

/// How a declared parameter collects its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// An ordinary declared parameter (positional, or a flag when defaulted).
    Positional,
    /// Collects any number of unnamed trailing values.
    VarPositional,
    /// Collects any number of `key=value` pairs not otherwise declared.
    VarKeyword,
}

/// One declared parameter of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required positional parameter.
    pub fn required(name: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Positional,
            default: None,
        }
    }

    /// A defaulted parameter — synthesized as a `--flag`.
    pub fn optional(name: &str, default: impl Into<Value>) -> Self {
        ParamSpec {
            name: name.to_string(),
            kind: ParamKind::Positional,
            default: Some(default.into()),
        }
    }

    /// A variadic-positional parameter (`*args`-style).
    pub fn var_positional(name: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            kind: ParamKind::VarPositional,
            default: None,
        }
    }

    /// A variadic-keyword parameter (`**kwargs`-style).
    pub fn var_keyword(name: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            kind: ParamKind::VarKeyword,
            default: None,
        }
    }

    /// Implicit receiver parameters are never synthesized or supplied.
    pub fn is_receiver(&self) -> bool {
        self.name == "self" || self.name == "cls"
    }
}

/// A handler's declared schema: its raw doc comment and parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub doc: String,
    pub params: Vec<ParamSpec>,
}

impl Signature {
    pub fn new(doc: &str) -> Self {
        Signature {
            doc: doc.to_string(),
            params: Vec::new(),
        }
    }

    /// Append a parameter, in declaration order.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

// -- Argument definitions -----------------------------------------------------

/// Store behavior of a synthesized argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgAction {
    Store,
    StoreTrue,
    StoreFalse,
}

/// Collection arity for variadic arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    OneOrMore,
    ZeroOrMore,
}

/// One synthesized argument definition, ready to hand to the parsing library.
///
/// `name` is the bare positional name, a `--`-prefixed flag name for
/// defaulted parameters, or the fixed name `kwargs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    pub action: ArgAction,
    pub arity: Option<Arity>,
    pub default: Option<Value>,
    pub help: String,
}

impl ArgSpec {
    /// The field name this argument parses into (`--bar` → `bar`).
    pub fn dest(&self) -> &str {
        self.name.strip_prefix("--").unwrap_or(&self.name)
    }

    pub fn is_flag(&self) -> bool {
        self.name.starts_with("--")
    }
}

/// Field-level override applied to a computed [`ArgSpec`], keyed by the final
/// argument name. Unset fields leave the computed definition untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgOverride {
    pub action: Option<ArgAction>,
    pub arity: Option<Arity>,
    pub default: Option<Value>,
    pub help: Option<String>,
}

impl ArgOverride {
    pub fn help(text: &str) -> Self {
        ArgOverride {
            help: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn apply(&self, spec: &mut ArgSpec) {
        if let Some(action) = self.action {
            spec.action = action;
        }
        if let Some(arity) = self.arity {
            spec.arity = Some(arity);
        }
        if let Some(default) = &self.default {
            spec.default = Some(default.clone());
        }
        if let Some(help) = &self.help {
            spec.help = help.clone();
        }
    }
}

// -- Reconstructed calls ------------------------------------------------------

/// Arguments reconstructed for one handler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Positional value at `index`, if supplied.
    pub fn pos(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Keyword value by name, if supplied.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }
}
