//! Command tree — registration, clap lowering, parsing, and invocation.
//!
//! A [`CommandTree`] owns a hierarchy of [`CommandNode`]s keyed by path
//! segment. Registering an endpoint materializes the nodes along its path
//! (idempotently — existing segments are reused), synthesizes argument
//! definitions from the handler's signature, and binds the handler. At parse
//! time the whole tree is lowered to a `clap::Command`, the resolved
//! subcommand chain is walked back to its node, and the node's argument
//! definitions drive extraction of the flat field set.

use crate::dispatch::{self, ParsedInvocation};
use crate::model::{ArgAction, ArgSpec, Arity, CallArgs, Signature, Value};
use crate::path::IntoPath;
use crate::synth::{self, ArgumentAcceptor, VarArgsPolicy};
use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Arg, ArgAction as ClapAction, Command};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

// -- Endpoints ----------------------------------------------------------------

/// A bound callable: a declared parameter schema plus the handler it drives.
pub struct Endpoint<T = ()> {
    pub signature: Signature,
    handler: Rc<dyn Fn(CallArgs) -> Result<T>>,
}

impl<T> Endpoint<T> {
    pub fn new(signature: Signature, handler: impl Fn(CallArgs) -> Result<T> + 'static) -> Self {
        Endpoint {
            signature,
            handler: Rc::new(handler),
        }
    }

    pub fn call(&self, args: CallArgs) -> Result<T> {
        (self.handler)(args)
    }
}

impl<T> fmt::Debug for Endpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A named group of endpoints, mountable under a root path.
///
/// The explicit replacement for reflective member discovery: each handler
/// collection lists its own `(path, endpoint)` pairs. Paths are resolved
/// with the usual dotted/spaced rules, relative to the mount root.
pub trait CommandSet<T> {
    fn endpoints(&self) -> Vec<(String, Endpoint<T>)>;
}

/// Options for a single endpoint registration.
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// Synthesize argument definitions from the signature (on by default).
    pub autospec: bool,
    /// Field overrides keyed by final argument name.
    pub overrides: BTreeMap<String, crate::model::ArgOverride>,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        EndpointOptions {
            autospec: true,
            overrides: BTreeMap::new(),
        }
    }
}

// -- Nodes --------------------------------------------------------------------

/// One node in the command tree.
pub struct CommandNode<T = ()> {
    path: Vec<String>,
    description: Option<String>,
    args: Vec<ArgSpec>,
    children: BTreeMap<String, CommandNode<T>>,
    endpoint: Option<Rc<Endpoint<T>>>,
    tag: Option<String>,
}

impl<T> CommandNode<T> {
    fn new(path: Vec<String>) -> Self {
        CommandNode {
            path,
            description: None,
            args: Vec::new(),
            children: BTreeMap::new(),
            endpoint: None,
            tag: None,
        }
    }

    /// Full path from the root to this node.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Synthesized argument definitions (endpoint nodes only).
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    pub fn children(&self) -> &BTreeMap<String, CommandNode<T>> {
        &self.children
    }

    pub fn child(&self, segment: &str) -> Option<&CommandNode<T>> {
        self.children.get(segment)
    }

    /// Canonical dotted path, set when this node was registered.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn has_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }
}

impl<T> ArgumentAcceptor for CommandNode<T> {
    fn set_description(&mut self, description: &str) {
        self.description = if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        };
    }

    fn add_argument(&mut self, spec: ArgSpec) {
        self.args.push(spec);
    }
}

// -- Tree ---------------------------------------------------------------------

/// A mutable hierarchy of command nodes with a program name at the root.
///
/// `T` is the handlers' common return type. The tree is single-threaded by
/// design; concurrent registration needs external serialization.
pub struct CommandTree<T = ()> {
    name: String,
    root: CommandNode<T>,
    varargs: VarArgsPolicy,
}

impl<T> CommandTree<T> {
    pub fn new(name: &str) -> Self {
        CommandTree {
            name: name.to_string(),
            root: CommandNode::new(Vec::new()),
            varargs: VarArgsPolicy::default(),
        }
    }

    /// Choose how variadic-positional parameters synthesize.
    pub fn varargs_policy(mut self, policy: VarArgsPolicy) -> Self {
        self.varargs = policy;
        self
    }

    pub fn root(&self) -> &CommandNode<T> {
        &self.root
    }

    /// Walk to the node for `path`, creating missing segments.
    ///
    /// Re-materializing an existing path returns the same node; no duplicate
    /// siblings are ever created. The empty path is the root itself.
    pub fn materialize(&mut self, path: impl IntoPath) -> &mut CommandNode<T> {
        let segments = path.into_path();
        let mut node = &mut self.root;
        for (depth, segment) in segments.iter().enumerate() {
            node = node.children.entry(segment.clone()).or_insert_with(|| {
                debug!(segment = segment.as_str(), "creating command node");
                CommandNode::new(segments[..=depth].to_vec())
            });
        }
        node.path = segments;
        node
    }

    /// Register `endpoint` at `path` with default options.
    pub fn add_endpoint(&mut self, path: impl IntoPath, endpoint: Endpoint<T>) -> &mut CommandNode<T> {
        self.add_endpoint_with(path, endpoint, EndpointOptions::default())
    }

    /// Register `endpoint` at `path`.
    ///
    /// Materializes the node, optionally synthesizes its argument
    /// definitions, binds the handler, and stamps the canonical dotted path
    /// as the node's tag. Re-registering a path replaces its definitions.
    pub fn add_endpoint_with(
        &mut self,
        path: impl IntoPath,
        endpoint: Endpoint<T>,
        options: EndpointOptions,
    ) -> &mut CommandNode<T> {
        let policy = self.varargs;
        let node = self.materialize(path);
        if options.autospec {
            node.args.clear();
            synth::synthesize(node, &endpoint.signature, &options.overrides, policy);
        }
        node.tag = Some(node.path.join("."));
        node.endpoint = Some(Rc::new(endpoint));
        debug!(endpoint = node.tag.as_deref().unwrap_or(""), "registered endpoint");
        node
    }

    /// Register a pure grouping node: tagged, but with nothing to invoke.
    pub fn add_namespace(&mut self, path: impl IntoPath) -> &mut CommandNode<T> {
        let node = self.materialize(path);
        node.tag = Some(node.path.join("."));
        node
    }

    /// Mount every endpoint of `sets` under `root`.
    ///
    /// Sets are merged in reverse order with later writes overwriting, so
    /// when two sets claim the same path the first-listed one wins.
    /// Per-path options are looked up by the dotted form of the full path.
    pub fn add_command_sets(
        &mut self,
        sets: &[&dyn CommandSet<T>],
        root: impl IntoPath,
        options: &BTreeMap<String, EndpointOptions>,
    ) {
        let root = root.into_path();
        let mut merged: BTreeMap<Vec<String>, Endpoint<T>> = BTreeMap::new();
        for set in sets.iter().rev() {
            for (rel, endpoint) in set.endpoints() {
                let mut full = root.clone();
                full.extend(crate::path::resolve(&rel));
                merged.insert(full, endpoint);
            }
        }
        for (segments, endpoint) in merged {
            let opts = options.get(&segments.join(".")).cloned().unwrap_or_default();
            self.add_endpoint_with(segments, endpoint, opts);
        }
    }

    /// Lower the tree to the underlying parser's command hierarchy.
    pub fn command(&self) -> Command {
        lower_node(self.name.clone(), &self.root)
    }

    /// Parse `tokens` (without a program name) against the tree.
    ///
    /// Unknown commands and malformed arguments surface as the parsing
    /// library's own usage errors.
    pub fn parse<I, S>(&self, tokens: I) -> Result<ParsedInvocation<T>, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = self.command();
        let argv: Vec<String> = std::iter::once(self.name.clone())
            .chain(tokens.into_iter().map(Into::into))
            .collect();
        let matches = cmd.try_get_matches_from_mut(argv)?;

        let mut node = &self.root;
        let mut current = &matches;
        while let Some((segment, sub)) = current.subcommand() {
            node = match node.children.get(segment) {
                Some(child) => child,
                None => {
                    return Err(cmd.error(
                        ErrorKind::InvalidSubcommand,
                        format!("unknown command: {segment}"),
                    ))
                }
            };
            current = sub;
        }

        let mut fields = BTreeMap::new();
        for spec in &node.args {
            let dest = spec.dest();
            let value = match spec.action {
                ArgAction::StoreTrue | ArgAction::StoreFalse => {
                    Some(Value::Bool(current.get_flag(dest)))
                }
                ArgAction::Store => match spec.arity {
                    Some(_) => current
                        .get_many::<String>(dest)
                        .map(|values| Value::List(values.cloned().collect())),
                    None => current.get_one::<String>(dest).cloned().map(Value::Str),
                },
            };
            if let Some(value) = value {
                fields.insert(dest.to_string(), value);
            }
        }

        Ok(ParsedInvocation {
            endpoint: node.tag.clone(),
            handler: node.endpoint.clone(),
            fields,
        })
    }

    /// Invoke the handler a parse resolved to.
    ///
    /// A resolved node with no bound handler is an invalid endpoint and
    /// takes the parsing library's usage-error path.
    pub fn invoke(&self, invocation: ParsedInvocation<T>) -> Result<T> {
        let Some(handler) = invocation.handler else {
            let mut cmd = self.command();
            return Err(cmd.error(ErrorKind::InvalidSubcommand, "invalid endpoint").into());
        };
        debug!(
            endpoint = invocation.endpoint.as_deref().unwrap_or(""),
            "dispatching"
        );
        let call = dispatch::build_call_args(&handler.signature, invocation.fields)?;
        handler.call(call)
    }

    /// Parse and invoke in one step, every failure as an `Err`.
    pub fn try_run<I, S>(&self, tokens: I) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = self.parse(tokens)?;
        self.invoke(invocation)
    }

    /// Parse and invoke; usage errors print through the parsing library and
    /// exit the process, handler errors come back as `Err`.
    pub fn run<I, S>(&self, tokens: I) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.try_run(tokens)
            .map_err(|err| match err.downcast::<clap::Error>() {
                Ok(usage) => usage.exit(),
                Err(other) => other,
            })
    }
}

// -- clap lowering ------------------------------------------------------------

fn lower_node<T>(name: String, node: &CommandNode<T>) -> Command {
    let mut cmd = Command::new(name);
    if let Some(description) = node.description() {
        cmd = cmd.about(description.to_string());
    }
    for spec in node.args() {
        cmd = cmd.arg(lower_arg(spec));
    }
    for (segment, child) in node.children() {
        cmd = cmd.subcommand(lower_node(segment.clone(), child));
    }
    cmd
}

fn lower_arg(spec: &ArgSpec) -> Arg {
    let dest = spec.dest().to_string();
    // Zero-or-more collectors (the kwargs capture) are exposed as flags so
    // their values cannot be mistaken for a positional.
    let flag = spec.is_flag() || spec.arity == Some(Arity::ZeroOrMore);

    let mut arg = Arg::new(dest.clone()).help(spec.help.clone());
    if flag {
        arg = arg.long(dest);
    }

    match spec.action {
        ArgAction::Store => {
            let required = !flag && spec.default.is_none();
            arg = match spec.arity {
                Some(Arity::OneOrMore) => arg.action(ClapAction::Set).num_args(1..).required(required),
                Some(Arity::ZeroOrMore) => arg.action(ClapAction::Append).num_args(1..),
                None => arg.action(ClapAction::Set).required(required),
            };
            if let Some(Value::Str(default)) = &spec.default {
                arg = arg.default_value(default.clone());
            }
        }
        // Boolean defaults are implied: an absent SetFalse flag reads back
        // true, an absent SetTrue flag reads back false.
        ArgAction::StoreTrue => arg = arg.action(ClapAction::SetTrue),
        ArgAction::StoreFalse => arg = arg.action(ClapAction::SetFalse),
    }
    arg
}
