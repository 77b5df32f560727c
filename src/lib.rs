//! argtree — build clap command trees from handler signatures and doc
//! comments.
//!
//! Handlers declare a [`Signature`] (parameter names, kinds, defaults) and a
//! free-form doc comment; registering one at a dotted or space-separated
//! path materializes the sub-command chain, synthesizes its arguments, and
//! derives its help text. Parsed input is routed back to the handler with
//! positional and keyword arguments reassembled in declaration order.
//!
//! ```
//! use argtree::{CommandTree, Endpoint, ParamSpec, Signature};
//!
//! let mut tree: CommandTree<String> = CommandTree::new("files");
//! let sig = Signature::new(
//!     "List a directory.\n\n:param str target: directory to list\n",
//! )
//! .param(ParamSpec::required("target"));
//! tree.add_endpoint(
//!     "list.dir",
//!     Endpoint::new(sig, |call| {
//!         Ok(call.pos(0).and_then(|v| v.as_str()).unwrap_or(".").to_string())
//!     }),
//! );
//!
//! let listed = tree.try_run(["list", "dir", "/tmp"]).unwrap();
//! assert_eq!(listed, "/tmp");
//! ```

pub mod dispatch;
pub mod docstring;
pub mod model;
pub mod path;
pub mod synth;
pub mod tree;

pub use dispatch::{build_call_args, expand_kwargs, ParsedInvocation};
pub use docstring::{DocString, ParamDoc};
pub use model::{
    ArgAction, ArgOverride, ArgSpec, Arity, CallArgs, ParamKind, ParamSpec, Signature, Value,
};
pub use path::{resolve, IntoPath};
pub use synth::{synthesize, ArgumentAcceptor, VarArgsPolicy, KWARGS_HELP};
pub use tree::{CommandNode, CommandSet, CommandTree, Endpoint, EndpointOptions};
