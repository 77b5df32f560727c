use argtree::{
    ArgOverride, CommandTree, Endpoint, EndpointOptions, ParamSpec, Signature, Value, VarArgsPolicy,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// An endpoint that records how often and with what it was called.
fn counting(sig: Signature) -> (Endpoint<()>, Rc<RefCell<Vec<argtree::CallArgs>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let recorded = calls.clone();
    let endpoint = Endpoint::new(sig, move |call| {
        recorded.borrow_mut().push(call);
        Ok(())
    });
    (endpoint, calls)
}

fn str_value(v: &Value) -> &str {
    v.as_str().expect("string value")
}

// -- basic routing --

#[test]
fn single_endpoint_invoked_once_with_no_arguments() {
    let mut tree: CommandTree = CommandTree::new("files");
    let (endpoint, calls) = counting(Signature::new(""));
    tree.add_endpoint("list.dir", endpoint);

    tree.try_run(["list", "dir"]).unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].positional.is_empty());
    assert!(calls[0].keyword.is_empty());
}

#[test]
fn sibling_endpoints_route_independently() {
    let mut tree: CommandTree = CommandTree::new("files");
    let (dir, dir_calls) = counting(Signature::new(""));
    let (files, files_calls) = counting(Signature::new(""));
    tree.add_endpoint("list.dir", dir);
    tree.add_endpoint("list.files", files);

    tree.try_run(["list", "files"]).unwrap();
    assert_eq!(dir_calls.borrow().len(), 0);
    assert_eq!(files_calls.borrow().len(), 1);

    tree.try_run(["list", "dir"]).unwrap();
    assert_eq!(dir_calls.borrow().len(), 1);
    assert_eq!(files_calls.borrow().len(), 1);
}

#[test]
fn parse_reports_the_resolved_endpoint_tag() {
    let mut tree: CommandTree = CommandTree::new("files");
    let (endpoint, _calls) = counting(Signature::new(""));
    tree.add_endpoint("list.dir", endpoint);

    let invocation = tree.parse(["list", "dir"]).unwrap();
    assert_eq!(invocation.endpoint.as_deref(), Some("list.dir"));
}

#[test]
fn root_endpoint_is_reachable_with_no_tokens() {
    let mut tree: CommandTree<&'static str> = CommandTree::new("version");
    tree.add_endpoint("", Endpoint::new(Signature::new(""), |_| Ok("0.1.0")));

    assert_eq!(tree.try_run::<_, String>([]).unwrap(), "0.1.0");
}

// -- argument reconstruction --

#[test]
fn positional_arguments_supplied_in_declared_order() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("")
        .param(ParamSpec::required("source"))
        .param(ParamSpec::required("target"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("copy", endpoint);

    tree.try_run(["copy", "a.txt", "b.txt"]).unwrap();

    let calls = calls.borrow();
    assert_eq!(str_value(&calls[0].positional[0]), "a.txt");
    assert_eq!(str_value(&calls[0].positional[1]), "b.txt");
}

#[test]
fn defaulted_parameter_uses_default_when_flag_absent() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("")
        .param(ParamSpec::required("name"))
        .param(ParamSpec::optional("greeting", "hello"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("greet", endpoint);

    tree.try_run(["greet", "world"]).unwrap();
    tree.try_run(["greet", "world", "--greeting", "hi"]).unwrap();

    let calls = calls.borrow();
    assert_eq!(str_value(&calls[0].positional[1]), "hello");
    assert_eq!(str_value(&calls[1].positional[1]), "hi");
}

#[test]
fn bool_flags_toggle_their_defaults() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("")
        .param(ParamSpec::optional("verbose", false))
        .param(ParamSpec::optional("color", true));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("show", endpoint);

    tree.try_run(["show"]).unwrap();
    tree.try_run(["show", "--verbose", "--color"]).unwrap();

    let calls = calls.borrow();
    assert_eq!(calls[0].positional[0], Value::Bool(false));
    assert_eq!(calls[0].positional[1], Value::Bool(true));
    assert_eq!(calls[1].positional[0], Value::Bool(true));
    assert_eq!(calls[1].positional[1], Value::Bool(false));
}

#[test]
fn variadic_positional_collects_remaining_values() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("")
        .param(ParamSpec::required("first"))
        .param(ParamSpec::var_positional("rest"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("cat", endpoint);

    tree.try_run(["cat", "a", "b", "c"]).unwrap();

    let calls = calls.borrow();
    let positional: Vec<&str> = calls[0].positional.iter().map(str_value).collect();
    assert_eq!(positional, ["a", "b", "c"]);
}

#[test]
fn skipped_variadic_leaves_later_params_keyword() {
    let mut tree: CommandTree = CommandTree::new("files").varargs_policy(VarArgsPolicy::Skip);
    let sig = Signature::new("")
        .param(ParamSpec::var_positional("rest"))
        .param(ParamSpec::optional("flag", "x"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("cmd", endpoint);

    tree.try_run(["cmd", "--flag", "y"]).unwrap();

    let calls = calls.borrow();
    assert!(calls[0].positional.is_empty());
    assert_eq!(str_value(&calls[0].keyword["flag"]), "y");
}

// -- kwargs --

#[test]
fn kwargs_tokens_reach_the_handler_as_a_mapping() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("").param(ParamSpec::var_keyword("kwargs"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("util.env", endpoint);

    tree.try_run(["util", "env", "--kwargs", "foo=bar"]).unwrap();

    let calls = calls.borrow();
    assert!(calls[0].positional.is_empty());
    assert_eq!(str_value(&calls[0].keyword["foo"]), "bar");
    assert!(!calls[0].keyword.contains_key("kwargs"));
}

#[test]
fn repeated_kwargs_occurrences_accumulate() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("").param(ParamSpec::var_keyword("kwargs"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("util.env", endpoint);

    tree.try_run(["util", "env", "--kwargs", "a=1", "--kwargs", "b=2"])
        .unwrap();

    let calls = calls.borrow();
    assert_eq!(str_value(&calls[0].keyword["a"]), "1");
    assert_eq!(str_value(&calls[0].keyword["b"]), "2");
}

#[test]
fn malformed_kwargs_token_is_an_error() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("").param(ParamSpec::var_keyword("kwargs"));
    let (endpoint, calls) = counting(sig);
    tree.add_endpoint("util.env", endpoint);

    let err = tree.try_run(["util", "env", "--kwargs", "nope"]).unwrap_err();
    assert!(err.to_string().contains("nope"));
    assert!(err.downcast_ref::<clap::Error>().is_none());
    assert_eq!(calls.borrow().len(), 0);
}

// -- failure paths --

#[test]
fn namespace_without_handler_is_an_invalid_endpoint() {
    let mut tree: CommandTree = CommandTree::new("files");
    let (endpoint, calls) = counting(Signature::new(""));
    tree.add_endpoint("list.dir", endpoint);

    let err = tree.try_run(["list"]).unwrap_err();
    let usage = err.downcast_ref::<clap::Error>().expect("usage error");
    assert_eq!(usage.kind(), clap::error::ErrorKind::InvalidSubcommand);
    assert_eq!(calls.borrow().len(), 0);
}

#[test]
fn registered_namespace_is_still_not_invocable() {
    let mut tree: CommandTree = CommandTree::new("files");
    tree.add_namespace("list.dir");

    let invocation = tree.parse(["list", "dir"]).unwrap();
    assert_eq!(invocation.endpoint.as_deref(), Some("list.dir"));

    let err = tree.invoke(invocation).unwrap_err();
    assert!(err.downcast_ref::<clap::Error>().is_some());
}

#[test]
fn unknown_command_is_a_usage_error() {
    let mut tree: CommandTree = CommandTree::new("files");
    let (endpoint, _calls) = counting(Signature::new(""));
    tree.add_endpoint("list.dir", endpoint);

    let err = tree.try_run(["bogus"]).unwrap_err();
    assert!(err.downcast_ref::<clap::Error>().is_some());
}

#[test]
fn handler_errors_propagate_unchanged() {
    let mut tree: CommandTree = CommandTree::new("files");
    tree.add_endpoint(
        "fail",
        Endpoint::new(Signature::new(""), |_| {
            anyhow::bail!("backend unavailable")
        }),
    );

    let err = tree.try_run(["fail"]).unwrap_err();
    assert_eq!(err.to_string(), "backend unavailable");
}

// -- help surface --

#[test]
fn doc_comment_description_reaches_help_output() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new("List a directory.\n\n:param str target: directory to list\n")
        .param(ParamSpec::required("target"));
    let (endpoint, _calls) = counting(sig);
    tree.add_endpoint("list.dir", endpoint);

    let cmd = tree.command();
    let list = cmd.find_subcommand("list").expect("list subcommand");
    let mut dir = list.find_subcommand("dir").expect("dir subcommand").clone();
    let help = dir.render_help().to_string();

    assert!(help.contains("List a directory."));
    assert!(help.contains("directory to list"));
}

#[test]
fn overrides_replace_synthesized_help() {
    let mut tree: CommandTree = CommandTree::new("files");
    let sig = Signature::new(":param target: synthesized help\n")
        .param(ParamSpec::required("target"));
    let (endpoint, _calls) = counting(sig);

    let mut overrides = BTreeMap::new();
    overrides.insert("target".to_string(), ArgOverride::help("my own help"));
    let node = tree.add_endpoint_with(
        "list",
        endpoint,
        EndpointOptions {
            autospec: true,
            overrides,
        },
    );

    assert_eq!(node.args()[0].help, "my own help");
}
