//! Sample executable built on the kmnd grammar engine.
//!
//! ```text
//! kmnd-sample [-V] PATH
//! kmnd-sample try [-u=URL]
//! kmnd-sample describe
//! ```

use kmnd_core::{BuildError, CommandNode, Grammar, InputNode, NodeId, OptionNode, Scope, UsageNode};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn verbose(scope: &Scope<'_>) -> u8 {
    u8::from(scope.get::<bool>("verbose").unwrap_or(false))
}

fn run_sample(scope: &Scope<'_>) {
    println!("Verbose: {}", verbose(scope));
}

fn run_try(scope: &Scope<'_>) {
    println!("Verbose: {}", verbose(scope));
    match scope.get_str("try.url") {
        Ok(Some(url)) => println!("Url: {url}"),
        Ok(None) => println!("Url: (none)"),
        Err(err) => error!(%err, "url option missing from grammar"),
    }
}

/// Prints the whole grammar as JSON.
fn run_describe(scope: &Scope<'_>) {
    let grammar = scope.grammar();
    let Some(description) = grammar
        .root_of(scope.command())
        .and_then(|root| grammar.describe(root))
    else {
        error!("describe ran outside of a grammar tree");
        return;
    };

    match description.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => error!(%err, "failed to serialize grammar"),
    }
}

fn build(grammar: &mut Grammar) -> Result<NodeId, BuildError> {
    let url = grammar.option(
        OptionNode::string(Some('u'), "url", None).with_description("Try something from this URL"),
    );
    let try_cmd = grammar.command(
        CommandNode::new("try")
            .with_description("*Try* `something`")
            .with_run(run_try),
        [url],
    )?;

    let describe = grammar.command(
        CommandNode::new("describe")
            .with_description("Print this grammar as JSON")
            .with_run(run_describe),
        [],
    )?;

    let verbose = grammar.option(
        OptionNode::new(Some('V'), "verbose", false).with_description("Show more debugging information"),
    );
    let path = grammar.input(
        InputNode::new("path")
            .with_description("Path to the file you want to do nothing with.")
            .required(),
    );
    let usage = grammar.usage(UsageNode::new(
        "sample `PATH`",
        "Sample, the ``sample`` sampler\nsample.",
    ));

    grammar.command(
        CommandNode::new("sample").with_run(run_sample),
        [usage, try_cmd, describe, verbose, path],
    )
}

fn main() {
    init_logging();

    let mut grammar = Grammar::new();
    let root = match build(&mut grammar) {
        Ok(root) => root,
        Err(err) => {
            error!(%err, "failed to build grammar");
            std::process::exit(2);
        }
    };

    std::process::exit(grammar.main(root));
}
