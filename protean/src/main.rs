use clap::{Parser as ClapParser, ValueEnum};
use std::process;

use protean::{Interpreter, Node, NumberFormat, VMCreateInfo, DEFAULT_MAX_DEPTH};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Demo program to run
    #[arg(long, value_enum, default_value_t = Demo::Counter)]
    demo: Demo,

    /// Print floats the legacy way (`3` instead of `3.0`)
    #[arg(long, help = "Integral floats print without a fraction")]
    legacy_numbers: bool,

    /// Nested activations allowed before a stack overflow error
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Log filter, overrides RUST_LOG
    #[arg(long, help = "e.g. debug or protean::send=trace")]
    log_level: Option<String>,

    /// List the demos and exit
    #[arg(long)]
    list: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Demo {
    /// Loops with break and continue
    Counter,
    /// Blocks capturing their defining scope
    Closures,
    /// Prototype lookup, define vs update
    Lookup,
    /// Try and backtraces
    Errors,
}

const DEMOS: &[(Demo, &str)] = &[
    (Demo::Counter, "for/while loops with break and continue"),
    (Demo::Closures, "a counter block closing over a method's scope"),
    (Demo::Lookup, "slot inheritance, shadowing and updates"),
    (Demo::Errors, "a caught division by zero, then an uncaught error"),
];

fn int(value: i64) -> Node {
    Node::Integer(value)
}

fn println(node: Node) -> Node {
    Node::send(node, "println", vec![])
}

fn text(prefix: &str, node: Node) -> Node {
    println(Node::send(Node::string(prefix), "..", vec![node]))
}

fn counter_demo() -> Node {
    let is_even = Node::send(
        Node::send(Node::ident("i"), "%", vec![int(2)]),
        "==",
        vec![int(0)],
    );
    Node::seq(vec![
        Node::define("odds", Node::call("list", vec![])),
        Node::for_loop(
            "i",
            int(1),
            int(10),
            None,
            Node::seq(vec![
                Node::if_else(is_even, Node::Continue, None),
                Node::send(Node::ident("odds"), "append", vec![Node::ident("i")]),
            ]),
        ),
        text("odd numbers: ", Node::ident("odds")),
        Node::define("n", int(1)),
        Node::define(
            "found",
            Node::while_loop(
                Node::True,
                Node::seq(vec![
                    Node::update("n", Node::send(Node::ident("n"), "*", vec![int(3)])),
                    Node::if_else(
                        Node::send(Node::ident("n"), ">", vec![int(100)]),
                        Node::break_with(Some(Node::ident("n"))),
                        None,
                    ),
                ]),
            ),
        ),
        text("first power of 3 above 100: ", Node::ident("found")),
        text("countdown: ", {
            let collected = Node::call("list", vec![]);
            Node::seq(vec![
                Node::define("down", collected),
                Node::for_loop(
                    "j",
                    int(3),
                    int(1),
                    Some(int(-1)),
                    Node::send(Node::ident("down"), "append", vec![Node::ident("j")]),
                ),
                Node::ident("down"),
            ])
        }),
        text("halves: ", Node::send(int(7), "/", vec![int(2)])),
    ])
}

fn closures_demo() -> Node {
    // makeCounter := method(count := 0; block(count = count + 1))
    let make_counter = Node::method(
        &[],
        Node::seq(vec![
            Node::define("count", int(0)),
            Node::block(
                &[],
                Node::update(
                    "count",
                    Node::send(Node::ident("count"), "+", vec![int(1)]),
                ),
            ),
        ]),
    );
    let tick = || {
        let counter =
            Node::send(Node::ThisLocals, "getSlot", vec![Node::string("counter")]);
        Node::send(counter, "call", vec![])
    };
    Node::seq(vec![
        Node::define("makeCounter", make_counter),
        // a bare name activates the method, which hands back the block
        Node::define("counter", Node::ident("makeCounter")),
        tick(),
        tick(),
        text("counter after three ticks: ", tick()),
    ])
}

fn lookup_demo() -> Node {
    Node::seq(vec![
        Node::define("Animal", Node::send(Node::ident("Object"), "clone", vec![])),
        Node::define_on(Node::ident("Animal"), "legs", int(4)),
        Node::define_on(
            Node::ident("Animal"),
            "describe",
            Node::method(
                &[],
                Node::send(
                    Node::send(Node::SelfRef, "name", vec![]),
                    "..",
                    vec![Node::send(
                        Node::string(" has legs: "),
                        "..",
                        vec![Node::send(Node::SelfRef, "legs", vec![])],
                    )],
                ),
            ),
        ),
        Node::define("Bird", Node::send(Node::ident("Animal"), "clone", vec![])),
        Node::define_on(Node::ident("Animal"), "name", Node::string("animal")),
        Node::define_on(Node::ident("Bird"), "name", Node::string("bird")),
        Node::define_on(Node::ident("Bird"), "legs", int(2)),
        println(Node::send(Node::ident("Bird"), "describe", vec![])),
        println(Node::send(Node::ident("Animal"), "describe", vec![])),
        Node::update_on(Node::ident("Bird"), "legs", int(3)),
        Node::define("Cat", Node::send(Node::ident("Animal"), "clone", vec![])),
        Node::update_on(Node::ident("Cat"), "legs", int(5)),
        text("animal legs after cat update: ", Node::send(Node::ident("Animal"), "legs", vec![])),
        text(
            "cat owns legs: ",
            Node::send(Node::ident("Cat"), "hasLocalSlot", vec![Node::string("legs")]),
        ),
        text("1.5 * 2 = ", Node::send(Node::Float(1.5), "*", vec![int(2)])),
    ])
}

fn errors_demo() -> Node {
    let divide = Node::method(
        &["x"],
        Node::send(Node::ident("x"), "/", vec![int(0)]),
    );
    Node::seq(vec![
        Node::define("Calculator", Node::send(Node::ident("Object"), "clone", vec![])),
        Node::define_on(Node::ident("Calculator"), "divide", divide),
        Node::try_catch(
            Node::send(Node::ident("Calculator"), "divide", vec![int(10)]),
            "e",
            text("caught: ", Node::send(Node::ident("e"), "message", vec![])),
        ),
        Node::send(Node::ident("Calculator"), "frobnicate", vec![]),
    ])
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(filter) = &cli.log_level {
        logger.parse_filters(filter);
    }
    logger.init();

    if cli.list {
        for (demo, description) in DEMOS {
            let name = demo
                .to_possible_value()
                .map(|value| value.get_name().to_string())
                .unwrap_or_default();
            println!("{name:<10} {description}");
        }
        return;
    }

    let number_format = if cli.legacy_numbers {
        NumberFormat::Legacy
    } else {
        NumberFormat::Plain
    };
    let mut interpreter = Interpreter::new(VMCreateInfo {
        number_format,
        max_depth: cli.max_depth,
        ..Default::default()
    });

    let program = match cli.demo {
        Demo::Counter => counter_demo(),
        Demo::Closures => closures_demo(),
        Demo::Lookup => lookup_demo(),
        Demo::Errors => errors_demo(),
    };

    match interpreter.run(&program) {
        Ok(value) => println!("=> {}", interpreter.display(&value)),
        Err(report) => {
            eprintln!("Error: {}", report.render());
            process::exit(1);
        }
    }
}
