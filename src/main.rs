mod debug_report;

use rulewalk::{DEFAULT_MAX_DEPTH, Options, parse_with, rules::demo};
use std::io::{self, IsTerminal, Read};

const DEFAULT_RULE: &str = "SCRIPT";

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let language = demo::language();
    let script = language.script(config.input);
    let Some(rule) = script.rules().registered_name(&config.rule) else {
        eprintln!("error: unknown rule '{}'", config.rule);
        std::process::exit(2);
    };

    let options = Options { max_depth: config.max_depth, normalize: !config.raw };
    let result = match parse_with(&script, rule, &options) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    debug_report::print_run(&script, rule, &result, config.color);
    let valid = result.valid;

    if config.trace {
        debug_report::print_trace_header(config.color);
        let mut walker = result.into_walker(language.name);
        let mut seen = 0usize;
        walker.execute(&mut debug_report::TracePrinter::new(config.color), &mut seen);
        println!();
    }

    if !valid {
        std::process::exit(1);
    }
}

struct CliConfig {
    input: String,
    rule: String,
    max_depth: usize,
    trace: bool,
    raw: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut rule = DEFAULT_RULE.to_string();
    let mut max_depth = DEFAULT_MAX_DEPTH;
    let mut trace = false;
    let mut raw = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("rulewalk {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--trace" => trace = true,
            "--raw" => raw = true,
            "-r" | "--rule" => {
                rule = args.next().ok_or_else(|| "error: --rule expects a value".to_string())?;
            }
            "--max-depth" => {
                let value = args.next().ok_or_else(|| "error: --max-depth expects a value".to_string())?;
                max_depth = parse_depth(&value)?;
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    if input.is_some() {
                        return Err("error: input provided multiple times".to_string());
                    }
                    input = Some(rest);
                }
                break;
            }
            _ if arg.starts_with("--rule=") => {
                rule = arg.trim_start_matches("--rule=").to_string();
            }
            _ if arg.starts_with("--max-depth=") => {
                max_depth = parse_depth(arg.trim_start_matches("--max-depth="))?;
            }
            _ if arg.starts_with("--input=") => {
                let value = arg.trim_start_matches("--input=");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value.to_string());
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    Ok(CliConfig { input, rule, max_depth, trace, raw, color })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_depth(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(format!("error: invalid --max-depth '{value}' (expected a positive integer)")),
    }
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "rulewalk {version}

Backtracking grammar engine CLI. Parses input with the built-in demo language
and prints the parse tree, the syntax error (if any) and timings.

Usage:
  rulewalk [OPTIONS] [--] <input...>
  rulewalk [OPTIONS] --input <text>
  echo '$a = 1;' | rulewalk [OPTIONS]

Options:
  -i, --input <text>         Input text to parse. If omitted, reads remaining args
                             or stdin when no args are provided.
  -r, --rule <name>          Root rule to evaluate. Default: {default_rule}
  --max-depth <n>            Recursion limit. Default: {default_depth}
  --raw                      Keep transient wrapper nodes (skip normalization).
  --trace                    Walk the tree in post-order and print every node.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RULEWALK_DEBUG=1           Print evaluation, alternation and walk traces to stderr.

Exit codes:
  0  Input is valid.
  1  Syntax error or engine failure.
  2  Invalid arguments or unknown rule.
",
        version = env!("CARGO_PKG_VERSION"),
        default_rule = DEFAULT_RULE,
        default_depth = DEFAULT_MAX_DEPTH
    )
}
