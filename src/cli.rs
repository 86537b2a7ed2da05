// File: ./src/cli.rs
//! Command-line argument handling and help text.
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the structured parse of one utterance.
    Parse(String),
    /// Parse and store the event when the utterance is unambiguous.
    Log(String),
    /// List classes present in the roster.
    Classes,
    /// Delete the events stored by the last `log`.
    Undo,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub root: Option<PathBuf>,
    pub class: Option<String>,
    pub verbose: bool,
}

/// Splits `std::env::args()` into a command and its flags.
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut root = None;
    let mut class = None;
    let mut verbose = false;
    let mut positional = Vec::new();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" | "help" => {
                return Ok(CliArgs {
                    command: Command::Help,
                    root,
                    class,
                    verbose,
                });
            }
            "-r" | "--root" => {
                let v = iter.next().ok_or("--root needs a path")?;
                root = Some(PathBuf::from(v));
            }
            "-c" | "--class" => {
                let v = iter.next().ok_or("--class needs a class code")?;
                class = Some(v.to_uppercase());
            }
            "-v" | "--verbose" => verbose = true,
            _ => positional.push(arg.clone()),
        }
    }

    let command = match positional.split_first() {
        None => Command::Help,
        Some((cmd, rest)) => {
            let text = rest.join(" ");
            match cmd.as_str() {
                "parse" if !text.trim().is_empty() => Command::Parse(text),
                "log" if !text.trim().is_empty() => Command::Log(text),
                "parse" | "log" => return Err(format!("'{}' needs some text", cmd)),
                "classes" => Command::Classes,
                "undo" => Command::Undo,
                other => return Err(format!("Unknown command '{}'", other)),
            }
        }
    };

    Ok(CliArgs {
        command,
        root,
        class,
        verbose,
    })
}

pub fn print_help(binary_name: &str) {
    println!(
        "Classlog v{} - quick classroom behavior log",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} parse <text> [--class <code>]", binary_name);
    println!("    {} log <text> [--class <code>]", binary_name);
    println!("    {} classes", binary_name);
    println!("    {} undo", binary_name);
    println!("    {} --help", binary_name);
    println!();
    println!("OPTIONS:");
    println!("    -c, --class <code>    Class to match against (default: config)");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    -v, --verbose         Debug logging on stderr.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("INPUT SYNTAX:");
    println!("    8B03              Switch class");
    println!("    thứ 2 .. chủ nhật Log for the next such weekday");
    println!("    20/10/2026        Log for an explicit date");
    println!("    Tuấn 14/5         Birthday to tell same-named students apart");
    println!("    <name> <tag>      Student name or nickname plus a tag or synonym");
    println!();
    println!("EXAMPLES:");
    println!("    {} log \"Kiên nói leo\"", binary_name);
    println!("    {} parse \"Tuấn 14/5 nói chuyện\" --class 8B03", binary_name);
    println!("    {} log \"6A03 thứ 3 Huy làm việc riêng\"", binary_name);
}
