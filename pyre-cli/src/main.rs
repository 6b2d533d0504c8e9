use std::borrow::Cow;
use std::process;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;
use pyre_core::{CompileOptions, Engine, Finder, Flags, Match, Template, dump, substitute};

#[derive(Parser)]
#[command(name = "pyre")]
#[command(about = "Pyre - Python regular expressions on Rust engines")]
#[command(version)]
struct Cli {
    /// Log compilation details (same as `RUST_LOG=debug`)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that compiles a pattern
#[derive(Args)]
struct PatternArgs {
    /// The regex pattern, in Python `re` syntax
    pattern: String,
    /// Inline flag letters to apply, e.g. `im`
    #[arg(short, long, default_value = "")]
    flags: String,
    /// Treat pattern and input as bytes instead of text
    #[arg(short, long)]
    bytes: bool,
    /// Fail instead of using the backtracking engine
    #[arg(long)]
    no_fallback: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the backend and native pattern a pattern compiles to
    Convert {
        #[command(flatten)]
        args: PatternArgs,
    },
    /// Print the parsed tree of a pattern
    Dump {
        #[command(flatten)]
        args: PatternArgs,
    },
    /// Find all matches in input
    Find {
        #[command(flatten)]
        args: PatternArgs,
        /// The input string
        input: String,
        /// Show capture groups of every match
        #[arg(short, long)]
        groups: bool,
        /// Stop after this many matches
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
    },
    /// Replace matches with a template
    Sub {
        #[command(flatten)]
        args: PatternArgs,
        /// The replacement template, e.g. `\g<1>`
        template: String,
        /// The input string
        input: String,
        /// Maximum number of replacements, 0 for all
        #[arg(short, long, default_value_t = 0)]
        count: usize,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Convert { args } => cmd_convert(&args),
        Commands::Dump { args } => cmd_dump(&args),
        Commands::Find {
            args,
            input,
            groups,
            limit,
        } => cmd_find(&args, &input, groups, limit),
        Commands::Sub {
            args,
            template,
            input,
            count,
        } => cmd_sub(&args, &template, &input, count),
    }
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);
    process::exit(1);
}

/// Turn a string of flag letters into flags
fn parse_flags(letters: &str) -> Flags {
    letters.chars().fold(Flags::empty(), |flags, c| {
        match Flags::from_letter(c as u32) {
            Some(flag) => flags | flag,
            None => fail(format!("unknown flag letter '{}'", c)),
        }
    })
}

/// Encode a command line string for the selected mode.
///
/// In bytes mode every character must fit in a byte, so `\xff` can be
/// spelled as `ÿ` on the command line.
fn encode(s: &str, bytes: bool) -> Cow<'_, [u8]> {
    if !bytes {
        return Cow::Borrowed(s.as_bytes());
    }
    let encoded = s
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .unwrap_or_else(|| fail("bytes mode only accepts characters up to U+00FF"));
    Cow::Owned(encoded)
}

fn decode(bytes: &[u8], bytes_mode: bool) -> String {
    if bytes_mode {
        bytes.iter().map(|&b| char::from(b)).collect()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

fn compile(args: &PatternArgs) -> Box<dyn Engine> {
    let pattern = encode(&args.pattern, args.bytes);
    let flags = parse_flags(&args.flags);
    debug!("compiling {:?} with flags {:?}", args.pattern, flags);
    CompileOptions::new()
        .allow_fallback(!args.no_fallback)
        .compile(&pattern, !args.bytes, flags)
        .unwrap_or_else(|err| fail(err))
}

fn cmd_convert(args: &PatternArgs) {
    println!("{}", "Converting pattern...".bold());
    println!("  Input:   {}", args.pattern.cyan());
    println!();

    let engine = compile(args);
    println!("{}", "Output:".bold());
    println!("  Backend: {:?}", engine.backend());
    println!("  Pattern: {}", engine.native_pattern().green());
    if engine.subexp_count() > 0 {
        println!("  Groups:  {}", engine.subexp_count());
    }
}

fn cmd_dump(args: &PatternArgs) {
    let pattern = encode(&args.pattern, args.bytes);
    match dump(&pattern, !args.bytes, parse_flags(&args.flags)) {
        Ok(tree) => println!("{}", tree),
        Err(err) => fail(err),
    }
}

fn print_match(index: usize, m: &Match, text: &[u8], args: &PatternArgs, engine: &dyn Engine, groups: bool) {
    let (start, end) = m.span();
    println!(
        "  [{}] {}..{} = {}",
        index + 1,
        start,
        end,
        decode(&text[start..end], args.bytes).green()
    );
    if !groups {
        return;
    }
    for gid in 1..=engine.subexp_count() {
        let name = &engine.subexp_names()[gid];
        let label = if name.is_empty() {
            gid.to_string()
        } else {
            format!("{} ({})", gid, name)
        };
        match m.group(gid) {
            Some((start, end)) => println!(
                "      Group {}: {}..{} = {}",
                label,
                start,
                end,
                decode(&text[start..end], args.bytes).green()
            ),
            None => println!("      Group {}: {}", label, "unmatched".dimmed()),
        }
    }
}

fn cmd_find(args: &PatternArgs, input: &str, groups: bool, limit: usize) {
    let engine = compile(args);
    let text = encode(input, args.bytes);

    let mut found = 0;
    for (i, m) in Finder::new(engine.as_ref(), &text, 0).limit(limit).enumerate() {
        let m = m.unwrap_or_else(|err| fail(err));
        print_match(i, &m, &text, args, engine.as_ref(), groups);
        found += 1;
    }

    if found == 0 {
        println!("{}", "No matches found".red());
        process::exit(1);
    }
    println!();
    println!("{} {}", "Found".bold(), format!("{} match(es)", found).green());
}

fn cmd_sub(args: &PatternArgs, template: &str, input: &str, count: usize) {
    let engine = compile(args);
    let template = encode(template, args.bytes);
    let text = encode(input, args.bytes);

    let template = Template::parse(engine.as_ref(), &template, !args.bytes).unwrap_or_else(|err| fail(err));
    let (out, n) = substitute(engine.as_ref(), &template, &text, count).unwrap_or_else(|err| fail(err));
    debug!("{} replacement(s)", n);
    println!("{}", decode(&out, args.bytes));
}
