mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use viml_engine::{BufferEditor, Engine, ExecutionResult, VimEditor};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "viml", version, about = "Vimscript engine host")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script against an in-memory buffer
    Run(RunArgs),

    /// Run .test.vim test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Script file to execute
    script: String,

    /// File providing the initial buffer text (empty buffer otherwise)
    #[arg(short, long)]
    buffer: Option<String>,

    /// Initial caret offset in characters
    #[arg(long, default_value_t = 0)]
    caret: usize,

    /// Parse only, don't execute (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the parsed script
    #[arg(long)]
    ast: bool,

    /// Don't print the resulting buffer, just messages
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.vim file or a directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "run" so `viml file.vim` works like `viml run file.vim`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        let first_pos = first_pos.clone();
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            let pos = args
                .iter()
                .position(|a| *a == first_pos)
                .expect("found above");
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.script, e);
            process::exit(1);
        }
    };

    let buffer_text = match &args.buffer {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => String::new(),
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.script.clone(), source.clone());

    let parser = viml::parser::Parser::new(source, file_id);
    let script = match parser.parse() {
        Ok(script) => script,
        Err(errors) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    if args.check {
        eprintln!("ok: {} parsed successfully", args.script);
        return;
    }

    if args.ast {
        println!("{:#?}", script);
        return;
    }

    let mut engine = Engine::new();
    let mut editor = BufferEditor::new(buffer_text);
    editor.set_caret_offset(args.caret);

    let result = engine.execute_script(&script, &mut editor);

    for message in engine.messages.iter() {
        eprintln!("{}", message);
    }
    if !args.quiet {
        print!("{}", editor.text());
    }

    if result == ExecutionResult::Error {
        process::exit(1);
    }
}
