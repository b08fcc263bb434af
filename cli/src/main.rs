mod config;
mod exercise_pack;
mod markdown;
mod test_runner;
mod workspace_file;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use blocks::{GeneratedProgram, Generator};
use grader::{Exercise, Progression, State, TestResult, Verification};
use sandbox::runtime_value::format_number;
use sandbox::{Fault, RuntimeError, Sandbox, SandboxConfig};

use crate::config::Config;
use crate::exercise_pack::ExercisePack;
use crate::workspace_file::WorkspaceFile;

#[derive(Parser)]
#[command(name = "blockgrade", version, about = "Block program generator, sandbox and grader")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (defaults to ./blockgrade.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the source generated from a workspace file
    Generate(GenerateArgs),

    /// Run a workspace file (or a script file) in the sandbox
    Run(RunArgs),

    /// Grade a workspace against an exercise
    Verify(VerifyArgs),

    /// Grade a directory of workspaces against every exercise of a pack, in order
    Session(SessionArgs),

    /// Run .case.toml test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Workspace file (TOML)
    workspace: PathBuf,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Workspace file (.toml) or script source (any other extension)
    file: PathBuf,

    /// Print the generated source before running it
    #[arg(long)]
    show_source: bool,
}

#[derive(clap::Args)]
struct VerifyArgs {
    /// Workspace file (.toml) or script source
    file: PathBuf,

    /// Exercise pack (TOML)
    #[arg(short, long)]
    exercises: PathBuf,

    /// Id of the exercise to grade against
    #[arg(short = 'x', long)]
    exercise: u32,
}

#[derive(clap::Args)]
struct SessionArgs {
    /// Exercise pack (TOML)
    exercises: PathBuf,

    /// Directory holding one `<exercise id>.toml` workspace per exercise
    workspaces: PathBuf,

    /// Only exercises of this level
    #[arg(short, long)]
    level: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .case.toml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Generate(args) => do_generate(args),
        Command::Run(args) => do_run(args, &config.sandbox, cli.no_color),
        Command::Verify(args) => do_verify(args, &config.sandbox, cli.no_color),
        Command::Session(args) => do_session(args, &config.sandbox),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                return;
            }
            let exit_code = test_runner::run_tests(&args.path, cli.no_color, &args.category, &config.sandbox);
            process::exit(exit_code);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color { ColorChoice::Never } else { ColorChoice::Auto }
}

fn is_workspace_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

/// Generate a workspace file into a program, reporting unsupported blocks.
fn generate_workspace(path: &Path) -> Result<GeneratedProgram, String> {
    let workspace = WorkspaceFile::load(path)?.build()?;
    let program = Generator::standard().generate(&workspace);
    for diagnostic in &program.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    Ok(program)
}

/// The program source of `path`: generated from a workspace, or read as is.
fn load_source(path: &Path) -> Result<String, String> {
    if is_workspace_file(path) {
        Ok(generate_workspace(path)?.source)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
    }
}

fn do_generate(args: GenerateArgs) -> Result<bool, String> {
    let program = generate_workspace(&args.workspace)?;
    print!("{}", program.source);
    Ok(program.diagnostics.is_empty())
}

fn do_run(args: RunArgs, config: &SandboxConfig, no_color: bool) -> Result<bool, String> {
    let source = load_source(&args.file)?;
    if args.show_source {
        eprintln!("{}", source);
    }

    let mut sandbox = Sandbox::new(config.clone());
    let outcome = sandbox.run(&source);

    // The trailing `Error:` line is rendered as a diagnostic instead.
    let printed = match outcome.fault {
        Some(_) => outcome.output_lines.len().saturating_sub(1),
        None => outcome.output_lines.len(),
    };
    for line in &outcome.output_lines[..printed] {
        println!("{}", line);
    }
    if let Some(answer) = outcome.declared_answer {
        eprintln!("answer: {}", format_number(answer));
    }

    match outcome.fault {
        Some(fault) => {
            emit_fault(&args.file, &source, &fault, no_color);
            Ok(false)
        }
        None => Ok(true),
    }
}

fn emit_fault(path: &Path, source: &str, fault: &Fault, no_color: bool) {
    let Some(span) = &fault.span else {
        eprintln!("runtime error: {}", fault);
        return;
    };

    let mut files = SimpleFiles::new();
    let name = if is_workspace_file(path) {
        format!("{} (generated)", path.display())
    } else {
        path.display().to_string()
    };
    let file_id = files.add(name, source.to_string());

    let message = match &fault.error {
        RuntimeError::Syntax(_) => fault.to_string(),
        error => format!("{}: {}", error.kind(), error),
    };
    let diagnostic = Diagnostic::error()
        .with_message(message)
        .with_labels(vec![Label::primary(file_id, span.clone())]);
    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
}

fn load_exercise(pack: &Path, id: u32) -> Result<Exercise, String> {
    let pack = ExercisePack::load(pack)?;
    pack.find(id)
        .cloned()
        .ok_or_else(|| format!("no exercise with id {} in {}", id, pack_name(&pack)))
}

fn pack_name(pack: &ExercisePack) -> String {
    let levels: Vec<&str> = pack.levels.values().map(|l| l.name.as_str()).collect();
    if levels.is_empty() {
        "the pack".to_string()
    } else {
        format!("the pack ({})", levels.join(", "))
    }
}

fn do_verify(args: VerifyArgs, config: &SandboxConfig, no_color: bool) -> Result<bool, String> {
    let exercise = load_exercise(&args.exercises, args.exercise)?;
    let source = load_source(&args.file)?;

    let mut sandbox = Sandbox::new(config.clone());
    let verification = grader::verify(&mut sandbox, &source, &exercise).map_err(|e| e.to_string())?;

    print_exercise(&exercise);
    print_verification(&verification, no_color);
    Ok(verification.correct)
}

fn print_exercise(exercise: &Exercise) {
    eprintln!("{}", markdown::render(&format!("# {}. {}", exercise.id, exercise.title)));
    if !exercise.description.is_empty() {
        eprintln!("{}", markdown::render(&exercise.description));
    }
    eprintln!();
}

fn print_verification(verification: &Verification, no_color: bool) {
    for line in &verification.output_lines {
        println!("{}", line);
    }
    if let Some(results) = &verification.test_results {
        for result in results {
            print_test_result(result, no_color);
        }
    }
    let verdict = match (verification.correct, no_color) {
        (true, true) => "CORRECT",
        (true, false) => "\x1b[32mCORRECT\x1b[0m",
        (false, true) => "INCORRECT",
        (false, false) => "\x1b[31mINCORRECT\x1b[0m",
    };
    eprintln!("{}", verdict);
}

fn print_test_result(result: &TestResult, no_color: bool) {
    let label = match (result.passed, no_color) {
        (true, true) => "PASS",
        (true, false) => "\x1b[32mPASS\x1b[0m",
        (false, true) => "FAIL",
        (false, false) => "\x1b[31mFAIL\x1b[0m",
    };
    let actual = result
        .actual
        .as_ref()
        .map_or_else(|| "error".to_string(), ToString::to_string);
    eprintln!(
        "  {}  ({}) expected {}, got {}",
        label,
        grader::harness::render_args(&result.args),
        format_number(result.expected),
        actual
    );
}

fn do_session(args: SessionArgs, config: &SandboxConfig) -> Result<bool, String> {
    let pack = ExercisePack::load(&args.exercises)?;
    let exercises = pack.filtered(args.level.as_deref());
    let total = exercises.len();

    let mut progression = Progression::new();
    progression.load(exercises);
    let mut sandbox = Sandbox::new(config.clone());

    while let Some(exercise) = progression.current_exercise().cloned() {
        let path = args.workspaces.join(format!("{}.toml", exercise.id));
        let correct = if path.is_file() {
            let source = load_source(&path)?;
            let verification = grader::verify(&mut sandbox, &source, &exercise).map_err(|e| e.to_string())?;
            progression.record(verification.correct).map_err(|e| e.to_string())?
        } else {
            tracing::warn!(path = %path.display(), "no workspace for exercise");
            progression.record(false).map_err(|e| e.to_string())?
        };
        eprintln!(
            "  {}  {}. {}",
            if correct { "PASS" } else { "FAIL" },
            exercise.id,
            exercise.title
        );
        if !correct && let Some(hint) = exercise.hints.first() {
            eprintln!("        hint: {}", markdown::render(hint));
        }

        if progression.is_last() {
            progression.finish().map_err(|e| e.to_string())?;
        } else {
            progression.next_exercise().map_err(|e| e.to_string())?;
        }
    }

    let score = progression.score();
    let possible: u32 = progression.exercises().iter().map(|e| e.points).sum();
    eprintln!();
    eprintln!("score: {}/{} ({} exercises)", score, possible, total);
    Ok(matches!(progression.state(), State::Finished { score } if score == possible))
}
