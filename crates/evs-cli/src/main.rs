use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use evs_api::generate_sheet_code;
use evs_compiler::InstructionRegistry;
use evs_core::{Diagnostic, EventScriptError, Severity};
use walkdir::WalkDir;

#[derive(Debug, Parser)]
#[command(name = "evs-cli")]
#[command(about = "Event-sheet compiler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    Compile(CompileArgs),
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Event-sheet XML file, or a directory scanned for .xml files.
    input: String,
    #[arg(long = "catalog")]
    catalog: String,
    #[arg(long = "out-dir")]
    out_dir: Option<String>,
    #[arg(long = "json-diagnostics")]
    json_diagnostics: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("{error}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<(), EventScriptError> {
    match cli.command {
        Mode::Compile(args) => run_compile(args),
    }
}

fn run_compile(args: CompileArgs) -> Result<(), EventScriptError> {
    let catalog_source = read_file(Path::new(&args.catalog))?;
    let registry = InstructionRegistry::from_json(&catalog_source)?;

    let inputs = collect_inputs(Path::new(&args.input))?;
    if inputs.is_empty() {
        return Err(EventScriptError::new(
            "CLI_NO_INPUTS",
            format!("No .xml event sheets found under \"{}\".", args.input),
        ));
    }

    // One broken sheet must not sink the rest of the batch.
    let total = inputs.len();
    let mut failed = 0_usize;
    for input in &inputs {
        if let Err(error) = compile_sheet(input, &registry, &args) {
            eprintln!("{}: {error}", input.display());
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(EventScriptError::new(
            "CLI_SHEET_ERRORS",
            format!("{failed} of {total} event sheet(s) failed to compile."),
        ));
    }
    Ok(())
}

fn compile_sheet(
    input: &Path,
    registry: &InstructionRegistry,
    args: &CompileArgs,
) -> Result<(), EventScriptError> {
    let source = read_file(input)?;
    let generated = generate_sheet_code(&source, registry)?;
    report_diagnostics(input, &generated.diagnostics, args.json_diagnostics);

    let output = output_path(input, args.out_dir.as_deref().map(Path::new));
    fs::write(&output, &generated.code).map_err(|error| {
        EventScriptError::new(
            "CLI_WRITE_ERROR",
            format!("Cannot write \"{}\": {}.", output.display(), error),
        )
    })?;
    println!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, EventScriptError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(EventScriptError::new(
            "CLI_INPUT_NOT_FOUND",
            format!("Input \"{}\" is neither a file nor a directory.", input.display()),
        ));
    }

    let mut inputs: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|extension| extension == "xml"))
        .collect();
    inputs.sort();
    Ok(inputs)
}

fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let mut output = input.with_extension("rhai");
    if let (Some(out_dir), Some(file_name)) = (out_dir, output.file_name()) {
        output = out_dir.join(file_name);
    }
    output
}

fn read_file(path: &Path) -> Result<String, EventScriptError> {
    fs::read_to_string(path).map_err(|error| {
        EventScriptError::new(
            "CLI_READ_ERROR",
            format!("Cannot read \"{}\": {}.", path.display(), error),
        )
    })
}

fn report_diagnostics(input: &Path, diagnostics: &[Diagnostic], as_json: bool) {
    if diagnostics.is_empty() {
        return;
    }

    if as_json {
        match serde_json::to_string(diagnostics) {
            Ok(json) => eprintln!("{json}"),
            Err(error) => eprintln!("cannot serialize diagnostics: {error}"),
        }
        return;
    }

    for diagnostic in diagnostics {
        let severity = match diagnostic.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!(
            "{}: {severity} {}: {}",
            input.display(),
            diagnostic.code,
            diagnostic.message
        );
    }
}
