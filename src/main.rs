mod report;

use paramesh::{Encoding, FilesystemSink, LengthUnit, Options, Sink, compile_verbose_with, logging};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    logging::init_tracing();

    let res = match compile_verbose_with(&config.target, &config.options) {
        Ok(res) => res,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    if config.stdout {
        match res.document.to_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let sink = match config.output {
        Some(dir) => FilesystemSink::new(dir),
        None => FilesystemSink::from_env(),
    };
    match sink.persist(&config.name, &res.document, &res.config) {
        Ok(location) => report::print_run(&config.target, &res, &location, config.color),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    target: PathBuf,
    name: String,
    output: Option<PathBuf>,
    options: Options,
    stdout: bool,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut target: Option<PathBuf> = None;
    let mut name: Option<String> = None;
    let mut output: Option<PathBuf> = None;
    let mut options = Options::default();
    let mut geometry_units: Option<LengthUnit> = None;
    let mut stdout = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |flag: &str| -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => args.next().ok_or_else(|| format!("error: {flag} expects a value")),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("paramesh {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--stdout" => stdout = true,
            "-e" | "--extension" => options.format = Some(value(&flag)?),
            "-n" | "--name" => name = Some(value(&flag)?),
            "-o" | "--output" => output = Some(PathBuf::from(value(&flag)?)),
            "-u" | "--units" => options.model_units = parse_unit(&flag, &value(&flag)?)?,
            "-g" | "--geometry-units" => geometry_units = Some(parse_unit(&flag, &value(&flag)?)?),
            "--encoding" => {
                options.encoding = value(&flag)?.parse::<Encoding>().map_err(|err| format!("error: {err}"))?
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if target.is_some() {
                    return Err("error: target directory provided multiple times".to_string());
                }
                target = Some(PathBuf::from(arg));
            }
        }
    }

    let Some(target) = target else {
        return Err(format!("error: no target directory provided\n\n{}", help_text()));
    };
    options.geometry_units = geometry_units.unwrap_or(options.model_units);
    let name = name.unwrap_or_else(|| default_name(&target));

    Ok(CliConfig { target, name, output, options, stdout, color })
}

fn parse_unit(flag: &str, value: &str) -> Result<LengthUnit, String> {
    value.parse().map_err(|_| format!("error: invalid {flag} '{value}' (expected mm, cm or in)"))
}

/// Base name of the target directory, resolving `.` and friends.
fn default_name(target: &Path) -> String {
    target
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| target.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "paramesh {version}

Compile exported meshes into a parametric mesh description.

Usage:
  paramesh [OPTIONS] <target_dir>

<target_dir> holds config.json, source.<ext> and optionally one
<param>.<ext> per parameter, exported with that parameter nudged.

Options:
  -e, --extension <ext>        Mesh format to use ({formats}).
                               Default: first source.<ext> found.
  -n, --name <name>            Model name. Default: target directory name.
  -o, --output <dir>           Output directory. Default: ${output_env}, else ./.build
  -u, --units <unit>           Units of parameter values (mm, cm, in). Default: cm
  -g, --geometry-units <unit>  Units of mesh coordinates. Default: --units
  --encoding <enc>             Mesh file encoding (latin1, utf8). Default: latin1
  --stdout                     Print the compiled document instead of writing it.
  --color                      Force ANSI color output.
  --no-color                   Disable ANSI color output.
  -h, --help                   Show this help message.
  -V, --version                Print version information.

Environment:
  {log_env}                 Log filter, e.g. paramesh=debug. Default: paramesh=info

Exit codes:
  0  Success.
  1  Compilation failed.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        formats = paramesh::format_ids().join(", "),
        output_env = paramesh::sink::OUTPUT_DIR_ENV,
        log_env = logging::LOG_ENV,
    )
}
