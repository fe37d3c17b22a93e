use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use strahlensatz::{
    Backend, BackendKind, BatchOptions, BackgroundStyle, TaskSpec, catalog, run_all,
    tasks_from_json,
};

fn usage() -> ! {
    eprintln!("Usage: cargo xtask <command>");
    eprintln!("Commands:");
    eprintln!("  generate    Render exercises");
    eprintln!();
    eprintln!("Options for generate:");
    eprintln!("  --backend raster|page|applet|archive|all   (default: all)");
    eprintln!("  --tasks FILE.json                          (default: built-in tasks)");
    eprintln!("  --out DIR                                  (default: out)");
    eprintln!("  --grid                                     draw a background grid");
    std::process::exit(1);
}

struct GenerateArgs {
    backends: Vec<BackendKind>,
    tasks: Option<Utf8PathBuf>,
    out: Utf8PathBuf,
    grid: bool,
}

fn parse_generate(args: &[String]) -> GenerateArgs {
    let mut parsed = GenerateArgs {
        backends: BackendKind::ALL.to_vec(),
        tasks: None,
        out: Utf8PathBuf::from("out"),
        grid: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--backend" => {
                let Some(name) = iter.next() else { usage() };
                parsed.backends = match name.as_str() {
                    "all" => BackendKind::ALL.to_vec(),
                    other => match BackendKind::from_name(other) {
                        Some(kind) => vec![kind],
                        None => {
                            eprintln!("Unknown backend: {other}");
                            usage()
                        }
                    },
                };
            }
            "--tasks" => {
                let Some(path) = iter.next() else { usage() };
                parsed.tasks = Some(Utf8PathBuf::from(path));
            }
            "--out" => {
                let Some(path) = iter.next() else { usage() };
                parsed.out = Utf8PathBuf::from(path);
            }
            "--grid" => parsed.grid = true,
            other => {
                eprintln!("Unknown option: {other}");
                usage()
            }
        }
    }
    parsed
}

fn load_tasks(path: Option<&Utf8Path>) -> miette::Result<Vec<TaskSpec>> {
    let Some(path) = path else {
        return Ok(catalog::tasks());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("failed to read {path}: {e}"))?;
    Ok(tasks_from_json(&json)?)
}

fn generate(args: GenerateArgs) -> miette::Result<bool> {
    let specs = load_tasks(args.tasks.as_deref())?;
    let options = BatchOptions {
        background: if args.grid { BackgroundStyle::Grid } else { BackgroundStyle::Plain },
        ..BatchOptions::default()
    };

    // Extensions differ per backend, so the runs never write the same file
    let reports: Vec<_> = args
        .backends
        .par_iter()
        .map(|&kind| {
            let backend = Backend::for_kind(kind);
            (kind, run_all(&specs, &backend, args.out.as_std_path(), &options))
        })
        .collect();

    let mut ok = true;
    for (kind, report) in &reports {
        eprintln!(
            "{:<8} {} written, {} failed",
            kind.name(),
            report.count(),
            report.failures.len()
        );
        for failure in &report.failures {
            ok = false;
            eprintln!("  task {} ({}): {}", failure.number, failure.stem, failure.error);
        }
    }
    eprintln!("Output: {}", args.out);
    Ok(ok)
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }

    match args[1].as_str() {
        "generate" => {
            if !generate(parse_generate(&args[2..]))? {
                std::process::exit(1);
            }
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            usage()
        }
    }
}
