use std::{path::PathBuf, process};

use anyhow::{Context, Result, bail};
use equationer::{EquationRecord, get_units_scaling_ratio};
use log::warn;

const USAGE: &str = "\
Usage:
  equationer <record.json> [--output-only] [--no-evaluate] [--export <path>]
  equationer ratio <from-units> <to-units>";

struct Options {
    record: PathBuf,
    output_only: bool,
    evaluate: bool,
    export: Option<PathBuf>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut record = None;
    let mut output_only = false;
    let mut evaluate = true;
    let mut export = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--output-only" => output_only = true,
            "--no-evaluate" => evaluate = false,
            "--export" => {
                let path = iter.next().context("--export needs a path")?;
                export = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            path if record.is_none() => record = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{}'", extra),
        }
    }

    let record = record.context("missing record path")?;
    Ok(Options {
        record,
        output_only,
        evaluate,
        export,
    })
}

fn run_record(options: Options) -> Result<()> {
    let mut record = EquationRecord::from_json_file(&options.record)
        .with_context(|| format!("failed to load record '{}'", options.record.display()))?;

    if options.evaluate {
        let (_, failures) = record
            .evaluate()
            .with_context(|| format!("failed to evaluate '{}'", record.equation_string()))?
            .into_parts();
        for failure in &failures {
            warn!("Sample failed {}", failure);
        }
    }

    match options.export {
        Some(path) => {
            let written = record.export_to_json_file(&path, false, options.output_only)?;
            println!("Wrote {}", written.display());
        }
        None => println!("{}", record.to_json_string(true, false, options.output_only)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("-h") | Some("--help") => {
            eprintln!("{}", USAGE);
            process::exit(if args.is_empty() { 2 } else { 0 });
        }
        Some("ratio") => {
            let [from, to] = &args[1..] else {
                bail!("ratio takes exactly two unit expressions\n{}", USAGE);
            };
            let ratio = get_units_scaling_ratio(from, to)?;
            println!("{}", ratio);
            Ok(())
        }
        Some(_) => run_record(parse_options(&args)?),
    }
}
