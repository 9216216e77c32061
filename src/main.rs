extern crate rdsap;

use anyhow::bail;
use clap::Parser;
use rdsap::output::FileOutput;
use rdsap::{run_project, ProjectFlags};
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct SapArgs {
    #[arg(help = "Path to a dwelling, or an array of dwellings, in .json format")]
    input_file: String,
    #[arg(
        long,
        default_value_t = false,
        help = "Treat input as RdSAP survey data and complete it from the Appendix S tables"
    )]
    rdsap: bool,
    #[arg(
        long,
        short,
        default_value_t = false,
        help = "Run preprocessing step only, skipping validation"
    )]
    preprocess_only: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Exit with an error if any dwelling fails validation"
    )]
    strict: bool,
    #[clap(long, default_value_t = Level::INFO, help = "Maximum level of log output")]
    log_level: Level,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

fn main() -> anyhow::Result<()> {
    let args = SapArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(args.log_level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)?;

    let input_file = args.input_file.as_str();
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let input_file_stem = PathBuf::from(input_file_stem);
    let input_file_name = input_file_stem
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("dwellings");

    let mut output_path = PathBuf::new();
    output_path.push(format!("{}__results", input_file_stem.display()));
    fs::create_dir_all(&output_path)?;

    let project_flags: ProjectFlags = (&args).into();
    let output_type = output_type_from_flags(&project_flags);
    let file_output = FileOutput::new(
        output_path.clone(),
        format!("{input_file_name}__{output_type}__{{}}.{{}}"),
    );

    let results = run_project(
        BufReader::new(File::open(Path::new(input_file))?),
        &file_output,
        &project_flags,
    )?;

    let summary = results.summary;
    info!(
        "{} processed, {} completed, {} failed, {} with validation violations; results written to {}",
        summary.processed,
        summary.completed,
        summary.failed,
        summary.with_violations,
        output_path.display()
    );

    if !summary.is_success(&project_flags) {
        bail!(
            "{} of {} dwelling(s) did not pass",
            summary.failed
                + if project_flags.contains(ProjectFlags::STRICT_VALIDATION) {
                    summary.with_violations
                } else {
                    0
                },
            summary.processed
        );
    }

    Ok(())
}

fn output_type_from_flags(flags: &ProjectFlags) -> &str {
    if flags.contains(ProjectFlags::RDSAP_COMPLETION) {
        "RdSAP"
    } else {
        "SAP"
    }
}

impl From<&SapArgs> for ProjectFlags {
    fn from(args: &SapArgs) -> Self {
        let mut flags = ProjectFlags::empty();
        if args.rdsap {
            flags.insert(ProjectFlags::RDSAP_COMPLETION);
        }
        if args.preprocess_only {
            flags.insert(ProjectFlags::PREPROCESS_ONLY);
        }
        if args.strict {
            flags.insert(ProjectFlags::STRICT_VALIDATION);
        }

        flags
    }
}
