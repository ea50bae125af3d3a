use clap::Parser;
use log::info;
use optrace::{
    console::{Args, PartialArgs},
    error::{OptResult, OptraceError},
    registry::Registry,
    scenario::Scenario,
    tracer::TraceReport,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

fn write_report(report: &TraceReport, path: Option<&Path>) -> OptResult<()> {
    let yaml = serde_yaml::to_string(report)
        .map_err(|e| OptraceError::Other(format!("serialization of report failed: {e}")))?;
    match path {
        Some(path) => {
            let mut output = File::create(path)
                .map_err(|e| OptraceError::Other(format!("report file creation failed: {e}")))?;
            write!(output, "{yaml}")
                .map_err(|e| OptraceError::Other(format!("writing report file failed: {e}")))?;
            info!("report written to {}", path.display());
        }
        None => {
            print!("{yaml}");
            let _ = io::stdout().flush();
        }
    }
    Ok(())
}

fn main() -> OptResult<()> {
    env_logger::init();
    //parse CLI arguments
    let args = Args::try_from(PartialArgs::parse())?;

    //read scenario from file and apply overrides
    let mut scenario = Scenario::from_file(&args.file_path)?;
    if let Some(seed) = args.seed {
        scenario.set_seed(seed);
    }
    if let Some(nr_of_rays) = args.nr_of_rays {
        scenario.set_nr_of_rays(nr_of_rays)?;
    }

    //build and trace
    let (mut tracer, mut beam) = scenario.build(&Registry::default())?;
    let report = tracer.trace(&mut beam)?;

    write_report(&report, args.report_path.as_deref())
}
