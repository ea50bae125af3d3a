//! Handling the optrace CLI
//!
//! This module handles the command line parsing and the validation of the given arguments.
use crate::error::{OptResult, OptraceError};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Validated command line arguments of the optrace application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// file path of the scenario which should be traced
    pub file_path: PathBuf,
    /// file the YAML report is written to (stdout if not given)
    pub report_path: Option<PathBuf>,
    /// seed overriding the seed of the scenario
    pub seed: Option<u64>,
    /// number of rays overriding the one of the scenario
    pub nr_of_rays: Option<usize>,
}

/// Raw command line arguments as parsed by clap.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct PartialArgs {
    /// file path of the scenario (.yaml or .yml) to read in
    #[arg(short, long)]
    file_path: String,

    /// file the report should be written to. if not defined, the report is printed to stdout
    #[arg(short, long)]
    report_path: Option<String>,

    /// seed of the random generator (overrides the scenario)
    #[arg(short, long)]
    seed: Option<u64>,

    /// number of rays (overrides the scenario)
    #[arg(short, long)]
    nr_of_rays: Option<usize>,
}

/// Checks if the passed file path is valid.
/// # Attributes
/// * `path`: Path to the file
/// # Returns
/// Returns True if the file exists and has a YAML extension, false otherwise
fn file_path_is_valid(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml")
}

fn eval_file_path_input(file_path: &str) -> Option<PathBuf> {
    let path = Path::new(file_path);
    file_path_is_valid(path).then(|| path.to_path_buf())
}

/// Evaluates if the passed report path is valid.
/// # Returns
/// * the report path if its parent directory exists
/// * None if the directory does not exist or the path points to a directory
fn eval_report_path_input(report_path: &str) -> Option<PathBuf> {
    let path = Path::new(report_path);
    if report_path.is_empty() || path.is_dir() {
        return None;
    }
    let parent_exists = path
        .parent()
        .map_or(true, |p| p.as_os_str().is_empty() || p.is_dir());
    parent_exists.then(|| path.to_path_buf())
}

impl TryFrom<PartialArgs> for Args {
    type Error = OptraceError;

    fn try_from(part_args: PartialArgs) -> OptResult<Self> {
        let file_path = eval_file_path_input(&part_args.file_path).ok_or_else(|| {
            OptraceError::Console(format!(
                "invalid scenario file {}: the file must exist and end in .yaml or .yml",
                part_args.file_path
            ))
        })?;
        let report_path = part_args
            .report_path
            .as_deref()
            .map(|r| {
                eval_report_path_input(r).ok_or_else(|| {
                    OptraceError::Console(format!("invalid report path {r}"))
                })
            })
            .transpose()?;
        if part_args.nr_of_rays == Some(0) {
            return Err(OptraceError::Console("number of rays must be > 0".into()));
        }
        Ok(Self {
            file_path,
            report_path,
            seed: part_args.seed,
            nr_of_rays: part_args.nr_of_rays,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    #[test]
    fn file_path_is_valid_test() {
        assert!(file_path_is_valid(Path::new(
            "./files_for_testing/newtonian.yaml"
        )));
        assert!(!file_path_is_valid(Path::new(
            "./files_for_testing/nonexistent.yaml"
        )));
        assert!(!file_path_is_valid(Path::new(
            "./files_for_testing/this_dir_does_not_exist/empty.yaml"
        )));
        assert!(!file_path_is_valid(Path::new(
            "./files_for_testing/not_a_scenario.txt"
        )));
        assert!(!file_path_is_valid(Path::new("./files_for_testing/")));
    }
    #[test]
    fn eval_file_path_input_test() {
        let path_valid = "./files_for_testing/newtonian.yaml";
        assert_eq!(
            eval_file_path_input(path_valid),
            Some(PathBuf::from(path_valid))
        );
        assert_eq!(eval_file_path_input("./files_for_testing/nonexistent.yaml"), None);
    }
    #[test]
    fn eval_report_path_input_test() {
        assert_eq!(eval_report_path_input(""), None);
        assert_eq!(eval_report_path_input("./files_for_testing"), None);
        assert_eq!(
            eval_report_path_input("non_existent_path/still_not_existent/report.yaml"),
            None
        );
        assert_eq!(
            eval_report_path_input("./files_for_testing/report.yaml"),
            Some(PathBuf::from("./files_for_testing/report.yaml"))
        );
        assert_eq!(
            eval_report_path_input("report.yaml"),
            Some(PathBuf::from("report.yaml"))
        );
    }
    #[test]
    fn try_from_partial_args() {
        let args = Args::try_from(PartialArgs::parse_from([
            "optrace",
            "-f",
            "./files_for_testing/newtonian.yaml",
            "-s",
            "7",
            "-n",
            "10",
        ]))
        .unwrap();
        assert_eq!(args.file_path, PathBuf::from("./files_for_testing/newtonian.yaml"));
        assert_eq!(args.report_path, None);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.nr_of_rays, Some(10));
    }
    #[test]
    fn try_from_invalid() {
        assert_matches!(
            Args::try_from(PartialArgs::parse_from([
                "optrace",
                "-f",
                "./files_for_testing/not_a_scenario.txt",
            ])),
            Err(OptraceError::Console(_))
        );
        assert_matches!(
            Args::try_from(PartialArgs::parse_from([
                "optrace",
                "-f",
                "./files_for_testing/newtonian.yaml",
                "-n",
                "0",
            ])),
            Err(OptraceError::Console(_))
        );
        assert_matches!(
            Args::try_from(PartialArgs::parse_from([
                "optrace",
                "-f",
                "./files_for_testing/newtonian.yaml",
                "-r",
                "./files_for_testing",
            ])),
            Err(OptraceError::Console(_))
        );
    }
}
