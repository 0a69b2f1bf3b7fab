/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// error module
//
// a single error type for the library - everything fallible returns it
//
////////////////////////////////////////////////////////////////////////////////////

use super::stats::RunResult;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum OutbreakError {
    // parameter set rejected before the run starts
    Config(String),
    // the day cap was reached with infectious agents remaining
    NotConverged {
        max_days: usize,
        partial: Box<RunResult>,
    },
    Io(io::Error),
    Csv(csv::Error),
    Yaml(yaml_rust::ScanError),
    // missing or ill-typed entry in the parameter file
    Parameter(String),
    Logging(String),
}

impl OutbreakError {
    pub fn config<S: Into<String>>(msg: S) -> OutbreakError {
        OutbreakError::Config(msg.into())
    }

    // the partial result of a run that hit its day cap
    pub fn partial_result(&self) -> Option<&RunResult> {
        match self {
            OutbreakError::NotConverged { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

impl From<io::Error> for OutbreakError {
    fn from(error: io::Error) -> Self {
        OutbreakError::Io(error)
    }
}

impl From<csv::Error> for OutbreakError {
    fn from(error: csv::Error) -> Self {
        OutbreakError::Csv(error)
    }
}

impl From<yaml_rust::ScanError> for OutbreakError {
    fn from(error: yaml_rust::ScanError) -> Self {
        OutbreakError::Yaml(error)
    }
}

impl std::error::Error for OutbreakError {}

impl fmt::Display for OutbreakError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutbreakError::Config(msg) => write!(f, "Invalid parameters - {}", msg),
            OutbreakError::NotConverged { max_days, partial } => write!(
                f,
                "Outbreak did not die out within {} days ({} still infectious)",
                max_days,
                partial.final_infectious()
            ),
            OutbreakError::Io(e) => write!(f, "I/O error - {}", e),
            OutbreakError::Csv(e) => write!(f, "CSV error - {}", e),
            OutbreakError::Yaml(e) => write!(f, "YAML error - {}", e),
            OutbreakError::Parameter(msg) => write!(f, "Parameter file - {}", msg),
            OutbreakError::Logging(msg) => write!(f, "Logging setup - {}", msg),
        }
    }
}
