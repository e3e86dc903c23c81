use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Degenerate elimination rate ({rate} /h) from patient/drug combination")]
    DegenerateEliminationRate { rate: f64 },

    #[error("Numeric divergence in bacterial dynamics at t = {time} h")]
    NumericDivergence { time: f64 },

    #[error("No viable regimen: every grid-search candidate failed")]
    NoViableRegimen,
}

pub type SimResult<T> = Result<T, SimError>;
