use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Sales store unavailable: {reason}")]
    StorageUnavailable { reason: String },

    #[error("No customers to average")]
    EmptyPopulation,

    #[error("Population mean lifespan is zero days; CLV is undefined")]
    DegenerateLifespan,

    #[error("Malformed row at line {line}: {field} = {value:?}")]
    MalformedRow {
        line: usize,
        field: String,
        value: String,
    },

    #[error("Customer count {customers} exceeds recursion limit {limit}")]
    RecursionLimit { customers: usize, limit: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
