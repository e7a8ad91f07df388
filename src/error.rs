use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a dendrogram from being rendered.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("cannot read linkage file '{}': {source}", path.display())]
    LinkageUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dimension mismatch: {leaves} leaves vs {labels} labels")]
    DimensionMismatch { leaves: usize, labels: usize },

    #[error("malformed linkage row at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("invalid linkage at row {row}: {message}")]
    InvalidLinkage { row: usize, message: String },

    #[error("linkage matrix has no merges")]
    EmptyLinkage,

    #[error("merge distance decreases at row {row} ({distance} < {previous})")]
    NonMonotonic { row: usize, distance: f64, previous: f64 },

    #[error("unsupported output format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl PlotError {
    pub fn malformed<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Malformed { line, message: message.into() }
    }

    pub fn invalid<S: Into<String>>(row: usize, message: S) -> Self {
        Self::InvalidLinkage { row, message: message.into() }
    }
}
