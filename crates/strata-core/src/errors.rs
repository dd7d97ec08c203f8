use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that crosses a crate boundary is classified by one of these
/// kinds. Each kind maps to a stable error code used by the run result, the
/// invocation handler and the logging facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Collaborator I/O
    /// Source table unreadable (connectivity, query failure)
    SourceRead,
    /// Object-store get/put/copy/delete/list failure
    StoreIo,

    // Reconciliation
    /// Previous snapshot and freshly read rows disagree on the column set
    SchemaMismatch,
    /// Stored bytes are not a valid snapshot (ragged or duplicate columns, bad JSON)
    InvalidSnapshot,
    /// An archive entry already exists with different content
    ConstraintViolation,
    /// A copy source does not exist
    NotFound,

    // Startup / input
    /// Required external configuration missing or malformed
    Configuration,
    InvalidInput,

    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::SourceRead => "ERR_SOURCE_READ",
            ExErrorKind::StoreIo => "ERR_STORE_IO",
            ExErrorKind::SchemaMismatch => "ERR_SCHEMA_MISMATCH",
            ExErrorKind::InvalidSnapshot => "ERR_INVALID_SNAPSHOT",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus the extraction context the failure happened
/// in. Wrapping layers add context by boxing the lower error as `source`, so
/// the original cause is never lost.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    table: Option<String>,
    run_ts: Option<String>,
    key: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            run_ts: None,
            key: None,
            message: String::new(),
            source: None,
        }
    }

    /// Wrap `cause` with additional context, keeping its kind
    pub fn wrap(cause: ExError) -> Self {
        Self::new(cause.kind).with_source(cause)
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add source table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add run timestamp context
    pub fn with_run_ts(mut self, run_ts: impl Into<String>) -> Self {
        self.run_ts = Some(run_ts.into());
        self
    }

    /// Add object key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Table context, searching wrapped causes if this layer has none
    pub fn table(&self) -> Option<&str> {
        self.table
            .as_deref()
            .or_else(|| self.source.as_deref().and_then(|s| s.table()))
    }

    pub fn run_ts(&self) -> Option<&str> {
        self.run_ts.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }

    /// The innermost wrapped error (self if nothing is wrapped)
    pub fn root_cause(&self) -> &ExError {
        let mut current = self;
        while let Some(next) = current.source.as_deref() {
            current = next;
        }
        current
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(run_ts) = &self.run_ts {
            write!(f, " (run_ts: {})", run_ts)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(source) = &self.source {
            write!(f, "; caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Validation and codec errors for the snapshot model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// A column's length differs from the first column's length
    #[error("Column '{column}' has {found} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    /// The same column name appears twice
    #[error("Duplicate column: {column}")]
    DuplicateColumn { column: String },

    /// A source row is wider or narrower than the column list
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Two snapshots cannot be merged because their column sets differ
    #[error("Column set mismatch: expected {expected:?}, found {found:?}")]
    ColumnSetMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Failed to decode snapshot: {message}")]
    Decode { message: String },

    #[error("Failed to encode snapshot: {message}")]
    Encode { message: String },
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        let kind = match &err {
            SnapshotError::ColumnSetMismatch { .. } => ExErrorKind::SchemaMismatch,
            SnapshotError::Encode { .. } => ExErrorKind::Serialization,
            SnapshotError::RaggedColumn { .. }
            | SnapshotError::DuplicateColumn { .. }
            | SnapshotError::RowWidth { .. }
            | SnapshotError::Decode { .. } => ExErrorKind::InvalidSnapshot,
        };
        ExError::new(kind).with_message(err.to_string())
    }
}
