use thiserror::Error;

/// Mistakes in a binding definition: malformed tags, field shapes the tag
/// cannot drive, or layouts that lost track of an expand key.
///
/// These are never data problems. Callers should treat them as bugs in the
/// record type and fix the annotation rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid font tag `{prop}`: expected `font{{size:14 color:FF0000}}`")]
    MalformedFont { prop: String },

    #[error("invalid font color `{color}`: expected six hex digits such as `FF0000`")]
    FontColor { color: String },

    #[error("invalid font size `{size}`")]
    FontSize { size: String },

    #[error("unknown expand kind `{kind}` (expected date, datetime, month or regexp(...))")]
    ExpandKind { kind: String },

    #[error("invalid expand pattern `{pattern}`: {message}")]
    ExpandPattern { pattern: String, message: String },

    #[error("field `{field}` is tagged expand but is not a map")]
    ExpandNotMap { field: String },

    #[error("map field `{field}` needs an `expand:` directive")]
    MapWithoutExpand { field: String },

    #[error("list field `{field}` needs a `split:<sep>` directive")]
    ListWithoutSplit { field: String },

    #[error("expand key `{key}` of field `{field}` is not in the column model")]
    UnplannedExpandKey { field: String, key: String },

    #[error("field `{field}` has a value but no column in the header row")]
    MissingColumn { field: String },
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("unsupported cell type `{kind}`, add a conversion for it")]
    UnsupportedKind { kind: String },

    #[error("{address}: cannot convert `{text}` to {target}")]
    Conversion {
        address: String,
        text: String,
        target: String,
    },

    #[error("{address}: field `{field}` rejected the converted value")]
    FieldMismatch { field: String, address: String },

    #[error("sheet `{sheet}` has no data")]
    EmptySheet { sheet: String },

    #[error("sheet `{sheet}` is missing")]
    SheetMissing { sheet: String },

    #[error("{backend}: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("fetching `{url}` failed: {message}")]
    Fetch { url: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// Wrap a collaborator error, keeping its message and naming the backend.
    pub fn from_backend<E: std::error::Error>(backend: &'static str, err: E) -> Self {
        SheetError::Backend {
            backend,
            message: err.to_string(),
        }
    }

    pub(crate) fn conversion(address: &str, text: &str, target: impl ToString) -> Self {
        SheetError::Conversion {
            address: address.to_string(),
            text: text.to_string(),
            target: target.to_string(),
        }
    }

    /// True for errors caused by the binding definition rather than the data.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            SheetError::Schema(_) | SheetError::UnsupportedKind { .. }
        )
    }
}
