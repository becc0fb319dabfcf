//! xlsx workbooks backed by umya-spreadsheet.

use crate::backends::UmyaWorksheet;
use crate::error::SheetError;
use crate::session::{Sheet, SheetConfig};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, reader::xlsx, writer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILENAME: &str = "export.xlsx";
pub const DEFAULT_SHEET: &str = "Sheet1";

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkbookConfig {
    /// Used by [`Workbook::save`] and [`Workbook::download`].
    pub filename: String,
    /// Name of the sheet a fresh workbook starts with. It is replaced by the
    /// first sheet added.
    pub default_sheet: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_FILENAME.to_string(),
            default_sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

fn umya_err(err: umya_spreadsheet::XlsxError) -> SheetError {
    SheetError::from_backend("umya", err)
}

fn umya_msg(message: &str) -> SheetError {
    SheetError::Backend {
        backend: "umya",
        message: message.to_string(),
    }
}

pub struct Workbook {
    book: Spreadsheet,
    config: WorkbookConfig,
    /// Still holding only the placeholder sheet of a fresh workbook.
    pristine: bool,
}

impl Workbook {
    pub fn new(filename: impl Into<String>) -> Self {
        Self::with_config(WorkbookConfig {
            filename: filename.into(),
            ..WorkbookConfig::default()
        })
    }

    pub fn with_config(config: WorkbookConfig) -> Self {
        Self {
            book: umya_spreadsheet::new_file(),
            config,
            pristine: true,
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let book = xlsx::read(path).map_err(umya_err)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "opened workbook");
        Ok(Self::from_book(book, filename))
    }

    pub fn open_reader<R: Read>(mut reader: R) -> Result<Self, SheetError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::open_bytes(buf)
    }

    pub fn open_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let book = xlsx::read_reader(Cursor::new(bytes), true).map_err(umya_err)?;
        Ok(Self::from_book(book, DEFAULT_FILENAME.to_string()))
    }

    /// Fetch and open a remote workbook. Any non-2xx status is an error.
    #[cfg(feature = "webservice")]
    pub fn open_url(url: &str) -> Result<Self, SheetError> {
        let fetch_err = |message: String| SheetError::Fetch {
            url: url.to_string(),
            message,
        };
        let resp = reqwest::blocking::get(url).map_err(|e| fetch_err(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("unexpected status {status}")));
        }
        let bytes = resp.bytes().map_err(|e| fetch_err(e.to_string()))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(url, len = bytes.len(), "fetched workbook");
        let mut book = Self::open_bytes(bytes.to_vec())?;
        if let Some(name) = url
            .rsplit('/')
            .next()
            .filter(|n| n.ends_with(".xlsx"))
        {
            book.config.filename = name.to_string();
        }
        Ok(book)
    }

    fn from_book(book: Spreadsheet, filename: String) -> Self {
        Self {
            book,
            config: WorkbookConfig {
                filename,
                ..WorkbookConfig::default()
            },
            pristine: false,
        }
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    pub fn filename(&self) -> &str {
        &self.config.filename
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.config.filename = filename.into();
    }

    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    pub fn into_spreadsheet(self) -> Spreadsheet {
        self.book
    }

    pub fn sheet_names(&self) -> Vec<String> {
        (0..self.book.get_sheet_count())
            .filter_map(|i| self.book.get_sheet(&i))
            .map(|ws| ws.get_name().to_string())
            .collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        (0..self.book.get_sheet_count())
            .find(|i| self.book.get_sheet(i).is_some_and(|ws| ws.get_name() == name))
    }

    /// Create (or reuse) a sheet named `name` for writing, with auto-header on.
    ///
    /// The first sheet added to a fresh workbook replaces its placeholder sheet.
    pub fn add_sheet(&mut self, name: &str) -> Result<Sheet<UmyaWorksheet<'_>>, SheetError> {
        let reuse_placeholder = self.pristine && name == self.config.default_sheet;
        if !reuse_placeholder {
            if self.index_of(name).is_none() {
                self.book.new_sheet(name).map_err(umya_msg)?;
            }
            if self.pristine && self.index_of(&self.config.default_sheet).is_some() {
                self.book
                    .remove_sheet_by_name(&self.config.default_sheet)
                    .map_err(umya_msg)?;
            }
        }
        self.pristine = false;
        self.book.read_sheet_collection();

        let index = self.index_of(name).ok_or_else(|| SheetError::SheetMissing {
            sheet: name.to_string(),
        })?;
        self.bind(index, SheetConfig::default(), false)
    }

    /// Bind an existing sheet with auto-header off. Writes continue below the
    /// last used row.
    pub fn open_sheet(&mut self, name: &str) -> Result<Sheet<UmyaWorksheet<'_>>, SheetError> {
        let index = self.index_of(name).ok_or_else(|| SheetError::SheetMissing {
            sheet: name.to_string(),
        })?;
        self.open_sheet_at(index)
    }

    pub fn open_sheet_at(&mut self, index: usize) -> Result<Sheet<UmyaWorksheet<'_>>, SheetError> {
        let config = SheetConfig {
            auto_header: false,
            ..SheetConfig::default()
        };
        self.bind(index, config, true)
    }

    fn bind(
        &mut self,
        index: usize,
        config: SheetConfig,
        resume: bool,
    ) -> Result<Sheet<UmyaWorksheet<'_>>, SheetError> {
        self.book.read_sheet(index);
        let ws = self
            .book
            .get_sheet_mut(&index)
            .ok_or_else(|| SheetError::SheetMissing {
                sheet: format!("#{index}"),
            })?;
        let backend = UmyaWorksheet::new(ws);
        let start = if resume { backend.last_row() } else { 0 };
        Ok(Sheet::with_config(backend, config)
            .at_index(index)
            .starting_after(start))
    }

    pub fn delete_sheet(&mut self, name: &str) -> Result<(), SheetError> {
        if self.index_of(name).is_none() {
            return Err(SheetError::SheetMissing {
                sheet: name.to_string(),
            });
        }
        self.book.remove_sheet_by_name(name).map_err(umya_msg)
    }

    fn prepare_save(&mut self) {
        for i in 0..self.book.get_sheet_count() {
            self.book.read_sheet(i);
        }
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>, SheetError> {
        self.prepare_save();
        let mut buf = Cursor::new(Vec::new());
        writer::xlsx::write_writer(&self.book, &mut buf).map_err(umya_err)?;
        Ok(buf.into_inner())
    }

    /// Save under the configured filename.
    pub fn save(&mut self) -> Result<(), SheetError> {
        let filename = self.config.filename.clone();
        self.save_as(filename)
    }

    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SheetError> {
        self.prepare_save();
        writer::xlsx::write(&self.book, path.as_ref()).map_err(umya_err)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.as_ref().display(), "saved workbook");
        Ok(())
    }

    pub fn download(&mut self) -> Result<Download, SheetError> {
        Ok(Download {
            filename: self.config.filename.clone(),
            body: self.to_bytes()?,
        })
    }
}

/// A serialized workbook ready to be sent as an attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    filename: String,
    body: Vec<u8>,
}

impl Download {
    pub const CONTENT_TYPE: &'static str = "application/vnd.ms-excel";

    pub fn new(filename: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            body,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Accept-Length", self.body.len().to_string()),
            ("Content-Type", Self::CONTENT_TYPE.to_string()),
            (
                "Access-Control-Expose-Headers",
                "Content-Disposition".to_string(),
            ),
            (
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            ),
        ]
    }

    /// Write a complete `200 OK` HTTP/1.1 response.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(out, "HTTP/1.1 200 OK\r\n")?;
        for (name, value) in self.headers() {
            write!(out, "{name}: {value}\r\n")?;
        }
        write!(out, "Content-Length: {}\r\n\r\n", self.body.len())?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sheet_replaces_placeholder() {
        let mut book = Workbook::new("report.xlsx");
        assert_eq!(book.sheet_names(), vec![DEFAULT_SHEET.to_string()]);
        {
            let sheet = book.add_sheet("People").unwrap();
            assert_eq!(sheet.index(), Some(0));
        }
        book.add_sheet("Pets").unwrap();
        assert_eq!(book.sheet_names(), vec!["People".to_string(), "Pets".to_string()]);
    }

    #[test]
    fn placeholder_can_be_claimed_by_name() {
        let mut book = Workbook::new("report.xlsx");
        book.add_sheet(DEFAULT_SHEET).unwrap();
        assert_eq!(book.sheet_names(), vec![DEFAULT_SHEET.to_string()]);
    }

    #[test]
    fn missing_sheets() {
        let mut book = Workbook::new("report.xlsx");
        assert!(matches!(
            book.open_sheet("nope"),
            Err(SheetError::SheetMissing { .. })
        ));
        assert!(matches!(
            book.delete_sheet("nope"),
            Err(SheetError::SheetMissing { .. })
        ));
    }

    #[test]
    fn download_headers_and_response() {
        let dl = Download::new("out.xlsx", vec![1, 2, 3]);
        let headers = dl.headers();
        assert!(headers.contains(&("Accept-Length", "3".to_string())));
        assert!(headers.contains(&("Content-Type", "application/vnd.ms-excel".to_string())));
        assert!(headers.contains(&(
            "Content-Disposition",
            "attachment; filename=\"out.xlsx\"".to_string()
        )));

        let mut raw = Vec::new();
        dl.write_to(&mut raw).unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Access-Control-Expose-Headers: Content-Disposition\r\n"));
        assert!(raw.ends_with(&[b'\r', b'\n', b'\r', b'\n', 1, 2, 3]));
    }

    #[cfg(feature = "webservice")]
    #[test]
    fn unreachable_url_is_fetch_error() {
        assert!(matches!(
            Workbook::open_url("http://127.0.0.1:9/book.xlsx"),
            Err(SheetError::Fetch { .. })
        ));
    }
}
