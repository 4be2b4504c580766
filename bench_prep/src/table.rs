//! Datasets as polars frames, and CSV I/O
//!
//! Every column is read as `Utf8` with schema inference switched off, so
//! cells keep the exact spelling of the source file. Only the columns a stage
//! rewrites (the forecast target) change; every other column round-trips
//! byte-for-byte into the output tables. Empty cells are held as nulls and
//! written back as empty fields.

use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Cell spellings treated as a missing value (compared case-insensitively)
const MISSING_MARKERS: [&str; 9] = [
    "", "na", "n/a", "nan", "-nan", "null", "none", "<na>", "#n/a",
];

/// Whether a cell holds a missing value
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Empty cells become nulls
fn cell(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Same column as `Utf8`, with empty strings turned into nulls
fn utf8_series(series: &Series) -> Result<Series> {
    let text = series.cast(&DataType::Utf8)?;
    let cells: Vec<Option<&str>> = text.utf8()?.into_iter().map(|c| c.and_then(cell)).collect();
    Ok(Series::new(series.name(), cells))
}

/// A data frame whose columns are all `Utf8`
#[derive(Debug, Clone, Default)]
pub struct Table {
    df: DataFrame,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns() == other.columns() && self.df.frame_equal_missing(&other.df)
    }
}

impl Table {
    /// Create a table from rows of cells; every row must be full width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PrepError::DataError(format!(
                    "Row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    columns.len()
                )));
            }
        }

        let series: Vec<Series> = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<Option<&str>> = rows.iter().map(|r| cell(&r[idx])).collect();
                Series::new(name, cells)
            })
            .collect();
        Ok(Self {
            df: DataFrame::new(series)?,
        })
    }

    /// Create a table from string slices (handy for fixtures)
    pub fn from_strs(columns: &[&str], rows: &[Vec<&str>]) -> Result<Self> {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Wrap a data frame, casting every column to `Utf8`
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let series = df
            .get_columns()
            .iter()
            .map(utf8_series)
            .collect::<Result<Vec<Series>>>()?;
        Ok(Self {
            df: DataFrame::new(series)?,
        })
    }

    /// Underlying data frame
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    /// Column names in order
    pub fn columns(&self) -> Vec<&str> {
        self.df.get_column_names()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.df.width()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns().contains(&name)
    }

    /// Fail when a column is absent
    pub fn require_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(PrepError::DataError(format!(
                "Column '{}' not found (available: {})",
                name,
                self.columns().join(", ")
            )))
        }
    }

    /// Typed view of one column
    pub fn utf8(&self, name: &str) -> Result<&Utf8Chunked> {
        self.require_column(name)?;
        Ok(self.df.column(name)?.utf8()?)
    }

    /// Cells of one column, top to bottom; nulls read as empty strings
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        Ok(self
            .utf8(name)?
            .into_iter()
            .map(|c| c.unwrap_or(""))
            .collect())
    }

    /// First non-missing cell of a column
    pub fn first_present(&self, name: &str) -> Result<Option<&str>> {
        Ok(self
            .utf8(name)?
            .into_iter()
            .flatten()
            .find(|c| !is_missing(c)))
    }

    /// New table holding the given rows, in the given order
    pub fn take_rows(&self, indices: &[usize]) -> Result<Table> {
        let idx = IdxCa::from_vec("row", indices.iter().map(|&i| i as IdxSize).collect());
        Ok(Table {
            df: self.df.take(&idx)?,
        })
    }

    /// Keep only the named columns, in the order given
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            self.require_column(name)?;
        }
        Ok(Table {
            df: self.df.select(names.to_vec())?,
        })
    }

    /// Remove the named columns; every name must exist
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            self.require_column(name)?;
        }
        Ok(Table {
            df: self.df.drop_many(names),
        })
    }

    /// Replace the cells of one column
    pub fn with_column_values(self, name: &str, values: Vec<String>) -> Result<Table> {
        self.require_column(name)?;
        if values.len() != self.height() {
            return Err(PrepError::DataError(format!(
                "Column '{}' replacement has {} values for {} rows",
                name,
                values.len(),
                self.height()
            )));
        }
        let cells: Vec<Option<&str>> = values.iter().map(|v| cell(v)).collect();
        let mut df = self.df;
        df.with_column(Series::new(name, cells))?;
        Ok(Table { df })
    }

    /// Rename a column in place
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        self.require_column(from)?;
        if from != to && self.has_column(to) {
            return Err(PrepError::DataError(format!(
                "Cannot rename '{}' to existing column '{}'",
                from, to
            )));
        }
        self.df.rename(from, to)?;
        Ok(())
    }

    /// Drop exact duplicate rows, keeping first occurrences in order
    pub fn dedup_rows(&self) -> Result<Table> {
        Ok(Table {
            df: self
                .df
                .unique_stable(None, UniqueKeepStrategy::First, None)?,
        })
    }

    /// Parse CSV bytes with every column as `Utf8`
    fn parse_csv(bytes: Vec<u8>) -> Result<Table> {
        let df = CsvReader::new(Cursor::new(bytes))
            .has_header(true)
            .infer_schema(Some(0))
            .finish()?;
        Self::from_frame(df)
    }

    /// Read a table from CSV text
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Table> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::parse_csv(bytes)
    }

    /// Load a table from a `.csv`, `.csv.gz` or `.zip` file
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
        let path = path.as_ref();
        match Compression::from_path(path) {
            Compression::None => Self::parse_csv(fs::read(path)?),
            Compression::Gzip => Self::from_reader(flate2::read::MultiGzDecoder::new(
                BufReader::new(File::open(path)?),
            )),
            Compression::Zip => {
                let mut archive = ::zip::ZipArchive::new(File::open(path)?)?;
                if archive.len() == 0 {
                    return Err(PrepError::DataError(format!(
                        "Zip archive {} is empty",
                        path.display()
                    )));
                }
                let entry = archive.by_index(0)?;
                Self::from_reader(entry)
            }
        }
    }

    /// Write the table as CSV text
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut df = self.df.clone();
        CsvWriter::new(writer).has_header(true).finish(&mut df)?;
        Ok(())
    }

    /// Render the table as a CSV string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| PrepError::DataError(e.to_string()))
    }

    /// Save to `path` with the given compression; `path` carries the final file name
    pub fn save<P: AsRef<Path>>(&self, path: P, compression: Compression) -> Result<()> {
        let path = path.as_ref();
        let mut file = BufWriter::new(File::create(path)?);
        match compression {
            Compression::None => {
                self.write_csv(&mut file)?;
                file.flush()?;
                Ok(())
            }
            Compression::Gzip => {
                let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
                self.write_csv(&mut encoder)?;
                encoder.finish()?.flush()?;
                Ok(())
            }
            Compression::Zip => {
                let entry_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.trim_end_matches(".zip").to_string())
                    .unwrap_or_else(|| "data.csv".to_string());
                let mut archive = ::zip::ZipWriter::new(file);
                let options = ::zip::write::FileOptions::default()
                    .compression_method(::zip::CompressionMethod::Deflated);
                archive.start_file(entry_name, options)?;
                self.write_csv(&mut archive)?;
                archive.finish()?.flush()?;
                Ok(())
            }
        }
    }
}

/// Output compression for CSV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zip,
}

impl Compression {
    /// Suffix appended after `.csv`
    pub fn suffix(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Zip => ".zip",
        }
    }

    /// File name for a CSV table with this compression
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.csv{}", stem, self.suffix())
    }

    /// Guess the compression of an existing file from its extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zip") => Compression::Zip,
            _ => Compression::None,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zip => "zip",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Compression {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" | "gz" | ".gz" => Ok(Compression::Gzip),
            "zip" | ".zip" => Ok(Compression::Zip),
            other => Err(PrepError::InvalidParameter(format!(
                "Unsupported compression '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_strs(
            &["id", "t", "y"],
            &[vec!["a", "1", "10"], vec!["a", "2", ""], vec!["b", "1", "7"]],
        )
        .unwrap()
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing("  "));
        assert!(is_missing("NaN"));
        assert!(is_missing("NULL"));
        assert!(!is_missing("0"));
        assert!(!is_missing("nano"));
    }

    #[test]
    fn test_select_and_drop() {
        let t = sample();
        let key = t.select(&["y", "id"]).unwrap();
        assert_eq!(key.columns(), vec!["y", "id"]);
        assert_eq!(key.column("id").unwrap(), vec!["a", "a", "b"]);

        let dropped = t.drop_columns(&["y"]).unwrap();
        assert_eq!(dropped.columns(), vec!["id", "t"]);
        assert!(t.drop_columns(&["missing"]).is_err());
        assert!(t.select(&["missing"]).is_err());
    }

    #[test]
    fn test_take_rows_in_given_order() {
        let t = sample();
        let picked = t.take_rows(&[2, 0]).unwrap();
        assert_eq!(picked.column("id").unwrap(), vec!["b", "a"]);
        assert_eq!(picked.column("y").unwrap(), vec!["7", "10"]);
        assert!(t.take_rows(&[5]).is_err());
    }

    #[test]
    fn test_with_column_values_keeps_position() {
        let t = sample()
            .with_column_values("t", vec!["x".into(), "".into(), "z".into()])
            .unwrap();
        assert_eq!(t.columns(), vec!["id", "t", "y"]);
        assert_eq!(t.column("t").unwrap(), vec!["x", "", "z"]);
        assert!(sample().with_column_values("t", vec!["x".into()]).is_err());
    }

    #[test]
    fn test_first_present_skips_missing() {
        let t = Table::from_strs(&["y"], &[vec![""], vec!["NA"], vec!["3.5"]]).unwrap();
        assert_eq!(t.first_present("y").unwrap(), Some("3.5"));
    }

    #[test]
    fn test_rejects_ragged_and_duplicate_columns() {
        assert!(Table::from_strs(&["a", "b"], &[vec!["1"]]).is_err());
        assert!(Table::from_strs(&["a", "a"], &[]).is_err());
    }

    #[test]
    fn test_csv_text_roundtrip() {
        let t = sample();
        let text = t.to_csv_string().unwrap();
        assert_eq!(text, "id,t,y\na,1,10\na,2,\nb,1,7\n");
        let back = Table::from_reader(text.as_bytes()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_cells_read_verbatim() {
        let text = "id,t,y\n007,2020-01-01 00:00:00,1.50\nx,\"a,b\",1e-05\n";
        let t = Table::from_reader(text.as_bytes()).unwrap();
        assert_eq!(t.column("id").unwrap(), vec!["007", "x"]);
        assert_eq!(t.column("y").unwrap(), vec!["1.50", "1e-05"]);
        assert_eq!(t.frame().column("y").unwrap().dtype(), &DataType::Utf8);
        assert_eq!(t.to_csv_string().unwrap(), text);
    }

    #[test]
    fn test_rename_column() {
        let mut t = sample();
        t.rename_column("t", "step").unwrap();
        assert_eq!(t.columns(), vec!["id", "step", "y"]);
        assert!(t.rename_column("id", "y").is_err());
    }

    #[test]
    fn test_dedup_keeps_first() {
        let t = Table::from_strs(&["a", "b"], &[vec!["1", ""], vec!["2", "x"], vec!["1", ""]]).unwrap();
        let deduped = t.dedup_rows().unwrap();
        assert_eq!(deduped.column("a").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_compression_parsing() {
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("".parse::<Compression>().unwrap(), Compression::None);
        assert!("bz2".parse::<Compression>().is_err());
        assert_eq!(Compression::Zip.file_name("x_train"), "x_train.csv.zip");
    }
}
