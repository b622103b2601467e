use thiserror::Error;

use crate::data::{InputError, ProductionData};
use crate::product::Product;

pub const RESOURCE_COLUMN: &str = "Resource";
pub const LIMIT_COLUMN: &str = "Resource Limit";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Table has no header row")]
    NoHeader,
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: invalid number {value:?} in column {column}")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },
    #[error("Line {0}: unterminated quoted field")]
    UnterminatedQuote(usize),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Comma-separated text with a header row
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Record>,
}

#[derive(Debug, Clone)]
struct Record {
    /// 1-based source line
    line: usize,
    fields: Vec<String>,
}

impl Table {
    pub fn parse(source: &str) -> Result<Self, TableError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l))
            .filter(|(_, l)| !l.trim().is_empty());

        let (header_line, header) = lines.next().ok_or(TableError::NoHeader)?;
        let headers: Vec<String> = split_fields(header, header_line)?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        for (i, h) in headers.iter().enumerate() {
            if !h.is_empty() && headers[..i].contains(h) {
                return Err(TableError::DuplicateColumn(h.clone()));
            }
        }

        let mut rows = Vec::new();
        for (line, text) in lines {
            let fields = split_fields(text, line)?;
            if fields.len() != headers.len() {
                return Err(TableError::FieldCount {
                    line,
                    expected: headers.len(),
                    found: fields.len(),
                });
            }
            rows.push(Record { line, fields });
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The first `n` rows, as raw fields
    pub fn head(&self, n: usize) -> impl Iterator<Item = &[String]> {
        self.rows.iter().take(n).map(|r| r.fields.as_slice())
    }

    fn column(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    fn numbers(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let col = self.column(name)?;
        self.rows
            .iter()
            .map(|r| {
                let raw = r.fields[col].trim();
                raw.parse::<f64>().map_err(|_| TableError::InvalidNumber {
                    line: r.line,
                    column: name.to_string(),
                    value: raw.to_string(),
                })
            })
            .collect()
    }

    /// Extract the resource, limit and per-product profit columns
    pub fn to_production_data(&self) -> Result<ProductionData, TableError> {
        let name_col = self.column(RESOURCE_COLUMN)?;
        let names = self
            .rows
            .iter()
            .map(|r| r.fields[name_col].trim().to_string())
            .collect();

        let capacities = self.numbers(LIMIT_COLUMN)?;
        let product_1 = self.numbers(Product::One.label())?;
        let product_2 = self.numbers(Product::Two.label())?;
        let product_3 = self.numbers(Product::Three.label())?;

        Ok(ProductionData::from_columns(
            names, capacities, product_1, product_2, product_3,
        )?)
    }
}

/// Parse production data straight from table text
pub fn read_production_data(source: &str) -> Result<ProductionData, TableError> {
    Table::parse(source)?.to_production_data()
}

/// Split one line on commas; double quotes group a field and `""` escapes a quote
fn split_fields(text: &str, line: usize) -> Result<Vec<String>, TableError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(TableError::UnterminatedQuote(line));
    }
    fields.push(current);
    Ok(fields)
}
