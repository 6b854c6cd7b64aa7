//! CSV directory price-history adapter.
//!
//! One file per symbol, `<CODE>.csv`, with a header row and columns
//! `date,open,high,low,close,volume` (date as `YYYY-MM-DD`).

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::error::FlagtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::price_history_port::PriceHistoryPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, FlagtraderError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| FlagtraderError::DataSource {
            reason: format!("missing {} column", name),
        })
}

fn parse_field<T>(record: &StringRecord, index: usize, name: &str) -> Result<T, FlagtraderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    field(record, index, name)?
        .parse()
        .map_err(|e| FlagtraderError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Volume may be written as a decimal (`12345.0`); it is rounded to whole shares.
fn parse_volume(record: &StringRecord) -> Result<i64, FlagtraderError> {
    let volume: f64 = parse_field(record, 5, "volume")?;
    if !volume.is_finite() || volume < 0.0 {
        return Err(FlagtraderError::DataSource {
            reason: format!("invalid volume value: {}", volume),
        });
    }
    Ok(volume.round() as i64)
}

impl PriceHistoryPort for CsvAdapter {
    fn fetch_series(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, FlagtraderError> {
        let path = self.csv_path(code);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FlagtraderError::NoData {
                    code: code.to_string(),
                });
            }
            Err(e) => {
                return Err(FlagtraderError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FlagtraderError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?, "%Y-%m-%d").map_err(
                |e| FlagtraderError::DataSource {
                    reason: format!("invalid date format: {}", e),
                },
            )?;
            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_volume(&record)?,
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, FlagtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| FlagtraderError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FlagtraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(code) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
