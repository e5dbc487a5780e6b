use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use dayahead_application::ports::{PriceRepository, RepositoryError, SaveOutcome, StoredPrice};
use dayahead_domain::{Market, TargetDay, ValidatedSeries};
use rust_decimal::Decimal;
use shaku::Component;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info};

const HEADER: [&str; 2] = ["timestamp", "price"];

/// Stores one CSV per market day under `{data_dir}/{YYYY}/{MM}/`.
#[derive(Component)]
#[shaku(interface = PriceRepository)]
pub struct CsvPriceRepository {
    data_dir: PathBuf,
}

impl CsvPriceRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn generate_file_path(&self, market: &Market, day: &TargetDay) -> PathBuf {
        let date = day.date();
        let filename = format!(
            "{}_{}.csv",
            market.code().to_lowercase(),
            date.format("%Y%m%d")
        );
        self.data_dir
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(filename)
    }

    fn write_rows<W: io::Write>(
        writer: W,
        series: &ValidatedSeries,
    ) -> Result<W, RepositoryError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(HEADER).map_err(csv_error)?;

        for point in series.points() {
            let timestamp = point
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Secs, false);
            wtr.write_record([timestamp, point.price().to_string()])
                .map_err(csv_error)?;
        }

        wtr.into_inner()
            .map_err(|e| RepositoryError::IoError(io::Error::other(e.to_string())))
    }

    /// Writes the rows next to `path` and moves them into place unless a
    /// file is already there. An interrupted run leaves no partial artifact.
    fn persist_new(
        dir: &Path,
        path: PathBuf,
        series: &ValidatedSeries,
    ) -> Result<SaveOutcome, RepositoryError> {
        let temp = Self::write_rows(NamedTempFile::new_in(dir)?, series)?;
        temp.as_file().sync_all()?;

        match temp.persist_noclobber(&path) {
            Ok(_) => {
                debug!("Persisted {} rows to {}", series.len(), path.display());
                Ok(SaveOutcome::Written {
                    path,
                    rows: series.len(),
                })
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                info!("Artifact {} appeared during write, keeping it", path.display());
                Ok(SaveOutcome::AlreadyPresent { path })
            }
            Err(e) => Err(RepositoryError::IoError(e.error)),
        }
    }

    fn read_rows(path: &Path) -> Result<Vec<StoredPrice>, RepositoryError> {
        let malformed = |reason: String| RepositoryError::MalformedArtifact {
            path: path.to_path_buf(),
            reason,
        };

        let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
        let headers = reader.headers().map_err(csv_error)?;
        if headers.iter().ne(HEADER) {
            return Err(malformed(format!("unexpected header {:?}", headers)));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let (Some(timestamp), Some(price)) = (record.get(0), record.get(1)) else {
                return Err(malformed(format!("short row {:?}", record)));
            };

            rows.push(StoredPrice {
                timestamp: DateTime::parse_from_rfc3339(timestamp)
                    .map_err(|e| malformed(format!("timestamp {timestamp}: {e}")))?,
                price: Decimal::from_str(price)
                    .map_err(|e| malformed(format!("price {price}: {e}")))?,
            });
        }

        Ok(rows)
    }
}

fn csv_error(e: csv::Error) -> RepositoryError {
    RepositoryError::CsvError(e.to_string())
}

#[async_trait]
impl PriceRepository for CsvPriceRepository {
    fn artifact_path(&self, market: &Market, day: &TargetDay) -> PathBuf {
        self.generate_file_path(market, day)
    }

    async fn exists(&self, market: &Market, day: &TargetDay) -> Result<bool, RepositoryError> {
        Ok(self.generate_file_path(market, day).try_exists()?)
    }

    async fn save(
        &self,
        market: &Market,
        series: &ValidatedSeries,
    ) -> Result<SaveOutcome, RepositoryError> {
        let path = self.generate_file_path(market, series.day());
        if path.try_exists()? {
            info!("Artifact {} already exists, skipping write", path.display());
            return Ok(SaveOutcome::AlreadyPresent { path });
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.data_dir.clone());
        fs::create_dir_all(&dir)?;

        Self::persist_new(&dir, path, series)
    }

    async fn load(
        &self,
        market: &Market,
        day: &TargetDay,
    ) -> Result<Vec<StoredPrice>, RepositoryError> {
        let path = self.generate_file_path(market, day);
        Self::read_rows(&path)
    }
}
