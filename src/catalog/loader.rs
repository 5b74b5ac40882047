use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, instrument, warn};

use super::index::{ReferenceIndex, ReferenceRecord};
use crate::error::{CoreError, CoreResult};

/// Rows that deserialized, plus how many did not.
#[derive(Debug, Clone, Default)]
pub struct LoadedRecords {
    pub records: Vec<ReferenceRecord>,
    pub malformed: usize,
}

/// Read reference rows from any CSV source with a header line.
/// Malformed rows are skipped and counted.
pub fn read_records<R: Read>(reader: R) -> CoreResult<LoadedRecords> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| CoreError::ReferenceDataUnavailable(format!("unreadable header: {e}")))?
        .clone();
    for required in ["card_name", "rarity", "image_filename"] {
        if !headers.iter().any(|h| h == required) {
            return Err(CoreError::ReferenceDataUnavailable(format!(
                "{required} col missing"
            )));
        }
    }

    let mut out = LoadedRecords::default();
    for (line, row) in rdr.deserialize::<ReferenceRecord>().enumerate() {
        match row {
            Ok(rec) => out.records.push(rec),
            Err(e) => {
                out.malformed += 1;
                warn!(line = line + 2, error = %e, "skipping malformed reference row");
            }
        }
    }
    Ok(out)
}

/// Load the reference CSV at `path`.
#[instrument]
pub fn load_reference_csv(path: &Path) -> CoreResult<LoadedRecords> {
    let file = File::open(path).map_err(|e| {
        CoreError::ReferenceDataUnavailable(format!("{}: {e}", path.display()))
    })?;
    read_records(BufReader::with_capacity(1 << 20, file))
}

/// Build the index from `path`, or an empty index when the dataset cannot be read.
pub fn load_index_or_empty(path: &Path) -> ReferenceIndex {
    match load_reference_csv(path) {
        Ok(loaded) => {
            let index = ReferenceIndex::build(loaded.records);
            let stats = index.stats();
            info!(
                entries = index.len(),
                duplicates = stats.duplicates,
                skipped = stats.skipped,
                malformed = loaded.malformed,
                "reference index built"
            );
            index
        }
        Err(e) => {
            warn!(error = %e, "reference data unavailable; image URLs and known-card filters will be empty");
            ReferenceIndex::empty()
        }
    }
}
