//! Record export. One CSV row per reconstructed record, serialized straight
//! from [`RecordRow`] so the header always matches the struct.

use std::path::Path;

use taxkal_core::RecordRow;

use crate::error::IoError;

pub fn write_records(path: &Path, records: &[RecordRow]) -> Result<(), IoError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| IoError::Csv(path.to_path_buf(), e.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| IoError::Csv(path.to_path_buf(), e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| IoError::File(path.to_path_buf(), e))?;
    Ok(())
}
