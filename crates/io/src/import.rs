//! CSV import. Every input is a headed CSV; columns are looked up by name
//! so extra columns and column order never matter. Files are decoded as
//! UTF-8 with a Windows-1252 fallback, which the older scan exports use.

use std::io::Read;
use std::path::{Path, PathBuf};

use taxkal_catalog::{
    Catalogs, DirtyNames, FirstNames, OccupationLexicon, ParishRef, ParishReference,
    SurnameRegister,
};
use taxkal_core::Line;

use crate::error::IoError;

/// Read a file and convert to UTF-8 if needed.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file =
        std::fs::File::open(path).map_err(|e| IoError::File(path.to_path_buf(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| IoError::File(path.to_path_buf(), e))?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn read_table(path: &Path) -> Result<(csv::StringRecord, Vec<csv::StringRecord>), IoError> {
    let content = read_file_as_utf8(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| IoError::Csv(path.to_path_buf(), e.to_string()))?
        .clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record.map_err(|e| IoError::Csv(path.to_path_buf(), e.to_string()))?);
    }
    Ok((headers, rows))
}

fn column(
    headers: &csv::StringRecord,
    path: &Path,
    name: &'static str,
) -> Result<usize, IoError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IoError::MissingColumn(path.to_path_buf(), name))
}

fn parse_u32(path: &Path, record: u64, value: &str) -> Result<u32, IoError> {
    value
        .trim()
        .parse()
        .map_err(|_| IoError::BadNumber(path.to_path_buf(), record, value.to_string()))
}

/// The scan lines: `{page, column, row, line}`.
pub fn load_lines(path: &Path) -> Result<Vec<Line>, IoError> {
    let (headers, rows) = read_table(path)?;
    let page = column(&headers, path, "page")?;
    let col = column(&headers, path, "column")?;
    let row = column(&headers, path, "row")?;
    let line = column(&headers, path, "line")?;
    let mut lines = Vec::with_capacity(rows.len());
    for (i, rec) in rows.iter().enumerate() {
        let n = i as u64 + 1;
        lines.push(Line::new(
            parse_u32(path, n, rec.get(page).unwrap_or(""))?,
            parse_u32(path, n, rec.get(col).unwrap_or(""))?,
            parse_u32(path, n, rec.get(row).unwrap_or(""))?,
            rec.get(line).unwrap_or(""),
        ));
    }
    Ok(lines)
}

fn column_values(path: &Path, name: &'static str) -> Result<Vec<String>, IoError> {
    let (headers, rows) = read_table(path)?;
    let idx = column(&headers, path, name)?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get(idx))
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// The five reference tables, bundled.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub surnames: PathBuf,
    pub first_names: PathBuf,
    pub occupations: PathBuf,
    pub parishes: PathBuf,
    pub dirty: PathBuf,
}

pub fn load_catalogs(paths: &CatalogPaths) -> Result<Catalogs, IoError> {
    let surnames = SurnameRegister::from_names(column_values(&paths.surnames, "last_name")?)?;
    let first_names = FirstNames::from_names(column_values(&paths.first_names, "firstname")?);
    let occupations = OccupationLexicon::from_terms(column_values(&paths.occupations, "occ")?)?;
    let parishes = load_parishes(&paths.parishes)?;
    let dirty = load_dirty(&paths.dirty)?;
    Ok(Catalogs::new(
        surnames,
        first_names,
        occupations,
        parishes,
        dirty,
    )?)
}

fn load_parishes(path: &Path) -> Result<ParishReference, IoError> {
    let (headers, rows) = read_table(path)?;
    let parish = column(&headers, path, "parish")?;
    let municipality = column(&headers, path, "municipality")?;
    let mapped = column(&headers, path, "mapped_parish")?;
    Ok(ParishReference::from_rows(rows.iter().map(|r| ParishRef {
        parish: r.get(parish).unwrap_or("").to_string(),
        municipality: r.get(municipality).unwrap_or("").to_string(),
        mapped_parish: r.get(mapped).unwrap_or("").to_string(),
    })))
}

fn load_dirty(path: &Path) -> Result<DirtyNames, IoError> {
    let (headers, rows) = read_table(path)?;
    let raw = column(&headers, path, "raw")?;
    let clean = column(&headers, path, "clean")?;
    Ok(DirtyNames::from_pairs(rows.iter().map(|r| {
        (
            r.get(raw).unwrap_or("").to_string(),
            r.get(clean).unwrap_or("").to_string(),
        )
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lines_loaded_by_header_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(
            &path,
            "row,line,page,column\n1,\"Berg, K., snickare 2100\",4,2\n",
        )
        .unwrap();
        let lines = load_lines(&path).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].page, 4);
        assert_eq!(lines[0].column, 2);
        assert_eq!(lines[0].row, 1);
        assert_eq!(lines[0].text, "Berg, K., snickare 2100");
    }

    #[test]
    fn missing_column_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(&path, "page,row,line\n1,1,x\n").unwrap();
        let err = load_lines(&path).unwrap_err();
        assert!(err.to_string().contains("missing column `column`"));
    }

    #[test]
    fn bad_number_reported_with_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(&path, "page,column,row,line\nfour,2,1,x\n").unwrap();
        let err = load_lines(&path).unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn catalogs_load_from_tables() {
        let dir = tempdir().unwrap();
        let write = |name: &str, content: &str| {
            let p = dir.path().join(name);
            fs::write(&p, content).unwrap();
            p
        };
        let paths = CatalogPaths {
            surnames: write("surnames.csv", "last_name\nBerg\nLind\n"),
            first_names: write("firstnames.csv", "firstname\nKarl\n"),
            occupations: write("occupations.csv", "occ\nsnickare\n"),
            parishes: write(
                "parishes.csv",
                "parish,municipality,mapped_parish\nKungsholm,Stockholm,Kungsholm\n",
            ),
            dirty: write("dirty.csv", "raw,clean\nBcrg,Berg\n"),
        };
        let catalogs = load_catalogs(&paths).unwrap();
        assert!(catalogs.surnames.contains("Berg"));
        assert!(catalogs.occupations.contains("snickare"));
    }
}
