use std::path::Path;

use anyhow::Context;

/// One export row: ordered column/value pairs. The first row's keys become
/// the header; later rows are emitted under those columns and missing keys
/// render as empty cells.
pub type Row = Vec<(String, String)>;

pub fn write_csv(path: &Path, rows: &[Row]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    if let Some(first) = rows.first() {
        let header: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
        writer.write_record(&header)?;
        for row in rows {
            let record: Vec<&str> = header
                .iter()
                .map(|col| {
                    row.iter()
                        .find(|(k, _)| k == col)
                        .map(|(_, v)| v.as_str())
                        .unwrap_or("")
                })
                .collect();
            writer.write_record(&record)?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(rows.len())
}
