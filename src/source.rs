use std::path::Path;

use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info, warn};

use crate::error::{AuditError, Result};
use crate::models::{Correction, RowRecord};

const SERIAL: usize = 0;
const ROOM: usize = 1;
const EMPLID: usize = 2;
const CAMPUS_ID: usize = 3;
const FIRST_COMPONENT: usize = 4;
const COMPRE: usize = 9;
const TOTAL: usize = 10;

/// Raw records are kept byte-for-byte for the corrected export.
#[derive(Debug)]
pub struct Gradebook {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
    pub rows: Vec<RowRecord>,
    /// Non-empty numeric cells that failed to parse and were read as `0.0`.
    pub defaulted_cells: usize,
}

pub fn read_gradebook(path: &Path) -> Result<Gradebook> {
    let unavailable = |source| AuditError::InputUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(unavailable)?;

    let headers = reader.headers().map_err(unavailable)?.clone();
    let mut records = Vec::new();
    let mut rows = Vec::new();
    let mut defaulted_cells = 0usize;

    for result in reader.records() {
        let record = result.map_err(unavailable)?;
        let (row, defaulted) = extract_row(&record);
        if record.len() <= TOTAL {
            debug!(serial = %row.serial_id, cells = record.len(), "short gradebook row");
        }
        defaulted_cells += defaulted;
        rows.push(row);
        records.push(record);
    }

    if defaulted_cells > 0 {
        warn!(defaulted_cells, "unparsable numeric cells were read as zero");
    }
    info!(path = %path.display(), rows = rows.len(), "gradebook loaded");

    Ok(Gradebook {
        headers,
        records,
        rows,
        defaulted_cells,
    })
}

/// Also returns how many non-empty numeric cells defaulted to zero.
pub fn extract_row(record: &StringRecord) -> (RowRecord, usize) {
    let cell = |index: usize| record.get(index).map_or("", str::trim);
    let mut defaulted = 0usize;
    let text = |index: usize| cell(index).to_string();
    let mut number = |index: usize| -> f64 {
        let cell = cell(index);
        match cell.parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                if !cell.is_empty() {
                    defaulted += 1;
                }
                0.0
            }
        }
    };

    let mut component_scores = [0.0; 4];
    for (offset, score) in component_scores.iter_mut().enumerate() {
        *score = number(FIRST_COMPONENT + offset);
    }
    let compre_score = number(COMPRE);
    let stored_total = number(TOTAL);

    let room_cell = cell(ROOM);
    let room_number = room_cell.parse::<i64>().unwrap_or_else(|_| {
        if !room_cell.is_empty() {
            defaulted += 1;
        }
        0
    });

    let row = RowRecord {
        serial_id: text(SERIAL),
        room_number,
        student_id: text(EMPLID),
        campus_id: text(CAMPUS_ID),
        component_scores,
        compre_score,
        stored_total,
    };

    (row, defaulted)
}

/// Every cell except a corrected row's total is copied as read.
pub fn write_corrected(
    path: &Path,
    gradebook: &Gradebook,
    corrections: &[Correction],
) -> anyhow::Result<()> {
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(&gradebook.headers)?;

    let mut pending = corrections.iter().peekable();
    for (position, record) in gradebook.records.iter().enumerate() {
        match pending.next_if(|c| c.position == position) {
            Some(correction) => {
                debug!(serial = %correction.serial_id, total = %correction.corrected_total, "total corrected");
                let mut cells: Vec<&str> = record.iter().collect();
                cells.resize(cells.len().max(TOTAL + 1), "");
                cells[TOTAL] = correction.corrected_total.as_str();
                writer.write_record(&cells)?;
            }
            None => writer.write_record(record)?,
        }
    }

    writer.flush()?;
    info!(path = %path.display(), corrected = corrections.len(), "corrected gradebook written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Sl No,Room,Emplid,Campus ID,Quiz,Midsem,Lab Test,Weekly Lab,Pre-Compre,Compre,Total";

    fn write_sheet(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("gradebook.csv");
        fs::write(&path, format!("{HEADER}\n{body}")).unwrap();
        path
    }

    #[test]
    fn reads_fixed_columns_after_header() {
        let dir = TempDir::new().unwrap();
        let path = write_sheet(
            &dir,
            "1,5,2024A7PS0001P,f20240001@pilani A7,10,20,5,5,40,30,70\n",
        );

        let gradebook = read_gradebook(&path).unwrap();
        assert_eq!(gradebook.rows.len(), 1);
        assert_eq!(gradebook.defaulted_cells, 0);

        let row = &gradebook.rows[0];
        assert_eq!(row.serial_id, "1");
        assert_eq!(row.room_number, 5);
        assert_eq!(row.student_id, "2024A7PS0001P");
        assert_eq!(row.campus_id, "f20240001@pilani A7");
        assert_eq!(row.component_scores, [10.0, 20.0, 5.0, 5.0]);
        assert_eq!(row.compre_score, 30.0);
        assert_eq!(row.stored_total, 70.0);
    }

    #[test]
    fn unparsable_cells_default_to_zero() {
        let record = StringRecord::from(vec![
            "3", "room?", "id", "A1", "abs", "12.5", "", "4", "", "x", "16.5",
        ]);
        let (row, defaulted) = extract_row(&record);

        assert_eq!(row.room_number, 0);
        assert_eq!(row.component_scores, [0.0, 12.5, 0.0, 4.0]);
        assert_eq!(row.compre_score, 0.0);
        assert_eq!(defaulted, 3);
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let record = StringRecord::from(vec!["9", "2", "id"]);
        let (row, defaulted) = extract_row(&record);

        assert_eq!(row.campus_id, "");
        assert_eq!(row.component_scores, [0.0; 4]);
        assert_eq!(row.stored_total, 0.0);
        assert_eq!(defaulted, 0);
    }

    #[test]
    fn padded_cells_are_trimmed_for_extraction() {
        let dir = TempDir::new().unwrap();
        let path = write_sheet(&dir, " 4 , 12 , id7 , pilani A1 , 10 ,20,5,5,40,30, 70 \n");

        let gradebook = read_gradebook(&path).unwrap();
        let row = &gradebook.rows[0];
        assert_eq!(row.serial_id, "4");
        assert_eq!(row.room_number, 12);
        assert_eq!(row.student_id, "id7");
        assert_eq!(row.campus_id, "pilani A1");
        assert_eq!(row.component_scores[0], 10.0);
        assert_eq!(row.stored_total, 70.0);
        assert_eq!(gradebook.defaulted_cells, 0);
        assert_eq!(gradebook.records[0].get(3), Some(" pilani A1 "));
    }

    #[test]
    fn corrected_export_keeps_padding_as_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gradebook.csv");
        fs::write(
            &path,
            "Sl No, Room ,Emplid,Campus ID,Quiz,Midsem,Lab Test,Weekly Lab,Pre-Compre,Compre,Total\n\
             1,5,a, pilani A1 ,10,20,5,5,40,30,69\n\
             2,5,b,B2 ,10,20,5,5,40,30, 70\n",
        )
        .unwrap();
        let gradebook = read_gradebook(&path).unwrap();
        let corrections = vec![Correction {
            position: 0,
            serial_id: "1".to_string(),
            corrected_total: "70.00".to_string(),
        }];

        let out = dir.path().join("corrected.csv");
        write_corrected(&out, &gradebook, &corrections).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Sl No, Room ,Emplid,Campus ID,Quiz,Midsem,Lab Test,Weekly Lab,Pre-Compre,Compre,Total"
        );
        assert_eq!(lines[1], "1,5,a, pilani A1 ,10,20,5,5,40,30,70.00");
        assert_eq!(lines[2], "2,5,b,B2 ,10,20,5,5,40,30, 70");
    }

    #[test]
    fn missing_file_is_input_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = read_gradebook(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, AuditError::InputUnavailable { .. }));

        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(!err.to_string().contains(&source));
    }

    #[test]
    fn corrected_export_replaces_only_total_cells() {
        let dir = TempDir::new().unwrap();
        let path = write_sheet(
            &dir,
            "1,5,a,A1,10,20,5,5,40,30,69\n2,5,b,B2,10,20,5,5,40,30,70\n",
        );
        let gradebook = read_gradebook(&path).unwrap();
        let corrections = vec![Correction {
            position: 0,
            serial_id: "1".to_string(),
            corrected_total: "70.00".to_string(),
        }];

        let out = dir.path().join("corrected.csv");
        write_corrected(&out, &gradebook, &corrections).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "1,5,a,A1,10,20,5,5,40,30,70.00");
        assert_eq!(lines[2], "2,5,b,B2,10,20,5,5,40,30,70");
    }

    #[test]
    fn corrected_export_pads_short_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_sheet(&dir, "1,5,a\n");
        let gradebook = read_gradebook(&path).unwrap();
        let corrections = vec![Correction {
            position: 0,
            serial_id: "1".to_string(),
            corrected_total: "0.00".to_string(),
        }];

        let out = dir.path().join("corrected.csv");
        write_corrected(&out, &gradebook, &corrections).unwrap();

        let content = fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().nth(1), Some("1,5,a,,,,,,,,0.00"));
    }
}
