use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use common::Vacancy;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::ScrapeError;

/// Writes `vacancies` to `path` as an indented JSON array, replacing any previous file.
///
/// Returns `false` without touching the filesystem when there is nothing to write.
pub fn save_to_json(vacancies: &[Vacancy], path: &Path) -> Result<bool, ScrapeError> {
    if vacancies.is_empty() {
        return Ok(false);
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    vacancies.serialize(&mut serializer)?;
    writer.flush()?;

    Ok(true)
}
