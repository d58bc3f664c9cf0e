use anyhow::Context;
use std::io::{BufWriter, Write};
use std::fs::File;
use std::path::Path;

use crate::util::file_io::is_gzipped;

/// This will save a generic serializable struct to pretty JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to, gzipped if it ends with ".gz"
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let file = File::create(out_filename)
        .with_context(|| format!("Error while creating {out_filename:?}:"))?;
    let file: Box<dyn Write> = if is_gzipped(out_filename) {
        Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best()))
    } else {
        Box::new(file)
    };
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}
