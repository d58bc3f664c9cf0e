use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Returns true if the path ends with ".gz"
pub fn is_gzipped(filename: &Path) -> bool {
    filename.extension().unwrap_or_default() == "gz"
}

/// Opens a file for reading, transparently decompressing it if it ends with ".gz".
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file does not open properly
pub fn open_reader(filename: &Path) -> anyhow::Result<Box<dyn Read>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn Read> = if is_gzipped(filename) {
        Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Picks a delimiter from the extension, tab for ".tsv" (optionally gzipped) and comma otherwise
pub fn delimiter_for(filename: &Path) -> u8 {
    let name = filename.to_string_lossy();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".tsv") {
        b'\t'
    } else {
        b','
    }
}
