use std::{fs, path::Path};

use evlog::{record::TagTable, synth};
use rand::Rng;

use crate::err::ToolErr;

/// Запись `count` синтетических записей в `file`
pub fn generate_file<P: AsRef<Path>, R: Rng>(file: P, count: usize, rng: &mut R) -> Result<u64, ToolErr> {
    let data = synth::generate(&TagTable::standard(), count, rng);
    fs::write(file.as_ref(), &data)?;
    log::info!("written {count} records, {} bytes to {:?}", data.len(), file.as_ref());
    Ok(data.len() as u64)
}
