use std::{io::Write, path::Path};

use evlog::decode::StreamEnd;

use super::open_stream;
use crate::err::ToolErr;

/// Сколько аномалий выводить
const SHOW_ANOMALIES: usize = 10;

pub fn view_info<P: AsRef<Path>, W: Write>(file: P, out: &mut W) -> Result<(), ToolErr> {
    let provider = open_stream(&file)?;
    let index = provider.index();

    writeln!(out, "file        {}", file.as_ref().display())?;
    writeln!(out, "records     {}", index.total_records)?;
    writeln!(out, "bytes       {} (decoded {})", index.total_bytes, index.decoded_bytes)?;
    writeln!(out, "checkpoints {} every {}", index.entries().len(), index.checkpoint_interval)?;
    match index.end {
        StreamEnd::Eof => writeln!(out, "end         eof")?,
        StreamEnd::Truncated { offset, trailing_bytes } => {
            writeln!(out, "end         truncated at {offset}, {trailing_bytes} trailing bytes")?
        }
        StreamEnd::LostSync { ordinal, offset, tag, last_good } => {
            writeln!(out, "end         lost sync at {offset}, ordinal {ordinal}, tag 0x{tag:02x}")?;
            if let Some(good) = last_good {
                writeln!(out, "last good   ordinal {} at {}", good.ordinal, good.byte_offset)?;
            }
        }
        StreamEnd::Limit { ordinal } => writeln!(out, "end         limit {ordinal}")?,
    }
    writeln!(
        out,
        "reorder     {} corrections (max {} ticks), {} clamped, {} ambiguous",
        index.stats.corrections, index.stats.max_corrected_ticks, index.stats.clamped, index.stats.ambiguous
    )?;
    for a in index.anomalies().iter().take(SHOW_ANOMALIES) {
        writeln!(out, "ambiguous   ordinal {} at {}, back {} ticks", a.ordinal, a.byte_offset, a.back_ticks)?;
    }
    Ok(())
}
