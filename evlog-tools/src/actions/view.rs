use std::{io::Write, path::Path};

use evlog::{render::render, timekeeper::Order};

use super::open_stream;
use crate::err::ToolErr;

/// Записи `[start, end)` в порядке выдачи, по одной в строке
pub fn view_range<P: AsRef<Path>, W: Write>(file: P, start: u64, end: u64, out: &mut W) -> Result<(), ToolErr> {
    let provider = open_stream(file)?;
    let chunk = provider.fetch(start, end)?;

    for timed in chunk.records.iter() {
        let mark = match timed.order {
            Order::InOrder => ' ',
            Order::SwapWithPrevious { .. } => '<',
            Order::Clamped { .. } => '=',
            Order::Ambiguous { .. } => '?',
        };
        writeln!(
            out,
            "{ordinal:>8} {ns:>14} {offset:>10} {mark} {text}",
            ordinal = timed.record.ordinal,
            ns = timed.absolute_ns,
            offset = timed.record.byte_offset,
            text = render(provider.table(), &timed.record)
        )?;
    }
    if chunk.is_empty() {
        writeln!(out, "no records in {start}..{end}, total {}", chunk.total)?;
    }
    Ok(())
}
