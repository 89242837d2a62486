//! Recorded sample traces.
//!
//! One tick per line: a millisecond timestamp followed by one raw sample
//! per physical input, whitespace separated. Blank lines and `#` comments
//! are skipped.
//!
//! ```text
//! # t    in0   in1
//! 0      0     0
//! 1      0     61000
//! ```

use anyhow::{bail, Context, Result};

/// One scan worth of raw samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick<const N: usize> {
    pub now: u32,
    pub raw: [u16; N],
}

/// Parse a trace for `N` inputs.
pub fn parse_trace<const N: usize>(input: &str) -> Result<Vec<Tick<N>>> {
    let mut ticks: Vec<Tick<N>> = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((data, _comment)) => data,
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let now = fields
            .next()
            .unwrap_or_default()
            .parse::<u32>()
            .with_context(|| format!("line {}: invalid timestamp", line_num + 1))?;

        let mut raw = [0u16; N];
        let mut count = 0usize;
        for field in fields {
            if count == N {
                bail!("line {}: more than {} samples", line_num + 1, N);
            }
            raw[count] = field
                .parse()
                .with_context(|| format!("line {}: invalid sample {:?}", line_num + 1, field))?;
            count += 1;
        }
        if count != N {
            bail!("line {}: expected {} samples, got {}", line_num + 1, N, count);
        }

        if let Some(last) = ticks.last() {
            if now < last.now {
                bail!(
                    "line {}: timestamp {} goes backwards (previous {})",
                    line_num + 1,
                    now,
                    last.now
                );
            }
        }

        ticks.push(Tick { now, raw });
    }

    Ok(ticks)
}
