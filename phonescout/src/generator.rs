//! Synthetic input for tests and benchmarks.
//!
//! Writes paragraphs of Russian prose with phone numbers formatted in several
//! styles. One style is a decoy that looks like a number but is too short to
//! match. Output is fully determined by the seed.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::errors::{ExtractError, ExtractResult};

const STYLES: usize = 8;
const DECOY_STYLE: usize = 5;

/// What a generator run wrote
#[derive(Debug, Clone, Default)]
pub struct GenerationSummary {
    pub bytes_written: u64,
    pub paragraphs: u64,
    /// Canonical forms of every matchable number, in file order, repeats included
    pub planted: Vec<String>,
}

/// SplitMix64; small, seedable and good enough for fixture data
#[derive(Debug, Clone)]
struct SeededRng(u64);

impl SeededRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `low..=high`
    fn range(&mut self, low: u32, high: u32) -> u32 {
        low + (self.next_u64() % u64::from(high - low + 1)) as u32
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

struct Phone {
    prefix: &'static str,
    code: u32,
    a: u32,
    b: u32,
    c: u32,
}

impl Phone {
    fn random(rng: &mut SeededRng) -> Self {
        Self {
            prefix: rng.pick(&["+7", "8"]),
            code: rng.range(900, 999),
            a: rng.range(100, 999),
            b: rng.range(10, 99),
            c: rng.range(10, 99),
        }
    }

    fn canonical(&self) -> String {
        format!("+7({:03}){:03}-{:02}-{:02}", self.code, self.a, self.b, self.c)
    }

    fn render(&self, style: usize, rng: &mut SeededRng) -> String {
        let Phone {
            prefix,
            code,
            a,
            b,
            c,
        } = self;
        match style {
            1 => format!("{prefix} {code:03}-{a:03}-{b:02}-{c:02}"),
            2 | 6 => format!("{prefix} ({code:03}) {a:03} {b:02} {c:02}"),
            3 => format!("{prefix}({code:03}) {a:03} {b:02} {c:02}"),
            4 => format!("{prefix}-{code:03}-{a:03}{b:02}{c:02}"),
            DECOY_STYLE => {
                let letters: String = (0..4)
                    .map(|_| char::from(b'A' + rng.range(0, 25) as u8))
                    .collect();
                format!("{prefix}{code:03}{}{letters}", rng.range(1000, 9999))
            }
            7 => format!("{prefix}-{code:03}-{a:03}-{b:02}-{c:02}"),
            _ => format!("{prefix} ({code:03}) {a:03}.{b:02}.{c:02}"),
        }
    }
}

/// Builds one paragraph and appends the canonical forms it plants
fn paragraph(rng: &mut SeededRng, planted: &mut Vec<String>) -> String {
    let mut nums = Vec::with_capacity(STYLES);
    for style in 1..=STYLES {
        let phone = Phone::random(rng);
        nums.push(phone.render(style, rng));
        if style != DECOY_STYLE {
            planted.push(phone.canonical());
        }
    }
    format!(
        "Связаться с нами можно по телефону {} или {}.\n\
         Также работает WhatsApp: {}. Иногда оставляют так: {}..\n\
         А вот и еще: {}\n\
         Звоните по номеру {} или {}.\n\
         А ещё есть {} — это второй номер.\n\n",
        nums[0], nums[1], nums[2], nums[3], nums[4], nums[5], nums[6], nums[7]
    )
}

/// Writes paragraphs to `writer` until at least `target_bytes` were written
pub fn generate_to<W: Write>(
    writer: &mut W,
    target_bytes: u64,
    seed: u64,
) -> std::io::Result<GenerationSummary> {
    let mut rng = SeededRng(seed);
    let mut summary = GenerationSummary::default();
    while summary.bytes_written < target_bytes {
        let text = paragraph(&mut rng, &mut summary.planted);
        writer.write_all(text.as_bytes())?;
        summary.bytes_written += text.len() as u64;
        summary.paragraphs += 1;
    }
    writer.flush()?;
    Ok(summary)
}

/// Writes a generated file of roughly `size_mb` MiB to `path`, replacing it
pub fn generate_file(path: &Path, size_mb: u64, seed: u64) -> ExtractResult<GenerationSummary> {
    let target_bytes = size_mb
        .checked_mul(1024 * 1024)
        .ok_or_else(|| ExtractError::config_error(format!("size of {size_mb} MiB is too large")))?;
    let file = File::create(path).map_err(|e| ExtractError::output_write(path, e))?;
    let mut writer = BufWriter::new(file);
    let summary = generate_to(&mut writer, target_bytes, seed)
        .map_err(|e| ExtractError::output_write(path, e))?;
    info!(
        "Generated {} ({:.2} MiB, {} paragraphs)",
        path.display(),
        summary.bytes_written as f64 / 1024.0 / 1024.0,
        summary.paragraphs
    );
    Ok(summary)
}
