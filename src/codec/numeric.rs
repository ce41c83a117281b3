//! Decimal helpers shared by the integer codecs and their reversals.

/// Split a docno into its prefix and trailing run of ASCII digits.
/// `None` if the docno does not end in a digit.
#[inline]
pub fn split_digits(docno: &[u8]) -> Option<(&[u8], &[u8])> {
    let start = docno
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |p| p + 1);
    if start == docno.len() {
        return None;
    }
    Some(docno.split_at(start))
}

/// Parse digits written without leading zeros (except `0` itself)
#[inline]
pub fn parse_canonical(digits: &[u8]) -> Option<u64> {
    match digits {
        [] => None,
        [b'0', _, ..] => None,
        _ => parse_digits(digits),
    }
}

/// Parse exactly `pad` digits, leading zeros allowed
#[inline]
pub fn parse_padded(digits: &[u8], pad: usize) -> Option<u64> {
    if digits.len() != pad || pad == 0 {
        return None;
    }
    parse_digits(digits)
}

fn parse_digits(digits: &[u8]) -> Option<u64> {
    digits.iter().try_fold(0u64, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add((b - b'0') as u64)
    })
}

/// Number of decimal digits in `value`
#[inline]
pub fn decimal_len(value: u64) -> usize {
    value.checked_ilog10().map_or(1, |log| log as usize + 1)
}

/// Append `value` in decimal, left-padded with zeros to `pad` digits
#[inline]
pub fn push_decimal(value: u64, pad: usize, out: &mut Vec<u8>) {
    let mut buf = [0u8; 20];
    let mut pos = buf.len();
    let mut rest = value;
    loop {
        pos -= 1;
        buf[pos] = b'0' + (rest % 10) as u8;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    let digits = &buf[pos..];
    out.resize(out.len() + pad.saturating_sub(digits.len()), b'0');
    out.extend_from_slice(digits);
}

/// Arithmetic run `prefix{start..start+count}` with optional zero padding,
/// reversible in closed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRun {
    pub prefix: Vec<u8>,
    pub start: u64,
    pub count: u64,
    pub pad: Option<usize>,
}

impl SequenceRun {
    /// Append the docno at `pos`
    #[inline]
    pub fn format_into(&self, pos: u64, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.prefix);
        push_decimal(self.start + pos, self.pad.unwrap_or(0), out);
    }

    /// Position of `docno` within the run, if it belongs to it
    #[inline]
    pub fn position_of(&self, docno: &[u8]) -> Option<u64> {
        let digits = docno.strip_prefix(self.prefix.as_slice())?;
        let number = match self.pad {
            Some(pad) => parse_padded(digits, pad)?,
            None => parse_canonical(digits)?,
        };
        let pos = number.checked_sub(self.start)?;
        (pos < self.count).then_some(pos)
    }

    /// Length of the longest docno in the run
    pub fn max_width(&self) -> usize {
        let last = self.start + self.count.saturating_sub(1);
        self.prefix.len() + decimal_len(last).max(self.pad.unwrap_or(0))
    }
}

/// Seeding hypothesis shared by the consecutive integer codecs. The prefix
/// (and pad width, when padded) lock on the first seeded docno.
#[derive(Debug, Clone, Default)]
pub(crate) struct SequenceState {
    padded: bool,
    prefix: Option<Vec<u8>>,
    pad: usize,
    start: u64,
    seed_prev: Option<u64>,
    encode_prev: Option<u64>,
}

impl SequenceState {
    pub(crate) fn new(padded: bool) -> Self {
        Self {
            padded,
            ..Self::default()
        }
    }

    fn parse(&self, digits: &[u8]) -> Option<u64> {
        if self.padded {
            parse_padded(digits, self.pad)
        } else {
            parse_canonical(digits)
        }
    }

    pub(crate) fn seed(&mut self, docno: &[u8]) -> bool {
        let Some((prefix, digits)) = split_digits(docno) else {
            return false;
        };
        match &self.prefix {
            Some(locked) if locked.as_slice() != prefix => return false,
            Some(_) => {}
            None => {
                if std::str::from_utf8(prefix).is_err() {
                    return false;
                }
                self.prefix = Some(prefix.to_vec());
                self.pad = digits.len();
            }
        }
        let Some(number) = self.parse(digits) else {
            return false;
        };
        match self.seed_prev {
            None => self.start = number,
            Some(prev) if prev.checked_add(1) != Some(number) => return false,
            Some(_) => {}
        }
        self.seed_prev = Some(number);
        true
    }

    pub(crate) fn encode(&mut self, docno: &[u8]) -> bool {
        let Some(locked) = &self.prefix else {
            return false;
        };
        let Some((prefix, digits)) = split_digits(docno) else {
            return false;
        };
        if locked.as_slice() != prefix {
            return false;
        }
        let Some(number) = self.parse(digits) else {
            return false;
        };
        let expected = match self.encode_prev {
            None => Some(self.start),
            Some(prev) => prev.checked_add(1),
        };
        if expected != Some(number) {
            return false;
        }
        self.encode_prev = Some(number);
        true
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.padded);
    }

    pub(crate) fn is_seeded(&self) -> bool {
        self.seed_prev.is_some()
    }

    pub(crate) fn prefix(&self) -> String {
        self.prefix
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn start(&self) -> u64 {
        self.start
    }

    pub(crate) fn pad(&self) -> usize {
        self.pad
    }
}
