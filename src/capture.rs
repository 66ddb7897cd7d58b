use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use crate::params::{Channel, ChannelSet, Range};
use crate::scale::{adc_to_mv, MAX_ADC};

/// Queries `is_ready` until it reports completion, sleeping `interval` between queries.
///
/// Returns the amount of unsuccessful queries that preceded completion, or `None` if all of
/// `budget + 1` queries were unsuccessful. Errors returned by `is_ready` end polling at once.
pub fn poll_until_ready<F, E>(budget: u32, interval: Duration, mut is_ready: F)
        -> Result<Option<u32>, E>
        where F: FnMut() -> Result<bool, E> {
    let mut polls = 0;
    loop {
        if is_ready()? {
            log::trace!("poll: ready after {} polls", polls);
            return Ok(Some(polls))
        }
        if polls == budget {
            log::trace!("poll: gave up after {} polls", polls);
            return Ok(None)
        }
        sleep(interval);
        polls += 1;
    }
}

/// Samples of one channel retrieved from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCapture {
    pub channel: Channel,
    pub range: Range,
    pub codes: Vec<i16>,
}

impl ChannelCapture {
    pub fn millivolts(&self) -> impl Iterator<Item = i32> + '_ {
        self.codes.iter().map(|&code| adc_to_mv(code, self.range, MAX_ADC))
    }

    /// Raw ADC codes in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.codes[..])
    }

    /// Writes one `<index> ; <code> ; <millivolts>` line per sample.
    pub fn write_table<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (index, (code, millivolts)) in self.codes.iter().zip(self.millivolts()).enumerate() {
            writeln!(writer, "{} ; {} ; {}", index, code, millivolts)?;
        }
        Ok(())
    }
}

/// Result of a completed block mode acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCapture {
    pub channels: Vec<ChannelCapture>,
    /// Unsuccessful readiness queries before the capture completed.
    pub polls: u32,
    pub interval_ns: i32,
    pub time_indisposed_ms: i32,
    pub overflow: ChannelSet,
}

impl BlockCapture {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelCapture> {
        self.channels.iter().find(|capture| capture.channel == channel)
    }

    pub fn samples(&self) -> usize {
        self.channels.first().map_or(0, |capture| capture.codes.len())
    }

    /// Writes the raw ADC codes of every channel, one channel after another.
    pub fn write_raw<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for capture in self.channels.iter() {
            writer.write_all(capture.as_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    const NO_WAIT: Duration = Duration::ZERO;

    #[test]
    fn test_poll_ready_at_once() {
        let calls = Cell::new(0);
        let result = poll_until_ready::<_, ()>(10, NO_WAIT, || {
            calls.set(calls.get() + 1);
            Ok(true)
        });
        assert_eq!(result, Ok(Some(0)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_poll_ready_later() {
        let calls = Cell::new(0);
        let result = poll_until_ready::<_, ()>(10, NO_WAIT, || {
            calls.set(calls.get() + 1);
            Ok(calls.get() == 5)
        });
        assert_eq!(result, Ok(Some(4)));
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn test_poll_ready_beyond_budget_iterations() {
        // readiness on the very last query still counts
        let calls = Cell::new(0);
        let result = poll_until_ready::<_, ()>(3, NO_WAIT, || {
            calls.set(calls.get() + 1);
            Ok(calls.get() == 4)
        });
        assert_eq!(result, Ok(Some(3)));
    }

    #[test]
    fn test_poll_timeout() {
        let calls = Cell::new(0);
        let result = poll_until_ready::<_, ()>(2000, NO_WAIT, || {
            calls.set(calls.get() + 1);
            Ok(false)
        });
        assert_eq!(result, Ok(None));
        assert_eq!(calls.get(), 2001);
    }

    #[test]
    fn test_poll_zero_budget() {
        let result = poll_until_ready::<_, ()>(0, NO_WAIT, || Ok(false));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_poll_error() {
        let calls = Cell::new(0);
        let result = poll_until_ready(10, NO_WAIT, || {
            calls.set(calls.get() + 1);
            if calls.get() == 3 { Err("unplugged") } else { Ok(false) }
        });
        assert_eq!(result, Err("unplugged"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_poll_interval() {
        let start = std::time::Instant::now();
        let result = poll_until_ready::<_, ()>(5, Duration::from_millis(2), || Ok(false));
        assert_eq!(result, Ok(None));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_channel_table() {
        let capture = ChannelCapture {
            channel: Channel::A,
            range: Range::V2,
            codes: vec![0, 10000, -32767],
        };
        let mut table = Vec::new();
        capture.write_table(&mut table).unwrap();
        assert_eq!(String::from_utf8(table).unwrap(), "0 ; 0 ; 0\n1 ; 10000 ; 610\n2 ; -32767 ; -2000\n");
    }

    #[test]
    fn test_raw_bytes() {
        let capture = BlockCapture {
            channels: vec![
                ChannelCapture { channel: Channel::A, range: Range::V1, codes: vec![1, -1] },
                ChannelCapture { channel: Channel::B, range: Range::V1, codes: vec![2, 3] },
            ],
            polls: 0,
            interval_ns: 8,
            time_indisposed_ms: 0,
            overflow: ChannelSet::empty(),
        };
        let mut raw = Vec::new();
        capture.write_raw(&mut raw).unwrap();
        let mut expected = Vec::new();
        for code in [1i16, -1, 2, 3] {
            expected.extend_from_slice(&code.to_ne_bytes());
        }
        assert_eq!(raw, expected);
        assert_eq!(capture.samples(), 2);
        assert_eq!(capture.channel(Channel::B).map(|c| c.codes.clone()), Some(vec![2, 3]));
        assert!(capture.channel(Channel::C).is_none());
    }
}
