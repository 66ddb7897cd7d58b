//! Software model of a PicoScope 5000 Series device, for running without hardware.
//!
//! The model follows the call protocol of the real driver closely enough to exercise every
//! path of an acquisition: it validates handles, timebases and buffers, reports the power
//! source status on open, and fills the registered buffers with the output of the signal
//! generator when a block capture completes. Failures of any call can be injected.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::slice;

use crate::Status;
use crate::params::{Channel, Coupling, Range, RatioMode, Resolution, WaveType};
use crate::config::{SignalGeneratorConfiguration, TriggerConfiguration};
use crate::scale::{mv_to_adc, MAX_ADC};
use super::{call, Handle, Timebase, Values};

const MEMORY_SAMPLES: i64 = 128 * 1024 * 1024;

/// Sample interval in nanoseconds for `timebase` in the given resolution mode.
///
/// Returns `None` for timebases the resolution mode does not support.
pub fn timebase_interval_ns(resolution: Resolution, timebase: u32) -> Option<u64> {
    let n = timebase as u64;
    match resolution {
        Resolution::Bits8 if n < 3 => Some(1 << n),
        Resolution::Bits8 => Some((n - 2) * 8),
        Resolution::Bits12 if n == 0 => None,
        Resolution::Bits12 if n < 4 => Some(2 << (n - 1)),
        Resolution::Bits12 => Some((n - 3) * 16),
        Resolution::Bits14 | Resolution::Bits15 if n < 3 => None,
        Resolution::Bits14 | Resolution::Bits15 => Some((n - 2) * 8),
        Resolution::Bits16 if n < 4 => None,
        Resolution::Bits16 => Some((n - 3) * 16),
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    enabled: bool,
    coupling: Coupling,
    range: Range,
    analog_offset: f32,
}

#[derive(Debug, Clone, Copy)]
struct BufferState {
    ptr: *mut i16,
    len: usize,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    pre_trigger_samples: u32,
    samples: u32,
    interval_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Acquisition {
    Idle,
    Running { polls: u32 },
    Done,
}

#[derive(Debug)]
pub struct SimulatedDriver {
    open_status: Status,
    ready_after: Option<u32>,
    failures: HashMap<&'static str, Status>,
    calls: Vec<&'static str>,

    handle: Option<Handle>,
    next_handle: Handle,
    resolution: Resolution,
    power_pending: bool,
    usb_powered: bool,
    channels: [ChannelState; 4],
    buffers: [Option<BufferState>; 4],
    trigger: Option<TriggerConfiguration>,
    sig_gen: Option<SignalGeneratorConfiguration>,
    block: Option<Block>,
    acquisition: Acquisition,
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        SimulatedDriver::new()
    }
}

impl SimulatedDriver {
    pub fn new() -> SimulatedDriver {
        let channel = ChannelState {
            enabled: false,
            coupling: Coupling::DC,
            range: Range::V5,
            analog_offset: 0.0,
        };
        SimulatedDriver {
            open_status: Status::OK,
            ready_after: Some(3),
            failures: HashMap::new(),
            calls: Vec::new(),
            handle: None,
            next_handle: 1,
            resolution: Resolution::default(),
            power_pending: false,
            usb_powered: false,
            channels: [channel; 4],
            buffers: [None; 4],
            trigger: None,
            sig_gen: None,
            block: None,
            acquisition: Acquisition::Idle,
        }
    }

    /// Makes `open_unit` report `status`. `Status::POWER_SUPPLY_NOT_CONNECTED` models a device
    /// plugged into a USB port without its external supply.
    pub fn with_open_status(mut self, status: Status) -> Self {
        self.open_status = status;
        self
    }

    /// Makes the capture complete after `polls` unsuccessful readiness queries, or never.
    pub fn with_ready_after(mut self, polls: Option<u32>) -> Self {
        self.ready_after = polls;
        self
    }

    /// Makes every call to the driver function named `call` fail with `status`.
    pub fn with_failure(mut self, call: &'static str, status: Status) -> Self {
        self.failures.insert(call, status);
        self
    }

    /// Names of the driver functions called so far, in order.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_usb_powered(&self) -> bool {
        self.usb_powered
    }

    pub fn is_channel_enabled(&self, channel: Channel) -> bool {
        self.channels[channel.index()].enabled
    }

    pub fn trigger(&self) -> Option<&TriggerConfiguration> {
        self.trigger.as_ref()
    }

    fn enter(&mut self, name: &'static str, handle: Handle) -> Result<(), Status> {
        self.calls.push(name);
        log::trace!("sim: {}({})", name, handle);
        if let Some(&status) = self.failures.get(name) {
            return Err(status)
        }
        if self.handle != Some(handle) {
            return Err(Status::INVALID_HANDLE)
        }
        if self.power_pending && name != call::CHANGE_POWER_SOURCE && name != call::CLOSE_UNIT {
            return Err(Status::POWER_SUPPLY_NOT_CONNECTED)
        }
        Ok(())
    }

    fn enabled_channels(&self) -> usize {
        self.channels.iter().filter(|state| state.enabled).count()
    }

    fn max_samples(&self) -> i32 {
        (MEMORY_SAMPLES / self.enabled_channels().max(1) as i64) as i32
    }

    /// Generator output in millivolts at `time` seconds.
    fn signal_mv(&self, time: f64) -> f64 {
        let Some(sig_gen) = self.sig_gen else { return 0.0 };
        let offset = sig_gen.offset_microvolts as f64 / 1000.0;
        let amplitude = sig_gen.peak_to_peak_microvolts as f64 / 2000.0;
        let phase = (sig_gen.start_frequency * time).rem_euclid(1.0);
        let unit = match sig_gen.wave_type {
            WaveType::Sine => (2.0 * PI * phase).sin(),
            WaveType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveType::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            WaveType::RampUp => 2.0 * phase - 1.0,
            WaveType::RampDown => 1.0 - 2.0 * phase,
            WaveType::DcVoltage => 0.0,
            other => {
                log::trace!("sim: {:?} is generated as a sine", other);
                (2.0 * PI * phase).sin()
            }
        };
        offset + amplitude * unit
    }
}

impl super::Driver for SimulatedDriver {
    fn open_unit(&mut self, resolution: Resolution) -> (Handle, Status) {
        self.calls.push(call::OPEN_UNIT);
        if let Some(&status) = self.failures.get(call::OPEN_UNIT) {
            return (0, status)
        }
        if self.handle.is_some() {
            return (0, Status::MAX_UNITS_OPENED)
        }
        let status = self.open_status;
        if status != Status::OK && status != Status::POWER_SUPPLY_NOT_CONNECTED {
            return (0, status)
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handle = Some(handle);
        self.resolution = resolution;
        self.power_pending = status == Status::POWER_SUPPLY_NOT_CONNECTED;
        // the device powers up with channels A and B enabled, like the hardware
        self.channels[0].enabled = true;
        self.channels[1].enabled = true;
        log::debug!("sim: opened unit {} at {:?} ({})", handle, resolution, status);
        (handle, status)
    }

    fn change_power_source(&mut self, handle: Handle, power_state: Status)
            -> Result<(), Status> {
        self.enter(call::CHANGE_POWER_SOURCE, handle)?;
        match power_state {
            Status::POWER_SUPPLY_NOT_CONNECTED => {
                self.power_pending = false;
                self.usb_powered = true;
                Ok(())
            }
            Status::POWER_SUPPLY_CONNECTED => {
                self.power_pending = false;
                self.usb_powered = false;
                Ok(())
            }
            _ => Err(Status::POWER_SUPPLY_REQUEST_INVALID),
        }
    }

    fn set_channel(&mut self, handle: Handle, channel: Channel, enabled: bool,
                   coupling: Coupling, range: Range, analog_offset: f32) -> Result<(), Status> {
        self.enter(call::SET_CHANNEL, handle)?;
        if enabled && self.usb_powered && matches!(channel, Channel::C | Channel::D) {
            return Err(Status::POWER_SUPPLY_NOT_CONNECTED)
        }
        if analog_offset.abs() * 1000.0 > range.millivolts() as f32 * 10.0 {
            return Err(Status::INVALID_PARAMETER)
        }
        self.channels[channel.index()] = ChannelState { enabled, coupling, range, analog_offset };
        Ok(())
    }

    unsafe fn set_data_buffer(&mut self, handle: Handle, channel: Channel, buffer: *mut i16,
                              len: usize, _segment_index: u32, _mode: RatioMode)
            -> Result<(), Status> {
        self.enter(call::SET_DATA_BUFFER, handle)?;
        if buffer.is_null() {
            return Err(Status::NULL_PARAMETER)
        }
        self.buffers[channel.index()] = Some(BufferState { ptr: buffer, len });
        Ok(())
    }

    fn get_timebase(&mut self, handle: Handle, timebase: u32, samples: u32, _segment_index: u32)
            -> Result<Timebase, Status> {
        self.enter(call::GET_TIMEBASE, handle)?;
        let interval_ns = timebase_interval_ns(self.resolution, timebase)
            .and_then(|interval| i32::try_from(interval).ok())
            .ok_or(Status::INVALID_TIMEBASE)?;
        let max_samples = self.max_samples();
        if samples as i64 > max_samples as i64 {
            return Err(Status::TOO_MANY_SAMPLES)
        }
        Ok(Timebase { interval_ns, max_samples })
    }

    fn set_simple_trigger(&mut self, handle: Handle, trigger: &TriggerConfiguration)
            -> Result<(), Status> {
        self.enter(call::SET_SIMPLE_TRIGGER, handle)?;
        if trigger.enabled && !self.channels[trigger.source.index()].enabled {
            return Err(Status::INVALID_TRIGGER_CHANNEL)
        }
        self.trigger = Some(*trigger);
        Ok(())
    }

    fn set_sig_gen_built_in(&mut self, handle: Handle, sig_gen: &SignalGeneratorConfiguration)
            -> Result<(), Status> {
        self.enter(call::SET_SIG_GEN_BUILT_IN, handle)?;
        // the generator of the 5000D series is limited to 20 MHz and ±2 V
        if sig_gen.start_frequency < 0.0 || sig_gen.start_frequency > 20e6 ||
                sig_gen.peak_to_peak_microvolts > 4_000_000 {
            return Err(Status::SIG_GEN_PARAM)
        }
        self.sig_gen = Some(*sig_gen);
        Ok(())
    }

    fn run_block(&mut self, handle: Handle, pre_trigger_samples: u32, post_trigger_samples: u32,
                 timebase: u32, _segment_index: u32) -> Result<i32, Status> {
        self.enter(call::RUN_BLOCK, handle)?;
        if self.enabled_channels() == 0 {
            return Err(Status::INVALID_CHANNEL)
        }
        let interval_ns = timebase_interval_ns(self.resolution, timebase)
            .ok_or(Status::INVALID_TIMEBASE)?;
        let samples = pre_trigger_samples as i64 + post_trigger_samples as i64 + 1;
        if samples > self.max_samples() as i64 {
            return Err(Status::TOO_MANY_SAMPLES)
        }
        self.block = Some(Block { pre_trigger_samples, samples: samples as u32, interval_ns });
        self.acquisition = Acquisition::Running { polls: 0 };
        let time_indisposed_ms = (samples as u64 * interval_ns / 1_000_000).min(i32::MAX as u64);
        Ok(time_indisposed_ms as i32)
    }

    fn is_ready(&mut self, handle: Handle) -> Result<bool, Status> {
        self.enter(call::IS_READY, handle)?;
        match self.acquisition {
            Acquisition::Idle => Ok(false),
            Acquisition::Done => Ok(true),
            Acquisition::Running { polls } => {
                match self.ready_after {
                    Some(ready_after) if polls >= ready_after => {
                        self.acquisition = Acquisition::Done;
                        Ok(true)
                    }
                    _ => {
                        self.acquisition = Acquisition::Running { polls: polls.saturating_add(1) };
                        Ok(false)
                    }
                }
            }
        }
    }

    fn get_values(&mut self, handle: Handle, start_index: u32, samples: u32,
                  _downsample_ratio: u32, _mode: RatioMode, _segment_index: u32)
            -> Result<Values, Status> {
        self.enter(call::GET_VALUES, handle)?;
        let block = match (self.acquisition, self.block) {
            (Acquisition::Done, Some(block)) => block,
            _ => return Err(Status::DATA_NOT_AVAILABLE),
        };
        if start_index >= block.samples {
            return Err(Status::STARTINDEX_INVALID)
        }
        let available = samples.min(block.samples - start_index);

        let mut written = available;
        let mut overflow = 0i16;
        for channel in Channel::ALL {
            let state = self.channels[channel.index()];
            if !state.enabled { continue }
            let Some(buffer) = self.buffers[channel.index()] else { continue };
            let count = (available as usize).min(buffer.len);
            written = written.min(count as u32);
            // SAFETY: `set_data_buffer` requires the buffer to stay valid for writes of `len`
            // samples and to be left to the driver until `get_values` returns.
            let codes = unsafe { slice::from_raw_parts_mut(buffer.ptr, count) };
            for (offset, code) in codes.iter_mut().enumerate() {
                let index = (start_index as i64 + offset as i64) - block.pre_trigger_samples as i64;
                let time = index as f64 * block.interval_ns as f64 * 1e-9;
                let mut millivolts = self.signal_mv(time) + state.analog_offset as f64 * 1000.0;
                if state.coupling == Coupling::AC {
                    millivolts -= self.sig_gen.map_or(0.0, |g| g.offset_microvolts as f64 / 1000.0);
                }
                if millivolts.abs() > state.range.millivolts() as f64 {
                    overflow |= 1 << channel.index();
                }
                *code = mv_to_adc(millivolts.round() as i32, state.range, MAX_ADC);
            }
        }
        log::debug!("sim: delivered {} samples, overflow {:#06b}", written, overflow);
        Ok(Values { samples: written, overflow })
    }

    fn stop(&mut self, handle: Handle) -> Result<(), Status> {
        self.enter(call::STOP, handle)?;
        if let Acquisition::Running { .. } = self.acquisition {
            self.acquisition = Acquisition::Idle;
        }
        Ok(())
    }

    fn close_unit(&mut self, handle: Handle) -> Result<(), Status> {
        self.enter(call::CLOSE_UNIT, handle)?;
        self.handle = None;
        self.power_pending = false;
        self.buffers = [None; 4];
        self.acquisition = Acquisition::Idle;
        self.block = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sys::Driver;

    #[test]
    fn test_timebase_15bit() {
        assert_eq!(timebase_interval_ns(Resolution::Bits15, 2), None);
        assert_eq!(timebase_interval_ns(Resolution::Bits15, 3), Some(8));
        assert_eq!(timebase_interval_ns(Resolution::Bits15, 250_000), Some(1_999_984));
    }

    #[test]
    fn test_timebase_other_resolutions() {
        assert_eq!(timebase_interval_ns(Resolution::Bits8, 0), Some(1));
        assert_eq!(timebase_interval_ns(Resolution::Bits8, 2), Some(4));
        assert_eq!(timebase_interval_ns(Resolution::Bits8, 3), Some(8));
        assert_eq!(timebase_interval_ns(Resolution::Bits12, 0), None);
        assert_eq!(timebase_interval_ns(Resolution::Bits12, 1), Some(2));
        assert_eq!(timebase_interval_ns(Resolution::Bits12, 3), Some(8));
        assert_eq!(timebase_interval_ns(Resolution::Bits12, 4), Some(16));
        assert_eq!(timebase_interval_ns(Resolution::Bits16, 3), None);
        assert_eq!(timebase_interval_ns(Resolution::Bits16, 4), Some(16));
        assert_eq!(timebase_interval_ns(Resolution::Bits16, 5), Some(32));
    }

    #[test]
    fn test_invalid_handle() {
        let mut sim = SimulatedDriver::new();
        assert_eq!(sim.is_ready(1), Err(Status::INVALID_HANDLE));
        let (handle, status) = sim.open_unit(Resolution::Bits15);
        assert_eq!(status, Status::OK);
        assert_eq!(sim.is_ready(handle + 1), Err(Status::INVALID_HANDLE));
        assert_eq!(sim.close_unit(handle), Ok(()));
        assert_eq!(sim.close_unit(handle), Err(Status::INVALID_HANDLE));
    }

    #[test]
    fn test_power_pending() {
        let mut sim = SimulatedDriver::new()
            .with_open_status(Status::POWER_SUPPLY_NOT_CONNECTED);
        let (handle, status) = sim.open_unit(Resolution::Bits15);
        assert_eq!(status, Status::POWER_SUPPLY_NOT_CONNECTED);
        assert_eq!(sim.set_channel(handle, Channel::A, true, Coupling::DC, Range::V1, 0.0),
            Err(Status::POWER_SUPPLY_NOT_CONNECTED));
        assert_eq!(sim.change_power_source(handle, status), Ok(()));
        assert!(sim.is_usb_powered());
        assert_eq!(sim.set_channel(handle, Channel::A, true, Coupling::DC, Range::V1, 0.0), Ok(()));
        assert_eq!(sim.set_channel(handle, Channel::C, true, Coupling::DC, Range::V1, 0.0),
            Err(Status::POWER_SUPPLY_NOT_CONNECTED));
        assert_eq!(sim.set_channel(handle, Channel::C, false, Coupling::DC, Range::V1, 0.0), Ok(()));
    }

    #[test]
    fn test_block_capture() {
        let mut sim = SimulatedDriver::new().with_ready_after(Some(2));
        let (handle, _) = sim.open_unit(Resolution::Bits15);
        sim.set_channel(handle, Channel::A, true, Coupling::DC, Range::V1, 0.0).unwrap();
        sim.set_channel(handle, Channel::B, false, Coupling::DC, Range::V1, 0.0).unwrap();
        sim.set_sig_gen_built_in(handle, &SignalGeneratorConfiguration {
            wave_type: WaveType::DcVoltage,
            offset_microvolts: 250_000,
            ..Default::default()
        }).unwrap();
        let mut buffer = vec![0i16; 16];
        unsafe {
            sim.set_data_buffer(handle, Channel::A, buffer.as_mut_ptr(), buffer.len(), 0,
                RatioMode::None).unwrap();
        }
        assert_eq!(sim.get_values(handle, 0, 16, 1, RatioMode::None, 0),
            Err(Status::DATA_NOT_AVAILABLE));
        sim.run_block(handle, 4, 11, 3, 0).unwrap();
        assert_eq!(sim.is_ready(handle), Ok(false));
        assert_eq!(sim.is_ready(handle), Ok(false));
        assert_eq!(sim.is_ready(handle), Ok(true));
        let values = sim.get_values(handle, 0, 16, 1, RatioMode::None, 0).unwrap();
        assert_eq!(values, Values { samples: 16, overflow: 0 });
        sim.close_unit(handle).unwrap();
        let expected = mv_to_adc(250, Range::V1, MAX_ADC);
        assert!(buffer.iter().all(|&code| code == expected), "{:?}", buffer);
    }

    #[test]
    fn test_overflow() {
        let mut sim = SimulatedDriver::new().with_ready_after(Some(0));
        let (handle, _) = sim.open_unit(Resolution::Bits8);
        sim.set_channel(handle, Channel::A, false, Coupling::DC, Range::V1, 0.0).unwrap();
        sim.set_channel(handle, Channel::B, true, Coupling::DC, Range::mV100, 0.0).unwrap();
        sim.set_sig_gen_built_in(handle, &SignalGeneratorConfiguration {
            wave_type: WaveType::DcVoltage,
            offset_microvolts: 500_000,
            ..Default::default()
        }).unwrap();
        let mut buffer = vec![0i16; 4];
        unsafe {
            sim.set_data_buffer(handle, Channel::B, buffer.as_mut_ptr(), buffer.len(), 0,
                RatioMode::None).unwrap();
        }
        sim.run_block(handle, 0, 3, 10, 0).unwrap();
        assert_eq!(sim.is_ready(handle), Ok(true));
        let values = sim.get_values(handle, 0, 4, 1, RatioMode::None, 0).unwrap();
        assert_eq!(values.overflow, 0b10);
        sim.close_unit(handle).unwrap();
        assert_eq!(buffer, [i16::MAX; 4]);
    }

    #[test]
    fn test_injected_failure() {
        let mut sim = SimulatedDriver::new()
            .with_failure(call::GET_TIMEBASE, Status::INVALID_TIMEBASE);
        let (handle, _) = sim.open_unit(Resolution::Bits15);
        assert_eq!(sim.get_timebase(handle, 250_000, 100, 0), Err(Status::INVALID_TIMEBASE));
        assert_eq!(sim.calls(), [call::OPEN_UNIT, call::GET_TIMEBASE]);
    }
}
