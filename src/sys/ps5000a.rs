use std::ptr;
use libc::{c_char, c_double, c_float, c_int, c_short, c_uint, c_void};

use crate::Status;
use crate::params::{Channel, Coupling, Range, RatioMode, Resolution};
use crate::config::{SignalGeneratorConfiguration, TriggerConfiguration};
use super::{Handle, Timebase, Values};

type PicoStatus = c_uint;
type BlockReady = Option<unsafe extern "system" fn(c_short, PicoStatus, *mut c_void)>;

#[link(name = "ps5000a")]
extern "system" {
    fn ps5000aOpenUnit(handle: *mut c_short, serial: *mut c_char, resolution: c_int) -> PicoStatus;
    fn ps5000aChangePowerSource(handle: c_short, power_state: PicoStatus) -> PicoStatus;
    fn ps5000aSetChannel(handle: c_short, channel: c_int, enabled: c_short, coupling: c_int,
                         range: c_int, analog_offset: c_float) -> PicoStatus;
    fn ps5000aSetDataBuffer(handle: c_short, source: c_int, buffer: *mut c_short,
                            buffer_len: c_int, segment_index: c_uint, mode: c_int) -> PicoStatus;
    fn ps5000aGetTimebase(handle: c_short, timebase: c_uint, samples: c_int,
                          time_interval_ns: *mut c_int, max_samples: *mut c_int,
                          segment_index: c_uint) -> PicoStatus;
    fn ps5000aSetSimpleTrigger(handle: c_short, enable: c_short, source: c_int,
                               threshold: c_short, direction: c_int, delay: c_uint,
                               auto_trigger_ms: c_short) -> PicoStatus;
    fn ps5000aSetSigGenBuiltInV2(handle: c_short, offset_voltage: c_int, pk_to_pk: c_uint,
                                 wave_type: c_int, start_frequency: c_double,
                                 stop_frequency: c_double, increment: c_double,
                                 dwell_time: c_double, sweep_type: c_int, operation: c_int,
                                 shots: c_uint, sweeps: c_uint, trigger_type: c_int,
                                 trigger_source: c_int, ext_in_threshold: c_short) -> PicoStatus;
    fn ps5000aRunBlock(handle: c_short, pre_trigger_samples: c_int, post_trigger_samples: c_int,
                       timebase: c_uint, time_indisposed_ms: *mut c_int, segment_index: c_uint,
                       ready: BlockReady, parameter: *mut c_void) -> PicoStatus;
    fn ps5000aIsReady(handle: c_short, ready: *mut c_short) -> PicoStatus;
    fn ps5000aGetValues(handle: c_short, start_index: c_uint, samples: *mut c_uint,
                        downsample_ratio: c_uint, downsample_ratio_mode: c_int,
                        segment_index: c_uint, overflow: *mut c_short) -> PicoStatus;
    fn ps5000aStop(handle: c_short) -> PicoStatus;
    fn ps5000aCloseUnit(handle: c_short) -> PicoStatus;
}

fn check(status: PicoStatus) -> Result<(), Status> {
    Status::from_code(status).into_result()
}

/// Driver backed by the vendor's `libps5000a`.
#[derive(Debug, Default)]
pub struct Ps5000aDriver;

pub type DriverImpl = Ps5000aDriver;

impl super::Driver for Ps5000aDriver {
    fn open_unit(&mut self, resolution: Resolution) -> (Handle, Status) {
        let mut handle: c_short = 0;
        let status = unsafe {
            ps5000aOpenUnit(&mut handle, ptr::null_mut(), resolution.ps5000a_code() as c_int)
        };
        (handle, Status::from_code(status))
    }

    fn change_power_source(&mut self, handle: Handle, power_state: Status)
            -> Result<(), Status> {
        check(unsafe { ps5000aChangePowerSource(handle, power_state.code()) })
    }

    fn set_channel(&mut self, handle: Handle, channel: Channel, enabled: bool,
                   coupling: Coupling, range: Range, analog_offset: f32) -> Result<(), Status> {
        check(unsafe {
            ps5000aSetChannel(handle, channel.ps5000a_code() as c_int, enabled as c_short,
                coupling.ps5000a_code() as c_int, range.ps5000a_code() as c_int, analog_offset)
        })
    }

    unsafe fn set_data_buffer(&mut self, handle: Handle, channel: Channel, buffer: *mut i16,
                              len: usize, segment_index: u32, mode: RatioMode)
            -> Result<(), Status> {
        let len = c_int::try_from(len).map_err(|_| Status::TOO_MANY_SAMPLES)?;
        // SAFETY: Forwarded from the caller; the driver keeps `buffer` until it is replaced or
        // the unit is closed, as required by the trait.
        check(ps5000aSetDataBuffer(handle, channel.ps5000a_code() as c_int, buffer, len,
            segment_index, mode.ps5000a_code() as c_int))
    }

    fn get_timebase(&mut self, handle: Handle, timebase: u32, samples: u32, segment_index: u32)
            -> Result<Timebase, Status> {
        let samples = c_int::try_from(samples).map_err(|_| Status::TOO_MANY_SAMPLES)?;
        let mut interval_ns: c_int = 0;
        let mut max_samples: c_int = 0;
        check(unsafe {
            ps5000aGetTimebase(handle, timebase, samples, &mut interval_ns, &mut max_samples,
                segment_index)
        })?;
        Ok(Timebase { interval_ns, max_samples })
    }

    fn set_simple_trigger(&mut self, handle: Handle, trigger: &TriggerConfiguration)
            -> Result<(), Status> {
        check(unsafe {
            ps5000aSetSimpleTrigger(handle, trigger.enabled as c_short,
                trigger.source.ps5000a_code() as c_int, trigger.threshold,
                trigger.direction.ps5000a_code() as c_int, trigger.delay,
                trigger.auto_trigger_ms)
        })
    }

    fn set_sig_gen_built_in(&mut self, handle: Handle, sig_gen: &SignalGeneratorConfiguration)
            -> Result<(), Status> {
        check(unsafe {
            ps5000aSetSigGenBuiltInV2(handle,
                sig_gen.offset_microvolts,
                sig_gen.peak_to_peak_microvolts,
                sig_gen.wave_type.ps5000a_code() as c_int,
                sig_gen.start_frequency,
                sig_gen.stop_frequency,
                sig_gen.increment,
                sig_gen.dwell_time,
                sig_gen.sweep_type.ps5000a_code() as c_int,
                sig_gen.operation.ps5000a_code() as c_int,
                sig_gen.shots,
                sig_gen.sweeps,
                sig_gen.trigger_type.ps5000a_code() as c_int,
                sig_gen.trigger_source.ps5000a_code() as c_int,
                sig_gen.ext_in_threshold)
        })
    }

    fn run_block(&mut self, handle: Handle, pre_trigger_samples: u32, post_trigger_samples: u32,
                 timebase: u32, segment_index: u32) -> Result<i32, Status> {
        let pre = c_int::try_from(pre_trigger_samples).map_err(|_| Status::TOO_MANY_SAMPLES)?;
        let post = c_int::try_from(post_trigger_samples).map_err(|_| Status::TOO_MANY_SAMPLES)?;
        let mut time_indisposed_ms: c_int = 0;
        // Completion is polled with `is_ready`, so no callback is registered.
        check(unsafe {
            ps5000aRunBlock(handle, pre, post, timebase, &mut time_indisposed_ms, segment_index,
                None, ptr::null_mut())
        })?;
        Ok(time_indisposed_ms)
    }

    fn is_ready(&mut self, handle: Handle) -> Result<bool, Status> {
        let mut ready: c_short = 0;
        check(unsafe { ps5000aIsReady(handle, &mut ready) })?;
        Ok(ready != 0)
    }

    fn get_values(&mut self, handle: Handle, start_index: u32, samples: u32,
                  downsample_ratio: u32, mode: RatioMode, segment_index: u32)
            -> Result<Values, Status> {
        let mut samples: c_uint = samples;
        let mut overflow: c_short = 0;
        check(unsafe {
            ps5000aGetValues(handle, start_index, &mut samples, downsample_ratio,
                mode.ps5000a_code() as c_int, segment_index, &mut overflow)
        })?;
        Ok(Values { samples, overflow })
    }

    fn stop(&mut self, handle: Handle) -> Result<(), Status> {
        check(unsafe { ps5000aStop(handle) })
    }

    fn close_unit(&mut self, handle: Handle) -> Result<(), Status> {
        check(unsafe { ps5000aCloseUnit(handle) })
    }
}
