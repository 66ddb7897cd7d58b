use crate::Status;
use crate::params::{Channel, Coupling, Range, RatioMode, Resolution};
use crate::config::{SignalGeneratorConfiguration, TriggerConfiguration};

/// Identifier of an open driver session.
pub type Handle = i16;

/// Names of the driver calls, used when reporting which step of a sequence has failed.
pub mod call {
    pub const OPEN_UNIT: &str = "OpenUnit";
    pub const CHANGE_POWER_SOURCE: &str = "ChangePowerSource";
    pub const SET_CHANNEL: &str = "SetChannel";
    pub const SET_DATA_BUFFER: &str = "SetDataBuffer";
    pub const GET_TIMEBASE: &str = "GetTimebase";
    pub const SET_SIMPLE_TRIGGER: &str = "SetSimpleTrigger";
    pub const SET_SIG_GEN_BUILT_IN: &str = "SetSigGenBuiltInV2";
    pub const RUN_BLOCK: &str = "RunBlock";
    pub const IS_READY: &str = "IsReady";
    pub const GET_VALUES: &str = "GetValues";
    pub const STOP: &str = "Stop";
    pub const CLOSE_UNIT: &str = "CloseUnit";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timebase {
    pub interval_ns: i32,
    pub max_samples: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Values {
    /// Amount of samples actually written into each registered buffer.
    pub samples: u32,
    /// Bit N is set if channel N was over range during the capture.
    pub overflow: i16,
}

pub trait Driver {
    /// Opens the first available device.
    ///
    /// Unlike other calls, this one returns the handle together with the raw status, since
    /// the device is usable after some non-OK statuses (e.g. when it wants a different power
    /// source).
    fn open_unit(&mut self, resolution: Resolution) -> (Handle, Status);

    fn change_power_source(&mut self, handle: Handle, power_state: Status)
        -> Result<(), Status>;

    fn set_channel(&mut self, handle: Handle, channel: Channel, enabled: bool,
                   coupling: Coupling, range: Range, analog_offset: f32) -> Result<(), Status>;

    /// Registers `buffer` as the destination of samples for `channel`.
    ///
    /// # Safety
    ///
    /// `buffer` must stay valid for writes of `len` samples until the unit is closed or another
    /// buffer is registered for `channel`. While a capture is in flight, i.e. from `run_block`
    /// until `get_values` returns, it must not be accessed by anything but the driver.
    unsafe fn set_data_buffer(&mut self, handle: Handle, channel: Channel, buffer: *mut i16,
                              len: usize, segment_index: u32, mode: RatioMode)
        -> Result<(), Status>;

    fn get_timebase(&mut self, handle: Handle, timebase: u32, samples: u32, segment_index: u32)
        -> Result<Timebase, Status>;

    fn set_simple_trigger(&mut self, handle: Handle, trigger: &TriggerConfiguration)
        -> Result<(), Status>;

    fn set_sig_gen_built_in(&mut self, handle: Handle, sig_gen: &SignalGeneratorConfiguration)
        -> Result<(), Status>;

    /// Starts a block capture and returns the time, in milliseconds, the device will be busy.
    fn run_block(&mut self, handle: Handle, pre_trigger_samples: u32, post_trigger_samples: u32,
                 timebase: u32, segment_index: u32) -> Result<i32, Status>;

    fn is_ready(&mut self, handle: Handle) -> Result<bool, Status>;

    fn get_values(&mut self, handle: Handle, start_index: u32, samples: u32,
                  downsample_ratio: u32, mode: RatioMode, segment_index: u32)
        -> Result<Values, Status>;

    fn stop(&mut self, handle: Handle) -> Result<(), Status>;

    fn close_unit(&mut self, handle: Handle) -> Result<(), Status>;
}

impl<D: Driver + ?Sized> Driver for &mut D {
    fn open_unit(&mut self, resolution: Resolution) -> (Handle, Status) {
        (**self).open_unit(resolution)
    }

    fn change_power_source(&mut self, handle: Handle, power_state: Status)
            -> Result<(), Status> {
        (**self).change_power_source(handle, power_state)
    }

    fn set_channel(&mut self, handle: Handle, channel: Channel, enabled: bool,
                   coupling: Coupling, range: Range, analog_offset: f32) -> Result<(), Status> {
        (**self).set_channel(handle, channel, enabled, coupling, range, analog_offset)
    }

    unsafe fn set_data_buffer(&mut self, handle: Handle, channel: Channel, buffer: *mut i16,
                              len: usize, segment_index: u32, mode: RatioMode)
            -> Result<(), Status> {
        (**self).set_data_buffer(handle, channel, buffer, len, segment_index, mode)
    }

    fn get_timebase(&mut self, handle: Handle, timebase: u32, samples: u32, segment_index: u32)
            -> Result<Timebase, Status> {
        (**self).get_timebase(handle, timebase, samples, segment_index)
    }

    fn set_simple_trigger(&mut self, handle: Handle, trigger: &TriggerConfiguration)
            -> Result<(), Status> {
        (**self).set_simple_trigger(handle, trigger)
    }

    fn set_sig_gen_built_in(&mut self, handle: Handle, sig_gen: &SignalGeneratorConfiguration)
            -> Result<(), Status> {
        (**self).set_sig_gen_built_in(handle, sig_gen)
    }

    fn run_block(&mut self, handle: Handle, pre_trigger_samples: u32, post_trigger_samples: u32,
                 timebase: u32, segment_index: u32) -> Result<i32, Status> {
        (**self).run_block(handle, pre_trigger_samples, post_trigger_samples, timebase,
            segment_index)
    }

    fn is_ready(&mut self, handle: Handle) -> Result<bool, Status> {
        (**self).is_ready(handle)
    }

    fn get_values(&mut self, handle: Handle, start_index: u32, samples: u32,
                  downsample_ratio: u32, mode: RatioMode, segment_index: u32)
            -> Result<Values, Status> {
        (**self).get_values(handle, start_index, samples, downsample_ratio, mode, segment_index)
    }

    fn stop(&mut self, handle: Handle) -> Result<(), Status> {
        (**self).stop(handle)
    }

    fn close_unit(&mut self, handle: Handle) -> Result<(), Status> {
        (**self).close_unit(handle)
    }
}

pub mod sim;

#[cfg(feature = "hardware")]
#[path = "ps5000a.rs"]
pub mod imp;

#[cfg(not(feature = "hardware"))]
pub mod imp {
    pub use super::sim::SimulatedDriver as DriverImpl;
}
