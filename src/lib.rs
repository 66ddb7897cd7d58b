mod status;
mod params;
mod config;
mod scale;
mod capture;
mod device;
pub mod sys;

use std::io;

#[derive(Debug)]
pub enum Error {
    Status { call: &'static str, status: Status },
    Timeout { polls: u32 },
    Closed,
    Io(io::Error),
}

impl Error {
    /// Status reported by the driver, if the error originates from a driver call.
    pub fn status(&self) -> Option<Status> {
        match self {
            &Self::Status { status, .. } => Some(status),
            _ => None
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Status { call, status } =>
                write!(f, "{} failed: {}", call, status),
            Self::Timeout { polls } =>
                write!(f, "capture not ready after {} polls", polls),
            Self::Closed =>
                write!(f, "device is closed"),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use status::Status;

pub use params::{
    Resolution,
    Channel,
    ChannelSet,
    Coupling,
    Range,
    RatioMode,
    ThresholdDirection,
    WaveType,
    SweepType,
    ExtraOperations,
    SigGenTriggerType,
    SigGenTriggerSource,
};

pub use config::{
    ChannelConfiguration,
    TriggerConfiguration,
    SignalGeneratorConfiguration,
    BlockConfiguration,
    PollConfiguration,
    AcquisitionConfiguration,
};

pub use scale::{
    MAX_ADC,
    adc_to_mv,
    mv_to_adc,
};

pub use capture::{
    poll_until_ready,
    ChannelCapture,
    BlockCapture,
};

pub use sys::{Driver, Handle, Timebase, Values};
pub use sys::sim::SimulatedDriver;

/// Driver used by default: the vendor library with the `hardware` feature, the simulation
/// otherwise.
pub type DefaultDriver = sys::imp::DriverImpl;

pub use device::Device;
