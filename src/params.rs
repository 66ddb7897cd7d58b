//! Low-level parameters of the driver API in terms of the values it accepts.

#![cfg_attr(not(feature = "hardware"), allow(dead_code))]

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    Bits8,
    Bits12,
    Bits14,
    #[default]
    Bits15,
    Bits16,
}

impl Resolution {
    pub(crate) fn ps5000a_code(self) -> u32 {
        match self {
            Self::Bits8  => 0,
            Self::Bits12 => 1,
            Self::Bits14 => 2,
            Self::Bits15 => 3,
            Self::Bits16 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::B, Channel::C, Channel::D];

    pub(crate) fn ps5000a_code(self) -> u32 {
        self.index() as u32
    }

    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    pub fn name(self) -> char {
        (b'A' + self.index() as u8) as char
    }
}

bitflags! {
    /// Set of channels; the bit layout matches the driver's overflow word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelSet: u16 {
        const A = 1<<0;
        const B = 1<<1;
        const C = 1<<2;
        const D = 1<<3;
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        ChannelSet::from_bits_retain(1 << channel.index())
    }
}

impl ChannelSet {
    pub fn from_overflow(overflow: i16) -> Self {
        ChannelSet::from_bits_truncate(overflow as u16)
    }

    pub fn contains_channel(self, channel: Channel) -> bool {
        self.contains(channel.into())
    }

    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |&channel| self.contains_channel(channel))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coupling {
    AC,
    #[default]
    DC,
}

impl Coupling {
    pub(crate) fn ps5000a_code(self) -> u32 {
        match self {
            Self::AC => 0,
            Self::DC => 1,
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Range {
    mV10,
    mV20,
    mV50,
    mV100,
    mV200,
    mV500,
    #[default]
    V1,
    V2,
    V5,
    V10,
    V20,
    V50,
}

impl Range {
    pub const ALL: [Range; 12] = [
        Range::mV10, Range::mV20, Range::mV50, Range::mV100, Range::mV200, Range::mV500,
        Range::V1, Range::V2, Range::V5, Range::V10, Range::V20, Range::V50,
    ];

    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }

    /// Magnitude of the input range; a full scale code corresponds to `±millivolts()`.
    pub fn millivolts(self) -> i32 {
        match self {
            Self::mV10  => 10,
            Self::mV20  => 20,
            Self::mV50  => 50,
            Self::mV100 => 100,
            Self::mV200 => 200,
            Self::mV500 => 500,
            Self::V1    => 1_000,
            Self::V2    => 2_000,
            Self::V5    => 5_000,
            Self::V10   => 10_000,
            Self::V20   => 20_000,
            Self::V50   => 50_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioMode {
    #[default]
    None,
    Aggregate,
    Decimate,
    Average,
}

impl RatioMode {
    pub(crate) fn ps5000a_code(self) -> u32 {
        match self {
            Self::None      => 0,
            Self::Aggregate => 1,
            Self::Decimate  => 2,
            Self::Average   => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdDirection {
    Above,
    Below,
    #[default]
    Rising,
    Falling,
    RisingOrFalling,
}

impl ThresholdDirection {
    pub(crate) fn ps5000a_code(self) -> u32 {
        match self {
            Self::Above           => 0,
            Self::Below           => 1,
            Self::Rising          => 2,
            Self::Falling         => 3,
            Self::RisingOrFalling => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveType {
    #[default]
    Sine,
    Square,
    Triangle,
    RampUp,
    RampDown,
    Sinc,
    Gaussian,
    HalfSine,
    DcVoltage,
    WhiteNoise,
}

impl WaveType {
    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    #[default]
    Up,
    Down,
    UpDown,
    DownUp,
}

impl SweepType {
    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtraOperations {
    #[default]
    Off,
    WhiteNoise,
    Prbs,
}

impl ExtraOperations {
    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigGenTriggerType {
    #[default]
    Rising,
    Falling,
    GateHigh,
    GateLow,
}

impl SigGenTriggerType {
    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigGenTriggerSource {
    #[default]
    None,
    ScopeTrigger,
    AuxIn,
    ExtIn,
    Software,
}

impl SigGenTriggerSource {
    pub(crate) fn ps5000a_code(self) -> u32 {
        self as u32
    }
}
