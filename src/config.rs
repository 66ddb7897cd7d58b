//! High-level configuration of a block mode acquisition.

use std::time::Duration;

use crate::params::{
    Channel, ChannelSet, Coupling, Range, Resolution, RatioMode, ThresholdDirection,
    WaveType, SweepType, ExtraOperations, SigGenTriggerType, SigGenTriggerSource,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfiguration {
    pub coupling: Coupling,
    pub range: Range,
    /// Analog offset in volts, added to the input before digitization.
    pub analog_offset: f32,
}

impl Default for ChannelConfiguration {
    fn default() -> Self {
        Self {
            coupling: Coupling::DC,
            range: Range::V1,
            analog_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfiguration {
    pub enabled: bool,
    pub source: Channel,
    /// Threshold as an ADC code on the source channel.
    pub threshold: i16,
    pub direction: ThresholdDirection,
    /// Delay in sample periods between the trigger event and the start of the block.
    pub delay: u32,
    /// Time after which the device triggers by itself; zero waits indefinitely.
    pub auto_trigger_ms: i16,
}

impl Default for TriggerConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            source: Channel::A,
            threshold: 10000,
            direction: ThresholdDirection::Rising,
            delay: 0,
            auto_trigger_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGeneratorConfiguration {
    pub offset_microvolts: i32,
    pub peak_to_peak_microvolts: u32,
    pub wave_type: WaveType,
    pub start_frequency: f64,
    pub stop_frequency: f64,
    pub increment: f64,
    pub dwell_time: f64,
    pub sweep_type: SweepType,
    pub operation: ExtraOperations,
    pub shots: u32,
    pub sweeps: u32,
    pub trigger_type: SigGenTriggerType,
    pub trigger_source: SigGenTriggerSource,
    pub ext_in_threshold: i16,
}

impl Default for SignalGeneratorConfiguration {
    fn default() -> Self {
        // 1 Vpp, 1 MHz sine, free running
        Self {
            offset_microvolts: 0,
            peak_to_peak_microvolts: 1_000_000,
            wave_type: WaveType::Sine,
            start_frequency: 1_000_000.0,
            stop_frequency: 1_000_000.0,
            increment: 1.0,
            dwell_time: 1.0,
            sweep_type: SweepType::Up,
            operation: ExtraOperations::Off,
            shots: 0,
            sweeps: 0,
            trigger_type: SigGenTriggerType::Rising,
            trigger_source: SigGenTriggerSource::None,
            ext_in_threshold: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConfiguration {
    /// Total amount of samples per channel.
    pub samples: u32,
    pub pre_trigger_samples: u32,
    pub timebase: u32,
    pub segment_index: u32,
    pub ratio_mode: RatioMode,
    pub downsample_ratio: u32,
}

impl BlockConfiguration {
    /// Samples acquired after the trigger event; one sample is reserved for the trigger itself.
    pub fn post_trigger_samples(&self) -> u32 {
        self.samples.saturating_sub(self.pre_trigger_samples + 1)
    }
}

impl Default for BlockConfiguration {
    fn default() -> Self {
        Self {
            samples: 100,
            pre_trigger_samples: 10,
            timebase: 250_000,
            segment_index: 0,
            ratio_mode: RatioMode::None,
            downsample_ratio: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfiguration {
    /// Amount of unsuccessful readiness queries tolerated before giving up.
    pub budget: u32,
    pub interval: Duration,
}

impl PollConfiguration {
    pub fn timeout(&self) -> Duration {
        self.interval * self.budget
    }
}

impl Default for PollConfiguration {
    fn default() -> Self {
        Self {
            budget: 2000,
            interval: Duration::from_millis(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfiguration {
    pub resolution: Resolution,
    pub channels: [Option<ChannelConfiguration>; 4],
    /// Channels that are explicitly switched off when the device runs from USB power.
    pub usb_power_disabled: ChannelSet,
    pub trigger: TriggerConfiguration,
    pub signal_generator: Option<SignalGeneratorConfiguration>,
    pub block: BlockConfiguration,
    pub poll: PollConfiguration,
}

impl AcquisitionConfiguration {
    pub fn enabled_channels(&self) -> impl Iterator<Item = (Channel, &ChannelConfiguration)> {
        Channel::ALL.into_iter()
            .zip(self.channels.iter())
            .filter_map(|(channel, config)| config.as_ref().map(|config| (channel, config)))
    }

    pub fn channel(&self, channel: Channel) -> Option<&ChannelConfiguration> {
        self.channels[channel.index()].as_ref()
    }
}

impl Default for AcquisitionConfiguration {
    fn default() -> Self {
        AcquisitionConfiguration {
            resolution: Resolution::Bits15,
            channels: [
                Some(ChannelConfiguration::default()),
                Some(ChannelConfiguration::default()),
                None,
                None,
            ],
            usb_power_disabled: ChannelSet::C | ChannelSet::D,
            trigger: TriggerConfiguration::default(),
            signal_generator: Some(SignalGeneratorConfiguration::default()),
            block: BlockConfiguration::default(),
            poll: PollConfiguration::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_block() {
        let block = BlockConfiguration::default();
        assert_eq!(block.pre_trigger_samples + block.post_trigger_samples(), 99);
        assert_eq!(block.post_trigger_samples(), 89);
    }

    #[test]
    fn test_short_block() {
        let block = BlockConfiguration { samples: 5, ..Default::default() };
        assert_eq!(block.post_trigger_samples(), 0);
    }

    #[test]
    fn test_enabled_channels() {
        let config = AcquisitionConfiguration::default();
        let channels = config.enabled_channels().map(|(channel, _)| channel).collect::<Vec<_>>();
        assert_eq!(channels, [Channel::A, Channel::B]);
        assert!(config.channel(Channel::C).is_none());
        assert_eq!(config.channel(Channel::A).map(|c| c.range), Some(Range::V1));
    }

    #[test]
    fn test_poll_timeout() {
        assert_eq!(PollConfiguration::default().timeout(), Duration::from_secs(2));
    }
}
