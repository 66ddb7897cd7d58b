use crate::{Error, Result, Status};
use crate::params::{Channel, ChannelSet, RatioMode, Resolution};
use crate::config::{
    AcquisitionConfiguration, BlockConfiguration, ChannelConfiguration, PollConfiguration,
    SignalGeneratorConfiguration, TriggerConfiguration,
};
use crate::capture::{poll_until_ready, BlockCapture, ChannelCapture};
use crate::sys::{call, Driver, Handle, Timebase, Values};

fn checked<T>(call: &'static str, result: core::result::Result<T, Status>) -> Result<T> {
    result.map_err(|status| {
        log::error!("{}: {}", call, status);
        Error::Status { call, status }
    })
}

#[derive(Debug)]
pub struct Device<D: Driver = crate::DefaultDriver> {
    driver: D,
    handle: Option<Handle>,
    usb_powered: bool,
    // Registered with the driver; boxed so that the addresses stay put.
    buffers: [Option<Box<[i16]>>; 4],
}

impl<D: Driver> Device<D> {
    /// Opens the device, switching it to USB power if it reports that its supply is missing.
    pub fn open(mut driver: D, resolution: Resolution) -> Result<Device<D>> {
        log::debug!("open_unit({:?})", resolution);
        let (handle, status) = driver.open_unit(resolution);
        let mut device = match status {
            Status::OK | Status::POWER_SUPPLY_NOT_CONNECTED =>
                Device { driver, handle: Some(handle), usb_powered: false, buffers: Default::default() },
            status => return checked(call::OPEN_UNIT, Err(status)),
        };
        if status == Status::POWER_SUPPLY_NOT_CONNECTED {
            log::warn!("power supply not connected, running from USB power");
            // a failure here drops `device`, which closes the unit
            checked(call::CHANGE_POWER_SOURCE, device.driver.change_power_source(handle, status))?;
            device.usb_powered = true;
        }
        log::info!("opened unit with handle {}", handle);
        Ok(device)
    }

    /// Opens the device, runs `f`, and closes the device afterwards even if `f` fails.
    pub fn with<F, T>(driver: D, resolution: Resolution, f: F) -> Result<T>
            where F: FnOnce(&mut Device<D>) -> Result<T> {
        let mut device = Device::open(driver, resolution)?;
        let result = f(&mut device);
        let closed = device.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_usb_powered(&self) -> bool {
        self.usb_powered
    }

    fn handle(&self) -> Result<Handle> {
        self.handle.ok_or(Error::Closed)
    }

    pub fn set_channel(&mut self, channel: Channel, config: Option<&ChannelConfiguration>)
            -> Result<()> {
        let handle = self.handle()?;
        let config_or_default = config.copied().unwrap_or_default();
        log::debug!("set_channel({:?}, {:?})", channel, config);
        checked(call::SET_CHANNEL, self.driver.set_channel(handle, channel, config.is_some(),
            config_or_default.coupling, config_or_default.range, config_or_default.analog_offset))
    }

    /// Allocates a buffer of `samples` codes for `channel` and registers it with the driver.
    pub fn set_data_buffer(&mut self, channel: Channel, samples: u32, segment_index: u32,
                           mode: RatioMode) -> Result<()> {
        let handle = self.handle()?;
        log::debug!("set_data_buffer({:?}, {}, {}, {:?})", channel, samples, segment_index, mode);
        let mut buffer = vec![0i16; samples as usize].into_boxed_slice();
        // SAFETY: The buffer is moved into `self.buffers` below without changing its address,
        // and is kept there until it is replaced by another registered buffer or the device is
        // dropped. It is only read by `copy_buffer`, which runs after `get_values` has returned.
        checked(call::SET_DATA_BUFFER, unsafe {
            self.driver.set_data_buffer(handle, channel, buffer.as_mut_ptr(), buffer.len(),
                segment_index, mode)
        })?;
        self.buffers[channel.index()] = Some(buffer);
        Ok(())
    }

    pub fn get_timebase(&mut self, timebase: u32, samples: u32, segment_index: u32)
            -> Result<Timebase> {
        let handle = self.handle()?;
        log::debug!("get_timebase({}, {}, {})", timebase, samples, segment_index);
        let result = checked(call::GET_TIMEBASE,
            self.driver.get_timebase(handle, timebase, samples, segment_index))?;
        log::info!("timebase {}: {} ns per sample, at most {} samples",
            timebase, result.interval_ns, result.max_samples);
        Ok(result)
    }

    pub fn set_simple_trigger(&mut self, trigger: &TriggerConfiguration) -> Result<()> {
        let handle = self.handle()?;
        log::debug!("set_simple_trigger({:?})", trigger);
        checked(call::SET_SIMPLE_TRIGGER, self.driver.set_simple_trigger(handle, trigger))
    }

    pub fn set_signal_generator(&mut self, sig_gen: &SignalGeneratorConfiguration)
            -> Result<()> {
        let handle = self.handle()?;
        log::debug!("set_sig_gen_built_in({:?})", sig_gen);
        checked(call::SET_SIG_GEN_BUILT_IN, self.driver.set_sig_gen_built_in(handle, sig_gen))
    }

    /// Configures channels, buffers, timebase, trigger and signal generator, in that order.
    pub fn configure(&mut self, config: &AcquisitionConfiguration) -> Result<Timebase> {
        for channel in Channel::ALL {
            let channel_config = config.channel(channel);
            // without external power the upper channels have to be switched off explicitly;
            // other unused channels are left as the driver has them
            if channel_config.is_some() ||
                    (self.usb_powered && config.usb_power_disabled.contains_channel(channel)) {
                self.set_channel(channel, channel_config)?;
            }
        }
        let block = &config.block;
        for (channel, _) in config.enabled_channels() {
            self.set_data_buffer(channel, block.samples, block.segment_index, block.ratio_mode)?;
        }
        let timebase = self.get_timebase(block.timebase, block.samples, block.segment_index)?;
        self.set_simple_trigger(&config.trigger)?;
        if let Some(sig_gen) = &config.signal_generator {
            self.set_signal_generator(sig_gen)?;
        }
        Ok(timebase)
    }

    /// Starts a block capture and returns the time, in milliseconds, the device will be busy.
    pub fn run_block(&mut self, block: &BlockConfiguration) -> Result<i32> {
        let handle = self.handle()?;
        log::debug!("run_block({:?})", block);
        let time_indisposed_ms = checked(call::RUN_BLOCK,
            self.driver.run_block(handle, block.pre_trigger_samples, block.post_trigger_samples(),
                block.timebase, block.segment_index))?;
        log::info!("capture started, device busy for {} ms", time_indisposed_ms);
        Ok(time_indisposed_ms)
    }

    /// Waits for a capture started with `run_block` to complete.
    ///
    /// If the capture does not complete within the poll budget, the capture is stopped and
    /// the device is closed before `Error::Timeout` is returned.
    pub fn wait_ready(&mut self, poll: &PollConfiguration) -> Result<u32> {
        let handle = self.handle()?;
        let driver = &mut self.driver;
        let ready = poll_until_ready(poll.budget, poll.interval, || {
            checked(call::IS_READY, driver.is_ready(handle))
        })?;
        match ready {
            Some(polls) => Ok(polls),
            None => {
                log::error!("capture not ready within {:?}, giving up", poll.timeout());
                if let Err(error) = self.stop() {
                    log::warn!("failed to stop capture: {}", error);
                }
                if let Err(error) = self.close() {
                    log::warn!("failed to close unit: {}", error);
                }
                Err(Error::Timeout { polls: poll.budget })
            }
        }
    }

    pub fn get_values(&mut self, block: &BlockConfiguration) -> Result<Values> {
        let handle = self.handle()?;
        log::debug!("get_values({:?})", block);
        let values = checked(call::GET_VALUES,
            self.driver.get_values(handle, 0, block.samples, block.downsample_ratio,
                block.ratio_mode, block.segment_index))?;
        let overflow = ChannelSet::from_overflow(values.overflow);
        if !overflow.is_empty() {
            log::warn!("channels over range: {:?}", overflow);
        }
        Ok(values)
    }

    fn copy_buffer(&self, channel: Channel, samples: u32) -> Vec<i16> {
        match &self.buffers[channel.index()] {
            Some(buffer) => buffer[..(samples as usize).min(buffer.len())].to_vec(),
            None => Vec::new(),
        }
    }

    /// Runs a block capture with buffers registered by `configure`, and retrieves the samples.
    pub fn capture_block(&mut self, config: &AcquisitionConfiguration, timebase: &Timebase)
            -> Result<BlockCapture> {
        let time_indisposed_ms = self.run_block(&config.block)?;
        let polls = self.wait_ready(&config.poll)?;
        let values = self.get_values(&config.block)?;
        let channels = config.enabled_channels()
            .map(|(channel, channel_config)| ChannelCapture {
                channel,
                range: channel_config.range,
                codes: self.copy_buffer(channel, values.samples),
            })
            .collect();
        Ok(BlockCapture {
            channels,
            polls,
            interval_ns: timebase.interval_ns,
            time_indisposed_ms,
            overflow: ChannelSet::from_overflow(values.overflow),
        })
    }

    pub fn stop(&mut self) -> Result<()> {
        let handle = self.handle()?;
        log::debug!("stop()");
        checked(call::STOP, self.driver.stop(handle))
    }

    /// Closes the device. Closing a device that is already closed does nothing.
    pub fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            log::debug!("close_unit({})", handle);
            checked(call::CLOSE_UNIT, self.driver.close_unit(handle))?;
        }
        Ok(())
    }
}

impl<D: Driver> Drop for Device<D> {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            log::error!("error closing device: {}", error)
        }
    }
}
