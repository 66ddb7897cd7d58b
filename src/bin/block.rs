use std::io::{self, BufRead, Write};

use ps5000a_block::{AcquisitionConfiguration, BlockCapture, DefaultDriver, Device, Error};

const FILENAME: &str = "capture.data";

/// Waits for the first whitespace separated token; proceeds if it starts with `s`.
/// End of input declines.
fn confirm<R: BufRead>(mut input: R) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(false)
        }
        if let Some(token) = line.split_whitespace().next() {
            return Ok(token.starts_with('s'))
        }
    }
}

fn write_capture<W: Write>(mut writer: W, capture: &BlockCapture) -> io::Result<()> {
    // counts every readiness query, the successful one included
    writeln!(writer, "IsReady : {}", capture.polls + 1)?;
    for channel in capture.channels.iter() {
        writeln!(writer, "Print Buffer {} : ", channel.channel.name())?;
        channel.write_table(&mut writer)?;
        writeln!(writer)?;
    }
    Ok(())
}

fn acquire(config: &AcquisitionConfiguration) -> ps5000a_block::Result<bool> {
    Device::with(DefaultDriver::default(), config.resolution, |device| {
        let timebase = device.configure(config)?;
        print!("Press 's' to start the acquisition, anything else to exit: ");
        io::stdout().flush()?;
        if !confirm(io::stdin().lock())? {
            println!("Exiting ...");
            return Ok(false)
        }
        println!("Acquiring ...");
        let capture = device.capture_block(config, &timebase)?;
        write_capture(io::stdout().lock(), &capture)?;

        let mut raw = Vec::new();
        capture.write_raw(&mut raw)?;
        std::fs::write(FILENAME, &raw[..])?;
        log::info!("saved {} samples of {} channels to {}",
            capture.samples(), capture.channels.len(), FILENAME);
        Ok(true)
    })
}

fn report<W: Write>(mut writer: W, error: &Error) -> io::Result<()> {
    match error {
        Error::Status { call, status } => {
            writeln!(writer, "ERROR : {} : {} ; {:x}", call, status.code(), status.code())?;
            writeln!(writer, "{}", status)
        }
        Error::Timeout { .. } =>
            writeln!(writer, "TIMEOUT"),
        error =>
            writeln!(writer, "ERROR : {}", error),
    }
}

fn main() {
    env_logger::init();

    let config = AcquisitionConfiguration::default();
    match acquire(&config) {
        Ok(true) => (),
        Ok(false) => std::process::exit(-1),
        Err(error) => {
            if let Err(io_error) = report(io::stdout().lock(), &error) {
                log::error!("failed to report {}: {}", error, io_error);
            }
            std::process::exit(-1)
        }
    }
}
