//! Result codes reported by every call into the driver.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u32);

macro_rules! status_codes {
    { $( $name:ident = $code:literal, )* } => {
        impl Status {
            $( pub const $name: Status = Status($code); )*

            /// Symbolic name of the code, if it is one the crate knows about.
            pub fn name(self) -> Option<&'static str> {
                match self.0 {
                    $( $code => Some(stringify!($name)), )*
                    _ => None
                }
            }
        }
    }
}

status_codes! {
    OK                                  = 0x000,
    MAX_UNITS_OPENED                    = 0x001,
    MEMORY_FAIL                         = 0x002,
    NOT_FOUND                           = 0x003,
    FW_FAIL                             = 0x004,
    OPEN_OPERATION_IN_PROGRESS          = 0x005,
    OPERATION_FAILED                    = 0x006,
    NOT_RESPONDING                      = 0x007,
    CONFIG_FAIL                         = 0x008,
    KERNEL_DRIVER_TOO_OLD               = 0x009,
    EEPROM_CORRUPT                      = 0x00A,
    OS_NOT_SUPPORTED                    = 0x00B,
    INVALID_HANDLE                      = 0x00C,
    INVALID_PARAMETER                   = 0x00D,
    INVALID_TIMEBASE                    = 0x00E,
    INVALID_VOLTAGE_RANGE               = 0x00F,
    INVALID_CHANNEL                     = 0x010,
    INVALID_TRIGGER_CHANNEL             = 0x011,
    INVALID_CONDITION_CHANNEL           = 0x012,
    NO_SIGNAL_GENERATOR                 = 0x013,
    STREAMING_FAILED                    = 0x014,
    BLOCK_MODE_FAILED                   = 0x015,
    NULL_PARAMETER                      = 0x016,
    ETS_MODE_SET                        = 0x017,
    DATA_NOT_AVAILABLE                  = 0x018,
    STRING_BUFFER_TO_SMALL              = 0x019,
    ETS_NOT_SUPPORTED                   = 0x01A,
    AUTO_TRIGGER_TIME_TO_SHORT          = 0x01B,
    BUFFER_STALL                        = 0x01C,
    TOO_MANY_SAMPLES                    = 0x01D,
    TOO_MANY_SEGMENTS                   = 0x01E,
    PULSE_WIDTH_QUALIFIER               = 0x01F,
    DELAY                               = 0x020,
    SOURCE_DETAILS                      = 0x021,
    CONDITIONS                          = 0x022,
    USER_CALLBACK                       = 0x023,
    DEVICE_SAMPLING                     = 0x024,
    NO_SAMPLES_AVAILABLE                = 0x025,
    SEGMENT_OUT_OF_RANGE                = 0x026,
    BUSY                                = 0x027,
    STARTINDEX_INVALID                  = 0x028,
    INVALID_INFO                        = 0x029,
    INFO_UNAVAILABLE                    = 0x02A,
    INVALID_SAMPLE_INTERVAL             = 0x02B,
    TRIGGER_ERROR                       = 0x02C,
    MEMORY                              = 0x02D,
    SIG_GEN_PARAM                       = 0x02E,
    POWER_SUPPLY_CONNECTED              = 0x119,
    POWER_SUPPLY_NOT_CONNECTED          = 0x11A,
    POWER_SUPPLY_REQUEST_INVALID        = 0x11B,
    POWER_SUPPLY_UNDERVOLTAGE           = 0x11C,
    CAPTURING_DATA                      = 0x11D,
    USB3_0_DEVICE_NON_USB3_0_PORT       = 0x11E,
}

impl Status {
    pub const fn from_code(code: u32) -> Status {
        Status(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    pub fn is_ok(self) -> bool {
        self == Status::OK
    }

    /// Converts the status into `Ok(())` if the call succeeded, or `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Status> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Status::{}", name),
            None => write!(f, "Status({:#x})", self.0),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PICO_{} ({} ; {:#x})", self.name().unwrap_or("UNKNOWN"), self.0, self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_ok() {
        assert!(Status::OK.is_ok());
        assert_eq!(Status::OK.into_result(), Ok(()));
        assert_eq!(Status::INVALID_HANDLE.into_result(), Err(Status::INVALID_HANDLE));
    }

    #[test]
    fn test_status_names() {
        assert_eq!(Status::from_code(0x11A), Status::POWER_SUPPLY_NOT_CONNECTED);
        assert_eq!(Status::from_code(0x0E).name(), Some("INVALID_TIMEBASE"));
        assert_eq!(Status::from_code(0xdead).name(), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::INVALID_CHANNEL.to_string(), "PICO_INVALID_CHANNEL (16 ; 0x10)");
        assert_eq!(Status::from_code(0x1234).to_string(), "PICO_UNKNOWN (4660 ; 0x1234)");
        assert_eq!(format!("{:?}", Status::OK), "Status::OK");
    }
}
