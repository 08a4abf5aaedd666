mod mock_reader;
mod rs232;
mod simulator;

pub use mock_reader::{MockReaderLink, MockReply};
pub use rs232::{ParityMode, RS232Config, RS232ReaderLink};
pub use simulator::{SimulatedReaderLink, SimulatorConfig};

use domain::{BridgeError, ReaderLink};

use crate::config::BridgeConfig;

/// Factory for creating the reader link described by the configuration
pub struct LinkFactory;

impl LinkFactory {
    pub fn create_link(config: &BridgeConfig) -> Result<Box<dyn ReaderLink>, BridgeError> {
        if config.simulate {
            return Ok(Box::new(SimulatedReaderLink::new(config.simulator.clone())));
        }

        config.serial.validate()?;
        Ok(Box::new(RS232ReaderLink::new(config.serial.clone())))
    }
}
