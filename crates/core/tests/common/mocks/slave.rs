use mockall::mock;
use simbus_core::bus::{Slave, SlaveStatus};

/// Word-level port of a slave, narrow enough to mock.
pub trait SlavePort {
    fn read(&mut self, address: u64) -> (SlaveStatus, u32);
    fn write(&mut self, data: u32, address: u64) -> SlaveStatus;
}

mock! {
    pub Port {}
    impl SlavePort for Port {
        fn read(&mut self, address: u64) -> (SlaveStatus, u32);
        fn write(&mut self, data: u32, address: u64) -> SlaveStatus;
    }
}

/// Slave over an arbitrary range whose bus accesses go to a mocked port.
///
/// Direct accesses always fail; the range is not validated so tests can
/// register malformed ones.
pub struct MockedSlave {
    name: String,
    start: u64,
    end: u64,
    pub port: MockPort,
}

impl MockedSlave {
    pub fn new(name: &str, start: u64, end: u64, port: MockPort) -> Self {
        Self {
            name: name.to_owned(),
            start,
            end,
            port,
        }
    }

    /// Slave that must never be accessed over the bus.
    pub fn idle(name: &str, start: u64, end: u64) -> Self {
        Self::new(name, start, end, MockPort::new())
    }
}

impl Slave for MockedSlave {
    fn name(&self) -> &str {
        &self.name
    }

    fn start_address(&self) -> u64 {
        self.start
    }

    fn end_address(&self) -> u64 {
        self.end
    }

    fn read(&mut self, data: &mut u32, address: u64) -> SlaveStatus {
        let (status, word) = self.port.read(address);
        if status == SlaveStatus::Ok {
            *data = word;
        }
        status
    }

    fn write(&mut self, data: u32, address: u64) -> SlaveStatus {
        self.port.write(data, address)
    }

    fn direct_read(&mut self, _data: &mut u32, _address: u64) -> bool {
        false
    }

    fn direct_write(&mut self, _data: u32, _address: u64) -> bool {
        false
    }
}
