#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub records_sent: u64,
    pub records_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Receive calls that ended without a complete record.
    pub timeouts: u64,
}

impl LinkStats {
    pub(crate) fn record_sent(&mut self, bytes: usize) {
        self.records_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub(crate) fn record_received(&mut self, bytes: usize) {
        self.records_received += 1;
        self.bytes_received += bytes as u64;
    }

    pub(crate) fn record_timeout(&mut self) {
        self.timeouts += 1;
    }
}
