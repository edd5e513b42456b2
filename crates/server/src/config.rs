use std::time::Duration;

use thiserror::Error;

const DEFAULT_BACKLOG: u32 = 64;
const DEFAULT_BUFFER_SIZE: usize = 4096;
const DEFAULT_MAX_RX_BUFFER: usize = 64 * 1024;
const DEFAULT_ACCEPT_BURST: usize = 64;
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_EVENTS_CAPACITY: usize = 1024;

/// Tunables of a [`TcpServer`](crate::TcpServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    port: u16,
    backlog: u32,
    rx_buffer_size: usize,
    tx_buffer_size: usize,
    max_rx_buffer: usize,
    accept_burst: usize,
    poll_timeout: Duration,
    events_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            backlog: DEFAULT_BACKLOG,
            rx_buffer_size: DEFAULT_BUFFER_SIZE,
            tx_buffer_size: DEFAULT_BUFFER_SIZE,
            max_rx_buffer: DEFAULT_MAX_RX_BUFFER,
            accept_burst: DEFAULT_ACCEPT_BURST,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Port to bind; `0` lets the OS pick one.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn backlog(&self) -> u32 {
        self.backlog
    }

    /// Initial capacity of a connection's receive buffer.
    pub fn rx_buffer_size(&self) -> usize {
        self.rx_buffer_size
    }

    /// Initial capacity of a connection's transmit buffer.
    pub fn tx_buffer_size(&self) -> usize {
        self.tx_buffer_size
    }

    /// Unconsumed bytes a connection may hold before it is closed.
    pub fn max_rx_buffer(&self) -> usize {
        self.max_rx_buffer
    }

    /// Connections accepted per listener readiness event before yielding to the others.
    pub fn accept_burst(&self) -> usize {
        self.accept_burst
    }

    /// Upper bound on one readiness wait, and so on the latency of a bare flag-only stop.
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    pub fn events_capacity(&self) -> usize {
        self.events_capacity
    }
}

#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    fn new() -> Self {
        Self { config: ServerConfig::default() }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn backlog(mut self, backlog: u32) -> Self {
        self.config.backlog = backlog;
        self
    }

    /// Sets both the receive and the transmit initial capacity.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.rx_buffer_size = size;
        self.config.tx_buffer_size = size;
        self
    }

    pub fn rx_buffer_size(mut self, size: usize) -> Self {
        self.config.rx_buffer_size = size;
        self
    }

    pub fn tx_buffer_size(mut self, size: usize) -> Self {
        self.config.tx_buffer_size = size;
        self
    }

    pub fn max_rx_buffer(mut self, size: usize) -> Self {
        self.config.max_rx_buffer = size;
        self
    }

    pub fn accept_burst(mut self, burst: usize) -> Self {
        self.config.accept_burst = burst;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    pub fn events_capacity(mut self, capacity: usize) -> Self {
        self.config.events_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let config = self.config;
        if config.backlog == 0 {
            return Err(ConfigError::ZeroBacklog);
        }
        if config.rx_buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        if config.max_rx_buffer < config.rx_buffer_size {
            return Err(ConfigError::MaxRxBelowBuffer { max_rx_buffer: config.max_rx_buffer, rx_buffer_size: config.rx_buffer_size });
        }
        if config.accept_burst == 0 {
            return Err(ConfigError::ZeroAcceptBurst);
        }
        if config.events_capacity == 0 {
            return Err(ConfigError::ZeroEventsCapacity);
        }
        Ok(config)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("backlog must be greater than zero")]
    ZeroBacklog,

    #[error("receive buffer size must be greater than zero")]
    ZeroBufferSize,

    #[error("max receive buffer {max_rx_buffer} is smaller than the initial receive buffer {rx_buffer_size}")]
    MaxRxBelowBuffer { max_rx_buffer: usize, rx_buffer_size: usize },

    #[error("accept burst must be greater than zero")]
    ZeroAcceptBurst,

    #[error("events capacity must be greater than zero")]
    ZeroEventsCapacity,
}
