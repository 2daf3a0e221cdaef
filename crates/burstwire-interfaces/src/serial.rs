//! Serial-port link endpoint.

use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};

use crate::error::LinkError;
use crate::stream::StreamLink;

/// A [`Link`](crate::traits::Link) over a real serial port.
pub type SerialLink = StreamLink<SerialStream>;

impl StreamLink<SerialStream> {
    /// Open `port` at `baud`, 8N1, with hardware and software flow control
    /// disabled, and purge anything pending in the driver buffers.
    pub fn open(port: &str, baud: u32) -> Result<SerialLink, LinkError> {
        let builder = tokio_serial::new(port, baud)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None);

        let stream = builder.open_native_async()?;
        stream.clear(ClearBuffer::All)?;

        tracing::info!(port, baud, "serial port opened");
        Ok(StreamLink::new(port, baud, stream))
    }
}
