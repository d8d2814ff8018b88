//! Message channel between the session loop and the game server.
//!
//! The session only needs whole binary frames in and out, so the channel is a
//! small trait. [`WsTransport`] implements it over a blocking WebSocket.

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::{debug, info};
use tungstenite::{
    Message as WsMessage, WebSocket, client::IntoClientRequest, client_tls_with_config,
    protocol::WebSocketConfig, stream::MaybeTlsStream,
};
use url::Url;

use super::{codec::MAX_FRAME_SIZE, errors::TransportError};

/// Default timeout for establishing the TCP connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// One inbound unit from the channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    Binary(Vec<u8>),
    Text(String),
    Ping(Vec<u8>),
    /// The peer closed the channel.
    Close,
}

pub trait Transport {
    /// Block until the next frame arrives.
    fn read_frame(&mut self) -> Result<Frame, TransportError>;

    fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Answer a ping received through [`Transport::read_frame`].
    fn reply_pong(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    fn close(&mut self) -> Result<(), TransportError>;
}

/// Check a server URL and return it parsed.
pub fn parse_server_url(raw: &str) -> Result<Url, TransportError> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::UnsupportedScheme(other.to_string())),
    }
}

/// A blocking WebSocket client. `wss` URLs are served over rustls with the
/// bundled web PKI roots.
pub struct WsTransport {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WsTransport {
    /// Connect to `raw_url` and complete the WebSocket handshake.
    ///
    /// `io_timeout` applies to every read and write after the connection
    /// opens. A read timing out is reported as [`TransportError::Io`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, no resolved address accepts
    /// the connection, or the handshake is rejected.
    pub fn connect(raw_url: &str, io_timeout: Duration) -> Result<Self, TransportError> {
        let url = parse_server_url(raw_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| TransportError::Handshake(format!("{raw_url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TransportError::UnsupportedScheme(url.scheme().to_string()))?;
        let addr = format!("{host}:{port}");

        let stream = Self::open_stream(&addr, CONNECT_TIMEOUT)?;
        stream.set_read_timeout(Some(io_timeout))?;
        stream.set_write_timeout(Some(io_timeout))?;
        stream.set_nodelay(true)?;

        // The request builder derives the Host header from the URI authority
        let request = url.as_str().into_client_request()?;
        let (socket, response) = client_tls_with_config(request, stream, Some(Self::config()), None)
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        info!("connected to {url} ({})", response.status());

        Ok(Self {
            socket,
            closed: false,
        })
    }

    fn open_stream(addr: &str, timeout: Duration) -> Result<TcpStream, TransportError> {
        let connect_error = |reason: String| TransportError::Connect {
            addr: addr.to_string(),
            reason,
        };
        let mut last_error = None;
        for resolved in addr.to_socket_addrs().map_err(|e| connect_error(e.to_string()))? {
            match TcpStream::connect_timeout(&resolved, timeout) {
                Ok(stream) => return Ok(stream),
                Err(error) => {
                    debug!("couldn't connect to {resolved}: {error}");
                    last_error = Some(error);
                }
            }
        }
        Err(connect_error(last_error.map_or_else(
            || "no addresses resolved".to_string(),
            |e| e.to_string(),
        )))
    }

    /// Inbound messages larger than the decoder accepts fail at the socket.
    fn config() -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(MAX_FRAME_SIZE))
            .max_frame_size(Some(MAX_FRAME_SIZE))
    }

    fn map_error(error: tungstenite::Error) -> TransportError {
        match error {
            tungstenite::Error::Io(error) => TransportError::Io(error),
            tungstenite::Error::AlreadyClosed => TransportError::Closed,
            other => TransportError::WebSocket(other),
        }
    }
}

impl Transport for WsTransport {
    fn read_frame(&mut self) -> Result<Frame, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        loop {
            let message = match self.socket.read() {
                Ok(message) => message,
                Err(tungstenite::Error::ConnectionClosed) => {
                    self.closed = true;
                    return Ok(Frame::Close);
                }
                Err(error) => return Err(Self::map_error(error)),
            };
            let frame = match message {
                WsMessage::Binary(payload) => Frame::Binary(payload.to_vec()),
                WsMessage::Text(text) => Frame::Text(text.as_str().to_string()),
                WsMessage::Ping(payload) => Frame::Ping(payload.to_vec()),
                WsMessage::Close(close) => {
                    debug!("server closed the socket: {close:?}");
                    Frame::Close
                }
                WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            };
            return Ok(frame);
        }
    }

    fn write_frame(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.socket
            .send(WsMessage::Binary(payload.to_vec().into()))
            .map_err(Self::map_error)
    }

    fn reply_pong(&mut self, _payload: &[u8]) -> Result<(), TransportError> {
        // Reading a ping already queued the pong, flushing sends it
        self.socket.flush().map_err(Self::map_error)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.socket.close(None) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(error) => Err(Self::map_error(error)),
        }
    }
}
