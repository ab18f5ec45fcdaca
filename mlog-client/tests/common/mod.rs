//! In-process TCP stub server speaking the server half of the protocol.

#![allow(dead_code)]

use bytes::BytesMut;
use mlog_proto::{Ack, Frame, FrameCodec, Tag};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Decoder;
use tracing::debug;

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Frames received on one connection, in order
pub type Session = Vec<Frame>;

#[derive(Debug, Clone, Default)]
pub struct StubOptions {
    /// Password every NAME must be paired with; `None` accepts anything
    pub password: Option<String>,
    /// Identities refused at the NAME step
    pub banned_names: Vec<String>,
}

pub struct StubServer {
    pub addr: SocketAddr,
    sessions: Arc<Mutex<Vec<Session>>>,
}

impl StubServer {
    pub async fn start(options: StubOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let sessions = Arc::new(Mutex::new(Vec::new()));

        let accepted = sessions.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let options = options.clone();
                let sessions = accepted.clone();
                tokio::spawn(async move {
                    let frames = handle(stream, &options).await;
                    sessions.lock().unwrap().push(frames);
                });
            }
        });

        Self { addr, sessions }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Sessions whose connection has closed
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub async fn wait_for_sessions(&self, count: usize) -> Vec<Session> {
        for _ in 0..400 {
            let sessions = self.sessions();
            if sessions.len() >= count {
                return sessions;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("timed out waiting for {} sessions", count);
    }
}

/// Runs one connection until the client closes it, returning every frame seen
async fn handle(mut stream: TcpStream, options: &StubOptions) -> Session {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::with_capacity(4096);
    let mut frames = Vec::new();
    let mut name = None;

    loop {
        let frame = loop {
            match codec.decode(&mut buf) {
                Ok(Some(frame)) => break frame,
                Ok(None) => {}
                Err(_) => return frames,
            }
            match stream.read_buf(&mut buf).await {
                Ok(0) | Err(_) => return frames,
                Ok(_) => {}
            }
        };

        debug!("stub received {} frame", frame.tag());

        let ack = match frame.tag() {
            Tag::Name => {
                let text = String::from_utf8_lossy(frame.payload()).into_owned();
                let banned = options.banned_names.contains(&text);
                name = Some(text);
                if banned {
                    Ack::Rejected(1)
                } else {
                    Ack::Accepted
                }
            }
            Tag::Pass => match &options.password {
                Some(expected) if expected.as_bytes() != &frame.payload()[..] => Ack::Rejected(1),
                _ if name.is_none() => Ack::Rejected(2),
                _ => Ack::Accepted,
            },
            Tag::Msg => Ack::Accepted,
            Tag::Disconnect => Ack::Accepted,
        };

        frames.push(frame);

        if stream.write_u8(ack.as_byte()).await.is_err() {
            return frames;
        }
    }
}
