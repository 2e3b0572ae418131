//! End-to-end streaming tests over real TCP sockets
//!
//! The input side is driven through an in-memory duplex stream standing in
//! for stdin; clients are plain `TcpStream`s speaking just enough HTTP to
//! read the multipart stream back.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use streameye::client::ClientRegistry;
use streameye::slot::FrameSlot;
use streameye::stats::ServerStats;
use streameye::{JpegFrame, MjpegServer, ServerConfig};

struct TestServer {
    addr: SocketAddr,
    input: Option<DuplexStream>,
    slot: Arc<FrameSlot>,
    registry: Arc<ClientRegistry>,
    stats: Arc<ServerStats>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<streameye::Result<()>>,
}

impl TestServer {
    async fn start(config: ServerConfig) -> Self {
        let server = MjpegServer::bind(config.listen_localhost(true).port(0))
            .await
            .unwrap();

        let addr = server.local_addr().unwrap();
        let slot = Arc::clone(server.slot());
        let registry = Arc::clone(server.registry());
        let stats = Arc::clone(server.stats());

        let (input, input_rx) = tokio::io::duplex(256 * 1024);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(server.serve(input_rx, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            input: Some(input),
            slot,
            registry,
            stats,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    fn input(&mut self) -> &mut DuplexStream {
        self.input.as_mut().unwrap()
    }

    /// Close the input stream (EOF), triggering graceful shutdown
    fn end_input(&mut self) {
        self.input.take();
    }

    fn trigger_shutdown(&mut self) {
        let _ = self.shutdown.take().unwrap().send(());
    }

    async fn join(&mut self) -> streameye::Result<()> {
        tokio::time::timeout(Duration::from_secs(5), &mut self.handle)
            .await
            .expect("server did not stop in time")
            .unwrap()
    }
}

fn jpeg(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0xFF, 0xD8];
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0xFF, 0xD9]);
    frame
}

/// Connect, send a minimal request, and read past the response preamble
async fn connect_client(addr: SocketAddr) -> BufReader<TcpStream> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.0\r\n\r\n").await.unwrap();

    let mut reader = BufReader::new(stream);
    let preamble = read_header_block(&mut reader).await;
    assert_eq!(preamble[0], "HTTP/1.0 200 OK");
    assert!(preamble
        .iter()
        .any(|l| l == "Content-Type: multipart/x-mixed-replace; boundary=jpgboundary"));
    assert!(preamble.iter().any(|l| l == "Server: streamEye"));
    reader
}

/// Read CRLF header lines up to and excluding the blank line
async fn read_header_block(reader: &mut BufReader<TcpStream>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let n = tokio::time::timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .expect("timed out reading headers")
            .unwrap();
        assert!(n > 0, "connection closed inside header block");
        if line == "\r\n" {
            return lines;
        }
        lines.push(line.trim_end().to_owned());
    }
}

/// Read one multipart part and return its payload
async fn read_part(reader: &mut BufReader<TcpStream>) -> Vec<u8> {
    let headers = read_header_block(reader).await;
    assert_eq!(headers[0], "--jpgboundary");
    assert!(headers.iter().any(|l| l == "Content-Type: image/jpeg"));

    let length: usize = headers
        .iter()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .expect("part has a Content-Length")
        .parse()
        .unwrap();

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.unwrap();

    let mut trailer = [0u8; 2];
    reader.read_exact(&mut trailer).await.unwrap();
    assert_eq!(&trailer, b"\r\n");

    payload
}

async fn read_eof(reader: &mut BufReader<TcpStream>) {
    let mut byte = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_secs(5), reader.read(&mut byte))
        .await
        .expect("timed out waiting for connection close")
        .unwrap();
    assert_eq!(n, 0, "expected connection close, got more data");
}

#[tokio::test]
async fn test_single_frame_round_trip() {
    let mut server = TestServer::start(ServerConfig::default()).await;
    let mut client = connect_client(server.addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let frame = jpeg(&[0xAB; 1020]);
    assert_eq!(frame.len(), 1024);
    server.input().write_all(&frame).await.unwrap();
    server.end_input();

    // The lone frame is flushed at EOF and delivered bit-for-bit.
    let payload = read_part(&mut client).await;
    assert_eq!(payload, frame);

    read_eof(&mut client).await;
    server.join().await.unwrap();
}

#[tokio::test]
async fn test_two_frames_auto_separator() {
    let mut server = TestServer::start(ServerConfig::default()).await;
    let mut client = connect_client(server.addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let f1 = jpeg(b"abc");
    let f2 = jpeg(b"de");

    // The first frame is only complete once the second frame's SOI shows
    // up; feed it, let the client drain, then send the rest.
    let mut first_chunk = f1.clone();
    first_chunk.extend_from_slice(&f2[..2]);
    server.input().write_all(&first_chunk).await.unwrap();

    assert_eq!(read_part(&mut client).await, f1);

    server.input().write_all(&f2[2..]).await.unwrap();
    server.end_input();

    assert_eq!(read_part(&mut client).await, f2);
    read_eof(&mut client).await;
    server.join().await.unwrap();
}

#[tokio::test]
async fn test_explicit_separator() {
    let config = ServerConfig::default().separator(b"--XYZ--".to_vec());
    let mut server = TestServer::start(config).await;
    let mut client = connect_client(server.addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.input().write_all(b"aaaa--XYZ--").await.unwrap();
    assert_eq!(read_part(&mut client).await, b"aaaa");

    server.input().write_all(b"bbbb--XYZ--").await.unwrap();
    assert_eq!(read_part(&mut client).await, b"bbbb");

    // The trailing remainder has no separator and is dropped at EOF.
    server.input().write_all(b"cccc").await.unwrap();
    server.end_input();

    read_eof(&mut client).await;
    server.join().await.unwrap();
    assert_eq!(server.stats.snapshot().frames_published, 2);
}

#[tokio::test]
async fn test_broken_pipe_isolated_to_one_session() {
    let mut server = TestServer::start(ServerConfig::default()).await;

    let mut survivor = connect_client(server.addr).await;
    let doomed = connect_client(server.addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.registry.len().await, 2);

    drop(doomed);

    // Keep publishing until the dead session notices the disconnect and
    // reaps itself; the surviving client keeps receiving throughout.
    let mut reaped = false;
    for i in 0..20u8 {
        server.slot.publish(JpegFrame::new(jpeg(&[i; 32])));
        let payload = read_part(&mut survivor).await;
        assert_eq!(payload, jpeg(&[i; 32]));

        if server.registry.len().await == 1 {
            reaped = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(reaped, "disconnected client was never reaped");
    assert_eq!(server.stats.active_clients(), 1);

    server.trigger_shutdown();
    read_eof(&mut survivor).await;
    server.join().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_closes_all_sessions() {
    let mut server = TestServer::start(ServerConfig::default()).await;

    let mut client_a = connect_client(server.addr).await;
    let mut client_b = connect_client(server.addr).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.slot.publish(JpegFrame::new(jpeg(b"live")));
    assert_eq!(read_part(&mut client_a).await, jpeg(b"live"));
    assert_eq!(read_part(&mut client_b).await, jpeg(b"live"));

    server.trigger_shutdown();

    read_eof(&mut client_a).await;
    read_eof(&mut client_b).await;
    server.join().await.unwrap();

    assert!(server.registry.is_empty().await);
    assert_eq!(server.stats.active_clients(), 0);
}

#[tokio::test]
async fn test_silent_client_still_streams() {
    let mut server = TestServer::start(ServerConfig::default()).await;

    // Connect but never send a request: the preamble is written on accept
    // and frames flow regardless.
    let stream = TcpStream::connect(server.addr).await.unwrap();
    let mut reader = BufReader::new(stream);

    let preamble = read_header_block(&mut reader).await;
    assert_eq!(preamble[0], "HTTP/1.0 200 OK");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.registry.len().await, 1);

    server.slot.publish(JpegFrame::new(jpeg(b"mute")));
    assert_eq!(read_part(&mut reader).await, jpeg(b"mute"));

    server.trigger_shutdown();
    read_eof(&mut reader).await;
    server.join().await.unwrap();
}

#[tokio::test]
async fn test_zero_clients_producer_still_segments() {
    let mut server = TestServer::start(ServerConfig::default()).await;

    // No clients at all: frames are segmented, published and dropped.
    let mut stream = Vec::new();
    for i in 0..3u8 {
        stream.extend_from_slice(&jpeg(&[i; 64]));
    }
    server.input().write_all(&stream).await.unwrap();
    server.end_input();

    server.join().await.unwrap();
    assert_eq!(server.stats.snapshot().frames_published, 3);
    assert_eq!(server.stats.snapshot().total_connections, 0);
}
