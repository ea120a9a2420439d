use std::net::SocketAddr;
use std::time::Duration;

use http::Method;
use msgbridge::{Json, Request, Server};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

async fn echo(req: Request) -> Json<Value> {
    Json(req.json().cloned().unwrap_or(Value::Null))
}

fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

async fn connect(addr: SocketAddr) -> TcpStream {
    for _ in 0..50 {
        match TcpStream::connect(addr).await {
            Ok(s) => return s,
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("server did not start on {addr}");
}

/// Reads exactly one response (head plus `content-length` bytes of body)
/// without waiting for the connection to close.
async fn read_response(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response head");
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .map(|v| v.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    while buf.len() < head_end + len {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before response body");
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf).unwrap()
}

fn spawn_server(addr: SocketAddr) -> (oneshot::Sender<()>, tokio::task::JoinHandle<Result<(), msgbridge::Error>>) {
    let app = msgbridge::initialize_to(&mut std::io::sink()).on(Method::POST, "/echo", echo);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::bind(addr).serve_with_shutdown(app, async move {
        let _ = stop_rx.await;
    }));
    (stop_tx, server)
}

/// Sends one raw HTTP/1.1 request and returns the whole response as text.
async fn send(addr: SocketAddr, raw: String) -> String {
    let mut stream = connect(addr).await;
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

fn post_json(body: &str) -> String {
    format!(
        "POST /echo HTTP/1.1\r\n\
         host: localhost\r\n\
         origin: https://client.example\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn serves_initialized_app_over_tcp() {
    let addr = free_addr();
    let (stop_tx, server) = spawn_server(addr);

    let res = send(addr, post_json(r#"{"a":1}"#)).await;
    let lower = res.to_ascii_lowercase();
    assert!(res.starts_with("HTTP/1.1 200"), "{res}");
    assert!(lower.contains("access-control-allow-origin: *"), "{res}");
    assert!(res.ends_with(r#"{"a":1}"#), "{res}");

    let res = send(addr, post_json(r#"{"a":"#)).await;
    assert!(res.starts_with("HTTP/1.1 400"), "{res}");
    assert!(res.to_ascii_lowercase().contains("access-control-allow-origin: *"), "{res}");

    let preflight = "OPTIONS /echo HTTP/1.1\r\n\
                     host: localhost\r\n\
                     origin: https://client.example\r\n\
                     access-control-request-method: POST\r\n\
                     connection: close\r\n\r\n"
        .to_owned();
    let res = send(addr, preflight).await;
    assert!(res.starts_with("HTTP/1.1 204"), "{res}");
    assert!(res.to_ascii_lowercase().contains("access-control-allow-methods: get,head,put,patch,post,delete"), "{res}");

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn declared_oversized_json_body_is_refused_before_it_arrives() {
    let addr = free_addr();
    let (stop_tx, server) = spawn_server(addr);

    let mut stream = connect(addr).await;
    let head = "POST /echo HTTP/1.1\r\n\
                host: localhost\r\n\
                origin: https://client.example\r\n\
                content-type: application/json\r\n\
                content-length: 10000000\r\n\r\n";
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(&[b' '; 1024]).await.unwrap();

    let res = tokio::time::timeout(Duration::from_secs(2), read_response(&mut stream))
        .await
        .expect("no response while the body was still incomplete");
    assert!(res.starts_with("HTTP/1.1 413"), "{res}");
    assert!(res.to_ascii_lowercase().contains("access-control-allow-origin: *"), "{res}");

    drop(stream);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn chunked_json_body_over_limit_is_too_large() {
    let addr = free_addr();
    let (stop_tx, server) = spawn_server(addr);

    let chunk = vec![b' '; 100 * 1024 + 1];
    let mut raw = format!(
        "POST /echo HTTP/1.1\r\n\
         host: localhost\r\n\
         content-type: application/json\r\n\
         transfer-encoding: chunked\r\n\
         connection: close\r\n\r\n{:x}\r\n",
        chunk.len()
    )
    .into_bytes();
    raw.extend_from_slice(&chunk);
    raw.extend_from_slice(b"\r\n0\r\n\r\n");

    let mut stream = connect(addr).await;
    stream.write_all(&raw).await.unwrap();
    let res = tokio::time::timeout(Duration::from_secs(2), read_response(&mut stream))
        .await
        .expect("no response to chunked body");
    assert!(res.starts_with("HTTP/1.1 413"), "{res}");

    drop(stream);
    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let addr = free_addr();
    let (stop_tx, server) = spawn_server(addr);

    let mut stream = connect(addr).await;
    let body = r#"{"a":1}"#;
    let raw = format!(
        "POST /echo HTTP/1.1\r\n\
         host: localhost\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();
    let res = read_response(&mut stream).await;
    assert!(res.starts_with("HTTP/1.1 200"), "{res}");

    // the connection stays open and idle while the server stops
    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(3), server)
        .await
        .expect("shutdown blocked on an idle keep-alive connection")
        .unwrap()
        .unwrap();

    let mut rest = Vec::new();
    let n = tokio::time::timeout(Duration::from_secs(1), stream.read_to_end(&mut rest))
        .await
        .expect("server left the connection open")
        .unwrap();
    assert_eq!(n, 0);
}
