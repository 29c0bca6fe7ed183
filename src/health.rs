//! Minimal health responder for process supervisors. Any connection gets
//! a static 200; no state is shared with the bot.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";

pub async fn run(port: u16) {
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Health responder failed to bind port {}: {}", port, e);
            return;
        }
    };
    log::info!("Health responder listening on port {}", port);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(respond(stream));
            }
            Err(e) => {
                log::warn!("Health responder accept failed: {}", e);
            }
        }
    }
}

async fn respond(mut stream: TcpStream) {
    // Drain whatever request line arrived, then answer
    let mut buf = [0u8; 1024];
    let _ = stream.read(&mut buf).await;
    let _ = stream.write_all(RESPONSE).await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responds_200_to_a_get() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            respond(stream).await;
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();

        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        let text = String::from_utf8_lossy(&response);
        assert!(text.starts_with("HTTP/1.1 200 OK"));
        assert!(text.ends_with("OK"));
    }
}
