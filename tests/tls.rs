//! The raw client over TLS, against a local rustls acceptor with a
//! self-signed certificate.

use std::pin::Pin;
use std::sync::Arc;

use async_std::io::prelude::*;
use async_std::io::BufReader;
use async_std::net::TcpListener;
use async_std::task;
use futures_rustls::TlsAcceptor;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};

use rawh::client::{Client, ClientRequest, RawClient};
use rawh::config::ClientConfig;
use rawh::http::line::read_line;

fn acceptor() -> TlsAcceptor {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![certified.cert.der().clone()], key)
    .unwrap();
    TlsAcceptor::from(Arc::new(config))
}

#[async_std::test]
async fn raw_request_over_tls() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = acceptor();

    // Records the request lines and body, answers, then sends close_notify.
    let server = task::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut stream = acceptor.accept(tcp).await.unwrap();

        let mut lines = Vec::new();
        let mut body = vec![0u8; 4];
        {
            let mut reader = BufReader::new(&mut stream);
            loop {
                let line = read_line(&mut reader).await.unwrap();
                if line.is_empty() {
                    break;
                }
                lines.push(line);
            }
            reader.read_exact(&mut body).await.unwrap();
        }

        stream
            .write_all(b"HTTP/1.1 200 OK\r\nX-Tls: yes\r\n\r\nsecure body")
            .await
            .unwrap();
        std::future::poll_fn(|cx| Pin::new(&mut stream).poll_close(cx))
            .await
            .unwrap();
        (lines, body)
    });

    let client = RawClient::new(&ClientConfig {
        insecure: true,
        ..ClientConfig::default()
    })
    .unwrap();
    let response = client
        .send(&ClientRequest {
            method: "POST".to_string(),
            url: format!("https://{addr}/secure?x=1"),
            header_lines: vec!["X-Trace: abc".to_string()],
            body: b"ping".to_vec(),
        })
        .await
        .unwrap();

    let (lines, body) = server.await;
    assert_eq!(
        lines,
        vec![
            "POST /secure?x=1 HTTP/1.1".to_string(),
            format!("Host: {addr}"),
            "X-Trace: abc".to_string(),
            "Content-Length: 4".to_string(),
        ]
    );
    assert_eq!(body, b"ping");

    assert_eq!(response.status_line, "HTTP/1.1 200 OK");
    assert_eq!(response.header_lines, vec!["X-Tls: yes"]);
    assert_eq!(response.body, b"secure body");
}

#[async_std::test]
async fn certificate_is_verified_unless_insecure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = acceptor();

    task::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        // the handshake fails on the client side; the outcome here is irrelevant
        let _ = acceptor.accept(tcp).await;
    });

    let client = RawClient::new(&ClientConfig::default()).unwrap();
    let result = client
        .send(&ClientRequest {
            method: "GET".to_string(),
            url: format!("https://{addr}/"),
            ..ClientRequest::default()
        })
        .await;
    assert!(matches!(
        result,
        Err(rawh::client::ClientError::Dial(rawh::net::dial::DialError::Handshake(_)))
    ));
}
