//! A scriptable DBGp engine for integration tests: reads NUL-terminated
//! command lines, replies with length-prefixed XML frames.
#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub struct FakeEngine<S> {
    stream: S,
    buf: Vec<u8>,
}

impl<S> FakeEngine<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
        }
    }

    /// Next command line the server wrote, without its trailing NUL.
    pub async fn read_command(&mut self) -> String {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == 0) {
                let line: Vec<u8> = self.buf.drain(..pos).collect();
                self.buf.remove(0);
                return String::from_utf8(line).expect("command is not UTF-8");
            }
            let mut chunk = [0u8; 1024];
            let n = self
                .stream
                .read(&mut chunk)
                .await
                .expect("engine read failed");
            assert!(n > 0, "server closed while a command was expected");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Assert the server writes nothing within the window.
    pub async fn expect_silence(&mut self, window: Duration) {
        assert!(
            self.buf.is_empty(),
            "unexpected buffered bytes: {:?}",
            String::from_utf8_lossy(&self.buf)
        );
        let mut chunk = [0u8; 1024];
        match tokio::time::timeout(window, self.stream.read(&mut chunk)).await {
            Err(_) => {}
            Ok(Ok(0)) => {}
            Ok(Ok(n)) => panic!(
                "expected silence, got {} bytes: {:?}",
                n,
                String::from_utf8_lossy(&chunk[..n])
            ),
            Ok(Err(e)) => panic!("engine read failed: {e}"),
        }
    }

    /// Frame and send one XML payload.
    pub async fn send_frame(&mut self, xml: &str) {
        let mut bytes = xml.len().to_string().into_bytes();
        bytes.push(0);
        bytes.extend_from_slice(xml.as_bytes());
        bytes.push(0);
        self.stream
            .write_all(&bytes)
            .await
            .expect("engine write failed");
    }

    pub async fn send_init(&mut self, ide_key: &str, file_uri: &str) {
        let xml = format!(
            concat!(
                r#"<init appid="123" idekey="{}" session="sess" thread="1" language="PHP" "#,
                r#"protocol_version="1.0" fileuri="{}">"#,
                r#"<engine version="3.2"><![CDATA[Xdebug]]></engine></init>"#
            ),
            ide_key, file_uri
        );
        self.send_frame(&xml).await;
    }

    /// Answer the four feature_set commands the server issues on attach.
    pub async fn ack_feature_negotiation(&mut self) {
        for _ in 0..4 {
            let cmd = self.read_command().await;
            assert_eq!(
                command_name(&cmd),
                "feature_set",
                "expected feature negotiation, got: {cmd}"
            );
            let tx = transaction_id(&cmd);
            self.send_frame(&format!(
                r#"<response command="feature_set" transaction_id="{tx}" feature="x" success="1"/>"#
            ))
            .await;
        }
    }
}

pub fn command_name(command: &str) -> &str {
    command.split(' ').next().unwrap_or_default()
}

/// The `-i <n>` value of a command line.
pub fn transaction_id(command: &str) -> u32 {
    let mut tokens = command.split(' ');
    while let Some(token) = tokens.next() {
        if token == "-i" {
            return tokens
                .next()
                .and_then(|v| v.parse().ok())
                .expect("malformed -i value");
        }
    }
    panic!("command has no -i flag: {command}");
}
