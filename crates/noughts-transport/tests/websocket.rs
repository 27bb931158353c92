//! Integration tests for the WebSocket transport against a real client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use noughts_transport::{
        Connection, Transport, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on an OS-assigned port and returns one accepted connection
    /// plus the client end.
    async fn pair() -> (WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        let conn = server.await.expect("accept task");
        (conn, client)
    }

    #[tokio::test]
    async fn test_recv_text_frame_from_client() {
        let (conn, mut client) = pair().await;

        client
            .send(Message::Text(r#"{"type":"join_game"}"#.into()))
            .await
            .expect("client send");

        let data = conn.recv().await.expect("recv").expect("frame");
        assert_eq!(data, br#"{"type":"join_game"}"#);
    }

    #[tokio::test]
    async fn test_send_utf8_arrives_as_text_frame() {
        let (conn, mut client) = pair().await;

        conn.send(br#"{"type":"joined_waiting"}"#).await.expect("send");

        let msg = client.next().await.expect("frame").expect("ok");
        assert!(matches!(msg, Message::Text(_)), "got {msg:?}");
        assert_eq!(&msg.into_data()[..], br#"{"type":"joined_waiting"}"#);
    }

    #[tokio::test]
    async fn test_send_non_utf8_arrives_as_binary_frame() {
        let (conn, mut client) = pair().await;

        conn.send(&[0xff, 0xfe, 0x00]).await.expect("send");

        let msg = client.next().await.expect("frame").expect("ok");
        assert!(matches!(msg, Message::Binary(_)), "got {msg:?}");
    }

    #[tokio::test]
    async fn test_recv_returns_none_after_client_close() {
        let (conn, mut client) = pair().await;

        client.close(None).await.expect("client close");

        let result = tokio::time::timeout(Duration::from_secs(2), conn.recv())
            .await
            .expect("recv should finish");
        assert!(matches!(result, Ok(None)), "got {result:?}");
    }

    #[tokio::test]
    async fn test_send_not_blocked_by_pending_recv() {
        let (conn, mut client) = pair().await;
        let conn = Arc::new(conn);

        // Park a reader on the connection; nothing is coming from the client.
        let reader = Arc::clone(&conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), conn.send(b"ping"))
            .await
            .expect("send must not wait for the reader")
            .expect("send");
        let msg = client.next().await.expect("frame").expect("ok");
        assert_eq!(&msg.into_data()[..], b"ping");

        pending.abort();
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (a, _ca) = pair().await;
        let (b, _cb) = pair().await;
        assert_ne!(a.id(), b.id());
        assert!(a.peer_addr().ip().is_loopback());
    }
}
