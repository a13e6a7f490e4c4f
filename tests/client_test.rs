use hydrus_browser::api::client::{ACCESS_KEY_HEADER, CLIENT_NAME, PERMISSION_SEARCH_FILES};
use hydrus_browser::api::types::{ByteRange, FileRef};
use hydrus_browser::{Error, HydrusClient, MediaApi, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// Answer one connection per canned response, in order. Resolves to the
/// lowercased request heads that were received.
async fn serve(responses: Vec<String>) -> Result<(String, JoinHandle<Vec<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            requests.push(String::from_utf8_lossy(&head).to_lowercase());
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
        requests
    });

    Ok((format!("http://{}/", addr), handle))
}

#[tokio::test]
async fn test_non_success_status_is_an_http_error() -> Result<()> {
    let (url, server) = serve(vec![
        response("403 Forbidden", "Invalid access key"),
        response("404 Not Found", ""),
    ])
    .await?;
    let client = HydrusClient::new(url, "bad-key")?;

    match client.get_thumbnail(&FileRef::Id(1)).await {
        Err(err @ Error::Http { .. }) => {
            assert_eq!(err.status(), Some(403));
            let Error::Http { status_text, message, .. } = err else {
                unreachable!()
            };
            assert_eq!(status_text, "Forbidden");
            assert_eq!(message, "Invalid access key");
        }
        other => panic!("expected an HTTP error, got {:?}", other),
    }

    // An empty body falls back to the reason phrase
    match client.get_thumbnail(&FileRef::Hash("ff".to_string())).await {
        Err(Error::Http { status, message, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("expected an HTTP error, got {:?}", other),
    }

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("get /get_files/thumbnail?file_id=1 "));
    assert!(requests[0].contains(&format!("{}: bad-key", ACCESS_KEY_HEADER.to_lowercase())));
    assert!(requests[1].starts_with("get /get_files/thumbnail?hash=ff "));
    Ok(())
}

#[tokio::test]
async fn test_partial_content_is_success() -> Result<()> {
    let (url, server) = serve(vec![response("206 Partial Content", "abcd")]).await?;
    let client = HydrusClient::new(url, "")?;

    let bytes = client
        .get_file(&FileRef::Id(9), Some(ByteRange::new(0, Some(3))))
        .await?;
    assert_eq!(&bytes[..], b"abcd");

    let requests = server.await.unwrap();
    assert!(requests[0].contains("range: bytes=0-3"));
    assert!(!requests[0].contains(&ACCESS_KEY_HEADER.to_lowercase()));
    Ok(())
}

#[tokio::test]
async fn test_json_bodies_are_parsed() -> Result<()> {
    let (url, server) = serve(vec![
        response("200 OK", r#"{"version": 17, "hydrus_version": 441}"#),
        response("200 OK", r#"{"file_ids": [5, 7, 9]}"#),
        response("200 OK", r#"{"access_key": "0123abcd"}"#),
        response("200 OK", "not json"),
    ])
    .await?;
    let client = HydrusClient::new(url, "key")?;

    let version = client.api_version().await?;
    assert_eq!(version.version, 17);
    assert_eq!(version.hydrus_version, 441);

    let ids = client
        .search_files(&["blue sky".to_string(), "cat".to_string()])
        .await?;
    assert_eq!(ids, vec![5, 7, 9]);

    let key = client
        .request_new_permissions(CLIENT_NAME, &[PERMISSION_SEARCH_FILES])
        .await?;
    assert_eq!(key, "0123abcd");

    assert!(matches!(client.api_version().await, Err(Error::Parsing(_))));

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("get /api_version "));
    assert!(requests[1].starts_with("get /get_files/search_files?tags="));
    assert!(requests[2].starts_with("get /request_new_permissions?name=hydrus-browser&basic_permissions=%5b3%5d "));
    Ok(())
}
