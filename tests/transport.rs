use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use tootbot::api::mastodon::MastodonTransport;
use tootbot::bot::{CommandLineBot, ImageSource, PostJournal, TootBot};
use tootbot::{
    FocalPoint, MediaAsset, MediaUploader, PostRequest, PostSubmitter, PublishOptions,
    SubmitOutcome, UploadError, Visibility,
};

/// Сырой HTTP запрос, как его увидел сервер
#[derive(Debug, Clone)]
struct SeenRequest {
    head: String,
    body: Vec<u8>,
}

impl SeenRequest {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Мини HTTP сервер: по одному соединению на каждый заготовленный ответ
async fn serve(responses: Vec<(u16, &'static str, &'static str)>) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    tokio::spawn(async move {
        for (status, reason, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            log.lock().unwrap().push(request);

            let reply = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
    });

    (format!("http://{}", addr), seen)
}

async fn read_request(stream: &mut TcpStream) -> SeenRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut request = SeenRequest {
        head,
        body: buf[head_end..].to_vec(),
    };

    if let Some(len) = request.header("content-length") {
        let len: usize = len.parse().unwrap();
        while request.body.len() < len {
            let n = stream.read(&mut chunk).await.unwrap();
            request.body.extend_from_slice(&chunk[..n]);
        }
    } else if request
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        while !request.body.ends_with(b"0\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            request.body.extend_from_slice(&chunk[..n]);
        }
    }

    request
}

fn options(instance: &str, retries: u32) -> Arc<PublishOptions> {
    Arc::new(
        PublishOptions::builder()
            .instance(format!("{}/", instance))
            .api_token("s3cr3t")
            .visibility("private")
            .retries(retries)
            .retry_delay(Duration::from_millis(10))
            .user_agent("tootbot-tests/1.0")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn submit_sends_token_and_reuses_idempotency_key() {
    let (instance, seen) = serve(vec![
        (500, "Internal Server Error", "{}"),
        (200, "OK", r#"{"id":"110","url":"https://example.social/@bot/110"}"#),
    ])
    .await;

    let options = options(&instance, 2);
    let transport = Arc::new(MastodonTransport::new(&options).unwrap());
    let mut submitter = PostSubmitter::new(transport, Arc::clone(&options));

    let request = PostRequest::new("integration", options.visibility());
    let outcome = submitter.submit(&request).await;

    match outcome {
        SubmitOutcome::Success(response) => {
            assert_eq!(response.status, 200);
            assert_eq!(response.reason, "OK");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    for request in &seen {
        assert_eq!(request.request_line(), "POST /api/v1/statuses HTTP/1.1");
        assert_eq!(request.header("authorization").as_deref(), Some("Bearer s3cr3t"));
        assert_eq!(request.header("user-agent").as_deref(), Some("tootbot-tests/1.0"));
        assert_eq!(request.header("content-type").as_deref(), Some("application/json"));
    }
    assert!(seen[0].header("idempotency-key").is_some());
    assert_eq!(seen[0].header("idempotency-key"), seen[1].header("idempotency-key"));

    let body: serde_json::Value = serde_json::from_slice(&seen[1].body).unwrap();
    assert_eq!(body["status"], "integration");
    assert_eq!(body["visibility"], "private");
}

#[tokio::test]
async fn submit_gives_up_after_retries() {
    let (instance, seen) = serve(vec![
        (503, "Service Unavailable", "{}"),
        (503, "Service Unavailable", "{}"),
    ])
    .await;

    let options = options(&instance, 1);
    let transport = Arc::new(MastodonTransport::new(&options).unwrap());
    let mut submitter = PostSubmitter::new(transport, Arc::clone(&options));

    let outcome = submitter
        .submit(&PostRequest::new("nope", Visibility::Direct))
        .await;

    match outcome {
        SubmitOutcome::ExhaustedRetries(Some(last)) => {
            assert_eq!(last.status, 503);
            assert_eq!(last.reason, "Service Unavailable");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_sends_multipart_with_focus() {
    let (instance, seen) = serve(vec![(202, "Accepted", r#"{"id":"4242"}"#)]).await;

    let options = options(&instance, 0);
    let transport = Arc::new(MastodonTransport::new(&options).unwrap());
    let uploader = MediaUploader::new(transport, Arc::clone(&options));

    let asset = MediaAsset::new(b"\x89PNG fake".to_vec(), "alt text", "cat.png")
        .with_thumbnail(b"thumb".to_vec())
        .with_focus(FocalPoint::new(0.5, -0.25).unwrap());

    let media = uploader.upload(asset).await.unwrap();
    assert_eq!(media.as_str(), "4242");

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].request_line(), "POST /api/v2/media HTTP/1.1");
    assert_eq!(seen[0].header("authorization").as_deref(), Some("Bearer s3cr3t"));
    assert!(seen[0]
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data"));

    let body = seen[0].body_text();
    assert!(body.contains("name=\"description\""));
    assert!(body.contains("alt text"));
    assert!(body.contains("name=\"focus\"\r\n\r\n0.500000,-0.250000\r\n"));
    assert!(body.contains("name=\"file\"; filename=\"cat.png\""));
    assert!(body.contains("name=\"thumbnail\"; filename=\"thumbnail-cat.png\""));
    assert!(body.to_lowercase().contains("content-transfer-encoding: binary"));

    let description = body.find("name=\"description\"").unwrap();
    let focus = body.find("name=\"focus\"").unwrap();
    let file = body.find("name=\"file\"").unwrap();
    let thumbnail = body.find("name=\"thumbnail\"").unwrap();
    assert!(description < focus && focus < file && file < thumbnail);
}

#[tokio::test]
async fn upload_rejection_is_returned_not_raised() {
    let (instance, _seen) = serve(vec![(422, "Unprocessable Entity", r#"{"error":"bad"}"#)]).await;

    let options = options(&instance, 0);
    let transport = Arc::new(MastodonTransport::new(&options).unwrap());
    let uploader = MediaUploader::new(transport, Arc::clone(&options));

    let err = uploader
        .upload(MediaAsset::new(vec![1, 2, 3], "x", "x.gif"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Status { status: 422, .. }));
}

#[tokio::test]
async fn command_line_bot_records_post_in_journal() {
    let tmp = tempfile::tempdir().unwrap();
    let image = tmp.path().join("sunset.jpg");
    std::fs::write(&image, b"\xFF\xD8\xFF fake jpeg").unwrap();

    let (instance, seen) = serve(vec![
        (200, "OK", r#"{"id":"9001"}"#),
        (200, "OK", r#"{"id":"31337","url":"https://example.social/@bot/31337"}"#),
    ])
    .await;

    let options = options(&instance, 0);
    let transport = Arc::new(MastodonTransport::new(&options).unwrap());
    let source = ImageSource {
        path: image,
        description: "a sunset".to_string(),
        thumbnail: None,
        focus: None,
    };

    let mut bot = CommandLineBot::new(transport, Arc::clone(&options), "evening")
        .with_image(Some(source))
        .with_hooks(PostJournal::new(tmp.path()));
    bot.post().await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&seen[1].body).unwrap();
    assert_eq!(body["media_ids"], serde_json::json!(["9001"]));

    let journal = bot.into_hooks();
    let saved: serde_json::Value = tootbot::util::load_json(journal.last_post_path()).unwrap();
    assert_eq!(saved["id"], "31337");
}
