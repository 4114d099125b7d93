// End-to-end tests of the XML-RPC transport against a mock HTTP server.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sklik::transport::TransportError;
use sklik::{AdsFilter, Credentials, Field, SklikClient, SklikError};

fn xml_response(members: &str) -> ResponseTemplate {
    let body = format!(
        "<?xml version=\"1.0\"?>\n<methodResponse><params><param><value><struct>\
         {members}</struct></value></param></params></methodResponse>"
    );
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(body)
}

fn member(name: &str, value: &str) -> String {
    format!("<member><name>{name}</name><value>{value}</value></member>")
}

fn ok_status() -> String {
    member("status", "<int>200</int>") + &member("statusMessage", "<string>OK</string>")
}

async fn mount(server: &MockServer, rpc_method: &str, members: String) {
    Mock::given(method("POST"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains(format!(
            "<methodName>{rpc_method}</methodName>"
        )))
        .respond_with(xml_response(&members))
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer) {
    mount(
        server,
        "api.version",
        ok_status()
            + &member("versionName", "<string>cipisek</string>")
            + &member("versionNumber", "<string>2.5.1</string>"),
    )
    .await;
    mount(
        server,
        "client.login",
        ok_status() + &member("session", "<string>abc</string>"),
    )
    .await;
    mount(
        server,
        "api.limits",
        ok_status()
            + &member(
                "limits",
                "<struct><member><name>antiDosCallCount</name><value><int>100</int></value></member>\
                 <member><name>antiDosTimeInterval</name><value><int>60</int></value></member></struct>",
            )
            + &member(
                "batchCallLimits",
                "<array><data><value><struct>\
                 <member><name>name</name><value><string>keywords.create</string></value></member>\
                 <member><name>limit</name><value><int>50</int></value></member>\
                 </struct></value></data></array>",
            ),
    )
    .await;
}

fn credentials() -> Credentials {
    Credentials::new("login@sklik.cz", "secret").unwrap()
}

#[tokio::test]
async fn connect_lists_ads_and_closes() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount(
        &server,
        "ads.list",
        ok_status()
            + &member(
                "ads",
                "<array><data><value><struct>\
                 <member><name>id</name><value><int>5</int></value></member>\
                 <member><name>creative1</name><value><string>test &amp; ad</string></value></member>\
                 </struct></value></data></array>",
            ),
    )
    .await;
    mount(&server, "client.logout", ok_status()).await;

    let mut client = SklikClient::builder()
        .endpoint(server.uri())
        .connect(credentials())
        .await
        .unwrap();
    assert_eq!(client.session().map(|s| s.as_str()), Some("abc"));
    assert_eq!(client.get_batch_limit("keywords.create"), Some(50));

    let ads = client.list_ads(&AdsFilter::by_groups([12])).await.unwrap();
    assert_eq!(ads.len(), 1);
    assert_eq!(ads[0].creative1, Field::from("test & ad"));

    client.close().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let bodies = requests
        .iter()
        .map(|request| String::from_utf8_lossy(&request.body).into_owned())
        .collect::<Vec<_>>();
    assert_eq!(bodies.len(), 5);
    assert!(bodies[1].contains("<string>login@sklik.cz</string>"));
    assert!(bodies[3].contains("<name>session</name><value><string>abc</string></value>"));
    assert!(bodies[4].contains("<methodName>client.logout</methodName>"));
}

#[tokio::test]
async fn legacy_dialect_is_rejected() {
    let server = MockServer::start().await;
    mount(
        &server,
        "api.version",
        ok_status()
            + &member("versionName", "<string>bajaja</string>")
            + &member("versionNumber", "<int>1</int>"),
    )
    .await;

    let err = SklikClient::builder()
        .endpoint(server.uri())
        .connect(credentials())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SklikError::IncompatibleApiVersion { ref found, .. } if found == "bajaja"
    ));
}

#[tokio::test]
async fn http_error_status_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let mut client = SklikClient::builder()
        .endpoint(server.uri())
        .retries(2)
        .error_retry_wait(Duration::ZERO)
        .build()
        .unwrap();

    let err = client.get_version().await.unwrap_err();
    match err {
        SklikError::Transport(TransportError::HttpStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body.as_deref(), Some("boom"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn fault_is_not_retried() {
    let server = MockServer::start().await;
    let fault = "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
                 <member><name>faultCode</name><value><int>-501</int></value></member>\
                 <member><name>faultString</name><value><string>Unknown method</string></value></member>\
                 </struct></value></fault></methodResponse>";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(fault))
        .mount(&server)
        .await;

    let mut client = SklikClient::builder()
        .endpoint(server.uri())
        .retries(3)
        .error_retry_wait(Duration::ZERO)
        .build()
        .unwrap();

    let err = client.get_version().await.unwrap_err();
    assert!(matches!(
        err,
        SklikError::Transport(TransportError::Fault { code: -501, ref message }) if message == "Unknown method"
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bad_login_is_an_authentication_error() {
    let server = MockServer::start().await;
    mount(
        &server,
        "api.version",
        ok_status()
            + &member("versionName", "<string>cipisek</string>")
            + &member("versionNumber", "<string>2.5.1</string>"),
    )
    .await;
    mount(
        &server,
        "client.login",
        member("status", "<int>401</int>")
            + &member("statusMessage", "<string>Not authorized</string>"),
    )
    .await;

    let err = SklikClient::builder()
        .endpoint(server.uri())
        .connect(credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, SklikError::Authentication { ref message } if message == "Not authorized"));
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn verbose_logging_never_writes_the_password() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    mount_session(&server).await;
    mount(&server, "client.logout", ok_status()).await;

    let client = SklikClient::builder()
        .endpoint(server.uri())
        .debug(true)
        .connect(Credentials::new("login@sklik.cz", "hunter2-pass").unwrap())
        .await
        .unwrap();
    client.close().await.unwrap();

    let text = logs.text();
    assert!(text.contains("<methodName>api.version</methodName>"));
    assert!(text.contains("client.login"));
    assert!(!text.contains("hunter2-pass"));
}
