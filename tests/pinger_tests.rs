// tests/pinger_tests.rs
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use uptime_pinger::{
    config::{GatewayConfig, ProberConfig, RendererConfig},
    gateway::{CommandGateway, GatewayReply, Identity},
    prober::Prober,
    registry::{Endpoint, EndpointRegistry},
    renderer::{DisplayPayload, RenderOutcome, Renderer},
    scheduler::{Cycle, Lifecycle, Supervisor},
    sink::{DiscordSink, DisplayHandle, DisplaySink, DisplayTarget, SinkError},
    state::SharedState,
    status::EndpointState,
};

const TARGET: DisplayTarget = DisplayTarget {
    channel_id: 42,
    message_id: 7,
};

#[derive(Default)]
struct RecordingSink {
    updates: Mutex<Vec<DisplayPayload>>,
}

#[async_trait]
impl DisplaySink for RecordingSink {
    async fn locate(&self, target: &DisplayTarget) -> Result<Option<DisplayHandle>, SinkError> {
        Ok(Some(DisplayHandle {
            channel_id: target.channel_id,
            message_id: target.message_id,
        }))
    }

    async fn update(
        &self,
        _handle: &DisplayHandle,
        payload: &DisplayPayload,
    ) -> Result<(), SinkError> {
        self.updates.lock().await.push(payload.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct Idle;

#[async_trait]
impl Cycle for Idle {
    async fn run(&self) {}

    fn name(&self) -> &'static str {
        "idle"
    }
}

fn fast_prober_config() -> ProberConfig {
    ProberConfig {
        interval_secs: 1,
        timeout_secs: 1,
        jitter_min_secs: 0,
        jitter_max_secs: 0,
    }
}

fn fast_renderer_config() -> RendererConfig {
    RendererConfig {
        interval_secs: 1,
        ..RendererConfig::default()
    }
}

#[tokio::test]
async fn test_one_up_one_timing_out() {
    let mut server = mockito::Server::new_async().await;
    let _up = server.mock("GET", "/").with_status(200).create_async().await;
    let silent = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let registry = EndpointRegistry::new(vec![
        Endpoint::new("A", format!("{}/", server.url()).parse().unwrap()),
        Endpoint::new(
            "B",
            format!("http://{}/", silent.local_addr().unwrap())
                .parse()
                .unwrap(),
        ),
    ])
    .unwrap();
    let state = SharedState::new(&registry);
    let prober = Prober::new(&fast_prober_config(), registry, state.clone(), None).unwrap();

    prober.run_cycle().await;

    let snapshot = state.read_snapshot().await;
    assert_eq!(snapshot.state("A"), Some(EndpointState::Online));
    assert_eq!(snapshot.state("B"), Some(EndpointState::Offline));
}

#[tokio::test]
async fn test_supervised_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let probes = server
        .mock("GET", "/health")
        .with_status(200)
        .expect_at_least(1)
        .create_async()
        .await;

    let registry = EndpointRegistry::new(vec![
        Endpoint::new("svc", format!("{}/health", server.url()).parse().unwrap()),
        Endpoint::new("gone", "http://does-not-exist.invalid/".parse().unwrap()),
    ])
    .unwrap();
    let state = SharedState::new(&registry);
    let sink = Arc::new(RecordingSink::default());

    let prober = Arc::new(
        Prober::new(&fast_prober_config(), registry.clone(), state.clone(), None).unwrap(),
    );
    let renderer = Arc::new(Renderer::new(
        &fast_renderer_config(),
        registry,
        state.clone(),
        sink.clone(),
        Some(TARGET),
        None,
    ));
    let supervisor = Supervisor::new(
        state.clone(),
        prober,
        renderer,
        &fast_prober_config(),
        &fast_renderer_config(),
    );

    assert_eq!(supervisor.lifecycle(), Lifecycle::NotReady);
    supervisor.on_session_ready().await;
    supervisor.on_session_ready().await;

    let settled = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let done = sink.updates.lock().await.iter().any(|p| {
                p.endpoints
                    .iter()
                    .all(|(_, state)| state.is_settled())
            });
            if done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;
    assert!(settled.is_ok(), "renderer never showed a settled table");

    let updates = sink.updates.lock().await.clone();
    let last = updates.last().unwrap();
    assert_eq!(
        last.endpoints,
        vec![
            ("svc".to_string(), EndpointState::Online),
            ("gone".to_string(), EndpointState::Offline),
        ]
    );
    assert!(last.started_at.is_some());

    supervisor.shutdown().await;
    probes.assert_async().await;
}

#[tokio::test(start_paused = true)]
async fn test_rendered_uptime_advances_with_session() {
    let registry = EndpointRegistry::new(vec![Endpoint::new(
        "a",
        "http://a.example/".parse().unwrap(),
    )])
    .unwrap();
    let state = SharedState::new(&registry);
    let sink = Arc::new(RecordingSink::default());
    let renderer_config = RendererConfig {
        interval_secs: 10,
        ..RendererConfig::default()
    };
    let renderer = Arc::new(Renderer::new(
        &renderer_config,
        registry,
        state.clone(),
        sink.clone(),
        Some(TARGET),
        None,
    ));
    let supervisor = Supervisor::new(
        state,
        Arc::new(Idle),
        renderer,
        &ProberConfig::default(),
        &renderer_config,
    );

    supervisor.on_session_ready().await;
    tokio::time::sleep(Duration::from_secs(25)).await;

    let uptimes: Vec<String> = sink
        .updates
        .lock()
        .await
        .iter()
        .map(|p| p.uptime.to_string())
        .collect();
    assert_eq!(uptimes, vec!["00:00:00:00", "00:00:00:10", "00:00:00:20"]);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_missing_status_message_skips_render() {
    let mut server = mockito::Server::new_async().await;
    let _get = server
        .mock("GET", "/channels/42/messages/7")
        .with_status(404)
        .with_body(r#"{"message":"Unknown Message","code":10008}"#)
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/channels/42/messages/7")
        .expect(0)
        .create_async()
        .await;

    let registry = EndpointRegistry::new(vec![Endpoint::new(
        "a",
        "http://a.example/".parse().unwrap(),
    )])
    .unwrap();
    let state = SharedState::new(&registry);
    state.mark_start().await;
    let started = state.started_at().await;
    let before = state.read_snapshot().await;

    let sink = Arc::new(DiscordSink::with_base_url("tok", server.url()).unwrap());
    let renderer = Renderer::new(
        &RendererConfig::default(),
        registry,
        state.clone(),
        sink,
        Some(TARGET),
        None,
    );

    assert_eq!(renderer.run_cycle().await, RenderOutcome::TargetMissing);
    assert_eq!(state.read_snapshot().await, before);
    assert_eq!(state.started_at().await, started);
    patch.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_notice_never_reaches_transport() {
    let mut server = mockito::Server::new_async().await;
    let post = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let sink = Arc::new(DiscordSink::with_base_url("tok", server.url()).unwrap());
    let gateway = CommandGateway::new(&GatewayConfig::default(), sink);
    let member = Identity::new("someone").with_role("Member");

    let reply = gateway.send_notice(&member, "123").await;

    assert_eq!(reply, GatewayReply::Denied);
    post.assert_async().await;
}

#[tokio::test]
async fn test_authorized_notice_is_posted() {
    let mut server = mockito::Server::new_async().await;
    let post = server
        .mock("POST", "/channels/123/messages")
        .match_header("authorization", "Bot tok")
        .with_status(200)
        .with_body(r#"{"id":"1"}"#)
        .create_async()
        .await;

    let sink = Arc::new(DiscordSink::with_base_url("tok", server.url()).unwrap());
    let gateway = CommandGateway::new(&GatewayConfig::default(), sink);
    let root = Identity::new("op").with_role("root");

    let reply = gateway.send_notice(&root, "123").await;

    assert_eq!(reply, GatewayReply::Sent { destination: 123 });
    post.assert_async().await;
}
