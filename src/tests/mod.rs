use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::mapping::{DisplayOptions, FieldMapping};
use crate::normalize::{normalize, RecommendationResponse};
use crate::render::chart::{ChartBackend, ChartSeries};
use crate::render::{
    Notice, NoticeKind, Outcome, RenderState, Renderer, ResultsView, RowView, Settled, StateKind,
    SubmitRejected, Surface,
};
use crate::request::{build_request, FormValues, RequestError};
use crate::runner::{Options, Session, SessionError};
use crate::transport::{HttpOptions, HttpTransport, Transport, TransportError};

/// Surface that appends like `innerHTML +=`, so a missing clear shows up as
/// duplicated rows.
#[derive(Debug, Default)]
struct RecordingSurface {
    busy: bool,
    submit_enabled: bool,
    rows: Vec<RowView>,
    count: Option<u64>,
    insight: Option<String>,
    empty_message: Option<String>,
    notices: Vec<Notice>,
    form_resets: usize,
}

impl RecordingSurface {
    fn new() -> Self {
        Self {
            submit_enabled: true,
            ..Self::default()
        }
    }
}

impl Surface for RecordingSurface {
    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn clear_results(&mut self) {
        self.rows.clear();
        self.count = None;
        self.insight = None;
        self.empty_message = None;
    }

    fn show_results(&mut self, view: &ResultsView) {
        self.rows.extend(view.rows.iter().cloned());
        self.count = Some(view.count);
        self.insight = view.insight.clone();
    }

    fn show_empty(&mut self, message: &str) {
        self.empty_message = Some(message.to_string());
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }

    fn reset_form(&mut self) {
        self.form_resets += 1;
    }
}

#[derive(Debug, Default)]
struct CountingChart {
    created: usize,
    destroyed: usize,
}

impl CountingChart {
    fn live(&self) -> usize {
        self.created - self.destroyed
    }
}

impl ChartBackend for CountingChart {
    type Chart = ChartSeries;

    fn create(&mut self, _canvas: &str, series: &ChartSeries) -> ChartSeries {
        self.created += 1;
        series.clone()
    }

    fn destroy(&mut self, _chart: ChartSeries) {
        self.destroyed += 1;
    }
}

struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Value, TransportError>>>,
    seen: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Result<Value, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Transport for ScriptedTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Timeout {
                url: path.to_string(),
            }))
    }
}

fn offline() -> Result<Value, TransportError> {
    Err(TransportError::Timeout {
        url: "http://127.0.0.1:5000/api/recommend".to_string(),
    })
}

fn foam_body() -> Value {
    json!({
        "recommendations": [{
            "material_type": "Foam",
            "final_rank_score": 92.3,
            "predicted_cost_inr": 15.5,
            "predicted_co2_score": 0.8
        }]
    })
}

fn recommend_form() -> FormValues {
    FormValues::new()
        .with("category", "General")
        .with("weight", "2")
        .with("fragility", "high")
        .with_check("waterResistant", true)
}

fn scripted_session(
    replies: Vec<Result<Value, TransportError>>,
) -> Session<ScriptedTransport, RecordingSurface, CountingChart> {
    let mapping = FieldMapping::recommend();
    let renderer = Renderer::with_chart(
        RecordingSurface::new(),
        mapping.display.clone(),
        CountingChart::default(),
    );
    Session::new(ScriptedTransport::new(replies), mapping, renderer)
}

fn response_of(mapping: &FieldMapping, body: Value) -> RecommendationResponse {
    normalize(&body, &mapping.response).unwrap()
}

#[test]
fn request_contains_exactly_the_declared_keys() {
    for mapping in FieldMapping::builtins() {
        let mut form = FormValues::new();
        for field in mapping.request.iter() {
            if field.kind.is_checkbox() {
                form.check(&field.input, true);
            } else {
                form.set(&field.input, "3");
            }
        }
        let request = build_request(&mapping, &form).unwrap();
        let mut keys: Vec<&str> = request.keys().collect();
        let mut declared = mapping.wire_keys();
        keys.sort();
        declared.sort();
        assert_eq!(keys, declared, "deployment {}", mapping.name);
    }
}

#[test]
fn numeric_fields_are_coerced_to_numbers() {
    let mapping = FieldMapping::catalog();
    let form = FormValues::new()
        .with("weight", " 5.5 ")
        .with("strength", "3")
        .with_check("waterResistant", true);
    let body = build_request(&mapping, &form).unwrap().to_json();
    assert_eq!(
        body,
        json!({"weight_capacity_kg": 5.5, "strength": 3, "water_resistance": 1})
    );
}

#[test]
fn unparsable_number_becomes_default_or_null() {
    let mapping = FieldMapping::catalog();
    let form = FormValues::new()
        .with("weight", "heavy")
        .with("strength", "")
        .with_check("waterResistant", false);
    let body = build_request(&mapping, &form).unwrap().to_json();
    assert!(body["weight_capacity_kg"].is_null());
    assert!(body["strength"].is_null());
    assert_eq!(body["water_resistance"], 0);

    let mapping = FieldMapping::predict();
    let form = FormValues::new()
        .with("strength_encoded", "x")
        .with("weight_capacity", "10")
        .with("biodegradability_score", "80")
        .with("recyclability_percent", "60")
        .with("cost_efficiency_score", "0.7");
    let body = build_request(&mapping, &form).unwrap().to_json();
    assert_eq!(body["strength_encoded"], 0);
    assert_eq!(body["cost_efficiency_score"], 0.7);
}

#[test]
fn missing_input_fails_fast() {
    let mapping = FieldMapping::recommend();
    let form = FormValues::new().with("weight", "2");
    assert_eq!(
        build_request(&mapping, &form),
        Err(RequestError::MissingInput {
            field: "category".to_string(),
            input: "category".to_string()
        })
    );
}

#[test]
fn empty_and_absent_lists_both_render_empty() {
    for (mapping, body) in [
        (FieldMapping::recommend(), json!({"recommendations": []})),
        (
            FieldMapping::product(),
            json!({"product_id": "P1", "message": "No suitable materials found"}),
        ),
    ] {
        let mut renderer = Renderer::new(RecordingSurface::new(), mapping.display.clone());
        let token = renderer.begin_submit().unwrap();
        let settled = renderer.settle(token, Outcome::Response(response_of(&mapping, body)));
        assert_eq!(settled, Settled::Applied(StateKind::Empty));
        assert!(renderer.surface().notices.is_empty());
        assert!(renderer.surface().empty_message.is_some());
    }
}

#[test]
fn empty_message_prefers_backend_text() {
    let mapping = FieldMapping::product();
    let mut renderer = Renderer::new(RecordingSurface::new(), mapping.display.clone());
    let token = renderer.begin_submit().unwrap();
    renderer.settle(
        token,
        Outcome::Response(response_of(&mapping, json!({"message": "No suitable materials found"}))),
    );
    assert_eq!(
        renderer.state(),
        &RenderState::Empty {
            message: "No suitable materials found".to_string()
        }
    );

    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(RecommendationResponse::default()));
    assert_eq!(
        renderer.surface().empty_message.as_deref(),
        Some(crate::render::DEFAULT_EMPTY_MESSAGE)
    );
}

#[test]
fn rendering_twice_replaces_instead_of_appending() {
    let mapping = FieldMapping::recommend();
    let mut renderer = Renderer::with_chart(
        RecordingSurface::new(),
        mapping.display.clone(),
        CountingChart::default(),
    );
    let response = response_of(
        &mapping,
        json!({"recommendations": [
            {"material_type": "Foam", "predicted_cost_inr": 10},
            {"material_type": "Kraft", "predicted_cost_inr": 20}
        ]}),
    );

    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(response.clone()));
    let first = renderer.surface().rows.clone();

    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(response));
    assert_eq!(renderer.surface().rows, first);
    assert_eq!(renderer.surface().rows.len(), 2);

    let chart = renderer.chart().unwrap();
    assert_eq!(chart.backend().created, 2);
    assert_eq!(chart.backend().live(), 1);
}

#[test]
fn rank_order_follows_response_order() {
    let mapping = FieldMapping::catalog();
    let response = response_of(
        &mapping,
        json!({"recommendations": [
            {"predicted_cost": 10, "predicted_co2": 1},
            {"predicted_cost": 20, "predicted_co2": 2}
        ]}),
    );
    let mut renderer = Renderer::new(RecordingSurface::new(), mapping.display.clone());
    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(response));
    let rows = &renderer.surface().rows;
    assert_eq!(rows[0].rank, 1);
    assert_eq!(rows[0].cost.as_deref(), Some("₹10.00"));
    assert_eq!(rows[0].co2.as_deref(), Some("1.00 kg"));
    assert_eq!(rows[1].rank, 2);
    assert_eq!(rows[1].cost.as_deref(), Some("₹20.00"));
    assert_eq!(rows[1].material, None);
}

#[test]
fn submit_is_refused_while_loading() {
    let mut renderer = Renderer::new(RecordingSurface::new(), DisplayOptions::default());
    renderer.begin_submit().unwrap();
    assert!(!renderer.surface().submit_enabled);
    assert!(renderer.surface().busy);
    assert_eq!(renderer.begin_submit(), Err(SubmitRejected::InFlight));
}

#[test]
fn late_response_from_superseded_submit_is_dropped() {
    let mapping = FieldMapping::recommend();
    let mut renderer = Renderer::new(RecordingSurface::new(), mapping.display.clone());
    let old = renderer.begin_submit().unwrap();
    renderer.reset();
    let new = renderer.begin_submit().unwrap();
    assert!(new > old);

    let fresh = response_of(&mapping, json!({"recommendations": [{"material_type": "Kraft"}]}));
    assert_eq!(
        renderer.settle(new, Outcome::Response(fresh)),
        Settled::Applied(StateKind::Results)
    );
    let late = response_of(&mapping, json!({"recommendations": [{"material_type": "Foam"}]}));
    assert_eq!(renderer.settle(old, Outcome::Response(late)), Settled::Stale);
    assert_eq!(renderer.surface().rows.len(), 1);
    assert_eq!(renderer.surface().rows[0].material.as_deref(), Some("Kraft"));
}

#[test]
fn failure_keeps_previous_results() {
    let mapping = FieldMapping::recommend();
    let mut renderer = Renderer::new(RecordingSurface::new(), mapping.display.clone());
    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(response_of(&mapping, foam_body())));

    let token = renderer.begin_submit().unwrap();
    let settled = renderer.settle(
        token,
        Outcome::Failed {
            message: "offline".to_string(),
        },
    );
    assert_eq!(settled, Settled::Applied(StateKind::Error));
    let surface = renderer.surface();
    assert_eq!(surface.rows.len(), 1);
    assert!(surface.submit_enabled);
    assert!(!surface.busy);
    assert_eq!(surface.notices.len(), 1);
    assert_eq!(surface.notices[0].kind, NoticeKind::Error);
    assert!(surface.notices[0].retryable);
}

#[test]
fn reset_is_idempotent_and_disposes_chart() {
    let mapping = FieldMapping::recommend();
    let mut renderer = Renderer::with_chart(
        RecordingSurface::new(),
        mapping.display.clone(),
        CountingChart::default(),
    );
    let token = renderer.begin_submit().unwrap();
    renderer.settle(token, Outcome::Response(response_of(&mapping, foam_body())));
    assert!(renderer.chart().unwrap().is_live());

    renderer.reset();
    renderer.reset();
    assert_eq!(renderer.state(), &RenderState::Idle);
    assert!(renderer.surface().rows.is_empty());
    assert_eq!(renderer.surface().form_resets, 2);
    let chart = renderer.chart().unwrap();
    assert!(!chart.is_live());
    assert_eq!(chart.backend().destroyed, 1);
}

#[tokio::test]
async fn foam_scenario_renders_formatted_row() {
    let mut session = scripted_session(vec![Ok(foam_body())]);
    let report = session.submit(&recommend_form()).await.unwrap();
    assert_eq!(report.state, StateKind::Results);
    assert_eq!(
        report.request,
        json!({
            "product_category": "General",
            "weight_kg": 2,
            "fragility": "high",
            "water_resistant": true
        })
    );

    let row = &session.renderer().surface().rows[0];
    assert_eq!(row.material.as_deref(), Some("Foam"));
    assert_eq!(row.score.as_deref(), Some("92.3/100"));
    assert_eq!(row.cost.as_deref(), Some("₹15.50"));
    assert_eq!(row.co2.as_deref(), Some("0.80 CO₂"));
    assert_eq!(row.origin.as_deref(), Some("Global"));
    assert_eq!(row.weight_capacity, None);

    let seen = session.transport().seen.lock().unwrap();
    assert_eq!(seen[0].0, "/api/recommend");
}

#[tokio::test]
async fn offline_submit_shows_notice_and_keeps_results() {
    let mut session = scripted_session(vec![Ok(foam_body()), offline()]);
    session.submit(&recommend_form()).await.unwrap();
    let report = session.submit(&recommend_form()).await.unwrap();

    assert_eq!(report.state, StateKind::Error);
    assert!(report.failure.unwrap().contains("Failed to connect"));
    let surface = session.renderer().surface();
    assert!(surface.submit_enabled);
    assert_eq!(surface.rows.len(), 1);
    assert_eq!(surface.rows[0].material.as_deref(), Some("Foam"));
    assert!(surface.empty_message.is_none());
}

#[tokio::test]
async fn reset_clears_form_and_results() {
    let mut session = scripted_session(vec![Ok(foam_body()), Ok(foam_body())]);
    let mut form = recommend_form();
    session.submit(&form).await.unwrap();

    session.reset(&mut form);
    assert_eq!(session.renderer().state(), &RenderState::Idle);
    assert!(session.renderer().surface().rows.is_empty());
    assert_eq!(session.renderer().surface().form_resets, 1);

    let err = session.submit(&form).await.unwrap_err();
    assert!(matches!(err, SessionError::Input(_)));
    assert_eq!(session.transport().seen.lock().unwrap().len(), 1);

    form.set("category", "Food").set("weight", "1").set("fragility", "low");
    let report = session.submit(&form).await.unwrap();
    assert_eq!(
        report.request,
        json!({
            "product_category": "Food",
            "weight_kg": 1,
            "fragility": "low",
            "water_resistant": false
        })
    );
}

#[test]
fn catalog_score_is_rounded_to_whole_points() {
    let mapping = FieldMapping::catalog();
    let response = response_of(
        &mapping,
        json!({"recommendations": [{"material_name": "Jute", "sustainability_score": 87.6}]}),
    );
    let row = crate::render::view(&response.recommendations[0], 0, &mapping.display);
    assert_eq!(row.score.as_deref(), Some("88/100"));
}

#[tokio::test]
async fn malformed_response_is_a_failure_not_empty() {
    let mut session = scripted_session(vec![Ok(json!({"recommendations": "soon"}))]);
    let report = session.submit(&recommend_form()).await.unwrap();
    assert_eq!(report.state, StateKind::Error);
    assert!(session.renderer().surface().empty_message.is_none());
}

#[tokio::test]
async fn input_error_leaves_renderer_idle() {
    let mut session = scripted_session(vec![Ok(foam_body())]);
    let err = session
        .submit(&FormValues::new().with("weight", "2"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Input(_)));
    assert_eq!(session.renderer().state(), &RenderState::Idle);
    assert!(session.transport().seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn http_session_posts_json_and_renders_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/recommend"))
        .and(header("content-type", "application/json"))
        .and(header("x-api-key", "secret"))
        .and(body_json(json!({
            "product_category": "General",
            "weight_kg": 2,
            "fragility": "high",
            "water_resistant": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(foam_body()))
        .expect(1)
        .mount(&server)
        .await;

    let options = Options {
        base_url: server.uri(),
        api_key: Some("secret".to_string()),
        ..Options::default()
    };
    let mut session = Session::connect(&options, RecordingSurface::new()).unwrap();
    let report = session.submit(&recommend_form()).await.unwrap();
    assert_eq!(report.state, StateKind::Results);
    assert_eq!(session.renderer().surface().rows[0].cost.as_deref(), Some("₹15.50"));
}

#[tokio::test]
async fn http_empty_list_is_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/recommend"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "No suitable materials found.", "recommendations": []})),
        )
        .mount(&server)
        .await;

    let options = Options {
        base_url: server.uri(),
        ..Options::default()
    };
    let mut session = Session::connect(&options, RecordingSurface::new()).unwrap();
    let report = session.submit(&recommend_form()).await.unwrap();
    assert_eq!(report.state, StateKind::Empty);
    assert!(session.renderer().surface().notices.is_empty());
}

#[tokio::test]
async fn http_500_is_error_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/recommend"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "model not loaded"})))
        .mount(&server)
        .await;

    let options = Options {
        base_url: server.uri(),
        ..Options::default()
    };
    let mut session = Session::connect(&options, RecordingSurface::new()).unwrap();
    let report = session.submit(&recommend_form()).await.unwrap();
    assert_eq!(report.state, StateKind::Error);
    let notice = &session.renderer().surface().notices[0];
    assert!(notice.message.contains("500"));
    assert!(notice.message.contains("model not loaded"));
    assert!(session.renderer().surface().empty_message.is_none());
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let transport = HttpTransport::new(&HttpOptions {
        base_url: format!("http://127.0.0.1:{port}"),
        timeout_seconds: 2,
        ..HttpOptions::default()
    })
    .unwrap();
    let err = transport
        .post_json("/api/recommend", &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;
    let transport = HttpTransport::new(&HttpOptions {
        base_url: server.uri(),
        ..HttpOptions::default()
    })
    .unwrap();
    let err = transport.post_json("/predict", &json!({})).await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed { .. }));
}

#[tokio::test]
async fn extra_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommend"))
        .and(header("x-trace", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recommendations": []})))
        .expect(1)
        .mount(&server)
        .await;
    let transport = HttpTransport::new(&HttpOptions {
        base_url: server.uri(),
        header: Some("X-Trace: abc".to_string()),
        ..HttpOptions::default()
    })
    .unwrap();
    let value = transport.post_json("/recommend", &json!({})).await.unwrap();
    assert_eq!(value, json!({"recommendations": []}));
}

#[tokio::test]
async fn health_probe_reads_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy", "service": "EcoPackAI Backend"})),
        )
        .mount(&server)
        .await;
    let transport = HttpTransport::new(&HttpOptions {
        base_url: server.uri(),
        ..HttpOptions::default()
    })
    .unwrap();
    let status = transport.health("/api/health").await.unwrap();
    assert_eq!(status.status, "healthy");
    assert_eq!(status.service.as_deref(), Some("EcoPackAI Backend"));
}

#[tokio::test]
async fn predict_deployment_wraps_single_prediction() {
    let mapping = FieldMapping::predict();
    let renderer = Renderer::with_chart(
        RecordingSurface::new(),
        mapping.display.clone(),
        CountingChart::default(),
    );
    let transport = ScriptedTransport::new(vec![Ok(json!({
        "predicted_cost": 41.237,
        "predicted_co2": 1.2344
    }))]);
    let mut session = Session::new(transport, mapping, renderer);
    let form = FormValues::new()
        .with("strength_encoded", "2")
        .with("weight_capacity", "10")
        .with("biodegradability_score", "80")
        .with("recyclability_percent", "60")
        .with("cost_efficiency_score", "0.7");
    let report = session.submit(&form).await.unwrap();
    assert_eq!(report.state, StateKind::Results);
    let row = &session.renderer().surface().rows[0];
    assert_eq!(row.cost.as_deref(), Some("₹ 41.24 / kg"));
    assert_eq!(row.co2.as_deref(), Some("1.234 kg"));
    let chart = session.renderer().chart().unwrap().current().unwrap();
    assert_eq!(chart.labels, vec!["#1"]);
    assert_eq!(chart.cost, vec![Some(41.237)]);
}
