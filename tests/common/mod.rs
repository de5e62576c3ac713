//! Shared mock transport collaborators for integration tests.
//!
//! Every mock records its calls (and the remaining-budget value it was
//! handed) into a shared [`CallLog`] so tests can assert cleanup counts and
//! timeout monotonicity.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use url::Url;

use buslink::auth::{CbsChannel, CbsToken, CbsTokenProvider};
use buslink::config::{LinkRole, LinkSettings};
use buslink::establish::{generate_client_id, LinkCreator, LinkFactory};
use buslink::transport::{
    Connection, ConnectionProvisioner, Link, Session, SessionSettings, TransportError,
    TransportResult,
};

/// Everything the mocks observed during one or more attempts.
#[derive(Debug, Default)]
pub struct CallLog {
    pub acquire_remaining: Vec<Duration>,
    pub token_remaining: Vec<Duration>,
    pub session_open_remaining: Vec<Duration>,
    pub link_open_remaining: Vec<Duration>,
    pub sessions_created: u32,
    pub sessions_opened: u32,
    pub session_aborts: u32,
    pub session_close_reasons: Vec<TransportError>,
    pub links_built: u32,
    pub links_opened: u32,
}

pub type SharedLog = Arc<Mutex<CallLog>>;

pub struct MockProvisioner {
    pub log: SharedLog,
    pub connection: Arc<MockConnection>,
    pub fail: Option<TransportError>,
    pub delay: Duration,
}

#[async_trait]
impl ConnectionProvisioner for MockProvisioner {
    async fn acquire(&self, remaining: Duration) -> TransportResult<Arc<dyn Connection>> {
        self.log.lock().unwrap().acquire_remaining.push(remaining);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.fail {
            return Err(error.clone());
        }
        Ok(self.connection.clone())
    }
}

pub struct MockConnection {
    pub log: SharedLog,
    pub cbs: Option<Arc<MockCbsChannel>>,
    pub session_create_fail: Option<TransportError>,
    pub session_open_fail: Option<TransportError>,
    pub session_open_delay: Duration,
    pub session_close_fail: Option<TransportError>,
    pub session_inner_error: Option<TransportError>,
}

impl Connection for MockConnection {
    fn cbs_channel(&self) -> Option<Arc<dyn CbsChannel>> {
        self.cbs.clone().map(|channel| channel as Arc<dyn CbsChannel>)
    }

    fn create_session(&self, settings: SessionSettings) -> TransportResult<Box<dyn Session>> {
        assert!(settings.properties.is_empty(), "session properties start empty");
        if let Some(error) = &self.session_create_fail {
            return Err(error.clone());
        }
        self.log.lock().unwrap().sessions_created += 1;
        Ok(Box::new(MockSession {
            log: self.log.clone(),
            open_fail: self.session_open_fail.clone(),
            open_delay: self.session_open_delay,
            close_fail: self.session_close_fail.clone(),
            inner: self.session_inner_error.clone(),
            closing: false,
        }))
    }
}

pub struct MockSession {
    log: SharedLog,
    open_fail: Option<TransportError>,
    open_delay: Duration,
    close_fail: Option<TransportError>,
    inner: Option<TransportError>,
    closing: bool,
}

#[async_trait]
impl Session for MockSession {
    async fn open(&mut self, timeout: Duration) -> TransportResult<()> {
        self.log.lock().unwrap().session_open_remaining.push(timeout);
        if timeout.is_zero() {
            return Err(TransportError::Timeout(timeout));
        }
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if let Some(error) = &self.open_fail {
            return Err(error.clone());
        }
        self.log.lock().unwrap().sessions_opened += 1;
        Ok(())
    }

    fn abort(&mut self) {
        self.log.lock().unwrap().session_aborts += 1;
    }

    async fn close(&mut self, reason: &TransportError) -> TransportResult<()> {
        self.log
            .lock()
            .unwrap()
            .session_close_reasons
            .push(reason.clone());
        self.closing = true;
        if let Some(error) = &self.close_fail {
            return Err(error.clone());
        }
        Ok(())
    }

    fn is_closing(&self) -> bool {
        self.closing
    }

    fn inner_error(&self) -> Option<TransportError> {
        self.inner.clone()
    }
}

pub struct MockCbsChannel {
    pub log: SharedLog,
    pub fail: Option<TransportError>,
    pub delay: Duration,
}

#[async_trait]
impl CbsChannel for MockCbsChannel {
    async fn send_token(
        &self,
        provider: &dyn CbsTokenProvider,
        endpoint: &Url,
        _audience: &str,
        resource: &str,
        required_claims: &[String],
        timeout: Duration,
    ) -> TransportResult<SystemTime> {
        self.log.lock().unwrap().token_remaining.push(timeout);
        if timeout.is_zero() {
            return Err(TransportError::Timeout(timeout));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(error) = &self.fail {
            return Err(error.clone());
        }
        let token = provider.token(endpoint, resource, required_claims).await?;
        Ok(token.expires_at_utc)
    }
}

/// Token provider returning a fixed-lifetime token.
pub struct StaticTokenProvider {
    pub ttl: Duration,
}

impl Default for StaticTokenProvider {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(20 * 60),
        }
    }
}

#[async_trait]
impl CbsTokenProvider for StaticTokenProvider {
    async fn token(
        &self,
        _endpoint: &Url,
        applies_to: &str,
        _required_claims: &[String],
    ) -> TransportResult<CbsToken> {
        Ok(CbsToken {
            value: format!("sig-for-{applies_to}"),
            token_type: "sastoken".to_string(),
            expires_at_utc: SystemTime::now() + self.ttl,
        })
    }
}

pub struct MockFactory {
    pub log: SharedLog,
    pub build_fail: Option<TransportError>,
    pub link_open_fail: Option<TransportError>,
    pub link_open_delay: Duration,
    pub link_inner_error: Option<TransportError>,
}

impl LinkFactory for MockFactory {
    fn build_link(
        &self,
        _connection: &dyn Connection,
        _settings: &LinkSettings,
        _session: &mut dyn Session,
    ) -> TransportResult<Box<dyn Link>> {
        if let Some(error) = &self.build_fail {
            return Err(error.clone());
        }
        self.log.lock().unwrap().links_built += 1;
        Ok(Box::new(MockLink {
            log: self.log.clone(),
            open_fail: self.link_open_fail.clone(),
            open_delay: self.link_open_delay,
            inner: self.link_inner_error.clone(),
        }))
    }
}

pub struct MockLink {
    log: SharedLog,
    open_fail: Option<TransportError>,
    open_delay: Duration,
    inner: Option<TransportError>,
}

#[async_trait]
impl Link for MockLink {
    async fn open(&mut self, timeout: Duration) -> TransportResult<()> {
        self.log.lock().unwrap().link_open_remaining.push(timeout);
        if timeout.is_zero() {
            return Err(TransportError::Timeout(timeout));
        }
        if !self.open_delay.is_zero() {
            tokio::time::sleep(self.open_delay).await;
        }
        if let Some(error) = &self.open_fail {
            return Err(error.clone());
        }
        self.log.lock().unwrap().links_opened += 1;
        Ok(())
    }

    fn inner_error(&self) -> Option<TransportError> {
        self.inner.clone()
    }
}

/// A log event captured by [`CaptureSubscriber`]: its message plus the names
/// of the structured fields it carried.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub message: String,
    pub fields: Vec<String>,
}

/// Minimal tracing subscriber recording every event, so tests can assert
/// which structured fields the workflow attaches to its log events.
pub struct CaptureSubscriber {
    pub events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl tracing::Subscriber for CaptureSubscriber {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
    }

    fn record(&self, _id: &tracing::span::Id, _record: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _id: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            message: visitor.message,
            fields: visitor.fields,
        });
    }

    fn enter(&self, _id: &tracing::span::Id) {}

    fn exit(&self, _id: &tracing::span::Id) {}
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(field.name().to_string());
        }
    }
}

/// One establishment attempt's worth of configurable mock behavior.
pub struct Rig {
    pub log: SharedLog,
    pub provisioner_fail: Option<TransportError>,
    pub acquire_delay: Duration,
    pub cbs_missing: bool,
    pub cbs_fail: Option<TransportError>,
    pub cbs_delay: Duration,
    pub session_create_fail: Option<TransportError>,
    pub session_open_fail: Option<TransportError>,
    pub session_open_delay: Duration,
    pub session_close_fail: Option<TransportError>,
    pub session_inner_error: Option<TransportError>,
    pub build_fail: Option<TransportError>,
    pub link_open_fail: Option<TransportError>,
    pub link_open_delay: Duration,
    pub link_inner_error: Option<TransportError>,
    pub operation_timeout: Duration,
}

impl Default for Rig {
    fn default() -> Self {
        Self::new()
    }
}

impl Rig {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(CallLog::default())),
            provisioner_fail: None,
            acquire_delay: Duration::ZERO,
            cbs_missing: false,
            cbs_fail: None,
            cbs_delay: Duration::ZERO,
            session_create_fail: None,
            session_open_fail: None,
            session_open_delay: Duration::ZERO,
            session_close_fail: None,
            session_inner_error: None,
            build_fail: None,
            link_open_fail: None,
            link_open_delay: Duration::ZERO,
            link_inner_error: None,
            operation_timeout: Duration::from_secs(30),
        }
    }

    pub fn connection(&self) -> Arc<MockConnection> {
        let cbs = if self.cbs_missing {
            None
        } else {
            Some(Arc::new(MockCbsChannel {
                log: self.log.clone(),
                fail: self.cbs_fail.clone(),
                delay: self.cbs_delay,
            }))
        };
        Arc::new(MockConnection {
            log: self.log.clone(),
            cbs,
            session_create_fail: self.session_create_fail.clone(),
            session_open_fail: self.session_open_fail.clone(),
            session_open_delay: self.session_open_delay,
            session_close_fail: self.session_close_fail.clone(),
            session_inner_error: self.session_inner_error.clone(),
        })
    }

    /// Build a creator against an explicit (possibly shared) connection.
    pub fn creator_on(&self, connection: Arc<MockConnection>) -> LinkCreator {
        let provisioner = Arc::new(MockProvisioner {
            log: self.log.clone(),
            connection,
            fail: self.provisioner_fail.clone(),
            delay: self.acquire_delay,
        });
        let factory = Box::new(MockFactory {
            log: self.log.clone(),
            build_fail: self.build_fail.clone(),
            link_open_fail: self.link_open_fail.clone(),
            link_open_delay: self.link_open_delay,
            link_inner_error: self.link_inner_error.clone(),
        });
        let settings = LinkSettings {
            role: LinkRole::Sender,
            target: Some("orders".to_string()),
            ..LinkSettings::default()
        };
        LinkCreator::new(
            "orders",
            provisioner,
            Url::parse("amqps://bus.example.com/orders").unwrap(),
            vec!["Listen".to_string(), "Send".to_string()],
            Arc::new(StaticTokenProvider::default()),
            settings,
            factory,
            generate_client_id("test"),
            self.operation_timeout,
        )
    }

    pub fn creator(&self) -> LinkCreator {
        self.creator_on(self.connection())
    }
}
