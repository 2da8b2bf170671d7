//! Mock connector for testing.
//!
//! Records every session operation so tests can assert on the order of
//! open, begin, execute, commit, rollback, and close.

use super::{Connector, IsolationLevel, QueryResult, Session};
use crate::config::ConnectionConfig;
use crate::error::{ReportError, Result};
use crate::query::Statement;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

/// One recorded session operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was opened for the given display string.
    Open(String),
    Begin(IsolationLevel),
    /// A read statement, rendered with its values inlined.
    Fetch(String),
    /// A write statement, rendered with its values inlined.
    Execute(String),
    Commit,
    Rollback,
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<SessionEvent>,
    result: QueryResult,
    connect_error: Option<String>,
    begin_error: Option<String>,
    query_error: Option<String>,
    close_error: Option<String>,
}

/// A connector whose sessions return a predefined result and record what they were asked to do.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a mock whose sessions return an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose sessions return `result` from every fetch.
    pub fn with_result(result: QueryResult) -> Self {
        let connector = Self::new();
        connector.lock().result = result;
        connector
    }

    /// Makes every `open` fail with a connection error.
    pub fn failing_connect(self, message: impl Into<String>) -> Self {
        self.lock().connect_error = Some(message.into());
        self
    }

    /// Makes every `begin` fail with a query error.
    pub fn failing_begin(self, message: impl Into<String>) -> Self {
        self.lock().begin_error = Some(message.into());
        self
    }

    /// Makes every `close` fail with a connection error. The session still counts as closed.
    pub fn failing_close(self, message: impl Into<String>) -> Self {
        self.lock().close_error = Some(message.into());
        self
    }

    /// Makes every fetch and execute fail with a query error.
    pub fn failing_query(self, message: impl Into<String>) -> Self {
        self.lock().query_error = Some(message.into());
        self
    }

    /// Returns the events recorded so far, across all sessions.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().events.clone()
    }

    /// Returns the number of sessions opened but not yet closed.
    pub fn open_sessions(&self) -> usize {
        let state = self.lock();
        let opened = state
            .events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Open(_)))
            .count();
        let closed = state
            .events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Close))
            .count();
        opened - closed
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn Session>> {
        let mut state = self.lock();
        if let Some(message) = &state.connect_error {
            return Err(ReportError::connection(message.clone()));
        }
        state
            .events
            .push(SessionEvent::Open(config.display_string()));

        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            closed: false,
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    closed: bool,
}

impl MockSession {
    fn record(&self, event: SessionEvent) -> Result<MutexGuard<'_, MockState>> {
        if self.closed {
            return Err(ReportError::internal("Session is already closed"));
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.events.push(event);
        Ok(state)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn begin(&mut self, isolation_level: IsolationLevel) -> Result<()> {
        let state = self.record(SessionEvent::Begin(isolation_level))?;
        match &state.begin_error {
            Some(message) => Err(ReportError::query(message.clone())),
            None => Ok(()),
        }
    }

    async fn fetch_all(&mut self, statement: &Statement) -> Result<QueryResult> {
        let state = self.record(SessionEvent::Fetch(statement.render()))?;
        match &state.query_error {
            Some(message) => Err(ReportError::query(message.clone())),
            None => Ok(state.result.clone()),
        }
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        let state = self.record(SessionEvent::Execute(statement.render()))?;
        match &state.query_error {
            Some(message) => Err(ReportError::query(message.clone())),
            None => Ok(0),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(SessionEvent::Commit)?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(SessionEvent::Rollback)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let close_error = self.record(SessionEvent::Close)?.close_error.clone();
        self.closed = true;
        match close_error {
            Some(message) => Err(ReportError::connection(message)),
            None => Ok(()),
        }
    }
}
