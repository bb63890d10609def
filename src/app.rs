//! Application state shared by every command
//!
//! An [`App`] owns the session and agent contexts. Commands reach them through
//! accessors that fail with [`ContextError::NotProvided`] when the App was
//! built without one.

use anyhow::{Context, Result};

use crate::agent::{Agent, AgentContext};
use crate::api::{sidebar, ApiClient, ApiError};
use crate::auth::{CookieJar, Navigator, Session};
use crate::config::{Config, EMAIL_API_BASE};
use crate::models::ConversationSummary;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("{0} context was not provided")]
    NotProvided(&'static str),
}

/// Session bound to the real backend client
pub type BackendSession = Session<ApiClient, Location>;

/// Current location of the CLI. Persisted between runs.
#[derive(Debug, Clone)]
pub struct Location {
    path: String,
}

impl Location {
    pub fn new(path: Option<String>) -> Self {
        Self {
            path: path.unwrap_or_else(|| "/".to_string()),
        }
    }
}

impl Navigator for Location {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&mut self, path: &str) {
        tracing::info!("Navigating to {}", path);
        self.path = path.to_string();
    }
}

/// Sidebar conversation list, newest first
#[derive(Debug, Default)]
pub struct ChatList {
    items: Vec<ConversationSummary>,
}

impl ChatList {
    pub fn items(&self) -> &[ConversationSummary] {
        &self.items
    }

    pub fn get(&self, conversation: &str) -> Option<&ConversationSummary> {
        self.items.iter().find(|c| c.conversation == conversation)
    }

    pub fn replace(&mut self, items: Vec<ConversationSummary>) {
        self.items = items;
    }

    pub fn add(&mut self, chat: ConversationSummary) {
        self.items.insert(0, chat);
    }

    pub fn remove(&mut self, conversation: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|c| c.conversation != conversation);
        self.items.len() != before
    }

    pub fn rename(&mut self, conversation: &str, title: &str) -> bool {
        match self.items.iter_mut().find(|c| c.conversation == conversation) {
            Some(chat) => {
                chat.title = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

pub struct App {
    config: Config,
    session: Option<BackendSession>,
    agent: Option<AgentContext>,
    chats: ChatList,
}

impl App {
    /// Bare app with no contexts provided.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
            agent: None,
            chats: ChatList::default(),
        }
    }

    /// Provide both contexts and run the initial profile fetch.
    pub async fn start(config: Config, agent: Agent) -> Result<Self> {
        let jar = CookieJar::from_stored(config.cookies.clone());
        if jar.is_empty() {
            tracing::debug!("No stored session cookies");
        }
        let client = ApiClient::backend(&config.backend_url(), jar.clone(), config.request_timeout())
            .context("Failed to build backend client")?;
        let location = Location::new(config.last_path.clone());

        let session = Session::new(client, location, jar);
        session.mount().await;

        Ok(Self::new(config)
            .with_session(session)
            .with_agent(AgentContext::new(agent)))
    }

    pub fn with_session(mut self, session: BackendSession) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_agent(mut self, agent: AgentContext) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> Result<&BackendSession, ContextError> {
        self.session
            .as_ref()
            .ok_or(ContextError::NotProvided("session"))
    }

    pub fn agent(&self) -> Result<&AgentContext, ContextError> {
        self.agent
            .as_ref()
            .ok_or(ContextError::NotProvided("agent"))
    }

    pub fn agent_mut(&mut self) -> Result<&mut AgentContext, ContextError> {
        self.agent
            .as_mut()
            .ok_or(ContextError::NotProvided("agent"))
    }

    /// Backend client behind the session.
    pub fn backend(&self) -> Result<&ApiClient, ContextError> {
        Ok(self.session()?.api())
    }

    pub fn labs_client(&self) -> Result<ApiClient> {
        ApiClient::labs(&self.config.labs_url(), self.config.request_timeout())
            .context("Failed to build labs client")
    }

    pub fn email_client(&self) -> Result<ApiClient> {
        ApiClient::email(EMAIL_API_BASE, self.config.request_timeout())
            .context("Failed to build email client")
    }

    pub fn chats(&self) -> &ChatList {
        &self.chats
    }

    pub fn chats_mut(&mut self) -> &mut ChatList {
        &mut self.chats
    }

    /// Reload the chat list if someone is signed in, otherwise empty it.
    pub async fn refresh_chats(&mut self) -> Result<(), ApiError> {
        let Some(session) = self.session.as_ref() else {
            self.chats.clear();
            return Ok(());
        };
        if session.user().is_none() {
            self.chats.clear();
            return Ok(());
        }

        match sidebar::list_conversations(session.api()).await {
            Ok(list) => {
                self.chats.replace(list);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load chats: {}", e);
                Err(e)
            }
        }
    }

    /// Write cookies and location back to the config file.
    pub fn persist(&mut self) -> Result<()> {
        if let Some(session) = &self.session {
            if let Some(jar) = session.api().jar() {
                self.config.cookies = jar.snapshot();
            }
            self.config.last_path = Some(session.current_path());
        }
        self.config.save()
    }
}
