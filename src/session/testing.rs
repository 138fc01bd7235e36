// src/session/testing.rs
//! Scripted sessions for tests.

use anyhow::Result;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::{Session, SessionFactory};

const BLANK_PAGE: &str = "<html><body></body></html>";

#[derive(Default)]
struct State {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    current: String,
    visited: Vec<String>,
    filled: Vec<(String, String)>,
    submitted: Vec<String>,
    scroll: HashMap<String, f64>,
    max_scroll: f64,
}

/// Serves canned HTML per URL and records every interaction. Clones share
/// state, so a test can keep a handle to a session it gave away.
#[derive(Clone)]
pub(crate) struct FakeSession {
    state: Arc<Mutex<State>>,
}

impl FakeSession {
    pub fn new() -> Self {
        let state = State {
            current: BLANK_PAGE.to_string(),
            max_scroll: 1500.0,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    /// Navigating to `url` fails as if the browser had crashed.
    pub fn failing_on(self, url: &str) -> Self {
        self.state.lock().unwrap().failing.insert(url.to_string());
        self
    }

    /// Largest `scrollTop` any container reaches.
    pub fn with_max_scroll(self, max_scroll: f64) -> Self {
        self.state.lock().unwrap().max_scroll = max_scroll;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().filled.clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn current_has(&self, selector: &str) -> bool {
        let html = self.state.lock().unwrap().current.clone();
        let document = Html::parse_document(&html);
        Selector::parse(selector)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false)
    }
}

impl Session for FakeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(url) {
            anyhow::bail!("browser disconnected while loading {}", url);
        }
        state.visited.push(url.to_string());
        state.current = state
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE.to_string());
        state.scroll.clear();
        Ok(())
    }

    fn page_source(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current.clone())
    }

    fn fill(&self, selector: &str, text: &str) -> Result<bool> {
        if !self.current_has(selector) {
            return Ok(false);
        }
        self.state
            .lock()
            .unwrap()
            .filled
            .push((selector.to_string(), text.to_string()));
        Ok(true)
    }

    fn submit(&self, selector: &str) -> Result<bool> {
        if !self.current_has(selector) {
            return Ok(false);
        }
        self.state.lock().unwrap().submitted.push(selector.to_string());
        Ok(true)
    }

    fn scroll_by(&self, selector: &str, delta_px: i64) -> Result<Option<f64>> {
        if !self.current_has(selector) {
            return Ok(None);
        }
        let mut state = self.state.lock().unwrap();
        let max_scroll = state.max_scroll;
        let position = state.scroll.entry(selector.to_string()).or_insert(0.0);
        *position = (*position + delta_px as f64).min(max_scroll);
        Ok(Some(*position))
    }
}

/// Hands out pre-built sessions in order.
pub(crate) struct FakeFactory {
    sessions: Mutex<VecDeque<FakeSession>>,
    opened: Mutex<usize>,
}

impl FakeFactory {
    pub fn new(sessions: Vec<FakeSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            opened: Mutex::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        *self.opened.lock().unwrap()
    }
}

impl SessionFactory for FakeFactory {
    fn open(&self) -> Result<Box<dyn Session>> {
        let session = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no more scripted sessions"))?;
        *self.opened.lock().unwrap() += 1;
        Ok(Box::new(session))
    }
}
