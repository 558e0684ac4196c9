//! Browser-side synchronization protocol.
//!
//! [`ClientSync`] is the reference model of the script embedded in every
//! served page. The script in `sync.js` performs the same transitions; this
//! type exists so they can be exercised without a browser.

use serde_json::Value;

use crate::api::StateResponse;

/// Readiness of the embedded rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    /// The surface has not sent `init` yet; loads are staged.
    #[default]
    NotReady,
    /// The surface accepts `load` commands.
    Ready,
}

/// Message emitted by the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Init,
    Save(String),
    Autosave(String),
    Export(String),
}

impl SurfaceEvent {
    /// Parse a message payload. Anything but a JSON object with a known
    /// `event` (and a string `xml` for edit events) yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(data).ok()?;
        let message = value.as_object()?;
        let xml = || message.get("xml").and_then(Value::as_str).map(str::to_string);

        match message.get("event")?.as_str()? {
            "init" => Some(Self::Init),
            "save" => xml().map(Self::Save),
            "autosave" => xml().map(Self::Autosave),
            "export" => xml().map(Self::Export),
            _ => None,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Post a `load` command with this XML to the surface.
    Load(String),
    /// Send this XML to the state endpoint.
    Push { session_id: String, xml: String },
}

/// Per-page synchronization state.
#[derive(Debug, Clone)]
pub struct ClientSync {
    session_id: String,
    surface_origin: String,
    state: SurfaceState,
    pending: Option<String>,
    last_loaded: Option<String>,
    last_version: u64,
}

impl ClientSync {
    pub fn new(session_id: impl Into<String>, surface_origin: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            surface_origin: surface_origin.into(),
            state: SurfaceState::NotReady,
            pending: None,
            last_loaded: None,
            last_version: 0,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn last_loaded(&self) -> Option<&str> {
        self.last_loaded.as_deref()
    }

    pub fn last_version(&self) -> u64 {
        self.last_version
    }

    /// The poll timer only runs for pages bound to a session.
    pub fn polling_enabled(&self) -> bool {
        !self.session_id.is_empty()
    }

    /// Handle a raw cross-document message.
    ///
    /// Messages from any origin other than the surface's, and payloads that
    /// do not parse, are dropped silently.
    pub fn handle_message(&mut self, origin: &str, data: &str) -> Option<ClientAction> {
        if origin != self.surface_origin {
            return None;
        }
        let event = SurfaceEvent::parse(data)?;
        self.handle_event(event)
    }

    pub fn handle_event(&mut self, event: SurfaceEvent) -> Option<ClientAction> {
        match event {
            SurfaceEvent::Init => {
                self.state = SurfaceState::Ready;
                self.pending.take().map(ClientAction::Load)
            }
            SurfaceEvent::Save(xml) | SurfaceEvent::Autosave(xml) | SurfaceEvent::Export(xml) => {
                // Echo of what we loaded ourselves.
                if self.last_loaded.as_deref() == Some(xml.as_str()) || !self.polling_enabled() {
                    return None;
                }
                Some(ClientAction::Push {
                    session_id: self.session_id.clone(),
                    xml,
                })
            }
        }
    }

    /// Apply the result of one poll.
    ///
    /// Only a strictly newer version with a non-empty document is loaded, so
    /// any versions written between two polls are skipped.
    pub fn handle_poll(&mut self, response: StateResponse) -> Option<ClientAction> {
        if response.version <= self.last_version {
            return None;
        }
        let xml = response.xml.filter(|xml| !xml.is_empty())?;
        self.last_version = response.version;
        self.load(xml)
    }

    /// Load XML into the surface, or stage it until the surface is ready.
    ///
    /// There is a single pending slot; staging again replaces the previous
    /// payload.
    pub fn load(&mut self, xml: String) -> Option<ClientAction> {
        self.last_loaded = Some(xml.clone());
        match self.state {
            SurfaceState::Ready => Some(ClientAction::Load(xml)),
            SurfaceState::NotReady => {
                self.pending = Some(xml);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://embed.diagrams.net";

    fn state(version: u64, xml: Option<&str>) -> StateResponse {
        StateResponse {
            xml: xml.map(str::to_string),
            version,
            last_updated: None,
        }
    }

    fn ready_client() -> ClientSync {
        let mut client = ClientSync::new("s1", ORIGIN);
        assert_eq!(client.handle_event(SurfaceEvent::Init), None);
        client
    }

    #[test]
    fn test_init_without_pending_does_not_load() {
        let mut client = ClientSync::new("s1", ORIGIN);
        assert_eq!(client.state(), SurfaceState::NotReady);

        let action = client.handle_message(ORIGIN, r#"{"event":"init"}"#);
        assert_eq!(action, None);
        assert_eq!(client.state(), SurfaceState::Ready);
        assert_eq!(client.pending(), None);
    }

    #[test]
    fn test_xml_before_init_is_flushed_once() {
        let mut client = ClientSync::new("s1", ORIGIN);
        assert_eq!(client.handle_poll(state(1, Some("<a/>"))), None);
        assert_eq!(client.pending(), Some("<a/>"));

        let action = client.handle_event(SurfaceEvent::Init);
        assert_eq!(action, Some(ClientAction::Load("<a/>".into())));
        assert_eq!(client.pending(), None);

        // A repeated init has nothing left to flush.
        assert_eq!(client.handle_event(SurfaceEvent::Init), None);
    }

    #[test]
    fn test_pending_slot_is_overwritten() {
        let mut client = ClientSync::new("s1", ORIGIN);
        client.handle_poll(state(1, Some("<first/>")));
        client.handle_poll(state(2, Some("<second/>")));

        assert_eq!(
            client.handle_event(SurfaceEvent::Init),
            Some(ClientAction::Load("<second/>".into()))
        );
    }

    #[test]
    fn test_poll_skips_to_latest_version() {
        let mut client = ready_client();

        // Versions 1 and 2 were written between two ticks; only 2 is seen.
        let action = client.handle_poll(state(2, Some("<v2/>")));
        assert_eq!(action, Some(ClientAction::Load("<v2/>".into())));
        assert_eq!(client.last_version(), 2);

        assert_eq!(client.handle_poll(state(1, Some("<v1/>"))), None);
        assert_eq!(client.handle_poll(state(2, Some("<v2/>"))), None);
        assert_eq!(client.last_loaded(), Some("<v2/>"));
    }

    #[test]
    fn test_poll_ignores_absent_session() {
        let mut client = ready_client();
        assert_eq!(client.handle_poll(StateResponse::absent()), None);
        assert_eq!(client.handle_poll(state(3, None)), None);
        assert_eq!(client.last_version(), 0);
    }

    #[test]
    fn test_edit_is_pushed() {
        let mut client = ready_client();
        client.handle_poll(state(1, Some("<remote/>")));

        let action = client.handle_message(ORIGIN, r#"{"event":"autosave","xml":"<local/>"}"#);
        assert_eq!(
            action,
            Some(ClientAction::Push {
                session_id: "s1".into(),
                xml: "<local/>".into(),
            })
        );
    }

    #[test]
    fn test_echo_of_loaded_xml_is_not_pushed() {
        let mut client = ready_client();
        client.handle_poll(state(1, Some("<remote/>")));

        for event in ["save", "autosave", "export"] {
            let data = format!(r#"{{"event":"{event}","xml":"<remote/>"}}"#);
            assert_eq!(client.handle_message(ORIGIN, &data), None, "{event}");
        }
    }

    #[test]
    fn test_foreign_and_malformed_messages_are_ignored() {
        let mut client = ClientSync::new("s1", ORIGIN);

        assert_eq!(
            client.handle_message("https://evil.example", r#"{"event":"init"}"#),
            None
        );
        assert_eq!(client.state(), SurfaceState::NotReady);

        assert_eq!(client.handle_message(ORIGIN, "not json"), None);
        assert_eq!(client.handle_message(ORIGIN, r#"{"event":"zoom"}"#), None);
        assert_eq!(client.handle_message(ORIGIN, r#"{"event":"save"}"#), None);
        assert_eq!(client.handle_message(ORIGIN, r#"["init"]"#), None);
        assert_eq!(client.handle_message(ORIGIN, r#"{"event":"save","xml":42}"#), None);
        assert_eq!(client.state(), SurfaceState::NotReady);
    }

    #[test]
    fn test_no_session_means_no_sync() {
        let mut client = ClientSync::new("", ORIGIN);
        assert!(!client.polling_enabled());
        client.handle_event(SurfaceEvent::Init);
        assert_eq!(client.handle_event(SurfaceEvent::Save("<x/>".into())), None);
    }
}
