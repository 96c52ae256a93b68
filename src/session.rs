// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Who is signed in.
//!
//! Authentication itself happens elsewhere; whoever performs it reports
//! the outcome through [`SessionProvider::resolve`]. Components that need
//! the identity call [`SessionProvider::listen`] and receive every change
//! over a channel instead of reading shared global state.

use std::sync::mpsc::{self, Receiver, Sender};

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    SignedIn(Identity),
    SignedOut,
}

pub struct SessionProvider {
    state: AuthState,
    listeners: Vec<Sender<Option<Identity>>>,
}

impl Default for SessionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider {
    pub fn new() -> Self {
        Self {
            state: AuthState::Unknown,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn current(&self) -> Option<&Identity> {
        match &self.state {
            AuthState::SignedIn(id) => Some(id),
            _ => None,
        }
    }

    /// True until the auth collaborator has reported for the first time.
    pub fn is_loading(&self) -> bool {
        self.state == AuthState::Unknown
    }

    pub fn listen(&mut self) -> Receiver<Option<Identity>> {
        let (sender, receiver) = mpsc::channel();
        if !self.is_loading() {
            let _ = sender.send(self.current().cloned());
        }
        self.listeners.push(sender);
        receiver
    }

    /// Records the outcome of an auth check. Listeners hear about it only
    /// when the state actually changed.
    pub fn resolve(&mut self, identity: Option<Identity>) {
        let next = match identity {
            Some(id) => AuthState::SignedIn(id),
            None => AuthState::SignedOut,
        };
        if next == self.state {
            return;
        }
        match &next {
            AuthState::SignedIn(id) => info!("signed in as {}", id.uid),
            _ => info!("signed out"),
        }
        self.state = next;
        let current = self.current().cloned();
        self.listeners
            .retain(|l| l.send(current.clone()).is_ok());
    }

    pub fn sign_in(&mut self, identity: Identity) {
        self.resolve(Some(identity));
    }

    pub fn sign_out(&mut self) {
        self.resolve(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifies_once_per_transition() {
        let mut session = SessionProvider::new();
        assert!(session.is_loading());
        let rx = session.listen();
        assert!(rx.try_recv().is_err());

        session.sign_in(Identity::new("u1"));
        session.sign_in(Identity::new("u1"));
        assert_eq!(rx.try_recv().unwrap(), Some(Identity::new("u1")));
        assert!(rx.try_recv().is_err());

        session.sign_out();
        assert_eq!(rx.try_recv().unwrap(), None);
        assert!(!session.is_loading());
        assert!(session.current().is_none());
    }

    #[test]
    fn late_listener_gets_current_identity() {
        let mut session = SessionProvider::new();
        session.sign_in(Identity::new("u9"));
        let rx = session.listen();
        assert_eq!(rx.try_recv().unwrap(), Some(Identity::new("u9")));
    }

    #[test]
    fn dropped_listeners_are_pruned() {
        let mut session = SessionProvider::new();
        drop(session.listen());
        let rx = session.listen();
        session.sign_out();
        assert_eq!(session.listeners.len(), 1);
        assert_eq!(rx.try_recv().unwrap(), None);
    }
}
