/**
 * Document State Store
 *
 * The participant's replica of the shared code document: a Yjs-compatible
 * CRDT (`yrs`) with one text root named `monaco`. Positions are UTF-16 code
 * unit offsets, matching browser editors and the JavaScript Yjs runtime.
 *
 * Snapshots are full-state v1 updates encoded against the empty state
 * vector, so a snapshot can be applied to a fresh document or replayed onto
 * a replica that already holds some or all of its operations.
 *
 * Fragments may arrive in any order. A fragment whose predecessors have not
 * been seen yet is kept and replayed after every later integration until the
 * replica's state vector covers it.
 *
 * Malformed input never panics out of this module. Undecodable snapshots
 * produce an empty document; undecodable fragments are rejected and leave
 * the replica as it was.
 */
use std::panic::{catch_unwind, AssertUnwindSafe};

use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{Doc, GetString, OffsetKind, Options, ReadTxn, StateVector, Text, TextRef, Transact, Update};

use crate::shared::SharedError;

/// Name of the shared text root
pub const TEXT_ROOT: &str = "monaco";

pub struct DocumentState {
    doc: Doc,
    text: TextRef,
    /// Fragments received before their predecessors
    pending: Vec<Vec<u8>>,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentState")
            .field("text", &self.text())
            .finish()
    }
}

fn fresh_doc() -> Doc {
    Doc::with_options(Options {
        offset_kind: OffsetKind::Utf16,
        ..Options::default()
    })
}

fn decode_v1(bytes: &[u8]) -> Result<Update, SharedError> {
    catch_unwind(|| Update::decode_v1(bytes))
        .map_err(|_| SharedError::snapshot("update decoder panicked"))?
        .map_err(|e| SharedError::snapshot(format!("malformed update: {}", e)))
}

/// Integrate a decoded update inside its own transaction
fn integrate(doc: &Doc, update: Update) -> Result<(), SharedError> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut txn = doc.transact_mut();
        txn.apply_update(update);
    }))
    .map_err(|_| SharedError::snapshot("update could not be integrated"))
}

/// Apply `bytes` as a v1 update inside its own transaction
fn apply_v1(doc: &Doc, bytes: &[u8]) -> Result<(), SharedError> {
    integrate(doc, decode_v1(bytes)?)
}

fn decode_state_vector(bytes: &[u8]) -> Result<StateVector, SharedError> {
    catch_unwind(|| StateVector::decode_v1(bytes))
        .map_err(|_| SharedError::snapshot("state vector decoder panicked"))?
        .map_err(|e| SharedError::snapshot(format!("malformed state vector: {}", e)))
}

/// Every clock in `needed` is already in `known`
fn covers(known: &StateVector, needed: &StateVector) -> bool {
    needed
        .iter()
        .all(|(client, clock)| known.get(client) >= *clock)
}

impl DocumentState {
    /// An empty document
    pub fn new() -> Self {
        let doc = fresh_doc();
        let text = doc.get_or_insert_text(TEXT_ROOT);
        Self {
            doc,
            text,
            pending: Vec::new(),
        }
    }

    /// Rebuild a document from a stored snapshot
    ///
    /// Never fails: an empty blob is an empty document, and a blob that cannot
    /// be decoded is logged and also yields an empty document.
    pub fn decode(blob: &[u8]) -> Self {
        match Self::try_decode(blob) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(
                    "[Document] Discarding undecodable snapshot ({} bytes): {}",
                    blob.len(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Strict variant of [`decode`](Self::decode)
    pub fn try_decode(blob: &[u8]) -> Result<Self, SharedError> {
        let state = Self::new();
        if blob.is_empty() {
            return Ok(state);
        }
        apply_v1(&state.doc, blob)?;
        Ok(state)
    }

    /// Merge an update fragment received from the peer
    ///
    /// Idempotent and order-independent. A fragment that fails to decode is
    /// rejected before it touches the replica.
    pub fn apply_remote_update(&mut self, update: &[u8]) -> Result<(), SharedError> {
        if update.is_empty() {
            return Ok(());
        }
        let decoded = decode_v1(update)?;
        let needed = decoded.state_vector();

        if let Err(e) = integrate(&self.doc, decoded) {
            if self.try_text().is_none() {
                self.recover();
            }
            return Err(e);
        }

        // while anything is outstanding, deletions are kept too so they are
        // replayed once the items they target exist
        if (!self.pending.is_empty() || !covers(&self.state(), &needed))
            && !self.pending.iter().any(|held| held.as_slice() == update)
        {
            self.pending.push(update.to_vec());
        }
        self.replay_pending();
        Ok(())
    }

    /// Fragments still waiting for their predecessors
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn state(&self) -> StateVector {
        self.doc.transact().state_vector()
    }

    /// Replay held fragments until a full pass integrates nothing new
    fn replay_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        loop {
            let before = self.state();
            for bytes in &self.pending {
                if let Ok(update) = decode_v1(bytes) {
                    let _ = integrate(&self.doc, update);
                }
            }
            if self.state() == before {
                break;
            }
        }

        let known = self.state();
        let settled = self.pending.iter().all(|bytes| {
            decode_v1(bytes)
                .map(|update| covers(&known, &update.state_vector()))
                .unwrap_or(true)
        });
        if settled {
            tracing::debug!("[Document] {} held fragments integrated", self.pending.len());
            self.pending.clear();
        }
    }

    /// Encoded state vector, sent to the peer to ask for what is missing
    pub fn state_vector(&self) -> Vec<u8> {
        self.state().encode_v1()
    }

    /// Everything this replica has that a peer with `state_vector` lacks
    pub fn diff(&self, state_vector: &[u8]) -> Result<Vec<u8>, SharedError> {
        let remote = decode_state_vector(state_vector)?;
        Ok(self.doc.transact().encode_state_as_update_v1(&remote))
    }

    /// The peer with `state_vector` has operations this replica has not seen
    pub fn is_behind(&self, state_vector: &[u8]) -> Result<bool, SharedError> {
        let remote = decode_state_vector(state_vector)?;
        Ok(!covers(&self.state(), &remote))
    }

    /// Full state as a snapshot
    pub fn encode(&self) -> Vec<u8> {
        self.doc
            .transact()
            .encode_state_as_update_v1(&StateVector::default())
    }

    /// Insert `chunk` at a UTF-16 offset; returns the fragment to broadcast
    ///
    /// Offsets past the end append.
    pub fn insert(&mut self, index: u32, chunk: &str) -> Option<Vec<u8>> {
        if chunk.is_empty() {
            return None;
        }
        let mut txn = self.doc.transact_mut();
        let index = index.min(self.text.len(&txn));
        self.text.insert(&mut txn, index, chunk);
        Some(txn.encode_update_v1())
    }

    /// Delete `len` UTF-16 code units at `index`; returns the fragment to broadcast
    pub fn delete(&mut self, index: u32, len: u32) -> Option<Vec<u8>> {
        let mut txn = self.doc.transact_mut();
        let total = self.text.len(&txn);
        if index >= total || len == 0 {
            return None;
        }
        let len = len.min(total - index);
        self.text.remove_range(&mut txn, index, len);
        Some(txn.encode_update_v1())
    }

    /// Visible text
    pub fn text(&self) -> String {
        self.try_text().unwrap_or_default()
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> u32 {
        self.text.len(&self.doc.transact())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn try_text(&self) -> Option<String> {
        catch_unwind(AssertUnwindSafe(|| self.text.get_string(&self.doc.transact()))).ok()
    }

    /// Replace a replica left unreadable by a failed integration
    fn recover(&mut self) {
        tracing::error!("[Document] Replica unreadable after a failed update, rebuilding");
        let snapshot = catch_unwind(AssertUnwindSafe(|| self.encode())).unwrap_or_default();
        let pending = std::mem::take(&mut self.pending);
        *self = Self::decode(&snapshot);
        self.pending = pending;
    }
}
