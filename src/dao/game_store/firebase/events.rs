//! Decoding of the Firebase `text/event-stream` subscription and replay of its changes onto a
//! locally cached JSON tree.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One server-sent event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub name: String,
    pub data: String,
}

/// Incremental frame decoder; chunks may split frames (and UTF-8 sequences) anywhere.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
}

impl EventDecoder {
    /// Feed a chunk and return every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend(chunk.iter().filter(|byte| **byte != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(event) = parse_frame(&String::from_utf8_lossy(&frame[..end])) {
                events.push(event);
            }
        }
        events
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let mut name = None;
    let mut data: Vec<&str> = Vec::new();

    for line in frame.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    Some(StreamEvent {
        name: name?,
        data: data.join("\n"),
    })
}

/// Payload of `put` and `patch` events.
#[derive(Debug, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub data: Value,
}

impl PathChange {
    /// `put` replaces the node at `path`.
    pub fn apply_put(self, tree: &mut Value) {
        let segments = split_path(&self.path);
        set_at(tree, &segments, self.data);
    }

    /// `patch` replaces each listed child of the node at `path`.
    pub fn apply_patch(self, tree: &mut Value) {
        let base = split_path(&self.path);
        let Value::Object(children) = self.data else {
            set_at(tree, &base, self.data);
            return;
        };

        for (child, value) in children {
            let mut segments = base.clone();
            segments.extend(split_path(&child));
            set_at(tree, &segments, value);
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write `data` at `segments`; `null` deletes the node and prunes emptied parents.
fn set_at(node: &mut Value, segments: &[String], data: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = data;
        return;
    };

    if !node.is_object() {
        if data.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(head.clone()).or_insert(Value::Null);
    set_at(child, rest, data);
    let prune = child.is_null() || child.as_object().is_some_and(Map::is_empty);
    if prune {
        map.remove(head);
    }
}
