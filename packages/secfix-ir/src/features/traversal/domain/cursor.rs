//! Tree cursor and message channel
//!
//! The cursor is a stack of frames, one per node on the current root-to-node
//! path. Each frame owns a small typed message map. Visitors use it to hand
//! data to an ancestor (pending fixes on a block, requested imports on the
//! compilation unit) or to cache per-scope results. Popping a frame drops its
//! messages.

use std::any::Any;

use rustc_hash::FxHashMap;

use super::tree_path::TreePath;
use crate::shared::models::{TreeKind, TreeRef};

type MessageMap = FxHashMap<&'static str, Box<dyn Any + Send>>;

#[derive(Debug)]
struct Frame {
    node: TreeRef,
    messages: MessageMap,
}

impl Frame {
    fn new(node: TreeRef) -> Self {
        Self {
            node,
            messages: FxHashMap::default(),
        }
    }
}

/// Traversal position plus per-frame messages
#[derive(Debug)]
pub struct Cursor {
    frames: Vec<Frame>,
}

impl Cursor {
    /// Cursor positioned at `root`
    pub fn new(root: TreeRef) -> Self {
        Self {
            frames: vec![Frame::new(root)],
        }
    }

    /// Cursor with one message-free frame per node of `path`
    pub fn from_path(path: &TreePath) -> Self {
        Self {
            frames: path.nodes().iter().cloned().map(Frame::new).collect(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Position
    // ═══════════════════════════════════════════════════════════════════════

    pub fn push(&mut self, node: TreeRef) {
        self.frames.push(Frame::new(node));
    }

    /// Leave the current node, dropping its messages
    pub fn pop(&mut self) -> Option<TreeRef> {
        self.frames.pop().map(|f| f.node)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Current node
    pub fn value(&self) -> Option<&TreeRef> {
        self.frames.last().map(|f| &f.node)
    }

    pub fn parent(&self) -> Option<&TreeRef> {
        self.frames
            .len()
            .checked_sub(2)
            .map(|i| &self.frames[i].node)
    }

    pub fn node_at(&self, index: usize) -> Option<&TreeRef> {
        self.frames.get(index).map(|f| &f.node)
    }

    /// Replace the node held by the current frame, keeping its messages
    pub fn replace_value(&mut self, node: TreeRef) {
        if let Some(frame) = self.frames.last_mut() {
            frame.node = node;
        }
    }

    /// Snapshot of the root-to-current path
    pub fn path(&self) -> TreePath {
        TreePath::from_nodes(self.frames.iter().map(|f| f.node.clone()).collect())
    }

    /// Index of the nearest frame of `kind`, the current frame included
    pub fn first_enclosing_index(&self, kind: TreeKind) -> Option<usize> {
        self.frames.iter().rposition(|f| f.node.kind() == kind)
    }

    pub fn first_enclosing(&self, kind: TreeKind) -> Option<&TreeRef> {
        self.first_enclosing_index(kind).map(|i| &self.frames[i].node)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Messages on the current frame
    // ═══════════════════════════════════════════════════════════════════════

    pub fn put_message<T: Any + Send>(&mut self, key: &'static str, value: T) {
        let last = self.frames.len().saturating_sub(1);
        self.put_message_at(last, key, value);
    }

    pub fn get_message<T: Any + Send>(&self, key: &'static str) -> Option<&T> {
        self.get_message_at(self.frames.len().checked_sub(1)?, key)
    }

    /// Remove and return a message from the current frame
    pub fn poll_message<T: Any + Send>(&mut self, key: &'static str) -> Option<T> {
        let last = self.frames.len().checked_sub(1)?;
        self.poll_message_at(last, key)
    }

    /// Message on the current frame, inserted from `init` when absent
    pub fn compute_message_if_absent<T, F>(&mut self, key: &'static str, init: F) -> Option<&mut T>
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        let last = self.frames.len().checked_sub(1)?;
        self.compute_message_if_absent_at(last, key, init)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Messages on ancestor frames
    // ═══════════════════════════════════════════════════════════════════════

    pub fn put_message_at<T: Any + Send>(&mut self, index: usize, key: &'static str, value: T) {
        if let Some(frame) = self.frames.get_mut(index) {
            frame.messages.insert(key, Box::new(value));
        }
    }

    pub fn get_message_at<T: Any + Send>(&self, index: usize, key: &'static str) -> Option<&T> {
        self.frames
            .get(index)?
            .messages
            .get(key)?
            .downcast_ref::<T>()
    }

    pub fn poll_message_at<T: Any + Send>(&mut self, index: usize, key: &'static str) -> Option<T> {
        let frame = self.frames.get_mut(index)?;
        match frame.messages.remove(key)?.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(other) => {
                // Wrong type requested: keep the message for its real owner
                frame.messages.insert(key, other);
                None
            }
        }
    }

    /// Message on frame `index`, inserted from `init` when absent.
    ///
    /// Returns `None` when the frame does not exist or holds a message of a
    /// different type under `key`.
    pub fn compute_message_if_absent_at<T, F>(
        &mut self,
        index: usize,
        key: &'static str,
        init: F,
    ) -> Option<&mut T>
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        let frame = self.frames.get_mut(index)?;
        frame
            .messages
            .entry(key)
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
    }

    /// Store a message on the nearest frame of `kind`; `false` when there is none
    pub fn put_message_on_first_enclosing<T: Any + Send>(
        &mut self,
        kind: TreeKind,
        key: &'static str,
        value: T,
    ) -> bool {
        match self.first_enclosing_index(kind) {
            Some(index) => {
                self.put_message_at(index, key, value);
                true
            }
            None => false,
        }
    }

    /// Nearest message under `key`, searching from the current frame outward
    pub fn nearest_message<T: Any + Send>(&self, key: &'static str) -> Option<&T> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.messages.get(key).and_then(|m| m.downcast_ref::<T>()))
    }

    /// Remove and return the nearest message under `key`
    pub fn poll_nearest_message<T: Any + Send>(&mut self, key: &'static str) -> Option<T> {
        let index = self.frames.iter().rposition(|f| {
            f.messages
                .get(key)
                .map(|m| m.is::<T>())
                .unwrap_or(false)
        })?;
        self.poll_message_at(index, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::build;
    use crate::shared::models::JavaType;

    fn cursor_in_block() -> Cursor {
        let stmt = build::expr_stmt(build::ident("x", JavaType::string()));
        let block = build::block(vec![stmt.clone()]);
        let cu = build::compilation_unit(None, &[], vec![]);
        let mut cursor = Cursor::new(TreeRef::CompilationUnit(cu));
        cursor.push(TreeRef::Block(block));
        cursor.push(TreeRef::Statement(stmt));
        cursor
    }

    #[test]
    fn test_messages_dropped_on_pop() {
        let mut cursor = cursor_in_block();
        cursor.put_message("seen", 3usize);
        assert_eq!(cursor.get_message::<usize>("seen"), Some(&3));
        cursor.pop();
        cursor.push(TreeRef::Expression(build::null_lit()));
        assert_eq!(cursor.get_message::<usize>("seen"), None);
    }

    #[test]
    fn test_message_on_first_enclosing_block() {
        let mut cursor = cursor_in_block();
        assert!(cursor.put_message_on_first_enclosing(TreeKind::Block, "fixes", vec![1u8]));
        assert_eq!(cursor.get_message::<Vec<u8>>("fixes"), None);
        assert_eq!(cursor.nearest_message::<Vec<u8>>("fixes"), Some(&vec![1u8]));

        cursor.pop();
        assert_eq!(cursor.poll_message::<Vec<u8>>("fixes"), Some(vec![1u8]));
        assert_eq!(cursor.poll_message::<Vec<u8>>("fixes"), None);
    }

    #[test]
    fn test_compute_if_absent_keeps_existing() {
        let mut cursor = cursor_in_block();
        *cursor.compute_message_if_absent("count", || 0u32).unwrap() += 1;
        *cursor.compute_message_if_absent("count", || 100u32).unwrap() += 1;
        assert_eq!(cursor.get_message::<u32>("count"), Some(&2));
    }

    #[test]
    fn test_wrong_type_poll_keeps_message() {
        let mut cursor = cursor_in_block();
        cursor.put_message("k", 1u32);
        assert_eq!(cursor.poll_message::<String>("k"), None);
        assert_eq!(cursor.poll_message::<u32>("k"), Some(1));
    }

    #[test]
    fn test_path_snapshot_matches_frames() {
        let cursor = cursor_in_block();
        let path = cursor.path();
        assert_eq!(path.len(), cursor.depth());
        assert!(path.value().unwrap().ptr_eq(cursor.value().unwrap()));
        assert_eq!(cursor.parent().map(|p| p.kind()), Some(TreeKind::Block));
    }
}
