//! ContentEditable editing commands
//!
//! The `execCommand` surface the page sees. Commands act on the document
//! selection and are recorded in the document's own edit history, which is
//! what the page's Ctrl+Z walks back.

use crate::{DomError, DomResult, DomTree, NodeId};

/// Editing command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditCommand {
    InsertText,
    Delete,
    Undo,
    Redo,
}

impl EditCommand {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "inserttext" => Self::InsertText,
            "delete" => Self::Delete,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            _ => return None,
        })
    }

    pub fn requires_value(&self) -> bool {
        matches!(self, Self::InsertText)
    }
}

/// One recorded text edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub node: NodeId,
    pub before: String,
    pub after: String,
}

/// Bounded undo/redo history of editing commands
#[derive(Debug)]
pub struct EditHistory {
    undo_stack: Vec<TextEdit>,
    redo_stack: Vec<TextEdit>,
    max_undo: usize,
}

impl EditHistory {
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
        }
    }

    pub fn push(&mut self, entry: TextEdit) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub(crate) fn pop_undo(&mut self) -> Option<TextEdit> {
        self.undo_stack.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<TextEdit> {
        self.redo_stack.pop()
    }

    pub(crate) fn push_redo(&mut self, entry: TextEdit) {
        self.redo_stack.push(entry);
    }

    pub(crate) fn push_undo_keep_redo(&mut self, entry: TextEdit) {
        self.undo_stack.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Replace bytes `start..end` of a text node with `replacement`
///
/// Offsets must fall on character boundaries of the current content.
pub fn splice_text(
    tree: &mut DomTree,
    node: NodeId,
    start: usize,
    end: usize,
    replacement: &str,
) -> DomResult<TextEdit> {
    let before = tree.text(node).ok_or(DomError::InvalidNodeType)?.to_string();
    for offset in [start, end] {
        if offset > before.len() || !before.is_char_boundary(offset) {
            return Err(DomError::IndexSize { offset });
        }
    }
    if start > end {
        return Err(DomError::IndexSize { offset: start });
    }

    let mut after = String::with_capacity(before.len() - (end - start) + replacement.len());
    after.push_str(&before[..start]);
    after.push_str(replacement);
    after.push_str(&before[end..]);
    tree.set_text(node, after.clone())?;

    Ok(TextEdit { node, before, after })
}
