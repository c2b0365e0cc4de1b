//! Linear undo and redo over snapshots of the editor state.

use box_renderer::atom::Atom;
use log::{debug, trace};

use crate::editor::{EditMode, Editor};
use crate::selection::Range;

/// A copy of the editor state.
///
/// Snapshots own their trees, so later edits to the live tree never show up in them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub root: Atom,
    pub selection: Range,
    pub mode: EditMode,
}

impl Snapshot {
    pub fn of(editor: &Editor) -> Self {
        Snapshot {
            root: editor.root().clone(),
            selection: editor.selection().clone(),
            mode: editor.mode(),
        }
    }

    /// Puts this state back into `editor`.
    pub fn restore(self, editor: &mut Editor) {
        editor.restore(self.root, self.selection, self.mode);
    }
}

pub const DEFAULT_LIMIT: usize = 1000;

#[derive(Debug)]
pub struct UndoManager {
    stack: Vec<Snapshot>,
    /// Index of the state the editor shows, or `stack.len()` if it has not been recorded.
    cursor: usize,
    limit: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        UndoManager::new(DEFAULT_LIMIT)
    }
}

impl UndoManager {
    pub fn new(limit: usize) -> Self {
        UndoManager {
            stack: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Records `live` as a state to come back to. Discards the redo history.
    pub fn snapshot(&mut self, live: &Snapshot) {
        self.stack.truncate(self.cursor);
        if self.stack.last() == Some(live) {
            trace!("snapshot unchanged");
            return;
        }
        self.stack.push(live.clone());
        if self.stack.len() > self.limit {
            self.stack.remove(0);
        }
        self.cursor = self.stack.len();
        trace!("snapshot {} of {}", self.cursor, self.limit);
    }

    /// Steps back. On the first step the live state is kept so that it can be redone.
    pub fn undo(&mut self, live: &Snapshot) -> Option<Snapshot> {
        if self.cursor == self.stack.len() {
            if self.stack.last() != Some(live) {
                self.stack.push(live.clone());
            }
            self.cursor = self.stack.len() - 1;
        }
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        debug!("undo to {} of {}", self.cursor, self.stack.len());
        self.stack.get(self.cursor).cloned()
    }

    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!("redo to {} of {}", self.cursor, self.stack.len());
        self.stack.get(self.cursor).cloned()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use box_renderer::latex::to_latex;

    use super::*;
    use crate::editor::InsertOptions;

    fn text(snapshot: &Snapshot) -> String {
        to_latex(snapshot.root.children().unwrap_or_default())
    }

    fn type_str(editor: &mut Editor, undo: &mut UndoManager, s: &str) {
        for ch in s.chars() {
            undo.snapshot(&Snapshot::of(editor));
            editor
                .insert(ch.encode_utf8(&mut [0; 4]), InsertOptions::default())
                .unwrap();
        }
    }

    #[test]
    fn undo_then_redo() {
        let mut editor = Editor::default();
        let mut undo = UndoManager::default();
        type_str(&mut editor, &mut undo, "ab");
        assert!(undo.can_undo());
        assert!(!undo.can_redo());

        let first = undo.undo(&Snapshot::of(&editor)).unwrap();
        assert_eq!(text(&first), "a");
        first.restore(&mut editor);
        let second = undo.undo(&Snapshot::of(&editor)).unwrap();
        assert_eq!(text(&second), "");
        second.restore(&mut editor);
        assert!(undo.undo(&Snapshot::of(&editor)).is_none());

        assert_eq!(undo.redo().map(|s| text(&s)).as_deref(), Some("a"));
        assert_eq!(undo.redo().map(|s| text(&s)).as_deref(), Some("ab"));
        assert!(undo.redo().is_none());
    }

    #[test]
    fn snapshot_discards_redo_history() {
        let mut editor = Editor::default();
        let mut undo = UndoManager::default();
        type_str(&mut editor, &mut undo, "ab");
        undo.undo(&Snapshot::of(&editor)).unwrap().restore(&mut editor);
        type_str(&mut editor, &mut undo, "c");
        assert!(!undo.can_redo());
        let back = undo.undo(&Snapshot::of(&editor)).unwrap();
        assert_eq!(text(&back), "a");
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let mut editor = Editor::default();
        let mut undo = UndoManager::default();
        type_str(&mut editor, &mut undo, "x");
        editor.insert("y", InsertOptions::default()).unwrap();
        let back = undo.undo(&Snapshot::of(&editor)).unwrap();
        assert_eq!(text(&back), "");
        assert_eq!(undo.redo().map(|s| text(&s)).as_deref(), Some("xy"));
    }

    #[test]
    fn identical_snapshots_are_merged_and_old_ones_evicted() {
        let editor = Editor::default();
        let mut undo = UndoManager::new(2);
        let live = Snapshot::of(&editor);
        undo.snapshot(&live);
        undo.snapshot(&live);
        assert_eq!(undo.stack.len(), 1);

        let mut editor = Editor::default();
        type_str(&mut editor, &mut undo, "abc");
        assert_eq!(undo.stack.len(), 2);
        assert_eq!(text(&undo.stack[0]), "a");
        undo.reset();
        assert!(!undo.can_undo());
    }
}
