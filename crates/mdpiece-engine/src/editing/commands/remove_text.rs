use log::debug;

use crate::{
    editing::{
        Cursor, CursorCoord, Document, EditError,
        surgery::{Pruned, append_inline, flatten_block, join_texts_at, prune_emptied},
    },
    storage::{TextSpan, is_high_surrogate, is_low_surrogate},
    tree::{Node, NodeId},
};

use super::{InsertLineBreak, insert_run};

/// What undo has to put back.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Restore {
    /// The document was not touched.
    Nothing,
    /// Structural change with no exact inverse.
    Irreversible,
    /// Characters removed left of the caret.
    Text(String),
    /// The removal emptied a text, freeing it and its wrappers. They are
    /// rebuilt around `text` as child `index` of the line owner.
    Inline {
        index: usize,
        wrappers: Vec<Node>,
        text: String,
    },
    /// An image that was child `index` of the line owner.
    Image { index: usize, node: Node },
    /// Two lines were joined; a line break splits them again.
    LineBreak,
    /// A header of this level became a paragraph.
    Header(u8),
}

/// Backspace: removes the character left of the cursor, or at the start of
/// a line joins or degrades the structure around it.
#[derive(Debug, Clone)]
pub struct RemoveText {
    coord: CursorCoord,
    finished: CursorCoord,
    restore: Restore,
}

impl Default for RemoveText {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveText {
    pub fn new() -> Self {
        Self {
            coord: CursorCoord::default(),
            finished: CursorCoord::default(),
            restore: Restore::Nothing,
        }
    }

    pub fn coord(&self) -> CursorCoord {
        self.coord
    }

    pub fn finished(&self) -> CursorCoord {
        self.finished
    }

    pub fn is_reversible(&self) -> bool {
        self.restore != Restore::Irreversible
    }

    pub fn execute(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        self.run(doc, cursor, true)
    }

    /// Like [`RemoveText::execute`], but an image closing the line stays.
    /// Undo paths use it to take back exactly the text or break they added.
    pub(crate) fn execute_past_images(
        &mut self,
        doc: &mut Document,
        cursor: &mut Cursor,
    ) -> Result<(), EditError> {
        self.run(doc, cursor, false)
    }

    fn run(
        &mut self,
        doc: &mut Document,
        cursor: &mut Cursor,
        images: bool,
    ) -> Result<(), EditError> {
        let c = cursor.coord();
        doc.validate(c)?;
        self.coord = c;
        self.restore = Restore::Irreversible;

        let block = doc.block(c.block_no)?;
        let kind = doc.tree().node(block).clone();
        if kind.is_read_only() {
            self.restore = Restore::Nothing;
        } else if let Some(image) = doc.line(c)?.trailing_image(c.offset).filter(|_| images) {
            self.remove_image(doc, image)?;
        } else if c.offset > 0 {
            self.remove_char(doc, cursor)?;
        } else {
            match &kind {
                &Node::Header { level } => {
                    let tree = doc.tree_mut();
                    let children = tree.take_children(block);
                    let paragraph = tree.alloc_with(Node::Paragraph, children);
                    doc.replace_block(c.block_no, paragraph)?;
                    self.restore = Restore::Header(level);
                }
                Node::CodeBlock { .. } | Node::QuoteBlock => {
                    self.remove_at_code_line(doc, cursor, &kind)?
                }
                k if k.is_list() => self.remove_at_item(doc, cursor)?,
                _ => self.remove_at_paragraph_line(doc, cursor)?,
            }
        }
        self.finished = cursor.coord();
        Ok(())
    }

    fn remove_char(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        let c = self.coord;
        let units = doc.line_units(c)?;
        let pair = c.offset >= 2
            && units.get(c.offset - 1).is_some_and(|&u| is_low_surrogate(u))
            && units.get(c.offset - 2).is_some_and(|&u| is_high_surrogate(u));
        let n = if pair { 2 } else { 1 };

        let Some((node, local)) = doc.line(c)?.text_at(c.offset).filter(|&(_, local)| local >= n)
        else {
            self.restore = Restore::Nothing;
            return Ok(());
        };
        let removed = String::from_utf16_lossy(&units[c.offset - n..c.offset]);
        let owner = doc.line(c)?.anchor.owner;

        let pruned = doc.edit_block(c.block_no, |tree, _, _| -> Result<_, EditError> {
            let span = tree.text_mut(node).ok_or(EditError::NotText(node))?;
            span.remove(local - n, n)?;
            Ok(prune_emptied(tree, node))
        })??;
        cursor.set_coord(CursorCoord {
            offset: c.offset - n,
            ..c
        });
        self.restore = match pruned {
            None => Restore::Text(removed),
            Some(Pruned {
                parent,
                index,
                wrappers,
            }) if parent == owner => Restore::Inline {
                index,
                wrappers,
                text: removed,
            },
            Some(_) => Restore::Irreversible,
        };
        Ok(())
    }

    /// Images cover no text, so the caret keeps its offset.
    fn remove_image(&mut self, doc: &mut Document, image: NodeId) -> Result<(), EditError> {
        let c = self.coord;
        let owner = doc.line(c)?.anchor.owner;
        let tree = doc.tree();
        let node = tree.node(image).clone();
        let index = tree
            .index_in_parent(image)
            .filter(|_| tree.parent(image) == Some(owner));
        doc.edit_block(c.block_no, |tree, _, _| tree.free(image))?;
        self.restore = match index {
            Some(index) => Restore::Image { index, node },
            None => Restore::Irreversible,
        };
        Ok(())
    }

    /// Offset 0 in a paragraph or latex block.
    fn remove_at_paragraph_line(
        &mut self,
        doc: &mut Document,
        cursor: &mut Cursor,
    ) -> Result<(), EditError> {
        let c = self.coord;
        if c.line_no > 0 {
            let above = CursorCoord::new(c.block_no, c.line_no - 1, 0);
            let len = doc.line(above)?.len();
            let lf = doc.line(c)?.anchor.start.saturating_sub(1);
            doc.edit_block(c.block_no, |tree, _, block| {
                if let Some(&node) = tree.children(block).get(lf) {
                    if matches!(tree.node(node), Node::Lf) {
                        tree.free(node);
                        join_texts_at(tree, block, lf);
                    }
                }
            })?;
            cursor.set_coord(CursorCoord { offset: len, ..above });
            return Ok(());
        }

        let block = doc.block(c.block_no)?;
        if doc.tree().children(block).is_empty() {
            if doc.block_count() == 1 {
                self.restore = Restore::Nothing;
                return Ok(());
            }
            let mut left = cursor.clone();
            left.move_left(doc);
            doc.remove_block(c.block_no)?;
            debug!("removed empty block {}", c.block_no);
            doc.join_lists(c.block_no)?;
            cursor.set_coord(if c.block_no == 0 {
                CursorCoord::default()
            } else {
                left.coord()
            });
            return Ok(());
        }
        if c.block_no == 0 {
            self.restore = Restore::Nothing;
            return Ok(());
        }

        let above = c.block_no - 1;
        if doc.tree().node(doc.block(above)?).is_read_only() {
            let remap = doc.remove_block(above)?;
            cursor.set_coord(remap.coord(c));
            return Ok(());
        }
        let end = doc.block_end(above)?;
        doc.merge_block(above)?;
        doc.join_lists(c.block_no)?;
        cursor.set_coord(end);
        Ok(())
    }

    /// Offset 0 in a list item: the first item leaves the list as a
    /// paragraph, later items join the item above.
    fn remove_at_item(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        let c = self.coord;
        let block = doc.block(c.block_no)?;
        let items = doc.tree().children(block).to_vec();
        let Some(&item) = items.get(c.line_no) else {
            return Err(EditError::LineOutOfRange {
                block: c.block_no,
                line: c.line_no,
            });
        };

        if c.line_no == 0 {
            let tree = doc.tree_mut();
            let children = tree.take_children(item);
            let paragraph = tree.alloc_with(Node::Paragraph, children);
            if items.len() == 1 {
                doc.replace_block(c.block_no, paragraph)?;
            } else {
                doc.edit_block(c.block_no, |tree, _, _| tree.free(item))?;
                doc.insert_block(c.block_no, paragraph)?;
            }
            cursor.set_coord(CursorCoord::new(c.block_no, 0, 0));
            return Ok(());
        }

        let above = items[c.line_no - 1];
        let len = doc
            .line(CursorCoord::new(c.block_no, c.line_no - 1, 0))?
            .len();
        doc.edit_block(c.block_no, |tree, _, _| {
            let moved = tree.take_children(item);
            tree.free(item);
            append_inline(tree, above, moved);
        })?;
        cursor.set_coord(CursorCoord::new(c.block_no, c.line_no - 1, len));
        self.restore = Restore::LineBreak;
        Ok(())
    }

    /// Offset 0 in a code or quote line.
    fn remove_at_code_line(
        &mut self,
        doc: &mut Document,
        cursor: &mut Cursor,
        kind: &Node,
    ) -> Result<(), EditError> {
        let c = self.coord;
        if c.line_no > 0 {
            let above = CursorCoord::new(c.block_no, c.line_no - 1, 0);
            let len = doc.line(above)?.len();
            let line = doc.line(c)?.anchor.start;
            doc.edit_block(c.block_no, |tree, _, block| join_texts_at(tree, block, line))?;
            cursor.set_coord(CursorCoord { offset: len, ..above });
            self.restore = Restore::LineBreak;
            return Ok(());
        }

        let block = doc.block(c.block_no)?;
        let blank = doc.block_layout(c.block_no)?.line_count() == 1 && doc.line(c)?.is_empty();
        if matches!(kind, Node::QuoteBlock) || blank {
            let tree = doc.tree_mut();
            let content = flatten_block(tree, block);
            let paragraph = tree.alloc_with(Node::Paragraph, content);
            doc.replace_block(c.block_no, paragraph)?;
        } else {
            self.restore = Restore::Nothing;
        }
        Ok(())
    }

    pub fn undo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        match self.restore.clone() {
            Restore::Nothing | Restore::Irreversible => {}
            Restore::Text(text) => {
                let run = doc.append_text(&text);
                insert_run(doc, self.finished, run)?;
            }
            Restore::Inline {
                index,
                wrappers,
                text,
            } => {
                let owner = doc.line(self.finished)?.anchor.owner;
                let run = doc.append_text(&text);
                doc.edit_block(self.finished.block_no, |tree, _, _| {
                    let mut inline = tree.alloc_text(TextSpan::from_run(run));
                    for wrapper in wrappers.into_iter().rev() {
                        inline = tree.alloc_with(wrapper, [inline]);
                    }
                    tree.insert_child(owner, index, inline);
                })?;
            }
            Restore::Image { index, node } => {
                let owner = doc.line(self.finished)?.anchor.owner;
                doc.edit_block(self.finished.block_no, |tree, _, _| {
                    let image = tree.alloc(node);
                    tree.insert_child(owner, index, image);
                })?;
            }
            Restore::LineBreak => {
                cursor.set_coord(self.finished);
                InsertLineBreak::new().execute(doc, cursor)?;
            }
            Restore::Header(level) => {
                let at = self.coord.block_no;
                let paragraph = doc.block(at)?;
                let tree = doc.tree_mut();
                let children = tree.take_children(paragraph);
                let header = tree.alloc_with(Node::Header { level }, children);
                doc.replace_block(at, header)?;
            }
        }
        cursor.set_coord(self.coord);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::snapshot::{invariants, outline};
    use pretty_assertions::assert_eq;

    fn backspace(doc: &mut Document, coord: CursorCoord) -> (RemoveText, Cursor) {
        let mut cursor = Cursor::new(coord);
        let mut command = RemoveText::new();
        command.execute(doc, &mut cursor).unwrap();
        invariants(doc.tree(), doc.buffers());
        (command, cursor)
    }

    fn outline_of(doc: &Document) -> String {
        outline(doc.tree(), doc.buffers())
    }

    #[test]
    fn test_emoji_removal_takes_both_units() {
        // Given "a😊b" with the caret at the end
        let mut doc = Document::from_text("a😊b");
        let mut cursor = Cursor::new(CursorCoord::new(0, 0, 4));
        let mut offsets = Vec::new();

        // When backspacing three times
        for _ in 0..3 {
            RemoveText::new().execute(&mut doc, &mut cursor).unwrap();
            offsets.push(cursor.coord().offset);
        }

        // Then the emoji goes in one step
        assert_eq!(offsets, vec![3, 1, 0]);
        assert_eq!(outline_of(&doc), "Paragraph\n");
    }

    #[test]
    fn test_emptied_wrapper_is_removed() {
        let mut doc = Document::from_text("a*b*");

        backspace(&mut doc, CursorCoord::new(0, 0, 2));

        assert_eq!(outline_of(&doc), "Paragraph\n  Text \"a\"\n");
    }

    #[test]
    fn test_undo_rebuilds_emptied_wrapper() {
        // Given "a*b*" with the caret after the italic "b"
        let mut doc = Document::from_text("a*b*");

        // When backspacing the "b" and undoing
        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 2));
        assert!(command.is_reversible());
        command.undo(&mut doc, &mut cursor).unwrap();
        invariants(doc.tree(), doc.buffers());

        // Then the emphasis comes back around it
        assert_eq!(doc.to_markdown(), "a*b*\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_undo_puts_emptied_text_back_before_wrapper() {
        let mut doc = Document::from_text("a**b**");

        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 1));
        assert_eq!(doc.to_markdown(), "**b**\n");
        command.undo(&mut doc, &mut cursor).unwrap();

        assert_eq!(doc.to_markdown(), "a**b**\n");
    }

    #[test]
    fn test_undo_rebuilds_nested_wrappers() {
        // Given a link whose text sits in an italic wrapper
        let mut doc = Document::from_text("[b](u)");
        doc.edit_block(0, |tree, _, para| {
            let link = tree.children(para)[0];
            let text = tree.take_children(link);
            let italic = tree.alloc_with(Node::Emphasis(crate::tree::Emphasis::Italic), text);
            tree.append_child(link, italic);
        })
        .unwrap();

        // When backspacing the only character
        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 1));

        // Then both wrappers go, and undo rebuilds them
        assert_eq!(outline_of(&doc), "Paragraph\n");
        assert!(command.is_reversible());
        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(
            outline_of(&doc),
            "Paragraph\n  Link \"u\"\n    Italic\n      Text \"b\"\n"
        );
    }

    #[test]
    fn test_trailing_image_is_removed_before_text() {
        // Given "a![x](y)" with the caret at the line end
        let mut doc = Document::from_text("a![x](y)");

        // When backspacing once
        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 1));

        // Then the image goes and the caret keeps its offset
        assert_eq!(outline_of(&doc), "Paragraph\n  Text \"a\"\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));

        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(doc.to_markdown(), "a![x](y)\n");
    }

    #[test]
    fn test_lone_image_is_removed_at_line_start() {
        let mut doc = Document::from_text("![x](y)");

        backspace(&mut doc, CursorCoord::new(0, 0, 0));

        assert_eq!(outline_of(&doc), "Paragraph\n");
    }

    #[test]
    fn test_start_of_paragraph_merges_with_previous() {
        // Given two paragraphs "a" and "b"
        let mut doc = Document::from_text("a\n\nb");

        // When backspacing at the start of the second
        let (_, cursor) = backspace(&mut doc, CursorCoord::new(1, 0, 0));

        // Then they merge and the caret sits at the seam
        assert_eq!(outline_of(&doc), "Paragraph\n  Text \"ab\"\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_start_of_second_line_removes_line_feed() {
        let mut doc = Document::from_text("ab\ncd");

        let (_, cursor) = backspace(&mut doc, CursorCoord::new(0, 1, 0));

        assert_eq!(outline_of(&doc), "Paragraph\n  Text \"abcd\"\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_empty_paragraph_is_deleted() {
        let mut doc = Document::from_text("a\n\n\nb");
        assert_eq!(doc.block_count(), 3);

        let (_, cursor) = backspace(&mut doc, CursorCoord::new(1, 0, 0));

        assert_eq!(doc.block_count(), 2);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_removing_paragraph_between_lists_joins_them() {
        // Given two bullet lists kept apart by an empty paragraph
        let mut doc = Document::from_text("- a\n1. x\n- b");
        doc.remove_block(1).unwrap();
        let paragraph = doc.tree_mut().alloc(Node::Paragraph);
        doc.insert_block(1, paragraph).unwrap();

        // When backspacing the paragraph away
        let (_, cursor) = backspace(&mut doc, CursorCoord::new(1, 0, 0));

        // Then one list remains, as its Markdown would read back
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.to_markdown(), "- a\n- b\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_merging_paragraph_into_list_joins_the_next_list() {
        let mut doc = Document::from_text("- a\nb\n- c");
        assert_eq!(doc.block_count(), 3);

        let (_, cursor) = backspace(&mut doc, CursorCoord::new(1, 0, 0));

        assert_eq!(
            outline_of(&doc),
            "UnorderedList\n  UnorderedItem\n    Text \"ab\"\n  UnorderedItem\n    Text \"c\"\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_header_degrades_to_paragraph() {
        let mut doc = Document::from_text("## Title");

        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 0));
        assert_eq!(outline_of(&doc), "Paragraph\n  Text \"Title\"\n");

        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(outline_of(&doc), "Header(2)\n  Text \"Title\"\n");
    }

    #[test]
    fn test_first_list_item_leaves_list() {
        let mut doc = Document::from_text("- a\n- b");

        let (_, cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 0));

        assert_eq!(
            outline_of(&doc),
            "Paragraph\n  Text \"a\"\nUnorderedList\n  UnorderedItem\n    Text \"b\"\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 0));
    }

    #[test]
    fn test_later_list_item_joins_previous() {
        let mut doc = Document::from_text("1. a\n2. b");

        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 1, 0));
        assert_eq!(
            outline_of(&doc),
            "OrderedList\n  OrderedItem\n    Text \"ab\"\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));

        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(
            outline_of(&doc),
            "OrderedList\n  OrderedItem\n    Text \"a\"\n  OrderedItem\n    Text \"b\"\n"
        );
    }

    #[test]
    fn test_code_lines_join() {
        let mut doc = Document::from_text("```\nab\ncd\n```");

        let (_, cursor) = backspace(&mut doc, CursorCoord::new(0, 1, 0));

        assert_eq!(outline_of(&doc), "CodeBlock \"\"\n  Text \"abcd\"\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_emptied_code_line_is_kept() {
        let mut doc = Document::from_text("```\nx\n```");

        backspace(&mut doc, CursorCoord::new(0, 0, 1));

        assert_eq!(outline_of(&doc), "CodeBlock \"\"\n  Text \"\"\n");
    }

    #[test]
    fn test_quote_degrades_to_paragraph() {
        let mut doc = Document::from_text("> a\n> b");

        backspace(&mut doc, CursorCoord::new(0, 0, 0));

        assert_eq!(
            outline_of(&doc),
            "Paragraph\n  Text \"a\"\n  Lf\n  Text \"b\"\n"
        );
    }

    #[test]
    fn test_read_only_block_is_untouched() {
        let mut doc = Document::with_layout(
            "---",
            crate::parsing::Parser::new(crate::parsing::Grammar::read_only()),
            Box::new(crate::layout::MonospaceLayout::default()),
        );

        let (command, _) = backspace(&mut doc, CursorCoord::new(0, 0, 0));

        assert_eq!(outline_of(&doc), "Hr\n");
        assert!(command.is_reversible());
    }

    #[test]
    fn test_undo_restores_removed_character() {
        let mut doc = Document::from_text("abc");

        let (mut command, mut cursor) = backspace(&mut doc, CursorCoord::new(0, 0, 2));
        assert_eq!(doc.to_markdown(), "ac\n");

        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(doc.to_markdown(), "abc\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }
}
