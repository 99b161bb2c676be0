use log::debug;

use crate::{
    editing::{
        Cursor, CursorCoord, Document, EditError, ListJoin,
        surgery::{prepend_text, strip_leading},
    },
    parsing::blocks::kinds::{BulletMarker, CheckboxMarker, Heading, OrderedMarker},
    storage::TextSpan,
    tree::{Node, NodeId},
};

use super::{RemoveText, insert_run};

/// Which part of a bullet list a checkbox promotion carved out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListCut {
    /// The item was the whole list.
    Whole,
    /// The item was first; the rest of the list follows the checkbox block.
    Head,
    /// Items remain before the checkbox block, and after it if `tail`.
    Inner { tail: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    /// Nothing changed: read-only block.
    Nothing,
    Inserted,
    /// A closing bracket stepped over the one already there.
    Skipped,
    /// A paragraph became block `at`, a header or list.
    PromotedBlock {
        prefix: String,
        at: usize,
        join: ListJoin,
    },
    /// A bullet item became a checkbox item in block `at`.
    PromotedCheckbox {
        prefix: String,
        cut: ListCut,
        at: usize,
        join: ListJoin,
    },
}

/// Types text at the cursor.
///
/// Single-character input gets editor conveniences: opening brackets are
/// paired, a closing bracket steps over a matching one, and a space after a
/// block marker (`#`, `-`, `1.`, `[ ]`) turns the block into that kind.
#[derive(Debug, Clone)]
pub struct InsertText {
    text: String,
    /// Caret advance after inserting `text`, in UTF-16 units.
    advance: usize,
    closing: bool,
    coord: CursorCoord,
    finished: CursorCoord,
    /// Where `text` landed in the added buffer.
    offset: usize,
    length: usize,
    outcome: Outcome,
}

impl InsertText {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_auto_pair(text, true)
    }

    pub fn with_auto_pair(text: impl Into<String>, auto_pair: bool) -> Self {
        let text = text.into();
        let (text, advance) = match text.as_str() {
            "(" if auto_pair => ("()".to_string(), 1),
            "[" if auto_pair => ("[]".to_string(), 1),
            "{" if auto_pair => ("{}".to_string(), 1),
            _ => {
                let advance = text.encode_utf16().count();
                (text, advance)
            }
        };
        let closing = auto_pair && matches!(text.as_str(), ")" | "]" | "}");
        Self {
            text,
            advance,
            closing,
            coord: CursorCoord::default(),
            finished: CursorCoord::default(),
            offset: 0,
            length: 0,
            outcome: Outcome::Nothing,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn coord(&self) -> CursorCoord {
        self.coord
    }

    pub fn finished(&self) -> CursorCoord {
        self.finished
    }

    /// Units inserted right of the caret by bracket pairing.
    fn trailing(&self) -> usize {
        self.text.encode_utf16().count() - self.advance
    }

    pub fn execute(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        let c = cursor.coord();
        doc.validate(c)?;
        self.coord = c;

        self.outcome = if self.closing && doc.unit_at(c) == self.text.encode_utf16().next() {
            cursor.set_coord(CursorCoord {
                offset: c.offset + 1,
                ..c
            });
            Outcome::Skipped
        } else if let Some(promoted) = self.promote(doc, cursor)? {
            promoted
        } else if doc.tree().node(doc.block(c.block_no)?).is_read_only() {
            Outcome::Nothing
        } else {
            let run = doc.append_text(&self.text);
            insert_run(doc, c, run)?;
            self.offset = run.offset;
            self.length = run.length;
            cursor.set_coord(CursorCoord {
                offset: c.offset + self.advance,
                ..c
            });
            Outcome::Inserted
        };
        self.finished = cursor.coord();
        Ok(())
    }

    fn promote(&self, doc: &mut Document, cursor: &mut Cursor) -> Result<Option<Outcome>, EditError> {
        let c = self.coord;
        if self.text != " " || c.offset == 0 {
            return Ok(None);
        }
        let block = doc.block(c.block_no)?;
        let units = doc.line_units(c)?;
        let prefix = String::from_utf16_lossy(&units[..c.offset.min(units.len())]);

        let kind = doc.tree().node(block).clone();
        match kind {
            Node::Paragraph if c.line_no == 0 && doc.block_layout(c.block_no)?.line_count() == 1 => {
                let heading = u8::try_from(prefix.len()).ok().filter(|&level| {
                    usize::from(level) <= Heading::MAX_LEVEL
                        && prefix.bytes().all(|b| b == Heading::MARK)
                });
                let target = if let Some(level) = heading {
                    Node::Header { level }
                } else if prefix == BulletMarker::PREFIX.trim_end() {
                    Node::UnorderedList
                } else if prefix == OrderedMarker::FIRST {
                    Node::OrderedList
                } else {
                    return Ok(None);
                };
                if !strip_leading(doc.tree_mut(), block, c.offset)? {
                    return Ok(None);
                }

                let tree = doc.tree_mut();
                let children = tree.take_children(block);
                let promoted = match target {
                    Node::UnorderedList => {
                        let item = tree.alloc_with(Node::UnorderedItem, children);
                        tree.alloc_with(Node::UnorderedList, [item])
                    }
                    Node::OrderedList => {
                        let item = tree.alloc_with(Node::OrderedItem, children);
                        tree.alloc_with(Node::OrderedList, [item])
                    }
                    header => tree.alloc_with(header, children),
                };
                doc.replace_block(c.block_no, promoted)?;
                let join = doc.join_lists(c.block_no)?;
                cursor.set_coord(join.coord(c.block_no, CursorCoord::new(c.block_no, 0, 0)));
                debug!("promoted paragraph {} with {prefix:?}", c.block_no);
                Ok(Some(Outcome::PromotedBlock {
                    prefix,
                    at: c.block_no,
                    join,
                }))
            }
            Node::UnorderedList => {
                let checked = if prefix == CheckboxMarker::UNCHECKED {
                    false
                } else if prefix == CheckboxMarker::CHECKED {
                    true
                } else {
                    return Ok(None);
                };
                let items = doc.tree().children(block).to_vec();
                let Some(&item) = items.get(c.line_no) else {
                    return Ok(None);
                };
                if !strip_leading(doc.tree_mut(), item, c.offset)? {
                    return Ok(None);
                }
                let cut = self.split_out_checkbox(doc, &items, checked)?;
                let at = match cut {
                    ListCut::Whole | ListCut::Head => c.block_no,
                    ListCut::Inner { .. } => c.block_no + 1,
                };
                let join = doc.join_lists(at)?;
                cursor.set_coord(join.coord(at, CursorCoord::new(at, 0, 0)));
                debug!("promoted list item {} to checkbox", c.line_no);
                Ok(Some(Outcome::PromotedCheckbox {
                    prefix,
                    cut,
                    at,
                    join,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Moves bullet item `items[line_no]` into a new checkbox list block.
    fn split_out_checkbox(
        &self,
        doc: &mut Document,
        items: &[NodeId],
        checked: bool,
    ) -> Result<ListCut, EditError> {
        let c = self.coord;
        let index = c.line_no;
        let item = items[index];

        let tree = doc.tree_mut();
        let children = tree.take_children(item);
        let checkbox_item = tree.alloc_with(Node::CheckboxItem { checked }, children);
        let checkbox = tree.alloc_with(Node::CheckboxList, [checkbox_item]);

        if items.len() == 1 {
            doc.replace_block(c.block_no, checkbox)?;
            return Ok(ListCut::Whole);
        }
        if index == 0 {
            doc.edit_block(c.block_no, |tree, _, _| tree.free(item))?;
            doc.insert_block(c.block_no, checkbox)?;
            return Ok(ListCut::Head);
        }

        let tail: Vec<NodeId> = items[index + 1..].to_vec();
        doc.edit_block(c.block_no, |tree, _, _| {
            tree.free(item);
            for &rest in &tail {
                tree.detach(rest);
            }
        })?;
        doc.insert_block(c.block_no + 1, checkbox)?;
        if !tail.is_empty() {
            let after = doc.tree_mut().alloc_with(Node::UnorderedList, tail);
            doc.insert_block(c.block_no + 2, after)?;
        }
        Ok(ListCut::Inner {
            tail: index + 1 < items.len(),
        })
    }

    pub fn undo(&mut self, doc: &mut Document, cursor: &mut Cursor) -> Result<(), EditError> {
        match self.outcome.clone() {
            Outcome::Nothing | Outcome::Skipped => {}
            Outcome::Inserted => {
                cursor.set_coord(CursorCoord {
                    offset: self.finished.offset + self.trailing(),
                    ..self.finished
                });
                let mut remove = RemoveText::new();
                while cursor.coord().offset > self.coord.offset {
                    let before = cursor.coord();
                    remove.execute_past_images(doc, cursor)?;
                    if cursor.coord() == before {
                        break;
                    }
                }
            }
            Outcome::PromotedBlock { prefix, at, join } => {
                doc.split_lists(at, join)?;
                let block = doc.block(at)?;
                let run = doc.append_text(&prefix);
                let tree = doc.tree_mut();
                let owner = match tree.node(block) {
                    Node::Header { .. } => block,
                    _ => tree.children(block).first().copied().unwrap_or(block),
                };
                let children = tree.take_children(owner);
                let paragraph = tree.alloc_with(Node::Paragraph, children);
                prepend_text(tree, paragraph, TextSpan::from_run(run))?;
                doc.replace_block(at, paragraph)?;
            }
            Outcome::PromotedCheckbox {
                prefix,
                cut,
                at,
                join,
            } => {
                doc.split_lists(at, join)?;
                Self::restore_bullet(doc, at, &prefix, cut)?;
            }
        }
        cursor.set_coord(self.coord);
        Ok(())
    }

    fn restore_bullet(
        doc: &mut Document,
        at: usize,
        prefix: &str,
        cut: ListCut,
    ) -> Result<(), EditError> {
        let checkbox = doc.block(at)?;
        let run = doc.append_text(prefix);

        let tree = doc.tree_mut();
        let checkbox_item = tree.children(checkbox).first().copied().unwrap_or(checkbox);
        let children = tree.take_children(checkbox_item);
        let item = tree.alloc_with(Node::UnorderedItem, children);
        prepend_text(tree, item, TextSpan::from_run(run))?;

        match cut {
            ListCut::Whole => {
                let list = doc.tree_mut().alloc_with(Node::UnorderedList, [item]);
                doc.replace_block(at, list)?;
            }
            ListCut::Head => {
                doc.edit_block(at + 1, |tree, _, list| tree.insert_child(list, 0, item))?;
                doc.remove_block(at)?;
            }
            ListCut::Inner { tail } => {
                let after = if tail { Some(doc.block(at + 1)?) } else { None };
                doc.edit_block(at - 1, |tree, _, list| {
                    tree.append_child(list, item);
                    if let Some(after) = after {
                        for rest in tree.take_children(after) {
                            tree.append_child(list, rest);
                        }
                    }
                })?;
                if tail {
                    doc.remove_block(at + 1)?;
                }
                doc.remove_block(at)?;
            }
        }
        Ok(())
    }

    /// Folds `next` into this command when it continues the same typing
    /// burst: plain insertions, adjacent in the document and in the added
    /// buffer.
    pub fn merge(&mut self, next: &InsertText) -> bool {
        let plain = |c: &InsertText| c.outcome == Outcome::Inserted && c.trailing() == 0;
        if !plain(self)
            || !plain(next)
            || self.finished != next.coord
            || self.offset + self.length != next.offset
        {
            return false;
        }
        self.text.push_str(&next.text);
        self.advance += next.advance;
        self.length += next.length;
        self.finished = next.finished;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::snapshot::{invariants, outline};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn type_at(doc: &mut Document, coord: CursorCoord, text: &str) -> (InsertText, Cursor) {
        let mut cursor = Cursor::new(coord);
        let mut command = InsertText::new(text);
        command.execute(doc, &mut cursor).unwrap();
        invariants(doc.tree(), doc.buffers());
        (command, cursor)
    }

    #[test]
    fn test_insert_into_text_moves_cursor() {
        let mut doc = Document::from_text("ac");

        let (_, cursor) = type_at(&mut doc, CursorCoord::new(0, 0, 1), "b");

        assert_eq!(doc.to_markdown(), "abc\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
    }

    #[test]
    fn test_insert_into_empty_paragraph_creates_text() {
        let mut doc = Document::from_text("");

        type_at(&mut doc, CursorCoord::default(), "x");

        assert_eq!(outline(doc.tree(), doc.buffers()), "Paragraph\n  Text \"x\"\n");
    }

    #[test]
    fn test_insert_into_empty_code_line_reuses_line_text() {
        let mut doc = Document::from_text("```\na\n\n```");

        type_at(&mut doc, CursorCoord::new(0, 1, 0), "b");

        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "CodeBlock \"\"\n  Text \"a\"\n  Text \"b\"\n"
        );
    }

    #[test]
    fn test_typing_after_trailing_image_lands_after_it() {
        // Given "a![x](y)" with the caret at the line end, drawn after the image
        let mut doc = Document::from_text("a![x](y)");

        // When typing there and undoing it
        let (mut command, mut cursor) = type_at(&mut doc, CursorCoord::new(0, 0, 1), "b");
        assert_eq!(doc.to_markdown(), "a![x](y)b\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 2));
        command.undo(&mut doc, &mut cursor).unwrap();

        // Then the image is untouched
        assert_eq!(doc.to_markdown(), "a![x](y)\n");
    }

    #[test]
    fn test_open_bracket_is_paired() {
        let mut doc = Document::from_text("");

        let (_, mut cursor) = type_at(&mut doc, CursorCoord::default(), "(");
        assert_eq!(doc.to_markdown(), "()\n");
        assert_eq!(cursor.coord().offset, 1);

        let mut close = InsertText::new(")");
        close.execute(&mut doc, &mut cursor).unwrap();

        assert_eq!(doc.to_markdown(), "()\n");
        assert_eq!(cursor.coord().offset, 2);
    }

    #[test]
    fn test_pairing_can_be_disabled() {
        let mut doc = Document::from_text("");
        let mut cursor = Cursor::default();

        InsertText::with_auto_pair("[", false)
            .execute(&mut doc, &mut cursor)
            .unwrap();

        assert_eq!(doc.to_markdown(), "[\n");
    }

    #[rstest]
    #[case("#", "Header(1)\n")]
    #[case("###", "Header(3)\n")]
    #[case("######", "Header(6)\n")]
    #[case("-", "UnorderedList\n  UnorderedItem\n")]
    #[case("1.", "OrderedList\n  OrderedItem\n")]
    fn test_space_after_marker_promotes_paragraph(#[case] marker: &str, #[case] expected: &str) {
        // Given a paragraph holding only the marker
        let mut doc = Document::from_text(marker);
        let end = CursorCoord::new(0, 0, marker.len());

        // When a space is typed after it
        let (_, cursor) = type_at(&mut doc, end, " ");

        // Then the block changes kind and the marker is gone
        assert_eq!(outline(doc.tree(), doc.buffers()), expected);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 0));
    }

    #[test]
    fn test_promotion_below_a_list_extends_it() {
        // Given a paragraph "-" right under a bullet list
        let mut doc = Document::from_text("- a\n-");
        assert_eq!(doc.block_count(), 2);

        // When a space turns it into a list
        let (mut command, mut cursor) = type_at(&mut doc, CursorCoord::new(1, 0, 1), " ");

        // Then the new item joins the list above
        assert_eq!(doc.block_count(), 1);
        assert_eq!(cursor.coord(), CursorCoord::new(0, 1, 0));
        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "UnorderedList\n  UnorderedItem\n    Text \"a\"\n  UnorderedItem\n"
        );

        command.undo(&mut doc, &mut cursor).unwrap();
        invariants(doc.tree(), doc.buffers());
        assert_eq!(doc.to_markdown(), "- a\n-\n");
        assert_eq!(cursor.coord(), CursorCoord::new(1, 0, 1));
    }

    #[test]
    fn test_checkbox_promotion_joins_checkbox_list_above() {
        let mut doc = Document::from_text("- [x] a\n- [ ]");

        let (mut command, mut cursor) = type_at(&mut doc, CursorCoord::new(1, 0, 3), " ");
        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "CheckboxList\n  CheckboxItem(true)\n    Text \"a\"\n  CheckboxItem(false)\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 1, 0));

        command.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(doc.to_markdown(), "- [x] a\n- [ ]\n");
    }

    #[test]
    fn test_promotion_keeps_text_after_cursor() {
        let mut doc = Document::from_text("#title");

        type_at(&mut doc, CursorCoord::new(0, 0, 1), " ");

        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "Header(1)\n  Text \"title\"\n"
        );
    }

    #[rstest]
    #[case("####### ")]
    #[case("#######")]
    #[case("x")]
    fn test_space_after_other_text_is_plain(#[case] text: &str) {
        let mut doc = Document::from_text(text);
        let end = CursorCoord::new(0, 0, text.encode_utf16().count());

        type_at(&mut doc, end, " ");

        assert_eq!(doc.tree().node(doc.block(0).unwrap()), &Node::Paragraph);
    }

    #[test]
    fn test_hash_run_longer_than_a_level_is_plain() {
        // Given more hashes than a u8 level can count
        let hashes = "#".repeat(300);
        let mut doc = Document::from_text(&hashes);

        type_at(&mut doc, CursorCoord::new(0, 0, 300), " ");

        assert_eq!(doc.tree().node(doc.block(0).unwrap()), &Node::Paragraph);
    }

    #[test]
    fn test_checkbox_marker_promotes_sole_item() {
        let mut doc = Document::from_text("- [ ]");

        let (_, cursor) = type_at(&mut doc, CursorCoord::new(0, 0, 3), " ");

        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "CheckboxList\n  CheckboxItem(false)\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 0));
    }

    #[test]
    fn test_checkbox_marker_splits_list_around_item() {
        let mut doc = Document::from_text("- a\n- [x]b\n- c");

        let (_, cursor) = type_at(&mut doc, CursorCoord::new(0, 1, 3), " ");

        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "UnorderedList\n  UnorderedItem\n    Text \"a\"\n\
             CheckboxList\n  CheckboxItem(true)\n    Text \"b\"\n\
             UnorderedList\n  UnorderedItem\n    Text \"c\"\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(1, 0, 0));
    }

    #[test]
    fn test_checkbox_marker_on_first_item_goes_before_list() {
        let mut doc = Document::from_text("- [ ]a\n- b");

        let (_, cursor) = type_at(&mut doc, CursorCoord::new(0, 0, 3), " ");

        assert_eq!(
            outline(doc.tree(), doc.buffers()),
            "CheckboxList\n  CheckboxItem(false)\n    Text \"a\"\n\
             UnorderedList\n  UnorderedItem\n    Text \"b\"\n"
        );
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 0));
    }

    #[rstest]
    #[case("- a\n- [x]b\n- c", CursorCoord::new(0, 1, 3))]
    #[case("- [ ]a\n- b", CursorCoord::new(0, 0, 3))]
    #[case("- [ ]", CursorCoord::new(0, 0, 3))]
    #[case("##", CursorCoord::new(0, 0, 2))]
    fn test_undo_reverts_promotion(#[case] text: &str, #[case] at: CursorCoord) {
        let mut doc = Document::from_text(text);
        let before = outline(doc.tree(), doc.buffers());

        let (mut command, mut cursor) = type_at(&mut doc, at, " ");
        command.undo(&mut doc, &mut cursor).unwrap();

        assert_eq!(outline(doc.tree(), doc.buffers()), before);
        assert_eq!(cursor.coord(), at);
        invariants(doc.tree(), doc.buffers());
    }

    #[test]
    fn test_undo_removes_paired_brackets() {
        let mut doc = Document::from_text("ab");

        let (mut command, mut cursor) = type_at(&mut doc, CursorCoord::new(0, 0, 1), "{");
        assert_eq!(doc.to_markdown(), "a{}b\n");
        command.undo(&mut doc, &mut cursor).unwrap();

        assert_eq!(doc.to_markdown(), "ab\n");
        assert_eq!(cursor.coord(), CursorCoord::new(0, 0, 1));
    }

    #[test]
    fn test_consecutive_typing_merges() {
        let mut doc = Document::from_text("");
        let (mut first, mut cursor) = type_at(&mut doc, CursorCoord::default(), "a");
        let mut second = InsertText::new("b");
        second.execute(&mut doc, &mut cursor).unwrap();

        assert!(first.merge(&second));
        assert_eq!(first.text(), "ab");
        assert_eq!(first.finished(), CursorCoord::new(0, 0, 2));

        first.undo(&mut doc, &mut cursor).unwrap();
        assert_eq!(outline(doc.tree(), doc.buffers()), "Paragraph\n");
    }

    #[test]
    fn test_typing_elsewhere_does_not_merge() {
        let mut doc = Document::from_text("xy");
        let (mut first, _) = type_at(&mut doc, CursorCoord::new(0, 0, 0), "a");
        let (second, _) = type_at(&mut doc, CursorCoord::new(0, 0, 3), "b");

        assert!(!first.merge(&second));
    }
}
