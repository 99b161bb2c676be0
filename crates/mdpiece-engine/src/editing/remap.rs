use super::CursorCoord;

/// How block indices shifted after a structural edit.
///
/// Every block-level mutation on [`super::Document`] returns one so callers
/// can carry cursor coordinates across the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRemap {
    /// Block count and order are unchanged.
    Unchanged,
    /// A block was inserted at this index.
    Inserted(usize),
    /// The block at this index was removed.
    Removed(usize),
}

impl BlockRemap {
    pub fn block(self, block_no: usize) -> usize {
        match self {
            BlockRemap::Inserted(at) if block_no >= at => block_no + 1,
            BlockRemap::Removed(at) if block_no > at => block_no - 1,
            _ => block_no,
        }
    }

    pub fn coord(self, coord: CursorCoord) -> CursorCoord {
        CursorCoord {
            block_no: self.block(coord.block_no),
            ..coord
        }
    }
}

/// Lists joined around one block by [`super::Document::join_lists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListJoin {
    /// Items the list above held before the block joined it.
    pub above: Option<usize>,
    /// Items the block held before the list below joined it.
    pub below: Option<usize>,
}

impl ListJoin {
    pub fn is_empty(self) -> bool {
        self.above.is_none() && self.below.is_none()
    }

    /// Where a coordinate inside the joined block `index` lands.
    pub fn coord(self, index: usize, coord: CursorCoord) -> CursorCoord {
        match self.above {
            Some(items) if coord.block_no == index => CursorCoord {
                block_no: index - 1,
                line_no: items + coord.line_no,
                ..coord
            },
            _ => coord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_join_above_moves_coord_into_upper_list() {
        let join = ListJoin {
            above: Some(2),
            below: None,
        };

        assert_eq!(
            join.coord(3, CursorCoord::new(3, 1, 4)),
            CursorCoord::new(2, 3, 4)
        );
        assert_eq!(join.coord(3, CursorCoord::new(1, 0, 0)), CursorCoord::new(1, 0, 0));
        assert!(ListJoin::default().is_empty());
    }

    #[rstest]
    #[case(BlockRemap::Unchanged, 3, 3)]
    #[case(BlockRemap::Inserted(2), 1, 1)]
    #[case(BlockRemap::Inserted(2), 2, 3)]
    #[case(BlockRemap::Removed(2), 2, 2)]
    #[case(BlockRemap::Removed(2), 5, 4)]
    fn test_block_index_shifts(
        #[case] remap: BlockRemap,
        #[case] before: usize,
        #[case] after: usize,
    ) {
        assert_eq!(remap.block(before), after);
    }
}
