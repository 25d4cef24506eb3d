use strum::{EnumCount, IntoEnumIterator};

use crate::{
    file::Parser,
    metadata::{
        streams::{heap_index_width, HeapKind, HeapSizes},
        tables::{coded_index_width, CodedIndexType, TableId},
    },
    Result,
};

/// Per-image facts that decide the physical width of table and heap references.
///
/// Implementors provide row counts and the heap size flags; the widths derived from them are
/// fixed for the whole image, so implementations are free to cache them.
pub trait TokenSpace {
    /// Number of rows in `table`, `0` if the table is absent
    fn row_count(&self, table: TableId) -> u32;

    /// The `HeapSizes` flags of the tables stream header
    fn heap_sizes(&self) -> HeapSizes;

    /// Width in bytes (2 or 4) of a coded index of `kind`
    fn coded_index_width(&self, kind: CodedIndexType) -> usize {
        coded_index_width(kind.candidates(), |table| self.row_count(table))
    }

    /// Width in bytes (2 or 4) of a plain index into `table`
    fn table_index_width(&self, table: TableId) -> usize {
        if self.row_count(table) > u32::from(u16::MAX) {
            4
        } else {
            2
        }
    }

    /// Width in bytes (2 or 4) of references into `heap`
    fn heap_index_width(&self, heap: HeapKind) -> usize {
        heap_index_width(self.heap_sizes(), heap)
    }
}

/// Row counts and heap sizes of one image, with every coded index width computed up front.
#[derive(Clone, Debug, PartialEq)]
pub struct TableInfo {
    rows: Vec<u32>,
    coded_indexes: Vec<u8>,
    heap_sizes: HeapSizes,
}

impl TableInfo {
    /// Build from explicit row counts; tables not listed have no rows.
    #[must_use]
    pub fn new(row_counts: &[(TableId, u32)], heap_sizes: HeapSizes) -> Self {
        let mut rows = vec![0; usize::from(TableId::CustomDebugInformation.token_type()) + 1];
        for (table, count) in row_counts {
            rows[usize::from(table.token_type())] = *count;
        }

        let mut table_info = TableInfo {
            rows,
            coded_indexes: vec![0; CodedIndexType::COUNT],
            heap_sizes,
        };

        table_info.calculate_coded_index_widths();
        table_info
    }

    /// Parse the fixed part of a `#~` tables stream: heap sizes, the `valid` bit vector and one
    /// row count per present table.
    ///
    /// Row counts of tables with an unknown number are consumed and dropped.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the header or the row counts are cut short.
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        parser.advance_by(6)?;
        let heap_sizes = HeapSizes::from_bits_truncate(parser.read_le::<u8>()?);
        parser.advance_by(1)?;
        let valid = parser.read_le::<u64>()?;
        let _sorted = parser.read_le::<u64>()?;

        let mut row_counts = Vec::with_capacity(valid.count_ones() as usize);
        for bit in 0..64u8 {
            if valid & (1u64 << bit) == 0 {
                continue;
            }

            let rows = parser.read_le::<u32>()?;
            match TableId::from_token_type(bit) {
                Ok(table) => row_counts.push((table, rows)),
                Err(_) => log::debug!("Ignoring row count of unknown table 0x{bit:02X}"),
            }
        }

        Ok(TableInfo::new(&row_counts, heap_sizes))
    }

    fn calculate_coded_index_widths(&mut self) {
        for kind in CodedIndexType::iter() {
            let width = coded_index_width(kind.candidates(), |table| self.row_count(table));
            self.coded_indexes[kind as usize] = width as u8;
        }
    }
}

impl TokenSpace for TableInfo {
    fn row_count(&self, table: TableId) -> u32 {
        self.rows[usize::from(table.token_type())]
    }

    fn heap_sizes(&self) -> HeapSizes {
        self.heap_sizes
    }

    fn coded_index_width(&self, kind: CodedIndexType) -> usize {
        usize::from(self.coded_indexes[kind as usize])
    }
}
