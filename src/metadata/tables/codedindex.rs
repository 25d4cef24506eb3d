//! Coded indices.
//!
//! A coded index packs a reference to a row in one of several candidate tables into a single
//! integer: the low `tag_bits` bits select the candidate by its position in a fixed list, the
//! remaining bits hold the row. Whether the packed value is stored in 2 or 4 bytes depends on the
//! row counts of the candidate tables and is decided once per image.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::metadata::tables::{CodedIndex, CodedIndexType, TableId};
//!
//! let parent = CodedIndex::new(TableId::TypeRef, 3);
//! let raw = parent.encode(CodedIndexType::MemberRefParent)?;
//! assert_eq!(raw, (3 << 3) | 1);
//! assert_eq!(CodedIndex::decode(raw, CodedIndexType::MemberRefParent)?, parent);
//! # Ok::<(), dotcil::Error>(())
//! ```

use strum::{EnumCount, EnumIter};

use crate::{
    file::{Parser, Writer},
    metadata::{
        tables::{TableId, TokenSpace},
        token::Token,
    },
    Error, Result,
};

/// The coded index kinds of ECMA-335 II.24.2.6, plus the Portable PDB
/// `HasCustomDebugInformation`.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy, EnumIter, EnumCount)]
#[repr(usize)]
pub enum CodedIndexType {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// `Field`, `Param` or `Property`
    HasConstant,
    /// Any table that can carry a custom attribute
    HasCustomAttribute,
    /// `Field` or `Param`
    HasFieldMarshal,
    /// `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// Parent of a `MemberRef`
    MemberRefParent,
    /// `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// `Field` or `MethodDef`
    MemberForwarded,
    /// `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// Constructor of a custom attribute; tags 0, 1 and 4 are unassigned
    CustomAttributeType,
    /// Scope a `TypeRef` resolves in
    ResolutionScope,
    /// `TypeDef` or `MethodDef`
    TypeOrMethodDef,
    /// Any table that can carry Portable PDB custom debug information
    HasCustomDebugInformation,
}

impl CodedIndexType {
    /// Candidate tables in tag order. `None` marks a tag that is reserved but unassigned.
    #[must_use]
    pub fn candidates(&self) -> &'static [Option<TableId>] {
        match self {
            CodedIndexType::TypeDefOrRef => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasConstant => &[
                Some(TableId::Field),
                Some(TableId::Param),
                Some(TableId::Property),
            ],
            CodedIndexType::HasCustomAttribute => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                // Listed as 'Permission' in the standard; the table is DeclSecurity
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
            ],
            CodedIndexType::HasFieldMarshal => &[Some(TableId::Field), Some(TableId::Param)],
            CodedIndexType::HasDeclSecurity => &[
                Some(TableId::TypeDef),
                Some(TableId::MethodDef),
                Some(TableId::Assembly),
            ],
            CodedIndexType::MemberRefParent => &[
                Some(TableId::TypeDef),
                Some(TableId::TypeRef),
                Some(TableId::ModuleRef),
                Some(TableId::MethodDef),
                Some(TableId::TypeSpec),
            ],
            CodedIndexType::HasSemantics => &[Some(TableId::Event), Some(TableId::Property)],
            CodedIndexType::MethodDefOrRef => {
                &[Some(TableId::MethodDef), Some(TableId::MemberRef)]
            }
            CodedIndexType::MemberForwarded => &[Some(TableId::Field), Some(TableId::MethodDef)],
            CodedIndexType::Implementation => &[
                Some(TableId::File),
                Some(TableId::AssemblyRef),
                Some(TableId::ExportedType),
            ],
            CodedIndexType::CustomAttributeType => &[
                None,
                None,
                Some(TableId::MethodDef),
                Some(TableId::MemberRef),
                None,
            ],
            CodedIndexType::ResolutionScope => &[
                Some(TableId::Module),
                Some(TableId::ModuleRef),
                Some(TableId::AssemblyRef),
                Some(TableId::TypeRef),
            ],
            CodedIndexType::TypeOrMethodDef => &[Some(TableId::TypeDef), Some(TableId::MethodDef)],
            CodedIndexType::HasCustomDebugInformation => &[
                Some(TableId::MethodDef),
                Some(TableId::Field),
                Some(TableId::TypeRef),
                Some(TableId::TypeDef),
                Some(TableId::Param),
                Some(TableId::InterfaceImpl),
                Some(TableId::MemberRef),
                Some(TableId::Module),
                Some(TableId::DeclSecurity),
                Some(TableId::Property),
                Some(TableId::Event),
                Some(TableId::StandAloneSig),
                Some(TableId::ModuleRef),
                Some(TableId::TypeSpec),
                Some(TableId::Assembly),
                Some(TableId::AssemblyRef),
                Some(TableId::File),
                Some(TableId::ExportedType),
                Some(TableId::ManifestResource),
                Some(TableId::GenericParam),
                Some(TableId::GenericParamConstraint),
                Some(TableId::MethodSpec),
                Some(TableId::Document),
                Some(TableId::LocalScope),
                Some(TableId::LocalVariable),
                Some(TableId::LocalConstant),
                Some(TableId::ImportScope),
            ],
        }
    }

    /// Number of low bits holding the tag, `ceil(log2(candidate count))`
    #[must_use]
    pub fn tag_bits(&self) -> u32 {
        tag_bits_for(self.candidates().len())
    }

    /// Position of `table` in the candidate list, if it is a candidate
    #[must_use]
    pub fn tag_of(&self, table: TableId) -> Option<u32> {
        self.candidates()
            .iter()
            .position(|candidate| *candidate == Some(table))
            .map(|tag| tag as u32)
    }
}

fn tag_bits_for(count: usize) -> u32 {
    if count <= 1 {
        0
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

/// Number of bits needed to store row indices up to `rows`; an empty table still takes one bit.
#[must_use]
pub fn row_bits(rows: u32) -> u32 {
    if rows == 0 {
        1
    } else {
        32 - rows.leading_zeros()
    }
}

/// Physical width in bytes (2 or 4) of a coded index over `candidates`.
///
/// Two bytes suffice only while the largest candidate's row count fits in `16 - tag_bits` bits.
#[must_use]
pub fn coded_index_width(
    candidates: &[Option<TableId>],
    row_count: impl Fn(TableId) -> u32,
) -> usize {
    let tag_bits = tag_bits_for(candidates.len());
    let max_bits = candidates
        .iter()
        .flatten()
        .map(|table| row_bits(row_count(*table)))
        .max()
        .unwrap_or(1);

    if max_bits + tag_bits > 16 {
        4
    } else {
        2
    }
}

/// A decoded coded index: the referenced table and its 1-based row.
///
/// Row 0 is the null reference. Its table is only meaningful when it came out of
/// [`CodedIndex::decode`]; encoding a null reference keeps the tag when the table is a
/// candidate and writes `0` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodedIndex {
    /// The referenced table
    pub table: TableId,
    /// The referenced row, `0` for no reference
    pub row: u32,
}

impl CodedIndex {
    /// Create a reference to `row` in `table`
    #[must_use]
    pub fn new(table: TableId, row: u32) -> CodedIndex {
        CodedIndex { table, row }
    }

    /// True if the index does not reference a row
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }

    /// The metadata token naming the same row
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.table, self.row)
    }

    /// Pack into `(row << tag_bits) | tag`.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTable`] if a non-null reference names a table outside
    /// the candidate list of `kind`, and [`crate::Error::IndexOutOfRange`] if the row does not
    /// fit in the `32 - tag_bits` bits left next to the tag.
    pub fn encode(&self, kind: CodedIndexType) -> Result<u32> {
        match kind.tag_of(self.table) {
            Some(_) if self.row > u32::MAX >> kind.tag_bits() => Err(Error::IndexOutOfRange {
                kind: "coded",
                index: self.row,
                offset: 0,
            }),
            Some(tag) => Ok((self.row << kind.tag_bits()) | tag),
            None if self.row == 0 => Ok(0),
            None => Err(Error::UnsupportedTable {
                table: self.table,
                kind,
            }),
        }
    }

    /// Unpack a raw coded index of `kind`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidTag`] if the tag is beyond the candidate list, or names an
    /// unassigned tag while referencing a row.
    pub fn decode(raw: u32, kind: CodedIndexType) -> Result<CodedIndex> {
        let tag_bits = kind.tag_bits();
        let tag = raw & ((1 << tag_bits) - 1);
        let row = raw >> tag_bits;

        let candidates = kind.candidates();
        let Some(candidate) = candidates.get(tag as usize) else {
            return Err(Error::InvalidTag { tag, kind });
        };

        let table = match candidate {
            Some(table) => *table,
            None if row == 0 => match candidates.iter().flatten().next() {
                Some(table) => *table,
                None => return Err(Error::InvalidTag { tag, kind }),
            },
            None => return Err(Error::InvalidTag { tag, kind }),
        };

        Ok(CodedIndex { table, row })
    }

    /// Read a coded index of `kind`, sized according to `space`.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the data ends, or any error of
    /// [`CodedIndex::decode`].
    pub fn read<S: TokenSpace + ?Sized>(
        parser: &mut Parser,
        kind: CodedIndexType,
        space: &S,
    ) -> Result<CodedIndex> {
        let raw = parser.read_le_dyn(space.coded_index_width(kind) == 4)?;
        CodedIndex::decode(raw, kind)
    }

    /// Write this coded index as `kind`, sized according to `space`.
    ///
    /// # Errors
    /// Returns any error of [`CodedIndex::encode`], and [`crate::Error::IndexOutOfRange`] if
    /// the packed value does not fit a 2 byte column. Nothing is written on error.
    pub fn write<S: TokenSpace + ?Sized>(
        &self,
        writer: &mut Writer,
        kind: CodedIndexType,
        space: &S,
    ) -> Result<()> {
        let raw = self.encode(kind)?;
        let is_large = space.coded_index_width(kind) == 4;
        if !is_large && raw > u32::from(u16::MAX) {
            return Err(Error::IndexOutOfRange {
                kind: "coded",
                index: self.row,
                offset: writer.pos(),
            });
        }

        writer.write_le_dyn(raw, is_large);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::TableInfo;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_bits_per_kind() {
        assert_eq!(CodedIndexType::TypeDefOrRef.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasConstant.tag_bits(), 2);
        assert_eq!(CodedIndexType::HasCustomAttribute.tag_bits(), 5);
        assert_eq!(CodedIndexType::HasFieldMarshal.tag_bits(), 1);
        assert_eq!(CodedIndexType::HasDeclSecurity.tag_bits(), 2);
        assert_eq!(CodedIndexType::MemberRefParent.tag_bits(), 3);
        assert_eq!(CodedIndexType::HasSemantics.tag_bits(), 1);
        assert_eq!(CodedIndexType::MethodDefOrRef.tag_bits(), 1);
        assert_eq!(CodedIndexType::MemberForwarded.tag_bits(), 1);
        assert_eq!(CodedIndexType::Implementation.tag_bits(), 2);
        assert_eq!(CodedIndexType::CustomAttributeType.tag_bits(), 3);
        assert_eq!(CodedIndexType::ResolutionScope.tag_bits(), 2);
        assert_eq!(CodedIndexType::TypeOrMethodDef.tag_bits(), 1);
        assert_eq!(CodedIndexType::HasCustomDebugInformation.tag_bits(), 5);
    }

    #[test]
    fn encode_decode_every_candidate() {
        for kind in CodedIndexType::iter() {
            for table in kind.candidates().iter().flatten() {
                let index = CodedIndex::new(*table, 0x1234);
                let raw = index.encode(kind).unwrap();
                assert_eq!(raw >> kind.tag_bits(), 0x1234);
                assert_eq!(CodedIndex::decode(raw, kind).unwrap(), index);
            }
        }
    }

    #[test]
    fn typedeforref_values() {
        let index = CodedIndex::decode(0x0000_0049, CodedIndexType::TypeDefOrRef).unwrap();
        assert_eq!(index.table, TableId::TypeRef);
        assert_eq!(index.row, 0x12);
        assert_eq!(index.token(), Token(0x0100_0012));
    }

    #[test]
    fn unsupported_table() {
        let index = CodedIndex::new(TableId::Field, 1);
        assert!(matches!(
            index.encode(CodedIndexType::TypeDefOrRef),
            Err(Error::UnsupportedTable {
                table: TableId::Field,
                kind: CodedIndexType::TypeDefOrRef
            })
        ));
    }

    #[test]
    fn invalid_tag() {
        // TypeDefOrRef has three candidates, tag 3 is out of range
        assert!(matches!(
            CodedIndex::decode(0x0000_0007, CodedIndexType::TypeDefOrRef),
            Err(Error::InvalidTag { tag: 3, .. })
        ));
        // MemberRefParent has five candidates, tags 5..7 are out of range
        assert!(matches!(
            CodedIndex::decode(0x0000_000D, CodedIndexType::MemberRefParent),
            Err(Error::InvalidTag { tag: 5, .. })
        ));
        // Unassigned CustomAttributeType tag referencing a row
        assert!(matches!(
            CodedIndex::decode(0x0000_0008, CodedIndexType::CustomAttributeType),
            Err(Error::InvalidTag { tag: 0, .. })
        ));
    }

    #[test]
    fn custom_attribute_type() {
        let ctor = CodedIndex::new(TableId::MemberRef, 2);
        let raw = ctor.encode(CodedIndexType::CustomAttributeType).unwrap();
        assert_eq!(raw, (2 << 3) | 3);
        assert_eq!(
            CodedIndex::decode(raw, CodedIndexType::CustomAttributeType).unwrap(),
            ctor
        );
    }

    #[test]
    fn null_reference() {
        let null = CodedIndex::decode(0, CodedIndexType::ResolutionScope).unwrap();
        assert!(null.is_null());
        assert_eq!(null.encode(CodedIndexType::ResolutionScope).unwrap(), 0);

        // Tag of a null reference survives re-encoding
        let null = CodedIndex::decode(0x2, CodedIndexType::TypeDefOrRef).unwrap();
        assert_eq!(null.table, TableId::TypeSpec);
        assert_eq!(null.encode(CodedIndexType::TypeDefOrRef).unwrap(), 0x2);

        // A null reference ignores a table outside the candidate list
        let null = CodedIndex::new(TableId::Field, 0);
        assert_eq!(null.encode(CodedIndexType::TypeDefOrRef).unwrap(), 0);

        let null = CodedIndex::decode(0, CodedIndexType::CustomAttributeType).unwrap();
        assert_eq!(null.row, 0);
    }

    #[test]
    fn width_boundaries() {
        let candidates = CodedIndexType::MemberRefParent.candidates();

        let large = |table: TableId| if table == TableId::TypeRef { 70000 } else { 10 };
        assert_eq!(coded_index_width(candidates, large), 4);

        let small = |_: TableId| 8191;
        assert_eq!(coded_index_width(candidates, small), 2);

        let edge = |table: TableId| if table == TableId::TypeSpec { 8192 } else { 0 };
        assert_eq!(coded_index_width(candidates, edge), 4);

        assert_eq!(coded_index_width(candidates, |_| 0), 2);
    }

    #[test]
    fn read_write_with_space() {
        let info = TableInfo::new(&[(TableId::TypeRef, 70000)], Default::default());
        let index = CodedIndex::new(TableId::TypeRef, 69999);

        let mut writer = Writer::new();
        index
            .write(&mut writer, CodedIndexType::MemberRefParent, &info)
            .unwrap();
        index
            .write(&mut writer, CodedIndexType::HasConstant, &info)
            .unwrap_err();
        let data = writer.into_inner();
        assert_eq!(data.len(), 4);

        let mut parser = Parser::new(&data);
        let read = CodedIndex::read(&mut parser, CodedIndexType::MemberRefParent, &info).unwrap();
        assert_eq!(read, index);
    }

    #[test]
    fn row_too_large_for_tag() {
        let kind = CodedIndexType::TypeDefOrRef;
        assert_eq!(
            CodedIndex::new(TableId::TypeRef, 0x3FFF_FFFF).encode(kind).unwrap(),
            0xFFFF_FFFD
        );
        assert!(matches!(
            CodedIndex::new(TableId::TypeRef, 0x4000_0001).encode(kind),
            Err(Error::IndexOutOfRange {
                kind: "coded",
                index: 0x4000_0001,
                ..
            })
        ));
    }

    #[test]
    fn row_too_large_for_short_column() {
        let info = TableInfo::new(&[(TableId::TypeRef, 10)], Default::default());
        let kind = CodedIndexType::TypeDefOrRef;
        assert_eq!(info.coded_index_width(kind), 2);

        let mut writer = Writer::new();
        CodedIndex::new(TableId::TypeRef, 0x3FFF)
            .write(&mut writer, kind, &info)
            .unwrap();
        assert!(matches!(
            CodedIndex::new(TableId::TypeRef, 20000).write(&mut writer, kind, &info),
            Err(Error::IndexOutOfRange {
                kind: "coded",
                index: 20000,
                offset: 2
            })
        ));
        assert_eq!(writer.into_inner(), [0xFD, 0xFF]);
    }
}
