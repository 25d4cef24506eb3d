//! Identifiers of the metadata tables.
//!
//! The discriminant of every [`crate::metadata::tables::TableId`] is the table number used in
//! the high byte of metadata tokens and in the `valid` bit vector of the tables stream header.
//! Besides the ECMA-335 tables this includes the `*Ptr` indirection tables of unoptimized
//! metadata, the edit-and-continue tables, and the Portable PDB tables (`0x30..=0x37`).

use strum::{EnumCount, EnumIter};

use crate::{Error, Result};

/// Metadata table identifiers, with their token type as discriminant.
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TableId {
    /// `Module` - the current module
    Module = 0x00,
    /// `TypeRef` - references to types in other modules
    TypeRef = 0x01,
    /// `TypeDef` - types defined in this module
    TypeDef = 0x02,
    /// `FieldPtr` - field indirection (unoptimized metadata)
    FieldPtr = 0x03,
    /// `Field` - field definitions
    Field = 0x04,
    /// `MethodPtr` - method indirection (unoptimized metadata)
    MethodPtr = 0x05,
    /// `MethodDef` - method definitions
    MethodDef = 0x06,
    /// `ParamPtr` - parameter indirection (unoptimized metadata)
    ParamPtr = 0x07,
    /// `Param` - parameter definitions
    Param = 0x08,
    /// `InterfaceImpl` - interfaces implemented by types
    InterfaceImpl = 0x09,
    /// `MemberRef` - references to fields and methods of other types
    MemberRef = 0x0A,
    /// `Constant` - compile-time constant values
    Constant = 0x0B,
    /// `CustomAttribute` - attribute applications
    CustomAttribute = 0x0C,
    /// `FieldMarshal` - marshalling descriptors
    FieldMarshal = 0x0D,
    /// `DeclSecurity` - declarative security
    DeclSecurity = 0x0E,
    /// `ClassLayout` - explicit type layout
    ClassLayout = 0x0F,
    /// `FieldLayout` - explicit field offsets
    FieldLayout = 0x10,
    /// `StandAloneSig` - standalone signatures (locals, `calli`)
    StandAloneSig = 0x11,
    /// `EventMap` - type to event range mapping
    EventMap = 0x12,
    /// `EventPtr` - event indirection (unoptimized metadata)
    EventPtr = 0x13,
    /// `Event` - event definitions
    Event = 0x14,
    /// `PropertyMap` - type to property range mapping
    PropertyMap = 0x15,
    /// `PropertyPtr` - property indirection (unoptimized metadata)
    PropertyPtr = 0x16,
    /// `Property` - property definitions
    Property = 0x17,
    /// `MethodSemantics` - accessor associations
    MethodSemantics = 0x18,
    /// `MethodImpl` - explicit overrides
    MethodImpl = 0x19,
    /// `ModuleRef` - references to other modules
    ModuleRef = 0x1A,
    /// `TypeSpec` - constructed type signatures
    TypeSpec = 0x1B,
    /// `ImplMap` - P/Invoke mappings
    ImplMap = 0x1C,
    /// `FieldRVA` - initial data of static fields
    FieldRVA = 0x1D,
    /// `EncLog` - edit-and-continue log
    EncLog = 0x1E,
    /// `EncMap` - edit-and-continue map
    EncMap = 0x1F,
    /// `Assembly` - the current assembly
    Assembly = 0x20,
    /// `AssemblyProcessor` - unused
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` - unused
    AssemblyOS = 0x22,
    /// `AssemblyRef` - referenced assemblies
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` - unused
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` - unused
    AssemblyRefOS = 0x25,
    /// `File` - files of a multi-module assembly
    File = 0x26,
    /// `ExportedType` - types forwarded or exported from other modules
    ExportedType = 0x27,
    /// `ManifestResource` - embedded and linked resources
    ManifestResource = 0x28,
    /// `NestedClass` - nesting relationships
    NestedClass = 0x29,
    /// `GenericParam` - generic parameter definitions
    GenericParam = 0x2A,
    /// `MethodSpec` - generic method instantiations
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` - constraints on generic parameters
    GenericParamConstraint = 0x2C,
    /// `Document` - Portable PDB source documents
    Document = 0x30,
    /// `MethodDebugInformation` - Portable PDB sequence points
    MethodDebugInformation = 0x31,
    /// `LocalScope` - Portable PDB lexical scopes
    LocalScope = 0x32,
    /// `LocalVariable` - Portable PDB local names
    LocalVariable = 0x33,
    /// `LocalConstant` - Portable PDB local constants
    LocalConstant = 0x34,
    /// `ImportScope` - Portable PDB namespace imports
    ImportScope = 0x35,
    /// `StateMachineMethod` - Portable PDB kickoff method mapping
    StateMachineMethod = 0x36,
    /// `CustomDebugInformation` - Portable PDB custom debug records
    CustomDebugInformation = 0x37,
}

impl TableId {
    /// The table number, as used in the high byte of a token
    #[must_use]
    pub fn token_type(self) -> u8 {
        self as u8
    }

    /// Map a table number back to its identifier.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidTableId`] for numbers that name no table.
    pub fn from_token_type(value: u8) -> Result<Self> {
        let table = match value {
            0x00 => TableId::Module,
            0x01 => TableId::TypeRef,
            0x02 => TableId::TypeDef,
            0x03 => TableId::FieldPtr,
            0x04 => TableId::Field,
            0x05 => TableId::MethodPtr,
            0x06 => TableId::MethodDef,
            0x07 => TableId::ParamPtr,
            0x08 => TableId::Param,
            0x09 => TableId::InterfaceImpl,
            0x0A => TableId::MemberRef,
            0x0B => TableId::Constant,
            0x0C => TableId::CustomAttribute,
            0x0D => TableId::FieldMarshal,
            0x0E => TableId::DeclSecurity,
            0x0F => TableId::ClassLayout,
            0x10 => TableId::FieldLayout,
            0x11 => TableId::StandAloneSig,
            0x12 => TableId::EventMap,
            0x13 => TableId::EventPtr,
            0x14 => TableId::Event,
            0x15 => TableId::PropertyMap,
            0x16 => TableId::PropertyPtr,
            0x17 => TableId::Property,
            0x18 => TableId::MethodSemantics,
            0x19 => TableId::MethodImpl,
            0x1A => TableId::ModuleRef,
            0x1B => TableId::TypeSpec,
            0x1C => TableId::ImplMap,
            0x1D => TableId::FieldRVA,
            0x1E => TableId::EncLog,
            0x1F => TableId::EncMap,
            0x20 => TableId::Assembly,
            0x21 => TableId::AssemblyProcessor,
            0x22 => TableId::AssemblyOS,
            0x23 => TableId::AssemblyRef,
            0x24 => TableId::AssemblyRefProcessor,
            0x25 => TableId::AssemblyRefOS,
            0x26 => TableId::File,
            0x27 => TableId::ExportedType,
            0x28 => TableId::ManifestResource,
            0x29 => TableId::NestedClass,
            0x2A => TableId::GenericParam,
            0x2B => TableId::MethodSpec,
            0x2C => TableId::GenericParamConstraint,
            0x30 => TableId::Document,
            0x31 => TableId::MethodDebugInformation,
            0x32 => TableId::LocalScope,
            0x33 => TableId::LocalVariable,
            0x34 => TableId::LocalConstant,
            0x35 => TableId::ImportScope,
            0x36 => TableId::StateMachineMethod,
            0x37 => TableId::CustomDebugInformation,
            _ => return Err(Error::InvalidTableId(value)),
        };

        Ok(table)
    }
}
