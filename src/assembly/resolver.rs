//! Hooks between the instruction codec and the surrounding object model.
//!
//! The decoder never interprets tokens, heap offsets or local indices itself. It hands them to an
//! [`OperandResolver`], and the encoder asks an [`OperandBuilder`] for the reverse mapping. Both
//! are parameterised over an [`OperandModel`] that names the types an operand resolves to.
//!
//! [`RawOperands`] implements both sides for [`RawModel`], which keeps every reference as the raw
//! token or index found in the stream. Decoding with it defers all resolution to the caller and
//! re-encoding reproduces the original values exactly.

use std::fmt::Debug;

use crate::{metadata::token::Token, Result};

/// The types operands resolve to.
///
/// All associated types must be shareable across threads so that method bodies of one image can
/// be decoded in parallel against a shared resolver.
pub trait OperandModel {
    /// Field, method, type, signature or generic token reference
    type Member: Clone + Debug + PartialEq + Send + Sync;
    /// Entry of the user string heap
    type UserString: Clone + Debug + PartialEq + Send + Sync;
    /// Local variable
    type Local: Clone + Debug + PartialEq + Send + Sync;
    /// Method argument
    type Argument: Clone + Debug + PartialEq + Send + Sync;
}

/// Decode-side lookups.
///
/// A `None` result makes the decoder fail the method body with the matching error
/// ([`crate::Error::UnresolvedMember`], [`crate::Error::UnresolvedString`] or
/// [`crate::Error::IndexOutOfRange`]).
pub trait OperandResolver {
    /// The model this resolver produces
    type Model: OperandModel;

    /// Map a metadata token to a member
    fn resolve_member(&self, token: Token) -> Option<<Self::Model as OperandModel>::Member>;

    /// Map a user string heap offset (token with the `0x70` tag removed) to a string
    fn resolve_string(&self, index: u32) -> Option<<Self::Model as OperandModel>::UserString>;

    /// Map a local variable index to a local.
    ///
    /// `locals` is the list produced by [`OperandResolver::resolve_local_signature`] for the
    /// method body being decoded. The default implementation indexes into it.
    fn resolve_local(
        &self,
        index: u16,
        locals: &[<Self::Model as OperandModel>::Local],
    ) -> Option<<Self::Model as OperandModel>::Local> {
        locals.get(usize::from(index)).cloned()
    }

    /// Map an argument index to an argument
    fn resolve_argument(&self, index: u16) -> Option<<Self::Model as OperandModel>::Argument>;

    /// Resolve the `StandAloneSig` token of a fat header into the local variable list.
    ///
    /// Only called for non-null tokens. The default implementation reports no locals.
    ///
    /// # Errors
    /// Implementations return an error if the signature can not be resolved or parsed.
    fn resolve_local_signature(
        &self,
        _token: Token,
    ) -> Result<Vec<<Self::Model as OperandModel>::Local>> {
        Ok(Vec::new())
    }
}

/// Encode-side lookups, the inverse of [`OperandResolver`].
pub trait OperandBuilder {
    /// The model this builder consumes
    type Model: OperandModel;

    /// Token of a member
    ///
    /// # Errors
    /// Implementations return an error if the member has no token.
    fn get_member_token(&self, member: &<Self::Model as OperandModel>::Member) -> Result<Token>;

    /// User string heap offset of a string
    ///
    /// # Errors
    /// Implementations return an error if the string is not in the heap.
    fn get_string_offset(&self, string: &<Self::Model as OperandModel>::UserString)
        -> Result<u32>;

    /// Index of a local variable
    ///
    /// # Errors
    /// Implementations return an error if the local does not belong to the method.
    fn get_local_index(&self, local: &<Self::Model as OperandModel>::Local) -> Result<u16>;

    /// Index of an argument
    ///
    /// # Errors
    /// Implementations return an error if the argument does not belong to the method.
    fn get_argument_index(&self, argument: &<Self::Model as OperandModel>::Argument)
        -> Result<u16>;
}

/// Operands kept exactly as stored: tokens, user string offsets and plain indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawModel;

impl OperandModel for RawModel {
    type Member = Token;
    type UserString = u32;
    type Local = u16;
    type Argument = u16;
}

/// Identity resolver and builder for [`RawModel`].
///
/// Every lookup succeeds, so decoding only fails on structural problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawOperands;

impl OperandResolver for RawOperands {
    type Model = RawModel;

    fn resolve_member(&self, token: Token) -> Option<Token> {
        Some(token)
    }

    fn resolve_string(&self, index: u32) -> Option<u32> {
        Some(index)
    }

    fn resolve_local(&self, index: u16, _locals: &[u16]) -> Option<u16> {
        Some(index)
    }

    fn resolve_argument(&self, index: u16) -> Option<u16> {
        Some(index)
    }
}

impl OperandBuilder for RawOperands {
    type Model = RawModel;

    fn get_member_token(&self, member: &Token) -> Result<Token> {
        Ok(*member)
    }

    fn get_string_offset(&self, string: &u32) -> Result<u32> {
        Ok(*string)
    }

    fn get_local_index(&self, local: &u16) -> Result<u16> {
        Ok(*local)
    }

    fn get_argument_index(&self, argument: &u16) -> Result<u16> {
        Ok(*argument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_operands_are_identity() {
        let raw = RawOperands;
        let token = Token::new(0x0A00_0010);

        assert_eq!(raw.resolve_member(token), Some(token));
        assert_eq!(raw.get_member_token(&token).unwrap(), token);
        assert_eq!(raw.resolve_string(0x42), Some(0x42));
        assert_eq!(raw.get_string_offset(&0x42).unwrap(), 0x42);
        assert_eq!(raw.resolve_local(300, &[]), Some(300));
        assert_eq!(raw.get_local_index(&300).unwrap(), 300);
        assert_eq!(raw.resolve_argument(2), Some(2));
        assert_eq!(raw.get_argument_index(&2).unwrap(), 2);
        assert!(raw.resolve_local_signature(Token::new(0x1100_0001)).unwrap().is_empty());
    }

    struct Named;

    impl OperandModel for Named {
        type Member = String;
        type UserString = String;
        type Local = &'static str;
        type Argument = u16;
    }

    struct NamedResolver;

    impl OperandResolver for NamedResolver {
        type Model = Named;

        fn resolve_member(&self, token: Token) -> Option<String> {
            Some(format!("member_{:x}", token.row()))
        }

        fn resolve_string(&self, _index: u32) -> Option<String> {
            None
        }

        fn resolve_argument(&self, index: u16) -> Option<u16> {
            (index < 2).then_some(index)
        }
    }

    #[test]
    fn default_local_lookup_indexes_signature() {
        let locals = ["a", "b"];
        assert_eq!(NamedResolver.resolve_local(1, &locals), Some("b"));
        assert_eq!(NamedResolver.resolve_local(2, &locals), None);
        assert_eq!(NamedResolver.resolve_argument(2), None);
        assert_eq!(
            NamedResolver.resolve_member(Token::new(0x0600_000F)).as_deref(),
            Some("member_f")
        );
    }
}
