//! Ordered instruction list with index-based branch labels.
//!
//! [`CilCode`] owns the instructions of one method body. Branch operands hold [`Label`]s that
//! name instructions by position, so editing the list only has to renumber labels; byte offsets
//! are recomputed from instruction sizes after every structural change.
//!
//! # Examples
//!
//! ```rust
//! use dotcil::assembly::{opcodes, CilCode, CilInstruction, Label, Operand, RawModel};
//!
//! let mut code: CilCode<RawModel> = CilCode::new();
//! code.push(CilInstruction::new(opcodes::BR_S, Operand::Target(Label::Instruction(1))));
//! code.push(CilInstruction::new(opcodes::RET, Operand::None));
//!
//! // The branch keeps pointing at `ret` when an instruction is inserted before it
//! code.insert(1, CilInstruction::new(opcodes::NOP, Operand::None));
//! assert_eq!(code.instructions()[0].operand, Operand::Target(Label::Instruction(2)));
//! assert_eq!(code.code_size(), 4);
//! ```

use std::fmt;

use crate::assembly::{CilInstruction, Label, Operand, OperandModel};

/// Label for a byte offset, given the sorted instruction offsets and the total code size.
///
/// Offsets that fall on an instruction boundary or on the end of the code bind to that position,
/// everything else stays detached.
pub(crate) fn label_for_offset(offsets: &[u32], code_size: usize, target: i64) -> Label {
    if target == code_size as i64 {
        return Label::Instruction(offsets.len());
    }

    match u32::try_from(target) {
        Ok(target) => match offsets.binary_search(&target) {
            Ok(index) => Label::Instruction(index),
            Err(_) => Label::Detached(i64::from(target)),
        },
        Err(_) => Label::Detached(target),
    }
}

/// The instruction stream of one method body.
pub struct CilCode<M: OperandModel> {
    instructions: Vec<CilInstruction<M>>,
}

impl<M: OperandModel> Clone for CilCode<M> {
    fn clone(&self) -> Self {
        CilCode {
            instructions: self.instructions.clone(),
        }
    }
}

impl<M: OperandModel> PartialEq for CilCode<M> {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
    }
}

impl<M: OperandModel> fmt::Debug for CilCode<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CilCode")
            .field("instructions", &self.instructions)
            .finish()
    }
}

impl<M: OperandModel> Default for CilCode<M> {
    fn default() -> Self {
        CilCode {
            instructions: Vec::new(),
        }
    }
}

impl<M: OperandModel> CilCode<M> {
    /// Create an empty instruction list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `instructions` and compute their offsets
    #[must_use]
    pub fn from_instructions(instructions: Vec<CilInstruction<M>>) -> Self {
        let mut code = CilCode { instructions };
        code.compute_offsets();
        code
    }

    /// Number of instructions
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if there are no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// All instructions in stream order
    #[must_use]
    pub fn instructions(&self) -> &[CilInstruction<M>] {
        &self.instructions
    }

    /// The instruction at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CilInstruction<M>> {
        self.instructions.get(index)
    }

    /// Iterate over the instructions
    pub fn iter(&self) -> std::slice::Iter<'_, CilInstruction<M>> {
        self.instructions.iter()
    }

    /// Append an instruction. Its labels are taken as they are.
    pub fn push(&mut self, mut instruction: CilInstruction<M>) {
        instruction.offset = self.code_size() as u32;
        self.instructions.push(instruction);
    }

    /// Insert an instruction before position `index`.
    ///
    /// Labels of existing instructions that point at `index` or later move along with their
    /// instruction, so existing branches keep their targets. Labels inside `instruction` are
    /// taken as they are and must already use the new numbering.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, instruction: CilInstruction<M>) {
        for existing in &mut self.instructions {
            for label in existing.labels_mut() {
                if let Label::Instruction(target) = label {
                    if *target >= index {
                        *target += 1;
                    }
                }
            }
        }

        self.instructions.insert(index, instruction);
        self.compute_offsets();
    }

    /// Remove and return the instruction at `index`.
    ///
    /// Labels that pointed at the removed instruction now point at its successor (or the end of
    /// the code); labels behind it are renumbered.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> CilInstruction<M> {
        let removed = self.instructions.remove(index);

        for existing in &mut self.instructions {
            for label in existing.labels_mut() {
                if let Label::Instruction(target) = label {
                    if *target > index {
                        *target -= 1;
                    }
                }
            }
        }

        self.compute_offsets();
        removed
    }

    /// Replace the instruction at `index`, returning the old one. Labels are left untouched.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn replace(&mut self, index: usize, instruction: CilInstruction<M>) -> CilInstruction<M> {
        let old = std::mem::replace(&mut self.instructions[index], instruction);
        self.compute_offsets();
        old
    }

    /// Recompute every instruction offset from the sizes of its predecessors
    pub fn compute_offsets(&mut self) {
        let mut offset = 0u32;
        for instruction in &mut self.instructions {
            instruction.offset = offset;
            offset = offset.wrapping_add(instruction.size() as u32);
        }
    }

    /// Total encoded size of the instruction stream in bytes
    #[must_use]
    pub fn code_size(&self) -> usize {
        self.instructions.iter().map(CilInstruction::size).sum()
    }

    /// Index of the instruction starting exactly at `offset`
    #[must_use]
    pub fn instruction_at_offset(&self, offset: u32) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&offset, |instruction| instruction.offset)
            .ok()
    }

    /// Label for a byte offset: an instruction label on instruction boundaries and the end of the
    /// code, a detached label otherwise
    #[must_use]
    pub fn label_at_offset(&self, offset: i64) -> Label {
        let offsets: Vec<u32> = self.instructions.iter().map(|i| i.offset).collect();
        label_for_offset(&offsets, self.code_size(), offset)
    }

    /// Byte offset a label currently refers to, `None` for an index past the end of the code
    #[must_use]
    pub fn label_offset(&self, label: &Label) -> Option<i64> {
        match *label {
            Label::Instruction(index) if index == self.instructions.len() => {
                Some(self.code_size() as i64)
            }
            Label::Instruction(index) => self
                .instructions
                .get(index)
                .map(|instruction| i64::from(instruction.offset)),
            Label::Detached(offset) => Some(offset),
        }
    }

    fn fmt_label(&self, f: &mut fmt::Formatter<'_>, label: &Label) -> fmt::Result {
        match self.label_offset(label) {
            Some(offset) if offset >= 0 => write!(f, "IL_{offset:04x}"),
            Some(offset) => write!(f, "IL_-{:04x}", offset.unsigned_abs()),
            None => write!(f, "IL_????"),
        }
    }
}

impl<'a, M: OperandModel> IntoIterator for &'a CilCode<M> {
    type Item = &'a CilInstruction<M>;
    type IntoIter = std::slice::Iter<'a, CilInstruction<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl<M> fmt::Display for CilCode<M>
where
    M: OperandModel,
    M::Member: fmt::Display,
    M::UserString: fmt::Display,
    M::Local: fmt::Display,
    M::Argument: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            write!(f, "IL_{:04x}: {}", instruction.offset, instruction.mnemonic())?;

            match &instruction.operand {
                Operand::None => {}
                Operand::Immediate(value) => write!(f, " {value}")?,
                Operand::Local(local) => write!(f, " {local}")?,
                Operand::Argument(argument) => write!(f, " {argument}")?,
                Operand::Target(label) => {
                    write!(f, " ")?;
                    self.fmt_label(f, label)?;
                }
                Operand::Switch(labels) => {
                    write!(f, " (")?;
                    for (i, label) in labels.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        self.fmt_label(f, label)?;
                    }
                    write!(f, ")")?;
                }
                Operand::String(string) => write!(f, " {string}")?,
                Operand::Member(member) => write!(f, " {member}")?,
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{opcodes, Immediate, RawModel},
        metadata::token::Token,
    };

    fn sample() -> CilCode<RawModel> {
        // 0: ldarg.0 / 1: brtrue.s -> 3 / 3: ldc.i4.0 / 4: ret
        CilCode::from_instructions(vec![
            CilInstruction::new(opcodes::LDARG_0, Operand::None),
            CilInstruction::new(opcodes::BRTRUE_S, Operand::Target(Label::Instruction(3))),
            CilInstruction::new(opcodes::LDC_I4_0, Operand::None),
            CilInstruction::new(opcodes::RET, Operand::None),
        ])
    }

    #[test]
    fn offsets() {
        let code = sample();
        let offsets: Vec<u32> = code.iter().map(|i| i.offset).collect();
        assert_eq!(offsets, [0, 1, 3, 4]);
        assert_eq!(code.code_size(), 5);
        assert_eq!(code.instruction_at_offset(3), Some(2));
        assert_eq!(code.instruction_at_offset(2), None);
    }

    #[test]
    fn labels_from_offsets() {
        let code = sample();
        assert_eq!(code.label_at_offset(4), Label::Instruction(3));
        assert_eq!(code.label_at_offset(5), Label::Instruction(4));
        assert_eq!(code.label_at_offset(2), Label::Detached(2));
        assert_eq!(code.label_at_offset(-1), Label::Detached(-1));
        assert_eq!(code.label_at_offset(9), Label::Detached(9));

        assert_eq!(code.label_offset(&Label::Instruction(4)), Some(5));
        assert_eq!(code.label_offset(&Label::Instruction(5)), None);
        assert_eq!(code.label_offset(&Label::Detached(-3)), Some(-3));
    }

    #[test]
    fn insert_shifts_labels() {
        let mut code = sample();
        code.insert(3, CilInstruction::new(opcodes::NOP, Operand::None));

        assert_eq!(code.len(), 5);
        assert_eq!(code.instructions()[1].operand, Operand::Target(Label::Instruction(4)));
        assert_eq!(code.instructions()[4].offset, 5);
        assert_eq!(code.instructions()[4].opcode, opcodes::RET);
    }

    #[test]
    fn insert_before_branch_target_keeps_earlier_labels() {
        let mut code = sample();
        code.insert(0, CilInstruction::new(opcodes::NOP, Operand::None));
        assert_eq!(code.instructions()[2].operand, Operand::Target(Label::Instruction(4)));
    }

    #[test]
    fn remove_retargets_to_successor() {
        let mut code = sample();
        code.insert(3, CilInstruction::new(opcodes::NOP, Operand::None));

        let removed = code.remove(3);
        assert_eq!(removed.opcode, opcodes::NOP);
        assert_eq!(code.instructions()[1].operand, Operand::Target(Label::Instruction(3)));

        // Removing the target itself leaves the label on the instruction that took its place
        code.remove(3);
        assert_eq!(code.instructions()[1].operand, Operand::Target(Label::Instruction(3)));
        assert_eq!(code.label_offset(&Label::Instruction(3)), Some(4));
        assert_eq!(code.code_size(), 4);
    }

    #[test]
    fn replace_recomputes_offsets() {
        let mut code = sample();
        let old = code.replace(
            2,
            CilInstruction::new(opcodes::LDC_I4, Operand::Immediate(Immediate::Int32(7))),
        );
        assert_eq!(old.opcode, opcodes::LDC_I4_0);
        assert_eq!(code.instructions()[3].offset, 8);
        assert_eq!(code.code_size(), 9);
    }

    #[test]
    fn push_assigns_offset() {
        let mut code: CilCode<RawModel> = CilCode::new();
        assert!(code.is_empty());
        code.push(CilInstruction::new(
            opcodes::CALL,
            Operand::Member(Token::new(0x0A00_0001)),
        ));
        code.push(CilInstruction::new(opcodes::RET, Operand::None));
        assert_eq!(code.get(1).map(|i| i.offset), Some(5));
    }

    #[test]
    fn display() {
        let mut code = sample();
        code.push(CilInstruction::new(
            opcodes::SWITCH,
            Operand::Switch(vec![Label::Instruction(0), Label::Detached(2)]),
        ));
        code.push(CilInstruction::new(
            opcodes::CALL,
            Operand::Member(Token::new(0x0A00_0001)),
        ));

        let text = code.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "IL_0000: ldarg.0");
        assert_eq!(lines[1], "IL_0001: brtrue.s IL_0004");
        assert_eq!(lines[4], "IL_0005: switch (IL_0000, IL_0002)");
        assert_eq!(lines[5], "IL_0012: call 0x0a000001");
    }
}
