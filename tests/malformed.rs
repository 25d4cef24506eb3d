//! Integration tests for malformed and unusual method bodies.
//!
//! Every rejection must surface as an error with a body-relative offset, never as a panic, and
//! the tolerant paths of [`CodecConfig`] must keep what can be kept.

use dotcil::{
    metadata::method::{ExceptionHandler, ExceptionHandlerKind, MethodBody, RawMethodBody},
    prelude::*,
};

fn fat_header(flags: u16, code_size: u32) -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(&(flags | 0x3003).to_le_bytes());
    header.extend_from_slice(&8u16.to_le_bytes());
    header.extend_from_slice(&code_size.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header
}

/// Fat body `nop; ret` with the sections flag set and padding up to the first section
fn with_sections() -> Vec<u8> {
    let mut body = fat_header(0x08, 2);
    body.extend_from_slice(&[0x00, 0x2A, 0x00, 0x00]);
    body
}

fn small_clause(flags: u16, try_offset: u16, handler_offset: u16) -> Vec<u8> {
    let mut clause = Vec::new();
    clause.extend_from_slice(&flags.to_le_bytes());
    clause.extend_from_slice(&try_offset.to_le_bytes());
    clause.push(1);
    clause.extend_from_slice(&handler_offset.to_le_bytes());
    clause.push(1);
    clause.extend_from_slice(&0u32.to_le_bytes());
    clause
}

fn decode(bytes: &[u8], config: &CodecConfig) -> Result<MethodBody<RawModel>> {
    MethodBody::decode_with(bytes, &RawOperands, config)
}

#[test]
fn invalid_header_selectors() {
    for first in [0x00u8, 0x01, 0x04, 0x05, 0xFD] {
        assert!(
            matches!(
                decode(&[first, 0x00, 0x2A], &CodecConfig::default()),
                Err(Error::MalformedHeader { offset: 0, .. })
            ),
            "selector byte 0x{first:02X}"
        );
    }
}

#[test]
fn every_truncation_is_reported() {
    let mut body: MethodBody<RawModel> = MethodBody::new(CilCode::from_instructions(vec![
        CilInstruction::new(opcodes::NOP, Operand::None),
        CilInstruction::new(opcodes::ENDFINALLY, Operand::None),
        CilInstruction::new(opcodes::RET, Operand::None),
    ]));
    body.exception_handlers.push(ExceptionHandler {
        kind: ExceptionHandlerKind::Finally,
        try_offset: 0,
        try_length: 1,
        handler_offset: 1,
        handler_length: 1,
        class_token_or_filter_offset: 0,
    });
    let bytes = body.encode(&RawOperands).unwrap();
    assert_eq!(bytes.len(), 32);

    for length in 0..bytes.len() {
        assert!(
            matches!(
                decode(&bytes[..length], &CodecConfig::default()),
                Err(Error::TruncatedStream { .. })
            ),
            "prefix of {length} bytes"
        );
    }
    assert_eq!(decode(&bytes, &CodecConfig::default()).unwrap(), body);
}

#[test]
fn single_byte_mutations_decode_or_fail_cleanly() {
    let mut bytes = with_sections();
    bytes.extend_from_slice(&[0x01, 0x10, 0x00, 0x00]);
    bytes.extend_from_slice(&small_clause(0x02, 0, 1));

    for position in 0..bytes.len() {
        for value in 0..=u8::MAX {
            let mut mutated = bytes.clone();
            mutated[position] = value;

            for config in [CodecConfig::strict(), CodecConfig::lenient()] {
                if let Ok(body) = decode(&mutated, &config) {
                    let encoded = body.encode(&RawOperands).unwrap();
                    assert_eq!(decode(&encoded, &config).unwrap(), body);
                }
            }
        }
    }
}

#[test]
fn unknown_opcodes_carry_body_offsets() {
    let mut bytes = fat_header(0, 3);
    bytes.extend_from_slice(&[0x00, 0xFE, 0x1F]);
    assert!(matches!(
        decode(&bytes, &CodecConfig::default()),
        Err(Error::UnknownOpcode {
            prefix: 0xFE,
            opcode: 0x1F,
            offset: 13
        })
    ));

    assert!(matches!(
        decode(&[(2 << 2) | 0x02, 0x00, 0xA6], &CodecConfig::default()),
        Err(Error::UnknownOpcode {
            prefix: 0x00,
            opcode: 0xA6,
            offset: 2
        })
    ));
}

#[test]
fn switch_tables() {
    // Case count far beyond the code
    assert!(matches!(
        decode(
            &[(5 << 2) | 0x02, 0x45, 0xFF, 0xFF, 0xFF, 0xFF],
            &CodecConfig::default()
        ),
        Err(Error::TruncatedStream { offset: 6, .. })
    ));

    // Case count above the configured limit
    let bytes = [
        (14 << 2) | 0x02,
        0x45,
        0x02,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x2A,
    ];
    let config = CodecConfig {
        max_switch_targets: 1,
        ..CodecConfig::default()
    };
    assert!(matches!(
        decode(&bytes, &config),
        Err(Error::MalformedHeader { offset: 2, .. })
    ));

    let body = decode(&bytes, &CodecConfig::default()).unwrap();
    assert_eq!(
        body.code.instructions()[0].operand,
        Operand::Switch(vec![Label::Instruction(1), Label::Instruction(1)])
    );
}

#[test]
fn branch_targets_off_instruction_boundaries() {
    // br.s into the operand of ldc.i4.s
    let inside = [(5 << 2) | 0x02, 0x2B, 0x01, 0x1F, 0x05, 0x2A];
    let body = decode(&inside, &CodecConfig::default()).unwrap();
    assert_eq!(
        body.code.instructions()[0].operand,
        Operand::Target(Label::Detached(3))
    );
    assert_eq!(body.encode(&RawOperands).unwrap(), inside);

    assert!(matches!(
        decode(&inside, &CodecConfig::strict()),
        Err(Error::InvalidBranchTarget {
            offset: 1,
            target: 3
        })
    ));

    // br.s before the start of the code
    let before = [(3 << 2) | 0x02, 0x2B, 0xFD, 0x2A];
    let body = decode(&before, &CodecConfig::default()).unwrap();
    assert_eq!(
        body.code.instructions()[0].operand,
        Operand::Target(Label::Detached(-1))
    );
    assert_eq!(body.encode(&RawOperands).unwrap(), before);
}

#[test]
fn missing_sections() {
    let mut bytes = fat_header(0x08, 2);
    bytes.extend_from_slice(&[0x00, 0x2A]);

    assert!(matches!(
        decode(&bytes, &CodecConfig::default()),
        Err(Error::TruncatedStream { .. })
    ));
}

#[test]
fn section_size_checks() {
    let mut too_small = with_sections();
    too_small.extend_from_slice(&[0x01, 0x02, 0x00, 0x00]);
    assert!(matches!(
        decode(&too_small, &CodecConfig::default()),
        Err(Error::MalformedHeader { offset: 16, .. })
    ));

    let mut partial_clause = with_sections();
    partial_clause.extend_from_slice(&[0x01, 0x11, 0x00, 0x00]);
    partial_clause.extend_from_slice(&small_clause(0x02, 0, 1));
    partial_clause.push(0x00);
    assert!(matches!(
        decode(&partial_clause, &CodecConfig::default()),
        Err(Error::MalformedHeader { offset: 16, .. })
    ));

    let body = decode(&partial_clause, &CodecConfig::lenient()).unwrap();
    assert!(body.exception_handlers.is_empty());
}

#[test]
fn lenient_keeps_earlier_sections() {
    let mut bytes = with_sections();
    bytes.extend_from_slice(&[0x81, 0x10, 0x00, 0x00]);
    bytes.extend_from_slice(&small_clause(0x02, 0, 1));
    bytes.extend_from_slice(&[0x01, 0x11, 0x00, 0x00]);
    bytes.extend_from_slice(&[0x00; 13]);

    assert!(matches!(
        decode(&bytes, &CodecConfig::default()),
        Err(Error::MalformedHeader { offset: 32, .. })
    ));

    let body = decode(&bytes, &CodecConfig::lenient()).unwrap();
    assert_eq!(body.exception_handlers.len(), 1);
    assert_eq!(body.exception_handlers[0].kind, ExceptionHandlerKind::Finally);
}

#[test]
fn foreign_sections_are_skipped() {
    let mut bytes = with_sections();
    bytes.extend_from_slice(&[0x82, 0x08, 0x00, 0x00, 0xAA, 0xAA, 0xAA, 0xAA]);
    bytes.extend_from_slice(&[0x01, 0x10, 0x00, 0x00]);
    bytes.extend_from_slice(&small_clause(0x04, 0, 1));

    let raw = RawMethodBody::read(&bytes, &CodecConfig::default()).unwrap();
    assert_eq!(raw.size, 40);
    assert_eq!(raw.exception_handlers.len(), 1);
    assert_eq!(raw.exception_handlers[0].kind, ExceptionHandlerKind::Fault);

    // Re-encoding drops the foreign section
    let body = raw.resolve(&RawOperands, &CodecConfig::default()).unwrap();
    let encoded = body.encode(&RawOperands).unwrap();
    assert_eq!(encoded.len(), 32);
    assert_eq!(encoded[16..], bytes[24..]);
}

#[test]
fn undefined_clause_flags() {
    let mut bytes = with_sections();
    bytes.extend_from_slice(&[0x01, 0x10, 0x00, 0x00]);
    bytes.extend_from_slice(&small_clause(0x03, 0, 1));

    assert!(matches!(
        decode(&bytes, &CodecConfig::default()),
        Err(Error::MalformedHeader { .. })
    ));
}
