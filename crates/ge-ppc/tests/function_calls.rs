//! End-to-end guest function calls through the bridge

use std::sync::Arc;

use ge_core::config::Config;
use ge_core::error::{BridgeError, ExceptionCause, MemoryError};
use ge_memory::BufferProvider;
use ge_ppc::{CallResult, FunctionCall, InstructionWord, Interpreter, InterpreterContext};

const CODE: u32 = 0x8000_1000;
const BLR: u32 = 0x4E80_0020;
const XER_CA: u32 = 0x2000_0000;

fn create_test_env() -> (Arc<BufferProvider>, Interpreter) {
    create_test_env_with(Config::default())
}

fn create_test_env_with(config: Config) -> (Arc<BufferProvider>, Interpreter) {
    let provider = Arc::new(BufferProvider::new(0x1_0000));
    let ctx = InterpreterContext::new(provider.clone(), config);
    (provider, Interpreter::new(&ctx))
}

fn load_program(interp: &mut Interpreter, words: &[u32]) {
    for (i, word) in words.iter().enumerate() {
        interp
            .memory_mut()
            .write::<u32>(CODE + 4 * i as u32, *word)
            .unwrap();
    }
}

// ===== Normal Return Tests =====

#[test]
fn test_add_record_sets_cr0_gt() {
    let (_provider, mut interp) = create_test_env();
    // add. r3, r3, r4 ; blr
    load_program(&mut interp, &[0x7C63_2215, BLR]);

    let result = interp.evaluate(&FunctionCall::new(CODE).args(&[5, 7])).unwrap();
    let snapshot = result.snapshot();
    assert!(result.is_completed());
    assert_eq!(snapshot.return_value(), 12);
    assert_eq!(snapshot.cr >> 28, 0b0100, "CR0 = GT");
    assert_eq!(snapshot.pc, 0xDEAD_BEEF);
}

#[test]
fn test_load_immediate_and_return() {
    let (_provider, mut interp) = create_test_env();
    // li r3, 42 ; blr
    load_program(&mut interp, &[0x3860_002A, BLR]);

    let result = interp.evaluate(&FunctionCall::new(CODE)).unwrap();
    assert!(matches!(result, CallResult::Completed { .. }));
    assert_eq!(result.snapshot().return_value(), 42);
    assert_eq!(result.snapshot().tb, 2);
}

#[test]
fn test_carry_chain_64bit_add() {
    let (_provider, mut interp) = create_test_env();
    // addc r4, r4, r6 ; adde r3, r3, r5 ; blr
    load_program(&mut interp, &[0x7C84_3014, 0x7C63_2914, BLR]);

    let call = FunctionCall::new(CODE).args(&[0, 0xFFFF_FFFF, 0, 1]);
    let result = interp.evaluate(&call).unwrap();
    let snapshot = result.snapshot();
    assert!(result.is_completed());
    assert_eq!(snapshot.gpr[4], 0, "low word wraps");
    assert_eq!(snapshot.gpr[3], 1, "carry lands in the high word");
    assert_eq!(snapshot.xer & XER_CA, 0);
}

#[test]
fn test_float_argument_and_return() {
    let (_provider, mut interp) = create_test_env();
    // fadd f1, f1, f2 ; blr
    load_program(&mut interp, &[0xFC21_102A, BLR]);

    let call = FunctionCall::new(CODE).float_arg(1.5).float_arg(2.25);
    let result = interp.evaluate(&call).unwrap();
    assert!(result.is_completed());
    assert_eq!(result.snapshot().float_return(), 3.75);
}

#[test]
fn test_state_persists_between_calls() {
    let (_provider, mut interp) = create_test_env();
    // addi r14, r14, 1 ; mr r3, r14 ; blr
    load_program(&mut interp, &[0x39CE_0001, 0x7DC3_7378, BLR]);

    for expected in 1..=3 {
        let result = interp.evaluate(&FunctionCall::new(CODE)).unwrap();
        assert!(result.is_completed());
        assert_eq!(result.snapshot().return_value(), expected);
    }
}

#[test]
fn test_lone_blr_returns_to_host() {
    let (_provider, mut interp) = create_test_env();
    load_program(&mut interp, &[BLR]);

    let result = interp.evaluate(&FunctionCall::new(CODE).arg(42)).unwrap();
    assert!(result.is_completed(), "{result:?}");
    assert_eq!(result.snapshot().pc, 0xDEAD_BEEF);
    assert_eq!(result.snapshot().return_value(), 42);
    assert_eq!(interp.executed(), 1);
}

#[test]
fn test_bctr_to_sentinel_does_not_return() {
    let (_provider, mut interp) = create_test_env();
    // mflr r0 ; mtctr r0 ; bctr
    load_program(&mut interp, &[0x7C08_02A6, 0x7C09_03A6, 0x4E80_0420]);

    match interp.evaluate(&FunctionCall::new(CODE)).unwrap() {
        CallResult::Faulted { cause, address, .. } => {
            assert_eq!(cause, ExceptionCause::Isi);
            assert_eq!(address, 0xDEAD_BEEC);
        }
        other => panic!("expected a fetch fault, got {other:?}"),
    }
}

// ===== Fault Tests =====

#[test]
fn test_out_of_bounds_load_faults_with_address() {
    let (_provider, mut interp) = create_test_env();
    // lwz r3, 0(r4) ; blr
    load_program(&mut interp, &[0x8064_0000, BLR]);

    let call = FunctionCall::new(CODE).args(&[0, 0x8010_0000]);
    match interp.evaluate(&call).unwrap() {
        CallResult::Faulted {
            cause,
            address,
            pc,
            snapshot,
        } => {
            assert_eq!(cause, ExceptionCause::Dsi);
            assert_eq!(address, 0x8010_0000);
            assert_eq!(pc, CODE);
            assert_eq!(snapshot.dar, 0x8010_0000);
            assert_eq!(snapshot.gpr[3], 0, "destination untouched");
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn test_unknown_opcode_is_invalid_at_pc() {
    let (_provider, mut interp) = create_test_env();
    // nop ; (opcode 1)
    load_program(&mut interp, &[0x6000_0000, 0x0400_0000]);

    match interp.evaluate(&FunctionCall::new(CODE)).unwrap() {
        CallResult::Invalid { reason, pc, .. } => {
            assert_eq!(pc, CODE + 4);
            assert!(reason.contains("0x04000000"), "{reason}");
        }
        other => panic!("expected an invalid result, got {other:?}"),
    }
}

#[test]
fn test_disconnected_provider_faults_on_fetch() {
    let (provider, mut interp) = create_test_env();
    load_program(&mut interp, &[BLR]);
    provider.set_connected(false);

    match interp.evaluate(&FunctionCall::new(CODE)).unwrap() {
        CallResult::Faulted { cause, address, .. } => {
            assert_eq!(cause, ExceptionCause::Isi);
            assert_eq!(address, CODE);
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn test_instruction_limit_stops_runaway_loop() {
    let mut config = Config::default();
    config.interpreter.instruction_limit = 50;
    let (_provider, mut interp) = create_test_env_with(config);
    // b .
    load_program(&mut interp, &[0x4800_0000]);

    match interp.evaluate(&FunctionCall::new(CODE)).unwrap() {
        CallResult::Invalid { reason, pc, .. } => {
            assert_eq!(reason, "instruction limit reached");
            assert_eq!(pc, CODE);
        }
        other => panic!("expected the limit to trip, got {other:?}"),
    }
    assert_eq!(interp.executed(), 50);
}

#[test]
fn test_too_many_arguments_rejected() {
    let (_provider, mut interp) = create_test_env();
    let call = FunctionCall::new(CODE).args(&[0; 9]);
    assert!(matches!(
        interp.evaluate(&call),
        Err(BridgeError::TooManyArguments { kind: "integer", count: 9 })
    ));

    let mut call = FunctionCall::new(CODE);
    call.fpr_args = vec![0.0; 9];
    assert!(matches!(
        interp.evaluate(&call),
        Err(BridgeError::TooManyArguments { kind: "floating-point", .. })
    ));
}

// ===== Branch Tests =====

/// Run one `bc bo, 0, +8` and report (taken, ctr after)
fn run_bc(bo: u8, cr_bit: bool, ctr: u32) -> (bool, u32) {
    let (_provider, mut interp) = create_test_env();
    load_program(&mut interp, &[0x4000_0008 | (u32::from(bo) << 21)]);
    let regs = interp.registers_mut();
    regs.pc = CODE;
    regs.ctr = ctr;
    regs.cr = if cr_bit { 0x8000_0000 } else { 0 };
    interp.step().unwrap();
    (interp.registers().pc == CODE + 8, interp.registers().ctr)
}

#[test]
fn test_bo_truth_table() {
    // (bo, cr bit, ctr before, taken, ctr after)
    let cases = [
        (0b00100, false, 5, true, 5),  // bf
        (0b00100, true, 5, false, 5),
        (0b01100, true, 5, true, 5),   // bt
        (0b01100, false, 5, false, 5),
        (0b10100, false, 5, true, 5),  // always
        (0b10000, false, 2, true, 1),  // bdnz
        (0b10000, false, 1, false, 0),
        (0b10010, true, 1, true, 0),   // bdz
        (0b10010, true, 3, false, 2),
        (0b00000, false, 2, true, 1),  // bdnzf
        (0b00000, true, 2, false, 1),
        (0b00010, false, 1, true, 0),  // bdzf
        (0b01000, true, 2, true, 1),   // bdnzt
        (0b01010, true, 1, true, 0),   // bdzt
        (0b01010, false, 1, false, 0),
    ];
    for (bo, cr_bit, ctr, taken, ctr_after) in cases {
        assert_eq!(
            run_bc(bo, cr_bit, ctr),
            (taken, ctr_after),
            "bo={bo:05b} cr={cr_bit} ctr={ctr}"
        );
    }
}

#[test]
fn test_nested_call_through_lr() {
    let (_provider, mut interp) = create_test_env();
    load_program(
        &mut interp,
        &[
            0x7C08_02A6, // mflr r0
            0x4800_0011, // bl +0x10
            0x7C08_03A6, // mtlr r0
            0x3863_0001, // addi r3, r3, 1
            BLR,
            0x1C63_0003, // mulli r3, r3, 3
            BLR,
        ],
    );

    let result = interp.evaluate(&FunctionCall::new(CODE).arg(4)).unwrap();
    assert!(result.is_completed());
    assert_eq!(result.snapshot().return_value(), 13);
}

// ===== Rotate Tests =====

#[test]
fn test_rotation_masks() {
    // (mb, me, mask)
    let cases = [
        (0, 31, 0xFFFF_FFFF),
        (0, 0, 0x8000_0000),
        (31, 31, 0x0000_0001),
        (16, 31, 0x0000_FFFF),
        (0, 15, 0xFFFF_0000),
        (8, 23, 0x00FF_FF00),
        (1, 30, 0x7FFF_FFFE),
        (24, 7, 0xFF00_00FF),
        (31, 0, 0x8000_0001),
        (28, 3, 0xF000_000F),
        (4, 3, 0xFFFF_FFFF),
        (16, 15, 0xFFFF_FFFF),
    ];
    for (mb, me, mask) in cases {
        let (_provider, mut interp) = create_test_env();
        // rlwinm r3, r4, 0, mb, me ; blr
        let rlwinm = 0x5483_0000 | (mb << 6) | (me << 1);
        load_program(&mut interp, &[rlwinm, BLR]);

        let call = FunctionCall::new(CODE).args(&[0, 0xFFFF_FFFF]);
        let result = interp.evaluate(&call).unwrap();
        assert!(result.is_completed(), "mb={mb} me={me}");
        assert_eq!(result.snapshot().return_value(), mask, "mb={mb} me={me}");
    }
}

// ===== Decoder Tests =====

#[test]
fn test_exercised_words_reencode() {
    let words = [
        0x7C63_2215, // add.
        0x3860_002A, // li
        0x8064_0000, // lwz
        BLR,
        0x4800_0011, // bl
        0x4200_FFFC, // bdnz
        0x7C84_3014, // addc
        0x7C63_2914, // adde
        0x7C89_03A6, // mtctr
        0xFC21_102A, // fadd
        0xE023_0008, // psq_l
        0x5483_063E, // rlwinm
    ];
    for word in words {
        let decoded = InstructionWord(word).decode();
        assert_eq!(decoded.encode(), word, "0x{word:08x}");
    }
}

// ===== Memory Tests =====

#[test]
fn test_memory_helpers_respect_bounds() {
    let (_provider, mut interp) = create_test_env();
    interp.write_memory(0x8000_FFFC, &[1, 2, 3, 4]).unwrap();
    assert_eq!(interp.read_memory(0x8000_FFFC, 4).unwrap(), vec![1, 2, 3, 4]);

    assert_eq!(
        interp.read_memory(0x8000_FFFE, 4),
        Err(MemoryError::OutOfBounds {
            addr: 0x8000_FFFE,
            len: 4
        })
    );
    assert!(interp.write_memory(0x8001_0000, &[0]).is_err());
}

#[test]
fn test_arguments_staged_in_guest_memory() {
    let (_provider, mut interp) = create_test_env();
    interp.write_memory(0x8000_2000, &0x1234_5678u32.to_be_bytes()).unwrap();
    // lwz r3, 0(r3) ; blr
    load_program(&mut interp, &[0x8063_0000, BLR]);

    let result = interp.evaluate(&FunctionCall::new(CODE).arg(0x8000_2000)).unwrap();
    assert!(result.is_completed());
    assert_eq!(result.snapshot().return_value(), 0x1234_5678);
}
