//! Host and I/O board talking through the full wire encoding.

use std::cell::RefCell;
use std::rc::Rc;

use coinop_jvs::{
    decode_frame, JvsHost, JvsIoBoard, JvsNode, PlayerSwitch, CMD_READ_ANALOGS, CMD_READ_COINS,
    CMD_READ_ID, CMD_READ_SWITCHES, CMD_WRITE_OUTPUTS, ESCAPE, REPORT_NORMAL, STATUS_NORMAL, SYNC,
};

fn send(host: &mut JvsHost, bytes: &[u8]) -> Option<Vec<u8>> {
    for &byte in bytes {
        host.push(byte);
    }
    host.commit_encode().map(<[u8]>::to_vec)
}

fn board_on_bus() -> (JvsHost, Rc<RefCell<JvsIoBoard>>) {
    let mut host = JvsHost::new();
    let board = Rc::new(RefCell::new(JvsIoBoard::new()));
    host.attach(board.clone());
    assert_eq!(host.assign_addresses(), 1);
    (host, board)
}

#[test]
fn bring_up_addresses_the_far_end_first() {
    let mut host = JvsHost::new();
    for _ in 0..3 {
        host.attach(Rc::new(RefCell::new(JvsIoBoard::new())));
    }
    assert_eq!(host.assign_addresses(), 3);
    assert_eq!(host.address_of(0), Some(3));
    assert_eq!(host.address_of(1), Some(2));
    assert_eq!(host.address_of(2), Some(1));
}

#[test]
fn a_poll_cycle_reads_id_switches_coins_and_analogs() {
    let (mut host, board) = board_on_bus();
    {
        let mut board = board.borrow_mut();
        board.set_switch(0, PlayerSwitch::PUSH1, true);
        board.set_coin_line(0, true);
        board.set_analog(0, 0xbeef);
    }

    send(
        &mut host,
        &[
            1,
            CMD_READ_ID,
            CMD_READ_SWITCHES,
            2,
            2,
            CMD_READ_COINS,
            2,
            CMD_READ_ANALOGS,
            8,
        ],
    )
    .unwrap();

    let (status, reports) = host.reply_body().unwrap();
    assert_eq!(status, STATUS_NORMAL);

    let mut cur = 0;
    assert_eq!(reports[cur], REPORT_NORMAL);
    cur += 1;
    let nul = reports[cur..].iter().position(|&b| b == 0).unwrap();
    assert_eq!(&reports[cur..cur + nul], board.borrow().io_id().as_bytes());
    cur += nul + 1;

    assert_eq!(reports[cur], REPORT_NORMAL);
    assert_eq!(reports[cur + 2], (PlayerSwitch::PUSH1.bits() >> 8) as u8);
    cur += 1 + 1 + 4;

    assert_eq!(reports[cur], REPORT_NORMAL);
    assert_eq!(u16::from_be_bytes([reports[cur + 1], reports[cur + 2]]), 1);
    cur += 1 + 4;

    assert_eq!(reports[cur], REPORT_NORMAL);
    assert_eq!(
        u16::from_be_bytes([reports[cur + 1], reports[cur + 2]]),
        0xbeef
    );
    assert_eq!(reports.len(), cur + 1 + 16);
}

#[test]
fn reserved_bytes_are_escaped_on_the_wire() {
    let (mut host, board) = board_on_bus();

    send(&mut host, &[1, CMD_WRITE_OUTPUTS, 1, SYNC]).unwrap();

    let wire = host.sent();
    assert!(!wire[1..].contains(&SYNC));
    assert!(wire[1..].contains(&ESCAPE));
    let (dest, body) = decode_frame(wire).unwrap();
    assert_eq!(dest, 1);
    assert_eq!(body, vec![CMD_WRITE_OUTPUTS, 1, SYNC]);
    assert_eq!(board.borrow().outputs(), SYNC);
}

#[test]
fn outputs_reach_the_board_and_reset_revokes_everything() {
    let (mut host, board) = board_on_bus();

    let reply = send(&mut host, &[1, CMD_WRITE_OUTPUTS, 1, 0xa5]).unwrap();
    assert!(!reply.is_empty());
    assert_eq!(board.borrow().outputs(), 0xa5);

    host.reset_bus();
    assert_eq!(host.address_of(0), None);
    assert_eq!(board.borrow().outputs(), 0);
}

#[test]
fn an_unassigned_address_leaves_the_bus_silent() {
    let (mut host, _board) = board_on_bus();

    assert!(send(&mut host, &[5, CMD_READ_ID]).is_none());
    assert!(host.reply().is_empty());
    assert!(host.reply_body().is_err());
}
