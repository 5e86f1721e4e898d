//! Integration tests for the wire contract seen by the microcontroller.
//!
//! These drive a [`TableLink`] through the public API over an in-memory
//! transport and check the exact bytes, then decode them the way a receiver
//! would.

use valve_core::{
    domain::layout::{TABLE_HEIGHT, TABLE_WIDTH},
    link::MemoryTransport,
    protocol::{cobs, decode_frame, encode_frame, reset_frame, DEFAULT_DATA_LINE, DELIMITER},
    BoardChain, BoardSpec, Coordinate, FrameDecoder, LinkError, LinkState, TableLink,
    TABLE_LAYOUT,
};

fn two_board_layout() -> [BoardSpec; 2] {
    [BoardSpec::standard(0, 0, 0), BoardSpec::standard(1, 2, 0)]
}

#[test]
fn test_two_board_scenario_matches_wire_bytes() {
    // Arrange
    let transport = MemoryTransport::new();
    let mut link = TableLink::open(transport.clone(), &two_board_layout(), DEFAULT_DATA_LINE)
        .expect("open must succeed");

    // Act
    link.set(Coordinate::new(1, 2), true).expect("(1, 2) is mapped");

    // Assert: reset, then [selector, board1, board0] stuffed and delimited
    let mut expected = reset_frame();
    expected.extend(cobs::encode(&[DEFAULT_DATA_LINE, 0x00, 0x02]));
    expected.push(DELIMITER);
    assert_eq!(transport.written(), expected);
}

#[test]
fn test_every_table_cell_round_trips_through_the_wire() {
    let transport = MemoryTransport::new();
    let mut link =
        TableLink::open(transport.clone(), &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");
    let receiver_view = BoardChain::from_specs(&TABLE_LAYOUT).expect("valid");
    transport.take_written();

    for y in 0..TABLE_HEIGHT {
        for x in 0..TABLE_WIDTH {
            let c = Coordinate::new(x, y);
            link.set(c, true).expect("mapped");

            let (frame, _) = decode_frame(&transport.take_written()).expect("state frame");
            assert_eq!(frame.selector, DEFAULT_DATA_LINE);
            assert_eq!(receiver_view.decode_state(&frame.payload), Some(vec![c]));

            link.set(c, false).expect("mapped");
            transport.take_written();
        }
    }
}

#[test]
fn test_clear_and_fill_frames_carry_one_byte_per_board() {
    // Arrange
    let transport = MemoryTransport::new();
    let mut link =
        TableLink::open(transport.clone(), &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");

    // Act
    link.fill().expect("fill");
    link.clear().expect("clear");

    // Assert
    let frames = transport.frames();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].is_reset());
    assert_eq!(frames[1].payload, vec![0xFF; TABLE_LAYOUT.len()]);
    assert_eq!(frames[2].payload, vec![0x00; TABLE_LAYOUT.len()]);
}

#[test]
fn test_receiver_recovers_after_torn_frame() {
    // Arrange: a frame cut off mid-way by line noise, then a full resync
    let transport = MemoryTransport::new();
    let mut link =
        TableLink::open(transport.clone(), &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");
    link.set(Coordinate::new(0, 0), true).expect("mapped");
    let good = transport.take_written();

    let mut torn = encode_frame(DEFAULT_DATA_LINE, &[0x55; 21]);
    torn.truncate(torn.len() / 2);
    torn.push(DELIMITER);

    let mut stream = torn;
    stream.extend(&good);

    // Act
    let mut decoder = FrameDecoder::new();
    let results = decoder.feed(&stream);

    // Assert: the torn frame is reported, then the reset and state frame decode cleanly
    assert_eq!(results.len(), 3);
    assert!(results[0].is_err());
    assert!(results[1].as_ref().expect("reset").is_reset());
    let state = results[2].as_ref().expect("state");
    let chain = BoardChain::from_specs(&TABLE_LAYOUT).expect("valid");
    assert_eq!(chain.decode_state(&state.payload), Some(vec![Coordinate::new(0, 0)]));
}

#[test]
fn test_failed_write_is_fatal_until_reopened() {
    // Arrange
    let transport = MemoryTransport::new();
    let mut link =
        TableLink::open(transport.clone(), &TABLE_LAYOUT, DEFAULT_DATA_LINE).expect("open");

    // Act
    transport.set_failing(true);
    let failed = link.set(Coordinate::new(3, 3), true);
    transport.set_failing(false);
    let after = link.send();

    // Assert
    assert!(matches!(failed, Err(LinkError::Transport(_))));
    assert!(matches!(after, Err(LinkError::Closed)));
    assert_eq!(link.state(), LinkState::Closed);
    assert_eq!(transport.frames().len(), 1, "only the reset frame made it out");
}
