//! Device-side command interpretation.
//!
//! The host only frames and routes; what a peripheral can do is expressed
//! through the capability methods here. `process` is the common command
//! walker shared by every node: it consumes a request body command by
//! command, asks the concrete node for each capability, and assembles the
//! status/report reply body. Concrete nodes override the capabilities,
//! never the walker.

pub const CMD_READ_ID: u8 = 0x10;
pub const CMD_CMD_REV: u8 = 0x11;
pub const CMD_JVS_REV: u8 = 0x12;
pub const CMD_COMM_VER: u8 = 0x13;
pub const CMD_FUNCTION_LIST: u8 = 0x14;
pub const CMD_READ_SWITCHES: u8 = 0x20;
pub const CMD_READ_COINS: u8 = 0x21;
pub const CMD_READ_ANALOGS: u8 = 0x22;
pub const CMD_COIN_SUB: u8 = 0x30;
pub const CMD_WRITE_OUTPUTS: u8 = 0x32;
pub const CMD_COIN_ADD: u8 = 0x35;
pub const CMD_RESET: u8 = 0xf0;
pub const CMD_RESET_ARG: u8 = 0xd9;
pub const CMD_SET_ADDRESS: u8 = 0xf1;

/// Frame status byte: every command in the request was handled.
pub const STATUS_NORMAL: u8 = 0x01;
/// Frame status byte: a command byte was not recognized; the rest of the
/// request cannot be parsed.
pub const STATUS_UNKNOWN_COMMAND: u8 = 0x02;
pub const STATUS_CHECKSUM_ERROR: u8 = 0x03;
pub const STATUS_OVERFLOW: u8 = 0x04;

/// Per-command report byte: handled.
pub const REPORT_NORMAL: u8 = 0x01;
/// Per-command report byte: too few argument bytes.
pub const REPORT_PARAM_COUNT: u8 = 0x02;
/// Per-command report byte: arguments out of range for this node.
pub const REPORT_PARAM_DATA: u8 = 0x03;

/// One peripheral on the chain.
///
/// Read-style capabilities return `None` when the arguments exceed what
/// the node provides (a 2-player board asked for 3 players); write-style
/// ones return false. Both surface as [`REPORT_PARAM_DATA`] in the reply,
/// with the rest of the request still processed.
pub trait JvsNode {
    /// Identity string for [`CMD_READ_ID`], `;`-separated maker, product,
    /// version, comment.
    fn io_id(&self) -> &str;
    /// Command-format revision, BCD.
    fn cmd_rev(&self) -> u8 {
        0x13
    }
    /// Wire-standard revision, BCD.
    fn jvs_rev(&self) -> u8 {
        0x30
    }
    /// Communication version, BCD.
    fn comm_ver(&self) -> u8 {
        0x10
    }
    /// Function descriptor blocks, four bytes each, without the terminator.
    fn function_list(&self) -> Vec<u8>;
    /// System byte followed by `bytes_per_player` bytes for each player.
    fn switches(&self, players: u8, bytes_per_player: u8) -> Option<Vec<u8>>;
    /// Two bytes per slot: condition bits plus a 14-bit count, big end
    /// first.
    fn coin_counts(&self, slots: u8) -> Option<Vec<u8>>;
    /// Two bytes per channel, left-justified.
    fn analogs(&self, channels: u8) -> Option<Vec<u8>>;
    /// Latch general-purpose outputs.
    fn set_outputs(&mut self, data: &[u8]) -> bool;
    /// Adjust a coin counter from the host side. `slot` is 1-based on the
    /// wire; `amount` is negative for a payout subtract.
    fn coin_add(&mut self, slot: u8, amount: i16) -> bool;
    /// Bus reset: return outputs to power-on defaults.
    fn reset(&mut self) {}

    /// Walk a request body and build the reply body.
    fn process(&mut self, request: &[u8]) -> Vec<u8> {
        let mut reply = vec![STATUS_NORMAL];
        let mut at = 0;
        while at < request.len() {
            match dispatch_one(self, &request[at..], &mut reply) {
                Some(consumed) => at += consumed,
                None => {
                    // Command boundaries are unknowable past this point,
                    // so the status covers the whole frame.
                    reply.clear();
                    reply.push(STATUS_UNKNOWN_COMMAND);
                    break;
                }
            }
        }
        reply
    }
}

/// Handle one command at the front of `request`. Returns the number of
/// bytes consumed, or None for an unrecognized command byte.
fn dispatch_one<N: JvsNode + ?Sized>(
    node: &mut N,
    request: &[u8],
    reply: &mut Vec<u8>,
) -> Option<usize> {
    match request[0] {
        CMD_READ_ID => {
            reply.push(REPORT_NORMAL);
            reply.extend_from_slice(node.io_id().as_bytes());
            reply.push(0);
            Some(1)
        }
        CMD_CMD_REV => {
            reply.extend_from_slice(&[REPORT_NORMAL, node.cmd_rev()]);
            Some(1)
        }
        CMD_JVS_REV => {
            reply.extend_from_slice(&[REPORT_NORMAL, node.jvs_rev()]);
            Some(1)
        }
        CMD_COMM_VER => {
            reply.extend_from_slice(&[REPORT_NORMAL, node.comm_ver()]);
            Some(1)
        }
        CMD_FUNCTION_LIST => {
            reply.push(REPORT_NORMAL);
            reply.extend_from_slice(&node.function_list());
            reply.push(0);
            Some(1)
        }
        CMD_READ_SWITCHES => {
            let (&players, &bytes) = match (request.get(1), request.get(2)) {
                (Some(p), Some(b)) => (p, b),
                _ => return short_args(request, reply),
            };
            match node.switches(players, bytes) {
                Some(data) => {
                    reply.push(REPORT_NORMAL);
                    reply.extend_from_slice(&data);
                }
                None => reply.push(REPORT_PARAM_DATA),
            }
            Some(3)
        }
        CMD_READ_COINS => {
            let Some(&slots) = request.get(1) else {
                return short_args(request, reply);
            };
            match node.coin_counts(slots) {
                Some(data) => {
                    reply.push(REPORT_NORMAL);
                    reply.extend_from_slice(&data);
                }
                None => reply.push(REPORT_PARAM_DATA),
            }
            Some(2)
        }
        CMD_READ_ANALOGS => {
            let Some(&channels) = request.get(1) else {
                return short_args(request, reply);
            };
            match node.analogs(channels) {
                Some(data) => {
                    reply.push(REPORT_NORMAL);
                    reply.extend_from_slice(&data);
                }
                None => reply.push(REPORT_PARAM_DATA),
            }
            Some(2)
        }
        CMD_COIN_ADD | CMD_COIN_SUB => {
            let (&slot, &hi, &lo) = match (request.get(1), request.get(2), request.get(3)) {
                (Some(s), Some(h), Some(l)) => (s, h, l),
                _ => return short_args(request, reply),
            };
            let magnitude = i16::from_be_bytes([hi & 0x7f, lo]);
            let amount = if request[0] == CMD_COIN_SUB {
                -magnitude
            } else {
                magnitude
            };
            if node.coin_add(slot, amount) {
                reply.push(REPORT_NORMAL);
            } else {
                reply.push(REPORT_PARAM_DATA);
            }
            Some(4)
        }
        CMD_WRITE_OUTPUTS => {
            let Some(&count) = request.get(1) else {
                return short_args(request, reply);
            };
            let Some(data) = request.get(2..2 + count as usize) else {
                return short_args(request, reply);
            };
            if node.set_outputs(data) {
                reply.push(REPORT_NORMAL);
            } else {
                reply.push(REPORT_PARAM_DATA);
            }
            Some(2 + count as usize)
        }
        _ => None,
    }
}

/// A command whose argument bytes ran off the end of the frame. The report
/// flags it and the truncated tail is consumed.
fn short_args(request: &[u8], reply: &mut Vec<u8>) -> Option<usize> {
    reply.push(REPORT_PARAM_COUNT);
    Some(request.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNode;

    impl JvsNode for FixedNode {
        fn io_id(&self) -> &str {
            "TEST;NODE;Ver1.00;unit"
        }

        fn function_list(&self) -> Vec<u8> {
            vec![0x01, 1, 8, 0]
        }

        fn switches(&self, players: u8, _bytes_per_player: u8) -> Option<Vec<u8>> {
            (players <= 1).then(|| vec![0x00, 0x12, 0x34])
        }

        fn coin_counts(&self, _slots: u8) -> Option<Vec<u8>> {
            None
        }

        fn analogs(&self, _channels: u8) -> Option<Vec<u8>> {
            None
        }

        fn set_outputs(&mut self, _data: &[u8]) -> bool {
            true
        }

        fn coin_add(&mut self, _slot: u8, _amount: i16) -> bool {
            false
        }
    }

    #[test]
    fn revision_commands_pack_in_request_order() {
        let mut node = FixedNode;
        let reply = node.process(&[CMD_CMD_REV, CMD_JVS_REV, CMD_COMM_VER]);
        assert_eq!(
            reply,
            vec![
                STATUS_NORMAL,
                REPORT_NORMAL,
                0x13,
                REPORT_NORMAL,
                0x30,
                REPORT_NORMAL,
                0x10
            ]
        );
    }

    #[test]
    fn the_id_string_is_nul_terminated() {
        let mut node = FixedNode;
        let reply = node.process(&[CMD_READ_ID]);
        assert_eq!(reply[0], STATUS_NORMAL);
        assert_eq!(reply[1], REPORT_NORMAL);
        assert_eq!(*reply.last().unwrap(), 0);
        assert_eq!(&reply[2..reply.len() - 1], b"TEST;NODE;Ver1.00;unit");
    }

    #[test]
    fn out_of_range_arguments_report_without_poisoning_the_frame() {
        let mut node = FixedNode;
        let reply = node.process(&[CMD_READ_SWITCHES, 2, 2, CMD_CMD_REV]);
        assert_eq!(
            reply,
            vec![STATUS_NORMAL, REPORT_PARAM_DATA, REPORT_NORMAL, 0x13]
        );
    }

    #[test]
    fn an_unknown_command_flags_the_whole_frame() {
        let mut node = FixedNode;
        let reply = node.process(&[CMD_CMD_REV, 0x77, CMD_JVS_REV]);
        assert_eq!(reply, vec![STATUS_UNKNOWN_COMMAND]);
    }

    #[test]
    fn truncated_arguments_report_and_end_the_walk() {
        let mut node = FixedNode;
        let reply = node.process(&[CMD_READ_SWITCHES, 1]);
        assert_eq!(reply, vec![STATUS_NORMAL, REPORT_PARAM_COUNT]);
    }
}
