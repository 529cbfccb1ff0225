//! Bounded byte-stream inbox for variable-length payloads.
//!
//! Each message is stored as a 2-byte little-endian length followed by its
//! bytes. A payload is either stored whole or not at all.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::error::InboxError;

const LEN_PREFIX: usize = 2;

pub struct Inbox<const N: usize> {
    bytes: Mutex<RefCell<Deque<u8, N>>>,
}

impl<const N: usize> Inbox<N> {
    pub const fn new() -> Self {
        Self {
            bytes: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Largest payload a single message can carry.
    pub const fn max_payload(&self) -> usize {
        let limit = N.saturating_sub(LEN_PREFIX);
        if limit > u16::MAX as usize {
            u16::MAX as usize
        } else {
            limit
        }
    }

    /// Copy `payload` in as one message. Never blocks.
    pub fn push(&self, payload: &[u8]) -> Result<(), InboxError> {
        let len = payload.len();
        if len > self.max_payload() {
            return Err(InboxError::Oversize {
                len,
                capacity: self.max_payload(),
            });
        }
        critical_section::with(|cs| {
            let mut bytes = self.bytes.borrow(cs).borrow_mut();
            let free = N - bytes.len();
            if free < len + LEN_PREFIX {
                return Err(InboxError::Full {
                    len,
                    free: free.saturating_sub(LEN_PREFIX),
                });
            }
            // Capacity was checked above; pushes cannot fail.
            for byte in (len as u16).to_le_bytes().iter().chain(payload) {
                let _ = bytes.push_back(*byte);
            }
            Ok(())
        })
    }

    /// Move the oldest message into `out`, replacing its contents.
    pub fn pop_into(&self, out: &mut Vec<u8>) -> bool {
        out.clear();
        critical_section::with(|cs| {
            let mut bytes = self.bytes.borrow(cs).borrow_mut();
            let (Some(lo), Some(hi)) = (bytes.pop_front(), bytes.pop_front()) else {
                bytes.clear();
                return false;
            };
            let len = u16::from_le_bytes([lo, hi]) as usize;
            out.reserve(len);
            for _ in 0..len {
                match bytes.pop_front() {
                    Some(byte) => out.push(byte),
                    None => break,
                }
            }
            true
        })
    }

    pub fn is_empty(&self) -> bool {
        critical_section::with(|cs| self.bytes.borrow(cs).borrow().is_empty())
    }

    /// Bytes in use, framing included.
    pub fn used(&self) -> usize {
        critical_section::with(|cs| self.bytes.borrow(cs).borrow().len())
    }
}

impl<const N: usize> Default for Inbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_come_out_whole_and_in_order() {
        let inbox: Inbox<64> = Inbox::new();
        inbox.push(b"{\"message\":\"a\"}").unwrap();
        inbox.push(b"second").unwrap();

        let mut out = Vec::new();
        assert!(inbox.pop_into(&mut out));
        assert_eq!(out, b"{\"message\":\"a\"}");
        assert!(inbox.pop_into(&mut out));
        assert_eq!(out, b"second");
        assert!(!inbox.pop_into(&mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn oversize_payload_is_rejected_not_truncated() {
        let inbox: Inbox<16> = Inbox::new();
        let err = inbox.push(&[b'x'; 15]).unwrap_err();
        assert_eq!(
            err,
            InboxError::Oversize {
                len: 15,
                capacity: 14
            }
        );
        assert!(inbox.is_empty());
        inbox.push(&[b'x'; 14]).unwrap();
    }

    #[test]
    fn full_inbox_drops_newest() {
        let inbox: Inbox<16> = Inbox::new();
        inbox.push(b"0123456789").unwrap();
        let err = inbox.push(b"abcd").unwrap_err();
        assert_eq!(err, InboxError::Full { len: 4, free: 2 });

        let mut out = Vec::new();
        assert!(inbox.pop_into(&mut out));
        assert_eq!(out, b"0123456789");
        inbox.push(b"abcd").unwrap();
        assert_eq!(inbox.used(), 6);
    }

    #[test]
    fn empty_payload_is_a_message() {
        let inbox: Inbox<8> = Inbox::new();
        inbox.push(b"").unwrap();
        let mut out = vec![1, 2, 3];
        assert!(inbox.pop_into(&mut out));
        assert!(out.is_empty());
    }
}
