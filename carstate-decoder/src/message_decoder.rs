//! Message Decoding Engine
//!
//! Extracts physical signal values from a raw CAN payload according to its
//! [`MessageDefinition`]: bit extraction for both byte orders, sign
//! extension, then `offset + factor * raw`.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};

/// Message decoder - extracts signals from CAN payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode every signal of a message
    ///
    /// Returns `None` when the payload is too short for the message layout;
    /// the caller keeps its previous values in that case.
    pub fn decode_message(data: &[u8], message_def: &MessageDefinition) -> Option<Vec<(String, f64)>> {
        message_def
            .signals
            .iter()
            .map(|signal| Self::decode_signal(data, signal).map(|v| (signal.name.clone(), v)))
            .collect()
    }

    /// Decode a single signal to its physical value
    pub fn decode_signal(data: &[u8], signal: &SignalDefinition) -> Option<f64> {
        let raw = Self::extract_raw(data, signal)?;
        Some(signal.offset + signal.factor * raw as f64)
    }

    /// Extract the raw (sign-extended) integer value of a signal
    pub fn extract_raw(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
        let length = signal.length as usize;
        if length == 0 || length > 64 {
            return None;
        }

        let bits = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_intel(data, signal.start_bit as usize, length)?,
            ByteOrder::BigEndian => Self::extract_motorola(data, signal.start_bit as usize, length)?,
        };

        Some(match signal.value_type {
            ValueType::Unsigned => bits as i64,
            ValueType::Signed => Self::sign_extend(bits, length),
        })
    }

    /// Intel layout: `start_bit` is the LSB, bits run upwards through the payload
    fn extract_intel(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let last_byte = (start_bit + length - 1) / 8;
        if last_byte >= data.len() {
            log::trace!("Intel signal at bit {} needs byte {}, payload has {}", start_bit, last_byte, data.len());
            return None;
        }

        let mut value = 0u64;
        for i in 0..length {
            let pos = start_bit + i;
            let bit = (data[pos / 8] >> (pos % 8)) & 1;
            value |= (bit as u64) << i;
        }
        Some(value)
    }

    /// Motorola layout: `start_bit` is the MSB in DBC sawtooth numbering
    ///
    /// Walking towards the LSB moves down within a byte, then jumps to bit 7
    /// of the next byte.
    fn extract_motorola(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let mut value = 0u64;
        let mut pos = start_bit;
        for i in 0..length {
            let byte = data.get(pos / 8)?;
            let bit = (byte >> (pos % 8)) & 1;
            value = (value << 1) | bit as u64;

            if i + 1 < length {
                pos = if pos % 8 == 0 { pos + 15 } else { pos - 1 };
            }
        }
        Some(value)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }
        let shift = 64 - bit_length;
        ((value << shift) as i64) >> shift
    }
}
