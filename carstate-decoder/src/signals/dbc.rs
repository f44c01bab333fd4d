//! DBC file parser
//!
//! Parses Vector DBC files with the `can-dbc` crate and converts them into
//! the internal [`SignalDatabase`], including `VAL_` value tables.

use crate::signals::database::{
    ByteOrder, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
use crate::types::{DecoderError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Bit 31 marks extended IDs in DBC message IDs
const EXTENDED_ID_FLAG: u32 = 0x8000_0000;

/// Parse a DBC file into a signal database
pub fn parse_dbc_file(path: &Path) -> Result<SignalDatabase> {
    log::info!("Parsing DBC file: {:?}", path);

    let bytes = std::fs::read(path).map_err(|e| {
        DecoderError::DbcParseError(format!("Failed to read file {:?}: {}", path, e))
    })?;

    // DBC files in the wild are often Windows-1252; fall back to Latin-1
    let content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    let db = parse_dbc_str(&content)?;
    log::info!("Parsed {} messages from {:?}", db.stats().num_messages, path);
    Ok(db)
}

/// Parse DBC text into a signal database
pub fn parse_dbc_str(content: &str) -> Result<SignalDatabase> {
    let dbc = can_dbc::DBC::from_slice(content.as_bytes())
        .map_err(|e| DecoderError::DbcParseError(format!("{:?}", e)))?;

    let mut tables = collect_value_tables(&dbc);
    let mut db = SignalDatabase::new();

    for dbc_msg in dbc.messages() {
        db.add_message(convert_message(dbc_msg, &mut tables));
    }

    Ok(db)
}

/// Gather `VAL_` entries keyed by (raw message ID, signal name)
fn collect_value_tables(dbc: &can_dbc::DBC) -> HashMap<(u32, String), HashMap<i64, String>> {
    let mut tables = HashMap::new();

    for description in dbc.value_descriptions() {
        if let can_dbc::ValueDescription::Signal {
            message_id,
            signal_name,
            value_descriptions,
        } = description
        {
            let table: HashMap<i64, String> = value_descriptions
                .iter()
                .map(|val| (*val.a() as i64, val.b().to_string()))
                .collect();
            tables.insert((message_id.0, signal_name.to_string()), table);
        }
    }

    tables
}

/// Convert a can-dbc message to our MessageDefinition
fn convert_message(
    dbc_msg: &can_dbc::Message,
    tables: &mut HashMap<(u32, String), HashMap<i64, String>>,
) -> MessageDefinition {
    let raw_id = dbc_msg.message_id().0;

    let signals = dbc_msg
        .signals()
        .iter()
        .map(|sig| {
            let value_table = tables.remove(&(raw_id, sig.name().to_string()));
            convert_signal(sig, value_table)
        })
        .collect();

    MessageDefinition {
        address: raw_id & !EXTENDED_ID_FLAG,
        name: dbc_msg.message_name().to_string(),
        size: *dbc_msg.message_size() as usize,
        signals,
    }
}

/// Convert a can-dbc signal to our SignalDefinition
fn convert_signal(
    dbc_sig: &can_dbc::Signal,
    value_table: Option<HashMap<i64, String>>,
) -> SignalDefinition {
    let byte_order = match *dbc_sig.byte_order() {
        can_dbc::ByteOrder::LittleEndian => ByteOrder::LittleEndian,
        can_dbc::ByteOrder::BigEndian => ByteOrder::BigEndian,
    };

    let value_type = match *dbc_sig.value_type() {
        can_dbc::ValueType::Signed => ValueType::Signed,
        can_dbc::ValueType::Unsigned => ValueType::Unsigned,
    };

    SignalDefinition {
        name: dbc_sig.name().to_string(),
        start_bit: *dbc_sig.start_bit() as u16,
        length: *dbc_sig.signal_size() as u16,
        byte_order,
        value_type,
        factor: *dbc_sig.factor(),
        offset: *dbc_sig.offset(),
        value_table,
    }
}
