//! Signal database
//!
//! Message layouts and value tables loaded from a DBC, indexed by CAN
//! address and by message (signal group) name.

use std::collections::HashMap;

/// A CAN message definition; one message is one signal group
#[derive(Debug, Clone)]
pub struct MessageDefinition {
    /// CAN arbitration ID
    pub address: u32,
    /// Message (signal group) name
    pub name: String,
    /// Payload size in bytes
    pub size: usize,
    pub signals: Vec<SignalDefinition>,
}

impl MessageDefinition {
    pub fn signal(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.iter().find(|s| s.name == name)
    }
}

/// A CAN signal definition
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    pub name: String,
    /// Start bit as written in the DBC (LSB for Intel, MSB for Motorola)
    pub start_bit: u16,
    /// Length in bits
    pub length: u16,
    pub byte_order: ByteOrder,
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Value table for enum-like values (raw_value -> description)
    pub value_table: Option<HashMap<i64, String>>,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian (Intel format)
    LittleEndian,
    /// Big-endian (Motorola format)
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Signed,
    Unsigned,
}

/// All messages from one DBC
#[derive(Debug, Clone, Default)]
pub struct SignalDatabase {
    messages: HashMap<u32, MessageDefinition>,
    by_name: HashMap<String, u32>,
}

impl SignalDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message definition, replacing any earlier one at the same address
    pub fn add_message(&mut self, message: MessageDefinition) {
        if let Some(previous) = self.messages.get(&message.address) {
            log::warn!(
                "Message 0x{:X} redefined: {} replaces {}",
                message.address,
                message.name,
                previous.name
            );
            self.by_name.remove(&previous.name);
        }
        self.by_name.insert(message.name.clone(), message.address);
        self.messages.insert(message.address, message);
    }

    pub fn get_message(&self, address: u32) -> Option<&MessageDefinition> {
        self.messages.get(&address)
    }

    pub fn get_message_by_name(&self, name: &str) -> Option<&MessageDefinition> {
        self.by_name.get(name).and_then(|address| self.messages.get(address))
    }

    /// Value table of one signal, if the DBC defines one
    pub fn value_table(&self, group: &str, field: &str) -> Option<&HashMap<i64, String>> {
        self.get_message_by_name(group)?
            .signal(field)?
            .value_table
            .as_ref()
    }

    /// Iterate over every (group, field, table) triple that has a value table
    pub fn value_tables(&self) -> impl Iterator<Item = (&str, &str, &HashMap<i64, String>)> {
        self.messages.values().flat_map(|msg| {
            msg.signals.iter().filter_map(move |sig| {
                sig.value_table
                    .as_ref()
                    .map(|table| (msg.name.as_str(), sig.name.as_str(), table))
            })
        })
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.values().map(|m| m.signals.len()).sum(),
            num_value_tables: self.value_tables().count(),
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    pub num_messages: usize,
    pub num_signals: usize,
    pub num_value_tables: usize,
}
