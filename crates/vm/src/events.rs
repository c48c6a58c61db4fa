//! Execution status and VM event translation

use crate::{
    context::Event,
    error::{fault, DecodeError, VmFault},
};
use dvm_primitives::{
    ContractStatus, ExecutionResult, TypedEvent, VmAddress, VmStatus, VmTypeTag,
    VM_ADDRESS_LENGTH,
};
use std::collections::HashMap;

/// Disposition event type
pub const EVENT_TYPE_CONTRACT_STATUS: &str = "contract_status";
/// Translated VM event type
pub const EVENT_TYPE_CONTRACT_EVENTS: &str = "contract_events";

pub const ATTR_STATUS: &str = "status";
pub const ATTR_MAJOR_STATUS: &str = "major_status";
pub const ATTR_SUB_STATUS: &str = "sub_status";
pub const ATTR_MESSAGE: &str = "message";
pub const ATTR_KEY: &str = "key";
pub const ATTR_SEQUENCE_NUMBER: &str = "sequence_number";
pub const ATTR_TYPE: &str = "type";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_MODULE: &str = "module";

pub const STATUS_KEEP: &str = "keep";
pub const STATUS_DISCARD: &str = "discard";
pub const STATUS_ERROR: &str = "error";

/// Decodes raw event data of one type tag into its event value
pub type EventDecoder = fn(&[u8]) -> Result<Vec<u8>, DecodeError>;

/// Type tag to decoder table
#[derive(Debug, Clone)]
pub struct TypeDecoders {
    decoders: HashMap<VmTypeTag, EventDecoder>,
}

impl TypeDecoders {
    /// Table without decoders, every tag passes through raw
    pub fn empty() -> Self {
        Self { decoders: HashMap::new() }
    }

    /// Register `decoder` for `tag`, replacing any previous one
    pub fn register(&mut self, tag: VmTypeTag, decoder: EventDecoder) -> &mut Self {
        self.decoders.insert(tag, decoder);
        self
    }

    /// Decode `data`; tags without a decoder pass the raw bytes through
    pub fn decode(&self, tag: VmTypeTag, data: &[u8]) -> Result<Vec<u8>, DecodeError> {
        match self.decoders.get(&tag) {
            Some(decoder) => decoder(data),
            None => Ok(data.to_vec()),
        }
    }
}

impl Default for TypeDecoders {
    fn default() -> Self {
        let mut decoders = Self::empty();
        decoders
            .register(VmTypeTag::Bool, decode_bool)
            .register(VmTypeTag::U8, decode_u8)
            .register(VmTypeTag::U64, decode_u64)
            .register(VmTypeTag::U128, decode_u128)
            .register(VmTypeTag::Address, decode_address)
            .register(VmTypeTag::ByteArray, decode_byte_array);
        decoders
    }
}

fn fixed<const N: usize>(data: &[u8]) -> Result<[u8; N], DecodeError> {
    data.try_into().map_err(|_| DecodeError::Width { expected: N, actual: data.len() })
}

fn decode_bool(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    match fixed::<1>(data)? {
        [0] => Ok(b"false".to_vec()),
        [1] => Ok(b"true".to_vec()),
        [other] => Err(DecodeError::InvalidBool(other)),
    }
}

fn decode_u8(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(u8::from_le_bytes(fixed(data)?).to_string().into_bytes())
}

fn decode_u64(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(u64::from_le_bytes(fixed(data)?).to_string().into_bytes())
}

fn decode_u128(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(u128::from_le_bytes(fixed(data)?).to_string().into_bytes())
}

fn decode_address(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let bytes = fixed::<VM_ADDRESS_LENGTH>(data)?;
    Ok(VmAddress::new(bytes).to_string().into_bytes())
}

fn decode_byte_array(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    Ok(data.to_vec())
}

fn with_status_details(event: Event, status: &VmStatus) -> Event {
    event
        .with_attribute(ATTR_MAJOR_STATUS, status.major_status.to_string())
        .with_attribute(ATTR_SUB_STATUS, status.sub_status.to_string())
        .with_attribute(ATTR_MESSAGE, status.message.clone())
}

/// Execution kept
pub fn new_event_keep() -> Event {
    Event::new(EVENT_TYPE_CONTRACT_STATUS).with_attribute(ATTR_STATUS, STATUS_KEEP)
}

/// Execution discarded, with status details when the VM sent them
pub fn new_event_discard(status: Option<&VmStatus>) -> Event {
    let event = Event::new(EVENT_TYPE_CONTRACT_STATUS).with_attribute(ATTR_STATUS, STATUS_DISCARD);
    match status {
        Some(status) => with_status_details(event, status),
        None => event,
    }
}

/// Execution kept with a non-executed status
pub fn new_event_error(status: &VmStatus) -> Event {
    let event = Event::new(EVENT_TYPE_CONTRACT_STATUS).with_attribute(ATTR_STATUS, STATUS_ERROR);
    with_status_details(event, status)
}

/// Disposition events of `result`
pub fn status_events(result: &ExecutionResult) -> Vec<Event> {
    match result.status {
        ContractStatus::Keep => {
            let mut events = vec![new_event_keep()];
            if let Some(status) = result.status_struct.as_ref().filter(|s| !s.is_executed()) {
                events.push(new_event_error(status));
            }
            events
        }
        ContractStatus::Discard => vec![new_event_discard(result.status_struct.as_ref())],
    }
}

/// Canonical ledger event of a VM event.
///
/// Data that doesn't fit its registered decoder is a malformed VM response and faults.
pub fn translate_event(decoders: &TypeDecoders, event: &TypedEvent) -> Event {
    let value = decoders.decode(event.type_tag, &event.event_data).unwrap_or_else(|reason| {
        fault(VmFault::MalformedEvent { tag: event.type_tag, reason })
    });

    let translated = Event::new(EVENT_TYPE_CONTRACT_EVENTS)
        .with_attribute(ATTR_KEY, hex::encode(&event.key))
        .with_attribute(ATTR_SEQUENCE_NUMBER, event.sequence_number.to_string())
        .with_attribute(ATTR_TYPE, event.type_tag.name())
        .with_attribute(ATTR_VALUE, value);

    match &event.module {
        Some(module) => translated.with_attribute(ATTR_MODULE, module.clone()),
        None => translated,
    }
}

/// All ledger events of `result`: disposition first, then VM events of a kept execution
pub fn translate_result(decoders: &TypeDecoders, result: &ExecutionResult) -> Vec<Event> {
    let mut events = status_events(result);
    if result.status == ContractStatus::Keep {
        events.extend(result.events.iter().map(|event| translate_event(decoders, event)));
    }
    events
}
