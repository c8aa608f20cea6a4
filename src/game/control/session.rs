// Control session - all control blocks of one side, plus replication routing

use super::block::{ControlBlock, Controller, TickContext};
use super::targets::ActionTarget;
use crate::engine::input::{InputCatalog, InputOracle, PressedSnapshot};
use crate::engine::net::{wire, Message, Transport, INPUT_MESSAGE_ID};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns the control blocks of one side (client or authority)
pub struct ControlSession {
    catalog: Arc<InputCatalog>,
    authority: bool,
    blocks: HashMap<u64, ControlBlock>,
}

impl ControlSession {
    pub fn new(catalog: Arc<InputCatalog>, authority: bool) -> Self {
        Self {
            catalog,
            authority,
            blocks: HashMap::new(),
        }
    }

    pub fn is_authority(&self) -> bool {
        self.authority
    }

    /// Create a block sharing this session's catalog
    pub fn create_block(
        &mut self,
        entity_id: u64,
        display_name: &str,
        custom_data: &str,
        target: Box<dyn ActionTarget>,
    ) -> &mut ControlBlock {
        let block = ControlBlock::new(
            entity_id,
            display_name,
            custom_data,
            target,
            Arc::clone(&self.catalog),
        );
        match self.blocks.entry(entity_id) {
            Entry::Occupied(mut entry) => {
                log::warn!("Replacing control block {}", entity_id);
                entry.insert(block);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(block),
        }
    }

    pub fn remove_block(&mut self, entity_id: u64) -> Option<ControlBlock> {
        self.blocks.remove(&entity_id)
    }

    pub fn block(&self, entity_id: u64) -> Option<&ControlBlock> {
        self.blocks.get(&entity_id)
    }

    pub fn block_mut(&mut self, entity_id: u64) -> Option<&mut ControlBlock> {
        self.blocks.get_mut(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Run one tick for every block; returns how many fired
    pub fn tick(
        &mut self,
        now: u64,
        oracle: &dyn InputOracle,
        controller: Option<&Controller>,
        transport: &mut dyn Transport,
    ) -> usize {
        let ctx = TickContext {
            now,
            oracle,
            controller,
            authority: self.authority,
        };

        let mut fired = 0;
        for block in self.blocks.values_mut() {
            if block.update(&ctx, transport).is_some() {
                fired += 1;
            }
        }
        fired
    }

    /// Authority side: route a replicated input message to its block.
    ///
    /// Malformed messages, unknown entities, unknown input names and values
    /// of the wrong type are dropped whole. Names are stored in canonical form. Returns whether the message was applied.
    pub fn receive(&mut self, message: &Message) -> bool {
        if message.id != INPUT_MESSAGE_ID {
            return false;
        }

        if !self.authority {
            log::warn!("Dropping input message received on a non-authoritative session");
            return false;
        }

        let (entity_id, snapshot) = match wire::decode(&message.payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Dropping malformed input message: {}", e);
                return false;
            }
        };

        let snapshot = match self.canonicalize(&snapshot) {
            Ok(snapshot) => snapshot,
            Err(reason) => {
                log::warn!("Dropping input message for entity {}: {}", entity_id, reason);
                return false;
            }
        };

        let Some(block) = self.blocks.get_mut(&entity_id) else {
            log::warn!("Dropping input message for unknown entity {}", entity_id);
            return false;
        };

        block.apply_remote_snapshot(snapshot)
    }

    /// Rebuild a received snapshot under canonical input names, checking
    /// each value against the input's kind
    fn canonicalize(&self, snapshot: &PressedSnapshot) -> Result<PressedSnapshot, String> {
        let mut canonical = PressedSnapshot::new();
        for (name, value) in snapshot.iter() {
            let descriptor = self
                .catalog
                .get(name)
                .ok_or_else(|| format!("unknown input '{}'", name))?;

            let kind = descriptor.kind();
            let count = value.components().len();
            if count != kind.value_arity() {
                return Err(format!(
                    "input '{}' expects {} but got {} components",
                    descriptor.name(),
                    kind.type_name(),
                    count
                ));
            }
            if canonical.contains(descriptor.name()) {
                return Err(format!("input '{}' listed twice", descriptor.name()));
            }
            canonical.insert(descriptor.name(), *value);
        }
        Ok(canonical)
    }
}
